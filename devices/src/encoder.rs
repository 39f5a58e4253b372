//! Quadrature rotary encoder decoding.
//!
//! The decoder is deliberately permissive: a 4-bit window of the last
//! two track samples is looked up in the standard Gray-code table, and
//! the two patterns that indicate a skipped transition are counted as
//! double ticks instead of being rejected. That recovers fast turns at
//! the cost of not being able to tell a corrupted signal from a quick
//! double step; it is a heuristic, not a verified decode.

use crate::command::{CommandDispatcher, CommandHandle};
use crate::digital_in::{DigitalIn, Source};
use crate::{Device, DeviceResult};

/// Raw quadrature edges per mechanical detent.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EncoderPulses {
    One = 1,
    Two = 2,
    Four = 4,
}

/// A two-track rotary encoder producing up/down notch events.
///
/// Both tracks are sampled with *direct* reads so they are captured at
/// nearly the same instant even when they share a multiplexer; the
/// once-per-cycle snapshot would skew them across the channel sweep.
#[derive(Debug)]
pub struct Encoder<'a> {
    track_a: Source<'a>,
    track_b: Source<'a>,
    pulses: i16,
    count: i16,
    history: u8,
    cmd_up: Option<CommandHandle>,
    cmd_down: Option<CommandHandle>,
}

impl<'a> Encoder<'a> {
    pub fn new(track_a: Source<'a>, track_b: Source<'a>, pulses: EncoderPulses) -> Self {
        Self {
            track_a,
            track_b,
            pulses: pulses as i16,
            count: 0,
            history: 0,
            cmd_up: None,
            cmd_down: None,
        }
    }

    pub fn set_commands(&mut self, cmd_up: CommandHandle, cmd_down: CommandHandle) {
        self.cmd_up = Some(cmd_up);
        self.cmd_down = Some(cmd_down);
    }

    pub fn command_up(&self) -> Option<CommandHandle> {
        self.cmd_up
    }

    pub fn command_down(&self) -> Option<CommandHandle> {
        self.cmd_down
    }

    /// Raw edge count still waiting to be consumed.
    pub fn pos(&self) -> i16 {
        self.count
    }

    /// Whether a full positive notch has accumulated. With `reset`,
    /// consumes exactly one notch and leaves any surplus for the next
    /// call.
    pub fn up(&mut self, reset: bool) -> bool {
        if self.count >= self.pulses {
            if reset {
                self.count -= self.pulses;
            }
            true
        } else {
            false
        }
    }

    /// Negative-turn counterpart of [up](Encoder::up).
    pub fn down(&mut self, reset: bool) -> bool {
        if self.count <= -self.pulses {
            if reset {
                self.count += self.pulses;
            }
            true
        } else {
            false
        }
    }
}

impl Device for Encoder<'_> {
    fn update(&mut self, inputs: &DigitalIn<'_>) -> DeviceResult<()> {
        let mut sample = 0u8;
        if inputs.read(self.track_b, true)? {
            sample |= 0x02;
        }
        if inputs.read(self.track_a, true)? {
            sample |= 0x01;
        }
        self.history = ((self.history & 0x03) << 2) | sample;

        match self.history {
            1 | 7 | 8 | 14 => self.count += 1,
            2 | 4 | 11 | 13 => self.count -= 1,
            // skipped transition: assume a missed sample, count double
            3 | 12 => self.count += 2,
            6 | 9 => self.count -= 2,
            _ => {}
        }
        Ok(())
    }

    /// Fires at most one up or down command per call; with several
    /// notches pending, call repeatedly to drain them.
    fn trigger(&mut self, dispatch: &dyn CommandDispatcher) -> DeviceResult<()> {
        if self.up(true) {
            if let Some(cmd) = self.cmd_up {
                dispatch.command_trigger(cmd)?;
            }
        } else if self.down(true) {
            if let Some(cmd) = self.cmd_down {
                dispatch.command_trigger(cmd)?;
            }
        }
        Ok(())
    }
}
