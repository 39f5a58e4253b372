//! Debounced level detectors for panel switches.

use crate::command::{CommandDispatcher, CommandHandle};
use crate::digital_in::{DigitalIn, Source};
use crate::{DEBOUNCE_CYCLES, Device, DeviceResult};

/// An on/off switch with countdown hysteresis.
///
/// Unlike [Button](crate::button::Button) this detects levels, not
/// edges: every accepted level change re-arms the countdown, and no new
/// level is sampled until it elapses.
#[derive(Debug)]
pub struct Switch<'a> {
    source: Source<'a>,
    on: bool,
    debounce: u8,
    transition: bool,
    cmd_on: Option<CommandHandle>,
    cmd_off: Option<CommandHandle>,
}

impl<'a> Switch<'a> {
    pub fn new(source: Source<'a>) -> Self {
        Self {
            source,
            on: false,
            debounce: 0,
            transition: false,
            cmd_on: None,
            cmd_off: None,
        }
    }

    /// Binds a command for the on position only.
    pub fn set_command(&mut self, cmd_on: CommandHandle) {
        self.cmd_on = Some(cmd_on);
        self.cmd_off = None;
    }

    /// Binds commands for both positions.
    pub fn set_commands(&mut self, cmd_on: CommandHandle, cmd_off: CommandHandle) {
        self.cmd_on = Some(cmd_on);
        self.cmd_off = Some(cmd_off);
    }

    /// Command bound to the current position.
    pub fn command(&self) -> Option<CommandHandle> {
        if self.on { self.cmd_on } else { self.cmd_off }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn is_off(&self) -> bool {
        !self.on
    }

    /// Maps the position onto a dataref-style float.
    pub fn value(&self, on_value: f32, off_value: f32) -> f32 {
        if self.on { on_value } else { off_value }
    }
}

impl Device for Switch<'_> {
    fn update(&mut self, inputs: &DigitalIn<'_>) -> DeviceResult<()> {
        if self.debounce > 0 {
            self.debounce -= 1;
            return Ok(());
        }
        let on = inputs.read(self.source, false)?;
        if on != self.on {
            self.debounce = DEBOUNCE_CYCLES;
            self.on = on;
            self.transition = true;
        }
        Ok(())
    }

    fn trigger(&mut self, dispatch: &dyn CommandDispatcher) -> DeviceResult<()> {
        if self.transition {
            if let Some(cmd) = self.command() {
                dispatch.command_trigger(cmd)?;
            }
            self.transition = false;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Switch2State {
    Off,
    On1,
    On2,
}

/// Command bindings of a [Switch2].
#[derive(Copy, Clone, Debug)]
enum Binding {
    Unbound,
    /// Two command slots on a single up/down axis: entering on1 and
    /// leaving on2 fire `up`; entering on2 and leaving on1 fire `down`.
    UpDown {
        up: CommandHandle,
        down: CommandHandle,
    },
    /// One command per entered position.
    PerPosition {
        on1: CommandHandle,
        off: CommandHandle,
        on2: CommandHandle,
    },
}

/// An on1/off/on2 switch on two input channels.
///
/// Channel 1 wins when both read active. The previous position is
/// tracked so a return to off can tell which side it came from.
#[derive(Debug)]
pub struct Switch2<'a> {
    source1: Source<'a>,
    source2: Source<'a>,
    state: Switch2State,
    last_state: Switch2State,
    debounce: u8,
    transition: bool,
    binding: Binding,
}

impl<'a> Switch2<'a> {
    pub fn new(source1: Source<'a>, source2: Source<'a>) -> Self {
        Self {
            source1,
            source2,
            state: Switch2State::Off,
            last_state: Switch2State::Off,
            debounce: 0,
            transition: false,
            binding: Binding::Unbound,
        }
    }

    /// Binds two commands collapsing the three positions onto one
    /// up/down axis, for panels with only two command slots.
    pub fn set_commands_up_down(&mut self, cmd_up: CommandHandle, cmd_down: CommandHandle) {
        self.binding = Binding::UpDown {
            up: cmd_up,
            down: cmd_down,
        };
    }

    /// Binds a distinct command to each position.
    pub fn set_commands(
        &mut self,
        cmd_on1: CommandHandle,
        cmd_off: CommandHandle,
        cmd_on2: CommandHandle,
    ) {
        self.binding = Binding::PerPosition {
            on1: cmd_on1,
            off: cmd_off,
            on2: cmd_on2,
        };
    }

    /// Command for the last accepted transition.
    pub fn command(&self) -> Option<CommandHandle> {
        use Switch2State::*;
        match self.binding {
            Binding::Unbound => None,
            Binding::UpDown { up, down } => match (self.state, self.last_state) {
                (On1, _) => Some(up),
                (On2, _) => Some(down),
                (Off, On1) => Some(down),
                (Off, On2) => Some(up),
                (Off, Off) => None,
            },
            Binding::PerPosition { on1, off, on2 } => match self.state {
                On1 => Some(on1),
                Off => Some(off),
                On2 => Some(on2),
            },
        }
    }

    pub fn is_off(&self) -> bool {
        self.state == Switch2State::Off
    }

    pub fn is_on1(&self) -> bool {
        self.state == Switch2State::On1
    }

    pub fn is_on2(&self) -> bool {
        self.state == Switch2State::On2
    }

    /// Maps the position onto a dataref-style float.
    pub fn value(&self, on1_value: f32, off_value: f32, on2_value: f32) -> f32 {
        match self.state {
            Switch2State::On1 => on1_value,
            Switch2State::Off => off_value,
            Switch2State::On2 => on2_value,
        }
    }
}

impl Device for Switch2<'_> {
    fn update(&mut self, inputs: &DigitalIn<'_>) -> DeviceResult<()> {
        if self.debounce > 0 {
            self.debounce -= 1;
            return Ok(());
        }
        let mut input = if inputs.read(self.source2, false)? {
            Switch2State::On2
        } else {
            Switch2State::Off
        };
        if inputs.read(self.source1, false)? {
            input = Switch2State::On1;
        }
        if input != self.state {
            self.debounce = DEBOUNCE_CYCLES;
            self.last_state = self.state;
            self.state = input;
            self.transition = true;
        }
        Ok(())
    }

    fn trigger(&mut self, dispatch: &dyn CommandDispatcher) -> DeviceResult<()> {
        if self.transition {
            if let Some(cmd) = self.command() {
                dispatch.command_trigger(cmd)?;
            }
            self.transition = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Dispatch, RecordingDispatcher};
    use crate::soft::SoftPin;

    fn settle(dev: &mut dyn Device, inputs: &DigitalIn<'_>, rec: &RecordingDispatcher) {
        for _ in 0..=DEBOUNCE_CYCLES {
            dev.process(inputs, rec).unwrap();
        }
    }

    #[test]
    fn level_change_fires_once_after_hysteresis() {
        let pin = SoftPin::new(true);
        let inputs = DigitalIn::new();
        let rec = RecordingDispatcher::new();
        let on = CommandHandle::new(1);
        let off = CommandHandle::new(2);
        let mut sw = Switch::new(Source::Pin(&pin));
        sw.set_commands(on, off);

        pin.set(false);
        settle(&mut sw, &inputs, &rec);
        assert!(sw.is_on());
        assert_eq!(rec.take(), vec![Dispatch::Trigger(on)]);

        pin.set(true);
        settle(&mut sw, &inputs, &rec);
        assert!(sw.is_off());
        assert_eq!(rec.take(), vec![Dispatch::Trigger(off)]);
        assert_eq!(sw.value(1.0, 0.0), 0.0);
    }

    #[test]
    fn glitch_during_countdown_is_ignored() {
        let pin = SoftPin::new(true);
        let inputs = DigitalIn::new();
        let rec = RecordingDispatcher::new();
        let mut sw = Switch::new(Source::Pin(&pin));
        sw.set_command(CommandHandle::new(1));

        pin.set(false);
        sw.process(&inputs, &rec).unwrap();
        assert!(sw.is_on());

        // flips back within the countdown: no new transition accepted
        pin.set(true);
        for _ in 0..DEBOUNCE_CYCLES - 1 {
            sw.process(&inputs, &rec).unwrap();
        }
        pin.set(false);
        sw.process(&inputs, &rec).unwrap();
        assert!(sw.is_on());
        assert_eq!(rec.take().len(), 1);
    }

    #[test]
    fn switch2_up_down_collapse() {
        let pin1 = SoftPin::new(true);
        let pin2 = SoftPin::new(true);
        let inputs = DigitalIn::new();
        let rec = RecordingDispatcher::new();
        let up = CommandHandle::new(10);
        let down = CommandHandle::new(11);
        let mut sw = Switch2::new(Source::Pin(&pin1), Source::Pin(&pin2));
        sw.set_commands_up_down(up, down);

        // off -> on1 -> off fires up, then down
        pin1.set(false);
        settle(&mut sw, &inputs, &rec);
        assert!(sw.is_on1());
        pin1.set(true);
        settle(&mut sw, &inputs, &rec);
        assert!(sw.is_off());
        assert_eq!(
            rec.take(),
            vec![Dispatch::Trigger(up), Dispatch::Trigger(down)]
        );

        // off -> on2 -> off fires down, then up
        pin2.set(false);
        settle(&mut sw, &inputs, &rec);
        assert!(sw.is_on2());
        pin2.set(true);
        settle(&mut sw, &inputs, &rec);
        assert!(sw.is_off());
        assert_eq!(
            rec.take(),
            vec![Dispatch::Trigger(down), Dispatch::Trigger(up)]
        );
    }

    #[test]
    fn switch2_per_position_commands() {
        let pin1 = SoftPin::new(true);
        let pin2 = SoftPin::new(true);
        let inputs = DigitalIn::new();
        let rec = RecordingDispatcher::new();
        let on1 = CommandHandle::new(1);
        let off = CommandHandle::new(2);
        let on2 = CommandHandle::new(3);
        let mut sw = Switch2::new(Source::Pin(&pin1), Source::Pin(&pin2));
        sw.set_commands(on1, off, on2);

        pin2.set(false);
        settle(&mut sw, &inputs, &rec);
        pin2.set(true);
        settle(&mut sw, &inputs, &rec);
        pin1.set(false);
        settle(&mut sw, &inputs, &rec);
        assert_eq!(
            rec.take(),
            vec![
                Dispatch::Trigger(on2),
                Dispatch::Trigger(off),
                Dispatch::Trigger(on1),
            ]
        );
        assert_eq!(sw.value(-1.0, 0.0, 1.0), -1.0);
    }

    #[test]
    fn channel_one_wins_when_both_are_active() {
        let pin1 = SoftPin::new(false);
        let pin2 = SoftPin::new(false);
        let inputs = DigitalIn::new();
        let rec = RecordingDispatcher::new();
        let mut sw = Switch2::new(Source::Pin(&pin1), Source::Pin(&pin2));

        settle(&mut sw, &inputs, &rec);
        assert!(sw.is_on1());
    }
}
