//! Debounced pushbutton edge detectors.

use crate::command::{CommandDispatcher, CommandHandle};
use crate::digital_in::{DigitalIn, Source};
use crate::{DEBOUNCE_CYCLES, Device, DeviceResult};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Transition {
    None,
    Pressed,
    Released,
}

/// A pushbutton with release-edge debouncing.
///
/// A press is recognized on the first active sample; the debounce
/// countdown then gates the release, so mechanical chatter on let-go
/// cannot re-trigger a press. Transitions are one-shot: each is
/// visible to exactly one [pressed](Button::pressed) or
/// [released](Button::released) call.
#[derive(Debug)]
pub struct Button<'a> {
    source: Source<'a>,
    state: u8,
    transition: Transition,
    cmd_push: Option<CommandHandle>,
}

impl<'a> Button<'a> {
    pub fn new(source: Source<'a>) -> Self {
        Self {
            source,
            state: 0,
            transition: Transition::None,
            cmd_push: None,
        }
    }

    /// Binds the command started on press and ended on release.
    pub fn set_command(&mut self, cmd_push: CommandHandle) {
        self.cmd_push = Some(cmd_push);
    }

    pub fn command(&self) -> Option<CommandHandle> {
        self.cmd_push
    }

    /// Consumes a pending press transition.
    pub fn pressed(&mut self) -> bool {
        if self.transition == Transition::Pressed {
            self.transition = Transition::None;
            true
        } else {
            false
        }
    }

    /// Consumes a pending release transition.
    pub fn released(&mut self) -> bool {
        if self.transition == Transition::Released {
            self.transition = Transition::None;
            true
        } else {
            false
        }
    }

    /// Whether the button is currently held down (or still inside the
    /// release debounce window).
    pub fn engaged(&self) -> bool {
        self.state > 0
    }
}

impl Device for Button<'_> {
    fn update(&mut self, inputs: &DigitalIn<'_>) -> DeviceResult<()> {
        if inputs.read(self.source, false)? {
            if self.state == 0 {
                self.state = DEBOUNCE_CYCLES;
                self.transition = Transition::Pressed;
            }
        } else if self.state > 0 {
            self.state -= 1;
            if self.state == 0 {
                self.transition = Transition::Released;
            }
        }
        Ok(())
    }

    fn trigger(&mut self, dispatch: &dyn CommandDispatcher) -> DeviceResult<()> {
        if self.pressed() {
            if let Some(cmd) = self.cmd_push {
                dispatch.command_start(cmd)?;
            }
        }
        if self.released() {
            if let Some(cmd) = self.cmd_push {
                dispatch.command_end(cmd)?;
            }
        }
        Ok(())
    }
}

/// A [Button] that re-arms press transitions while held, for auto
/// repeat. Counted in poll cycles: the first repeat fires
/// `initial_delay` cycles after the press, later ones every `interval`
/// cycles. An interval of 0 disables repeating.
#[derive(Debug)]
pub struct RepeatButton<'a> {
    button: Button<'a>,
    initial_delay: u32,
    interval: u32,
    timer: u32,
}

impl<'a> RepeatButton<'a> {
    /// Repeats at a fixed cadence: first repeat one `interval` after
    /// the press.
    pub fn new(source: Source<'a>, interval: u32) -> Self {
        Self {
            button: Button::new(source),
            initial_delay: interval,
            interval,
            timer: 0,
        }
    }

    /// Delays the first repeat independently of the interval.
    pub fn with_initial_delay(mut self, cycles: u32) -> Self {
        self.initial_delay = cycles;
        self
    }

    pub fn set_command(&mut self, cmd_push: CommandHandle) {
        self.button.set_command(cmd_push);
    }

    pub fn command(&self) -> Option<CommandHandle> {
        self.button.command()
    }

    pub fn pressed(&mut self) -> bool {
        self.button.pressed()
    }

    pub fn released(&mut self) -> bool {
        self.button.released()
    }

    pub fn engaged(&self) -> bool {
        self.button.engaged()
    }
}

impl Device for RepeatButton<'_> {
    fn update(&mut self, inputs: &DigitalIn<'_>) -> DeviceResult<()> {
        if inputs.read(self.button.source, false)? {
            if self.button.state == 0 {
                self.button.state = DEBOUNCE_CYCLES;
                self.button.transition = Transition::Pressed;
                self.timer = self.initial_delay;
            } else if self.interval > 0 {
                if self.timer > 0 {
                    self.timer -= 1;
                }
                if self.timer == 0 {
                    self.button.state = DEBOUNCE_CYCLES;
                    self.button.transition = Transition::Pressed;
                    self.timer = self.interval;
                }
            }
        } else if self.button.state > 0 {
            self.button.state -= 1;
            if self.button.state == 0 {
                self.button.transition = Transition::Released;
            }
        }
        Ok(())
    }

    fn trigger(&mut self, dispatch: &dyn CommandDispatcher) -> DeviceResult<()> {
        self.button.trigger(dispatch)
    }
}
