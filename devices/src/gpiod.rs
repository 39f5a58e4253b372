//! Linux character-device GPIO backend for the pin seams, for panels
//! hosted on SBC-class boards rather than a microcontroller.

use std::fmt::{Debug, Formatter};
use std::path::Path;

use crate::{DeviceResult, GpioInput, GpioOutput};

/// A GPIO chip handing out panel input and output lines.
pub struct PanelChip {
    chip: gpiod::Chip,
}

impl PanelChip {
    pub fn open(path: impl AsRef<Path>) -> DeviceResult<Self> {
        Ok(Self {
            chip: gpiod::Chip::new(path.as_ref())?,
        })
    }

    /// Requests one line as a pulled-up input (panel inputs switch to
    /// ground).
    pub fn input(&self, line: u32) -> DeviceResult<PanelInput> {
        let lines = self.chip.request_lines(
            gpiod::Options::input([line])
                .consumer(env!("CARGO_PKG_NAME"))
                .bias(gpiod::Bias::PullUp),
        )?;
        Ok(PanelInput { line, lines })
    }

    /// Requests one line as an output (multiplexer select lines).
    pub fn output(&self, line: u32) -> DeviceResult<PanelOutput> {
        let lines = self
            .chip
            .request_lines(gpiod::Options::output([line]).consumer(env!("CARGO_PKG_NAME")))?;
        Ok(PanelOutput { line, lines })
    }
}

impl Debug for PanelChip {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PanelChip({})", self.chip.name())
    }
}

pub struct PanelInput {
    line: u32,
    lines: gpiod::Lines<gpiod::Input>,
}

impl Debug for PanelInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PanelInput({})", self.line)
    }
}

impl GpioInput for PanelInput {
    fn read(&self) -> DeviceResult<bool> {
        let values = self.lines.get_values([false])?;
        Ok(values[0])
    }
}

pub struct PanelOutput {
    line: u32,
    lines: gpiod::Lines<gpiod::Output>,
}

impl Debug for PanelOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PanelOutput({})", self.line)
    }
}

impl GpioOutput for PanelOutput {
    fn write(&self, value: bool) -> DeviceResult<()> {
        self.lines.set_values([value])?;
        Ok(())
    }
}
