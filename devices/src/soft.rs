//! Software pins and ports backed by shared memory.
//!
//! These implement the pin seams without hardware and are what the
//! tests and the simulated bring-up binary wire their panels out of.
//! Levels are *electrical*: `true` = high (pulled up, inactive for the
//! negative-logic inputs the scanner serves).

use std::cell::Cell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use crate::{DeviceError, DeviceResult, GpioInput, GpioOutput, PortExpander};

/// An in-memory pin. Clones share the same level, so a test can hold
/// one clone to poke levels while the scanner reads another.
#[derive(Clone)]
pub struct SoftPin {
    level: Rc<Cell<bool>>,
}

impl SoftPin {
    pub fn new(level: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(level)),
        }
    }

    pub fn set(&self, level: bool) {
        self.level.set(level);
    }

    pub fn get(&self) -> bool {
        self.level.get()
    }
}

impl Debug for SoftPin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SoftPin({})", self.level.get())
    }
}

impl GpioInput for SoftPin {
    fn read(&self) -> DeviceResult<bool> {
        Ok(self.level.get())
    }
}

impl GpioOutput for SoftPin {
    fn write(&self, value: bool) -> DeviceResult<()> {
        self.level.set(value);
        Ok(())
    }
}

/// An in-memory 74HC4067: sixteen channel levels behind one data pin,
/// routed by the four shared select lines.
///
/// Channels start high (pulled up). Reading the data pin returns the
/// level of whichever channel the select lines currently address, so
/// the scanner's sweep and direct reads behave as on hardware.
#[derive(Clone)]
pub struct SoftMux {
    select: [SoftPin; 4],
    channels: Rc<[Cell<bool>; 16]>,
}

impl SoftMux {
    pub fn new(select: [SoftPin; 4]) -> Self {
        Self {
            select,
            channels: Rc::new(std::array::from_fn(|_| Cell::new(true))),
        }
    }

    /// Sets the electrical level of one channel (`false` = grounded).
    pub fn set_channel(&self, channel: u8, level: bool) {
        self.channels[channel as usize].set(level);
    }

    fn selected(&self) -> usize {
        let mut channel = 0;
        for (bit, pin) in self.select.iter().enumerate() {
            if pin.get() {
                channel |= 1 << bit;
            }
        }
        channel
    }
}

impl Debug for SoftMux {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SoftMux(ch {})", self.selected())
    }
}

impl GpioInput for SoftMux {
    fn read(&self) -> DeviceResult<bool> {
        Ok(self.channels[self.selected()].get())
    }
}

/// An in-memory 16-bit port expander. Lines start high.
#[derive(Clone)]
pub struct SoftPort {
    lines: Rc<Cell<u16>>,
    responsive: bool,
}

impl SoftPort {
    pub fn new() -> Self {
        Self {
            lines: Rc::new(Cell::new(0xffff)),
            responsive: true,
        }
    }

    /// A port that never acknowledges, for probing failure paths.
    pub fn unresponsive() -> Self {
        Self {
            responsive: false,
            ..Self::new()
        }
    }

    /// Sets the electrical level of one line (`false` = grounded).
    pub fn set_line(&self, line: u8, level: bool) {
        let mut bits = self.lines.get();
        if level {
            bits |= 1 << line;
        } else {
            bits &= !(1 << line);
        }
        self.lines.set(bits);
    }
}

impl Default for SoftPort {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for SoftPort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SoftPort({:#06x})", self.lines.get())
    }
}

impl PortExpander for SoftPort {
    fn probe(&self) -> DeviceResult<()> {
        if self.responsive {
            Ok(())
        } else {
            Err(DeviceError::BusNoAck)
        }
    }

    fn read_port(&self) -> DeviceResult<u16> {
        if self.responsive {
            Ok(self.lines.get())
        } else {
            Err(DeviceError::BusNoAck)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mux_routes_the_selected_channel() {
        let select: [SoftPin; 4] = std::array::from_fn(|_| SoftPin::new(false));
        let mux = SoftMux::new(select.clone());
        mux.set_channel(10, false);

        // select 0b1010
        select[1].set(true);
        select[3].set(true);
        assert!(!mux.read().unwrap());

        select[1].set(false);
        assert!(mux.read().unwrap());
    }

    #[test]
    fn port_lines_start_pulled_up() {
        let port = SoftPort::new();
        assert_eq!(port.read_port().unwrap(), 0xffff);
        port.set_line(0, false);
        port.set_line(15, false);
        assert_eq!(port.read_port().unwrap(), 0x7ffe);
    }
}
