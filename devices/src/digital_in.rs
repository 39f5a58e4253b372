//! Multiplexed digital input scanner.
//!
//! Aggregates direct pins, 74HC4067 multiplexers and I2C port expanders
//! into one addressable bit-space. Multiplexers share four select lines
//! and are swept channel by channel into a per-slot 16-bit snapshot;
//! expanders are captured with one bulk read. Negative logic
//! throughout: a returned `true` means the input is pulled to ground.

use std::cell::Cell;
use std::fmt::{Debug, Formatter};
use std::thread::sleep;
use std::time::Duration;

use log::{debug, warn};

use crate::{DeviceError, DeviceResult, GpioInput, GpioOutput, PortExpander};

/// Maximum number of registered expanders (multiplexers plus port
/// expanders combined). Exceeding it is a wiring configuration error.
pub const MAX_EXPANDERS: usize = 8;

/// Settle time after the select lines change, before sampling.
const SELECT_SETTLE: Duration = Duration::from_micros(1);

/// Address of one boolean input source.
#[derive(Copy, Clone, Debug)]
pub enum Source<'a> {
    /// A direct pin, read live on every access.
    Pin(&'a dyn GpioInput),
    /// Channel 0-15 on the expander with the given registration index.
    Channel { expander: usize, channel: u8 },
}

enum Slot<'a> {
    Mux(&'a dyn GpioInput),
    Port(&'a dyn PortExpander),
}

impl Debug for Slot<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Mux(pin) => write!(f, "Mux({pin:?})"),
            Slot::Port(port) => write!(f, "Port({port:?})"),
        }
    }
}

/// Scanner owning all multiplexer/expander wiring.
///
/// [DigitalIn::scan] must run once per poll cycle before any cached
/// read; detectors then read through [DigitalIn::read].
#[derive(Debug, Default)]
pub struct DigitalIn<'a> {
    select: Option<[&'a dyn GpioOutput; 4]>,
    slots: Vec<Slot<'a>>,
    cache: [Cell<u16>; MAX_EXPANDERS],
}

impl<'a> DigitalIn<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the four select lines shared by all multiplexers. Required
    /// before any multiplexer can be scanned; without them the sweep is
    /// skipped and multiplexer channels read as inactive.
    pub fn set_mux_pins(&mut self, select: [&'a dyn GpioOutput; 4]) {
        debug!("mux select lines set to {select:?}");
        self.select = Some(select);
    }

    /// Registers one 74HC4067 by its data pin and returns its expander
    /// index.
    pub fn add_mux(&mut self, data: &'a dyn GpioInput) -> DeviceResult<usize> {
        if self.slots.len() >= MAX_EXPANDERS {
            return Err(DeviceError::CapacityExhausted);
        }
        if self.select.is_none() {
            warn!("multiplexer {data:?} registered before the select lines were set");
        }
        self.slots.push(Slot::Mux(data));
        debug!("multiplexer {data:?} registered as expander {}", self.slots.len() - 1);
        Ok(self.slots.len() - 1)
    }

    /// Registers one I2C port expander and returns its expander index.
    /// Probes the device once; a device that does not acknowledge is
    /// not registered.
    pub fn add_expander(&mut self, port: &'a dyn PortExpander) -> DeviceResult<usize> {
        if self.slots.len() >= MAX_EXPANDERS {
            return Err(DeviceError::CapacityExhausted);
        }
        port.probe()?;
        self.slots.push(Slot::Port(port));
        debug!("port expander {port:?} registered as expander {}", self.slots.len() - 1);
        Ok(self.slots.len() - 1)
    }

    pub fn expander_count(&self) -> usize {
        self.slots.len()
    }

    fn select_channel(&self, channel: u8) -> DeviceResult<()> {
        let Some(select) = self.select else {
            return Ok(());
        };
        select[3].write(channel & 0x08 != 0)?;
        select[2].write(channel & 0x04 != 0)?;
        select[1].write(channel & 0x02 != 0)?;
        select[0].write(channel & 0x01 != 0)?;
        sleep(SELECT_SETTLE);
        Ok(())
    }

    /// Reads every expander input into the snapshot cache. Direct pins
    /// are never cached.
    pub fn scan(&self) -> DeviceResult<()> {
        let any_mux = self.slots.iter().any(|slot| matches!(slot, Slot::Mux(_)));
        if any_mux && self.select.is_some() {
            for channel in 0..16u8 {
                self.select_channel(channel)?;
                for (slot, cache) in self.slots.iter().zip(&self.cache) {
                    if let Slot::Mux(pin) = slot {
                        let mut bits = cache.get() & !(1 << channel);
                        if !pin.read()? {
                            bits |= 1 << channel;
                        }
                        cache.set(bits);
                    }
                }
            }
        }
        for (slot, cache) in self.slots.iter().zip(&self.cache) {
            if let Slot::Port(port) = slot {
                cache.set(!port.read_port()?);
            }
        }
        Ok(())
    }

    /// Gets the logical level of one source.
    ///
    /// `Source::Pin` always samples live and ignores `direct`. With
    /// `direct` set, a multiplexer channel is re-selected and sampled
    /// immediately, bypassing the snapshot; the flag has no effect on
    /// port expanders, which have no single-channel access. Otherwise
    /// the bit from the last [scan](DigitalIn::scan) is returned.
    pub fn read(&self, source: Source<'_>, direct: bool) -> DeviceResult<bool> {
        match source {
            Source::Pin(pin) => Ok(!pin.read()?),
            Source::Channel { expander, channel } => {
                if channel >= 16 {
                    return Err(DeviceError::InvalidArgument);
                }
                let slot = self
                    .slots
                    .get(expander)
                    .ok_or(DeviceError::InvalidArgument)?;
                match slot {
                    Slot::Mux(pin) if direct => {
                        self.select_channel(channel)?;
                        Ok(!pin.read()?)
                    }
                    _ => Ok(self.cache[expander].get() >> channel & 1 == 1),
                }
            }
        }
    }
}
