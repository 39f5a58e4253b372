pub mod button;
pub mod command;
pub mod digital_in;
pub mod encoder;
pub mod gpiod;
pub mod soft;
pub mod switch;

use std::fmt::Debug;
use thiserror::Error;

use crate::command::CommandDispatcher;
use crate::digital_in::DigitalIn;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum DeviceError {
    #[error("expander capacity exhausted")]
    CapacityExhausted,
    #[error("expander did not acknowledge on the bus")]
    BusNoAck,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl From<std::io::Error> for DeviceError {
    fn from(err: std::io::Error) -> Self {
        DeviceError::Io(err.kind())
    }
}

pub type DeviceResult<T> = Result<T, DeviceError>;

/// Number of poll cycles a level change must survive before a detector
/// accepts it as stable.
pub const DEBOUNCE_CYCLES: u8 = 20;

/// One digital input line of the pin-I/O collaborator.
///
/// Reads the electrical level: `true` = high. Implementations may use
/// interior mutability; all polling happens on a single thread.
pub trait GpioInput: Debug {
    fn read(&self) -> DeviceResult<bool>;
}

/// One digital output line of the pin-I/O collaborator.
pub trait GpioOutput: Debug {
    fn write(&self, value: bool) -> DeviceResult<()>;
}

/// A 16-bit I2C port expander seen through its bulk read.
pub trait PortExpander: Debug {
    /// Checks that the device acknowledges on the bus and configures all
    /// lines as pulled-up inputs. Called once at registration.
    fn probe(&self) -> DeviceResult<()>;

    /// Reads all 16 lines in one bus transaction. Bit set = line high.
    fn read_port(&self) -> DeviceResult<u16>;
}

/// Common contract of all input detectors.
///
/// Per poll cycle the owner calls [DigitalIn::scan] once, then `update`
/// and `trigger` (in that order) on every device. Transitions are
/// one-shot: a second `trigger` without an intervening `update` fires
/// nothing.
pub trait Device {
    /// Reads the input(s) and evaluates any transitions.
    fn update(&mut self, inputs: &DigitalIn<'_>) -> DeviceResult<()>;

    /// Dispatches the commands bound to any pending transitions.
    fn trigger(&mut self, dispatch: &dyn CommandDispatcher) -> DeviceResult<()>;

    /// `update` followed by `trigger`.
    fn process(
        &mut self,
        inputs: &DigitalIn<'_>,
        dispatch: &dyn CommandDispatcher,
    ) -> DeviceResult<()> {
        self.update(inputs)?;
        self.trigger(dispatch)
    }
}
