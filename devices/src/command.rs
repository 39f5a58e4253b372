//! Command dispatch glue between input detectors and the host transport.
//!
//! Detectors never talk to the serial link themselves. They hold opaque
//! [CommandHandle]s obtained from a [CommandRegistry] at configuration
//! time and hand them to a [CommandDispatcher] when a transition fires.

use std::cell::RefCell;
use std::fmt;

use log::info;

use crate::DeviceResult;

/// Opaque identifier for a host-side action.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct CommandHandle(i32);

impl CommandHandle {
    pub fn new(raw: i32) -> Self {
        CommandHandle(raw)
    }

    pub fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for CommandHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Maps symbolic host action names to handles. Called once per device
/// during panel configuration.
pub trait CommandRegistry {
    fn register_command(&mut self, name: &str) -> DeviceResult<CommandHandle>;
}

/// Sink for detector transitions.
///
/// `command_start`/`command_end` bracket a held button so the host can
/// mirror its state; `command_trigger` fires a one-shot action.
/// Implementations must not block: dispatch happens synchronously on
/// the polling thread.
pub trait CommandDispatcher {
    fn command_start(&self, cmd: CommandHandle) -> DeviceResult<()>;
    fn command_end(&self, cmd: CommandHandle) -> DeviceResult<()>;
    fn command_trigger(&self, cmd: CommandHandle) -> DeviceResult<()>;
}

/// Registry and dispatcher that only logs, for bring-up without a host
/// connection.
#[derive(Debug, Default)]
pub struct LogDispatcher {
    next: i32,
}

impl CommandRegistry for LogDispatcher {
    fn register_command(&mut self, name: &str) -> DeviceResult<CommandHandle> {
        let handle = CommandHandle(self.next);
        self.next += 1;
        info!("registered command {:?} as {}", name, handle);
        Ok(handle)
    }
}

impl CommandDispatcher for LogDispatcher {
    fn command_start(&self, cmd: CommandHandle) -> DeviceResult<()> {
        info!("command {} start", cmd);
        Ok(())
    }

    fn command_end(&self, cmd: CommandHandle) -> DeviceResult<()> {
        info!("command {} end", cmd);
        Ok(())
    }

    fn command_trigger(&self, cmd: CommandHandle) -> DeviceResult<()> {
        info!("command {} trigger", cmd);
        Ok(())
    }
}

/// One dispatch captured by a [RecordingDispatcher].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Dispatch {
    Start(CommandHandle),
    End(CommandHandle),
    Trigger(CommandHandle),
}

/// Dispatcher that records everything it receives, for tests and
/// offline panel verification.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    events: RefCell<Vec<Dispatch>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all dispatches since the last call, oldest first.
    pub fn take(&self) -> Vec<Dispatch> {
        self.events.take()
    }
}

impl CommandDispatcher for RecordingDispatcher {
    fn command_start(&self, cmd: CommandHandle) -> DeviceResult<()> {
        self.events.borrow_mut().push(Dispatch::Start(cmd));
        Ok(())
    }

    fn command_end(&self, cmd: CommandHandle) -> DeviceResult<()> {
        self.events.borrow_mut().push(Dispatch::End(cmd));
        Ok(())
    }

    fn command_trigger(&self, cmd: CommandHandle) -> DeviceResult<()> {
        self.events.borrow_mut().push(Dispatch::Trigger(cmd));
        Ok(())
    }
}
