//! Transport layer for communicating with the kernel build server
//!
//! This module provides the transport abstraction and the subprocess
//! implementation. A transport moves whole lines; it knows nothing about
//! tags, escapes or request keywords.

mod channel;
pub mod subprocess;

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;

pub use channel::LineChannel;
pub use subprocess::SubprocessTransport;

/// One read from the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A complete line, without its terminator
    Line(String),
    /// Nothing arrived within the configured timeout
    ///
    /// The owning session reacts to this by terminating the companion.
    TimedOut,
    /// The companion closed its output stream
    Closed,
}

/// Everything needed to launch the companion process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionCommand {
    /// Interpreter executable
    pub interpreter: PathBuf,
    /// Companion script passed as the only argument
    pub script: PathBuf,
    /// Extra environment variables
    pub env: HashMap<String, String>,
    /// Working directory
    pub cwd: Option<PathBuf>,
}

impl CompanionCommand {
    /// Create a command for `interpreter script`
    pub fn new(interpreter: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
            env: HashMap::new(),
            cwd: None,
        }
    }

    /// Argument vector, interpreter first
    #[must_use]
    pub fn argv(&self) -> [&OsStr; 2] {
        [self.interpreter.as_os_str(), self.script.as_os_str()]
    }
}

/// Duplex line transport to the companion process
///
/// A timed-out read is reported as [`Inbound::TimedOut`] rather than as an
/// error, so the session can tell the companion to exit on the same channel.
/// End of stream is [`Inbound::Closed`], so the session can report any
/// output it collected before the companion went away.
pub trait Transport: Send + Sync {
    /// Launch the companion and establish the duplex channel
    ///
    /// # Errors
    /// Returns `Launch` if the process or its pipes cannot be set up
    fn open(
        &mut self,
        command: &CompanionCommand,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Set how long [`Transport::read_line`] waits before reporting a timeout
    fn set_timeout(&mut self, timeout: Duration);

    /// Write one line; the terminator is added by the transport
    ///
    /// # Errors
    /// Returns error if the channel is not open or the write fails
    fn write_line(&mut self, line: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Read one line, or report that the timeout elapsed
    ///
    /// # Errors
    /// Returns error if the channel is not open or the read fails
    fn read_line(&mut self) -> impl std::future::Future<Output = Result<Inbound>> + Send;

    /// Check if transport is ready for communication
    fn is_ready(&self) -> bool;

    /// Shut the channel down and reap the companion
    ///
    /// # Errors
    /// Returns error if cleanup fails
    fn close(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;
}
