//! Subprocess transport implementation for the kernel build server

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::task::JoinHandle;

use crate::error::{BuildClientError, Result};
use crate::transport::{CompanionCommand, Inbound, LineChannel, Transport};
use crate::types::options::{
    ClientOptions, DEFAULT_MAX_LINE_LENGTH, DEFAULT_SHUTDOWN_GRACE_SECS, DEFAULT_TIMEOUT_SECS,
};

/// Subprocess transport for the kernel build server
pub struct SubprocessTransport {
    pub(super) process: Option<Child>,
    pub(super) channel: Option<LineChannel<ChildStdout, ChildStdin>>,
    pub(super) ready: Arc<AtomicBool>,
    pub(super) timeout: Duration,
    pub(super) shutdown_grace: Duration,
    pub(super) max_line_length: usize,
    pub(super) stderr_task: Option<JoinHandle<()>>,
}

impl SubprocessTransport {
    /// Create a transport with default limits
    #[must_use]
    pub fn new() -> Self {
        Self {
            process: None,
            channel: None,
            ready: Arc::new(AtomicBool::new(false)),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            stderr_task: None,
        }
    }

    /// Create a transport using the limits from `options`
    #[must_use]
    pub fn from_options(options: &ClientOptions) -> Self {
        let mut transport = Self::new();
        transport.timeout = options.timeout;
        transport.shutdown_grace = options.shutdown_grace;
        transport.max_line_length = options.max_line_length;
        transport
    }

    /// OS process id of the running companion
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(Child::id)
    }

    fn channel_mut(&mut self) -> Result<&mut LineChannel<ChildStdout, ChildStdin>> {
        if !self.is_ready() {
            return Err(BuildClientError::transport("Transport is not ready"));
        }
        self.channel
            .as_mut()
            .ok_or_else(|| BuildClientError::transport("stdio not available"))
    }
}

impl Default for SubprocessTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SubprocessTransport {
    async fn open(&mut self, command: &CompanionCommand) -> Result<()> {
        self.open_impl(command).await
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
        if let Some(ref mut channel) = self.channel {
            channel.set_timeout(timeout);
        }
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.channel_mut()?.write_line(line).await
    }

    async fn read_line(&mut self) -> Result<Inbound> {
        self.channel_mut()?.read_line().await
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn close(&mut self) -> Result<()> {
        self.close_impl().await
    }
}

impl Drop for SubprocessTransport {
    fn drop(&mut self) {
        self.drop_impl();
    }
}
