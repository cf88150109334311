//! Lifecycle management for subprocess transport (open, close)

use std::sync::atomic::Ordering;

use crate::error::{BuildClientError, Result};
use crate::transport::{CompanionCommand, LineChannel};

use super::command::CommandBuilder;
use super::reader::spawn_stderr_forwarder;
use super::transport::SubprocessTransport;

impl SubprocessTransport {
    /// Spawn the companion and wire up its stdio
    ///
    /// A no-op if a process is already running.
    ///
    /// # Errors
    /// Returns `Launch` if spawning fails or a stdio handle is missing
    pub(super) async fn open_impl(&mut self, command: &CompanionCommand) -> Result<()> {
        if self.process.is_some() {
            return Ok(());
        }

        let mut cmd = CommandBuilder::new(command).build();

        let mut child = cmd.spawn().map_err(|e| {
            if let Some(ref cwd) = command.cwd
                && !cwd.exists()
            {
                return BuildClientError::launch(format!(
                    "Working directory does not exist: {}",
                    cwd.display()
                ));
            }
            BuildClientError::launch(format!(
                "Failed to start {} {}: {e}",
                command.interpreter.display(),
                command.script.display()
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BuildClientError::launch("Failed to get stdin handle"))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BuildClientError::launch("Failed to get stdout handle"))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| BuildClientError::launch("Failed to get stderr handle"))?;

        log::debug!(
            "Companion started (pid {:?}): {} {}",
            child.id(),
            command.interpreter.display(),
            command.script.display()
        );

        self.stderr_task = Some(spawn_stderr_forwarder(stderr));
        self.channel = Some(LineChannel::new(
            stdout,
            stdin,
            self.max_line_length,
            self.timeout,
        ));
        self.process = Some(child);
        self.ready.store(true, Ordering::SeqCst);

        Ok(())
    }

    /// Close stdin, give the companion the grace period to exit, then kill it
    ///
    /// # Errors
    /// Returns `Io` if waiting on the process fails
    pub(super) async fn close_impl(&mut self) -> Result<()> {
        self.ready.store(false, Ordering::SeqCst);

        // Closing stdin is the companion's cue to exit
        if let Some(mut channel) = self.channel.take() {
            let _ = channel.shutdown().await;
        }

        if let Some(mut child) = self.process.take() {
            match tokio::time::timeout(self.shutdown_grace, child.wait()).await {
                Ok(Ok(status)) => {
                    log::debug!("Companion exited: {status}");
                }
                Ok(Err(e)) => {
                    self.abort_stderr_task();
                    return Err(BuildClientError::Io(e));
                }
                Err(_) => {
                    log::warn!(
                        "Companion still running after {:?}, killing it",
                        self.shutdown_grace
                    );
                    let _ = child.kill().await;
                    let _ = child.wait().await;
                }
            }
        }

        self.abort_stderr_task();
        Ok(())
    }

    /// Handle Drop cleanup
    pub(super) fn drop_impl(&mut self) {
        self.ready.store(false, Ordering::SeqCst);

        // Dropping the channel closes stdin
        drop(self.channel.take());

        self.abort_stderr_task();

        if let Some(mut child) = self.process.take() {
            let _ = child.start_kill();
        }
    }

    fn abort_stderr_task(&mut self) {
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
    }
}
