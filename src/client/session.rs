//! Session lifecycle and the request/response primitive
//!
//! A session owns one transport. Every exchange is one request line followed
//! by exactly one tagged response line, so the Nth reply always belongs to
//! the Nth request. Untagged lines before it are diagnostic noise. Any
//! failure in the middle of an exchange tears the session down, because the
//! next line on the channel could be a stale reply. So does an exchange whose
//! caller went away before the reply arrived.

use crate::error::{BuildClientError, Result};
use crate::protocol::{Request, TAG, check_single_line, decode_response};
use crate::resolve::resolve_script_path;
use crate::transport::{CompanionCommand, Inbound, Transport};
use crate::types::identifiers::TaskId;
use crate::types::options::ClientOptions;
use crate::types::reply::Reply;

/// Noise lines kept for error context; later ones are only logged
const NOISE_CONTEXT_LINES: usize = 32;

/// One logical connection to a companion process
pub struct Session<T: Transport> {
    transport: T,
    options: ClientOptions,
    open: bool,
    /// Set while a request is written but its reply not yet consumed
    in_flight: bool,
    /// Job most recently started on this companion and not yet reported
    current_task: Option<TaskId>,
}

/// Outcome of reading up to the next tagged line
enum Tagged {
    Line(String),
    TimedOut,
}

impl<T: Transport> Session<T> {
    /// Create a closed session over `transport`
    pub fn new(transport: T, options: ClientOptions) -> Self {
        Self {
            transport,
            options,
            open: false,
            in_flight: false,
            current_task: None,
        }
    }

    /// Whether protocol traffic is currently allowed
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Options the session was created with
    #[must_use]
    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Borrow the underlying transport
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Job started on the current companion whose result is still pending
    #[must_use]
    pub const fn current_task(&self) -> Option<TaskId> {
        self.current_task
    }

    pub(crate) fn set_current_task(&mut self, task: Option<TaskId>) {
        self.current_task = task;
    }

    /// Resolve the companion script, launch it and arm the response timeout
    ///
    /// A no-op on an open session.
    ///
    /// # Errors
    /// Returns `InvalidConfig`, `Resolution` or `Launch`; the session stays closed
    pub async fn open(&mut self) -> Result<()> {
        self.discard_abandoned().await;
        if self.open {
            return Ok(());
        }

        self.options.validate()?;
        let interpreter = self.options.resolve_interpreter()?;

        let script = match self.options.script_path {
            Some(ref script) => script.clone(),
            None => {
                resolve_script_path(
                    &interpreter,
                    &self.options.server_module,
                    &self.options.script_suffix,
                    self.options.timeout,
                )
                .await?
            }
        };

        let command = CompanionCommand {
            interpreter,
            script,
            env: self.options.env.clone(),
            cwd: self.options.cwd.clone(),
        };

        self.transport.open(&command).await?;
        self.transport.set_timeout(self.options.timeout);
        self.open = true;

        log::info!(
            "Kernel build session open: {} {}",
            command.interpreter.display(),
            command.script.display()
        );
        Ok(())
    }

    /// Shut the transport down; a no-op on a closed session
    ///
    /// # Errors
    /// Returns the transport's cleanup error; the session is closed regardless
    pub async fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.in_flight = false;
        self.current_task = None;
        log::info!("Closing kernel build session");
        self.transport.close().await
    }

    /// Send a typed request and wait for its reply
    ///
    /// # Errors
    /// Returns `NotOpen` on a closed session, `Timeout` or `Framing` on a
    /// failed exchange, or the transport's error
    pub async fn request(&mut self, request: &Request) -> Result<Reply> {
        self.exchange(&request.to_line(), request.keyword()).await
    }

    /// Send a raw, pre-formatted request line and wait for its reply
    ///
    /// # Errors
    /// Returns `InvalidRequest` for multi-line input, otherwise as [`Session::request`]
    pub async fn send_raw(&mut self, line: &str) -> Result<Reply> {
        check_single_line(line)?;
        let keyword = line.split(' ').next().unwrap_or_default();
        self.exchange(line, keyword).await
    }

    async fn exchange(&mut self, line: &str, keyword: &str) -> Result<Reply> {
        self.discard_abandoned().await;
        self.send(line).await?;
        match self.receive(keyword).await {
            Ok(reply) => {
                self.in_flight = false;
                Ok(reply)
            }
            Err(e) => {
                if self.open {
                    log::error!("{keyword} failed, dropping session: {e}");
                    self.teardown().await;
                }
                Err(e)
            }
        }
    }

    async fn send(&mut self, line: &str) -> Result<()> {
        if !self.open {
            return Err(BuildClientError::not_open(format!(
                "tried to send {line:?} before open"
            )));
        }
        log::debug!("-> [{line}]");
        self.in_flight = true;
        if let Err(e) = self.transport.write_line(line).await {
            self.teardown().await;
            return Err(e);
        }
        Ok(())
    }

    async fn receive(&mut self, keyword: &str) -> Result<Reply> {
        if !self.open {
            return Err(BuildClientError::not_open(format!(
                "tried to read the response to {keyword} before open"
            )));
        }

        // One deadline covers the noise and the tagged line
        let read = Self::read_tagged(&mut self.transport, keyword);
        match tokio::time::timeout(self.options.timeout, read).await {
            Ok(Ok(Tagged::Line(line))) => {
                let reply = decode_response(&line)?;
                log::debug!("<- [{reply}]");
                Ok(reply)
            }
            Ok(Err(e)) => Err(e),
            Ok(Ok(Tagged::TimedOut)) | Err(_) => {
                self.terminate(keyword).await;
                Err(BuildClientError::timeout(keyword, self.options.timeout))
            }
        }
    }

    /// Skip noise lines until one carries the tag
    ///
    /// # Errors
    /// Returns `Framing` with the collected noise if the companion closes its
    /// output before tagging a line, or `Transport` if it printed nothing
    async fn read_tagged(transport: &mut T, keyword: &str) -> Result<Tagged> {
        let mut noise: Vec<String> = Vec::new();
        loop {
            match transport.read_line().await? {
                Inbound::Line(line) if line.contains(TAG) => return Ok(Tagged::Line(line)),
                Inbound::Line(line) => {
                    log::debug!("<- noise while awaiting {keyword}: {line}");
                    if noise.len() < NOISE_CONTEXT_LINES {
                        noise.push(line);
                    }
                }
                Inbound::TimedOut => return Ok(Tagged::TimedOut),
                Inbound::Closed if noise.is_empty() => {
                    return Err(BuildClientError::transport(format!(
                        "companion closed its output stream before answering {keyword}"
                    )));
                }
                Inbound::Closed => return Err(BuildClientError::framing(noise.join("\n"))),
            }
        }
    }

    /// Best-effort `FIN` on the same channel, then close
    async fn terminate(&mut self, keyword: &str) {
        log::warn!(
            "No response to {keyword} within {:?}, sending {}",
            self.options.timeout,
            Request::Fin.keyword()
        );
        self.finish().await;
    }

    /// Drop a companion whose last exchange was cancelled by its caller
    ///
    /// Its reply may still arrive on the channel, where the next exchange
    /// would take it for its own.
    async fn discard_abandoned(&mut self) {
        if !self.in_flight {
            return;
        }
        log::warn!(
            "Previous exchange was cancelled before its reply arrived, restarting companion"
        );
        if self.open {
            self.finish().await;
        } else {
            self.in_flight = false;
        }
    }

    async fn finish(&mut self) {
        if let Err(e) = self.transport.write_line(&Request::Fin.to_line()).await {
            log::warn!("Could not send {}: {e}", Request::Fin.keyword());
        }
        self.teardown().await;
    }

    async fn teardown(&mut self) {
        self.open = false;
        self.in_flight = false;
        self.current_task = None;
        if let Err(e) = self.transport.close().await {
            log::warn!("Error while closing transport: {e}");
        }
    }
}
