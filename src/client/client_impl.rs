//! `BuildClient` implementation
//!
//! This module contains the constructors, session control and build
//! lifecycle methods for `BuildClient`.

use tokio::sync::{Mutex, MutexGuard};

use crate::error::{BuildClientError, Result};
use crate::protocol::{Payload, Request};
use crate::transport::{SubprocessTransport, Transport};
use crate::types::identifiers::TaskId;
use crate::types::options::ClientOptions;
use crate::types::reply::{ControlToken, Reply, TaskOutcome, WaitReply, WaitStatus};

use super::Session;

impl super::BuildClient<SubprocessTransport> {
    /// Create a client that launches the companion as a subprocess
    #[must_use]
    pub fn new(options: ClientOptions) -> Self {
        let transport = SubprocessTransport::from_options(&options);
        Self::with_transport(transport, options)
    }

    /// Create a subprocess client configured from `KERNEL_BUILD_*` variables
    ///
    /// # Errors
    /// Returns `InvalidConfig` if an override cannot be parsed
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ClientOptions::from_env()?))
    }
}

impl<T: Transport> super::BuildClient<T> {
    /// Create a client over an arbitrary transport
    pub fn with_transport(transport: T, options: ClientOptions) -> Self {
        Self {
            session: Mutex::new(Session::new(transport, options)),
        }
    }

    /// Open the session if it is not open yet
    ///
    /// # Errors
    /// Returns `Resolution` or `Launch` if the companion cannot be started
    pub async fn open(&self) -> Result<()> {
        self.session.lock().await.open().await
    }

    /// Close the session if it is open
    ///
    /// # Errors
    /// Returns error if transport cleanup fails
    pub async fn close(&self) -> Result<()> {
        self.session.lock().await.close().await
    }

    /// Check whether the session is open
    pub async fn is_open(&self) -> bool {
        self.session.lock().await.is_open()
    }

    /// Send a raw request line on an already open session
    ///
    /// Unlike the build operations this never opens the session.
    ///
    /// # Errors
    /// Returns `NotOpen` if the session is closed
    pub async fn send_request(&self, line: &str) -> Result<Reply> {
        self.session.lock().await.send_raw(line).await
    }

    /// Ask the companion which output format it selects for `job`
    ///
    /// # Errors
    /// Returns error if the session cannot be opened or the exchange fails
    pub async fn select_format(&self, job: &Payload) -> Result<String> {
        let reply = self.call(Request::Format(job.clone())).await?;
        Ok(reply.into_string())
    }

    /// Ask the companion whether it can build `job`
    ///
    /// Anything other than the `True` token counts as unsupported.
    ///
    /// # Errors
    /// Returns error if the session cannot be opened or the exchange fails
    pub async fn check_supported(&self, job: &Payload) -> Result<bool> {
        let reply = self.call(Request::Support(job.clone())).await?;
        Ok(reply.is(ControlToken::True))
    }

    /// Submit `job` for building
    ///
    /// Returns [`TaskId::FAILED`] when the companion answers `-1` or `ERR`.
    /// A started task becomes the current task that [`Self::wait`] reports on.
    ///
    /// # Errors
    /// Returns `UnexpectedReply` if the reply is not an integer
    pub async fn start(&self, job: &Payload) -> Result<TaskId> {
        let request = Request::Start(job.clone());
        let keyword = request.keyword();
        let mut session = self.locked().await?;
        let reply = session.request(&request).await?;

        let task = match reply {
            Reply::Control(ControlToken::Err) => TaskId::FAILED,
            Reply::Text(ref text) => text
                .parse::<TaskId>()
                .map_err(|_| BuildClientError::unexpected_reply(keyword, text.as_str()))?,
            Reply::Control(token) => {
                return Err(BuildClientError::unexpected_reply(keyword, token.as_str()));
            }
        };

        if task.is_failed() {
            log::error!("{keyword} failed, companion could not start the job");
        } else {
            session.set_current_task(Some(task));
        }
        Ok(task)
    }

    /// Poll the companion for the current job
    ///
    /// An `ACK` is followed by three `CONT` exchanges under the same lock
    /// that fetch the task id, result and pre-build result. A bare result
    /// string belongs to the task last returned by [`Self::start`].
    ///
    /// # Errors
    /// Returns `UnexpectedReply` if a bare result arrives while no task is
    /// running or the task id is not an integer, otherwise as any exchange
    pub async fn wait(&self) -> Result<WaitStatus> {
        let mut session = self.locked().await?;
        let reply = session.request(&Request::Wait).await?;

        let outcome = match WaitReply::from_reply(reply) {
            WaitReply::Waiting => return Ok(WaitStatus::Waiting),
            WaitReply::Continue => return Ok(WaitStatus::Continue),
            WaitReply::Finished => {
                let task = session.request(&Request::Cont).await?;
                let result = session.request(&Request::Cont).await?;
                let pre_build_result = session.request(&Request::Cont).await?;
                TaskOutcome::from_details(task, result, pre_build_result)?
            }
            WaitReply::Result(result) => {
                let Some(task) = session.current_task() else {
                    return Err(BuildClientError::unexpected_reply(
                        Request::Wait.keyword(),
                        result,
                    ));
                };
                TaskOutcome {
                    task,
                    result,
                    pre_build_result: String::new(),
                }
            }
        };

        if session.current_task() == Some(outcome.task) {
            session.set_current_task(None);
        }
        log::debug!("Task {} finished: {}", outcome.task, outcome.result);
        Ok(WaitStatus::Finished(outcome))
    }

    /// Abandon the in-flight job and return the companion to idle
    ///
    /// # Errors
    /// Returns `UnexpectedReply` if the companion does not acknowledge
    pub async fn reset(&self) -> Result<()> {
        let request = Request::Reset;
        let keyword = request.keyword();
        let mut session = self.locked().await?;
        let reply = session.request(&request).await?;
        if reply.is(ControlToken::Ack) {
            session.set_current_task(None);
            Ok(())
        } else {
            Err(BuildClientError::unexpected_reply(keyword, reply.into_string()))
        }
    }

    /// Task started on the current companion whose result is still pending
    pub async fn current_task(&self) -> Option<TaskId> {
        self.session.lock().await.current_task()
    }

    /// Lock the session for one operation and open it if needed
    async fn locked(&self) -> Result<MutexGuard<'_, Session<T>>> {
        let mut session = self.session.lock().await;
        session.open().await?;
        Ok(session)
    }

    /// Open lazily, then run one exchange under the session lock
    async fn call(&self, request: Request) -> Result<Reply> {
        self.locked().await?.request(&request).await
    }
}
