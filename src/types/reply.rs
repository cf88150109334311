//! Decoded replies from the companion process
//!
//! A reply is either one of the fixed control tokens, which are compared and
//! returned verbatim, or free text that has already been unescaped.

use std::fmt;

use crate::error::{BuildClientError, Result};
use crate::types::identifiers::TaskId;

// ============================================================================
// Control Tokens
// ============================================================================

/// Protocol status tokens that are never escaped or unescaped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlToken {
    /// `Success`
    Success,
    /// `ACK`
    Ack,
    /// `ERR`
    Err,
    /// `True`
    True,
}

impl ControlToken {
    /// All control tokens, in match order
    pub const ALL: [Self; 4] = [Self::Success, Self::Ack, Self::Err, Self::True];

    /// Wire spelling of the token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Ack => "ACK",
            Self::Err => "ERR",
            Self::True => "True",
        }
    }

    /// Match a raw payload exactly against the control tokens
    #[must_use]
    pub fn from_wire(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|token| token.as_str() == raw)
    }
}

impl fmt::Display for ControlToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Reply
// ============================================================================

/// One decoded response payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Payload was exactly a control token
    Control(ControlToken),
    /// Free-form payload with escapes reverted
    Text(String),
}

impl Reply {
    /// Check whether the reply is the given control token
    #[must_use]
    pub fn is(&self, token: ControlToken) -> bool {
        matches!(self, Self::Control(t) if *t == token)
    }

    /// Borrow the payload as it should be presented to callers
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Control(token) => token.as_str(),
            Self::Text(text) => text,
        }
    }

    /// Consume the reply into its payload string
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::Control(token) => token.as_str().to_string(),
            Self::Text(text) => text,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Wait Status
// ============================================================================

/// Reserved reply meaning the job is still running
pub const WAIT_TOKEN: &str = "WAIT";
/// Reserved reply meaning the caller should poll again
pub const CONT_TOKEN: &str = "CONT";

/// How the companion answered a `WAIT` poll, before any follow-up exchange
///
/// `WAIT` and `CONT` are reserved words: a reply spelled exactly like either
/// is always a status, never a job result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitReply {
    /// `WAIT`: the job is still running
    Waiting,
    /// `CONT`: poll again
    Continue,
    /// `ACK`: a task finished and its details follow on `CONT` exchanges
    Finished,
    /// Any other payload is the final result of the current job
    Result(String),
}

impl WaitReply {
    /// Classify a decoded reply to `WAIT`
    #[must_use]
    pub fn from_reply(reply: Reply) -> Self {
        match reply {
            Reply::Text(text) if text == WAIT_TOKEN => Self::Waiting,
            Reply::Text(text) if text == CONT_TOKEN => Self::Continue,
            Reply::Control(ControlToken::Ack) => Self::Finished,
            other => Self::Result(other.into_string()),
        }
    }
}

/// Result of a finished build task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Task the result belongs to
    pub task: TaskId,
    /// Build result (may be a job-level error such as `ERR`)
    pub result: String,
    /// Result of the pre-build step, empty when the companion sent none
    pub pre_build_result: String,
}

impl TaskOutcome {
    /// Decode the three `CONT` replies that follow an `ACK` to `WAIT`
    ///
    /// # Errors
    /// Returns `UnexpectedReply` if the first reply is not an integer task id
    pub fn from_details(task: Reply, result: Reply, pre_build_result: Reply) -> Result<Self> {
        let task = match task {
            Reply::Text(ref text) => text
                .parse::<TaskId>()
                .map_err(|_| BuildClientError::unexpected_reply(CONT_TOKEN, text.as_str()))?,
            Reply::Control(token) => {
                return Err(BuildClientError::unexpected_reply(CONT_TOKEN, token.as_str()));
            }
        };
        Ok(Self {
            task,
            result: result.into_string(),
            pre_build_result: pre_build_result.into_string(),
        })
    }

    /// Whether the build result is the `ERR` token
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.result == ControlToken::Err.as_str()
    }
}

/// Outcome of one `WAIT` poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitStatus {
    /// The companion is still working on the job
    Waiting,
    /// The companion has more to report; poll again
    Continue,
    /// A task finished
    Finished(TaskOutcome),
}

impl WaitStatus {
    /// Whether polling should stop
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }

    /// Whether the task finished with the `ERR` token
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Finished(outcome) if outcome.is_error())
    }
}
