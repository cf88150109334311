//! Error types for the kernel build client

use thiserror::Error;

/// Main error type for the kernel build client
///
/// Every variant is terminal for the current session. Job-level failures
/// reported by the companion (the `ERR` token, error descriptions) are carried
/// as ordinary reply values and never show up here.
#[derive(Error, Debug)]
pub enum BuildClientError {
    /// Companion script path could not be resolved
    #[error("Script resolution failed: {0}")]
    Resolution(String),

    /// Companion process could not be launched
    #[error("Launch failed: {0}")]
    Launch(String),

    /// Protocol traffic attempted on a closed session
    #[error("Session is not open: {0}")]
    NotOpen(String),

    /// Response did not contain the tag literal
    #[error("Framing error, no tag in response: {response:?}")]
    Framing {
        /// Raw response text as read from the transport
        response: String,
    },

    /// Companion did not answer within the configured window
    #[error("Timeout: no response to {request:?} within {seconds}s")]
    Timeout {
        /// Keyword of the request that was awaiting a response
        request: String,
        /// Configured timeout in seconds
        seconds: u64,
    },

    /// Transport layer error (broken pipe, EOF, oversized line)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request could not be rendered as a single protocol line
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Reply could not be decoded into the operation's result type
    #[error("Unexpected reply to {request}: {reply:?}")]
    UnexpectedReply {
        /// Request keyword
        request: String,
        /// Decoded reply payload
        reply: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode error when building a payload
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for kernel build client operations
pub type Result<T> = std::result::Result<T, BuildClientError>;

impl BuildClientError {
    /// Create a resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a launch error
    pub fn launch(msg: impl Into<String>) -> Self {
        Self::Launch(msg.into())
    }

    /// Create a not-open error
    pub fn not_open(msg: impl Into<String>) -> Self {
        Self::NotOpen(msg.into())
    }

    /// Create a framing error
    pub fn framing(response: impl Into<String>) -> Self {
        Self::Framing {
            response: response.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(request: impl Into<String>, timeout: std::time::Duration) -> Self {
        Self::Timeout {
            request: request.into(),
            seconds: timeout.as_secs(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an unexpected reply error
    pub fn unexpected_reply(request: impl Into<String>, reply: impl Into<String>) -> Self {
        Self::UnexpectedReply {
            request: request.into(),
            reply: reply.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether this error means the build infrastructure itself is broken
    ///
    /// Infrastructure errors leave the session unusable; the caller has to
    /// reopen and resubmit. `InvalidRequest` and `InvalidConfig` are caller
    /// mistakes that never touched the channel.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        !matches!(
            self,
            Self::InvalidRequest(_) | Self::InvalidConfig(_) | Self::Json(_)
        )
    }
}
