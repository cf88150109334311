//! # Kernel Build Client
//!
//! Client driver for the out-of-process kernel build server. The server is a
//! long-lived Python companion that compiles operator kernels; this crate
//! locates it, launches it, and speaks its line protocol over stdin/stdout.
//!
//! ## Quick Start
//!
//! ```no_run
//! use kernel_build_client::{BuildClient, ClientOptions, Payload};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BuildClient::new(ClientOptions::default());
//!     let job = Payload::new(r#"{"op":"add"}"#)?;
//!
//!     if client.check_supported(&job).await? {
//!         log::info!("Format: {}", client.select_format(&job).await?);
//!     }
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Protocol
//!
//! Requests are single lines, `<KEYWORD>[ <payload>]`. Each request gets
//! exactly one tagged response line. Untagged lines before it, and anything
//! before the `[~]` tag on it, are diagnostic noise and are dropped; the
//! timeout covers the whole response. Free-form replies escape newline,
//! carriage return and space as `[LF]`, `[CR]` and `[SP]`. The control
//! tokens `Success`, `ACK`, `ERR` and `True` are never escaped.
//!
//! | Operation | Request | Result |
//! |---|---|---|
//! | [`BuildClient::select_format`] | `FORMAT <job>` | format string |
//! | [`BuildClient::check_supported`] | `SUPPORT <job>` | `bool` |
//! | [`BuildClient::start`] | `START <job>` | [`TaskId`] |
//! | [`BuildClient::wait`] | `WAIT` | [`WaitStatus`] |
//! | [`BuildClient::reset`] | `RESET` | `()` |
//!
//! When `WAIT` is answered with `ACK`, the client fetches the finished task's
//! id, result and pre-build result with three `CONT` requests while still
//! holding the session, and returns them as one [`TaskOutcome`].
//!
//! If the companion does not answer within the timeout (20 seconds by
//! default) the client sends `FIN`, closes the session and returns
//! [`BuildClientError::Timeout`].
//!
//! ## Architecture
//!
//! - [`client`]: Session lifecycle and build operations
//! - [`protocol`]: Request rendering, response decoding, escaping
//! - [`resolve`]: Locating the companion script through the interpreter
//! - [`transport`]: Duplex line transport and the subprocess implementation
//! - [`types`]: Options, replies, identifiers
//! - [`error`]: Error types
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, BuildClientError>`](Result).
//! Every error is terminal for the session; reopen and resubmit to recover.
//! Job-level failures such as `ERR` are ordinary reply values.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod protocol;
pub mod resolve;
pub mod transport;
pub mod types;

// Re-export commonly used types for external API
pub use client::{BuildClient, Session};
pub use error::{BuildClientError, Result};
pub use protocol::{Payload, Request};
pub use transport::{CompanionCommand, Inbound, SubprocessTransport, Transport};
pub use types::{
    ClientOptions, ClientOptionsBuilder, ControlToken, Reply, TaskId, TaskOutcome, WaitReply,
    WaitStatus,
};

/// Version of the client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
