//! `BuildClient` for talking to the kernel build server
//!
//! This module provides the client that owns the session with the companion
//! process and exposes the build lifecycle:
//! - Output format negotiation (`FORMAT`)
//! - Support queries (`SUPPORT`)
//! - Job submission and polling (`START`, `WAIT`, `CONT`)
//! - Returning the companion to idle (`RESET`)
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                  BuildClient                   │
//! │                                                │
//! │   caller ──┐                                   │
//! │   caller ──┼──► Mutex<Session> ──► Transport ──┼──► companion
//! │   caller ──┘     (one exchange                 │    (stdin/stdout)
//! │                   at a time)                   │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! The lock is held for a whole request/response pair (for a finished
//! `WAIT`, for the poll and its `CONT` follow-ups), so concurrent callers can
//! never read each other's replies. A caller that gives up mid-exchange
//! costs the companion: the next operation restarts it rather than risk
//! reading the abandoned reply. Build one client per process and
//! share it by reference or `Arc`.
//!
//! # Example: Build Lifecycle
//!
//! ```no_run
//! use kernel_build_client::{BuildClient, ClientOptions, Payload, WaitStatus};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = BuildClient::new(ClientOptions::default());
//! let job = Payload::json(&serde_json::json!({"op": "add", "dtype": "float16"}))?;
//!
//! if client.check_supported(&job).await? {
//!     let format = client.select_format(&job).await?;
//!     log::info!("Selected format: {format}");
//!
//!     let task = client.start(&job).await?;
//!     if !task.is_failed() {
//!         loop {
//!             match client.wait().await? {
//!                 WaitStatus::Finished(outcome) => {
//!                     log::info!("Task {}: {}", outcome.task, outcome.result);
//!                     break;
//!                 }
//!                 WaitStatus::Waiting | WaitStatus::Continue => {}
//!             }
//!         }
//!     }
//! }
//!
//! client.reset().await?;
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

mod client_impl;
mod session;

use tokio::sync::Mutex;

use crate::transport::{SubprocessTransport, Transport};

pub use session::Session;

/// Client for the kernel build server
///
/// Operations open the session lazily. A failed exchange closes it; the next
/// operation starts a fresh companion.
pub struct BuildClient<T: Transport = SubprocessTransport> {
    /// Session guarded for the full duration of each exchange
    session: Mutex<Session<T>>,
}
