//! Type definitions for the kernel build client
//!
//! - [`identifiers`] - Type-safe ID wrappers (`TaskId`)
//! - [`options`] - Client configuration and builder
//! - [`reply`] - Control tokens, decoded replies and poll outcomes

pub mod identifiers;
pub mod options;
pub mod reply;

// Re-export commonly used types
pub use identifiers::TaskId;
pub use options::{ClientOptions, ClientOptionsBuilder};
pub use reply::{ControlToken, Reply, TaskOutcome, WaitReply, WaitStatus};
