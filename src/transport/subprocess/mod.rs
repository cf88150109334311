//! Subprocess transport implementation
//!
//! This module provides a transport implementation that spawns the kernel
//! build server as a subprocess and talks to it over stdin/stdout. Stderr is
//! forwarded to the log.

mod command;
mod config;
mod lifecycle;
mod reader;
mod transport;

// Re-export public types
pub use config::{BLOCKED_ENV_VARS, COMPANION_LOG_TARGET};
pub use transport::SubprocessTransport;
