//! Configuration constants for subprocess transport

/// Environment variables that are never passed through to the companion
///
/// These change how the interpreter starts up or which code it loads, and
/// some of them (`PYTHONINSPECT`) turn the companion into an interactive
/// prompt that breaks the line protocol.
pub const BLOCKED_ENV_VARS: &[&str] = &[
    "LD_PRELOAD",
    "DYLD_INSERT_LIBRARIES",
    "PYTHONSTARTUP",
    "PYTHONINSPECT",
];

/// Variables always set for the companion
///
/// Replies must reach the pipe as soon as they are printed.
pub const FORCED_ENV_VARS: &[(&str, &str)] = &[("PYTHONUNBUFFERED", "1")];

/// Log target for lines the companion writes to stderr
pub const COMPANION_LOG_TARGET: &str = "kernel_build_client::companion";
