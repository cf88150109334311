//! Client options and configuration
//!
//! This module contains the configuration for the kernel build client,
//! including a builder pattern and environment variable layering.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BuildClientError, Result};

// ============================================================================
// Defaults
// ============================================================================

/// Python module that hosts the kernel build server
pub const DEFAULT_SERVER_MODULE: &str = "mindspore._extends.remote.kernel_build_server";

/// Expected suffix of the resolved companion script
pub const DEFAULT_SCRIPT_SUFFIX: &str = ".py";

/// Seconds to wait for one response before the session is terminated
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Seconds a closing companion gets to exit before it is killed
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// Default maximum length of a single protocol line (1MB)
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Interpreter names searched on `PATH` when none is configured
pub const INTERPRETER_CANDIDATES: &[&str] = &["python3", "python"];

/// Environment variable overriding the interpreter
pub const ENV_INTERPRETER: &str = "KERNEL_BUILD_PYTHON";
/// Environment variable overriding the server module
pub const ENV_SERVER_MODULE: &str = "KERNEL_BUILD_SERVER_MODULE";
/// Environment variable pinning the companion script path
pub const ENV_SCRIPT: &str = "KERNEL_BUILD_SCRIPT";
/// Environment variable overriding the response timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "KERNEL_BUILD_TIMEOUT_SECS";

// ============================================================================
// Client Options
// ============================================================================

/// Options for the kernel build client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Interpreter used for path resolution and for running the companion
    ///
    /// Searched on `PATH` when `None`.
    pub interpreter: Option<PathBuf>,
    /// Module name the resolution snippet looks up
    pub server_module: String,
    /// Pinned companion script; skips path resolution when set
    pub script_path: Option<PathBuf>,
    /// Suffix the resolved script path must end with
    pub script_suffix: String,
    /// How long to wait for each response
    pub timeout: Duration,
    /// How long a closing companion gets before it is killed
    pub shutdown_grace: Duration,
    /// Maximum length of one protocol line
    pub max_line_length: usize,
    /// Extra environment variables for the companion process
    pub env: HashMap<String, String>,
    /// Working directory for the companion process
    pub cwd: Option<PathBuf>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            interpreter: None,
            server_module: DEFAULT_SERVER_MODULE.to_string(),
            script_path: None,
            script_suffix: DEFAULT_SCRIPT_SUFFIX.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            env: HashMap::new(),
            cwd: None,
        }
    }
}

impl ClientOptions {
    /// Create a new builder for `ClientOptions`
    #[must_use]
    pub fn builder() -> ClientOptionsBuilder {
        ClientOptionsBuilder::default()
    }

    /// Defaults with the `KERNEL_BUILD_*` environment variables layered on top
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `KERNEL_BUILD_TIMEOUT_SECS` is not a positive integer
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Layer overrides from an arbitrary key lookup over the defaults
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the timeout value is not a positive integer
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut options = Self::default();

        if let Some(interpreter) = lookup(ENV_INTERPRETER).filter(|v| !v.is_empty()) {
            options.interpreter = Some(PathBuf::from(interpreter));
        }
        if let Some(module) = lookup(ENV_SERVER_MODULE).filter(|v| !v.is_empty()) {
            options.server_module = module;
        }
        if let Some(script) = lookup(ENV_SCRIPT).filter(|v| !v.is_empty()) {
            options.script_path = Some(PathBuf::from(script));
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    BuildClientError::invalid_config(format!(
                        "{ENV_TIMEOUT_SECS} must be a positive integer, got {raw:?}"
                    ))
                })?;
            options.timeout = Duration::from_secs(secs);
        }

        Ok(options)
    }

    /// Check the options for values the client cannot work with
    ///
    /// # Errors
    /// Returns `InvalidConfig` describing the first offending field
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(BuildClientError::invalid_config("timeout must be non-zero"));
        }
        if self.max_line_length == 0 {
            return Err(BuildClientError::invalid_config(
                "max_line_length must be non-zero",
            ));
        }
        if self.script_path.is_none() && self.server_module.trim().is_empty() {
            return Err(BuildClientError::invalid_config(
                "server_module is required when no script_path is pinned",
            ));
        }
        if self.server_module.contains(['"', '\'', '\\']) {
            return Err(BuildClientError::invalid_config(format!(
                "server_module contains quote characters: {:?}",
                self.server_module
            )));
        }
        Ok(())
    }

    /// Resolve the interpreter, searching `PATH` when none is configured
    ///
    /// # Errors
    /// Returns `Resolution` if no candidate interpreter is found
    pub fn resolve_interpreter(&self) -> Result<PathBuf> {
        if let Some(ref interpreter) = self.interpreter {
            return Ok(interpreter.clone());
        }

        for candidate in INTERPRETER_CANDIDATES {
            if let Ok(path) = which::which(candidate) {
                return Ok(path);
            }
        }

        Err(BuildClientError::resolution(format!(
            "no interpreter found on PATH (tried {}), set {ENV_INTERPRETER}",
            INTERPRETER_CANDIDATES.join(", ")
        )))
    }
}

// ============================================================================
// Builder for ClientOptions
// ============================================================================

/// Builder for `ClientOptions`
#[derive(Debug, Default)]
pub struct ClientOptionsBuilder {
    options: ClientOptions,
}

impl ClientOptionsBuilder {
    /// Set the interpreter
    #[must_use]
    pub fn interpreter(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.interpreter = Some(path.into());
        self
    }

    /// Set the server module looked up during path resolution
    #[must_use]
    pub fn server_module(mut self, module: impl Into<String>) -> Self {
        self.options.server_module = module.into();
        self
    }

    /// Pin the companion script and skip path resolution
    #[must_use]
    pub fn script_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.script_path = Some(path.into());
        self
    }

    /// Set the required script suffix
    #[must_use]
    pub fn script_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.options.script_suffix = suffix.into();
        self
    }

    /// Set the per-response timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set the shutdown grace period
    #[must_use]
    pub const fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.options.shutdown_grace = grace;
        self
    }

    /// Set the maximum protocol line length
    #[must_use]
    pub const fn max_line_length(mut self, len: usize) -> Self {
        self.options.max_line_length = len;
        self
    }

    /// Add an environment variable for the companion process
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.insert(key.into(), value.into());
        self
    }

    /// Set working directory
    #[must_use]
    pub fn cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(path.into());
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> ClientOptions {
        self.options
    }
}
