//! Companion script path resolution
//!
//! The interpreter is asked, out of process, where the server module lives.
//! The probe prints `[~]<path>` on its own line; every other line of output
//! is ignored.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{BuildClientError, Result};
use crate::protocol::TAG;

/// Inline probe handed to the interpreter with `-c`
#[must_use]
pub fn probe_snippet(module: &str) -> String {
    format!(
        "import importlib.util;\
         spec = importlib.util.find_spec(\"{module}\");\
         print('{TAG}' + spec.origin)"
    )
}

/// Pick the resolved path out of the probe's standard output
///
/// The first line starting with the tag wins; the tag and the line ending
/// are stripped.
///
/// # Errors
/// Returns `Resolution` if no line is tagged or the path lacks `suffix`
pub fn parse_script_path(stdout: &str, suffix: &str) -> Result<PathBuf> {
    let path = stdout
        .lines()
        .find_map(|line| line.strip_prefix(TAG))
        .map(|rest| rest.trim_end_matches(['\r', '\n']))
        .ok_or_else(|| {
            BuildClientError::resolution(format!("no line tagged {TAG} in probe output"))
        })?;

    if path.is_empty() || !path.ends_with(suffix) {
        return Err(BuildClientError::resolution(format!(
            "resolved path {path:?} does not end with {suffix:?}"
        )));
    }

    Ok(PathBuf::from(path))
}

/// Run the probe and return the companion script path
///
/// # Errors
/// Returns `Resolution` if the probe cannot be started, does not finish
/// within `timeout`, or prints no acceptable path
pub async fn resolve_script_path(
    interpreter: &Path,
    module: &str,
    suffix: &str,
    timeout: Duration,
) -> Result<PathBuf> {
    log::debug!("Resolving {module} with {}", interpreter.display());

    let mut cmd = Command::new(interpreter);
    cmd.arg("-c")
        .arg(probe_snippet(module))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(BuildClientError::resolution(format!(
                "failed to start {}: {e}",
                interpreter.display()
            )));
        }
        Err(_) => {
            return Err(BuildClientError::resolution(format!(
                "probe did not finish within {}s",
                timeout.as_secs()
            )));
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_script_path(&stdout, suffix).inspect_err(|e| {
        log::error!(
            "{e} (exit status {}, stderr: {})",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    })
}
