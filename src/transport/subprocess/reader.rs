//! Stderr draining for subprocess transport

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::ChildStderr;
use tokio::task::JoinHandle;

use super::config::COMPANION_LOG_TARGET;

/// Spawn a task that forwards companion stderr into the log
///
/// Keeps the pipe drained so a chatty companion never blocks on a full
/// stderr buffer. Ends at EOF or on the first read error.
pub(super) fn spawn_stderr_forwarder(stderr: ChildStderr) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => log::debug!(target: COMPANION_LOG_TARGET, "{line}"),
                Ok(None) => break,
                Err(e) => {
                    log::debug!(target: COMPANION_LOG_TARGET, "stderr closed: {e}");
                    break;
                }
            }
        }
    })
}
