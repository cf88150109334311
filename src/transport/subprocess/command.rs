//! Companion command building logic for subprocess transport

use std::process::Stdio;

use tokio::process::Command;

use crate::transport::CompanionCommand;

use super::config::{BLOCKED_ENV_VARS, FORCED_ENV_VARS};

/// Command builder for the companion process
pub struct CommandBuilder<'a> {
    command: &'a CompanionCommand,
}

impl<'a> CommandBuilder<'a> {
    /// Create a new command builder
    pub const fn new(command: &'a CompanionCommand) -> Self {
        Self { command }
    }

    /// Build `interpreter script` with piped stdio and a filtered environment
    pub fn build(&self) -> Command {
        let [interpreter, script] = self.command.argv();
        let mut cmd = Command::new(interpreter);
        cmd.arg(script);

        self.add_env(&mut cmd);

        if let Some(ref cwd) = self.command.cwd {
            cmd.current_dir(cwd);
        }

        // Stderr is piped and drained into the log so companion diagnostics
        // never reach the parent terminal directly.
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd
    }

    /// Apply user variables minus the blocked list, then the forced ones
    fn add_env(&self, cmd: &mut Command) {
        for var in BLOCKED_ENV_VARS {
            cmd.env_remove(var);
        }

        for (key, value) in &self.command.env {
            if BLOCKED_ENV_VARS.contains(&key.as_str()) {
                log::warn!("Dropping blocked environment variable {key} for companion");
                continue;
            }
            cmd.env(key, value);
        }

        for (key, value) in FORCED_ENV_VARS {
            cmd.env(key, value);
        }
    }
}
