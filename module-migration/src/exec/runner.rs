//! Process runners.

use super::{render_command, ExecError};
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::trace;

/// Captured output of a successful command.
///
/// The two streams are read through separate pipes, so `combined` holds all
/// of stdout and then all of stderr rather than their interleaving.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Stdout followed by stderr.
    pub combined: String,
    /// Stderr only.
    pub stderr: String,
}

impl CommandOutput {
    /// Creates output from stdout text only.
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self {
            combined: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Returns the combined output split into trimmed, non-empty lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.combined
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Runs external programs on behalf of a repository task.
///
/// Implementations must be shareable between concurrently running
/// repository tasks.
pub trait CommandRunner: Send + Sync + 'static {
    /// Runs `program` with `args` inside `dir`.
    ///
    /// Exit code zero is success; anything else is [`ExecError::Failed`].
    fn run(
        &self,
        dir: &Path,
        program: &str,
        args: &[String],
    ) -> impl Future<Output = Result<CommandOutput, ExecError>> + Send;

    /// Returns true if `program` can be executed.
    fn is_available(&self, program: &str) -> bool;
}

/// Runs real processes via `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        dir: &Path,
        program: &str,
        args: &[String],
    ) -> Result<CommandOutput, ExecError> {
        let command = render_command(program, args);
        if !self.is_available(program) {
            return Err(ExecError::NotFound {
                program: program.to_string(),
            });
        }

        trace!(dir = %dir.display(), %command, "Running command");

        let output = Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ExecError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = format!("{stdout}{stderr}");

        if !output.status.success() {
            return Err(ExecError::Failed {
                command,
                exit_code: output.status.code().unwrap_or(-1),
                output: combined.trim().to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(CommandOutput {
            combined,
            stderr: stderr.into_owned(),
        })
    }

    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
