//! Working-directory bound command execution.

use super::{render_command, CommandRunner, ExecError};
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// A [`CommandRunner`] bound to one repository directory.
///
/// Cancellation is cooperative: once the token is cancelled no new command
/// is started, but a command that is already running is allowed to finish.
pub struct Session<'a, R> {
    runner: &'a R,
    dir: &'a Path,
    cancel: &'a CancellationToken,
}

impl<'a, R: CommandRunner> Session<'a, R> {
    /// Creates a session rooted at `dir`.
    pub fn new(runner: &'a R, dir: &'a Path, cancel: &'a CancellationToken) -> Self {
        Self {
            runner,
            dir,
            cancel,
        }
    }

    /// Returns the working directory of this session.
    pub fn dir(&self) -> &'a Path {
        self.dir
    }

    /// Returns true if `program` is available to the underlying runner.
    pub fn is_available(&self, program: &str) -> bool {
        self.runner.is_available(program)
    }

    /// Runs a command and returns its trimmed, non-empty output lines.
    pub async fn run(&self, program: &str, args: &[&str]) -> Result<Vec<String>, ExecError> {
        let args = to_owned_args(args);
        if self.cancel.is_cancelled() {
            return Err(ExecError::Cancelled {
                command: render_command(program, &args),
            });
        }
        let output = self.runner.run(self.dir, program, &args).await?;
        Ok(output.lines())
    }

    /// Runs a command even if the run has been interrupted.
    ///
    /// Used for compensating actions that restore a repository after a failed
    /// step.
    pub async fn run_uninterruptible(
        &self,
        program: &str,
        args: &[&str],
    ) -> Result<Vec<String>, ExecError> {
        let args = to_owned_args(args);
        let output = self.runner.run(self.dir, program, &args).await?;
        Ok(output.lines())
    }
}

fn to_owned_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| (*arg).to_string()).collect()
}
