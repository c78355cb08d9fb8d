//! Git error types.

use crate::exec::ExecError;
use thiserror::Error;

/// Errors that can occur while driving git.
#[derive(Debug, Error)]
pub enum GitError {
    /// A git command failed.
    #[error("failed to {action} in {repo}: {source}")]
    Command {
        action: String,
        repo: String,
        #[source]
        source: ExecError,
    },

    /// A git command produced something other than exactly one line.
    #[error("expected exactly one line from '{command}' in {repo}, got {lines:?}")]
    UnexpectedOutput {
        command: String,
        repo: String,
        lines: Vec<String>,
    },
}

impl GitError {
    /// Returns true if the command was skipped because of an interrupt.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Command { source, .. } if source.is_cancelled())
    }
}
