//! Subprocess error types.

use thiserror::Error;

/// Errors that can occur while running an external command.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The program could not be found on `PATH`.
    #[error("application not found: {program}")]
    NotFound { program: String },

    /// The process could not be started.
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exited with a non-zero status.
    #[error("application execution failed: '{command}': rc {exit_code}: {output}")]
    Failed {
        /// Program and arguments.
        command: String,
        /// Exit code, `-1` when terminated by a signal.
        exit_code: i32,
        /// Combined stdout and stderr, trimmed.
        output: String,
        /// Stderr only, trimmed.
        stderr: String,
    },

    /// The run was interrupted before this command was started.
    #[error("interrupted before running '{command}'")]
    Cancelled { command: String },
}

impl ExecError {
    /// Returns the exit code of a command that ran and failed.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    /// Returns true if the command was never started because of an interrupt.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
