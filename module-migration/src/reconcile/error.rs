//! Reconciliation error types.

use crate::git::GitError;
use thiserror::Error;

/// Errors that can occur while reconciling a repository's remote and branch.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A git step failed before anything needed to be undone.
    #[error(transparent)]
    Git(#[from] GitError),

    /// The remote URL is neither an old nor a new URL of the mapping.
    #[error("skipping {repo}: unknown remote url: {url}")]
    UnrecognizedRemote { repo: String, url: String },

    /// The target remote cannot be listed.
    #[error("target remote {url} of {repo} is not reachable: {source}")]
    Unreachable {
        repo: String,
        url: String,
        #[source]
        source: GitError,
    },

    /// A late step failed and the branch created by this run was rolled back.
    #[error("{source}{}", compensation_suffix(.compensation))]
    RolledBack {
        #[source]
        source: GitError,
        /// Failures of the compensating steps, in execution order.
        compensation: Vec<GitError>,
    },
}

impl ReconcileError {
    /// Returns true if the failure was caused by an interrupt.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Git(e) | Self::Unreachable { source: e, .. } | Self::RolledBack { source: e, .. } => {
                e.is_cancelled()
            }
            Self::UnrecognizedRemote { .. } => false,
        }
    }
}

fn compensation_suffix(compensation: &[GitError]) -> String {
    if compensation.is_empty() {
        return " (rolled back)".to_string();
    }
    let failures: Vec<String> = compensation.iter().map(ToString::to_string).collect();
    format!("; rollback failed: {}", failures.join("; "))
}
