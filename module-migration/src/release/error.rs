//! Release error types.

use crate::git::GitError;
use thiserror::Error;

/// Errors that can occur while tagging a release.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// A git step failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// The repository has no tags at all.
    #[error("failed to get latest tag in {repo}: no version tags found")]
    NoTags { repo: String },

    /// None of the tags is a semantic version.
    #[error("failed to get latest tag in {repo}: no valid version tags found: {tags:?}")]
    NoVersionTags { repo: String, tags: Vec<String> },

    /// A step failed and switching back to the original branch failed too.
    #[error("{source}; failed to switch back to {branch}: {restore}")]
    RestoreFailed {
        #[source]
        source: Box<ReleaseError>,
        branch: String,
        restore: GitError,
    },
}

impl ReleaseError {
    /// Returns true if the failure was caused by an interrupt.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Git(e) => e.is_cancelled(),
            Self::RestoreFailed { source, .. } => source.is_cancelled(),
            Self::NoTags { .. } | Self::NoVersionTags { .. } => false,
        }
    }
}
