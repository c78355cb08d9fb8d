//! Processing result types.

use crate::reconcile::Outcome;
use crate::release::Release;
use crate::rewrite::TouchedFiles;
use serde::Serialize;
use std::path::PathBuf;

/// What was done to a repository that was processed successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryReport {
    /// Old and new module path, if the module was renamed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_rename: Option<(String, String)>,
    /// Dependencies fetched at their new path.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub updated_dependencies: Vec<String>,
    /// Files whose content was rewritten.
    #[serde(skip_serializing_if = "TouchedFiles::is_empty")]
    pub touched_files: TouchedFiles,
    /// Additional files copied into the repository.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub copied_files: Vec<PathBuf>,
    /// Remote and branch reconciliation result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    /// Created release tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<Release>,
}

/// Result of processing a single repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessingResult {
    /// Processing succeeded.
    Success {
        /// Repository path.
        repository: String,
        /// What was done.
        #[serde(flatten)]
        report: RepositoryReport,
    },

    /// Processing was skipped.
    Skipped {
        /// Repository path.
        repository: String,
        /// Reason for skipping.
        reason: String,
    },

    /// Processing failed.
    Failed {
        /// Repository path.
        repository: String,
        /// Error message.
        error: String,
    },
}

impl ProcessingResult {
    /// Returns the repository path of this result.
    #[must_use]
    pub fn repository(&self) -> &str {
        match self {
            Self::Success { repository, .. }
            | Self::Skipped { repository, .. }
            | Self::Failed { repository, .. } => repository,
        }
    }
}
