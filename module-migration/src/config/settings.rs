//! Validated settings of a run.

use crate::mapping::{self, MappingError, MappingTables};
use crate::reconcile::ReconcileSettings;
use crate::rewrite::InclusionPolicy;
use std::path::PathBuf;

/// Settings produced by [`MigrationConfig::validate`](super::MigrationConfig::validate).
#[derive(Debug, Clone)]
pub struct Settings {
    /// Path to the mapping file.
    pub csv: PathBuf,
    /// Column separator.
    pub separator: u8,
    /// Resolved column index of the old URLs.
    pub old_column: usize,
    /// Resolved column index of the new URLs.
    pub new_column: usize,
    /// Compiled include and exclude patterns.
    pub policy: InclusionPolicy,
    /// Additional files copied into migrated repositories.
    pub copy: Vec<PathBuf>,
    /// Remote name.
    pub remote: String,
    /// Branch to commit on.
    pub branch: Option<String>,
    /// Commit message.
    pub commit_message: String,
    /// Maximum number of repositories processed at once.
    pub concurrency: Option<usize>,
}

impl Settings {
    /// Loads the mapping tables from the configured file.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] if the file cannot be loaded.
    pub fn load_mapping(&self) -> Result<MappingTables, MappingError> {
        mapping::load_mapping(&self.csv, self.old_column, self.new_column, self.separator)
    }

    /// Returns the reconciliation settings for this run.
    #[must_use]
    pub fn reconcile_settings(&self, change_requests: bool) -> ReconcileSettings {
        ReconcileSettings {
            remote: self.remote.clone(),
            branch: self.branch.clone(),
            commit_message: self.commit_message.clone(),
            change_requests,
        }
    }
}
