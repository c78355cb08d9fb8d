//! Runner configuration.

use std::path::{Path, PathBuf};

/// Configuration for a run over a directory tree.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Root directory searched for repositories.
    root: PathBuf,
    /// Whether to preview without changing anything.
    dry_run: bool,
    /// Maximum number of repositories processed at once.
    concurrency: Option<usize>,
}

impl RunnerConfig {
    /// Creates a new configuration for a run.
    pub fn new(root: PathBuf, dry_run: bool, concurrency: Option<usize>) -> Self {
        Self {
            root,
            dry_run,
            concurrency,
        }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns whether dry-run mode is enabled.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Returns the repository concurrency limit, `None` for unbounded.
    pub fn concurrency(&self) -> Option<usize> {
        self.concurrency
    }

    /// Returns the number of repositories processed at once for `repositories`.
    pub(crate) fn limit(&self, repositories: usize) -> usize {
        self.concurrency.unwrap_or(repositories).max(1)
    }
}
