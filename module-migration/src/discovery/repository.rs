//! Discovered repository information.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A git working copy found during discovery.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Repository {
    /// Working copy root.
    path: PathBuf,
}

impl Repository {
    /// Creates a repository handle for a working copy root.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the working copy root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
