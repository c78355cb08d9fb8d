//! The set of files changed by a rewrite.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Paths of files whose content was changed, ordered by path depth and then
/// lexically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TouchedFiles {
    paths: Vec<PathBuf>,
}

impl TouchedFiles {
    /// Builds a set from unordered paths.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut paths: Vec<PathBuf> = paths.into_iter().collect();
        paths.sort_by(|a, b| {
            depth(a)
                .cmp(&depth(b))
                .then_with(|| a.as_os_str().cmp(b.as_os_str()))
        });
        paths.dedup();
        Self { paths }
    }

    /// Returns the paths in order.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of touched files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns true if no file was touched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Adds the files of another set, keeping the order.
    pub fn extend(&mut self, other: TouchedFiles) {
        let paths = std::mem::take(&mut self.paths);
        *self = Self::from_paths(paths.into_iter().chain(other.paths));
    }
}

impl<'a> IntoIterator for &'a TouchedFiles {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

fn depth(path: &Path) -> usize {
    path.components().count()
}
