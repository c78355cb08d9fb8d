//! Rewriting of old identifiers inside a repository's files.
//!
//! The walk applies an [`InclusionPolicy`]. Files with a registered
//! [`StructuredRewriter`] (Go sources by default) only have their import
//! paths rewritten; every other accepted file gets a plain substring
//! replacement over its whole content.

mod copy;
mod error;
mod policy;
mod structured;
mod touched;

pub use copy::copy_into;
pub use error::RewriteError;
pub use policy::{InclusionPolicy, DEFAULT_EXCLUDE, DEFAULT_INCLUDE, MANIFEST_EXCLUDE};
pub use structured::{GoImportRewriter, StructuredRewriter};
pub use touched::TouchedFiles;

use crate::discovery::GIT_DIR;
use crate::mapping::Replacer;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info_span};
use walkdir::{DirEntry, WalkDir};

/// Applies a [`Replacer`] to the files of a directory tree.
#[derive(Clone)]
pub struct ContentRewriter {
    policy: InclusionPolicy,
    structured: Vec<Arc<dyn StructuredRewriter>>,
}

impl ContentRewriter {
    /// Creates a rewriter with the Go import rewriter registered.
    pub fn new(policy: InclusionPolicy) -> Self {
        Self {
            policy,
            structured: vec![Arc::new(GoImportRewriter)],
        }
    }

    /// Rewrites every accepted file below `root`.
    ///
    /// `.git` directories are never entered, whatever the policy says.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError`] on the first walk, I/O or parse failure. Files
    /// rewritten before the failure keep their new content.
    pub fn rewrite_dir(&self, root: &Path, replacer: &Replacer) -> Result<TouchedFiles, RewriteError> {
        self.walk(root, replacer, false)
    }

    /// Rewrites every accepted file of the working copy at `dir`.
    ///
    /// Like [`rewrite_dir`](Self::rewrite_dir), but also stops at nested
    /// working copies, which belong to their own repository task.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError`] on the first walk, I/O or parse failure.
    pub fn rewrite_repository(
        &self,
        dir: &Path,
        replacer: &Replacer,
    ) -> Result<TouchedFiles, RewriteError> {
        self.walk(dir, replacer, true)
    }

    fn walk(
        &self,
        root: &Path,
        replacer: &Replacer,
        stop_at_repositories: bool,
    ) -> Result<TouchedFiles, RewriteError> {
        let _span = info_span!("rewrite", root = %root.display()).entered();

        if replacer.is_empty() {
            return Ok(TouchedFiles::default());
        }

        let mut touched = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| self.descend(entry, stop_at_repositories));

        for entry in walker {
            let entry = entry.map_err(|source| RewriteError::Walk {
                path: root.display().to_string(),
                source,
            })?;

            if !entry.file_type().is_file() || !self.policy.is_included(entry.path()) {
                continue;
            }

            if self.rewrite_file(entry.path(), replacer)? {
                debug!(path = %entry.path().display(), "Rewrote file");
                touched.push(entry.into_path());
            }
        }

        Ok(TouchedFiles::from_paths(touched))
    }

    fn descend(&self, entry: &DirEntry, stop_at_repositories: bool) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        if entry.file_type().is_dir() {
            if entry.file_name() == GIT_DIR {
                return false;
            }
            if stop_at_repositories && entry.path().join(GIT_DIR).is_dir() {
                debug!(path = %entry.path().display(), "Skipping nested repository");
                return false;
            }
        }
        !self.policy.is_excluded(entry.path())
    }

    /// Rewrites one file. Returns true if its content changed.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError`] if the file cannot be read, parsed or written.
    pub fn rewrite_file(&self, path: &Path, replacer: &Replacer) -> Result<bool, RewriteError> {
        let data = fs::read(path).map_err(|source| RewriteError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let rewritten = match self.structured_for(path) {
            Some(structured) => {
                let source = std::str::from_utf8(&data).map_err(|_| RewriteError::Encoding {
                    path: path.display().to_string(),
                })?;
                structured
                    .rewrite(path, source, replacer)?
                    .map(String::into_bytes)
            }
            None => {
                let replaced = replacer.replace_bytes(&data);
                (replaced != data).then_some(replaced)
            }
        };

        let Some(rewritten) = rewritten else {
            return Ok(false);
        };

        fs::write(path, rewritten).map_err(|source| RewriteError::Write {
            path: path.display().to_string(),
            source,
        })?;
        Ok(true)
    }

    fn structured_for(&self, path: &Path) -> Option<&Arc<dyn StructuredRewriter>> {
        let extension = path.extension()?.to_str()?;
        self.structured
            .iter()
            .find(|rewriter| rewriter.extension() == extension)
    }
}

impl std::fmt::Debug for ContentRewriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentRewriter")
            .field("policy", &self.policy)
            .field(
                "structured",
                &self.structured.iter().map(|r| r.extension()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn replacer() -> Replacer {
        let mut mapping = BTreeMap::new();
        mapping.insert("github.com/old/lib".to_string(), "gitlab.example/new/lib".to_string());
        Replacer::new(&mapping).unwrap()
    }

    #[test]
    fn records_only_changed_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("README.md"), "see github.com/old/lib\n").unwrap();
        fs::write(temp.path().join("CHANGELOG.md"), "nothing here\n").unwrap();

        let rewriter = ContentRewriter::new(InclusionPolicy::default());
        let touched = rewriter.rewrite_dir(temp.path(), &replacer()).unwrap();

        assert_eq!(touched.paths(), &[temp.path().join("README.md")]);
        assert_eq!(
            fs::read_to_string(temp.path().join("README.md")).unwrap(),
            "see gitlab.example/new/lib\n"
        );
    }

    #[test]
    fn excluded_directories_are_not_descended() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("vendor/x")).unwrap();
        fs::write(temp.path().join("vendor/x/doc.md"), "github.com/old/lib").unwrap();

        let policy = InclusionPolicy::new(&[r"\.md$"], &["vendor$"]).unwrap();
        let touched = ContentRewriter::new(policy)
            .rewrite_dir(temp.path(), &replacer())
            .unwrap();

        assert!(touched.is_empty());
        assert_eq!(
            fs::read_to_string(temp.path().join("vendor/x/doc.md")).unwrap(),
            "github.com/old/lib"
        );
    }

    #[test]
    fn nested_repository_is_left_to_its_own_task() {
        let temp = TempDir::new().unwrap();
        let outer = temp.path().join("outer");
        let inner = outer.join("tools/inner");
        fs::create_dir_all(outer.join(".git")).unwrap();
        fs::create_dir_all(inner.join(".git")).unwrap();
        fs::write(outer.join("README.md"), "github.com/old/lib\n").unwrap();
        fs::write(inner.join("README.md"), "github.com/old/lib\n").unwrap();
        fs::write(inner.join("main.go"), "package main\n\nimport \"github.com/old/lib\"\n").unwrap();

        let touched = ContentRewriter::new(InclusionPolicy::default())
            .rewrite_repository(&outer, &replacer())
            .unwrap();

        assert_eq!(touched.paths(), &[outer.join("README.md")]);
        assert_eq!(
            fs::read_to_string(inner.join("README.md")).unwrap(),
            "github.com/old/lib\n"
        );
        assert!(fs::read_to_string(inner.join("main.go"))
            .unwrap()
            .contains("github.com/old/lib"));
    }

    #[test]
    fn git_directory_is_skipped_without_an_exclude() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        fs::write(temp.path().join(".git/description.md"), "github.com/old/lib").unwrap();

        let policy = InclusionPolicy::new(&[r"\.md$"], &["vendor$"]).unwrap();
        let touched = ContentRewriter::new(policy)
            .rewrite_dir(temp.path(), &replacer())
            .unwrap();

        assert!(touched.is_empty());
        assert_eq!(
            fs::read_to_string(temp.path().join(".git/description.md")).unwrap(),
            "github.com/old/lib"
        );
    }

    #[test]
    fn invalid_go_file_aborts_walk() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bad.go"), "package main\nfunc {\n").unwrap();

        let result = ContentRewriter::new(InclusionPolicy::default())
            .rewrite_dir(temp.path(), &replacer());

        assert!(matches!(result, Err(RewriteError::Parse { .. })));
    }
}
