//! Repository discovery on the local filesystem.
//!
//! This module finds git working copies below a root directory. A working
//! copy root is the parent of a `.git` directory; the walk never descends
//! into a `.git` directory once found.

mod error;
mod repository;

pub use error::DiscoveryError;
pub use repository::Repository;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span};
use walkdir::WalkDir;

/// Name of the git metadata directory.
pub const GIT_DIR: &str = ".git";

/// Name of the Go module manifest.
pub const MODULE_MANIFEST: &str = "go.mod";

/// Finds every `.git` directory below `root`.
///
/// # Errors
///
/// Returns [`DiscoveryError`] on the first walk error; no partial result is
/// returned.
pub fn find_git_dirs(root: &Path) -> Result<BTreeSet<PathBuf>, DiscoveryError> {
    let _span = info_span!("discover", root = %root.display()).entered();

    let mut git_dirs = BTreeSet::new();
    let mut walker = WalkDir::new(root).follow_links(false).into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|source| DiscoveryError::Walk {
            path: root.display().to_string(),
            source,
        })?;

        if entry.file_type().is_dir() && entry.file_name() == GIT_DIR {
            debug!(path = %entry.path().display(), "Found git directory");
            git_dirs.insert(entry.path().to_path_buf());
            walker.skip_current_dir();
        }
    }

    Ok(git_dirs)
}

/// Finds every git working copy below `root`, sorted and deduplicated.
///
/// # Errors
///
/// Returns [`DiscoveryError`] if the walk fails.
pub fn find_repositories(root: &Path) -> Result<Vec<Repository>, DiscoveryError> {
    let repositories: BTreeSet<PathBuf> = find_git_dirs(root)?
        .into_iter()
        .filter_map(|git_dir| git_dir.parent().map(Path::to_path_buf))
        .collect();

    info!(count = repositories.len(), "Discovery complete");
    Ok(repositories.into_iter().map(Repository::new).collect())
}

/// Finds every git working copy below `root` that is also a Go module,
/// i.e. has a regular `go.mod` file at its root.
///
/// # Errors
///
/// Returns [`DiscoveryError`] if the walk fails or a manifest cannot be inspected.
pub fn find_module_repositories(root: &Path) -> Result<Vec<Repository>, DiscoveryError> {
    let mut modules = Vec::new();

    for repository in find_repositories(root)? {
        let manifest = repository.path().join(MODULE_MANIFEST);
        match std::fs::symlink_metadata(&manifest) {
            Ok(metadata) if metadata.is_file() => modules.push(repository),
            Ok(_) => debug!(path = %manifest.display(), "Manifest is not a regular file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(repo = %repository, "Not a module repository");
            }
            Err(source) => {
                return Err(DiscoveryError::Io {
                    path: manifest.display().to_string(),
                    source,
                })
            }
        }
    }

    info!(count = modules.len(), "Module repositories found");
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn init_repo(path: &Path) {
        fs::create_dir_all(path.join(".git/objects")).unwrap();
        fs::write(path.join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
    }

    #[test]
    fn finds_nested_repositories_sorted() {
        let temp = TempDir::new().unwrap();
        init_repo(&temp.path().join("b/service"));
        init_repo(&temp.path().join("a/lib"));
        fs::create_dir_all(temp.path().join("c/not-a-repo")).unwrap();

        let repositories = find_repositories(temp.path()).unwrap();
        let names: Vec<_> = repositories
            .iter()
            .map(|r| r.path().strip_prefix(temp.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(names, vec![PathBuf::from("a/lib"), PathBuf::from("b/service")]);
    }

    #[test]
    fn does_not_descend_into_git_dir() {
        let temp = TempDir::new().unwrap();
        init_repo(temp.path());
        // A nested `.git` inside the metadata directory must not be reported.
        fs::create_dir_all(temp.path().join(".git/modules/sub/.git")).unwrap();

        let git_dirs = find_git_dirs(temp.path()).unwrap();
        assert_eq!(git_dirs.len(), 1);
    }

    #[test]
    fn module_repositories_require_go_mod_file() {
        let temp = TempDir::new().unwrap();
        let module = temp.path().join("module");
        let plain = temp.path().join("plain");
        let odd = temp.path().join("odd");
        init_repo(&module);
        init_repo(&plain);
        init_repo(&odd);
        fs::write(module.join("go.mod"), "module example.com/module\n").unwrap();
        fs::create_dir_all(odd.join("go.mod")).unwrap();

        let repositories = find_module_repositories(temp.path()).unwrap();
        assert_eq!(repositories.len(), 1);
        assert_eq!(repositories[0].path(), module.as_path());
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = find_repositories(&temp.path().join("missing"));
        assert!(matches!(result, Err(DiscoveryError::Walk { .. })));
    }
}
