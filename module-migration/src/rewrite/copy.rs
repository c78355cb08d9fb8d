//! Copying additional files into a repository.

use super::RewriteError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Copies a file or directory into `target_dir`, overwriting existing files.
///
/// A directory is copied recursively as a subdirectory of `target_dir` with
/// the same name. Returns the paths written.
///
/// # Errors
///
/// Returns [`RewriteError`] if the source is missing or a copy fails.
pub fn copy_into(source: &Path, target_dir: &Path) -> Result<Vec<PathBuf>, RewriteError> {
    let copy_error = |from: &Path, to: &Path, source: std::io::Error| RewriteError::Copy {
        from: from.display().to_string(),
        to: to.display().to_string(),
        source,
    };

    let metadata = match fs::symlink_metadata(source) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RewriteError::MissingSource {
                path: source.display().to_string(),
            })
        }
        Err(e) => return Err(copy_error(source, target_dir, e)),
    };

    let Some(name) = source.file_name() else {
        return Err(RewriteError::MissingSource {
            path: source.display().to_string(),
        });
    };
    let destination = target_dir.join(name);

    if !metadata.is_dir() {
        fs::copy(source, &destination).map_err(|e| copy_error(source, &destination, e))?;
        debug!(from = %source.display(), to = %destination.display(), "Copied file");
        return Ok(vec![destination]);
    }

    let mut written = Vec::new();
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(|e| RewriteError::Walk {
            path: source.display().to_string(),
            source: e,
        })?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| copy_error(entry.path(), &target, e))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).map_err(|e| copy_error(entry.path(), &target, e))?;
            written.push(target);
        }
    }

    debug!(
        from = %source.display(),
        to = %destination.display(),
        files = written.len(),
        "Copied directory"
    );
    Ok(written)
}
