//! Migration of a repository's `go.mod` and the Go toolchain steps around it.
//!
//! The manifest is rewritten before any other file: its own module path is
//! moved to the expected identity and every dependency on a relocated module
//! is dropped, to be re-added by `go get <new>@latest`. After the content
//! rewrite, `go mod tidy` and `go build ./...` gate the repository.

mod descriptor;
mod error;

pub use descriptor::{ModuleDescriptor, Requirement};
pub use error::ManifestError;

use crate::discovery::MODULE_MANIFEST;
use crate::exec::{CommandRunner, ExecError, Session};
use crate::mapping::url;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

const GO: &str = "go";

static MAJOR_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/v[2-9][0-9]*$").expect("major version pattern is valid"));

/// What changed in a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestChange {
    /// Old and new module path, if the module was renamed.
    pub module_rename: Option<(String, String)>,
    /// New module paths that must be fetched with `go get`.
    pub updated_dependencies: Vec<String>,
}

impl ManifestChange {
    /// Returns true if the manifest was left as it was.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.module_rename.is_none() && self.updated_dependencies.is_empty()
    }
}

/// Computes the module path a module declared as `declared` should have.
///
/// Resolution order: an exact module-path mapping entry, a mapping entry for
/// a parent path, then the module path derived from `target_remote`. A
/// `/vN` major-version suffix of the declared path is kept. Returns `None`
/// if the module is already where it belongs or nothing is known about it.
#[must_use]
pub fn expected_module_path(
    declared: &str,
    module_paths: &BTreeMap<String, String>,
    target_remote: Option<&str>,
) -> Option<String> {
    let expected = if let Some(new) = module_paths.get(declared) {
        new.clone()
    } else if let Some((old, new)) = module_paths
        .iter()
        .filter(|(old, _)| {
            declared
                .strip_prefix(old.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
        })
        .max_by_key(|(old, _)| old.len())
    {
        format!("{new}{}", &declared[old.len()..])
    } else {
        let remote = url::parse_git_url(target_remote?).ok()?;
        remote.host_str()?;
        let mut derived = url::module_path_of(&remote);
        if let Some(suffix) = MAJOR_SUFFIX.find(declared) {
            if !derived.ends_with(suffix.as_str()) {
                derived.push_str(suffix.as_str());
            }
        }
        derived
    };

    (expected != declared).then_some(expected)
}

/// Rewrites the `go.mod` of `repo_dir` in place.
///
/// # Errors
///
/// Returns [`ManifestError`] if the manifest cannot be read, parsed or written.
pub fn migrate_manifest(
    repo_dir: &Path,
    module_paths: &BTreeMap<String, String>,
    target_remote: Option<&str>,
) -> Result<ManifestChange, ManifestError> {
    let manifest_path = repo_dir.join(MODULE_MANIFEST);
    let display = manifest_path.display().to_string();

    let text = fs::read_to_string(&manifest_path).map_err(|source| ManifestError::Read {
        path: display.clone(),
        source,
    })?;
    let mut descriptor = ModuleDescriptor::parse(&display, &text)?;
    let declared = descriptor
        .module_path()
        .ok_or_else(|| ManifestError::MissingModule {
            path: display.clone(),
        })?
        .to_string();

    let mut change = ManifestChange::default();

    match expected_module_path(&declared, module_paths, target_remote) {
        Some(expected) => {
            info!(from = %declared, to = %expected, "Module: mapping found");
            descriptor.set_module(&expected);
            change.module_rename = Some((declared, expected));
        }
        None => debug!(module = %declared, "Module: nothing to change"),
    }

    let mapped: Vec<(String, String)> = descriptor
        .requirements()
        .filter_map(|req| {
            module_paths
                .get(&req.path)
                .map(|new| (req.path.clone(), new.clone()))
        })
        .collect();

    for (old, new) in mapped {
        descriptor.drop_require(&old);
        info!(from = %old, to = %new, "Dependency: mapping found");
        if !change.updated_dependencies.contains(&new) {
            change.updated_dependencies.push(new);
        }
    }

    if change.is_empty() {
        return Ok(change);
    }

    fs::write(&manifest_path, descriptor.format()).map_err(|source| ManifestError::Write {
        path: display,
        source,
    })?;
    Ok(change)
}

/// Fetches the latest version of every updated dependency.
///
/// # Errors
///
/// Returns [`ManifestError::Toolchain`] for the first failing `go get`.
pub async fn update_dependencies<R: CommandRunner>(
    session: &Session<'_, R>,
    dependencies: &[String],
) -> Result<(), ManifestError> {
    for dependency in dependencies {
        info!(dependency = %dependency, "Dependency: updating");
        let target = format!("{dependency}@latest");
        session
            .run(GO, &["get", &target])
            .await
            .map_err(toolchain_error(session, "go get"))?;
    }
    Ok(())
}

/// Runs `go mod tidy` followed by `go build ./...`.
///
/// # Errors
///
/// Returns [`ManifestError::Toolchain`] if either command fails.
pub async fn verify_build<R: CommandRunner>(session: &Session<'_, R>) -> Result<(), ManifestError> {
    session
        .run(GO, &["mod", "tidy"])
        .await
        .map_err(toolchain_error(session, "go mod tidy"))?;
    session
        .run(GO, &["build", "./..."])
        .await
        .map_err(toolchain_error(session, "go build"))?;
    Ok(())
}

fn toolchain_error<R: CommandRunner>(
    session: &Session<'_, R>,
    action: &'static str,
) -> impl FnOnce(ExecError) -> ManifestError {
    let repo = session.dir().display().to_string();
    move |source| ManifestError::Toolchain {
        action: action.to_string(),
        repo,
        source,
    }
}
