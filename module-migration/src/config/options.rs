//! Unvalidated options, as read from a config file or the command line.

use super::settings::Settings;
use super::ConfigError;
use crate::mapping::{self, ColumnSelector};
use crate::reconcile::DEFAULT_COMMIT_MESSAGE;
use crate::release::{Bump, ReleaseSettings};
use crate::rewrite::{InclusionPolicy, DEFAULT_EXCLUDE, DEFAULT_INCLUDE};
use bstr::ByteSlice;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Branch migrated repositories are committed on by default.
pub const DEFAULT_BRANCH: &str = "chore/module-migration";

/// Options of a run before validation.
///
/// Every field has a default, so a config file only needs the keys it
/// changes. Keys are kebab-case.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct MigrationConfig {
    /// Path to the mapping file.
    pub csv: PathBuf,
    /// Single character column separator of the mapping file.
    pub separator: String,
    /// Column with the old URLs, by index or header name.
    pub old: String,
    /// Column with the new URLs, by index or header name.
    pub new: String,
    /// Name of the remote to reconcile.
    pub remote: String,
    /// Branch to commit on. Empty only reconciles remote URLs.
    pub branch: Option<String>,
    /// Regular expressions selecting files to rewrite.
    pub include: Vec<String>,
    /// Regular expressions selecting paths never to rewrite.
    pub exclude: Vec<String>,
    /// Files or directories copied into every migrated repository.
    pub copy: Vec<PathBuf>,
    /// Maximum number of repositories processed at once.
    pub concurrency: Option<usize>,
    /// Commit message and change request title.
    pub commit_message: String,
    /// Version component bumped by a release.
    pub bump: Bump,
    /// Push tags after a release.
    pub push: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            csv: PathBuf::from("./mapping.csv"),
            separator: ";".to_string(),
            old: "0".to_string(),
            new: "1".to_string(),
            remote: "origin".to_string(),
            branch: None,
            include: DEFAULT_INCLUDE.iter().map(|p| (*p).to_string()).collect(),
            exclude: DEFAULT_EXCLUDE.iter().map(|p| (*p).to_string()).collect(),
            copy: Vec::new(),
            concurrency: None,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            bump: Bump::Patch,
            push: false,
        }
    }
}

impl MigrationConfig {
    /// Loads options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing, unreadable or invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingFile {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlError {
            path: path.display().to_string(),
            source: e,
        })?;

        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Validates the options of a migrate, commit or rewrite run.
    ///
    /// Resolves the mapping columns against the header row of the mapping
    /// file, so the file must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for the first invalid option.
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        let separator = parse_separator(&self.separator)?;

        if !self.csv.is_file() {
            return Err(ConfigError::MissingFile {
                path: self.csv.display().to_string(),
            });
        }
        let header = mapping::read_header(&self.csv, separator)?;
        let old_column = ColumnSelector::parse(&self.old).resolve(&self.csv, &header)?;
        let new_column = ColumnSelector::parse(&self.new).resolve(&self.csv, &header)?;
        if old_column == new_column {
            return Err(ConfigError::ValidationError {
                field: "new".to_string(),
                message: format!("old and new column are both {old_column}"),
            });
        }

        let policy = InclusionPolicy::new(&self.include, &self.exclude)?;

        for source in &self.copy {
            if std::fs::symlink_metadata(source).is_err() {
                return Err(ConfigError::MissingFile {
                    path: source.display().to_string(),
                });
            }
        }

        let remote = self.validate_remote()?;
        let branch = self
            .branch
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(validate_branch)
            .transpose()?;

        if self.commit_message.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "commit-message".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(Settings {
            csv: self.csv.clone(),
            separator,
            old_column,
            new_column,
            policy,
            copy: self.copy.clone(),
            remote,
            branch,
            commit_message: self.commit_message.clone(),
            concurrency: self.validate_concurrency()?,
        })
    }

    /// Validates the options of a release run. The mapping file is not used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an invalid remote name or concurrency.
    pub fn validate_release(&self) -> Result<(ReleaseSettings, Option<usize>), ConfigError> {
        let settings = ReleaseSettings {
            remote: self.validate_remote()?,
            bump: self.bump,
            push: self.push,
        };
        Ok((settings, self.validate_concurrency()?))
    }

    fn validate_remote(&self) -> Result<String, ConfigError> {
        let remote = self.remote.trim();
        if remote.is_empty() || remote.chars().any(char::is_whitespace) {
            return Err(ConfigError::ValidationError {
                field: "remote".to_string(),
                message: format!("'{}' is not a remote name", self.remote),
            });
        }
        Ok(remote.to_string())
    }

    fn validate_concurrency(&self) -> Result<Option<usize>, ConfigError> {
        match self.concurrency {
            Some(0) => Err(ConfigError::ValidationError {
                field: "concurrency".to_string(),
                message: "must be at least 1".to_string(),
            }),
            other => Ok(other),
        }
    }
}

fn parse_separator(raw: &str) -> Result<u8, ConfigError> {
    match raw.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(ConfigError::ValidationError {
            field: "separator".to_string(),
            message: format!("'{raw}' is not a single ASCII character"),
        }),
    }
}

fn validate_branch(branch: &str) -> Result<String, ConfigError> {
    gix_validate::reference::name_partial(branch.as_bytes().as_bstr()).map_err(|e| {
        ConfigError::ValidationError {
            field: "branch".to_string(),
            message: format!("'{branch}' is not a valid branch name: {e}"),
        }
    })?;
    Ok(branch.to_string())
}
