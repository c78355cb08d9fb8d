//! Old→new identifier mapping loaded from a delimited file.
//!
//! Row 0 of the file is a header. Two selected columns hold the old and new
//! git URLs of each relocated repository. Every data row contributes one
//! entry to two tables:
//!
//! - the **remote-URL table**, keyed by the normalized full URL, used to
//!   repoint each repository's remote;
//! - the **module-path table**, keyed by the scheme-less module path, used to
//!   rewrite imports, manifests and documentation.

mod error;
mod replacer;
pub mod url;

pub use error::MappingError;
pub use replacer::Replacer;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

/// One data row: an old and a new identifier, both non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    /// Identifier before the migration.
    pub old: String,
    /// Identifier after the migration.
    pub new: String,
}

/// Selects a column by 0-based index or by header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    /// Positional column index.
    Index(usize),
    /// Exact header name.
    Name(String),
}

impl ColumnSelector {
    /// Interprets `raw` as an index if it is an integer, as a header name otherwise.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<usize>() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Name(raw.to_string()),
        }
    }

    /// Resolves this selector against a header row.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::UnknownColumn`] if a name selector matches no header.
    pub fn resolve(&self, path: &Path, header: &[String]) -> Result<usize, MappingError> {
        match self {
            Self::Index(index) => Ok(*index),
            Self::Name(name) => header.iter().position(|col| col == name).ok_or_else(|| {
                MappingError::UnknownColumn {
                    path: path.display().to_string(),
                    selector: name.clone(),
                    header: header.to_vec(),
                }
            }),
        }
    }
}

/// The two lookup tables built from the mapping file.
#[derive(Debug, Clone, Default)]
pub struct MappingTables {
    /// Normalized old remote URL → normalized new remote URL.
    pub remote_urls: BTreeMap<String, String>,
    /// Old module path → new module path.
    pub module_paths: BTreeMap<String, String>,
    /// Every normalized new remote URL.
    pub remote_targets: BTreeSet<String>,
}

/// Where a repository's current remote URL stands relative to the mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteLookup {
    /// The URL is an old URL and must be changed to `target`.
    Mapped { target: String },
    /// The URL is already one of the new URLs.
    AlreadyTarget,
    /// The URL is not part of the mapping.
    Unrecognized,
}

impl MappingTables {
    /// Adds one row to both tables.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::InvalidUrl`] if either side is not a git URL.
    pub fn insert(&mut self, entry: &MappingEntry) -> Result<(), MappingError> {
        let old_url = url::parse_git_url(&entry.old)?;
        let new_url = url::parse_git_url(&entry.new)?;

        let old_remote = old_url.as_str().trim_start_matches('/').to_string();
        let new_remote = new_url.as_str().trim_start_matches('/').to_string();
        self.remote_targets.insert(new_remote.clone());
        self.remote_urls.insert(old_remote, new_remote);

        self.module_paths.insert(
            url::module_path_of(&old_url),
            url::module_path_of(&new_url),
        );
        Ok(())
    }

    /// Returns true if no row was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remote_urls.is_empty()
    }

    /// Looks up a normalized remote URL.
    #[must_use]
    pub fn lookup_remote(&self, normalized_url: &str) -> RemoteLookup {
        if let Some(target) = self.remote_urls.get(normalized_url) {
            return RemoteLookup::Mapped {
                target: target.clone(),
            };
        }
        if self.remote_targets.contains(normalized_url) {
            return RemoteLookup::AlreadyTarget;
        }
        RemoteLookup::Unrecognized
    }

    /// Builds the replacer for the module-path table.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Replacer`] if the automaton cannot be built.
    pub fn replacer(&self) -> Result<Replacer, MappingError> {
        Replacer::new(&self.module_paths)
    }
}

/// Reads the header row of a delimited file.
///
/// # Errors
///
/// Returns [`MappingError`] if the file cannot be read or has no rows.
pub fn read_header(path: &Path, separator: u8) -> Result<Vec<String>, MappingError> {
    let mut reader = open_reader(path, separator)?;
    let mut record = csv::StringRecord::new();
    let found = reader
        .read_record(&mut record)
        .map_err(|source| csv_error(path, source))?;
    if !found {
        return Err(MappingError::Empty {
            path: path.display().to_string(),
        });
    }
    Ok(record.iter().map(str::to_string).collect())
}

/// Loads the mapping tables from a delimited file.
///
/// Row 0 is skipped unconditionally. Rows with an empty old or new column
/// are skipped. The first invalid URL aborts the whole load.
///
/// # Errors
///
/// Returns [`MappingError`] if the file cannot be read, a row is too short or
/// an identifier is not a valid git URL.
pub fn load_mapping(
    path: &Path,
    old_column: usize,
    new_column: usize,
    separator: u8,
) -> Result<MappingTables, MappingError> {
    info!(path = %path.display(), "Loading mapping");

    let mut reader = open_reader(path, separator)?;
    let max_index = old_column.max(new_column);
    let mut tables = MappingTables::default();

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|source| csv_error(path, source))?;

        if record.len() <= max_index {
            return Err(MappingError::MissingColumn {
                path: path.display().to_string(),
                row,
                index: max_index,
                record: record.iter().map(str::to_string).collect(),
            });
        }

        if row == 0 {
            continue;
        }

        let entry = MappingEntry {
            old: record[old_column].trim().to_string(),
            new: record[new_column].trim().to_string(),
        };
        if entry.old.is_empty() || entry.new.is_empty() {
            debug!(row, "Skipping row with empty column");
            continue;
        }

        tables.insert(&entry)?;
    }

    info!(count = tables.remote_urls.len(), "Loaded mapping");
    Ok(tables)
}

fn open_reader(path: &Path, separator: u8) -> Result<csv::Reader<std::fs::File>, MappingError> {
    csv::ReaderBuilder::new()
        .delimiter(separator)
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| csv_error(path, source))
}

fn csv_error(path: &Path, source: csv::Error) -> MappingError {
    MappingError::Csv {
        path: path.display().to_string(),
        source,
    }
}
