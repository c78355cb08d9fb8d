//! Mapping error types.

use thiserror::Error;

/// Errors that can occur while loading the old→new mapping.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Failed to open or read the mapping file.
    #[error("Failed to read mapping file '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// The mapping file has no header row.
    #[error("Mapping file '{path}' is empty")]
    Empty { path: String },

    /// A row is too short for the selected columns.
    #[error("Row {row} of '{path}' has no column {index}: {record:?}")]
    MissingColumn {
        path: String,
        row: usize,
        index: usize,
        record: Vec<String>,
    },

    /// A column selector did not match any header.
    #[error("Column '{selector}' not found in header of '{path}': {header:?}")]
    UnknownColumn {
        path: String,
        selector: String,
        header: Vec<String>,
    },

    /// An identifier is not a valid git URL.
    #[error("invalid git url: {url}")]
    InvalidUrl { url: String },

    /// The replacement automaton could not be built.
    #[error("Failed to build replacer: {0}")]
    Replacer(#[from] aho_corasick::BuildError),
}
