//! Content rewrite error types.

use thiserror::Error;

/// Errors that can occur while rewriting repository content.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// An include or exclude pattern is not a valid regular expression.
    #[error("Invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The directory walk failed.
    #[error("Failed to walk '{path}': {source}")]
    Walk {
        path: String,
        #[source]
        source: walkdir::Error,
    },

    /// A file could not be read.
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written back.
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A structured source file is not syntactically valid.
    #[error("invalid Go file: {path}:{line}:{column}")]
    Parse {
        path: String,
        line: usize,
        column: usize,
    },

    /// A structured source file is not valid UTF-8.
    #[error("'{path}' is not valid UTF-8")]
    Encoding { path: String },

    /// The parser grammar could not be loaded.
    #[error("Failed to load grammar: {message}")]
    Grammar { message: String },

    /// An additional file could not be copied into a repository.
    #[error("Failed to copy '{from}' into '{to}': {source}")]
    Copy {
        from: String,
        to: String,
        #[source]
        source: std::io::Error,
    },

    /// An additional file source does not exist.
    #[error("additional file or directory {path} could not be found")]
    MissingSource { path: String },
}
