//! Module manifest error types.

use crate::exec::ExecError;
use thiserror::Error;

/// Errors that can occur while migrating a `go.mod` file.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest could not be read.
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The manifest could not be written back.
    #[error("Failed to write to '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A directive could not be parsed.
    #[error("failed to read go mod file: {path}:{line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    /// The manifest has no `module` directive.
    #[error("'{path}' has no module directive")]
    MissingModule { path: String },

    /// A toolchain command failed.
    #[error("{action} failed for repo {repo}: {source}")]
    Toolchain {
        action: String,
        repo: String,
        #[source]
        source: ExecError,
    },
}
