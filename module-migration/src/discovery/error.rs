//! Repository discovery error types.

use thiserror::Error;

/// Errors that can occur during repository discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The directory walk failed.
    #[error("Failed to walk '{path}': {source}")]
    Walk {
        path: String,
        #[source]
        source: walkdir::Error,
    },

    /// A candidate file could not be inspected.
    #[error("Failed to inspect '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
