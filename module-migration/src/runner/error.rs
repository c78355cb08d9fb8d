//! Runner error types.

use crate::discovery::DiscoveryError;
use crate::git::GitError;
use crate::manifest::ManifestError;
use crate::mapping::MappingError;
use crate::reconcile::ReconcileError;
use crate::release::ReleaseError;
use crate::rewrite::RewriteError;

/// Errors that prevent a run from starting.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration errors.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// The mapping file could not be loaded.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Repository discovery failed.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// The whole-tree rewrite failed.
    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    /// The root directory is not usable.
    #[error("Invalid root directory '{path}': {source}")]
    Root {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A blocking task panicked or was aborted.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors that fail a single repository.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Pulling before the migration was interrupted.
    #[error(transparent)]
    Git(#[from] GitError),

    /// The module manifest could not be migrated or the build failed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// File content could not be rewritten or copied.
    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    /// The per-repository replacer could not be built.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Remote or branch reconciliation failed.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// Tagging a release failed.
    #[error(transparent)]
    Release(#[from] ReleaseError),

    /// The repository task panicked or was aborted.
    #[error("repository task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
