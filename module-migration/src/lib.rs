#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod config;
pub mod discovery;
pub mod exec;
pub mod git;
pub mod manifest;
pub mod mapping;
pub mod reconcile;
pub mod release;
pub mod rewrite;
pub mod runner;
pub mod summary;

pub use config::{ConfigError, MigrationConfig, Settings, DEFAULT_BRANCH};
pub use discovery::{find_module_repositories, find_repositories, DiscoveryError, Repository};
pub use exec::{CommandOutput, CommandRunner, ExecError, Session, SystemRunner};
pub use mapping::{load_mapping, MappingError, MappingTables, Replacer};
pub use reconcile::{Outcome, ReconcileError, ReconcileSettings};
pub use release::{Bump, Release, ReleaseError, ReleaseSettings};
pub use rewrite::{ContentRewriter, InclusionPolicy, RewriteError, TouchedFiles};
pub use runner::{MigrationError, Runner, RunnerConfig, RunnerError};
pub use summary::{ProcessingResult, RepositoryReport, RunSummary};
