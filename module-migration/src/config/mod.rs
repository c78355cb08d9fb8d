//! Configuration loading and validation.
//!
//! Options come from an optional TOML file and the command line; the CLI
//! layers its flags over [`MigrationConfig`] and validates the result into
//! [`Settings`] before any repository is touched.

mod error;
mod options;
mod settings;

pub use error::ConfigError;
pub use options::{MigrationConfig, DEFAULT_BRANCH};
pub use settings::Settings;
