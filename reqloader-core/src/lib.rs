//! reqloader core library — configuration, source references, errors.
//!
//! - [`config`] — [`SyncConfig`] and its YAML loader
//! - [`types`] — [`ManifestSource`], [`ManifestChange`], [`InstallOutcome`]
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{InstallerConfig, SyncConfig};
pub use error::ConfigError;
pub use types::{InstallOutcome, ManifestChange, ManifestSource};
