//! Error types for reqloader-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while building or loading a [`SyncConfig`].
///
/// [`SyncConfig`]: crate::config::SyncConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with the offending file path.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A source reference used a scheme other than `file`, `http` or `https`.
    #[error("unsupported manifest source scheme '{scheme}' in '{reference}'")]
    UnsupportedScheme { scheme: String, reference: String },

    /// The source reference was empty or whitespace.
    #[error("manifest source reference is empty")]
    EmptySource,

    /// A field failed validation.
    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
