//! Error types for reqloader-sync.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from fetching, persisting or installing a manifest.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The manifest source could not be read: missing or unreadable local
    /// file, transport failure, or a non-2xx HTTP status.
    #[error("manifest source unavailable ({source_ref}): {reason}")]
    SourceUnavailable { source_ref: String, reason: String },

    /// The package manager exited non-zero. `None` when it was terminated by
    /// a signal and has no exit code.
    #[error("package install failed (exit code {})", display_code(.exit_code))]
    InstallFailed { exit_code: Option<i32> },

    /// The package manager could not be started at all.
    #[error("failed to spawn package manager `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted manifest record is not valid JSON.
    #[error("manifest record at {path} is corrupt: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none; terminated by signal".to_string(),
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
