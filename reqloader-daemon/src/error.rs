use thiserror::Error;

/// Error surface for the sync controller and process reloader.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("config error: {0}")]
    Config(#[from] reqloader_core::ConfigError),

    #[error("sync error: {0}")]
    Sync(#[from] reqloader_sync::SyncError),

    #[error("process reload failed: {reason}")]
    ReloadFailed { reason: String },

    #[error("sync pass cancelled")]
    Cancelled,

    #[error("start() must be called from within a tokio runtime")]
    NoRuntime,

    #[error("{task} task join failure: {reason}")]
    Join { task: &'static str, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub(crate) fn join_err(task: &'static str, err: tokio::task::JoinError) -> DaemonError {
    DaemonError::Join {
        task,
        reason: err.to_string(),
    }
}
