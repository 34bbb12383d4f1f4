use reqloader_core::SyncConfig;

use crate::controller::SyncController;
use crate::error::DaemonError;

/// Log line format for [`init_tracing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// `info` filter. Later calls are no-ops.
pub fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_target(false);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// Start the sync loop and block the current thread until Ctrl-C.
pub fn start_blocking(config: SyncConfig) -> Result<(), DaemonError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(config))
}

/// Run the sync loop until Ctrl-C, then stop it cleanly.
pub async fn run(config: SyncConfig) -> Result<(), DaemonError> {
    let controller = SyncController::new(config)?;
    controller.start()?;

    let signal = tokio::signal::ctrl_c().await;
    match &signal {
        Ok(()) => tracing::info!("received ctrl-c, stopping sync loop"),
        Err(err) => tracing::error!(error = %err, "ctrl-c handler failed, stopping sync loop"),
    }

    controller.stop().await?;
    signal.map_err(DaemonError::Io)
}
