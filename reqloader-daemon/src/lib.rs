//! Background manifest sync: poll loop, on-demand updates, process reload.

pub mod controller;
mod error;
pub mod reloader;
mod runtime;

pub use controller::{SyncController, UpdateOutcome};
pub use error::DaemonError;
pub use reloader::{ExecReloader, Reloader};
pub use runtime::{init_tracing, run, start_blocking, LogFormat};
