//! # reqloader-sync
//!
//! Keeps a local dependency manifest in step with its source of truth.
//!
//! - [`source`] — blob-view URL rewriting and fetching
//! - [`store`] — the persisted manifest record and its pending-install flag
//! - [`installer`] — package-manager invocation under an [`InstallPolicy`]
//! - [`pipeline`] — the [`Syncer`] tying the three together

pub mod diff;
pub mod error;
pub mod installer;
pub mod pipeline;
pub mod source;
pub mod store;

pub use error::SyncError;
pub use installer::{InstallPolicy, Installer, OutputMode};
pub use pipeline::{PassReport, Syncer};
pub use source::{normalize, SourceResolver};
pub use store::{ConsumedMarker, ManifestRecord, ManifestStore};
