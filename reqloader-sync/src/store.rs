//! Manifest store — last-observed manifest plus its pending-install flag.
//!
//! Two files are kept in step:
//!
//! * the record, `<state_dir>/manifest.json`, holding the content, its
//!   SHA-256, `pending_install` and the digest of the last failed install;
//! * the plain manifest (`requirements.txt` by default) that the package
//!   manager reads. It only ever holds the bare content.
//!
//! Both are written with the `.tmp` + rename pattern. The manifest is
//! written first and the record last, so the record is the commit point:
//! a crash between the two leaves a record that still differs from the
//! source and the next [`ManifestStore::reconcile`] rewrites both.
//!
//! Every read-modify-write holds the store's mutex, so a background pass
//! and an on-demand pass never interleave.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use reqloader_core::{ManifestChange, SyncConfig};

use crate::diff;
use crate::error::{io_err, SyncError};

/// On-disk manifest record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestRecord {
    pub content: String,
    pub sha256: String,
    /// Set when `content` differs from what has been handed to the installer.
    pub pending_install: bool,
    /// Digest of content whose last install attempt failed.
    #[serde(default)]
    pub failed_sha256: Option<String>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub installed_at: Option<DateTime<Utc>>,
}

impl ManifestRecord {
    fn new(content: String) -> Self {
        let sha256 = digest(&content);
        Self {
            content,
            sha256,
            pending_install: true,
            failed_sha256: None,
            updated_at: Utc::now(),
            installed_at: None,
        }
    }

    /// True when the last install attempt of the current content failed.
    pub fn install_failed(&self) -> bool {
        self.failed_sha256.as_deref() == Some(self.sha256.as_str())
    }
}

/// What [`ManifestStore::consume_marker`] found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedMarker {
    /// Content to install, never carrying any marker.
    pub content: String,
    /// Whether a change was pending before this call.
    pub had_pending: bool,
    /// Whether the previous install of this same content failed.
    pub last_install_failed: bool,
}

pub struct ManifestStore {
    record_path: PathBuf,
    manifest_path: PathBuf,
    lock: Mutex<()>,
}

impl ManifestStore {
    pub fn new(record_path: impl Into<PathBuf>, manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            record_path: record_path.into(),
            manifest_path: manifest_path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.record_path(), config.manifest_path.clone())
    }

    /// Path of the plain manifest the package manager installs from.
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn record_path(&self) -> &Path {
        &self.record_path
    }

    /// Load the persisted record. `None` on first run.
    pub fn load(&self) -> Result<Option<ManifestRecord>, SyncError> {
        let _guard = self.guard();
        self.read_record()
    }

    /// Compare `new_content` with the persisted content and persist it with
    /// `pending_install` set when it differs. No write happens when equal.
    pub fn reconcile(&self, new_content: &str) -> Result<ManifestChange, SyncError> {
        let _guard = self.guard();
        let new_content = normalize_line_endings(new_content);
        let current = self.read_record()?;

        let previous = match &current {
            Some(record) if record.sha256 == digest(&new_content) => {
                tracing::debug!(record = %self.record_path.display(), "manifest unchanged");
                return Ok(ManifestChange::Unchanged);
            }
            Some(record) => record.content.as_str(),
            None => "",
        };

        let summary = diff::summarize(previous, &new_content);
        tracing::info!(
            manifest = %self.manifest_path.display(),
            added = summary.added.len(),
            removed = summary.removed.len(),
            "manifest changed",
        );
        for line in &summary.added {
            tracing::debug!("+ {line}");
        }
        for line in &summary.removed {
            tracing::debug!("- {line}");
        }

        let mut record = ManifestRecord::new(new_content);
        // A failure recorded against this exact content still applies.
        record.failed_sha256 = current.and_then(|r| r.failed_sha256);
        write_atomic(&self.manifest_path, record.content.as_bytes())?;
        self.write_record(&record)?;
        Ok(ManifestChange::Changed)
    }

    /// Clear `pending_install` and return the installable content.
    ///
    /// Idempotent: a second call with no intervening [`reconcile`] reports
    /// no pending change. Re-materialises the plain manifest if it went
    /// missing or was edited by hand.
    ///
    /// [`reconcile`]: ManifestStore::reconcile
    pub fn consume_marker(&self) -> Result<ConsumedMarker, SyncError> {
        let _guard = self.guard();
        let Some(mut record) = self.read_record()? else {
            return Ok(ConsumedMarker {
                content: String::new(),
                had_pending: false,
                last_install_failed: false,
            });
        };

        if self.manifest_on_disk()?.as_deref() != Some(record.content.as_str()) {
            write_atomic(&self.manifest_path, record.content.as_bytes())?;
        }

        let had_pending = record.pending_install;
        if had_pending {
            record.pending_install = false;
            self.write_record(&record)?;
        }

        Ok(ConsumedMarker {
            last_install_failed: record.install_failed(),
            content: record.content,
            had_pending,
        })
    }

    /// Record the result of an install attempt of the current content.
    pub fn record_install(&self, succeeded: bool) -> Result<(), SyncError> {
        let _guard = self.guard();
        let Some(mut record) = self.read_record()? else {
            return Ok(());
        };
        if succeeded {
            record.failed_sha256 = None;
            record.installed_at = Some(Utc::now());
        } else {
            record.failed_sha256 = Some(record.sha256.clone());
        }
        self.write_record(&record)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_record(&self) -> Result<Option<ManifestRecord>, SyncError> {
        let contents = match std::fs::read_to_string(&self.record_path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_err(&self.record_path, err)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| SyncError::Json {
                path: self.record_path.clone(),
                source,
            })
    }

    fn write_record(&self, record: &ManifestRecord) -> Result<(), SyncError> {
        let json = serde_json::to_string_pretty(record).map_err(|source| SyncError::Json {
            path: self.record_path.clone(),
            source,
        })?;
        write_atomic(&self.record_path, json.as_bytes())
    }

    fn manifest_on_disk(&self) -> Result<Option<String>, SyncError> {
        match std::fs::read_to_string(&self.manifest_path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_err(&self.manifest_path, err)),
        }
    }
}

/// SHA-256 hex digest of `content`.
pub fn digest(content: &str) -> String {
    let mut h = Sha256::new();
    h.update(content.as_bytes());
    hex::encode(h.finalize())
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}

fn tmp_path_for(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.reqloader.tmp", path.display()))
}

/// Write `bytes` to `<path>.reqloader.tmp`, then rename over `path`.
///
/// Readers see either the old file or the new one, never a partial write.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SyncError> {
    write_atomic_with_tmp(path, bytes, &tmp_path_for(path))
}

fn write_atomic_with_tmp(path: &Path, bytes: &[u8], tmp: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    std::fs::write(tmp, bytes).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}
