//! Shared fetch → reconcile → install pass used by the CLI and the daemon.

use reqloader_core::{InstallOutcome, ManifestChange, ManifestSource, SyncConfig};

use crate::installer::Installer;
use crate::source::SourceResolver;
use crate::store::ManifestStore;
use crate::SyncError;

/// Outcome of one fetch → reconcile → install pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub change: ManifestChange,
    pub install: InstallOutcome,
}

/// Bundles the resolver, store and installer for one manifest source.
///
/// The steps are exposed individually so a caller can check for
/// cancellation between them; [`Syncer::run_once`] chains them.
pub struct Syncer {
    source: ManifestSource,
    resolver: SourceResolver,
    store: ManifestStore,
    installer: Installer,
}

impl Syncer {
    pub fn new(
        source: ManifestSource,
        resolver: SourceResolver,
        store: ManifestStore,
        installer: Installer,
    ) -> Self {
        Self {
            source,
            resolver,
            store,
            installer,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            config.source.clone(),
            SourceResolver::new(config.fetch_timeout()),
            ManifestStore::from_config(config),
            Installer::from_config(config),
        )
    }

    pub fn source(&self) -> &ManifestSource {
        &self.source
    }

    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    pub fn fetch(&self) -> Result<String, SyncError> {
        self.resolver.fetch(&self.source)
    }

    pub fn reconcile(&self, content: &str) -> Result<ManifestChange, SyncError> {
        self.store.reconcile(content)
    }

    pub fn install(&self) -> Result<InstallOutcome, SyncError> {
        self.installer.install(&self.store)
    }

    /// Run one full pass. The persisted record is untouched when the fetch
    /// fails.
    pub fn run_once(&self) -> Result<PassReport, SyncError> {
        let content = self.fetch()?;
        let change = self.reconcile(&content)?;
        let install = self.install()?;
        Ok(PassReport { change, install })
    }
}
