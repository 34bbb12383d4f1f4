pub mod normalize;
pub mod once;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use reqloader_core::{ManifestSource, SyncConfig};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "reqloader.yaml";

/// Flags shared by every sync command. Each one overrides the config file.
#[derive(Args, Debug)]
pub struct SyncOptions {
    /// YAML config file (defaults to ./reqloader.yaml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Manifest source: a path, file:// URL or http(s):// URL.
    #[arg(long, global = true)]
    pub source: Option<String>,

    /// Seconds between polls.
    #[arg(long, global = true)]
    pub interval: Option<u64>,

    /// Show package-manager output and only install on change.
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Restart this process after installing a changed manifest.
    #[arg(long, global = true)]
    pub reload_on_change: bool,

    /// Wait one interval before the first pass.
    #[arg(long, global = true)]
    pub no_startup_run: bool,
}

impl SyncOptions {
    pub fn resolve(&self) -> Result<SyncConfig> {
        let file = match &self.config {
            Some(path) => Some(path.clone()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
        };

        let mut config = match (file, &self.source) {
            (Some(path), _) => load(&path)?,
            (None, Some(source)) => SyncConfig::new(
                ManifestSource::parse(source)
                    .with_context(|| format!("invalid --source '{source}'"))?,
            ),
            (None, None) => {
                bail!("no manifest source: pass --source or provide {DEFAULT_CONFIG_FILE}")
            }
        };

        if let Some(source) = &self.source {
            config.source = ManifestSource::parse(source)
                .with_context(|| format!("invalid --source '{source}'"))?;
        }
        if let Some(interval) = self.interval {
            config.poll_interval_secs = interval;
        }
        if self.verbose {
            config.silent = false;
        }
        if self.reload_on_change {
            config.reload_on_change = true;
        }
        if self.no_startup_run {
            config.run_at_startup = false;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn load(path: &Path) -> Result<SyncConfig> {
    SyncConfig::load(path).with_context(|| format!("failed to load config {}", path.display()))
}
