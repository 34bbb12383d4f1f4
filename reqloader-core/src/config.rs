//! `SyncConfig` — immutable configuration handed to the sync controller.
//!
//! # File format
//!
//! ```yaml
//! source: https://github.com/acme/app/blob/main/requirements.txt
//! poll_interval_secs: 5
//! silent: true
//! reload_on_change: false
//! run_at_startup: true
//! manifest_path: requirements.txt
//! state_dir: .reqloader
//! fetch_timeout_secs: 30
//! installer:
//!   program: python3
//!   args: ["-m", "pip", "install", "-r"]
//! ```
//!
//! Only `source` is required. Relative paths are resolved against the
//! process working directory unless [`SyncConfig::rooted_at`] is used.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::ManifestSource;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MANIFEST_PATH: &str = "requirements.txt";
pub const DEFAULT_STATE_DIR: &str = ".reqloader";
pub const RECORD_FILE: &str = "manifest.json";

/// External package-manager command. The manifest path is appended as the
/// final argument when the command is spawned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallerConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: ["-m", "pip", "install", "-r"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    pub source: ManifestSource,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_true")]
    pub silent: bool,
    #[serde(default)]
    pub reload_on_change: bool,
    #[serde(default = "default_true")]
    pub run_at_startup: bool,
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default)]
    pub installer: InstallerConfig,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from(DEFAULT_MANIFEST_PATH)
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_DIR)
}

impl SyncConfig {
    /// Config with every field at its default except `source`.
    pub fn new(source: ManifestSource) -> Self {
        Self {
            source,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            silent: true,
            reload_on_change: false,
            run_at_startup: true,
            manifest_path: default_manifest_path(),
            state_dir: default_state_dir(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            installer: InstallerConfig::default(),
        }
    }

    /// Load and validate a YAML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "poll_interval_secs",
                reason: "must be at least 1 second".to_string(),
            });
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "fetch_timeout_secs",
                reason: "must be at least 1 second".to_string(),
            });
        }
        if self.installer.program.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "installer.program",
                reason: "must name an executable".to_string(),
            });
        }
        if self.manifest_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "manifest_path",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve relative `manifest_path` / `state_dir` against `root`.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        if self.manifest_path.is_relative() {
            self.manifest_path = root.join(&self.manifest_path);
        }
        if self.state_dir.is_relative() {
            self.state_dir = root.join(&self.state_dir);
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// `<state_dir>/manifest.json`
    pub fn record_path(&self) -> PathBuf {
        self.state_dir.join(RECORD_FILE)
    }
}
