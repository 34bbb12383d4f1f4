//! Domain types shared by every reqloader crate.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

const FILE_SCHEME: &str = "file://";

/// Where the dependency manifest is fetched from.
///
/// Exactly one of local / remote applies. The original reference string is
/// kept so logs and errors show what the caller supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    /// A filesystem path, given either bare or as `file://<path>`.
    Local { reference: String, path: PathBuf },
    /// An `http://` or `https://` URL.
    Remote { url: String },
}

impl ManifestSource {
    /// Parse a reference string.
    ///
    /// `file://` prefixes and bare paths are local, `http(s)://` is remote.
    /// Any other `scheme://` is rejected.
    pub fn parse(reference: &str) -> Result<Self, ConfigError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ConfigError::EmptySource);
        }

        let lower = reference.to_ascii_lowercase();
        if lower.starts_with(FILE_SCHEME) {
            return Ok(Self::Local {
                reference: reference.to_string(),
                path: PathBuf::from(&reference[FILE_SCHEME.len()..]),
            });
        }

        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Self::Remote {
                url: reference.to_string(),
            });
        }

        if let Some((scheme, _)) = reference.split_once("://") {
            return Err(ConfigError::UnsupportedScheme {
                scheme: scheme.to_string(),
                reference: reference.to_string(),
            });
        }

        Ok(Self::Local {
            reference: reference.to_string(),
            path: PathBuf::from(reference),
        })
    }

    /// The reference string as supplied.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Local { reference, .. } => reference,
            Self::Remote { url } => url,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

impl fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManifestSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ManifestSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ManifestSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Result of comparing freshly fetched content with the persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestChange {
    Changed,
    Unchanged,
}

impl ManifestChange {
    pub fn is_changed(self) -> bool {
        self == Self::Changed
    }
}

impl fmt::Display for ManifestChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Changed => f.write_str("changed"),
            Self::Unchanged => f.write_str("unchanged"),
        }
    }
}

/// What the installer did during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallOutcome {
    /// A pending change was installed.
    Installed,
    /// No change was pending; the package manager ran as a verify step.
    Verified,
    /// A previously failed install of the same content was attempted again.
    /// A successful retry counts as a change for reload purposes, since the
    /// new dependencies were never picked up.
    Retried,
    /// Nothing pending and the policy does not verify; no child was spawned.
    Skipped,
}

impl InstallOutcome {
    /// Whether the package manager was actually invoked.
    pub fn invoked(self) -> bool {
        !matches!(self, Self::Skipped)
    }

    /// Whether this outcome put content on disk that the running process has
    /// not loaded yet.
    pub fn applied_new_content(self) -> bool {
        matches!(self, Self::Installed | Self::Retried)
    }
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Installed => "installed",
            Self::Verified => "verified",
            Self::Retried => "retried",
            Self::Skipped => "skipped",
        };
        f.write_str(label)
    }
}
