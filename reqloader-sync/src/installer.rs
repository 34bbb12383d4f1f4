//! Installer — runs the external package manager against the manifest.
//!
//! Which passes actually spawn the package manager is an explicit
//! [`InstallPolicy`], and what happens to its output is an [`OutputMode`].
//! `silent = true` maps to `AlwaysVerify` + `Silent`, `silent = false` to
//! `OnChange` + `Verbose`.

use std::process::{Command, ExitStatus, Stdio};

use reqloader_core::{InstallOutcome, InstallerConfig, SyncConfig};

use crate::error::SyncError;
use crate::store::ManifestStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPolicy {
    /// Run the package manager every pass, as a verify step when nothing
    /// changed.
    AlwaysVerify,
    /// Run only when a change is pending, or to retry content whose last
    /// install failed.
    OnChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Child stdout/stderr go to the null device.
    Silent,
    /// Child stdout/stderr are inherited from this process.
    Verbose,
}

impl OutputMode {
    fn stdio(self) -> Stdio {
        match self {
            OutputMode::Silent => Stdio::null(),
            OutputMode::Verbose => Stdio::inherit(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Installer {
    program: String,
    args: Vec<String>,
    policy: InstallPolicy,
    output: OutputMode,
}

impl Installer {
    pub fn new(command: &InstallerConfig, policy: InstallPolicy, output: OutputMode) -> Self {
        Self {
            program: command.program.clone(),
            args: command.args.clone(),
            policy,
            output,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        let (policy, output) = if config.silent {
            (InstallPolicy::AlwaysVerify, OutputMode::Silent)
        } else {
            (InstallPolicy::OnChange, OutputMode::Verbose)
        };
        Self::new(&config.installer, policy, output)
    }

    pub fn policy(&self) -> InstallPolicy {
        self.policy
    }

    /// Consume the store's pending marker and, if the policy says so, run
    /// the package manager against the store's manifest.
    ///
    /// The marker is consumed before the child starts and is not restored
    /// when the install fails; the failure is recorded instead so an
    /// `OnChange` pass retries it next time.
    pub fn install(&self, store: &ManifestStore) -> Result<InstallOutcome, SyncError> {
        let consumed = store.consume_marker()?;
        let manifest = store.manifest_path();

        let outcome = if consumed.had_pending {
            InstallOutcome::Installed
        } else if !manifest.exists() {
            tracing::debug!("no manifest recorded yet; nothing to install");
            return Ok(InstallOutcome::Skipped);
        } else if consumed.last_install_failed {
            InstallOutcome::Retried
        } else {
            match self.policy {
                InstallPolicy::AlwaysVerify => InstallOutcome::Verified,
                InstallPolicy::OnChange => return Ok(InstallOutcome::Skipped),
            }
        };

        tracing::info!(
            program = %self.program,
            manifest = %manifest.display(),
            outcome = %outcome,
            "running package manager",
        );

        let status = match self.run(manifest) {
            Ok(status) => status,
            Err(err) => {
                store.record_install(false)?;
                return Err(err);
            }
        };
        if status.success() {
            store.record_install(true)?;
            return Ok(outcome);
        }

        store.record_install(false)?;
        Err(SyncError::InstallFailed {
            exit_code: status.code(),
        })
    }

    fn run(&self, manifest: &std::path::Path) -> Result<ExitStatus, SyncError> {
        Command::new(&self.program)
            .args(&self.args)
            .arg(manifest)
            .stdin(Stdio::null())
            .stdout(self.output.stdio())
            .stderr(self.output.stdio())
            .status()
            .map_err(|source| SyncError::Spawn {
                program: self.program.clone(),
                source,
            })
    }
}
