//! `reqloader once` — a single on-demand pass.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use reqloader_core::InstallOutcome;
use reqloader_daemon::{SyncController, UpdateOutcome};

use super::SyncOptions;

#[derive(Args, Debug)]
pub struct OnceArgs {
    /// Restart this process if a changed manifest was installed.
    #[arg(long)]
    pub reload: bool,
}

impl OnceArgs {
    pub fn run(self, options: &SyncOptions) -> Result<()> {
        let config = options.resolve()?;
        let source = config.source.to_string();
        let controller = SyncController::new(config).context("invalid configuration")?;
        let outcome = controller
            .update_blocking(self.reload)
            .with_context(|| format!("sync from '{source}' failed"))?;
        print_outcome(&source, &outcome);
        Ok(())
    }
}

fn print_outcome(source: &str, outcome: &UpdateOutcome) {
    let change = if outcome.change.is_changed() {
        "manifest changed".yellow()
    } else {
        "manifest unchanged".green()
    };
    let install = match outcome.install {
        InstallOutcome::Skipped => "no install needed".dimmed(),
        other => other.to_string().normal(),
    };
    println!("✓ {source}: {change}, {install}");
}
