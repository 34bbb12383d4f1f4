//! `reqloader run` — foreground sync loop.

use anyhow::{Context, Result};

use reqloader_daemon::start_blocking;

use super::SyncOptions;

pub fn run(options: &SyncOptions) -> Result<()> {
    let config = options.resolve()?;
    start_blocking(config).context("sync loop exited with error")
}
