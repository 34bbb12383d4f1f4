//! `reqloader normalize` — show where a manifest URL is fetched from.

use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Manifest URL, e.g. https://github.com/<owner>/<repo>/blob/<ref>/requirements.txt
    pub url: String,
}

impl NormalizeArgs {
    pub fn run(self) -> Result<()> {
        println!("{}", reqloader_sync::normalize(&self.url));
        Ok(())
    }
}
