//! reqloader — keep a dependency manifest in step with its source.
//!
//! # Usage
//!
//! ```text
//! reqloader [--config <file>] [--source <ref>] [--interval <secs>] [--verbose]
//!           [--reload-on-change] [--no-startup-run] [--log-json] <command>
//!
//! reqloader run                 poll forever, reinstalling on change
//! reqloader once [--reload]     run a single pass and report what happened
//! reqloader normalize <url>     print the raw-content URL for a blob-view URL
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{normalize::NormalizeArgs, once::OnceArgs, SyncOptions};
use reqloader_daemon::{init_tracing, LogFormat};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "reqloader",
    version,
    about = "Keep a dependency manifest in sync with a local or hosted source",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    sync: SyncOptions,

    /// Emit log lines as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll the source forever, reinstalling when the manifest changes.
    Run,

    /// Run one fetch / compare / install pass now.
    Once(OnceArgs),

    /// Print the raw-content URL a blob-view URL resolves to.
    Normalize(NormalizeArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    match cli.command {
        Commands::Run => commands::run::run(&cli.sync),
        Commands::Once(args) => args.run(&cli.sync),
        Commands::Normalize(args) => args.run(),
    }
}
