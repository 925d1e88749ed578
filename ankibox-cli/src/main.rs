//! ankibox: keep Obsidian_to_Anki mirror files in sync with their sources.
//!
//! # Usage
//!
//! ```text
//! ankibox [--config <path>] [-v] summary [--short] [--json] [--box <name>]
//! ankibox [--config <path>] [-v] status  [--json]
//! ankibox [--config <path>] [-v] add     [--dry-run] [--box <name>]
//! ankibox [--config <path>] [-v] remove  [--dry-run] [--resume] [--box <name>]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{add::AddArgs, remove::RemoveArgs, status::StatusArgs, summary::SummaryArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "ankibox",
    version,
    about = "Reconcile note folders and queue files with Anki mirror files",
    long_about = None,
)]
struct Cli {
    /// Config file to use instead of ~/.ankibox/config.yaml.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log workflow steps to stderr.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count new and old notes per box.
    Summary(SummaryArgs),

    /// Show the state of every box as a table.
    Status(StatusArgs),

    /// Propose new source notes for card creation.
    Add(AddArgs),

    /// Retire mirror entries whose source note is gone.
    Remove(RemoveArgs),
}

/// Options shared by every subcommand.
#[derive(Debug)]
pub struct Globals {
    pub config: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let globals = Globals { config: cli.config };
    match cli.command {
        Commands::Summary(args) => args.run(&globals),
        Commands::Status(args) => args.run(&globals),
        Commands::Add(args) => args.run(&globals),
        Commands::Remove(args) => args.run(&globals),
    }
}

/// Logs go to stderr so barrier prompts on stdout stay readable. `RUST_LOG`
/// wins over `-v`.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose > 0 { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
