mod catalog;
mod commands;
mod config;
mod encoder;
mod error;
mod exporter;
mod grammar;
mod hasher;
mod scanner;
mod session;
mod types;
mod watch;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "phrasebook",
    about = "Extract localizable string literals into stable per-file catalogs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan sources, rewrite localization calls, and update catalogs
    Extract {
        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Regenerate per-file exports from the persisted catalogs
    Export {
        /// Export format: csv, md, or json (defaults to the configured one)
        #[arg(long)]
        format: Option<String>,
    },
    /// List persisted catalogs and their counters
    Status,
    /// Re-run extraction whenever a source file changes
    Watch,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract { dry_run } => commands::extract(dry_run),
        Commands::Export { format } => commands::export(format.as_deref()),
        Commands::Status => commands::status(),
        Commands::Watch => watch::run(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        },
    }
}
