//! LiveDiff CLI
//!
//! Command-line interface for dry-running and diffing OAM applications

use clap::{Parser, Subcommand};
use livediff_core::logging_facility::{self, Profile};
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "livediff")]
#[command(about = "LiveDiff - Dry-run and diff application manifests", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log to stderr with this profile (dev, prod)
    #[arg(long, global = true)]
    log_profile: Option<Profile>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render an application into its manifests
    DryRun(commands::dry_run::DryRunArgs),
    /// Compare an application with a revision or another application
    Diff(commands::diff::DiffArgs),
    /// Validate an application against the cluster without persisting it
    Validate(commands::validate::ValidateArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Some(profile) = cli.log_profile {
        logging_facility::init(profile);
    }

    let result = commands::load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::DryRun(args) => commands::dry_run::execute(args, &config),
        Commands::Diff(args) => commands::diff::execute(args, &config),
        Commands::Validate(args) => commands::validate::execute(args, &config),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
