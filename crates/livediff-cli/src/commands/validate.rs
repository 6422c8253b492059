//! Validate command
//!
//! Usage: livediff validate -f <APP> [--objects <OBJS>..]

use super::{build_dry_run_option, CliResult};
use clap::Args;
use livediff_core::core_types::RequestContext;
use livediff_core::LiveDiffConfig;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Application file (YAML or JSON)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Files holding the live cluster objects
    #[arg(long)]
    pub objects: Vec<PathBuf>,
}

/// Execute validate command
pub fn execute(args: ValidateArgs, config: &LiveDiffConfig) -> CliResult<()> {
    let option = build_dry_run_option(config, &[], &args.objects, false)?;
    livediff_engine::validate_app(&option, &RequestContext::new(), &args.file)?;
    println!("✓ {} passed server-side validation", args.file.display());
    Ok(())
}
