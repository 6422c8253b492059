//! Dry-run command
//!
//! Usage: livediff dry-run -f <APP> [-d <DEFS>..] [--objects <OBJS>..] [--with-policies]

use super::{build_dry_run_option, load_application, CliResult};
use clap::Args;
use livediff_core::core_types::RequestContext;
use livediff_core::LiveDiffConfig;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DryRunArgs {
    /// Application file (YAML or JSON)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Definition files
    #[arg(short, long = "definitions")]
    pub definitions: Vec<PathBuf>,

    /// Files holding cluster objects (workflows, policies, referred objects)
    #[arg(long)]
    pub objects: Vec<PathBuf>,

    /// Expand deploy steps into one render per topology policy
    #[arg(long)]
    pub with_policies: bool,

    /// Also submit the application in server-side dry-run mode
    #[arg(long)]
    pub server_side: bool,
}

/// Execute dry-run command
pub fn execute(args: DryRunArgs, config: &LiveDiffConfig) -> CliResult<()> {
    let option =
        build_dry_run_option(config, &args.definitions, &args.objects, args.server_side)?;
    let app = load_application(config, &args.file)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    livediff_engine::dry_run_report(
        &option,
        &RequestContext::new(),
        &app,
        args.with_policies,
        &mut out,
    )?;
    out.flush()?;
    Ok(())
}
