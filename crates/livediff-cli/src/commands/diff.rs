//! Diff command
//!
//! Usage: livediff diff -f <APP> (--revision <REV> | --base <OLD_APP>)
//!        [--context N] [--renderless] [--output text|json] [--no-color]

use super::{build_dry_run_option, load_application, CliResult};
use clap::{Args, ValueEnum};
use livediff_core::core_types::RequestContext;
use livediff_core::input::read_revision;
use livediff_core::{DiffEntry, LiveDiffConfig, ReportDiffOption};
use livediff_engine::{LiveDiffObject, LiveDiffOption};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Application file (YAML or JSON), the new side
    #[arg(short, long)]
    pub file: PathBuf,

    /// Stored application revision to compare against
    #[arg(long, conflicts_with = "base", required_unless_present = "base")]
    pub revision: Option<PathBuf>,

    /// Another application to compare against
    #[arg(long)]
    pub base: Option<PathBuf>,

    /// Definition files
    #[arg(short, long = "definitions")]
    pub definitions: Vec<PathBuf>,

    /// Files holding cluster objects (workflows, policies, referred objects)
    #[arg(long)]
    pub objects: Vec<PathBuf>,

    /// Unchanged lines shown around each change; 0 or less shows everything
    #[arg(long, allow_hyphen_values = true)]
    pub context: Option<i32>,

    /// Compare specs and external objects only, without rendering
    #[arg(long)]
    pub renderless: bool,

    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Disable ANSI colors
    #[arg(long)]
    pub no_color: bool,
}

/// Execute diff command
pub fn execute(args: DiffArgs, config: &LiveDiffConfig) -> CliResult<()> {
    let option = LiveDiffOption::new(build_dry_run_option(
        config,
        &args.definitions,
        &args.objects,
        false,
    )?);
    let ctx = RequestContext::new();
    let app = load_application(config, &args.file)?;

    let entry = match (&args.revision, &args.base) {
        (Some(revision), _) => {
            let revision = read_revision(revision)?;
            if args.renderless {
                option.renderless_diff(
                    &ctx,
                    &LiveDiffObject::Application(app),
                    &LiveDiffObject::Revision(revision),
                )?
            } else {
                option.diff(&ctx, &app, &revision)?
            }
        }
        (None, Some(base)) => {
            let old_app = load_application(config, base)?;
            if args.renderless {
                option.renderless_diff(
                    &ctx,
                    &LiveDiffObject::Application(app),
                    &LiveDiffObject::Application(old_app),
                )?
            } else {
                option.diff_apps(&ctx, &app, &old_app)?
            }
        }
        (None, None) => return Err("either --revision or --base is required".into()),
    };

    print_entry(&entry, &args, config)
}

fn print_entry(entry: &DiffEntry, args: &DiffArgs, config: &LiveDiffConfig) -> CliResult<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, entry)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            let mut report = ReportDiffOption::new(args.context.unwrap_or(config.context), out)
                .with_color(config.color && !args.no_color);
            report.print_diff_report(entry)?;
        }
    }
    Ok(())
}
