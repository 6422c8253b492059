//! Subcommands and the loading they share
//!
//! Definitions come from `-d` files and the config file; cluster objects
//! (external workflows, policies, referred objects, live applications) come
//! from `--objects` files and are served by an in-memory cluster.

pub mod diff;
pub mod dry_run;
pub mod validate;

use livediff_core::input::{read_application, read_objects};
use livediff_core::model::Application;
use livediff_core::{
    DefinitionRegistry, DryRunOption, LiveDiffConfig, MemoryCluster, Object,
    TemplateAppfileGenerator,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

pub fn load_config(path: Option<&Path>) -> CliResult<LiveDiffConfig> {
    match path {
        Some(path) => Ok(LiveDiffConfig::load(path)?),
        None => Ok(LiveDiffConfig::default()),
    }
}

fn read_all(paths: &[PathBuf]) -> CliResult<Vec<Object>> {
    let mut objects = Vec::new();
    for path in paths {
        objects.extend(read_objects(path)?);
    }
    Ok(objects)
}

/// Dry-run option over the given definition and object files
pub fn build_dry_run_option(
    config: &LiveDiffConfig,
    definitions: &[PathBuf],
    objects: &[PathBuf],
    server_side_dry_run: bool,
) -> CliResult<DryRunOption> {
    let mut definition_files = config.definitions.clone();
    definition_files.extend_from_slice(definitions);
    let registry = DefinitionRegistry::from_objects(&read_all(&definition_files)?)?;

    let cluster = Arc::new(MemoryCluster::with_objects(read_all(objects)?)?);
    let generator = TemplateAppfileGenerator::new(registry, cluster.clone());
    Ok(DryRunOption::new(
        Arc::new(generator),
        cluster,
        server_side_dry_run || config.server_side_dry_run,
    ))
}

/// Read an application, defaulting its namespace from the config
pub fn load_application(config: &LiveDiffConfig, path: &Path) -> CliResult<Application> {
    let mut app = read_application(path)?;
    if app.metadata.namespace.is_empty() {
        app.metadata.namespace = config.default_namespace.clone();
    }
    Ok(app)
}
