//! LiveDiff Core - rendering and manifest comparison for OAM applications
//!
//! This crate provides the building blocks of the live-diff engine:
//! - Application, revision and unstructured object models
//! - Template-based rendering of components, traits and policies
//! - Override/topology policy expansion for deploy workflow steps
//! - Manifest trees normalized for comparison, and the line diff engine
//! - The human-readable diff report and dry-run printer
//!
//! Lifecycle logging of whole operations lives in `livediff-engine`; this
//! crate only emits `tracing::debug!` details.

pub mod appfile;
pub mod cluster;
pub mod config;
pub mod definition;
pub mod diff;
pub mod dryrun;
pub mod errors;
pub mod input;
pub mod logging_facility;
pub mod manifest;
pub mod model;
pub mod patch;
pub mod policy;
pub mod report;

pub use livediff_core_types as core_types;

// Re-export commonly used types
pub use appfile::{Appfile, AppfileGenerator};
pub use cluster::{ClusterClient, DryRunMode, MemoryCluster};
pub use config::LiveDiffConfig;
pub use definition::{DefinitionRegistry, TemplateAppfileGenerator};
pub use diff::{DiffEntry, DiffType};
pub use dryrun::{print_dry_run, DryRunOption, DryRunResult};
pub use errors::{ExError, ExErrorKind, LiveDiffError, Result};
pub use manifest::{ManifestKind, ManifestNode};
pub use model::{Application, ApplicationRevision, ComponentManifest, Object};
pub use report::ReportDiffOption;
