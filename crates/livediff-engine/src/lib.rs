//! LiveDiff Engine - Orchestration layer
//!
//! Ties rendering and diffing together: live-diff of an application against
//! a stored revision or another application, renderless comparison, and the
//! dry-run commands. Every entry point logs its lifecycle.

pub mod commands;

pub use commands::dry_run::{dry_run, dry_run_report, dry_run_with_policies, validate_app};
pub use commands::live_diff::{LiveDiffObject, LiveDiffOption};
