//! Command orchestration layer.
//!
//! Provides the entry points used by the CLI, coordinating the renderer,
//! the manifest builder and the diff engine of `livediff-core`.

pub mod dry_run;
pub mod live_diff;
