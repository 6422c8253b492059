//! Manifest diff engine.
//!
//! Compares two [`ManifestNode`](crate::manifest::ManifestNode) trees line
//! by line and produces a [`DiffEntry`] tree.
//!
//! ## Guarantees
//!
//! - **Reflexivity**: diffing a tree against itself yields no change at every node.
//! - **Add/remove symmetry**: a node missing on one side is diffed against an
//!   empty node, so it is all-added or all-removed.
//! - **Deterministic order**: old-side siblings first, then new-only siblings.

pub mod engine;
pub mod line_diff;
pub mod model;

pub use engine::{calculate_diff, diff_manifest, pair_children, Pairing};
pub use line_diff::{calc_diff_type, diff_lines, has_changes};
pub use model::{Delta, DiffEntry, DiffRecord, DiffType};
