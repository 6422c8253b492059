//! Diff tree output types.
//!
//! [`DiffEntry`] mirrors the shape of the compared manifest trees and
//! serializes to JSON for machine consumers.

use crate::manifest::ManifestKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiffType {
    #[serde(rename = "ADD")]
    Add,
    #[serde(rename = "MODIFY")]
    Modify,
    #[serde(rename = "REMOVE")]
    Remove,
    /// No change
    #[default]
    #[serde(rename = "")]
    NoChange,
}

impl DiffType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffType::Add => "ADD",
            DiffType::Modify => "MODIFY",
            DiffType::Remove => "REMOVE",
            DiffType::NoChange => "",
        }
    }

    pub fn is_no_change(&self) -> bool {
        *self == DiffType::NoChange
    }
}

impl fmt::Display for DiffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side a diffed line comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delta {
    /// Only in the old text (removed)
    LeftOnly,
    /// Only in the new text (added)
    RightOnly,
    Common,
}

/// One line of a line-level diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
    pub delta: Delta,
    pub payload: String,
}

impl DiffRecord {
    pub fn new(delta: Delta, payload: impl Into<String>) -> Self {
        Self {
            delta,
            payload: payload.into(),
        }
    }
}

/// Diff result for one manifest node and its children
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiffEntry {
    pub name: String,
    pub kind: ManifestKind,
    #[serde(rename = "diffType", default, skip_serializing_if = "DiffType::is_no_change")]
    pub diff_type: DiffType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diffs: Vec<DiffRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subs: Vec<DiffEntry>,
}

impl DiffEntry {
    pub fn new(name: impl Into<String>, kind: ManifestKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    pub fn with_diffs(mut self, diff_type: DiffType, diffs: Vec<DiffRecord>) -> Self {
        self.diff_type = diff_type;
        self.diffs = diffs;
        self
    }

    /// Depth-first walk over this entry and all descendants
    pub fn walk(&self) -> Vec<&DiffEntry> {
        let mut out = vec![self];
        for sub in &self.subs {
            out.extend(sub.walk());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_change_omitted_from_json() {
        let entry = DiffEntry::new("myweb", ManifestKind::Component);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({"name": "myweb", "kind": "Component"}));
    }

    #[test]
    fn test_json_shape() {
        let entry = DiffEntry::new("livediff-demo", ManifestKind::Application).with_diffs(
            DiffType::Modify,
            vec![
                DiffRecord::new(Delta::LeftOnly, "replicas: 1"),
                DiffRecord::new(Delta::RightOnly, "replicas: 3"),
            ],
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["diffType"], "MODIFY");
        assert_eq!(json["diffs"][0]["delta"], "LeftOnly");
        assert_eq!(json["diffs"][1]["payload"], "replicas: 3");
    }
}
