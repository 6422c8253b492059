//! Comparison-stable manifest tree
//!
//! A [`ManifestNode`] tree is built fresh for every diff: an application
//! root, one `AppConfigComponent` grouping node per component (holding the
//! raw workload plus its traits), and, in renderless mode, nodes for the
//! application's external policies, workflow and referred objects.
//!
//! Siblings are identified by [`ManifestNode::key`] (`"<Kind>/<Name>"`).

pub mod build;
pub mod normalize;

pub use build::{extract_name_from_revision_name, generate_manifest, generate_manifest_from_revision};
pub use normalize::{marshal_application, marshal_object, remove_revision_noise, to_canonical_yaml};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ManifestKind {
    #[default]
    Application,
    /// Structural grouping of a component's workload and traits; never reported
    AppConfigComponent,
    /// Raw component workload
    Component,
    Trait,
    Policy,
    Workflow,
    ReferredObject,
}

impl ManifestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestKind::Application => "Application",
            ManifestKind::AppConfigComponent => "AppConfigComponent",
            ManifestKind::Component => "Component",
            ManifestKind::Trait => "Trait",
            ManifestKind::Policy => "Policy",
            ManifestKind::Workflow => "Workflow",
            ManifestKind::ReferredObject => "ReferredObject",
        }
    }

    /// Report label, `None` for structural kinds
    pub fn header(&self) -> Option<&'static str> {
        match self {
            ManifestKind::Application => Some("Application"),
            ManifestKind::AppConfigComponent => None,
            ManifestKind::Component => Some("Component"),
            ManifestKind::Trait => Some("Trait"),
            ManifestKind::Policy => Some("External Policy"),
            ManifestKind::Workflow => Some("External Workflow"),
            ManifestKind::ReferredObject => Some("Referred Object"),
        }
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named object in canonical text form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestNode {
    pub name: String,
    pub kind: ManifestKind,
    /// Canonical YAML of the object, or an inline `Error: ...` message
    pub data: String,
    pub children: Vec<ManifestNode>,
}

impl ManifestNode {
    pub fn new(kind: ManifestKind, name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            data: data.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<ManifestNode>) -> Self {
        self.children = children;
        self
    }

    pub fn key(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }
}
