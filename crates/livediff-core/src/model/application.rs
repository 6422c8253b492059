//! Application and ApplicationRevision resources

use crate::model::object::{Object, TypeMeta};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const APPLICATION_API_VERSION: &str = "core.oam.dev/v1beta1";
pub const APPLICATION_KIND: &str = "Application";
pub const APPLICATION_REVISION_KIND: &str = "ApplicationRevision";
pub const POLICY_API_VERSION: &str = "core.oam.dev/v1alpha1";
pub const POLICY_KIND: &str = "Policy";
pub const WORKFLOW_API_VERSION: &str = "core.oam.dev/v1alpha1";
pub const WORKFLOW_KIND: &str = "Workflow";

/// Object metadata; unknown fields (uid, resourceVersion, ...) are kept in `extra`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Application {
    #[serde(rename = "apiVersion", default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ApplicationSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

impl Application {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    /// Name of the latest revision recorded in status, if any
    pub fn latest_revision_name(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.get("latestRevision"))
            .and_then(|r| r.get("name"))
            .and_then(Value::as_str)
    }

    pub fn set_type_meta(&mut self) {
        self.api_version = APPLICATION_API_VERSION.to_string();
        self.kind = APPLICATION_KIND.to_string();
    }

    pub fn type_meta() -> TypeMeta {
        TypeMeta::new(APPLICATION_API_VERSION, APPLICATION_KIND)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplicationSpec {
    #[serde(default)]
    pub components: Vec<ApplicationComponent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<AppPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<Workflow>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplicationComponent {
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<ApplicationTrait>,
    /// dependsOn, inputs, outputs and other fields the renderer passes through
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplicationTrait {
    #[serde(rename = "type")]
    pub trait_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppPolicy {
    pub name: String,
    #[serde(rename = "type")]
    pub policy_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(rename = "ref", default, skip_serializing_if = "String::is_empty")]
    pub workflow_ref: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<WorkflowStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    /// dependsOn, if, timeout, subSteps and the like
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Persisted snapshot of an application spec
///
/// The embedded application carries no name or namespace; those come from
/// the revision itself. Definitions and external objects resolved when the
/// revision was recorded travel with it so it can be re-rendered offline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplicationRevision {
    #[serde(rename = "apiVersion", default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: ApplicationRevisionSpec,
}

impl ApplicationRevision {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRevisionSpec {
    pub application: Application,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub component_definitions: BTreeMap<String, Object>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub trait_definitions: BTreeMap<String, Object>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub policy_definitions: BTreeMap<String, Object>,
    /// External policies keyed by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub policies: BTreeMap<String, Object>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<Object>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referred_objects: Vec<Object>,
}
