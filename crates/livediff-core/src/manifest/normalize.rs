//! Revision-noise stripping and canonical serialization
//!
//! Canonical text is YAML with keys sorted at every level, so serializing
//! the same logical object twice yields identical bytes.

use super::ManifestKind;
use crate::errors::Result;
use crate::model::application::{POLICY_API_VERSION, POLICY_KIND, WORKFLOW_API_VERSION, WORKFLOW_KIND};
use crate::model::{labels, Application, Object, TypeMeta};
use serde_json::Value;
use std::collections::BTreeMap;

const KEPT_METADATA: &[&str] = &["name", "namespace", "labels", "annotations"];

const NOISE_ANNOTATIONS: &[&str] = &[
    labels::ANNOTATION_KUBEVELA_VERSION,
    labels::ANNOTATION_APP_REVISION,
    labels::ANNOTATION_LAST_APPLIED,
];

/// Labels without the revision label; `None` when nothing is left
pub fn cleared_labels(labels: &BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    let out: BTreeMap<String, String> = labels
        .iter()
        .filter(|(k, _)| k.as_str() != labels::APP_REVISION)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    (!out.is_empty()).then_some(out)
}

/// Annotations without revision/kubectl bookkeeping; `None` when nothing is left
pub fn cleared_annotations(
    annotations: &BTreeMap<String, String>,
) -> Option<BTreeMap<String, String>> {
    let out: BTreeMap<String, String> = annotations
        .iter()
        .filter(|(k, _)| !NOISE_ANNOTATIONS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    (!out.is_empty()).then_some(out)
}

/// Strip revision-only labels and annotations in place
pub fn remove_revision_noise(obj: &mut Object) {
    let labels = cleared_labels(&obj.labels());
    let annotations = cleared_annotations(&obj.annotations());
    obj.set_labels(labels);
    obj.set_annotations(annotations);
}

fn type_meta_for(kind: ManifestKind) -> Option<TypeMeta> {
    match kind {
        ManifestKind::Application => Some(Application::type_meta()),
        ManifestKind::Policy => Some(TypeMeta::new(POLICY_API_VERSION, POLICY_KIND)),
        ManifestKind::Workflow => Some(TypeMeta::new(WORKFLOW_API_VERSION, WORKFLOW_KIND)),
        _ => None,
    }
}

/// Canonical text of `obj` as a node of `kind`
///
/// Sets the group-version-kind for application/policy/workflow nodes, drops
/// application status and revision noise, and keeps only name, namespace,
/// labels and annotations in metadata. `obj` itself is not modified.
pub fn marshal_object(obj: &Object, kind: ManifestKind) -> Result<String> {
    let mut obj = obj.clone();
    if let Some(type_meta) = type_meta_for(kind) {
        obj.set_type_meta(&type_meta);
    }
    if kind == ManifestKind::Application {
        obj.remove("status");
    }
    remove_revision_noise(&mut obj);
    obj.retain_metadata(KEPT_METADATA);
    to_canonical_yaml(&obj.into_value())
}

pub fn marshal_application(app: &Application) -> Result<String> {
    marshal_object(&Object::from_typed(app)?, ManifestKind::Application)
}

/// Serialize `value` as YAML with every mapping's keys sorted
pub fn to_canonical_yaml(value: &Value) -> Result<String> {
    Ok(serde_yaml::to_string(&sorted(value))?)
}

fn sorted(value: &Value) -> serde_yaml::Value {
    match value {
        Value::Null => serde_yaml::Value::Null,
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_yaml::Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                serde_yaml::Value::Number(u.into())
            } else {
                serde_yaml::Value::Number(n.as_f64().unwrap_or_default().into())
            }
        }
        Value::String(s) => serde_yaml::Value::String(s.clone()),
        Value::Array(items) => serde_yaml::Value::Sequence(items.iter().map(sorted).collect()),
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = serde_yaml::Mapping::new();
            for (k, v) in entries {
                out.insert(serde_yaml::Value::String(k.clone()), sorted(v));
            }
            serde_yaml::Value::Mapping(out)
        }
    }
}
