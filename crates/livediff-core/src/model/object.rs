//! Unstructured Kubernetes objects
//!
//! Rendered workloads, trait outputs, external policies/workflows and
//! referred objects are all handled as [`Object`]: a JSON map with typed
//! accessors for the handful of fields the engine reads or rewrites.

use crate::errors::{ExError, ExErrorKind, LiveDiffError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Group/version/kind of an object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeMeta {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
}

impl TypeMeta {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }

    /// API group, empty for the core group
    pub fn group(&self) -> &str {
        match self.api_version.split_once('/') {
            Some((group, _)) => group,
            None => "",
        }
    }

    /// Qualified resource name as it appears in API server errors,
    /// e.g. `workflows.core.oam.dev` or `configmaps`
    pub fn resource(&self) -> String {
        let plural = format!("{}s", self.kind.to_lowercase());
        match self.group() {
            "" => plural,
            group => format!("{}.{}", plural, group),
        }
    }
}

impl std::fmt::Display for TypeMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.api_version, self.kind)
    }
}

/// Namespace/name pair identifying an object of a known type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            return write!(f, "{}", self.name);
        }
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Schemaless Kubernetes object
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Object(Map<String, Value>);

impl Object {
    pub fn new(type_meta: &TypeMeta, namespace: &str, name: &str) -> Self {
        let mut obj = Object::default();
        obj.set_type_meta(type_meta);
        obj.set_name(name);
        if !namespace.is_empty() {
            obj.set_namespace(namespace);
        }
        obj
    }

    /// Build from a JSON value, rejecting anything that is not a map
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Object(map)),
            other => Err(LiveDiffError::InvalidManifest {
                reason: format!("expected an object, got {}", type_name(&other)),
            }
            .into()),
        }
    }

    /// Convert any serializable typed object
    pub fn from_typed<T: Serialize>(typed: &T) -> Result<Self> {
        let value = serde_json::to_value(typed).map_err(|e| {
            ExError::new(ExErrorKind::Serialization)
                .with_op("object_from_typed")
                .with_message(e.to_string())
        })?;
        Self::from_value(value)
    }

    /// Convert into a typed object
    pub fn to_typed<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| {
            ExError::new(ExErrorKind::InvalidManifest)
                .with_op("object_to_typed")
                .with_entity_id(self.name())
                .with_message(e.to_string())
        })
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn api_version(&self) -> &str {
        self.str_field("apiVersion")
    }

    pub fn kind(&self) -> &str {
        self.str_field("kind")
    }

    pub fn type_meta(&self) -> TypeMeta {
        TypeMeta::new(self.api_version(), self.kind())
    }

    pub fn set_type_meta(&mut self, type_meta: &TypeMeta) {
        self.0.insert(
            "apiVersion".to_string(),
            Value::String(type_meta.api_version.clone()),
        );
        self.0
            .insert("kind".to_string(), Value::String(type_meta.kind.clone()));
    }

    pub fn name(&self) -> &str {
        self.metadata_str("name")
    }

    pub fn set_name(&mut self, name: &str) {
        let name = Value::String(name.to_string());
        self.update_metadata(|m| {
            m.insert("name".to_string(), name);
        });
    }

    pub fn namespace(&self) -> &str {
        self.metadata_str("namespace")
    }

    pub fn set_namespace(&mut self, namespace: &str) {
        let namespace = Value::String(namespace.to_string());
        self.update_metadata(|m| {
            m.insert("namespace".to_string(), namespace);
        });
    }

    pub fn resource_version(&self) -> &str {
        self.metadata_str("resourceVersion")
    }

    pub fn set_resource_version(&mut self, version: &str) {
        let version = Value::String(version.to_string());
        self.update_metadata(|m| {
            m.insert("resourceVersion".to_string(), version);
        });
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace(), self.name())
    }

    pub fn labels(&self) -> BTreeMap<String, String> {
        self.string_map("labels")
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.metadata()
            .and_then(|m| m.get("labels"))
            .and_then(|l| l.get(key))
            .and_then(Value::as_str)
    }

    /// Replace labels; `None` removes the field entirely
    pub fn set_labels(&mut self, labels: Option<BTreeMap<String, String>>) {
        self.set_string_map("labels", labels);
    }

    pub fn add_labels(&mut self, extra: &BTreeMap<String, String>) {
        let mut labels = self.labels();
        labels.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.set_labels(Some(labels));
    }

    pub fn annotations(&self) -> BTreeMap<String, String> {
        self.string_map("annotations")
    }

    /// Replace annotations; `None` removes the field entirely
    pub fn set_annotations(&mut self, annotations: Option<BTreeMap<String, String>>) {
        self.set_string_map("annotations", annotations);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Keep only the named metadata fields
    pub fn retain_metadata(&mut self, keep: &[&str]) {
        if let Some(Value::Object(meta)) = self.0.get_mut("metadata") {
            meta.retain(|k, _| keep.contains(&k.as_str()));
        }
    }

    fn str_field(&self, key: &str) -> &str {
        self.0.get(key).and_then(Value::as_str).unwrap_or("")
    }

    fn metadata(&self) -> Option<&Map<String, Value>> {
        self.0.get("metadata").and_then(Value::as_object)
    }

    fn metadata_str(&self, key: &str) -> &str {
        self.metadata()
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    fn update_metadata(&mut self, f: impl FnOnce(&mut Map<String, Value>)) {
        let mut meta = match self.0.remove("metadata") {
            Some(Value::Object(m)) => m,
            _ => Map::new(),
        };
        f(&mut meta);
        self.0.insert("metadata".to_string(), Value::Object(meta));
    }

    fn string_map(&self, key: &str) -> BTreeMap<String, String> {
        self.metadata()
            .and_then(|m| m.get(key))
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn set_string_map(&mut self, key: &str, values: Option<BTreeMap<String, String>>) {
        match values {
            Some(values) => {
                let map: Map<String, Value> = values
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect();
                self.update_metadata(|m| {
                    m.insert(key.to_string(), Value::Object(map));
                });
            }
            None => {
                if let Some(Value::Object(meta)) = self.0.get_mut("metadata") {
                    meta.remove(key);
                }
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
