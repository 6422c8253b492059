//! Component, trait and policy definitions
//!
//! A definition pairs a type name with an object template. Templates are
//! plain YAML/JSON objects in which `${parameter.x}` and `${context.x}`
//! placeholders are substituted at render time (see [`template`]).
//!
//! ```yaml
//! apiVersion: core.oam.dev/v1beta1
//! kind: TraitDefinition
//! metadata:
//!   name: myingress
//! spec:
//!   schematic:
//!     template:
//!       outputs:
//!         service:
//!           apiVersion: v1
//!           kind: Service
//!           spec:
//!             ports: [{port: "${parameter.port}"}]
//! ```

pub mod registry;
pub mod render;
pub mod template;

pub use registry::DefinitionRegistry;
pub use render::TemplateAppfileGenerator;

use crate::errors::{ExError, LiveDiffError, Result};
use crate::model::{Object, TypeMeta};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFINITION_API_VERSION: &str = "core.oam.dev/v1beta1";

/// Namespace holding cluster-wide definitions
pub const SYSTEM_DEFINITION_NAMESPACE: &str = "vela-system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DefinitionKind {
    Component,
    Trait,
    Policy,
}

impl DefinitionKind {
    pub fn resource_kind(&self) -> &'static str {
        match self {
            DefinitionKind::Component => "ComponentDefinition",
            DefinitionKind::Trait => "TraitDefinition",
            DefinitionKind::Policy => "PolicyDefinition",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DefinitionKind::Component => "component",
            DefinitionKind::Trait => "trait",
            DefinitionKind::Policy => "policy",
        }
    }

    pub fn type_meta(&self) -> TypeMeta {
        TypeMeta::new(DEFINITION_API_VERSION, self.resource_kind())
    }

    fn from_resource_kind(kind: &str) -> Option<Self> {
        match kind {
            "ComponentDefinition" => Some(DefinitionKind::Component),
            "TraitDefinition" => Some(DefinitionKind::Trait),
            "PolicyDefinition" => Some(DefinitionKind::Policy),
            _ => None,
        }
    }
}

/// Object templates of a definition
///
/// - `output`: the primary object (component workload, policy manifest)
/// - `outputs`: named extra objects (trait resources, auxiliary workloads)
/// - `patch`: merge patch applied to the component workload (traits only)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub kind: DefinitionKind,
    pub name: String,
    pub template: DefinitionTemplate,
}

impl Definition {
    /// Parse a `*Definition` resource
    pub fn from_object(obj: &Object) -> Result<Self> {
        let kind = DefinitionKind::from_resource_kind(obj.kind()).ok_or_else(|| {
            ExError::from(LiveDiffError::InvalidManifest {
                reason: format!("{} is not a definition kind", obj.kind()),
            })
            .with_op("parse_definition")
        })?;
        if obj.name().is_empty() {
            return Err(ExError::from(LiveDiffError::InvalidManifest {
                reason: format!("{} must have metadata.name", obj.kind()),
            })
            .with_op("parse_definition"));
        }

        let raw = obj
            .get("spec")
            .and_then(|s| s.get("schematic"))
            .and_then(|s| s.get("template"))
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new()));
        let template: DefinitionTemplate = serde_json::from_value(raw).map_err(|e| {
            ExError::from(LiveDiffError::InvalidManifest {
                reason: format!("invalid template in {} {}: {}", obj.kind(), obj.name(), e),
            })
            .with_op("parse_definition")
        })?;

        Ok(Self {
            kind,
            name: obj.name().to_string(),
            template,
        })
    }

    /// True when `kind` is one of the definition resource kinds
    pub fn is_definition_kind(kind: &str) -> bool {
        DefinitionKind::from_resource_kind(kind).is_some()
    }
}
