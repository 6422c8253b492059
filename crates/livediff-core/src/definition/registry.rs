//! Auxiliary definitions supplied by the caller
//!
//! Definitions registered here take priority over definitions stored in
//! the cluster. The registry is built once and read-only afterwards.

use super::{Definition, DefinitionKind};
use crate::errors::Result;
use crate::model::Object;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    definitions: BTreeMap<(DefinitionKind, String), Definition>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every definition resource in `objects`, skipping other kinds
    pub fn from_objects<'a>(objects: impl IntoIterator<Item = &'a Object>) -> Result<Self> {
        let mut registry = Self::new();
        for obj in objects {
            if Definition::is_definition_kind(obj.kind()) {
                registry.register(Definition::from_object(obj)?);
            }
        }
        Ok(registry)
    }

    /// Add or replace a definition
    pub fn register(&mut self, definition: Definition) {
        self.definitions
            .insert((definition.kind, definition.name.clone()), definition);
    }

    pub fn get(&self, kind: DefinitionKind, name: &str) -> Option<&Definition> {
        self.definitions.get(&(kind, name.to_string()))
    }

    /// Whether `name` is a registered trait type
    pub fn is_trait(&self, name: &str) -> bool {
        self.get(DefinitionKind::Trait, name).is_some()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
