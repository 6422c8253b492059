//! Rendered output of a single component

use crate::model::object::Object;

/// Workload plus trait-produced objects rendered for one component
///
/// Every entry of `traits` carries the `trait.oam.dev/type` and
/// `trait.oam.dev/resource` labels set by the renderer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentManifest {
    pub name: String,
    pub namespace: String,
    pub standard_workload: Object,
    pub traits: Vec<Object>,
    /// Application revision the render was produced for, empty on fresh dry-runs
    pub revision_name: String,
}

impl ComponentManifest {
    /// Trait objects rendered for `trait_type`, in render order
    pub fn traits_of_type<'a>(&'a self, trait_type: &'a str) -> impl Iterator<Item = &'a Object> {
        self.traits
            .iter()
            .filter(move |t| t.label(super::labels::TRAIT_TYPE) == Some(trait_type))
    }
}
