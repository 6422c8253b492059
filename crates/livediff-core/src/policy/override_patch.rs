//! Override policy properties and component patching
//!
//! An override policy carries a list of component patches and an optional
//! component selector. Patching never touches the caller's components; the
//! result is a fresh list.

use crate::errors::{LiveDiffError, Result};
use crate::model::{ApplicationComponent, ApplicationTrait};
use crate::patch::merge_patch;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Properties of an `override` policy
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverridePolicySpec {
    #[serde(default)]
    pub components: Vec<EnvComponentPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<Vec<String>>,
}

/// Patch for the components matching `name` (and `type`, when set)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvComponentPatch {
    /// Anchored regular expression over component names; empty matches all
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub component_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<EnvTraitPatch>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvTraitPatch {
    #[serde(rename = "type")]
    pub trait_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    /// Remove the trait instead of patching it
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable: bool,
}

impl EnvComponentPatch {
    fn matcher(&self) -> Result<Option<Regex>> {
        if self.name.is_empty() {
            return Ok(None);
        }
        Regex::new(&format!("^{}$", self.name))
            .map(Some)
            .map_err(|e| {
                LiveDiffError::InvalidComponentPattern {
                    pattern: self.name.clone(),
                    reason: e.to_string(),
                }
                .into()
            })
    }

    fn applies_to(&self, matcher: Option<&Regex>, comp: &ApplicationComponent) -> bool {
        let name_matches = matcher.map_or(true, |re| re.is_match(&comp.name));
        let type_matches =
            self.component_type.is_empty() || self.component_type == comp.component_type;
        name_matches && type_matches
    }
}

/// Apply `patches` in order, then keep only `selector` components if given
///
/// # Example
/// ```
/// use livediff_core::model::ApplicationComponent;
/// use livediff_core::policy::{patch_components, EnvComponentPatch};
/// use serde_json::json;
///
/// let base = vec![ApplicationComponent {
///     name: "myweb-1".to_string(),
///     component_type: "worker".to_string(),
///     properties: Some(json!({"image": "busybox", "replicas": 1})),
///     ..Default::default()
/// }];
/// let patch = EnvComponentPatch {
///     name: "myweb-.*".to_string(),
///     properties: Some(json!({"replicas": 3})),
///     ..Default::default()
/// };
///
/// let out = patch_components(&base, &[patch], None).unwrap();
/// assert_eq!(out[0].properties, Some(json!({"image": "busybox", "replicas": 3})));
/// assert_eq!(base[0].properties, Some(json!({"image": "busybox", "replicas": 1})));
/// ```
pub fn patch_components(
    base: &[ApplicationComponent],
    patches: &[EnvComponentPatch],
    selector: Option<&[String]>,
) -> Result<Vec<ApplicationComponent>> {
    let mut components = base.to_vec();

    for patch in patches {
        let matcher = patch.matcher()?;
        for comp in components.iter_mut() {
            if patch.applies_to(matcher.as_ref(), comp) {
                merge_component(comp, patch);
            }
        }
    }

    match selector {
        Some(names) if !names.is_empty() => Ok(components
            .into_iter()
            .filter(|c| names.iter().any(|n| n == &c.name))
            .collect()),
        _ => Ok(components),
    }
}

fn merge_component(comp: &mut ApplicationComponent, patch: &EnvComponentPatch) {
    if let Some(props) = &patch.properties {
        let base = comp.properties.get_or_insert_with(|| Value::Object(Default::default()));
        merge_patch(base, props);
    }

    for trait_patch in &patch.traits {
        let existing = comp
            .traits
            .iter()
            .position(|t| t.trait_type == trait_patch.trait_type);
        match (existing, trait_patch.disable) {
            (Some(idx), true) => {
                comp.traits.remove(idx);
            }
            (None, true) => {}
            (Some(idx), false) => {
                if let Some(props) = &trait_patch.properties {
                    let base = comp.traits[idx]
                        .properties
                        .get_or_insert_with(|| Value::Object(Default::default()));
                    merge_patch(base, props);
                }
            }
            (None, false) => comp.traits.push(ApplicationTrait {
                trait_type: trait_patch.trait_type.clone(),
                properties: trait_patch.properties.clone(),
            }),
        }
    }
}
