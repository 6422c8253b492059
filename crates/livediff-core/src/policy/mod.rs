//! Topology/override policy expansion for deploy workflow steps
//!
//! A `deploy` step names the policies it dispatches under. Topology policies
//! fan out into one rendering pass each; override policies patch the
//! application's components before every pass.

pub mod override_patch;

pub use override_patch::{patch_components, EnvComponentPatch, EnvTraitPatch, OverridePolicySpec};

use crate::appfile::{OVERRIDE_POLICY_TYPE, TOPOLOGY_POLICY_TYPE};
use crate::errors::{ExError, LiveDiffError, Result};
use crate::model::{AppPolicy, Application, WorkflowStep};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Properties of a `deploy` workflow step
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct DeployWorkflowStepSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto: Option<bool>,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_terraform_component: Option<bool>,
}

impl DeployWorkflowStepSpec {
    /// Strictly parse the properties of `step`
    pub fn from_step(step: &WorkflowStep) -> Result<Self> {
        let raw = step
            .properties
            .clone()
            .unwrap_or_else(|| Value::Object(Default::default()));
        serde_json::from_value(raw).map_err(|e| {
            ExError::from(LiveDiffError::InvalidDeployStep {
                step: step.name.clone(),
                reason: e.to_string(),
            })
            .with_op("parse_deploy_step")
        })
    }
}

/// Split the named policies into (topology, override) lists, in request order
///
/// Every requested name must be declared; other policy types are skipped.
pub fn filter_policies(
    policies: &[AppPolicy],
    names: &[String],
) -> Result<(Vec<AppPolicy>, Vec<AppPolicy>)> {
    let mut topology = Vec::new();
    let mut overrides = Vec::new();
    for name in names {
        let policy = policies.iter().find(|p| &p.name == name).ok_or_else(|| {
            ExError::from(LiveDiffError::PolicyNotFound { name: name.clone() })
                .with_op("filter_policies")
        })?;
        match policy.policy_type.as_str() {
            TOPOLOGY_POLICY_TYPE => topology.push(policy.clone()),
            OVERRIDE_POLICY_TYPE => overrides.push(policy.clone()),
            _ => {}
        }
    }
    Ok((topology, overrides))
}

/// Copy `app` and fold each override policy's patches over its components
pub fn patch_app(app: &Application, overrides: &[AppPolicy]) -> Result<Application> {
    let mut patched = app.clone();
    for policy in overrides {
        let props = policy.properties.clone().ok_or_else(|| {
            ExError::from(LiveDiffError::EmptyOverridePolicy {
                name: policy.name.clone(),
            })
            .with_op("patch_app")
        })?;
        let spec: OverridePolicySpec = serde_json::from_value(props).map_err(|e| {
            ExError::from(LiveDiffError::InvalidOverridePolicy {
                name: policy.name.clone(),
                reason: e.to_string(),
            })
            .with_op("patch_app")
        })?;
        patched.spec.components = patch_components(
            &patched.spec.components,
            &spec.components,
            spec.selector.as_deref(),
        )
        .map_err(|e| {
            ExError::from(LiveDiffError::OverrideFailed {
                name: policy.name.clone(),
                reason: e.message().to_string(),
            })
            .with_op("patch_app")
            .with_source(e)
        })?;
    }
    Ok(patched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ApplicationComponent;
    use serde_json::json;

    fn policy(name: &str, policy_type: &str, properties: Option<Value>) -> AppPolicy {
        AppPolicy {
            name: name.to_string(),
            policy_type: policy_type.to_string(),
            properties,
        }
    }

    fn app() -> Application {
        let mut app = Application::default();
        app.metadata.name = "livediff-demo".to_string();
        app.spec.components = vec![ApplicationComponent {
            name: "myweb".to_string(),
            component_type: "worker".to_string(),
            properties: Some(json!({"image": "busybox"})),
            ..Default::default()
        }];
        app
    }

    #[test]
    fn test_filter_policies_partitions_by_type() {
        let policies = vec![
            policy("topo-a", "topology", Some(json!({"clusters": ["a"]}))),
            policy("gc", "garbage-collect", Some(json!({}))),
            policy("ov", "override", Some(json!({"components": []}))),
            policy("topo-b", "topology", Some(json!({"clusters": ["b"]}))),
        ];
        let names: Vec<String> = ["topo-b", "ov", "gc", "topo-a"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let (topology, overrides) = filter_policies(&policies, &names).unwrap();
        let topo_names: Vec<_> = topology.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(topo_names, vec!["topo-b", "topo-a"]);
        assert_eq!(overrides.len(), 1);
    }

    #[test]
    fn test_filter_policies_missing_name() {
        let err = filter_policies(&[], &["nope".to_string()]).unwrap_err();
        assert_eq!(err.code(), "ERR_POLICY_NOT_FOUND");
        assert_eq!(err.message(), "policy nope not found");
    }

    #[test]
    fn test_patch_app_does_not_mutate_input() {
        let app = app();
        let ov = policy(
            "ov",
            "override",
            Some(json!({"components": [{"name": "myweb", "properties": {"image": "nginx"}}]})),
        );

        let patched = patch_app(&app, &[ov]).unwrap();
        assert_eq!(
            patched.spec.components[0].properties,
            Some(json!({"image": "nginx"}))
        );
        assert_eq!(app.spec.components[0].properties, Some(json!({"image": "busybox"})));
    }

    #[test]
    fn test_patch_app_empty_properties() {
        let err = patch_app(&app(), &[policy("ov", "override", None)]).unwrap_err();
        assert_eq!(err.message(), "override policy ov must not have empty properties");
    }

    #[test]
    fn test_patch_app_malformed_properties() {
        let ov = policy("ov", "override", Some(json!({"component": []})));
        let err = patch_app(&app(), &[ov]).unwrap_err();
        assert!(err.message().starts_with("failed to parse override policy ov"));
    }

    #[test]
    fn test_patch_app_invalid_pattern() {
        let ov = policy("ov", "override", Some(json!({"components": [{"name": "(("}]})));
        let err = patch_app(&app(), &[ov]).unwrap_err();
        assert!(err.message().starts_with("failed to apply override policy ov"));
    }

    #[test]
    fn test_deploy_step_spec_strict() {
        let step = WorkflowStep {
            name: "deploy-local".to_string(),
            step_type: "deploy".to_string(),
            properties: Some(json!({"policies": ["topo"], "parallelism": 5})),
            ..Default::default()
        };
        let spec = DeployWorkflowStepSpec::from_step(&step).unwrap();
        assert_eq!(spec.policies, vec!["topo".to_string()]);
        assert_eq!(spec.parallelism, Some(5));

        let bad = WorkflowStep {
            properties: Some(json!({"policy": ["topo"]})),
            ..step
        };
        let err = DeployWorkflowStepSpec::from_step(&bad).unwrap_err();
        assert_eq!(err.code(), "ERR_INVALID_POLICY");
    }
}
