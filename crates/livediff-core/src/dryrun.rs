//! Dry-run rendering of applications
//!
//! [`DryRunOption`] renders an application into component and policy
//! manifests through an [`AppfileGenerator`] without persisting anything.
//! The policy-aware variant expands `deploy` workflow steps into one
//! rendering pass per topology policy, with override policies applied.

use crate::appfile::{AppfileGenerator, DEPLOY_WORKFLOW_STEP};
use crate::cluster::{ClusterClient, DryRunMode};
use crate::errors::{ExError, LiveDiffError, Result};
use crate::input::read_object;
use crate::manifest::to_canonical_yaml;
use crate::model::{labels, Application, ComponentManifest, Object};
use crate::policy::{filter_policies, patch_app, DeployWorkflowStepSpec};
use livediff_core_types::{RequestContext, DEFAULT_NAMESPACE};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Manifests rendered by one dry-run pass
#[derive(Debug, Clone, PartialEq)]
pub struct DryRunResult {
    /// `"<app>"`, `"<app> with topology <policy>"` or `"<app> only with override policies"`
    pub label: String,
    pub components: Vec<ComponentManifest>,
    pub policies: Vec<Object>,
}

pub struct DryRunOption {
    generator: Arc<dyn AppfileGenerator>,
    cluster: Arc<dyn ClusterClient>,
    server_side_dry_run: bool,
}

impl DryRunOption {
    pub fn new(
        generator: Arc<dyn AppfileGenerator>,
        cluster: Arc<dyn ClusterClient>,
        server_side_dry_run: bool,
    ) -> Self {
        Self {
            generator,
            cluster,
            server_side_dry_run,
        }
    }

    pub fn generator(&self) -> &dyn AppfileGenerator {
        self.generator.as_ref()
    }

    pub fn cluster(&self) -> &dyn ClusterClient {
        self.cluster.as_ref()
    }

    /// Render `app` into component and policy manifests
    ///
    /// `app` is not modified. With server-side dry-run enabled the
    /// application is also submitted with [`DryRunMode::All`] and any
    /// rejection is returned.
    pub fn execute_dry_run(
        &self,
        ctx: &RequestContext,
        app: &Application,
    ) -> Result<(Vec<ComponentManifest>, Vec<Object>)> {
        let app = app.clone();
        let ctx = if app.namespace().is_empty() {
            ctx.clone()
        } else {
            ctx.with_namespace(app.namespace())
        };

        let mut appfile = self
            .generator
            .generate_app_file(&ctx, &app)
            .map_err(|e| e.wrap("execute_dry_run", "cannot generate appFile from application"))?;
        if appfile.namespace.is_empty() {
            appfile.namespace = DEFAULT_NAMESPACE.to_string();
        }
        tracing::debug!(
            app = app.name(),
            components = appfile.components.len(),
            "appfile generated"
        );

        let comps = self
            .generator
            .generate_component_manifests(&appfile)
            .map_err(|e| {
                e.wrap(
                    "execute_dry_run",
                    "cannot generate manifests from components and traits",
                )
            })?;
        let policies = self
            .generator
            .generate_policy_manifests(&ctx, &appfile)
            .map_err(|e| e.wrap("execute_dry_run", "cannot generate manifests from policies"))?;

        if self.server_side_dry_run {
            let mut app = app;
            app.set_type_meta();
            self.submit_dry_run(&ctx, Object::from_typed(&app)?)
                .map_err(|e| e.wrap("execute_dry_run", "server-side dry-run rejected the application"))?;
        }
        Ok((comps, policies))
    }

    /// Render once per topology policy of every `deploy` step
    ///
    /// Override policies named by a step patch the components of each of
    /// that step's passes. Without deploy steps the application is rendered
    /// once as-is.
    pub fn execute_dry_run_with_policies(
        &self,
        ctx: &RequestContext,
        app: &Application,
    ) -> Result<Vec<DryRunResult>> {
        let mut app = app.clone();
        let ctx = if app.namespace().is_empty() {
            app.metadata.namespace = DEFAULT_NAMESPACE.to_string();
            ctx.clone()
        } else {
            ctx.with_namespace(app.namespace())
        };
        let appfile = self.generator.generate_app_file(&ctx, &app)?;

        let mut results = Vec::new();
        let deploy_steps = appfile
            .workflow_steps
            .iter()
            .filter(|s| s.step_type == DEPLOY_WORKFLOW_STEP);
        let mut deploy_step_count = 0;
        for step in deploy_steps {
            deploy_step_count += 1;
            let spec = DeployWorkflowStepSpec::from_step(step)?;
            let (topology, overrides) = filter_policies(&appfile.policies, &spec.policies)?;

            if topology.is_empty() {
                let patched = patch_app(&app, &overrides)?;
                let (components, policies) = self.execute_dry_run(&ctx, &patched)?;
                results.push(DryRunResult {
                    label: format!("{} only with override policies", patched.name()),
                    components,
                    policies,
                });
                continue;
            }
            for tp in &topology {
                let patched = patch_app(&app, &overrides)?;
                let (components, policies) = self.execute_dry_run(&ctx, &patched)?;
                results.push(DryRunResult {
                    label: format!("{} with topology {}", patched.name(), tp.name),
                    components,
                    policies,
                });
            }
        }

        if deploy_step_count == 0 {
            let (components, policies) = self.execute_dry_run(&ctx, &app)?;
            results.push(DryRunResult {
                label: app.name().to_string(),
                components,
                policies,
            });
        }
        Ok(results)
    }

    /// Validate the application in `path` against the cluster
    ///
    /// The object is parsed (YAML or JSON), its namespace defaulted, then
    /// submitted with [`DryRunMode::All`]: as an update carrying the live
    /// `resourceVersion` when it exists, otherwise as a create.
    pub fn validate_app(&self, ctx: &RequestContext, path: &Path) -> Result<()> {
        let mut obj = read_object(path)?;
        if obj.namespace().is_empty() {
            obj.set_namespace(DEFAULT_NAMESPACE);
        }
        self.submit_dry_run(ctx, obj)
    }

    fn submit_dry_run(&self, ctx: &RequestContext, mut obj: Object) -> Result<()> {
        if obj.namespace().is_empty() {
            obj.set_namespace(DEFAULT_NAMESPACE);
        }
        match self.cluster.get(ctx, &obj.type_meta(), &obj.key()) {
            Ok(live) => {
                obj.set_resource_version(live.resource_version());
                self.cluster.update(ctx, &obj, DryRunMode::All)
            }
            Err(e) if e.is_not_found() => self.cluster.create(ctx, &obj, DryRunMode::All),
            Err(e) => Err(e),
        }
    }
}

fn write_all<W: Write>(writer: &mut W, text: &str) -> Result<()> {
    writer.write_all(text.as_bytes()).map_err(|e| {
        ExError::from(LiveDiffError::Io {
            target: "dry-run output".to_string(),
            reason: e.to_string(),
        })
        .with_op("print_dry_run")
    })
}

fn marshal_for_print(obj: &Object, what: &str) -> Result<String> {
    to_canonical_yaml(&obj.clone().into_value()).map_err(|e| {
        e.wrap(
            "print_dry_run",
            format!("marshal result for {} object in yaml format", what),
        )
    })
}

/// Write rendered manifests as YAML documents under banner comments
pub fn print_dry_run<W: Write>(
    writer: &mut W,
    label: &str,
    comps: &[ComponentManifest],
    policies: &[Object],
) -> Result<()> {
    for comp in comps {
        write_all(
            writer,
            &format!("---\n# Application({}) -- Component({}) \n---\n\n", label, comp.name),
        )?;
        let workload = marshal_for_print(
            &comp.standard_workload,
            &format!("component {}", comp.name),
        )?;
        write_all(writer, &workload)?;
        write_all(writer, "\n---\n")?;

        for tr in &comp.traits {
            match tr.label(labels::TRAIT_TYPE) {
                Some(labels::AUXILIARY_WORKLOAD) => {
                    write_all(writer, "## From the auxiliary workload \n")?
                }
                Some(trait_type) if !trait_type.is_empty() => {
                    write_all(writer, &format!("## From the trait {} \n", trait_type))?
                }
                _ => {}
            }
            let data = marshal_for_print(
                tr,
                &format!("Component {} trait {}", comp.name, tr.name()),
            )?;
            write_all(writer, &data)?;
            write_all(writer, "\n---\n")?;
        }
        write_all(writer, "\n")?;
    }

    for policy in policies {
        write_all(
            writer,
            &format!("---\n# Application({}) -- Policy({}) \n---\n\n", label, policy.name()),
        )?;
        let data = marshal_for_print(policy, &format!("policy {}", policy.name()))?;
        write_all(writer, &data)?;
        write_all(writer, "\n---\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeMeta;
    use std::collections::BTreeMap;

    fn workload(name: &str) -> Object {
        Object::new(&TypeMeta::new("apps/v1", "Deployment"), "default", name)
    }

    fn labelled(trait_type: &str) -> Object {
        let mut obj = Object::new(&TypeMeta::new("v1", "Service"), "default", "svc");
        obj.add_labels(&BTreeMap::from([(
            labels::TRAIT_TYPE.to_string(),
            trait_type.to_string(),
        )]));
        obj
    }

    #[test]
    fn test_print_dry_run_layout() {
        let comps = vec![ComponentManifest {
            name: "myweb".to_string(),
            namespace: "default".to_string(),
            standard_workload: workload("myweb"),
            traits: vec![labelled("myingress"), labelled(labels::AUXILIARY_WORKLOAD)],
            revision_name: String::new(),
        }];
        let policy = Object::new(&TypeMeta::new("v1", "ConfigMap"), "default", "cfg");

        let mut out = Vec::new();
        print_dry_run(&mut out, "livediff-demo", &comps, &[policy]).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("---\n# Application(livediff-demo) -- Component(myweb) \n---\n\n"));
        assert!(text.contains("## From the trait myingress \n"));
        assert!(text.contains("## From the auxiliary workload \n"));
        assert!(text.contains("---\n# Application(livediff-demo) -- Policy(cfg) \n---\n\n"));
        assert!(text.contains("kind: Deployment"));
        assert!(text.ends_with("\n---\n"));
    }
}
