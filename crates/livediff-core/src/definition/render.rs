//! Definition-template renderer
//!
//! [`TemplateAppfileGenerator`] implements [`AppfileGenerator`] by looking up
//! each component/trait/policy type's definition and substituting the
//! user's properties into its object templates. Definitions are resolved
//! from, in order: the revision being replayed, the auxiliary registry, the
//! application namespace in the cluster, then `vela-system`.

use super::template::{render, render_object};
use super::{Definition, DefinitionKind, DefinitionRegistry, SYSTEM_DEFINITION_NAMESPACE};
use crate::appfile::{
    is_builtin_policy_type, Appfile, AppfileGenerator, DEBUG_POLICY_TYPE, DEPLOY_WORKFLOW_STEP,
    REF_OBJECTS_COMPONENT_TYPE,
};
use crate::cluster::ClusterClient;
use crate::errors::{ExError, LiveDiffError, Result};
use crate::manifest::extract_name_from_revision_name;
use crate::model::application::{
    POLICY_API_VERSION, POLICY_KIND, WORKFLOW_API_VERSION, WORKFLOW_KIND,
};
use crate::model::{
    labels, AppPolicy, Application, ApplicationComponent, ApplicationRevision, ComponentManifest,
    Object, ObjectKey, TypeMeta, WorkflowStep,
};
use crate::patch::merge_patch;
use livediff_core_types::{RequestContext, DEFAULT_NAMESPACE};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Properties of a `ref-objects` component
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RefObjectsSpec {
    #[serde(default)]
    objects: Vec<RefObjectSelector>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RefObjectSelector {
    api_version: String,
    kind: String,
    name: String,
    #[serde(default)]
    namespace: String,
}

impl RefObjectSelector {
    fn type_meta(&self) -> TypeMeta {
        TypeMeta::new(&self.api_version, &self.kind)
    }

    fn key(&self, default_namespace: &str) -> ObjectKey {
        let namespace = if self.namespace.is_empty() {
            default_namespace
        } else {
            &self.namespace
        };
        ObjectKey::new(namespace, &self.name)
    }
}

/// Definitions recorded alongside a revision
#[derive(Default)]
struct RecordedDefinitions<'a> {
    components: Option<&'a BTreeMap<String, Object>>,
    traits: Option<&'a BTreeMap<String, Object>>,
    policies: Option<&'a BTreeMap<String, Object>>,
}

impl<'a> RecordedDefinitions<'a> {
    fn get(&self, kind: DefinitionKind, name: &str) -> Option<&'a Object> {
        let map = match kind {
            DefinitionKind::Component => self.components,
            DefinitionKind::Trait => self.traits,
            DefinitionKind::Policy => self.policies,
        };
        map.and_then(|m| m.get(name))
    }
}

pub struct TemplateAppfileGenerator {
    auxiliaries: DefinitionRegistry,
    cluster: Arc<dyn ClusterClient>,
}

impl TemplateAppfileGenerator {
    pub fn new(auxiliaries: DefinitionRegistry, cluster: Arc<dyn ClusterClient>) -> Self {
        Self {
            auxiliaries,
            cluster,
        }
    }

    fn resolve_definition(
        &self,
        ctx: &RequestContext,
        kind: DefinitionKind,
        name: &str,
        recorded: &RecordedDefinitions<'_>,
    ) -> Result<Definition> {
        if let Some(obj) = recorded.get(kind, name) {
            return Definition::from_object(obj);
        }
        if let Some(def) = self.auxiliaries.get(kind, name) {
            return Ok(def.clone());
        }
        for namespace in [ctx.namespace(), SYSTEM_DEFINITION_NAMESPACE] {
            match self
                .cluster
                .get(ctx, &kind.type_meta(), &ObjectKey::new(namespace, name))
            {
                Ok(obj) => return Definition::from_object(&obj),
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    return Err(e.wrap(
                        "resolve_definition",
                        format!("failed to get {} definition {}", kind.label(), name),
                    ))
                }
            }
        }
        Err(LiveDiffError::DefinitionNotFound {
            kind: kind.label().to_string(),
            name: name.to_string(),
        }
        .into())
    }

    fn resolve_definitions(
        &self,
        ctx: &RequestContext,
        af: &mut Appfile,
        recorded: &RecordedDefinitions<'_>,
    ) -> Result<()> {
        for comp in &af.components {
            if comp.component_type != REF_OBJECTS_COMPONENT_TYPE
                && !af.component_definitions.contains_key(&comp.component_type)
            {
                let def = self
                    .resolve_definition(ctx, DefinitionKind::Component, &comp.component_type, recorded)
                    .map_err(|e| {
                        e.wrap(
                            "generate_app_file",
                            format!("fetch component type of {}", comp.name),
                        )
                    })?;
                af.component_definitions
                    .insert(comp.component_type.clone(), def);
            }
            for tr in &comp.traits {
                if !af.trait_definitions.contains_key(&tr.trait_type) {
                    let def = self
                        .resolve_definition(ctx, DefinitionKind::Trait, &tr.trait_type, recorded)
                        .map_err(|e| {
                            e.wrap(
                                "generate_app_file",
                                format!("fetch trait type of {} in component {}", tr.trait_type, comp.name),
                            )
                        })?;
                    af.trait_definitions.insert(tr.trait_type.clone(), def);
                }
            }
        }

        for policy in &af.policies {
            if policy.properties.is_none() && policy.policy_type != DEBUG_POLICY_TYPE {
                return Err(ExError::from(LiveDiffError::EmptyPolicyProperties {
                    policy_type: policy.policy_type.clone(),
                    name: policy.name.clone(),
                })
                .with_op("generate_app_file"));
            }
            if !is_builtin_policy_type(&policy.policy_type)
                && !af.policy_definitions.contains_key(&policy.policy_type)
            {
                let def = self
                    .resolve_definition(ctx, DefinitionKind::Policy, &policy.policy_type, recorded)
                    .map_err(|e| {
                        e.wrap(
                            "generate_app_file",
                            format!("fetch policy type of {}", policy.name),
                        )
                    })?;
                af.policy_definitions
                    .insert(policy.policy_type.clone(), def);
            }
        }
        Ok(())
    }

    fn render_component(
        &self,
        af: &Appfile,
        comp: &ApplicationComponent,
    ) -> Result<ComponentManifest> {
        let (mut workload, mut traits) = if comp.component_type == REF_OBJECTS_COMPONENT_TYPE {
            select_referred_objects(af, comp)?
        } else {
            let def = af
                .component_definitions
                .get(&comp.component_type)
                .ok_or_else(|| LiveDiffError::DefinitionNotFound {
                    kind: DefinitionKind::Component.label().to_string(),
                    name: comp.component_type.clone(),
                })?;
            let owner = format!("component {}", comp.name);
            let scope = scope(comp.properties.as_ref(), component_context(af, comp, None));
            let output = def
                .template
                .output
                .as_ref()
                .ok_or_else(|| LiveDiffError::TemplateNotObject {
                    owner: owner.clone(),
                })?;
            let workload = Object::from_value(Value::Object(render_object(output, &scope, &owner)?))?;

            let mut auxiliaries = Vec::new();
            for (resource, tpl) in &def.template.outputs {
                if let Some(rendered) = render(tpl, &scope, &owner)? {
                    let mut obj = Object::from_value(rendered)?;
                    obj.add_labels(&BTreeMap::from([
                        (labels::TRAIT_TYPE.to_string(), labels::AUXILIARY_WORKLOAD.to_string()),
                        (labels::TRAIT_RESOURCE.to_string(), resource.clone()),
                    ]));
                    auxiliaries.push(obj);
                }
            }
            (workload, auxiliaries)
        };

        for tr in &comp.traits {
            let def = af.trait_definitions.get(&tr.trait_type).ok_or_else(|| {
                LiveDiffError::DefinitionNotFound {
                    kind: DefinitionKind::Trait.label().to_string(),
                    name: tr.trait_type.clone(),
                }
            })?;
            let owner = format!("trait {} of component {}", tr.trait_type, comp.name);
            let scope = scope(
                tr.properties.as_ref(),
                component_context(af, comp, Some(workload.clone().into_value())),
            );

            if let Some(patch_tpl) = &def.template.patch {
                if let Some(patch) = render(patch_tpl, &scope, &owner)? {
                    let mut value = workload.into_value();
                    merge_patch(&mut value, &patch);
                    workload = Object::from_value(value)?;
                }
            }
            for (resource, tpl) in &def.template.outputs {
                if let Some(rendered) = render(tpl, &scope, &owner)? {
                    let mut obj = Object::from_value(rendered)?;
                    obj.add_labels(&BTreeMap::from([
                        (labels::TRAIT_TYPE.to_string(), tr.trait_type.clone()),
                        (labels::TRAIT_RESOURCE.to_string(), resource.clone()),
                    ]));
                    traits.push(obj);
                }
            }
        }

        let namespace = appfile_namespace(af);
        if workload.name().is_empty() {
            workload.set_name(&comp.name);
        }
        if workload.namespace().is_empty() {
            workload.set_namespace(namespace);
        }
        let mut workload_labels = app_labels(af, comp);
        workload_labels.insert(
            labels::WORKLOAD_TYPE.to_string(),
            comp.component_type.clone(),
        );
        workload.add_labels(&workload_labels);

        for obj in traits.iter_mut() {
            if obj.namespace().is_empty() {
                obj.set_namespace(namespace);
            }
            obj.add_labels(&app_labels(af, comp));
        }

        Ok(ComponentManifest {
            name: comp.name.clone(),
            namespace: namespace.to_string(),
            standard_workload: workload,
            traits,
            revision_name: af.app_revision_name.clone(),
        })
    }

    /// Load the workflow referenced by `spec.workflow.ref`
    fn load_workflow(&self, ctx: &RequestContext, app: &Application, af: &mut Appfile) -> Result<()> {
        let Some(workflow) = &app.spec.workflow else {
            return Ok(());
        };
        af.workflow_steps = workflow.steps.clone();
        if workflow.workflow_ref.is_empty() {
            return Ok(());
        }
        let obj = self.cluster.get(
            ctx,
            &TypeMeta::new(WORKFLOW_API_VERSION, WORKFLOW_KIND),
            &ObjectKey::new(ctx.namespace(), &workflow.workflow_ref),
        )?;
        if af.workflow_steps.is_empty() {
            af.workflow_steps = workflow_steps_of(&obj)?;
        }
        af.external_workflow = Some(obj);
        Ok(())
    }

    fn load_referred_objects(&self, ctx: &RequestContext, af: &mut Appfile) -> Result<()> {
        let mut objects: BTreeMap<String, Object> = BTreeMap::new();
        for comp in &af.components {
            if comp.component_type != REF_OBJECTS_COMPONENT_TYPE {
                continue;
            }
            let spec = ref_objects_spec(comp)?;
            for selector in &spec.objects {
                let obj = self.cluster.get(
                    ctx,
                    &selector.type_meta(),
                    &selector.key(ctx.namespace()),
                )?;
                objects.entry(referred_sort_key(&obj)).or_insert(obj);
            }
        }
        af.referred_objects = objects.into_values().collect();
        Ok(())
    }
}

impl AppfileGenerator for TemplateAppfileGenerator {
    fn generate_app_file(&self, ctx: &RequestContext, app: &Application) -> Result<Appfile> {
        let ctx = if app.namespace().is_empty() {
            ctx.clone()
        } else {
            ctx.with_namespace(app.namespace())
        };
        let mut af = Appfile {
            name: app.name().to_string(),
            namespace: app.namespace().to_string(),
            app_revision_name: app.latest_revision_name().unwrap_or_default().to_string(),
            components: app.spec.components.clone(),
            policies: app.spec.policies.clone(),
            ..Appfile::default()
        };

        self.load_workflow(&ctx, app, &mut af)
            .map_err(|e| e.wrap("generate_app_file", "failed to parse workflow steps"))?;

        let cluster = &self.cluster;
        let policy_type = TypeMeta::new(POLICY_API_VERSION, POLICY_KIND);
        load_external_policies(&mut af, |name| {
            cluster.get(&ctx, &policy_type, &ObjectKey::new(ctx.namespace(), name))
        })
        .map_err(|e| e.wrap("generate_app_file", "failed to parse policies"))?;

        self.load_referred_objects(&ctx, &mut af)
            .map_err(|e| e.wrap("generate_app_file", "failed to parse referred objects"))?;

        self.resolve_definitions(&ctx, &mut af, &RecordedDefinitions::default())?;
        Ok(af)
    }

    fn generate_app_file_from_revision(
        &self,
        ctx: &RequestContext,
        revision: &ApplicationRevision,
    ) -> Result<Appfile> {
        let app = &revision.spec.application;
        let name = if !app.name().is_empty() {
            app.name().to_string()
        } else {
            revision
                .metadata
                .labels
                .as_ref()
                .and_then(|l| l.get(labels::APP_NAME))
                .cloned()
                .map_or_else(|| extract_name_from_revision_name(revision.name()), Ok)?
        };
        let namespace = revision.namespace().to_string();
        let ctx = if namespace.is_empty() {
            ctx.clone()
        } else {
            ctx.with_namespace(&namespace)
        };

        let mut af = Appfile {
            name,
            namespace,
            app_revision_name: revision.name().to_string(),
            components: app.spec.components.clone(),
            policies: app.spec.policies.clone(),
            external_workflow: revision.spec.workflow.clone(),
            referred_objects: revision.spec.referred_objects.clone(),
            ..Appfile::default()
        };
        if let Some(workflow) = &app.spec.workflow {
            af.workflow_steps = workflow.steps.clone();
        }
        if af.workflow_steps.is_empty() {
            if let Some(obj) = &af.external_workflow {
                af.workflow_steps = workflow_steps_of(obj)?;
            }
        }

        let recorded_policies = &revision.spec.policies;
        load_external_policies(&mut af, |name| {
            recorded_policies.get(name).cloned().ok_or_else(|| {
                LiveDiffError::ObjectNotFound {
                    resource: TypeMeta::new(POLICY_API_VERSION, POLICY_KIND).resource(),
                    name: name.to_string(),
                }
                .into()
            })
        })
        .map_err(|e| e.wrap("generate_app_file_from_revision", "failed to parse policies"))?;
        // Every recorded external policy is part of the revision, referenced or not
        for obj in recorded_policies.values() {
            if !af.external_policies.iter().any(|p| p.name() == obj.name()) {
                af.external_policies.push(obj.clone());
            }
        }

        let recorded = RecordedDefinitions {
            components: Some(&revision.spec.component_definitions),
            traits: Some(&revision.spec.trait_definitions),
            policies: Some(&revision.spec.policy_definitions),
        };
        self.resolve_definitions(&ctx, &mut af, &recorded)?;
        Ok(af)
    }

    fn generate_component_manifests(&self, appfile: &Appfile) -> Result<Vec<ComponentManifest>> {
        appfile
            .components
            .iter()
            .map(|comp| self.render_component(appfile, comp))
            .collect()
    }

    fn generate_policy_manifests(
        &self,
        _ctx: &RequestContext,
        appfile: &Appfile,
    ) -> Result<Vec<Object>> {
        let mut manifests = Vec::new();
        for policy in &appfile.policies {
            if is_builtin_policy_type(&policy.policy_type) {
                continue;
            }
            let def = appfile
                .policy_definitions
                .get(&policy.policy_type)
                .ok_or_else(|| LiveDiffError::DefinitionNotFound {
                    kind: DefinitionKind::Policy.label().to_string(),
                    name: policy.policy_type.clone(),
                })?;
            let Some(output) = &def.template.output else {
                continue;
            };
            let owner = format!("policy {}", policy.name);
            let scope = scope(
                policy.properties.as_ref(),
                json!({
                    "name": policy.name,
                    "appName": appfile.name,
                    "namespace": appfile_namespace(appfile),
                    "appRevision": appfile.app_revision_name,
                }),
            );
            let mut obj = Object::from_value(Value::Object(render_object(output, &scope, &owner)?))?;
            if obj.name().is_empty() {
                obj.set_name(&policy.name);
            }
            if obj.namespace().is_empty() {
                obj.set_namespace(appfile_namespace(appfile));
            }
            obj.add_labels(&BTreeMap::from([(
                labels::APP_NAME.to_string(),
                appfile.name.clone(),
            )]));
            manifests.push(obj);
        }
        Ok(manifests)
    }
}

fn appfile_namespace(af: &Appfile) -> &str {
    if af.namespace.is_empty() {
        DEFAULT_NAMESPACE
    } else {
        &af.namespace
    }
}

fn scope(parameter: Option<&Value>, context: Value) -> Value {
    json!({
        "parameter": parameter.cloned().unwrap_or_else(|| json!({})),
        "context": context,
    })
}

fn component_context(af: &Appfile, comp: &ApplicationComponent, output: Option<Value>) -> Value {
    let mut context = json!({
        "name": comp.name,
        "appName": af.name,
        "namespace": appfile_namespace(af),
        "appRevision": af.app_revision_name,
    });
    if let (Some(output), Value::Object(map)) = (output, &mut context) {
        map.insert("output".to_string(), output);
    }
    context
}

fn app_labels(af: &Appfile, comp: &ApplicationComponent) -> BTreeMap<String, String> {
    let mut out = BTreeMap::from([
        (labels::APP_NAME.to_string(), af.name.clone()),
        (labels::APP_COMPONENT.to_string(), comp.name.clone()),
    ]);
    if !af.app_revision_name.is_empty() {
        out.insert(
            labels::APP_REVISION.to_string(),
            af.app_revision_name.clone(),
        );
    }
    out
}

fn workflow_steps_of(obj: &Object) -> Result<Vec<WorkflowStep>> {
    match obj.get("steps") {
        Some(steps) => serde_json::from_value(steps.clone()).map_err(|e| {
            ExError::from(LiveDiffError::InvalidManifest {
                reason: format!("invalid steps in workflow {}: {}", obj.name(), e),
            })
        }),
        None => Ok(Vec::new()),
    }
}

/// Policy names listed by deploy steps, in step order
fn deploy_step_policy_names(steps: &[WorkflowStep]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for step in steps.iter().filter(|s| s.step_type == DEPLOY_WORKFLOW_STEP) {
        let listed = step
            .properties
            .as_ref()
            .and_then(|p| p.get("policies"))
            .and_then(Value::as_array);
        for name in listed.into_iter().flatten().filter_map(Value::as_str) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Pull in policies referenced by deploy steps but not declared inline
fn load_external_policies(
    af: &mut Appfile,
    fetch: impl Fn(&str) -> Result<Object>,
) -> Result<()> {
    for name in deploy_step_policy_names(&af.workflow_steps) {
        if af.policies.iter().any(|p| p.name == name) {
            continue;
        }
        let obj = fetch(&name)?;
        af.policies.push(AppPolicy {
            name: obj.name().to_string(),
            policy_type: obj
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            properties: obj.get("properties").cloned(),
        });
        af.external_policies.push(obj);
    }
    Ok(())
}

fn ref_objects_spec(comp: &ApplicationComponent) -> Result<RefObjectsSpec> {
    let raw = comp.properties.clone().unwrap_or_else(|| json!({}));
    serde_json::from_value(raw).map_err(|e| {
        LiveDiffError::InvalidComponentProperties {
            component_type: REF_OBJECTS_COMPONENT_TYPE.to_string(),
            component: comp.name.clone(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn referred_sort_key(obj: &Object) -> String {
    format!("{}|{}", obj.type_meta(), obj.key())
}

/// Workload and auxiliary objects of a `ref-objects` component
fn select_referred_objects(
    af: &Appfile,
    comp: &ApplicationComponent,
) -> Result<(Object, Vec<Object>)> {
    let spec = ref_objects_spec(comp)?;
    let mut selected = Vec::new();
    for selector in &spec.objects {
        let key = selector.key(appfile_namespace(af));
        let found = af
            .referred_objects
            .iter()
            .find(|o| o.type_meta() == selector.type_meta() && o.key() == key)
            .ok_or_else(|| LiveDiffError::ObjectNotFound {
                resource: selector.type_meta().resource(),
                name: selector.name.clone(),
            })?;
        let mut obj = found.clone();
        obj.retain_metadata(&["name", "namespace", "labels", "annotations"]);
        obj.remove("status");
        selected.push(obj);
    }

    let mut iter = selected.into_iter();
    let workload = iter.next().ok_or_else(|| LiveDiffError::InvalidComponentProperties {
        component_type: REF_OBJECTS_COMPONENT_TYPE.to_string(),
        component: comp.name.clone(),
        reason: "at least one object must be selected".to_string(),
    })?;
    let auxiliaries = iter
        .map(|mut obj| {
            let resource = obj.name().to_string();
            obj.add_labels(&BTreeMap::from([
                (labels::TRAIT_TYPE.to_string(), labels::AUXILIARY_WORKLOAD.to_string()),
                (labels::TRAIT_RESOURCE.to_string(), resource),
            ]));
            obj
        })
        .collect();
    Ok((workload, auxiliaries))
}
