//! Intermediate application model and the capability that produces it
//!
//! An [`Appfile`] is an application with every definition and external
//! reference resolved. [`AppfileGenerator`] builds one from a live
//! application or from a stored revision, then expands it into concrete
//! component and policy manifests.

use crate::definition::Definition;
use crate::errors::Result;
use crate::model::{
    AppPolicy, Application, ApplicationComponent, ApplicationRevision, ComponentManifest, Object,
    WorkflowStep,
};
use livediff_core_types::RequestContext;
use std::collections::BTreeMap;

/// Component type whose objects are read from the cluster, not rendered
pub const REF_OBJECTS_COMPONENT_TYPE: &str = "ref-objects";

/// Workflow step type that dispatches components under topology/override policies
pub const DEPLOY_WORKFLOW_STEP: &str = "deploy";

pub const TOPOLOGY_POLICY_TYPE: &str = "topology";
pub const OVERRIDE_POLICY_TYPE: &str = "override";
pub const DEBUG_POLICY_TYPE: &str = "debug";

/// Policy types interpreted by the engine itself; they never render manifests
pub const BUILTIN_POLICY_TYPES: &[&str] = &[
    "garbage-collect",
    "apply-once",
    "shared-resource",
    "take-over",
    "read-only",
    "env-binding",
    "replication",
    TOPOLOGY_POLICY_TYPE,
    OVERRIDE_POLICY_TYPE,
    DEBUG_POLICY_TYPE,
];

pub fn is_builtin_policy_type(policy_type: &str) -> bool {
    BUILTIN_POLICY_TYPES.contains(&policy_type)
}

/// Application with definitions and external references resolved
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Appfile {
    pub name: String,
    pub namespace: String,
    pub app_revision_name: String,
    pub components: Vec<ApplicationComponent>,
    /// Inline policies followed by external policies pulled in by deploy steps
    pub policies: Vec<AppPolicy>,
    pub workflow_steps: Vec<WorkflowStep>,
    pub external_policies: Vec<Object>,
    pub external_workflow: Option<Object>,
    /// Sorted by `"<apiVersion> <kind>|<namespace>/<name>"`
    pub referred_objects: Vec<Object>,
    pub component_definitions: BTreeMap<String, Definition>,
    pub trait_definitions: BTreeMap<String, Definition>,
    pub policy_definitions: BTreeMap<String, Definition>,
}

/// Rendering capability consumed by dry-run and live-diff
///
/// Implementations must be deterministic: rendering the same spec twice
/// yields identical manifests, otherwise revision comparisons show noise.
pub trait AppfileGenerator: Send + Sync {
    /// Resolve definitions and external references for a live application
    fn generate_app_file(&self, ctx: &RequestContext, app: &Application) -> Result<Appfile>;

    /// Rebuild the appfile recorded in a revision
    fn generate_app_file_from_revision(
        &self,
        ctx: &RequestContext,
        revision: &ApplicationRevision,
    ) -> Result<Appfile>;

    /// Expand every component into its workload and trait objects
    fn generate_component_manifests(&self, appfile: &Appfile) -> Result<Vec<ComponentManifest>>;

    /// Render manifests for non-built-in policies
    fn generate_policy_manifests(
        &self,
        ctx: &RequestContext,
        appfile: &Appfile,
    ) -> Result<Vec<Object>>;
}
