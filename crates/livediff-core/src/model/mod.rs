//! Domain model: applications, revisions, unstructured objects and
//! rendered component manifests.

pub mod application;
pub mod component;
pub mod object;

pub use application::{
    AppPolicy, Application, ApplicationComponent, ApplicationRevision, ApplicationRevisionSpec,
    ApplicationSpec, ApplicationTrait, ObjectMeta, Workflow, WorkflowStep,
};
pub use component::ComponentManifest;
pub use object::{Object, ObjectKey, TypeMeta};

/// Well-known label and annotation keys
pub mod labels {
    pub const APP_NAME: &str = "app.oam.dev/name";
    pub const APP_COMPONENT: &str = "app.oam.dev/component";
    pub const APP_REVISION: &str = "app.oam.dev/appRevision";
    pub const WORKLOAD_TYPE: &str = "workload.oam.dev/type";
    pub const TRAIT_TYPE: &str = "trait.oam.dev/type";
    pub const TRAIT_RESOURCE: &str = "trait.oam.dev/resource";

    pub const ANNOTATION_KUBEVELA_VERSION: &str = "oam.dev/kubevela-version";
    pub const ANNOTATION_APP_REVISION: &str = "app.oam.dev/revision";
    pub const ANNOTATION_LAST_APPLIED: &str = "kubectl.kubernetes.io/last-applied-configuration";

    /// Trait type assigned to auxiliary outputs of a component definition
    pub const AUXILIARY_WORKLOAD: &str = "AuxiliaryWorkload";
}
