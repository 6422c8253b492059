//! Live-diff orchestration.
//!
//! Three ways to obtain the two manifest trees, all ending in the diff engine:
//! - [`LiveDiffOption::diff`]: fresh dry-run of an application against the
//!   re-rendered spec recorded in a revision
//! - [`LiveDiffOption::diff_apps`]: two applications, both dry-run
//! - [`LiveDiffOption::renderless_diff`]: application spec plus its external
//!   policies, workflow and referred objects, without rendering workloads
//!
//! ## Logging Ownership
//!
//! Each entry point logs `start`, `end` and `end_error` with the application
//! name. The core crate only emits `tracing::debug!()` details.

use livediff_core::core_types::RequestContext;
use livediff_core::diff::{calculate_diff, diff_manifest};
use livediff_core::manifest::{
    extract_name_from_revision_name, generate_manifest, generate_manifest_from_revision,
    marshal_application, marshal_object,
};
use livediff_core::model::{Application, ApplicationRevision, Object};
use livediff_core::{log_op_end, log_op_error, log_op_start};
use livediff_core::{Appfile, DiffEntry, DryRunOption, ManifestKind, ManifestNode, Result};

/// One side of a renderless comparison
#[derive(Debug, Clone, PartialEq)]
pub enum LiveDiffObject {
    Application(Application),
    Revision(ApplicationRevision),
}

impl LiveDiffObject {
    fn name(&self) -> &str {
        match self {
            LiveDiffObject::Application(app) => app.name(),
            LiveDiffObject::Revision(rev) => rev.name(),
        }
    }
}

pub struct LiveDiffOption {
    dry_run: DryRunOption,
}

impl LiveDiffOption {
    pub fn new(dry_run: DryRunOption) -> Self {
        Self { dry_run }
    }

    pub fn dry_run(&self) -> &DryRunOption {
        &self.dry_run
    }

    /// Diff a fresh dry-run of `app` against the spec stored in `revision`
    ///
    /// The revision is the old side; its recorded application is rendered
    /// again through the same generator.
    ///
    /// ## Errors
    ///
    /// Rendering failures of either side, annotated with the application or
    /// revision name.
    pub fn diff(
        &self,
        ctx: &RequestContext,
        app: &Application,
        revision: &ApplicationRevision,
    ) -> Result<DiffEntry> {
        log_op_start!(
            "live_diff",
            app = app.name(),
            revision = revision.name(),
            request_id = ctx.request_id.as_str(),
            trace_id = ctx.trace_id.as_ref().map(|t| t.as_str())
        );
        let start = std::time::Instant::now();

        let entry = self.diff_impl(ctx, app, revision).map_err(|e| {
            let e = e.with_context(ctx);
            log_op_error!(
                "live_diff",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                request_id = ctx.request_id.as_str()
            );
            e
        })?;

        log_op_end!(
            "live_diff",
            duration_ms = start.elapsed().as_millis() as u64,
            app = app.name(),
            request_id = ctx.request_id.as_str()
        );
        Ok(entry)
    }

    fn diff_impl(
        &self,
        ctx: &RequestContext,
        app: &Application,
        revision: &ApplicationRevision,
    ) -> Result<DiffEntry> {
        let new_manifest = self.render_manifest(ctx, app)?;
        let old_manifest =
            generate_manifest_from_revision(self.dry_run.generator(), ctx, revision).map_err(
                |e| {
                    e.wrap(
                        "live_diff",
                        format!("cannot generate diff manifest for AppRevision {:?}", revision.name()),
                    )
                },
            )?;
        Ok(calculate_diff(&old_manifest, &new_manifest))
    }

    /// Diff two applications, `old_app` being the old side
    pub fn diff_apps(
        &self,
        ctx: &RequestContext,
        app: &Application,
        old_app: &Application,
    ) -> Result<DiffEntry> {
        log_op_start!(
            "live_diff_apps",
            app = app.name(),
            old_app = old_app.name(),
            request_id = ctx.request_id.as_str(),
            trace_id = ctx.trace_id.as_ref().map(|t| t.as_str())
        );
        let start = std::time::Instant::now();

        let entry = self
            .render_manifest(ctx, app)
            .and_then(|new_manifest| {
                let old_manifest = self.render_manifest(ctx, old_app)?;
                Ok(calculate_diff(&old_manifest, &new_manifest))
            })
            .map_err(|e| {
                let e = e.with_context(ctx);
                log_op_error!(
                    "live_diff_apps",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = ctx.request_id.as_str()
                );
                e
            })?;

        log_op_end!(
            "live_diff_apps",
            duration_ms = start.elapsed().as_millis() as u64,
            app = app.name(),
            request_id = ctx.request_id.as_str()
        );
        Ok(entry)
    }

    fn render_manifest(&self, ctx: &RequestContext, app: &Application) -> Result<ManifestNode> {
        let (comps, _) = self
            .dry_run
            .execute_dry_run(ctx, app)
            .map_err(|e| e.wrap("live_diff", format!("cannot dry-run for app {:?}", app.name())))?;
        generate_manifest(app, &comps).map_err(|e| {
            e.wrap(
                "live_diff",
                format!("cannot generate diff manifest for app {:?}", app.name()),
            )
        })
    }

    /// Compare application specs and their external objects only
    ///
    /// `base` is the new side, `comparator` the old one. A side whose
    /// appfile cannot be generated (an external workflow that does not exist
    /// yet, say) still yields a node: the error text is appended to its
    /// application data and it has no children.
    pub fn renderless_diff(
        &self,
        ctx: &RequestContext,
        base: &LiveDiffObject,
        comparator: &LiveDiffObject,
    ) -> Result<DiffEntry> {
        log_op_start!(
            "renderless_diff",
            app = base.name(),
            comparator = comparator.name(),
            request_id = ctx.request_id.as_str(),
            trace_id = ctx.trace_id.as_ref().map(|t| t.as_str())
        );
        let start = std::time::Instant::now();

        let entry = self
            .renderless_manifest(ctx, base)
            .and_then(|base_manifest| {
                let comparator_manifest = self.renderless_manifest(ctx, comparator)?;
                Ok(diff_manifest(Some(&base_manifest), Some(&comparator_manifest)))
            })
            .map_err(|e| {
                let e = e.with_context(ctx);
                log_op_error!(
                    "renderless_diff",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = ctx.request_id.as_str()
                );
                e
            })?;

        log_op_end!(
            "renderless_diff",
            duration_ms = start.elapsed().as_millis() as u64,
            app = base.name(),
            request_id = ctx.request_id.as_str()
        );
        Ok(entry)
    }

    fn renderless_manifest(&self, ctx: &RequestContext, obj: &LiveDiffObject) -> Result<ManifestNode> {
        let generator = self.dry_run.generator();
        let (app, appfile) = match obj {
            LiveDiffObject::Application(app) => {
                (app.clone(), generator.generate_app_file(ctx, app))
            }
            LiveDiffObject::Revision(rev) => {
                let mut app = rev.spec.application.clone();
                if app.metadata.name.is_empty() {
                    app.metadata.name = extract_name_from_revision_name(rev.name())
                        .unwrap_or_else(|_| rev.name().to_string());
                }
                if app.metadata.namespace.is_empty() {
                    app.metadata.namespace = rev.namespace().to_string();
                }
                (app, generator.generate_app_file_from_revision(ctx, rev))
            }
        };

        let mut data = marshal_application(&app).map_err(|e| {
            e.wrap(
                "renderless_diff",
                format!("failed to marshal application {:?}", app.name()),
            )
        })?;
        let appfile = match appfile {
            Ok(appfile) => appfile,
            Err(err) => {
                tracing::debug!(app = app.name(), error = %err, "appfile unavailable, diffing spec only");
                data.push_str(&format!("Error: {}\n", err));
                return Ok(ManifestNode::new(ManifestKind::Application, app.name(), data));
            }
        };

        Ok(ManifestNode::new(ManifestKind::Application, app.name(), data)
            .with_children(external_nodes(&appfile)))
    }
}

/// External policies, then the external workflow, then referred objects
fn external_nodes(appfile: &Appfile) -> Vec<ManifestNode> {
    let mut nodes = Vec::new();
    for policy in &appfile.external_policies {
        nodes.push(external_node(
            policy,
            ManifestKind::Policy,
            policy.name().to_string(),
            &format!("failed to marshal external policy {}", policy.name()),
        ));
    }
    if let Some(workflow) = &appfile.external_workflow {
        nodes.push(external_node(
            workflow,
            ManifestKind::Workflow,
            workflow.name().to_string(),
            &format!("failed to marshal external workflow {}", workflow.name()),
        ));
    }
    for obj in &appfile.referred_objects {
        let name = format!("{} {} {}", obj.api_version(), obj.kind(), obj.key());
        nodes.push(external_node(
            obj,
            ManifestKind::ReferredObject,
            name,
            "failed to marshal referred object",
        ));
    }
    nodes
}

fn external_node(obj: &Object, kind: ManifestKind, name: String, failure: &str) -> ManifestNode {
    let data = marshal_object(obj, kind)
        .unwrap_or_else(|e| format!("Error: {}", e.wrap("renderless_diff", failure)));
    ManifestNode::new(kind, name, data)
}
