//! Dry-run command handlers with boundary logging.
//!
//! Thin wrappers over [`DryRunOption`] that own the lifecycle logging, plus
//! [`dry_run_report`] which prints the rendered manifests.

use livediff_core::core_types::RequestContext;
use livediff_core::model::{Application, ComponentManifest, Object};
use livediff_core::{log_op_end, log_op_error, log_op_start};
use livediff_core::{print_dry_run, DryRunOption, DryRunResult, Result};
use std::io::Write;
use std::path::Path;

/// Render `app` once, without policy expansion
pub fn dry_run(
    option: &DryRunOption,
    ctx: &RequestContext,
    app: &Application,
) -> Result<(Vec<ComponentManifest>, Vec<Object>)> {
    log_op_start!(
        "dry_run",
        app = app.name(),
        request_id = ctx.request_id.as_str(),
        trace_id = ctx.trace_id.as_ref().map(|t| t.as_str())
    );
    let start = std::time::Instant::now();

    let (comps, policies) = option.execute_dry_run(ctx, app).map_err(|e| {
        let e = e.with_context(ctx);
        log_op_error!(
            "dry_run",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = ctx.request_id.as_str()
        );
        e
    })?;

    log_op_end!(
        "dry_run",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str(),
        app = app.name(),
        component_count = comps.len()
    );
    Ok((comps, policies))
}

/// Render `app` once per topology policy of its deploy steps
pub fn dry_run_with_policies(
    option: &DryRunOption,
    ctx: &RequestContext,
    app: &Application,
) -> Result<Vec<DryRunResult>> {
    log_op_start!(
        "dry_run_with_policies",
        app = app.name(),
        request_id = ctx.request_id.as_str(),
        trace_id = ctx.trace_id.as_ref().map(|t| t.as_str())
    );
    let start = std::time::Instant::now();

    let results = option
        .execute_dry_run_with_policies(ctx, app)
        .map_err(|e| {
            let e = e.with_context(ctx);
            log_op_error!(
                "dry_run_with_policies",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                request_id = ctx.request_id.as_str()
            );
            e
        })?;

    log_op_end!(
        "dry_run_with_policies",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str(),
        app = app.name(),
        render_count = results.len()
    );
    Ok(results)
}

/// Server-side validation of the application stored in `path`
pub fn validate_app(option: &DryRunOption, ctx: &RequestContext, path: &Path) -> Result<()> {
    let file = path.display().to_string();
    log_op_start!(
        "validate_app",
        file = file.as_str(),
        request_id = ctx.request_id.as_str(),
        trace_id = ctx.trace_id.as_ref().map(|t| t.as_str())
    );
    let start = std::time::Instant::now();

    option.validate_app(ctx, path).map_err(|e| {
        let e = e.with_context(ctx);
        log_op_error!(
            "validate_app",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = ctx.request_id.as_str()
        );
        e
    })?;

    log_op_end!(
        "validate_app",
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = ctx.request_id.as_str(),
        file = file.as_str()
    );
    Ok(())
}

/// Render `app` and print every result to `writer`
///
/// With `with_policies` each topology pass is printed under its own label,
/// otherwise a single pass is printed under the application name.
pub fn dry_run_report<W: Write>(
    option: &DryRunOption,
    ctx: &RequestContext,
    app: &Application,
    with_policies: bool,
    writer: &mut W,
) -> Result<()> {
    if with_policies {
        for result in dry_run_with_policies(option, ctx, app)? {
            print_dry_run(writer, &result.label, &result.components, &result.policies)?;
        }
        return Ok(());
    }
    let (comps, policies) = dry_run(option, ctx, app)?;
    print_dry_run(writer, app.name(), &comps, &policies)
}
