mod common;

use common::{app, dry_run_option, APP_V2};
use livediff_core::core_types::RequestContext;
use livediff_core::MemoryCluster;
use livediff_engine::{dry_run, dry_run_report, dry_run_with_policies, validate_app};
use std::sync::Arc;

const APP_WITH_TOPOLOGY: &str = r#"
apiVersion: core.oam.dev/v1beta1
kind: Application
metadata:
  name: livediff-topology
spec:
  components:
    - name: myweb
      type: worker
      properties:
        image: busybox
  policies:
    - name: topology-local
      type: topology
      properties:
        clusters: ["local"]
    - name: override-image
      type: override
      properties:
        components:
          - properties:
              image: nginx
  workflow:
    steps:
      - name: deploy-local
        type: deploy
        properties:
          policies: ["topology-local", "override-image"]
"#;

#[test]
fn test_dry_run_counts_components() {
    let option = dry_run_option(Arc::new(MemoryCluster::new()));
    let (comps, _) = dry_run(&option, &RequestContext::new(), &app(APP_V2)).unwrap();
    let names: Vec<_> = comps.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["myweb-1", "myweb-2", "myweb-3"]);
}

#[test]
fn test_dry_run_with_policies_labels() {
    let option = dry_run_option(Arc::new(MemoryCluster::new()));
    let results =
        dry_run_with_policies(&option, &RequestContext::new(), &app(APP_WITH_TOPOLOGY)).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].label, "livediff-topology with topology topology-local");
}

#[test]
fn test_dry_run_report_prints_each_pass() {
    let option = dry_run_option(Arc::new(MemoryCluster::new()));
    let ctx = RequestContext::new();

    let mut plain = Vec::new();
    dry_run_report(&option, &ctx, &app(APP_WITH_TOPOLOGY), false, &mut plain).unwrap();
    let plain = String::from_utf8(plain).unwrap();
    assert!(plain.contains("# Application(livediff-topology) -- Component(myweb) \n"));
    assert!(plain.contains("image: busybox"));

    let mut expanded = Vec::new();
    dry_run_report(&option, &ctx, &app(APP_WITH_TOPOLOGY), true, &mut expanded).unwrap();
    let expanded = String::from_utf8(expanded).unwrap();
    assert!(expanded.contains(
        "# Application(livediff-topology with topology topology-local) -- Component(myweb) \n"
    ));
    assert!(expanded.contains("image: nginx"));
}

#[test]
fn test_validate_app_from_file() {
    let option = dry_run_option(Arc::new(MemoryCluster::new()));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.json");
    std::fs::write(
        &path,
        r#"{"apiVersion": "core.oam.dev/v1beta1", "kind": "Application",
            "metadata": {"name": "from-json"}, "spec": {"components": []}}"#,
    )
    .unwrap();

    validate_app(&option, &RequestContext::new(), &path).unwrap();
}
