//! CLI integration tests
//!
//! Each test writes its inputs into a scratch directory and runs the
//! compiled `livediff` binary against them.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const DEFINITIONS: &str = r#"
apiVersion: core.oam.dev/v1beta1
kind: ComponentDefinition
metadata:
  name: worker
spec:
  schematic:
    template:
      output:
        apiVersion: apps/v1
        kind: Deployment
        spec:
          template:
            spec:
              containers:
                - name: "${context.name}"
                  image: "${parameter.image}"
---
apiVersion: core.oam.dev/v1beta1
kind: TraitDefinition
metadata:
  name: myingress
spec:
  schematic:
    template:
      outputs:
        service:
          apiVersion: v1
          kind: Service
          metadata:
            name: "${context.name}"
          spec:
            ports:
              - port: "${parameter.port}"
"#;

const APP: &str = r#"
apiVersion: core.oam.dev/v1beta1
kind: Application
metadata:
  name: livediff-demo
spec:
  components:
    - name: myweb-1
      type: worker
      properties:
        image: nginx
      traits:
        - type: myingress
          properties:
            port: 8080
"#;

const REVISION: &str = r#"
apiVersion: core.oam.dev/v1beta1
kind: ApplicationRevision
metadata:
  name: livediff-demo-v1
  namespace: default
spec:
  application:
    apiVersion: core.oam.dev/v1beta1
    kind: Application
    metadata: {}
    spec:
      components:
        - name: myweb-1
          type: worker
          properties:
            image: busybox
          traits:
            - type: myingress
              properties:
                port: 80
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let ws = Self {
            dir: TempDir::new().unwrap(),
        };
        ws.write("defs.yaml", DEFINITIONS);
        ws.write("app.yaml", APP);
        ws.write("rev.yaml", REVISION);
        ws
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_str().unwrap().to_string()
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_livediff"))
            .current_dir(self.dir.path())
            .args(args)
            .output()
            .expect("Failed to execute CLI")
    }
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "CLI command should succeed. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_cli_diff_against_revision() {
    // Scenario: workload image and trait port changed since the revision
    let ws = Workspace::new();
    let output = ws.run(&[
        "diff",
        "-f",
        &ws.path("app.yaml"),
        "--revision",
        &ws.path("rev.yaml"),
        "-d",
        &ws.path("defs.yaml"),
        "--no-color",
    ]);
    let text = stdout(&output);

    assert!(text.contains("Application (livediff-demo) has been modified(*)"));
    assert!(text.contains("Component (myweb-1) has been modified(*)"));
    assert!(text.contains("Component (myweb-1) / Trait (myingress/service) has been modified(*)"));
    assert!(!text.contains("\u{1b}["));
}

#[test]
fn test_cli_diff_json_output() {
    let ws = Workspace::new();
    let output = ws.run(&[
        "diff",
        "-f",
        &ws.path("app.yaml"),
        "--revision",
        &ws.path("rev.yaml"),
        "-d",
        &ws.path("defs.yaml"),
        "--output",
        "json",
    ]);
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();

    assert_eq!(value["name"], "livediff-demo");
    assert_eq!(value["subs"][0]["subs"][0]["diffType"], "MODIFY");
}

#[test]
fn test_cli_diff_requires_a_comparison_side() {
    let ws = Workspace::new();
    let output = ws.run(&["diff", "-f", &ws.path("app.yaml")]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_dry_run_prints_manifests() {
    let ws = Workspace::new();
    let output = ws.run(&[
        "dry-run",
        "-f",
        &ws.path("app.yaml"),
        "-d",
        &ws.path("defs.yaml"),
    ]);
    let text = stdout(&output);

    assert!(text.contains("# Application(livediff-demo) -- Component(myweb-1) \n"));
    assert!(text.contains("## From the trait myingress \n"));
    assert!(text.contains("image: nginx"));
}

#[test]
fn test_cli_dry_run_definitions_from_config() {
    let ws = Workspace::new();
    ws.write("livediff.toml", "definitions = [\"defs.yaml\"]\n");
    let output = ws.run(&[
        "--config",
        &ws.path("livediff.toml"),
        "dry-run",
        "-f",
        &ws.path("app.yaml"),
    ]);

    assert!(stdout(&output).contains("kind: Deployment"));
}

#[test]
fn test_cli_dry_run_unknown_type_fails() {
    let ws = Workspace::new();
    let output = ws.run(&["dry-run", "-f", &ws.path("app.yaml")]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error: "));
    assert!(stderr.contains("ERR_DEFINITION_NOT_FOUND"));
}

#[test]
fn test_cli_validate() {
    let ws = Workspace::new();
    let output = ws.run(&["validate", "-f", &ws.path("app.yaml")]);
    assert!(stdout(&output).contains("passed server-side validation"));
}
