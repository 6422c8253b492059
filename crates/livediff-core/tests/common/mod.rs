use livediff_core::input::{parse_objects, read_application};
use livediff_core::{Application, DefinitionRegistry, MemoryCluster, Object, TemplateAppfileGenerator};
use std::sync::Arc;

/// Component and trait definitions shared by the integration tests
pub const DEFINITIONS: &str = r#"
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
          selector:
            matchLabels:
              app: "${context.name}"
          template:
            spec:
              containers:
                - name: "${context.name}"
                  image: "${parameter.image}"
                  command: "${parameter.cmd}"
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
---
apiVersion: core.oam.dev/v1beta1
kind: TraitDefinition
metadata:
  name: scaler
spec:
  schematic:
    template:
      patch:
        spec:
          replicas: "${parameter.replicas}"
"#;

#[allow(dead_code)]
pub fn definitions() -> Vec<Object> {
    parse_objects(DEFINITIONS).unwrap()
}

#[allow(dead_code)]
pub fn generator(cluster: Arc<MemoryCluster>) -> TemplateAppfileGenerator {
    let registry = DefinitionRegistry::from_objects(&definitions()).unwrap();
    TemplateAppfileGenerator::new(registry, cluster)
}

#[allow(dead_code)]
pub fn app(yaml: &str) -> Application {
    serde_yaml::from_str(yaml).unwrap()
}

/// Write `content` to a scratch file and read it back as an application
#[allow(dead_code)]
pub fn app_from_file(dir: &tempfile::TempDir, content: &str) -> Application {
    let path = dir.path().join("app.yaml");
    std::fs::write(&path, content).unwrap();
    read_application(&path).unwrap()
}

/// Two-component application with one topology policy and one override policy
#[allow(dead_code)]
pub const APP_WITH_POLICIES: &str = r#"
apiVersion: core.oam.dev/v1beta1
kind: Application
metadata:
  name: livediff-demo
  namespace: default
spec:
  components:
    - name: myweb-1
      type: worker
      properties:
        image: busybox
        cmd: ["sleep", "1000"]
      traits:
        - type: myingress
          properties:
            port: 80
    - name: myweb-2
      type: worker
      properties:
        image: busybox
  policies:
    - name: topology-beijing
      type: topology
      properties:
        clusters: ["beijing"]
    - name: topology-hangzhou
      type: topology
      properties:
        clusters: ["hangzhou"]
    - name: override-image
      type: override
      properties:
        components:
          - name: myweb-1
            properties:
              image: nginx
  workflow:
    steps:
      - name: deploy-topology
        type: deploy
        properties:
          policies: ["topology-beijing", "topology-hangzhou", "override-image"]
      - name: deploy-override
        type: deploy
        properties:
          policies: ["override-image"]
"#;
