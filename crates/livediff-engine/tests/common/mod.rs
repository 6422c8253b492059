use livediff_core::input::parse_objects;
use livediff_core::model::{Application, ApplicationRevision};
use livediff_core::{DefinitionRegistry, DryRunOption, MemoryCluster, Object, TemplateAppfileGenerator};
use livediff_engine::LiveDiffOption;
use std::sync::Arc;

/// `worker` component type and a `myingress` trait rendering a service and an ingress
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
              app.oam.dev/component: "${context.name}"
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
        ingress:
          apiVersion: networking.k8s.io/v1
          kind: Ingress
          metadata:
            name: "${context.name}"
          spec:
            rules:
              - host: "${parameter.domain}"
"#;

/// Stored revision: two components, only the first one with an ingress
pub const REVISION: &str = r#"
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
                domain: www.example.com
        - name: myweb-2
          type: worker
          properties:
            image: busybox
"#;

/// The application the revision was recorded from
pub const APP_V1: &str = r#"
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
      traits:
        - type: myingress
          properties:
            port: 80
            domain: www.example.com
    - name: myweb-2
      type: worker
      properties:
        image: busybox
"#;

/// myweb-1 changed with its ingress, myweb-2 gains one, myweb-3 is new
pub const APP_V2: &str = r#"
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
        image: nginx
      traits:
        - type: myingress
          properties:
            port: 8080
            domain: web.example.com
    - name: myweb-2
      type: worker
      properties:
        image: busybox
      traits:
        - type: myingress
          properties:
            port: 80
            domain: two.example.com
    - name: myweb-3
      type: worker
      properties:
        image: redis
      traits:
        - type: myingress
          properties:
            port: 6379
            domain: three.example.com
"#;

#[allow(dead_code)]
pub fn app(yaml: &str) -> Application {
    serde_yaml::from_str(yaml).unwrap()
}

#[allow(dead_code)]
pub fn revision(yaml: &str) -> ApplicationRevision {
    serde_yaml::from_str(yaml).unwrap()
}

#[allow(dead_code)]
pub fn dry_run_option(cluster: Arc<MemoryCluster>) -> DryRunOption {
    let registry = DefinitionRegistry::from_objects(&parse_objects(DEFINITIONS).unwrap()).unwrap();
    let generator = TemplateAppfileGenerator::new(registry, cluster.clone());
    DryRunOption::new(Arc::new(generator), cluster, false)
}

#[allow(dead_code)]
pub fn live_diff_option(objects: Vec<Object>) -> LiveDiffOption {
    let cluster = Arc::new(MemoryCluster::with_objects(objects).unwrap());
    LiveDiffOption::new(dry_run_option(cluster))
}
