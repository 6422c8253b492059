//! Manifest tree construction from rendered components

use super::normalize::{marshal_application, remove_revision_noise, to_canonical_yaml};
use super::{ManifestKind, ManifestNode};
use crate::appfile::AppfileGenerator;
use crate::errors::{ExError, LiveDiffError, Result};
use crate::model::{labels, Application, ApplicationRevision, ComponentManifest, Object};
use livediff_core_types::RequestContext;

fn marshal_rendered(obj: &Object) -> Result<String> {
    let mut obj = obj.clone();
    remove_revision_noise(&mut obj);
    to_canonical_yaml(&obj.into_value())
}

/// Trait node name: `"<trait type>/<trait resource>"` from the rendered labels
pub fn trait_node_name(obj: &Object) -> String {
    format!(
        "{}/{}",
        obj.label(labels::TRAIT_TYPE).unwrap_or_default(),
        obj.label(labels::TRAIT_RESOURCE).unwrap_or_default()
    )
}

/// Build the tree for `app` and its rendered components
///
/// Each component becomes an `AppConfigComponent` node whose children are
/// the raw workload followed by one node per trait, in render order. A
/// workload or trait that fails to marshal keeps its node with an inline
/// `Error:` string as data.
pub fn generate_manifest(app: &Application, comps: &[ComponentManifest]) -> Result<ManifestNode> {
    build_tree(app, comps, marshal_rendered)
}

fn build_tree(
    app: &Application,
    comps: &[ComponentManifest],
    marshal: impl Fn(&Object) -> Result<String>,
) -> Result<ManifestNode> {
    let data = marshal_application(app)
        .map_err(|e| e.wrap("generate_manifest", format!("cannot marshal application {:?}", app.name())))?;
    let inline = |obj: &Object, what: String| {
        marshal(obj).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "{}", what);
            format!("Error: {}", e.wrap("generate_manifest", what))
        })
    };

    let children = comps
        .iter()
        .map(|comp| {
            let workload = inline(
                &comp.standard_workload,
                format!("cannot marshal component {:?}", comp.name),
            );
            let mut subs = vec![ManifestNode::new(ManifestKind::Component, &comp.name, workload)];
            for tr in &comp.traits {
                let name = trait_node_name(tr);
                let data = inline(tr, format!("cannot parse trait {:?} raw to YAML", name));
                subs.push(ManifestNode::new(ManifestKind::Trait, name, data));
            }
            ManifestNode::new(ManifestKind::AppConfigComponent, &comp.name, "").with_children(subs)
        })
        .collect();

    Ok(ManifestNode::new(ManifestKind::Application, app.name(), data).with_children(children))
}

/// Re-render the application recorded in `revision` and build its tree
///
/// The embedded application has no name or namespace; they are recovered
/// from the revision.
pub fn generate_manifest_from_revision(
    generator: &dyn AppfileGenerator,
    ctx: &RequestContext,
    revision: &ApplicationRevision,
) -> Result<ManifestNode> {
    let appfile = generator.generate_app_file_from_revision(ctx, revision)?;
    let comps = generator.generate_component_manifests(&appfile)?;

    let mut app = revision.spec.application.clone();
    app.metadata.name = extract_name_from_revision_name(revision.name())?;
    app.metadata.namespace = revision.namespace().to_string();
    generate_manifest(&app, &comps)
}

/// Application name of a revision: everything before the last `-`
///
/// ```
/// use livediff_core::manifest::extract_name_from_revision_name;
///
/// assert_eq!(extract_name_from_revision_name("livediff-demo-v1").unwrap(), "livediff-demo");
/// assert!(extract_name_from_revision_name("v1").is_err());
/// ```
pub fn extract_name_from_revision_name(revision_name: &str) -> Result<String> {
    revision_name
        .rsplit_once('-')
        .map(|(name, _)| name.to_string())
        .ok_or_else(|| {
            ExError::from(LiveDiffError::InvalidRevisionName {
                name: revision_name.to_string(),
            })
            .with_op("extract_name_from_revision_name")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeMeta;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn component(name: &str, traits: &[(&str, &str)]) -> ComponentManifest {
        let mut workload = Object::new(&TypeMeta::new("apps/v1", "Deployment"), "default", name);
        workload.add_labels(&BTreeMap::from([(
            labels::APP_REVISION.to_string(),
            "livediff-demo-v2".to_string(),
        )]));
        let traits = traits
            .iter()
            .map(|(tt, res)| {
                let mut obj = Object::new(&TypeMeta::new("v1", "Service"), "default", name);
                obj.add_labels(&BTreeMap::from([
                    (labels::TRAIT_TYPE.to_string(), tt.to_string()),
                    (labels::TRAIT_RESOURCE.to_string(), res.to_string()),
                ]));
                obj
            })
            .collect();
        ComponentManifest {
            name: name.to_string(),
            namespace: "default".to_string(),
            standard_workload: workload,
            traits,
            revision_name: "livediff-demo-v2".to_string(),
        }
    }

    #[test]
    fn test_marshal_failure_becomes_inline_error() {
        let mut app = Application::default();
        app.metadata.name = "livediff-demo".to_string();
        let comps = vec![
            component("myweb-1", &[("myingress", "service")]),
            component("myweb-2", &[]),
        ];

        let root = build_tree(&app, &comps, |obj| {
            if obj.kind() == "Service" {
                return Err(LiveDiffError::Serialization {
                    reason: "unsupported value".to_string(),
                }
                .into());
            }
            marshal_rendered(obj)
        })
        .unwrap();

        let myweb_1 = &root.children[0];
        assert!(myweb_1.children[0].data.contains("kind: Deployment"));
        let trait_node = &myweb_1.children[1];
        assert_eq!(trait_node.name, "myingress/service");
        assert!(trait_node.data.starts_with("Error: "));
        assert!(trait_node.data.contains("cannot parse trait \"myingress/service\" raw to YAML"));
        assert!(trait_node.data.contains("unsupported value"));
        // siblings still marshal
        assert!(root.children[1].children[0].data.contains("name: myweb-2"));
    }

    #[test]
    fn test_generate_manifest_shape() {
        let mut app = Application::default();
        app.metadata.name = "livediff-demo".to_string();
        let comps = vec![
            component("myweb-1", &[("myingress", "service"), ("myingress", "ingress")]),
            component("myweb-2", &[]),
        ];

        let root = generate_manifest(&app, &comps).unwrap();
        assert_eq!(root.kind, ManifestKind::Application);
        assert_eq!(root.name, "livediff-demo");
        assert_eq!(root.children.len(), 2);

        let acc = &root.children[0];
        assert_eq!(acc.kind, ManifestKind::AppConfigComponent);
        let names: Vec<_> = acc.children.iter().map(|c| c.key()).collect();
        assert_eq!(
            names,
            vec![
                "Component/myweb-1",
                "Trait/myingress/service",
                "Trait/myingress/ingress"
            ]
        );
        assert!(!acc.children[0].data.contains("appRevision"));
        assert_eq!(root.children[1].children.len(), 1);
    }

    #[test]
    fn test_generate_manifest_does_not_touch_input() {
        let app = Application::default();
        let comps = vec![component("myweb-1", &[])];
        generate_manifest(&app, &comps).unwrap();
        assert_eq!(
            comps[0].standard_workload.label(labels::APP_REVISION),
            Some("livediff-demo-v2")
        );
    }

    #[test]
    fn test_trait_node_name_without_labels() {
        let obj = Object::from_value(json!({"kind": "Service"})).unwrap();
        assert_eq!(trait_node_name(&obj), "/");
    }
}
