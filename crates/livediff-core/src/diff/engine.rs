//! Tree diff over manifest nodes.
//!
//! Two entry points share one keyed pairing of sibling nodes:
//!
//! - [`calculate_diff`]: application → component → workload/trait trees.
//!   The root is classified by its own data only; components and their
//!   children are classified by presence, then by line changes.
//! - [`diff_manifest`]: fully generic recursion used by renderless
//!   comparison; every level is classified from its line diff.
//!
//! Siblings pair by `(kind, name)`. An entry on the first side pairs with
//! the first matching entry on the second side; entries only on the second
//! side follow, in their own order. Duplicate keys on the first side each
//! pair with that same first match.

use super::line_diff::{calc_diff_type, diff_lines, has_changes};
use super::model::{DiffEntry, DiffType};
use crate::manifest::ManifestNode;

/// Result of pairing two sibling lists
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pairing<'a> {
    Both(&'a ManifestNode, &'a ManifestNode),
    FirstOnly(&'a ManifestNode),
    SecondOnly(&'a ManifestNode),
}

/// Pair `first` with `second` by `(kind, name)`, first side's order first
pub fn pair_children<'a>(first: &'a [ManifestNode], second: &'a [ManifestNode]) -> Vec<Pairing<'a>> {
    let same = |a: &ManifestNode, b: &ManifestNode| a.kind == b.kind && a.name == b.name;

    let mut out: Vec<Pairing<'a>> = first
        .iter()
        .map(|a| match second.iter().find(|b| same(a, b)) {
            Some(b) => Pairing::Both(a, b),
            None => Pairing::FirstOnly(a),
        })
        .collect();
    out.extend(
        second
            .iter()
            .filter(|b| !first.iter().any(|a| same(a, b)))
            .map(Pairing::SecondOnly),
    );
    out
}

/// Diff an old application tree against a new one
pub fn calculate_diff(old: &ManifestNode, new: &ManifestNode) -> DiffEntry {
    let mut root = DiffEntry::new(&old.name, old.kind);
    let diffs = diff_lines(&old.data, &new.data);
    if has_changes(&diffs) {
        root = root.with_diffs(DiffType::Modify, diffs);
    }

    for pairing in pair_children(&old.children, &new.children) {
        let entry = match pairing {
            Pairing::Both(o, n) => {
                let mut entry = DiffEntry::new(&o.name, o.kind);
                entry.subs = pair_children(&o.children, &n.children)
                    .into_iter()
                    .map(leaf_diff)
                    .collect();
                entry
            }
            Pairing::FirstOnly(o) => whole_subtree(o, DiffType::Remove),
            Pairing::SecondOnly(n) => whole_subtree(n, DiffType::Add),
        };
        root.subs.push(entry);
    }
    root
}

fn leaf_diff(pairing: Pairing<'_>) -> DiffEntry {
    match pairing {
        Pairing::Both(o, n) => {
            let diffs = diff_lines(&o.data, &n.data);
            let diff_type = if has_changes(&diffs) {
                DiffType::Modify
            } else {
                DiffType::NoChange
            };
            DiffEntry::new(&o.name, o.kind).with_diffs(diff_type, diffs)
        }
        Pairing::FirstOnly(o) => {
            DiffEntry::new(&o.name, o.kind).with_diffs(DiffType::Remove, diff_lines(&o.data, ""))
        }
        Pairing::SecondOnly(n) => {
            DiffEntry::new(&n.name, n.kind).with_diffs(DiffType::Add, diff_lines("", &n.data))
        }
    }
}

/// A component present on one side only; every child shares its fate
fn whole_subtree(node: &ManifestNode, diff_type: DiffType) -> DiffEntry {
    let mut entry = DiffEntry::new(&node.name, node.kind);
    entry.diff_type = diff_type;
    entry.subs = node
        .children
        .iter()
        .map(|child| {
            let diffs = match diff_type {
                DiffType::Remove => diff_lines(&child.data, ""),
                _ => diff_lines("", &child.data),
            };
            DiffEntry::new(&child.name, child.kind).with_diffs(diff_type, diffs)
        })
        .collect();
    entry
}

/// Generic recursive diff; `comparator` is the old side, `base` the new one
///
/// A missing side behaves as an empty node. The entry takes its name and
/// kind from `base` unless `base` is missing or unnamed.
pub fn diff_manifest(base: Option<&ManifestNode>, comparator: Option<&ManifestNode>) -> DiffEntry {
    let named = base.filter(|b| !b.name.is_empty()).or(comparator);
    let mut entry = match named.or(base) {
        Some(node) => DiffEntry::new(&node.name, node.kind),
        None => DiffEntry::default(),
    };

    let diffs = diff_lines(
        comparator.map_or("", |c| c.data.as_str()),
        base.map_or("", |b| b.data.as_str()),
    );
    let diff_type = calc_diff_type(&diffs);
    entry = entry.with_diffs(diff_type, diffs);

    let base_children = base.map_or(&[][..], |b| b.children.as_slice());
    let comparator_children = comparator.map_or(&[][..], |c| c.children.as_slice());
    entry.subs = pair_children(base_children, comparator_children)
        .into_iter()
        .map(|pairing| match pairing {
            Pairing::Both(b, c) => diff_manifest(Some(b), Some(c)),
            Pairing::FirstOnly(b) => diff_manifest(Some(b), None),
            Pairing::SecondOnly(c) => diff_manifest(None, Some(c)),
        })
        .collect();
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestKind;

    fn node(kind: ManifestKind, name: &str, data: &str) -> ManifestNode {
        ManifestNode::new(kind, name, data)
    }

    fn component(name: &str, workload: &str, traits: &[(&str, &str)]) -> ManifestNode {
        let mut children = vec![node(ManifestKind::Component, name, workload)];
        children.extend(traits.iter().map(|(n, d)| node(ManifestKind::Trait, n, d)));
        node(ManifestKind::AppConfigComponent, name, "").with_children(children)
    }

    fn app(data: &str, comps: Vec<ManifestNode>) -> ManifestNode {
        node(ManifestKind::Application, "livediff-demo", data).with_children(comps)
    }

    #[test]
    fn test_pair_children_order() {
        let first = vec![
            node(ManifestKind::Trait, "a", ""),
            node(ManifestKind::Trait, "b", ""),
        ];
        let second = vec![
            node(ManifestKind::Trait, "c", ""),
            node(ManifestKind::Trait, "a", ""),
            node(ManifestKind::Component, "b", ""),
        ];

        let keys: Vec<String> = pair_children(&first, &second)
            .into_iter()
            .map(|p| match p {
                Pairing::Both(a, _) => format!("both:{}", a.key()),
                Pairing::FirstOnly(a) => format!("first:{}", a.key()),
                Pairing::SecondOnly(b) => format!("second:{}", b.key()),
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                "both:Trait/a",
                "first:Trait/b",
                "second:Trait/c",
                "second:Component/b"
            ]
        );
    }

    #[test]
    fn test_root_modified_without_child_changes() {
        let old = app("a: 1\n", vec![component("web", "w: 1\n", &[])]);
        let new = app("a: 2\n", vec![component("web", "w: 1\n", &[])]);

        let entry = calculate_diff(&old, &new);
        assert_eq!(entry.diff_type, DiffType::Modify);
        assert_eq!(entry.subs[0].subs[0].diff_type, DiffType::NoChange);
    }

    #[test]
    fn test_child_changes_do_not_mark_root() {
        let old = app("a: 1\n", vec![component("web", "w: 1\n", &[])]);
        let new = app("a: 1\n", vec![component("web", "w: 2\n", &[])]);

        let entry = calculate_diff(&old, &new);
        assert_eq!(entry.diff_type, DiffType::NoChange);
        assert!(entry.diffs.is_empty());
        assert_eq!(entry.subs[0].subs[0].diff_type, DiffType::Modify);
    }

    #[test]
    fn test_trait_added_and_removed() {
        let old = app("", vec![component("web", "w\n", &[("scaler/", "r: 1\n")])]);
        let new = app("", vec![component("web", "w\n", &[("gateway/ingress", "h: x\n")])]);

        let entry = calculate_diff(&old, &new);
        let subs = &entry.subs[0].subs;
        assert_eq!(subs.len(), 3);
        assert_eq!((subs[1].name.as_str(), subs[1].diff_type), ("scaler/", DiffType::Remove));
        assert_eq!(
            (subs[2].name.as_str(), subs[2].diff_type),
            ("gateway/ingress", DiffType::Add)
        );
    }

    #[test]
    fn test_component_removed_and_added() {
        let old = app("", vec![component("a", "x\n", &[("t/r", "y\n")])]);
        let new = app("", vec![component("b", "x\n", &[("t/r", "y\n")])]);

        let entry = calculate_diff(&old, &new);
        assert_eq!(entry.subs.len(), 2);
        assert_eq!(entry.subs[0].name, "a");
        assert_eq!(entry.subs[0].diff_type, DiffType::Remove);
        assert!(entry.subs[0].subs.iter().all(|s| s.diff_type == DiffType::Remove));
        assert_eq!(entry.subs[1].name, "b");
        assert!(entry.subs[1].subs.iter().all(|s| s.diff_type == DiffType::Add));
    }

    #[test]
    fn test_duplicate_traits_pair_first_occurrence() {
        let old = app(
            "",
            vec![component("web", "w\n", &[("myingress/service", "p: 1\n"), ("myingress/service", "p: 2\n")])],
        );
        let new = app(
            "",
            vec![component("web", "w\n", &[("myingress/service", "p: 1\n"), ("myingress/service", "p: 3\n")])],
        );

        let entry = calculate_diff(&old, &new);
        let subs = &entry.subs[0].subs;
        assert_eq!(subs.len(), 3);
        assert_eq!(subs[1].diff_type, DiffType::NoChange);
        // the second old trait is compared against the first new one
        assert_eq!(subs[2].diff_type, DiffType::Modify);
    }

    #[test]
    fn test_generic_diff_not_found_content() {
        let base = node(ManifestKind::Application, "app", "a: 1\n").with_children(vec![node(
            ManifestKind::Workflow,
            "myworker",
            "Error: workflows \"myworker\" not found\n",
        )]);
        let comparator = node(ManifestKind::Application, "app", "a: 1\n");

        let entry = diff_manifest(Some(&base), Some(&comparator));
        assert_eq!(entry.diff_type, DiffType::NoChange);
        assert_eq!(entry.subs.len(), 1);
        assert_eq!(entry.subs[0].diff_type, DiffType::Add);
        assert_eq!(entry.subs[0].kind, ManifestKind::Workflow);
    }

    #[test]
    fn test_generic_diff_takes_comparator_name_when_base_missing() {
        let comparator = node(ManifestKind::Policy, "topology-local", "x\n");
        let entry = diff_manifest(None, Some(&comparator));
        assert_eq!(entry.name, "topology-local");
        assert_eq!(entry.diff_type, DiffType::Remove);
    }
}
