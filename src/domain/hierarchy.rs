//! Conversion of a flat feature list into an owned tree.
//!
//! Features point at their parent by id. The builder resolves those pointers,
//! picks a single root and drops everything that is not reachable from it.
//! Dropping is not an error: the loader is expected to reject bad models, so
//! the builder degrades to a smaller tree instead of failing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::Feature;

/// A feature together with the subtree it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyNode {
    /// The wrapped feature.
    pub feature: Feature,
    /// Children in source order.
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    /// Creates a node without children.
    #[must_use]
    pub const fn new(feature: Feature) -> Self {
        Self {
            feature,
            children: Vec::new(),
        }
    }

    /// The feature id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.feature.id
    }

    /// The label shown for the feature.
    #[must_use]
    pub fn label(&self) -> &str {
        self.feature.display_label()
    }

    /// Whether the node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Always `false`: a subtree contains at least its own root.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Pre-order traversal yielding each node with its depth below `self`.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: vec![(self, 0)],
        }
    }

    /// Finds a node by id in this subtree.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Self> {
        self.iter().map(|(node, _)| node).find(|node| node.id() == id)
    }
}

impl Drop for HierarchyNode {
    // Deep chains would otherwise overflow the stack through recursive drops.
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// Iterative pre-order traversal over a [`HierarchyNode`].
#[derive(Debug)]
pub struct Iter<'a> {
    stack: Vec<(&'a HierarchyNode, usize)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a HierarchyNode, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        Some((node, depth))
    }
}

/// How the builder treats input that does not form a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootPolicy {
    /// The first parentless feature becomes the root; other roots and
    /// dangling subtrees are dropped.
    #[default]
    FirstRootWins,
    /// Input with more than one parentless feature, or with a parent
    /// reference that does not resolve, is rejected.
    RejectMultipleRoots,
}

/// Why a feature is missing from the built tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OmissionReason {
    /// A parentless feature other than the selected root.
    ExtraRoot,
    /// The feature's parent id does not exist.
    DanglingParent,
    /// The parent chain never reaches the selected root (for example a cycle,
    /// or an ancestor that was itself omitted).
    Unreachable,
    /// Another feature earlier in the list has the same id.
    DuplicateId,
}

/// A feature that was left out of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Omission {
    /// Id of the omitted feature.
    pub id: String,
    /// Why it was omitted.
    pub reason: OmissionReason,
}

/// A built tree plus a record of everything that was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    /// The selected root.
    pub root: HierarchyNode,
    /// Features absent from the tree, in input order.
    pub omitted: Vec<Omission>,
}

/// Errors raised by [`RootPolicy::RejectMultipleRoots`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    /// More than one feature has no parent.
    #[error("model has {} root features ({}); expected exactly one", roots.len(), roots.join(", "))]
    MultipleRoots {
        /// Ids of every parentless feature, in input order.
        roots: Vec<String>,
    },
    /// A feature names a parent that does not exist.
    #[error("feature {child} references missing parent {parent}")]
    DanglingParent {
        /// The feature holding the reference.
        child: String,
        /// The unresolved parent id.
        parent: String,
    },
}

/// Builds [`Hierarchy`] values under a configurable [`RootPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyBuilder {
    policy: RootPolicy,
}

/// Builds a tree with [`RootPolicy::FirstRootWins`].
///
/// Returns `None` if `features` is empty or no feature lacks a parent. Never
/// fails; unreachable features are silently dropped.
#[must_use]
pub fn build(features: &[Feature]) -> Option<HierarchyNode> {
    HierarchyBuilder::default()
        .resolve(features)
        .map(|hierarchy| hierarchy.root)
}

impl HierarchyBuilder {
    /// Creates a builder using the given policy.
    #[must_use]
    pub const fn new(policy: RootPolicy) -> Self {
        Self { policy }
    }

    /// The policy this builder applies.
    #[must_use]
    pub const fn policy(&self) -> RootPolicy {
        self.policy
    }

    /// Builds the tree.
    ///
    /// # Errors
    ///
    /// Only fails under [`RootPolicy::RejectMultipleRoots`], when the input has
    /// several parentless features or an unresolved parent reference.
    pub fn build(&self, features: &[Feature]) -> Result<Option<Hierarchy>, HierarchyError> {
        if self.policy == RootPolicy::RejectMultipleRoots {
            Self::check_single_root(features)?;
        }
        Ok(self.resolve(features))
    }

    fn check_single_root(features: &[Feature]) -> Result<(), HierarchyError> {
        let index = index_by_id(features);

        if let Some((child, parent)) = features.iter().find_map(|feature| {
            feature
                .parent
                .as_ref()
                .filter(|parent| !index.contains_key(parent.as_str()))
                .map(|parent| (feature.id.clone(), parent.clone()))
        }) {
            return Err(HierarchyError::DanglingParent { child, parent });
        }

        let roots: Vec<String> = features
            .iter()
            .filter(|feature| feature.parent.is_none())
            .map(|feature| feature.id.clone())
            .collect();
        if roots.len() > 1 {
            return Err(HierarchyError::MultipleRoots { roots });
        }
        Ok(())
    }

    #[instrument(level = "debug", skip_all, fields(features = features.len()))]
    fn resolve(&self, features: &[Feature]) -> Option<Hierarchy> {
        let index = index_by_id(features);

        // Child lists by feature index, in source order.
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); features.len()];
        for (idx, feature) in features.iter().enumerate() {
            if index.get(feature.id.as_str()) != Some(&idx) {
                continue;
            }
            if let Some(&parent) = feature.parent.as_deref().and_then(|p| index.get(p)) {
                children[parent].push(idx);
            }
        }

        let root = features.iter().position(|feature| feature.parent.is_none())?;

        let mut built: Vec<Option<HierarchyNode>> = vec![None; features.len()];
        let mut reached = vec![false; features.len()];
        let mut stack = vec![(root, false)];

        // Post-order: a node is assembled once all of its children are.
        while let Some((idx, expanded)) = stack.pop() {
            if expanded {
                let node = HierarchyNode {
                    feature: features[idx].clone(),
                    children: children[idx]
                        .iter()
                        .filter_map(|&child| built[child].take())
                        .collect(),
                };
                built[idx] = Some(node);
            } else if !reached[idx] {
                reached[idx] = true;
                stack.push((idx, true));
                stack.extend(children[idx].iter().rev().map(|&child| (child, false)));
            }
        }

        let root_node = built[root].take()?;
        let omitted = omissions(features, &index, &reached);
        for omission in &omitted {
            debug!(id = %omission.id, reason = ?omission.reason, "feature omitted from hierarchy");
        }

        Some(Hierarchy {
            root: root_node,
            omitted,
        })
    }
}

/// Maps each id to the index of its first occurrence.
fn index_by_id(features: &[Feature]) -> HashMap<&str, usize> {
    let mut index = HashMap::with_capacity(features.len());
    for (idx, feature) in features.iter().enumerate() {
        index.entry(feature.id.as_str()).or_insert(idx);
    }
    index
}

fn omissions(features: &[Feature], index: &HashMap<&str, usize>, reached: &[bool]) -> Vec<Omission> {
    features
        .iter()
        .enumerate()
        .filter(|&(idx, _)| !reached[idx])
        .map(|(idx, feature)| {
            let reason = if index.get(feature.id.as_str()) != Some(&idx) {
                OmissionReason::DuplicateId
            } else {
                match feature.parent.as_deref() {
                    None => OmissionReason::ExtraRoot,
                    Some(parent) if !index.contains_key(parent) => OmissionReason::DanglingParent,
                    Some(_) => OmissionReason::Unreachable,
                }
            };
            Omission {
                id: feature.id.clone(),
                reason,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(node: &HierarchyNode) -> Vec<&str> {
        node.iter().map(|(node, _)| node.id()).collect()
    }

    #[test]
    fn empty_input_has_no_root() {
        assert!(build(&[]).is_none());
    }

    #[test]
    fn builds_root_with_children_in_source_order() {
        let features = vec![
            Feature::new("root"),
            Feature::new("b").with_parent("root"),
            Feature::new("a").with_parent("root"),
            Feature::new("a1").with_parent("a"),
        ];

        let root = build(&features).unwrap();

        assert_eq!(root.id(), "root");
        let children: Vec<_> = root.children.iter().map(HierarchyNode::id).collect();
        assert_eq!(children, ["b", "a"]);
        assert_eq!(root.children[1].children[0].id(), "a1");
        assert_eq!(root.len(), 4);
    }

    #[test]
    fn children_may_precede_their_parent() {
        let features = vec![
            Feature::new("leaf").with_parent("mid"),
            Feature::new("mid").with_parent("root"),
            Feature::new("root"),
        ];

        let root = build(&features).unwrap();
        assert_eq!(ids(&root), ["root", "mid", "leaf"]);
    }

    #[test]
    fn first_root_wins_and_others_are_omitted() {
        let features = vec![
            Feature::new("first"),
            Feature::new("child").with_parent("first"),
            Feature::new("second"),
            Feature::new("behind-second").with_parent("second"),
            Feature::new("dangling").with_parent("nowhere"),
            Feature::new("behind-dangling").with_parent("dangling"),
        ];

        let hierarchy = HierarchyBuilder::default()
            .build(&features)
            .unwrap()
            .unwrap();

        assert_eq!(ids(&hierarchy.root), ["first", "child"]);
        assert_eq!(
            hierarchy.omitted,
            vec![
                Omission {
                    id: "second".to_string(),
                    reason: OmissionReason::ExtraRoot
                },
                Omission {
                    id: "behind-second".to_string(),
                    reason: OmissionReason::Unreachable
                },
                Omission {
                    id: "dangling".to_string(),
                    reason: OmissionReason::DanglingParent
                },
                Omission {
                    id: "behind-dangling".to_string(),
                    reason: OmissionReason::Unreachable
                },
            ]
        );
    }

    #[test]
    fn fully_cyclic_input_has_no_root() {
        let features = vec![
            Feature::new("a").with_parent("b"),
            Feature::new("b").with_parent("a"),
        ];
        assert!(build(&features).is_none());
    }

    #[test]
    fn self_parent_is_unreachable() {
        let features = vec![Feature::new("root"), Feature::new("loop").with_parent("loop")];

        let hierarchy = HierarchyBuilder::default()
            .build(&features)
            .unwrap()
            .unwrap();
        assert_eq!(ids(&hierarchy.root), ["root"]);
        assert_eq!(hierarchy.omitted[0].reason, OmissionReason::Unreachable);
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let features = vec![
            Feature::new("root"),
            Feature::new("x").with_parent("root").with_label("first"),
            Feature::new("x").with_parent("root").with_label("second"),
        ];

        let hierarchy = HierarchyBuilder::default()
            .build(&features)
            .unwrap()
            .unwrap();
        assert_eq!(hierarchy.root.children.len(), 1);
        assert_eq!(hierarchy.root.children[0].label(), "first");
        assert_eq!(hierarchy.omitted[0].reason, OmissionReason::DuplicateId);
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let mut features = vec![Feature::new("n0")];
        features.extend(
            (1..100_000).map(|i| Feature::new(format!("n{i}")).with_parent(format!("n{}", i - 1))),
        );

        let root = build(&features).unwrap();
        assert_eq!(root.iter().map(|(_, depth)| depth).max(), Some(99_999));
    }

    #[test]
    fn strict_policy_rejects_second_root() {
        let features = vec![Feature::new("a"), Feature::new("b")];

        let error = HierarchyBuilder::new(RootPolicy::RejectMultipleRoots)
            .build(&features)
            .unwrap_err();

        assert_eq!(
            error,
            HierarchyError::MultipleRoots {
                roots: vec!["a".to_string(), "b".to_string()]
            }
        );
    }

    #[test]
    fn strict_policy_rejects_dangling_parent() {
        let features = vec![Feature::new("a"), Feature::new("b").with_parent("ghost")];

        let error = HierarchyBuilder::new(RootPolicy::RejectMultipleRoots)
            .build(&features)
            .unwrap_err();

        assert_eq!(error.to_string(), "feature b references missing parent ghost");
    }

    #[test]
    fn strict_policy_accepts_single_tree() {
        let features = vec![Feature::new("a"), Feature::new("b").with_parent("a")];

        let hierarchy = HierarchyBuilder::new(RootPolicy::RejectMultipleRoots)
            .build(&features)
            .unwrap()
            .unwrap();
        assert!(hierarchy.omitted.is_empty());
    }

    #[test]
    fn iter_reports_depth() {
        let features = vec![
            Feature::new("root"),
            Feature::new("a").with_parent("root"),
            Feature::new("a1").with_parent("a"),
            Feature::new("b").with_parent("root"),
        ];
        let root = build(&features).unwrap();

        let visited: Vec<_> = root.iter().map(|(node, depth)| (node.id(), depth)).collect();
        assert_eq!(visited, [("root", 0), ("a", 1), ("a1", 2), ("b", 1)]);
        assert!(root.find("a1").unwrap().is_leaf());
        assert!(root.find("missing").is_none());
    }
}
