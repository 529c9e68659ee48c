//! Expansion of search matches into the set of related nodes.

use std::collections::HashSet;

use serde::Serialize;
use tracing::instrument;

use crate::{domain::HierarchyNode, scene::Link};

/// How strongly a node should be emphasised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    /// Nothing is highlighted; draw normally.
    Normal,
    /// The node matched the query.
    Match,
    /// The node is an ancestor or descendant of a match.
    Related,
    /// Something is highlighted, but not this node.
    Dimmed,
}

/// Exact matches plus their ancestor/descendant closure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlight<'a> {
    matched: HashSet<&'a str>,
    related: HashSet<&'a str>,
}

impl<'a> Highlight<'a> {
    /// Ids that matched and are present in the tree.
    #[must_use]
    pub const fn matched(&self) -> &HashSet<&'a str> {
        &self.matched
    }

    /// The closure: every match, plus all of their ancestors and descendants.
    #[must_use]
    pub const fn related(&self) -> &HashSet<&'a str> {
        &self.related
    }

    /// Whether anything is highlighted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.related.is_empty()
    }

    /// Emphasis for the node with the given id.
    #[must_use]
    pub fn emphasis(&self, id: &str) -> Emphasis {
        if !self.is_active() {
            Emphasis::Normal
        } else if self.matched.contains(id) {
            Emphasis::Match
        } else if self.related.contains(id) {
            Emphasis::Related
        } else {
            Emphasis::Dimmed
        }
    }

    /// A tree edge is related when both of its ends are.
    #[must_use]
    pub fn is_link_related(&self, link: &Link<'_>) -> bool {
        self.related.contains(link.source) && self.related.contains(link.target)
    }
}

/// Expands `matched` into its closure over the tree rooted at `root`.
///
/// Ids not present in the tree are ignored. An empty `matched` gives an empty
/// (inactive) highlight. Runs in a single pass over the tree.
#[must_use]
#[instrument(level = "debug", skip_all, fields(matched = matched.len()))]
pub fn expand<'a>(matched: &HashSet<&str>, root: &'a HierarchyNode) -> Highlight<'a> {
    let mut highlight = Highlight::default();
    if matched.is_empty() {
        return highlight;
    }

    // The current root-to-node path, reused as a memo of ancestor chains.
    let mut path: Vec<&'a str> = Vec::new();
    let mut stack = vec![(root, 0_usize, false)];

    while let Some((node, depth, below_match)) = stack.pop() {
        path.truncate(depth);
        path.push(node.id());

        let is_match = matched.contains(node.id());
        if is_match {
            highlight.matched.insert(node.id());
            // Once an ancestor is already related, so is everything above it.
            for &ancestor in path.iter().rev() {
                if !highlight.related.insert(ancestor) && ancestor != node.id() {
                    break;
                }
            }
        } else if below_match {
            highlight.related.insert(node.id());
        }

        let below = below_match || is_match;
        stack.extend(
            node.children
                .iter()
                .rev()
                .map(|child| (child, depth + 1, below)),
        );
    }

    highlight
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Feature, build};

    fn tree() -> HierarchyNode {
        build(&[
            Feature::new("root"),
            Feature::new("a").with_parent("root"),
            Feature::new("a1").with_parent("a"),
            Feature::new("a11").with_parent("a1"),
            Feature::new("a2").with_parent("a"),
            Feature::new("b").with_parent("root"),
            Feature::new("b1").with_parent("b"),
        ])
        .unwrap()
    }

    fn set<'a>(ids: &[&'a str]) -> HashSet<&'a str> {
        ids.iter().copied().collect()
    }

    #[test]
    fn empty_matches_give_empty_closure() {
        let root = tree();
        let highlight = expand(&HashSet::new(), &root);

        assert!(highlight.related().is_empty());
        assert!(!highlight.is_active());
        assert_eq!(highlight.emphasis("a"), Emphasis::Normal);
    }

    #[test]
    fn closure_contains_ancestors_and_descendants() {
        let root = tree();
        let highlight = expand(&set(&["a1"]), &root);

        assert_eq!(highlight.matched(), &set(&["a1"]));
        assert_eq!(highlight.related(), &set(&["root", "a", "a1", "a11"]));
    }

    #[test]
    fn siblings_and_cousins_are_not_related() {
        let root = tree();
        let highlight = expand(&set(&["a1"]), &root);

        assert_eq!(highlight.emphasis("a1"), Emphasis::Match);
        assert_eq!(highlight.emphasis("a"), Emphasis::Related);
        assert_eq!(highlight.emphasis("a11"), Emphasis::Related);
        assert_eq!(highlight.emphasis("a2"), Emphasis::Dimmed);
        assert_eq!(highlight.emphasis("b1"), Emphasis::Dimmed);
    }

    #[test]
    fn multiple_matches_union_their_closures() {
        let root = tree();
        let highlight = expand(&set(&["a11", "b", "a"]), &root);

        assert_eq!(
            highlight.related(),
            &set(&["root", "a", "a1", "a11", "a2", "b", "b1"])
        );
        assert_eq!(highlight.matched(), &set(&["a11", "b", "a"]));
    }

    #[test]
    fn match_below_a_related_node_still_walks_up() {
        let root = tree();
        // a2 is visited after a1 has already made `a` and `root` related.
        let highlight = expand(&set(&["a11", "a2"]), &root);

        assert_eq!(
            highlight.related(),
            &set(&["root", "a", "a1", "a11", "a2"])
        );
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let root = tree();
        let highlight = expand(&set(&["ghost"]), &root);

        assert!(highlight.matched().is_empty());
        assert!(!highlight.is_active());
    }

    #[test]
    fn links_are_related_only_when_both_ends_are() {
        let root = tree();
        let highlight = expand(&set(&["a1"]), &root);

        let related = Link {
            source: "a",
            target: "a1",
        };
        let half = Link {
            source: "a",
            target: "a2",
        };
        assert!(highlight.is_link_related(&related));
        assert!(!highlight.is_link_related(&half));
    }

    #[test]
    fn closure_is_a_superset_for_every_node() {
        let root = tree();
        for (node, _) in root.iter() {
            let highlight = expand(&set(&[node.id()]), &root);
            let descendants: Vec<_> = node.iter().map(|(n, _)| n.id()).collect();
            for id in descendants {
                assert!(highlight.related().contains(id));
            }
            assert!(highlight.related().contains("root"));
        }
    }
}
