//! Structural checks over a raw feature model.
//!
//! The hierarchy builder silently drops anything it cannot place. These checks
//! explain what would be dropped, and why, without changing the model.

use std::collections::{HashMap, HashSet};

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};
use serde::Serialize;

use crate::domain::FeatureModel;

/// A structural problem found in a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "kebab-case")]
pub enum Issue {
    /// A feature with an empty id.
    EmptyId {
        /// Position of the feature in the input list.
        index: usize,
    },
    /// An id used by more than one feature.
    DuplicateId {
        /// The repeated id.
        id: String,
    },
    /// A parentless feature other than the first one.
    ExtraRoot {
        /// The feature id.
        id: String,
    },
    /// The model has no parentless feature at all.
    NoRoot,
    /// A parent reference that does not resolve.
    DanglingParent {
        /// The feature holding the reference.
        id: String,
        /// The missing parent id.
        parent: String,
    },
    /// Features whose parent references form a cycle.
    ParentCycle {
        /// Ids in the cycle, sorted.
        ids: Vec<String>,
    },
    /// A constraint endpoint that does not name a feature.
    DanglingConstraint {
        /// Position of the constraint in the input list.
        index: usize,
        /// The missing feature id.
        id: String,
    },
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId { index } => write!(f, "feature #{index} has an empty id"),
            Self::DuplicateId { id } => write!(f, "id {id} is used by more than one feature"),
            Self::ExtraRoot { id } => write!(f, "{id} has no parent but is not the first root"),
            Self::NoRoot => f.write_str("no feature is without a parent"),
            Self::DanglingParent { id, parent } => {
                write!(f, "{id} references missing parent {parent}")
            }
            Self::ParentCycle { ids } => write!(f, "parent cycle: {}", ids.join(" → ")),
            Self::DanglingConstraint { index, id } => {
                write!(f, "constraint #{index} references missing feature {id}")
            }
        }
    }
}

/// Runs every structural check over `model`, returning issues in a stable
/// order.
#[must_use]
pub fn diagnose(model: &FeatureModel) -> Vec<Issue> {
    let mut issues = Vec::new();

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for (index, feature) in model.features.iter().enumerate() {
        if feature.id.is_empty() {
            issues.push(Issue::EmptyId { index });
        } else if !seen.insert(feature.id.as_str()) && reported.insert(feature.id.as_str()) {
            issues.push(Issue::DuplicateId {
                id: feature.id.clone(),
            });
        }
    }

    let mut roots = model.features.iter().filter(|f| f.parent.is_none());
    if roots.next().is_none() && !model.features.is_empty() {
        issues.push(Issue::NoRoot);
    }
    issues.extend(roots.map(|f| Issue::ExtraRoot { id: f.id.clone() }));

    for feature in &model.features {
        if let Some(parent) = &feature.parent {
            if !seen.contains(parent.as_str()) {
                issues.push(Issue::DanglingParent {
                    id: feature.id.clone(),
                    parent: parent.clone(),
                });
            }
        }
    }

    issues.extend(parent_cycles(model).into_iter().map(|ids| Issue::ParentCycle { ids }));

    for (index, constraint) in model.constraints.iter().enumerate() {
        for id in [&constraint.a, &constraint.b] {
            if !seen.contains(id.as_str()) {
                issues.push(Issue::DanglingConstraint {
                    index,
                    id: id.clone(),
                });
            }
        }
    }

    issues
}

/// Cycles in the child → parent graph, each sorted, in sorted order.
fn parent_cycles(model: &FeatureModel) -> Vec<Vec<String>> {
    let mut first_parent: HashMap<&str, &str> = HashMap::new();
    for feature in &model.features {
        if let Some(parent) = feature.parent.as_deref() {
            first_parent.entry(feature.id.as_str()).or_insert(parent);
        }
    }

    let mut graph = DiGraphMap::<&str, ()>::with_capacity(model.features.len(), first_parent.len());
    for (&child, &parent) in &first_parent {
        graph.add_edge(child, parent, ());
    }

    let mut cycles: Vec<Vec<String>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|&node| graph.contains_edge(node, node))
        })
        .map(|component| {
            let mut ids: Vec<String> = component.into_iter().map(str::to_string).collect();
            ids.sort();
            ids
        })
        .collect();

    cycles.sort();
    cycles
}
