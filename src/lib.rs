//! Feature model graph engine
//!
//! A feature model is a flat list of features with parent references plus a
//! set of requires/excludes constraints. This crate turns it into a tree,
//! lays the tree out, routes constraint curves between the placed nodes and
//! propagates search highlighting over ancestor/descendant closures.

pub mod domain;
pub use domain::{
    Config, Constraint, ConstraintKind, Feature, FeatureKind, FeatureModel, HierarchyNode,
    RootPolicy, build, search,
};

/// Layout, overlay, highlighting and viewport geometry.
pub mod scene;
pub use scene::{Snapshot, Viewport, ViewportSize, ViewportState, compute_overlay, expand, layout};
