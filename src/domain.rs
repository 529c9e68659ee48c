//! Domain models for feature models.
//!
//! This module contains the raw model types as loaded from disk, the tree
//! built from them, label search, structural diagnostics and configuration.

mod feature;
pub use feature::{Constraint, ConstraintKind, Feature, FeatureKind, FeatureModel, ModelError};

/// Conversion of flat feature lists into trees.
pub mod hierarchy;
pub use hierarchy::{
    Hierarchy, HierarchyBuilder, HierarchyError, HierarchyNode, Omission, OmissionReason,
    RootPolicy, build,
};

mod search;
pub use search::{SearchIndex, search};

/// Structural checks over raw models.
pub mod diagnostics;
pub use diagnostics::{Issue, diagnose};

/// Configuration file handling.
pub mod config;
pub use config::{Config, ConfigError};
