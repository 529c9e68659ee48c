use std::{fmt, path::Path};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A single node of the variability model.
///
/// Features reference their parent by id. The reference may be missing or
/// dangling; the hierarchy builder decides what to do with such features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Unique, non-empty identifier.
    pub id: String,

    /// Display label. Empty when the model does not provide one.
    #[serde(default)]
    pub label: String,

    /// Whether the feature is mandatory, optional, or some other group kind.
    #[serde(default, rename = "type")]
    pub kind: FeatureKind,

    /// Id of the parent feature, if any.
    #[serde(
        default,
        deserialize_with = "deserialize_parent",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<String>,
}

impl Feature {
    /// Creates a parentless optional feature whose label equals its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            kind: FeatureKind::default(),
            parent: None,
        }
    }

    /// Sets the parent id.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the kind.
    #[must_use]
    pub fn with_kind(mut self, kind: FeatureKind) -> Self {
        self.kind = kind;
        self
    }

    /// The text shown for this feature: the label, or the id when the label
    /// is empty.
    #[must_use]
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

/// An empty `parent` string is treated the same as an absent one.
fn deserialize_parent<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let parent = Option::<String>::deserialize(deserializer)?;
    Ok(parent.filter(|p| !p.is_empty()))
}

/// The variability kind of a feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeatureKind {
    /// Must be selected whenever its parent is.
    Mandatory,
    /// May be selected when its parent is.
    #[default]
    Optional,
    /// Any other kind (group kinds such as `alternative` or `or`).
    Other(String),
}

impl From<String> for FeatureKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "mandatory" => Self::Mandatory,
            "optional" => Self::Optional,
            _ => Self::Other(value),
        }
    }
}

impl From<FeatureKind> for String {
    fn from(kind: FeatureKind) -> Self {
        match kind {
            FeatureKind::Mandatory => "mandatory".to_string(),
            FeatureKind::Optional => "optional".to_string(),
            FeatureKind::Other(other) => other,
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mandatory => f.write_str("mandatory"),
            Self::Optional => f.write_str("optional"),
            Self::Other(other) => f.write_str(other),
        }
    }
}

/// A cross-tree relation between two features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// Id of the first feature.
    pub a: String,
    /// Id of the second feature.
    pub b: String,
    /// The relation between `a` and `b`.
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
}

impl Constraint {
    /// `a` requires `b`.
    pub fn requires(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            kind: ConstraintKind::Requires,
        }
    }

    /// `a` and `b` exclude each other.
    pub fn excludes(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            kind: ConstraintKind::Excludes,
        }
    }
}

/// The kind of cross-tree constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintKind {
    /// Selecting `a` requires selecting `b`.
    Requires,
    /// `a` and `b` cannot both be selected.
    Excludes,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requires => f.write_str("requires"),
            Self::Excludes => f.write_str("excludes"),
        }
    }
}

/// A complete feature model as supplied by the loader.
///
/// The engine never mutates a model; every derived structure is rebuilt from
/// scratch when the model changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureModel {
    /// Features in source order.
    pub features: Vec<Feature>,
    /// Cross-tree constraints in source order.
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

/// Errors that can occur when loading a feature model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model file could not be read.
    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    /// The model is not valid JSON or does not have the expected shape.
    #[error("failed to parse model: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FeatureModel {
    /// Loads a model from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid model.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses a model from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Parse`] if the string is not a valid model.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Looks up a feature by id.
    #[must_use]
    pub fn feature(&self, id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }
}
