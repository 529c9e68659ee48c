use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::RootPolicy,
    scene::{LayoutConfig, OverlayConfig, ViewportConfig},
};

/// The file looked up in the working directory when no config path is given.
pub const DEFAULT_FILE_NAME: &str = "fmg.toml";

/// Configuration for hierarchy building, layout and viewport behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// What to do with models that are not a single tree.
    root_policy: RootPolicy,

    /// Node spacing, margin and subtree separation.
    layout: LayoutConfig,

    /// Constraint curve shape.
    overlay: OverlayConfig,

    /// Fit shrink, zoom limits and wheel sensitivity.
    viewport: ViewportConfig,
}

/// Errors that can occur when reading or writing a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("failed to access config file {}: {source}", path.display())]
    Io {
        /// The config file path.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or has the wrong shape.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads `explicit` if given, otherwise [`DEFAULT_FILE_NAME`] from `dir`
    /// if it exists, otherwise the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is selected but cannot be loaded.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "using discovered config");
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The root policy.
    #[must_use]
    pub const fn root_policy(&self) -> RootPolicy {
        self.root_policy
    }

    /// Layout settings.
    #[must_use]
    pub const fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Overlay settings.
    #[must_use]
    pub const fn overlay(&self) -> &OverlayConfig {
        &self.overlay
    }

    /// Viewport settings.
    #[must_use]
    pub const fn viewport(&self) -> &ViewportConfig {
        &self.viewport
    }

    /// Returns a copy using the given root policy.
    #[must_use]
    pub const fn with_root_policy(mut self, policy: RootPolicy) -> Self {
        self.root_policy = policy;
        self
    }

    /// Returns a copy using the given layout settings.
    #[must_use]
    pub const fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        root_policy: RootPolicy,

        #[serde(default)]
        layout: LayoutConfig,

        #[serde(default)]
        overlay: OverlayConfig,

        #[serde(default)]
        viewport: ViewportConfig,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                root_policy,
                layout,
                overlay,
                viewport,
            } => Self {
                root_policy,
                layout,
                overlay,
                viewport,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            root_policy: config.root_policy,
            layout: config.layout,
            overlay: config.overlay,
            viewport: config.viewport,
        }
    }
}
