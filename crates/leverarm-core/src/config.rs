//! Viewer configuration loading

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::catalog::{CatalogError, ModelRegistry};
use crate::pose::SceneUnit;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Invalid config value {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Upper bound on tab markers along one half-axis
pub const MAX_AXIS_TABS: usize = 10_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub vehicle: VehicleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Working length unit of the scene
    #[serde(default)]
    pub unit: SceneUnit,
    /// Camera distance from the origin, in scene units
    #[serde(default = "default_camera_distance")]
    pub camera_distance: f64,
    /// Half-length of each reference axis line, in scene units
    #[serde(default = "default_axis_extent")]
    pub axis_extent: f64,
    /// Spacing between tab markers on the axes
    #[serde(default = "default_axis_tab_step")]
    pub axis_tab_step: f64,
    #[serde(default = "default_axis_tab_radius")]
    pub axis_tab_radius: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            unit: SceneUnit::default(),
            camera_distance: default_camera_distance(),
            axis_extent: default_axis_extent(),
            axis_tab_step: default_axis_tab_step(),
            axis_tab_radius: default_axis_tab_radius(),
        }
    }
}

impl SceneConfig {
    /// Reject geometry the scene cannot be built from
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lengths = [
            ("scene.camera_distance", self.camera_distance),
            ("scene.axis_extent", self.axis_extent),
            ("scene.axis_tab_step", self.axis_tab_step),
            ("scene.axis_tab_radius", self.axis_tab_radius),
        ];
        for (key, value) in lengths {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: format!("must be positive and finite, got {}", value),
                });
            }
        }

        let tabs = self.axis_extent / self.axis_tab_step;
        if tabs > MAX_AXIS_TABS as f64 {
            return Err(ConfigError::InvalidValue {
                key: "scene.axis_tab_step",
                reason: format!(
                    "{} tabs per half-axis exceeds the limit of {}",
                    tabs.floor(),
                    MAX_AXIS_TABS
                ),
            });
        }
        Ok(())
    }
}

fn default_camera_distance() -> f64 {
    5000.0
}

fn default_axis_extent() -> f64 {
    50000.0
}

fn default_axis_tab_step() -> f64 {
    1000.0
}

fn default_axis_tab_radius() -> f64 {
    20.0
}

/// Where model descriptors come from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog TOML file. The built-in catalog is used when unset.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// Catalog key of the vehicle loaded at startup
    #[serde(default = "default_vehicle")]
    pub default: String,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            default: default_vehicle(),
        }
    }
}

fn default_vehicle() -> String {
    "pontoon".to_string()
}

impl ViewerConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.scene.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The configured catalog, or the built-in one
    pub fn load_registry(&self) -> Result<ModelRegistry, CatalogError> {
        match &self.catalog.path {
            Some(path) => {
                info!(path = %path, "Loading model catalog");
                ModelRegistry::from_file(Path::new(path))
            }
            None => ModelRegistry::builtin(),
        }
    }
}

/// Load configuration from file, falling back to defaults when it is absent
pub fn load_config(path: &Path) -> Result<ViewerConfig, ConfigError> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config = ViewerConfig::from_toml(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(ViewerConfig::default())
    }
}
