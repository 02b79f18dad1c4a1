//! Model catalog - Vehicles and sensors that can be placed in the scene
//!
//! Each entry carries the asset locator plus the fixed corrections that map
//! the asset's authored axes, origin, and units onto the visualizer frame.
//! Entries are validated once when the catalog loads; everything downstream
//! relies on `reference_size` and `default_scale` being positive and finite.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const BUILTIN_CATALOG: &str = include_str!("../catalog/builtin.toml");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize catalog: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Duplicate catalog key: {0}")]
    DuplicateKey(String),
    #[error("Invalid descriptor '{key}': {reason}")]
    InvalidDescriptor { key: String, reason: String },
}

/// What a catalog entry can be placed as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Vehicle,
    Sensor,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Vehicle => write!(f, "vehicle"),
            ModelKind::Sensor => write!(f, "sensor"),
        }
    }
}

/// A single catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Catalog key (e.g., "pontoon")
    pub key: String,
    pub kind: ModelKind,
    /// Path to the glTF asset
    pub asset_path: String,
    /// Human-readable name
    pub display_name: String,
    /// Scale at which the asset's native units equal `reference_size`
    #[serde(default = "default_scale")]
    pub default_scale: f64,
    /// Real-world size in meters at `default_scale`
    #[serde(default = "default_reference_size")]
    pub reference_size: f64,
    /// Fixed (roll, pitch, yaw) in radians from authored axes to forward/right/up
    #[serde(default)]
    pub alignment_rotation: [f64; 3],
    /// Fixed translation from authored origin to the true reference point
    #[serde(default)]
    pub alignment_offset: [f64; 3],
}

fn default_scale() -> f64 {
    1.0
}

fn default_reference_size() -> f64 {
    1.0
}

impl ModelDescriptor {
    /// Scale factor that renders this model at `target_size` meters
    pub fn effective_scale(&self, target_size: f64) -> f64 {
        self.default_scale * target_size / self.reference_size
    }

    /// Check the invariants the pose composer depends on
    pub fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: String| CatalogError::InvalidDescriptor {
            key: self.key.clone(),
            reason,
        };

        if self.key.trim().is_empty() {
            return Err(invalid("empty key".to_string()));
        }
        if self.asset_path.trim().is_empty() {
            return Err(invalid("empty asset path".to_string()));
        }
        if !(self.default_scale.is_finite() && self.default_scale > 0.0) {
            return Err(invalid(format!(
                "default_scale must be positive, got {}",
                self.default_scale
            )));
        }
        if !(self.reference_size.is_finite() && self.reference_size > 0.0) {
            return Err(invalid(format!(
                "reference_size must be positive, got {}",
                self.reference_size
            )));
        }
        if self
            .alignment_rotation
            .iter()
            .chain(self.alignment_offset.iter())
            .any(|v| !v.is_finite())
        {
            return Err(invalid("alignment values must be finite".to_string()));
        }
        Ok(())
    }
}

/// On-disk catalog format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogIndex {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub model: Vec<ModelDescriptor>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for CatalogIndex {
    fn default() -> Self {
        Self {
            version: default_version(),
            model: Vec::new(),
        }
    }
}

impl CatalogIndex {
    /// Load a catalog index from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load a catalog index from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let index: CatalogIndex = toml::from_str(content)?;
        Ok(index)
    }

    /// Save the index to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<(), CatalogError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Validated, immutable set of model descriptors
///
/// Preserves catalog order so selection lists render the way the catalog
/// author wrote them.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
    by_key: HashMap<String, usize>,
}

impl ModelRegistry {
    /// Build a registry, rejecting duplicate keys and invalid descriptors
    pub fn from_index(index: CatalogIndex) -> Result<Self, CatalogError> {
        let mut by_key = HashMap::with_capacity(index.model.len());
        for (i, model) in index.model.iter().enumerate() {
            model.validate()?;
            if by_key.insert(model.key.clone(), i).is_some() {
                return Err(CatalogError::DuplicateKey(model.key.clone()));
            }
        }

        tracing::debug!(
            version = %index.version,
            models = index.model.len(),
            "Model catalog loaded"
        );

        Ok(Self {
            models: index.model,
            by_key,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        Self::from_index(CatalogIndex::from_toml(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        Self::from_index(CatalogIndex::from_file(path)?)
    }

    /// The catalog compiled into the crate
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml(BUILTIN_CATALOG)
    }

    pub fn get(&self, key: &str) -> Option<&ModelDescriptor> {
        self.by_key.get(key).map(|&i| &self.models[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter()
    }

    pub fn of_kind(&self, kind: ModelKind) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter().filter(move |m| m.kind == kind)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.of_kind(ModelKind::Vehicle)
    }

    pub fn sensors(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.of_kind(ModelKind::Sensor)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CATALOG: &str = r#"
version = "1.0"

[[model]]
key = "pontoon"
kind = "vehicle"
asset_path = "models/PontoonBoat.glb"
display_name = "Pontoon Boat"
default_scale = 10.0
reference_size = 7.0

[[model]]
key = "imu"
kind = "sensor"
asset_path = "models/imu.glb"
display_name = "IMU"
alignment_rotation = [0.0, 0.0, 3.141592653589793]
"#;

    #[test]
    fn test_parse_catalog() {
        let registry = ModelRegistry::from_toml(TEST_CATALOG).unwrap();
        assert_eq!(registry.len(), 2);

        let pontoon = registry.get("pontoon").unwrap();
        assert_eq!(pontoon.kind, ModelKind::Vehicle);
        assert_eq!(pontoon.display_name, "Pontoon Boat");
        assert_eq!(pontoon.alignment_offset, [0.0, 0.0, 0.0]);

        // Defaults fill in omitted scale fields
        let imu = registry.get("imu").unwrap();
        assert_eq!(imu.default_scale, 1.0);
        assert_eq!(imu.reference_size, 1.0);
        assert!((imu.alignment_rotation[2] - std::f64::consts::PI).abs() < 1e-12);

        assert!(registry.get("submarine").is_none());
    }

    #[test]
    fn test_kind_filters_preserve_order() {
        let registry = ModelRegistry::builtin().unwrap();
        let vehicles: Vec<&str> = registry.vehicles().map(|m| m.key.as_str()).collect();
        assert_eq!(vehicles, vec!["pontoon", "submarine"]);
        assert!(registry.sensors().all(|m| m.kind == ModelKind::Sensor));
        assert!(registry.sensors().count() >= 1);
    }

    #[test]
    fn test_effective_scale() {
        let registry = ModelRegistry::from_toml(TEST_CATALOG).unwrap();
        let pontoon = registry.get("pontoon").unwrap();
        assert!((pontoon.effective_scale(7.0) - 10.0).abs() < 1e-12);
        assert!((pontoon.effective_scale(14.0) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_zero_reference_size() {
        let toml = r#"
[[model]]
key = "broken"
kind = "vehicle"
asset_path = "models/broken.glb"
display_name = "Broken"
reference_size = 0.0
"#;
        match ModelRegistry::from_toml(toml) {
            Err(CatalogError::InvalidDescriptor { key, .. }) => assert_eq!(key, "broken"),
            other => panic!("expected InvalidDescriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_duplicate_key() {
        let toml = r#"
[[model]]
key = "imu"
kind = "sensor"
asset_path = "a.glb"
display_name = "A"

[[model]]
key = "imu"
kind = "sensor"
asset_path = "b.glb"
display_name = "B"
"#;
        assert!(matches!(
            ModelRegistry::from_toml(toml),
            Err(CatalogError::DuplicateKey(k)) if k == "imu"
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");

        let index = CatalogIndex::from_toml(TEST_CATALOG).unwrap();
        index.to_file(&path).unwrap();

        let registry = ModelRegistry::from_file(&path).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("imu"));
    }

    #[test]
    fn test_missing_file() {
        let result = ModelRegistry::from_file(Path::new("/nonexistent/catalog.toml"));
        assert!(matches!(result, Err(CatalogError::IoError(_))));
    }
}
