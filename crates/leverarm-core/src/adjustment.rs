//! Per-instance adjustment state edited from the UI
//!
//! One `AdjustmentState` exists for the vehicle and one per attached sensor.
//! Fields change only through [`AdjustmentState::update`] and the two
//! base-rotation toggles, so an invalid size never reaches the composer.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};
use thiserror::Error;

use crate::catalog::ModelDescriptor;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdjustmentError {
    #[error("Target size must be positive and finite, got {0}")]
    InvalidSize(f64),
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: AdjustmentField, value: f64 },
    #[error("Target size {size} gives unusable scale {scale} for '{model}'")]
    InvalidScale { model: String, size: f64, scale: f64 },
}

/// Cartesian axis of a translation offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

/// Euler axis of a rotation offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationAxis {
    Roll,  // X
    Pitch, // Y
    Yaw,   // Z
}

impl RotationAxis {
    pub const ALL: [RotationAxis; 3] = [RotationAxis::Roll, RotationAxis::Pitch, RotationAxis::Yaw];

    pub fn index(self) -> usize {
        match self {
            RotationAxis::Roll => 0,
            RotationAxis::Pitch => 1,
            RotationAxis::Yaw => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RotationAxis::Roll => "Roll",
            RotationAxis::Pitch => "Pitch",
            RotationAxis::Yaw => "Yaw",
        }
    }
}

/// A single numeric field of an adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdjustmentField {
    /// Overall size in meters
    TargetSize,
    /// Lever-arm translation in meters
    Translation(Axis),
    /// Lever-arm rotation in degrees
    Rotation(RotationAxis),
}

impl std::fmt::Display for AdjustmentField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdjustmentField::TargetSize => write!(f, "target size"),
            AdjustmentField::Translation(axis) => write!(f, "translation {:?}", axis),
            AdjustmentField::Rotation(axis) => {
                write!(f, "rotation {}", axis.label().to_lowercase())
            }
        }
    }
}

/// Which way the vehicle model's nose points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardDirection {
    #[default]
    PositiveX,
    PositiveY,
    NegativeX,
}

impl ForwardDirection {
    pub const ALL: [ForwardDirection; 3] = [
        ForwardDirection::PositiveX,
        ForwardDirection::PositiveY,
        ForwardDirection::NegativeX,
    ];

    /// Yaw correction in radians
    pub fn yaw(self) -> f64 {
        match self {
            ForwardDirection::PositiveX => 0.0,
            ForwardDirection::PositiveY => FRAC_PI_2,
            ForwardDirection::NegativeX => PI,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ForwardDirection::PositiveX => "+X",
            ForwardDirection::PositiveY => "+Y",
            ForwardDirection::NegativeX => "-X",
        }
    }
}

/// Which way the vehicle model's top points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpDirection {
    #[default]
    PositiveZ,
    PositiveY,
    NegativeZ,
}

impl UpDirection {
    pub const ALL: [UpDirection; 3] = [
        UpDirection::PositiveZ,
        UpDirection::PositiveY,
        UpDirection::NegativeZ,
    ];

    /// Roll correction in radians
    pub fn roll(self) -> f64 {
        match self {
            UpDirection::PositiveZ => 0.0,
            UpDirection::PositiveY => FRAC_PI_2,
            UpDirection::NegativeZ => PI,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UpDirection::PositiveZ => "+Z",
            UpDirection::PositiveY => "+Y",
            UpDirection::NegativeZ => "-Z",
        }
    }
}

/// Mutable numeric state for one placed instance
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentState {
    target_size: f64,
    translation_offset: [f64; 3],
    rotation_offset_deg: [f64; 3],
    forward: ForwardDirection,
    up: UpDirection,
    bound_model: String,
}

impl AdjustmentState {
    /// Fresh state bound to `descriptor`, rendered at its reference size
    pub fn for_model(descriptor: &ModelDescriptor) -> Self {
        Self {
            target_size: descriptor.reference_size,
            translation_offset: [0.0; 3],
            rotation_offset_deg: [0.0; 3],
            forward: ForwardDirection::default(),
            up: UpDirection::default(),
            bound_model: descriptor.key.clone(),
        }
    }

    /// Set one field. Invalid values are rejected and leave the state unchanged.
    pub fn update(&mut self, field: AdjustmentField, value: f64) -> Result<(), AdjustmentError> {
        match field {
            AdjustmentField::TargetSize => {
                if !(value.is_finite() && value > 0.0) {
                    return Err(AdjustmentError::InvalidSize(value));
                }
                self.target_size = value;
            }
            AdjustmentField::Translation(axis) => {
                if !value.is_finite() {
                    return Err(AdjustmentError::NonFinite { field, value });
                }
                self.translation_offset[axis.index()] = value;
            }
            AdjustmentField::Rotation(axis) => {
                if !value.is_finite() {
                    return Err(AdjustmentError::NonFinite { field, value });
                }
                self.rotation_offset_deg[axis.index()] = value;
            }
        }
        Ok(())
    }

    /// Set one field, also rejecting a target size that `descriptor` would
    /// turn into a zero or non-finite scale
    pub fn update_scaled(
        &mut self,
        descriptor: &ModelDescriptor,
        field: AdjustmentField,
        value: f64,
    ) -> Result<(), AdjustmentError> {
        if field == AdjustmentField::TargetSize && value.is_finite() && value > 0.0 {
            let scale = descriptor.effective_scale(value);
            if !(scale.is_finite() && scale > 0.0) {
                return Err(AdjustmentError::InvalidScale {
                    model: descriptor.key.clone(),
                    size: value,
                    scale,
                });
            }
        }
        self.update(field, value)
    }

    /// Current value of one field
    pub fn get(&self, field: AdjustmentField) -> f64 {
        match field {
            AdjustmentField::TargetSize => self.target_size,
            AdjustmentField::Translation(axis) => self.translation_offset[axis.index()],
            AdjustmentField::Rotation(axis) => self.rotation_offset_deg[axis.index()],
        }
    }

    pub fn set_forward(&mut self, forward: ForwardDirection) {
        self.forward = forward;
    }

    pub fn set_up(&mut self, up: UpDirection) {
        self.up = up;
    }

    pub fn forward(&self) -> ForwardDirection {
        self.forward
    }

    pub fn up(&self) -> UpDirection {
        self.up
    }

    pub fn target_size(&self) -> f64 {
        self.target_size
    }

    pub fn translation_offset(&self) -> [f64; 3] {
        self.translation_offset
    }

    pub fn rotation_offset_deg(&self) -> [f64; 3] {
        self.rotation_offset_deg
    }

    /// Coordinate-convention correction (roll, pitch, yaw) in radians.
    /// Pitch has no toggle and stays zero.
    pub fn base_rotation(&self) -> [f64; 3] {
        [self.up.roll(), 0.0, self.forward.yaw()]
    }

    pub fn bound_model(&self) -> &str {
        &self.bound_model
    }

    /// Rebind to another catalog entry. Size resets to the new model's
    /// reference size; offsets and toggles are kept.
    pub(crate) fn rebind(&mut self, descriptor: &ModelDescriptor) {
        self.bound_model = descriptor.key.clone();
        self.target_size = descriptor.reference_size;
    }
}
