//! Pose composition - catalog entry + adjustment state to an affine transform
//!
//! Vehicle: `crp * base * model`
//! Sensor:  `lever * sensor_alignment`
//!
//! Rotations are (roll, pitch, yaw) composed intrinsically X then Y then Z,
//! the same order for every path. Scale is uniform.

use glam::{DMat4, DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

use crate::adjustment::AdjustmentState;
use crate::catalog::ModelDescriptor;

/// Working length unit of the rendered scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneUnit {
    Meters,
    #[default]
    Millimeters,
}

impl SceneUnit {
    /// Multiplier from user-entered meters to scene units
    pub fn per_meter(self) -> f64 {
        match self {
            SceneUnit::Meters => 1.0,
            SceneUnit::Millimeters => 1000.0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            SceneUnit::Meters => "m",
            SceneUnit::Millimeters => "mm",
        }
    }
}

/// (roll, pitch, yaw) radians to a quaternion, intrinsic X -> Y -> Z
pub fn euler_to_quat(angles: [f64; 3]) -> DQuat {
    DQuat::from_euler(EulerRot::XYZ, angles[0], angles[1], angles[2])
}

fn degrees_to_radians(angles: [f64; 3]) -> [f64; 3] {
    angles.map(f64::to_radians)
}

/// Fixed alignment of a catalog asset at the given uniform scale
pub fn alignment_matrix(descriptor: &ModelDescriptor, effective_scale: f64) -> DMat4 {
    DMat4::from_scale_rotation_translation(
        DVec3::splat(effective_scale),
        euler_to_quat(descriptor.alignment_rotation),
        DVec3::from_array(descriptor.alignment_offset),
    )
}

/// Coordinate-convention correction selected by the forward/up toggles
pub fn base_matrix(state: &AdjustmentState) -> DMat4 {
    DMat4::from_quat(euler_to_quat(state.base_rotation()))
}

/// User-entered lever arm: translation converted to scene units, rotation in degrees
pub fn lever_arm_matrix(state: &AdjustmentState, unit: SceneUnit) -> DMat4 {
    let translation = DVec3::from_array(state.translation_offset()) * unit.per_meter();
    DMat4::from_scale_rotation_translation(
        DVec3::ONE,
        euler_to_quat(degrees_to_radians(state.rotation_offset_deg())),
        translation,
    )
}

/// Final transform for the vehicle object
pub fn compose_vehicle_pose(
    descriptor: &ModelDescriptor,
    state: &AdjustmentState,
    unit: SceneUnit,
) -> DMat4 {
    let model = alignment_matrix(descriptor, descriptor.effective_scale(state.target_size()));
    let base = base_matrix(state);
    let crp = lever_arm_matrix(state, unit);
    crp * base * model
}

/// Final transform for a sensor object.
///
/// Expressed directly relative to the CRP, not chained under the vehicle.
pub fn compose_sensor_pose(
    descriptor: &ModelDescriptor,
    state: &AdjustmentState,
    unit: SceneUnit,
) -> DMat4 {
    let sensor = alignment_matrix(descriptor, descriptor.effective_scale(state.target_size()));
    let lever = lever_arm_matrix(state, unit);
    lever * sensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustment::{AdjustmentField, Axis, ForwardDirection, RotationAxis, UpDirection};
    use crate::catalog::ModelKind;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-9;

    fn descriptor(
        default_scale: f64,
        reference_size: f64,
        rotation: [f64; 3],
        offset: [f64; 3],
    ) -> ModelDescriptor {
        ModelDescriptor {
            key: "test".to_string(),
            kind: ModelKind::Vehicle,
            asset_path: "models/test.glb".to_string(),
            display_name: "Test".to_string(),
            default_scale,
            reference_size,
            alignment_rotation: rotation,
            alignment_offset: offset,
        }
    }

    fn column_scales(m: &DMat4) -> [f64; 3] {
        [
            m.x_axis.truncate().length(),
            m.y_axis.truncate().length(),
            m.z_axis.truncate().length(),
        ]
    }

    #[test]
    fn test_scale_matches_effective_scale() {
        let desc = descriptor(10.0, 7.0, [FRAC_PI_2, 0.0, 0.0], [0.0; 3]);
        let mut state = AdjustmentState::for_model(&desc);
        state.set_forward(ForwardDirection::NegativeX);
        state.update(AdjustmentField::Rotation(RotationAxis::Pitch), 30.0).unwrap();

        for size in [0.5, 7.0, 12.25, 300.0] {
            state.update(AdjustmentField::TargetSize, size).unwrap();
            let m = compose_vehicle_pose(&desc, &state, SceneUnit::Millimeters);
            let expected = 10.0 * size / 7.0;
            for s in column_scales(&m) {
                assert!((s - expected).abs() < EPS * expected, "{} != {}", s, expected);
            }
        }
    }

    #[test]
    fn test_composition_is_idempotent() {
        let desc = descriptor(3.0, 2.0, [0.1, 0.2, 0.3], [1.0, 2.0, 3.0]);
        let mut state = AdjustmentState::for_model(&desc);
        state.set_up(UpDirection::PositiveY);
        state.update(AdjustmentField::Translation(Axis::Z), 0.75).unwrap();
        state.update(AdjustmentField::Rotation(RotationAxis::Roll), 12.5).unwrap();

        let a = compose_vehicle_pose(&desc, &state, SceneUnit::Millimeters);
        let b = compose_vehicle_pose(&desc, &state, SceneUnit::Millimeters);
        assert_eq!(a.to_cols_array(), b.to_cols_array());

        let a = compose_sensor_pose(&desc, &state, SceneUnit::Meters);
        let b = compose_sensor_pose(&desc, &state, SceneUnit::Meters);
        assert_eq!(a.to_cols_array(), b.to_cols_array());
    }

    #[test]
    fn test_vehicle_order_is_crp_base_model() {
        let desc = descriptor(1.0, 1.0, [0.0; 3], [0.0; 3]);
        let mut state = AdjustmentState::for_model(&desc);
        state.set_forward(ForwardDirection::PositiveY);
        state.update(AdjustmentField::Translation(Axis::X), 1.0).unwrap();

        let unit = SceneUnit::Millimeters;
        let composed = compose_vehicle_pose(&desc, &state, unit);

        let model = alignment_matrix(&desc, 1.0);
        let base = base_matrix(&state);
        let crp = lever_arm_matrix(&state, unit);
        let swapped = base * crp * model;

        // The lever arm is not rotated by the base correction
        let translation = composed.w_axis.truncate();
        assert!(translation.abs_diff_eq(DVec3::new(1000.0, 0.0, 0.0), EPS));
        assert!(!composed.abs_diff_eq(swapped, 1e-6));
        assert!(swapped.w_axis.truncate().abs_diff_eq(DVec3::new(0.0, 1000.0, 0.0), 1e-6));
    }

    #[test]
    fn test_sensor_order_is_lever_then_alignment() {
        let desc = descriptor(1.0, 1.0, [0.0; 3], [1.0, 0.0, 0.0]);
        let mut state = AdjustmentState::for_model(&desc);
        state.update(AdjustmentField::Rotation(RotationAxis::Yaw), 90.0).unwrap();

        let composed = compose_sensor_pose(&desc, &state, SceneUnit::Meters);
        // Alignment offset gets rotated by the lever arm
        assert!(composed.w_axis.truncate().abs_diff_eq(DVec3::new(0.0, 1.0, 0.0), EPS));

        let swapped = alignment_matrix(&desc, 1.0) * lever_arm_matrix(&state, SceneUnit::Meters);
        assert!(swapped.w_axis.truncate().abs_diff_eq(DVec3::new(1.0, 0.0, 0.0), EPS));
    }

    #[test]
    fn test_sensor_ignores_base_rotation() {
        let desc = descriptor(1.0, 1.0, [0.0; 3], [0.0; 3]);
        let plain = AdjustmentState::for_model(&desc);
        let mut toggled = plain.clone();
        toggled.set_forward(ForwardDirection::NegativeX);
        toggled.set_up(UpDirection::NegativeZ);

        assert_eq!(
            compose_sensor_pose(&desc, &plain, SceneUnit::Millimeters).to_cols_array(),
            compose_sensor_pose(&desc, &toggled, SceneUnit::Millimeters).to_cols_array()
        );
    }

    #[test]
    fn test_unit_conversion() {
        let desc = descriptor(1.0, 1.0, [0.0; 3], [0.0; 3]);
        let mut state = AdjustmentState::for_model(&desc);
        state.update(AdjustmentField::Translation(Axis::X), 1.0).unwrap();

        let mm = compose_vehicle_pose(&desc, &state, SceneUnit::Millimeters);
        assert!(mm.w_axis.truncate().abs_diff_eq(DVec3::new(1000.0, 0.0, 0.0), EPS));

        // Independent of the user rotation
        state.update(AdjustmentField::Rotation(RotationAxis::Yaw), 45.0).unwrap();
        state.update(AdjustmentField::Rotation(RotationAxis::Roll), -20.0).unwrap();
        let mm = compose_vehicle_pose(&desc, &state, SceneUnit::Millimeters);
        assert!(mm.w_axis.truncate().abs_diff_eq(DVec3::new(1000.0, 0.0, 0.0), EPS));

        let m = compose_sensor_pose(&desc, &state, SceneUnit::Meters);
        assert!(m.w_axis.truncate().abs_diff_eq(DVec3::new(1.0, 0.0, 0.0), EPS));
    }

    #[test]
    fn test_euler_order_is_intrinsic_xyz() {
        let angles = [0.3, -0.7, 1.1];
        let expected = DQuat::from_rotation_x(angles[0])
            * DQuat::from_rotation_y(angles[1])
            * DQuat::from_rotation_z(angles[2]);
        assert!(euler_to_quat(angles).abs_diff_eq(expected, EPS));
    }

    #[test]
    fn test_reference_scenario() {
        let desc = descriptor(5.0, 4.0, [0.0, 0.0, PI], [0.0; 3]);
        let state = AdjustmentState::for_model(&desc);
        assert_eq!(state.target_size(), 4.0);

        let m = compose_vehicle_pose(&desc, &state, SceneUnit::Millimeters);
        let expected = DMat4::from_scale_rotation_translation(
            DVec3::splat(5.0),
            DQuat::from_rotation_z(PI),
            DVec3::ZERO,
        );
        assert!(m.abs_diff_eq(expected, EPS));

        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        assert!(scale.abs_diff_eq(DVec3::splat(5.0), EPS));
        assert!(rotation.abs_diff_eq(DQuat::from_rotation_z(PI), EPS)
            || rotation.abs_diff_eq(-DQuat::from_rotation_z(PI), EPS));
        assert_eq!(translation, DVec3::ZERO);
    }

    #[test]
    fn test_composed_pose_is_invertible() {
        let desc = descriptor(2.0, 3.0, [0.4, 0.0, -1.2], [5.0, -2.0, 1.0]);
        let mut state = AdjustmentState::for_model(&desc);
        state.set_up(UpDirection::PositiveY);
        state.update(AdjustmentField::Translation(Axis::Y), 2.0).unwrap();
        state.update(AdjustmentField::Rotation(RotationAxis::Pitch), 33.0).unwrap();

        let m = compose_vehicle_pose(&desc, &state, SceneUnit::Millimeters);
        assert!(m.determinant().abs() > EPS);
        assert!((m * m.inverse()).abs_diff_eq(DMat4::IDENTITY, 1e-6));
    }
}
