//! Lever Arm Core - Model catalog, adjustment state, and pose composition
//!
//! This crate holds everything about the visualizer that does not need a
//! rendering engine:
//! - Model catalog (vehicles and sensors with their alignment corrections)
//! - Per-instance adjustment state edited by the UI
//! - Pose composition from catalog entry + adjustment state to a 4x4 matrix
//! - The session that tracks the placed vehicle, attached sensors, and
//!   outstanding asset loads
//! - Viewer configuration

pub mod adjustment;
pub mod catalog;
pub mod config;
pub mod pose;
pub mod session;

pub use glam;

pub use adjustment::{
    AdjustmentError, AdjustmentField, AdjustmentState, Axis, ForwardDirection, RotationAxis,
    UpDirection,
};
pub use catalog::{CatalogError, CatalogIndex, ModelDescriptor, ModelKind, ModelRegistry};
pub use config::{load_config, ConfigError, ViewerConfig};
pub use pose::{compose_sensor_pose, compose_vehicle_pose, euler_to_quat, SceneUnit};
pub use session::{
    AttachedSensor, InstancePhase, InstanceSnapshot, LeverArmSnapshot, LoadRequest, LoadToken,
    RenderContext, SensorId, SensorSnapshot, Session, SessionError, Slot, VehicleSnapshot,
};
