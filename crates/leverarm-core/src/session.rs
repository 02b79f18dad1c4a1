//! Visualizer session - the placed vehicle, attached sensors, and asset loads
//!
//! The session owns every `AdjustmentState` and knows which rendered object
//! belongs to which instance. Rendering and asset loading stay behind the
//! [`RenderContext`] trait so the session runs the same under Bevy and in tests.
//!
//! Every load request carries a [`LoadToken`]. A completion is applied only
//! when its token is still the latest request for its slot; anything else is
//! stale and its object is released immediately.

use glam::DMat4;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::adjustment::{
    AdjustmentError, AdjustmentField, AdjustmentState, ForwardDirection, UpDirection,
};
use crate::catalog::{ModelDescriptor, ModelKind, ModelRegistry};
use crate::pose::{compose_sensor_pose, compose_vehicle_pose, SceneUnit};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),
    #[error("Model {key} is a {actual}, expected a {expected}")]
    WrongKind {
        key: String,
        expected: ModelKind,
        actual: ModelKind,
    },
    #[error("Unknown sensor: {0}")]
    UnknownSensor(SensorId),
    #[error("Invalid value: {0}")]
    InvalidValue(#[from] AdjustmentError),
    #[error("Failed to load {model}: {reason}")]
    LoadFailed { model: String, reason: String },
}

/// Identifier of an attached sensor, generated at attach time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SensorId(pub Uuid);

impl SensorId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SensorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a loaded object goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Vehicle,
    Sensor(SensorId),
}

/// Identifies one load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadToken {
    pub slot: Slot,
    /// Session-wide, strictly increasing
    pub generation: u64,
}

/// Request for the render side to load an asset
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub token: LoadToken,
    pub model: String,
    pub asset_path: String,
}

/// Render and asset-loading capabilities the session needs
pub trait RenderContext {
    /// Handle to a placed object in the scene
    type Object;

    /// Start loading an asset. The result must come back through
    /// [`Session::on_load_complete`] or [`Session::on_load_failed`] with the same token.
    fn request_load(&mut self, request: LoadRequest);

    /// Assign a transform to a placed object
    fn place(&mut self, object: &Self::Object, transform: DMat4);

    /// Detach an object from the scene and drop it
    fn release(&mut self, object: Self::Object);
}

/// Lifecycle of a placed instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstancePhase {
    Unset,
    Loading,
    Loaded,
}

#[derive(Debug, Clone)]
struct PendingLoad {
    generation: u64,
    model: String,
}

#[derive(Debug)]
struct VehicleSlot<O> {
    state: AdjustmentState,
    object: Option<O>,
    pending: Option<PendingLoad>,
}

#[derive(Debug, Clone)]
struct PendingSensor {
    id: SensorId,
    load: PendingLoad,
}

/// A sensor whose asset has loaded
#[derive(Debug)]
pub struct AttachedSensor<O> {
    pub id: SensorId,
    pub state: AdjustmentState,
    pub object: O,
}

/// Serializable summary of one instance's lever arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    pub model: String,
    pub display_name: String,
    /// Meters
    pub target_size: f64,
    /// Meters
    pub translation_offset: [f64; 3],
    /// Degrees (roll, pitch, yaw)
    pub rotation_offset_deg: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    #[serde(flatten)]
    pub instance: InstanceSnapshot,
    pub forward: ForwardDirection,
    pub up: UpDirection,
    /// Radians (roll, pitch, yaw)
    pub base_rotation: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub id: SensorId,
    #[serde(flatten)]
    pub instance: InstanceSnapshot,
}

/// Lever-arm configuration of the whole session, for export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverArmSnapshot {
    pub vehicle: VehicleSnapshot,
    pub sensors: Vec<SensorSnapshot>,
}

impl LeverArmSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// The visualizer's state: one vehicle, any number of sensors
#[derive(Debug)]
pub struct Session<O> {
    registry: ModelRegistry,
    unit: SceneUnit,
    vehicle: VehicleSlot<O>,
    pending_sensors: Vec<PendingSensor>,
    sensors: Vec<AttachedSensor<O>>,
    next_generation: u64,
}

impl<O> Session<O> {
    /// Create a session whose vehicle state is bound to `default_vehicle`.
    ///
    /// Nothing is loaded until [`Session::start`].
    pub fn new(
        registry: ModelRegistry,
        unit: SceneUnit,
        default_vehicle: &str,
    ) -> Result<Self, SessionError> {
        let descriptor = lookup(&registry, default_vehicle, ModelKind::Vehicle)?;
        let state = AdjustmentState::for_model(descriptor);

        Ok(Self {
            registry,
            unit,
            vehicle: VehicleSlot {
                state,
                object: None,
                pending: None,
            },
            pending_sensors: Vec::new(),
            sensors: Vec::new(),
            next_generation: 1,
        })
    }

    /// Issue the load for the default vehicle
    pub fn start<C>(&mut self, ctx: &mut C)
    where
        C: RenderContext<Object = O>,
    {
        if self.vehicle.object.is_some() || self.vehicle.pending.is_some() {
            return;
        }
        let model = self.vehicle.state.bound_model().to_string();
        self.request_vehicle(model, ctx);
    }

    /// Swap the vehicle model. The previous object stays in the scene until the
    /// new one has loaded.
    pub fn select_vehicle<C>(&mut self, key: &str, ctx: &mut C) -> Result<(), SessionError>
    where
        C: RenderContext<Object = O>,
    {
        if let Err(e) = lookup(&self.registry, key, ModelKind::Vehicle) {
            warn!(model = key, error = %e, "Cannot select vehicle");
            return Err(e);
        }

        if self.vehicle.pending.as_ref().is_some_and(|p| p.model == key) {
            return Ok(());
        }

        if self.vehicle.object.is_some() && self.vehicle.state.bound_model() == key {
            // Back to what is already on screen: drop any in-flight swap
            if let Some(pending) = self.vehicle.pending.take() {
                debug!(
                    model = %pending.model,
                    generation = pending.generation,
                    "Abandoned vehicle load"
                );
            }
            return Ok(());
        }

        self.request_vehicle(key.to_string(), ctx);
        Ok(())
    }

    /// Start loading a sensor. It gets adjustment state once the asset arrives.
    pub fn attach_sensor<C>(&mut self, key: &str, ctx: &mut C) -> Result<SensorId, SessionError>
    where
        C: RenderContext<Object = O>,
    {
        let descriptor = match lookup(&self.registry, key, ModelKind::Sensor) {
            Ok(d) => d,
            Err(e) => {
                warn!(model = key, error = %e, "Cannot attach sensor");
                return Err(e);
            }
        };
        let asset_path = descriptor.asset_path.clone();

        let id = SensorId::generate();
        let generation = self.next_generation();
        self.pending_sensors.push(PendingSensor {
            id,
            load: PendingLoad {
                generation,
                model: key.to_string(),
            },
        });

        info!(sensor = %id, model = key, generation, "Attaching sensor");
        ctx.request_load(LoadRequest {
            token: LoadToken {
                slot: Slot::Sensor(id),
                generation,
            },
            model: key.to_string(),
            asset_path,
        });

        Ok(id)
    }

    /// Deliver a finished load. Returns whether the result was applied;
    /// stale results are released.
    pub fn on_load_complete<C>(&mut self, token: LoadToken, object: O, ctx: &mut C) -> bool
    where
        C: RenderContext<Object = O>,
    {
        match token.slot {
            Slot::Vehicle => {
                let current = self
                    .vehicle
                    .pending
                    .as_ref()
                    .is_some_and(|p| p.generation == token.generation);
                if !current {
                    debug!(generation = token.generation, "Discarding stale vehicle load");
                    ctx.release(object);
                    return false;
                }
                let Some(pending) = self.vehicle.pending.take() else {
                    ctx.release(object);
                    return false;
                };

                let Some(descriptor) = self.registry.get(&pending.model) else {
                    warn!(model = %pending.model, "Vehicle model vanished from catalog");
                    ctx.release(object);
                    return false;
                };

                if let Some(previous) = self.vehicle.object.take() {
                    ctx.release(previous);
                }
                if self.vehicle.state.bound_model() != pending.model {
                    self.vehicle.state.rebind(descriptor);
                }
                info!(model = %pending.model, "Vehicle loaded");

                ctx.place(
                    &object,
                    compose_vehicle_pose(descriptor, &self.vehicle.state, self.unit),
                );
                self.vehicle.object = Some(object);
                true
            }
            Slot::Sensor(id) => {
                let Some(index) = self.pending_index(id, token.generation) else {
                    debug!(
                        sensor = %id,
                        generation = token.generation,
                        "Discarding stale sensor load"
                    );
                    ctx.release(object);
                    return false;
                };
                let pending = self.pending_sensors.remove(index);

                let Some(descriptor) = self.registry.get(&pending.load.model) else {
                    warn!(
                        sensor = %id,
                        model = %pending.load.model,
                        "Sensor model vanished from catalog"
                    );
                    ctx.release(object);
                    return false;
                };

                let state = AdjustmentState::for_model(descriptor);
                ctx.place(&object, compose_sensor_pose(descriptor, &state, self.unit));
                info!(sensor = %id, model = %pending.load.model, "Sensor attached");

                self.sensors.push(AttachedSensor { id, state, object });
                true
            }
        }
    }

    /// Deliver a failed load. Returns the error when the token was current;
    /// a stale failure is ignored.
    pub fn on_load_failed(&mut self, token: LoadToken, reason: &str) -> Option<SessionError> {
        match token.slot {
            Slot::Vehicle => {
                let current = self
                    .vehicle
                    .pending
                    .as_ref()
                    .is_some_and(|p| p.generation == token.generation);
                if !current {
                    debug!(generation = token.generation, "Ignoring stale vehicle load failure");
                    return None;
                }
                let pending = self.vehicle.pending.take()?;
                error!(model = %pending.model, reason, "Failed to load vehicle");
                Some(SessionError::LoadFailed {
                    model: pending.model,
                    reason: reason.to_string(),
                })
            }
            Slot::Sensor(id) => {
                let index = self.pending_index(id, token.generation)?;
                let pending = self.pending_sensors.remove(index);
                error!(sensor = %id, model = %pending.load.model, reason, "Failed to load sensor");
                Some(SessionError::LoadFailed {
                    model: pending.load.model,
                    reason: reason.to_string(),
                })
            }
        }
    }

    /// Compose and place every loaded object. Returns how many were placed.
    pub fn recompute<C>(&self, ctx: &mut C) -> usize
    where
        C: RenderContext<Object = O>,
    {
        let mut placed = 0;

        if let Some(object) = &self.vehicle.object {
            let state = &self.vehicle.state;
            match self.registry.get(state.bound_model()) {
                Some(descriptor) => {
                    ctx.place(object, compose_vehicle_pose(descriptor, state, self.unit));
                    placed += 1;
                }
                None => {
                    warn!(model = %state.bound_model(), "Vehicle model not in catalog");
                }
            }
        }

        for sensor in &self.sensors {
            match self.registry.get(sensor.state.bound_model()) {
                Some(descriptor) => {
                    let pose = compose_sensor_pose(descriptor, &sensor.state, self.unit);
                    ctx.place(&sensor.object, pose);
                    placed += 1;
                }
                None => {
                    warn!(
                        sensor = %sensor.id,
                        model = %sensor.state.bound_model(),
                        "Sensor model not in catalog"
                    );
                }
            }
        }

        debug!(placed, "Recomputed poses");
        placed
    }

    pub fn update_vehicle(
        &mut self,
        field: AdjustmentField,
        value: f64,
    ) -> Result<(), SessionError> {
        let state = &mut self.vehicle.state;
        let result = match self.registry.get(state.bound_model()) {
            Some(descriptor) => state.update_scaled(descriptor, field, value),
            None => state.update(field, value),
        };
        result.map_err(|e| {
            warn!(error = %e, "Rejected vehicle adjustment");
            SessionError::from(e)
        })
    }

    pub fn update_sensor(
        &mut self,
        id: SensorId,
        field: AdjustmentField,
        value: f64,
    ) -> Result<(), SessionError> {
        let sensor = self
            .sensors
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SessionError::UnknownSensor(id))?;
        let result = match self.registry.get(sensor.state.bound_model()) {
            Some(descriptor) => sensor.state.update_scaled(descriptor, field, value),
            None => sensor.state.update(field, value),
        };
        result.map_err(|e| {
            warn!(sensor = %id, error = %e, "Rejected sensor adjustment");
            SessionError::from(e)
        })
    }

    pub fn set_forward_direction(&mut self, forward: ForwardDirection) {
        self.vehicle.state.set_forward(forward);
    }

    pub fn set_up_direction(&mut self, up: UpDirection) {
        self.vehicle.state.set_up(up);
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn unit(&self) -> SceneUnit {
        self.unit
    }

    pub fn vehicle_state(&self) -> &AdjustmentState {
        &self.vehicle.state
    }

    pub fn vehicle_object(&self) -> Option<&O> {
        self.vehicle.object.as_ref()
    }

    pub fn vehicle_phase(&self) -> InstancePhase {
        if self.vehicle.pending.is_some() {
            InstancePhase::Loading
        } else if self.vehicle.object.is_some() {
            InstancePhase::Loaded
        } else {
            InstancePhase::Unset
        }
    }

    /// Catalog key of the vehicle currently loading, if any
    pub fn pending_vehicle(&self) -> Option<&str> {
        self.vehicle.pending.as_ref().map(|p| p.model.as_str())
    }

    /// Composed vehicle transform, if a vehicle is on screen
    pub fn vehicle_pose(&self) -> Option<DMat4> {
        self.vehicle.object.as_ref()?;
        let descriptor = self.registry.get(self.vehicle.state.bound_model())?;
        Some(compose_vehicle_pose(descriptor, &self.vehicle.state, self.unit))
    }

    pub fn sensors(&self) -> impl Iterator<Item = &AttachedSensor<O>> {
        self.sensors.iter()
    }

    pub fn sensor(&self, id: SensorId) -> Option<&AttachedSensor<O>> {
        self.sensors.iter().find(|s| s.id == id)
    }

    pub fn sensor_phase(&self, id: SensorId) -> InstancePhase {
        if self.sensors.iter().any(|s| s.id == id) {
            InstancePhase::Loaded
        } else if self.pending_sensors.iter().any(|p| p.id == id) {
            InstancePhase::Loading
        } else {
            InstancePhase::Unset
        }
    }

    /// Number of sensors still loading
    pub fn loading_sensor_count(&self) -> usize {
        self.pending_sensors.len()
    }

    /// Current lever-arm configuration
    pub fn snapshot(&self) -> LeverArmSnapshot {
        let vehicle_state = &self.vehicle.state;
        LeverArmSnapshot {
            vehicle: VehicleSnapshot {
                instance: self.instance_snapshot(vehicle_state),
                forward: vehicle_state.forward(),
                up: vehicle_state.up(),
                base_rotation: vehicle_state.base_rotation(),
            },
            sensors: self
                .sensors
                .iter()
                .map(|s| SensorSnapshot {
                    id: s.id,
                    instance: self.instance_snapshot(&s.state),
                })
                .collect(),
        }
    }

    fn instance_snapshot(&self, state: &AdjustmentState) -> InstanceSnapshot {
        InstanceSnapshot {
            model: state.bound_model().to_string(),
            display_name: self
                .registry
                .get(state.bound_model())
                .map(|d| d.display_name.clone())
                .unwrap_or_default(),
            target_size: state.target_size(),
            translation_offset: state.translation_offset(),
            rotation_offset_deg: state.rotation_offset_deg(),
        }
    }

    fn request_vehicle<C>(&mut self, model: String, ctx: &mut C)
    where
        C: RenderContext<Object = O>,
    {
        let Some(descriptor) = self.registry.get(&model) else {
            return;
        };
        let asset_path = descriptor.asset_path.clone();
        let generation = self.next_generation();

        info!(model = %model, generation, "Loading vehicle");
        self.vehicle.pending = Some(PendingLoad {
            generation,
            model: model.clone(),
        });
        ctx.request_load(LoadRequest {
            token: LoadToken {
                slot: Slot::Vehicle,
                generation,
            },
            model,
            asset_path,
        });
    }

    fn pending_index(&self, id: SensorId, generation: u64) -> Option<usize> {
        self.pending_sensors
            .iter()
            .position(|p| p.id == id && p.load.generation == generation)
    }

    fn next_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }
}

fn lookup<'a>(
    registry: &'a ModelRegistry,
    key: &str,
    expected: ModelKind,
) -> Result<&'a ModelDescriptor, SessionError> {
    let descriptor = registry
        .get(key)
        .ok_or_else(|| SessionError::UnknownModel(key.to_string()))?;
    if descriptor.kind != expected {
        return Err(SessionError::WrongKind {
            key: key.to_string(),
            expected,
            actual: descriptor.kind,
        });
    }
    Ok(descriptor)
}
