//! Click a sensor in the scene to bring its panel into view
//!
//! Mesh hits come from `bevy_picking`'s hover map. A hit lands on a glTF
//! mesh somewhere below the sensor's scene root, so the hierarchy is walked
//! upwards until a [`SensorModel`] is found.

use bevy::prelude::*;
use bevy_picking::hover::HoverMap;
use bevy_picking::pointer::PointerId;
use leverarm_core::SensorId;

use crate::models::SensorModel;
use crate::types::FocusedSensor;

pub struct SelectionPlugin;

impl Plugin for SelectionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, focus_clicked_sensor);
    }
}

/// Sensor owning `entity`, checking the entity itself and then its ancestors
pub fn owning_sensor(
    entity: Entity,
    parents: &Query<&ChildOf>,
    sensors: &Query<&SensorModel>,
) -> Option<SensorId> {
    std::iter::once(entity)
        .chain(parents.iter_ancestors(entity))
        .find_map(|e| sensors.get(e).ok().map(|sensor| sensor.id))
}

fn focus_clicked_sensor(
    mouse: Res<ButtonInput<MouseButton>>,
    hover_map: Option<Res<HoverMap>>,
    parents: Query<&ChildOf>,
    sensors: Query<&SensorModel>,
    mut focused: ResMut<FocusedSensor>,
) {
    if !mouse.just_pressed(MouseButton::Left) {
        return;
    }
    let Some(hover_map) = hover_map else { return };
    let Some(hits) = hover_map.get(&PointerId::Mouse) else {
        return;
    };

    if let Some(id) = hits
        .keys()
        .find_map(|&entity| owning_sensor(entity, &parents, &sensors))
    {
        tracing::debug!(sensor = %id, "Sensor clicked");
        focused.0 = Some(id);
    }
}
