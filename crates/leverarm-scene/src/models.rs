//! glTF model loading and transform assignment
//!
//! [`SceneContext`] is the Bevy side of [`RenderContext`]: load requests go to
//! the `AssetServer`, placed objects are entities with a `SceneRoot`, and a
//! pose becomes the entity's `Transform`.

use bevy::asset::LoadState;
use bevy::ecs::system::SystemParam;
use bevy::gltf::Gltf;
use bevy::prelude::*;
use leverarm_core::glam::DMat4;
use leverarm_core::{LoadRequest, LoadToken, RenderContext, SensorId, Slot};
use std::collections::HashMap;

use crate::types::{LastError, SessionResource};

/// Marker for the vehicle's scene root
#[derive(Component)]
pub struct VehicleModel {
    pub model: String,
}

/// Marker for an attached sensor's scene root
#[derive(Component)]
pub struct SensorModel {
    pub id: SensorId,
    pub model: String,
}

/// Material to apply to every mesh under a model once its scene has spawned
#[derive(Component)]
pub struct ModelTint(pub Handle<StandardMaterial>);

/// Tint has been applied
#[derive(Component)]
pub struct Tinted;

/// A glTF asset in flight for one load token
pub struct PendingAsset {
    pub model: String,
    pub asset_path: String,
    pub handle: Handle<Gltf>,
}

/// Asset loads issued by the session and not yet resolved
#[derive(Resource, Default)]
pub struct PendingLoads {
    pub loads: HashMap<LoadToken, PendingAsset>,
}

/// Shared translucent materials for loaded models
#[derive(Resource)]
pub struct ModelMaterials {
    pub vehicle: Handle<StandardMaterial>,
    pub sensor: Handle<StandardMaterial>,
}

impl FromWorld for ModelMaterials {
    fn from_world(world: &mut World) -> Self {
        let mut materials = world.resource_mut::<Assets<StandardMaterial>>();
        Self {
            vehicle: materials.add(tint_material(Color::srgba(0.0, 1.0, 0.0, 0.6))),
            sensor: materials.add(tint_material(Color::srgba(1.0, 0.55, 0.0, 0.6))),
        }
    }
}

/// Translucent, flat-looking material used instead of the asset's own
fn tint_material(color: Color) -> StandardMaterial {
    StandardMaterial {
        base_color: color,
        alpha_mode: AlphaMode::Blend,
        perceptual_roughness: 1.0,
        metallic: 0.0,
        reflectance: 0.1,
        double_sided: true,
        cull_mode: None,
        ..default()
    }
}

/// Bevy implementation of the session's render capabilities
#[derive(SystemParam)]
pub struct SceneContext<'w, 's> {
    commands: Commands<'w, 's>,
    asset_server: Res<'w, AssetServer>,
    pending: ResMut<'w, PendingLoads>,
}

impl RenderContext for SceneContext<'_, '_> {
    type Object = Entity;

    fn request_load(&mut self, request: LoadRequest) {
        let asset_path = normalize_model_path(&request.asset_path);
        tracing::info!(
            model = %request.model,
            path = %asset_path,
            generation = request.token.generation,
            "Starting to load model"
        );
        let handle: Handle<Gltf> = self.asset_server.load(asset_path.clone());
        self.pending.loads.insert(
            request.token,
            PendingAsset {
                model: request.model,
                asset_path,
                handle,
            },
        );
    }

    fn place(&mut self, object: &Entity, transform: DMat4) {
        self.commands.entity(*object).try_insert(to_transform(transform));
    }

    fn release(&mut self, object: Entity) {
        self.commands.entity(object).try_despawn();
    }
}

/// f64 pose to a Bevy transform
pub fn to_transform(matrix: DMat4) -> Transform {
    Transform::from_matrix(Mat4::from_cols_array(&matrix.as_mat4().to_cols_array()))
}

/// Normalize model path for asset loading
fn normalize_model_path(path: &str) -> String {
    // Absolute URLs load over HTTP as-is
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    path.trim_start_matches('/').to_string()
}

pub struct ModelsPlugin;

impl Plugin for ModelsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingLoads>()
            .init_resource::<ModelMaterials>()
            .add_systems(Startup, start_session)
            .add_systems(Update, poll_loads)
            .add_systems(Update, apply_poses.after(poll_loads))
            .add_systems(Update, apply_model_tint.after(poll_loads));
    }
}

/// Issue the default vehicle load
fn start_session(mut session: ResMut<SessionResource>, mut ctx: SceneContext) {
    session.0.start(&mut ctx);
}

enum Resolved {
    Loaded(Handle<Scene>),
    Failed(String),
}

/// Check outstanding glTF loads and hand finished ones to the session
fn poll_loads(
    mut session: ResMut<SessionResource>,
    mut ctx: SceneContext,
    gltf_assets: Res<Assets<Gltf>>,
    materials: Res<ModelMaterials>,
    mut last_error: ResMut<LastError>,
) {
    if ctx.pending.loads.is_empty() {
        return;
    }

    let mut resolved = Vec::new();
    for (token, asset) in &ctx.pending.loads {
        match ctx.asset_server.get_load_state(asset.handle.id()) {
            Some(LoadState::Loaded) => {
                let scene = gltf_assets.get(&asset.handle).and_then(|gltf| {
                    gltf.default_scene
                        .clone()
                        .or_else(|| gltf.scenes.first().cloned())
                });
                match scene {
                    Some(scene) => resolved.push((*token, Resolved::Loaded(scene))),
                    None => resolved.push((
                        *token,
                        Resolved::Failed(format!("{} contains no scene", asset.asset_path)),
                    )),
                }
            }
            Some(LoadState::Failed(err)) => {
                resolved.push((*token, Resolved::Failed(err.to_string())));
            }
            _ => {
                // Still loading
            }
        }
    }

    for (token, outcome) in resolved {
        let Some(asset) = ctx.pending.loads.remove(&token) else {
            continue;
        };

        match outcome {
            Resolved::Loaded(scene) => {
                let entity = match token.slot {
                    Slot::Vehicle => ctx
                        .commands
                        .spawn((
                            SceneRoot(scene),
                            Transform::default(),
                            VehicleModel { model: asset.model },
                            ModelTint(materials.vehicle.clone()),
                        ))
                        .id(),
                    Slot::Sensor(id) => ctx
                        .commands
                        .spawn((
                            SceneRoot(scene),
                            Transform::default(),
                            SensorModel { id, model: asset.model },
                            ModelTint(materials.sensor.clone()),
                        ))
                        .id(),
                };
                if session.0.on_load_complete(token, entity, &mut ctx) {
                    last_error.clear();
                }
            }
            Resolved::Failed(reason) => {
                if let Some(err) = session.0.on_load_failed(token, &reason) {
                    last_error.set(&err);
                }
            }
        }
    }
}

/// Recompute every placed object whenever the session changes
fn apply_poses(session: Res<SessionResource>, mut ctx: SceneContext) {
    if !session.is_changed() {
        return;
    }
    session.0.recompute(&mut ctx);
}

/// Swap the asset's materials for the model tint once the scene has spawned
fn apply_model_tint(
    mut commands: Commands,
    roots: Query<(Entity, &ModelTint), Without<Tinted>>,
    children: Query<&Children>,
    mut meshes: Query<&mut MeshMaterial3d<StandardMaterial>>,
) {
    for (root, tint) in &roots {
        let mut found = false;
        for descendant in children.iter_descendants(root) {
            if let Ok(mut material) = meshes.get_mut(descendant) {
                material.0 = tint.0.clone();
                found = true;
            }
        }
        // Scene children arrive a frame or more after the root
        if found {
            commands.entity(root).insert(Tinted);
        }
    }
}
