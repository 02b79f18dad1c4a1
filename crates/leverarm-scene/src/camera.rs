//! Fixed main camera

use bevy::prelude::*;

use crate::types::SceneSettings;

/// Camera placement, derived once from [`SceneSettings`]
#[derive(Debug, Clone, Resource)]
pub struct CameraSettings {
    pub distance: f32,
    /// Angle around Z from +X, radians
    pub azimuth: f32,
    /// Angle above the X-Y plane, radians
    pub elevation: f32,
    pub target: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self::from(&SceneSettings::default())
    }
}

impl From<&SceneSettings> for CameraSettings {
    fn from(settings: &SceneSettings) -> Self {
        Self {
            distance: settings.camera_distance,
            azimuth: -0.8,
            elevation: 0.5,
            target: Vec3::ZERO,
            near: settings.camera_distance * 1e-4,
            far: settings.far_plane(),
        }
    }
}

impl CameraSettings {
    /// Camera position on its sphere around the target (Z up)
    pub fn eye(&self) -> Vec3 {
        let horizontal = self.distance * self.elevation.cos();
        self.target
            + Vec3::new(
                horizontal * self.azimuth.cos(),
                horizontal * self.azimuth.sin(),
                self.distance * self.elevation.sin(),
            )
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye()).looking_at(self.target, Vec3::Z)
    }
}

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Plugin for the main camera
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera);
    }
}

fn spawn_camera(mut commands: Commands, scene_settings: Res<SceneSettings>) {
    let settings = CameraSettings::from(&*scene_settings);

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            near: settings.near,
            far: settings.far,
            ..default()
        }),
        settings.transform(),
        MainCamera,
    ));
    commands.insert_resource(settings);
}
