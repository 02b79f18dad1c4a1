//! Lever Arm Scene - Bevy rendering and UI for the lever arm visualizer
//!
//! Provides the scene (camera, lights, reference axes), the glTF-backed
//! `RenderContext` for the core session, click-to-focus sensor picking, the
//! egui form panels, and the orientation compass. The application inserts [`SessionResource`] and
//! [`SceneSettings`] before adding [`LeverArmScenePlugin`].

pub mod camera;
pub mod compass;
pub mod models;
pub mod scene;
pub mod selection;
pub mod types;
pub mod ui;

use bevy::prelude::*;

/// Plugin that sets up the scene, model loading, and UI
pub struct LeverArmScenePlugin;

impl Plugin for LeverArmScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneSettings>()
            .init_resource::<LastError>()
            .init_resource::<SnapshotExport>()
            .init_resource::<FocusedSensor>()
            .init_resource::<UiLayout>()
            .add_plugins(camera::CameraPlugin)
            .add_plugins(scene::SceneSetupPlugin)
            .add_plugins(models::ModelsPlugin)
            .add_plugins(selection::SelectionPlugin)
            .add_plugins(ui::UiPlugin);
    }
}

// Re-export commonly used types
pub use camera::CameraSettings;
pub use models::SceneContext;
pub use types::*;
