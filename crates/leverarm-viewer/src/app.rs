//! Bevy application setup

use anyhow::{Context, Result};
use bevy::prelude::*;
use bevy::winit::WinitSettings;
use bevy_egui::EguiPlugin;
use bevy_picking::{prelude::MeshPickingPlugin, DefaultPickingPlugins};
use leverarm_core::{Session, ViewerConfig};
use leverarm_scene::{LeverArmScenePlugin, SceneSettings, SessionResource};

/// CSS selector of the canvas the viewer renders into on the web
pub const CANVAS_SELECTOR: &str = "#viewer-canvas";

/// Build the session the scene plugin drives
pub fn build_session(config: &ViewerConfig) -> Result<Session<Entity>> {
    let registry = config
        .load_registry()
        .context("Failed to load model catalog")?;
    tracing::info!(models = registry.len(), "Model catalog ready");

    let session = Session::new(registry, config.scene.unit, &config.vehicle.default)
        .with_context(|| format!("Invalid default vehicle '{}'", config.vehicle.default))?;
    Ok(session)
}

/// Asset root for glTF models
fn asset_root() -> String {
    if cfg!(target_arch = "wasm32") {
        // Served from the page root alongside the wasm bundle
        String::new()
    } else {
        "assets".to_string()
    }
}

pub fn build_app(config: &ViewerConfig) -> Result<App> {
    let session = build_session(config)?;

    let mut app = App::new();
    app.insert_resource(ClearColor(Color::srgb(0.1, 0.1, 0.15)))
        .insert_resource(WinitSettings::default())
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Lever Arm Visualizer".to_string(),
                        canvas: Some(CANVAS_SELECTOR.to_string()),
                        fit_canvas_to_parent: true,
                        prevent_default_event_handling: false,
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    file_path: asset_root(),
                    // Static hosting has no .meta files
                    meta_check: bevy::asset::AssetMetaCheck::Never,
                    ..default()
                }),
        )
        // Picking must be registered before EguiPlugin so egui can detect it
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(MeshPickingPlugin)
        .add_plugins(EguiPlugin::default())
        .insert_resource(SessionResource(session))
        .insert_resource(SceneSettings::from(&config.scene))
        .add_plugins(LeverArmScenePlugin);

    Ok(app)
}

/// Build and run the viewer until the window closes
pub fn run(config: ViewerConfig) -> Result<()> {
    tracing::info!(
        vehicle = %config.vehicle.default,
        unit = ?config.scene.unit,
        "Starting lever arm visualizer"
    );
    match build_app(&config)?.run() {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => anyhow::bail!("Viewer exited with code {}", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_session_with_defaults() {
        let session = build_session(&ViewerConfig::default()).unwrap();
        assert_eq!(session.vehicle_state().bound_model(), "pontoon");
    }

    #[test]
    fn test_build_session_rejects_unknown_vehicle() {
        let mut config = ViewerConfig::default();
        config.vehicle.default = "hovercraft".to_string();
        let err = build_session(&config).unwrap_err();
        assert!(err.to_string().contains("hovercraft"));
    }

    #[test]
    fn test_build_session_reports_missing_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ViewerConfig::default();
        config.catalog.path = Some(dir.path().join("missing.toml").to_string_lossy().into_owned());
        let err = build_session(&config).unwrap_err();
        assert!(err.to_string().contains("catalog"));
    }
}
