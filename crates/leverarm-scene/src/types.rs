//! Shared resources for the scene, model loading, and UI

use bevy::prelude::*;
use leverarm_core::config::{SceneConfig, MAX_AXIS_TABS};
use leverarm_core::{SceneUnit, SensorId, Session, SessionError};

/// The visualizer session, with Bevy entities as scene objects
#[derive(Resource)]
pub struct SessionResource(pub Session<Entity>);

/// Scene geometry settings, in scene units
#[derive(Debug, Clone, Resource)]
pub struct SceneSettings {
    pub unit: SceneUnit,
    pub camera_distance: f32,
    pub axis_extent: f32,
    pub axis_tab_step: f32,
    pub axis_tab_radius: f32,
}

impl From<&SceneConfig> for SceneSettings {
    fn from(config: &SceneConfig) -> Self {
        Self {
            unit: config.unit,
            camera_distance: config.camera_distance as f32,
            axis_extent: config.axis_extent as f32,
            axis_tab_step: config.axis_tab_step as f32,
            axis_tab_radius: config.axis_tab_radius as f32,
        }
    }
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self::from(&SceneConfig::default())
    }
}

impl SceneSettings {
    /// Thickness of the reference axis lines
    pub fn axis_thickness(&self) -> f32 {
        self.axis_tab_radius * 0.25
    }

    /// Far clipping plane; covers the full axis extent from the camera
    pub fn far_plane(&self) -> f32 {
        self.axis_extent.max(self.camera_distance * 2.0)
    }

    /// Distance along one half-axis of every tab marker, excluding the origin
    pub fn tab_positions(&self) -> Vec<f32> {
        if !(self.axis_tab_step > 0.0 && self.axis_extent.is_finite()) {
            return Vec::new();
        }
        let count = ((self.axis_extent / self.axis_tab_step).floor() as usize).min(MAX_AXIS_TABS);
        (1..=count).map(|i| i as f32 * self.axis_tab_step).collect()
    }
}

/// Most recent user-facing error, shown in the status line
#[derive(Debug, Clone, Resource, Default)]
pub struct LastError(pub Option<String>);

impl LastError {
    pub fn set(&mut self, error: &SessionError) {
        self.0 = Some(error.to_string());
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }
}

/// Sensor clicked in the scene, waiting for its panel to be brought into view
#[derive(Debug, Clone, Resource, Default)]
pub struct FocusedSensor(pub Option<SensorId>);

/// JSON export of the current lever-arm configuration, when requested
#[derive(Debug, Clone, Resource, Default)]
pub struct SnapshotExport(pub Option<String>);

/// UI layout detection and responsive settings
#[derive(Debug, Clone, Resource)]
pub struct UiLayout {
    pub is_mobile: bool,
    pub screen_width: f32,
    pub screen_height: f32,
    pub show_panel: bool,
}

impl Default for UiLayout {
    fn default() -> Self {
        Self {
            is_mobile: false,
            screen_width: 1920.0,
            screen_height: 1080.0,
            show_panel: true,
        }
    }
}

impl UiLayout {
    pub fn update_from_window(&mut self, width: f32, height: f32) {
        self.screen_width = width;
        self.screen_height = height;
        // Consider mobile if width < 800 or in portrait orientation
        self.is_mobile = width < 800.0 || (height > width * 1.2);
    }

    pub fn panel_width(&self) -> f32 {
        if self.is_mobile {
            self.screen_width * 0.85
        } else {
            300.0
        }
    }

    pub fn ui_scale(&self) -> f32 {
        if self.is_mobile { 1.2 } else { 1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_positions() {
        let settings = SceneSettings::default();
        let tabs = settings.tab_positions();
        assert_eq!(tabs.len(), 50);
        assert_eq!(tabs[0], 1000.0);
        assert_eq!(tabs[49], 50000.0);

        let settings = SceneSettings {
            axis_tab_step: 0.0,
            ..SceneSettings::default()
        };
        assert!(settings.tab_positions().is_empty());

        let settings = SceneSettings {
            axis_tab_step: 1e-6,
            ..SceneSettings::default()
        };
        assert_eq!(settings.tab_positions().len(), MAX_AXIS_TABS);
    }

    #[test]
    fn test_far_plane_covers_axes() {
        let settings = SceneSettings::default();
        assert_eq!(settings.far_plane(), 50000.0);
    }

    #[test]
    fn test_mobile_layout() {
        let mut layout = UiLayout::default();
        layout.update_from_window(600.0, 900.0);
        assert!(layout.is_mobile);
        assert!((layout.panel_width() - 510.0).abs() < 1e-3);

        layout.update_from_window(1600.0, 900.0);
        assert!(!layout.is_mobile);
        assert_eq!(layout.panel_width(), 300.0);
    }
}
