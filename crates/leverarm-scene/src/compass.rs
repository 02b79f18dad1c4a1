//! Orientation compass inset in the bottom-right corner

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::camera::MainCamera;
use crate::types::SessionResource;

const INSET_SIZE: f32 = 110.0;
const AXIS_LENGTH: f32 = 38.0;

/// One axis projected onto the camera's image plane
#[derive(Debug, Clone, Copy)]
pub struct ProjectedAxis {
    pub label: &'static str,
    /// Screen offset from the inset center, y down
    pub offset: egui::Vec2,
    /// Larger is nearer the viewer
    pub depth: f32,
    pub color: egui::Color32,
}

/// Project the body axes of `body` through the camera's orientation, farthest first
pub fn project_axes(camera: Quat, body: Quat, length: f32) -> [ProjectedAxis; 3] {
    let view = camera.inverse();
    let project = |label, axis: Vec3, color| {
        let v = view * (body * axis);
        ProjectedAxis {
            label,
            offset: egui::vec2(v.x * length, -v.y * length),
            depth: v.z,
            color,
        }
    };

    let mut axes = [
        project("X", Vec3::X, egui::Color32::from_rgb(230, 60, 60)),
        project("Y", Vec3::Y, egui::Color32::from_rgb(60, 220, 60)),
        project("Z", Vec3::Z, egui::Color32::from_rgb(70, 110, 240)),
    ];
    axes.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    axes
}

pub(crate) fn compass_system(
    mut contexts: EguiContexts,
    session: Res<SessionResource>,
    camera: Query<&Transform, With<MainCamera>>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };
    let Ok(camera) = camera.single() else { return };

    let body = session
        .0
        .vehicle_pose()
        .map(|pose| {
            let (_, rotation, _) = pose.to_scale_rotation_translation();
            Quat::from_array(rotation.as_quat().to_array())
        })
        .unwrap_or(Quat::IDENTITY);

    let world_axes = project_axes(camera.rotation, Quat::IDENTITY, AXIS_LENGTH);
    let body_axes = project_axes(camera.rotation, body, AXIS_LENGTH);

    egui::Area::new(egui::Id::new("orientation_compass"))
        .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
        .interactable(false)
        .show(ctx, |ui| {
            let (rect, _) =
                ui.allocate_exact_size(egui::vec2(INSET_SIZE, INSET_SIZE), egui::Sense::hover());
            let painter = ui.painter_at(rect);
            let center = rect.center();

            painter.circle_filled(center, INSET_SIZE * 0.5, egui::Color32::from_black_alpha(140));

            // World frame, faint
            for axis in world_axes {
                painter.line_segment(
                    [center, center + axis.offset],
                    egui::Stroke::new(1.0, axis.color.gamma_multiply(0.35)),
                );
            }

            // Vehicle frame
            for axis in body_axes {
                painter.line_segment(
                    [center, center + axis.offset],
                    egui::Stroke::new(2.5, axis.color),
                );
                let label_offset = if axis.offset.length() > 1e-3 {
                    axis.offset.normalized() * 9.0
                } else {
                    egui::Vec2::ZERO
                };
                painter.text(
                    center + axis.offset + label_offset,
                    egui::Align2::CENTER_CENTER,
                    axis.label,
                    egui::FontId::proportional(12.0),
                    axis.color,
                );
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axes_sorted_far_to_near() {
        let camera = Transform::from_xyz(3.0, -4.0, 2.0).looking_at(Vec3::ZERO, Vec3::Z);
        let axes = project_axes(camera.rotation, Quat::IDENTITY, 10.0);
        assert!(axes[0].depth <= axes[1].depth);
        assert!(axes[1].depth <= axes[2].depth);
    }

    #[test]
    fn test_top_down_view() {
        // Looking straight down with +Y up on screen
        let camera = Transform::from_xyz(0.0, 0.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y);
        let axes = project_axes(camera.rotation, Quat::IDENTITY, 10.0);

        let x = axes.iter().find(|a| a.label == "X").unwrap();
        let y = axes.iter().find(|a| a.label == "Y").unwrap();
        let z = axes.iter().find(|a| a.label == "Z").unwrap();

        assert!((x.offset.x - 10.0).abs() < 1e-4 && x.offset.y.abs() < 1e-4);
        // Screen y grows downward
        assert!((y.offset.y + 10.0).abs() < 1e-4);
        // Z points at the viewer
        assert!(z.offset.length() < 1e-4);
        assert!((z.depth - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_body_rotation_applied() {
        let camera = Transform::from_xyz(0.0, 0.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y);
        let body = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let axes = project_axes(camera.rotation, body, 10.0);

        // Body X now points along world +Y
        let x = axes.iter().find(|a| a.label == "X").unwrap();
        assert!((x.offset.y + 10.0).abs() < 1e-4);
        assert!(x.offset.x.abs() < 1e-4);
    }
}
