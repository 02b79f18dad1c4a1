//! Scene setup - lights and the reference axes

use bevy::prelude::*;

use crate::types::SceneSettings;

/// Marker for world axis lines
#[derive(Component)]
pub struct WorldAxis;

/// Marker for the small spheres spaced along the axes
#[derive(Component)]
pub struct AxisTab;

/// Plugin for scene setup
pub struct SceneSetupPlugin;

impl Plugin for SceneSetupPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup_lights, setup_axes));
    }
}

fn setup_lights(mut commands: Commands, settings: Res<SceneSettings>) {
    // Dim grey ambient (0x333333)
    commands.insert_resource(AmbientLight {
        color: Color::srgb_u8(0x33, 0x33, 0x33),
        brightness: 400.0,
        ..default()
    });

    // Point light at (500, 500, 500) mm, scaled with the scene unit
    let offset = 0.5 * settings.unit.per_meter() as f32;
    commands.spawn((
        PointLight {
            intensity: 4.0e6 * offset * offset,
            range: settings.far_plane(),
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(offset, offset, offset),
    ));
}

/// Rotation that turns a Y-aligned primitive onto `axis`
fn align_y_to(axis: Vec3) -> Quat {
    Quat::from_rotation_arc(Vec3::Y, axis)
}

fn setup_axes(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<SceneSettings>,
) {
    let extent = settings.axis_extent;
    let line = meshes.add(Cylinder::new(settings.axis_thickness(), extent * 2.0));
    let tab = meshes.add(Sphere::new(settings.axis_tab_radius));
    let tab_positions = settings.tab_positions();

    let axes = [
        (Vec3::X, Color::srgb(0.9, 0.2, 0.2)),
        (Vec3::Y, Color::srgb(0.2, 0.9, 0.2)),
        (Vec3::Z, Color::srgb(0.2, 0.2, 0.9)),
    ];

    for (axis, color) in axes {
        let material = materials.add(StandardMaterial {
            base_color: color,
            unlit: true,
            ..default()
        });

        // One line through the origin covers both half-axes
        commands.spawn((
            Mesh3d(line.clone()),
            MeshMaterial3d(material.clone()),
            Transform::from_rotation(align_y_to(axis)),
            WorldAxis,
        ));

        for distance in &tab_positions {
            for sign in [1.0, -1.0] {
                commands.spawn((
                    Mesh3d(tab.clone()),
                    MeshMaterial3d(material.clone()),
                    Transform::from_translation(axis * *distance * sign),
                    AxisTab,
                ));
            }
        }
    }

    tracing::debug!(
        tabs = tab_positions.len() * 6,
        extent,
        "Reference axes spawned"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_y_to_axes() {
        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            let rotated = align_y_to(axis) * Vec3::Y;
            assert!(rotated.abs_diff_eq(axis, 1e-6));
        }
    }
}
