//! Gizmo overlays: the batch tool's radius preview and per-instance markers
//! for lumber and freshly mutated instances.

use bevy::prelude::*;

use simulation::batch_mutation::OverlayCircle;
use simulation::components::{Lumber, NoGrowth, RecentlyChanged, Vegetation};

const PREVIEW_COLOR: Color = Color::srgba(1.0, 0.85, 0.2, 0.8);
const LUMBER_COLOR: Color = Color::srgba(0.75, 0.45, 0.15, 0.7);
const CHANGED_COLOR: Color = Color::srgba(0.3, 0.8, 1.0, 0.9);
const DORMANT_COLOR: Color = Color::srgba(0.6, 0.6, 0.7, 0.4);

/// Toggles for the per-instance markers.
#[derive(Resource, Debug, Clone, Copy)]
pub struct OverlayToggles {
    pub lumber: bool,
    pub dormant: bool,
}

impl Default for OverlayToggles {
    fn default() -> Self {
        Self {
            lumber: true,
            dormant: false,
        }
    }
}

fn ground_circle(gizmos: &mut Gizmos, center: Vec3, radius: f32, color: Color) {
    gizmos.circle(
        Isometry3d::new(
            Vec3::new(center.x, 0.3, center.z),
            Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
        ),
        radius,
        color,
    );
}

pub fn draw_overlay_circles(mut circles: EventReader<OverlayCircle>, mut gizmos: Gizmos) {
    for circle in circles.read() {
        ground_circle(&mut gizmos, circle.center, circle.radius, PREVIEW_COLOR);
    }
}

#[allow(clippy::type_complexity)]
pub fn draw_instance_markers(
    toggles: Res<OverlayToggles>,
    mut gizmos: Gizmos,
    marked: Query<
        (&Transform, Has<Lumber>, Has<RecentlyChanged>, Has<NoGrowth>),
        (
            With<Vegetation>,
            Or<(With<Lumber>, With<RecentlyChanged>, With<NoGrowth>)>,
        ),
    >,
) {
    for (transform, lumber, recently_changed, dormant) in &marked {
        let pos = transform.translation;
        if recently_changed {
            ground_circle(&mut gizmos, pos, 3.5, CHANGED_COLOR);
        }
        if lumber && toggles.lumber {
            ground_circle(&mut gizmos, pos, 2.5, LUMBER_COLOR);
        }
        if dormant && toggles.dormant {
            ground_circle(&mut gizmos, pos, 1.5, DORMANT_COLOR);
        }
    }
}

pub fn toggle_overlays(keys: Res<ButtonInput<KeyCode>>, mut toggles: ResMut<OverlayToggles>) {
    if keys.just_pressed(KeyCode::KeyO) {
        toggles.lumber = !toggles.lumber;
    }
    if keys.just_pressed(KeyCode::KeyG) {
        toggles.dormant = !toggles.dormant;
    }
}
