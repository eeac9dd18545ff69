use bevy::prelude::*;

use simulation::batch_mutation::emit_radius_preview;
use simulation::SimulationUpdateSet;

pub mod camera;
pub mod tool_input;
pub mod vegetation_overlay;
pub mod vegetation_render;

use camera::{CameraDrag, CameraOrbitDrag, CursorGround, LeftClickDrag};
use tool_input::AgeBrush;
use vegetation_overlay::OverlayToggles;

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraDrag>()
            .init_resource::<CameraOrbitDrag>()
            .init_resource::<LeftClickDrag>()
            .init_resource::<CursorGround>()
            .init_resource::<AgeBrush>()
            .init_resource::<OverlayToggles>()
            .add_systems(
                Startup,
                (
                    camera::setup_camera,
                    setup_lighting,
                    spawn_ground,
                    vegetation_render::setup_vegetation_assets,
                ),
            );

        // Camera controls
        app.add_systems(
            Update,
            (
                camera::camera_pan_keyboard,
                camera::camera_pan_drag,
                camera::camera_left_drag,
                camera::camera_orbit_drag,
                camera::camera_zoom,
                camera::apply_orbit_camera,
            )
                .before(SimulationUpdateSet::Input),
        );

        // Tool input
        app.add_systems(
            Update,
            (
                camera::update_cursor_ground,
                tool_input::update_age_brush,
                tool_input::update_radius_preview,
                tool_input::handle_vegetation_tools,
                vegetation_overlay::toggle_overlays,
            )
                .chain()
                .in_set(SimulationUpdateSet::Input),
        );

        // Visuals
        app.add_systems(
            Update,
            (
                vegetation_render::attach_vegetation_visuals,
                vegetation_render::refresh_vegetation_visuals,
                vegetation_overlay::draw_overlay_circles.after(emit_radius_preview),
                vegetation_overlay::draw_instance_markers,
            )
                .in_set(SimulationUpdateSet::Visual),
        );
    }
}

fn setup_lighting(mut commands: Commands) {
    // Ambient light for baseline illumination
    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.9, 0.9, 1.0),
        brightness: 300.0,
    });

    // Directional light (sun) angled from above
    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::XYZ,
            -std::f32::consts::FRAC_PI_4, // 45 degrees down
            std::f32::consts::FRAC_PI_6,  // slight rotation
            0.0,
        )),
    ));
}

fn spawn_ground(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(4000.0, 4000.0))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.32, 0.40, 0.22),
            perceptual_roughness: 1.0,
            ..default()
        })),
        Transform::default(),
    ));
}
