use std::time::Duration;

use bevy::prelude::*;
use bevy::render::view::screenshot::{save_to_disk, Screenshot};
use bevy::time::common_conditions::on_timer;
use bevy::window::PresentMode;
use bevy::winit::{UpdateMode, WinitSettings};

use rendering::camera::OrbitCamera;
use rendering::tool_input::AgeBrush;
use simulation::census::VegetationCensus;
use simulation::season::SeasonSignal;
use simulation::SimulationUpdateSet;

mod forest_gen;
mod headless;
mod season_cycle;
mod session;
mod settings_file;

use forest_gen::{populate_world, prefabs, ForestLayout};
use season_cycle::SeasonCyclePlugin;

/// Fixed simulation rate. Slow-tick bookkeeping assumes 10Hz.
const TICK_HZ: f64 = 10.0;

fn main() {
    let settings = settings_file::settings_from_env();

    if headless::requested() {
        headless::run(settings);
        return;
    }

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Arborist".to_string(),
            resolution: (1280.0, 720.0).into(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }),
        ..default()
    }))
    .insert_resource(WinitSettings {
        focused_mode: UpdateMode::reactive_low_power(Duration::from_millis(16)),
        unfocused_mode: UpdateMode::reactive_low_power(Duration::from_millis(100)),
    })
    .insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
    .insert_resource(settings)
    .init_resource::<ForestLayout>()
    .add_plugins((
        simulation::SimulationPlugin,
        rendering::RenderingPlugin,
        SeasonCyclePlugin,
    ))
    .add_systems(
        Startup,
        (populate_world, session::load_session, fill_brush_palette),
    )
    .add_systems(
        Update,
        (
            season_cycle::season_hotkeys.in_set(SimulationUpdateSet::Input),
            log_census.run_if(on_timer(Duration::from_secs(10))),
        ),
    );

    // Screenshot mode: takes preset screenshots and exits
    if std::env::var("ARBORIST_SCREENSHOTS").is_ok() {
        let layout = ForestLayout::default();
        let harvest = Vec3::new(layout.half_extent * 0.5, 0.0, 0.0);

        app.insert_resource(ScreenshotQueue {
            frame: 0,
            current: 0,
            presets: vec![
                ShotPreset { name: "01_overview", focus: Vec3::ZERO, yaw: 0.0, pitch: 60f32.to_radians(), distance: 900.0 },
                ShotPreset { name: "02_harvest_area", focus: harvest, yaw: 0.4, pitch: 40f32.to_radians(), distance: 200.0 },
                ShotPreset { name: "03_stand_close", focus: Vec3::new(-60.0, 0.0, 40.0), yaw: -0.3, pitch: 28f32.to_radians(), distance: 90.0 },
            ],
        });
        app.add_systems(Update, drive_screenshots);
    }

    app.run();
}

fn fill_brush_palette(mut brush: ResMut<AgeBrush>) {
    brush.palette = vec![prefabs::OAK, prefabs::MAPLE, prefabs::BIRCH];
}

fn log_census(census: Res<VegetationCensus>, season: Res<SeasonSignal>) {
    info!(
        "{:?}: trees={} plants={} forced_dead={} lumber={} no_growth={}",
        season.season,
        census.trees,
        census.plants,
        census.forced_dead,
        census.lumber,
        census.no_growth,
    );
}

#[derive(Resource)]
struct ScreenshotQueue {
    frame: u32,
    current: usize,
    presets: Vec<ShotPreset>,
}

struct ShotPreset {
    name: &'static str,
    focus: Vec3,
    yaw: f32,
    pitch: f32,
    distance: f32,
}

fn drive_screenshots(
    mut commands: Commands,
    mut queue: ResMut<ScreenshotQueue>,
    mut orbit: ResMut<OrbitCamera>,
    mut exit: EventWriter<AppExit>,
) {
    queue.frame += 1;

    // Wait for the forest meshes to be attached
    if queue.frame < 120 {
        return;
    }

    let idx = queue.current;
    if idx >= queue.presets.len() {
        if queue.frame > 120 + queue.presets.len() as u32 * 12 + 20 {
            exit.send(AppExit::Success);
        }
        return;
    }

    let phase = (queue.frame - 120) % 12;

    if phase == 0 {
        let p = &queue.presets[idx];
        orbit.focus = p.focus;
        orbit.yaw = p.yaw;
        orbit.pitch = p.pitch;
        orbit.distance = p.distance;
    } else if phase == 6 {
        // Six frames for the render to settle
        let name = queue.presets[idx].name;
        let path = format!("/tmp/arborist_{}.png", name);
        commands
            .spawn(Screenshot::primary_window())
            .observe(save_to_disk(path));
        queue.current += 1;
    }
}
