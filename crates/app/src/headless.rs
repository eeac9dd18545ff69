//! Windowless run: generates the forest, drives the fixed-tick pipeline for a
//! number of ticks with the season calendar, then switches the winter model
//! off so every seasonal override unwinds, and prints the census. With
//! `ARBORIST_STATE` set, saved settings and RNG are loaded before the first
//! tick and written back once the unwind has run.
//!
//! ```text
//! ARBORIST_HEADLESS=1 ARBORIST_TICKS=4000 cargo run -p arborist --release
//! ```

use std::path::Path;
use std::time::Instant;

use bevy::prelude::*;

use simulation::census::VegetationCensus;
use simulation::config::VegetationSettings;
use simulation::safe_unwind::SafeUnwind;
use simulation::season::SeasonSignal;
use simulation::{SimulationPlugin, SlowTickTimer};

use crate::forest_gen::{populate_world, ForestLayout};
use crate::season_cycle::{SeasonCycle, SeasonCyclePlugin};
use crate::session;

pub const HEADLESS_ENV: &str = "ARBORIST_HEADLESS";
pub const TICKS_ENV: &str = "ARBORIST_TICKS";
const DEFAULT_TICKS: u64 = 2000;
const REPORT_EVERY: u64 = 500;

pub fn requested() -> bool {
    std::env::var(HEADLESS_ENV).is_ok_and(|v| v != "0")
}

fn tick_count() -> u64 {
    match std::env::var(TICKS_ENV) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{}={} is not a tick count, using {}", TICKS_ENV, raw, DEFAULT_TICKS);
            DEFAULT_TICKS
        }),
        Err(_) => DEFAULT_TICKS,
    }
}

pub fn build_app(settings: VegetationSettings, layout: ForestLayout) -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, bevy::log::LogPlugin::default()))
        .insert_resource(settings)
        .insert_resource(layout)
        .add_plugins((SimulationPlugin, SeasonCyclePlugin))
        .add_systems(Startup, populate_world);
    app.finish();
    app.cleanup();
    app.world_mut().run_schedule(Startup);
    app
}

fn log_census(world: &World, tick: u64) {
    let season = world.resource::<SeasonSignal>().season;
    let census = world.resource::<VegetationCensus>();
    info!(
        "tick {:>6} {:?}: trees={} plants={} tracked={} forced_dead={} lumber={} no_growth={} stages={:?}",
        tick,
        season,
        census.trees,
        census.plants,
        census.tracked,
        census.forced_dead,
        census.lumber,
        census.no_growth,
        census.by_stage,
    );
}

pub fn run(settings: VegetationSettings) {
    let mut app = build_app(settings, ForestLayout::default());
    let state = session::state_path();
    if let Some(path) = &state {
        session::load_from_file(app.world_mut(), Path::new(path));
    }
    let ticks = tick_count();
    let started = Instant::now();

    for tick in 1..=ticks {
        app.world_mut().run_schedule(FixedUpdate);
        if tick % REPORT_EVERY == 0 {
            log_census(app.world(), tick);
        }
    }

    app.world_mut().resource_mut::<SeasonCycle>().paused = true;
    app.world_mut()
        .resource_mut::<VegetationSettings>()
        .winter_dead_model = false;
    app.world_mut().resource_mut::<SafeUnwind>().arm();

    let mut total = ticks;
    loop {
        app.world_mut().run_schedule(FixedUpdate);
        total += 1;
        if app.world().resource::<SlowTickTimer>().should_run() {
            break;
        }
    }
    if let Some(stats) = app.world().resource::<SafeUnwind>().last_run() {
        info!(
            "Unwind: released {} instances, restored {} stages",
            stats.released, stats.restored
        );
    }

    log_census(app.world(), total);
    if let Some(path) = &state {
        session::save_to_file(app.world(), Path::new(path));
    }
    info!(
        "Headless run finished: {} ticks in {:.2?}",
        total,
        started.elapsed()
    );
}
