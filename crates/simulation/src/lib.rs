use bevy::prelude::*;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

pub mod batch_mutation;
pub mod catalog;
pub mod census;
pub mod classification;
pub mod components;
pub mod config;
pub mod growth_gate;
pub mod lumber;
pub mod mutation_queue;
pub mod safe_unwind;
pub mod season;
pub mod seasonal;
pub mod sim_rng;
pub mod simulation_sets;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use simulation_sets::{SimulationSet, SimulationUpdateSet, VegetationSet};

// ---------------------------------------------------------------------------
// Session persistence
// ---------------------------------------------------------------------------

/// A resource carried in the session file as one keyed byte blob.
///
/// The app owns the file; this crate only produces and consumes the blobs.
pub trait Saveable: Resource + Default + Send + Sync + 'static {
    /// Key in the session map. Never rename a shipped key.
    const SAVE_KEY: &'static str;

    /// `None` leaves the key out of the map, e.g. for a default value.
    fn save_to_bytes(&self) -> Option<Vec<u8>>;

    fn load_from_bytes(bytes: &[u8]) -> Self;
}

/// `bitcode::decode`, or `T::default()` with a warning.
pub fn decode_or_warn<T: bitcode::DecodeOwned + Default>(key: &str, bytes: &[u8]) -> T {
    bitcode::decode(bytes).unwrap_or_else(|e| {
        warn!(
            "Saveable {}: {} bytes do not decode, using default: {}",
            key,
            bytes.len(),
            e
        );
        T::default()
    })
}

fn save_resource<T: Saveable>(world: &World) -> Option<Vec<u8>> {
    world.get_resource::<T>()?.save_to_bytes()
}

fn load_resource<T: Saveable>(world: &mut World, bytes: &[u8]) {
    world.insert_resource(T::load_from_bytes(bytes));
}

struct Persisted {
    save: fn(&World) -> Option<Vec<u8>>,
    load: fn(&mut World, &[u8]),
}

/// Outcome of [`SaveableRegistry::load_all`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub restored: Vec<&'static str>,
    /// Keys in the map that no registered resource claims.
    pub unknown: Vec<String>,
}

/// Every `Saveable` resource, keyed by `SAVE_KEY`. Filled during plugin
/// build.
#[derive(Resource, Default)]
pub struct SaveableRegistry {
    entries: BTreeMap<&'static str, Persisted>,
}

impl SaveableRegistry {
    /// A second registration under the same key is ignored with a warning.
    pub fn register<T: Saveable>(&mut self) {
        match self.entries.entry(T::SAVE_KEY) {
            Entry::Occupied(_) => warn!(
                "SaveableRegistry: duplicate key '{}', ignoring second registration",
                T::SAVE_KEY
            ),
            Entry::Vacant(slot) => {
                slot.insert(Persisted {
                    save: save_resource::<T>,
                    load: load_resource::<T>,
                });
            }
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn save_all(&self, world: &World) -> BTreeMap<String, Vec<u8>> {
        self.entries
            .iter()
            .filter_map(|(key, entry)| (entry.save)(world).map(|bytes| (key.to_string(), bytes)))
            .collect()
    }

    /// Registered resources missing from `extensions` keep their current
    /// value.
    pub fn load_all(&self, world: &mut World, extensions: &BTreeMap<String, Vec<u8>>) -> LoadReport {
        let mut report = LoadReport::default();
        for (key, bytes) in extensions {
            match self.entries.get_key_value(key.as_str()) {
                Some((key, entry)) => {
                    (entry.load)(world, bytes);
                    report.restored.push(*key);
                }
                None => report.unknown.push(key.clone()),
            }
        }
        if !report.unknown.is_empty() {
            warn!("SaveableRegistry: ignoring unknown keys {:?}", report.unknown);
        }
        report
    }
}

// ---------------------------------------------------------------------------
// Core resources
// ---------------------------------------------------------------------------

/// Global tick counter incremented each FixedUpdate. Classification uses it
/// to pick the round-robin slice for the current tick.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

/// Shared throttle timer for population-wide bookkeeping that does not need
/// to run every tick (aging, census).
#[derive(Resource, Default)]
pub struct SlowTickTimer {
    pub counter: u32,
}

impl SlowTickTimer {
    pub const INTERVAL: u32 = 100; // run slow systems every 100 ticks (~10 seconds at 10Hz)

    pub fn tick(&mut self) {
        self.counter += 1;
    }

    pub fn should_run(&self) -> bool {
        self.counter.is_multiple_of(Self::INTERVAL)
    }
}

pub fn tick_counters(mut timer: ResMut<SlowTickTimer>, mut tick: ResMut<TickCounter>) {
    timer.tick();
    tick.0 = tick.0.wrapping_add(1);
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TickCounter>()
            .init_resource::<SlowTickTimer>()
            .init_resource::<SaveableRegistry>()
            .add_plugins(simulation_sets::SimulationSetsPlugin)
            .add_systems(
                FixedUpdate,
                tick_counters.in_set(SimulationSet::PreSim),
            );

        // Shared infrastructure
        app.add_plugins((
            config::ConfigPlugin,
            sim_rng::SimRngPlugin,
            season::SeasonPlugin,
            catalog::CatalogPlugin,
            mutation_queue::MutationQueuePlugin,
        ));

        // Per-tick pipeline, in stage order
        app.add_plugins((
            lumber::LumberPlugin,
            classification::ClassificationPlugin,
            seasonal::SeasonalPlugin,
            growth_gate::GrowthGatePlugin,
            safe_unwind::SafeUnwindPlugin,
            batch_mutation::BatchMutationPlugin,
            census::CensusPlugin,
        ));
    }
}
