//! # TestForest: headless integration test harness
//!
//! Wraps `bevy::app::App` + `SimulationPlugin` so the vegetation pipeline
//! can be driven tick by tick without a window or renderer.

mod assertions;
mod queries;
mod setup;
mod spawning;

use bevy::app::App;
use bevy::prelude::*;

use crate::catalog::{CatalogEntry, PrefabId, VegetationCatalog};
use crate::config::VegetationSettings;
use crate::SimulationPlugin;

/// Prefabs registered by `TestForest::new()`.
pub mod prefabs {
    use crate::catalog::PrefabId;

    /// Deciduous tree with stump geometry.
    pub const OAK: PrefabId = PrefabId(1);
    /// Deciduous tree without stump geometry.
    pub const BIRCH: PrefabId = PrefabId(2);
    /// Evergreen tree.
    pub const PINE: PrefabId = PrefabId(3);
    /// Static plant.
    pub const FERN: PrefabId = PrefabId(4);
    /// Never registered in the catalog.
    pub const UNKNOWN: PrefabId = PrefabId(999);
}

/// A headless Bevy App wrapping `SimulationPlugin` for integration testing.
///
/// Use builder methods to set up the forest, then call `tick()` to advance
/// the simulation and query/assert on the resulting ECS state.
pub struct TestForest {
    app: App,
}

impl TestForest {
    /// Create an empty forest with the standard test catalog.
    ///
    /// Background aging is switched off (`aging_step = 0`) so long-running
    /// tests see stable life stages; use `with_aging_step` to enable it.
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(SimulationPlugin);

        app.insert_resource(VegetationSettings {
            aging_step: 0,
            ..Default::default()
        });

        {
            let mut catalog = app.world_mut().resource_mut::<VegetationCatalog>();
            catalog.insert(prefabs::OAK, CatalogEntry::tree("oak", false, 8));
            catalog.insert(prefabs::BIRCH, CatalogEntry::tree("birch", false, 3));
            catalog.insert(prefabs::PINE, CatalogEntry::tree("pine", true, 6));
            catalog.insert(prefabs::FERN, CatalogEntry::plant("fern"));
        }

        // Run one update so any Startup systems execute.
        app.update();

        Self { app }
    }

    pub fn with_catalog_entry(mut self, id: PrefabId, entry: CatalogEntry) -> Self {
        self.app
            .world_mut()
            .resource_mut::<VegetationCatalog>()
            .insert(id, entry);
        self
    }
}

impl Default for TestForest {
    fn default() -> Self {
        Self::new()
    }
}
