//! Deterministic simulation ordering via `SystemSet` phases.
//!
//! # FixedUpdate phases (`SimulationSet`)
//!
//! ```text
//! PreSim  →  Simulation  →  PostSim
//! ```
//!
//! * **PreSim** – Tick counters and season bookkeeping.
//! * **Simulation** – The vegetation pipeline (`VegetationSet`).
//! * **PostSim** – Read-only aggregation (census).
//!
//! # Vegetation pipeline (`VegetationSet`)
//!
//! ```text
//! Refresh → Aging → Lumber → Classify → Seasonal → Growth → Unwind → BatchMutation
//! ```
//!
//! Every stage ends with its own flush of the `MutationQueue`, so a stage
//! always observes the structural changes of the stages before it. Within a
//! stage, systems only enqueue; nothing is written to the population while a
//! scan is in flight.
//!
//! # Update phases (`SimulationUpdateSet`)
//!
//! ```text
//! Input  →  Visual
//! ```

use bevy::prelude::*;

/// Ordered phases for systems running in the `FixedUpdate` schedule.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    PreSim,
    Simulation,
    PostSim,
}

/// Stages of the per-tick vegetation pipeline, all inside
/// `SimulationSet::Simulation`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VegetationSet {
    /// Clears last tick's refresh markers.
    Refresh,
    /// Background aging of trees without `NoGrowth`.
    Aging,
    /// One-shot lumber reconciliation (when armed).
    Lumber,
    /// Evergreen / deciduous tagging and catalog footprint bookkeeping.
    Classify,
    /// Winter forcing and reversion.
    Seasonal,
    /// `NoGrowth` marker control.
    Growth,
    /// One-shot removal of every seasonal override (when armed).
    Unwind,
    /// Tool-driven batch mutations.
    BatchMutation,
}

impl VegetationSet {
    pub const ORDER: [VegetationSet; 8] = [
        VegetationSet::Refresh,
        VegetationSet::Aging,
        VegetationSet::Lumber,
        VegetationSet::Classify,
        VegetationSet::Seasonal,
        VegetationSet::Growth,
        VegetationSet::Unwind,
        VegetationSet::BatchMutation,
    ];
}

/// Ordered phases for systems running in the `Update` schedule.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationUpdateSet {
    /// Per-frame input from the tool layer.
    Input,
    /// Visual-only output that never touches simulation state.
    Visual,
}

pub struct SimulationSetsPlugin;

impl Plugin for SimulationSetsPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::PreSim,
                SimulationSet::Simulation,
                SimulationSet::PostSim,
            )
                .chain(),
        )
        .configure_sets(
            FixedUpdate,
            (
                VegetationSet::Refresh,
                VegetationSet::Aging,
                VegetationSet::Lumber,
                VegetationSet::Classify,
                VegetationSet::Seasonal,
                VegetationSet::Growth,
                VegetationSet::Unwind,
                VegetationSet::BatchMutation,
            )
                .chain()
                .in_set(SimulationSet::Simulation),
        )
        .configure_sets(
            Update,
            (SimulationUpdateSet::Input, SimulationUpdateSet::Visual).chain(),
        );
    }
}
