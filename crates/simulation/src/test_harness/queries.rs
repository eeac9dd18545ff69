//! Query and simulation-tick methods for `TestForest`.

use bevy::prelude::*;

use crate::batch_mutation::{BatchMutationLog, BatchMutationReport, OverlayCircle};
use crate::census::{CensusRow, VegetationCensus};
use crate::components::{
    DeciduousTracking, Deleted, Evergreen, Lumber, NoGrowth, Plant, Tree, Vegetation,
};
use crate::config::CLASSIFICATION_SLICES;
use crate::mutation_queue::MutationQueue;
use crate::SlowTickTimer;

use super::TestForest;

impl TestForest {
    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run N fixed-update ticks by directly executing the `FixedUpdate`
    /// schedule, bypassing Bevy's time system.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
        }
    }

    /// Run one full round of classification slices.
    pub fn classify_all(&mut self) {
        self.tick(CLASSIFICATION_SLICES);
    }

    /// Run until the SlowTickTimer fires at least once.
    pub fn tick_slow_cycle(&mut self) {
        self.tick(SlowTickTimer::INTERVAL);
    }

    /// Run one frame of the main schedule (Update-phase systems).
    pub fn frame(&mut self) {
        self.app.update();
    }

    // -----------------------------------------------------------------------
    // Queries (note: Bevy's World::query() requires &mut World)
    // -----------------------------------------------------------------------

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn world(&self) -> &World {
        self.app.world()
    }

    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    pub fn tree(&self, entity: Entity) -> Option<Tree> {
        self.app.world().get::<Tree>(entity).copied()
    }

    pub fn tracking(&self, entity: Entity) -> Option<DeciduousTracking> {
        self.app.world().get::<DeciduousTracking>(entity).copied()
    }

    pub fn lumber(&self, entity: Entity) -> Option<Lumber> {
        self.app.world().get::<Lumber>(entity).copied()
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.app.world().get::<T>(entity).is_some()
    }

    pub fn count_with<T: Component>(&mut self) -> usize {
        self.app
            .world_mut()
            .query_filtered::<Entity, With<T>>()
            .iter(self.app.world())
            .count()
    }

    /// Census of the current population, computed on demand.
    pub fn census(&mut self) -> VegetationCensus {
        let mut census = VegetationCensus::default();
        let mut query = self.app.world_mut().query_filtered::<(
            Option<&Tree>,
            Has<Plant>,
            Has<Evergreen>,
            Option<&DeciduousTracking>,
            Has<Lumber>,
            Has<NoGrowth>,
        ), (With<Vegetation>, Without<Deleted>)>();
        for (tree, plant, evergreen, tracking, lumber, no_growth) in query.iter(self.app.world()) {
            census.record(CensusRow {
                tree: tree.copied(),
                plant,
                evergreen,
                tracking: tracking.copied(),
                lumber,
                no_growth,
            });
        }
        census
    }

    pub fn last_batch_report(&self) -> Option<BatchMutationReport> {
        self.resource::<BatchMutationLog>().last.clone()
    }

    /// Mutations applied by every flush so far.
    pub fn applied_mutations(&self) -> u64 {
        self.resource::<MutationQueue>().totals().applied
    }

    /// Overlay circles emitted so far.
    pub fn overlay_circles(&self) -> Vec<OverlayCircle> {
        let events = self.app.world().resource::<Events<OverlayCircle>>();
        let mut cursor = events.get_cursor();
        cursor.read(events).copied().collect()
    }
}
