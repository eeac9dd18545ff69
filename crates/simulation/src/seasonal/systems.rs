//! ECS systems and plugin for the seasonal state machine.

use std::sync::atomic::{AtomicUsize, Ordering};

use bevy::prelude::*;

use crate::catalog::VegetationCatalog;
use crate::components::{DeciduousTracking, Deleted, Lumber, Tree, Vegetation};
use crate::config::{PassContext, VegetationSettings};
use crate::mutation_queue::MutationQueue;
use crate::season::SeasonSignal;
use crate::simulation_sets::VegetationSet;

use super::transition::{seasonal_step, step_mutations, SeasonalStep};

#[derive(Default)]
struct StepCounters {
    forced: AtomicUsize,
    reverted: AtomicUsize,
    retracked: AtomicUsize,
    released: AtomicUsize,
    missing: AtomicUsize,
}

impl StepCounters {
    fn count(&self, step: SeasonalStep) {
        let counter = match step {
            SeasonalStep::Hold => return,
            SeasonalStep::Force { .. } => &self.forced,
            SeasonalStep::Revert { .. } => &self.reverted,
            SeasonalStep::Retrack { .. } => &self.retracked,
            SeasonalStep::Release { .. } => &self.released,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Runs the state machine over every tracked tree.
///
/// Lumber trees are released before the catalog is consulted. Trees whose
/// prefab is unknown are skipped; trees whose prefab turned out evergreen are
/// left to `release_misclassified_evergreens`.
pub fn advance_seasonal_state(
    settings: Res<VegetationSettings>,
    season: Res<SeasonSignal>,
    catalog: Res<VegetationCatalog>,
    queue: Res<MutationQueue>,
    tracked: Query<(Entity, &Vegetation, &Tree, &DeciduousTracking, Has<Lumber>), Without<Deleted>>,
) {
    if tracked.is_empty() {
        return;
    }
    let ctx = PassContext::capture(&settings, &season);
    let forcing_winter = ctx.forcing_winter();
    let counters = StepCounters::default();

    tracked
        .par_iter()
        .for_each(|(entity, vegetation, tree, tracking, lumber)| {
            if !lumber {
                match catalog.tree_evergreen(vegetation.prefab) {
                    Some(false) => {}
                    Some(true) => return,
                    None => {
                        counters.missing.fetch_add(1, Ordering::Relaxed);
                        return;
                    }
                }
            }
            let step = seasonal_step(tree.state, *tracking, lumber, forcing_winter);
            counters.count(step);
            queue.extend(step_mutations(entity, *tree, step));
        });

    let missing = counters.missing.into_inner();
    if missing > 0 {
        warn!(
            "Seasonal: skipped {} tracked trees without a tree catalog entry",
            missing
        );
    }
    let forced = counters.forced.into_inner();
    let reverted = counters.reverted.into_inner();
    let retracked = counters.retracked.into_inner();
    let released = counters.released.into_inner();
    if forced + reverted + retracked + released > 0 {
        debug!(
            "Seasonal ({}): forced={} reverted={} retracked={} released={}",
            ctx.season.name(),
            forced,
            reverted,
            retracked,
            released
        );
    }
}

/// Drops tracking from trees whose prefab is evergreen. The forced death is
/// undone first; classification tags them `Evergreen` on a later pass.
pub fn release_misclassified_evergreens(
    catalog: Res<VegetationCatalog>,
    queue: Res<MutationQueue>,
    tracked: Query<(Entity, &Vegetation, &Tree, &DeciduousTracking), (Without<Lumber>, Without<Deleted>)>,
) {
    let released = AtomicUsize::new(0);
    tracked
        .par_iter()
        .for_each(|(entity, vegetation, tree, tracking)| {
            if catalog.tree_evergreen(vegetation.prefab) != Some(true) {
                return;
            }
            let step = SeasonalStep::Release {
                restore: tracking
                    .is_forced_dead(tree.state)
                    .then_some(tracking.previous_state),
            };
            released.fetch_add(1, Ordering::Relaxed);
            queue.extend(step_mutations(entity, *tree, step));
        });

    let released = released.into_inner();
    if released > 0 {
        warn!(
            "Seasonal: released {} evergreen trees that carried deciduous tracking",
            released
        );
    }
}

pub struct SeasonalPlugin;

impl Plugin for SeasonalPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (release_misclassified_evergreens, advance_seasonal_state)
                .in_set(VegetationSet::Seasonal),
        );
    }
}
