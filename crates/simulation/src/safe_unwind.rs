//! Safe-unwind: strips every seasonal override and restores true life
//! stages.
//!
//! Disabled until armed. Armed explicitly by the tool layer (before a save
//! or shutdown boundary) or automatically when the winter dead model is
//! switched off. Disarms itself before scanning, so it runs exactly once per
//! arming. Afterwards no instance carries `DeciduousTracking` and none shows a
//! forced death.

use std::sync::atomic::{AtomicUsize, Ordering};

use bevy::prelude::*;

use crate::components::{DeciduousTracking, Tree};
use crate::config::VegetationSettings;
use crate::mutation_queue::{MutationQueue, Tag, VegetationMutation};
use crate::simulation_sets::VegetationSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnwindStats {
    pub released: usize,
    pub restored: usize,
}

#[derive(Resource, Debug, Default)]
pub struct SafeUnwind {
    armed: bool,
    last_run: Option<UnwindStats>,
}

impl SafeUnwind {
    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn last_run(&self) -> Option<UnwindStats> {
        self.last_run
    }

    fn disarm(&mut self) -> bool {
        std::mem::take(&mut self.armed)
    }
}

/// Mutations that release one tracked instance.
pub fn unwind_mutations(
    entity: Entity,
    tree: Option<Tree>,
    tracking: DeciduousTracking,
) -> Vec<VegetationMutation> {
    let mut mutations = Vec::with_capacity(3);
    if let Some(tree) = tree {
        if tracking.is_forced_dead(tree.state) {
            mutations.push(VegetationMutation::SetTree {
                entity,
                tree: Tree {
                    state: tracking.previous_state,
                    growth: tree.growth,
                },
            });
        }
    }
    mutations.push(VegetationMutation::Untrack { entity });
    mutations.push(VegetationMutation::AddTag {
        entity,
        tag: Tag::Updated,
    });
    mutations
}

/// Arms the pass when the winter dead model goes from on to off.
pub fn arm_on_winter_model_disabled(
    settings: Res<VegetationSettings>,
    mut unwind: ResMut<SafeUnwind>,
    mut last: Local<Option<bool>>,
) {
    let enabled = settings.winter_dead_model;
    if *last == Some(true) && !enabled {
        info!("SafeUnwind: winter dead model disabled, arming");
        unwind.arm();
    }
    *last = Some(enabled);
}

pub fn run_safe_unwind(
    mut unwind: ResMut<SafeUnwind>,
    queue: Res<MutationQueue>,
    tracked: Query<(Entity, Option<&Tree>, &DeciduousTracking)>,
) {
    if !unwind.disarm() {
        return;
    }

    let released = AtomicUsize::new(0);
    let restored = AtomicUsize::new(0);
    tracked.par_iter().for_each(|(entity, tree, tracking)| {
        if tree.is_some_and(|t| tracking.is_forced_dead(t.state)) {
            restored.fetch_add(1, Ordering::Relaxed);
        }
        released.fetch_add(1, Ordering::Relaxed);
        queue.extend(unwind_mutations(entity, tree.copied(), *tracking));
    });

    let stats = UnwindStats {
        released: released.into_inner(),
        restored: restored.into_inner(),
    };
    info!(
        "SafeUnwind: released {} tracked trees, restored {} forced deaths",
        stats.released, stats.restored
    );
    unwind.last_run = Some(stats);
}

pub struct SafeUnwindPlugin;

impl Plugin for SafeUnwindPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SafeUnwind>().add_systems(
            FixedUpdate,
            (arm_on_winter_model_disabled, run_safe_unwind)
                .chain()
                .in_set(VegetationSet::Unwind),
        );
    }
}
