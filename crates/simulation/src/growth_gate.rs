//! Growth gate: controls the `NoGrowth` marker on every tree.
//!
//! Exactly one rule applies to a tree, by fixed priority:
//!
//! 1. `Lumber` present → grows (`NoGrowth` absent).
//! 2. Global "disable all growth" → frozen.
//! 3. Winter forcing in effect and the tree is deciduous-tracked → frozen.
//! 4. Otherwise → grows.
//!
//! Every rule is its own parallel scan over a filtered view. The views are
//! pairwise disjoint by their membership predicate (query filters plus the
//! tick's `PassContext`), so the resulting marker state does not depend on
//! the order the scans run in. Scans only visit trees whose marker is wrong.
//!
//! This module also hosts the background aging that the gate controls.

use std::sync::atomic::{AtomicUsize, Ordering};

use bevy::ecs::query::QueryFilter;
use bevy::prelude::*;

use crate::components::{DeciduousTracking, Deleted, Lumber, NoGrowth, Temporary, Tree};
use crate::config::{PassContext, VegetationSettings};
use crate::mutation_queue::{MutationQueue, Tag, VegetationMutation};
use crate::season::SeasonSignal;
use crate::simulation_sets::VegetationSet;
use crate::SlowTickTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthRule {
    LumberGrows,
    GlobalFreeze,
    WinterDormant,
    Default,
}

impl GrowthRule {
    pub fn wants_no_growth(self) -> bool {
        matches!(self, GrowthRule::GlobalFreeze | GrowthRule::WinterDormant)
    }
}

/// The single rule that applies to a tree.
pub fn growth_rule(lumber: bool, tracked: bool, ctx: &PassContext) -> GrowthRule {
    if lumber {
        GrowthRule::LumberGrows
    } else if ctx.disable_all_growth {
        GrowthRule::GlobalFreeze
    } else if ctx.forcing_winter() && tracked {
        GrowthRule::WinterDormant
    } else {
        GrowthRule::Default
    }
}

type LumberView = (With<Tree>, With<Lumber>, With<NoGrowth>, Without<Deleted>);
type FreezeView = (With<Tree>, Without<Lumber>, Without<NoGrowth>, Without<Deleted>);
type DormantView = (
    With<Tree>,
    Without<Lumber>,
    With<DeciduousTracking>,
    Without<NoGrowth>,
    Without<Deleted>,
);
type UntrackedDefaultView = (
    With<Tree>,
    Without<Lumber>,
    Without<DeciduousTracking>,
    With<NoGrowth>,
    Without<Deleted>,
);
type TrackedDefaultView = (
    With<Tree>,
    Without<Lumber>,
    With<DeciduousTracking>,
    With<NoGrowth>,
    Without<Deleted>,
);

/// Enqueues the marker change for every entity in `view`.
fn gate_view<F: QueryFilter>(view: &Query<Entity, F>, queue: &MutationQueue, freeze: bool) -> usize {
    let changed = AtomicUsize::new(0);
    view.par_iter().for_each(|entity| {
        let mutation = if freeze {
            VegetationMutation::AddTag {
                entity,
                tag: Tag::NoGrowth,
            }
        } else {
            VegetationMutation::RemoveTag {
                entity,
                tag: Tag::NoGrowth,
            }
        };
        queue.push(mutation);
        changed.fetch_add(1, Ordering::Relaxed);
    });
    changed.into_inner()
}

/// Rule 1: lumber trees always grow.
pub fn gate_lumber_growth(queue: Res<MutationQueue>, view: Query<Entity, LumberView>) {
    gate_view(&view, &queue, false);
}

/// Rule 2: the global switch freezes every non-lumber tree.
pub fn gate_global_freeze(
    settings: Res<VegetationSettings>,
    season: Res<SeasonSignal>,
    queue: Res<MutationQueue>,
    view: Query<Entity, FreezeView>,
) {
    let ctx = PassContext::capture(&settings, &season);
    if !ctx.disable_all_growth {
        return;
    }
    let frozen = gate_view(&view, &queue, true);
    if frozen > 0 {
        debug!("GrowthGate: global freeze applied to {} trees", frozen);
    }
}

/// Rule 3: tracked trees are dormant while winter forcing is in effect.
pub fn gate_winter_dormancy(
    settings: Res<VegetationSettings>,
    season: Res<SeasonSignal>,
    queue: Res<MutationQueue>,
    view: Query<Entity, DormantView>,
) {
    let ctx = PassContext::capture(&settings, &season);
    if ctx.disable_all_growth || !ctx.forcing_winter() {
        return;
    }
    gate_view(&view, &queue, true);
}

/// Rule 4: everything else grows.
pub fn gate_default_growth(
    settings: Res<VegetationSettings>,
    season: Res<SeasonSignal>,
    queue: Res<MutationQueue>,
    untracked: Query<Entity, UntrackedDefaultView>,
    tracked: Query<Entity, TrackedDefaultView>,
) {
    let ctx = PassContext::capture(&settings, &season);
    if ctx.disable_all_growth {
        return;
    }
    let mut released = gate_view(&untracked, &queue, false);
    if !ctx.forcing_winter() {
        released += gate_view(&tracked, &queue, false);
    }
    if released > 0 {
        debug!("GrowthGate: growth resumed for {} trees", released);
    }
}

/// Tree record after one aging step, or `None` when it does not age.
pub fn aged(tree: Tree, step: u8) -> Option<Tree> {
    if step == 0 {
        return None;
    }
    let next = tree.state.next()?;
    let total = tree.growth as u16 + step as u16;
    Some(if total > u8::MAX as u16 {
        Tree {
            state: next,
            growth: (total - (u8::MAX as u16 + 1)) as u8,
        }
    } else {
        Tree {
            state: tree.state,
            growth: total as u8,
        }
    })
}

/// Background aging of every tree the gate lets grow. Runs on slow ticks.
pub fn age_trees(
    timer: Res<SlowTickTimer>,
    settings: Res<VegetationSettings>,
    queue: Res<MutationQueue>,
    trees: Query<(Entity, &Tree), (Without<NoGrowth>, Without<Deleted>, Without<Temporary>)>,
) {
    if !timer.should_run() {
        return;
    }
    let step = settings.aging_step;
    trees.par_iter().for_each(|(entity, tree)| {
        if let Some(tree) = aged(*tree, step) {
            queue.push(VegetationMutation::SetTree { entity, tree });
        }
    });
}

pub struct GrowthGatePlugin;

impl Plugin for GrowthGatePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, age_trees.in_set(VegetationSet::Aging))
            .add_systems(
                FixedUpdate,
                (
                    gate_lumber_growth,
                    gate_global_freeze,
                    gate_winter_dormancy,
                    gate_default_growth,
                )
                    .in_set(VegetationSet::Growth),
            );
    }
}
