//! Classification pass: tags each unclassified tree as `Evergreen` or
//! `DeciduousTracking`.
//!
//! Work is time-sliced: the population is split into
//! `CLASSIFICATION_SLICES` round-robin slices by entity index, and each tick
//! only the slice matching the tick counter is scanned. A freshly placed tree
//! is therefore classified within `CLASSIFICATION_SLICES` ticks.
//!
//! The pass is idle while the winter dead model is disabled. Lumber trees
//! are never classified; they are exempt from seasonal tracking.

use std::sync::atomic::{AtomicUsize, Ordering};

use bevy::prelude::*;

use crate::catalog::VegetationCatalog;
use crate::components::{
    DeciduousTracking, Deleted, Evergreen, LifeStage, Lumber, Temporary, Tree, Vegetation,
};
use crate::config::{PassContext, VegetationSettings, CLASSIFICATION_SLICES};
use crate::mutation_queue::{MutationQueue, Tag, VegetationMutation};
use crate::season::SeasonSignal;
use crate::simulation_sets::VegetationSet;
use crate::TickCounter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Evergreen,
    Deciduous(DeciduousTracking),
}

/// Classification of a tree with the given evergreen-ness and life stage.
pub fn classify(evergreen: bool, state: LifeStage) -> Classification {
    if evergreen {
        Classification::Evergreen
    } else {
        Classification::Deciduous(DeciduousTracking::observe(state))
    }
}

/// Slice scanned on the given tick.
pub fn active_slice(tick: u64) -> u32 {
    (tick % CLASSIFICATION_SLICES as u64) as u32
}

pub fn in_slice(entity: Entity, slice: u32) -> bool {
    entity.index() % CLASSIFICATION_SLICES == slice
}

type Unclassified = (
    Without<Evergreen>,
    Without<DeciduousTracking>,
    Without<Lumber>,
    Without<Deleted>,
    Without<Temporary>,
);

pub fn classify_vegetation(
    settings: Res<VegetationSettings>,
    season: Res<SeasonSignal>,
    tick: Res<TickCounter>,
    catalog: Res<VegetationCatalog>,
    queue: Res<MutationQueue>,
    candidates: Query<(Entity, &Vegetation, &Tree), Unclassified>,
) {
    let ctx = PassContext::capture(&settings, &season);
    if !ctx.winter_dead_model || candidates.is_empty() {
        return;
    }

    let slice = active_slice(tick.0);
    let missing = AtomicUsize::new(0);

    candidates
        .par_iter()
        .for_each(|(entity, vegetation, tree)| {
            if !in_slice(entity, slice) {
                return;
            }
            let Some(evergreen) = catalog.tree_evergreen(vegetation.prefab) else {
                missing.fetch_add(1, Ordering::Relaxed);
                return;
            };
            let mutation = match classify(evergreen, tree.state) {
                Classification::Evergreen => VegetationMutation::AddTag {
                    entity,
                    tag: Tag::Evergreen,
                },
                Classification::Deciduous(tracking) => {
                    VegetationMutation::Track { entity, tracking }
                }
            };
            queue.push(mutation);
        });

    let missing = missing.into_inner();
    if missing > 0 {
        debug!(
            "Classification: skipped {} trees without a tree catalog entry (slice {})",
            missing, slice
        );
    }
}

/// Records original footprints of new tree prefabs and applies or reverts
/// the trunk-only placement footprint.
pub fn sync_catalog_footprints(
    settings: Res<VegetationSettings>,
    mut catalog: ResMut<VegetationCatalog>,
) {
    let reduced = settings.reduced_footprint;
    if !catalog.needs_footprint_sync(reduced) {
        return;
    }
    let changed = catalog.sync_footprints(reduced);
    if changed > 0 {
        info!(
            "Catalog: {} tree prefabs switched to {} footprint",
            changed,
            if reduced { "trunk-only" } else { "original" }
        );
    }
}

pub struct ClassificationPlugin;

impl Plugin for ClassificationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (sync_catalog_footprints, classify_vegetation).in_set(VegetationSet::Classify),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evergreen_wins_regardless_of_stage() {
        for state in LifeStage::ALL {
            assert_eq!(classify(true, state), Classification::Evergreen);
        }
    }

    #[test]
    fn test_deciduous_remembers_current_stage() {
        assert_eq!(
            classify(false, LifeStage::Elderly),
            Classification::Deciduous(DeciduousTracking {
                previous_state: LifeStage::Elderly,
                technically_dead: false,
            })
        );
    }

    #[test]
    fn test_dead_tree_is_classified_technically_dead() {
        match classify(false, LifeStage::Dead) {
            Classification::Deciduous(tracking) => assert!(tracking.technically_dead),
            other => panic!("expected deciduous, got {:?}", other),
        }
    }

    #[test]
    fn test_slices_cover_every_entity_once_per_cycle() {
        for index in 0..64u32 {
            let entity = Entity::from_raw(index);
            let hits = (0..CLASSIFICATION_SLICES as u64)
                .filter(|tick| in_slice(entity, active_slice(*tick)))
                .count();
            assert_eq!(hits, 1, "entity {} must fall into exactly one slice", index);
        }
    }
}
