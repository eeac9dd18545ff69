//! Lumber reconciliation: keeps the `Lumber` tag in step with the resource
//! lists of harvest areas.
//!
//! The pass is one-shot. It runs on the first tick after being armed and
//! disarms itself before doing any work. Arming happens automatically
//! whenever a `HarvestArea` is added, changed or removed, or explicitly
//! through `LumberReconciliation::arm`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use bevy::prelude::*;

use crate::components::{HarvestArea, Lumber, Tree, Vegetation};
use crate::mutation_queue::{MutationQueue, VegetationMutation};
use crate::simulation_sets::VegetationSet;

/// Counts of one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LumberRunStats {
    pub added: usize,
    pub removed: usize,
    pub reassigned: usize,
    /// Area references to entities that are not trees.
    pub ignored_references: usize,
}

impl LumberRunStats {
    pub fn mutations(&self) -> usize {
        self.added + self.removed + self.reassigned
    }
}

#[derive(Resource, Debug, Default)]
pub struct LumberReconciliation {
    armed: bool,
    runs: u64,
    last_run: Option<LumberRunStats>,
}

impl LumberReconciliation {
    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn last_run(&self) -> Option<LumberRunStats> {
        self.last_run
    }

    /// Clears the armed flag, returning whether it was set.
    fn disarm(&mut self) -> bool {
        std::mem::take(&mut self.armed)
    }
}

/// Harvest areas referencing each entity, smallest area first.
pub fn referencing_areas<'a>(
    areas: impl IntoIterator<Item = (Entity, &'a HarvestArea)>,
) -> HashMap<Entity, Vec<Entity>> {
    let mut map: HashMap<Entity, Vec<Entity>> = HashMap::new();
    for (area, harvest) in areas {
        for &resource in &harvest.resources {
            let owners = map.entry(resource).or_default();
            if !owners.contains(&area) {
                owners.push(area);
            }
        }
    }
    for owners in map.values_mut() {
        owners.sort();
    }
    map
}

/// Mutation needed for an instance that currently carries `Lumber`.
///
/// A tag whose area still references the instance is kept even when other
/// areas reference it too.
pub fn lumber_correction(
    entity: Entity,
    is_tree: bool,
    current: Lumber,
    owners: Option<&[Entity]>,
) -> Option<VegetationMutation> {
    match owners {
        Some(owners) if is_tree => {
            if owners.contains(&current.area) {
                None
            } else {
                owners
                    .first()
                    .map(|&area| VegetationMutation::SetLumber { entity, area })
            }
        }
        _ => Some(VegetationMutation::ClearLumber { entity }),
    }
}

pub fn arm_on_harvest_area_change(
    mut pass: ResMut<LumberReconciliation>,
    changed: Query<(), Changed<HarvestArea>>,
    mut removed: RemovedComponents<HarvestArea>,
) {
    let removals = removed.read().count();
    if !changed.is_empty() || removals > 0 {
        pass.arm();
    }
}

pub fn reconcile_lumber(
    mut pass: ResMut<LumberReconciliation>,
    queue: Res<MutationQueue>,
    areas: Query<(Entity, &HarvestArea)>,
    tagged: Query<(Entity, Has<Tree>, &Lumber), With<Vegetation>>,
    trees: Query<Option<&Lumber>, (With<Tree>, With<Vegetation>)>,
) {
    if !pass.disarm() {
        return;
    }

    let owners = referencing_areas(areas.iter());
    let removed = AtomicUsize::new(0);
    let reassigned = AtomicUsize::new(0);

    tagged.par_iter().for_each(|(entity, is_tree, lumber)| {
        let area_list = owners.get(&entity).map(Vec::as_slice);
        match lumber_correction(entity, is_tree, *lumber, area_list) {
            Some(mutation @ VegetationMutation::ClearLumber { .. }) => {
                removed.fetch_add(1, Ordering::Relaxed);
                queue.push(mutation);
            }
            Some(mutation) => {
                reassigned.fetch_add(1, Ordering::Relaxed);
                queue.push(mutation);
            }
            None => {}
        }
    });

    let mut stats = LumberRunStats {
        removed: removed.into_inner(),
        reassigned: reassigned.into_inner(),
        ..Default::default()
    };

    for (&entity, area_list) in &owners {
        match trees.get(entity) {
            Ok(None) => {
                if let Some(&area) = area_list.first() {
                    queue.push(VegetationMutation::SetLumber { entity, area });
                    stats.added += 1;
                }
            }
            Ok(Some(_)) => {}
            Err(_) => stats.ignored_references += 1,
        }
    }

    if stats.ignored_references > 0 {
        debug!(
            "Lumber: ignored {} harvest references to non-tree entities",
            stats.ignored_references
        );
    }
    info!(
        "Lumber: reconciled {} areas, added={} removed={} reassigned={}",
        areas.iter().count(),
        stats.added,
        stats.removed,
        stats.reassigned
    );

    pass.runs += 1;
    pass.last_run = Some(stats);
}

pub struct LumberPlugin;

impl Plugin for LumberPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LumberReconciliation>().add_systems(
            FixedUpdate,
            (arm_on_harvest_area_change, reconcile_lumber)
                .chain()
                .in_set(VegetationSet::Lumber),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disarm_is_one_shot() {
        let mut pass = LumberReconciliation::default();
        assert!(!pass.disarm());
        pass.arm();
        assert!(pass.is_armed());
        assert!(pass.disarm());
        assert!(!pass.disarm());
    }

    #[test]
    fn test_referencing_areas_sorted_and_deduplicated() {
        let tree = Entity::from_raw(1);
        let a = HarvestArea {
            resources: vec![tree, tree],
        };
        let b = HarvestArea {
            resources: vec![tree],
        };
        let map = referencing_areas([(Entity::from_raw(20), &a), (Entity::from_raw(10), &b)]);
        assert_eq!(
            map.get(&tree),
            Some(&vec![Entity::from_raw(10), Entity::from_raw(20)])
        );
    }

    #[test]
    fn test_unreferenced_lumber_is_cleared() {
        let entity = Entity::from_raw(1);
        let current = Lumber {
            area: Entity::from_raw(5),
        };
        assert_eq!(
            lumber_correction(entity, true, current, None),
            Some(VegetationMutation::ClearLumber { entity })
        );
    }

    #[test]
    fn test_lumber_kept_while_own_area_references() {
        let entity = Entity::from_raw(1);
        let area = Entity::from_raw(5);
        let owners = [Entity::from_raw(2), area];
        assert_eq!(
            lumber_correction(entity, true, Lumber { area }, Some(&owners[..])),
            None
        );
    }

    #[test]
    fn test_lumber_moves_to_remaining_area() {
        let entity = Entity::from_raw(1);
        let owners = [Entity::from_raw(7)];
        assert_eq!(
            lumber_correction(
                entity,
                true,
                Lumber {
                    area: Entity::from_raw(5)
                },
                Some(&owners[..])
            ),
            Some(VegetationMutation::SetLumber {
                entity,
                area: Entity::from_raw(7)
            })
        );
    }

    #[test]
    fn test_plants_never_keep_lumber() {
        let entity = Entity::from_raw(1);
        let area = Entity::from_raw(5);
        assert_eq!(
            lumber_correction(entity, false, Lumber { area }, Some(&[area][..])),
            Some(VegetationMutation::ClearLumber { entity })
        );
    }
}
