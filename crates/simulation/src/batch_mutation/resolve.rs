//! Per-instance planning: what one matched instance turns into.

use bevy::prelude::*;

use crate::catalog::{PrefabId, VegetationCatalog};
use crate::components::{DeciduousTracking, InstanceSnapshot, LifeStage, Tree};
use crate::mutation_queue::VegetationMutation;
use crate::sim_rng::instance_rng;

use super::sampling::{pick, resolve_age, AgeResolution};
use super::types::{BatchMutationRequest, SkipReason};

/// Mutation planned for one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Planned {
    pub mutation: VegetationMutation,
    /// New tracking for a deciduous tree whose stage was set explicitly.
    /// The assigned stage is genuine, so it is never `technically_dead`.
    pub retrack: Option<DeciduousTracking>,
    /// The instance as it will look once the mutations are flushed.
    pub after: InstanceSnapshot,
    pub stump_fallback: bool,
}

impl Planned {
    pub fn mutations(&self) -> impl Iterator<Item = VegetationMutation> {
        let entity = self.mutation.entity();
        std::iter::once(self.mutation).chain(
            self.retrack
                .map(|tracking| VegetationMutation::Track { entity, tracking }),
        )
    }
}

/// Immutable inputs shared by every instance of one request.
#[derive(Clone, Copy)]
pub struct BatchPlan<'a> {
    ages: &'a [LifeStage],
    prefabs: &'a [PrefabId],
    catalog: &'a VegetationCatalog,
    seed: u64,
}

impl<'a> BatchPlan<'a> {
    pub fn new(request: &'a BatchMutationRequest, catalog: &'a VegetationCatalog, seed: u64) -> Self {
        Self {
            ages: &request.ages,
            prefabs: request
                .prefabs
                .as_ref()
                .map(|set| set.prefabs.as_slice())
                .unwrap_or(&[]),
            catalog,
            seed,
        }
    }

    /// `Ok(None)` means the instance is in scope but nothing changes.
    pub fn plan(
        &self,
        entity: Entity,
        snapshot: &InstanceSnapshot,
    ) -> Result<Option<Planned>, SkipReason> {
        let mut rng = instance_rng(self.seed, entity);
        if self.prefabs.is_empty() {
            self.plan_age(entity, snapshot, &mut rng)
        } else {
            self.plan_replacement(entity, snapshot, &mut rng)
        }
    }

    fn plan_age(
        &self,
        entity: Entity,
        snapshot: &InstanceSnapshot,
        rng: &mut impl rand::Rng,
    ) -> Result<Option<Planned>, SkipReason> {
        let Some(current) = snapshot.tree else {
            return Ok(None);
        };
        let Some(requested) = pick(self.ages, rng) else {
            return Ok(None);
        };
        let entry = self
            .catalog
            .get(snapshot.prefab)
            .ok_or(SkipReason::MissingCatalogEntry)?;
        let resolution = resolve_age(requested, entry);
        let tree = resolution.tree();
        let retrack = snapshot.tracking.map(|_| DeciduousTracking {
            previous_state: tree.state,
            technically_dead: false,
        });
        if tree == current && retrack == snapshot.tracking {
            return Ok(None);
        }
        Ok(Some(Planned {
            mutation: VegetationMutation::SetTree { entity, tree },
            retrack,
            after: InstanceSnapshot {
                prefab: snapshot.prefab,
                tree: Some(tree),
                tracking: retrack,
            },
            stump_fallback: resolution.fell_back(),
        }))
    }

    fn plan_replacement(
        &self,
        entity: Entity,
        snapshot: &InstanceSnapshot,
        rng: &mut impl rand::Rng,
    ) -> Result<Option<Planned>, SkipReason> {
        let Some(target) = pick(self.prefabs, rng) else {
            return Ok(None);
        };
        let entry = self.catalog.get(target).ok_or(SkipReason::UnknownTarget)?;

        let mut stump_fallback = false;
        let tree = if entry.tree_growth {
            let resolution = match (pick(self.ages, rng), snapshot.tree) {
                (Some(requested), _) => resolve_age(requested, entry),
                (None, Some(current)) => {
                    AgeResolution::Exact(true_tree(current, snapshot.tracking))
                }
                (None, None) => resolve_age(LifeStage::Adult, entry),
            };
            stump_fallback = resolution.fell_back();
            Some(resolution.tree())
        } else {
            None
        };

        Ok(Some(Planned {
            mutation: VegetationMutation::Replace {
                entity,
                prefab: target,
                tree,
            },
            retrack: None,
            after: InstanceSnapshot {
                prefab: target,
                tree,
                tracking: None,
            },
            stump_fallback,
        }))
    }
}

/// Tree record with any forced death undone.
pub fn true_tree(tree: Tree, tracking: Option<DeciduousTracking>) -> Tree {
    match tracking {
        Some(tracking) if tracking.is_forced_dead(tree.state) => Tree {
            state: tracking.previous_state,
            growth: tree.growth,
        },
        _ => tree,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, SelectionSet};
    use crate::config::FULL_GROWTH;
    use crate::batch_mutation::types::SelectionScope;

    const OAK: PrefabId = PrefabId(1);
    const PINE: PrefabId = PrefabId(2);
    const FERN: PrefabId = PrefabId(3);
    const BIRCH: PrefabId = PrefabId(4);
    const MISSING: PrefabId = PrefabId(99);

    fn catalog() -> VegetationCatalog {
        let mut catalog = VegetationCatalog::default();
        catalog.insert(OAK, CatalogEntry::tree("oak", false, 8));
        catalog.insert(PINE, CatalogEntry::tree("pine", true, 4));
        catalog.insert(FERN, CatalogEntry::plant("fern"));
        catalog.insert(BIRCH, CatalogEntry::tree("birch", false, 2));
        catalog
    }

    fn tree_snapshot(prefab: PrefabId, state: LifeStage) -> InstanceSnapshot {
        InstanceSnapshot {
            prefab,
            tree: Some(Tree::new(state)),
            tracking: None,
        }
    }

    fn plant_snapshot() -> InstanceSnapshot {
        InstanceSnapshot {
            prefab: FERN,
            tree: None,
            tracking: None,
        }
    }

    fn entity() -> Entity {
        Entity::from_raw(11)
    }

    #[test]
    fn test_age_override_draws_from_set() {
        let catalog = catalog();
        let request = BatchMutationRequest::ages(SelectionScope::WholeMap, [LifeStage::Elderly]);
        let plan = BatchPlan::new(&request, &catalog, 5);
        let planned = plan
            .plan(entity(), &tree_snapshot(OAK, LifeStage::Adult))
            .unwrap()
            .unwrap();
        assert_eq!(
            planned.mutation,
            VegetationMutation::SetTree {
                entity: entity(),
                tree: Tree::new(LifeStage::Elderly),
            }
        );
    }

    #[test]
    fn test_empty_age_set_is_noop() {
        let catalog = catalog();
        let request = BatchMutationRequest::ages(SelectionScope::WholeMap, []);
        let plan = BatchPlan::new(&request, &catalog, 5);
        assert_eq!(plan.plan(entity(), &tree_snapshot(OAK, LifeStage::Adult)), Ok(None));
    }

    #[test]
    fn test_explicit_dead_on_forced_tree_clears_forcing() {
        let catalog = catalog();
        let request = BatchMutationRequest::ages(SelectionScope::WholeMap, [LifeStage::Dead]);
        let plan = BatchPlan::new(&request, &catalog, 5);
        let forced = InstanceSnapshot {
            prefab: OAK,
            tree: Some(Tree::new(LifeStage::Dead)),
            tracking: Some(DeciduousTracking {
                previous_state: LifeStage::Adult,
                technically_dead: true,
            }),
        };
        let planned = plan.plan(entity(), &forced).unwrap().unwrap();
        let genuine = DeciduousTracking {
            previous_state: LifeStage::Dead,
            technically_dead: false,
        };
        assert_eq!(planned.retrack, Some(genuine));
        assert_eq!(planned.after.tracking, Some(genuine));
        assert_eq!(
            planned.mutations().collect::<Vec<_>>(),
            vec![
                VegetationMutation::SetTree {
                    entity: entity(),
                    tree: Tree::new(LifeStage::Dead),
                },
                VegetationMutation::Track {
                    entity: entity(),
                    tracking: genuine,
                },
            ]
        );
    }

    #[test]
    fn test_untracked_tree_gets_no_retrack() {
        let catalog = catalog();
        let request = BatchMutationRequest::ages(SelectionScope::WholeMap, [LifeStage::Teen]);
        let plan = BatchPlan::new(&request, &catalog, 5);
        let planned = plan
            .plan(entity(), &tree_snapshot(OAK, LifeStage::Adult))
            .unwrap()
            .unwrap();
        assert_eq!(planned.retrack, None);
        assert_eq!(planned.mutations().count(), 1);
    }

    #[test]
    fn test_age_override_leaves_plants_alone() {
        let catalog = catalog();
        let request = BatchMutationRequest::ages(SelectionScope::WholeMap, [LifeStage::Teen]);
        let plan = BatchPlan::new(&request, &catalog, 5);
        assert_eq!(plan.plan(entity(), &plant_snapshot()), Ok(None));
    }

    #[test]
    fn test_age_override_skips_unknown_prefab() {
        let catalog = catalog();
        let request = BatchMutationRequest::ages(SelectionScope::WholeMap, [LifeStage::Teen]);
        let plan = BatchPlan::new(&request, &catalog, 5);
        assert_eq!(
            plan.plan(entity(), &tree_snapshot(MISSING, LifeStage::Adult)),
            Err(SkipReason::MissingCatalogEntry)
        );
    }

    #[test]
    fn test_stump_on_ineligible_prefab_falls_back_to_dead() {
        let catalog = catalog();
        let request = BatchMutationRequest::ages(SelectionScope::WholeMap, [LifeStage::Stump]);
        let plan = BatchPlan::new(&request, &catalog, 5);

        let planned = plan
            .plan(entity(), &tree_snapshot(BIRCH, LifeStage::Adult))
            .unwrap()
            .unwrap();
        assert!(planned.stump_fallback);
        assert_eq!(
            planned.mutation,
            VegetationMutation::SetTree {
                entity: entity(),
                tree: Tree {
                    state: LifeStage::Dead,
                    growth: FULL_GROWTH,
                },
            }
        );

        let planned = plan
            .plan(entity(), &tree_snapshot(OAK, LifeStage::Adult))
            .unwrap()
            .unwrap();
        assert!(!planned.stump_fallback);
        assert_eq!(
            planned.mutation,
            VegetationMutation::SetTree {
                entity: entity(),
                tree: Tree::new(LifeStage::Stump),
            }
        );
    }

    #[test]
    fn test_plant_to_tree_defaults_to_adult() {
        let catalog = catalog();
        let request =
            BatchMutationRequest::replace(SelectionScope::WholeMap, SelectionSet::new([OAK]));
        let plan = BatchPlan::new(&request, &catalog, 5);
        let planned = plan.plan(entity(), &plant_snapshot()).unwrap().unwrap();
        assert_eq!(
            planned.mutation,
            VegetationMutation::Replace {
                entity: entity(),
                prefab: OAK,
                tree: Some(Tree::new(LifeStage::Adult)),
            }
        );
    }

    #[test]
    fn test_plant_to_tree_uses_age_set() {
        let catalog = catalog();
        let request =
            BatchMutationRequest::replace(SelectionScope::WholeMap, SelectionSet::new([OAK]))
                .with_ages([LifeStage::Child]);
        let plan = BatchPlan::new(&request, &catalog, 5);
        let planned = plan.plan(entity(), &plant_snapshot()).unwrap().unwrap();
        assert_eq!(
            planned.mutation,
            VegetationMutation::Replace {
                entity: entity(),
                prefab: OAK,
                tree: Some(Tree::new(LifeStage::Child)),
            }
        );
    }

    #[test]
    fn test_tree_to_plant_drops_tree_record() {
        let catalog = catalog();
        let request =
            BatchMutationRequest::replace(SelectionScope::WholeMap, SelectionSet::new([FERN]))
                .with_ages([LifeStage::Teen]);
        let plan = BatchPlan::new(&request, &catalog, 5);
        let planned = plan
            .plan(entity(), &tree_snapshot(OAK, LifeStage::Adult))
            .unwrap()
            .unwrap();
        assert_eq!(
            planned.mutation,
            VegetationMutation::Replace {
                entity: entity(),
                prefab: FERN,
                tree: None,
            }
        );
    }

    #[test]
    fn test_tree_to_tree_without_ages_restores_forced_death() {
        let catalog = catalog();
        let request =
            BatchMutationRequest::replace(SelectionScope::WholeMap, SelectionSet::new([PINE]));
        let plan = BatchPlan::new(&request, &catalog, 5);
        let snapshot = InstanceSnapshot {
            prefab: OAK,
            tree: Some(Tree {
                state: LifeStage::Dead,
                growth: 40,
            }),
            tracking: Some(DeciduousTracking {
                previous_state: LifeStage::Teen,
                technically_dead: true,
            }),
        };
        let planned = plan.plan(entity(), &snapshot).unwrap().unwrap();
        assert_eq!(
            planned.mutation,
            VegetationMutation::Replace {
                entity: entity(),
                prefab: PINE,
                tree: Some(Tree {
                    state: LifeStage::Teen,
                    growth: 40,
                }),
            }
        );
    }

    #[test]
    fn test_unknown_replacement_is_skipped() {
        let catalog = catalog();
        let request =
            BatchMutationRequest::replace(SelectionScope::WholeMap, SelectionSet::new([MISSING]));
        let plan = BatchPlan::new(&request, &catalog, 5);
        assert_eq!(
            plan.plan(entity(), &tree_snapshot(OAK, LifeStage::Adult)),
            Err(SkipReason::UnknownTarget)
        );
    }

    #[test]
    fn test_empty_prefab_set_falls_through_to_age_override() {
        let catalog = catalog();
        let request = BatchMutationRequest::replace(SelectionScope::WholeMap, SelectionSet::default())
            .with_ages([LifeStage::Teen]);
        let plan = BatchPlan::new(&request, &catalog, 5);
        let planned = plan
            .plan(entity(), &tree_snapshot(OAK, LifeStage::Adult))
            .unwrap()
            .unwrap();
        assert!(matches!(
            planned.mutation,
            VegetationMutation::SetTree { .. }
        ));
    }

    #[test]
    fn test_plan_is_reproducible_per_entity() {
        let catalog = catalog();
        let request = BatchMutationRequest::ages(
            SelectionScope::WholeMap,
            [LifeStage::Child, LifeStage::Teen, LifeStage::Elderly],
        );
        let plan = BatchPlan::new(&request, &catalog, 77);
        let snapshot = tree_snapshot(OAK, LifeStage::Adult);
        for raw in 0..32 {
            let entity = Entity::from_raw(raw);
            assert_eq!(plan.plan(entity, &snapshot), plan.plan(entity, &snapshot));
        }
    }
}
