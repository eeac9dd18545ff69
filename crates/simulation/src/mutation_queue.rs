//! Deferred, parallel-safe mutation queue.
//!
//! Scans never write to the population. Workers push `VegetationMutation`s
//! into per-thread buffers (`bevy::utils::Parallel`), and a single exclusive
//! flush system per pipeline stage drains every buffer and applies the
//! batch to the `World`. A thread only ever appends to its own buffer, so the
//! mutations for one entity keep the order in which its worker produced them.

use bevy::prelude::*;
use bevy::utils::Parallel;

use crate::catalog::PrefabId;
use crate::components::{
    DeciduousTracking, Evergreen, Lumber, NoGrowth, Plant, RecentlyChanged, Tree, Updated,
    Vegetation,
};
use crate::simulation_sets::{SimulationSet, VegetationSet};

/// Marker tags that carry no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Evergreen,
    NoGrowth,
    RecentlyChanged,
    Updated,
}

impl Tag {
    fn insert_into(self, entity: &mut EntityWorldMut) {
        match self {
            Tag::Evergreen => {
                entity.insert(Evergreen);
            }
            Tag::NoGrowth => {
                entity.insert(NoGrowth);
            }
            Tag::RecentlyChanged => {
                entity.insert(RecentlyChanged);
            }
            Tag::Updated => {
                entity.insert(Updated);
            }
        }
    }

    fn remove_from(self, entity: &mut EntityWorldMut) {
        match self {
            Tag::Evergreen => {
                entity.remove::<Evergreen>();
            }
            Tag::NoGrowth => {
                entity.remove::<NoGrowth>();
            }
            Tag::RecentlyChanged => {
                entity.remove::<RecentlyChanged>();
            }
            Tag::Updated => {
                entity.remove::<Updated>();
            }
        }
    }
}

/// One deferred write against a vegetation instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VegetationMutation {
    /// Overwrite the tree record. A changed life stage also marks `Updated`.
    SetTree { entity: Entity, tree: Tree },
    /// Attach or overwrite seasonal tracking.
    Track {
        entity: Entity,
        tracking: DeciduousTracking,
    },
    Untrack { entity: Entity },
    AddTag { entity: Entity, tag: Tag },
    RemoveTag { entity: Entity, tag: Tag },
    SetLumber { entity: Entity, area: Entity },
    ClearLumber { entity: Entity },
    /// Swap the prefab. `Some(tree)` leaves the instance with tree
    /// capability, `None` turns it into a plain plant. Classification tags
    /// are stripped and the instance is marked `RecentlyChanged` + `Updated`.
    Replace {
        entity: Entity,
        prefab: PrefabId,
        tree: Option<Tree>,
    },
}

impl VegetationMutation {
    pub fn entity(&self) -> Entity {
        match *self {
            VegetationMutation::SetTree { entity, .. }
            | VegetationMutation::Track { entity, .. }
            | VegetationMutation::Untrack { entity }
            | VegetationMutation::AddTag { entity, .. }
            | VegetationMutation::RemoveTag { entity, .. }
            | VegetationMutation::SetLumber { entity, .. }
            | VegetationMutation::ClearLumber { entity }
            | VegetationMutation::Replace { entity, .. } => entity,
        }
    }

    /// Applies the mutation. Returns `false` when the entity no longer exists,
    /// or a tree record is written to an instance that is no longer a tree.
    fn apply(self, world: &mut World) -> bool {
        let Ok(mut entity) = world.get_entity_mut(self.entity()) else {
            return false;
        };
        match self {
            VegetationMutation::SetTree { tree, .. } => {
                let Some(current) = entity.get::<Tree>() else {
                    return false;
                };
                let stage_changed = current.state != tree.state;
                entity.insert(tree);
                if stage_changed {
                    entity.insert(Updated);
                }
            }
            VegetationMutation::Track { tracking, .. } => {
                entity.insert(tracking);
            }
            VegetationMutation::Untrack { .. } => {
                entity.remove::<DeciduousTracking>();
            }
            VegetationMutation::AddTag { tag, .. } => tag.insert_into(&mut entity),
            VegetationMutation::RemoveTag { tag, .. } => tag.remove_from(&mut entity),
            VegetationMutation::SetLumber { area, .. } => {
                entity.insert(Lumber { area });
            }
            VegetationMutation::ClearLumber { .. } => {
                entity.remove::<Lumber>();
            }
            VegetationMutation::Replace { prefab, tree, .. } => {
                entity.insert(Vegetation { prefab });
                match tree {
                    Some(tree) => {
                        entity.insert(tree);
                        entity.remove::<Plant>();
                    }
                    None => {
                        entity.remove::<(Tree, NoGrowth)>();
                        entity.insert(Plant);
                    }
                }
                entity.remove::<(Evergreen, DeciduousTracking)>();
                entity.insert((RecentlyChanged, Updated));
            }
        }
        true
    }
}

/// Running totals since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueTotals {
    pub applied: u64,
    pub dropped: u64,
    pub flushes: u64,
}

/// Result of one flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushOutcome {
    pub applied: usize,
    /// Mutations whose entity was despawned before the flush, or tree
    /// records aimed at an instance that became a plant.
    pub dropped: usize,
}

/// Multi-producer buffer of pending mutations.
#[derive(Resource, Default)]
pub struct MutationQueue {
    pending: Parallel<Vec<VegetationMutation>>,
    totals: QueueTotals,
}

impl MutationQueue {
    /// Enqueue from any thread.
    pub fn push(&self, mutation: VegetationMutation) {
        self.pending.scope(|buffer| buffer.push(mutation));
    }

    pub fn extend(&self, mutations: impl IntoIterator<Item = VegetationMutation>) {
        self.pending.scope(|buffer| buffer.extend(mutations));
    }

    pub fn pending_len(&mut self) -> usize {
        self.pending.iter_mut().map(|buffer| buffer.len()).sum()
    }

    /// Drains every per-thread buffer.
    pub fn take(&mut self) -> Vec<VegetationMutation> {
        let mut drained = Vec::new();
        self.pending.drain_into(&mut drained);
        drained
    }

    pub fn totals(&self) -> QueueTotals {
        self.totals
    }
}

/// Drains the queue and applies every mutation to the world.
pub fn flush(world: &mut World) -> FlushOutcome {
    let batch = world.resource_mut::<MutationQueue>().take();
    let mut outcome = FlushOutcome::default();
    if batch.is_empty() {
        return outcome;
    }

    for mutation in batch {
        if mutation.apply(world) {
            outcome.applied += 1;
        } else {
            outcome.dropped += 1;
        }
    }

    if outcome.dropped > 0 {
        debug!(
            "MutationQueue: dropped {} mutations for despawned or replaced instances",
            outcome.dropped
        );
    }

    let mut queue = world.resource_mut::<MutationQueue>();
    queue.totals.applied += outcome.applied as u64;
    queue.totals.dropped += outcome.dropped as u64;
    queue.totals.flushes += 1;
    outcome
}

/// Exclusive flush system placed at the end of every pipeline stage.
pub fn flush_vegetation_mutations(world: &mut World) {
    flush(world);
}

/// Clears the refresh markers written during the previous tick. Renderers
/// and other consumers read them between ticks.
pub fn clear_refresh_markers(
    queue: Res<MutationQueue>,
    marked: Query<(Entity, Has<Updated>, Has<RecentlyChanged>), Or<(With<Updated>, With<RecentlyChanged>)>>,
) {
    marked
        .par_iter()
        .for_each(|(entity, updated, recently_changed)| {
            if updated {
                queue.push(VegetationMutation::RemoveTag {
                    entity,
                    tag: Tag::Updated,
                });
            }
            if recently_changed {
                queue.push(VegetationMutation::RemoveTag {
                    entity,
                    tag: Tag::RecentlyChanged,
                });
            }
        });
}

/// Flush barrier that closes one pipeline stage.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageFlush(pub VegetationSet);

pub struct MutationQueuePlugin;

impl Plugin for MutationQueuePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MutationQueue>().add_systems(
            FixedUpdate,
            clear_refresh_markers.in_set(VegetationSet::Refresh),
        );

        let order = VegetationSet::ORDER;
        for (i, stage) in order.iter().copied().enumerate() {
            app.configure_sets(
                FixedUpdate,
                StageFlush(stage)
                    .after(stage)
                    .in_set(SimulationSet::Simulation),
            );
            if let Some(next) = order.get(i + 1).copied() {
                app.configure_sets(FixedUpdate, next.after(StageFlush(stage)));
            }
            app.add_systems(
                FixedUpdate,
                flush_vegetation_mutations.in_set(StageFlush(stage)),
            );
        }
    }
}
