//! Request processing and plugin wiring for the batch mutation engine.

use std::sync::atomic::{AtomicUsize, Ordering};

use bevy::ecs::entity::{Entities, EntityHashMap};
use bevy::prelude::*;
use bevy::utils::Parallel;

use crate::catalog::VegetationCatalog;
use crate::components::{
    DeciduousTracking, Deleted, InstanceSnapshot, Overridden, Plant, SubObjects, Temporary, Tree,
    Vegetation,
};
use crate::mutation_queue::MutationQueue;
use crate::sim_rng::SimRng;
use crate::simulation_sets::{SimulationUpdateSet, VegetationSet};

use super::preview::emit_radius_preview;
use super::resolve::{BatchPlan, Planned};
use super::types::{
    BatchMutationLog, BatchMutationReport, BatchMutationRequest, OverlayCircle, RadiusPreview,
    SelectionScope, SkipReason, SkipTally,
};

/// Instances a batch mutation may touch.
pub type BatchView = (
    Or<(With<Tree>, With<Plant>)>,
    Without<Deleted>,
    Without<Temporary>,
    Without<Overridden>,
);

pub type BatchItem<'a> = (
    Entity,
    &'a Transform,
    &'a Vegetation,
    Option<&'a Tree>,
    Option<&'a DeciduousTracking>,
);

/// Ground-plane containment test; height is ignored.
pub fn in_radius(position: Vec3, center: Vec3, radius: f32) -> bool {
    let dx = position.x - center.x;
    let dz = position.z - center.z;
    dx * dx + dz * dz <= radius * radius
}

/// Instance state left behind by earlier requests of the same run. The queue
/// is flushed only after the whole stage, so later requests plan against
/// this instead of the stale components.
#[derive(Default)]
struct PendingState(EntityHashMap<InstanceSnapshot>);

impl PendingState {
    fn snapshot(&self, item: &BatchItem) -> InstanceSnapshot {
        let (entity, _, vegetation, tree, tracking) = *item;
        self.0.get(&entity).copied().unwrap_or(InstanceSnapshot {
            prefab: vegetation.prefab,
            tree: tree.copied(),
            tracking: tracking.copied(),
        })
    }
}

/// Collects planned mutations and counts from a (possibly parallel) scan.
#[derive(Default)]
struct ScanSink {
    planned: Parallel<Vec<(Entity, Planned)>>,
    matched: AtomicUsize,
    changed: AtomicUsize,
    stump_fallbacks: AtomicUsize,
    skipped: [AtomicUsize; 5],
}

impl ScanSink {
    fn record(&self, plan: &BatchPlan, pending: &PendingState, item: BatchItem) {
        let entity = item.0;
        let snapshot = pending.snapshot(&item);
        self.matched.fetch_add(1, Ordering::Relaxed);
        match plan.plan(entity, &snapshot) {
            Ok(Some(planned)) => {
                if planned.stump_fallback {
                    self.stump_fallbacks.fetch_add(1, Ordering::Relaxed);
                }
                self.changed.fetch_add(1, Ordering::Relaxed);
                self.planned.scope(|buffer| buffer.push((entity, planned)));
            }
            Ok(None) => {}
            Err(reason) => self.skip(reason),
        }
    }

    fn skip(&self, reason: SkipReason) {
        self.skipped[reason.index()].fetch_add(1, Ordering::Relaxed);
    }

    fn finish(mut self, report: &mut BatchMutationReport) -> Vec<(Entity, Planned)> {
        report.matched = self.matched.into_inner();
        report.changed = self.changed.into_inner();
        report.stump_fallbacks = self.stump_fallbacks.into_inner();
        for reason in SkipReason::ALL {
            let count = self.skipped[reason.index()].load(Ordering::Relaxed);
            report.skipped.add(reason, count);
        }
        let mut drained = Vec::new();
        self.planned.drain_into(&mut drained);
        drained
    }
}

/// Processes every pending `BatchMutationRequest`.
///
/// Radius and whole-map scopes are parallel scans; single and owner scopes
/// look up their targets directly. Each request draws one seed from `SimRng`
/// and every instance derives its own stream from it. The planned mutations
/// of a request are appended to the queue in request order, and later
/// requests of the same run see the outcome of earlier ones.
#[allow(clippy::too_many_arguments)]
pub fn apply_batch_mutations(
    mut requests: EventReader<BatchMutationRequest>,
    mut reports: EventWriter<BatchMutationReport>,
    mut log: ResMut<BatchMutationLog>,
    mut rng: ResMut<SimRng>,
    catalog: Res<VegetationCatalog>,
    queue: Res<MutationQueue>,
    population: Query<BatchItem, BatchView>,
    owners: Query<&SubObjects>,
    entities: &Entities,
) {
    let mut pending = PendingState::default();
    for request in requests.read() {
        let mut report = BatchMutationReport {
            scope: request.scope.kind(),
            matched: 0,
            changed: 0,
            skipped: SkipTally::default(),
            stump_fallbacks: 0,
        };

        if request.is_noop() {
            report.skipped.add(SkipReason::EmptySelection, 1);
            debug!(
                "BatchMutation ({}): empty selection, nothing to do",
                report.scope.name()
            );
            finish_request(&mut log, &mut reports, report);
            continue;
        }

        let plan = BatchPlan::new(request, &catalog, rng.batch_seed());
        let sink = ScanSink::default();
        let record_target = |target: Entity| match population.get(target) {
            Ok(item) => sink.record(&plan, &pending, item),
            Err(_) if entities.contains(target) => sink.skip(SkipReason::NotVegetation),
            Err(_) => sink.skip(SkipReason::EntityGone),
        };

        match request.scope {
            SelectionScope::Single { hit } => record_target(hit),
            SelectionScope::WholeBuildingOrNetwork { owner } => match owners.get(owner) {
                Ok(subs) => subs.0.iter().copied().for_each(record_target),
                Err(_) if entities.contains(owner) => {}
                Err(_) => sink.skip(SkipReason::EntityGone),
            },
            SelectionScope::Radius { center, radius } => {
                population.par_iter().for_each(|item| {
                    if in_radius(item.1.translation, center, radius) {
                        sink.record(&plan, &pending, item);
                    }
                });
            }
            SelectionScope::WholeMap => {
                population
                    .par_iter()
                    .for_each(|item| sink.record(&plan, &pending, item));
            }
        }

        let planned = sink.finish(&mut report);
        for (entity, planned) in planned {
            queue.extend(planned.mutations());
            pending.0.insert(entity, planned.after);
        }

        let missing = report.skipped.get(SkipReason::MissingCatalogEntry)
            + report.skipped.get(SkipReason::UnknownTarget);
        if missing > 0 {
            warn!(
                "BatchMutation ({}): {} instances skipped on catalog lookups",
                report.scope.name(),
                missing
            );
        }
        if report.stump_fallbacks > 0 {
            debug!(
                "BatchMutation ({}): {} stump requests shown as dead (no stump geometry)",
                report.scope.name(),
                report.stump_fallbacks
            );
        }
        info!(
            "BatchMutation ({}): matched={} changed={} skipped=[{}]",
            report.scope.name(),
            report.matched,
            report.changed,
            report.skipped
        );
        finish_request(&mut log, &mut reports, report);
    }
}

fn finish_request(
    log: &mut BatchMutationLog,
    reports: &mut EventWriter<BatchMutationReport>,
    report: BatchMutationReport,
) {
    log.requests += 1;
    log.changed += report.changed as u64;
    log.skipped.merge(&report.skipped);
    reports.send(report.clone());
    log.last = Some(report);
}

pub struct BatchMutationPlugin;

impl Plugin for BatchMutationPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<BatchMutationRequest>()
            .add_event::<BatchMutationReport>()
            .add_event::<OverlayCircle>()
            .init_resource::<BatchMutationLog>()
            .init_resource::<RadiusPreview>()
            .add_systems(
                FixedUpdate,
                apply_batch_mutations.in_set(VegetationSet::BatchMutation),
            )
            .add_systems(
                Update,
                emit_radius_preview.in_set(SimulationUpdateSet::Visual),
            );
    }
}
