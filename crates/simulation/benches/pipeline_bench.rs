//! Criterion benchmark: vegetation pipeline tick at scale.
//!
//! Measures the wall-clock time of a single `FixedUpdate` schedule execution
//! over forests of 10K, 50K and 100K trees, once in a steady summer and once
//! on the winter forcing tick, plus one whole-map batch mutation.
//!
//! Run with: cargo bench -p simulation --bench pipeline_bench --features bench

use bevy::prelude::*;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use std::time::Duration;

use simulation::batch_mutation::{BatchMutationRequest, SelectionScope};
use simulation::components::LifeStage;
use simulation::season::Season;
use simulation::test_harness::{prefabs, TestForest};

/// Build a classified forest: 80% deciduous oaks, 20% pines, one lumber
/// area over the first hundred oaks.
fn create_benchmark_forest(tree_count: usize) -> TestForest {
    let mut forest = TestForest::new();
    let oaks = tree_count * 4 / 5;
    let oak_ids = forest.spawn_tree_grid(prefabs::OAK, LifeStage::Adult, oaks, 2.0);
    for i in 0..(tree_count - oaks) {
        forest.spawn_tree(
            prefabs::PINE,
            LifeStage::Adult,
            Vec3::new(i as f32 * 2.0, 0.0, -10.0),
        );
    }
    forest.spawn_harvest_area(oak_ids.into_iter().take(100).collect());
    forest.classify_all();
    forest
}

fn bench_steady_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_tick");
    group.measurement_time(Duration::from_secs(20));
    group.sample_size(10);

    for &count in &[10_000usize, 50_000, 100_000] {
        let mut forest = create_benchmark_forest(count).with_season(Season::Summer);
        group.bench_with_input(
            BenchmarkId::new("steady", format!("{count}_trees")),
            &count,
            |b, _| {
                b.iter(|| forest.tick(1));
            },
        );
    }
    group.finish();
}

fn bench_winter_forcing(c: &mut Criterion) {
    let mut group = c.benchmark_group("winter_forcing");
    group.sample_size(10);

    for &count in &[10_000usize, 50_000] {
        group.bench_with_input(
            BenchmarkId::new("first_winter_tick", format!("{count}_trees")),
            &count,
            |b, &count| {
                b.iter_batched(
                    || create_benchmark_forest(count).with_season(Season::Winter),
                    |mut forest| forest.tick(1),
                    BatchSize::LargeInput,
                );
            },
        );
    }
    group.finish();
}

fn bench_whole_map_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_mutation");
    group.sample_size(10);

    let count = 50_000usize;
    group.bench_function(BenchmarkId::new("whole_map", format!("{count}_trees")), |b| {
        b.iter_batched(
            || {
                let mut forest = create_benchmark_forest(count);
                forest.request(BatchMutationRequest::ages(
                    SelectionScope::WholeMap,
                    [LifeStage::Teen, LifeStage::Elderly],
                ));
                forest
            },
            |mut forest| forest.tick(1),
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_steady_tick,
    bench_winter_forcing,
    bench_whole_map_batch
);
criterion_main!(benches);
