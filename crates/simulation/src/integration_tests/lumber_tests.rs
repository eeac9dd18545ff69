//! Lumber reconciliation: arming, membership changes and idempotence.

use bevy::prelude::*;

use crate::components::{DeciduousTracking, HarvestArea, LifeStage, Lumber, NoGrowth};
use crate::lumber::LumberReconciliation;
use crate::season::Season;
use crate::test_harness::{prefabs, TestForest};

#[test]
fn test_new_area_tags_its_trees() {
    let mut forest = TestForest::new();
    let trees = forest.spawn_tree_grid(prefabs::OAK, LifeStage::Adult, 10, 3.0);
    let outside = forest.spawn_tree(prefabs::OAK, LifeStage::Adult, Vec3::new(-50.0, 0.0, 0.0));
    let area = forest.spawn_harvest_area(trees.clone());

    forest.tick(1);
    for &tree in &trees {
        assert_eq!(forest.lumber(tree), Some(Lumber { area }));
    }
    forest.assert_lacks::<Lumber>(outside);

    let pass = forest.resource::<LumberReconciliation>();
    assert!(!pass.is_armed(), "the pass disarms after one run");
    assert_eq!(pass.last_run().map(|r| r.added), Some(10));
}

#[test]
fn test_rerun_without_changes_is_a_noop() {
    let mut forest = TestForest::new();
    let trees = forest.spawn_tree_grid(prefabs::OAK, LifeStage::Adult, 25, 3.0);
    forest.spawn_harvest_area(trees[..15].to_vec());
    forest.spawn_harvest_area(trees[10..].to_vec());
    forest.tick(1);
    assert_eq!(forest.resource::<LumberReconciliation>().runs(), 1);

    for _ in 0..3 {
        forest.arm_lumber_reconciliation();
        forest.tick(1);
        let last = forest.resource::<LumberReconciliation>().last_run();
        assert_eq!(last.map(|r| r.mutations()), Some(0));
    }
    assert_eq!(forest.resource::<LumberReconciliation>().runs(), 4);
    assert_eq!(forest.count_with::<Lumber>(), 25);
}

#[test]
fn test_unarmed_pass_does_not_run() {
    let mut forest = TestForest::new();
    let tree = forest.spawn_tree(prefabs::OAK, LifeStage::Adult, Vec3::ZERO);
    forest.tick(1);
    assert_eq!(forest.resource::<LumberReconciliation>().runs(), 0);

    // Tagged by hand with no area behind it; nothing notices until armed.
    let stray = forest.spawn_harvest_area(Vec::new());
    forest.tick(1);
    forest.insert(tree, Lumber { area: stray });
    forest.tick(5);
    forest.assert_has::<Lumber>(tree);

    forest.arm_lumber_reconciliation();
    forest.tick(1);
    forest.assert_lacks::<Lumber>(tree);
}

#[test]
fn test_removed_tree_loses_lumber() {
    let mut forest = TestForest::new();
    let a = forest.spawn_tree(prefabs::OAK, LifeStage::Adult, Vec3::ZERO);
    let b = forest.spawn_tree(prefabs::OAK, LifeStage::Adult, Vec3::X);
    let area = forest.spawn_harvest_area(vec![a, b]);
    forest.tick(1);

    forest.set_harvest_resources(area, vec![a]);
    forest.tick(1);
    forest.assert_has::<Lumber>(a);
    forest.assert_lacks::<Lumber>(b);
}

#[test]
fn test_despawned_area_releases_trees() {
    let mut forest = TestForest::new();
    let tree = forest.spawn_tree(prefabs::OAK, LifeStage::Adult, Vec3::ZERO);
    let area = forest.spawn_harvest_area(vec![tree]);
    forest.tick(1);
    forest.assert_has::<Lumber>(tree);

    forest.despawn(area);
    forest.tick(1);
    forest.assert_lacks::<Lumber>(tree);
    assert_eq!(forest.count_with::<HarvestArea>(), 0);
}

#[test]
fn test_tree_moves_to_remaining_area() {
    let mut forest = TestForest::new();
    let tree = forest.spawn_tree(prefabs::OAK, LifeStage::Adult, Vec3::ZERO);
    let first = forest.spawn_harvest_area(vec![tree]);
    forest.tick(1);
    let second = forest.spawn_harvest_area(vec![tree]);
    forest.tick(1);
    assert_eq!(forest.lumber(tree), Some(Lumber { area: first }));

    forest.despawn(first);
    forest.tick(1);
    assert_eq!(forest.lumber(tree), Some(Lumber { area: second }));
}

/// Scenario: a forced-dead tree gains `Lumber` and is restored on the same
/// tick.
#[test]
fn test_lumber_overrides_winter_forcing_on_the_same_tick() {
    let mut forest = TestForest::new();
    let tree = forest.spawn_tree(prefabs::OAK, LifeStage::Adult, Vec3::ZERO);
    forest.classify_all();
    forest.set_season(Season::Winter);
    forest.tick(1);
    forest.assert_forced_dead(tree, LifeStage::Adult);

    forest.spawn_harvest_area(vec![tree]);
    forest.tick(1);
    forest.assert_state(tree, LifeStage::Adult);
    forest.assert_untracked(tree);
    forest.assert_has::<Lumber>(tree);
    forest.assert_lacks::<NoGrowth>(tree);

    // Stays exempt for the rest of the winter.
    forest.tick(20);
    forest.assert_state(tree, LifeStage::Adult);
    forest.assert_untracked(tree);
}

#[test]
fn test_tree_leaving_lumber_is_reclassified() {
    let mut forest = TestForest::new();
    let tree = forest.spawn_tree(prefabs::OAK, LifeStage::Adult, Vec3::ZERO);
    let area = forest.spawn_harvest_area(vec![tree]);
    forest.classify_all();
    forest.assert_untracked(tree);

    forest.set_harvest_resources(area, Vec::new());
    forest.classify_all();
    forest.assert_lacks::<Lumber>(tree);
    assert_eq!(
        forest.tracking(tree),
        Some(DeciduousTracking::observe(LifeStage::Adult))
    );
}

#[test]
fn test_references_to_plants_are_ignored() {
    let mut forest = TestForest::new();
    let fern = forest.spawn_plant(prefabs::FERN, Vec3::ZERO);
    forest.spawn_harvest_area(vec![fern]);
    forest.tick(1);
    forest.assert_lacks::<Lumber>(fern);
    let last = forest.resource::<LumberReconciliation>().last_run();
    assert_eq!(last.map(|r| r.ignored_references), Some(1));
}
