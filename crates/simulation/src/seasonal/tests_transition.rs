//! Tests for the pure seasonal transition and its mutation mapping.

use bevy::prelude::Entity;

use crate::components::{DeciduousTracking, LifeStage, Tree};
use crate::mutation_queue::VegetationMutation;
use crate::seasonal::transition::*;

fn tracking(previous_state: LifeStage, technically_dead: bool) -> DeciduousTracking {
    DeciduousTracking {
        previous_state,
        technically_dead,
    }
}

#[test]
fn test_winter_forces_living_tree_dead() {
    let step = seasonal_step(
        LifeStage::Adult,
        tracking(LifeStage::Adult, false),
        false,
        true,
    );
    assert_eq!(
        step,
        SeasonalStep::Force {
            previous: LifeStage::Adult
        }
    );
}

#[test]
fn test_forced_tree_holds_through_winter() {
    let step = seasonal_step(LifeStage::Dead, tracking(LifeStage::Adult, true), false, true);
    assert_eq!(step, SeasonalStep::Hold);
}

#[test]
fn test_leaving_winter_restores_previous_stage() {
    let step = seasonal_step(LifeStage::Dead, tracking(LifeStage::Adult, true), false, false);
    assert_eq!(
        step,
        SeasonalStep::Revert {
            restore: Some(LifeStage::Adult),
            previous: LifeStage::Adult,
        }
    );
}

#[test]
fn test_genuine_death_is_never_reverted() {
    for forcing in [true, false] {
        let step = seasonal_step(
            LifeStage::Dead,
            tracking(LifeStage::Elderly, false),
            false,
            forcing,
        );
        assert_eq!(step, SeasonalStep::Hold, "forcing_winter={}", forcing);
    }
}

#[test]
fn test_tree_classified_while_dead_only_clears_flag() {
    let step = seasonal_step(LifeStage::Dead, tracking(LifeStage::Dead, true), false, false);
    assert_eq!(
        step,
        SeasonalStep::Revert {
            restore: None,
            previous: LifeStage::Dead,
        }
    );
}

#[test]
fn test_external_change_is_retracked_before_forcing() {
    // Stage moved from Teen to Adult on the tick winter starts.
    let step = seasonal_step(LifeStage::Adult, tracking(LifeStage::Teen, false), false, true);
    assert_eq!(
        step,
        SeasonalStep::Retrack {
            previous: LifeStage::Adult
        }
    );
    // Next tick the remembered stage matches and forcing applies.
    let step = seasonal_step(LifeStage::Adult, tracking(LifeStage::Adult, false), false, true);
    assert_eq!(
        step,
        SeasonalStep::Force {
            previous: LifeStage::Adult
        }
    );
}

#[test]
fn test_stage_rewritten_while_forced_is_kept_after_winter() {
    let step = seasonal_step(
        LifeStage::Elderly,
        tracking(LifeStage::Adult, true),
        false,
        false,
    );
    assert_eq!(
        step,
        SeasonalStep::Revert {
            restore: None,
            previous: LifeStage::Elderly,
        }
    );
}

#[test]
fn test_stage_rewritten_while_forced_holds_in_winter() {
    let step = seasonal_step(LifeStage::Teen, tracking(LifeStage::Adult, true), false, true);
    assert_eq!(step, SeasonalStep::Hold);
}

#[test]
fn test_lumber_takes_precedence_over_everything() {
    for state in LifeStage::ALL {
        for technically_dead in [false, true] {
            for forcing in [false, true] {
                let t = tracking(LifeStage::Adult, technically_dead);
                let step = seasonal_step(state, t, true, forcing);
                let expected_restore = (technically_dead && state == LifeStage::Dead)
                    .then_some(LifeStage::Adult);
                assert_eq!(
                    step,
                    SeasonalStep::Release {
                        restore: expected_restore
                    }
                );
            }
        }
    }
}

#[test]
fn test_force_mutations_keep_growth() {
    let entity = Entity::from_raw(3);
    let tree = Tree {
        state: LifeStage::Adult,
        growth: 120,
    };
    let mutations = step_mutations(
        entity,
        tree,
        SeasonalStep::Force {
            previous: LifeStage::Adult,
        },
    );
    assert_eq!(
        mutations,
        vec![
            VegetationMutation::SetTree {
                entity,
                tree: Tree {
                    state: LifeStage::Dead,
                    growth: 120,
                },
            },
            VegetationMutation::Track {
                entity,
                tracking: tracking(LifeStage::Adult, true),
            },
        ]
    );
}

#[test]
fn test_release_restores_before_untracking() {
    let entity = Entity::from_raw(4);
    let mutations = step_mutations(
        entity,
        Tree::new(LifeStage::Dead),
        SeasonalStep::Release {
            restore: Some(LifeStage::Teen),
        },
    );
    assert_eq!(mutations.len(), 2);
    assert!(matches!(
        mutations[0],
        VegetationMutation::SetTree { tree, .. } if tree.state == LifeStage::Teen
    ));
    assert_eq!(mutations[1], VegetationMutation::Untrack { entity });
}

#[test]
fn test_hold_produces_no_mutations() {
    let mutations = step_mutations(
        Entity::from_raw(5),
        Tree::new(LifeStage::Adult),
        SeasonalStep::Hold,
    );
    assert!(mutations.is_empty());
}

#[test]
fn test_full_year_cycle_returns_to_original_stage() {
    let mut state = LifeStage::Teen;
    let mut t = tracking(LifeStage::Teen, false);
    for season_is_winter in [false, false, false, true, true, false] {
        match seasonal_step(state, t, false, season_is_winter) {
            SeasonalStep::Force { previous } => {
                state = LifeStage::Dead;
                t = tracking(previous, true);
            }
            SeasonalStep::Revert { restore, previous } => {
                if let Some(restored) = restore {
                    state = restored;
                }
                t = tracking(previous, false);
            }
            SeasonalStep::Hold => {}
            other => panic!("unexpected step {:?}", other),
        }
    }
    assert_eq!(state, LifeStage::Teen);
    assert!(!t.technically_dead);
}
