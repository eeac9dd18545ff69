//! Pure per-tree transition logic, testable without ECS.

use bevy::prelude::Entity;

use crate::components::{DeciduousTracking, LifeStage, Tree};
use crate::mutation_queue::VegetationMutation;

/// What the state machine does to one tracked tree this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonalStep {
    Hold,
    /// Drop tracking. `restore` is set when the tree was showing a forced
    /// death that must be undone first.
    Release { restore: Option<LifeStage> },
    /// The stage changed outside this system; remember the new one.
    Retrack { previous: LifeStage },
    /// Show the dead model for the winter.
    Force { previous: LifeStage },
    /// Winter is over: clear the flag, restoring the remembered stage if the
    /// tree still shows the forced death.
    Revert {
        restore: Option<LifeStage>,
        previous: LifeStage,
    },
}

/// Decides the step for one tracked tree.
///
/// Branches are checked in a fixed order: lumber exemption, tracking of
/// external changes, winter forcing, reversion. The first match wins, so a
/// tree whose stage changed on the very tick winter starts is retracked this
/// tick and forced on the next one.
pub fn seasonal_step(
    state: LifeStage,
    tracking: DeciduousTracking,
    lumber: bool,
    forcing_winter: bool,
) -> SeasonalStep {
    if lumber {
        return SeasonalStep::Release {
            restore: tracking
                .is_forced_dead(state)
                .then_some(tracking.previous_state),
        };
    }

    if !tracking.technically_dead && state != LifeStage::Dead && state != tracking.previous_state
    {
        return SeasonalStep::Retrack { previous: state };
    }

    if forcing_winter {
        if !tracking.technically_dead && state != LifeStage::Dead {
            return SeasonalStep::Force { previous: state };
        }
        return SeasonalStep::Hold;
    }

    if !tracking.technically_dead {
        return SeasonalStep::Hold;
    }

    if state == LifeStage::Dead {
        let previous = tracking.previous_state;
        SeasonalStep::Revert {
            restore: (previous != LifeStage::Dead).then_some(previous),
            previous,
        }
    } else {
        // Stage was rewritten while forced; keep the new one.
        SeasonalStep::Revert {
            restore: None,
            previous: state,
        }
    }
}

/// Mutations that carry out `step` for `entity`.
pub fn step_mutations(entity: Entity, tree: Tree, step: SeasonalStep) -> Vec<VegetationMutation> {
    let with_state = |state: LifeStage| VegetationMutation::SetTree {
        entity,
        tree: Tree { state, ..tree },
    };
    let track = |previous_state: LifeStage, technically_dead: bool| VegetationMutation::Track {
        entity,
        tracking: DeciduousTracking {
            previous_state,
            technically_dead,
        },
    };

    match step {
        SeasonalStep::Hold => Vec::new(),
        SeasonalStep::Release { restore } => restore
            .map(with_state)
            .into_iter()
            .chain(std::iter::once(VegetationMutation::Untrack { entity }))
            .collect(),
        SeasonalStep::Retrack { previous } => vec![track(previous, false)],
        SeasonalStep::Force { previous } => {
            vec![with_state(LifeStage::Dead), track(previous, true)]
        }
        SeasonalStep::Revert { restore, previous } => restore
            .map(with_state)
            .into_iter()
            .chain(std::iter::once(track(previous, false)))
            .collect(),
    }
}
