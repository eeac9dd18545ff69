//! Seasonal state machine for deciduous trees.
//!
//! While winter forcing is in effect, every tracked, non-lumber tree is
//! switched to the `Dead` stage and flagged `technically_dead`, remembering
//! its real stage in `DeciduousTracking::previous_state`. When winter ends
//! the remembered stage is restored. A tree that dies for real (not flagged)
//! is never revived.
//!
//! The decision for one tree is the pure function `seasonal_step`; the
//! systems only gather inputs and translate steps into queued mutations.

pub mod systems;
pub mod transition;

#[cfg(test)]
mod tests_transition;

pub use systems::{advance_seasonal_state, release_misclassified_evergreens, SeasonalPlugin};
pub use transition::{seasonal_step, step_mutations, SeasonalStep};
