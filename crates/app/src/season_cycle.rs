//! Stand-in climate model: advances the season every fixed number of ticks
//! and writes it to `SeasonSignal`.

use bevy::prelude::*;

use simulation::season::{Season, SeasonSignal};
use simulation::SimulationSet;

#[derive(Resource, Debug, Clone)]
pub struct SeasonCycle {
    pub ticks_per_season: u32,
    pub elapsed: u32,
    pub paused: bool,
}

impl Default for SeasonCycle {
    fn default() -> Self {
        Self {
            ticks_per_season: 300,
            elapsed: 0,
            paused: false,
        }
    }
}

impl SeasonCycle {
    /// Advances one tick. Returns the next season when the current one ends.
    pub fn advance(&mut self, current: Season) -> Option<Season> {
        if self.paused || self.ticks_per_season == 0 {
            return None;
        }
        self.elapsed += 1;
        if self.elapsed < self.ticks_per_season {
            return None;
        }
        self.elapsed = 0;
        Some(current.next())
    }
}

pub fn advance_season(mut cycle: ResMut<SeasonCycle>, mut signal: ResMut<SeasonSignal>) {
    if let Some(next) = cycle.advance(signal.season) {
        signal.season = next;
    }
}

/// `N` skips to the next season, `P` pauses the calendar.
pub fn season_hotkeys(
    keys: Res<ButtonInput<KeyCode>>,
    mut cycle: ResMut<SeasonCycle>,
    mut signal: ResMut<SeasonSignal>,
) {
    if keys.just_pressed(KeyCode::KeyN) {
        signal.season = signal.season.next();
        cycle.elapsed = 0;
    }
    if keys.just_pressed(KeyCode::KeyP) {
        cycle.paused = !cycle.paused;
        info!(
            "Season cycle {}",
            if cycle.paused { "paused" } else { "resumed" }
        );
    }
}

pub struct SeasonCyclePlugin;

impl Plugin for SeasonCyclePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SeasonCycle>().add_systems(
            FixedUpdate,
            advance_season.in_set(SimulationSet::PreSim),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_flips_after_full_span() {
        let mut cycle = SeasonCycle {
            ticks_per_season: 3,
            ..Default::default()
        };
        assert_eq!(cycle.advance(Season::Autumn), None);
        assert_eq!(cycle.advance(Season::Autumn), None);
        assert_eq!(cycle.advance(Season::Autumn), Some(Season::Winter));
        assert_eq!(cycle.elapsed, 0);
    }

    #[test]
    fn test_paused_cycle_holds() {
        let mut cycle = SeasonCycle {
            ticks_per_season: 1,
            paused: true,
            ..Default::default()
        };
        assert_eq!(cycle.advance(Season::Spring), None);
    }
}
