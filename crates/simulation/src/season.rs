//! Read-only season signal consumed from the host climate model.
//!
//! The host writes `SeasonSignal` whenever its calendar moves; the pipeline
//! only ever reads it (through `PassContext`).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [
        Season::Spring,
        Season::Summer,
        Season::Autumn,
        Season::Winter,
    ];

    pub fn from_day(day: u32) -> Season {
        // 360-day year: 90 days per season (30 days/month, 3 months/season)
        let day_of_year = ((day.saturating_sub(1)) % 360) + 1;
        match day_of_year {
            1..=90 => Season::Spring,
            91..=180 => Season::Summer,
            181..=270 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
        }
    }

    pub fn next(self) -> Season {
        match self {
            Season::Spring => Season::Summer,
            Season::Summer => Season::Autumn,
            Season::Autumn => Season::Winter,
            Season::Winter => Season::Spring,
        }
    }
}

/// Current season as reported by the host.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonSignal {
    pub season: Season,
}

impl Default for SeasonSignal {
    fn default() -> Self {
        Self::new(Season::Spring)
    }
}

impl SeasonSignal {
    pub fn new(season: Season) -> Self {
        Self { season }
    }
}

/// Logs every season flip the host reports.
fn log_season_transitions(signal: Res<SeasonSignal>, mut last: Local<Option<Season>>) {
    let current = signal.season;
    match *last {
        Some(previous) if previous != current => {
            info!("Season changed: {} -> {}", previous.name(), current.name());
        }
        None => debug!("Season signal starts at {}", current.name()),
        _ => {}
    }
    *last = Some(current);
}

pub struct SeasonPlugin;

impl Plugin for SeasonPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SeasonSignal>().add_systems(
            FixedUpdate,
            log_season_transitions.in_set(crate::SimulationSet::PreSim),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_day_boundaries() {
        assert_eq!(Season::from_day(1), Season::Spring);
        assert_eq!(Season::from_day(90), Season::Spring);
        assert_eq!(Season::from_day(91), Season::Summer);
        assert_eq!(Season::from_day(181), Season::Autumn);
        assert_eq!(Season::from_day(271), Season::Winter);
        assert_eq!(Season::from_day(360), Season::Winter);
        assert_eq!(Season::from_day(361), Season::Spring);
    }

    #[test]
    fn test_day_zero_is_spring() {
        assert_eq!(Season::from_day(0), Season::Spring);
    }

    #[test]
    fn test_next_cycles_through_all_seasons() {
        let mut season = Season::Spring;
        for expected in Season::ALL.iter().cycle().skip(1).take(8) {
            season = season.next();
            assert_eq!(season, *expected);
        }
    }
}
