//! Read-only population census, refreshed on slow ticks.

use bevy::prelude::*;

use crate::components::{
    DeciduousTracking, Deleted, Evergreen, LifeStage, Lumber, NoGrowth, Plant, Tree, Vegetation,
};
use crate::simulation_sets::SimulationSet;
use crate::SlowTickTimer;

#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct VegetationCensus {
    pub trees: usize,
    pub plants: usize,
    pub evergreen: usize,
    pub tracked: usize,
    /// Tracked trees currently showing a forced death.
    pub forced_dead: usize,
    pub lumber: usize,
    pub no_growth: usize,
    /// Tree count per `LifeStage`, in `LifeStage::ALL` order.
    pub by_stage: [usize; 6],
}

/// Flags of one instance as seen by the census.
#[derive(Debug, Clone, Copy, Default)]
pub struct CensusRow {
    pub tree: Option<Tree>,
    pub plant: bool,
    pub evergreen: bool,
    pub tracking: Option<DeciduousTracking>,
    pub lumber: bool,
    pub no_growth: bool,
}

impl VegetationCensus {
    pub fn record(&mut self, row: CensusRow) {
        if let Some(tree) = row.tree {
            self.trees += 1;
            if let Some(idx) = LifeStage::ALL.iter().position(|s| *s == tree.state) {
                self.by_stage[idx] += 1;
            }
            if let Some(tracking) = row.tracking {
                self.tracked += 1;
                if tracking.is_forced_dead(tree.state) {
                    self.forced_dead += 1;
                }
            }
        } else if row.plant {
            self.plants += 1;
        }
        self.evergreen += row.evergreen as usize;
        self.lumber += row.lumber as usize;
        self.no_growth += row.no_growth as usize;
    }

    pub fn stage(&self, stage: LifeStage) -> usize {
        LifeStage::ALL
            .iter()
            .position(|s| *s == stage)
            .map(|idx| self.by_stage[idx])
            .unwrap_or(0)
    }
}

#[allow(clippy::type_complexity)]
pub fn refresh_census(
    timer: Res<SlowTickTimer>,
    mut census: ResMut<VegetationCensus>,
    population: Query<
        (
            Option<&Tree>,
            Has<Plant>,
            Has<Evergreen>,
            Option<&DeciduousTracking>,
            Has<Lumber>,
            Has<NoGrowth>,
        ),
        (With<Vegetation>, Without<Deleted>),
    >,
) {
    if !timer.should_run() {
        return;
    }
    let mut fresh = VegetationCensus::default();
    for (tree, plant, evergreen, tracking, lumber, no_growth) in &population {
        fresh.record(CensusRow {
            tree: tree.copied(),
            plant,
            evergreen,
            tracking: tracking.copied(),
            lumber,
            no_growth,
        });
    }
    debug!(
        "Census: trees={} plants={} evergreen={} tracked={} forced_dead={} lumber={} no_growth={}",
        fresh.trees,
        fresh.plants,
        fresh.evergreen,
        fresh.tracked,
        fresh.forced_dead,
        fresh.lumber,
        fresh.no_growth
    );
    *census = fresh;
}

pub struct CensusPlugin;

impl Plugin for CensusPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VegetationCensus>().add_systems(
            FixedUpdate,
            refresh_census.in_set(SimulationSet::PostSim),
        );
    }
}
