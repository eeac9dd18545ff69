//! Per-instance data for vegetation entities.
//!
//! A vegetation instance is an entity carrying `Vegetation` plus exactly one
//! capability component: `Tree` (ages through life stages) or `Plant`
//! (static). Everything else is a presence-based tag.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog::PrefabId;

/// Ordered life stage of a tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum LifeStage {
    Child,
    Teen,
    #[default]
    Adult,
    Elderly,
    Dead,
    Stump,
}

impl LifeStage {
    pub const ALL: [LifeStage; 6] = [
        LifeStage::Child,
        LifeStage::Teen,
        LifeStage::Adult,
        LifeStage::Elderly,
        LifeStage::Dead,
        LifeStage::Stump,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LifeStage::Child => "Child",
            LifeStage::Teen => "Teen",
            LifeStage::Adult => "Adult",
            LifeStage::Elderly => "Elderly",
            LifeStage::Dead => "Dead",
            LifeStage::Stump => "Stump",
        }
    }

    /// Stage reached when growth overflows. Dead and Stump are terminal.
    pub fn next(self) -> Option<LifeStage> {
        match self {
            LifeStage::Child => Some(LifeStage::Teen),
            LifeStage::Teen => Some(LifeStage::Adult),
            LifeStage::Adult => Some(LifeStage::Elderly),
            LifeStage::Elderly => Some(LifeStage::Dead),
            LifeStage::Dead | LifeStage::Stump => None,
        }
    }
}

/// Common record of every vegetation instance.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vegetation {
    pub prefab: PrefabId,
}

/// Tree capability: life stage plus progress towards the next stage.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tree {
    pub state: LifeStage,
    pub growth: u8,
}

impl Tree {
    pub fn new(state: LifeStage) -> Self {
        Self { state, growth: 0 }
    }
}

/// Plant capability: vegetation without tree-growth data.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Plant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VegetationKind {
    Tree,
    Plant,
}

/// Seasonal tracking data of a deciduous tree.
///
/// `previous_state` is only meaningful while the component is attached;
/// once it is removed `Tree::state` is authoritative. `technically_dead`
/// means the current `Dead` stage was injected by winter forcing.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeciduousTracking {
    pub previous_state: LifeStage,
    pub technically_dead: bool,
}

impl DeciduousTracking {
    /// Tracking data for a tree that has just been classified.
    pub fn observe(state: LifeStage) -> Self {
        Self {
            previous_state: state,
            technically_dead: state == LifeStage::Dead,
        }
    }

    /// The tree is currently showing a forced, not a genuine, death.
    pub fn is_forced_dead(&self, state: LifeStage) -> bool {
        self.technically_dead && state == LifeStage::Dead
    }
}

/// Tree whose prefab keeps its foliage all year.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Evergreen;

/// Aging of this tree is suspended.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoGrowth;

/// Tree referenced by a harvest area. Exempt from seasonal forcing and
/// from the growth gate.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lumber {
    pub area: Entity,
}

/// Prefab or capability changed this tick.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecentlyChanged;

/// Visual state changed this tick; renderers refresh the instance.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Updated;

/// Host lifecycle marker: pending removal.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deleted;

/// Host lifecycle marker: placement preview, not a real instance.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Temporary;

/// Host lifecycle marker: hidden by another object.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Overridden;

/// Harvest area (forestry district, lumber extractor) with the tree
/// instances it currently references.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestArea {
    pub resources: Vec<Entity>,
}

/// Sub-objects owned by a building or network segment.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct SubObjects(pub Vec<Entity>);

/// Data of one vegetation instance, read from its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceSnapshot {
    pub prefab: PrefabId,
    pub tree: Option<Tree>,
    pub tracking: Option<DeciduousTracking>,
}

impl InstanceSnapshot {
    pub fn kind(&self) -> VegetationKind {
        if self.tree.is_some() {
            VegetationKind::Tree
        } else {
            VegetationKind::Plant
        }
    }
}
