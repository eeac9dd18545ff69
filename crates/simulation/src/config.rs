use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::season::{Season, SeasonSignal};
use crate::Saveable;

/// Number of round-robin slices the classification pass splits the
/// population into. Each tick classifies one slice.
pub const CLASSIFICATION_SLICES: u32 = 16;

/// A catalog entry needs strictly more mesh variants than this to carry
/// stump geometry.
pub const STUMP_MESH_VARIANT_THRESHOLD: u8 = 5;

/// `GrowthProgress` value of a fully grown stage.
pub const FULL_GROWTH: u8 = 255;

/// Default growth gained per slow tick by the aging stand-in.
pub const DEFAULT_AGING_STEP: u8 = 32;

/// Player-facing toggles, polled by the passes every tick.
#[derive(
    Resource, Debug, Clone, Copy, Serialize, Deserialize, bitcode::Encode, bitcode::Decode, PartialEq,
)]
#[serde(default)]
pub struct VegetationSettings {
    /// Deciduous trees show the dead model during winter.
    pub winter_dead_model: bool,
    /// Freeze aging of every non-lumber tree.
    pub disable_all_growth: bool,
    /// Shrink placement footprints of tree prefabs to the trunk.
    pub reduced_footprint: bool,
    /// Growth gained per slow tick by trees without `NoGrowth`.
    pub aging_step: u8,
}

impl Default for VegetationSettings {
    fn default() -> Self {
        Self {
            winter_dead_model: true,
            disable_all_growth: false,
            reduced_footprint: false,
            aging_step: DEFAULT_AGING_STEP,
        }
    }
}

impl Saveable for VegetationSettings {
    const SAVE_KEY: &'static str = "vegetation_settings";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        if *self == Self::default() {
            return None;
        }
        Some(bitcode::encode(self))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        crate::decode_or_warn(Self::SAVE_KEY, bytes)
    }
}

/// Immutable snapshot of everything a pass reads from ambient state.
///
/// Systems capture it once at entry and hand it to the pure transition
/// functions, which never look at resources themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassContext {
    pub season: Season,
    pub winter_dead_model: bool,
    pub disable_all_growth: bool,
    pub reduced_footprint: bool,
}

impl PassContext {
    pub fn capture(settings: &VegetationSettings, season: &SeasonSignal) -> Self {
        Self {
            season: season.season,
            winter_dead_model: settings.winter_dead_model,
            disable_all_growth: settings.disable_all_growth,
            reduced_footprint: settings.reduced_footprint,
        }
    }

    /// Winter forcing is in effect this tick.
    pub fn forcing_winter(&self) -> bool {
        self.winter_dead_model && self.season == Season::Winter
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VegetationSettings>();

        app.init_resource::<crate::SaveableRegistry>();
        app.world_mut()
            .resource_mut::<crate::SaveableRegistry>()
            .register::<VegetationSettings>();
    }
}
