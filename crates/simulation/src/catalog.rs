//! Read-only vegetation prefab catalog.
//!
//! The asset layer registers one `CatalogEntry` per vegetation prefab. The
//! pipeline only queries capabilities; the single piece of state it owns is
//! the placement footprint bookkeeping in `FootprintRecord`.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::STUMP_MESH_VARIANT_THRESHOLD;

/// Stable identity of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrefabId(pub u32);

/// Placement footprint in world units (width x depth).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: f32,
    pub depth: f32,
}

impl Footprint {
    pub fn new(width: f32, depth: f32) -> Self {
        Self { width, depth }
    }
}

/// Capability descriptor of one vegetation prefab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    /// The prefab carries tree-growth data (ages through life stages).
    pub tree_growth: bool,
    pub evergreen: bool,
    /// Number of alternate mesh variants.
    pub mesh_variants: u8,
    /// Footprint used when placing the prefab.
    pub footprint: Footprint,
    /// Footprint of the trunk alone.
    pub trunk_footprint: Footprint,
}

impl CatalogEntry {
    pub fn tree(name: impl Into<String>, evergreen: bool, mesh_variants: u8) -> Self {
        Self {
            name: name.into(),
            tree_growth: true,
            evergreen,
            mesh_variants,
            footprint: Footprint::new(6.0, 6.0),
            trunk_footprint: Footprint::new(1.0, 1.0),
        }
    }

    pub fn plant(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tree_growth: false,
            evergreen: false,
            mesh_variants: 1,
            footprint: Footprint::new(2.0, 2.0),
            trunk_footprint: Footprint::new(2.0, 2.0),
        }
    }

    /// Stump geometry ships only with prefabs that have enough mesh variants.
    pub fn has_stump_geometry(&self) -> bool {
        self.mesh_variants > STUMP_MESH_VARIANT_THRESHOLD
    }
}

/// Footprint bookkeeping recorded once per catalog entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootprintRecord {
    pub original: Footprint,
    pub reduced: bool,
}

/// All vegetation prefabs known to the asset layer.
#[derive(Resource, Debug, Default)]
pub struct VegetationCatalog {
    entries: HashMap<PrefabId, CatalogEntry>,
    footprints: HashMap<PrefabId, FootprintRecord>,
}

impl VegetationCatalog {
    pub fn insert(&mut self, id: PrefabId, entry: CatalogEntry) {
        self.entries.insert(id, entry);
    }

    pub fn get(&self, id: PrefabId) -> Option<&CatalogEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: PrefabId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = PrefabId> + '_ {
        self.entries.keys().copied()
    }

    /// `Some(true)` for evergreen trees, `Some(false)` for deciduous trees,
    /// `None` for unknown prefabs and plain plants.
    pub fn tree_evergreen(&self, id: PrefabId) -> Option<bool> {
        self.get(id)
            .filter(|entry| entry.tree_growth)
            .map(|entry| entry.evergreen)
    }

    pub fn footprint_record(&self, id: PrefabId) -> Option<&FootprintRecord> {
        self.footprints.get(&id)
    }

    /// Records the original footprint of every tree entry not yet marked and
    /// applies (or reverts) the trunk-only placement footprint.
    ///
    /// Returns the number of entries whose placement footprint changed.
    pub fn sync_footprints(&mut self, reduced: bool) -> usize {
        let mut changed = 0;
        for (id, entry) in self.entries.iter_mut() {
            if !entry.tree_growth {
                continue;
            }
            let record = self.footprints.entry(*id).or_insert(FootprintRecord {
                original: entry.footprint,
                reduced: false,
            });
            if record.reduced == reduced {
                continue;
            }
            entry.footprint = if reduced {
                entry.trunk_footprint
            } else {
                record.original
            };
            record.reduced = reduced;
            changed += 1;
        }
        changed
    }

    /// Some tree entry is unmarked or its placement footprint disagrees
    /// with the requested mode.
    pub fn needs_footprint_sync(&self, reduced: bool) -> bool {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.tree_growth)
            .any(|(id, _)| {
                self.footprints
                    .get(id)
                    .is_none_or(|record| record.reduced != reduced)
            })
    }
}

/// Prefabs picked by the tool as the sampling pool for prefab replacement.
/// Consumed as an immutable snapshot per mutation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    pub prefabs: Vec<PrefabId>,
}

impl SelectionSet {
    pub fn new(prefabs: impl IntoIterator<Item = PrefabId>) -> Self {
        Self {
            prefabs: prefabs.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prefabs.is_empty()
    }
}

pub struct CatalogPlugin;

impl Plugin for CatalogPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VegetationCatalog>();
    }
}
