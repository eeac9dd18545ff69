//! Spawning helpers for vegetation instances, harvest areas and owners.

use bevy::prelude::*;

use crate::catalog::PrefabId;
use crate::components::{
    DeciduousTracking, HarvestArea, LifeStage, Plant, SubObjects, Tree, Vegetation,
};

use super::TestForest;

impl TestForest {
    pub fn spawn_tree(&mut self, prefab: PrefabId, state: LifeStage, position: Vec3) -> Entity {
        self.app
            .world_mut()
            .spawn((
                Vegetation { prefab },
                Tree::new(state),
                Transform::from_translation(position),
            ))
            .id()
    }

    pub fn spawn_plant(&mut self, prefab: PrefabId, position: Vec3) -> Entity {
        self.app
            .world_mut()
            .spawn((
                Vegetation { prefab },
                Plant,
                Transform::from_translation(position),
            ))
            .id()
    }

    /// Spawn `count` trees on a square grid with `spacing` between rows,
    /// starting at the origin.
    pub fn spawn_tree_grid(
        &mut self,
        prefab: PrefabId,
        state: LifeStage,
        count: usize,
        spacing: f32,
    ) -> Vec<Entity> {
        let side = (count as f64).sqrt().ceil().max(1.0) as usize;
        (0..count)
            .map(|i| {
                let x = (i % side) as f32 * spacing;
                let z = (i / side) as f32 * spacing;
                self.spawn_tree(prefab, state, Vec3::new(x, 0.0, z))
            })
            .collect()
    }

    /// Spawn a tree that already carries tracking data, bypassing
    /// classification.
    pub fn spawn_tracked_tree(
        &mut self,
        prefab: PrefabId,
        tree: Tree,
        tracking: DeciduousTracking,
    ) -> Entity {
        self.app
            .world_mut()
            .spawn((
                Vegetation { prefab },
                tree,
                tracking,
                Transform::default(),
            ))
            .id()
    }

    pub fn spawn_harvest_area(&mut self, resources: Vec<Entity>) -> Entity {
        self.app.world_mut().spawn(HarvestArea { resources }).id()
    }

    pub fn set_harvest_resources(&mut self, area: Entity, resources: Vec<Entity>) {
        if let Some(mut harvest) = self.app.world_mut().get_mut::<HarvestArea>(area) {
            harvest.resources = resources;
        }
    }

    pub fn spawn_owner(&mut self, children: Vec<Entity>) -> Entity {
        self.app.world_mut().spawn(SubObjects(children)).id()
    }

    pub fn insert(&mut self, entity: Entity, bundle: impl Bundle) {
        self.app.world_mut().entity_mut(entity).insert(bundle);
    }

    pub fn despawn(&mut self, entity: Entity) {
        self.app.world_mut().despawn(entity);
    }
}
