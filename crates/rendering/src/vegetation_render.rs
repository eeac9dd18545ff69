//! Instance visuals: one cone per tree, one sphere per plant, tinted and
//! scaled by life stage.
//!
//! Visuals are attached to vegetation entities on first sight and refreshed
//! whenever the simulation rewrites the tree record or swaps the prefab.

use bevy::prelude::*;

use simulation::components::{Evergreen, LifeStage, Plant, Tree, Vegetation};

/// Visual bucket of one instance; each bucket has its own material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKey {
    Stage(LifeStage),
    EvergreenStage(LifeStage),
    Plant,
}

impl VisualKey {
    pub fn of(tree: Option<&Tree>, evergreen: bool) -> Self {
        match tree {
            Some(tree) if evergreen => VisualKey::EvergreenStage(tree.state),
            Some(tree) => VisualKey::Stage(tree.state),
            None => VisualKey::Plant,
        }
    }

    fn color(self) -> Color {
        match self {
            VisualKey::Plant => Color::srgb(0.45, 0.75, 0.35),
            VisualKey::Stage(stage) => stage_color(stage, false),
            VisualKey::EvergreenStage(stage) => stage_color(stage, true),
        }
    }
}

fn stage_color(stage: LifeStage, evergreen: bool) -> Color {
    match (stage, evergreen) {
        (LifeStage::Dead, _) => Color::srgb(0.45, 0.38, 0.30),
        (LifeStage::Stump, _) => Color::srgb(0.35, 0.25, 0.15),
        (LifeStage::Elderly, false) => Color::srgb(0.55, 0.60, 0.25),
        (_, false) => Color::srgb(0.35, 0.70, 0.30),
        (LifeStage::Elderly, true) => Color::srgb(0.15, 0.35, 0.20),
        (_, true) => Color::srgb(0.10, 0.45, 0.25),
    }
}

/// Uniform scale applied to the instance mesh.
pub fn stage_scale(tree: Option<&Tree>) -> f32 {
    match tree.map(|t| t.state) {
        None => 0.6,
        Some(LifeStage::Child) => 0.35,
        Some(LifeStage::Teen) => 0.6,
        Some(LifeStage::Adult) => 1.0,
        Some(LifeStage::Elderly) => 1.15,
        Some(LifeStage::Dead) => 0.9,
        Some(LifeStage::Stump) => 0.2,
    }
}

#[derive(Resource)]
pub struct VegetationAssets {
    tree_mesh: Handle<Mesh>,
    plant_mesh: Handle<Mesh>,
    materials: Vec<(VisualKey, Handle<StandardMaterial>)>,
}

impl VegetationAssets {
    fn mesh(&self, key: VisualKey) -> Handle<Mesh> {
        match key {
            VisualKey::Plant => self.plant_mesh.clone(),
            _ => self.tree_mesh.clone(),
        }
    }

    fn material(&self, key: VisualKey) -> Option<Handle<StandardMaterial>> {
        self.materials
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, handle)| handle.clone())
    }
}

pub fn setup_vegetation_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let keys = LifeStage::ALL
        .iter()
        .flat_map(|&stage| [VisualKey::Stage(stage), VisualKey::EvergreenStage(stage)])
        .chain(std::iter::once(VisualKey::Plant));
    let materials = keys
        .map(|key| {
            let handle = materials.add(StandardMaterial {
                base_color: key.color(),
                perceptual_roughness: 0.9,
                ..default()
            });
            (key, handle)
        })
        .collect();

    commands.insert_resource(VegetationAssets {
        tree_mesh: meshes.add(Cone {
            radius: 2.5,
            height: 8.0,
        }),
        plant_mesh: meshes.add(Sphere::new(1.0)),
        materials,
    });
}

/// Gives newly placed instances a mesh.
pub fn attach_vegetation_visuals(
    mut commands: Commands,
    assets: Option<Res<VegetationAssets>>,
    fresh: Query<(Entity, Option<&Tree>, Has<Evergreen>), (With<Vegetation>, Without<Mesh3d>)>,
) {
    let Some(assets) = assets else {
        return;
    };
    for (entity, tree, evergreen) in &fresh {
        let key = VisualKey::of(tree, evergreen);
        let Some(material) = assets.material(key) else {
            continue;
        };
        commands.entity(entity).insert((
            Mesh3d(assets.mesh(key)),
            MeshMaterial3d(material),
            Visibility::default(),
        ));
    }
}

/// Re-tints and re-scales instances whose tree record or prefab changed.
#[allow(clippy::type_complexity)]
pub fn refresh_vegetation_visuals(
    assets: Option<Res<VegetationAssets>>,
    mut changed: Query<
        (
            &mut Mesh3d,
            &mut MeshMaterial3d<StandardMaterial>,
            &mut Transform,
            Option<&Tree>,
            Has<Evergreen>,
        ),
        (
            With<Vegetation>,
            Or<(
                Added<Mesh3d>,
                Changed<Tree>,
                Changed<Vegetation>,
                Added<Plant>,
                Added<Evergreen>,
            )>,
        ),
    >,
) {
    let Some(assets) = assets else {
        return;
    };
    for (mut mesh, mut material, mut transform, tree, evergreen) in &mut changed {
        let key = VisualKey::of(tree, evergreen);
        if let Some(handle) = assets.material(key) {
            material.0 = handle;
        }
        mesh.0 = assets.mesh(key);
        transform.scale = Vec3::splat(stage_scale(tree));
    }
}
