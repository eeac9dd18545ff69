//! Procedural demo forest.
//!
//! Two OpenSimplex2 fields drive the layout: a density field decides which
//! grid cells hold an instance, and a climate field splits the map into a
//! conifer belt and broadleaf stands. Placement is fully determined by the
//! seed.

use bevy::prelude::*;
use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};

use simulation::catalog::{CatalogEntry, PrefabId, VegetationCatalog};
use simulation::components::{HarvestArea, LifeStage, Plant, SubObjects, Tree, Vegetation};

pub mod prefabs {
    use simulation::catalog::PrefabId;

    pub const OAK: PrefabId = PrefabId(1);
    pub const BIRCH: PrefabId = PrefabId(2);
    pub const MAPLE: PrefabId = PrefabId(3);
    pub const PINE: PrefabId = PrefabId(4);
    pub const SPRUCE: PrefabId = PrefabId(5);
    pub const FERN: PrefabId = PrefabId(6);
    pub const SHRUB: PrefabId = PrefabId(7);
}

pub fn register_catalog(catalog: &mut VegetationCatalog) {
    catalog.insert(prefabs::OAK, CatalogEntry::tree("oak", false, 8));
    catalog.insert(prefabs::BIRCH, CatalogEntry::tree("birch", false, 4));
    catalog.insert(prefabs::MAPLE, CatalogEntry::tree("maple", false, 6));
    catalog.insert(prefabs::PINE, CatalogEntry::tree("pine", true, 7));
    catalog.insert(prefabs::SPRUCE, CatalogEntry::tree("spruce", true, 5));
    catalog.insert(prefabs::FERN, CatalogEntry::plant("fern"));
    catalog.insert(prefabs::SHRUB, CatalogEntry::plant("shrub"));
}

#[derive(Resource, Debug, Clone, Copy)]
pub struct ForestLayout {
    pub seed: i32,
    /// Instances are placed in `[-half_extent, half_extent]` on X and Z.
    pub half_extent: f32,
    pub spacing: f32,
    /// Density noise threshold in [0, 1]; higher means sparser.
    pub threshold: f32,
}

impl Default for ForestLayout {
    fn default() -> Self {
        Self {
            seed: 7,
            half_extent: 300.0,
            spacing: 6.0,
            threshold: 0.45,
        }
    }
}

/// One instance to spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub prefab: PrefabId,
    /// `None` for plants.
    pub stage: Option<LifeStage>,
    pub position: Vec3,
}

fn noise_field(seed: i32, frequency: f32, octaves: i32) -> FastNoiseLite {
    let mut noise = FastNoiseLite::with_seed(seed);
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_frequency(Some(frequency));
    noise.set_fractal_type(Some(FractalType::FBm));
    noise.set_fractal_octaves(Some(octaves));
    noise
}

/// Noise sample normalized to [0, 1].
fn sample(noise: &FastNoiseLite, x: f32, z: f32) -> f32 {
    ((noise.get_noise_2d(x, z) + 1.0) * 0.5).clamp(0.0, 1.0)
}

fn pick_stage(v: f32) -> LifeStage {
    match v {
        v if v < 0.2 => LifeStage::Child,
        v if v < 0.4 => LifeStage::Teen,
        v if v < 0.75 => LifeStage::Adult,
        v if v < 0.92 => LifeStage::Elderly,
        v if v < 0.97 => LifeStage::Dead,
        _ => LifeStage::Stump,
    }
}

pub fn plan_forest(layout: &ForestLayout) -> Vec<Placement> {
    let density = noise_field(layout.seed, 0.012, 4);
    let climate = noise_field(layout.seed.wrapping_add(101), 0.004, 2);
    let detail = noise_field(layout.seed.wrapping_add(202), 0.35, 1);

    let cells = (2.0 * layout.half_extent / layout.spacing).floor().max(0.0) as i32;
    let mut placements = Vec::new();
    for gz in 0..cells {
        for gx in 0..cells {
            let x = -layout.half_extent + (gx as f32 + 0.5) * layout.spacing;
            let z = -layout.half_extent + (gz as f32 + 0.5) * layout.spacing;
            let d = sample(&density, x, z);
            if d < layout.threshold {
                continue;
            }

            let jitter = layout.spacing * 0.4;
            let jx = (sample(&detail, x, z) - 0.5) * 2.0 * jitter;
            let jz = (sample(&detail, z, x) - 0.5) * 2.0 * jitter;
            let position = Vec3::new(x + jx, 0.0, z + jz);

            let variety = sample(&detail, x * 0.5 + 17.0, z * 0.5 - 9.0);
            let conifer = sample(&climate, x, z) > 0.55;
            let undergrowth = d < layout.threshold + 0.05;

            let placement = if undergrowth {
                Placement {
                    prefab: if variety < 0.5 {
                        prefabs::FERN
                    } else {
                        prefabs::SHRUB
                    },
                    stage: None,
                    position,
                }
            } else {
                let prefab = match (conifer, variety) {
                    (true, v) if v < 0.6 => prefabs::PINE,
                    (true, _) => prefabs::SPRUCE,
                    (false, v) if v < 0.4 => prefabs::OAK,
                    (false, v) if v < 0.75 => prefabs::MAPLE,
                    (false, _) => prefabs::BIRCH,
                };
                let age = sample(&detail, x + 311.0, z - 127.0);
                Placement {
                    prefab,
                    stage: Some(pick_stage(age)),
                    position,
                }
            };
            placements.push(placement);
        }
    }
    placements
}

pub fn spawn_forest(world: &mut World, layout: &ForestLayout) -> Vec<Entity> {
    let placements = plan_forest(layout);
    let mut spawned = Vec::with_capacity(placements.len());
    for placement in placements {
        let base = (
            Vegetation {
                prefab: placement.prefab,
            },
            Transform::from_translation(placement.position),
        );
        let entity = match placement.stage {
            Some(stage) => world.spawn((base, Tree::new(stage))).id(),
            None => world.spawn((base, Plant)).id(),
        };
        spawned.push(entity);
    }
    spawned
}

/// Marks every tree inside the square around `center` as a harvest resource.
pub fn spawn_harvest_area(world: &mut World, center: Vec3, half_size: f32) -> Entity {
    let mut query = world.query_filtered::<(Entity, &Transform), With<Tree>>();
    let resources: Vec<Entity> = query
        .iter(world)
        .filter(|(_, t)| {
            (t.translation.x - center.x).abs() <= half_size
                && (t.translation.z - center.z).abs() <= half_size
        })
        .map(|(e, _)| e)
        .collect();
    info!(
        "Harvest area at ({:.0}, {:.0}) covers {} trees",
        center.x,
        center.z,
        resources.len()
    );
    world.spawn(HarvestArea { resources }).id()
}

/// Groups every instance inside the square around `center` under one owner,
/// the way a park or road segment owns its planted vegetation.
pub fn spawn_park(world: &mut World, center: Vec3, half_size: f32) -> Entity {
    let mut query = world.query_filtered::<(Entity, &Transform), With<Vegetation>>();
    let members: Vec<Entity> = query
        .iter(world)
        .filter(|(_, t)| {
            (t.translation.x - center.x).abs() <= half_size
                && (t.translation.z - center.z).abs() <= half_size
        })
        .map(|(e, _)| e)
        .collect();
    info!(
        "Park at ({:.0}, {:.0}) owns {} instances",
        center.x,
        center.z,
        members.len()
    );
    world.spawn(SubObjects(members)).id()
}

/// Startup system: catalog, forest, one harvest area and one park.
pub fn populate_world(world: &mut World) {
    let layout = world
        .get_resource::<ForestLayout>()
        .copied()
        .unwrap_or_default();
    register_catalog(&mut world.resource_mut::<VegetationCatalog>());
    let spawned = spawn_forest(world, &layout);
    info!(
        "Forest generated: {} instances (seed {}, extent {:.0})",
        spawned.len(),
        layout.seed,
        layout.half_extent * 2.0
    );
    spawn_harvest_area(world, Vec3::new(layout.half_extent * 0.5, 0.0, 0.0), 40.0);
    spawn_park(world, Vec3::new(-layout.half_extent * 0.5, 0.0, 0.0), 30.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_deterministic() {
        let layout = ForestLayout {
            half_extent: 100.0,
            ..Default::default()
        };
        assert_eq!(plan_forest(&layout), plan_forest(&layout));
    }

    #[test]
    fn test_placements_stay_inside_extent() {
        let layout = ForestLayout {
            half_extent: 80.0,
            threshold: 0.0,
            ..Default::default()
        };
        let placements = plan_forest(&layout);
        assert!(!placements.is_empty());
        for p in &placements {
            assert!(p.position.x.abs() <= layout.half_extent);
            assert!(p.position.z.abs() <= layout.half_extent);
        }
    }

    #[test]
    fn test_plants_have_no_stage() {
        let layout = ForestLayout {
            half_extent: 150.0,
            threshold: 0.3,
            ..Default::default()
        };
        for p in plan_forest(&layout) {
            let plant = p.prefab == prefabs::FERN || p.prefab == prefabs::SHRUB;
            assert_eq!(plant, p.stage.is_none());
        }
    }

    #[test]
    fn test_every_prefab_is_registered() {
        let mut catalog = VegetationCatalog::default();
        register_catalog(&mut catalog);
        for id in 1..=7 {
            assert!(catalog.contains(PrefabId(id)));
        }
        assert_eq!(catalog.tree_evergreen(prefabs::PINE), Some(true));
        assert_eq!(catalog.tree_evergreen(prefabs::FERN), None);
    }

    #[test]
    fn test_park_owns_only_instances_inside_its_square() {
        let mut world = World::new();
        let inside = world
            .spawn((
                Vegetation { prefab: prefabs::FERN },
                Plant,
                Transform::from_xyz(-95.0, 0.0, 5.0),
            ))
            .id();
        let tree = world
            .spawn((
                Vegetation { prefab: prefabs::OAK },
                Tree::new(LifeStage::Adult),
                Transform::from_xyz(-105.0, 0.0, -8.0),
            ))
            .id();
        world.spawn((
            Vegetation { prefab: prefabs::OAK },
            Tree::new(LifeStage::Adult),
            Transform::from_xyz(50.0, 0.0, 0.0),
        ));

        let park = spawn_park(&mut world, Vec3::new(-100.0, 0.0, 0.0), 10.0);
        let owned = world.get::<SubObjects>(park).expect("park owns sub-objects");
        assert_eq!(owned.0.len(), 2);
        assert!(owned.0.contains(&inside));
        assert!(owned.0.contains(&tree));
    }

    #[test]
    fn test_stage_bands_cover_unit_interval() {
        assert_eq!(pick_stage(0.0), LifeStage::Child);
        assert_eq!(pick_stage(0.5), LifeStage::Adult);
        assert_eq!(pick_stage(1.0), LifeStage::Stump);
    }
}
