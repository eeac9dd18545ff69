//! Uniform sampling from the tool's pools and age resolution against the
//! target prefab.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::CatalogEntry;
use crate::components::{LifeStage, Tree};
use crate::config::FULL_GROWTH;

/// Draws one element uniformly at random. `None` for an empty pool.
pub fn pick<T: Copy, R: Rng + ?Sized>(pool: &[T], rng: &mut R) -> Option<T> {
    pool.choose(rng).copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeResolution {
    Exact(Tree),
    /// Stump was requested for a prefab without stump geometry; the fully
    /// grown dead model is shown instead.
    StumpFallback(Tree),
}

impl AgeResolution {
    pub fn tree(self) -> Tree {
        match self {
            AgeResolution::Exact(tree) | AgeResolution::StumpFallback(tree) => tree,
        }
    }

    pub fn fell_back(self) -> bool {
        matches!(self, AgeResolution::StumpFallback(_))
    }
}

/// Tree record for a requested stage on the given prefab.
pub fn resolve_age(requested: LifeStage, entry: &CatalogEntry) -> AgeResolution {
    if requested == LifeStage::Stump && !entry.has_stump_geometry() {
        return AgeResolution::StumpFallback(Tree {
            state: LifeStage::Dead,
            growth: FULL_GROWTH,
        });
    }
    AgeResolution::Exact(Tree::new(requested))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_pick_from_empty_pool_is_none() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let pool: [LifeStage; 0] = [];
        assert_eq!(pick(&pool, &mut rng), None);
    }

    #[test]
    fn test_pick_single_element_always_returns_it() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(pick(&[LifeStage::Teen], &mut rng), Some(LifeStage::Teen));
        }
    }

    #[test]
    fn test_pick_is_uniform() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let pool = [
            LifeStage::Child,
            LifeStage::Teen,
            LifeStage::Adult,
            LifeStage::Elderly,
        ];
        let mut counts = [0usize; 4];
        let samples = 10_000;
        for _ in 0..samples {
            let drawn = pick(&pool, &mut rng);
            let idx = pool.iter().position(|s| Some(*s) == drawn);
            if let Some(idx) = idx {
                counts[idx] += 1;
            }
        }
        let expected = samples as f64 / pool.len() as f64;
        for count in counts {
            let deviation = (count as f64 - expected).abs() / expected;
            assert!(
                deviation < 0.08,
                "count {} deviates {:.3} from expected {}",
                count,
                deviation,
                expected
            );
        }
    }

    #[test]
    fn test_stump_needs_stump_geometry() {
        let rich = CatalogEntry::tree("oak", false, 6);
        assert_eq!(
            resolve_age(LifeStage::Stump, &rich),
            AgeResolution::Exact(Tree::new(LifeStage::Stump))
        );

        let plain = CatalogEntry::tree("birch", false, 5);
        let resolved = resolve_age(LifeStage::Stump, &plain);
        assert!(resolved.fell_back());
        assert_eq!(
            resolved.tree(),
            Tree {
                state: LifeStage::Dead,
                growth: FULL_GROWTH,
            }
        );
    }

    #[test]
    fn test_other_stages_ignore_mesh_variants() {
        let plain = CatalogEntry::tree("birch", false, 1);
        for stage in [
            LifeStage::Child,
            LifeStage::Teen,
            LifeStage::Adult,
            LifeStage::Elderly,
            LifeStage::Dead,
        ] {
            assert_eq!(
                resolve_age(stage, &plain),
                AgeResolution::Exact(Tree::new(stage))
            );
        }
    }
}
