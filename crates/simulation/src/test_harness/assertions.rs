//! Assertion helpers for `TestForest` integration tests.

use bevy::prelude::*;

use crate::components::{DeciduousTracking, LifeStage};

use super::TestForest;

impl TestForest {
    pub fn assert_state(&self, entity: Entity, expected: LifeStage) {
        let actual = self.tree(entity).map(|t| t.state);
        assert_eq!(
            actual,
            Some(expected),
            "entity {entity:?}: expected stage {expected:?}, got {actual:?}"
        );
    }

    /// The tree shows a forced death remembering `previous`.
    pub fn assert_forced_dead(&self, entity: Entity, previous: LifeStage) {
        self.assert_state(entity, LifeStage::Dead);
        assert_eq!(
            self.tracking(entity),
            Some(DeciduousTracking {
                previous_state: previous,
                technically_dead: true,
            }),
            "entity {entity:?} should be forced dead from {previous:?}"
        );
    }

    pub fn assert_untracked(&self, entity: Entity) {
        assert!(
            self.tracking(entity).is_none(),
            "entity {entity:?} should carry no DeciduousTracking"
        );
    }

    pub fn assert_has<T: Component>(&self, entity: Entity) {
        assert!(
            self.has::<T>(entity),
            "entity {entity:?} should carry {}",
            std::any::type_name::<T>()
        );
    }

    pub fn assert_lacks<T: Component>(&self, entity: Entity) {
        assert!(
            !self.has::<T>(entity),
            "entity {entity:?} should not carry {}",
            std::any::type_name::<T>()
        );
    }
}
