//! Builder and control methods for settings, season and tool requests.

use bevy::prelude::*;

use crate::batch_mutation::{BatchMutationRequest, PreviewCircle, RadiusPreview};
use crate::config::VegetationSettings;
use crate::lumber::LumberReconciliation;
use crate::safe_unwind::SafeUnwind;
use crate::season::{Season, SeasonSignal};

use super::TestForest;

impl TestForest {
    // -----------------------------------------------------------------------
    // Settings and season
    // -----------------------------------------------------------------------

    pub fn with_season(mut self, season: Season) -> Self {
        self.set_season(season);
        self
    }

    pub fn with_settings(mut self, settings: VegetationSettings) -> Self {
        self.app.insert_resource(settings);
        self
    }

    pub fn with_aging_step(mut self, step: u8) -> Self {
        self.update_settings(|s| s.aging_step = step);
        self
    }

    pub fn set_season(&mut self, season: Season) {
        self.app.insert_resource(SeasonSignal::new(season));
    }

    pub fn update_settings(&mut self, f: impl FnOnce(&mut VegetationSettings)) {
        let mut settings = self.app.world_mut().resource_mut::<VegetationSettings>();
        f(&mut settings);
    }

    // -----------------------------------------------------------------------
    // Tool entry points
    // -----------------------------------------------------------------------

    pub fn arm_lumber_reconciliation(&mut self) {
        self.app
            .world_mut()
            .resource_mut::<LumberReconciliation>()
            .arm();
    }

    pub fn arm_safe_unwind(&mut self) {
        self.app.world_mut().resource_mut::<SafeUnwind>().arm();
    }

    /// Queue a batch mutation; it is processed on the next tick.
    pub fn request(&mut self, request: BatchMutationRequest) {
        self.app.world_mut().send_event(request);
    }

    pub fn set_radius_preview(&mut self, center: Vec3, radius: f32) {
        self.app.world_mut().resource_mut::<RadiusPreview>().circle =
            Some(PreviewCircle { center, radius });
    }
}
