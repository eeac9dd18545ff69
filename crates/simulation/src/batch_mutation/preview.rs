//! Per-frame radius preview. Visual output only; never touches the
//! population.

use bevy::prelude::*;

use super::types::{OverlayCircle, RadiusPreview};

pub fn emit_radius_preview(preview: Res<RadiusPreview>, mut overlays: EventWriter<OverlayCircle>) {
    let Some(circle) = preview.circle else {
        return;
    };
    overlays.send(OverlayCircle {
        center: circle.center,
        radius: circle.radius,
    });
}
