//! Keyboard and mouse bindings for the vegetation tools.
//!
//! | Input            | Action                                     |
//! |------------------|--------------------------------------------|
//! | `1`..`6`         | toggle a life stage in the age pool        |
//! | `[` / `]`        | shrink / grow the brush radius             |
//! | left click       | apply the age pool inside the brush        |
//! | `Shift` + click  | apply the age pool to the nearest instance |
//! | `Ctrl` + click   | apply the age pool to the nearest instance's owner (park, road) |
//! | `R`              | replace instances inside the brush with the prefab palette |
//! | `M`              | apply the age pool to the whole map        |
//! | `L`              | re-run lumber reconciliation               |
//! | `U`              | safe-unwind every seasonal override        |

use bevy::prelude::*;

use simulation::batch_mutation::{BatchMutationRequest, PreviewCircle, RadiusPreview, SelectionScope};
use simulation::catalog::{PrefabId, SelectionSet};
use simulation::components::{Deleted, LifeStage, SubObjects, Vegetation};
use simulation::lumber::LumberReconciliation;
use simulation::safe_unwind::SafeUnwind;

use crate::camera::{CursorGround, LeftClickDrag};

const MIN_RADIUS: f32 = 5.0;
const MAX_RADIUS: f32 = 500.0;
const RADIUS_STEP: f32 = 1.25;

/// Nearest-instance picks further than this from the cursor are ignored.
const PICK_DISTANCE: f32 = 6.0;

const STAGE_KEYS: [(KeyCode, LifeStage); 6] = [
    (KeyCode::Digit1, LifeStage::Child),
    (KeyCode::Digit2, LifeStage::Teen),
    (KeyCode::Digit3, LifeStage::Adult),
    (KeyCode::Digit4, LifeStage::Elderly),
    (KeyCode::Digit5, LifeStage::Dead),
    (KeyCode::Digit6, LifeStage::Stump),
];

#[derive(Resource, Debug, Clone)]
pub struct AgeBrush {
    pub radius: f32,
    pub ages: Vec<LifeStage>,
    /// Prefab pool for `R`. Empty until the app fills it from its catalog.
    pub palette: Vec<PrefabId>,
}

impl Default for AgeBrush {
    fn default() -> Self {
        Self {
            radius: 40.0,
            ages: vec![LifeStage::Adult],
            palette: Vec::new(),
        }
    }
}

impl AgeBrush {
    pub fn toggle(&mut self, stage: LifeStage) {
        if let Some(idx) = self.ages.iter().position(|s| *s == stage) {
            self.ages.remove(idx);
        } else {
            self.ages.push(stage);
        }
    }

    pub fn scale_radius(&mut self, factor: f32) {
        self.radius = (self.radius * factor).clamp(MIN_RADIUS, MAX_RADIUS);
    }

    /// Prefab replacement inside the brush. Trees keep their current stage
    /// unless the age pool is non-empty.
    pub fn replace_request(&self, center: Vec3) -> Option<BatchMutationRequest> {
        if self.palette.is_empty() {
            return None;
        }
        let scope = SelectionScope::Radius {
            center,
            radius: self.radius,
        };
        Some(
            BatchMutationRequest::replace(scope, SelectionSet::new(self.palette.iter().copied()))
                .with_ages(self.ages.iter().copied()),
        )
    }
}

pub fn update_age_brush(keys: Res<ButtonInput<KeyCode>>, mut brush: ResMut<AgeBrush>) {
    for (key, stage) in STAGE_KEYS {
        if keys.just_pressed(key) {
            brush.toggle(stage);
            info!(
                "Age brush: {:?}",
                brush.ages.iter().map(|s| s.name()).collect::<Vec<_>>()
            );
        }
    }
    if keys.just_pressed(KeyCode::BracketLeft) {
        brush.scale_radius(1.0 / RADIUS_STEP);
    }
    if keys.just_pressed(KeyCode::BracketRight) {
        brush.scale_radius(RADIUS_STEP);
    }
}

pub fn update_radius_preview(
    cursor: Res<CursorGround>,
    brush: Res<AgeBrush>,
    mut preview: ResMut<RadiusPreview>,
) {
    let circle = cursor.position.map(|center| PreviewCircle {
        center,
        radius: brush.radius,
    });
    if preview.circle != circle {
        preview.circle = circle;
    }
}

#[allow(clippy::too_many_arguments)]
pub fn handle_vegetation_tools(
    buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    cursor: Res<CursorGround>,
    brush: Res<AgeBrush>,
    drag: Res<LeftClickDrag>,
    mut requests: EventWriter<BatchMutationRequest>,
    mut lumber: ResMut<LumberReconciliation>,
    mut unwind: ResMut<SafeUnwind>,
    instances: Query<(Entity, &Transform), (With<Vegetation>, Without<Deleted>)>,
    owners: Query<(Entity, &SubObjects)>,
) {
    if keys.just_pressed(KeyCode::KeyL) {
        lumber.arm();
    }
    if keys.just_pressed(KeyCode::KeyU) {
        unwind.arm();
    }
    if keys.just_pressed(KeyCode::KeyM) {
        requests.send(BatchMutationRequest::ages(
            SelectionScope::WholeMap,
            brush.ages.iter().copied(),
        ));
    }
    if keys.just_pressed(KeyCode::KeyR) {
        match (cursor.position, brush.palette.is_empty()) {
            (_, true) => warn!("Replace: prefab palette is empty"),
            (None, false) => {}
            (Some(center), false) => {
                if let Some(request) = brush.replace_request(center) {
                    requests.send(request);
                }
            }
        }
    }

    if !buttons.just_released(MouseButton::Left) {
        return;
    }
    if drag.is_dragging {
        return;
    }
    let Some(center) = cursor.position else {
        return;
    };

    let shift = keys.pressed(KeyCode::ShiftLeft) || keys.pressed(KeyCode::ShiftRight);
    let ctrl = keys.pressed(KeyCode::ControlLeft) || keys.pressed(KeyCode::ControlRight);
    let scope = if ctrl {
        let Some(hit) = nearest_instance(instances.iter(), center) else {
            return;
        };
        let Some(owner) = owner_of(owners.iter(), hit) else {
            debug!("Owner pick: {:?} has no owner", hit);
            return;
        };
        SelectionScope::WholeBuildingOrNetwork { owner }
    } else if shift {
        let Some(hit) = nearest_instance(instances.iter(), center) else {
            return;
        };
        SelectionScope::Single { hit }
    } else {
        SelectionScope::Radius {
            center,
            radius: brush.radius,
        }
    };
    requests.send(BatchMutationRequest::ages(scope, brush.ages.iter().copied()));
}

fn ground_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

fn nearest_instance<'a>(
    instances: impl Iterator<Item = (Entity, &'a Transform)>,
    center: Vec3,
) -> Option<Entity> {
    instances
        .map(|(e, t)| (e, ground_distance(t.translation, center)))
        .filter(|(_, d)| *d <= PICK_DISTANCE)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(e, _)| e)
}

fn owner_of<'a>(
    mut owners: impl Iterator<Item = (Entity, &'a SubObjects)>,
    member: Entity,
) -> Option<Entity> {
    owners
        .find(|(_, sub)| sub.0.contains(&member))
        .map(|(owner, _)| owner)
}
