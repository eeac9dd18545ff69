use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;

const PAN_SPEED: f32 = 400.0;
const ZOOM_SPEED: f32 = 0.15;
const MIN_DISTANCE: f32 = 10.0;
const MAX_DISTANCE: f32 = 2500.0;
const MIN_PITCH: f32 = 5.0 * std::f32::consts::PI / 180.0; // 5 degrees (near ground level)
const MAX_PITCH: f32 = 85.0 * std::f32::consts::PI / 180.0; // 85 degrees
const ORBIT_SENSITIVITY: f32 = 0.005;

/// Half-width of the square the focus point may roam in.
const FOCUS_LIMIT: f32 = 2000.0;

/// Orbital camera model: camera orbits around a focus point on the ground.
#[derive(Resource)]
pub struct OrbitCamera {
    /// Ground point the camera looks at
    pub focus: Vec3,
    /// Horizontal rotation in radians
    pub yaw: f32,
    /// Elevation angle in radians (clamped between MIN_PITCH and MAX_PITCH)
    pub pitch: f32,
    /// Distance from focus point
    pub distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            focus: Vec3::ZERO,
            yaw: 0.0,
            pitch: 50.0_f32.to_radians(),
            distance: 600.0,
        }
    }
}

#[derive(Resource, Default)]
pub struct CameraDrag {
    pub dragging: bool,
    pub last_pos: Vec2,
}

#[derive(Resource, Default)]
pub struct CameraOrbitDrag {
    pub dragging: bool,
    pub last_pos: Vec2,
}

/// Tracks left-click drag state: differentiates click from drag.
/// When the mouse moves beyond `LEFT_DRAG_THRESHOLD` pixels from the initial
/// press, it becomes a camera pan and suppresses the brush.
#[derive(Resource, Default)]
pub struct LeftClickDrag {
    pub pressed: bool,
    pub start_pos: Vec2,
    pub last_pos: Vec2,
    /// Set once the press became a pan; kept until the next press so the
    /// release can be told apart from a click.
    pub is_dragging: bool,
}

pub const LEFT_DRAG_THRESHOLD: f32 = 5.0;

/// Cursor position projected onto the ground plane, if any.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct CursorGround {
    pub position: Option<Vec3>,
}

pub fn setup_camera(mut commands: Commands) {
    let orbit = OrbitCamera::default();
    let (pos, look_at) = orbit_to_transform(&orbit);

    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(pos).looking_at(look_at, Vec3::Y),
    ));
    commands.insert_resource(orbit);
}

fn clamp_focus(focus: &mut Vec3) {
    focus.x = focus.x.clamp(-FOCUS_LIMIT, FOCUS_LIMIT);
    focus.z = focus.z.clamp(-FOCUS_LIMIT, FOCUS_LIMIT);
}

fn orbit_to_transform(orbit: &OrbitCamera) -> (Vec3, Vec3) {
    // Spherical to cartesian offset from focus
    let x = orbit.distance * orbit.pitch.cos() * orbit.yaw.sin();
    let y = orbit.distance * orbit.pitch.sin();
    let z = orbit.distance * orbit.pitch.cos() * orbit.yaw.cos();
    let pos = orbit.focus + Vec3::new(x, y, z);
    (pos, orbit.focus)
}

/// System: apply OrbitCamera state to the actual camera Transform each frame.
pub fn apply_orbit_camera(
    orbit: Res<OrbitCamera>,
    mut query: Query<&mut Transform, With<Camera3d>>,
) {
    if !orbit.is_changed() {
        return;
    }
    let (pos, look_at) = orbit_to_transform(&orbit);
    let Ok(mut transform) = query.get_single_mut() else {
        return;
    };
    *transform = Transform::from_translation(pos).looking_at(look_at, Vec3::Y);
}

/// Ground-plane offset for a screen-space drag of `delta` pixels, so the
/// ground under the cursor follows the mouse.
pub fn drag_to_ground(delta: Vec2, yaw: f32, scale: f32) -> Vec2 {
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    Vec2::new(
        -delta.x * cos_yaw - delta.y * sin_yaw,
        delta.x * sin_yaw - delta.y * cos_yaw,
    ) * scale
}

fn pan_focus(orbit: &mut OrbitCamera, ground: Vec2) {
    orbit.focus.x += ground.x;
    orbit.focus.z += ground.y;
    clamp_focus(&mut orbit.focus);
}

/// Pan speed scales with zoom so the view moves at a steady on-screen rate.
fn zoom_scale(orbit: &OrbitCamera) -> f32 {
    orbit.distance / 1000.0
}

/// Press/hold/release bookkeeping shared by the middle and right drags.
/// Returns the cursor movement since the last frame while the button is held.
fn held_drag_delta(
    buttons: &ButtonInput<MouseButton>,
    button: MouseButton,
    cursor: Option<Vec2>,
    dragging: &mut bool,
    last_pos: &mut Vec2,
) -> Option<Vec2> {
    if buttons.just_pressed(button) {
        if let Some(pos) = cursor {
            *dragging = true;
            *last_pos = pos;
        }
    }
    if buttons.just_released(button) {
        *dragging = false;
    }
    if !*dragging {
        return None;
    }
    let pos = cursor?;
    let delta = pos - *last_pos;
    *last_pos = pos;
    Some(delta)
}

/// WASD/Arrow keys: pan focus relative to the current yaw.
pub fn camera_pan_keyboard(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut orbit: ResMut<OrbitCamera>,
) {
    let pressed = |a: KeyCode, b: KeyCode| keys.pressed(a) || keys.pressed(b);
    let mut dir = Vec2::ZERO;
    if pressed(KeyCode::KeyW, KeyCode::ArrowUp) {
        dir.y -= 1.0;
    }
    if pressed(KeyCode::KeyS, KeyCode::ArrowDown) {
        dir.y += 1.0;
    }
    if pressed(KeyCode::KeyA, KeyCode::ArrowLeft) {
        dir.x -= 1.0;
    }
    if pressed(KeyCode::KeyD, KeyCode::ArrowRight) {
        dir.x += 1.0;
    }
    if dir == Vec2::ZERO {
        return;
    }

    // Keys move the view, a drag moves the ground: opposite signs.
    let step = PAN_SPEED * zoom_scale(&orbit) * time.delta_secs();
    let ground = drag_to_ground(-dir.normalize(), orbit.yaw, step);
    pan_focus(&mut orbit, ground);
}

/// Middle-mouse drag: pan focus.
pub fn camera_pan_drag(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window>,
    mut drag: ResMut<CameraDrag>,
    mut orbit: ResMut<OrbitCamera>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let drag = &mut *drag;
    let Some(delta) = held_drag_delta(
        &buttons,
        MouseButton::Middle,
        window.cursor_position(),
        &mut drag.dragging,
        &mut drag.last_pos,
    ) else {
        return;
    };
    let ground = drag_to_ground(delta, orbit.yaw, zoom_scale(&orbit));
    pan_focus(&mut orbit, ground);
}

/// Right-mouse drag: orbit (horizontal = yaw, vertical = pitch).
pub fn camera_orbit_drag(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window>,
    mut drag: ResMut<CameraOrbitDrag>,
    mut orbit: ResMut<OrbitCamera>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let drag = &mut *drag;
    let Some(delta) = held_drag_delta(
        &buttons,
        MouseButton::Right,
        window.cursor_position(),
        &mut drag.dragging,
        &mut drag.last_pos,
    ) else {
        return;
    };
    orbit.yaw -= delta.x * ORBIT_SENSITIVITY;
    orbit.pitch = (orbit.pitch + delta.y * ORBIT_SENSITIVITY).clamp(MIN_PITCH, MAX_PITCH);
}

/// Left-mouse drag past `LEFT_DRAG_THRESHOLD`: pan focus. A press that never
/// crosses the threshold is a click and is left to the brush.
pub fn camera_left_drag(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window>,
    mut left_drag: ResMut<LeftClickDrag>,
    mut orbit: ResMut<OrbitCamera>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let cursor = window.cursor_position();

    if buttons.just_pressed(MouseButton::Left) {
        if let Some(pos) = cursor {
            *left_drag = LeftClickDrag {
                pressed: true,
                start_pos: pos,
                last_pos: pos,
                is_dragging: false,
            };
        }
    }
    if buttons.just_released(MouseButton::Left) {
        left_drag.pressed = false;
    }
    if !left_drag.pressed {
        return;
    }
    let Some(pos) = cursor else {
        return;
    };

    if !left_drag.is_dragging {
        if (pos - left_drag.start_pos).length() <= LEFT_DRAG_THRESHOLD {
            return;
        }
        left_drag.is_dragging = true;
        left_drag.last_pos = pos;
    }
    let delta = pos - left_drag.last_pos;
    left_drag.last_pos = pos;
    let ground = drag_to_ground(delta, orbit.yaw, zoom_scale(&orbit));
    pan_focus(&mut orbit, ground);
}

/// Scroll wheel: zoom (change distance).
pub fn camera_zoom(mut scroll_evts: EventReader<MouseWheel>, mut orbit: ResMut<OrbitCamera>) {
    for evt in scroll_evts.read() {
        let dy = match evt.unit {
            MouseScrollUnit::Line => evt.y,
            MouseScrollUnit::Pixel => evt.y / 100.0,
        };
        let factor = 1.0 - dy * ZOOM_SPEED;
        orbit.distance = (orbit.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }
}

/// Ray-plane intersection of the cursor against the Y=0 ground plane.
pub fn update_cursor_ground(
    windows: Query<&Window>,
    camera_q: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    mut cursor: ResMut<CursorGround>,
) {
    cursor.position = None;
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Ok((camera, cam_transform)) = camera_q.get_single() else {
        return;
    };
    let Some(screen_pos) = window.cursor_position() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(cam_transform, screen_pos) else {
        return;
    };
    if ray.direction.y.abs() > 0.001 {
        let t = -ray.origin.y / ray.direction.y;
        if t > 0.0 {
            cursor.position = Some(ray.origin + ray.direction * t);
        }
    }
}
