use std::f32::consts::*;

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::transform::TransformSystem;
use bevy::window::{CursorGrabMode, PrimaryWindow};

use crate::locomotion::ViewCamera;

// Used as padding by camera pitching (up/down) to avoid spooky math problems
const ANGLE_EPSILON: f32 = 0.001953125;

/// Mouse-orbit follow camera plus cursor lock. The camera entity carries
/// [`ViewCamera`], so it doubles as the movement basis for the locomotion
/// tick. Glue, not core: any other entity with `ViewCamera` works too.
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, grab_cursor)
            .add_systems(Update, orbit_camera_look)
            .add_systems(
                PostUpdate,
                orbit_camera_follow.before(TransformSystem::TransformPropagate),
            );
    }
}

#[derive(Component)]
pub struct OrbitCamera {
    /// Entity the camera orbits, usually the character's physics body
    pub target: Entity,
    pub distance: f32,
    /// Pivot height above the target's origin
    pub height: f32,
    pub sensitivity: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl OrbitCamera {
    pub fn new(target: Entity) -> Self {
        Self {
            target,
            distance: 6.0,
            height: 1.5,
            sensitivity: 0.001,
            pitch: -0.4,
            yaw: 0.0,
        }
    }
}

fn grab_cursor(mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    if let Ok(mut window) = windows.single_mut() {
        window.cursor_options.grab_mode = CursorGrabMode::Locked;
        window.cursor_options.visible = false;
    }
}

fn orbit_camera_look(
    mut mouse_events: EventReader<MouseMotion>,
    mut query: Query<&mut OrbitCamera>,
) {
    let mut mouse_delta = Vec2::ZERO;
    for mouse_event in mouse_events.read() {
        mouse_delta += mouse_event.delta;
    }

    for mut orbit in query.iter_mut() {
        let delta = mouse_delta * orbit.sensitivity;
        orbit.pitch = (orbit.pitch - delta.y)
            .clamp(-FRAC_PI_2 + ANGLE_EPSILON, FRAC_PI_2 - ANGLE_EPSILON);
        orbit.yaw -= delta.x;
        if orbit.yaw.abs() > PI {
            orbit.yaw = orbit.yaw.rem_euclid(TAU);
        }
    }
}

fn orbit_camera_follow(
    mut query: Query<(&mut Transform, &OrbitCamera)>,
    targets: Query<&Transform, Without<OrbitCamera>>,
) {
    for (mut transform, orbit) in query.iter_mut() {
        let Ok(target) = targets.get(orbit.target) else {
            continue;
        };
        let pivot = target.translation + Vec3::Y * orbit.height;
        let rotation = Quat::from_euler(EulerRot::YXZ, orbit.yaw, orbit.pitch, 0.0);
        // Camera forward is -Z, so +Z offset puts it behind the pivot
        transform.translation = pivot + rotation * (Vec3::Z * orbit.distance);
        transform.rotation = rotation;
    }
}
