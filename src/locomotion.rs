use avian3d::prelude::*;
use bevy::prelude::*;

/// Drives third-person character locomotion. The whole per-tick algorithm runs
/// in `FixedUpdate` so movement stays deterministic regardless of render frame
/// rate; input sampling happens earlier in the frame (see `InputPlugin`).
///
/// Spawn a character with [`LocomotionConfig`], [`MotionState`], an
/// [`OrientationTarget`] pointing at the visual model entity, and the usual
/// avian body components (`RigidBody::Dynamic`, a collider, `LinearVelocity`).
/// Exactly one camera entity must carry the [`ViewCamera`] marker — movement
/// input is interpreted relative to its facing.
pub struct LocomotionPlugin;

pub static TICK_HZ: f64 = 64.0;

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<MovementAction>()
            .insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
            .add_systems(FixedUpdate, locomotion_tick)
            .add_systems(PostUpdate, validate_locomotion_setup);
    }
}

/// An input-layer action relayed to the locomotion tick.
///
/// `Move` is a continuous axis and is only sent while non-zero; a tick that
/// sees no `Move` event treats the stick as centered. `Jump` and `Run` are
/// edges: one event per press (and per release, for `Run`).
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub enum MovementAction {
    Move(Vec2),
    Jump,
    Run(bool),
}

/// Movement tuning for one character.
#[derive(Component, Clone)]
pub struct LocomotionConfig {
    /// Ground speed while walking, m/s
    pub walk_speed: f32,
    /// Ground speed while the run toggle is held, m/s
    pub run_speed: f32,
    /// Slerp rate toward the movement heading, applied as
    /// `rotation_speed * dt` per tick
    pub rotation_speed: f32,
    /// Vertical velocity added on a grounded jump edge
    pub jump_impulse: f32,
    /// Length of the downward grounded ray cast
    pub ground_check_distance: f32,
    /// Layers that count as ground for the cast
    pub ground_layers: LayerMask,
    /// When true, the per-tick rotation fraction is clamped to 1.0.
    /// Off by default: with a large `rotation_speed * dt` the slerp can
    /// overshoot past the target heading, and some setups tune around that.
    pub clamp_rotation_step: bool,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            walk_speed: 5.0,
            run_speed: 10.0,
            rotation_speed: 10.0,
            jump_impulse: 5.0,
            ground_check_distance: 0.1,
            ground_layers: LayerMask::ALL,
            clamp_rotation_step: false,
        }
    }
}

impl LocomotionConfig {
    /// A single-speed character is just the tiered one with both tiers equal;
    /// the run toggle then has no effect on velocity.
    pub fn single_speed(speed: f32) -> Self {
        Self {
            walk_speed: speed,
            run_speed: speed,
            ..default()
        }
    }
}

/// Per-tick motion state. `grounded` is rewritten at the top of every tick,
/// before any jump edge is consumed; `running` persists until the next
/// `MovementAction::Run` edge.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct MotionState {
    pub grounded: bool,
    pub running: bool,
}

/// The visual model entity this controller rotates toward the movement
/// heading. The model is decoupled from the physics body so the body never
/// tilts; this controller is the rotation's sole writer.
#[derive(Component)]
pub struct OrientationTarget(pub Entity);

/// Marks the transform that supplies the view-relative movement basis.
#[derive(Component)]
pub struct ViewCamera;

pub fn locomotion_tick(
    spatial_query_pipeline: Res<SpatialQueryPipeline>,
    mut movement_events: EventReader<MovementAction>,
    mut query: Query<(
        Entity,
        &LocomotionConfig,
        &mut MotionState,
        &OrientationTarget,
        &Transform,
        &mut LinearVelocity,
        Option<&mut crate::AnimationBlend>,
    )>,
    camera: Query<&Transform, (With<ViewCamera>, Without<LocomotionConfig>)>,
    mut models: Query<&mut Transform, (Without<LocomotionConfig>, Without<ViewCamera>)>,
) {
    let dt = 1.0 / TICK_HZ as f32;

    // Freshest Move event wins; no Move event this tick means zero input.
    let mut movement = Vec2::ZERO;
    let mut jump_edges = 0u32;
    let mut run_toggle = None;
    for action in movement_events.read() {
        match *action {
            MovementAction::Move(direction) => movement = direction,
            MovementAction::Jump => jump_edges += 1,
            MovementAction::Run(pressed) => run_toggle = Some(pressed),
        }
    }

    for (entity, config, mut state, target, transform, mut velocity, animation) in query.iter_mut()
    {
        // Grounded must be sampled before jump edges are consumed.
        let filter =
            SpatialQueryFilter::from_mask(config.ground_layers).with_excluded_entities([entity]);
        state.grounded = spatial_query_pipeline
            .cast_ray(
                transform.translation,
                Dir3::NEG_Y,
                config.ground_check_distance,
                true,
                &filter,
            )
            .is_some();

        if let Some(pressed) = run_toggle {
            state.running = pressed;
        }

        if let Some(mut blend) = animation {
            let params = crate::blend_params(movement, state.running);
            blend.x = params.x;
            blend.y = params.y;
        }

        for _ in 0..jump_edges {
            if apply_jump(&mut velocity.0, &state, config.jump_impulse) {
                debug!("jump impulse applied to {entity:?}");
            }
        }

        if movement == Vec2::ZERO {
            // No horizontal intent: stop, keep the vertical component, and
            // leave the model's heading alone. Skipping the rotation here is
            // load-bearing: slerping toward a stale heading while the stick is
            // centered would keep nudging the character.
            velocity.0.x = 0.0;
            velocity.0.z = 0.0;
            continue;
        }

        let Ok(view) = camera.single() else {
            warn_once!("no ViewCamera entity; skipping locomotion for {entity:?}");
            continue;
        };
        let Some((right, forward)) = flattened_basis(view) else {
            // Camera looking straight up or down has no horizontal basis.
            continue;
        };

        let speed = if state.running {
            config.run_speed
        } else {
            config.walk_speed
        };
        velocity.0 = view_relative_velocity(movement, right, forward, speed, velocity.0.y);

        let heading = Vec3::new(velocity.0.x, 0.0, velocity.0.z);
        if heading != Vec3::ZERO {
            if let Ok(mut model) = models.get_mut(target.0) {
                model.rotation = smoothed_facing(
                    model.rotation,
                    heading,
                    config.rotation_speed,
                    dt,
                    config.clamp_rotation_step,
                );
            }
        }
    }
}

/// Fails fast on broken character setups the moment they are spawned, rather
/// than letting a missing model reference silently skip rotation forever.
pub fn validate_locomotion_setup(
    controllers: Query<
        (Entity, &LocomotionConfig, Option<&OrientationTarget>),
        Added<LocomotionConfig>,
    >,
    transforms: Query<&Transform>,
) {
    for (entity, config, target) in &controllers {
        assert!(
            config.walk_speed >= 0.0
                && config.run_speed >= 0.0
                && config.rotation_speed >= 0.0
                && config.jump_impulse >= 0.0
                && config.ground_check_distance >= 0.0,
            "LocomotionConfig on {entity:?} has a negative speed or distance"
        );
        let Some(target) = target else {
            panic!("locomotion character {entity:?} is missing an OrientationTarget");
        };
        if transforms.get(target.0).is_err() {
            panic!("OrientationTarget of {entity:?} must reference an entity with a Transform");
        }
    }
}

/// Camera right/forward flattened to the horizontal plane and renormalized.
/// `None` when the view is vertical enough that no horizontal basis exists.
fn flattened_basis(view: &Transform) -> Option<(Vec3, Vec3)> {
    let right = Vec3::new(view.right().x, 0.0, view.right().z).try_normalize()?;
    let forward = Vec3::new(view.forward().x, 0.0, view.forward().z).try_normalize()?;
    Some((right, forward))
}

/// Composes the view-relative horizontal velocity and passes the current
/// vertical component through untouched, so gravity and jump impulses already
/// in flight are never clobbered.
fn view_relative_velocity(input: Vec2, right: Vec3, forward: Vec3, speed: f32, vertical: f32) -> Vec3 {
    let mut velocity = (input.x * right + input.y * forward) * speed;
    velocity.y = vertical;
    velocity
}

/// Applies the jump as an additive change to vertical velocity, gated on the
/// grounded state sampled earlier this tick. Returns whether it fired.
fn apply_jump(velocity: &mut Vec3, state: &MotionState, jump_impulse: f32) -> bool {
    if !state.grounded {
        return false;
    }
    velocity.y += jump_impulse;
    true
}

/// One slerp step from `current` toward facing `heading`. The fraction is
/// `rotation_speed * dt`, unclamped unless asked, matching the documented
/// overshoot boundary behavior.
fn smoothed_facing(
    current: Quat,
    heading: Vec3,
    rotation_speed: f32,
    dt: f32,
    clamp_step: bool,
) -> Quat {
    let target = Transform::IDENTITY.looking_to(heading, Vec3::Y).rotation;
    let mut step = rotation_speed * dt;
    if clamp_step {
        step = step.min(1.0);
    }
    current.slerp(target, step)
}
