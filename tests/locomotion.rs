//! Headless integration tests for the per-tick locomotion algorithm.
//!
//! The fixed-tick system is driven directly with `run_schedule(FixedUpdate)`
//! against an empty spatial query pipeline, so every ground cast misses and
//! the character is airborne unless a test says otherwise.

use avian3d::prelude::*;
use bevy::prelude::*;
use third_person_locomotion::*;

struct Character {
    app: App,
    body: Entity,
    model: Entity,
}

impl Character {
    /// Minimal world: one character, one model, one camera facing world +Z.
    fn spawn(config: LocomotionConfig) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_event::<MovementAction>()
            .insert_resource(SpatialQueryPipeline::default())
            .add_systems(FixedUpdate, locomotion_tick)
            .add_systems(PostUpdate, validate_locomotion_setup);

        let model = app
            .world_mut()
            .spawn(Transform::from_rotation(Quat::from_rotation_y(0.7)))
            .id();
        app.world_mut().spawn((
            ViewCamera,
            Transform::IDENTITY.looking_to(Vec3::Z, Vec3::Y),
        ));
        let body = app
            .world_mut()
            .spawn((
                config,
                MotionState::default(),
                OrientationTarget(model),
                Transform::default(),
                LinearVelocity::default(),
                AnimationBlend::default(),
            ))
            .id();

        Self { app, body, model }
    }

    fn send(&mut self, action: MovementAction) {
        self.app.world_mut().send_event(action);
    }

    fn tick(&mut self) {
        self.app.world_mut().run_schedule(FixedUpdate);
    }

    fn velocity(&self) -> Vec3 {
        self.app.world().get::<LinearVelocity>(self.body).unwrap().0
    }

    fn set_velocity(&mut self, v: Vec3) {
        self.app
            .world_mut()
            .get_mut::<LinearVelocity>(self.body)
            .unwrap()
            .0 = v;
    }

    fn model_rotation(&self) -> Quat {
        self.app
            .world()
            .get::<Transform>(self.model)
            .unwrap()
            .rotation
    }

    fn blend(&self) -> AnimationBlend {
        *self.app.world().get::<AnimationBlend>(self.body).unwrap()
    }
}

#[test]
fn zero_input_stops_horizontal_motion_and_keeps_heading() {
    let mut character = Character::spawn(LocomotionConfig::default());
    character.set_velocity(Vec3::new(3.0, -2.0, 4.0));
    let heading_before = character.model_rotation();

    character.tick();

    assert_eq!(character.velocity(), Vec3::new(0.0, -2.0, 0.0));
    assert_eq!(character.model_rotation(), heading_before);
}

#[test]
fn forward_input_moves_camera_relative_at_walk_speed() {
    let mut character = Character::spawn(LocomotionConfig::default());
    character.set_velocity(Vec3::new(0.0, -1.5, 0.0));

    character.send(MovementAction::Move(Vec2::new(0.0, 1.0)));
    character.tick();

    // Camera faces world +Z, walk_speed = 5: planar velocity (0, 5),
    // vertical untouched.
    let v = character.velocity();
    assert!(v.x.abs() < 1e-5, "v.x = {}", v.x);
    assert!((v.z - 5.0).abs() < 1e-5, "v.z = {}", v.z);
    assert_eq!(v.y, -1.5);
}

#[test]
fn run_toggle_changes_speed_and_blend_on_the_next_tick() {
    let mut character = Character::spawn(LocomotionConfig::default());

    character.send(MovementAction::Run(true));
    character.send(MovementAction::Move(Vec2::new(0.0, 1.0)));
    character.tick();
    assert!((character.velocity().z - 10.0).abs() < 1e-5);
    assert!((character.blend().y - 5.0).abs() < 1e-5);

    character.send(MovementAction::Run(false));
    character.send(MovementAction::Move(Vec2::new(0.0, 1.0)));
    character.tick();
    assert!((character.velocity().z - 5.0).abs() < 1e-5);
    assert!((character.blend().y - 2.0).abs() < 1e-5);
}

#[test]
fn single_speed_config_ignores_the_run_tier() {
    let mut character = Character::spawn(LocomotionConfig::single_speed(3.0));

    character.send(MovementAction::Run(true));
    character.send(MovementAction::Move(Vec2::new(0.0, 1.0)));
    character.tick();

    assert!((character.velocity().z - 3.0).abs() < 1e-5);
}

#[test]
fn airborne_jump_edges_never_apply_impulse() {
    // The empty spatial pipeline means every ground cast misses.
    let mut character = Character::spawn(LocomotionConfig::default());

    character.send(MovementAction::Jump);
    character.tick();
    character.send(MovementAction::Jump);
    character.tick();

    assert_eq!(character.velocity(), Vec3::ZERO);
    let state = character
        .app
        .world()
        .get::<MotionState>(character.body)
        .unwrap();
    assert!(!state.grounded);
}

#[test]
fn model_turns_toward_the_movement_heading() {
    let mut character = Character::spawn(LocomotionConfig {
        // Large clamped step: the model should face the heading after one tick
        rotation_speed: 1000.0,
        clamp_rotation_step: true,
        ..default()
    });

    character.send(MovementAction::Move(Vec2::new(0.0, 1.0)));
    character.tick();

    let facing = Transform::IDENTITY.looking_to(Vec3::Z, Vec3::Y).rotation;
    assert!(character.model_rotation().angle_between(facing) < 1e-3);
}

#[test]
fn input_sample_is_not_retained_across_ticks() {
    let mut character = Character::spawn(LocomotionConfig::default());

    character.send(MovementAction::Move(Vec2::new(1.0, 0.0)));
    character.tick();
    assert!(character.velocity().length() > 1.0);

    // No Move event this tick: the character stops instead of coasting.
    character.tick();
    let v = character.velocity();
    assert_eq!(Vec2::new(v.x, v.z), Vec2::ZERO);
}

#[test]
#[should_panic(expected = "missing an OrientationTarget")]
fn controller_without_orientation_target_is_fatal() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_systems(PostUpdate, validate_locomotion_setup);

    app.world_mut()
        .spawn((LocomotionConfig::default(), Transform::default()));
    app.world_mut().run_schedule(PostUpdate);
}

#[test]
#[should_panic(expected = "negative speed or distance")]
fn negative_speed_is_fatal() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_systems(PostUpdate, validate_locomotion_setup);

    let model = app.world_mut().spawn(Transform::default()).id();
    app.world_mut().spawn((
        LocomotionConfig {
            walk_speed: -1.0,
            ..Default::default()
        },
        OrientationTarget(model),
        Transform::default(),
    ));
    app.world_mut().run_schedule(PostUpdate);
}
