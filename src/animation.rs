use bevy::prelude::*;

// Blend cadence is deliberately decoupled from walk_speed/run_speed: retuning
// physical movement speed must not change the animation trot.
const WALK_BLEND_SCALE: f32 = 2.0;
const RUN_BLEND_SCALE: f32 = 5.0;

/// Planar movement-intent parameters for an animation blend tree, written once
/// per fixed tick. Optional: characters without this component simply skip the
/// animation step.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct AnimationBlend {
    pub x: f32,
    pub y: f32,
}

/// Maps the raw 2D input axis to blend parameters, per axis, using the scale
/// selected by the run state.
pub fn blend_params(movement: Vec2, running: bool) -> Vec2 {
    let scale = if running {
        RUN_BLEND_SCALE
    } else {
        WALK_BLEND_SCALE
    };
    movement * scale
}
