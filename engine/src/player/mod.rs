//! Player Module
//!
//! Local character control and animation selection.
//!
//! # Components
//!
//! - [`CharacterController`] - Camera-relative walking, jumping and grounded detection
//! - [`AnimationState`] - Walk/idle selection and edge-triggered broadcast tracking
//! - [`AnimationMixer`] - Clips of a loaded model and the one playing

pub mod animation;
pub mod movement_controller;

pub use animation::{
    AnimationMixer, AnimationState, IDLE_CLIP, MOVE_EPSILON, WALK_CLIP, clip_for_motion,
};
pub use movement_controller::{
    CharacterController, GROUND_NORMAL_MIN_Y, JUMP_VELOCITY, MovementOutcome, WALK_SPEED,
};
