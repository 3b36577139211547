//! Camera Module
//!
//! Follow-camera state and the horizontal basis used for movement input.
//! Window-system agnostic: it only deals with camera math.

pub mod controller;

pub use controller::{CameraBasis, DEFAULT_FOLLOW_DISTANCE, DEFAULT_POLAR_ANGLE, FollowCamera};
