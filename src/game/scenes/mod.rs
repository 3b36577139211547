//! Scene Module
//!
//! High-level scene compositions that wire together all game systems, and
//! the runner that drives them at a fixed rate.

pub mod lab_scene;
pub mod runner;

pub use lab_scene::LabScene;
pub use runner::{MAX_FIXED_STEPS_PER_FRAME, SceneRunner};

use crate::game::error::SessionError;
use crate::input::MovementInput;
use crate::time::Millis;

/// Everything the host feeds a scene for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub movement: MovementInput,
    /// Throw requested this frame
    pub throw: bool,
    /// Camera orbit in radians
    pub camera_yaw_delta: f32,
}

impl FrameInput {
    /// Same held keys without the one-shot requests.
    pub fn held_only(&self) -> Self {
        Self {
            movement: MovementInput {
                jump: false,
                ..self.movement
            },
            throw: false,
            camera_yaw_delta: 0.0,
        }
    }
}

/// A simulation that can be started, stepped and torn down.
pub trait SimulationCore {
    /// Set up the world and join the session.
    fn init(&mut self, now: Millis) -> Result<(), SessionError>;

    /// Advance by one fixed step of `dt` seconds.
    fn step(&mut self, dt: f32, input: &FrameInput, now: Millis);

    /// Leave the session and release every resource. Idempotent.
    fn teardown(&mut self);
}
