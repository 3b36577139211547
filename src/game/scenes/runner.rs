//! SceneRunner - converts variable frame time into fixed simulation steps.

use tracing::{debug, info};

use super::{FrameInput, SimulationCore};
use crate::game::config::FIXED_STEP_S;
use crate::game::error::SessionError;
use crate::input::MovementInput;
use crate::time::{Clock, Millis};

/// Upper bound on catch-up steps in one call.
pub const MAX_FIXED_STEPS_PER_FRAME: usize = 8;

/// Longest frame delta accepted (seconds); longer frames are clamped.
const MAX_FRAME_DELTA_S: f32 = 0.1;

/// Owns a simulation core and a clock and steps the core at a fixed rate.
///
/// One-shot requests in the frame input (jump, throw, camera orbit) are
/// held until a step runs and then reach exactly one step, so frames that
/// run no step at all (fast hosts) lose nothing.
pub struct SceneRunner<C: SimulationCore + ?Sized = dyn SimulationCore> {
    core: Box<C>,
    clock: Box<dyn Clock>,
    fixed_step_s: f32,
    accumulator_s: f32,
    /// One-shot requests not yet handed to a step
    pending: FrameInput,
    running: bool,
    steps_run: u64,
}

impl<C: SimulationCore + ?Sized> SceneRunner<C> {
    pub fn new(core: Box<C>, clock: Box<dyn Clock>) -> Self {
        Self {
            core,
            clock,
            fixed_step_s: FIXED_STEP_S,
            accumulator_s: 0.0,
            pending: FrameInput::default(),
            running: false,
            steps_run: 0,
        }
    }

    pub fn with_fixed_step(mut self, fixed_step_s: f32) -> Self {
        self.fixed_step_s = fixed_step_s;
        self
    }

    /// Initialise the core.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.running {
            return Err(SessionError::AlreadyStarted);
        }
        self.core.init(self.clock.now_ms())?;
        self.running = true;
        self.accumulator_s = 0.0;
        self.pending = FrameInput::default();
        info!("scene started");
        Ok(())
    }

    /// Feed one rendered frame. Returns the number of fixed steps run.
    ///
    /// Each step gets the time it simulates: the clock reading minus the
    /// time still left in the accumulator after that step.
    pub fn update(&mut self, delta_s: f32, input: &FrameInput) -> usize {
        if !self.running {
            return 0;
        }
        self.pending.movement.jump |= input.movement.jump;
        self.pending.throw |= input.throw;
        self.pending.camera_yaw_delta += input.camera_yaw_delta;

        let delta = delta_s.clamp(0.0, MAX_FRAME_DELTA_S);
        self.accumulator_s = (self.accumulator_s + delta)
            .min(self.fixed_step_s * MAX_FIXED_STEPS_PER_FRAME as f32);

        let now = self.clock.now_ms();
        let mut steps = 0usize;
        while self.accumulator_s >= self.fixed_step_s && steps < MAX_FIXED_STEPS_PER_FRAME {
            self.accumulator_s -= self.fixed_step_s;
            let lag_ms = (self.accumulator_s * 1000.0).round() as Millis;
            let step_input = if steps == 0 {
                FrameInput {
                    movement: MovementInput {
                        jump: self.pending.movement.jump,
                        ..input.movement
                    },
                    throw: self.pending.throw,
                    camera_yaw_delta: self.pending.camera_yaw_delta,
                }
            } else {
                input.held_only()
            };
            self.core
                .step(self.fixed_step_s, &step_input, now.saturating_sub(lag_ms));
            if steps == 0 {
                self.pending = FrameInput::default();
            }
            steps += 1;
        }
        self.steps_run += steps as u64;
        steps
    }

    /// Tear the core down. Safe to call more than once.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.core.teardown();
        self.running = false;
        debug!(steps = self.steps_run, "scene stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn steps_run(&self) -> u64 {
        self.steps_run
    }

    pub fn core(&self) -> &C {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }
}

impl<C: SimulationCore + ?Sized> Drop for SceneRunner<C> {
    fn drop(&mut self) {
        self.stop();
    }
}
