//! Character Movement Controller
//!
//! Turns per-frame input into a horizontal velocity on the local character's
//! rigid body. Movement direction is relative to the camera's horizontal
//! basis; vertical motion is left to the physics stepper except for jumps.
//!
//! # Model
//!
//! - Walk speed: 5.0 m/s, applied instantly (no acceleration ramp)
//! - Jump velocity: 8.0 m/s, only from the ground and not while airborne
//! - Grounded: any contact whose normal pushes the character upward
//!   (`normal.y > 0.5`)
//!
//! # Usage
//!
//! ```rust,ignore
//! let outcome = controller.update(&input, &camera.basis(), body);
//! world.step(dt);
//! controller.detect_ground(world.contacts(), handle);
//! ```

use glam::Vec3;

use crate::camera::CameraBasis;
use crate::input::MovementInput;
use crate::physics::types::{facing_direction, horizontal, yaw_from_direction};
use crate::physics::{BodyHandle, Contact, RigidBody};

/// Walk speed in meters per second
pub const WALK_SPEED: f32 = 5.0;

/// Jump velocity in meters per second
pub const JUMP_VELOCITY: f32 = 8.0;

/// Minimum upward normal component for a contact to count as ground
pub const GROUND_NORMAL_MIN_Y: f32 = 0.5;

/// What the controller did this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementOutcome {
    /// Horizontal velocity written to the body
    pub velocity: Vec3,
    /// A jump was started this frame
    pub jumped: bool,
}

/// Camera-relative walking and jumping for a dynamic character body.
#[derive(Debug, Clone)]
pub struct CharacterController {
    walk_speed: f32,
    jump_velocity: f32,
    grounded: bool,
    airborne: bool,
    facing_yaw: f32,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacterController {
    pub fn new() -> Self {
        Self::with_speeds(WALK_SPEED, JUMP_VELOCITY)
    }

    pub fn with_speeds(walk_speed: f32, jump_velocity: f32) -> Self {
        Self {
            walk_speed,
            jump_velocity,
            grounded: false,
            airborne: false,
            facing_yaw: 0.0,
        }
    }

    /// Horizontal velocity for the given input, or zero when idle.
    ///
    /// Summed axis contributions are normalized before scaling, so the
    /// magnitude never exceeds the walk speed.
    pub fn desired_velocity(&self, input: &MovementInput, basis: &CameraBasis) -> Vec3 {
        let dir = basis.forward * input.forward + basis.right * input.right;
        match horizontal(dir).try_normalize() {
            Some(dir) => dir * self.walk_speed,
            None => Vec3::ZERO,
        }
    }

    /// Apply one frame of input to the character body.
    pub fn update(
        &mut self,
        input: &MovementInput,
        basis: &CameraBasis,
        body: &mut RigidBody,
    ) -> MovementOutcome {
        let velocity = self.desired_velocity(input, basis);
        body.linear_velocity.x = velocity.x;
        body.linear_velocity.z = velocity.z;
        if velocity != Vec3::ZERO {
            self.facing_yaw = yaw_from_direction(velocity);
        }

        let jumped = input.jump && self.grounded && !self.airborne;
        if jumped {
            body.linear_velocity.y = self.jump_velocity;
            self.airborne = true;
            self.grounded = false;
        }

        MovementOutcome { velocity, jumped }
    }

    /// Refresh the grounded flag from the contacts of the step that just ran.
    pub fn detect_ground(&mut self, contacts: &[Contact], body: BodyHandle) -> bool {
        self.grounded = contacts
            .iter()
            .filter_map(|c| c.normal_for(body))
            .any(|n| n.y > GROUND_NORMAL_MIN_Y);
        if self.grounded {
            self.airborne = false;
        }
        self.grounded
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn is_airborne(&self) -> bool {
        self.airborne
    }

    pub fn walk_speed(&self) -> f32 {
        self.walk_speed
    }

    pub fn facing_yaw(&self) -> f32 {
        self.facing_yaw
    }

    pub fn set_facing_yaw(&mut self, yaw: f32) {
        self.facing_yaw = yaw;
    }

    /// Unit direction the character faces.
    pub fn facing_direction(&self) -> Vec3 {
        facing_direction(self.facing_yaw)
    }

    pub fn reset(&mut self) {
        self.grounded = false;
        self.airborne = false;
        self.facing_yaw = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{PhysicsWorld, Shape};

    fn input(forward: f32, right: f32) -> MovementInput {
        MovementInput {
            forward,
            right,
            jump: false,
        }
    }

    #[test]
    fn test_speed_never_exceeds_walk_speed() {
        let controller = CharacterController::new();
        let basis = CameraBasis::default();
        for fwd in [-1.0, 0.0, 1.0] {
            for right in [-1.0, 0.0, 1.0] {
                let v = controller.desired_velocity(&input(fwd, right), &basis);
                assert!(
                    v.length() <= WALK_SPEED + 1e-4,
                    "fwd {fwd} right {right} gave {}",
                    v.length()
                );
            }
        }
    }

    #[test]
    fn test_forward_follows_camera() {
        let controller = CharacterController::new();
        let basis = CameraBasis::from_view_direction(Vec3::X);
        let v = controller.desired_velocity(&input(1.0, 0.0), &basis);
        assert!((v - Vec3::X * WALK_SPEED).length() < 1e-4);
    }

    #[test]
    fn test_idle_zeroes_horizontal_velocity_keeps_yaw() {
        let mut controller = CharacterController::new();
        let basis = CameraBasis::default();
        let mut body = RigidBody::dynamic(Shape::Sphere { radius: 0.5 }, 1.0);

        controller.update(&input(0.0, 1.0), &basis, &mut body);
        let yaw = controller.facing_yaw();
        assert!((controller.facing_direction() - Vec3::X).length() < 1e-4);

        body.linear_velocity.y = -3.0;
        controller.update(&input(0.0, 0.0), &basis, &mut body);
        assert_eq!(body.linear_velocity, Vec3::new(0.0, -3.0, 0.0));
        assert_eq!(controller.facing_yaw(), yaw);
    }

    #[test]
    fn test_jump_requires_ground() {
        let mut world = PhysicsWorld::default();
        world.add_body(RigidBody::fixed(Shape::Plane));
        let handle = world.add_body(
            RigidBody::dynamic(Shape::Sphere { radius: 0.5 }, 1.0)
                .with_position(Vec3::new(0.0, 0.5, 0.0)),
        );
        let mut controller = CharacterController::new();
        let basis = CameraBasis::default();
        let jump = MovementInput {
            jump: true,
            ..MovementInput::default()
        };

        // Not grounded yet: no jump
        let body = world.get_mut(handle).expect("body");
        assert!(!controller.update(&jump, &basis, body).jumped);

        world.step(1.0 / 60.0);
        assert!(controller.detect_ground(world.contacts(), handle));

        let body = world.get_mut(handle).expect("body");
        assert!(controller.update(&jump, &basis, body).jumped);
        assert_eq!(body.linear_velocity.y, JUMP_VELOCITY);

        // Airborne: a second request is refused
        let body = world.get_mut(handle).expect("body");
        assert!(!controller.update(&jump, &basis, body).jumped);

        world.step(1.0 / 60.0);
        assert!(!controller.detect_ground(world.contacts(), handle));
        assert!(controller.is_airborne());
    }
}
