//! Input Module
//!
//! Platform-agnostic input for the local character: held movement keys, a
//! latched jump request and an optional analog stick (touch joystick). The
//! host feeds events in; the scene samples one [`MovementInput`] per frame.
//!
//! # Example
//!
//! ```rust
//! use peerlab_engine::input::{KeyboardState, KeyCode, MovementInput};
//!
//! let mut keyboard = KeyboardState::new();
//! keyboard.handle_key(KeyCode::W, true);
//! let input = MovementInput::sample(&mut keyboard, None);
//! assert_eq!(input.forward, 1.0);
//! ```

pub mod keyboard;

pub use keyboard::{KeyCode, KeyboardState, MovementKeys};

/// Analog stick deflection, each axis in `[-1, 1]` (+y is forward).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnalogStick {
    pub x: f32,
    pub y: f32,
}

impl AnalogStick {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: x.clamp(-1.0, 1.0),
            y: y.clamp(-1.0, 1.0),
        }
    }
}

/// One frame of movement intent.
///
/// Axes are summed contributions from keys and stick; the controller
/// normalizes the combined vector, so they may exceed 1 here.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementInput {
    /// +1 forward, -1 backward
    pub forward: f32,
    /// +1 right, -1 left
    pub right: f32,
    /// Jump requested this frame
    pub jump: bool,
}

impl MovementInput {
    /// Build the frame input, consuming the keyboard's jump latch.
    pub fn sample(keyboard: &mut KeyboardState, stick: Option<AnalogStick>) -> Self {
        let stick = stick.unwrap_or_default();
        Self {
            forward: keyboard.movement.forward_axis() as f32 + stick.y,
            right: keyboard.movement.right_axis() as f32 + stick.x,
            jump: keyboard.take_jump(),
        }
    }

    pub fn idle() -> Self {
        Self::default()
    }
}
