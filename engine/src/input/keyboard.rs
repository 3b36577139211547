//! Keyboard Input Module
//!
//! Tracks the movement keys of the local character. Decoupled from any
//! windowing system: the host translates its own key events into
//! [`KeyCode`]s.

/// Generic key codes, independent of the windowing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    // Movement keys
    W,
    A,
    S,
    D,
    Space,

    // Arrow keys
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    /// Catch-all for unhandled keys
    Unknown,
}

impl KeyCode {
    /// Map a DOM-style `KeyboardEvent.key` value (case-insensitive for letters).
    pub fn from_key_name(name: &str) -> Self {
        match name {
            "w" | "W" => KeyCode::W,
            "a" | "A" => KeyCode::A,
            "s" | "S" => KeyCode::S,
            "d" | "D" => KeyCode::D,
            " " | "Space" => KeyCode::Space,
            "ArrowUp" => KeyCode::ArrowUp,
            "ArrowDown" => KeyCode::ArrowDown,
            "ArrowLeft" => KeyCode::ArrowLeft,
            "ArrowRight" => KeyCode::ArrowRight,
            _ => KeyCode::Unknown,
        }
    }
}

/// Tracks the current state of movement keys.
///
/// Letter keys and arrow keys are tracked separately so that releasing
/// one of a pair does not cancel the other.
#[derive(Debug, Clone, Copy, Default)]
pub struct MovementKeys {
    /// W / ArrowUp
    pub forward: bool,
    /// S / ArrowDown
    pub backward: bool,
    /// A / ArrowLeft
    pub left: bool,
    /// D / ArrowRight
    pub right: bool,
    /// Space
    pub jump: bool,
    arrows: [bool; 4],
    letters: [bool; 4],
}

impl MovementKeys {
    /// Create a new movement keys state with all keys released.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update movement state based on key press/release.
    ///
    /// Returns `true` if the key was a movement key and was handled,
    /// `false` otherwise.
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        match key {
            KeyCode::W => self.letters[0] = pressed,
            KeyCode::S => self.letters[1] = pressed,
            KeyCode::A => self.letters[2] = pressed,
            KeyCode::D => self.letters[3] = pressed,
            KeyCode::ArrowUp => self.arrows[0] = pressed,
            KeyCode::ArrowDown => self.arrows[1] = pressed,
            KeyCode::ArrowLeft => self.arrows[2] = pressed,
            KeyCode::ArrowRight => self.arrows[3] = pressed,
            KeyCode::Space => {
                self.jump = pressed;
                return true;
            }
            KeyCode::Unknown => return false,
        }
        self.forward = self.letters[0] || self.arrows[0];
        self.backward = self.letters[1] || self.arrows[1];
        self.left = self.letters[2] || self.arrows[2];
        self.right = self.letters[3] || self.arrows[3];
        true
    }

    /// Check if any movement key is currently pressed.
    pub fn any_pressed(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    /// Reset all movement keys to released state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Get the forward/backward movement direction (-1, 0, or 1).
    pub fn forward_axis(&self) -> i32 {
        (self.forward as i32) - (self.backward as i32)
    }

    /// Get the left/right movement direction (-1, 0, or 1).
    pub fn right_axis(&self) -> i32 {
        (self.right as i32) - (self.left as i32)
    }
}

/// Complete keyboard state tracking.
///
/// Besides held keys it latches a jump *request* on the Space press edge,
/// consumed once by the character controller.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    /// Movement key states
    pub movement: MovementKeys,
    jump_requested: bool,
}

impl KeyboardState {
    /// Create a new keyboard state with all keys released.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a key press or release event.
    ///
    /// Returns `true` if the key was handled as a movement key.
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        if key == KeyCode::Space && pressed && !self.movement.jump {
            self.jump_requested = true;
        }
        self.movement.handle_key(key, pressed)
    }

    /// Take the pending jump request, clearing it.
    pub fn take_jump(&mut self) -> bool {
        std::mem::take(&mut self.jump_requested)
    }

    /// Reset all keyboard state.
    pub fn reset(&mut self) {
        self.movement.reset();
        self.jump_requested = false;
    }
}
