//! Character animation selection
//!
//! Picks between the walk and idle clips from horizontal motion, tracks
//! what the local character last broadcast, and models the per-character
//! animation mixer (the set of clips a loaded model offers plus the one
//! currently playing).

/// Clip played while moving.
pub const WALK_CLIP: &str = "animation.goblin.walk";

/// Clip played while standing still.
pub const IDLE_CLIP: &str = "animation.goblin.idle";

/// Horizontal speed (m/s) above which a character counts as moving.
pub const MOVE_EPSILON: f32 = 0.01;

/// Playback speed multiplier applied to every mixer.
pub const DEFAULT_TIME_SCALE: f32 = 1.5;

/// Clip name for a horizontal speed.
pub fn clip_for_motion(horizontal_speed: f32) -> &'static str {
    if horizontal_speed > MOVE_EPSILON {
        WALK_CLIP
    } else {
        IDLE_CLIP
    }
}

/// Local character animation bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct AnimationState {
    current: Option<&'static str>,
    last_broadcast: Option<String>,
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the clip for this frame. Returns the clip only when it changed.
    pub fn select(&mut self, horizontal_speed: f32) -> Option<&'static str> {
        let clip = clip_for_motion(horizontal_speed);
        if self.current == Some(clip) {
            return None;
        }
        self.current = Some(clip);
        Some(clip)
    }

    pub fn current(&self) -> Option<&'static str> {
        self.current
    }

    /// Clip to announce, if it differs from the last one announced.
    pub fn take_broadcast(&mut self) -> Option<String> {
        let current = self.current?;
        if self.last_broadcast.as_deref() == Some(current) {
            return None;
        }
        self.last_broadcast = Some(current.to_string());
        Some(current.to_string())
    }
}

/// Clips available on a loaded model and the one playing.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationMixer {
    clips: Vec<String>,
    playing: Option<String>,
    pub time_scale: f32,
}

impl AnimationMixer {
    /// `None` when the model has no clips (nothing to mix).
    pub fn new(clips: Vec<String>) -> Option<Self> {
        if clips.is_empty() {
            return None;
        }
        Some(Self {
            clips,
            playing: None,
            time_scale: DEFAULT_TIME_SCALE,
        })
    }

    pub fn has_clip(&self, name: &str) -> bool {
        self.clips.iter().any(|c| c == name)
    }

    /// Switch clips. Replaying the current clip or asking for an unknown
    /// one is a no-op and returns `false`.
    pub fn play(&mut self, name: &str) -> bool {
        if self.playing.as_deref() == Some(name) || !self.has_clip(name) {
            return false;
        }
        self.playing = Some(name.to_string());
        true
    }

    pub fn playing(&self) -> Option<&str> {
        self.playing.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_idempotent() {
        let mut anim = AnimationState::new();
        assert_eq!(anim.select(0.0), Some(IDLE_CLIP));
        assert_eq!(anim.select(0.0), None, "same clip twice is a no-op");
        assert_eq!(anim.select(4.9), Some(WALK_CLIP));
    }

    #[test]
    fn test_broadcast_edge_triggered() {
        let mut anim = AnimationState::new();
        assert_eq!(anim.take_broadcast(), None, "nothing selected yet");
        anim.select(5.0);
        assert_eq!(anim.take_broadcast().as_deref(), Some(WALK_CLIP));
        assert_eq!(anim.take_broadcast(), None);
        anim.select(0.0);
        anim.select(5.0);
        assert_eq!(anim.take_broadcast(), None, "back to the clip already announced");
    }

    #[test]
    fn test_mixer_without_clips() {
        assert!(AnimationMixer::new(Vec::new()).is_none());
    }

    #[test]
    fn test_mixer_play() {
        let mut mixer =
            AnimationMixer::new(vec![WALK_CLIP.to_string(), IDLE_CLIP.to_string()]).expect("clips");
        assert!(mixer.play(IDLE_CLIP));
        assert!(!mixer.play(IDLE_CLIP));
        assert!(!mixer.play("animation.goblin.dance"));
        assert_eq!(mixer.playing(), Some(IDLE_CLIP));
    }
}
