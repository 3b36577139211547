//! Frame timing helpers
//!
//! Wall-clock milliseconds, cooldowns and repeating intervals. Gameplay code
//! never reads the clock directly; the scene samples a [`Clock`] once per
//! frame and passes `now_ms` down, which keeps every system deterministic
//! under test.

use std::cell::Cell;
use std::rc::Rc;

/// Milliseconds since an arbitrary session epoch.
pub type Millis = u64;

/// Source of the frame timestamp.
pub trait Clock {
    fn now_ms(&self) -> Millis;
}

/// Monotonic clock backed by [`web_time::Instant`] (works on wasm too).
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: web_time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: web_time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        self.start.elapsed().as_millis() as Millis
    }
}

/// Hand-driven clock for tests and scripted sessions.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Millis>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Move the clock forward by `delta_ms`.
    pub fn advance(&self, delta_ms: Millis) {
        self.now.set(self.now.get() + delta_ms);
    }

    pub fn set(&self, now: Millis) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}

/// Shared clocks: a test keeps one handle and the runner owns the other.
impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now_ms(&self) -> Millis {
        (**self).now_ms()
    }
}

/// Gate that opens at most once per `period_ms`.
///
/// The first call always fires. Used for the throw cooldown and the
/// `move` broadcast throttle.
#[derive(Debug, Clone, Copy)]
pub struct Cooldown {
    period_ms: Millis,
    last_fired: Option<Millis>,
}

impl Cooldown {
    pub fn new(period_ms: Millis) -> Self {
        Self {
            period_ms,
            last_fired: None,
        }
    }

    /// Whether a call at `now` would fire, without consuming it.
    pub fn is_ready(&self, now: Millis) -> bool {
        match self.last_fired {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.period_ms,
        }
    }

    /// Fire if ready. Returns `true` when the gate opened.
    pub fn try_fire(&mut self, now: Millis) -> bool {
        if !self.is_ready(now) {
            return false;
        }
        self.last_fired = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last_fired = None;
    }

    pub fn period_ms(&self) -> Millis {
        self.period_ms
    }
}

/// Repeating timer that starts counting when armed.
///
/// Unlike [`Cooldown`], the first tick only fires after a full period.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    period_ms: Millis,
    last: Millis,
}

impl Interval {
    pub fn new(period_ms: Millis, start: Millis) -> Self {
        Self {
            period_ms,
            last: start,
        }
    }

    /// Returns `true` once per elapsed period.
    pub fn tick(&mut self, now: Millis) -> bool {
        if now.saturating_sub(self.last) >= self.period_ms {
            self.last = now;
            true
        } else {
            false
        }
    }

    /// Restart the period from `now`.
    pub fn restart(&mut self, now: Millis) {
        self.last = now;
    }
}
