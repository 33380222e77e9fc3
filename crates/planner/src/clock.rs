//! Clock capability and deadline timer.
//!
//! The planner never reads the wall clock directly; a [`Clock`] handle is
//! passed in so tests and host integrations can substitute their own time
//! source.

use std::cell::Cell;
use std::time::Instant;

/// A monotonic time source.
pub trait Clock {
    /// Seconds since an arbitrary but consistent epoch.
    fn now_secs(&self) -> f64;
}

/// [`Clock`] backed by the operating system's monotonic clock.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> SystemClock {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> SystemClock {
        SystemClock::new()
    }
}

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-advanced [`Clock`] for tests and simulation harnesses.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(now: f64) -> ManualClock {
        ManualClock { now: Cell::new(now) }
    }

    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f64 {
        self.now.get()
    }
}

/// A one-shot deadline over a [`Clock`].
pub struct Timer<'a> {
    clock: &'a dyn Clock,
    duration: f64,
    started_at: Option<f64>,
}

impl<'a> Timer<'a> {
    pub fn new(clock: &'a dyn Clock, duration: f64) -> Timer<'a> {
        Timer {
            clock,
            duration,
            started_at: None,
        }
    }

    /// Start or restart the timer.
    pub fn start(&mut self) {
        self.started_at = Some(self.clock.now_secs());
    }

    /// Whether the duration has elapsed since the last start. A timer that
    /// was never started is not expired.
    pub fn is_expired(&self) -> bool {
        match self.started_at {
            None => false,
            Some(started_at) => self.clock.now_secs() - started_at >= self.duration,
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
