//! Monotonic Timer
//!
//! Countdown primitive used wherever the scheduler tracks a duration.
//! Backed by `tokio::time::Instant`, so wall-clock adjustments (NTP sync)
//! never change rotation cadence, and tests can pause and advance time.

use std::time::Duration;

use tokio::time::Instant;

/// A restartable countdown timer
///
/// Once the armed duration has elapsed, [`Timer::is_timeout`] stays true until
/// the timer is stopped or armed again.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    started_at: Option<Instant>,
    duration: Duration,
}

impl Timer {
    /// Create a stopped timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer with a new duration, counting from now
    pub fn start(&mut self, duration: Duration) {
        self.duration = duration;
        self.started_at = Some(Instant::now());
    }

    /// Stop the timer; it no longer reports running or timeout
    pub fn stop(&mut self) {
        self.started_at = None;
    }

    /// Re-arm the timer with the last used duration
    pub fn restart(&mut self) {
        self.start(self.duration);
    }

    /// Whether the timer is armed
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Whether the armed duration has elapsed
    pub fn is_timeout(&self) -> bool {
        self.started_at
            .map(|started| started.elapsed() >= self.duration)
            .unwrap_or(false)
    }

    /// Time since the timer was armed (zero when stopped)
    pub fn elapsed(&self) -> Duration {
        self.started_at
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }

    /// Last armed duration
    pub fn duration(&self) -> Duration {
        self.duration
    }
}
