//! Simulation-time accumulation.
//!
//! The runtime is driven by caller-supplied frame deltas; anything that must
//! fire on a fixed simulated interval accumulates those deltas here.

use std::time::Duration;

/// Default interval between capacity decay steps (20 simulated seconds).
pub const DEFAULT_DECAY_INTERVAL: Duration = Duration::from_secs(20);

/// Accumulates frame deltas and reports how many whole intervals elapsed.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    interval: Duration,
    accumulated: Duration,
    total: Duration,
    steps: u64,
}

impl IntervalTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            accumulated: Duration::ZERO,
            total: Duration::ZERO,
            steps: 0,
        }
    }

    /// Build from a seconds value, falling back to the default when it is not
    /// a positive finite number.
    pub fn from_secs_f32(secs: f32) -> Self {
        if secs.is_finite() && secs > 0.0 {
            Self::new(Duration::from_secs_f32(secs))
        } else {
            Self::new(DEFAULT_DECAY_INTERVAL)
        }
    }

    /// Add `dt` seconds; returns the number of intervals that completed.
    ///
    /// Non-finite or non-positive deltas are ignored.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }
        let dt = Duration::from_secs_f32(dt);
        self.accumulated += dt;
        self.total += dt;

        let mut fired = 0;
        while self.accumulated > self.interval {
            self.accumulated -= self.interval;
            fired += 1;
        }
        self.steps += u64::from(fired);
        fired
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time accumulated towards the next step.
    pub fn pending(&self) -> Duration {
        self.accumulated
    }

    /// Total simulated time seen.
    pub fn total_time(&self) -> Duration {
        self.total
    }

    /// Intervals completed so far.
    pub fn step_count(&self) -> u64 {
        self.steps
    }
}

impl Default for IntervalTimer {
    fn default() -> Self {
        Self::new(DEFAULT_DECAY_INTERVAL)
    }
}
