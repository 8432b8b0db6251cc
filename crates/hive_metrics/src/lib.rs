//! Hive Metrics - timing helpers for the ECS runtime
//!
//! Provides zero-cost abstractions for timing collection that completely
//! vanish in production builds via feature flags.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable timing collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use hive_metrics::{FrameTimer, SystemProfiler};
//!
//! let mut ticks = FrameTimer::new(60); // Track last 60 ticks
//! let mut profiler = SystemProfiler::new(60);
//! ticks.begin();
//! profiler.time_system("movement", || movement.run());
//! ticks.end();
//! println!("{:.1} ticks/s", ticks.fps());
//! ```
//!
//! Without the `metrics` feature the same types exist as empty stubs, so
//! callers never need their own `cfg` guards.

#[cfg(feature = "metrics")]
mod frame_timer;
#[cfg(feature = "metrics")]
mod ring_buffer;
#[cfg(feature = "metrics")]
mod system_profiler;

#[cfg(feature = "metrics")]
pub use frame_timer::FrameTimer;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use system_profiler::{SystemProfiler, SystemTiming};

// ============================================================================
// Macros for conditional compilation
// ============================================================================

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

/// Time a block under `name` (zero-cost when metrics disabled)
#[macro_export]
macro_rules! time_scope {
    ($profiler:expr, $name:expr, $body:block) => {{
        #[cfg(feature = "metrics")]
        let result = $profiler.time_system($name, || $body);
        #[cfg(not(feature = "metrics"))]
        let result = $body;
        result
    }};
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct FrameTimer;

#[cfg(not(feature = "metrics"))]
impl FrameTimer {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn frames(&self) -> u64 { 0 }
    pub fn fps(&self) -> f64 { 0.0 }
    pub fn frame_time_ms(&self) -> f64 { 0.0 }
    pub fn frame_time_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemTiming {
    pub passes: u64,
    pub total: std::time::Duration,
    pub average: std::time::Duration,
    pub last: std::time::Duration,
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct SystemProfiler;

#[cfg(not(feature = "metrics"))]
impl SystemProfiler {
    pub fn new(_window: usize) -> Self { Self }
    pub fn time_system<F, R>(&mut self, _name: &str, f: F) -> R where F: FnOnce() -> R { f() }
    pub fn record(&mut self, _name: &str, _elapsed: std::time::Duration) {}
    pub fn timing(&self, _name: &str) -> Option<SystemTiming> { None }
    pub fn report(&self) -> Vec<(String, SystemTiming)> { Vec::new() }
    pub fn reset(&mut self) {}
}
