//! Tick timing

use super::ring_buffer::RingBuffer;
use std::time::{Duration, Instant};

/// Measures the wall-clock duration of driver ticks.
#[derive(Debug)]
pub struct FrameTimer {
    started: Option<Instant>,
    frames: u64,
    frame_times: RingBuffer<Duration>,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            started: None,
            frames: 0,
            frame_times: RingBuffer::new(capacity),
        }
    }

    pub fn begin(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Close the tick opened by [`FrameTimer::begin`]. Unmatched calls are ignored.
    pub fn end(&mut self) {
        if let Some(started) = self.started.take() {
            self.frame_times.push(started.elapsed());
            self.frames += 1;
        }
    }

    /// Ticks measured so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn fps(&self) -> f64 {
        let average = self.frame_times.average().as_secs_f64();
        if average > 0.0 {
            1.0 / average
        } else {
            0.0
        }
    }

    pub fn frame_time_ms(&self) -> f64 {
        self.frame_times.average().as_secs_f64() * 1000.0
    }

    pub fn frame_time_range_ms(&self) -> (f64, f64) {
        let (min, max) = self.frame_times.min_max();
        (min.as_secs_f64() * 1000.0, max.as_secs_f64() * 1000.0)
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(60)
    }
}
