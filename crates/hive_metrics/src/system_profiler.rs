//! Per-system pass timing

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::ring_buffer::RingBuffer;

/// Summary of the passes recorded for one system.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemTiming {
    pub passes: u64,
    pub total: Duration,
    /// Average over the recent window.
    pub average: Duration,
    pub last: Duration,
}

#[derive(Debug)]
struct Track {
    passes: u64,
    total: Duration,
    recent: RingBuffer<Duration>,
}

#[derive(Debug)]
pub struct SystemProfiler {
    window: usize,
    tracks: HashMap<String, Track>,
}

impl SystemProfiler {
    /// Profiler averaging over the last `window` passes of each system.
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            tracks: HashMap::new(),
        }
    }

    pub fn time_system<F, R>(&mut self, name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.record(name, start.elapsed());
        result
    }

    /// Record one pass of `name` that took `elapsed`.
    pub fn record(&mut self, name: &str, elapsed: Duration) {
        let window = self.window;
        let track = self
            .tracks
            .entry(name.to_string())
            .or_insert_with(|| Track {
                passes: 0,
                total: Duration::ZERO,
                recent: RingBuffer::new(window),
            });
        track.passes += 1;
        track.total += elapsed;
        track.recent.push(elapsed);
    }

    pub fn timing(&self, name: &str) -> Option<SystemTiming> {
        self.tracks.get(name).map(summarize)
    }

    /// Every tracked system, slowest average first.
    pub fn report(&self) -> Vec<(String, SystemTiming)> {
        let mut rows: Vec<(String, SystemTiming)> = self
            .tracks
            .iter()
            .map(|(name, track)| (name.clone(), summarize(track)))
            .collect();
        rows.sort_by(|a, b| b.1.average.cmp(&a.1.average).then_with(|| a.0.cmp(&b.0)));
        rows
    }

    pub fn reset(&mut self) {
        self.tracks.clear();
    }
}

impl Default for SystemProfiler {
    fn default() -> Self {
        Self::new(60)
    }
}

fn summarize(track: &Track) -> SystemTiming {
    SystemTiming {
        passes: track.passes,
        total: track.total,
        average: track.recent.average(),
        last: track.recent.latest().unwrap_or_default(),
    }
}
