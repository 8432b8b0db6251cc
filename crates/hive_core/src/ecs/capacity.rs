//! Decay-driven shrinking of idle storage.
//!
//! Each component type owns two 4-bit counters, one for its sparse container
//! and one for its pool. Every decay step advances each counter that is not
//! yet saturated; the step that saturates it schedules exactly one refit.
//! A saturated counter stays pinned until its resource is touched again.

use crate::ecs::types::MAX_TYPES;
use crate::time::IntervalTimer;

/// Counter value at which a refit fires and the counter pins.
pub const DECAY_LIMIT: u8 = 0x0F;

/// Per-type refits due after a call to [`CapacityControl::update`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefitSchedule {
    /// Bit `n` set: refit the container of type id `n`.
    pub containers: u64,
    /// Bit `n` set: refit the pool of type id `n`.
    pub pools: u64,
}

impl RefitSchedule {
    pub fn is_empty(&self) -> bool {
        self.containers == 0 && self.pools == 0
    }

    pub fn container_ids(&self) -> impl Iterator<Item = u8> {
        bit_ids(self.containers)
    }

    pub fn pool_ids(&self) -> impl Iterator<Item = u8> {
        bit_ids(self.pools)
    }
}

fn bit_ids(mut mask: u64) -> impl Iterator<Item = u8> {
    std::iter::from_fn(move || {
        if mask == 0 {
            return None;
        }
        let id = mask.trailing_zeros() as u8;
        mask &= mask - 1;
        Some(id)
    })
}

/// Decay counters for every registered component type.
#[derive(Debug)]
pub struct CapacityControl {
    container_decay: [u8; MAX_TYPES],
    pool_decay: [u8; MAX_TYPES],
    registered: usize,
    timer: IntervalTimer,
}

impl CapacityControl {
    pub fn new(timer: IntervalTimer) -> Self {
        Self {
            container_decay: [DECAY_LIMIT; MAX_TYPES],
            pool_decay: [DECAY_LIMIT; MAX_TYPES],
            registered: 0,
            timer,
        }
    }

    /// Start tracking type `id`. Its counters begin pinned.
    pub fn register(&mut self, id: u8) {
        let id = usize::from(id);
        debug_assert!(id < MAX_TYPES);
        self.container_decay[id] = DECAY_LIMIT;
        self.pool_decay[id] = DECAY_LIMIT;
        self.registered = self.registered.max(id + 1);
    }

    #[inline]
    pub fn reset_container(&mut self, id: u8) {
        self.container_decay[usize::from(id)] = 0;
    }

    #[inline]
    pub fn reset_pool(&mut self, id: u8) {
        self.pool_decay[usize::from(id)] = 0;
    }

    pub fn container_counter(&self, id: u8) -> u8 {
        self.container_decay[usize::from(id)]
    }

    pub fn pool_counter(&self, id: u8) -> u8 {
        self.pool_decay[usize::from(id)]
    }

    /// Advance simulated time by `dt` seconds and collect the refits due.
    pub fn update(&mut self, dt: f32) -> RefitSchedule {
        let steps = self.timer.advance(dt);
        let mut schedule = RefitSchedule::default();
        for _ in 0..steps {
            self.step(&mut schedule);
        }
        schedule
    }

    /// Perform one decay step immediately.
    pub fn step(&mut self, schedule: &mut RefitSchedule) {
        let n = self.registered;
        schedule.containers |= decay(&mut self.container_decay[..n]);
        schedule.pools |= decay(&mut self.pool_decay[..n]);
    }

    pub fn timer(&self) -> &IntervalTimer {
        &self.timer
    }

    /// Pin every counter, as if nothing had been touched.
    pub fn clear(&mut self) {
        self.container_decay = [DECAY_LIMIT; MAX_TYPES];
        self.pool_decay = [DECAY_LIMIT; MAX_TYPES];
    }
}

impl Default for CapacityControl {
    fn default() -> Self {
        Self::new(IntervalTimer::default())
    }
}

fn decay(counters: &mut [u8]) -> u64 {
    let mut fired = 0u64;
    for (id, counter) in counters.iter_mut().enumerate() {
        if *counter < DECAY_LIMIT {
            *counter += 1;
            if *counter == DECAY_LIMIT {
                fired |= 1 << id;
            }
        }
    }
    fired
}
