use super::{Queue, Resizable};

/// Lifecycle hooks for pooled objects.
pub trait Recycle<T> {
    /// Build a fresh instance when the pool is empty.
    fn create(&mut self) -> T;

    /// Restore an instance to its initial state before it is stored.
    fn reset(&mut self, _item: &mut T) {}

    /// Called for instances the pool refuses because it is full.
    fn discard(&mut self, _item: T) {}
}

/// What [`Pool::free`] did with the returned object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolOutcome {
    Recycled,
    Discarded,
}

/// Bounded object recycler backed by a FIFO free-list.
#[derive(Debug)]
pub struct Pool<T, R> {
    free: Queue<T>,
    recycler: R,
    max_size: usize,
    peak: usize,
    new_instances: u64,
    discarded: u64,
    recycled: u64,
    obtained: u64,
}

impl<T, R: Recycle<T>> Pool<T, R> {
    pub fn new(initial_capacity: usize, max_size: usize, recycler: R) -> Self {
        Self {
            free: Queue::new(initial_capacity.min(max_size.max(1))),
            recycler,
            max_size,
            peak: 0,
            new_instances: 0,
            discarded: 0,
            recycled: 0,
            obtained: 0,
        }
    }

    /// Take a stored instance, or create one.
    pub fn obtain(&mut self) -> T {
        self.obtained += 1;
        match self.free.try_dequeue() {
            Some(item) => item,
            None => {
                self.new_instances += 1;
                self.recycler.create()
            }
        }
    }

    /// Hand an instance back. It is reset and stored unless the pool is full.
    pub fn free(&mut self, mut item: T) -> PoolOutcome {
        if self.free.len() >= self.max_size {
            self.discarded += 1;
            self.recycler.discard(item);
            return PoolOutcome::Discarded;
        }
        self.recycler.reset(&mut item);
        self.free.enqueue(item);
        self.recycled += 1;
        self.peak = self.peak.max(self.free.len());
        PoolOutcome::Recycled
    }

    /// Create up to `count` instances ahead of time, bounded by the max size.
    ///
    /// Returns how many were added.
    pub fn fill(&mut self, count: usize) -> usize {
        let room = self.max_size.saturating_sub(self.free.len());
        let count = count.min(room);
        self.free.ensure_capacity(count);
        for _ in 0..count {
            let item = self.recycler.create();
            self.new_instances += 1;
            self.free.enqueue(item);
        }
        self.peak = self.peak.max(self.free.len());
        count
    }

    /// Discard every stored instance.
    pub fn clear(&mut self) {
        while let Some(item) = self.free.try_dequeue() {
            self.discarded += 1;
            self.recycler.discard(item);
        }
        self.free.clear();
    }

    /// Shrink the free-list allocation towards its current fill.
    pub fn fit(&mut self, absolute: bool) -> bool {
        self.free.fit(absolute)
    }

    /// Instances currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    #[inline]
    pub fn peak(&self) -> usize {
        self.peak
    }

    #[inline]
    pub fn new_instances(&self) -> u64 {
        self.new_instances
    }

    #[inline]
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    #[inline]
    pub fn recycled(&self) -> u64 {
        self.recycled
    }

    #[inline]
    pub fn obtained(&self) -> u64 {
        self.obtained
    }

    /// Instances created and not discarded, stored or handed out.
    #[inline]
    pub fn objects_in_memory(&self) -> u64 {
        self.new_instances.saturating_sub(self.discarded)
    }

    pub fn load_factor(&self) -> f32 {
        self.free.load_factor()
    }

    pub fn capacity(&self) -> usize {
        self.free.capacity()
    }

    pub fn recycler(&self) -> &R {
        &self.recycler
    }

    pub fn recycler_mut(&mut self) -> &mut R {
        &mut self.recycler
    }
}
