use super::{grow_formula, ContainerError, Resizable, DEFAULT_CAPACITY};

/// Circular FIFO queue.
///
/// Grows by [`grow_formula`] when full and drops back to its target capacity
/// once drained.
#[derive(Debug)]
pub struct Queue<T> {
    slots: Vec<Option<T>>,
    front: usize,
    len: usize,
    target_cap: usize,
}

impl<T> Queue<T> {
    pub fn new(target_capacity: usize) -> Self {
        let target_cap = target_capacity.max(1);
        Self {
            slots: empty_slots(target_cap),
            front: 0,
            len: 0,
            target_cap,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn enqueue(&mut self, item: T) {
        if self.len == self.slots.len() {
            self.relocate(grow_formula(self.slots.len()));
        }
        let back = (self.front + self.len) % self.slots.len();
        self.slots[back] = Some(item);
        self.len += 1;
    }

    /// Dequeue the front item, if any.
    pub fn try_dequeue(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let item = self.slots[self.front].take();
        self.front = (self.front + 1) % self.slots.len();
        self.len -= 1;
        if self.len == 0 {
            self.front = 0;
            if self.slots.len() > self.target_cap {
                self.slots = empty_slots(self.target_cap);
            }
        }
        item
    }

    /// Dequeue the front item, failing on an empty queue.
    pub fn dequeue(&mut self) -> Result<T, ContainerError> {
        self.try_dequeue().ok_or(ContainerError::EmptyCollection)
    }

    pub fn peek(&self) -> Option<&T> {
        if self.len == 0 {
            None
        } else {
            self.slots[self.front].as_ref()
        }
    }

    /// Drop every queued item and shrink back to the target capacity.
    pub fn clear(&mut self) {
        self.slots = empty_slots(self.target_cap);
        self.front = 0;
        self.len = 0;
    }

    /// Remove every queued item in FIFO order.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        std::iter::from_fn(move || self.try_dequeue())
    }

    /// Copy the live items into a fresh linear buffer of `capacity` slots.
    fn relocate(&mut self, capacity: usize) {
        debug_assert!(capacity >= self.len);
        let old_cap = self.slots.len();
        let mut next = empty_slots(capacity);
        for (offset, slot) in next.iter_mut().take(self.len).enumerate() {
            *slot = self.slots[(self.front + offset) % old_cap].take();
        }
        self.slots = next;
        self.front = 0;
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T> Resizable for Queue<T> {
    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn target_capacity(&self) -> usize {
        self.target_cap
    }

    fn set_target_capacity(&mut self, capacity: usize) {
        self.target_cap = capacity.max(1);
    }

    fn ensure_capacity(&mut self, additional: usize) {
        let wanted = self.len + additional;
        if wanted > self.slots.len() {
            self.relocate(wanted);
        }
    }

    fn fit(&mut self, absolute: bool) -> bool {
        let size = if absolute {
            self.len.max(1)
        } else {
            self.len.max(self.target_cap)
        };
        if size == self.slots.len() {
            return false;
        }
        self.relocate(size);
        true
    }

    fn load_factor(&self) -> f32 {
        self.len as f32 / self.slots.len() as f32
    }
}

fn empty_slots<T>(capacity: usize) -> Vec<Option<T>> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || None);
    slots
}
