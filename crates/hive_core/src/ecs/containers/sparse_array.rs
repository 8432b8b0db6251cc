use super::{grow_formula, Resizable, DEFAULT_CAPACITY};

/// Index-addressed storage that tolerates holes.
///
/// Items are placed at caller-chosen indices (entity ids), so removals leave
/// holes that are filled again when ids are recycled. `used_space` tracks the
/// slot just past the outermost occupied index; refits never cut below it.
///
/// Can also be used as a stack through [`SparseArray::push`] and
/// [`SparseArray::pop`], which operate on the outermost item.
#[derive(Debug)]
pub struct SparseArray<T> {
    items: Vec<Option<T>>,
    used: usize,
    count: usize,
    target_cap: usize,
}

impl<T> SparseArray<T> {
    pub fn new(target_capacity: usize) -> Self {
        let target_cap = target_capacity.max(1);
        Self {
            items: empty_slots(target_cap),
            used: 0,
            count: 0,
            target_cap,
        }
    }

    /// Number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// One past the outermost occupied index.
    #[inline]
    pub fn used_space(&self) -> usize {
        self.used
    }

    /// Whether every slot below `used_space` is occupied.
    #[inline]
    pub fn is_stacked(&self) -> bool {
        self.used == self.count
    }

    /// Bounds-checked lookup. Indices past `used_space` are absent.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.used {
            self.items[index].as_ref()
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.used {
            self.items[index].as_mut()
        } else {
            None
        }
    }

    /// Direct slot access for callers that already know the slot is in range.
    ///
    /// # Panics
    /// Panics if `index` is beyond the allocated capacity.
    #[inline]
    pub fn get_unchecked(&self, index: usize) -> Option<&T> {
        self.items[index].as_ref()
    }

    /// Direct mutable slot access, see [`SparseArray::get_unchecked`].
    #[inline]
    pub fn get_unchecked_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items[index].as_mut()
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Store `item` at `index`, growing if needed. Returns the replaced item.
    pub fn set(&mut self, index: usize, item: T) -> Option<T> {
        if index >= self.items.len() {
            self.resize(grow_formula(index));
        }
        let previous = self.items[index].replace(item);
        if previous.is_none() {
            self.count += 1;
            self.used = self.used.max(index + 1);
        }
        previous
    }

    /// Take the item at `index`, leaving a hole.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.used {
            return None;
        }
        let item = self.items[index].take()?;
        self.count -= 1;
        if index + 1 == self.used {
            self.retreat();
        }
        Some(item)
    }

    /// Append past the outermost item.
    pub fn push(&mut self, item: T) {
        if self.used == self.items.len() {
            self.resize(grow_formula(self.items.len()));
        }
        self.items[self.used] = Some(item);
        self.used += 1;
        self.count += 1;
    }

    /// Remove the outermost item.
    pub fn pop(&mut self) -> Option<T> {
        if self.used == 0 {
            return None;
        }
        let item = self.items[self.used - 1].take();
        self.count -= 1;
        self.retreat();
        item
    }

    /// Remove every item. Capacity is kept; use [`Resizable::fit`] to shrink.
    pub fn clear(&mut self) {
        for slot in &mut self.items[..self.used] {
            *slot = None;
        }
        self.used = 0;
        self.count = 0;
    }

    /// Move items from the tail into holes until the array is stacked.
    ///
    /// Indices of moved items change; only use when positions are not tracked.
    pub fn stack(&mut self) {
        if self.is_stacked() {
            return;
        }
        let mut left = 0;
        let mut right = self.used - 1;
        while left < right {
            while self.items[left].is_some() {
                left += 1;
            }
            while self.items[right].is_none() {
                right -= 1;
            }
            if left < right {
                self.items.swap(left, right);
                left += 1;
                right -= 1;
            }
        }
        self.used = self.count;
    }

    /// Iterate occupied slots as `(index, item)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.items[..self.used]
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|item| (index, item)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.items[..self.used]
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_mut().map(|item| (index, item)))
    }

    fn retreat(&mut self) {
        while self.used > 0 && self.items[self.used - 1].is_none() {
            self.used -= 1;
        }
    }

    /// Reallocate to exactly `capacity` slots, moving only the live prefix.
    fn resize(&mut self, capacity: usize) {
        debug_assert!(capacity >= self.used);
        let mut next = Vec::with_capacity(capacity);
        next.extend(self.items.drain(..self.used));
        next.resize_with(capacity, || None);
        self.items = next;
    }
}

impl<T> Default for SparseArray<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T> Resizable for SparseArray<T> {
    #[inline]
    fn capacity(&self) -> usize {
        self.items.len()
    }

    #[inline]
    fn target_capacity(&self) -> usize {
        self.target_cap
    }

    fn set_target_capacity(&mut self, capacity: usize) {
        self.target_cap = capacity.max(1);
    }

    fn ensure_capacity(&mut self, additional: usize) {
        let wanted = self.used + additional;
        if wanted > self.capacity() {
            self.resize(wanted);
        }
    }

    fn fit(&mut self, absolute: bool) -> bool {
        let used = self.used;
        if used == self.capacity() {
            return false;
        }
        let size = if absolute {
            used.max(1)
        } else {
            used.max(self.target_cap)
        };
        if size == self.capacity() {
            return false;
        }
        self.resize(size);
        true
    }

    fn load_factor(&self) -> f32 {
        self.count as f32 / self.items.len() as f32
    }
}

fn empty_slots<T>(capacity: usize) -> Vec<Option<T>> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || None);
    slots
}
