use super::{grow_formula, ContainerError, Resizable, DEFAULT_CAPACITY};

const NONE: u32 = u32::MAX;

/// Items that carry their own dense integer key.
pub trait Keyed {
    fn key(&self) -> usize;
}

/// Densely packed keyed items with O(1) add, remove and membership tests.
///
/// A sparse slot table maps each key to its position in the dense array.
/// Removal swaps the last item into the hole, so iteration order is not
/// stable across removals.
#[derive(Debug)]
pub struct KeyedArray<K> {
    dense: Vec<K>,
    slots: Vec<u32>,
    target_cap: usize,
}

impl<K: Keyed + Copy + PartialEq> KeyedArray<K> {
    pub fn new(target_capacity: usize) -> Self {
        let target_cap = target_capacity.max(1);
        Self {
            dense: Vec::with_capacity(target_cap),
            slots: vec![NONE; target_cap],
            target_cap,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Position of `key` in the dense array.
    #[inline]
    pub fn index_of(&self, key: usize) -> Option<usize> {
        match self.slots.get(key) {
            Some(&slot) if slot != NONE => Some(slot as usize),
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, key: usize) -> bool {
        self.index_of(key).is_some()
    }

    /// Item at dense position `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<K> {
        self.dense.get(index).copied()
    }

    /// Insert `item`.
    ///
    /// Adding an item that is already present is a no-op and returns
    /// `Ok(false)`. A different item stored under the same key is a conflict.
    pub fn add(&mut self, item: K) -> Result<bool, ContainerError> {
        let key = item.key();
        if let Some(index) = self.index_of(key) {
            if self.dense[index] == item {
                return Ok(false);
            }
            return Err(ContainerError::KeyStateConflict {
                key,
                detail: "a different item is stored under this key",
            });
        }
        if key >= self.slots.len() {
            self.slots.resize(grow_formula(key), NONE);
        }
        self.slots[key] = self.dense.len() as u32;
        self.dense.push(item);
        Ok(true)
    }

    /// Remove the item stored under `key`.
    pub fn remove(&mut self, key: usize) -> Result<K, ContainerError> {
        if self.dense.is_empty() {
            return Err(ContainerError::EmptyCollection);
        }
        let index = self
            .index_of(key)
            .ok_or(ContainerError::ItemNotFound { key })?;

        let item = self.dense.swap_remove(index);
        self.slots[key] = NONE;
        if let Some(moved) = self.dense.get(index) {
            self.slots[moved.key()] = index as u32;
        }

        if self.dense.is_empty() && self.slots.len() > self.target_cap {
            self.reset_to_target();
        }
        Ok(item)
    }

    /// Remove every item and shrink back to the target capacity.
    pub fn clear(&mut self) {
        self.dense.clear();
        self.reset_to_target();
    }

    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.dense.iter().copied()
    }

    pub fn as_slice(&self) -> &[K] {
        &self.dense
    }

    /// Verify that the slot table and the dense array agree.
    pub fn control_check(&self) -> Result<(), ContainerError> {
        for (index, item) in self.dense.iter().enumerate() {
            let key = item.key();
            if self.index_of(key) != Some(index) {
                return Err(ContainerError::KeyStateConflict {
                    key,
                    detail: "slot table disagrees with packed position",
                });
            }
        }
        let mapped = self.slots.iter().filter(|&&slot| slot != NONE).count();
        if mapped != self.dense.len() {
            return Err(ContainerError::KeyStateConflict {
                key: mapped,
                detail: "slot table holds stale entries",
            });
        }
        Ok(())
    }

    fn reset_to_target(&mut self) {
        self.slots = vec![NONE; self.target_cap];
        self.dense.shrink_to(self.target_cap);
    }

    fn outermost_key(&self) -> usize {
        self.dense.iter().map(|item| item.key() + 1).max().unwrap_or(0)
    }
}

impl<K: Keyed + Copy + PartialEq> Default for KeyedArray<K> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<K: Keyed + Copy + PartialEq> Resizable for KeyedArray<K> {
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
        let wanted = self.dense.len() + additional;
        if wanted > self.slots.len() {
            self.slots.resize(wanted, NONE);
        }
        self.dense.reserve(additional);
    }

    fn fit(&mut self, absolute: bool) -> bool {
        let outermost = self.outermost_key();
        let size = if absolute {
            outermost.max(1)
        } else {
            outermost.max(self.target_cap)
        };
        if size == self.slots.len() {
            return false;
        }
        self.slots.truncate(size);
        self.slots.resize(size, NONE);
        self.slots.shrink_to_fit();
        self.dense.shrink_to(size);
        true
    }

    fn load_factor(&self) -> f32 {
        self.dense.len() as f32 / self.slots.len() as f32
    }
}
