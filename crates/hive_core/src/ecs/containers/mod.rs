//! Growable containers the runtime is built on.
//!
//! Every container has a *target capacity*: the resting size it shrinks back
//! to when emptied or refitted. Growth follows [`grow_formula`].
//!
//! - [`SparseArray`]: index-addressed slots with holes (component storage,
//!   alive entities).
//! - [`KeyedArray`]: densely packed keys with O(1) removal (system members).
//! - [`Queue`]: circular FIFO (pool free-lists).
//! - [`Pool`]: bounded recycler built on [`Queue`].

mod keyed_array;
mod pool;
mod queue;
mod sparse_array;

pub use keyed_array::{Keyed, KeyedArray};
pub use pool::{Pool, PoolOutcome, Recycle};
pub use queue::Queue;
pub use sparse_array::SparseArray;

use thiserror::Error;

/// Capacity used when no explicit capacity is requested.
pub const DEFAULT_CAPACITY: usize = 16;

/// Next capacity for a container that has outgrown `n` slots.
#[inline]
pub const fn grow_formula(n: usize) -> usize {
    ((n + 1) * 3) / 2 + 1
}

/// Failures raised by container bookkeeping.
///
/// These indicate a broken internal invariant (or misuse of a pop/dequeue),
/// never a transient condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    #[error("collection is empty")]
    EmptyCollection,

    #[error("key {key} is in a conflicting state: {detail}")]
    KeyStateConflict { key: usize, detail: &'static str },

    #[error("no item stored under key {key}")]
    ItemNotFound { key: usize },
}

/// Shared capacity management of the runtime's containers.
pub trait Resizable {
    /// Allocated slots.
    fn capacity(&self) -> usize;

    /// Resting capacity used by [`Resizable::fit`] and on emptying.
    fn target_capacity(&self) -> usize;

    /// Set the resting capacity (clamped to at least 1).
    fn set_target_capacity(&mut self, capacity: usize);

    /// Make room for `additional` items beyond what is in use.
    fn ensure_capacity(&mut self, additional: usize);

    /// Shrink to `max(used, target)` (or `max(used, 1)` when `absolute`).
    ///
    /// Returns whether a reallocation happened.
    fn fit(&mut self, absolute: bool) -> bool;

    /// Live items over allocated slots.
    fn load_factor(&self) -> f32;
}
