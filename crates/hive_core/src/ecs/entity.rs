//! Entity handles, per-entity bookkeeping and id recycling
//!
//! Entities are bare integer ids. An id is never handed out twice while its
//! entity is alive; once an entity is deleted its id becomes eligible for
//! exactly one future `create()`.

use std::fmt;

use crate::ecs::containers::{Keyed, Pool, PoolOutcome, Queue, Recycle};

/// Entity handle.
///
/// Example:
/// ```ignore
/// let entity = ecs.create()?;
/// ecs.add_component(entity, Position { x: 0.0, y: 0.0 })?;
/// ecs.remove(entity)?;
/// // the id is recycled after the next clean pass
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u32);

impl Entity {
    pub(crate) const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.0
    }

    /// Slot of this entity in id-indexed storage.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Entity: {}]", self.0)
    }
}

impl Keyed for Entity {
    #[inline]
    fn key(&self) -> usize {
        self.index()
    }
}

/// Bookkeeping of one live entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    entity: Entity,
    components: u64,
    systems: u64,
    enabled: bool,
    dirty: bool,
}

impl EntityRecord {
    pub(crate) fn new(entity: Entity) -> Self {
        Self {
            entity,
            components: 0,
            systems: 0,
            enabled: true,
            dirty: false,
        }
    }

    #[inline]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Bit `n` set: a component of type id `n` is attached.
    #[inline]
    pub fn components(&self) -> u64 {
        self.components
    }

    /// Bit `n` set: the entity is a member of the system with bit `n`.
    #[inline]
    pub fn systems(&self) -> u64 {
        self.systems
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn component_count(&self) -> u32 {
        self.components.count_ones()
    }

    #[inline]
    pub fn system_count(&self) -> u32 {
        self.systems.count_ones()
    }

    #[inline]
    pub fn has_any_component(&self) -> bool {
        self.components != 0
    }

    #[inline]
    pub fn has_component(&self, flag: u64) -> bool {
        self.components & flag == flag
    }

    #[inline]
    pub fn in_system(&self, bit: u64) -> bool {
        self.systems & bit == bit
    }

    pub(crate) fn add_component_bit(&mut self, flag: u64) {
        self.components |= flag;
    }

    pub(crate) fn remove_component_bit(&mut self, flag: u64) {
        self.components &= !flag;
    }

    pub(crate) fn clear_components(&mut self) {
        self.components = 0;
    }

    pub(crate) fn add_system(&mut self, bit: u64) {
        self.systems |= bit;
    }

    pub(crate) fn remove_system(&mut self, bit: u64) {
        self.systems &= !bit;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn reset(&mut self) {
        *self = Self::new(self.entity);
    }
}

/// Hands out entity ids: recycled ids first, then fresh sequential ones.
#[derive(Debug)]
pub struct EntityRecycler {
    free_ids: Queue<u32>,
    next_id: u32,
}

impl EntityRecycler {
    fn new(capacity: usize) -> Self {
        Self {
            free_ids: Queue::new(capacity),
            next_id: 0,
        }
    }

    /// No recycled id is available and the id space is used up.
    pub fn is_exhausted(&self) -> bool {
        self.free_ids.is_empty() && self.next_id == u32::MAX
    }

    /// Ids waiting to be reused.
    pub fn free_ids(&self) -> usize {
        self.free_ids.len()
    }

    /// Ids generated so far.
    pub fn generated(&self) -> u32 {
        self.next_id
    }

    fn clear(&mut self) {
        self.free_ids.clear();
        self.next_id = 0;
    }
}

impl Recycle<EntityRecord> for EntityRecycler {
    fn create(&mut self) -> EntityRecord {
        let id = match self.free_ids.try_dequeue() {
            Some(id) => id,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                id
            }
        };
        EntityRecord::new(Entity::new(id))
    }

    fn reset(&mut self, record: &mut EntityRecord) {
        record.reset();
    }

    fn discard(&mut self, record: EntityRecord) {
        self.free_ids.enqueue(record.entity.id());
    }
}

/// Pool of entity records. Discarded records give their id back to the
/// recycler, so no id is ever lost.
#[derive(Debug)]
pub struct EntityPool {
    pool: Pool<EntityRecord, EntityRecycler>,
}

impl EntityPool {
    pub fn new(initial_capacity: usize, max_size: usize) -> Self {
        Self {
            pool: Pool::new(initial_capacity, max_size, EntityRecycler::new(initial_capacity)),
        }
    }

    pub fn obtain(&mut self) -> EntityRecord {
        self.pool.obtain()
    }

    pub fn free(&mut self, record: EntityRecord) -> PoolOutcome {
        self.pool.free(record)
    }

    pub fn fill(&mut self, count: usize) -> usize {
        self.pool.fill(count)
    }

    pub fn is_exhausted(&self) -> bool {
        self.pool.is_empty() && self.pool.recycler().is_exhausted()
    }

    /// Drop every pooled record and restart id generation.
    pub fn clear(&mut self) {
        self.pool.clear();
        self.pool.recycler_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn created(&self) -> u64 {
        self.pool.new_instances()
    }

    pub fn discarded(&self) -> u64 {
        self.pool.discarded()
    }

    pub fn objects_in_memory(&self) -> u64 {
        self.pool.objects_in_memory()
    }

    pub fn recycler(&self) -> &EntityRecycler {
        self.pool.recycler()
    }
}
