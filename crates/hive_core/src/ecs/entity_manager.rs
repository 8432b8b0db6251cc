//! Alive-entity set, dirty tracking and id recycling.

use std::mem;

use tracing::trace;

use crate::ecs::containers::{ContainerError, Resizable, SparseArray};
use crate::ecs::entity::{Entity, EntityPool, EntityRecord};
use crate::ecs::{EcsError, EcsResult};

/// Running totals kept by the [`EntityManager`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EntityCounters {
    pub created: u64,
    pub deleted: u64,
}

#[derive(Debug)]
pub struct EntityManager {
    alive: SparseArray<EntityRecord>,
    dirty: Vec<Entity>,
    pool: EntityPool,
    counters: EntityCounters,
}

impl EntityManager {
    pub fn new(initial_capacity: usize, max_pool_size: usize, prefill: bool) -> Self {
        let mut pool = EntityPool::new(initial_capacity, max_pool_size);
        if prefill {
            pool.fill(initial_capacity / 2);
        }
        Self {
            alive: SparseArray::new(initial_capacity),
            dirty: Vec::with_capacity(initial_capacity),
            pool,
            counters: EntityCounters::default(),
        }
    }

    /// Bring a new or recycled entity to life.
    pub fn create(&mut self) -> EcsResult<Entity> {
        if self.pool.is_exhausted() {
            return Err(EcsError::CapacityExceeded {
                resource: "entity id",
                limit: u32::MAX as usize,
            });
        }
        let record = self.pool.obtain();
        let entity = record.entity();
        if self.alive.set(entity.index(), record).is_some() {
            return Err(ContainerError::KeyStateConflict {
                key: entity.index(),
                detail: "entity id handed out while still alive",
            }
            .into());
        }
        self.counters.created += 1;
        trace!(%entity, "entity created");
        Ok(entity)
    }

    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.contains(entity.index())
    }

    #[inline]
    pub fn get(&self, entity: Entity) -> Option<&EntityRecord> {
        self.alive.get(entity.index())
    }

    pub fn record(&self, entity: Entity) -> EcsResult<&EntityRecord> {
        self.alive
            .get(entity.index())
            .ok_or(EcsError::EntityNotAlive { id: entity.id() })
    }

    pub fn record_mut(&mut self, entity: Entity) -> EcsResult<&mut EntityRecord> {
        self.alive
            .get_mut(entity.index())
            .ok_or(EcsError::EntityNotAlive { id: entity.id() })
    }

    /// Queue `entity` for revalidation unless it is already queued.
    pub fn mark_dirty(&mut self, entity: Entity) -> EcsResult<()> {
        let record = self
            .alive
            .get_mut(entity.index())
            .ok_or(EcsError::EntityNotAlive { id: entity.id() })?;
        if !record.is_dirty() {
            record.mark_dirty();
            self.dirty.push(entity);
        }
        Ok(())
    }

    /// Take the dirty list, leaving an empty one in its place.
    pub(crate) fn take_dirty(&mut self) -> Vec<Entity> {
        mem::take(&mut self.dirty)
    }

    /// Hand back a drained dirty buffer so its allocation is reused.
    pub(crate) fn restore_dirty_buffer(&mut self, mut buffer: Vec<Entity>) {
        buffer.clear();
        if self.dirty.is_empty() {
            self.dirty = buffer;
        }
    }

    #[inline]
    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Remove `entity` from the alive set and give its record to the pool.
    pub(crate) fn delete(&mut self, entity: Entity) -> EcsResult<()> {
        let record = self
            .alive
            .remove(entity.index())
            .ok_or(EcsError::EntityNotAlive { id: entity.id() })?;
        self.pool.free(record);
        self.counters.deleted += 1;
        trace!(%entity, "entity deleted");
        Ok(())
    }

    /// Entities currently alive.
    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.alive.iter().map(|(_, record)| record)
    }

    pub fn entities(&self) -> Vec<Entity> {
        self.iter().map(EntityRecord::entity).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.alive.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    pub fn counters(&self) -> EntityCounters {
        self.counters
    }

    pub fn pool(&self) -> &EntityPool {
        &self.pool
    }

    pub fn load_factor(&self) -> f32 {
        self.alive.load_factor()
    }

    /// Drop pooled records and shrink the alive set. Requires no live entity.
    pub(crate) fn clear(&mut self) {
        self.pool.clear();
        self.alive.clear();
        self.alive.fit(false);
        self.dirty.clear();
    }
}
