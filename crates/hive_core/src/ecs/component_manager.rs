//! Sparse per-type component storage.
//!
//! The manager owns one [`SparseArray`] per registered component type,
//! indexed by entity id. An entity's component mask is kept equal to the set
//! of types whose container holds a value at that id. Detached components
//! are handed to the type's pool when one is registered, otherwise they are
//! dropped and counted as lost.

use tracing::{debug, warn};

use crate::ecs::capacity::{CapacityControl, RefitSchedule};
use crate::ecs::component::{Component, ComponentStorage, Detached};
use crate::ecs::containers::{ContainerError, SparseArray};
use crate::ecs::entity::{Entity, EntityRecord};
use crate::ecs::pool::{ComponentPool, ComponentPools};
use crate::ecs::types::{ComponentType, TypeManager, MAX_TYPES};
use crate::ecs::EcsResult;
use crate::time::IntervalTimer;

/// Running totals kept by the [`ComponentManager`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ComponentCounters {
    /// Components currently attached.
    pub active: u64,
    pub added: u64,
    pub removed: u64,
    /// Detached components that had no pool to return to.
    pub lost: u64,
    pub container_refits: u64,
    pub pool_refits: u64,
}

pub struct ComponentManager {
    types: TypeManager,
    storages: Vec<Option<Box<dyn ComponentStorage>>>,
    pools: ComponentPools,
    control: CapacityControl,
    target_capacity: usize,
    counters: ComponentCounters,
    lost_warned: u64,
}

impl ComponentManager {
    pub fn new(target_capacity: usize, timer: IntervalTimer) -> Self {
        let mut storages = Vec::with_capacity(MAX_TYPES);
        storages.resize_with(MAX_TYPES, || None);
        Self {
            types: TypeManager::new(),
            storages,
            pools: ComponentPools::new(),
            control: CapacityControl::new(timer),
            target_capacity: target_capacity.max(1),
            counters: ComponentCounters::default(),
            lost_warned: 0,
        }
    }

    pub fn types(&self) -> &TypeManager {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut TypeManager {
        &mut self.types
    }

    pub fn pools(&self) -> &ComponentPools {
        &self.pools
    }

    pub fn control(&self) -> &CapacityControl {
        &self.control
    }

    pub fn counters(&self) -> ComponentCounters {
        self.counters
    }

    /// Resolve the type of `T`, creating its container on first sight.
    pub fn get_type<T: Component>(&mut self) -> EcsResult<ComponentType> {
        let ty = self.types.get_type::<T>()?;
        let slot = &mut self.storages[ty.index()];
        if slot.is_none() {
            *slot = Some(Box::new(SparseArray::<T>::new(self.target_capacity)));
            self.control.register(ty.id());
        }
        Ok(ty)
    }

    /// Attach `component` to the entity of `record`.
    ///
    /// Returns `true` when the component mask changed. Replacing a component
    /// of the same type keeps the mask and returns `false`; the superseded
    /// instance is pooled or counted as lost.
    pub fn add_component<T: Component>(
        &mut self,
        record: &mut EntityRecord,
        component: T,
    ) -> EcsResult<bool> {
        let ty = self.get_type::<T>()?;
        let index = record.entity().index();
        let storage = storage_mut::<T>(&mut self.storages, ty)
            .ok_or(ContainerError::ItemNotFound { key: ty.index() })?;

        self.control.reset_container(ty.id());
        match storage.set(index, component) {
            Some(previous) => {
                let outcome = if self.pools.try_free(ty, previous) {
                    Detached::Recycled
                } else {
                    Detached::Lost
                };
                self.account_detached(ty, outcome);
                Ok(false)
            }
            None => {
                record.add_component_bit(ty.flag());
                self.counters.active += 1;
                self.counters.added += 1;
                Ok(true)
            }
        }
    }

    /// Detach the `T` component of `record`, if any.
    pub fn remove_component<T: Component>(&mut self, record: &mut EntityRecord) -> EcsResult<bool> {
        match self.types.type_of::<T>() {
            Some(ty) => self.remove_component_type(record, ty),
            None => Ok(false),
        }
    }

    /// Detach the component of type `ty` from `record`, if any.
    pub fn remove_component_type(
        &mut self,
        record: &mut EntityRecord,
        ty: ComponentType,
    ) -> EcsResult<bool> {
        if !record.has_component(ty.flag()) {
            return Ok(false);
        }
        self.detach(record.entity(), ty)?;
        record.remove_component_bit(ty.flag());
        Ok(true)
    }

    /// Detach every component of `record` and clear its mask.
    pub fn remove_all(&mut self, record: &mut EntityRecord) -> EcsResult<()> {
        let mut mask = record.components();
        while mask != 0 {
            let id = mask.trailing_zeros() as u8;
            mask &= mask - 1;
            if let Some(ty) = self.types.type_by_id(id) {
                self.detach(record.entity(), ty)?;
            }
        }
        record.clear_components();
        Ok(())
    }

    /// Bounds-checked lookup.
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let ty = self.types.type_of::<T>()?;
        self.get_in(ty, entity)
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let ty = self.types.type_of::<T>()?;
        self.get_in_mut(ty, entity)
    }

    /// Lookup through an already resolved type.
    #[inline]
    pub fn get_in<T: Component>(&self, ty: ComponentType, entity: Entity) -> Option<&T> {
        storage::<T>(&self.storages, ty)?.get(entity.index())
    }

    #[inline]
    pub fn get_in_mut<T: Component>(&mut self, ty: ComponentType, entity: Entity) -> Option<&mut T> {
        storage_mut::<T>(&mut self.storages, ty)?.get_mut(entity.index())
    }

    /// Lookup without the used-space check, for callers that know from the
    /// entity's mask that the component exists.
    ///
    /// # Panics
    /// Panics if the entity id lies beyond the container's capacity.
    #[inline]
    pub fn get_unchecked<T: Component>(&self, ty: ComponentType, entity: Entity) -> Option<&T> {
        storage::<T>(&self.storages, ty)?.get_unchecked(entity.index())
    }

    #[inline]
    pub fn get_unchecked_mut<T: Component>(
        &mut self,
        ty: ComponentType,
        entity: Entity,
    ) -> Option<&mut T> {
        storage_mut::<T>(&mut self.storages, ty)?.get_unchecked_mut(entity.index())
    }

    /// The container of `T`.
    pub fn storage<T: Component>(&self) -> Option<&SparseArray<T>> {
        let ty = self.types.type_of::<T>()?;
        storage::<T>(&self.storages, ty)
    }

    /// Register the pool of `T`.
    pub fn register_pool<T: Component>(&mut self, pool: ComponentPool<T>) -> EcsResult<()> {
        let ty = self.get_type::<T>()?;
        self.pools.register(ty, pool)
    }

    /// Draw a `T` from its pool. `None` when no pool is registered.
    pub fn obtain<T: Component>(&mut self) -> Option<T> {
        let ty = self.types.type_of::<T>()?;
        let component = self.pools.obtain::<T>(ty)?;
        self.control.reset_pool(ty.id());
        Some(component)
    }

    /// Advance the decay counters and refit whatever fell idle.
    pub fn update(&mut self, dt: f32) -> RefitSchedule {
        let schedule = self.control.update(dt);
        if schedule.is_empty() {
            return schedule;
        }
        for id in schedule.container_ids() {
            if let Some(Some(storage)) = self.storages.get_mut(usize::from(id)) {
                if storage.refit() {
                    self.counters.container_refits += 1;
                    debug!(
                        type_id = id,
                        capacity = storage.capacity(),
                        "idle component container refitted"
                    );
                }
            }
        }
        for id in schedule.pool_ids() {
            if let Some(ty) = self.types.type_by_id(id) {
                if self.pools.refit(ty) {
                    self.counters.pool_refits += 1;
                    debug!(component = ty.name(), "idle component pool refitted");
                }
            }
        }
        schedule
    }

    /// Per-type container figures: `(type, attached, capacity, load factor)`.
    pub fn container_rows(&self) -> impl Iterator<Item = (ComponentType, usize, usize, f32)> + '_ {
        self.types.types().iter().filter_map(move |ty| {
            let storage = self.storages.get(ty.index())?.as_deref()?;
            Some((*ty, storage.len(), storage.capacity(), storage.load_factor()))
        })
    }

    /// Attached components over allocated slots, across every container.
    pub fn container_load_factor(&self) -> f32 {
        let (len, capacity) = self
            .storages
            .iter()
            .flatten()
            .fold((0, 0), |(len, capacity), storage| {
                (len + storage.len(), capacity + storage.capacity())
            });
        if capacity == 0 {
            1.0
        } else {
            len as f32 / capacity as f32
        }
    }

    /// Stop accepting new component types and groups.
    pub fn seal(&mut self, phase: crate::ecs::Phase) {
        self.types.seal(phase);
    }

    /// Empty every container and pool. Entities must already be detached.
    pub fn clear(&mut self) {
        for storage in self.storages.iter_mut().flatten() {
            storage.clear();
            storage.refit();
        }
        self.pools.clear_items();
        self.control.clear();
    }

    /// Drop every container and pool.
    pub fn release(&mut self) {
        for slot in &mut self.storages {
            *slot = None;
        }
        self.pools.release();
    }

    fn detach(&mut self, entity: Entity, ty: ComponentType) -> EcsResult<()> {
        let storage = self.storages[ty.index()]
            .as_deref_mut()
            .ok_or(ContainerError::ItemNotFound { key: ty.index() })?;
        let outcome = storage
            .detach(entity.index(), ty, &mut self.pools)
            .ok_or(ContainerError::ItemNotFound {
                key: entity.index(),
            })?;
        self.control.reset_container(ty.id());
        self.counters.active -= 1;
        self.counters.removed += 1;
        self.account_detached(ty, outcome);
        Ok(())
    }

    fn account_detached(&mut self, ty: ComponentType, outcome: Detached) {
        match outcome {
            Detached::Recycled => self.control.reset_pool(ty.id()),
            Detached::Lost => {
                self.counters.lost += 1;
                if self.lost_warned & ty.flag() == 0 {
                    self.lost_warned |= ty.flag();
                    warn!(
                        component = ty.name(),
                        "component detached without a registered pool; instances of this type are dropped"
                    );
                }
            }
        }
    }
}

fn storage<T: Component>(
    storages: &[Option<Box<dyn ComponentStorage>>],
    ty: ComponentType,
) -> Option<&SparseArray<T>> {
    storages
        .get(ty.index())?
        .as_deref()?
        .as_any()
        .downcast_ref::<SparseArray<T>>()
}

fn storage_mut<T: Component>(
    storages: &mut [Option<Box<dyn ComponentStorage>>],
    ty: ComponentType,
) -> Option<&mut SparseArray<T>> {
    storages
        .get_mut(ty.index())?
        .as_deref_mut()?
        .as_any_mut()
        .downcast_mut::<SparseArray<T>>()
}
