//! Per-type recycling of component instances.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::ecs::component::{AsAny, Component};
use crate::ecs::containers::{Pool, PoolOutcome, Recycle};
use crate::ecs::types::{ComponentType, MAX_TYPES};
use crate::ecs::{EcsError, EcsResult};

type Factory<T> = Box<dyn FnMut() -> T>;
type Reset<T> = Box<dyn FnMut(&mut T)>;

/// Builds and resets instances on behalf of a [`ComponentPool`].
pub struct ComponentRecycler<T> {
    factory: Factory<T>,
    reset: Option<Reset<T>>,
}

impl<T> Recycle<T> for ComponentRecycler<T> {
    fn create(&mut self) -> T {
        (self.factory)()
    }

    fn reset(&mut self, item: &mut T) {
        if let Some(reset) = self.reset.as_mut() {
            reset(item);
        }
    }
}

/// Bounded free-list for one component type.
pub struct ComponentPool<T: Component> {
    pool: Pool<T, ComponentRecycler<T>>,
    ty: Option<ComponentType>,
}

impl<T: Component> ComponentPool<T> {
    pub fn new(initial_capacity: usize, max_size: usize, factory: impl FnMut() -> T + 'static) -> Self {
        let recycler = ComponentRecycler {
            factory: Box::new(factory),
            reset: None,
        };
        Self {
            pool: Pool::new(initial_capacity, max_size, recycler),
            ty: None,
        }
    }

    /// Run `reset` on every instance handed back to the pool.
    pub fn with_reset(mut self, reset: impl FnMut(&mut T) + 'static) -> Self {
        self.pool.recycler_mut().reset = Some(Box::new(reset));
        self
    }

    /// Pre-create up to `count` instances.
    pub fn with_fill(mut self, count: usize) -> Self {
        self.pool.fill(count);
        self
    }

    pub fn obtain(&mut self) -> T {
        self.pool.obtain()
    }

    pub fn free(&mut self, component: T) -> PoolOutcome {
        self.pool.free(component)
    }

    /// The type this pool was registered for.
    pub fn component_type(&self) -> Option<ComponentType> {
        self.ty
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub(crate) fn bind(&mut self, ty: ComponentType) {
        self.ty = Some(ty);
    }
}

impl<T: Component + Default> ComponentPool<T> {
    /// Pool creating instances with `T::default()`.
    pub fn with_default(initial_capacity: usize, max_size: usize) -> Self {
        Self::new(initial_capacity, max_size, T::default)
    }
}

impl<T: Component> fmt::Debug for ComponentPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentPool")
            .field("component", &T::NAME)
            .field("len", &self.pool.len())
            .field("max_size", &self.pool.max_size())
            .finish()
    }
}

/// Counters of one pool.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct PoolStats {
    pub pooled: usize,
    pub capacity: usize,
    pub peak: usize,
    pub created: u64,
    pub obtained: u64,
    pub recycled: u64,
    pub discarded: u64,
    pub in_memory: u64,
    pub load_factor: f32,
}

/// Type-erased access to a [`ComponentPool`].
pub(crate) trait ErasedPool: AsAny {
    fn stats(&self) -> PoolStats;
    fn fit(&mut self, absolute: bool) -> bool;
    fn clear(&mut self);
}

impl<T: Component> ErasedPool for ComponentPool<T> {
    fn stats(&self) -> PoolStats {
        let pool = &self.pool;
        PoolStats {
            pooled: pool.len(),
            capacity: pool.capacity(),
            peak: pool.peak(),
            created: pool.new_instances(),
            obtained: pool.obtained(),
            recycled: pool.recycled(),
            discarded: pool.discarded(),
            in_memory: pool.objects_in_memory(),
            load_factor: pool.load_factor(),
        }
    }

    fn fit(&mut self, absolute: bool) -> bool {
        self.pool.fit(absolute)
    }

    fn clear(&mut self) {
        self.pool.clear();
    }
}

/// One optional pool per component type.
#[derive(Default)]
pub struct ComponentPools {
    pools: Vec<Option<Box<dyn ErasedPool>>>,
    registered: Vec<ComponentType>,
    flags: u64,
}

impl ComponentPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `pool` as the pool of `ty`. A type has at most one pool.
    pub fn register<T: Component>(
        &mut self,
        ty: ComponentType,
        mut pool: ComponentPool<T>,
    ) -> EcsResult<()> {
        if self.has_pool(ty) {
            return Err(EcsError::DuplicatePoolRegistration {
                type_name: ty.name(),
            });
        }
        if self.pools.len() < MAX_TYPES {
            self.pools.resize_with(MAX_TYPES, || None);
        }
        pool.bind(ty);
        self.pools[ty.index()] = Some(Box::new(pool));
        self.registered.push(ty);
        self.flags |= ty.flag();
        debug!(component = ty.name(), "component pool registered");
        Ok(())
    }

    #[inline]
    pub fn has_pool(&self, ty: ComponentType) -> bool {
        self.flags & ty.flag() == ty.flag()
    }

    /// Hand `component` to the pool of `ty`.
    ///
    /// Returns `false` when no pool is registered and the instance is lost.
    pub fn try_free<T: Component>(&mut self, ty: ComponentType, component: T) -> bool {
        match self.get_mut::<T>(ty) {
            Some(pool) => {
                pool.free(component);
                true
            }
            None => false,
        }
    }

    /// Draw an instance from the pool of `ty`, if one is registered.
    pub fn obtain<T: Component>(&mut self, ty: ComponentType) -> Option<T> {
        self.get_mut::<T>(ty).map(ComponentPool::obtain)
    }

    pub fn get<T: Component>(&self, ty: ComponentType) -> Option<&ComponentPool<T>> {
        self.pools
            .get(ty.index())?
            .as_deref()?
            .as_any()
            .downcast_ref::<ComponentPool<T>>()
    }

    pub fn get_mut<T: Component>(&mut self, ty: ComponentType) -> Option<&mut ComponentPool<T>> {
        self.pools
            .get_mut(ty.index())?
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<ComponentPool<T>>()
    }

    pub fn stats(&self, ty: ComponentType) -> Option<PoolStats> {
        self.erased(ty).map(|pool| pool.stats())
    }

    /// Shrink the pool of `ty` towards its fill.
    pub fn refit(&mut self, ty: ComponentType) -> bool {
        match self.pools.get_mut(ty.index()) {
            Some(Some(pool)) => pool.fit(false),
            _ => false,
        }
    }

    /// Sum of every pool's counters. The load factor is pooled over capacity
    /// across all pools, or 1.0 when none is registered.
    pub fn totals(&self) -> PoolStats {
        let mut totals = PoolStats::default();
        for ty in &self.registered {
            if let Some(stats) = self.stats(*ty) {
                totals.pooled += stats.pooled;
                totals.capacity += stats.capacity;
                totals.peak += stats.peak;
                totals.created += stats.created;
                totals.obtained += stats.obtained;
                totals.recycled += stats.recycled;
                totals.discarded += stats.discarded;
                totals.in_memory += stats.in_memory;
            }
        }
        totals.load_factor = if totals.capacity == 0 {
            1.0
        } else {
            totals.pooled as f32 / totals.capacity as f32
        };
        totals
    }

    /// Discard every pooled instance, keeping the pools registered.
    pub fn clear_items(&mut self) {
        for pool in self.pools.iter_mut().flatten() {
            pool.clear();
        }
    }

    /// Drop every pool.
    pub fn release(&mut self) {
        self.pools.clear();
        self.registered.clear();
        self.flags = 0;
    }

    pub fn count(&self) -> usize {
        self.registered.len()
    }

    pub fn registered(&self) -> &[ComponentType] {
        &self.registered
    }

    fn erased(&self, ty: ComponentType) -> Option<&dyn ErasedPool> {
        self.pools.get(ty.index())?.as_deref()
    }
}

impl fmt::Debug for ComponentPools {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentPools")
            .field("registered", &self.registered)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_component;
    use crate::ecs::types::TypeManager;

    #[derive(Debug, Default, PartialEq)]
    struct Health(u32);
    define_component!(Health);

    #[derive(Debug, PartialEq)]
    struct Tag;
    define_component!(Tag);

    #[test]
    fn second_registration_is_rejected() {
        let mut types = TypeManager::new();
        let ty = types.get_type::<Health>().unwrap();
        let mut pools = ComponentPools::new();
        pools.register(ty, ComponentPool::<Health>::with_default(4, 8)).unwrap();
        assert_eq!(
            pools.register(ty, ComponentPool::<Health>::with_default(4, 8)),
            Err(EcsError::DuplicatePoolRegistration { type_name: "Health" })
        );
        assert_eq!(pools.count(), 1);
    }

    #[test]
    fn try_free_reports_lost_without_pool() {
        let mut types = TypeManager::new();
        let health = types.get_type::<Health>().unwrap();
        let tag = types.get_type::<Tag>().unwrap();
        let mut pools = ComponentPools::new();
        pools
            .register(health, ComponentPool::<Health>::with_default(4, 8).with_reset(|h| h.0 = 0))
            .unwrap();

        assert!(pools.try_free(health, Health(42)));
        assert!(!pools.try_free(tag, Tag));
        assert_eq!(pools.obtain::<Health>(health), Some(Health(0)));
        assert_eq!(pools.obtain::<Tag>(tag), None);
    }

    #[test]
    fn round_trip_returns_same_instance() {
        let mut pool = ComponentPool::new(2, 2, || Health(1));
        let mut first = pool.obtain();
        first.0 = 7;
        assert_eq!(pool.free(first), PoolOutcome::Recycled);
        assert_eq!(pool.obtain(), Health(7));
    }

    #[test]
    fn totals_default_to_full_load_without_pools() {
        let pools = ComponentPools::new();
        assert_eq!(pools.totals().load_factor, 1.0);

        let mut types = TypeManager::new();
        let ty = types.get_type::<Health>().unwrap();
        let mut pools = ComponentPools::new();
        pools
            .register(ty, ComponentPool::<Health>::with_default(4, 8).with_fill(2))
            .unwrap();
        let totals = pools.totals();
        assert_eq!(totals.pooled, 2);
        assert_eq!(totals.created, 2);
        assert_eq!(totals.load_factor, 0.5);
    }
}
