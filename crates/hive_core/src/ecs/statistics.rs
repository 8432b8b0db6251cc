//! Point-in-time runtime counters.
//!
//! [`RuntimeStatistics`] is a plain snapshot. [`StatisticsHandle`] shares the
//! latest snapshot with other threads; the owning ECS republishes it on every
//! `update`, readers only ever clone it.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::ecs::pool::PoolStats;
use crate::ecs::world::Ecs;

/// Figures of one component type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeStatistics {
    pub name: &'static str,
    pub id: u8,
    pub attached: usize,
    pub container_capacity: usize,
    pub container_load_factor: f32,
    pub pool: Option<PoolStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuntimeStatistics {
    pub updates: u64,
    pub simulated_secs: f64,

    pub entities_active: usize,
    pub entities_dirty: usize,
    pub entities_created: u64,
    pub entities_deleted: u64,
    pub entities_pooled: usize,
    /// Entity records created and not discarded.
    pub entities_in_memory: u64,

    pub components_active: u64,
    pub components_added: u64,
    pub components_removed: u64,
    pub components_lost: u64,
    pub components_pooled: usize,
    pub components_obtained: u64,
    pub components_discarded: u64,
    pub components_in_memory: u64,

    pub pool_count: usize,
    pub pool_load_factor: f32,
    pub container_load_factor: f32,
    pub container_refits: u64,
    pub pool_refits: u64,

    pub systems: usize,
    pub system_load_factor: f32,

    pub types: Vec<TypeStatistics>,
}

impl RuntimeStatistics {
    pub(crate) fn collect(ecs: &Ecs) -> Self {
        let entities = ecs.entity_manager();
        let components = ecs.components();
        let counters = components.counters();
        let pools = components.pools();
        let totals = pools.totals();

        let types = components
            .container_rows()
            .map(|(ty, attached, capacity, load_factor)| TypeStatistics {
                name: ty.name(),
                id: ty.id(),
                attached,
                container_capacity: capacity,
                container_load_factor: load_factor,
                pool: pools.stats(ty),
            })
            .collect();

        Self {
            updates: ecs.update_count(),
            simulated_secs: components.control().timer().total_time().as_secs_f64(),

            entities_active: entities.len(),
            entities_dirty: entities.dirty_count(),
            entities_created: entities.counters().created,
            entities_deleted: entities.counters().deleted,
            entities_pooled: entities.pool().len(),
            entities_in_memory: entities.pool().objects_in_memory(),

            components_active: counters.active,
            components_added: counters.added,
            components_removed: counters.removed,
            components_lost: counters.lost,
            components_pooled: totals.pooled,
            components_obtained: totals.obtained,
            components_discarded: totals.discarded,
            components_in_memory: totals.in_memory,

            pool_count: pools.count(),
            pool_load_factor: totals.load_factor,
            container_load_factor: components.container_load_factor(),
            container_refits: counters.container_refits,
            pool_refits: counters.pool_refits,

            systems: ecs.systems().len(),
            system_load_factor: ecs.systems().load_factor(),

            types,
        }
    }
}

/// Shared, read-mostly view of the latest [`RuntimeStatistics`].
#[derive(Debug, Clone, Default)]
pub struct StatisticsHandle {
    latest: Arc<RwLock<RuntimeStatistics>>,
}

impl StatisticsHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the latest published snapshot.
    pub fn snapshot(&self) -> RuntimeStatistics {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn publish(&self, statistics: RuntimeStatistics) {
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = statistics;
    }
}
