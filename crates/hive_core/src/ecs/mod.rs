//! Entity Component System runtime.
//!
//! Entities are bare integer ids carrying a component mask and a system
//! mask. Components live in one sparse container per type, indexed by
//! entity id. Systems keep their own membership sets, reconciled in batches
//! by [`Ecs::clean`] and iterated by [`Ecs::process`]. Entity ids and
//! component instances are pooled, and idle containers shrink back to their
//! resting capacity through decay counters driven by [`Ecs::update`].
//!
//! Lifecycle: construct, register systems and pools, [`Ecs::initialize`],
//! then `update`/`process` per tick, and finally [`Ecs::terminate`].

mod capacity;
mod component;
mod component_manager;
mod config;
pub mod containers;
mod entity;
mod entity_manager;
mod error;
mod getter;
mod macros;
mod pool;
mod statistics;
mod system;
mod system_manager;
mod types;
mod world;

#[cfg(test)]
mod tests;

pub use capacity::{CapacityControl, RefitSchedule, DECAY_LIMIT};
pub use component::{AsAny, Component, ComponentBundle, ComponentSet, Detached};
pub use component_manager::{ComponentCounters, ComponentManager};
pub use config::EcsConfig;
pub use entity::{Entity, EntityPool, EntityRecord, EntityRecycler};
pub use entity_manager::{EntityCounters, EntityManager};
pub use error::{EcsError, EcsResult};
pub use getter::Getter;
pub use pool::{ComponentPool, ComponentPools, ComponentRecycler, PoolStats};
pub use statistics::{RuntimeStatistics, StatisticsHandle, TypeStatistics};
pub use system::{membership_change, Membership, System, SystemHandle};
pub use system_manager::{SystemManager, MAX_SYSTEMS};
pub use types::{ComponentGroup, ComponentType, TypeManager, MAX_GROUPS, MAX_TYPES};
pub use world::{Ecs, Phase};
