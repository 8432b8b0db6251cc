//! The ECS instance: lifecycle, entity surface and system processing.
//!
//! Structural requests (creating or removing entities, attaching or
//! detaching components, enabling or disabling) take effect on storage
//! immediately but only change system membership at the next
//! [`Ecs::clean`], which reconciles every dirty entity against every system
//! in one batch. Every processing pass starts with a clean.

use std::fmt;

use hive_metrics::SystemProfiler;
use tracing::{debug, trace};

use crate::ecs::component::{Component, ComponentBundle, ComponentSet};
use crate::ecs::component_manager::ComponentManager;
use crate::ecs::containers::ContainerError;
use crate::ecs::entity::Entity;
use crate::ecs::entity_manager::EntityManager;
use crate::ecs::getter::Getter;
use crate::ecs::pool::ComponentPool;
use crate::ecs::statistics::{RuntimeStatistics, StatisticsHandle};
use crate::ecs::system::{membership_change, Membership, System, SystemHandle};
use crate::ecs::system_manager::SystemManager;
use crate::ecs::types::{ComponentGroup, ComponentType, TypeManager};
use crate::ecs::{EcsConfig, EcsError, EcsResult};
use crate::time::IntervalTimer;

/// Lifecycle phase of an [`Ecs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Systems, pools and types may still be registered.
    Constructed,
    /// Registration is closed; the ECS is running.
    Initialized,
    /// Torn down; every operation is rejected.
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Constructed => "constructed",
            Phase::Initialized => "initialized",
            Phase::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

pub struct Ecs {
    config: EcsConfig,
    phase: Phase,
    entities: EntityManager,
    components: ComponentManager,
    systems: SystemManager,
    statistics: StatisticsHandle,
    updates: u64,
    profiler: SystemProfiler,
}

impl Ecs {
    /// Create an ECS with the given resting capacity and entity pool bound.
    pub fn new(initial_capacity: usize, max_pool_size: usize) -> Self {
        Self::with_config(EcsConfig::new(initial_capacity, max_pool_size))
    }

    pub fn with_config(config: EcsConfig) -> Self {
        let capacity = config.initial_capacity.max(1);
        let timer = IntervalTimer::from_secs_f32(config.decay_interval_secs);
        Self {
            entities: EntityManager::new(capacity, config.max_pool_size, config.prefill_entity_pool),
            components: ComponentManager::new(capacity, timer),
            systems: SystemManager::new(config.system_capacity),
            statistics: StatisticsHandle::new(),
            updates: 0,
            profiler: SystemProfiler::new(60),
            phase: Phase::Constructed,
            config,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_initialized(&self) -> bool {
        self.phase == Phase::Initialized
    }

    pub fn config(&self) -> &EcsConfig {
        &self.config
    }

    /// Register `system` over `group`. Only before [`Ecs::initialize`].
    pub fn register_system<S: System>(&mut self, system: S, group: ComponentGroup) -> EcsResult<SystemHandle> {
        self.ensure_phase(Phase::Constructed, "register system")?;
        self.systems.register(system, group)
    }

    /// Register `system` over the group of the component tuple `C`.
    pub fn register_system_with<C: ComponentSet, S: System>(&mut self, system: S) -> EcsResult<SystemHandle> {
        self.ensure_phase(Phase::Constructed, "register system")?;
        let group = self.components.types_mut().group_of::<C>()?;
        self.systems.register(system, group)
    }

    /// Register the pool of `T`. Only before [`Ecs::initialize`].
    pub fn register_component_pool<T: Component>(&mut self, pool: ComponentPool<T>) -> EcsResult<()> {
        self.ensure_phase(Phase::Constructed, "register component pool")?;
        self.components.register_pool(pool)
    }

    /// Close registration and run every system's `initialize` hook.
    ///
    /// Calling it again once initialized does nothing.
    pub fn initialize(&mut self) -> EcsResult<()> {
        match self.phase {
            Phase::Initialized => return Ok(()),
            Phase::Terminated => {
                return Err(EcsError::IllegalLifecycleState {
                    operation: "initialize",
                    phase: self.phase,
                })
            }
            Phase::Constructed => {}
        }
        self.phase = Phase::Initialized;
        self.components.seal(Phase::Initialized);
        let handles: Vec<SystemHandle> = self.systems.handles().collect();
        for handle in handles {
            self.run_hook(handle, |system, ecs| system.initialize(ecs))?;
        }
        debug!(
            systems = self.systems.len(),
            component_types = self.components.types().len(),
            "ecs initialized"
        );
        self.publish_statistics();
        Ok(())
    }

    /// Advance simulated time by `dt` seconds: decays idle capacity and
    /// republishes statistics.
    pub fn update(&mut self, dt: f32) -> EcsResult<()> {
        self.ensure_not_terminated("update")?;
        let schedule = self.components.update(dt);
        if !schedule.is_empty() {
            trace!(
                containers = schedule.containers,
                pools = schedule.pools,
                "capacity decay step"
            );
        }
        self.updates += 1;
        self.publish_statistics();
        Ok(())
    }

    /// Tear everything down: detach every component, empty every system,
    /// drain the entity pool, clear containers and pools, run every
    /// system's `terminate` hook and release all systems.
    ///
    /// Must not be called from inside a system hook.
    pub fn terminate(&mut self) -> EcsResult<()> {
        self.ensure_not_terminated("terminate")?;
        if self.systems.handles().any(|handle| self.is_running(handle)) {
            return Err(EcsError::IllegalLifecycleState {
                operation: "terminate from inside a system",
                phase: self.phase,
            });
        }
        self.systems.deactivate_all();

        for entity in self.entities.entities() {
            self.remove(entity)?;
        }
        self.clean()?;
        if !self.entities.is_empty() || self.entities.has_dirty() {
            return Err(ContainerError::KeyStateConflict {
                key: self.entities.len(),
                detail: "entities survived teardown",
            }
            .into());
        }

        self.entities.clear();
        self.components.clear();

        let handles: Vec<SystemHandle> = self.systems.handles().collect();
        for handle in handles {
            self.run_hook(handle, |system, ecs| system.terminate(ecs))?;
        }
        self.publish_statistics();
        self.systems.release();
        self.components.release();
        self.phase = Phase::Terminated;
        debug!("ecs terminated");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Types and groups
    // ------------------------------------------------------------------

    /// Resolve the type of `T`, registering it while registration is open.
    pub fn get_type<T: Component>(&mut self) -> EcsResult<ComponentType> {
        self.components.get_type::<T>()
    }

    /// Resolve the group holding exactly `types`.
    pub fn get_group(&mut self, types: &[ComponentType]) -> EcsResult<ComponentGroup> {
        self.components.types_mut().get_group(types)
    }

    /// Resolve the group of the component tuple `C`.
    pub fn group_of<C: ComponentSet>(&mut self) -> EcsResult<ComponentGroup> {
        self.components.types_mut().group_of::<C>()
    }

    /// Accessor bound to the type of `T`.
    pub fn getter<T: Component>(&mut self) -> EcsResult<Getter<T>> {
        Ok(Getter::new(self.get_type::<T>()?))
    }

    pub fn types(&self) -> &TypeManager {
        self.components.types()
    }

    // ------------------------------------------------------------------
    // Entities and components
    // ------------------------------------------------------------------

    pub fn create(&mut self) -> EcsResult<Entity> {
        self.ensure_not_terminated("create entity")?;
        self.entities.create()
    }

    /// Detach every component of `entity` and mark it for deletion at the
    /// next clean.
    pub fn remove(&mut self, entity: Entity) -> EcsResult<()> {
        let record = self.entities.record_mut(entity)?;
        if record.has_any_component() {
            self.components.remove_all(record)?;
        }
        self.entities.mark_dirty(entity)
    }

    /// Attach `component`. Returns `true` when the entity's component mask
    /// changed; replacing a component of the same type returns `false` and
    /// leaves the entity clean.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> EcsResult<bool> {
        let record = self.entities.record_mut(entity)?;
        let changed = self.components.add_component(record, component)?;
        if changed {
            self.entities.mark_dirty(entity)?;
        }
        Ok(changed)
    }

    /// Attach every component of a tuple.
    ///
    /// Every type of the bundle is resolved before anything is attached, so
    /// an unknown type leaves the entity untouched. A later failure still
    /// marks the entity dirty if the earlier elements changed its mask.
    pub fn add_components<B: ComponentBundle>(&mut self, entity: Entity, bundle: B) -> EcsResult<bool> {
        let record = self.entities.record_mut(entity)?;
        B::mask(self.components.types_mut())?;
        let before = record.components();
        let attached = bundle.attach(&mut self.components, record);
        let changed = record.components() != before;
        if changed {
            self.entities.mark_dirty(entity)?;
        }
        attached.map(|_| changed)
    }

    /// Detach the `T` component of `entity`. Returns whether one was attached.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> EcsResult<bool> {
        let record = self.entities.record_mut(entity)?;
        let changed = self.components.remove_component::<T>(record)?;
        if changed {
            self.entities.mark_dirty(entity)?;
        }
        Ok(changed)
    }

    /// Detach the component of type `ty` from `entity`.
    pub fn remove_component_type(&mut self, entity: Entity, ty: ComponentType) -> EcsResult<bool> {
        let record = self.entities.record_mut(entity)?;
        let changed = self.components.remove_component_type(record, ty)?;
        if changed {
            self.entities.mark_dirty(entity)?;
        }
        Ok(changed)
    }

    /// Returns whether the flag changed.
    pub fn enable(&mut self, entity: Entity) -> EcsResult<bool> {
        self.set_enabled(entity, true)
    }

    /// Returns whether the flag changed.
    pub fn disable(&mut self, entity: Entity) -> EcsResult<bool> {
        self.set_enabled(entity, false)
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.components.get::<T>(entity)
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.components.get_mut::<T>(entity)
    }

    /// Draw a `T` from its registered pool.
    pub fn obtain<T: Component>(&mut self) -> EcsResult<T> {
        self.components
            .obtain::<T>()
            .ok_or(EcsError::IllegalLifecycleState {
                operation: "obtain component without a registered pool",
                phase: self.phase,
            })
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    pub fn is_enabled(&self, entity: Entity) -> bool {
        self.entities.get(entity).is_some_and(|record| record.is_enabled())
    }

    pub fn is_dirty(&self, entity: Entity) -> bool {
        self.entities.get(entity).is_some_and(|record| record.is_dirty())
    }

    pub fn component_mask(&self, entity: Entity) -> Option<u64> {
        self.entities.get(entity).map(|record| record.components())
    }

    pub fn system_mask(&self, entity: Entity) -> Option<u64> {
        self.entities.get(entity).map(|record| record.systems())
    }

    pub fn component_count(&self, entity: Entity) -> u32 {
        self.entities.get(entity).map_or(0, |record| record.component_count())
    }

    pub fn system_count(&self, entity: Entity) -> u32 {
        self.entities.get(entity).map_or(0, |record| record.system_count())
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entity_manager(&self) -> &EntityManager {
        &self.entities
    }

    pub fn components(&self) -> &ComponentManager {
        &self.components
    }

    pub(crate) fn components_mut(&mut self) -> &mut ComponentManager {
        &mut self.components
    }

    // ------------------------------------------------------------------
    // Systems
    // ------------------------------------------------------------------

    pub fn systems(&self) -> &SystemManager {
        &self.systems
    }

    /// The system of type `S`. `None` while one of its hooks is running.
    pub fn get_system<S: System>(&self) -> Option<&S> {
        self.systems.get::<S>()
    }

    pub fn get_system_mut<S: System>(&mut self) -> Option<&mut S> {
        self.systems.get_mut::<S>()
    }

    pub fn system_handle<S: System>(&self) -> Option<SystemHandle> {
        self.systems.handle_of::<S>()
    }

    pub fn members(&self, handle: SystemHandle) -> &[Entity] {
        self.systems.members(handle).unwrap_or_default()
    }

    pub fn system_group(&self, handle: SystemHandle) -> Option<ComponentGroup> {
        self.systems.group(handle)
    }

    pub fn system_bit(&self, handle: SystemHandle) -> u64 {
        handle.bit()
    }

    pub fn is_activated(&self, handle: SystemHandle) -> bool {
        self.systems.is_activated(handle)
    }

    pub fn is_processing(&self, handle: SystemHandle) -> bool {
        self.systems.is_processing(handle)
    }

    pub fn activate(&mut self, handle: SystemHandle) {
        self.systems.activate(handle);
    }

    pub fn deactivate(&mut self, handle: SystemHandle) {
        self.systems.deactivate(handle);
    }

    /// Run one pass of a system, calling `process_entity` for each member.
    ///
    /// Ignored when the system is deactivated or already running.
    pub fn process(&mut self, handle: SystemHandle) -> EcsResult<()> {
        self.run_pass(handle, &mut |system, ecs, entity| system.process_entity(ecs, entity))
    }

    /// Like [`Ecs::process`], calling `process_entity_dt`.
    pub fn process_with_delta(&mut self, handle: SystemHandle, dt: f32) -> EcsResult<()> {
        self.run_pass(handle, &mut |system, ecs, entity| system.process_entity_dt(ecs, entity, dt))
    }

    /// Like [`Ecs::process`], calling `visit` instead of a member hook.
    pub fn process_with<F>(&mut self, handle: SystemHandle, mut visit: F) -> EcsResult<()>
    where
        F: FnMut(&mut Ecs, Entity) -> EcsResult<()>,
    {
        self.run_pass(handle, &mut |_, ecs, entity| visit(ecs, entity))
    }

    /// Process every activated system once, in registration order.
    pub fn process_all(&mut self, dt: f32) -> EcsResult<()> {
        let handles: Vec<SystemHandle> = self.systems.handles().collect();
        for handle in handles {
            self.process_with_delta(handle, dt)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------

    /// Build a fresh snapshot.
    pub fn statistics(&self) -> RuntimeStatistics {
        RuntimeStatistics::collect(self)
    }

    /// Shared handle to the snapshot republished on every update.
    pub fn statistics_handle(&self) -> StatisticsHandle {
        self.statistics.clone()
    }

    pub fn update_count(&self) -> u64 {
        self.updates
    }

    pub fn profiler(&self) -> &SystemProfiler {
        &self.profiler
    }

    // ------------------------------------------------------------------
    // Reconciliation
    // ------------------------------------------------------------------

    /// Revalidate every dirty entity against every system, then delete the
    /// ones left without components.
    ///
    /// Safe to call from inside system hooks: changes aimed at a running
    /// system are staged on that system.
    pub fn clean(&mut self) -> EcsResult<()> {
        if !self.entities.has_dirty() {
            return Ok(());
        }
        let dirty = self.entities.take_dirty();
        for &entity in &dirty {
            match self.entities.record_mut(entity) {
                Ok(record) => record.mark_clean(),
                Err(_) => continue,
            }
            for index in 0..self.systems.len() {
                if !self.entities.is_alive(entity) {
                    break;
                }
                self.revalidate(SystemHandle::new(index as u32), entity)?;
            }
            let deletable = self.entities.get(entity).is_some_and(|record| {
                !record.is_dirty() && !record.has_any_component() && record.systems() == 0
            });
            if deletable && !self.systems.holds(entity) {
                self.entities.delete(entity)?;
            }
        }
        self.entities.restore_dirty_buffer(dirty);
        Ok(())
    }

    /// Bring the membership of `entity` in one system up to date.
    fn revalidate(&mut self, handle: SystemHandle, entity: Entity) -> EcsResult<()> {
        let Some(slot) = self.systems.slot_mut(handle) else {
            return Ok(());
        };
        let record = self.entities.record_mut(entity)?;
        let bit = handle.bit();
        let Some(change) = membership_change(bit, slot.group, record) else {
            return Ok(());
        };
        match change {
            Membership::Add => record.add_system(bit),
            Membership::Remove => record.remove_system(bit),
        }
        trace!(%entity, system = slot.name, ?change, staged = slot.is_staging(), "membership changed");

        if slot.is_staging() {
            slot.stage(entity, change);
            return Ok(());
        }
        match change {
            Membership::Add => {
                slot.members.add(entity)?;
            }
            Membership::Remove => {
                slot.members.remove(entity.index())?;
            }
        }
        self.notify(handle, entity, change)
    }

    /// Run the membership hook of a system, then apply what it staged.
    fn notify(&mut self, handle: SystemHandle, entity: Entity, change: Membership) -> EcsResult<()> {
        let Some(mut behavior) = self.systems.take_behavior(handle) else {
            return Ok(());
        };
        let result = self
            .membership_hook(&mut *behavior, entity, change)
            .and_then(|()| self.apply_staged(handle, &mut *behavior));
        self.systems.restore_behavior(handle, behavior);
        result
    }

    fn membership_hook(&mut self, behavior: &mut dyn System, entity: Entity, change: Membership) -> EcsResult<()> {
        match change {
            Membership::Add => behavior.entity_added(self, entity),
            Membership::Remove => behavior.entity_removed(self, entity),
        }
    }

    /// Materialize the changes staged on a system, re-checking each against
    /// the entity's current state first.
    fn apply_staged(&mut self, handle: SystemHandle, behavior: &mut dyn System) -> EcsResult<()> {
        let bit = handle.bit();
        loop {
            let Some(slot) = self.systems.slot_mut(handle) else {
                return Ok(());
            };
            let Some((entity, change)) = slot.next_staged() else {
                return Ok(());
            };
            let wanted = self
                .entities
                .get(entity)
                .is_some_and(|record| record.in_system(bit));
            let present = slot.members.contains(entity.index());
            match change {
                Membership::Add if wanted && !present => {
                    slot.members.add(entity)?;
                }
                Membership::Remove if !wanted && present => {
                    slot.members.remove(entity.index())?;
                }
                _ => continue,
            }
            self.membership_hook(behavior, entity, change)?;

            // Deletion was held back while the entity was still listed here.
            if change == Membership::Remove {
                let orphaned = self
                    .entities
                    .get(entity)
                    .is_some_and(|record| !record.has_any_component() && record.systems() == 0);
                if orphaned {
                    self.entities.mark_dirty(entity)?;
                }
            }
        }
    }

    /// One processing pass: clean, `begin`, visit every member, apply the
    /// staged changes, `end`.
    fn run_pass(
        &mut self,
        handle: SystemHandle,
        visit: &mut dyn FnMut(&mut dyn System, &mut Ecs, Entity) -> EcsResult<()>,
    ) -> EcsResult<()> {
        let Some(slot) = self.systems.slot(handle) else {
            return Ok(());
        };
        if !slot.activated || slot.is_staging() {
            return Ok(());
        }
        self.clean()?;
        let Some(mut behavior) = self.systems.take_behavior(handle) else {
            return Ok(());
        };

        #[cfg(feature = "metrics")]
        let started = std::time::Instant::now();

        let result = self.iterate(handle, &mut *behavior, visit);
        if let Some(slot) = self.systems.slot_mut(handle) {
            slot.processing = false;
        }
        let name = behavior.name();
        self.systems.restore_behavior(handle, behavior);

        #[cfg(feature = "metrics")]
        self.profiler.record(name, started.elapsed());
        #[cfg(not(feature = "metrics"))]
        let _ = name;

        result
    }

    fn iterate(
        &mut self,
        handle: SystemHandle,
        behavior: &mut dyn System,
        visit: &mut dyn FnMut(&mut dyn System, &mut Ecs, Entity) -> EcsResult<()>,
    ) -> EcsResult<()> {
        behavior.begin(self)?;

        let count = match self.systems.slot_mut(handle) {
            Some(slot) => {
                slot.processing = true;
                slot.members.len()
            }
            None => return Ok(()),
        };
        // The member set is frozen while processing, so positions are stable.
        let mut result = Ok(());
        for index in 0..count {
            let Some(entity) = self.systems.slot(handle).and_then(|slot| slot.members.get(index)) else {
                break;
            };
            if let Err(err) = visit(&mut *behavior, self, entity) {
                result = Err(err);
                break;
            }
        }
        if let Some(slot) = self.systems.slot_mut(handle) {
            slot.processing = false;
        }
        if let Err(err) = result {
            // Leave the member list settled even though the pass failed.
            if self.apply_staged(handle, behavior).is_err() {
                if let Some(slot) = self.systems.slot_mut(handle) {
                    slot.clear_staged();
                }
            }
            return Err(err);
        }

        self.apply_staged(handle, behavior)?;
        behavior.end(self)?;
        self.apply_staged(handle, behavior)
    }

    /// Run a lifecycle hook of one system, then apply what it staged.
    fn run_hook<F>(&mut self, handle: SystemHandle, hook: F) -> EcsResult<()>
    where
        F: FnOnce(&mut dyn System, &mut Ecs) -> EcsResult<()>,
    {
        let Some(mut behavior) = self.systems.take_behavior(handle) else {
            return Ok(());
        };
        let result = hook(&mut *behavior, self).and_then(|()| self.apply_staged(handle, &mut *behavior));
        self.systems.restore_behavior(handle, behavior);
        result
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn set_enabled(&mut self, entity: Entity, enabled: bool) -> EcsResult<bool> {
        let record = self.entities.record_mut(entity)?;
        if record.is_enabled() == enabled {
            return Ok(false);
        }
        record.set_enabled(enabled);
        self.entities.mark_dirty(entity)?;
        Ok(true)
    }

    /// A hook or pass of the system is on the stack.
    fn is_running(&self, handle: SystemHandle) -> bool {
        self.systems.slot(handle).is_some_and(|slot| slot.is_staging())
    }

    fn ensure_phase(&self, expected: Phase, operation: &'static str) -> EcsResult<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(EcsError::IllegalLifecycleState {
                operation,
                phase: self.phase,
            })
        }
    }

    fn ensure_not_terminated(&self, operation: &'static str) -> EcsResult<()> {
        if self.phase == Phase::Terminated {
            Err(EcsError::IllegalLifecycleState {
                operation,
                phase: self.phase,
            })
        } else {
            Ok(())
        }
    }

    fn publish_statistics(&self) {
        self.statistics.publish(self.statistics());
    }
}

impl Default for Ecs {
    fn default() -> Self {
        Self::with_config(EcsConfig::default())
    }
}

impl fmt::Debug for Ecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ecs")
            .field("phase", &self.phase)
            .field("entities", &self.entities.len())
            .field("component_types", &self.components.types().len())
            .field("systems", &self.systems)
            .finish()
    }
}
