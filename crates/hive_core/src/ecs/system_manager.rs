//! System registration and per-system membership.
//!
//! Each registered system owns a slot: its group, its packed membership set,
//! two staging queues and its behaviour object. While a system's behaviour is
//! running (a hook or a processing pass) the slot is *staging*: membership
//! changes aimed at it are queued instead of applied, so the membership set
//! never changes under an iteration cursor.

use std::any::TypeId;
use std::collections::HashMap;

use tracing::debug;

use crate::ecs::containers::{KeyedArray, Resizable};
use crate::ecs::entity::Entity;
use crate::ecs::system::{Membership, System, SystemHandle};
use crate::ecs::types::ComponentGroup;
use crate::ecs::{EcsError, EcsResult};

/// Maximum number of systems per ECS (bit width of the system mask).
pub const MAX_SYSTEMS: usize = 64;

pub(crate) struct SystemSlot {
    pub(crate) handle: SystemHandle,
    pub(crate) name: &'static str,
    pub(crate) group: ComponentGroup,
    pub(crate) members: KeyedArray<Entity>,
    wait_add: Vec<Entity>,
    wait_remove: Vec<Entity>,
    pub(crate) activated: bool,
    pub(crate) processing: bool,
    behavior: Option<Box<dyn System>>,
}

impl SystemSlot {
    /// Membership changes must be queued rather than applied.
    #[inline]
    pub(crate) fn is_staging(&self) -> bool {
        self.processing || self.behavior.is_none()
    }

    pub(crate) fn stage(&mut self, entity: Entity, change: Membership) {
        match change {
            Membership::Add => self.wait_add.push(entity),
            Membership::Remove => self.wait_remove.push(entity),
        }
    }

    /// Next staged change: additions first, then removals.
    pub(crate) fn next_staged(&mut self) -> Option<(Entity, Membership)> {
        if let Some(entity) = self.wait_add.pop() {
            return Some((entity, Membership::Add));
        }
        self.wait_remove
            .pop()
            .map(|entity| (entity, Membership::Remove))
    }

    pub(crate) fn has_staged(&self) -> bool {
        !self.wait_add.is_empty() || !self.wait_remove.is_empty()
    }

    pub(crate) fn clear_staged(&mut self) {
        self.wait_add.clear();
        self.wait_remove.clear();
    }
}

/// Registry of every system of one ECS.
pub struct SystemManager {
    slots: Vec<SystemSlot>,
    by_type: HashMap<TypeId, SystemHandle>,
    member_capacity: usize,
}

impl SystemManager {
    pub fn new(member_capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            by_type: HashMap::new(),
            member_capacity: member_capacity.max(1),
        }
    }

    /// Register `system` over `group`. Registering a second instance of the
    /// same system type returns the existing handle and drops the new one.
    pub fn register<S: System>(&mut self, system: S, group: ComponentGroup) -> EcsResult<SystemHandle> {
        if let Some(handle) = self.by_type.get(&TypeId::of::<S>()) {
            return Ok(*handle);
        }
        if self.slots.len() >= MAX_SYSTEMS {
            return Err(EcsError::CapacityExceeded {
                resource: "system",
                limit: MAX_SYSTEMS,
            });
        }
        let handle = SystemHandle::new(self.slots.len() as u32);
        let name = system.name();
        self.slots.push(SystemSlot {
            handle,
            name,
            group,
            members: KeyedArray::new(self.member_capacity),
            wait_add: Vec::new(),
            wait_remove: Vec::new(),
            activated: true,
            processing: false,
            behavior: Some(Box::new(system)),
        });
        self.by_type.insert(TypeId::of::<S>(), handle);
        debug!(system = name, %handle, group = %group.name(), "system registered");
        Ok(handle)
    }

    pub fn handle_of<S: System>(&self) -> Option<SystemHandle> {
        self.by_type.get(&TypeId::of::<S>()).copied()
    }

    /// The behaviour of system `S`. `None` while one of its hooks is running.
    pub fn get<S: System>(&self) -> Option<&S> {
        let handle = self.handle_of::<S>()?;
        self.slot(handle)?
            .behavior
            .as_deref()?
            .as_any()
            .downcast_ref::<S>()
    }

    pub fn get_mut<S: System>(&mut self) -> Option<&mut S> {
        let handle = self.handle_of::<S>()?;
        self.slot_mut(handle)?
            .behavior
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<S>()
    }

    /// Current members of a system, in iteration order.
    pub fn members(&self, handle: SystemHandle) -> Option<&[Entity]> {
        self.slot(handle).map(|slot| slot.members.as_slice())
    }

    pub fn group(&self, handle: SystemHandle) -> Option<ComponentGroup> {
        self.slot(handle).map(|slot| slot.group)
    }

    pub fn name(&self, handle: SystemHandle) -> Option<&'static str> {
        self.slot(handle).map(|slot| slot.name)
    }

    pub fn is_activated(&self, handle: SystemHandle) -> bool {
        self.slot(handle).is_some_and(|slot| slot.activated)
    }

    pub fn is_processing(&self, handle: SystemHandle) -> bool {
        self.slot(handle).is_some_and(|slot| slot.processing)
    }

    pub fn activate(&mut self, handle: SystemHandle) {
        if let Some(slot) = self.slot_mut(handle) {
            slot.activated = true;
        }
    }

    pub fn deactivate(&mut self, handle: SystemHandle) {
        if let Some(slot) = self.slot_mut(handle) {
            slot.activated = false;
        }
    }

    pub(crate) fn deactivate_all(&mut self) {
        for slot in &mut self.slots {
            slot.activated = false;
        }
    }

    /// Whether any system still lists `entity` as a member.
    pub fn holds(&self, entity: Entity) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.members.contains(entity.index()))
    }

    pub fn handles(&self) -> impl Iterator<Item = SystemHandle> + '_ {
        self.slots.iter().map(|slot| slot.handle)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Members over membership capacity, across all systems.
    pub fn load_factor(&self) -> f32 {
        let (len, capacity) = self.slots.iter().fold((0, 0), |(len, capacity), slot| {
            (len + slot.members.len(), capacity + slot.members.capacity())
        });
        if capacity == 0 {
            1.0
        } else {
            len as f32 / capacity as f32
        }
    }

    #[inline]
    pub(crate) fn slot(&self, handle: SystemHandle) -> Option<&SystemSlot> {
        self.slots.get(handle.index() as usize)
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, handle: SystemHandle) -> Option<&mut SystemSlot> {
        self.slots.get_mut(handle.index() as usize)
    }

    pub(crate) fn take_behavior(&mut self, handle: SystemHandle) -> Option<Box<dyn System>> {
        self.slot_mut(handle)?.behavior.take()
    }

    pub(crate) fn restore_behavior(&mut self, handle: SystemHandle, behavior: Box<dyn System>) {
        if let Some(slot) = self.slot_mut(handle) {
            slot.behavior = Some(behavior);
        }
    }

    /// Drop every system.
    pub(crate) fn release(&mut self) {
        self.slots.clear();
        self.by_type.clear();
    }
}

impl std::fmt::Debug for SystemManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|slot| (slot.handle.index(), slot.name, slot.members.len())))
            .finish()
    }
}
