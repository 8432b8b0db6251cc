//! System behaviour and membership rules.

use std::fmt;

use crate::ecs::component::AsAny;
use crate::ecs::entity::{Entity, EntityRecord};
use crate::ecs::types::ComponentGroup;
use crate::ecs::world::Ecs;
use crate::ecs::EcsResult;

/// Handle assigned to each registered system.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemHandle(u32);

impl SystemHandle {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Return the raw index backing this handle.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }

    /// Membership bit of the system in entity system masks.
    #[inline]
    pub fn bit(self) -> u64 {
        1u64 << self.0
    }
}

impl fmt::Display for SystemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Behaviour of a system over the entities matching its group.
///
/// Every hook receives the owning [`Ecs`] and may mutate it freely: create or
/// remove entities, attach or detach components, even process other systems.
/// Membership changes aimed at a system while it is iterating are staged and
/// applied once the iteration completes.
///
/// ```ignore
/// struct Movement;
///
/// impl System for Movement {
///     fn process_entity_dt(&mut self, ecs: &mut Ecs, entity: Entity, dt: f32) -> EcsResult<()> {
///         let Some(&velocity) = ecs.get::<Velocity>(entity) else {
///             return Ok(());
///         };
///         if let Some(position) = ecs.get_mut::<Position>(entity) {
///             position.x += velocity.x * dt;
///         }
///         Ok(())
///     }
/// }
/// ```
#[allow(unused_variables)]
pub trait System: AsAny {
    /// Name used in logs and profiling.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Called once when the ECS initializes.
    fn initialize(&mut self, ecs: &mut Ecs) -> EcsResult<()> {
        Ok(())
    }

    /// Called once when the ECS terminates.
    fn terminate(&mut self, ecs: &mut Ecs) -> EcsResult<()> {
        Ok(())
    }

    /// Called before each processing pass.
    fn begin(&mut self, ecs: &mut Ecs) -> EcsResult<()> {
        Ok(())
    }

    /// Called after each processing pass, once staged changes are applied.
    fn end(&mut self, ecs: &mut Ecs) -> EcsResult<()> {
        Ok(())
    }

    fn entity_added(&mut self, ecs: &mut Ecs, entity: Entity) -> EcsResult<()> {
        Ok(())
    }

    fn entity_removed(&mut self, ecs: &mut Ecs, entity: Entity) -> EcsResult<()> {
        Ok(())
    }

    /// Per-member hook of [`Ecs::process`].
    fn process_entity(&mut self, ecs: &mut Ecs, entity: Entity) -> EcsResult<()> {
        Ok(())
    }

    /// Per-member hook of [`Ecs::process_with_delta`].
    fn process_entity_dt(&mut self, ecs: &mut Ecs, entity: Entity, dt: f32) -> EcsResult<()> {
        Ok(())
    }
}

/// Change of membership decided by [`membership_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Add,
    Remove,
}

/// Decide how the membership of `record` in the system with `bit` and
/// `group` must change.
///
/// | enabled | in system | has components | change |
/// |---------|-----------|----------------|--------|
/// | yes     | yes       | yes            | none   |
/// | yes     | yes       | no             | remove |
/// | yes     | no        | yes            | add    |
/// | yes     | no        | no             | none   |
/// | no      | yes       | -              | remove |
/// | no      | no        | -              | none   |
///
/// An entity without any component matches no group, not even the empty one.
#[inline]
pub fn membership_change(bit: u64, group: ComponentGroup, record: &EntityRecord) -> Option<Membership> {
    let in_system = record.in_system(bit);
    if record.is_enabled() {
        let matches = record.has_any_component() && group.contains_all(record.components());
        if in_system == matches {
            None
        } else if in_system {
            Some(Membership::Remove)
        } else {
            Some(Membership::Add)
        }
    } else if in_system {
        Some(Membership::Remove)
    } else {
        None
    }
}
