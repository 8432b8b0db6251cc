// component.rs - Component traits and type-erased storage
//
// Components are plain data records identified by their Rust type. Storage
// is one sparse array per type, indexed by entity id, held behind a
// type-erased trait object so the manager can address it by type id.

use std::any::Any;

use crate::ecs::component_manager::ComponentManager;
use crate::ecs::containers::{Resizable, SparseArray};
use crate::ecs::entity::EntityRecord;
use crate::ecs::pool::ComponentPools;
use crate::ecs::types::{ComponentType, TypeManager};
use crate::ecs::EcsResult;

/// Marker for types that can be attached to entities.
pub trait Component: 'static {
    /// Human-readable name used in logs and statistics.
    const NAME: &'static str;
}

/// Helper macro to implement the [`Component`] trait.
///
/// # Example
/// ```ignore
/// struct Position { x: f32, y: f32 }
///
/// define_component!(Position);
/// define_component!(Velocity, "Vel");
/// ```
#[macro_export]
macro_rules! define_component {
    ($ty:ty) => {
        impl $crate::ecs::Component for $ty {
            const NAME: &'static str = stringify!($ty);
        }
    };
    ($ty:ty, $name:expr) => {
        impl $crate::ecs::Component for $ty {
            const NAME: &'static str = $name;
        }
    };
}

/// Downcasting support for type-erased runtime objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A set of component types, used to derive a group.
pub trait ComponentSet {
    /// OR of the flags of every type in the set, registering unseen types.
    fn mask(types: &mut TypeManager) -> EcsResult<u64>;
}

/// A group of components that can be attached to an entity in one call.
pub trait ComponentBundle: ComponentSet {
    /// Attach every component. Returns whether the component mask changed.
    fn attach(self, manager: &mut ComponentManager, record: &mut EntityRecord) -> EcsResult<bool>;
}

macro_rules! impl_component_tuple {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn mask(types: &mut TypeManager) -> EcsResult<u64> {
                let mut mask = 0;
                $(
                    mask |= types.get_type::<$name>()?.flag();
                )+
                Ok(mask)
            }
        }

        impl<$($name: Component),+> ComponentBundle for ($($name,)+) {
            #[allow(non_snake_case)]
            fn attach(
                self,
                manager: &mut ComponentManager,
                record: &mut EntityRecord,
            ) -> EcsResult<bool> {
                let ($($name,)+) = self;
                let mut changed = false;
                $(
                    changed |= manager.add_component(record, $name)?;
                )+
                Ok(changed)
            }
        }
    };
}

impl_component_tuple!(A);
impl_component_tuple!(A, B);
impl_component_tuple!(A, B, C);
impl_component_tuple!(A, B, C, D);
impl_component_tuple!(A, B, C, D, E);
impl_component_tuple!(A, B, C, D, E, F);
impl_component_tuple!(A, B, C, D, E, F, G);
impl_component_tuple!(A, B, C, D, E, F, G, H);

/// What happened to a component detached from its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detached {
    /// Handed to the type's pool.
    Recycled,
    /// No pool registered; the instance was dropped.
    Lost,
}

/// Type-erased view of one type's sparse container.
pub(crate) trait ComponentStorage: AsAny {
    fn len(&self) -> usize;
    fn used_space(&self) -> usize;
    fn capacity(&self) -> usize;
    fn load_factor(&self) -> f32;
    fn contains(&self, index: usize) -> bool;

    /// Remove the component at `index` and route it to its pool.
    fn detach(
        &mut self,
        index: usize,
        ty: ComponentType,
        pools: &mut ComponentPools,
    ) -> Option<Detached>;

    /// Shrink towards `max(used_space, target_capacity)`.
    fn refit(&mut self) -> bool;

    fn clear(&mut self);
}

impl<T: Component> ComponentStorage for SparseArray<T> {
    fn len(&self) -> usize {
        SparseArray::len(self)
    }

    fn used_space(&self) -> usize {
        SparseArray::used_space(self)
    }

    fn capacity(&self) -> usize {
        Resizable::capacity(self)
    }

    fn load_factor(&self) -> f32 {
        Resizable::load_factor(self)
    }

    fn contains(&self, index: usize) -> bool {
        SparseArray::contains(self, index)
    }

    fn detach(
        &mut self,
        index: usize,
        ty: ComponentType,
        pools: &mut ComponentPools,
    ) -> Option<Detached> {
        let component = self.remove(index)?;
        if pools.try_free(ty, component) {
            Some(Detached::Recycled)
        } else {
            Some(Detached::Lost)
        }
    }

    fn refit(&mut self) -> bool {
        self.fit(false)
    }

    fn clear(&mut self) {
        SparseArray::clear(self);
    }
}
