use std::fmt;
use std::marker::PhantomData;

use crate::ecs::component::Component;
use crate::ecs::entity::Entity;
use crate::ecs::types::ComponentType;
use crate::ecs::world::Ecs;

/// Accessor bound to one component type for hot-loop reads.
///
/// Resolving the type once up front skips the per-call type lookup of
/// [`Ecs::get`].
pub struct Getter<T> {
    ty: ComponentType,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> Getter<T> {
    pub(crate) fn new(ty: ComponentType) -> Self {
        Self {
            ty,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn component_type(&self) -> ComponentType {
        self.ty
    }

    /// Whether `entity` carries a `T`, from its component mask.
    #[inline]
    pub fn has(&self, ecs: &Ecs, entity: Entity) -> bool {
        ecs.component_mask(entity)
            .is_some_and(|mask| self.ty.is_in(mask))
    }

    #[inline]
    pub fn get<'a>(&self, ecs: &'a Ecs, entity: Entity) -> Option<&'a T> {
        ecs.components().get_in(self.ty, entity)
    }

    #[inline]
    pub fn get_mut<'a>(&self, ecs: &'a mut Ecs, entity: Entity) -> Option<&'a mut T> {
        ecs.components_mut().get_in_mut(self.ty, entity)
    }

    /// Skips the used-space check; for members of a system whose group
    /// includes `T`.
    ///
    /// # Panics
    /// Panics if the entity id lies beyond the container's capacity.
    #[inline]
    pub fn get_unchecked<'a>(&self, ecs: &'a Ecs, entity: Entity) -> Option<&'a T> {
        ecs.components().get_unchecked(self.ty, entity)
    }

    #[inline]
    pub fn get_unchecked_mut<'a>(&self, ecs: &'a mut Ecs, entity: Entity) -> Option<&'a mut T> {
        ecs.components_mut().get_unchecked_mut(self.ty, entity)
    }
}

impl<T> Clone for Getter<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Getter<T> {}

impl<T> fmt::Debug for Getter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Getter").field(&self.ty).finish()
    }
}
