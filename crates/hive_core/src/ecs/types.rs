//! Component type and group registry.
//!
//! Each component type gets a small id in `[0, 64)` and a single-bit flag
//! `1 << id`. Groups are OR-combinations of flags, cached by exact mask so
//! that `{A, B}` and `{B, A}` resolve to the same group. The registry is
//! closed once the ECS initializes: new types or groups are rejected, known
//! ones are still served.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::ecs::component::{Component, ComponentSet};
use crate::ecs::{EcsError, EcsResult, Phase};

/// Maximum number of component types per ECS (bit width of the mask).
pub const MAX_TYPES: usize = 64;

/// Maximum number of distinct component groups per ECS.
pub const MAX_GROUPS: usize = i16::MAX as usize;

/// A registered component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentType {
    type_id: TypeId,
    id: u8,
    flag: u64,
    name: &'static str,
}

impl ComponentType {
    #[inline]
    pub fn id(&self) -> u8 {
        self.id
    }

    #[inline]
    pub fn index(&self) -> usize {
        usize::from(self.id)
    }

    #[inline]
    pub fn flag(&self) -> u64 {
        self.flag
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Whether `mask` has this type's bit set.
    #[inline]
    pub fn is_in(&self, mask: u64) -> bool {
        mask & self.flag != 0
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// An OR-combination of component type flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentGroup {
    mask: u64,
    id: u16,
}

impl ComponentGroup {
    #[inline]
    pub fn mask(&self) -> u64 {
        self.mask
    }

    #[inline]
    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn name(&self) -> String {
        format!("ComponentGroup_{}", self.id)
    }

    /// Every type of the group is present in `components`.
    #[inline]
    pub fn contains_all(&self, components: u64) -> bool {
        components & self.mask == self.mask
    }

    /// At least one type of the group is present in `components`.
    #[inline]
    pub fn contains_any(&self, components: u64) -> bool {
        components & self.mask != 0
    }

    #[inline]
    pub fn contains_type(&self, ty: ComponentType) -> bool {
        ty.is_in(self.mask)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }

    /// Number of types in the group.
    #[inline]
    pub fn len(&self) -> u32 {
        self.mask.count_ones()
    }
}

impl fmt::Display for ComponentGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentGroup_{}({:#x})", self.id, self.mask)
    }
}

/// Registry of component types and groups for one ECS instance.
#[derive(Debug, Default)]
pub struct TypeManager {
    types: Vec<ComponentType>,
    by_type_id: HashMap<TypeId, u8>,
    groups: Vec<ComponentGroup>,
    sealed: Option<Phase>,
}

impl TypeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the type of `T`, registering it on first sight.
    pub fn get_type<T: Component>(&mut self) -> EcsResult<ComponentType> {
        if let Some(ty) = self.type_of::<T>() {
            return Ok(ty);
        }
        self.register(TypeId::of::<T>(), T::NAME)
    }

    /// Look up the type of `T` without registering it.
    #[inline]
    pub fn type_of<T: Component>(&self) -> Option<ComponentType> {
        self.by_type_id
            .get(&TypeId::of::<T>())
            .map(|&id| self.types[usize::from(id)])
    }

    #[inline]
    pub fn type_by_id(&self, id: u8) -> Option<ComponentType> {
        self.types.get(usize::from(id)).copied()
    }

    /// Resolve the cached group holding exactly `types`.
    pub fn get_group(&mut self, types: &[ComponentType]) -> EcsResult<ComponentGroup> {
        let mask = types.iter().fold(0, |mask, ty| mask | ty.flag());
        self.group_for_mask(mask)
    }

    /// Resolve the group of a component tuple, registering its types.
    pub fn group_of<S: ComponentSet>(&mut self) -> EcsResult<ComponentGroup> {
        let mask = S::mask(self)?;
        self.group_for_mask(mask)
    }

    /// Resolve the cached group for `mask`, creating it on a miss.
    pub fn group_for_mask(&mut self, mask: u64) -> EcsResult<ComponentGroup> {
        if let Some(group) = self.groups.iter().find(|group| group.mask == mask) {
            return Ok(*group);
        }
        self.check_open("create component group")?;
        if self.groups.len() >= MAX_GROUPS {
            return Err(EcsError::CapacityExceeded {
                resource: "component group",
                limit: MAX_GROUPS,
            });
        }
        let group = ComponentGroup {
            mask,
            id: self.groups.len() as u16,
        };
        self.groups.push(group);
        debug!(group = %group.name(), mask, "component group created");
        Ok(group)
    }

    /// Types whose bit is set in `mask`.
    pub fn types_in(&self, mask: u64) -> impl Iterator<Item = ComponentType> + '_ {
        self.types.iter().copied().filter(move |ty| ty.is_in(mask))
    }

    pub fn types(&self) -> &[ComponentType] {
        &self.types
    }

    pub fn groups(&self) -> &[ComponentGroup] {
        &self.groups
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Reject new types and groups from now on.
    pub fn seal(&mut self, phase: Phase) {
        self.sealed = Some(phase);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.is_some()
    }

    fn register(&mut self, type_id: TypeId, name: &'static str) -> EcsResult<ComponentType> {
        self.check_open("register component type")?;
        if self.types.len() >= MAX_TYPES {
            return Err(EcsError::CapacityExceeded {
                resource: "component type",
                limit: MAX_TYPES,
            });
        }
        let id = self.types.len() as u8;
        let ty = ComponentType {
            type_id,
            id,
            flag: 1u64 << id,
            name,
        };
        self.types.push(ty);
        self.by_type_id.insert(type_id, id);
        debug!(component = name, id, "component type registered");
        Ok(ty)
    }

    fn check_open(&self, operation: &'static str) -> EcsResult<()> {
        match self.sealed {
            Some(phase) => Err(EcsError::IllegalLifecycleState { operation, phase }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_component;

    struct A;
    struct B;
    struct C;
    define_component!(A);
    define_component!(B);
    define_component!(C, "Gamma");

    #[test]
    fn types_get_sequential_bits() {
        let mut types = TypeManager::new();
        let a = types.get_type::<A>().unwrap();
        let b = types.get_type::<B>().unwrap();
        assert_eq!((a.id(), a.flag()), (0, 1));
        assert_eq!((b.id(), b.flag()), (1, 2));
        assert_eq!(types.get_type::<A>().unwrap(), a);
        assert_eq!(types.get_type::<C>().unwrap().name(), "Gamma");
    }

    #[test]
    fn groups_are_cached_by_mask() {
        let mut types = TypeManager::new();
        let a = types.get_type::<A>().unwrap();
        let b = types.get_type::<B>().unwrap();

        let ab = types.get_group(&[a, b]).unwrap();
        let ba = types.get_group(&[b, a]).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(types.group_of::<(B, A)>().unwrap(), ab);
        assert_eq!(types.groups().len(), 1);
        assert_eq!(ab.name(), "ComponentGroup_0");
        assert!(ab.contains_all(0b111));
        assert!(!ab.contains_all(0b01));
        assert!(ab.contains_any(0b01));
    }

    #[test]
    fn sealed_registry_serves_known_types_only() {
        let mut types = TypeManager::new();
        let a = types.get_type::<A>().unwrap();
        let group = types.get_group(&[a]).unwrap();
        types.seal(Phase::Initialized);

        assert_eq!(types.get_type::<A>().unwrap(), a);
        assert_eq!(types.get_group(&[a]).unwrap(), group);
        assert!(matches!(
            types.get_type::<B>(),
            Err(EcsError::IllegalLifecycleState { .. })
        ));
        assert!(matches!(
            types.group_for_mask(0b11),
            Err(EcsError::IllegalLifecycleState { .. })
        ));
    }

    #[test]
    fn sixty_fifth_type_is_rejected() {
        let mut types = TypeManager::new();
        for n in 0..MAX_TYPES {
            types.register(TypeId::of::<[u8; 0]>(), "filler").unwrap();
            assert_eq!(types.len(), n + 1);
        }
        assert!(matches!(
            types.get_type::<A>(),
            Err(EcsError::CapacityExceeded { limit: 64, .. })
        ));
    }
}
