//! Convenience macros for entity spawning

/// Create an entity and attach components to it.
///
/// Expands to an expression of type `EcsResult<Entity>`.
///
/// # Examples
///
/// ```ignore
/// // Single component
/// let entity = spawn!(ecs, Position { x: 0.0, y: 0.0 })?;
///
/// // Multiple components
/// let entity = spawn!(ecs,
///     Position { x: 0.0, y: 0.0 },
///     Velocity { x: 1.0, y: 1.0 },
/// )?;
/// ```
#[macro_export]
macro_rules! spawn {
    ($ecs:expr $(, $component:expr)+ $(,)?) => {{
        let ecs: &mut $crate::ecs::Ecs = &mut $ecs;
        ecs.create().and_then(|entity| {
            ecs.add_components(entity, ($($component,)+))
                .map(|_| entity)
        })
    }};
}
