//! Hive Core
//!
//! An entity component system runtime built around:
//! - Sparse per-type component storage indexed by entity id
//! - Bitmask component groups and per-system membership sets
//! - Deferred, reentrancy-safe membership reconciliation
//! - Pooling of entity ids and component instances
//! - Decay-driven shrinking of idle storage

pub mod ecs;
pub mod time;

pub use ecs::{Ecs, EcsConfig, EcsError, EcsResult, Entity};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
