use serde::{Deserialize, Serialize};

/// Construction parameters of an [`Ecs`](crate::ecs::Ecs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcsConfig {
    /// Resting capacity of the entity set and of every component container.
    pub initial_capacity: usize,
    /// Upper bound on pooled entity objects.
    pub max_pool_size: usize,
    /// Initial membership capacity of each system.
    pub system_capacity: usize,
    /// Seconds of simulated time between capacity decay steps.
    pub decay_interval_secs: f32,
    /// Pre-populate the entity pool with half of `initial_capacity` objects.
    pub prefill_entity_pool: bool,
}

impl EcsConfig {
    pub fn new(initial_capacity: usize, max_pool_size: usize) -> Self {
        Self {
            initial_capacity,
            max_pool_size,
            ..Self::default()
        }
    }
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            max_pool_size: 10_000,
            system_capacity: 64,
            decay_interval_secs: 20.0,
            prefill_entity_pool: true,
        }
    }
}
