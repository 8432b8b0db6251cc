use crate::ecs::containers::ContainerError;
use crate::ecs::Phase;
use thiserror::Error;

/// Errors raised by the ECS runtime.
///
/// All of them denote a violated invariant or a misuse of the lifecycle; the
/// runtime never retries internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    #[error("'{operation}' is not allowed while the ECS is {phase}")]
    IllegalLifecycleState {
        operation: &'static str,
        phase: Phase,
    },

    #[error("{resource} limit of {limit} exceeded")]
    CapacityExceeded { resource: &'static str, limit: usize },

    #[error("a pool is already registered for component '{type_name}'")]
    DuplicatePoolRegistration { type_name: &'static str },

    #[error("entity {id} is not alive")]
    EntityNotAlive { id: u32 },

    #[error(transparent)]
    Container(#[from] ContainerError),
}

pub type EcsResult<T> = Result<T, EcsError>;
