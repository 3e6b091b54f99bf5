// Physics system using rapier2d
//
// `Simulation` is the entry point: it owns at most one `PhysicsWorld` at a time and
// hands out generation-checked handles to the particle systems and edge boxes that
// live inside it.

pub mod body;
mod collision;
mod debug;
pub mod handle;
pub mod particles;
mod simulation;
mod world;

pub use collision::CollisionGroups;
pub use debug::DebugRenderer;
pub use handle::{EdgeHandle, ParticleSystemHandle};
pub use particles::ParticleSystemDef;
pub use simulation::Simulation;
pub use world::{DebugData, PhysicsWorld};

use std::borrow::Cow;
use std::collections::TryReserveError;

/// Errors reported by the simulation
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("No active world")]
    NoActiveWorld,

    #[error("A world is already active; destroy it first")]
    WorldAlreadyExists,

    #[error("Invalid handle: the object or its world no longer exists")]
    InvalidHandle,

    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: Cow<'static, str>,
    },

    #[error("Allocation failure: {0}")]
    AllocationFailure(#[from] TryReserveError),
}

impl SimulationError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// True for errors caused by misuse of the API rather than the environment
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, Self::AllocationFailure(_))
    }
}

/// Result type for simulation calls
pub type SimResult<T> = Result<T, SimulationError>;
