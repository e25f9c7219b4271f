//! Error types for the decision engine
//!
//! Only setup and API-boundary calls can fail. The per-tick update path
//! never returns an error; it degrades to simpler behavior instead.

use crate::actor::ActorHandle;
use crate::group::GroupHandle;
use thiserror::Error;

/// Decision engine errors
#[derive(Debug, Error)]
pub enum AiError {
    /// Configuration rejected by validation
    #[error("Invalid AI configuration: {0}")]
    InvalidConfig(String),

    /// Actor handle no longer resolves
    #[error("Actor not found: {0}")]
    StaleActor(ActorHandle),

    /// Group handle no longer resolves
    #[error("Group not found: {0}")]
    StaleGroup(GroupHandle),

    /// Actor is already a member of a group
    #[error("Actor {0} already belongs to a group")]
    AlreadyGrouped(ActorHandle),
}

/// Result type for decision engine operations
pub type Result<T> = std::result::Result<T, AiError>;
