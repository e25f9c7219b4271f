//! # nemesis_core - Arena Primitives
//!
//! Zero-dependency storage primitives shared by the decision engine.
//! Actors and groups live in arenas and refer to each other through
//! generational handles, never through owning pointers, so a despawned
//! actor can never be reached through a stale reference.

pub mod handle;

pub use handle::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::handle::{Handle, HandleMap};
}
