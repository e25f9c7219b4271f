//! # nemesis_ai - Adaptive Enemy Decision Engine
//!
//! Per-actor behavior state machines, a learned model of the opponent,
//! memory-driven tactics, and group coordination with formations.
//!
//! # Features
//!
//! - Behavior state machine per movement archetype
//! - Adaptive memory of opponent speed, actions and skill
//! - Tactical modes layered over the base behavior
//! - Groups with leader election and formation geometry
//! - Arena-backed encounters with a fixed-rate tick loop
//!
//! # Example
//!
//! ```ignore
//! use nemesis_ai::prelude::*;
//!
//! let mut encounter = Encounter::new(EncounterConfig::default())?;
//! let grunt = encounter.spawn(ActorConfig::new(MovementPattern::Chase).with_spawn(100.0, 384.0))?;
//! let pack = encounter.create_group(300.0);
//! encounter.join_group(grunt, pack)?;
//!
//! for event in encounter.tick(&Observation::at(250.0, 384.0)) {
//!     println!("{:?}", event);
//! }
//! ```

pub mod actor;
pub mod behavior;
pub mod config;
pub mod encounter;
pub mod error;
pub mod events;
pub mod formation;
pub mod group;
pub mod memory;
pub mod modifier;
pub mod steering;
pub mod tactics;

pub mod prelude {
    pub use crate::actor::{Actor, ActorHandle};
    pub use crate::behavior::{BehaviorMachine, BehaviorState, Kinematics, MovementPattern};
    pub use crate::config::{ActorConfig, EncounterConfig, SizeClass, TICK_RATE};
    pub use crate::encounter::{Encounter, FlatGround, MotionIntegrator};
    pub use crate::error::{AiError, Result};
    pub use crate::events::ActorEvent;
    pub use crate::formation::Formation;
    pub use crate::group::{Group, GroupHandle, GroupSnapshot, GroupState};
    pub use crate::memory::{Memory, Observation};
    pub use crate::tactics::TacticalState;
}

pub use prelude::*;
