//! Events emitted by actors for the combat and animation layers

use crate::behavior::BehaviorState;
use crate::tactics::TacticalState;
use serde::Serialize;

/// Something an actor did during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ActorEvent {
    /// Behavior state changed; drives animation
    StateChanged {
        from: BehaviorState,
        to: BehaviorState,
    },
    /// An attack started this tick
    AttackLaunched { damage: f32 },
    /// Left the ground
    Jumped,
    /// Tactical mode changed
    TacticChanged {
        from: TacticalState,
        to: TacticalState,
    },
    /// Health reached zero
    Died,
}
