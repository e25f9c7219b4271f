//! Tactical decision rule
//!
//! A pure function of the actor's memory and its current situation. The
//! result is recomputed every tick and never persisted.

use crate::memory::Memory;
use serde::{Deserialize, Serialize};

/// Skill estimate above which the opponent is worth flanking
pub const FLANK_SKILL_THRESHOLD: f32 = 0.7;
/// Minimum distance for a flanking maneuver
pub const FLANK_MIN_DISTANCE: f32 = 100.0;

/// Short-lived behavioral override layered on top of the base behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TacticalState {
    #[default]
    Normal,
    Aggressive,
    Defensive,
    Flanking,
    Kiting,
    Retreating,
    Regrouping,
}

impl TacticalState {
    /// Decode a wire index; unknown values map to `Normal`
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => Self::Normal,
            1 => Self::Aggressive,
            2 => Self::Defensive,
            3 => Self::Flanking,
            4 => Self::Kiting,
            5 => Self::Retreating,
            6 => Self::Regrouping,
            other => {
                log::warn!("Unknown tactical state index {}, using normal", other);
                Self::Normal
            }
        }
    }

    /// Parse a name; unknown names map to `Normal`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "normal" => Self::Normal,
            "aggressive" => Self::Aggressive,
            "defensive" => Self::Defensive,
            "flanking" => Self::Flanking,
            "kiting" => Self::Kiting,
            "retreating" => Self::Retreating,
            "regrouping" => Self::Regrouping,
            other => {
                log::warn!("Unknown tactical state '{}', using normal", other);
                Self::Normal
            }
        }
    }

    /// Config and report tag
    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Aggressive => "aggressive",
            Self::Defensive => "defensive",
            Self::Flanking => "flanking",
            Self::Kiting => "kiting",
            Self::Retreating => "retreating",
            Self::Regrouping => "regrouping",
        }
    }

    /// Modes that pull the actor away from the fight
    pub fn is_withdrawal(self) -> bool {
        matches!(self, Self::Retreating | Self::Regrouping)
    }
}

impl std::fmt::Display for TacticalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Situational inputs sampled by the actor each tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TacticalInputs {
    /// Current health / max health
    pub health_fraction: f32,
    /// Whether living allies share the actor's group
    pub has_allies: bool,
    /// Distance to the opponent
    pub distance: f32,
}

/// Pick the tactical mode. Rules are checked in priority order and the
/// first match wins; a withdrawal is never outranked.
pub fn decide(memory: &Memory, inputs: TacticalInputs) -> TacticalState {
    let health = if inputs.health_fraction.is_nan() {
        0.0
    } else {
        inputs.health_fraction.clamp(0.0, 1.0)
    };
    let distance = inputs.distance;

    if health < memory.retreat_threshold() {
        return if inputs.has_allies {
            TacticalState::Regrouping
        } else {
            TacticalState::Retreating
        };
    }

    if memory.hits_landed() as f32 > memory.damage_received() / 10.0 && health > 0.6 {
        return TacticalState::Aggressive;
    }

    if memory.player_skill_estimate() > FLANK_SKILL_THRESHOLD && distance > FLANK_MIN_DISTANCE {
        return TacticalState::Flanking;
    }

    if memory.evasions() > 3 && distance < memory.preferred_engagement_distance() {
        return TacticalState::Kiting;
    }

    if memory.damage_received() > 30.0 && health < 0.5 {
        return TacticalState::Defensive;
    }

    TacticalState::Normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Observation;

    fn inputs(health_fraction: f32, has_allies: bool, distance: f32) -> TacticalInputs {
        TacticalInputs {
            health_fraction,
            has_allies,
            distance,
        }
    }

    fn skilled_memory() -> Memory {
        let mut memory = Memory::new();
        for i in 0..400 {
            let obs = Observation::at((i * 20) as f32, 0.0).with_attack().with_dash();
            memory.update(&obs, 1.0 / 60.0);
        }
        assert!(memory.player_skill_estimate() > FLANK_SKILL_THRESHOLD);
        memory
    }

    #[test]
    fn test_fresh_memory_is_normal() {
        let memory = Memory::new();
        assert_eq!(decide(&memory, inputs(1.0, false, 50.0)), TacticalState::Normal);
    }

    #[test]
    fn test_low_health_withdraws() {
        let memory = Memory::new();
        assert_eq!(decide(&memory, inputs(0.2, false, 50.0)), TacticalState::Retreating);
        assert_eq!(decide(&memory, inputs(0.2, true, 50.0)), TacticalState::Regrouping);
    }

    #[test]
    fn test_withdrawal_outranks_everything() {
        let mut memory = skilled_memory();
        for _ in 0..10 {
            memory.record_combat_event(true, false, 0.0, 10.0);
            memory.record_evasion();
        }
        assert!(decide(&memory, inputs(0.1, false, 500.0)).is_withdrawal());
        assert!(decide(&memory, inputs(0.1, true, 5.0)).is_withdrawal());
    }

    #[test]
    fn test_aggressive_after_landing_hits() {
        let mut memory = Memory::new();
        memory.record_combat_event(true, false, 0.0, 30.0);
        assert_eq!(decide(&memory, inputs(0.9, false, 50.0)), TacticalState::Aggressive);
        // Not healthy enough to press
        assert_eq!(decide(&memory, inputs(0.5, false, 50.0)), TacticalState::Normal);
    }

    #[test]
    fn test_flanking_against_skilled_opponent() {
        let memory = skilled_memory();
        assert_eq!(decide(&memory, inputs(1.0, false, 150.0)), TacticalState::Flanking);
        assert_eq!(decide(&memory, inputs(1.0, false, 80.0)), TacticalState::Normal);
    }

    #[test]
    fn test_kiting_after_evasions() {
        let mut memory = Memory::new();
        for _ in 0..4 {
            memory.record_evasion();
        }
        assert_eq!(decide(&memory, inputs(1.0, false, 40.0)), TacticalState::Kiting);
        assert_eq!(decide(&memory, inputs(1.0, false, 120.0)), TacticalState::Normal);
    }

    #[test]
    fn test_defensive_when_hurt() {
        let mut memory = Memory::new();
        memory.record_combat_event(false, true, 40.0, 0.0);
        assert_eq!(decide(&memory, inputs(0.45, false, 50.0)), TacticalState::Defensive);
    }

    #[test]
    fn test_unknown_encodings_fall_back_to_normal() {
        assert_eq!(TacticalState::from_index(42), TacticalState::Normal);
        assert_eq!(TacticalState::from_index(4), TacticalState::Kiting);
        assert_eq!(TacticalState::from_name("berserk"), TacticalState::Normal);
        assert_eq!(TacticalState::from_name("Flanking"), TacticalState::Flanking);
    }
}
