//! Actor and encounter configuration

use crate::behavior::MovementPattern;
use crate::error::{AiError, Result};
use nemesis_math::Vec2;
use serde::{Deserialize, Serialize};

/// Fixed simulation rate the whole decision layer is tuned for
pub const TICK_RATE: f32 = 60.0;

/// Minimum spacing between group formation re-coordinations (seconds)
pub const DEFAULT_COORDINATION_INTERVAL: f32 = 0.1;

/// Bounding box size class of an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    /// 16 units square
    Tiny,
    /// 32 units square
    #[default]
    Small,
    /// 64 units square
    Large,
    /// 128 units square
    Huge,
}

impl SizeClass {
    /// Side length of the square bounding box
    pub fn extent(self) -> f32 {
        match self {
            Self::Tiny => 16.0,
            Self::Small => 32.0,
            Self::Large => 64.0,
            Self::Huge => 128.0,
        }
    }

    /// Parse a size name; unknown names fall back to `Small`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "tiny" | "16" => Self::Tiny,
            "small" | "32" => Self::Small,
            "large" | "64" => Self::Large,
            "huge" | "128" => Self::Huge,
            other => {
                log::warn!("Unknown size class '{}', using small", other);
                Self::Small
            }
        }
    }
}

/// Per-actor archetype configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Display name, used only for logs and reports
    pub name: String,
    /// Health at spawn
    pub max_health: f32,
    /// Maximum horizontal speed (units per tick)
    pub speed: f32,
    /// Damage dealt by one attack
    pub damage: f32,
    /// Bounding box size class
    pub size: SizeClass,
    /// Distance below which the actor starts pursuing
    pub aggro_range: f32,
    /// Distance below which the actor can attack
    pub attack_range: f32,
    /// Spawn position (box center)
    pub spawn: Vec2,
    /// Movement archetype
    pub pattern: MovementPattern,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            name: String::from("enemy"),
            max_health: 100.0,
            speed: 2.0,
            damage: 10.0,
            size: SizeClass::Small,
            aggro_range: 200.0,
            attack_range: 40.0,
            spawn: Vec2::ZERO,
            pattern: MovementPattern::Chase,
        }
    }
}

impl ActorConfig {
    /// Create a config with the given movement pattern
    pub fn new(pattern: MovementPattern) -> Self {
        Self {
            pattern,
            ..Default::default()
        }
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the spawn position
    pub fn with_spawn(mut self, x: f32, y: f32) -> Self {
        self.spawn = Vec2::new(x, y);
        self
    }

    /// Set max health
    pub fn with_health(mut self, max_health: f32) -> Self {
        self.max_health = max_health;
        self
    }

    /// Set speed
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Set attack damage
    pub fn with_damage(mut self, damage: f32) -> Self {
        self.damage = damage;
        self
    }

    /// Set aggro and attack ranges
    pub fn with_ranges(mut self, aggro_range: f32, attack_range: f32) -> Self {
        self.aggro_range = aggro_range;
        self.attack_range = attack_range;
        self
    }

    /// Set the size class
    pub fn with_size(mut self, size: SizeClass) -> Self {
        self.size = size;
        self
    }

    /// Check the config before an actor is built from it
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(AiError::InvalidConfig(format!("{}: {}", self.name, msg)));

        if !(self.max_health > 0.0 && self.max_health.is_finite()) {
            return invalid(format!("max_health must be positive, got {}", self.max_health));
        }
        if !(self.speed > 0.0 && self.speed.is_finite()) {
            return invalid(format!("speed must be positive, got {}", self.speed));
        }
        if !(self.damage >= 0.0 && self.damage.is_finite()) {
            return invalid(format!("damage must be non-negative, got {}", self.damage));
        }
        if !(self.aggro_range >= 0.0 && self.attack_range >= 0.0)
            || !self.aggro_range.is_finite()
            || !self.attack_range.is_finite()
        {
            return invalid(String::from("ranges must be finite and non-negative"));
        }
        if self.attack_range > self.aggro_range {
            return invalid(format!(
                "attack_range {} exceeds aggro_range {}",
                self.attack_range, self.aggro_range
            ));
        }
        if !self.spawn.is_finite() {
            return invalid(String::from("spawn position must be finite"));
        }
        if let Some((min_x, max_x)) = self.pattern.patrol_bounds() {
            if !(min_x <= max_x) {
                return invalid(format!("patrol bounds inverted: {} > {}", min_x, max_x));
            }
        }
        Ok(())
    }
}

/// Encounter (room) level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Simulation ticks per second
    pub tick_rate: f32,
    /// Minimum seconds between formation re-coordinations
    pub coordination_interval: f32,
    /// Y of the floor used by the built-in flat-ground integrator
    pub ground_y: f32,
    /// Withhold formation slots from members beyond the group's communication range
    pub enforce_communication_range: bool,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            coordination_interval: DEFAULT_COORDINATION_INTERVAL,
            ground_y: 400.0,
            enforce_communication_range: false,
        }
    }
}

impl EncounterConfig {
    /// Seconds per tick
    pub fn delta_time(&self) -> f32 {
        if self.tick_rate > 0.0 {
            1.0 / self.tick_rate
        } else {
            1.0 / TICK_RATE
        }
    }

    /// Check the encounter settings
    pub fn validate(&self) -> Result<()> {
        if !(self.tick_rate > 0.0 && self.tick_rate.is_finite()) {
            return Err(AiError::InvalidConfig(format!(
                "tick_rate must be positive, got {}",
                self.tick_rate
            )));
        }
        if !(self.coordination_interval >= 0.0 && self.coordination_interval.is_finite()) {
            return Err(AiError::InvalidConfig(format!(
                "coordination_interval must be non-negative, got {}",
                self.coordination_interval
            )));
        }
        if !self.ground_y.is_finite() {
            return Err(AiError::InvalidConfig(String::from("ground_y must be finite")));
        }
        Ok(())
    }
}
