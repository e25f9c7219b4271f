//! Base behavior state machine
//!
//! Every actor runs one [`BehaviorMachine`]. The configured
//! [`MovementPattern`] picks the transition rules; a single exhaustive match
//! in [`BehaviorMachine::step`] dispatches on it. Velocities are in units
//! per tick, +Y points down.

use nemesis_math::{signum_or_zero, Vec2};
use serde::{Deserialize, Serialize};

/// Attack cooldown for mobile patterns (ticks)
pub const ATTACK_COOLDOWN_TICKS: u32 = 60;
/// Attack cooldown for stationary actors (ticks)
pub const STATIONARY_ATTACK_COOLDOWN_TICKS: u32 = 90;
/// Cooldown after a jump (ticks)
pub const JUMP_COOLDOWN_TICKS: u32 = 30;
/// Vertical velocity applied by a jump
pub const JUMP_IMPULSE: f32 = -8.0;
/// Per-tick horizontal decay while a fleeing actor idles
pub const IDLE_FRICTION: f32 = 0.8;
/// Downward acceleration per tick for grounded archetypes in the air
pub const GRAVITY: f32 = 0.5;
/// Terminal fall speed
pub const MAX_FALL_SPEED: f32 = 10.0;

const HOVER_BOB_RATE: f32 = 0.05;
const HOVER_BOB_AMPLITUDE: f32 = 0.5;

/// Discrete motion state, consumed by the animation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorState {
    #[default]
    Idle,
    Patrol,
    Chase,
    Attack,
    Flee,
    /// Terminal
    Dead,
}

impl BehaviorState {
    /// Decode a wire index; unknown values map to `Idle`
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => Self::Idle,
            1 => Self::Patrol,
            2 => Self::Chase,
            3 => Self::Attack,
            4 => Self::Flee,
            5 => Self::Dead,
            other => {
                log::warn!("Unknown behavior state index {}, using idle", other);
                Self::Idle
            }
        }
    }

    /// Parse a name; unknown names map to `Idle`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "idle" => Self::Idle,
            "patrol" => Self::Patrol,
            "chase" => Self::Chase,
            "attack" => Self::Attack,
            "flee" => Self::Flee,
            "dead" => Self::Dead,
            other => {
                log::warn!("Unknown behavior state '{}', using idle", other);
                Self::Idle
            }
        }
    }

    /// Animation tag
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Patrol => "patrol",
            Self::Chase => "chase",
            Self::Attack => "attack",
            Self::Flee => "flee",
            Self::Dead => "dead",
        }
    }

    /// Chasing or attacking
    pub fn is_engaged(self) -> bool {
        matches!(self, Self::Chase | Self::Attack)
    }
}

impl std::fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Movement archetype of an actor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MovementPattern {
    /// Walk between two X bounds, chase on X when the opponent comes close
    Patrol { min_x: f32, max_x: f32 },
    /// Always close in, attack when in range
    Chase,
    /// Run from the opponent when it comes close
    Flee,
    /// Never move, attack when in range
    Stationary,
    /// Ignore gravity, chase in both axes, bob while patrolling
    Flying { min_x: f32, max_x: f32 },
    /// Chase on X and hop when grounded
    Jumping { min_x: f32, max_x: f32 },
}

impl Default for MovementPattern {
    fn default() -> Self {
        Self::Stationary
    }
}

impl MovementPattern {
    /// Build a pattern from its name; unknown names map to `Stationary`
    pub fn from_name(name: &str, min_x: f32, max_x: f32) -> Self {
        match name.trim().to_lowercase().as_str() {
            "patrol" => Self::Patrol { min_x, max_x },
            "chase" => Self::Chase,
            "flee" => Self::Flee,
            "stationary" => Self::Stationary,
            "flying" => Self::Flying { min_x, max_x },
            "jumping" => Self::Jumping { min_x, max_x },
            other => {
                log::warn!("Unknown movement pattern '{}', using stationary", other);
                Self::Stationary
            }
        }
    }

    /// Config and report tag
    pub fn name(&self) -> &'static str {
        match self {
            Self::Patrol { .. } => "patrol",
            Self::Chase => "chase",
            Self::Flee => "flee",
            Self::Stationary => "stationary",
            Self::Flying { .. } => "flying",
            Self::Jumping { .. } => "jumping",
        }
    }

    /// Patrol bounds for patterns that have them
    pub fn patrol_bounds(&self) -> Option<(f32, f32)> {
        match *self {
            Self::Patrol { min_x, max_x }
            | Self::Flying { min_x, max_x }
            | Self::Jumping { min_x, max_x } => Some((min_x, max_x)),
            Self::Chase | Self::Flee | Self::Stationary => None,
        }
    }

    /// Ignores gravity and chases in both axes
    pub fn is_flying(&self) -> bool {
        matches!(self, Self::Flying { .. })
    }

    /// Never moves
    pub fn is_stationary(&self) -> bool {
        matches!(self, Self::Stationary)
    }
}

/// Position, velocity and grounded flag exchanged with the physics layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: Vec2,
    pub velocity: Vec2,
    pub on_ground: bool,
}

impl Kinematics {
    /// At rest on the ground
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            on_ground: true,
        }
    }
}

/// What the machine senses about the opponent this tick
#[derive(Debug, Clone, Copy)]
pub struct Senses {
    pub opponent: Vec2,
    pub distance: f32,
    pub aggro_range: f32,
    pub attack_range: f32,
    pub speed: f32,
}

impl Senses {
    /// Close enough to pursue
    pub fn in_aggro_range(&self) -> bool {
        self.distance < self.aggro_range
    }

    /// Close enough to strike
    pub fn in_attack_range(&self) -> bool {
        self.distance < self.attack_range
    }
}

/// Side effects of one step, reported back to the actor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub attack_launched: bool,
    pub jumped: bool,
}

/// Per-actor behavior state machine
#[derive(Debug, Clone)]
pub struct BehaviorMachine {
    pattern: MovementPattern,
    state: BehaviorState,
    cooldown: u32,
    patrol_direction: f32,
    ticks: u64,
}

impl BehaviorMachine {
    /// Start idle with no cooldown
    pub fn new(pattern: MovementPattern) -> Self {
        Self {
            pattern,
            state: BehaviorState::Idle,
            cooldown: 0,
            patrol_direction: 1.0,
            ticks: 0,
        }
    }

    /// Pattern driving the transition rules
    pub fn pattern(&self) -> &MovementPattern {
        &self.pattern
    }

    /// Current state
    pub fn state(&self) -> BehaviorState {
        self.state
    }

    /// Remaining cooldown ticks
    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Cooldown elapsed
    pub fn ready(&self) -> bool {
        self.cooldown == 0
    }

    /// In the terminal state
    pub fn is_dead(&self) -> bool {
        self.state == BehaviorState::Dead
    }

    /// Enter the terminal state
    pub fn kill(&mut self) {
        self.state = BehaviorState::Dead;
    }

    /// Override the state. `Dead` is terminal and cannot be left.
    pub fn force_state(&mut self, state: BehaviorState) {
        if self.state != BehaviorState::Dead {
            self.state = state;
        }
    }

    /// Enter `Attack` and start a cooldown
    pub fn launch_attack(&mut self, cooldown_ticks: u32) {
        if self.state != BehaviorState::Dead {
            self.state = BehaviorState::Attack;
            self.cooldown = cooldown_ticks;
        }
    }

    /// Run one tick of the pattern's transition rules
    pub fn step(&mut self, body: &mut Kinematics, senses: &Senses) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        if self.state == BehaviorState::Dead {
            return outcome;
        }

        self.cooldown = self.cooldown.saturating_sub(1);
        self.ticks = self.ticks.wrapping_add(1);

        let toward_x = signum_or_zero(senses.opponent.x - body.position.x);
        let can_strike = senses.in_attack_range() && self.ready();

        match self.pattern {
            MovementPattern::Patrol { min_x, max_x } => {
                if senses.in_aggro_range() {
                    self.state = BehaviorState::Chase;
                    body.velocity.x = toward_x * senses.speed;
                } else {
                    self.state = BehaviorState::Patrol;
                    self.patrol(body, min_x, max_x, senses.speed);
                }
            }
            MovementPattern::Chase => {
                if can_strike {
                    self.launch_attack(ATTACK_COOLDOWN_TICKS);
                    body.velocity.x = 0.0;
                    outcome.attack_launched = true;
                } else {
                    self.state = BehaviorState::Chase;
                    body.velocity.x = toward_x * senses.speed;
                }
            }
            MovementPattern::Flee => {
                if senses.in_aggro_range() {
                    self.state = BehaviorState::Flee;
                    body.velocity.x = -toward_x * senses.speed;
                } else {
                    self.state = BehaviorState::Idle;
                    body.velocity.x *= IDLE_FRICTION;
                }
            }
            MovementPattern::Stationary => {
                body.velocity.x = 0.0;
                if can_strike {
                    self.launch_attack(STATIONARY_ATTACK_COOLDOWN_TICKS);
                    outcome.attack_launched = true;
                } else {
                    self.state = BehaviorState::Idle;
                }
            }
            MovementPattern::Flying { min_x, max_x } => {
                if can_strike {
                    self.launch_attack(ATTACK_COOLDOWN_TICKS);
                    body.velocity = Vec2::ZERO;
                    outcome.attack_launched = true;
                } else if senses.in_aggro_range() {
                    self.state = BehaviorState::Chase;
                    body.velocity =
                        (senses.opponent - body.position).normalize_or_zero() * senses.speed;
                } else {
                    self.state = BehaviorState::Patrol;
                    self.patrol(body, min_x, max_x, senses.speed);
                    body.velocity.y = (self.ticks as f32 * HOVER_BOB_RATE).sin() * HOVER_BOB_AMPLITUDE;
                }
            }
            MovementPattern::Jumping { min_x, max_x } => {
                if can_strike {
                    self.launch_attack(ATTACK_COOLDOWN_TICKS);
                    body.velocity.x = 0.0;
                    outcome.attack_launched = true;
                } else if senses.in_aggro_range() {
                    self.state = BehaviorState::Chase;
                    body.velocity.x = toward_x * senses.speed;
                    if body.on_ground && self.ready() {
                        body.velocity.y = JUMP_IMPULSE;
                        body.on_ground = false;
                        self.cooldown = JUMP_COOLDOWN_TICKS;
                        outcome.jumped = true;
                    }
                } else {
                    self.state = BehaviorState::Patrol;
                    self.patrol(body, min_x, max_x, senses.speed);
                }
            }
        }

        outcome
    }

    /// Walk toward the current bound, turning around on reaching it
    fn patrol(&mut self, body: &mut Kinematics, min_x: f32, max_x: f32, speed: f32) {
        if body.position.x <= min_x {
            self.patrol_direction = 1.0;
        } else if body.position.x >= max_x {
            self.patrol_direction = -1.0;
        }
        body.velocity.x = self.patrol_direction * speed;
    }
}

/// Clamp horizontal speed and apply gravity to grounded archetypes in the air
pub fn apply_motion_limits(body: &mut Kinematics, speed_limit: f32, flying: bool) {
    let limit = speed_limit.max(0.0);
    body.velocity.x = if body.velocity.x.is_finite() {
        body.velocity.x.clamp(-limit, limit)
    } else {
        0.0
    };
    if !body.velocity.y.is_finite() {
        body.velocity.y = 0.0;
    }

    if !flying && !body.on_ground {
        body.velocity.y = (body.velocity.y + GRAVITY).min(MAX_FALL_SPEED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn senses(opponent: Vec2, from: Vec2) -> Senses {
        Senses {
            opponent,
            distance: from.distance(opponent),
            aggro_range: 200.0,
            attack_range: 40.0,
            speed: 3.0,
        }
    }

    /// Step with senses measured from the body's current position
    fn step(fsm: &mut BehaviorMachine, body: &mut Kinematics, opponent: Vec2) -> StepOutcome {
        let sensed = senses(opponent, body.position);
        fsm.step(body, &sensed)
    }

    #[test]
    fn test_patrol_walks_and_turns() {
        let mut fsm = BehaviorMachine::new(MovementPattern::Patrol {
            min_x: 50.0,
            max_x: 150.0,
        });
        let mut body = Kinematics::at(Vec2::new(100.0, 0.0));
        let far = Vec2::new(1000.0, 0.0);

        step(&mut fsm, &mut body, far);
        assert_eq!(fsm.state(), BehaviorState::Patrol);
        assert_eq!(body.velocity.x, 3.0);

        body.position.x = 150.0;
        step(&mut fsm, &mut body, far);
        assert_eq!(body.velocity.x, -3.0);

        body.position.x = 50.0;
        step(&mut fsm, &mut body, far);
        assert_eq!(body.velocity.x, 3.0);
    }

    #[test]
    fn test_patrol_chases_on_x_only() {
        let mut fsm = BehaviorMachine::new(MovementPattern::Patrol {
            min_x: 0.0,
            max_x: 500.0,
        });
        let mut body = Kinematics::at(Vec2::new(100.0, 100.0));
        step(&mut fsm, &mut body, Vec2::new(50.0, 0.0));
        assert_eq!(fsm.state(), BehaviorState::Chase);
        assert_eq!(body.velocity.x, -3.0);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn test_chase_attacks_then_cools_down() {
        let mut fsm = BehaviorMachine::new(MovementPattern::Chase);
        let mut body = Kinematics::at(Vec2::new(100.0, 0.0));
        let close = Vec2::new(120.0, 0.0);

        let outcome = step(&mut fsm, &mut body, close);
        assert!(outcome.attack_launched);
        assert_eq!(fsm.state(), BehaviorState::Attack);
        assert_eq!(fsm.cooldown(), ATTACK_COOLDOWN_TICKS);
        assert_eq!(body.velocity.x, 0.0);

        // Cooling down: keeps closing in
        let outcome = step(&mut fsm, &mut body, close);
        assert!(!outcome.attack_launched);
        assert_eq!(fsm.state(), BehaviorState::Chase);
        assert!(body.velocity.x > 0.0);
    }

    #[test]
    fn test_flee_runs_then_idles_with_friction() {
        let mut fsm = BehaviorMachine::new(MovementPattern::Flee);
        let mut body = Kinematics::at(Vec2::new(100.0, 0.0));

        step(&mut fsm, &mut body, Vec2::new(150.0, 0.0));
        assert_eq!(fsm.state(), BehaviorState::Flee);
        assert_eq!(body.velocity.x, -3.0);

        step(&mut fsm, &mut body, Vec2::new(900.0, 0.0));
        assert_eq!(fsm.state(), BehaviorState::Idle);
        assert!((body.velocity.x + 2.4).abs() < 1e-6);
    }

    #[test]
    fn test_stationary_never_moves() {
        let mut fsm = BehaviorMachine::new(MovementPattern::Stationary);
        let mut body = Kinematics::at(Vec2::new(0.0, 0.0));
        body.velocity.x = 5.0;

        let outcome = step(&mut fsm, &mut body, Vec2::new(10.0, 0.0));
        assert!(outcome.attack_launched);
        assert_eq!(fsm.cooldown(), STATIONARY_ATTACK_COOLDOWN_TICKS);
        assert_eq!(body.velocity.x, 0.0);

        step(&mut fsm, &mut body, Vec2::new(10.0, 0.0));
        assert_eq!(fsm.state(), BehaviorState::Idle);
    }

    #[test]
    fn test_flying_chases_in_both_axes() {
        let mut fsm = BehaviorMachine::new(MovementPattern::Flying {
            min_x: 0.0,
            max_x: 100.0,
        });
        let mut body = Kinematics::at(Vec2::new(0.0, 0.0));
        step(&mut fsm, &mut body, Vec2::new(60.0, 80.0));
        assert_eq!(fsm.state(), BehaviorState::Chase);
        assert!((body.velocity.x - 1.8).abs() < 1e-5);
        assert!((body.velocity.y - 2.4).abs() < 1e-5);
    }

    #[test]
    fn test_flying_hover_bobs() {
        let mut fsm = BehaviorMachine::new(MovementPattern::Flying {
            min_x: 0.0,
            max_x: 100.0,
        });
        let mut body = Kinematics::at(Vec2::new(50.0, 0.0));
        step(&mut fsm, &mut body, Vec2::new(5000.0, 0.0));
        assert_eq!(fsm.state(), BehaviorState::Patrol);
        assert!(body.velocity.y != 0.0);
        assert!(body.velocity.y.abs() <= HOVER_BOB_AMPLITUDE);
    }

    #[test]
    fn test_jumping_hops_when_grounded() {
        let mut fsm = BehaviorMachine::new(MovementPattern::Jumping {
            min_x: 0.0,
            max_x: 100.0,
        });
        let mut body = Kinematics::at(Vec2::new(0.0, 0.0));
        let outcome = step(&mut fsm, &mut body, Vec2::new(120.0, 0.0));
        assert!(outcome.jumped);
        assert_eq!(body.velocity.y, JUMP_IMPULSE);
        assert_eq!(fsm.cooldown(), JUMP_COOLDOWN_TICKS);

        // Airborne: no double jump
        let outcome = step(&mut fsm, &mut body, Vec2::new(120.0, 0.0));
        assert!(!outcome.jumped);
    }

    #[test]
    fn test_dead_is_terminal() {
        let mut fsm = BehaviorMachine::new(MovementPattern::Chase);
        fsm.kill();
        fsm.force_state(BehaviorState::Chase);
        fsm.launch_attack(10);
        let mut body = Kinematics::at(Vec2::ZERO);
        step(&mut fsm, &mut body, Vec2::new(10.0, 0.0));
        assert_eq!(fsm.state(), BehaviorState::Dead);
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_motion_limits() {
        let mut body = Kinematics::at(Vec2::ZERO);
        body.velocity = Vec2::new(9.0, 9.8);
        body.on_ground = false;
        apply_motion_limits(&mut body, 3.0, false);
        assert_eq!(body.velocity.x, 3.0);
        assert_eq!(body.velocity.y, MAX_FALL_SPEED);

        let mut flyer = Kinematics::at(Vec2::ZERO);
        flyer.velocity = Vec2::new(-9.0, 1.0);
        flyer.on_ground = false;
        apply_motion_limits(&mut flyer, 3.0, true);
        assert_eq!(flyer.velocity, Vec2::new(-3.0, 1.0));
    }

    #[test]
    fn test_unknown_names_fall_back() {
        assert_eq!(BehaviorState::from_name("dancing"), BehaviorState::Idle);
        assert_eq!(BehaviorState::from_index(200), BehaviorState::Idle);
        assert_eq!(
            MovementPattern::from_name("teleport", 0.0, 1.0),
            MovementPattern::Stationary
        );
        assert_eq!(
            MovementPattern::from_name("Patrol", 0.0, 1.0),
            MovementPattern::Patrol { min_x: 0.0, max_x: 1.0 }
        );
    }
}
