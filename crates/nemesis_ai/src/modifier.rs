//! Tactical behavior modifier
//!
//! Layers the tick's [`TacticalState`] over the base state machine. Range
//! adjustments are applied before the machine steps so they shape this
//! tick's transitions; steering overrides are applied after it.
//!
//! Stationary actors keep their range adjustments but never receive a
//! steering override.

use crate::behavior::{BehaviorMachine, BehaviorState, Kinematics};
use crate::group::GroupSnapshot;
use crate::steering::{flee_x, seek, seek_x};
use crate::tactics::TacticalState;
use nemesis_math::{consts, Vec2};

pub const AGGRESSIVE_AGGRO_SCALE: f32 = 1.2;
pub const DEFENSIVE_AGGRO_SCALE: f32 = 0.8;
pub const DEFENSIVE_ATTACK_SCALE: f32 = 1.3;
/// Radius of the flank point around the opponent
pub const FLANK_RADIUS: f32 = 100.0;
/// How far ahead (seconds) the flank point leads the opponent
pub const FLANK_LOOKAHEAD: f32 = 0.25;
pub const KITING_COOLDOWN_TICKS: u32 = 45;
/// Kiting backs off inside this multiple of the attack range
pub const KITING_BAND: f32 = 1.5;
pub const RETREAT_SPEED_SCALE: f32 = 1.2;

/// Effective engagement ranges for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranges {
    pub aggro: f32,
    pub attack: f32,
}

/// Scale the configured ranges for this tick's tactic
pub fn adjust_ranges(tactic: TacticalState, base: Ranges) -> Ranges {
    match tactic {
        TacticalState::Aggressive => Ranges {
            aggro: base.aggro * AGGRESSIVE_AGGRO_SCALE,
            attack: base.attack,
        },
        TacticalState::Defensive => Ranges {
            aggro: base.aggro * DEFENSIVE_AGGRO_SCALE,
            attack: base.attack * DEFENSIVE_ATTACK_SCALE,
        },
        _ => base,
    }
}

/// Everything the steering overrides read
#[derive(Debug, Clone, Copy)]
pub struct TacticalContext<'a> {
    pub tactic: TacticalState,
    pub opponent: Vec2,
    /// Opponent position predicted [`FLANK_LOOKAHEAD`] seconds ahead
    pub predicted_opponent: Vec2,
    pub distance: f32,
    pub ranges: Ranges,
    pub speed: f32,
    pub group: Option<&'a GroupSnapshot>,
}

/// Side effects of the override
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModifierOutcome {
    /// Multiplier on the actor's speed limit for this tick
    pub speed_scale: f32,
    pub attack_launched: bool,
}

impl Default for ModifierOutcome {
    fn default() -> Self {
        Self {
            speed_scale: 1.0,
            attack_launched: false,
        }
    }
}

/// Apply the steering override for `ctx.tactic`
pub fn apply(
    machine: &mut BehaviorMachine,
    body: &mut Kinematics,
    ctx: &TacticalContext<'_>,
) -> ModifierOutcome {
    let mut outcome = ModifierOutcome::default();
    if machine.is_dead() || machine.pattern().is_stationary() {
        return outcome;
    }

    let position = body.position;
    let flying = machine.pattern().is_flying();
    match ctx.tactic {
        TacticalState::Normal | TacticalState::Defensive => {}
        TacticalState::Aggressive => {
            if ctx.distance < ctx.ranges.aggro && machine.state() != BehaviorState::Attack {
                machine.force_state(BehaviorState::Chase);
                body.velocity.x = seek_x(position, ctx.opponent, ctx.speed);
            }
        }
        TacticalState::Flanking => {
            // Grouped actors get their flank from the formation
            if ctx.group.is_some_and(|g| g.is_multi_member()) {
                return outcome;
            }
            let target = flank_point(ctx.predicted_opponent, position);
            body.velocity.x = seek_x(position, target, ctx.speed);
        }
        TacticalState::Kiting => {
            if ctx.distance < ctx.ranges.attack && machine.ready() {
                machine.launch_attack(KITING_COOLDOWN_TICKS);
                body.velocity.x = 0.0;
                outcome.attack_launched = true;
            } else if ctx.distance < ctx.ranges.attack * KITING_BAND
                && machine.state() != BehaviorState::Attack
            {
                machine.force_state(BehaviorState::Flee);
                steer_away(body, ctx.opponent, ctx.speed, flying);
            }
        }
        TacticalState::Retreating => {
            machine.force_state(BehaviorState::Flee);
            steer_away(body, ctx.opponent, ctx.speed * RETREAT_SPEED_SCALE, flying);
            outcome.speed_scale = RETREAT_SPEED_SCALE;
        }
        TacticalState::Regrouping => {
            let rally = ctx
                .group
                .filter(|g| g.is_multi_member() && g.has_alive_majority())
                .and_then(|g| g.centroid);
            if let Some(centroid) = rally {
                body.velocity.x = seek_x(position, centroid, ctx.speed);
            }
        }
    }

    outcome
}

/// Flyers leave in both axes; ground actors only on X
fn steer_away(body: &mut Kinematics, threat: Vec2, speed: f32, flying: bool) {
    if flying {
        body.velocity = -seek(body.position, threat, speed);
    } else {
        body.velocity.x = flee_x(body.position, threat, speed);
    }
}

/// Point at [`FLANK_RADIUS`] from the opponent, a quarter turn from the
/// opponent-to-actor bearing
pub fn flank_point(opponent: Vec2, position: Vec2) -> Vec2 {
    let bearing = (position - opponent).angle() + consts::FRAC_PI_2;
    opponent + Vec2::from_angle(bearing) * FLANK_RADIUS
}
