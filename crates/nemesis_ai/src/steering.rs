//! Steering helpers
//!
//! Direct steering only: every helper turns a target point into a velocity
//! without any search. Zero-length directions produce a zero step.

use crate::behavior::Kinematics;
use nemesis_math::{signum_or_zero, Vec2};

/// Displacement below which a formation slot counts as reached
pub const FORMATION_DEADZONE: f32 = 30.0;
/// Blend factor toward the formation velocity
pub const FORMATION_BLEND: f32 = 0.3;

/// Horizontal velocity toward `target`
#[inline]
pub fn seek_x(position: Vec2, target: Vec2, speed: f32) -> f32 {
    signum_or_zero(target.x - position.x) * speed
}

/// Horizontal velocity away from `threat`
#[inline]
pub fn flee_x(position: Vec2, threat: Vec2, speed: f32) -> f32 {
    -seek_x(position, threat, speed)
}

/// Full 2D velocity toward `target`
#[inline]
pub fn seek(position: Vec2, target: Vec2, speed: f32) -> Vec2 {
    (target - position).normalize_or_zero() * speed
}

/// `current * (1 - k) + desired * k`
#[inline]
pub fn blend(current: f32, desired: f32, k: f32) -> f32 {
    current * (1.0 - k) + desired * k
}

/// Nudge the velocity toward a formation slot.
///
/// Ground actors only consider the X axis; gravity owns their Y. Returns
/// whether any blending happened.
pub fn follow_formation_slot(body: &mut Kinematics, slot: Vec2, speed: f32, flying: bool) -> bool {
    let mut offset = slot - body.position;
    if !flying {
        offset.y = 0.0;
    }
    if !offset.is_finite() || offset.length() <= FORMATION_DEADZONE {
        return false;
    }

    let desired = offset.normalize_or_zero() * speed;
    body.velocity.x = blend(body.velocity.x, desired.x, FORMATION_BLEND);
    if flying {
        body.velocity.y = blend(body.velocity.y, desired.y, FORMATION_BLEND);
    }
    true
}
