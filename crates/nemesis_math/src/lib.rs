//! # nemesis_math - 2D Math Primitives
//!
//! Plain value types shared by the decision engine and its collaborators.
//! Positions and velocities are screen-space: +X right, +Y down.

pub mod vector;
pub mod bounds;

pub use vector::*;
pub use bounds::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const TAU: f32 = PI * 2.0;
    pub const FRAC_PI_2: f32 = PI / 2.0;
    pub const EPSILON: f32 = 1e-6;
}

/// Exponential moving average: `old * (1 - weight) + sample * weight`
#[inline]
pub fn ema(old: f32, sample: f32, weight: f32) -> f32 {
    old * (1.0 - weight) + sample * weight
}

/// Sign of `v` as -1, 0 or +1. Zero stays zero so callers get a no-op step.
#[inline]
pub fn signum_or_zero(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}
