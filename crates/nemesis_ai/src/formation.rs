//! Formation shapes and slot geometry
//!
//! A formation turns a [`FormationFrame`] into one target position per
//! member, in member order. Shapes centered on the opponent (Circle, Pincer)
//! ignore the anchor; the rest are laid out around it.

use crate::group::GroupState;
use nemesis_math::{consts, Vec2};
use serde::{Deserialize, Serialize};

pub const LINE_SPACING: f32 = 80.0;
pub const LINE_DEPTH: f32 = 100.0;
pub const CIRCLE_RADIUS: f32 = 120.0;
pub const PINCER_OFFSET: f32 = 150.0;
pub const PINCER_STAGGER: f32 = 60.0;
pub const V_APEX_DEPTH: f32 = 100.0;
pub const V_WING_SPREAD: f32 = 60.0;
pub const V_WING_DEPTH: f32 = 40.0;
pub const SCATTER_BASE_RADIUS: f32 = 80.0;
pub const SCATTER_RADIUS_STEP: f32 = 40.0;
/// Spiral angle per member, in multiples of PI
const SCATTER_TURN: f32 = 1.618;

/// Geometric arrangement assigned to a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formation {
    #[default]
    None,
    Line,
    Circle,
    Pincer,
    V,
    Scattered,
}

impl Formation {
    /// Policy table keyed by group state and member count
    pub fn select(state: GroupState, member_count: usize) -> Self {
        match state {
            GroupState::Engaging if member_count >= 4 => Self::Circle,
            GroupState::Engaging if member_count >= 2 => Self::Pincer,
            GroupState::Engaging => Self::None,
            GroupState::Regrouping => Self::Line,
            GroupState::Patrol if member_count >= 3 => Self::V,
            GroupState::Patrol => Self::Line,
            GroupState::Idle | GroupState::Retreating => Self::None,
        }
    }

    /// Decode a wire index; unknown values map to `None`
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => Self::None,
            1 => Self::Line,
            2 => Self::Circle,
            3 => Self::Pincer,
            4 => Self::V,
            5 => Self::Scattered,
            other => {
                log::warn!("Unknown formation index {}, using none", other);
                Self::None
            }
        }
    }

    /// Parse a name; unknown names map to `None`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "none" => Self::None,
            "line" => Self::Line,
            "circle" => Self::Circle,
            "pincer" => Self::Pincer,
            "v" => Self::V,
            "scattered" => Self::Scattered,
            other => {
                log::warn!("Unknown formation '{}', using none", other);
                Self::None
            }
        }
    }

    /// Config and report tag
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Line => "line",
            Self::Circle => "circle",
            Self::Pincer => "pincer",
            Self::V => "v",
            Self::Scattered => "scattered",
        }
    }

    /// No shape assigned
    pub fn is_none(self) -> bool {
        self == Self::None
    }
}

impl std::fmt::Display for Formation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reference frame a formation is laid out in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationFrame {
    pub opponent: Vec2,
    /// Point the group lines up around
    pub anchor: Vec2,
    /// +1 when the opponent is below the group, -1 otherwise
    pub forward: f32,
    /// Position of the leader in member order, if any
    pub leader_index: Option<usize>,
}

/// Target position for each of `count` members, in member order
pub fn slots(formation: Formation, frame: &FormationFrame, count: usize) -> Vec<Vec2> {
    match formation {
        Formation::None => Vec::new(),
        Formation::Line => line(frame, count),
        Formation::Circle => circle(frame.opponent, count),
        Formation::Pincer => pincer(frame.opponent, count),
        Formation::V => v_shape(frame, count),
        Formation::Scattered => scattered(frame.anchor, count),
    }
}

fn line(frame: &FormationFrame, count: usize) -> Vec<Vec2> {
    let y = frame.anchor.y - frame.forward * LINE_DEPTH;
    let center = (count as f32 - 1.0) / 2.0;
    (0..count)
        .map(|i| Vec2::new(frame.anchor.x + (i as f32 - center) * LINE_SPACING, y))
        .collect()
}

fn circle(center: Vec2, count: usize) -> Vec<Vec2> {
    if count == 0 {
        return Vec::new();
    }
    let step = consts::TAU / count as f32;
    (0..count)
        .map(|i| center + Vec2::from_angle(i as f32 * step) * CIRCLE_RADIUS)
        .collect()
}

fn pincer(opponent: Vec2, count: usize) -> Vec<Vec2> {
    let half = (count + 1) / 2;
    (0..count)
        .map(|i| {
            let (side, rank) = if i < half { (-1.0, i) } else { (1.0, i - half) };
            Vec2::new(
                opponent.x + side * PINCER_OFFSET,
                opponent.y + rank as f32 * PINCER_STAGGER,
            )
        })
        .collect()
}

fn v_shape(frame: &FormationFrame, count: usize) -> Vec<Vec2> {
    let apex = frame.anchor + Vec2::new(0.0, frame.forward * V_APEX_DEPTH);
    let leader = frame.leader_index.filter(|&i| i < count).unwrap_or(0);

    let mut out = vec![apex; count];
    let mut wing = 0usize;
    for (i, slot) in out.iter_mut().enumerate() {
        if i == leader {
            continue;
        }
        wing += 1;
        let pair = ((wing + 1) / 2) as f32;
        let side = if wing % 2 == 1 { -1.0 } else { 1.0 };
        *slot = apex
            + Vec2::new(
                side * V_WING_SPREAD * pair,
                -frame.forward * V_WING_DEPTH * pair,
            );
    }
    out
}

fn scattered(anchor: Vec2, count: usize) -> Vec<Vec2> {
    (0..count)
        .map(|i| {
            let angle = i as f32 * SCATTER_TURN * consts::PI;
            let radius = SCATTER_BASE_RADIUS + SCATTER_RADIUS_STEP * (i % 3) as f32;
            anchor + Vec2::from_angle(angle) * radius
        })
        .collect()
}
