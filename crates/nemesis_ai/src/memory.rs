//! Adaptive memory of the opponent's behavior
//!
//! Each actor owns one [`Memory`]. It watches the opponent every tick and
//! learns a handful of smoothed parameters from what it sees:
//!
//! - movement speed and jump / attack / dash frequencies (EMAs)
//! - a skill estimate derived from those frequencies
//! - the engagement distance at which this actor lands hits
//! - a retreat threshold that rises once the actor has been hurt enough
//!
//! All EMAs are folded per observation, never per wall-clock second, so the
//! same observation stream always produces the same model.

use crate::config::TICK_RATE;
use crate::tactics::{self, TacticalInputs, TacticalState};
use nemesis_math::{ema, Vec2};
use std::collections::VecDeque;

/// Opponent positions kept for speed estimation and prediction
pub const HISTORY_CAPACITY: usize = 20;

/// Retreat threshold of a fresh memory
pub const BASE_RETREAT_THRESHOLD: f32 = 0.3;

/// Ceiling for the learned retreat threshold
pub const MAX_RETREAT_THRESHOLD: f32 = 0.7;

/// Engagement distance assumed before any hit has landed
pub const DEFAULT_ENGAGEMENT_DISTANCE: f32 = 80.0;

const SPEED_WEIGHT: f32 = 0.1;
const ACTION_WEIGHT: f32 = 0.05;
const SKILL_LEARNING_RATE: f32 = 0.05;
const ENGAGEMENT_WEIGHT: f32 = 0.1;
const RETREAT_STEP: f32 = 0.01;
const RETREAT_DAMAGE_TRIGGER: f32 = 50.0;
const SPEED_NORMALIZER: f32 = 10.0;
const FULL_CONFIDENCE_OBSERVATIONS: f32 = 100.0;

/// What the game loop reports about the opponent for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Observation {
    /// Opponent position
    pub position: Vec2,
    /// Opponent jumped this tick
    pub jumped: bool,
    /// Opponent attacked this tick
    pub attacked: bool,
    /// Opponent dashed this tick
    pub dashed: bool,
}

impl Observation {
    /// Observation with no action flags set
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            ..Default::default()
        }
    }

    /// Mark a jump
    pub fn with_jump(mut self) -> Self {
        self.jumped = true;
        self
    }

    /// Mark an attack
    pub fn with_attack(mut self) -> Self {
        self.attacked = true;
        self
    }

    /// Mark a dash
    pub fn with_dash(mut self) -> Self {
        self.dashed = true;
        self
    }
}

/// Learned model of the opponent, owned by exactly one actor
#[derive(Debug, Clone)]
pub struct Memory {
    history: VecDeque<Vec2>,
    /// Velocity between the last two samples, units per second
    last_velocity: Vec2,
    /// Smoothed opponent speed, units per tick
    speed: f32,
    jump_frequency: f32,
    attack_frequency: f32,
    dash_frequency: f32,
    damage_received: f32,
    hits_landed: u32,
    evasions: u32,
    preferred_engagement_distance: f32,
    retreat_threshold: f32,
    skill_estimate: f32,
    confidence: f32,
    observations: u32,
}

impl Memory {
    /// Fresh memory with base thresholds
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(HISTORY_CAPACITY + 1),
            last_velocity: Vec2::ZERO,
            speed: 0.0,
            jump_frequency: 0.0,
            attack_frequency: 0.0,
            dash_frequency: 0.0,
            damage_received: 0.0,
            hits_landed: 0,
            evasions: 0,
            preferred_engagement_distance: DEFAULT_ENGAGEMENT_DISTANCE,
            retreat_threshold: BASE_RETREAT_THRESHOLD,
            skill_estimate: 0.0,
            confidence: 0.0,
            observations: 0,
        }
    }

    /// Fold one tick of opponent observation into the model.
    ///
    /// `delta_time` is the sample spacing in seconds; speed is normalized to
    /// units per fixed tick so the skill formula is rate independent.
    pub fn update(&mut self, observation: &Observation, delta_time: f32) {
        let position = observation.position;
        if !position.is_finite() {
            log::warn!("Ignoring non-finite opponent position {:?}", position);
            return;
        }

        self.history.push_back(position);
        while self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }

        if let Some(previous) = self.previous_position() {
            let dt = if delta_time > 0.0 && delta_time.is_finite() {
                delta_time
            } else {
                1.0 / TICK_RATE
            };
            let displacement = position - previous;
            self.last_velocity = displacement / dt;
            let per_tick = displacement.length() / (dt * TICK_RATE);
            self.speed = ema(self.speed, per_tick, SPEED_WEIGHT).max(0.0);
        }

        self.jump_frequency = fold_flag(self.jump_frequency, observation.jumped);
        self.attack_frequency = fold_flag(self.attack_frequency, observation.attacked);
        self.dash_frequency = fold_flag(self.dash_frequency, observation.dashed);

        let sample = 0.4 * self.attack_frequency
            + 0.3 * self.dash_frequency
            + 0.3 * (self.speed / SPEED_NORMALIZER).min(1.0);
        self.skill_estimate = ema(self.skill_estimate, sample, SKILL_LEARNING_RATE).clamp(0.0, 1.0);

        self.observations = self.observations.saturating_add(1);
        self.confidence = (self.observations as f32 / FULL_CONFIDENCE_OBSERVATIONS).min(1.0);

        log::trace!(
            "Memory: speed={:.2} skill={:.3} confidence={:.2}",
            self.speed,
            self.skill_estimate,
            self.confidence
        );
    }

    /// Record the outcome of a combat exchange
    pub fn record_combat_event(
        &mut self,
        hit_opponent: bool,
        took_damage: bool,
        damage_amount: f32,
        distance: f32,
    ) {
        if hit_opponent {
            self.hits_landed = self.hits_landed.saturating_add(1);
            if distance.is_finite() && distance >= 0.0 {
                self.preferred_engagement_distance =
                    ema(self.preferred_engagement_distance, distance, ENGAGEMENT_WEIGHT);
            }
        }

        if took_damage {
            if damage_amount.is_finite() {
                self.damage_received += damage_amount.max(0.0);
            }
            if self.damage_received > RETREAT_DAMAGE_TRIGGER {
                self.retreat_threshold =
                    (self.retreat_threshold + RETREAT_STEP).min(MAX_RETREAT_THRESHOLD);
            }
        }
    }

    /// Record that the opponent avoided one of this actor's attacks
    pub fn record_evasion(&mut self) {
        self.evasions = self.evasions.saturating_add(1);
    }

    /// Extrapolate the opponent `delta_time` seconds ahead.
    ///
    /// The extrapolation is scaled by confidence, so an actor that has seen
    /// little of the opponent trusts its last sample more than the trend.
    pub fn predict_player_position(&self, delta_time: f32) -> Vec2 {
        let last = self.last_known_position().unwrap_or(Vec2::ZERO);
        if self.history.len() < 2 || !delta_time.is_finite() {
            return last;
        }
        last + self.last_velocity * (delta_time * self.confidence)
    }

    /// Derive this tick's tactical mode
    pub fn tactical_state(
        &self,
        health_fraction: f32,
        has_allies: bool,
        distance: f32,
    ) -> TacticalState {
        tactics::decide(
            self,
            TacticalInputs {
                health_fraction,
                has_allies,
                distance,
            },
        )
    }

    /// Most recent opponent sample
    pub fn last_known_position(&self) -> Option<Vec2> {
        self.history.back().copied()
    }

    fn previous_position(&self) -> Option<Vec2> {
        let len = self.history.len();
        if len >= 2 {
            self.history.get(len - 2).copied()
        } else {
            None
        }
    }

    /// Number of stored opponent samples (never more than [`HISTORY_CAPACITY`])
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Smoothed opponent speed, units per tick
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Smoothed jumps per observation
    pub fn jump_frequency(&self) -> f32 {
        self.jump_frequency
    }

    /// Smoothed attacks per observation
    pub fn attack_frequency(&self) -> f32 {
        self.attack_frequency
    }

    /// Smoothed dashes per observation
    pub fn dash_frequency(&self) -> f32 {
        self.dash_frequency
    }

    /// Cumulative damage taken
    pub fn damage_received(&self) -> f32 {
        self.damage_received
    }

    /// Attacks that connected
    pub fn hits_landed(&self) -> u32 {
        self.hits_landed
    }

    /// Attacks the opponent avoided
    pub fn evasions(&self) -> u32 {
        self.evasions
    }

    /// Learned distance of successful hits
    pub fn preferred_engagement_distance(&self) -> f32 {
        self.preferred_engagement_distance
    }

    /// Health fraction below which the actor withdraws
    pub fn retreat_threshold(&self) -> f32 {
        self.retreat_threshold
    }

    /// Opponent skill in [0, 1]
    pub fn player_skill_estimate(&self) -> f32 {
        self.skill_estimate
    }

    /// Trust in the model, in [0, 1]
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Observations folded so far
    pub fn observations(&self) -> u32 {
        self.observations
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

fn fold_flag(frequency: f32, happened: bool) -> f32 {
    let sample = if happened { 1.0 } else { 0.0 };
    ema(frequency, sample, ACTION_WEIGHT).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_history_is_bounded() {
        let mut memory = Memory::new();
        for i in 0..50 {
            memory.update(&Observation::at(i as f32, 0.0), DT);
            assert!(memory.history_len() <= HISTORY_CAPACITY);
        }
        assert_eq!(memory.history_len(), HISTORY_CAPACITY);
        assert_eq!(memory.last_known_position(), Some(Vec2::new(49.0, 0.0)));
    }

    #[test]
    fn test_speed_ema() {
        let mut memory = Memory::new();
        memory.update(&Observation::at(0.0, 0.0), DT);
        assert_eq!(memory.speed(), 0.0);

        // 5 units in one tick
        memory.update(&Observation::at(3.0, 4.0), DT);
        assert_relative_eq!(memory.speed(), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_speed_is_per_tick_regardless_of_sample_spacing() {
        let mut fine = Memory::new();
        fine.update(&Observation::at(0.0, 0.0), DT);
        fine.update(&Observation::at(4.0, 0.0), DT);

        // Same opponent speed, sampled half as often
        let mut coarse = Memory::new();
        coarse.update(&Observation::at(0.0, 0.0), 2.0 * DT);
        coarse.update(&Observation::at(8.0, 0.0), 2.0 * DT);

        assert_relative_eq!(fine.speed(), coarse.speed(), epsilon = 1e-5);
    }

    #[test]
    fn test_action_frequencies_rise_and_decay() {
        let mut memory = Memory::new();
        memory.update(&Observation::at(0.0, 0.0).with_attack().with_dash(), DT);
        assert_relative_eq!(memory.attack_frequency(), 0.05);
        assert_relative_eq!(memory.dash_frequency(), 0.05);
        assert_eq!(memory.jump_frequency(), 0.0);

        memory.update(&Observation::at(0.0, 0.0), DT);
        assert_relative_eq!(memory.attack_frequency(), 0.0475, epsilon = 1e-6);
    }

    #[test]
    fn test_skill_estimate_stays_in_unit_range() {
        let mut memory = Memory::new();
        for i in 0..2000 {
            let obs = Observation::at((i * 50) as f32, 0.0)
                .with_attack()
                .with_dash()
                .with_jump();
            memory.update(&obs, DT);
        }
        let skill = memory.player_skill_estimate();
        assert!(skill > 0.9 && skill <= 1.0, "skill = {}", skill);
    }

    #[test]
    fn test_confidence_grows_to_one() {
        let mut memory = Memory::new();
        for _ in 0..50 {
            memory.update(&Observation::at(0.0, 0.0), DT);
        }
        assert_relative_eq!(memory.confidence(), 0.5);
        for _ in 0..100 {
            memory.update(&Observation::at(0.0, 0.0), DT);
        }
        assert_eq!(memory.confidence(), 1.0);
        assert_eq!(memory.observations(), 150);
    }

    #[test]
    fn test_non_finite_observation_is_ignored() {
        let mut memory = Memory::new();
        memory.update(&Observation::at(f32::NAN, 0.0), DT);
        assert_eq!(memory.history_len(), 0);
        assert_eq!(memory.observations(), 0);
    }

    #[test]
    fn test_damage_raises_retreat_threshold() {
        let mut memory = Memory::new();
        memory.record_combat_event(false, true, 60.0, 0.0);
        assert_eq!(memory.damage_received(), 60.0);
        assert!(memory.retreat_threshold() > BASE_RETREAT_THRESHOLD);
    }

    #[test]
    fn test_small_damage_keeps_base_threshold() {
        let mut memory = Memory::new();
        for _ in 0..5 {
            memory.record_combat_event(false, true, 10.0, 0.0);
        }
        assert_eq!(memory.damage_received(), 50.0);
        assert_eq!(memory.retreat_threshold(), BASE_RETREAT_THRESHOLD);
    }

    #[test]
    fn test_retreat_threshold_ceiling() {
        let mut memory = Memory::new();
        let mut previous = memory.retreat_threshold();
        for _ in 0..200 {
            memory.record_combat_event(false, true, 30.0, 0.0);
            assert!(memory.retreat_threshold() >= previous);
            previous = memory.retreat_threshold();
        }
        assert_abs_diff_eq!(memory.retreat_threshold(), MAX_RETREAT_THRESHOLD);
    }

    #[test]
    fn test_hits_learn_engagement_distance() {
        let mut memory = Memory::new();
        memory.record_combat_event(true, false, 0.0, 30.0);
        assert_eq!(memory.hits_landed(), 1);
        assert_relative_eq!(memory.preferred_engagement_distance(), 75.0);
    }

    #[test]
    fn test_predict_with_single_sample_returns_last() {
        let mut memory = Memory::new();
        assert_eq!(memory.predict_player_position(1.0), Vec2::ZERO);

        memory.update(&Observation::at(10.0, 20.0), DT);
        assert_eq!(memory.predict_player_position(1.0), Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_prediction_is_gated_by_confidence() {
        let mut memory = Memory::new();
        memory.update(&Observation::at(0.0, 0.0), DT);
        memory.update(&Observation::at(1.0, 0.0), DT);

        // 60 units/s, confidence 0.02 after two observations
        let predicted = memory.predict_player_position(1.0);
        assert_relative_eq!(predicted.x, 1.0 + 60.0 * 0.02, epsilon = 1e-4);
        assert_eq!(predicted.y, 0.0);
    }
}
