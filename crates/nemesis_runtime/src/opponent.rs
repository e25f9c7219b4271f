//! Scripted stand-in for the player
//!
//! Walks a waypoint loop and fires jump / attack / dash flags on fixed
//! periods. After each engine tick it resolves combat both ways: its own
//! attacks damage the nearest actor in reach, and actors that launched an
//! attack land it if their hitbox overlaps the opponent's, unless the
//! opponent dashed out of it.

use crate::config::OpponentScript;
use crate::error::Result;
use nemesis_ai::prelude::*;
use nemesis_math::{Aabb2, Vec2};
use serde::Serialize;

/// Running totals for the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CombatStats {
    pub attacks_made: u32,
    pub hits_dealt: u32,
    pub damage_dealt: f32,
    pub hits_taken: u32,
    pub damage_taken: f32,
    pub evasions: u32,
}

#[derive(Debug, Clone)]
pub struct Opponent {
    script: OpponentScript,
    position: Vec2,
    waypoint: usize,
    tick: u32,
    stats: CombatStats,
}

impl Opponent {
    /// Start at the first waypoint
    pub fn new(script: OpponentScript) -> Self {
        let position = script.waypoints.first().copied().unwrap_or(Vec2::ZERO);
        Self {
            script,
            position,
            waypoint: 0,
            tick: 0,
            stats: CombatStats::default(),
        }
    }

    /// Current position
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Running combat totals
    pub fn stats(&self) -> CombatStats {
        self.stats
    }

    /// Square hitbox
    pub fn bounds(&self) -> Aabb2 {
        Aabb2::square(self.position, self.script.size)
    }

    /// Advance one tick and report what the engine should observe
    pub fn step(&mut self) -> Observation {
        self.tick = self.tick.wrapping_add(1);
        self.walk();

        let mut observation = Observation::at(self.position.x, self.position.y);
        if fires(self.tick, self.script.jump_every) {
            observation = observation.with_jump();
        }
        if fires(self.tick, self.script.attack_every) {
            observation = observation.with_attack();
        }
        if fires(self.tick, self.script.dash_every) {
            observation = observation.with_dash();
        }
        observation
    }

    fn walk(&mut self) {
        let count = self.script.waypoints.len();
        if count == 0 {
            return;
        }
        let target = self.script.waypoints[self.waypoint % count];
        let offset = target - self.position;
        if offset.length() <= self.script.speed {
            self.position = target;
            self.waypoint = (self.waypoint + 1) % count;
        } else {
            self.position += offset.normalize_or_zero() * self.script.speed;
        }
    }

    /// Settle this tick's attacks in both directions
    pub fn resolve(
        &mut self,
        encounter: &mut Encounter,
        observation: &Observation,
        events: &[(ActorHandle, ActorEvent)],
    ) -> Result<()> {
        if observation.attacked {
            self.stats.attacks_made += 1;
            if let Some(target) = self.nearest_in_reach(encounter) {
                encounter.damage_actor(target, self.script.damage)?;
                self.stats.hits_dealt += 1;
                self.stats.damage_dealt += self.script.damage;
            }
        }

        let hitbox = self.bounds();
        for &(handle, event) in events {
            let ActorEvent::AttackLaunched { damage } = event else {
                continue;
            };
            let Some(actor) = encounter.actor_mut(handle) else {
                continue;
            };
            if observation.dashed {
                actor.record_evasion();
                self.stats.evasions += 1;
            } else if actor.bounds().intersects(&hitbox) {
                let distance = actor.position().distance(self.position);
                actor.record_successful_hit(distance);
                self.stats.hits_taken += 1;
                self.stats.damage_taken += damage;
            }
        }
        Ok(())
    }

    fn nearest_in_reach(&self, encounter: &Encounter) -> Option<ActorHandle> {
        encounter
            .actors()
            .filter(|(_, actor)| !actor.is_dead())
            .map(|(handle, actor)| (handle, actor.position().distance(self.position)))
            .filter(|&(_, distance)| distance <= self.script.attack_range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(handle, _)| handle)
    }
}

fn fires(tick: u32, period: u32) -> bool {
    period > 0 && tick % period == 0
}
