//! Runtime enemy instance
//!
//! An [`Actor`] owns its kinematics, health, behavior machine and memory.
//! Group membership is a handle only, and the formation target is written
//! by the group coordinator, never by the actor itself.
//!
//! One [`Actor::update`] runs the whole per-tick pipeline:
//!
//! 1. fold the observation into memory
//! 2. derive the tactical mode and this tick's ranges
//! 3. step the base behavior machine
//! 4. apply the tactical steering override
//! 5. blend toward the formation slot
//! 6. clamp velocity and apply gravity

use crate::behavior::{
    apply_motion_limits, BehaviorMachine, BehaviorState, Kinematics, MovementPattern, Senses,
};
use crate::config::ActorConfig;
use crate::error::Result;
use crate::events::ActorEvent;
use crate::group::{GroupHandle, GroupSnapshot};
use crate::memory::{Memory, Observation};
use crate::modifier::{self, adjust_ranges, Ranges, TacticalContext, FLANK_LOOKAHEAD};
use crate::steering::follow_formation_slot;
use crate::tactics::TacticalState;
use nemesis_core::Handle;
use nemesis_math::{Aabb2, Vec2};

/// Handle to an actor stored in an encounter
pub type ActorHandle = Handle<Actor>;

/// Runtime enemy instance
#[derive(Debug, Clone)]
pub struct Actor {
    config: ActorConfig,
    body: Kinematics,
    health: f32,
    machine: BehaviorMachine,
    memory: Memory,
    tactic: TacticalState,
    ranges: Ranges,
    group: Option<GroupHandle>,
    formation_target: Option<Vec2>,
    /// Distance to the opponent at the last update
    last_distance: f32,
    /// Events raised outside `update`, flushed by the next one
    pending: Vec<ActorEvent>,
}

impl Actor {
    /// Build an actor at its configured spawn point
    pub fn new(config: ActorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            body: Kinematics::at(config.spawn),
            health: config.max_health,
            machine: BehaviorMachine::new(config.pattern),
            memory: Memory::new(),
            tactic: TacticalState::Normal,
            ranges: Ranges {
                aggro: config.aggro_range,
                attack: config.attack_range,
            },
            group: None,
            formation_target: None,
            last_distance: f32::INFINITY,
            pending: Vec::new(),
            config,
        })
    }

    /// Run one tick against the observed opponent.
    ///
    /// `group` is the snapshot published by the actor's group this tick, or
    /// `None` for a lone actor. Dead actors do nothing beyond flushing
    /// pending events.
    pub fn update(
        &mut self,
        observation: &Observation,
        group: Option<&GroupSnapshot>,
        delta_time: f32,
    ) -> Vec<ActorEvent> {
        let mut events = std::mem::take(&mut self.pending);
        if self.machine.is_dead() {
            // Corpses drop to the ground
            apply_motion_limits(&mut self.body, 0.0, false);
            return events;
        }

        let flying = self.is_flying();
        self.memory.update(observation, delta_time);
        let opponent = if observation.position.is_finite() {
            observation.position
        } else {
            match self.memory.last_known_position() {
                Some(last) => last,
                None => {
                    apply_motion_limits(&mut self.body, self.config.speed, flying);
                    return events;
                }
            }
        };
        let distance = self.body.position.distance(opponent);
        self.last_distance = distance;

        let has_allies = group.is_some_and(GroupSnapshot::has_allies);
        let tactic = self
            .memory
            .tactical_state(self.health_fraction(), has_allies, distance);
        if tactic != self.tactic {
            log::debug!("{}: tactic {} -> {}", self.config.name, self.tactic, tactic);
            events.push(ActorEvent::TacticChanged {
                from: self.tactic,
                to: tactic,
            });
            self.tactic = tactic;
        }
        self.ranges = adjust_ranges(
            tactic,
            Ranges {
                aggro: self.config.aggro_range,
                attack: self.config.attack_range,
            },
        );

        let previous_state = self.machine.state();
        let step = self.machine.step(
            &mut self.body,
            &Senses {
                opponent,
                distance,
                aggro_range: self.ranges.aggro,
                attack_range: self.ranges.attack,
                speed: self.config.speed,
            },
        );

        let modified = modifier::apply(
            &mut self.machine,
            &mut self.body,
            &TacticalContext {
                tactic,
                opponent,
                predicted_opponent: self.memory.predict_player_position(FLANK_LOOKAHEAD),
                distance,
                ranges: self.ranges,
                speed: self.config.speed,
                group,
            },
        );

        self.follow_formation(group);
        apply_motion_limits(
            &mut self.body,
            self.config.speed * modified.speed_scale,
            flying,
        );

        let state = self.machine.state();
        if state != previous_state {
            log::debug!("{}: {} -> {}", self.config.name, previous_state, state);
            events.push(ActorEvent::StateChanged {
                from: previous_state,
                to: state,
            });
        }
        if step.jumped {
            events.push(ActorEvent::Jumped);
        }
        if step.attack_launched || modified.attack_launched {
            events.push(ActorEvent::AttackLaunched {
                damage: self.config.damage,
            });
        }
        events
    }

    fn follow_formation(&mut self, group: Option<&GroupSnapshot>) {
        let Some(target) = self.formation_target else {
            return;
        };
        let in_formation = group.is_some_and(|g| !g.formation.is_none());
        let busy = matches!(self.machine.state(), BehaviorState::Attack | BehaviorState::Dead);
        if !in_formation || busy || self.config.pattern.is_stationary() {
            return;
        }
        let flying = self.is_flying();
        follow_formation_slot(&mut self.body, target, self.config.speed, flying);
    }

    /// Apply incoming damage. Health never drops below zero and a dead
    /// actor ignores further damage.
    pub fn take_damage(&mut self, amount: f32) {
        if self.machine.is_dead() || !amount.is_finite() || amount <= 0.0 {
            return;
        }
        self.health = (self.health - amount).max(0.0);
        self.memory
            .record_combat_event(false, true, amount, self.last_distance);

        if self.health <= 0.0 {
            log::info!("{} died", self.config.name);
            self.machine.kill();
            self.body.velocity.x = 0.0;
            self.formation_target = None;
            self.pending.push(ActorEvent::Died);
        }
    }

    /// Report that this actor's attack connected at `distance`
    pub fn record_successful_hit(&mut self, distance: f32) {
        self.memory.record_combat_event(true, false, 0.0, distance);
    }

    /// Report that the opponent avoided this actor's attack
    pub fn record_evasion(&mut self) {
        self.memory.record_evasion();
    }

    /// Damage of the current attack; zero unless attacking
    pub fn attack_damage(&self) -> f32 {
        if self.machine.state() == BehaviorState::Attack {
            self.config.damage
        } else {
            0.0
        }
    }

    /// Hitbox centered on the actor's position
    pub fn bounds(&self) -> Aabb2 {
        Aabb2::square(self.body.position, self.extent())
    }

    /// Side of the square hitbox
    pub fn extent(&self) -> f32 {
        self.config.size.extent()
    }

    /// Configuration the actor was spawned from
    pub fn config(&self) -> &ActorConfig {
        &self.config
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Movement archetype
    pub fn pattern(&self) -> &MovementPattern {
        self.machine.pattern()
    }

    /// Flying actors ignore gravity
    pub fn is_flying(&self) -> bool {
        self.config.pattern.is_flying()
    }

    /// Box center
    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    /// Velocity in units per tick
    pub fn velocity(&self) -> Vec2 {
        self.body.velocity
    }

    /// Current kinematics
    pub fn kinematics(&self) -> &Kinematics {
        &self.body
    }

    /// Mutable kinematics for the physics layer
    pub fn kinematics_mut(&mut self) -> &mut Kinematics {
        &mut self.body
    }

    /// Grounded status last reported by physics
    pub fn on_ground(&self) -> bool {
        self.body.on_ground
    }

    /// Grounded status reported back by physics
    pub fn set_grounded(&mut self, on_ground: bool) {
        self.body.on_ground = on_ground;
    }

    /// Current health, never negative
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Health at spawn
    pub fn max_health(&self) -> f32 {
        self.config.max_health
    }

    /// Current health over max health
    pub fn health_fraction(&self) -> f32 {
        self.health / self.config.max_health
    }

    /// Health reached zero
    pub fn is_dead(&self) -> bool {
        self.machine.is_dead()
    }

    /// Behavior state for the animation layer
    pub fn state(&self) -> BehaviorState {
        self.machine.state()
    }

    /// Remaining attack / jump cooldown in ticks
    pub fn cooldown(&self) -> u32 {
        self.machine.cooldown()
    }

    /// Tactical mode derived on the last update
    pub fn tactical_state(&self) -> TacticalState {
        self.tactic
    }

    /// Ranges in effect for the last tick
    pub fn ranges(&self) -> Ranges {
        self.ranges
    }

    /// Learned model of the opponent
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Owning group, if any
    pub fn group(&self) -> Option<GroupHandle> {
        self.group
    }

    /// Slot written by the group coordinator
    pub fn formation_target(&self) -> Option<Vec2> {
        self.formation_target
    }

    pub(crate) fn join_group(&mut self, group: GroupHandle) {
        self.group = Some(group);
    }

    pub(crate) fn leave_group(&mut self) {
        self.group = None;
        self.formation_target = None;
    }

    pub(crate) fn set_formation_target(&mut self, target: Option<Vec2>) {
        self.formation_target = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::Formation;
    use crate::group::GroupState;
    use crate::memory::BASE_RETREAT_THRESHOLD;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn chaser(x: f32, y: f32) -> Actor {
        Actor::new(
            ActorConfig::new(MovementPattern::Chase)
                .with_spawn(x, y)
                .with_speed(3.0),
        )
        .unwrap()
    }

    fn snapshot(formation: Formation) -> GroupSnapshot {
        GroupSnapshot {
            member_count: 3,
            alive_count: 3,
            centroid: Some(Vec2::ZERO),
            formation,
            state: GroupState::Patrol,
            leader: None,
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(Actor::new(ActorConfig::default().with_speed(-1.0)).is_err());
    }

    #[test]
    fn test_chase_closes_in_and_reports_state_change() {
        let mut actor = chaser(100.0, 100.0);
        let events = actor.update(&Observation::at(150.0, 100.0), None, DT);
        assert_eq!(actor.state(), BehaviorState::Chase);
        assert!(actor.velocity().x > 0.0);
        assert!(events.contains(&ActorEvent::StateChanged {
            from: BehaviorState::Idle,
            to: BehaviorState::Chase,
        }));
    }

    #[test]
    fn test_attack_event_and_damage() {
        let mut actor = chaser(100.0, 100.0);
        let events = actor.update(&Observation::at(120.0, 100.0), None, DT);
        assert!(events.contains(&ActorEvent::AttackLaunched { damage: 10.0 }));
        assert_eq!(actor.attack_damage(), 10.0);

        actor.update(&Observation::at(120.0, 100.0), None, DT);
        assert_eq!(actor.attack_damage(), 0.0);
    }

    #[test]
    fn test_damage_clamps_and_kills() {
        let mut actor = chaser(0.0, 0.0);
        actor.take_damage(40.0);
        assert_eq!(actor.health(), 60.0);
        actor.take_damage(500.0);
        assert_eq!(actor.health(), 0.0);
        assert!(actor.is_dead());

        actor.take_damage(10.0);
        assert_eq!(actor.health(), 0.0);

        let events = actor.update(&Observation::at(10.0, 0.0), None, DT);
        assert_eq!(events, vec![ActorEvent::Died]);
        assert_eq!(actor.state(), BehaviorState::Dead);

        // Dead actors stay inert
        assert!(actor.update(&Observation::at(10.0, 0.0), None, DT).is_empty());
        assert_eq!(actor.state(), BehaviorState::Dead);
    }

    #[test]
    fn test_low_health_lone_actor_retreats_faster() {
        let mut actor = chaser(100.0, 0.0);
        actor.take_damage(80.0);
        actor.update(&Observation::at(150.0, 0.0), None, DT);
        assert_eq!(actor.tactical_state(), TacticalState::Retreating);
        assert_eq!(actor.state(), BehaviorState::Flee);
        assert_relative_eq!(actor.velocity().x, -3.6);
    }

    #[test]
    fn test_retreating_flyer_does_not_dive_at_opponent() {
        let config = ActorConfig::new(MovementPattern::Flying {
            min_x: 0.0,
            max_x: 500.0,
        })
        .with_spawn(100.0, 100.0)
        .with_speed(3.0);
        let mut actor = Actor::new(config).unwrap();
        actor.take_damage(80.0);
        actor.update(&Observation::at(150.0, 150.0), None, DT);

        assert_eq!(actor.tactical_state(), TacticalState::Retreating);
        assert_eq!(actor.state(), BehaviorState::Flee);
        assert!(actor.velocity().x < 0.0);
        assert!(actor.velocity().y < 0.0);
    }

    #[test]
    fn test_low_health_grouped_actor_regroups() {
        let mut actor = chaser(100.0, 0.0);
        actor.take_damage(80.0);
        let group = snapshot(Formation::Line);
        actor.update(&Observation::at(150.0, 0.0), Some(&group), DT);
        assert_eq!(actor.tactical_state(), TacticalState::Regrouping);
    }

    #[test]
    fn test_ranges_do_not_compound() {
        let mut actor = chaser(0.0, 0.0);
        actor.record_successful_hit(30.0);
        for _ in 0..10 {
            actor.update(&Observation::at(1000.0, 0.0), None, DT);
        }
        assert_eq!(actor.tactical_state(), TacticalState::Aggressive);
        assert_relative_eq!(actor.ranges().aggro, 240.0);
    }

    #[test]
    fn test_formation_blend_needs_a_formation() {
        let mut actor = chaser(0.0, 0.0);
        actor.set_formation_target(Some(Vec2::new(-500.0, 0.0)));

        actor.update(&Observation::at(1000.0, 0.0), Some(&snapshot(Formation::None)), DT);
        assert_eq!(actor.velocity().x, 3.0);

        actor.update(&Observation::at(1000.0, 0.0), Some(&snapshot(Formation::Line)), DT);
        // 3 * 0.7 + (-3) * 0.3
        assert_relative_eq!(actor.velocity().x, 1.2, epsilon = 1e-5);
    }

    #[test]
    fn test_bounds_follow_size_class() {
        let actor = chaser(100.0, 100.0);
        let bounds = actor.bounds();
        assert_eq!(bounds.min, Vec2::new(84.0, 84.0));
        assert_eq!(bounds.max, Vec2::new(116.0, 116.0));
    }

    #[test]
    fn test_fresh_actor_memory() {
        let actor = chaser(0.0, 0.0);
        assert_eq!(actor.memory().retreat_threshold(), BASE_RETREAT_THRESHOLD);
        assert_eq!(actor.tactical_state(), TacticalState::Normal);
    }
}
