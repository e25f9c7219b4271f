//! Encounter (room) arena and tick loop
//!
//! The [`Encounter`] owns every actor and group of a room. Per tick, groups
//! update first and publish their snapshots, then every actor updates
//! against its group's snapshot, then motion is integrated. All of it runs
//! on one thread, in arena index order.

use crate::actor::{Actor, ActorHandle};
use crate::behavior::Kinematics;
use crate::config::{ActorConfig, EncounterConfig};
use crate::error::{AiError, Result};
use crate::events::ActorEvent;
use crate::group::{Group, GroupHandle};
use crate::memory::Observation;
use nemesis_core::HandleMap;

/// Moves actor bodies once their velocities are decided
pub trait MotionIntegrator {
    /// Advance `body` by one tick. `extent` is the side of the actor's box.
    fn integrate(&mut self, body: &mut Kinematics, extent: f32, flying: bool);
}

/// Flat floor at `ground_y`; positions are box centers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatGround {
    pub ground_y: f32,
}

impl MotionIntegrator for FlatGround {
    fn integrate(&mut self, body: &mut Kinematics, extent: f32, _flying: bool) {
        body.position += body.velocity;

        let floor = self.ground_y - extent * 0.5;
        if body.position.y >= floor {
            body.position.y = floor;
            body.velocity.y = body.velocity.y.min(0.0);
            body.on_ground = true;
        } else {
            body.on_ground = false;
        }
    }
}

/// A room full of actors and the groups coordinating them
pub struct Encounter<I: MotionIntegrator = FlatGround> {
    config: EncounterConfig,
    actors: HandleMap<Actor>,
    groups: HandleMap<Group>,
    integrator: I,
    ticks: u64,
}

impl Encounter<FlatGround> {
    /// Create an encounter with the flat-ground integrator
    pub fn new(config: EncounterConfig) -> Result<Self> {
        let integrator = FlatGround {
            ground_y: config.ground_y,
        };
        Self::with_integrator(config, integrator)
    }
}

impl<I: MotionIntegrator> Encounter<I> {
    /// Create an encounter with a custom integrator
    pub fn with_integrator(config: EncounterConfig, integrator: I) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            actors: HandleMap::new(),
            groups: HandleMap::new(),
            integrator,
            ticks: 0,
        })
    }

    /// Settings the encounter was built with
    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Spawn an actor from a validated config
    pub fn spawn(&mut self, config: ActorConfig) -> Result<ActorHandle> {
        let actor = Actor::new(config)?;
        log::debug!("Spawning {} ({})", actor.name(), actor.pattern().name());
        Ok(self.actors.insert(actor))
    }

    /// Create an empty group
    pub fn create_group(&mut self, communication_range: f32) -> GroupHandle {
        let group = Group::new(communication_range)
            .with_coordination_interval(self.config.coordination_interval)
            .with_communication_range_enforced(self.config.enforce_communication_range);
        self.groups.insert(group)
    }

    /// Add an actor to a group. An actor belongs to at most one group.
    pub fn join_group(&mut self, actor: ActorHandle, group: GroupHandle) -> Result<()> {
        let Some(member) = self.actors.get_mut(actor) else {
            log::warn!("join_group: stale actor {}", actor);
            return Err(AiError::StaleActor(actor));
        };
        let Some(target) = self.groups.get_mut(group) else {
            log::warn!("join_group: stale group {}", group);
            return Err(AiError::StaleGroup(group));
        };
        if member.group().is_some() {
            return Err(AiError::AlreadyGrouped(actor));
        }
        target.add_member(actor);
        member.join_group(group);
        Ok(())
    }

    /// Remove an actor from the room, and from its group
    pub fn despawn(&mut self, handle: ActorHandle) -> Result<Actor> {
        let Some(actor) = self.actors.remove(handle) else {
            log::warn!("despawn: stale actor {}", handle);
            return Err(AiError::StaleActor(handle));
        };
        if let Some(group) = actor.group().and_then(|g| self.groups.get_mut(g)) {
            group.remove_member(handle);
        }
        Ok(actor)
    }

    /// Remove every dead actor, returning their handles
    pub fn despawn_dead(&mut self) -> Vec<ActorHandle> {
        let dead: Vec<ActorHandle> = self
            .actors
            .iter()
            .filter(|(_, actor)| actor.is_dead())
            .map(|(handle, _)| handle)
            .collect();
        for &handle in &dead {
            if let Some(actor) = self.actors.remove(handle) {
                if let Some(group) = actor.group().and_then(|g| self.groups.get_mut(g)) {
                    group.remove_member(handle);
                }
            }
        }
        dead
    }

    /// Look up an actor
    pub fn actor(&self, handle: ActorHandle) -> Option<&Actor> {
        self.actors.get(handle)
    }

    /// Look up an actor mutably
    pub fn actor_mut(&mut self, handle: ActorHandle) -> Option<&mut Actor> {
        self.actors.get_mut(handle)
    }

    /// Look up a group
    pub fn group(&self, handle: GroupHandle) -> Option<&Group> {
        self.groups.get(handle)
    }

    /// Look up a group mutably
    pub fn group_mut(&mut self, handle: GroupHandle) -> Option<&mut Group> {
        self.groups.get_mut(handle)
    }

    /// Live actors in arena order
    pub fn actors(&self) -> impl Iterator<Item = (ActorHandle, &Actor)> {
        self.actors.iter()
    }

    /// Live groups in arena order
    pub fn groups(&self) -> impl Iterator<Item = (GroupHandle, &Group)> {
        self.groups.iter()
    }

    /// Number of live actors, dead ones included
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Deal damage to an actor
    pub fn damage_actor(&mut self, handle: ActorHandle, amount: f32) -> Result<()> {
        match self.actors.get_mut(handle) {
            Some(actor) => {
                actor.take_damage(amount);
                Ok(())
            }
            None => {
                log::warn!("damage_actor: stale actor {}", handle);
                Err(AiError::StaleActor(handle))
            }
        }
    }

    /// Run one simulation tick against the observed opponent
    pub fn tick(&mut self, observation: &Observation) -> Vec<(ActorHandle, ActorEvent)> {
        let dt = self.config.delta_time();

        for (_, group) in self.groups.iter_mut() {
            group.update(&mut self.actors, observation.position, dt);
        }
        for handle in self.groups.retain(|_, group| !group.is_disbanded()) {
            log::info!("Group {} disbanded", handle);
        }

        let mut events = Vec::new();
        for (handle, actor) in self.actors.iter_mut() {
            let snapshot = actor
                .group()
                .and_then(|g| self.groups.get(g))
                .map(Group::snapshot);
            events.extend(
                actor
                    .update(observation, snapshot, dt)
                    .into_iter()
                    .map(|event| (handle, event)),
            );
        }

        for (_, actor) in self.actors.iter_mut() {
            let extent = actor.extent();
            let flying = actor.is_flying();
            self.integrator.integrate(actor.kinematics_mut(), extent, flying);
        }

        self.ticks += 1;
        events
    }
}
