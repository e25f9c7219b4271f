//! Group coordinator
//!
//! A [`Group`] holds handles to its members, never the actors themselves.
//! Each tick it prunes the dead, elects a leader, derives a group state,
//! and (throttled) picks a formation and writes every member's formation
//! target. Actors only ever see the published [`GroupSnapshot`].

use crate::actor::{Actor, ActorHandle};
use crate::config::DEFAULT_COORDINATION_INTERVAL;
use crate::formation::{self, Formation, FormationFrame};
use nemesis_core::{Handle, HandleMap};
use nemesis_math::Vec2;
use serde::{Deserialize, Serialize};

/// Handle to a group stored in an encounter
pub type GroupHandle = Handle<Group>;

/// Health fraction below which a member makes the whole group regroup
pub const REGROUP_HEALTH_FRACTION: f32 = 0.3;

/// Default distance over which members can coordinate
pub const DEFAULT_COMMUNICATION_RANGE: f32 = 500.0;

/// Group-wide tactical state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupState {
    #[default]
    Idle,
    Patrol,
    Engaging,
    Retreating,
    Regrouping,
}

impl GroupState {
    /// Parse a name; unknown names map to `Idle`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "idle" => Self::Idle,
            "patrol" => Self::Patrol,
            "engaging" => Self::Engaging,
            "retreating" => Self::Retreating,
            "regrouping" => Self::Regrouping,
            other => {
                log::warn!("Unknown group state '{}', using idle", other);
                Self::Idle
            }
        }
    }

    /// Config and report tag
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Patrol => "patrol",
            Self::Engaging => "engaging",
            Self::Retreating => "retreating",
            Self::Regrouping => "regrouping",
        }
    }
}

impl std::fmt::Display for GroupState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only view of a group published once per group update
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroupSnapshot {
    pub member_count: usize,
    pub alive_count: usize,
    /// Mean position of alive members
    pub centroid: Option<Vec2>,
    pub formation: Formation,
    pub state: GroupState,
    pub leader: Option<ActorHandle>,
}

impl GroupSnapshot {
    /// More than one member
    pub fn is_multi_member(&self) -> bool {
        self.member_count > 1
    }

    /// Over half the members alive
    pub fn has_alive_majority(&self) -> bool {
        self.alive_count * 2 > self.member_count
    }

    /// Whether a living member has someone else to fight alongside
    pub fn has_allies(&self) -> bool {
        self.alive_count > 1
    }
}

/// Coordinated set of actors
#[derive(Debug, Clone)]
pub struct Group {
    members: Vec<ActorHandle>,
    leader: Option<ActorHandle>,
    state: GroupState,
    formation: Formation,
    pinned_formation: Option<Formation>,
    communication_range: f32,
    enforce_communication_range: bool,
    coordination_interval: f32,
    since_coordination: f32,
    /// Set once the first member joins
    populated: bool,
    snapshot: GroupSnapshot,
}

impl Group {
    /// Empty group coordinating over `communication_range`
    pub fn new(communication_range: f32) -> Self {
        Self {
            members: Vec::new(),
            leader: None,
            state: GroupState::Idle,
            formation: Formation::None,
            pinned_formation: None,
            communication_range,
            enforce_communication_range: false,
            coordination_interval: DEFAULT_COORDINATION_INTERVAL,
            // First update coordinates immediately
            since_coordination: f32::INFINITY,
            populated: false,
            snapshot: GroupSnapshot::default(),
        }
    }

    /// Set the minimum seconds between formation re-coordinations
    pub fn with_coordination_interval(mut self, seconds: f32) -> Self {
        self.coordination_interval = seconds.max(0.0);
        self
    }

    /// Withhold formation slots from members out of range of the leader
    pub fn with_communication_range_enforced(mut self, enforced: bool) -> Self {
        self.enforce_communication_range = enforced;
        self
    }

    pub(crate) fn add_member(&mut self, handle: ActorHandle) -> bool {
        if self.members.contains(&handle) {
            return false;
        }
        self.members.push(handle);
        self.populated = true;
        // Membership changed, re-coordinate on the next update
        self.since_coordination = f32::INFINITY;
        true
    }

    pub(crate) fn remove_member(&mut self, handle: ActorHandle) -> bool {
        let before = self.members.len();
        self.members.retain(|&m| m != handle);
        if self.leader == Some(handle) {
            self.leader = None;
        }
        let removed = self.members.len() != before;
        if removed {
            self.since_coordination = f32::INFINITY;
        }
        removed
    }

    /// Member handles in join order
    pub fn members(&self) -> &[ActorHandle] {
        &self.members
    }

    /// Whether `handle` is a member
    pub fn contains(&self, handle: ActorHandle) -> bool {
        self.members.contains(&handle)
    }

    /// Member count
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// No members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Had members once and has lost them all
    pub fn is_disbanded(&self) -> bool {
        self.populated && self.members.is_empty()
    }

    /// Healthiest alive member
    pub fn leader(&self) -> Option<ActorHandle> {
        self.leader
    }

    /// Group-wide state
    pub fn state(&self) -> GroupState {
        self.state
    }

    /// Formation in effect
    pub fn formation(&self) -> Formation {
        self.formation
    }

    /// Distance over which members coordinate
    pub fn communication_range(&self) -> f32 {
        self.communication_range
    }

    /// View published by the last update
    pub fn snapshot(&self) -> &GroupSnapshot {
        &self.snapshot
    }

    /// Pin a formation in place of the policy table, or unpin with `None`
    pub fn override_formation(&mut self, formation: Option<Formation>) {
        self.pinned_formation = formation;
        self.since_coordination = f32::INFINITY;
    }

    /// Run one coordination pass.
    ///
    /// Members that died or were despawned since the last pass are dropped
    /// first. An emptied group does nothing further.
    pub fn update(&mut self, actors: &mut HandleMap<Actor>, opponent: Vec2, delta_time: f32) {
        self.prune(actors);

        if self.members.is_empty() {
            self.leader = None;
            self.state = GroupState::Idle;
            self.formation = Formation::None;
            self.snapshot = GroupSnapshot::default();
            return;
        }

        self.leader = self.elect_leader(actors);

        let state = self.derive_state(actors);
        if state != self.state {
            log::debug!("Group state {} -> {}", self.state, state);
            self.state = state;
        }

        self.since_coordination += delta_time.max(0.0);
        if self.members.len() < 2 {
            self.dissolve_formation(actors);
        } else if self.since_coordination >= self.coordination_interval && opponent.is_finite() {
            self.coordinate(actors, opponent);
            self.since_coordination = 0.0;
        }

        self.snapshot = self.publish(actors);
    }

    fn prune(&mut self, actors: &mut HandleMap<Actor>) {
        let before = self.members.len();
        self.members.retain(|&handle| match actors.get_mut(handle) {
            Some(actor) if !actor.is_dead() => true,
            Some(actor) => {
                log::info!("Removing dead member {} from group", handle);
                actor.leave_group();
                false
            }
            None => {
                log::warn!("Dropping stale member handle {} from group", handle);
                false
            }
        });
        if self.members.len() != before {
            self.since_coordination = f32::INFINITY;
        }
    }

    /// Alive member with the most current health; ties go to the earliest
    fn elect_leader(&self, actors: &HandleMap<Actor>) -> Option<ActorHandle> {
        let mut best: Option<(ActorHandle, f32)> = None;
        for &handle in &self.members {
            let Some(actor) = actors.get(handle) else {
                continue;
            };
            if actor.is_dead() {
                continue;
            }
            match best {
                Some((_, health)) if actor.health() <= health => {}
                _ => best = Some((handle, actor.health())),
            }
        }
        best.map(|(handle, _)| handle)
    }

    fn derive_state(&self, actors: &HandleMap<Actor>) -> GroupState {
        let alive = || {
            self.members
                .iter()
                .filter_map(|&h| actors.get(h))
                .filter(|a| !a.is_dead())
        };

        if self.members.len() > 1
            && alive().any(|a| a.health_fraction() < REGROUP_HEALTH_FRACTION)
        {
            GroupState::Regrouping
        } else if alive().any(|a| a.state().is_engaged()) {
            GroupState::Engaging
        } else {
            GroupState::Patrol
        }
    }

    fn coordinate(&mut self, actors: &mut HandleMap<Actor>, opponent: Vec2) {
        let formation = self
            .pinned_formation
            .unwrap_or_else(|| Formation::select(self.state, self.members.len()));
        if formation != self.formation {
            log::info!(
                "Group formation {} -> {} ({} members, {})",
                self.formation,
                formation,
                self.members.len(),
                self.state
            );
            self.formation = formation;
        }

        let centroid = centroid(actors, &self.members).unwrap_or(opponent);
        let leader_position = self
            .leader
            .and_then(|h| actors.get(h))
            .map(Actor::position);
        let anchor = if self.state == GroupState::Engaging {
            opponent
        } else {
            leader_position.unwrap_or(centroid)
        };
        let frame = FormationFrame {
            opponent,
            anchor,
            forward: if opponent.y - centroid.y > 0.0 { 1.0 } else { -1.0 },
            leader_index: self
                .leader
                .and_then(|leader| self.members.iter().position(|&m| m == leader)),
        };

        let targets = formation::slots(formation, &frame, self.members.len());
        for (i, &handle) in self.members.iter().enumerate() {
            let Some(actor) = actors.get_mut(handle) else {
                continue;
            };
            let out_of_range = self.enforce_communication_range
                && leader_position
                    .is_some_and(|p| p.distance(actor.position()) > self.communication_range);
            let target = if out_of_range {
                None
            } else {
                targets.get(i).copied()
            };
            actor.set_formation_target(target);
        }
    }

    fn dissolve_formation(&mut self, actors: &mut HandleMap<Actor>) {
        if !self.formation.is_none() {
            log::info!("Group formation {} -> none (single member)", self.formation);
        }
        self.formation = Formation::None;
        for &handle in &self.members {
            if let Some(actor) = actors.get_mut(handle) {
                actor.set_formation_target(None);
            }
        }
    }

    fn publish(&self, actors: &HandleMap<Actor>) -> GroupSnapshot {
        let alive_count = self
            .members
            .iter()
            .filter_map(|&h| actors.get(h))
            .filter(|a| !a.is_dead())
            .count();
        GroupSnapshot {
            member_count: self.members.len(),
            alive_count,
            centroid: centroid(actors, &self.members),
            formation: self.formation,
            state: self.state,
            leader: self.leader,
        }
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::new(DEFAULT_COMMUNICATION_RANGE)
    }
}

/// Mean position of the alive members
fn centroid(actors: &HandleMap<Actor>, members: &[ActorHandle]) -> Option<Vec2> {
    let mut sum = Vec2::ZERO;
    let mut count = 0usize;
    for actor in members.iter().filter_map(|&h| actors.get(h)) {
        if actor.is_dead() {
            continue;
        }
        sum += actor.position();
        count += 1;
    }
    (count > 0).then(|| sum / count as f32)
}
