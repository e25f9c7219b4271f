//! JSON run report

use crate::error::Result;
use crate::opponent::CombatStats;
use nemesis_ai::prelude::*;
use nemesis_math::Vec2;
use serde::Serialize;
use std::path::Path;

/// Final state of one actor
#[derive(Debug, Clone, Serialize)]
pub struct ActorReport {
    pub handle: String,
    pub name: String,
    pub pattern: &'static str,
    pub state: BehaviorState,
    pub tactic: TacticalState,
    pub health: f32,
    pub max_health: f32,
    pub position: Vec2,
    pub group: Option<String>,
    pub skill_estimate: f32,
    pub retreat_threshold: f32,
    pub confidence: f32,
    pub hits_landed: u32,
    pub evasions_seen: u32,
}

/// Final state of one group
#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub handle: String,
    pub state: GroupState,
    pub formation: Formation,
    pub members: usize,
    pub leader: Option<String>,
}

/// Summary of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub ticks: u64,
    pub opponent: CombatStats,
    pub actors: Vec<ActorReport>,
    pub groups: Vec<GroupReport>,
}

impl RunReport {
    /// Snapshot the encounter after a run
    pub fn collect(encounter: &Encounter, opponent: CombatStats) -> Self {
        let actors = encounter
            .actors()
            .map(|(handle, actor)| ActorReport {
                handle: handle.to_string(),
                name: actor.name().to_string(),
                pattern: actor.pattern().name(),
                state: actor.state(),
                tactic: actor.tactical_state(),
                health: actor.health(),
                max_health: actor.max_health(),
                position: actor.position(),
                group: actor.group().map(|g| g.to_string()),
                skill_estimate: actor.memory().player_skill_estimate(),
                retreat_threshold: actor.memory().retreat_threshold(),
                confidence: actor.memory().confidence(),
                hits_landed: actor.memory().hits_landed(),
                evasions_seen: actor.memory().evasions(),
            })
            .collect();

        let groups = encounter
            .groups()
            .map(|(handle, group)| GroupReport {
                handle: handle.to_string(),
                state: group.state(),
                formation: group.formation(),
                members: group.len(),
                leader: group.leader().map(|l| l.to_string()),
            })
            .collect();

        Self {
            ticks: encounter.ticks(),
            opponent,
            actors,
            groups,
        }
    }

    /// Actors still standing
    pub fn alive(&self) -> usize {
        self.actors
            .iter()
            .filter(|a| a.state != BehaviorState::Dead)
            .count()
    }

    /// Log a one-line-per-actor summary
    pub fn log_summary(&self) {
        log::info!(
            "Run finished after {} ticks: {}/{} actors alive, opponent took {:.0} damage",
            self.ticks,
            self.alive(),
            self.actors.len(),
            self.opponent.damage_taken
        );
        for actor in &self.actors {
            log::info!(
                "  {} {:<8} {:<6} {:<10} hp {:>5.1}/{:<5.1} skill {:.2} retreat@{:.2}",
                actor.handle,
                actor.name,
                actor.state.name(),
                actor.tactic.name(),
                actor.health,
                actor.max_health,
                actor.skill_estimate,
                actor.retreat_threshold
            );
        }
        for group in &self.groups {
            log::info!(
                "  group {} {} formation {} ({} members)",
                group.handle,
                group.state,
                group.formation,
                group.members
            );
        }
    }

    /// Pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON
    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Report written to {}", path.display());
        Ok(())
    }
}
