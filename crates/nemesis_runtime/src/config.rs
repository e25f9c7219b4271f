//! Run configuration and encounter files
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Command line: `nemesis path/to/encounter.toml --ticks 600 --report run.json`
//! 2. Environment variables: `NEMESIS_ENCOUNTER`, `NEMESIS_TICKS`
//! 3. Built-in demo encounter
//!
//! # Example Encounter File
//!
//! ```toml
//! [encounter]
//! ground_y = 400.0
//!
//! [opponent]
//! waypoints = [{ x = 200.0, y = 376.0 }, { x = 900.0, y = 376.0 }]
//!
//! [[groups]]
//! communication_range = 500.0
//!
//! [[groups.members]]
//! spawn = { x = 600.0, y = 384.0 }
//! pattern = { kind = "patrol", min_x = 500.0, max_x = 800.0 }
//! ```

use crate::error::{Result, RuntimeError};
use nemesis_ai::group::DEFAULT_COMMUNICATION_RANGE;
use nemesis_ai::prelude::*;
use nemesis_math::Vec2;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Encounter used when no file is given
const DEMO_ENCOUNTER: &str = include_str!("../demos/arena.toml");

/// Default run length: 30 seconds at 60 Hz
pub const DEFAULT_TICKS: u64 = 1800;

/// Command line / environment settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Encounter file, or `None` for the built-in demo
    pub encounter_path: Option<PathBuf>,
    /// Ticks to simulate
    pub ticks: u64,
    /// Where to write the JSON report
    pub report_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            encounter_path: None,
            ticks: DEFAULT_TICKS,
            report_path: None,
        }
    }
}

impl RunConfig {
    /// Load from the process arguments and environment
    pub fn load() -> Result<Self> {
        Self::from_sources(std::env::args().skip(1), |key| std::env::var(key).ok())
    }

    /// Resolve settings from explicit sources; arguments win over environment
    pub fn from_sources<A, E>(args: A, env: E) -> Result<Self>
    where
        A: IntoIterator<Item = String>,
        E: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = env("NEMESIS_ENCOUNTER").filter(|p| !p.is_empty()) {
            log::info!("Encounter from env: {}", path);
            config.encounter_path = Some(PathBuf::from(path));
        }
        if let Some(ticks) = env("NEMESIS_TICKS") {
            config.ticks = parse_ticks(&ticks)?;
        }

        let mut args = args.into_iter();
        let mut positional = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--ticks" => {
                    let value = args
                        .next()
                        .ok_or_else(|| RuntimeError::Parse(String::from("--ticks needs a value")))?;
                    config.ticks = parse_ticks(&value)?;
                }
                "--report" => {
                    let value = args
                        .next()
                        .ok_or_else(|| RuntimeError::Parse(String::from("--report needs a path")))?;
                    config.report_path = Some(PathBuf::from(value));
                }
                flag if flag.starts_with("--") => {
                    return Err(RuntimeError::Parse(format!("Unknown flag: {}", flag)));
                }
                _ if positional.is_none() => positional = Some(PathBuf::from(&arg)),
                _ => log::warn!("Ignoring extra argument: {}", arg),
            }
        }
        if let Some(path) = positional {
            log::info!("Encounter from args: {}", path.display());
            config.encounter_path = Some(path);
        }

        Ok(config)
    }

    /// Read and parse the configured encounter
    pub fn encounter_file(&self) -> Result<EncounterFile> {
        match &self.encounter_path {
            Some(path) => EncounterFile::load(path),
            None => {
                log::info!("No encounter given, running the built-in demo");
                EncounterFile::parse(DEMO_ENCOUNTER)
            }
        }
    }
}

fn parse_ticks(value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| RuntimeError::Parse(format!("Invalid tick count: {}", value)))
}

/// Scripted opponent settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OpponentScript {
    /// Loop of points the opponent walks between
    pub waypoints: Vec<Vec2>,
    /// Units per tick
    pub speed: f32,
    /// Damage of one opponent attack
    pub damage: f32,
    /// Reach of an opponent attack
    pub attack_range: f32,
    /// Side of the opponent's square hitbox
    pub size: f32,
    /// Ticks between jumps (0 never jumps)
    pub jump_every: u32,
    /// Ticks between attacks (0 never attacks)
    pub attack_every: u32,
    /// Ticks between dashes (0 never dashes)
    pub dash_every: u32,
}

impl Default for OpponentScript {
    fn default() -> Self {
        Self {
            waypoints: vec![Vec2::new(200.0, 376.0), Vec2::new(800.0, 376.0)],
            speed: 4.0,
            damage: 15.0,
            attack_range: 60.0,
            size: 48.0,
            jump_every: 90,
            attack_every: 30,
            dash_every: 150,
        }
    }
}

/// A coordinated pack in an encounter file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GroupSpec {
    pub communication_range: f32,
    /// Formation pinned in place of the policy table
    pub formation: Option<Formation>,
    pub members: Vec<ActorConfig>,
}

impl Default for GroupSpec {
    fn default() -> Self {
        Self {
            communication_range: DEFAULT_COMMUNICATION_RANGE,
            formation: None,
            members: Vec::new(),
        }
    }
}

/// Parsed encounter file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EncounterFile {
    pub encounter: EncounterConfig,
    pub opponent: OpponentScript,
    pub groups: Vec<GroupSpec>,
    /// Actors outside any group
    pub actors: Vec<ActorConfig>,
}

impl EncounterFile {
    /// Read and parse an encounter file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        log::info!("Loaded encounter from {}", path.display());
        Self::parse(&content)
    }

    /// Parse encounter TOML
    pub fn parse(content: &str) -> Result<Self> {
        let file: Self = toml::from_str(content).map_err(|e| RuntimeError::Parse(e.to_string()))?;
        if file.opponent.waypoints.is_empty() {
            return Err(RuntimeError::Parse(String::from(
                "opponent needs at least one waypoint",
            )));
        }
        Ok(file)
    }

    /// Spawn every actor and group into a fresh encounter
    pub fn build(&self) -> Result<Encounter> {
        let mut encounter = Encounter::new(self.encounter.clone())?;

        for spec in &self.groups {
            let group = encounter.create_group(spec.communication_range);
            if let Some(pinned) = spec.formation {
                if let Some(g) = encounter.group_mut(group) {
                    g.override_formation(Some(pinned));
                }
            }
            for member in &spec.members {
                let handle = encounter.spawn(member.clone())?;
                encounter.join_group(handle, group)?;
            }
        }
        for config in &self.actors {
            encounter.spawn(config.clone())?;
        }

        log::info!(
            "Encounter ready: {} actors in {} groups",
            encounter.actor_count(),
            self.groups.len()
        );
        Ok(encounter)
    }
}
