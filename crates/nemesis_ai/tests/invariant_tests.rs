//! Invariant tests for nemesis_ai
//!
//! These tests drive whole encounters and check properties that must hold
//! after every tick.

use approx::assert_relative_eq;
use nemesis_ai::memory::{Memory, MAX_RETREAT_THRESHOLD};
use nemesis_ai::prelude::*;
use nemesis_math::Vec2;

const GROUND: f32 = 384.0;

/// Small deterministic generator so runs are repeatable
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    fn unit(&mut self) -> f32 {
        self.next() as f32 / (1u64 << 31) as f32
    }
}

/// Opponent that paces back and forth, with periodic actions
fn scripted_observation(tick: u32) -> Observation {
    let phase = (tick % 240) as f32;
    let x = if phase < 120.0 { 200.0 + phase * 4.0 } else { 680.0 - (phase - 120.0) * 4.0 };
    let mut obs = Observation::at(x, GROUND);
    if tick % 45 == 0 {
        obs = obs.with_jump();
    }
    if tick % 20 == 0 {
        obs = obs.with_attack();
    }
    if tick % 70 == 0 {
        obs = obs.with_dash();
    }
    obs
}

fn build_encounter() -> (Encounter, Vec<ActorHandle>) {
    let mut encounter = Encounter::new(EncounterConfig::default()).unwrap();
    let pack = encounter.create_group(400.0);
    let configs = [
        ActorConfig::new(MovementPattern::Chase).with_spawn(100.0, GROUND),
        ActorConfig::new(MovementPattern::Patrol {
            min_x: 50.0,
            max_x: 300.0,
        })
        .with_spawn(150.0, GROUND),
        ActorConfig::new(MovementPattern::Jumping {
            min_x: 0.0,
            max_x: 400.0,
        })
        .with_spawn(250.0, GROUND),
        ActorConfig::new(MovementPattern::Flying {
            min_x: 0.0,
            max_x: 800.0,
        })
        .with_spawn(400.0, 200.0),
        ActorConfig::new(MovementPattern::Stationary).with_spawn(600.0, GROUND),
    ];

    let mut handles = Vec::new();
    for config in configs {
        let handle = encounter.spawn(config).unwrap();
        encounter.join_group(handle, pack).unwrap();
        handles.push(handle);
    }
    (encounter, handles)
}

/// INVARIANT: Same configuration and observation stream give the same run
#[test]
fn invariant_determinism() {
    let run = || {
        let (mut encounter, handles) = build_encounter();
        let mut trace = Vec::new();
        for tick in 0..900 {
            if tick % 90 == 0 {
                let _ = encounter.damage_actor(handles[(tick / 90) as usize % handles.len()], 12.0);
            }
            encounter.tick(&scripted_observation(tick));
            for &handle in &handles {
                let actor = encounter.actor(handle).unwrap();
                trace.push((
                    actor.position(),
                    actor.velocity(),
                    actor.state(),
                    actor.tactical_state(),
                ));
            }
        }
        trace
    };

    assert_eq!(run(), run());
}

/// INVARIANT: Health never goes negative and death tracks health
#[test]
fn invariant_health_never_negative() {
    let (mut encounter, handles) = build_encounter();
    let mut rng = Lcg(7);

    for tick in 0..600 {
        let target = handles[rng.next() as usize % handles.len()];
        let amount = rng.unit() * 30.0;
        encounter.damage_actor(target, amount).unwrap();
        encounter.tick(&scripted_observation(tick));

        for &handle in &handles {
            let actor = encounter.actor(handle).unwrap();
            assert!(actor.health() >= 0.0);
            assert_eq!(actor.is_dead(), actor.health() <= 0.0);
            if actor.is_dead() {
                assert_eq!(actor.state(), BehaviorState::Dead);
            }
        }
    }
}

/// INVARIANT: Retreat threshold is non-decreasing under damage and capped
#[test]
fn invariant_retreat_threshold_monotonic() {
    let mut memory = Memory::new();
    let mut rng = Lcg(11);
    let mut previous = memory.retreat_threshold();

    for _ in 0..500 {
        memory.record_combat_event(false, true, rng.unit() * 20.0, 0.0);
        let threshold = memory.retreat_threshold();
        assert!(threshold >= previous);
        assert!(threshold <= MAX_RETREAT_THRESHOLD);
        previous = threshold;
    }
    assert_relative_eq!(previous, MAX_RETREAT_THRESHOLD);
}

/// INVARIANT: Low health always withdraws, whatever else memory says
#[test]
fn invariant_tactical_priority() {
    let mut memory = Memory::new();
    for i in 0..300 {
        let obs = Observation::at((i * 25) as f32, 0.0).with_attack().with_dash();
        memory.update(&obs, 1.0 / 60.0);
        memory.record_combat_event(true, false, 0.0, 20.0);
        memory.record_evasion();
    }

    let mut rng = Lcg(3);
    for _ in 0..200 {
        let health = rng.unit() * memory.retreat_threshold() * 0.999;
        let distance = rng.unit() * 400.0;
        let has_allies = rng.next() % 2 == 0;
        let tactic = memory.tactical_state(health, has_allies, distance);
        let expected = if has_allies {
            TacticalState::Regrouping
        } else {
            TacticalState::Retreating
        };
        assert_eq!(tactic, expected);
    }
}

/// INVARIANT: Leader is the healthiest alive member, or none
#[test]
fn invariant_leader_is_healthiest() {
    let (mut encounter, handles) = build_encounter();
    let pack = encounter.actor(handles[0]).unwrap().group().unwrap();
    let mut rng = Lcg(42);

    for tick in 0..400 {
        if tick % 5 == 0 {
            let target = handles[rng.next() as usize % handles.len()];
            encounter.damage_actor(target, rng.unit() * 25.0).unwrap();
        }
        encounter.tick(&scripted_observation(tick));

        let Some(group) = encounter.group(pack) else {
            // Everyone died and the group disbanded
            assert!(handles.iter().all(|&h| encounter.actor(h).unwrap().is_dead()));
            break;
        };

        let mut best: Option<(ActorHandle, f32)> = None;
        for &member in group.members() {
            let actor = encounter.actor(member).unwrap();
            assert!(!actor.is_dead());
            if best.map_or(true, |(_, health)| actor.health() > health) {
                best = Some((member, actor.health()));
            }
        }
        assert_eq!(group.leader(), best.map(|(h, _)| h));
    }
}

/// INVARIANT: Circle slots sit on the ring, line slots share a Y
#[test]
fn invariant_formation_geometry() {
    let opponent = Vec2::new(300.0, GROUND);
    let mut encounter = Encounter::new(EncounterConfig::default()).unwrap();
    let pack = encounter.create_group(1000.0);
    let mut handles = Vec::new();
    for i in 0..6 {
        let config = ActorConfig::new(MovementPattern::Chase).with_spawn(100.0 + i as f32 * 20.0, GROUND);
        let handle = encounter.spawn(config).unwrap();
        encounter.join_group(handle, pack).unwrap();
        handles.push(handle);
    }

    for _ in 0..12 {
        encounter.tick(&Observation::at(opponent.x, opponent.y));
    }
    assert_eq!(encounter.group(pack).unwrap().formation(), Formation::Circle);
    for &handle in &handles {
        let target = encounter.actor(handle).unwrap().formation_target().unwrap();
        assert_relative_eq!(target.distance(opponent), 120.0, epsilon = 1e-3);
    }

    encounter.group_mut(pack).unwrap().override_formation(Some(Formation::Line));
    encounter.tick(&Observation::at(opponent.x, opponent.y));
    let ys: Vec<f32> = handles
        .iter()
        .map(|&h| encounter.actor(h).unwrap().formation_target().unwrap().y)
        .collect();
    assert!(ys.iter().all(|&y| y == ys[0]));
}
