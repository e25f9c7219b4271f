//! Nemesis encounter runner
//!
//! Loads an encounter, drives a scripted opponent through the decision
//! engine at a fixed tick, and reports how the enemies adapted.
//!
//! Run with: cargo run --bin nemesis -- [encounter.toml] [--ticks N] [--report out.json]

mod config;
mod error;
mod opponent;
mod report;

use config::RunConfig;
use error::Result;
use nemesis_ai::prelude::*;
use opponent::Opponent;
use report::RunReport;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = RunConfig::load()?;
    let file = config.encounter_file()?;
    let mut encounter = file.build()?;
    let mut opponent = Opponent::new(file.opponent.clone());

    log::info!(
        "Running {} ticks at {} Hz",
        config.ticks,
        encounter.config().tick_rate
    );

    let mut all_down = false;
    for _ in 0..config.ticks {
        let observation = opponent.step();
        let events = encounter.tick(&observation);
        for (handle, event) in &events {
            match event {
                ActorEvent::Died => log::info!("Tick {}: {} died", encounter.ticks(), handle),
                other => log::debug!("Tick {}: {} {:?}", encounter.ticks(), handle, other),
            }
        }
        // Deaths are reported one tick after the killing blow
        if all_down {
            log::info!("All actors down at tick {}", encounter.ticks());
            break;
        }
        opponent.resolve(&mut encounter, &observation, &events)?;
        all_down = encounter.actors().all(|(_, actor)| actor.is_dead());
    }

    log::debug!("Opponent finished at {:?}", opponent.position());
    let report = RunReport::collect(&encounter, opponent.stats());
    report.log_summary();
    if let Some(path) = &config.report_path {
        report.write(path)?;
    }
    Ok(())
}
