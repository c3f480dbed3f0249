//! The headless run loop.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info, trace};

use ashfall_gameplay::{Actor, Body, Damageable, EventHandler, GameEvent, Progression, Simulation};

use crate::config::EngineConfig;
use crate::loader::MapLoader;
use crate::script::InputScript;
use crate::timing::FrameTiming;

/// How long one poll of the map loader may block.
const LOADER_POLL: Duration = Duration::from_millis(5);

/// Writes hook events to the log.
#[derive(Debug, Default)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn handle(&self, event: &GameEvent) {
        match event {
            GameEvent::Died { actor: Actor::Enemy(id) } => debug!("Enemy {} died", id),
            GameEvent::Hit { target, damage, .. } => debug!("{:?} took {:.1}", target, damage),
            GameEvent::PickupCollected { heal, .. } => debug!("Healed {:.1}", heal),
            GameEvent::MapLoaded { walls, enemies } => {
                info!("Map ready: {} walls, {} enemies", walls, enemies);
            },
            other => trace!("{:?}", other),
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Fixed steps simulated
    pub ticks: u64,
    /// Simulated seconds
    pub elapsed: f64,
    /// Final score
    pub score: u64,
    /// Player health at the end
    pub health: f64,
    /// Enemies still alive
    pub enemies_left: usize,
}

/// Runs a session to completion.
pub fn run(config: &EngineConfig) -> Result<RunSummary> {
    let script = match &config.script_path {
        Some(path) => InputScript::load(path).with_context(|| format!("Failed to load script {}", path.display()))?,
        None => InputScript::default(),
    };

    let progression = Progression {
        difficulty: config.difficulty,
        ..Progression::default()
    };
    let mut sim = Simulation::new(config.simulation.clone(), progression);
    let mut loader = MapLoader::spawn(&config.map_path).context("Failed to start map loader")?;
    let mut timing = FrameTiming::new(config.tick_rate)
        .with_realtime(config.realtime)
        .with_max_updates(config.max_ticks_per_frame);
    let handler = LoggingHandler;
    let dt = timing.fixed_dt();
    let max_ticks = (config.max_seconds / config.fixed_dt()).round() as u64;
    let mut next_status = config.status_interval;

    loop {
        if !sim.is_loaded() {
            if let Some(result) = loader.poll(LOADER_POLL) {
                let data = result.with_context(|| format!("Failed to load map {}", loader.path().display()))?;
                sim.load_map(data).context("Map failed validation")?;
                timing.reset();
            }
        }

        let frame_dt = timing.frame_dt();
        for _ in 0..timing.accumulate(frame_dt) {
            let t = sim.elapsed();
            for message in script.messages(t, dt) {
                info!("[script] {}", message);
            }
            if !sim.tick(&script.frame(t, dt), dt) {
                break;
            }
            if config.log_events {
                sim.events().dispatch(&handler);
            } else {
                let _ = sim.events().drain();
            }
        }

        if !sim.is_loaded() {
            continue;
        }
        if config.status_interval > 0.0 && sim.elapsed() >= next_status {
            next_status += config.status_interval;
            log_status(&sim);
        }
        if sim.is_player_dead() {
            info!("Run ended: player died at {:.2}s", sim.elapsed());
            break;
        }
        if sim.ticks() >= max_ticks {
            info!("Run ended: reached {:.1}s", config.max_seconds);
            break;
        }
        timing.sleep_remainder();
    }

    Ok(summarize(&sim))
}

fn log_status(sim: &Simulation) {
    let (Some(player), Some(map)) = (sim.player(), sim.map()) else {
        return;
    };
    let rect = player.rect();
    info!(
        "t={:.1}s pos=({:.0}, {:.0}) state={:?} hp={:.0} enemies={} score={}",
        sim.elapsed(),
        rect.left,
        rect.top,
        player.state(),
        player.health(),
        map.enemy_count(),
        sim.progression().score
    );
}

fn summarize(sim: &Simulation) -> RunSummary {
    RunSummary {
        ticks: sim.ticks(),
        elapsed: sim.elapsed(),
        score: sim.progression().score,
        health: sim.player().map_or(0.0, Damageable::health),
        enemies_left: sim.map().map_or(0, |map| map.enemy_count()),
    }
}
