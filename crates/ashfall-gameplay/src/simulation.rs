//! Top-level game state.
//!
//! [`Simulation`] owns the loaded map, the player, the camera, the event bus
//! and the session progression. One call to [`Simulation::tick`] advances the
//! player, then the map and its enemies, then the camera.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ashfall_common::MapResult;

use crate::camera::{Camera, CameraConfig};
use crate::entity::{Body, Damageable};
use crate::events::{EventBus, GameEvent, DEFAULT_EVENT_CAPACITY};
use crate::input::FrameInput;
use crate::map::Map;
use crate::map_data::MapData;
use crate::physics::PlayerPhysics;
use crate::player::Player;
use crate::progression::Progression;
use crate::weapon::WeaponConfig;

/// Shared state handed to everything that runs inside a tick.
pub struct TickContext<'a> {
    /// Hook bus
    pub events: &'a EventBus,
    /// Score and difficulty
    pub progression: &'a mut Progression,
}

/// Tuning for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Event bus capacity
    pub event_capacity: usize,
    /// Player movement
    pub physics: PlayerPhysics,
    /// Player weapon
    pub weapon: WeaponConfig,
    /// Camera
    pub camera: CameraConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            physics: PlayerPhysics::default(),
            weapon: WeaponConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

/// Everything that exists only while a map is loaded.
#[derive(Debug)]
struct Level {
    data: MapData,
    map: Map,
    player: Player,
    camera: Camera,
}

/// The game session.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    level: Option<Level>,
    events: EventBus,
    progression: Progression,
    paused: bool,
    elapsed: f64,
    ticks: u64,
}

impl Simulation {
    /// Creates a session with no map loaded.
    #[must_use]
    pub fn new(config: SimulationConfig, progression: Progression) -> Self {
        let events = EventBus::new(config.event_capacity);
        Self {
            config,
            level: None,
            events,
            progression,
            paused: false,
            elapsed: 0.0,
            ticks: 0,
        }
    }

    /// Validates and loads a map, replacing any current one.
    pub fn load_map(&mut self, data: MapData) -> MapResult<()> {
        data.validate()?;
        let level = self.build_level(data);
        self.events.publish(GameEvent::MapLoaded {
            walls: level.map.walls().len(),
            enemies: level.map.enemy_count(),
        });
        self.level = Some(level);
        self.elapsed = 0.0;
        self.ticks = 0;
        Ok(())
    }

    fn build_level(&self, data: MapData) -> Level {
        let map = Map::from_data(&data, &self.progression);
        let player = Player::new(
            self.config.physics.clone(),
            self.config.weapon.clone(),
            &map.player_spawn(),
            map.init_facing(),
        );
        let mut camera = Camera::new(self.config.camera.clone(), player.rect().center());
        camera.snap_to(&player.rect(), &map.bounds());
        Level {
            data,
            map,
            player,
            camera,
        }
    }

    /// True once a map is loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.level.is_some()
    }

    /// Starts the session over on the last loaded map with a fresh player and
    /// zero score. Returns false if no map was ever loaded.
    pub fn reset(&mut self) -> bool {
        let Some(data) = self.level.as_ref().map(|level| level.data.clone()) else {
            return false;
        };
        self.progression.score = 0;
        let level = self.build_level(data);
        info!("Session reset after {} ticks", self.ticks);
        self.level = Some(level);
        self.paused = false;
        self.elapsed = 0.0;
        self.ticks = 0;
        // Stale events from the previous run
        let dropped = self.events.drain().len();
        if dropped > 0 {
            debug!("Dropped {} pending events on reset", dropped);
        }
        true
    }

    /// Stops delivering ticks.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resumes ticking.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// True while paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Advances one fixed step. Returns false, doing nothing, while no map is
    /// loaded or the session is paused.
    pub fn tick(&mut self, input: &FrameInput, dt: f64) -> bool {
        if self.paused {
            return false;
        }
        let Some(level) = self.level.as_mut() else {
            return false;
        };

        let mut ctx = TickContext {
            events: &self.events,
            progression: &mut self.progression,
        };
        level.player.tick(input, &mut level.map, &mut ctx, dt);
        level.map.tick(&mut level.player, &mut ctx, dt);
        level.camera.follow(&level.player.rect(), &level.map.bounds(), dt);

        self.elapsed += dt;
        self.ticks += 1;
        true
    }

    /// Session tuning.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The player, if a map is loaded.
    #[must_use]
    pub fn player(&self) -> Option<&Player> {
        self.level.as_ref().map(|level| &level.player)
    }

    /// The map, if loaded.
    #[must_use]
    pub fn map(&self) -> Option<&Map> {
        self.level.as_ref().map(|level| &level.map)
    }

    /// The camera, if a map is loaded.
    #[must_use]
    pub fn camera(&self) -> Option<&Camera> {
        self.level.as_ref().map(|level| &level.camera)
    }

    /// Hook bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Score and difficulty.
    #[must_use]
    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    /// Simulated seconds since the map was loaded.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Ticks since the map was loaded.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// True once the player has died.
    #[must_use]
    pub fn is_player_dead(&self) -> bool {
        self.player().is_some_and(Damageable::is_dead)
    }

    /// Snapshot of the current level in loader format.
    #[must_use]
    pub fn save_map(&self) -> Option<MapData> {
        self.map().map(Map::save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemy::EnemyKind;
    use crate::input::PlayerControl;
    use ashfall_kernel::Rect;

    const DT: f64 = 1.0 / 60.0;

    fn arena() -> MapData {
        MapData::new(1200.0, 600.0, Rect::new(100.0, 452.0, 24.0, 48.0))
            .with_wall(Rect::new(0.0, 500.0, 1200.0, 60.0))
            .with_wall(Rect::new(0.0, 0.0, 20.0, 500.0))
            .with_seed(7)
    }

    fn loaded(data: MapData) -> Simulation {
        let mut sim = Simulation::new(SimulationConfig::default(), Progression::default());
        sim.load_map(data).expect("valid map");
        sim
    }

    #[test]
    fn test_tick_skipped_until_loaded() {
        let mut sim = Simulation::new(SimulationConfig::default(), Progression::default());
        assert!(!sim.tick(&FrameInput::idle(), DT));
        assert!(sim.player().is_none());

        sim.load_map(arena()).expect("valid map");
        assert!(sim.tick(&FrameInput::idle(), DT));
        assert_eq!(sim.ticks(), 1);
        assert!(sim.events().drain().contains(&GameEvent::MapLoaded { walls: 2, enemies: 0 }));
    }

    #[test]
    fn test_invalid_map_rejected() {
        let mut sim = Simulation::new(SimulationConfig::default(), Progression::default());
        let bad = MapData::new(-5.0, 100.0, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(sim.load_map(bad).is_err());
        assert!(!sim.is_loaded());
    }

    #[test]
    fn test_pause_freezes_time() {
        let mut sim = loaded(arena());
        sim.pause();
        assert!(!sim.tick(&FrameInput::idle(), DT));
        assert_eq!(sim.elapsed(), 0.0);
        sim.resume();
        assert!(sim.tick(&FrameInput::idle(), DT));
    }

    #[test]
    fn test_player_settles_on_floor() {
        let mut sim = loaded(arena());
        for _ in 0..30 {
            sim.tick(&FrameInput::idle(), DT);
        }
        let player = sim.player().expect("loaded");
        assert_eq!(player.rect().bottom(), 500.0);
        assert!(player.on_platform());
    }

    #[test]
    fn test_killing_enemy_scores() {
        let data = arena().with_enemy(EnemyKind::Watcher, 130.0, 460.0);
        let config = SimulationConfig {
            weapon: WeaponConfig {
                knockback: 0.0,
                ..WeaponConfig::default()
            },
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(config, Progression::default());
        sim.load_map(data).expect("valid map");
        let swing = FrameInput::from_held(Default::default(), [PlayerControl::AttackStart]);

        for _ in 0..600 {
            sim.tick(&swing, DT);
            if sim.map().is_some_and(|map| map.enemy_count() == 0) || sim.is_player_dead() {
                break;
            }
        }
        assert_eq!(sim.map().map(Map::enemy_count), Some(0));
        assert_eq!(sim.progression().score, EnemyKind::Watcher.template().score);
    }

    #[test]
    fn test_reset_restores_level() {
        let data = arena().with_enemy(EnemyKind::Grunt, 600.0, 440.0);
        let mut sim = loaded(data);
        sim.progression.score = 500;
        let run = FrameInput::from_held(
            crate::input::HeldKeys {
                right: true,
                ..Default::default()
            },
            [],
        );
        for _ in 0..20 {
            sim.tick(&run, DT);
        }
        assert!(sim.player().is_some_and(|p| p.rect().left > 100.0));

        assert!(sim.reset());
        assert_eq!(sim.progression().score, 0);
        assert_eq!(sim.ticks(), 0);
        let player = sim.player().expect("loaded");
        assert_eq!(player.rect().left, 100.0);
        assert_eq!(player.health(), player.physics().max_health);
        assert_eq!(sim.map().map(Map::enemy_count), Some(1));
    }

    #[test]
    fn test_save_map_reflects_state() {
        let data = arena().with_pickup(300.0, 100.0, 20.0);
        let mut sim = loaded(data);
        for _ in 0..120 {
            sim.tick(&FrameInput::idle(), DT);
        }
        let saved = sim.save_map().expect("loaded");
        assert_eq!(saved.walls.len(), 2);
        assert_eq!(saved.pickups.len(), 1);
        assert!((saved.pickups[0].y - 488.0).abs() < 1e-9);
    }
}
