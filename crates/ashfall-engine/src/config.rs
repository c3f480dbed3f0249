//! Runner configuration.
//!
//! Loaded from `ashfall.toml`. Every field has a default, so a partial file is
//! fine and a missing or broken one falls back to defaults entirely.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use ashfall_gameplay::SimulationConfig;

/// Configuration file name.
pub const CONFIG_FILE: &str = "ashfall.toml";

/// Runner configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Session ===
    /// Level to load
    pub map_path: PathBuf,
    /// Input script driving the player (None = the player stands still)
    pub script_path: Option<PathBuf>,
    /// Stop after this many simulated seconds
    pub max_seconds: f64,
    /// Difficulty level for enemy scaling
    pub difficulty: u32,

    // === Timing ===
    /// Fixed simulation steps per second
    pub tick_rate: u32,
    /// Pace ticks against the wall clock instead of running flat out
    pub realtime: bool,
    /// Most fixed steps run for one frame before dropping time
    pub max_ticks_per_frame: u32,

    // === Logging ===
    /// Log every hook event
    pub log_events: bool,
    /// Seconds between status lines (0 = never)
    pub status_interval: f64,

    // === Simulation ===
    /// Player, weapon and camera tuning
    pub simulation: SimulationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            map_path: PathBuf::from("assets/maps/cinder_halls.json"),
            script_path: Some(PathBuf::from("assets/scripts/demo.json")),
            max_seconds: 30.0,
            difficulty: 0,

            tick_rate: 60,
            realtime: false,
            max_ticks_per_frame: 10,

            log_events: true,
            status_interval: 1.0,

            simulation: SimulationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `ashfall.toml` in the working directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // Session
        if !self.max_seconds.is_finite() {
            self.max_seconds = Self::default().max_seconds;
        }
        self.max_seconds = self.max_seconds.clamp(0.0, 3600.0);
        self.difficulty = self.difficulty.min(20);

        // Timing
        self.tick_rate = self.tick_rate.clamp(10, 240);
        self.max_ticks_per_frame = self.max_ticks_per_frame.clamp(1, 30);

        // Logging
        if self.status_interval < 0.0 || !self.status_interval.is_finite() {
            self.status_interval = 0.0;
        }

        // Simulation
        self.simulation.event_capacity = self.simulation.event_capacity.max(16);
    }

    /// Seconds per fixed step.
    #[must_use]
    pub fn fixed_dt(&self) -> f64 {
        1.0 / f64::from(self.tick_rate.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.tick_rate, 60);
        assert!(!config.realtime);
        assert_eq!(config.max_seconds, 30.0);
        assert!((config.fixed_dt() - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.tick_rate = 1;
        config.max_seconds = -4.0;
        config.max_ticks_per_frame = 0;
        config.status_interval = f64::NAN;
        config.simulation.event_capacity = 0;

        config.validate();

        assert_eq!(config.tick_rate, 10);
        assert_eq!(config.max_seconds, 0.0);
        assert_eq!(config.max_ticks_per_frame, 1);
        assert_eq!(config.status_interval, 0.0);
        assert_eq!(config.simulation.event_capacity, 16);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("ashfall.toml");

        let mut config = EngineConfig::default();
        config.tick_rate = 120;
        config.script_path = None;
        config.difficulty = 3;
        config.simulation.physics.jumps = 3;
        config.simulation.weapon.damage = 35.0;

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded.tick_rate, 120);
        assert_eq!(loaded.script_path, None);
        assert_eq!(loaded.difficulty, 3);
        assert_eq!(loaded.simulation.physics.jumps, 3);
        assert_eq!(loaded.simulation.weapon.damage, 35.0);
    }

    #[test]
    fn test_config_partial_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("ashfall.toml");
        fs::write(&config_path, "max_seconds = 5.0\n\n[simulation.physics]\ngravity = 900.0\n").expect("write");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded.max_seconds, 5.0);
        assert_eq!(loaded.simulation.physics.gravity, 900.0);
        assert_eq!(loaded.simulation.physics.jumps, 2);
        assert_eq!(loaded.tick_rate, 60);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = EngineConfig::load_from("/nonexistent/path/ashfall.toml");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_config_load_garbage() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("ashfall.toml");
        fs::write(&config_path, "tick_rate = \"fast\"").expect("write");
        assert_eq!(EngineConfig::load_from(&config_path), EngineConfig::default());
    }
}
