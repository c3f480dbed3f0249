//! Serializable map description.
//!
//! This is the shape the loader parses from JSON and [`crate::map::Map::save`]
//! writes back. Only the loader validates it; the simulation trusts whatever
//! it is handed.

use serde::{Deserialize, Serialize};

use ashfall_common::{MapError, MapResult};
use ashfall_kernel::Rect;

use crate::enemy::EnemyKind;
use crate::entity::Facing;

/// Default grid cell size.
pub const DEFAULT_CELL_SIZE: i32 = 64;

/// Enemy placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    /// Enemy kind
    pub kind: EnemyKind,
    /// Spawn left edge
    pub x: f64,
    /// Spawn top edge
    pub y: f64,
    /// Initial facing
    #[serde(default)]
    pub facing: Facing,
}

/// Health pickup placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupSpawn {
    /// Spawn left edge
    pub x: f64,
    /// Spawn top edge
    pub y: f64,
    /// Health restored on collection
    #[serde(default = "default_heal")]
    pub heal: f64,
}

fn default_heal() -> f64 {
    crate::pickup::DEFAULT_HEAL
}

fn default_cell_size() -> i32 {
    DEFAULT_CELL_SIZE
}

/// A complete level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    /// World width
    pub width: f64,
    /// World height
    pub height: f64,
    /// Grid cell size
    #[serde(default = "default_cell_size")]
    pub cell_size: i32,
    /// Player spawn box
    pub player_spawn: Rect,
    /// Player facing at spawn
    #[serde(default)]
    pub init_facing: Facing,
    /// Solid walls
    pub walls: Vec<Rect>,
    /// One-way platforms
    #[serde(default)]
    pub platforms: Vec<Rect>,
    /// Enemy placements
    #[serde(default)]
    pub enemies: Vec<EnemySpawn>,
    /// Pickup placements
    #[serde(default)]
    pub pickups: Vec<PickupSpawn>,
    /// Seed for patrol placement, wandering and drops
    #[serde(default)]
    pub seed: u64,
}

impl MapData {
    /// Creates an empty map of the given size.
    #[must_use]
    pub fn new(width: f64, height: f64, player_spawn: Rect) -> Self {
        Self {
            width,
            height,
            cell_size: DEFAULT_CELL_SIZE,
            player_spawn,
            init_facing: Facing::Right,
            walls: Vec::new(),
            platforms: Vec::new(),
            enemies: Vec::new(),
            pickups: Vec::new(),
            seed: 0,
        }
    }

    /// Adds a wall.
    #[must_use]
    pub fn with_wall(mut self, rect: Rect) -> Self {
        self.walls.push(rect);
        self
    }

    /// Adds a one-way platform.
    #[must_use]
    pub fn with_platform(mut self, rect: Rect) -> Self {
        self.platforms.push(rect);
        self
    }

    /// Adds an enemy.
    #[must_use]
    pub fn with_enemy(mut self, kind: EnemyKind, x: f64, y: f64) -> Self {
        self.enemies.push(EnemySpawn {
            kind,
            x,
            y,
            facing: Facing::Left,
        });
        self
    }

    /// Adds a pickup.
    #[must_use]
    pub fn with_pickup(mut self, x: f64, y: f64, heal: f64) -> Self {
        self.pickups.push(PickupSpawn { x, y, heal });
        self
    }

    /// Sets the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Parses and validates JSON map data.
    pub fn from_json(json: &str) -> MapResult<Self> {
        let data: Self = serde_json::from_str(json).map_err(|e| MapError::Parse(e.to_string()))?;
        data.validate()?;
        Ok(data)
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> MapResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| MapError::Parse(e.to_string()))
    }

    /// Checks sizes and rectangles.
    pub fn validate(&self) -> MapResult<()> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(MapError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.cell_size <= 0 {
            return Err(MapError::InvalidCellSize(self.cell_size));
        }
        if !rect_ok(&self.player_spawn) {
            return Err(MapError::InvalidRect {
                what: "player spawn",
                index: 0,
            });
        }
        check_rects("wall", &self.walls)?;
        check_rects("platform", &self.platforms)
    }
}

fn rect_ok(rect: &Rect) -> bool {
    rect.width >= 0.0 && rect.height >= 0.0 && rect.left.is_finite() && rect.top.is_finite()
}

fn check_rects(what: &'static str, rects: &[Rect]) -> MapResult<()> {
    match rects.iter().position(|r| !rect_ok(r)) {
        Some(index) => Err(MapError::InvalidRect { what, index }),
        None => Ok(()),
    }
}
