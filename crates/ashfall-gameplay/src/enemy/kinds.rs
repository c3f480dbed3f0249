//! Enemy kind table.
//!
//! Each kind is data: a template naming its stats and which movement, sense
//! and attack strategies it composes.

use serde::{Deserialize, Serialize};

use super::movement::{GroundPatrol, Movement, Stationary};
use super::sense::{OrientedSense, RectSense, Sense};
use super::shapes::{AttackShape, Slash, Smash, Thrust};
use crate::attack::AttackTiming;

/// Known enemy kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    /// Basic sword patrol
    Grunt,
    /// Slow, heavy, sees through walls
    Brute,
    /// Spear thrust with long reach
    Lancer,
    /// Hovering sentry with a tilted sensor beam
    Watcher,
}

impl EnemyKind {
    /// All kinds.
    pub const ALL: [EnemyKind; 4] = [Self::Grunt, Self::Brute, Self::Lancer, Self::Watcher];

    /// The template for this kind.
    #[must_use]
    pub fn template(self) -> EnemyTemplate {
        match self {
            Self::Grunt => EnemyTemplate {
                width: 22.0,
                height: 44.0,
                health: 50.0,
                damage: 12.0,
                knockback: 260.0,
                timing: AttackTiming::new(0.3, 0.2, 0.8),
                movement: MovementKind::Patrol {
                    walk_speed: 60.0,
                    chase_speed: 140.0,
                    pause: 1.2,
                },
                sense: SenseKind::Rect {
                    range: 260.0,
                    height: 80.0,
                    xray: false,
                },
                shape: ShapeKind::Slash {
                    reach: 36.0,
                    height: 30.0,
                },
                score: 100,
                ..EnemyTemplate::default()
            },
            Self::Brute => EnemyTemplate {
                width: 36.0,
                height: 56.0,
                health: 140.0,
                damage: 28.0,
                knockback: 480.0,
                stagger_length: 0.15,
                timing: AttackTiming::new(0.7, 0.25, 1.4),
                movement: MovementKind::Patrol {
                    walk_speed: 35.0,
                    chase_speed: 80.0,
                    pause: 2.0,
                },
                sense: SenseKind::Rect {
                    range: 180.0,
                    height: 120.0,
                    xray: true,
                },
                shape: ShapeKind::Smash {
                    reach: 70.0,
                    height: 24.0,
                },
                score: 300,
                drop_chance: 0.6,
                ..EnemyTemplate::default()
            },
            Self::Lancer => EnemyTemplate {
                health: 70.0,
                damage: 18.0,
                timing: AttackTiming::new(0.45, 0.3, 1.0),
                movement: MovementKind::Patrol {
                    walk_speed: 55.0,
                    chase_speed: 120.0,
                    pause: 1.0,
                },
                sense: SenseKind::Rect {
                    range: 320.0,
                    height: 60.0,
                    xray: false,
                },
                shape: ShapeKind::Thrust {
                    reach: 72.0,
                    height: 10.0,
                },
                score: 180,
                ..EnemyTemplate::default()
            },
            Self::Watcher => EnemyTemplate {
                width: 28.0,
                height: 28.0,
                health: 40.0,
                damage: 10.0,
                gravity: 0.0,
                alert_delay: 0.2,
                alert_retain_length: 4.0,
                movement: MovementKind::Stationary,
                sense: SenseKind::Oriented {
                    length: 300.0,
                    half_width: 14.0,
                    tilt: 0.35,
                    line_of_sight: true,
                },
                shape: ShapeKind::Slash {
                    reach: 28.0,
                    height: 28.0,
                },
                score: 120,
                ..EnemyTemplate::default()
            },
        }
    }
}

/// Movement strategy selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MovementKind {
    /// Does not move
    Stationary,
    /// Walks within its patrol area
    Patrol {
        /// Wandering speed
        walk_speed: f64,
        /// Chasing speed
        chase_speed: f64,
        /// Pause between wander legs
        pause: f64,
    },
}

impl MovementKind {
    /// Instantiates the strategy.
    #[must_use]
    pub fn build(&self) -> Box<dyn Movement> {
        match *self {
            Self::Stationary => Box::new(Stationary),
            Self::Patrol {
                walk_speed,
                chase_speed,
                pause,
            } => Box::new(GroundPatrol::new(walk_speed, chase_speed, pause)),
        }
    }
}

/// Sense strategy selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SenseKind {
    /// Vision rectangle
    Rect {
        /// Range ahead
        range: f64,
        /// Vertical extent
        height: f64,
        /// Ignore walls
        xray: bool,
    },
    /// Oriented sensor beam
    Oriented {
        /// Beam length
        length: f64,
        /// Half thickness
        half_width: f64,
        /// Downward tilt (radians)
        tilt: f64,
        /// Require a clear line
        line_of_sight: bool,
    },
}

impl SenseKind {
    /// Instantiates the strategy.
    #[must_use]
    pub fn build(&self) -> Box<dyn Sense> {
        match *self {
            Self::Rect { range, height, xray } => Box::new(RectSense { range, height, xray }),
            Self::Oriented {
                length,
                half_width,
                tilt,
                line_of_sight,
            } => Box::new(OrientedSense {
                length,
                half_width,
                tilt,
                line_of_sight,
            }),
        }
    }
}

/// Attack shape selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeKind {
    /// Linear slash
    Slash {
        /// Reach
        reach: f64,
        /// Height
        height: f64,
    },
    /// Sinusoidal thrust
    Thrust {
        /// Reach
        reach: f64,
        /// Height
        height: f64,
    },
    /// Quadratic smash
    Smash {
        /// Reach
        reach: f64,
        /// Height
        height: f64,
    },
}

impl ShapeKind {
    /// Instantiates the shape.
    #[must_use]
    pub fn build(&self) -> Box<dyn AttackShape> {
        match *self {
            Self::Slash { reach, height } => Box::new(Slash { reach, height }),
            Self::Thrust { reach, height } => Box::new(Thrust { reach, height }),
            Self::Smash { reach, height } => Box::new(Smash { reach, height }),
        }
    }
}

/// Stats and strategy choices for one enemy kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTemplate {
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
    /// Base health before multipliers
    pub health: f64,
    /// Base attack damage before multipliers
    pub damage: f64,
    /// Knockback speed applied to the target
    pub knockback: f64,
    /// Downward acceleration
    pub gravity: f64,
    /// Terminal fall speed
    pub fall_speed_cap: f64,
    /// Stagger after taking a hit
    pub stagger_length: f64,
    /// Invulnerability after taking a hit
    pub i_frames: f64,
    /// Time between first sighting and full alert
    pub alert_delay: f64,
    /// Time the enemy stays alerted after losing sight
    pub alert_retain_length: f64,
    /// Attack timing
    pub timing: AttackTiming,
    /// Movement strategy
    pub movement: MovementKind,
    /// Sense strategy
    pub sense: SenseKind,
    /// Attack shape
    pub shape: ShapeKind,
    /// Score awarded on kill
    pub score: u64,
    /// Probability of dropping a health pickup on death
    pub drop_chance: f64,
}

impl Default for EnemyTemplate {
    fn default() -> Self {
        Self {
            width: 22.0,
            height: 44.0,
            health: 50.0,
            damage: 10.0,
            knockback: 240.0,
            gravity: 1800.0,
            fall_speed_cap: 900.0,
            stagger_length: 0.35,
            i_frames: 0.2,
            alert_delay: 0.4,
            alert_retain_length: 2.5,
            timing: AttackTiming::default(),
            movement: MovementKind::Stationary,
            sense: SenseKind::Rect {
                range: 200.0,
                height: 60.0,
                xray: false,
            },
            shape: ShapeKind::Slash {
                reach: 30.0,
                height: 24.0,
            },
            score: 50,
            drop_chance: 0.25,
        }
    }
}
