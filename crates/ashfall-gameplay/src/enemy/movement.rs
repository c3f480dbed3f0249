//! Enemy steering strategies.
//!
//! A strategy only decides the walking speed for the tick. Gravity, knockback
//! and collision are applied the same way for every enemy in [`super::Enemy`].

use fastrand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AlertState, EnemyBody};

/// Distance at which a walk target counts as reached.
const ARRIVE_DISTANCE: f64 = 2.0;

/// What the enemy's brain wants this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteerIntent {
    /// Current alert state
    pub alert: AlertState,
    /// True while winding up or swinging
    pub attacking: bool,
    /// Where the target's box would put our left edge if we stood on it
    pub target_left: f64,
}

/// Chooses a horizontal walking speed.
pub trait Movement: fmt::Debug + Send {
    /// Desired horizontal velocity for this tick.
    fn steer(&mut self, body: &EnemyBody, intent: &SteerIntent, rng: &mut Rng, dt: f64) -> f64;
}

/// Never moves on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stationary;

impl Movement for Stationary {
    fn steer(&mut self, _body: &EnemyBody, _intent: &SteerIntent, _rng: &mut Rng, _dt: f64) -> f64 {
        0.0
    }
}

/// Wanders inside its patrol area while idle and chases the target when alerted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundPatrol {
    /// Wandering speed
    pub walk_speed: f64,
    /// Chasing speed
    pub chase_speed: f64,
    /// Pause between wander legs (seconds)
    pub pause: f64,
    #[serde(skip)]
    wander_target: Option<f64>,
    #[serde(skip)]
    pause_timer: f64,
}

impl GroundPatrol {
    /// Creates a patrol strategy.
    #[must_use]
    pub fn new(walk_speed: f64, chase_speed: f64, pause: f64) -> Self {
        Self {
            walk_speed,
            chase_speed,
            pause,
            wander_target: None,
            pause_timer: 0.0,
        }
    }

    /// Current wander destination, if any.
    #[must_use]
    pub fn wander_target(&self) -> Option<f64> {
        self.wander_target
    }

    fn approach(left: f64, target: f64, speed: f64) -> f64 {
        let dx = target - left;
        if dx.abs() < ARRIVE_DISTANCE {
            0.0
        } else {
            speed * dx.signum()
        }
    }
}

impl Movement for GroundPatrol {
    fn steer(&mut self, body: &EnemyBody, intent: &SteerIntent, rng: &mut Rng, dt: f64) -> f64 {
        let area = body.patrol;
        match intent.alert {
            AlertState::Dead | AlertState::Alerting => return 0.0,
            AlertState::Alerted => {
                self.wander_target = None;
                if intent.attacking {
                    return 0.0;
                }
                let target = area.clamp(intent.target_left);
                return Self::approach(body.rect.left, target, self.chase_speed);
            },
            AlertState::Idle => {},
        }

        if area.is_fixed() {
            return 0.0;
        }
        if self.pause_timer > 0.0 {
            self.pause_timer = (self.pause_timer - dt).max(0.0);
            return 0.0;
        }

        let target = *self
            .wander_target
            .get_or_insert_with(|| area.min_left + rng.f64() * area.width());
        let vx = Self::approach(body.rect.left, target, self.walk_speed);
        if vx == 0.0 {
            self.wander_target = None;
            self.pause_timer = self.pause;
        }
        vx
    }
}
