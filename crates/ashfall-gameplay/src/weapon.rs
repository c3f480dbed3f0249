//! The player's melee weapon.
//!
//! Uses the same [`AttackTimer`] as enemies. The hitbox is a fixed box in
//! front of the player; every enemy it touches during the damage window is hit
//! at most once per swing.

use serde::{Deserialize, Serialize};

use ashfall_common::EntityId;
use ashfall_kernel::Rect;

use crate::attack::{AttackPhase, AttackTick, AttackTimer, AttackTiming};
use crate::entity::Facing;

/// Weapon tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Base damage per hit
    pub damage: f64,
    /// Knockback speed applied to enemies
    pub knockback: f64,
    /// Hitbox reach in front of the player
    pub reach: f64,
    /// Hitbox height, centered on the player
    pub height: f64,
    /// Swing timing
    pub timing: AttackTiming,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            damage: 20.0,
            knockback: 320.0,
            reach: 40.0,
            height: 36.0,
            timing: AttackTiming::new(0.12, 0.15, 0.25),
        }
    }
}

/// A weapon and its swing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    config: WeaponConfig,
    timer: AttackTimer,
    struck: Vec<EntityId>,
}

impl Weapon {
    /// Creates an idle weapon.
    #[must_use]
    pub fn new(config: WeaponConfig) -> Self {
        let timer = AttackTimer::new(config.timing);
        Self {
            config,
            timer,
            struck: Vec::new(),
        }
    }

    /// Tuning.
    #[must_use]
    pub fn config(&self) -> &WeaponConfig {
        &self.config
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> AttackPhase {
        self.timer.phase()
    }

    /// True while winding up or in the damage window.
    #[must_use]
    pub fn is_swinging(&self) -> bool {
        self.timer.phase().is_swinging()
    }

    /// Begins a swing. Returns false if one is running or cooling down.
    pub fn start(&mut self) -> bool {
        if !self.timer.start() {
            return false;
        }
        self.struck.clear();
        true
    }

    /// Releases the attack button. A swing still winding up is cancelled.
    pub fn stop(&mut self) -> bool {
        self.timer.phase() == AttackPhase::Windup && self.timer.interrupt()
    }

    /// Cancels any swing in progress.
    pub fn interrupt(&mut self) -> bool {
        self.timer.interrupt()
    }

    /// Advances the swing.
    pub fn tick(&mut self, dt: f64) -> AttackTick {
        self.timer.tick(dt)
    }

    /// Hitbox for a body at `rect` facing `facing`, while the window is open.
    #[must_use]
    pub fn hit_area(&self, rect: &Rect, facing: Facing) -> Option<Rect> {
        if !self.timer.phase().can_damage() {
            return None;
        }
        let top = rect.center_y() - self.config.height / 2.0;
        Some(match facing {
            Facing::Right => Rect::new(rect.right(), top, self.config.reach, self.config.height),
            Facing::Left => Rect::new(rect.left - self.config.reach, top, self.config.reach, self.config.height),
        })
    }

    /// Records a hit on `target`. Returns false if it was already hit this swing.
    pub fn register_hit(&mut self, target: EntityId) -> bool {
        if self.struck.contains(&target) {
            return false;
        }
        self.struck.push(target);
        true
    }
}

impl Default for Weapon {
    fn default() -> Self {
        Self::new(WeaponConfig::default())
    }
}
