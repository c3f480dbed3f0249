//! Attack timing shared by enemies and the player weapon.
//!
//! A swing sets `atk_time = windup + length` and counts it down. While
//! `atk_time > length` the attacker is winding up; once it drops to `length`
//! the damage window opens and stays open until `atk_time` reaches zero, at
//! which point the cooldown timer starts.

use serde::{Deserialize, Serialize};

/// Phase of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackPhase {
    /// Ready to swing.
    Idle,
    /// Preparing to strike.
    Windup,
    /// Damage window.
    Active,
    /// Waiting before the next swing.
    Cooldown,
}

impl AttackPhase {
    /// Check if attack can deal damage.
    #[must_use]
    pub fn can_damage(&self) -> bool {
        *self == Self::Active
    }

    /// True during windup or active.
    #[must_use]
    pub fn is_swinging(&self) -> bool {
        matches!(self, Self::Windup | Self::Active)
    }
}

/// Timing configuration for an attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackTiming {
    /// Windup duration (seconds).
    pub windup: f64,
    /// Damage window duration (seconds).
    pub length: f64,
    /// Cooldown after the swing (seconds).
    pub cooldown: f64,
}

impl Default for AttackTiming {
    fn default() -> Self {
        Self {
            windup: 0.3,
            length: 0.2,
            cooldown: 0.8,
        }
    }
}

impl AttackTiming {
    /// Creates timing, clamping negatives to zero and the window to a minimum.
    #[must_use]
    pub fn new(windup: f64, length: f64, cooldown: f64) -> Self {
        Self {
            windup: windup.max(0.0),
            length: length.max(0.01),
            cooldown: cooldown.max(0.0),
        }
    }

    /// Windup plus damage window.
    #[must_use]
    pub fn swing_duration(&self) -> f64 {
        self.windup + self.length
    }
}

/// Result of advancing an [`AttackTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackTick {
    /// Nothing changed phase
    Continue,
    /// The damage window opened this tick
    Opened,
    /// The swing finished this tick and cooldown started
    Finished,
}

/// Countdown state for one attacker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackTimer {
    timing: AttackTiming,
    atk_time: f64,
    atk_cd: f64,
    hit_landed: bool,
}

impl AttackTimer {
    /// Creates an idle timer.
    #[must_use]
    pub fn new(timing: AttackTiming) -> Self {
        Self {
            timing,
            atk_time: 0.0,
            atk_cd: 0.0,
            hit_landed: false,
        }
    }

    /// The timing in use.
    #[must_use]
    pub fn timing(&self) -> &AttackTiming {
        &self.timing
    }

    /// Remaining swing time.
    #[must_use]
    pub fn atk_time(&self) -> f64 {
        self.atk_time
    }

    /// Remaining cooldown.
    #[must_use]
    pub fn cooldown(&self) -> f64 {
        self.atk_cd
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> AttackPhase {
        if self.atk_time > 0.0 {
            if self.atk_time <= self.timing.length {
                AttackPhase::Active
            } else {
                AttackPhase::Windup
            }
        } else if self.atk_cd > 0.0 {
            AttackPhase::Cooldown
        } else {
            AttackPhase::Idle
        }
    }

    /// How far through the damage window the swing is, 0 at open to 1 at close.
    #[must_use]
    pub fn progress(&self) -> Option<f64> {
        (self.phase() == AttackPhase::Active)
            .then(|| (1.0 - self.atk_time / self.timing.length).clamp(0.0, 1.0))
    }

    /// Starts a swing if idle. Returns true if it started.
    pub fn start(&mut self) -> bool {
        if self.phase() != AttackPhase::Idle {
            return false;
        }
        self.atk_time = self.timing.swing_duration();
        self.hit_landed = false;
        true
    }

    /// Aborts a swing in progress and starts the cooldown. Returns true if a swing was aborted.
    pub fn interrupt(&mut self) -> bool {
        if !self.phase().is_swinging() {
            return false;
        }
        self.atk_time = 0.0;
        self.atk_cd = self.timing.cooldown;
        true
    }

    /// Whether this swing already connected.
    #[must_use]
    pub fn hit_landed(&self) -> bool {
        self.hit_landed
    }

    /// Marks this swing as having connected.
    pub fn mark_hit(&mut self) {
        self.hit_landed = true;
    }

    /// Advances the timer.
    pub fn tick(&mut self, dt: f64) -> AttackTick {
        if self.atk_time > 0.0 {
            let was = self.phase();
            self.atk_time -= dt;
            if self.atk_time <= 0.0 {
                self.atk_time = 0.0;
                self.atk_cd = self.timing.cooldown;
                return AttackTick::Finished;
            }
            if was == AttackPhase::Windup && self.phase() == AttackPhase::Active {
                return AttackTick::Opened;
            }
        } else if self.atk_cd > 0.0 {
            self.atk_cd = (self.atk_cd - dt).max(0.0);
        }
        AttackTick::Continue
    }
}
