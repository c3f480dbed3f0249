//! Health, invulnerability frames, stagger and the damage overlay bar.

use serde::{Deserialize, Serialize};

/// Default invulnerability window after a hit (seconds).
pub const DEFAULT_I_FRAMES: f64 = 0.5;
/// Seconds the damage overlay holds before draining.
pub const DEFAULT_DAMAGE_BAR_DELAY: f64 = 0.6;
/// Health per second the damage overlay drains.
pub const DEFAULT_DAMAGE_BAR_DECAY: f64 = 60.0;

/// Health state shared by the player and enemies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    health: f64,
    max_health: f64,
    /// Remaining invulnerability (seconds)
    i_frames: f64,
    i_frame_length: f64,
    /// Recently lost health shown as an overlay on the health bar
    h_bar_damage: f64,
    damage_bar_timer: f64,
    damage_bar_delay: f64,
    damage_bar_decay: f64,
    /// Remaining stagger (seconds)
    stagger_time: f64,
    stagger_length: f64,
}

impl Vitals {
    /// Full health with default timings and no stagger.
    #[must_use]
    pub fn new(max_health: f64) -> Self {
        let max_health = max_health.max(1.0);
        Self {
            health: max_health,
            max_health,
            i_frames: 0.0,
            i_frame_length: DEFAULT_I_FRAMES,
            h_bar_damage: 0.0,
            damage_bar_timer: 0.0,
            damage_bar_delay: DEFAULT_DAMAGE_BAR_DELAY,
            damage_bar_decay: DEFAULT_DAMAGE_BAR_DECAY,
            stagger_time: 0.0,
            stagger_length: 0.0,
        }
    }

    /// Sets the invulnerability window.
    #[must_use]
    pub fn with_i_frames(mut self, seconds: f64) -> Self {
        self.i_frame_length = seconds.max(0.0);
        self
    }

    /// Sets how long a hit staggers.
    #[must_use]
    pub fn with_stagger(mut self, seconds: f64) -> Self {
        self.stagger_length = seconds.max(0.0);
        self
    }

    /// Sets the damage overlay timing.
    #[must_use]
    pub fn with_damage_bar(mut self, delay: f64, decay: f64) -> Self {
        self.damage_bar_delay = delay.max(0.0);
        self.damage_bar_decay = decay.max(0.0);
        self
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> f64 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub fn max_health(&self) -> f64 {
        self.max_health
    }

    /// Health as a fraction of the maximum.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        self.health / self.max_health
    }

    /// Recently lost health still shown on the bar.
    #[must_use]
    pub fn h_bar_damage(&self) -> f64 {
        self.h_bar_damage
    }

    /// Remaining invulnerability.
    #[must_use]
    pub fn i_frames(&self) -> f64 {
        self.i_frames
    }

    /// True while invulnerable.
    #[must_use]
    pub fn is_invulnerable(&self) -> bool {
        self.i_frames > 0.0
    }

    /// True while staggered.
    #[must_use]
    pub fn is_staggered(&self) -> bool {
        self.stagger_time > 0.0
    }

    /// Remaining stagger.
    #[must_use]
    pub fn stagger_time(&self) -> f64 {
        self.stagger_time
    }

    /// True at zero health.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Applies damage and returns the amount dealt.
    ///
    /// Rejected (returns 0) while invulnerable or dead. Otherwise the damage is
    /// clamped to the remaining health, added to the overlay bar, and starts
    /// both the stagger and the invulnerability window.
    pub fn take_hit(&mut self, damage: f64) -> f64 {
        if self.is_invulnerable() || self.is_dead() {
            return 0.0;
        }
        let dealt = damage.clamp(0.0, self.health);
        self.health -= dealt;
        self.h_bar_damage += dealt;
        self.damage_bar_timer = self.damage_bar_delay;
        self.stagger_time = self.stagger_length;
        self.i_frames = self.i_frame_length;
        dealt
    }

    /// Restores health up to the maximum and returns the amount restored.
    ///
    /// Healing eats into the damage overlay first.
    pub fn heal(&mut self, amount: f64) -> f64 {
        if self.is_dead() {
            return 0.0;
        }
        let healed = amount.max(0.0).min(self.max_health - self.health);
        self.health += healed;
        self.h_bar_damage = (self.h_bar_damage - healed).max(0.0);
        healed
    }

    /// Cancels any remaining stagger.
    pub fn clear_stagger(&mut self) {
        self.stagger_time = 0.0;
    }

    /// Advances all timers.
    pub fn tick(&mut self, dt: f64) {
        self.i_frames = (self.i_frames - dt).max(0.0);
        self.stagger_time = (self.stagger_time - dt).max(0.0);
        if self.damage_bar_timer > 0.0 {
            self.damage_bar_timer = (self.damage_bar_timer - dt).max(0.0);
        } else {
            self.h_bar_damage = (self.h_bar_damage - self.damage_bar_decay * dt).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_hit_scenario() {
        let mut v = Vitals::new(50.0).with_stagger(0.3);
        let dealt = v.take_hit(30.0);

        assert_eq!(dealt, 30.0);
        assert_eq!(v.health(), 20.0);
        assert_eq!(v.h_bar_damage(), 30.0);
        assert!(v.is_staggered());

        // Second hit inside the invulnerability window is ignored
        v.tick(DEFAULT_I_FRAMES / 2.0);
        assert_eq!(v.take_hit(30.0), 0.0);
        assert_eq!(v.health(), 20.0);
    }

    #[test]
    fn test_damage_clamped_to_health() {
        let mut v = Vitals::new(10.0);
        assert_eq!(v.take_hit(25.0), 10.0);
        assert!(v.is_dead());
        assert_eq!(v.take_hit(5.0), 0.0);
    }

    #[test]
    fn test_hit_after_i_frames() {
        let mut v = Vitals::new(100.0).with_i_frames(0.2);
        v.take_hit(10.0);
        v.tick(0.25);
        assert_eq!(v.take_hit(10.0), 10.0);
        assert_eq!(v.health(), 80.0);
    }

    #[test]
    fn test_damage_bar_drains_after_delay() {
        let mut v = Vitals::new(100.0).with_damage_bar(0.5, 10.0);
        v.take_hit(20.0);
        v.tick(0.4);
        assert_eq!(v.h_bar_damage(), 20.0);
        v.tick(0.2); // finishes the delay
        v.tick(1.0);
        assert!((v.h_bar_damage() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_heal_recovers_overlay() {
        let mut v = Vitals::new(100.0);
        v.take_hit(40.0);
        assert_eq!(v.heal(15.0), 15.0);
        assert_eq!(v.health(), 75.0);
        assert_eq!(v.h_bar_damage(), 25.0);
        assert_eq!(v.heal(500.0), 25.0);
        assert_eq!(v.h_bar_damage(), 0.0);
    }
}
