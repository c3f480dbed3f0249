//! Session progression: difficulty, score and stat multipliers.

use serde::{Deserialize, Serialize};

/// Enemy stat increase per difficulty level.
pub const DIFFICULTY_STEP: f64 = 0.15;

/// Values owned by the persistence layer that the core reads and updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progression {
    /// Difficulty level, 0 is the baseline
    pub difficulty: u32,
    /// Accumulated score
    pub score: u64,
    /// Multiplier on enemy health at spawn
    pub health_mul: f64,
    /// Multiplier on enemy and player weapon damage
    pub damage_mul: f64,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            difficulty: 0,
            score: 0,
            health_mul: 1.0,
            damage_mul: 1.0,
        }
    }
}

impl Progression {
    /// Scale applied to enemy stats from difficulty alone.
    #[must_use]
    pub fn difficulty_scale(&self) -> f64 {
        1.0 + DIFFICULTY_STEP * f64::from(self.difficulty)
    }

    /// Health for a newly spawned enemy.
    #[must_use]
    pub fn enemy_health(&self, base: f64) -> f64 {
        base * self.health_mul * self.difficulty_scale()
    }

    /// Damage dealt by an enemy attack.
    #[must_use]
    pub fn enemy_damage(&self, base: f64) -> f64 {
        base * self.damage_mul * self.difficulty_scale()
    }

    /// Damage dealt by the player's weapon.
    #[must_use]
    pub fn player_damage(&self, base: f64) -> f64 {
        base * self.damage_mul
    }

    /// Adds to the score.
    pub fn award(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_is_identity() {
        let p = Progression::default();
        assert_eq!(p.enemy_health(50.0), 50.0);
        assert_eq!(p.enemy_damage(10.0), 10.0);
    }

    #[test]
    fn test_scaling() {
        let p = Progression {
            difficulty: 2,
            health_mul: 2.0,
            damage_mul: 0.5,
            score: 0,
        };
        assert!((p.enemy_health(100.0) - 260.0).abs() < 1e-9);
        assert!((p.enemy_damage(10.0) - 6.5).abs() < 1e-9);
        assert_eq!(p.player_damage(10.0), 5.0);
    }

    #[test]
    fn test_award_saturates() {
        let mut p = Progression {
            score: u64::MAX - 1,
            ..Default::default()
        };
        p.award(10);
        assert_eq!(p.score, u64::MAX);
    }
}
