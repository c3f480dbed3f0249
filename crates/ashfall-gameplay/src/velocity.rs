//! Velocity composed of independently decaying parts.
//!
//! Horizontal speed is `controlled + roll` and vertical speed is
//! `general + slam`. Reading a total is a sum; writing a total spreads the
//! change over the parts in proportion to their current share, so a part that
//! decays quickly (a roll burst) keeps decaying quickly after a global change
//! such as air drag.

use serde::{Deserialize, Serialize};

/// Sets the sum of `parts` to `total`, preserving their ratios.
///
/// The first part is the primary one. When the parts sum to zero (all zero, or
/// cancelling out) there is no ratio to preserve and the difference lands on it.
pub fn redistribute(parts: &mut [f64], total: f64) {
    if parts.is_empty() {
        return;
    }
    let current: f64 = parts.iter().sum();
    let delta = total - current;
    if delta == 0.0 {
        return;
    }

    if current == 0.0 {
        parts[0] += delta;
        return;
    }

    for part in parts.iter_mut() {
        *part += delta * (*part / current);
    }
}

/// Applies `v /= 1 + k * dt`.
#[must_use]
pub fn decay(value: f64, rate: f64, dt: f64) -> f64 {
    value / (1.0 + rate * dt)
}

/// Player velocity split into its components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposedVelocity {
    /// Horizontal speed from directional control
    pub controlled_vx: f64,
    /// Horizontal speed from rolling
    pub roll_vx: f64,
    /// Vertical speed from gravity and jumps
    pub general_vy: f64,
    /// Vertical speed from slamming
    pub slam_vy: f64,
}

impl ComposedVelocity {
    /// Total horizontal velocity.
    #[must_use]
    pub fn vx(&self) -> f64 {
        self.controlled_vx + self.roll_vx
    }

    /// Total vertical velocity.
    #[must_use]
    pub fn vy(&self) -> f64 {
        self.general_vy + self.slam_vy
    }

    /// Sets the total horizontal velocity.
    pub fn set_vx(&mut self, vx: f64) {
        let mut parts = [self.controlled_vx, self.roll_vx];
        redistribute(&mut parts, vx);
        [self.controlled_vx, self.roll_vx] = parts;
    }

    /// Sets the total vertical velocity.
    pub fn set_vy(&mut self, vy: f64) {
        let mut parts = [self.general_vy, self.slam_vy];
        redistribute(&mut parts, vy);
        [self.general_vy, self.slam_vy] = parts;
    }

    /// Zeroes both horizontal parts.
    pub fn stop_x(&mut self) {
        self.controlled_vx = 0.0;
        self.roll_vx = 0.0;
    }

    /// Zeroes both vertical parts.
    pub fn stop_y(&mut self) {
        self.general_vy = 0.0;
        self.slam_vy = 0.0;
    }
}
