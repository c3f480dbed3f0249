//! Player movement tuning and force helpers.
//!
//! Every constant the player state machine uses lives in [`PlayerPhysics`] so
//! it can be overridden from the engine configuration.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Player movement configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerPhysics {
    /// Player width
    pub width: f64,
    /// Standing height
    pub height: f64,
    /// Maximum health
    pub max_health: f64,
    /// Invulnerability after being hit (seconds)
    pub i_frames: f64,

    /// Downward acceleration (px/s²)
    pub gravity: f64,
    /// Terminal fall speed outside of a slam
    pub drop_speed_cap: f64,
    /// Horizontal acceleration from held direction
    pub control_accel: f64,
    /// Acceleration multiplier while sprint is held
    pub sprint_multiplier: f64,

    /// Jump charges restored on landing
    pub jumps: u32,
    /// Upward speed of a jump
    pub jump_strength: f64,
    /// Horizontal speed away from the wall on a wall-jump
    pub wall_jump_strength: f64,

    /// Roll duration (seconds)
    pub roll_length: f64,
    /// Horizontal speed pinned during a roll
    pub roll_speed: f64,
    /// Delay after a roll before another can start
    pub roll_cooldown: f64,
    /// Lowest height during the roll morph
    pub roll_min_height: f64,

    /// Downward speed at the start of a slam
    pub slam_strength: f64,

    /// Highest ledge (as a fraction of height) the player can pull up onto
    pub ledge_climb_height: f64,
    /// Speed of the kinematic ledge pull-up
    pub ledge_climb_speed: f64,

    /// How long a wall-climb lasts (seconds)
    pub wall_climb_length: f64,
    /// Upward speed while wall-climbing
    pub wall_climb_speed: f64,
    /// Gravity multiplier while sliding down a wall
    pub wall_slide_gravity: f64,
    /// Fall speed cap while sliding down a wall
    pub wall_slide_speed: f64,

    /// Decay rate for controlled horizontal speed
    pub controlled_decay: f64,
    /// Decay rate for roll speed
    pub roll_decay: f64,
    /// Decay rate for slam speed
    pub slam_decay: f64,
    /// Decay rate for general vertical speed
    pub base_decay: f64,
    /// Air resistance coefficient
    pub air_resistance: f64,

    /// Enemy push-apart strength
    pub repulsion_strength: f64,
    /// Softening term for the push-apart force
    pub repulsion_epsilon: f64,
    /// Maximum push-apart acceleration
    pub repulsion_cap: f64,
}

impl Default for PlayerPhysics {
    fn default() -> Self {
        Self {
            width: 24.0,
            height: 48.0,
            max_health: 100.0,
            i_frames: 0.8,
            gravity: 1800.0,
            drop_speed_cap: 900.0,
            control_accel: 2600.0,
            sprint_multiplier: 1.5,
            jumps: 2,
            jump_strength: 620.0,
            wall_jump_strength: 380.0,
            roll_length: 0.45,
            roll_speed: 480.0,
            roll_cooldown: 0.35,
            roll_min_height: 24.0,
            slam_strength: 1300.0,
            ledge_climb_height: 0.6,
            ledge_climb_speed: 260.0,
            wall_climb_length: 0.5,
            wall_climb_speed: 220.0,
            wall_slide_gravity: 0.35,
            wall_slide_speed: 160.0,
            controlled_decay: 9.0,
            roll_decay: 14.0,
            slam_decay: 3.0,
            base_decay: 0.5,
            air_resistance: 1.5e-5,
            repulsion_strength: 4.0e5,
            repulsion_epsilon: 50.0,
            repulsion_cap: 1500.0,
        }
    }
}

/// Drag deceleration `sign(v) * area * coeff * v² / 2`.
#[must_use]
pub fn air_drag(velocity: f64, area: f64, coeff: f64) -> f64 {
    velocity.signum() * area * coeff * velocity * velocity / 2.0
}

/// Applies drag over `dt` without letting it reverse the direction of travel.
#[must_use]
pub fn apply_drag(velocity: f64, area: f64, coeff: f64, dt: f64) -> f64 {
    if velocity == 0.0 {
        return 0.0;
    }
    let slowed = velocity - air_drag(velocity, area, coeff) * dt;
    if slowed.signum() == velocity.signum() {
        slowed
    } else {
        0.0
    }
}

/// Inverse-square push-apart acceleration on `me` away from `other`.
///
/// The magnitude is `strength / (d² + epsilon)`, capped at `cap`. Coincident
/// centers push straight up.
#[must_use]
pub fn repulsion(me: DVec2, other: DVec2, strength: f64, epsilon: f64, cap: f64) -> DVec2 {
    let offset = me - other;
    let distance_sq = offset.length_squared();
    let magnitude = (strength / (distance_sq + epsilon.max(f64::EPSILON))).min(cap);
    let direction = offset.try_normalize().unwrap_or(DVec2::NEG_Y);
    direction * magnitude
}

/// Triangular wave over `t` in [0, 1]: 0 at both ends, 1 in the middle.
#[must_use]
pub fn triangle_wave(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (2.0 * t - 1.0).abs()
}
