//! Floating damage numbers.
//!
//! A damage number behaves like a small projectile: it is launched upward from
//! the hit point, decelerates and fades out, then expires. It never collides.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use ashfall_common::EntityId;
use ashfall_kernel::Rect;

use crate::entity::Body;
use crate::velocity::decay;

/// Seconds a number stays on screen.
pub const DAMAGE_NUMBER_LIFETIME: f64 = 0.9;

/// Initial upward speed.
pub const DAMAGE_NUMBER_RISE: f64 = 120.0;

/// Speed decay rate.
pub const DAMAGE_NUMBER_DRAG: f64 = 5.0;

/// Fraction of the lifetime after which the number fades.
const FADE_START: f64 = 0.7;

/// Nominal box used by renderers.
const NUMBER_SIZE: f64 = 16.0;

/// Render state of a damage number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageNumberState {
    /// Damage shown
    pub value: f64,
    /// Opacity from 1 to 0
    pub alpha: f64,
}

/// A floating damage readout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageNumber {
    id: EntityId,
    position: DVec2,
    velocity: DVec2,
    value: f64,
    age: f64,
    lifetime: f64,
}

impl DamageNumber {
    /// Spawns a number at `(x, y)`, drifting sideways by `spread`.
    #[must_use]
    pub fn new(id: EntityId, x: f64, y: f64, value: f64, spread: f64) -> Self {
        Self {
            id,
            position: DVec2::new(x, y),
            velocity: DVec2::new(spread, -DAMAGE_NUMBER_RISE),
            value,
            age: 0.0,
            lifetime: DAMAGE_NUMBER_LIFETIME,
        }
    }

    /// Overrides the lifetime.
    #[must_use]
    pub fn with_lifetime(mut self, seconds: f64) -> Self {
        self.lifetime = seconds.max(0.0);
        self
    }

    /// Entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> DVec2 {
        self.position
    }

    /// Damage shown.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Progress through the lifetime, 0 to 1.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.lifetime <= 0.0 {
            1.0
        } else {
            (self.age / self.lifetime).clamp(0.0, 1.0)
        }
    }

    /// True once the lifetime has run out.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.age >= self.lifetime
    }

    /// Opacity.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        let progress = self.progress();
        if progress <= FADE_START {
            1.0
        } else {
            1.0 - (progress - FADE_START) / (1.0 - FADE_START)
        }
    }

    /// Advances the number. Returns false once it has expired.
    pub fn tick(&mut self, dt: f64) -> bool {
        self.age += dt;
        if self.is_expired() {
            return false;
        }
        self.position += self.velocity * dt;
        self.velocity = DVec2::new(
            decay(self.velocity.x, DAMAGE_NUMBER_DRAG, dt),
            decay(self.velocity.y, DAMAGE_NUMBER_DRAG, dt),
        );
        true
    }
}

impl Body for DamageNumber {
    type State = DamageNumberState;

    fn rect(&self) -> Rect {
        Rect::from_center(self.position, NUMBER_SIZE, NUMBER_SIZE)
    }

    fn state(&self) -> DamageNumberState {
        DamageNumberState {
            value: self.value,
            alpha: self.alpha(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rises_and_slows() {
        let mut n = DamageNumber::new(EntityId::from_raw(1), 100.0, 100.0, 12.0, 0.0);
        n.tick(0.1);
        let first = 100.0 - n.position().y;
        n.tick(0.1);
        let second = 100.0 - n.position().y - first;
        assert!(first > 0.0);
        assert!(second < first);
    }

    #[test]
    fn test_expires() {
        let mut n = DamageNumber::new(EntityId::from_raw(1), 0.0, 0.0, 5.0, 10.0).with_lifetime(0.3);
        assert!(n.tick(0.2));
        assert!(!n.tick(0.2));
        assert!(n.is_expired());
    }

    #[test]
    fn test_fades_late() {
        let mut n = DamageNumber::new(EntityId::from_raw(1), 0.0, 0.0, 5.0, 0.0).with_lifetime(1.0);
        n.tick(0.5);
        assert_eq!(n.alpha(), 1.0);
        n.tick(0.35);
        assert!(n.alpha() < 1.0 && n.alpha() > 0.0);
        assert_eq!(n.state().value, 5.0);
    }
}
