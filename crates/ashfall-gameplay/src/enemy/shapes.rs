//! Attack hitbox shapes.
//!
//! Every shape has a fixed *nominal* area, used to decide whether to start a
//! swing, and a *real* area that changes over the damage window and is what
//! actually hits.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use ashfall_kernel::Rect;

use super::EnemyBody;
use crate::entity::Facing;

/// Describes where an attack lands.
pub trait AttackShape: fmt::Debug + Send {
    /// Region that triggers a swing when the target stands in it.
    fn nominal_area(&self, body: &EnemyBody) -> Rect;

    /// Hitbox at `progress` (0 to 1) through the damage window.
    fn real_area(&self, body: &EnemyBody, progress: f64) -> Rect;
}

/// Box of `reach` x `height` in front of the body, vertically centered.
fn ahead(body: &EnemyBody, reach: f64, height: f64) -> Rect {
    let top = body.rect.center_y() - height / 2.0;
    match body.facing {
        Facing::Right => Rect::new(body.rect.right(), top, reach, height),
        Facing::Left => Rect::new(body.rect.left - reach, top, reach, height),
    }
}

/// Horizontal swing whose reach grows linearly across the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slash {
    /// Full reach
    pub reach: f64,
    /// Hitbox height
    pub height: f64,
}

impl AttackShape for Slash {
    fn nominal_area(&self, body: &EnemyBody) -> Rect {
        ahead(body, self.reach, self.height)
    }

    fn real_area(&self, body: &EnemyBody, progress: f64) -> Rect {
        ahead(body, self.reach * progress.clamp(0.0, 1.0), self.height)
    }
}

/// Narrow thrust that extends and retracts along a half sine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thrust {
    /// Maximum extension
    pub reach: f64,
    /// Hitbox height
    pub height: f64,
}

impl AttackShape for Thrust {
    fn nominal_area(&self, body: &EnemyBody) -> Rect {
        ahead(body, self.reach, self.height)
    }

    fn real_area(&self, body: &EnemyBody, progress: f64) -> Rect {
        let extension = (PI * progress.clamp(0.0, 1.0)).sin();
        ahead(body, self.reach * extension, self.height)
    }
}

/// Ground smash around the body whose radius falls off quadratically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Smash {
    /// Radius at impact
    pub reach: f64,
    /// Height above the feet
    pub height: f64,
}

impl Smash {
    fn around(&self, body: &EnemyBody, radius: f64) -> Rect {
        let center = body.rect.center_x();
        let bottom = body.rect.bottom();
        let half = body.rect.width / 2.0 + radius;
        Rect::new(center - half, bottom - self.height, half * 2.0, self.height)
    }
}

impl AttackShape for Smash {
    fn nominal_area(&self, body: &EnemyBody) -> Rect {
        self.around(body, self.reach * 0.5)
    }

    fn real_area(&self, body: &EnemyBody, progress: f64) -> Rect {
        let remaining = 1.0 - progress.clamp(0.0, 1.0);
        self.around(body, self.reach * remaining * remaining)
    }
}
