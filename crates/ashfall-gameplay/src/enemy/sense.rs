//! Enemy senses: vision rectangles, oriented sensors and line of sight.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use ashfall_kernel::{segment_intersects_rect, OrientedBox, Rect, SpatialGrid};

use super::EnemyBody;
use crate::entity::{EntityRef, Facing};

/// Answers whether walls block a line between two points.
pub trait SightQuery {
    /// True if any wall interrupts the segment.
    fn line_blocked(&self, from: DVec2, to: DVec2) -> bool;
}

/// Line of sight over the walls registered in a map grid.
pub struct WallSight<'a> {
    grid: &'a SpatialGrid<EntityRef>,
}

impl<'a> WallSight<'a> {
    /// Creates a sight query over `grid`.
    #[must_use]
    pub fn new(grid: &'a SpatialGrid<EntityRef>) -> Self {
        Self { grid }
    }
}

impl SightQuery for WallSight<'_> {
    fn line_blocked(&self, from: DVec2, to: DVec2) -> bool {
        // Padded so a perfectly horizontal or vertical line still has area.
        let bounds = Rect::from_corners(from.min(to) - DVec2::ONE, from.max(to) + DVec2::ONE);
        self.grid
            .query_with_bounds(&bounds, true, EntityRef::is_wall)
            .iter()
            .any(|(_, wall)| segment_intersects_rect(from, to, wall))
    }
}

/// Detects the target.
pub trait Sense: fmt::Debug + Send {
    /// True if the enemy perceives `target` this tick.
    fn detects(&self, body: &EnemyBody, target: &Rect, sight: &dyn SightQuery) -> bool;

    /// World region the sense covers, for debug overlays.
    fn coverage(&self, body: &EnemyBody) -> Rect;
}

/// Rectangle in front of the enemy, optionally blocked by walls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectSense {
    /// How far ahead the enemy sees
    pub range: f64,
    /// Vertical extent of the vision box, centered on the enemy
    pub height: f64,
    /// See through walls
    pub xray: bool,
}

impl RectSense {
    fn vision_rect(&self, body: &EnemyBody) -> Rect {
        let cx = body.rect.center_x();
        let top = body.rect.center_y() - self.height / 2.0;
        match body.facing {
            Facing::Right => Rect::new(cx, top, self.range, self.height),
            Facing::Left => Rect::new(cx - self.range, top, self.range, self.height),
        }
    }
}

impl Sense for RectSense {
    fn detects(&self, body: &EnemyBody, target: &Rect, sight: &dyn SightQuery) -> bool {
        if !self.vision_rect(body).overlaps(target) {
            return false;
        }
        self.xray || !sight.line_blocked(body.rect.center(), target.center())
    }

    fn coverage(&self, body: &EnemyBody) -> Rect {
        self.vision_rect(body)
    }
}

/// A rotated beam cast ahead of the enemy, tested with separating axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientedSense {
    /// Beam length
    pub length: f64,
    /// Half of the beam thickness
    pub half_width: f64,
    /// Downward tilt in radians
    pub tilt: f64,
    /// Require a clear line to the target
    pub line_of_sight: bool,
}

impl OrientedSense {
    /// The sensor box for the enemy's current pose.
    #[must_use]
    pub fn beam(&self, body: &EnemyBody) -> OrientedBox {
        let angle = match body.facing {
            Facing::Right => self.tilt,
            Facing::Left => std::f64::consts::PI - self.tilt,
        };
        let direction = DVec2::new(angle.cos(), angle.sin());
        let center = body.rect.center() + direction * (self.length / 2.0);
        OrientedBox::new(center, DVec2::new(self.length / 2.0, self.half_width), angle)
    }
}

impl Sense for OrientedSense {
    fn detects(&self, body: &EnemyBody, target: &Rect, sight: &dyn SightQuery) -> bool {
        if !self.beam(body).overlaps_rect(target) {
            return false;
        }
        !self.line_of_sight || !sight.line_blocked(body.rect.center(), target.center())
    }

    fn coverage(&self, body: &EnemyBody) -> Rect {
        self.beam(body).bounding_rect()
    }
}
