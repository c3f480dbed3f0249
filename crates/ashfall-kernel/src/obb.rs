//! Oriented boxes with separating-axis overlap.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Rectangle rotated by `angle` radians about its center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedBox {
    /// Center point
    pub center: DVec2,
    /// Half width and half height before rotation
    pub half_extents: DVec2,
    /// Rotation in radians (clockwise on screen, since y points down)
    pub angle: f64,
}

impl OrientedBox {
    /// Creates a new oriented box.
    #[must_use]
    pub fn new(center: DVec2, half_extents: DVec2, angle: f64) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
            angle,
        }
    }

    /// Unrotated box covering `rect`.
    #[must_use]
    pub fn from_rect(rect: &Rect) -> Self {
        Self::new(rect.center(), rect.size() / 2.0, 0.0)
    }

    /// The box's local x and y axes as unit vectors.
    #[must_use]
    pub fn axes(&self) -> [DVec2; 2] {
        let (sin, cos) = self.angle.sin_cos();
        [DVec2::new(cos, sin), DVec2::new(-sin, cos)]
    }

    /// Corners in order: top-left, top-right, bottom-right, bottom-left (local frame).
    #[must_use]
    pub fn corners(&self) -> [DVec2; 4] {
        let [ax, ay] = self.axes();
        let x = ax * self.half_extents.x;
        let y = ay * self.half_extents.y;
        [
            self.center - x - y,
            self.center + x - y,
            self.center + x + y,
            self.center - x + y,
        ]
    }

    /// Axis-aligned bounds of the rotated box.
    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        let corners = self.corners();
        let mut min = corners[0];
        let mut max = corners[0];
        for c in &corners[1..] {
            min = min.min(*c);
            max = max.max(*c);
        }
        Rect::from_corners(min, max)
    }

    /// Separating-axis test. Boxes that only touch are separated.
    #[must_use]
    pub fn overlaps(&self, other: &OrientedBox) -> bool {
        let mine = self.corners();
        let theirs = other.corners();
        let [a0, a1] = self.axes();
        let [b0, b1] = other.axes();

        for axis in [a0, a1, b0, b1] {
            let (min_a, max_a) = project(&mine, axis);
            let (min_b, max_b) = project(&theirs, axis);
            if max_a <= min_b || max_b <= min_a {
                return false;
            }
        }
        true
    }

    /// Overlap test against an axis-aligned rectangle.
    #[must_use]
    pub fn overlaps_rect(&self, rect: &Rect) -> bool {
        self.overlaps(&OrientedBox::from_rect(rect))
    }
}

fn project(corners: &[DVec2; 4], axis: DVec2) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for c in corners {
        let p = c.dot(axis);
        min = min.min(p);
        max = max.max(p);
    }
    (min, max)
}
