//! Axis-aligned rectangles and directions.
//!
//! A [`Rect`] stores only `left`, `top`, `width` and `height`. Every other edge
//! is computed, and edge setters move the rectangle through `left`/`top` so the
//! size never changes as a side effect of positioning.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in world space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// X coordinate of the left edge.
    pub left: f64,
    /// Y coordinate of the top edge.
    pub top: f64,
    /// Width of the rectangle.
    pub width: f64,
    /// Height of the rectangle.
    pub height: f64,
}

impl Rect {
    /// Creates a new rectangle. Negative sizes are clamped to zero.
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Creates a rectangle from its center point and size.
    #[must_use]
    pub fn from_center(center: DVec2, width: f64, height: f64) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    /// Creates the smallest rectangle spanning two corner points.
    #[must_use]
    pub fn from_corners(a: DVec2, b: DVec2) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Returns the right edge x coordinate.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Returns the bottom edge y coordinate.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Returns the horizontal center.
    #[must_use]
    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    /// Returns the vertical center.
    #[must_use]
    pub fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    /// Returns the center point.
    #[must_use]
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.center_x(), self.center_y())
    }

    /// Returns the size as a vector.
    #[must_use]
    pub fn size(&self) -> DVec2 {
        DVec2::new(self.width, self.height)
    }

    /// Places the right edge at `x`.
    pub fn set_right(&mut self, x: f64) {
        self.left = x - self.width;
    }

    /// Places the bottom edge at `y`.
    pub fn set_bottom(&mut self, y: f64) {
        self.top = y - self.height;
    }

    /// Changes the height while keeping the bottom edge fixed.
    pub fn set_height_keep_bottom(&mut self, height: f64) {
        let bottom = self.bottom();
        self.height = height.max(0.0);
        self.top = bottom - self.height;
    }

    /// Moves the rectangle by the given offset.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.left += dx;
        self.top += dy;
    }

    /// Strict overlap test: rectangles that only touch do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left < other.right()
            && self.right() > other.left
            && self.top < other.bottom()
            && self.bottom() > other.top
    }

    /// Checks if this rectangle fully contains another.
    #[must_use]
    pub fn contains(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.right() <= self.right()
            && other.top >= self.top
            && other.bottom() <= self.bottom()
    }

    /// Returns true if the two rectangles share horizontal extent.
    #[must_use]
    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        self.left < other.right() && self.right() > other.left
    }

    /// Checks approximate equality of all four fields.
    #[must_use]
    pub fn approx_eq(&self, other: &Rect, epsilon: f64) -> bool {
        (self.left - other.left).abs() <= epsilon
            && (self.top - other.top).abs() <= epsilon
            && (self.width - other.width).abs() <= epsilon
            && (self.height - other.height).abs() <= epsilon
    }
}

/// Direction of travel along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Negative y
    Up,
    /// Positive y
    Down,
    /// Negative x
    Left,
    /// Positive x
    Right,
}

impl Direction {
    /// Direction of a single-axis displacement. Returns `None` for zero motion.
    #[must_use]
    pub fn of_motion(dx: f64, dy: f64) -> Option<Self> {
        if dx > 0.0 {
            Some(Self::Right)
        } else if dx < 0.0 {
            Some(Self::Left)
        } else if dy > 0.0 {
            Some(Self::Down)
        } else if dy < 0.0 {
            Some(Self::Up)
        } else {
            None
        }
    }
}
