//! Patrol area discovery at spawn time.
//!
//! An enemy walks on the wall beneath it. The walkable span is that wall's top
//! minus anything standing on it; the enemy keeps the clear span it spawned in.
//! A spawn that overlaps an obstacle is moved to random spots along the wall a
//! bounded number of times before settling for a zero-width area.

use fastrand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ashfall_kernel::{Rect, SpatialGrid};

use crate::entity::EntityRef;

/// Random relocation attempts before giving up.
pub const PATROL_RETRIES: usize = 10;

/// Range of `left` positions an enemy may walk within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatrolArea {
    /// Leftmost allowed left edge
    pub min_left: f64,
    /// Rightmost allowed left edge
    pub max_left: f64,
}

impl PatrolArea {
    /// Creates an area, swapping the bounds if they are reversed.
    #[must_use]
    pub fn new(min_left: f64, max_left: f64) -> Self {
        Self {
            min_left: min_left.min(max_left),
            max_left: min_left.max(max_left),
        }
    }

    /// Zero-width area pinned at `left`.
    #[must_use]
    pub fn fixed(left: f64) -> Self {
        Self::new(left, left)
    }

    /// Width of the area.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_left - self.min_left
    }

    /// True if the enemy cannot walk at all.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.width() <= 0.0
    }

    /// Clamps a left edge into the area.
    #[must_use]
    pub fn clamp(&self, left: f64) -> f64 {
        left.clamp(self.min_left, self.max_left)
    }

    /// True if `left` lies inside the area.
    #[must_use]
    pub fn contains(&self, left: f64) -> bool {
        left >= self.min_left && left <= self.max_left
    }
}

/// Clear horizontal spans on top of `ground` wide enough for `width`.
fn clear_spans(grid: &SpatialGrid<EntityRef>, ground_id: EntityRef, ground: &Rect, height: f64, width: f64) -> Vec<(f64, f64)> {
    let strip = Rect::new(ground.left, ground.top - height, ground.width, height);
    let mut blockers: Vec<(f64, f64)> = grid
        .query_with_bounds(&strip, true, |id| id.is_wall() && *id != ground_id)
        .into_iter()
        .map(|(_, r)| (r.left.max(ground.left), r.right().min(ground.right())))
        .collect();
    blockers.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut spans = Vec::new();
    let mut cursor = ground.left;
    for (start, end) in blockers {
        if start - cursor >= width {
            spans.push((cursor, start));
        }
        cursor = cursor.max(end);
    }
    if ground.right() - cursor >= width {
        spans.push((cursor, ground.right()));
    }
    spans
}

/// Nearest wall top at or below the enemy's middle, horizontally under it.
fn find_ground(grid: &SpatialGrid<EntityRef>, rect: &Rect, depth: f64) -> Option<(EntityRef, Rect)> {
    let probe = Rect::new(rect.left, rect.center_y(), rect.width, depth);
    grid.query_with_bounds(&probe, true, EntityRef::is_wall)
        .into_iter()
        .filter(|(_, wall)| wall.top >= rect.center_y())
        .min_by(|a, b| a.1.top.total_cmp(&b.1.top))
}

/// Snaps `rect` onto the ground beneath it and returns its patrol area.
///
/// `rect` may be moved: onto the ground, and sideways if the spawn point was
/// obstructed.
pub fn find_patrol_area(grid: &SpatialGrid<EntityRef>, rect: &mut Rect, depth: f64, rng: &mut Rng) -> PatrolArea {
    let Some((ground_id, ground)) = find_ground(grid, rect, depth) else {
        debug!("No ground below spawn at ({:.1}, {:.1})", rect.left, rect.top);
        return PatrolArea::fixed(rect.left);
    };
    rect.set_bottom(ground.top);

    let width = rect.width;
    let spans = clear_spans(grid, ground_id, &ground, rect.height, width);
    let span_for = |left: f64| {
        spans
            .iter()
            .find(|(start, end)| left >= *start && left + width <= *end)
            .map(|(start, end)| PatrolArea::new(*start, end - width))
    };

    if let Some(area) = span_for(rect.left) {
        return area;
    }

    if ground.width >= width {
        for attempt in 0..PATROL_RETRIES {
            let left = ground.left + rng.f64() * (ground.width - width);
            if let Some(area) = span_for(left) {
                debug!("Relocated blocked spawn after {} attempts", attempt + 1);
                rect.left = left;
                return area;
            }
        }
    }

    warn!(
        "Could not find a clear patrol span near ({:.1}, {:.1}); enemy will stand still",
        rect.left, rect.top
    );
    PatrolArea::fixed(rect.left)
}
