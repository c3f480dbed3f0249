//! Segment against rectangle intersection, used for line-of-sight checks.

use glam::DVec2;

use crate::geometry::Rect;

/// Returns true if the segment `from`-`to` passes through the interior of `rect`.
///
/// Uses Liang-Barsky clipping. A segment that only grazes an edge or a corner
/// does not intersect, matching the strict overlap rule used for boxes.
#[must_use]
pub fn segment_intersects_rect(from: DVec2, to: DVec2, rect: &Rect) -> bool {
    clip_segment(from, to, rect).is_some_and(|(t0, t1)| t1 - t0 > f64::EPSILON)
}

/// Parametric interval `[t0, t1]` of the segment that lies inside `rect`.
#[must_use]
pub fn clip_segment(from: DVec2, to: DVec2, rect: &Rect) -> Option<(f64, f64)> {
    let d = to - from;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    let checks = [
        (-d.x, from.x - rect.left),
        (d.x, rect.right() - from.x),
        (-d.y, from.y - rect.top),
        (d.y, rect.bottom() - from.y),
    ];

    for (p, q) in checks {
        if p == 0.0 {
            // Parallel to this edge: must be strictly inside the slab.
            if q <= 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    (t0 <= t1).then_some((t0, t1))
}

/// Point at which the segment first enters `rect`, if it does.
#[must_use]
pub fn segment_entry_point(from: DVec2, to: DVec2, rect: &Rect) -> Option<DVec2> {
    clip_segment(from, to, rect)
        .filter(|(t0, t1)| t1 - t0 > f64::EPSILON)
        .map(|(t0, _)| from + (to - from) * t0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> Rect {
        Rect::new(10.0, 10.0, 10.0, 10.0)
    }

    #[test]
    fn test_crossing_segment() {
        assert!(segment_intersects_rect(DVec2::new(0.0, 15.0), DVec2::new(30.0, 15.0), &block()));
        assert!(segment_intersects_rect(DVec2::new(0.0, 0.0), DVec2::new(30.0, 30.0), &block()));
    }

    #[test]
    fn test_segment_stops_short() {
        assert!(!segment_intersects_rect(DVec2::new(0.0, 15.0), DVec2::new(9.0, 15.0), &block()));
    }

    #[test]
    fn test_segment_inside() {
        assert!(segment_intersects_rect(DVec2::new(12.0, 12.0), DVec2::new(14.0, 18.0), &block()));
    }

    #[test]
    fn test_grazing_edge_does_not_intersect() {
        // Runs along the top edge
        assert!(!segment_intersects_rect(DVec2::new(0.0, 10.0), DVec2::new(30.0, 10.0), &block()));
        // Touches only the corner
        assert!(!segment_intersects_rect(DVec2::new(0.0, 20.0), DVec2::new(10.0, 10.0), &block()));
    }

    #[test]
    fn test_entry_point() {
        let entry = segment_entry_point(DVec2::new(0.0, 15.0), DVec2::new(30.0, 15.0), &block())
            .expect("segment crosses block");
        assert!(entry.abs_diff_eq(DVec2::new(10.0, 15.0), 1e-9));
        assert_eq!(segment_entry_point(DVec2::ZERO, DVec2::new(0.0, 5.0), &block()), None);
    }
}
