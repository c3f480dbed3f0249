//! Axis-separated box movement.
//!
//! A move is split into an x pass followed by a y pass. Each pass translates
//! the box unconditionally, gathers every obstacle overlapping the new position
//! and clips the leading edge against each one that blocks. When several
//! obstacles overlap, each clip is applied in query order and the last one wins.

use serde::{Deserialize, Serialize};
use std::hash::Hash;

use crate::geometry::{Direction, Rect};
use crate::grid::SpatialGrid;

/// A blocking contact produced by one axis pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collision<T> {
    /// Direction the mover was travelling.
    pub direction: Direction,
    /// The obstacle hit.
    pub other: T,
    /// Extent of the obstacle at the time of contact.
    pub other_rect: Rect,
}

/// Source of obstacles for the resolver.
pub trait CollisionQuery<T> {
    /// Obstacles overlapping `region`, excluding `mover` itself.
    fn overlapping(&self, mover: T, region: &Rect) -> Vec<(T, Rect)>;

    /// Whether `other` stops `mover`, which occupied `before` prior to this pass.
    ///
    /// Implementations may record state here, e.g. a one-way platform letting
    /// the mover pass until it clears the platform.
    fn blocks(&mut self, _mover: T, _before: &Rect, _other: T, _other_rect: &Rect, _direction: Direction) -> bool {
        true
    }
}

/// Moves `rect` by (`dx`, `dy`): x first, then y.
pub fn move_box<T, Q>(rect: &mut Rect, mover: T, dx: f64, dy: f64, query: &mut Q) -> Vec<Collision<T>>
where
    T: Copy,
    Q: CollisionQuery<T> + ?Sized,
{
    let mut collisions = Vec::new();
    if dx != 0.0 {
        collisions.extend(move_axis(rect, mover, dx, 0.0, query));
    }
    if dy != 0.0 {
        collisions.extend(move_axis(rect, mover, 0.0, dy, query));
    }
    collisions
}

/// Moves `rect` along a single axis. Exactly one of `dx`/`dy` should be nonzero.
pub fn move_axis<T, Q>(rect: &mut Rect, mover: T, dx: f64, dy: f64, query: &mut Q) -> Vec<Collision<T>>
where
    T: Copy,
    Q: CollisionQuery<T> + ?Sized,
{
    debug_assert!(
        (dx == 0.0) != (dy == 0.0),
        "move_axis needs exactly one nonzero component, got ({dx}, {dy})"
    );
    let Some(direction) = Direction::of_motion(dx, dy) else {
        return Vec::new();
    };

    let before = *rect;
    rect.translate(dx, dy);

    let mut collisions = Vec::new();
    for (other, other_rect) in query.overlapping(mover, rect) {
        if !query.blocks(mover, &before, other, &other_rect, direction) {
            continue;
        }
        match direction {
            Direction::Right => rect.set_right(other_rect.left),
            Direction::Left => rect.left = other_rect.right(),
            Direction::Down => rect.set_bottom(other_rect.top),
            Direction::Up => rect.top = other_rect.bottom(),
        }
        collisions.push(Collision {
            direction,
            other,
            other_rect,
        });
    }
    collisions
}

/// Collision query over a [`SpatialGrid`] where every matching entry is solid.
pub struct GridQuery<'a, T, F> {
    grid: &'a SpatialGrid<T>,
    filter: F,
}

impl<'a, T, F> GridQuery<'a, T, F>
where
    F: Fn(&T) -> bool,
{
    /// Creates a query that treats ids accepted by `filter` as obstacles.
    pub fn new(grid: &'a SpatialGrid<T>, filter: F) -> Self {
        Self { grid, filter }
    }
}

impl<T, F> CollisionQuery<T> for GridQuery<'_, T, F>
where
    T: Copy + Eq + Hash + Ord + std::fmt::Debug,
    F: Fn(&T) -> bool,
{
    fn overlapping(&self, mover: T, region: &Rect) -> Vec<(T, Rect)> {
        self.grid
            .query_with_bounds(region, true, |id| *id != mover && (self.filter)(id))
    }
}

/// In-memory obstacle list for tests and tools.
#[derive(Debug, Default, Clone)]
pub struct MockCollision {
    obstacles: Vec<(u32, Rect)>,
    passable: Vec<u32>,
}

impl MockCollision {
    /// Creates an empty obstacle set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a solid obstacle.
    pub fn add(&mut self, id: u32, rect: Rect) {
        self.obstacles.push((id, rect));
    }

    /// Marks an obstacle as reported by queries but never blocking.
    pub fn set_passable(&mut self, id: u32) {
        self.passable.push(id);
    }
}

impl CollisionQuery<u32> for MockCollision {
    fn overlapping(&self, mover: u32, region: &Rect) -> Vec<(u32, Rect)> {
        self.obstacles
            .iter()
            .filter(|(id, r)| *id != mover && r.overlaps(region))
            .copied()
            .collect()
    }

    fn blocks(&mut self, _mover: u32, _before: &Rect, other: u32, _other_rect: &Rect, _direction: Direction) -> bool {
        !self.passable.contains(&other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn wall_at(x: f64) -> MockCollision {
        let mut world = MockCollision::new();
        world.add(1, Rect::new(x, 0.0, 20.0, 200.0));
        world
    }

    #[test]
    fn test_free_move() {
        let mut world = MockCollision::new();
        let mut r = Rect::new(0.0, 0.0, 10.0, 10.0);
        let events = move_box(&mut r, 0, 5.0, 7.0, &mut world);
        assert!(events.is_empty());
        assert_eq!((r.left, r.top), (5.0, 7.0));
    }

    #[test]
    fn test_clip_moving_right() {
        let mut world = wall_at(100.0);
        let mut r = Rect::new(80.0, 50.0, 10.0, 10.0);
        let events = move_box(&mut r, 0, 20.0, 0.0, &mut world);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].direction, Direction::Right);
        assert_eq!(events[0].other, 1);
        assert!((r.right() - 100.0).abs() < EPS);
    }

    #[test]
    fn test_clip_moving_left() {
        let mut world = wall_at(100.0);
        let mut r = Rect::new(125.0, 50.0, 10.0, 10.0);
        let events = move_box(&mut r, 0, -10.0, 0.0, &mut world);

        assert_eq!(events[0].direction, Direction::Left);
        assert!((r.left - 120.0).abs() < EPS);
    }

    #[test]
    fn test_clip_moving_up_and_down() {
        let mut world = MockCollision::new();
        world.add(1, Rect::new(0.0, 100.0, 200.0, 10.0));

        let mut above = Rect::new(50.0, 80.0, 10.0, 10.0);
        let down = move_box(&mut above, 0, 0.0, 15.0, &mut world);
        assert_eq!(down[0].direction, Direction::Down);
        assert!((above.bottom() - 100.0).abs() < EPS);

        let mut below = Rect::new(50.0, 115.0, 10.0, 10.0);
        let up = move_box(&mut below, 0, 0.0, -10.0, &mut world);
        assert_eq!(up[0].direction, Direction::Up);
        assert!((below.top - 110.0).abs() < EPS);
    }

    #[test]
    fn test_touching_is_not_colliding() {
        let mut world = wall_at(100.0);
        let mut r = Rect::new(80.0, 50.0, 10.0, 10.0);
        // Ends exactly flush with the wall.
        let events = move_box(&mut r, 0, 10.0, 0.0, &mut world);
        assert!(events.is_empty());
        assert_eq!(r.right(), 100.0);
    }

    #[test]
    fn test_clip_is_symmetric() {
        let mut world = MockCollision::new();
        world.add(1, Rect::new(0.0, 0.0, 50.0, 50.0));
        world.add(2, Rect::new(100.0, 0.0, 50.0, 50.0));

        // Stepping left from between the two walls clips to the left wall's right edge.
        let mut left = Rect::new(60.0, 10.0, 20.0, 20.0);
        move_box(&mut left, 0, -30.0, 0.0, &mut world);
        assert!((left.left - 50.0).abs() < EPS);

        let mut right = Rect::new(70.0, 10.0, 20.0, 20.0);
        move_box(&mut right, 0, 30.0, 0.0, &mut world);
        assert!((right.right() - 100.0).abs() < EPS);
    }

    #[test]
    fn test_axes_resolve_independently() {
        let mut world = MockCollision::new();
        world.add(1, Rect::new(0.0, 100.0, 300.0, 20.0));
        let mut r = Rect::new(10.0, 80.0, 10.0, 10.0);

        let events = move_box(&mut r, 0, 30.0, 30.0, &mut world);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].direction, Direction::Down);
        assert!((r.left - 40.0).abs() < EPS);
        assert!((r.bottom() - 100.0).abs() < EPS);
    }

    #[test]
    fn test_last_clip_wins() {
        let mut world = MockCollision::new();
        world.add(1, Rect::new(100.0, 0.0, 10.0, 100.0));
        world.add(2, Rect::new(95.0, 0.0, 10.0, 100.0));
        let mut r = Rect::new(80.0, 10.0, 10.0, 10.0);

        let events = move_box(&mut r, 0, 20.0, 0.0, &mut world);
        assert_eq!(events.len(), 2);
        assert!((r.right() - 95.0).abs() < EPS);
    }

    #[test]
    fn test_passable_obstacle_does_not_clip() {
        let mut world = wall_at(100.0);
        world.set_passable(1);
        let mut r = Rect::new(80.0, 50.0, 10.0, 10.0);
        let events = move_box(&mut r, 0, 20.0, 0.0, &mut world);
        assert!(events.is_empty());
        assert_eq!(r.left, 100.0);
    }

    #[test]
    fn test_mover_is_excluded() {
        let mut world = MockCollision::new();
        world.add(5, Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut r = Rect::new(0.0, 0.0, 10.0, 10.0);
        let events = move_box(&mut r, 5, 3.0, 0.0, &mut world);
        assert!(events.is_empty());
    }
}
