//! Uniform spatial grid for broad-phase region queries.
//!
//! Each entity is registered in every cell covered by the range
//! `floor(edge / cell_size) ..= ceil(edge / cell_size)` on both axes, clipped to
//! the grid. Cells are allocated on first use and released when they empty.
//!
//! The grid stores ids only. It also remembers the extent each id was registered
//! with, which backs precise queries and lets debug builds check that callers
//! remove entities with the same box they inserted them with.

use ahash::{AHashMap, AHashSet};
use std::hash::Hash;
use tracing::{trace, warn};

use crate::geometry::Rect;

/// Tolerance used when comparing a removal extent with the registered one.
const EXTENT_EPSILON: f64 = 1e-6;

/// Inclusive range of cells covered by a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    /// First column
    pub col_min: i32,
    /// First row
    pub row_min: i32,
    /// Last column (inclusive)
    pub col_max: i32,
    /// Last row (inclusive)
    pub row_max: i32,
}

impl CellRange {
    /// Number of cells in the range.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        ((self.col_max - self.col_min + 1) * (self.row_max - self.row_min + 1)) as usize
    }

    fn iter(self) -> impl Iterator<Item = (i32, i32)> {
        (self.row_min..=self.row_max)
            .flat_map(move |row| (self.col_min..=self.col_max).map(move |col| (col, row)))
    }
}

/// Statistics about grid occupancy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridStats {
    /// Cells currently allocated
    pub allocated_cells: usize,
    /// Total cell memberships across all cells
    pub memberships: usize,
    /// Registered entities
    pub entities: usize,
}

/// Uniform grid over world space indexing ids of type `T`.
#[derive(Debug, Clone)]
pub struct SpatialGrid<T> {
    cell_size: i32,
    cols: i32,
    rows: i32,
    cells: Vec<Option<AHashSet<T>>>,
    extents: AHashMap<T, Rect>,
}

impl<T> SpatialGrid<T>
where
    T: Copy + Eq + Hash + Ord + std::fmt::Debug,
{
    /// Creates an empty grid covering `width` x `height` world units.
    ///
    /// One extra row and column are reserved so that edges lying exactly on the
    /// far boundary still map to a cell. A non-positive cell size is treated as 1.
    #[must_use]
    pub fn new(width: f64, height: f64, cell_size: i32) -> Self {
        let cell_size = cell_size.max(1);
        let cs = f64::from(cell_size);
        let cols = (width.max(0.0) / cs).ceil() as i32 + 1;
        let rows = (height.max(0.0) / cs).ceil() as i32 + 1;
        Self {
            cell_size,
            cols,
            rows,
            cells: vec![None; (cols * rows) as usize],
            extents: AHashMap::new(),
        }
    }

    /// Returns the cell size in world units.
    #[must_use]
    pub fn cell_size(&self) -> i32 {
        self.cell_size
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn cols(&self) -> i32 {
        self.cols
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn rows(&self) -> i32 {
        self.rows
    }

    /// Returns the number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.extents.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extents.is_empty()
    }

    /// Returns true if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: T) -> bool {
        self.extents.contains_key(&id)
    }

    /// Returns the extent `id` was registered with.
    #[must_use]
    pub fn extent(&self, id: T) -> Option<&Rect> {
        self.extents.get(&id)
    }

    /// Cell range covered by `rect`, clipped to the grid. `None` if it lies outside.
    #[must_use]
    pub fn cell_range(&self, rect: &Rect) -> Option<CellRange> {
        let cs = f64::from(self.cell_size);
        let col_min = ((rect.left / cs).floor() as i32).max(0);
        let row_min = ((rect.top / cs).floor() as i32).max(0);
        let col_max = ((rect.right() / cs).ceil() as i32).min(self.cols - 1);
        let row_max = ((rect.bottom() / cs).ceil() as i32).min(self.rows - 1);

        if col_min > col_max || row_min > row_max {
            return None;
        }
        Some(CellRange {
            col_min,
            row_min,
            col_max,
            row_max,
        })
    }

    /// Members of the cell at (`col`, `row`), if allocated.
    #[must_use]
    pub fn cell(&self, col: i32, row: i32) -> Option<&AHashSet<T>> {
        self.index(col, row).and_then(|i| self.cells[i].as_ref())
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 || col >= self.cols || row >= self.rows {
            None
        } else {
            Some((row * self.cols + col) as usize)
        }
    }

    /// Registers `id` in every cell covered by `rect`.
    pub fn insert(&mut self, rect: &Rect, id: T) {
        debug_assert!(
            !self.extents.contains_key(&id),
            "{id:?} inserted into the grid twice"
        );
        if self.extents.contains_key(&id) {
            warn!("Ignoring duplicate grid insert for {:?}", id);
            return;
        }

        self.extents.insert(id, *rect);
        let Some(range) = self.cell_range(rect) else {
            trace!("{:?} registered outside the grid", id);
            return;
        };
        for (col, row) in range.iter() {
            let index = (row * self.cols + col) as usize;
            self.cells[index].get_or_insert_with(AHashSet::new).insert(id);
        }
    }

    /// Deregisters `id`, using `rect` (the extent it was inserted with) to find its cells.
    pub fn remove(&mut self, rect: &Rect, id: T) {
        let registered = self.extents.remove(&id);
        debug_assert!(
            registered.is_some(),
            "{id:?} removed from the grid but was never inserted"
        );
        let Some(registered) = registered else {
            warn!("Ignoring grid removal of unregistered {:?}", id);
            return;
        };
        debug_assert!(
            registered.approx_eq(rect, EXTENT_EPSILON),
            "{id:?} removed with extent {rect:?} but was inserted with {registered:?}"
        );

        let Some(range) = self.cell_range(rect) else {
            return;
        };
        for (col, row) in range.iter() {
            let index = (row * self.cols + col) as usize;
            if let Some(set) = &mut self.cells[index] {
                set.remove(&id);
                if set.is_empty() {
                    self.cells[index] = None;
                }
            }
        }
    }

    /// Moves `id` from its old extent to a new one.
    pub fn relocate(&mut self, old: &Rect, new: &Rect, id: T) {
        self.remove(old, id);
        self.insert(new, id);
    }

    /// Ids whose cells intersect `region` and that satisfy `predicate`.
    ///
    /// With `precise` set, candidates are re-checked for strict overlap against
    /// their registered extent. Without it the raw cell members are returned,
    /// which may include ids that merely share a cell with the region.
    /// Results are sorted.
    pub fn query_region<P>(&self, region: &Rect, precise: bool, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        let Some(range) = self.cell_range(region) else {
            return Vec::new();
        };

        let mut seen = AHashSet::new();
        let mut found = Vec::new();
        for (col, row) in range.iter() {
            let Some(set) = &self.cells[(row * self.cols + col) as usize] else {
                continue;
            };
            for &id in set {
                if !seen.insert(id) {
                    continue;
                }
                if precise && !self.extents.get(&id).is_some_and(|r| r.overlaps(region)) {
                    continue;
                }
                if predicate(&id) {
                    found.push(id);
                }
            }
        }
        found.sort_unstable();
        found
    }

    /// Same as [`query_region`](Self::query_region) but also returns extents.
    pub fn query_with_bounds<P>(&self, region: &Rect, precise: bool, predicate: P) -> Vec<(T, Rect)>
    where
        P: Fn(&T) -> bool,
    {
        self.query_region(region, precise, predicate)
            .into_iter()
            .filter_map(|id| self.extents.get(&id).map(|r| (id, *r)))
            .collect()
    }

    /// Removes every entity and releases all cells.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = None;
        }
        self.extents.clear();
    }

    /// Returns occupancy statistics.
    #[must_use]
    pub fn stats(&self) -> GridStats {
        let mut stats = GridStats {
            entities: self.extents.len(),
            ..GridStats::default()
        };
        for set in self.cells.iter().flatten() {
            stats.allocated_cells += 1;
            stats.memberships += set.len();
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid() -> SpatialGrid<u32> {
        SpatialGrid::new(800.0, 600.0, 32)
    }

    #[test]
    fn test_dimensions() {
        let g = grid();
        assert_eq!(g.cols(), 26);
        assert_eq!(g.rows(), 20);
        assert!(g.is_empty());
    }

    #[test]
    fn test_insert_range_uses_floor_and_ceil() {
        let mut g = grid();
        let r = Rect::new(40.0, 40.0, 10.0, 10.0);
        g.insert(&r, 1);

        let range = g.cell_range(&r).expect("inside grid");
        assert_eq!((range.col_min, range.col_max), (1, 2));
        assert_eq!((range.row_min, range.row_max), (1, 2));
        assert_eq!(g.stats().allocated_cells, 4);
        assert!(g.cell(1, 1).is_some_and(|c| c.contains(&1)));
        assert!(g.cell(0, 0).is_none());
    }

    #[test]
    fn test_remove_releases_cells() {
        let mut g = grid();
        let r = Rect::new(100.0, 100.0, 50.0, 20.0);
        g.insert(&r, 7);
        g.remove(&r, 7);

        assert!(!g.contains(7));
        assert_eq!(g.stats(), GridStats::default());
    }

    #[test]
    fn test_relocate_uses_old_extent() {
        let mut g = grid();
        let old = Rect::new(0.0, 0.0, 10.0, 10.0);
        let new = Rect::new(500.0, 400.0, 10.0, 10.0);
        g.insert(&old, 3);
        g.relocate(&old, &new, 3);

        assert!(g.query_region(&old, true, |_| true).is_empty());
        assert_eq!(g.query_region(&new, true, |_| true), vec![3]);
        assert_eq!(g.extent(3), Some(&new));
    }

    #[test]
    fn test_precise_query_filters_cell_neighbours() {
        let mut g = grid();
        g.insert(&Rect::new(0.0, 0.0, 5.0, 5.0), 1);
        g.insert(&Rect::new(20.0, 20.0, 5.0, 5.0), 2);

        let region = Rect::new(18.0, 18.0, 4.0, 4.0);
        let raw = g.query_region(&region, false, |_| true);
        let precise = g.query_region(&region, true, |_| true);
        assert_eq!(raw, vec![1, 2]);
        assert_eq!(precise, vec![2]);
    }

    #[test]
    fn test_query_deduplicates_and_filters() {
        let mut g = grid();
        g.insert(&Rect::new(0.0, 0.0, 300.0, 300.0), 1);
        g.insert(&Rect::new(10.0, 10.0, 10.0, 10.0), 2);

        let all = g.query_region(&Rect::new(0.0, 0.0, 400.0, 400.0), false, |_| true);
        assert_eq!(all, vec![1, 2]);

        let odd = g.query_region(&Rect::new(0.0, 0.0, 400.0, 400.0), false, |id| id % 2 == 1);
        assert_eq!(odd, vec![1]);
    }

    #[test]
    fn test_query_outside_grid_is_empty() {
        let mut g = grid();
        g.insert(&Rect::new(0.0, 0.0, 10.0, 10.0), 1);
        assert!(g.query_region(&Rect::new(-100.0, -100.0, 10.0, 10.0), false, |_| true).is_empty());
        assert!(g.query_region(&Rect::new(5000.0, 0.0, 10.0, 10.0), false, |_| true).is_empty());
    }

    #[test]
    fn test_partially_outside_box_is_clipped() {
        let mut g = grid();
        let r = Rect::new(-50.0, -50.0, 70.0, 70.0);
        g.insert(&r, 9);
        assert_eq!(g.query_region(&Rect::new(0.0, 0.0, 10.0, 10.0), true, |_| true), vec![9]);
        g.remove(&r, 9);
        assert!(g.is_empty());
    }

    #[test]
    fn test_query_with_bounds() {
        let mut g = grid();
        let r = Rect::new(64.0, 64.0, 32.0, 8.0);
        g.insert(&r, 5);
        let hits = g.query_with_bounds(&Rect::new(60.0, 60.0, 10.0, 10.0), true, |_| true);
        assert_eq!(hits, vec![(5, r)]);
    }

    #[test]
    fn test_clear() {
        let mut g = grid();
        g.insert(&Rect::new(0.0, 0.0, 10.0, 10.0), 1);
        g.clear();
        assert!(g.is_empty());
        assert_eq!(g.stats().allocated_cells, 0);
    }

    fn arb_rect() -> impl Strategy<Value = Rect> {
        (0.0..700.0_f64, 0.0..500.0_f64, 1.0..90.0_f64, 1.0..90.0_f64)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_registered_box_is_found_by_its_own_bounds(rect in arb_rect()) {
            let mut g = grid();
            g.insert(&rect, 1);
            prop_assert_eq!(g.query_region(&rect, true, |_| true), vec![1]);
        }

        #[test]
        fn prop_removed_box_is_never_found(rect in arb_rect(), probe in arb_rect()) {
            let mut g = grid();
            g.insert(&rect, 1);
            g.remove(&rect, 1);
            prop_assert!(g.query_region(&probe, false, |_| true).is_empty());
            prop_assert_eq!(g.stats().allocated_cells, 0);
        }

        #[test]
        fn prop_precise_query_matches_overlap(a in arb_rect(), probe in arb_rect()) {
            let mut g = grid();
            g.insert(&a, 1);
            let found = !g.query_region(&probe, true, |_| true).is_empty();
            prop_assert_eq!(found, a.overlaps(&probe));
        }
    }
}
