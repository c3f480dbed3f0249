//! # Ashfall Kernel
//!
//! Geometry and spatial primitives shared by every moving thing in Ashfall.
//!
//! This crate provides:
//! - Axis-aligned rectangles with computed edges
//! - A uniform spatial grid for region queries
//! - Axis-separated collision resolution (`move_box` / `move_axis`)
//! - Oriented boxes with separating-axis overlap tests
//! - Segment-rectangle intersection for line of sight

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod collision;
pub mod geometry;
pub mod grid;
pub mod line;
pub mod obb;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::collision::*;
    pub use crate::geometry::*;
    pub use crate::grid::*;
    pub use crate::line::*;
    pub use crate::obb::*;
}

pub use prelude::*;
