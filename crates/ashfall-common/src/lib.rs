//! # Ashfall Common
//!
//! Foundational types shared by every Ashfall crate:
//! - Entity identifiers
//! - Error types for map data and IO
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;
