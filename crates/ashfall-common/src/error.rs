//! Error types for Ashfall.

use thiserror::Error;

/// Top-level error type for Ashfall operations.
#[derive(Debug, Error)]
pub enum AshfallError {
    /// Map data errors
    #[error("Map error: {0}")]
    Map(#[from] MapError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors outside map data
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A background loader stopped without delivering
    #[error("Loader error: {0}")]
    Loader(String),
}

/// Errors raised while parsing or validating map data.
///
/// The simulation core never produces these; they come from the loading path.
#[derive(Debug, Error)]
pub enum MapError {
    /// Map JSON could not be parsed
    #[error("Failed to parse map: {0}")]
    Parse(String),

    /// Map dimensions are not positive
    #[error("Invalid map size {width}x{height}")]
    InvalidSize {
        /// Map width
        width: f64,
        /// Map height
        height: f64,
    },

    /// Grid cell size is not positive
    #[error("Invalid cell size {0}")]
    InvalidCellSize(i32),

    /// A rectangle has a negative extent
    #[error("Invalid {what} rectangle at index {index}")]
    InvalidRect {
        /// Which collection the rectangle belongs to
        what: &'static str,
        /// Index within that collection
        index: usize,
    },
}

/// Result type alias for Ashfall operations.
pub type AshfallResult<T> = Result<T, AshfallError>;

/// Result type alias for map loading.
pub type MapResult<T> = Result<T, MapError>;
