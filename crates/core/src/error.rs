//! Error types for LakeWatch

use thiserror::Error;

/// Main error type for LakeWatch operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Two arrays that must align have different dimensions
    #[error("Shape mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    ShapeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Invalid pixel size: {0} (must be > 0)")]
    InvalidPixelSize(f64),

    /// Automatic thresholding found no spread in the index values
    #[error("Degenerate histogram: index values have zero variance")]
    DegenerateHistogram,

    #[error("Insufficient data: {required} required, {found} supplied")]
    InsufficientData { required: usize, found: usize },

    #[error("Empty series: no observations to summarize")]
    EmptySeries,

    /// Timestamps must be strictly increasing (no duplicates)
    #[error("Timestamps out of order: {next} does not follow {previous}")]
    UnorderedTimestamps { previous: String, next: String },

    #[error("Missing spectral band: {0}")]
    MissingBand(&'static str),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a [`Error::ShapeMismatch`] from two `(rows, cols)` shapes
    pub fn shape_mismatch(expected: (usize, usize), actual: (usize, usize)) -> Self {
        Error::ShapeMismatch {
            er: expected.0,
            ec: expected.1,
            ar: actual.0,
            ac: actual.1,
        }
    }
}

/// Result type alias for LakeWatch operations
pub type Result<T> = std::result::Result<T, Error>;
