/// Error types for the hydro model
use crate::mask::QualityMask;
use thiserror::Error;

/// Main error type for model construction and decoding
#[derive(Error, Debug)]
pub enum ModelError {
    /// A point arrived without one of its required fields
    #[error("point {index} is missing its `{field}` field")]
    MalformedPoint { index: usize, field: &'static str },

    /// Point times must be non-decreasing
    #[error("point {index} at {time} precedes the previous point at {previous}")]
    OutOfOrder {
        index: usize,
        previous: i64,
        time: i64,
    },

    /// A mask classification table left a mask without an entry
    #[error("mask table has no entry for {0:?}")]
    MissingMask(QualityMask),

    /// A mask classification table listed a mask twice
    #[error("mask {0:?} is listed more than once")]
    DuplicateMask(QualityMask),

    /// A qualifier code mapped to more than one mask
    #[error("qualifier code `{0}` maps to more than one mask")]
    DuplicateCode(String),

    /// `NoData` is derived from null values and cannot be mapped from a code
    #[error("{0:?} cannot be assigned qualifier codes")]
    DerivedMask(QualityMask),

    /// Failed to parse JSON input
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to parse CSV/RDB input
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

/// Type alias for Results using ModelError
pub type Result<T> = std::result::Result<T, ModelError>;
