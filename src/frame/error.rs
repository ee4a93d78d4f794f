//! Frame error types
//!
//! Errors raised while building, importing or exporting frames.

use thiserror::Error;

/// Errors that can occur while handling frames
#[derive(Error, Debug)]
pub enum FrameError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A row does not match the header width
    #[error("Row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Input contained a header but no data rows
    #[error("No data rows found")]
    NoRows,
}

/// Result type alias for frame operations
pub type FrameResult<T> = Result<T, FrameError>;
