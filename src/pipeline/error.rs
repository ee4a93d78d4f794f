//! Pipeline error types
//!
//! Resolution and filtering failures are terminal for one invocation.
//! Grouping problems are not errors at all; they surface as events.

use crate::frame::ColumnKind;
use serde::Serialize;
use thiserror::Error;

/// Filtering stage that removed the last row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStage {
    /// Year/month selection
    TimeRange,
    /// Value predicate
    Predicate,
}

impl std::fmt::Display for FilterStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterStage::TimeRange => write!(f, "time range"),
            FilterStage::Predicate => write!(f, "value filter"),
        }
    }
}

/// Errors that can occur while processing a frame
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Date column cannot be used at all
    #[error("Invalid datetime column '{column}': {reason}")]
    InvalidDatetime { column: String, reason: String },

    /// Every row was dropped during timestamp resolution
    #[error("No valid timestamps: all {total} rows failed to parse")]
    NoValidTimestamps { total: usize },

    /// Filters removed every row
    #[error("No rows matched the {stage}")]
    EmptyAfterFilter { stage: FilterStage },

    /// Predicate literal type does not fit the column type
    #[error("Cannot compare {kind} column '{field}' with {literal_kind} literal '{literal}'")]
    FilterTypeMismatch {
        field: String,
        kind: ColumnKind,
        literal: String,
        literal_kind: &'static str,
    },

    /// Selected field is not a column of the frame
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Unknown granularity/reducer name while strict options are on
    #[error("Unsupported {option}: {value}")]
    UnsupportedGranularityOrReducer { option: &'static str, value: String },

    /// Input rows do not line up with the header
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Internal invariant failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// True when the run failed only because no rows matched the filters
    pub fn is_no_match(&self) -> bool {
        matches!(self, PipelineError::EmptyAfterFilter { .. })
    }
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::EmptyAfterFilter {
            stage: FilterStage::Predicate,
        };
        assert_eq!(err.to_string(), "No rows matched the value filter");
        assert!(err.is_no_match());

        let err = PipelineError::FilterTypeMismatch {
            field: "flow".into(),
            kind: ColumnKind::Numeric,
            literal: "high".into(),
            literal_kind: "text",
        };
        assert_eq!(
            err.to_string(),
            "Cannot compare numeric column 'flow' with text literal 'high'"
        );
        assert!(!err.is_no_match());
    }
}
