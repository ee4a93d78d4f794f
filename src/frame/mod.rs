//! Frames
//!
//! In-memory tabular data flowing through the engine:
//!
//! - **value**: tagged cells (`Number`, `Text`, `Missing`)
//! - **types**: `RawFrame` (input) and `TimeFrame` (timestamped, sorted)
//! - **csv_import**: decoded CSV text to `RawFrame`
//! - **export**: JSON interchange and CSV export of processed frames
//! - **describe**: column detection and summary statistics
//! - **error**: error types

pub mod csv_import;
pub mod describe;
pub mod error;
pub mod export;
pub mod types;
pub mod value;

pub use csv_import::{CsvImportResult, CsvImporter};
pub use describe::{
    date_like_columns, default_selection, describe, numeric_columns, ColumnSummary,
    DefaultSelection,
};
pub use error::{FrameError, FrameResult};
pub use types::{Calendar, RawFrame, TimeFrame, TimedRecord};
pub use value::{ColumnKind, Value};
