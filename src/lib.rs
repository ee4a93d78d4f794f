//! # Seasonlens
//!
//! Seasonal and intraday overlay engine. Takes a tabular dataset with a date
//! column (and optionally a separate time column) and produces
//! comparison-ready series catalogs for one measurement field.
//!
//! ## Features
//!
//! - **Timestamp resolution**: date + time merging with a validity cutoff
//! - **Filtering**: year/month selection and a single value predicate
//! - **Resampling**: 15-minute to monthly buckets with five reducers
//! - **Seasonal view**: one overlay per recent year plus the all-years mean
//! - **Daily pattern view**: one overlay per recent date plus the hourly mean
//!
//! ## Modules
//!
//! - [`frame`]: tagged values, raw and timestamped frames, CSV import/export
//! - [`pipeline`]: resolution, filtering, aggregation and `Pipeline::process`
//! - [`catalog`]: styled overlays for the comparison views
//! - [`telemetry`]: event sink and logging setup
//! - [`config`]: engine settings
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use seasonlens::{CsvImporter, Pipeline, ProcessOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let raw = CsvImporter::new().import(Path::new("readings.csv"))?.frame;
//!
//!     let options = ProcessOptions::new("date", "flow")
//!         .with_time_column("time", true)
//!         .with_granularity("hourly");
//!
//!     let output = Pipeline::default().process(&raw, &options)?;
//!     println!("{} seasonal overlays", output.seasonal.len());
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod frame;
pub mod pipeline;
pub mod telemetry;

pub use catalog::{
    DailyPatternGrouper, Histogram, Overlay, OverlayStyle, SeasonalGrouper, SeasonalMode,
    SeriesCatalog, SeriesPoint, Visibility,
};

pub use config::{Config, ConfigError, EngineSettings, LoggingConfig};

pub use frame::{ColumnKind, CsvImporter, FrameError, RawFrame, TimeFrame, Value};

pub use pipeline::{
    Aggregator, DatetimeResolver, Granularity, Operator, Pipeline, PipelineError,
    PipelineResult, Predicate, ProcessOptions, ProcessOutput, Reducer, RowFilter,
};

pub use telemetry::{EventSink, MemorySink, PipelineEvent, TracingSink};
