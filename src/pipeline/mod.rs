//! Processing pipeline
//!
//! One invocation turns a raw frame and a configuration snapshot into a
//! processed frame plus the series catalogs:
//!
//! ```text
//! RawFrame → resolve timestamps → forward fill → filter → aggregate → catalogs
//! ```
//!
//! Every run is independent. Nothing is cached between calls, so a
//! `Pipeline` can be shared across threads.

pub mod aggregate;
pub mod datetime;
pub mod error;
pub mod fill;
pub mod filter;

pub use aggregate::{Aggregator, Granularity, Reducer};
pub use datetime::{available_years, parse_timestamp, DatetimeResolver, NO_TIME_COLUMN};
pub use error::{FilterStage, PipelineError, PipelineResult};
pub use fill::forward_fill;
pub use filter::{FilterLiteral, Operator, Predicate, RowFilter};

use crate::catalog::{
    histogram, time_series, DailyPatternGrouper, Histogram, SeasonalGrouper, SeasonalMode,
    SeriesCatalog,
};
use crate::config::EngineSettings;
use crate::frame::{RawFrame, TimeFrame};
use crate::telemetry::{EventSink, PipelineEvent, TracingSink};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

fn default_granularity() -> String {
    Granularity::Raw.to_string()
}

fn default_reducer() -> String {
    Reducer::Mean.to_string()
}

/// Per-invocation configuration snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOptions {
    pub date_column: String,

    /// `None` or `"none"` means the date column carries the full timestamp
    #[serde(default)]
    pub time_column: Option<String>,

    #[serde(default)]
    pub merge_datetime: bool,

    #[serde(default)]
    pub handle_24hour: bool,

    /// Granularity name, parsed leniently
    #[serde(default = "default_granularity")]
    pub granularity: String,

    /// Reducer name, parsed leniently
    #[serde(default = "default_reducer")]
    pub reducer: String,

    #[serde(default)]
    pub seasonal_mode: SeasonalMode,

    #[serde(default)]
    pub forward_fill: bool,

    /// Measurement column to analyse
    pub field: String,

    #[serde(default)]
    pub years: BTreeSet<i32>,

    #[serde(default)]
    pub months: BTreeSet<u32>,

    #[serde(default)]
    pub filter: Option<Predicate>,

    #[serde(default)]
    pub filter_enabled: bool,
}

impl ProcessOptions {
    pub fn new(date_column: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            date_column: date_column.into(),
            time_column: None,
            merge_datetime: false,
            handle_24hour: false,
            granularity: default_granularity(),
            reducer: default_reducer(),
            seasonal_mode: SeasonalMode::default(),
            forward_fill: false,
            field: field.into(),
            years: BTreeSet::new(),
            months: BTreeSet::new(),
            filter: None,
            filter_enabled: false,
        }
    }

    /// Merge a time column into the date column
    pub fn with_time_column(mut self, column: impl Into<String>, handle_24hour: bool) -> Self {
        self.time_column = Some(column.into());
        self.merge_datetime = true;
        self.handle_24hour = handle_24hour;
        self
    }

    pub fn with_granularity(mut self, granularity: impl Into<String>) -> Self {
        self.granularity = granularity.into();
        self
    }

    pub fn with_reducer(mut self, reducer: impl Into<String>) -> Self {
        self.reducer = reducer.into();
        self
    }

    pub fn with_seasonal_mode(mut self, mode: SeasonalMode) -> Self {
        self.seasonal_mode = mode;
        self
    }

    pub fn with_forward_fill(mut self, enabled: bool) -> Self {
        self.forward_fill = enabled;
        self
    }

    pub fn with_years(mut self, years: impl IntoIterator<Item = i32>) -> Self {
        self.years = years.into_iter().collect();
        self
    }

    pub fn with_months(mut self, months: impl IntoIterator<Item = u32>) -> Self {
        self.months = months.into_iter().collect();
        self
    }

    /// Set and enable a value filter
    pub fn with_filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(predicate);
        self.filter_enabled = true;
        self
    }

    /// The filter to apply, if enabled and its literal is non-empty
    fn active_filter(&self) -> Option<&Predicate> {
        self.filter
            .as_ref()
            .filter(|p| self.filter_enabled && !p.literal.trim().is_empty())
    }
}

/// Result of one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOutput {
    /// Resolved, filtered and (optionally) aggregated frame
    pub frame: TimeFrame,
    pub time_series: SeriesCatalog,
    pub seasonal: SeriesCatalog,
    /// Present only when the frame has enough distinct hours
    pub daily_pattern: Option<SeriesCatalog>,
    pub histogram: Histogram,
}

/// Entry point of the engine
#[derive(Clone)]
pub struct Pipeline {
    settings: EngineSettings,
    sink: Arc<dyn EventSink>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl Pipeline {
    /// Create a pipeline reporting events to `tracing`
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            sink: Arc::new(TracingSink),
        }
    }

    /// Report events to `sink` instead
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Process `raw` with `options`.
    ///
    /// Timestamp resolution and filtering errors end the run. Grouping never
    /// fails; skipped years and dates are reported as events.
    pub fn process(
        &self,
        raw: &RawFrame,
        options: &ProcessOptions,
    ) -> PipelineResult<ProcessOutput> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("process", %run_id, field = %options.field);
        let _enter = span.enter();

        let sink = self.sink.as_ref();
        let field = options.field.as_str();

        raw.validate()
            .map_err(|e| PipelineError::MalformedFrame(e.to_string()))?;

        if !raw.has_column(field) {
            return Err(PipelineError::FieldNotFound(field.to_string()));
        }

        let granularity = self.resolve_granularity(&options.granularity)?;
        let reducer = self.resolve_reducer(&options.reducer)?;

        let mut frame = DatetimeResolver::new()
            .with_merge(options.merge_datetime)
            .with_24hour_handling(options.handle_24hour)
            .with_validity_threshold(self.settings.merge_validity_threshold)
            .resolve(
                raw,
                &options.date_column,
                options.time_column.as_deref(),
                sink,
            )?;

        if options.forward_fill {
            forward_fill(&mut frame, field);
        }

        let mut filter = RowFilter::new()
            .years(options.years.iter().copied())
            .months(options.months.iter().copied());
        if let Some(predicate) = options.active_filter() {
            filter = filter.predicate(predicate.clone());
        }
        let frame = filter.apply(frame)?;

        let frame = Aggregator::new(granularity, reducer).aggregate(
            frame,
            std::slice::from_ref(&options.field),
            sink,
        );

        let seasonal = SeasonalGrouper::new(self.settings.max_years).group(
            &frame,
            field,
            options.seasonal_mode,
            sink,
        );

        let daily_pattern = if frame.distinct_hours() >= self.settings.min_distinct_hours {
            Some(
                DailyPatternGrouper::new(self.settings.max_days, self.settings.visible_days)
                    .group(&frame, field, sink),
            )
        } else {
            tracing::debug!(
                distinct_hours = frame.distinct_hours(),
                "Not enough distinct hours for a daily pattern"
            );
            None
        };

        let output = ProcessOutput {
            time_series: time_series(&frame, field),
            histogram: histogram(&frame, field, self.settings.histogram_bins),
            seasonal,
            daily_pattern,
            frame,
        };

        tracing::info!(
            rows = output.frame.len(),
            seasonal_overlays = output.seasonal.len(),
            daily_overlays = output.daily_pattern.as_ref().map_or(0, |c| c.len()),
            "Processing complete"
        );

        Ok(output)
    }

    fn resolve_granularity(&self, name: &str) -> PipelineResult<Granularity> {
        match Granularity::from_name(name) {
            Granularity::Unsupported => {
                self.unsupported("granularity", name, Granularity::Raw.as_str())?;
                Ok(Granularity::Raw)
            }
            g => Ok(g),
        }
    }

    fn resolve_reducer(&self, name: &str) -> PipelineResult<Reducer> {
        match Reducer::from_name(name) {
            Reducer::Unsupported => {
                self.unsupported("reducer", name, Reducer::Mean.as_str())?;
                Ok(Reducer::Mean)
            }
            r => Ok(r),
        }
    }

    /// Fail in strict mode, otherwise record the fallback
    fn unsupported(&self, option: &'static str, value: &str, fallback: &str) -> PipelineResult<()> {
        if self.settings.strict_options {
            return Err(PipelineError::UnsupportedGranularityOrReducer {
                option,
                value: value.to_string(),
            });
        }
        self.sink.record(PipelineEvent::OptionFallback {
            option: format!("{}={}", option, value),
            fallback: fallback.to_string(),
        });
        Ok(())
    }
}
