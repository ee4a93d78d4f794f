//! Aggregation
//!
//! Resamples a time frame into fixed buckets and reduces each numeric field
//! per bucket. Sub-daily and daily buckets are labelled by their start,
//! weekly and monthly buckets by their last day. Buckets without rows are not
//! emitted.

use crate::frame::{ColumnKind, TimeFrame, TimedRecord, Value};
use crate::telemetry::{EventSink, PipelineEvent};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::str::FromStr;

/// Bucket size for resampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Granularity {
    /// No resampling
    #[default]
    Raw,
    /// 15-minute buckets
    FifteenMinute,
    /// Top of the hour
    Hourly,
    /// Midnight
    Daily,
    /// Monday to Sunday, labelled Sunday 00:00
    Weekly,
    /// Calendar month, labelled on its last day 00:00
    Monthly,
    /// Unrecognised name; treated as `Raw`
    Unsupported,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::FifteenMinute => "15min",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Unsupported => "unsupported",
        }
    }

    /// Timestamp that labels the bucket containing `ts`
    pub fn bucket_label(&self, ts: NaiveDateTime) -> NaiveDateTime {
        let date = ts.date();
        let label = match self {
            Self::Raw | Self::Unsupported => Some(ts),
            Self::FifteenMinute => date.and_hms_opt(ts.hour(), ts.minute() / 15 * 15, 0),
            Self::Hourly => date.and_hms_opt(ts.hour(), 0, 0),
            Self::Daily => date.and_hms_opt(0, 0, 0),
            Self::Weekly => {
                let days_to_sunday = 6 - date.weekday().num_days_from_monday() as i64;
                (date + Duration::days(days_to_sunday)).and_hms_opt(0, 0, 0)
            }
            Self::Monthly => last_day_of_month(date).and_hms_opt(0, 0, 0),
        };
        label.unwrap_or(ts)
    }
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

impl FromStr for Granularity {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl Granularity {
    /// Accepts the canonical names plus common aliases; anything else is
    /// `Unsupported`.
    pub fn from_name(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "raw" | "none" | "" => Self::Raw,
            "15min" | "15-minute" | "15t" | "15m" => Self::FifteenMinute,
            "hourly" | "hour" | "h" | "1h" => Self::Hourly,
            "daily" | "day" | "d" | "1d" => Self::Daily,
            "weekly" | "week" | "w" => Self::Weekly,
            "monthly" | "month" | "m" | "ms" => Self::Monthly,
            _ => Self::Unsupported,
        }
    }
}

impl From<String> for Granularity {
    fn from(s: String) -> Self {
        Self::from_name(&s)
    }
}

impl From<Granularity> for String {
    fn from(g: Granularity) -> Self {
        g.as_str().to_string()
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reduction applied to the values of one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Reducer {
    /// Average of values
    #[default]
    Mean,
    /// Sum of values
    Sum,
    /// Value at the latest timestamp
    Last,
    /// Maximum value
    Max,
    /// Minimum value
    Min,
    /// Unrecognised name; treated as `Mean`
    Unsupported,
}

impl Reducer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Sum => "sum",
            Self::Last => "last",
            Self::Max => "max",
            Self::Min => "min",
            Self::Unsupported => "unsupported",
        }
    }

    /// Apply the reduction to values in ascending timestamp order
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }

        Some(match self {
            Self::Mean | Self::Unsupported => values.iter().sum::<f64>() / values.len() as f64,
            Self::Sum => values.iter().sum(),
            Self::Last => *values.last()?,
            Self::Max => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            Self::Min => values.iter().cloned().fold(f64::INFINITY, f64::min),
        })
    }
}

impl FromStr for Reducer {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl Reducer {
    pub fn from_name(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "mean" | "avg" | "average" => Self::Mean,
            "sum" => Self::Sum,
            "last" => Self::Last,
            "max" => Self::Max,
            "min" => Self::Min,
            _ => Self::Unsupported,
        }
    }
}

impl From<String> for Reducer {
    fn from(s: String) -> Self {
        Self::from_name(&s)
    }
}

impl From<Reducer> for String {
    fn from(r: Reducer) -> Self {
        r.as_str().to_string()
    }
}

impl std::fmt::Display for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resamples a frame at a granularity with a reducer
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    granularity: Granularity,
    reducer: Reducer,
}

impl Aggregator {
    pub fn new(granularity: Granularity, reducer: Reducer) -> Self {
        Self {
            granularity,
            reducer,
        }
    }

    /// Aggregate the numeric `fields` of `frame`.
    ///
    /// Requested fields that are absent or non-numeric are left out of the
    /// result and reported as `FieldsExcluded`. If no requested field can be
    /// aggregated the frame is returned unchanged.
    pub fn aggregate(
        &self,
        frame: TimeFrame,
        fields: &[String],
        sink: &dyn EventSink,
    ) -> TimeFrame {
        if matches!(self.granularity, Granularity::Raw | Granularity::Unsupported) {
            return frame;
        }

        let (numeric, excluded): (Vec<&String>, Vec<&String>) = fields.iter().partition(|f| {
            matches!(
                frame.column_kind(f),
                Some(ColumnKind::Numeric) | Some(ColumnKind::Empty)
            )
        });

        if !excluded.is_empty() {
            sink.record(PipelineEvent::FieldsExcluded {
                fields: excluded.into_iter().cloned().collect(),
            });
        }
        if numeric.is_empty() {
            return frame;
        }

        let indices: Vec<usize> = numeric
            .iter()
            .filter_map(|f| frame.column_index(f))
            .collect();

        // Rows arrive sorted, so each bucket's values stay in timestamp order
        let mut buckets: BTreeMap<NaiveDateTime, Vec<Vec<f64>>> = BTreeMap::new();
        for row in &frame.rows {
            let bucket = buckets
                .entry(self.granularity.bucket_label(row.timestamp))
                .or_insert_with(|| vec![Vec::new(); indices.len()]);
            for (slot, idx) in bucket.iter_mut().zip(&indices) {
                if let Some(v) = row.values.get(*idx).and_then(Value::as_f64) {
                    slot.push(v);
                }
            }
        }

        let rows = buckets
            .into_iter()
            .map(|(ts, columns)| {
                let values = columns
                    .iter()
                    .map(|values| Value::from(self.reducer.apply(values)))
                    .collect();
                TimedRecord::new(ts, values)
            })
            .collect();

        tracing::debug!(
            granularity = %self.granularity,
            reducer = %self.reducer,
            input_rows = frame.len(),
            "Aggregated frame"
        );

        TimeFrame::from_records(numeric.into_iter().cloned().collect(), rows)
    }
}
