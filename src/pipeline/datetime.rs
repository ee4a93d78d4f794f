//! Datetime resolution
//!
//! Builds one timestamp per row from a date column and an optional time
//! column, drops rows that cannot be resolved, derives calendar fields and
//! sorts the result.
//!
//! Merging date and time is validated as a whole: the merged column is used
//! only when strictly more than `validity_threshold` of all rows parse.
//! Otherwise the date column alone is used and a `MergeRejected` event is
//! recorded.

use super::error::{PipelineError, PipelineResult};
use crate::frame::{ColumnKind, RawFrame, TimeFrame, TimedRecord, Value};
use crate::telemetry::{EventSink, PipelineEvent};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::collections::BTreeSet;

/// Sentinel meaning "no time column"
pub const NO_TIME_COLUMN: &str = "none";

/// `24:00` / `24:00:00` as standalone tokens
const MIDNIGHT_TOKEN: &str = r"\b24:00(?::00)?\b";

/// End-of-day replacement for `24:00`
const END_OF_DAY: &str = "23:59:59";

const DATETIME_FORMATS: [&str; 12] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
    "%Y%m%d %H:%M:%S",
    "%Y%m%d %H:%M",
];

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d"];

/// Parse a timestamp written in one of the common layouts.
///
/// Date-only strings resolve to midnight. RFC 3339 strings keep their wall
/// clock time.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local())
}

/// Parse a single cell as a timestamp
pub fn parse_cell(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Missing => None,
        other => parse_timestamp(&other.render()),
    }
}

/// Resolves the timestamp of every row
#[derive(Debug, Clone)]
pub struct DatetimeResolver {
    merge: bool,
    handle_24hour: bool,
    validity_threshold: f64,
}

impl Default for DatetimeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DatetimeResolver {
    pub fn new() -> Self {
        Self {
            merge: false,
            handle_24hour: false,
            validity_threshold: 0.5,
        }
    }

    /// Merge the time column into the date column
    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    /// Rewrite `24:00` tokens in text time columns to `23:59:59`
    pub fn with_24hour_handling(mut self, handle: bool) -> Self {
        self.handle_24hour = handle;
        self
    }

    /// Fraction of rows that must parse for a merge to be accepted
    pub fn with_validity_threshold(mut self, threshold: f64) -> Self {
        self.validity_threshold = threshold;
        self
    }

    /// Resolve timestamps, drop unresolvable rows and sort.
    pub fn resolve(
        &self,
        frame: &RawFrame,
        date_column: &str,
        time_column: Option<&str>,
        sink: &dyn EventSink,
    ) -> PipelineResult<TimeFrame> {
        let date_idx = frame
            .column_index(date_column)
            .ok_or_else(|| PipelineError::InvalidDatetime {
                column: date_column.to_string(),
                reason: "column not found".to_string(),
            })?;

        let mut stamps: Vec<Option<NaiveDateTime>> = (0..frame.len())
            .map(|i| parse_cell(frame.cell(i, date_idx)))
            .collect();

        let time_column = time_column.filter(|c| !c.eq_ignore_ascii_case(NO_TIME_COLUMN));
        if let (true, Some(time_column)) = (self.merge, time_column) {
            let time_idx = frame
                .column_index(time_column)
                .ok_or_else(|| PipelineError::FieldNotFound(time_column.to_string()))?;

            let merged = self.merge_columns(frame, date_idx, time_idx)?;
            let valid = merged.iter().filter(|s| s.is_some()).count();
            let total = merged.len();

            if valid as f64 > total as f64 * self.validity_threshold {
                sink.record(PipelineEvent::MergeAccepted { valid, total });
                stamps = merged;
            } else {
                sink.record(PipelineEvent::MergeRejected {
                    valid,
                    total,
                    threshold: self.validity_threshold,
                });
            }
        }

        let total = frame.len();
        let records: Vec<TimedRecord> = frame
            .rows
            .iter()
            .zip(stamps)
            .filter_map(|(row, stamp)| stamp.map(|ts| TimedRecord::new(ts, row.clone())))
            .collect();

        if records.is_empty() {
            return Err(PipelineError::NoValidTimestamps { total });
        }
        if records.len() < total {
            sink.record(PipelineEvent::RowsDropped {
                dropped: total - records.len(),
                remaining: records.len(),
            });
        }

        Ok(TimeFrame::from_records(frame.columns.clone(), records))
    }

    /// Concatenate date text with (possibly synthesised) time text and parse
    fn merge_columns(
        &self,
        frame: &RawFrame,
        date_idx: usize,
        time_idx: usize,
    ) -> PipelineResult<Vec<Option<NaiveDateTime>>> {
        let time_kind = ColumnKind::infer((0..frame.len()).map(|i| frame.cell(i, time_idx)));
        let midnight = if self.handle_24hour && time_kind == ColumnKind::Text {
            Some(
                Regex::new(MIDNIGHT_TOKEN)
                    .map_err(|e| PipelineError::Internal(format!("Regex error: {}", e)))?,
            )
        } else {
            None
        };

        let merged = (0..frame.len())
            .map(|i| {
                let date = frame.cell(i, date_idx);
                if date.is_missing() {
                    return None;
                }
                let time = match (frame.cell(i, time_idx), time_kind) {
                    (Value::Missing, _) => return None,
                    // Numeric time columns hold the hour of day
                    (Value::Number(hour), ColumnKind::Numeric) => {
                        format!("{:02}:00:00", hour.trunc() as i64)
                    }
                    (cell, _) => {
                        let text = cell.render();
                        match &midnight {
                            Some(re) => re.replace_all(&text, END_OF_DAY).into_owned(),
                            None => text,
                        }
                    }
                };
                parse_timestamp(&format!("{} {}", date.render(), time))
            })
            .collect();

        Ok(merged)
    }
}

/// Distinct years of the parsed date column, ascending
pub fn available_years(frame: &RawFrame, date_column: &str) -> PipelineResult<Vec<i32>> {
    let cells = frame
        .column(date_column)
        .ok_or_else(|| PipelineError::FieldNotFound(date_column.to_string()))?;
    let years: BTreeSet<i32> = cells
        .filter_map(parse_cell)
        .map(|ts| chrono::Datelike::year(&ts))
        .collect();
    Ok(years.into_iter().collect())
}
