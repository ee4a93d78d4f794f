//! Frame types
//!
//! - `RawFrame`: decoded tabular input, no schema beyond column names
//! - `TimeFrame`: rows carrying a resolved timestamp and calendar fields
//! - `Calendar`: derived calendar fields for one timestamp

use super::error::{FrameError, FrameResult};
use super::value::{ColumnKind, Value};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

static MISSING: Value = Value::Missing;

fn check_width(row: usize, expected: usize, found: usize) -> FrameResult<()> {
    if found != expected {
        return Err(FrameError::RowWidth {
            row,
            expected,
            found,
        });
    }
    Ok(())
}

/// Decoded tabular dataset as handed over by the ingestion layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    /// Ordered column names
    pub columns: Vec<String>,
    /// Rows, each aligned with `columns`
    pub rows: Vec<Vec<Value>>,
}

impl RawFrame {
    /// Create an empty frame with the given columns
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, checking its width against the header
    pub fn push_row(&mut self, row: Vec<Value>) -> FrameResult<()> {
        check_width(self.rows.len(), self.columns.len(), row.len())?;
        self.rows.push(row);
        Ok(())
    }

    /// Check every row against the header width.
    ///
    /// Frames assembled through `push_row` always pass; deserialized ones
    /// may not.
    pub fn validate(&self) -> FrameResult<()> {
        self.rows
            .iter()
            .enumerate()
            .try_for_each(|(i, row)| check_width(i, self.columns.len(), row.len()))
    }

    /// Cell at (`row`, `col`); out-of-range cells read as missing
    pub fn cell(&self, row: usize, col: usize) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&MISSING)
    }

    /// Builder variant of `push_row`
    pub fn with_row(mut self, row: Vec<Value>) -> FrameResult<Self> {
        self.push_row(row)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterate the cells of one column
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(move |row| row.get(idx).unwrap_or(&MISSING)),
        )
    }

    /// Runtime type of a column
    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        self.column(name).map(ColumnKind::infer)
    }
}

/// Calendar fields derived from a timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub year: i32,
    /// 1-12
    pub month: u32,
    /// 1-31
    pub day: u32,
    /// 0-23
    pub hour: u32,
    /// 0-59
    pub minute: u32,
    /// 0 = Monday
    pub weekday: u32,
    /// 1-366, leap-year aware
    pub day_of_year: u32,
}

impl Calendar {
    pub fn from_timestamp(ts: &NaiveDateTime) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
            day: ts.day(),
            hour: ts.hour(),
            minute: ts.minute(),
            weekday: ts.weekday().num_days_from_monday(),
            day_of_year: ts.ordinal(),
        }
    }
}

/// One row of a `TimeFrame`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedRecord {
    pub timestamp: NaiveDateTime,
    pub calendar: Calendar,
    /// Cells aligned with `TimeFrame::columns`
    pub values: Vec<Value>,
}

impl TimedRecord {
    /// Create a record, deriving calendar fields from the timestamp
    pub fn new(timestamp: NaiveDateTime, values: Vec<Value>) -> Self {
        Self {
            timestamp,
            calendar: Calendar::from_timestamp(&timestamp),
            values,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Cell for column `idx`; out-of-range cells read as missing
    pub fn cell(&self, idx: usize) -> &Value {
        self.values.get(idx).unwrap_or(&MISSING)
    }
}

/// Rows with a resolved timestamp, sorted ascending by timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeFrame {
    pub columns: Vec<String>,
    pub rows: Vec<TimedRecord>,
}

impl TimeFrame {
    /// Build a frame, establishing timestamp order.
    ///
    /// The sort is stable, so rows sharing a timestamp keep input order.
    pub fn from_records(columns: Vec<String>, mut rows: Vec<TimedRecord>) -> Self {
        rows.sort_by_key(|r| r.timestamp);
        Self { columns, rows }
    }

    /// Check every record against the header width
    pub fn validate(&self) -> FrameResult<()> {
        self.rows
            .iter()
            .enumerate()
            .try_for_each(|(i, r)| check_width(i, self.columns.len(), r.values.len()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        let idx = self.column_index(name)?;
        Some(ColumnKind::infer(self.rows.iter().map(|r| r.cell(idx))))
    }

    /// Keep only the rows matching `keep`, preserving order
    pub fn retain(self, mut keep: impl FnMut(&TimedRecord) -> bool) -> Self {
        let rows = self.rows.into_iter().filter(|r| keep(r)).collect();
        Self {
            columns: self.columns,
            rows,
        }
    }

    /// `(timestamp, value)` pairs for the numeric cells of a column
    pub fn numeric_series(&self, field: &str) -> Vec<(NaiveDateTime, f64)> {
        let Some(idx) = self.column_index(field) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|r| r.cell(idx).as_f64().map(|v| (r.timestamp, v)))
            .collect()
    }

    /// Distinct calendar years, ascending
    pub fn years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self.rows.iter().map(|r| r.calendar.year).collect();
        years.into_iter().collect()
    }

    /// Distinct calendar dates, ascending
    pub fn dates(&self) -> Vec<NaiveDate> {
        let dates: BTreeSet<NaiveDate> = self.rows.iter().map(TimedRecord::date).collect();
        dates.into_iter().collect()
    }

    /// Number of distinct hour-of-day values present
    pub fn distinct_hours(&self) -> usize {
        let hours: BTreeSet<u32> = self.rows.iter().map(|r| r.calendar.hour).collect();
        hours.len()
    }

    /// True when timestamps never decrease
    pub fn is_sorted(&self) -> bool {
        self.rows.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_push_row_checks_width() {
        let mut frame = RawFrame::new(["date", "value"]);
        assert!(frame.push_row(vec![Value::text("2024-01-01"), Value::Number(1.0)]).is_ok());

        let err = frame.push_row(vec![Value::Missing]).unwrap_err();
        assert!(matches!(err, FrameError::RowWidth { expected: 2, found: 1, .. }));
    }

    #[test]
    fn test_deserialized_ragged_rows_fail_validation() {
        let json = r#"{"columns":["date","flow"],"rows":[["2024-01-01",1.0],["2024-01-02"]]}"#;
        let frame: RawFrame = serde_json::from_str(json).unwrap();

        let err = frame.validate().unwrap_err();
        assert!(matches!(
            err,
            FrameError::RowWidth {
                row: 1,
                expected: 2,
                found: 1
            }
        ));
        assert_eq!(frame.cell(1, 1), &Value::Missing);
        assert_eq!(frame.cell(0, 1), &Value::Number(1.0));
        assert_eq!(frame.column_kind("flow"), Some(ColumnKind::Numeric));
    }

    #[test]
    fn test_column_kind() {
        let frame = RawFrame::new(["date", "value"])
            .with_row(vec![Value::text("2024-01-01"), Value::Number(1.0)])
            .unwrap()
            .with_row(vec![Value::text("2024-01-02"), Value::Missing])
            .unwrap();

        assert_eq!(frame.column_kind("value"), Some(ColumnKind::Numeric));
        assert_eq!(frame.column_kind("date"), Some(ColumnKind::Text));
        assert_eq!(frame.column_kind("nope"), None);
    }

    #[test]
    fn test_calendar_fields() {
        // 2024-12-31 is a Tuesday and the 366th day of a leap year
        let cal = Calendar::from_timestamp(&ts(2024, 12, 31, 13));
        assert_eq!(cal.year, 2024);
        assert_eq!(cal.month, 12);
        assert_eq!(cal.day, 31);
        assert_eq!(cal.hour, 13);
        assert_eq!(cal.weekday, 1);
        assert_eq!(cal.day_of_year, 366);

        let cal = Calendar::from_timestamp(&ts(2023, 12, 31, 0));
        assert_eq!(cal.day_of_year, 365);
    }

    #[test]
    fn test_from_records_sorts() {
        let rows = vec![
            TimedRecord::new(ts(2024, 1, 3, 0), vec![Value::Number(3.0)]),
            TimedRecord::new(ts(2024, 1, 1, 0), vec![Value::Number(1.0)]),
            TimedRecord::new(ts(2024, 1, 2, 0), vec![Value::Number(2.0)]),
        ];
        let frame = TimeFrame::from_records(vec!["v".into()], rows);

        assert!(frame.is_sorted());
        let values: Vec<f64> = frame.numeric_series("v").iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_distinct_helpers() {
        let rows = vec![
            TimedRecord::new(ts(2023, 5, 1, 0), vec![]),
            TimedRecord::new(ts(2024, 1, 1, 6), vec![]),
            TimedRecord::new(ts(2024, 1, 1, 6), vec![]),
        ];
        let frame = TimeFrame::from_records(vec![], rows);

        assert_eq!(frame.years(), vec![2023, 2024]);
        assert_eq!(frame.dates().len(), 2);
        assert_eq!(frame.distinct_hours(), 2);
    }

    #[test]
    fn test_time_frame_validate() {
        let rows = vec![
            TimedRecord::new(ts(2024, 1, 1, 0), vec![Value::Number(1.0)]),
            TimedRecord::new(ts(2024, 1, 2, 0), vec![]),
        ];
        let frame = TimeFrame::from_records(vec!["v".into()], rows);

        assert!(matches!(
            frame.validate(),
            Err(FrameError::RowWidth { row: 1, .. })
        ));
        assert_eq!(frame.rows[1].cell(0), &Value::Missing);
        assert_eq!(frame.numeric_series("v").len(), 1);
    }
}
