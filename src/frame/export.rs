//! Frame export
//!
//! JSON is the interchange format for processed frames: it round-trips
//! exactly. CSV is provided for display and spreadsheet export.

use super::error::FrameResult;
use super::types::TimeFrame;

/// Timestamp format used in CSV exports
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CALENDAR_COLUMNS: [&str; 7] = [
    "year",
    "month",
    "day",
    "hour",
    "minute",
    "weekday",
    "day_of_year",
];

/// Serialize a processed frame to JSON
pub fn to_json(frame: &TimeFrame) -> FrameResult<String> {
    Ok(serde_json::to_string(frame)?)
}

/// Deserialize a processed frame from JSON, rejecting ragged rows
pub fn from_json(json: &str) -> FrameResult<TimeFrame> {
    let frame: TimeFrame = serde_json::from_str(json)?;
    frame.validate()?;
    Ok(frame)
}

/// Format a processed frame as CSV
///
/// Columns: `timestamp`, the frame's own columns, then the calendar fields.
pub fn to_csv(frame: &TimeFrame) -> FrameResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["timestamp".to_string()];
    header.extend(frame.columns.iter().cloned());
    header.extend(CALENDAR_COLUMNS.iter().map(|c| c.to_string()));
    writer.write_record(&header)?;

    for row in &frame.rows {
        let cal = &row.calendar;
        let mut record = vec![row.timestamp.format(EXPORT_TIMESTAMP_FORMAT).to_string()];
        record.extend(row.values.iter().map(|v| v.render()));
        record.extend([
            cal.year.to_string(),
            cal.month.to_string(),
            cal.day.to_string(),
            cal.hour.to_string(),
            cal.minute.to_string(),
            cal.weekday.to_string(),
            cal.day_of_year.to_string(),
        ]);
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameError, TimedRecord, Value};
    use chrono::NaiveDate;

    fn sample_frame() -> TimeFrame {
        let rows = (0..5)
            .map(|i| {
                let ts = NaiveDate::from_ymd_opt(2024, 3, 1 + i)
                    .unwrap()
                    .and_hms_opt(6, 30, 0)
                    .unwrap();
                let flow = if i == 2 {
                    Value::Missing
                } else {
                    Value::Number(i as f64 + 0.25)
                };
                TimedRecord::new(ts, vec![flow, Value::text("north")])
            })
            .collect();
        TimeFrame::from_records(vec!["flow".into(), "site".into()], rows)
    }

    #[test]
    fn test_json_round_trip_preserves_frame() {
        let frame = sample_frame();
        let json = to_json(&frame).unwrap();
        let restored = from_json(&json).unwrap();

        assert_eq!(restored.len(), frame.len());
        assert_eq!(restored.columns, frame.columns);
        assert!(restored.is_sorted());
        let original: Vec<_> = frame.rows.iter().map(|r| r.timestamp).collect();
        let after: Vec<_> = restored.rows.iter().map(|r| r.timestamp).collect();
        assert_eq!(original, after);
        assert_eq!(restored, frame);
    }

    #[test]
    fn test_from_json_rejects_ragged_rows() {
        let json = to_json(&sample_frame()).unwrap();
        let mut doc: serde_json::Value = serde_json::from_str(&json).unwrap();
        doc["rows"][3]["values"].as_array_mut().unwrap().pop();

        let err = from_json(&doc.to_string()).unwrap_err();
        assert!(matches!(
            err,
            FrameError::RowWidth {
                row: 3,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_csv_export() {
        let csv = to_csv(&sample_frame()).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "timestamp,flow,site,year,month,day,hour,minute,weekday,day_of_year"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2024-03-01 06:30:00,0.25,north,2024,3,1,6,30,4,61"
        );
        // Missing cell renders empty
        assert!(lines.nth(1).unwrap().starts_with("2024-03-03 06:30:00,,north"));
    }
}
