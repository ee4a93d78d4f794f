//! CSV Import
//!
//! Turns decoded CSV text into a `RawFrame`. Column types are inferred:
//! a column is numeric when every non-empty cell parses as a number,
//! otherwise all of its non-empty cells are kept as text.

use super::error::{FrameError, FrameResult};
use super::types::RawFrame;
use super::value::Value;
use std::io::Read;
use std::path::Path;

/// CSV importer with configurable dialect
pub struct CsvImporter {
    /// Whether the CSV has a header row
    has_header: bool,
    /// Field delimiter
    delimiter: u8,
}

/// Result of a CSV import operation
#[derive(Debug)]
pub struct CsvImportResult {
    pub frame: RawFrame,
    pub rows_processed: usize,
    pub rows_failed: usize,
    pub errors: Vec<String>,
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvImporter {
    /// Create a new CSV importer with default settings
    pub fn new() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
        }
    }

    /// Set whether the CSV has a header row
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Import data from a CSV file
    pub fn import(&self, path: &Path) -> FrameResult<CsvImportResult> {
        let file = std::fs::File::open(path)?;
        self.import_reader(file)
    }

    /// Import from a CSV string
    pub fn import_str(&self, csv_data: &str) -> FrameResult<CsvImportResult> {
        self.import_reader(csv_data.as_bytes())
    }

    /// Import from any reader
    pub fn import_reader<R: Read>(&self, reader: R) -> FrameResult<CsvImportResult> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.has_header)
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(reader);

        let mut columns: Vec<String> = if self.has_header {
            reader.headers()?.iter().map(|h| h.trim().to_string()).collect()
        } else {
            Vec::new()
        };

        let mut cells: Vec<Vec<String>> = Vec::new();
        let mut rows_failed = 0;
        let mut errors = Vec::new();

        for (line_num, result) in reader.records().enumerate() {
            let actual_line = if self.has_header {
                line_num + 2
            } else {
                line_num + 1
            };

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    errors.push(format!("Line {}: {}", actual_line, e));
                    rows_failed += 1;
                    continue;
                }
            };

            if columns.is_empty() {
                columns = (0..record.len()).map(|i| format!("column_{}", i)).collect();
            }

            if record.len() > columns.len() {
                errors.push(format!(
                    "Line {}: {} fields, header has {}",
                    actual_line,
                    record.len(),
                    columns.len()
                ));
                rows_failed += 1;
                continue;
            }

            // Short rows are padded with empty cells
            let mut row: Vec<String> = record.iter().map(|s| s.trim().to_string()).collect();
            row.resize(columns.len(), String::new());
            cells.push(row);
        }

        if cells.is_empty() && rows_failed == 0 {
            return Err(FrameError::NoRows);
        }

        let numeric: Vec<bool> = (0..columns.len())
            .map(|col| {
                cells
                    .iter()
                    .map(|row| row[col].as_str())
                    .filter(|s| !s.is_empty())
                    .all(|s| s.parse::<f64>().is_ok())
            })
            .collect();

        let rows_processed = cells.len();
        let mut frame = RawFrame::new(columns);
        for row in cells {
            let values = row
                .into_iter()
                .zip(&numeric)
                .map(|(cell, is_numeric)| typed_cell(cell, *is_numeric))
                .collect();
            frame.push_row(values)?;
        }

        // Truncate errors if too many
        if errors.len() > 100 {
            let total = errors.len();
            errors.truncate(100);
            errors.push(format!("... and {} more errors", total - 100));
        }

        tracing::debug!(
            rows = rows_processed,
            failed = rows_failed,
            columns = frame.columns.len(),
            "Imported CSV"
        );

        Ok(CsvImportResult {
            frame,
            rows_processed,
            rows_failed,
            errors,
        })
    }
}

fn typed_cell(cell: String, numeric: bool) -> Value {
    if cell.is_empty() {
        return Value::Missing;
    }
    if numeric {
        cell.parse::<f64>().map(Value::number).unwrap_or(Value::Missing)
    } else {
        Value::text(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ColumnKind;

    #[test]
    fn test_simple_csv_import() {
        let csv_data = "date,time,flow,site
2024-01-15,10:00,7.5,north
2024-01-16,11:00,8.0,south
2024-01-17,12:00,6.5,north";

        let result = CsvImporter::new().import_str(csv_data).unwrap();

        assert_eq!(result.rows_processed, 3);
        assert_eq!(result.rows_failed, 0);
        assert_eq!(result.frame.columns, vec!["date", "time", "flow", "site"]);
        assert_eq!(result.frame.column_kind("flow"), Some(ColumnKind::Numeric));
        assert_eq!(result.frame.column_kind("site"), Some(ColumnKind::Text));
        assert_eq!(result.frame.column_kind("time"), Some(ColumnKind::Text));
    }

    #[test]
    fn test_csv_with_missing_values() {
        let csv_data = "date,flow,level
2024-01-15,7.5,
2024-01-16,,7.0
2024-01-17,6.5";

        let result = CsvImporter::new().import_str(csv_data).unwrap();
        let frame = &result.frame;

        assert_eq!(result.rows_processed, 3);
        assert_eq!(frame.rows[0][2], Value::Missing);
        assert_eq!(frame.rows[1][1], Value::Missing);
        // Short row padded
        assert_eq!(frame.rows[2][2], Value::Missing);
        assert_eq!(frame.column_kind("level"), Some(ColumnKind::Numeric));
    }

    #[test]
    fn test_numeric_hour_column() {
        let csv_data = "date,hour
2024-01-15,0
2024-01-15,13";

        let result = CsvImporter::new().import_str(csv_data).unwrap();
        assert_eq!(result.frame.column_kind("hour"), Some(ColumnKind::Numeric));
        assert_eq!(result.frame.rows[1][1], Value::Number(13.0));
    }

    #[test]
    fn test_long_rows_are_reported() {
        let csv_data = "date,flow
2024-01-15,1.0,extra
2024-01-16,2.0";

        let result = CsvImporter::new().import_str(csv_data).unwrap();
        assert_eq!(result.rows_processed, 1);
        assert_eq!(result.rows_failed, 1);
        assert!(result.errors[0].starts_with("Line 2"));
    }

    #[test]
    fn test_headerless_and_delimiter() {
        let csv_data = "2024-01-15;1.5\n2024-01-16;2.5";

        let result = CsvImporter::new()
            .with_header(false)
            .with_delimiter(b';')
            .import_str(csv_data)
            .unwrap();

        assert_eq!(result.frame.columns, vec!["column_0", "column_1"]);
        assert_eq!(result.frame.len(), 2);
    }

    #[test]
    fn test_header_only_is_an_error() {
        let result = CsvImporter::new().import_str("date,flow\n");
        assert!(matches!(result, Err(FrameError::NoRows)));
    }

    #[test]
    fn test_import_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "date,flow\n2024-01-15,1.0\n").unwrap();

        let result = CsvImporter::new().import(&path).unwrap();
        assert_eq!(result.frame.len(), 1);
    }
}
