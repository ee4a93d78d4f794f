//! Column detection and descriptive statistics
//!
//! Helpers the configuration surface uses to propose defaults: which columns
//! look like dates, which are numeric, and a per-column summary table.

use super::types::RawFrame;
use super::value::ColumnKind;
use serde::Serialize;

/// Substrings that mark a column name as date/time-like (matched lowercase)
pub const DATE_KEYWORDS: [&str; 5] = ["date", "time", "datetime", "日期", "时间"];

/// Columns whose name suggests a date or time, in frame order
pub fn date_like_columns(frame: &RawFrame) -> Vec<String> {
    frame
        .columns
        .iter()
        .filter(|c| {
            let lower = c.to_lowercase();
            DATE_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .cloned()
        .collect()
}

/// Columns holding only numbers (at least one present), in frame order
pub fn numeric_columns(frame: &RawFrame) -> Vec<String> {
    frame
        .columns
        .iter()
        .filter(|c| frame.column_kind(c) == Some(ColumnKind::Numeric))
        .cloned()
        .collect()
}

/// Suggested initial selection for a freshly loaded frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultSelection {
    pub date_column: Option<String>,
    pub field: Option<String>,
}

/// First date-like column (else the first column) and first numeric column
pub fn default_selection(frame: &RawFrame) -> DefaultSelection {
    let date_column = date_like_columns(frame)
        .into_iter()
        .next()
        .or_else(|| frame.columns.first().cloned());
    let field = numeric_columns(frame).into_iter().next();
    DefaultSelection { date_column, field }
}

/// Summary statistics for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1)
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Summarise every numeric column of the frame
pub fn describe(frame: &RawFrame) -> Vec<ColumnSummary> {
    numeric_columns(frame)
        .into_iter()
        .map(|column| {
            let mut values: Vec<f64> = frame
                .column(&column)
                .map(|cells| cells.filter_map(|v| v.as_f64()).collect())
                .unwrap_or_default();
            values.sort_by(f64::total_cmp);
            summarise(column, &values)
        })
        .collect()
}

fn summarise(column: String, sorted: &[f64]) -> ColumnSummary {
    let count = sorted.len();
    let mean = (count > 0).then(|| sorted.iter().sum::<f64>() / count as f64);
    let std = match (mean, count) {
        (Some(m), n) if n > 1 => {
            let var = sorted.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
            Some(var.sqrt())
        }
        _ => None,
    };

    ColumnSummary {
        column,
        count,
        mean,
        std,
        min: sorted.first().copied(),
        q25: quantile(sorted, 0.25),
        median: quantile(sorted, 0.5),
        q75: quantile(sorted, 0.75),
        max: sorted.last().copied(),
    }
}

/// Linear-interpolated quantile of a sorted slice
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}
