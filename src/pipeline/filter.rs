//! Row filtering
//!
//! Year/month selection first, then an optional single-column predicate.
//! A predicate whose literal type cannot be compared with the column type is
//! a configuration error, and filtering every row away is reported as
//! `EmptyAfterFilter` rather than returned as an empty frame.

use super::error::{FilterStage, PipelineError, PipelineResult};
use crate::frame::{ColumnKind, TimeFrame, Value};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Comparison operators, serialised by their symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
}

impl Operator {
    /// Parse an operator symbol; `=` and `<>` are accepted as aliases
    pub fn from_symbol(s: &str) -> Option<Self> {
        Some(match s.trim() {
            "==" | "=" => Self::Eq,
            "!=" | "<>" => Self::Ne,
            ">" => Self::Gt,
            ">=" => Self::Gte,
            "<" => Self::Lt,
            "<=" => Self::Lte,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }

    /// Whether `left op right` holds given how `left` orders against `right`
    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Gt => ordering == Ordering::Greater,
            Self::Gte => ordering != Ordering::Less,
            Self::Lt => ordering == Ordering::Less,
            Self::Lte => ordering != Ordering::Greater,
        }
    }

    /// Numeric comparison; NaN never matches
    pub fn compare_f64(&self, a: f64, b: f64) -> bool {
        a.partial_cmp(&b).is_some_and(|o| self.holds(o))
    }

    /// Lexicographic comparison
    pub fn compare_str(&self, a: &str, b: &str) -> bool {
        self.holds(a.cmp(b))
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Literal of a predicate after type detection
#[derive(Debug, Clone, PartialEq)]
pub enum FilterLiteral {
    Number(f64),
    Text(String),
}

impl FilterLiteral {
    /// Numeric if the literal parses as a number, text otherwise
    pub fn parse(literal: &str) -> Self {
        let trimmed = literal.trim();
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => FilterLiteral::Number(n),
            _ => FilterLiteral::Text(trimmed.to_string()),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            FilterLiteral::Number(_) => "numeric",
            FilterLiteral::Text(_) => "text",
        }
    }
}

/// `field op literal`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: String,
    #[serde(rename = "operator")]
    pub op: Operator,
    pub literal: String,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: Operator, literal: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op,
            literal: literal.into(),
        }
    }

    /// Parse an expression such as `flow >= 2.5` or `site == north`
    pub fn parse_expr(expr: &str) -> Option<Self> {
        let re = Regex::new(r"^\s*(.+?)\s*(==|!=|>=|<=|<>|=|>|<)\s*(.*?)\s*$").ok()?;
        let caps = re.captures(expr)?;
        let op = Operator::from_symbol(caps.get(2)?.as_str())?;
        Some(Self::new(caps.get(1)?.as_str(), op, caps.get(3)?.as_str()))
    }

    /// Whether a cell satisfies the predicate.
    ///
    /// Missing cells only satisfy `!=`.
    fn matches(&self, cell: &Value, literal: &FilterLiteral) -> bool {
        match (cell, literal) {
            (Value::Missing, _) => self.op == Operator::Ne,
            (Value::Number(a), FilterLiteral::Number(b)) => self.op.compare_f64(*a, *b),
            (Value::Text(a), FilterLiteral::Text(b)) => self.op.compare_str(a, b),
            (other, FilterLiteral::Text(b)) => self.op.compare_str(&other.render(), b),
            (Value::Text(a), FilterLiteral::Number(b)) => self.op.compare_str(a, &b.to_string()),
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.literal)
    }
}

/// Year/month selection plus an optional predicate
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    years: BTreeSet<i32>,
    months: BTreeSet<u32>,
    predicate: Option<Predicate>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only these years (empty = all)
    pub fn years(mut self, years: impl IntoIterator<Item = i32>) -> Self {
        self.years = years.into_iter().collect();
        self
    }

    /// Keep only these months, 1-12 (empty = all)
    pub fn months(mut self, months: impl IntoIterator<Item = u32>) -> Self {
        self.months = months.into_iter().collect();
        self
    }

    /// Add a value predicate
    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Apply the time selection, then the predicate
    pub fn apply(&self, frame: TimeFrame) -> PipelineResult<TimeFrame> {
        let mut frame = frame;

        if !self.years.is_empty() || !self.months.is_empty() {
            frame = frame.retain(|r| {
                (self.years.is_empty() || self.years.contains(&r.calendar.year))
                    && (self.months.is_empty() || self.months.contains(&r.calendar.month))
            });
            if frame.is_empty() {
                return Err(PipelineError::EmptyAfterFilter {
                    stage: FilterStage::TimeRange,
                });
            }
        }

        if let Some(predicate) = &self.predicate {
            let idx = frame
                .column_index(&predicate.field)
                .ok_or_else(|| PipelineError::FieldNotFound(predicate.field.clone()))?;
            let literal = FilterLiteral::parse(&predicate.literal);
            let kind = frame
                .column_kind(&predicate.field)
                .unwrap_or(ColumnKind::Empty);

            let mismatch = matches!(
                (kind, &literal),
                (ColumnKind::Numeric, FilterLiteral::Text(_))
                    | (ColumnKind::Text, FilterLiteral::Number(_))
            );
            if mismatch {
                return Err(PipelineError::FilterTypeMismatch {
                    field: predicate.field.clone(),
                    kind,
                    literal: predicate.literal.clone(),
                    literal_kind: literal.kind_name(),
                });
            }

            frame = frame.retain(|r| predicate.matches(r.cell(idx), &literal));
            if frame.is_empty() {
                return Err(PipelineError::EmptyAfterFilter {
                    stage: FilterStage::Predicate,
                });
            }
        }

        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::TimedRecord;
    use chrono::NaiveDate;

    /// 100 daily rows from 2022-11-01: flow = row index, site alternates
    fn frame() -> TimeFrame {
        let start = NaiveDate::from_ymd_opt(2022, 11, 1).unwrap();
        let rows = (0..100)
            .map(|i| {
                let ts = (start + chrono::Duration::days(i)).and_hms_opt(0, 0, 0).unwrap();
                let flow = if i == 50 {
                    Value::Missing
                } else {
                    Value::Number(i as f64)
                };
                let site = Value::text(if i % 2 == 0 { "north" } else { "south" });
                TimedRecord::new(ts, vec![flow, site])
            })
            .collect();
        TimeFrame::from_records(vec!["flow".into(), "site".into()], rows)
    }

    #[test]
    fn test_operator_compare() {
        assert!(Operator::Eq.compare_f64(5.0, 5.0));
        assert!(!Operator::Eq.compare_f64(5.0, 6.0));
        assert!(Operator::Gt.compare_f64(6.0, 5.0));
        assert!(!Operator::Gt.compare_f64(5.0, 5.0));
        assert!(Operator::Gte.compare_f64(5.0, 5.0));
        assert!(Operator::Lt.compare_f64(4.0, 5.0));
        assert!(Operator::Lte.compare_f64(5.0, 5.0));
        assert!(Operator::Ne.compare_f64(4.0, 5.0));

        assert!(Operator::Eq.compare_str("north", "north"));
        assert!(Operator::Ne.compare_str("north", "south"));
        assert!(Operator::Eq.compare_f64(-0.0, 0.0));
        assert!(!Operator::Ne.compare_f64(f64::NAN, 1.0));
    }

    #[test]
    fn test_literal_detection() {
        assert_eq!(FilterLiteral::parse(" 2.5 "), FilterLiteral::Number(2.5));
        assert_eq!(FilterLiteral::parse("north"), FilterLiteral::Text("north".into()));
        assert_eq!(FilterLiteral::parse("nan"), FilterLiteral::Text("nan".into()));
    }

    #[test]
    fn test_parse_expr() {
        let p = Predicate::parse_expr("flow >= 2.5").unwrap();
        assert_eq!(p, Predicate::new("flow", Operator::Gte, "2.5"));

        let p = Predicate::parse_expr("site==north").unwrap();
        assert_eq!(p, Predicate::new("site", Operator::Eq, "north"));

        let p = Predicate::parse_expr("Water Level != 0").unwrap();
        assert_eq!(p.field, "Water Level");
        assert_eq!(p.op, Operator::Ne);

        assert!(Predicate::parse_expr("flow").is_none());
    }

    #[test]
    fn test_operator_serde_names() {
        let p: Predicate =
            serde_json::from_str(r#"{"field":"flow","operator":"<=","literal":"3"}"#).unwrap();
        assert_eq!(p.op, Operator::Lte);
    }

    #[test]
    fn test_year_and_month_selection() {
        let filtered = RowFilter::new().years([2023]).months([1]).apply(frame()).unwrap();
        assert_eq!(filtered.len(), 31);
        assert!(filtered
            .rows
            .iter()
            .all(|r| r.calendar.year == 2023 && r.calendar.month == 1));
    }

    #[test]
    fn test_time_selection_can_empty_the_frame() {
        let err = RowFilter::new().years([1999]).apply(frame()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::EmptyAfterFilter {
                stage: FilterStage::TimeRange
            }
        );
    }

    #[test]
    fn test_numeric_predicate() {
        let filtered = RowFilter::new()
            .predicate(Predicate::new("flow", Operator::Gte, "90"))
            .apply(frame())
            .unwrap();
        assert_eq!(filtered.len(), 10);

        // Missing cells only pass `!=`
        let filtered = RowFilter::new()
            .predicate(Predicate::new("flow", Operator::Ne, "0"))
            .apply(frame())
            .unwrap();
        assert_eq!(filtered.len(), 99);
    }

    #[test]
    fn test_text_predicate() {
        let filtered = RowFilter::new()
            .predicate(Predicate::new("site", Operator::Eq, "north"))
            .apply(frame())
            .unwrap();
        assert_eq!(filtered.len(), 50);
    }

    #[test]
    fn test_predicate_matching_nothing_is_an_error() {
        let err = RowFilter::new()
            .predicate(Predicate::new("flow", Operator::Gt, "1000"))
            .apply(frame())
            .unwrap_err();
        assert!(err.is_no_match());
        assert_eq!(
            err,
            PipelineError::EmptyAfterFilter {
                stage: FilterStage::Predicate
            }
        );
    }

    #[test]
    fn test_type_mismatch() {
        let err = RowFilter::new()
            .predicate(Predicate::new("flow", Operator::Eq, "high"))
            .apply(frame())
            .unwrap_err();
        assert!(matches!(err, PipelineError::FilterTypeMismatch { kind: ColumnKind::Numeric, .. }));

        let err = RowFilter::new()
            .predicate(Predicate::new("site", Operator::Gt, "3"))
            .apply(frame())
            .unwrap_err();
        assert!(matches!(err, PipelineError::FilterTypeMismatch { kind: ColumnKind::Text, .. }));
    }

    #[test]
    fn test_unknown_predicate_field() {
        let err = RowFilter::new()
            .predicate(Predicate::new("depth", Operator::Eq, "1"))
            .apply(frame())
            .unwrap_err();
        assert_eq!(err, PipelineError::FieldNotFound("depth".into()));
    }
}
