//! Tagged cell values
//!
//! Column types are only known at runtime, so every cell carries its own tag
//! and comparisons/reducers dispatch on it explicitly instead of coercing.

use serde::{Deserialize, Serialize};

/// A single cell in a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Finite floating point number
    Number(f64),
    /// Free-form text
    Text(String),
    /// Empty cell (serialised as `null`)
    Missing,
}

impl Value {
    /// Build a numeric cell. Non-finite values become `Missing` so that
    /// frames survive a JSON round trip unchanged.
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Value::Number(value)
        } else {
            Value::Missing
        }
    }

    /// Build a text cell. Blank strings become `Missing`.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Value::Missing
        } else {
            Value::Text(value)
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the cell the way it would appear in a text export.
    ///
    /// Integral numbers print without a fractional part (`5`, not `5.0`),
    /// which matters when date or hour columns were read as numbers.
    pub fn render(&self) -> String {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Value::Number(n) => n.to_string(),
            Value::Text(s) => s.clone(),
            Value::Missing => String::new(),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::text(value)
    }
}

impl From<Option<f64>> for Value {
    fn from(value: Option<f64>) -> Self {
        value.map(Value::number).unwrap_or(Value::Missing)
    }
}

/// Runtime type of a column, inferred from its cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Every non-missing cell is a number
    Numeric,
    /// At least one non-missing cell is text
    Text,
    /// Every cell is missing
    Empty,
}

impl ColumnKind {
    /// Infer the kind of a column from its cells
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut kind = ColumnKind::Empty;
        for cell in cells {
            match cell {
                Value::Text(_) => return ColumnKind::Text,
                Value::Number(_) => kind = ColumnKind::Numeric,
                Value::Missing => {}
            }
        }
        kind
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Text => write!(f, "text"),
            ColumnKind::Empty => write!(f, "empty"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_numbers_are_missing() {
        assert_eq!(Value::number(f64::NAN), Value::Missing);
        assert_eq!(Value::number(f64::INFINITY), Value::Missing);
        assert_eq!(Value::number(1.5), Value::Number(1.5));
    }

    #[test]
    fn test_blank_text_is_missing() {
        assert_eq!(Value::text("   "), Value::Missing);
        assert_eq!(Value::text("a"), Value::Text("a".to_string()));
    }

    #[test]
    fn test_render() {
        assert_eq!(Value::Number(5.0).render(), "5");
        assert_eq!(Value::Number(20240115.0).render(), "20240115");
        assert_eq!(Value::Number(2.5).render(), "2.5");
        assert_eq!(Value::Missing.render(), "");
    }

    #[test]
    fn test_json_representation() {
        let cells = vec![Value::Number(1.0), Value::Text("x".into()), Value::Missing];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"[1.0,"x",null]"#);

        let restored: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cells);
    }

    #[test]
    fn test_column_kind_inference() {
        let numeric = [Value::Number(1.0), Value::Missing];
        assert_eq!(ColumnKind::infer(&numeric), ColumnKind::Numeric);

        let mixed = [Value::Number(1.0), Value::Text("a".into())];
        assert_eq!(ColumnKind::infer(&mixed), ColumnKind::Text);

        let empty = [Value::Missing, Value::Missing];
        assert_eq!(ColumnKind::infer(&empty), ColumnKind::Empty);
    }
}
