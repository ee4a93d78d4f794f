//! Catalog types
//!
//! The rendering contract: ordered, styled overlays plus axis metadata.
//! Insertion order is draw order; legend rank is independent of it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// X coordinate of a point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    /// Month (1-12), day of year (1-366) or hour (0-23)
    Index(u32),
    /// Absolute timestamp for plain series
    Time(NaiveDateTime),
}

/// One (x, y) point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub x: AxisValue,
    pub y: f64,
}

impl SeriesPoint {
    pub fn indexed(x: u32, y: f64) -> Self {
        Self {
            x: AxisValue::Index(x),
            y,
        }
    }

    pub fn timed(x: NaiveDateTime, y: f64) -> Self {
        Self {
            x: AxisValue::Time(x),
            y,
        }
    }
}

/// Default visibility of an overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Drawn initially
    Visible,
    /// Listed in the legend, drawn once toggled on
    LegendOnly,
}

impl Visibility {
    pub fn is_visible(&self) -> bool {
        matches!(self, Visibility::Visible)
    }
}

/// Visual attributes of an overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// CSS colour name or `rgb(r,g,b)`
    pub color: String,
    pub line_width: f64,
    /// `None` draws lines only
    pub marker_size: Option<f64>,
    pub visibility: Visibility,
    /// 1 is listed first
    pub legend_rank: u32,
    /// Position in draw order; higher draws on top
    pub z_priority: u32,
}

impl OverlayStyle {
    pub fn new(color: impl Into<String>, line_width: f64) -> Self {
        Self {
            color: color.into(),
            line_width,
            marker_size: None,
            visibility: Visibility::Visible,
            legend_rank: 1,
            z_priority: 0,
        }
    }

    pub fn with_marker(mut self, size: Option<f64>) -> Self {
        self.marker_size = size;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_legend_rank(mut self, rank: u32) -> Self {
        self.legend_rank = rank;
        self
    }
}

/// A named, styled series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub name: String,
    pub points: Vec<SeriesPoint>,
    pub style: OverlayStyle,
}

impl Overlay {
    pub fn new(name: impl Into<String>, points: Vec<SeriesPoint>, style: OverlayStyle) -> Self {
        Self {
            name: name.into(),
            points,
            style,
        }
    }
}

/// A labelled tick on the x axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub position: u32,
    pub label: String,
}

/// X axis metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    pub title: String,
    /// Empty means the renderer picks ticks
    pub ticks: Vec<Tick>,
}

/// Which comparison view a catalog belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    TimeSeries,
    Seasonal,
    DailyPattern,
}

/// Ordered overlays for one field and one view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesCatalog {
    pub kind: CatalogKind,
    pub field: String,
    pub title: String,
    pub x_axis: Axis,
    pub overlays: Vec<Overlay>,
}

impl SeriesCatalog {
    pub fn new(kind: CatalogKind, field: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            title: title.into(),
            x_axis: Axis::default(),
            overlays: Vec::new(),
        }
    }

    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.x_axis = axis;
        self
    }

    /// Append an overlay; its z-priority becomes its insertion index
    pub fn push(&mut self, mut overlay: Overlay) {
        overlay.style.z_priority = self.overlays.len() as u32;
        self.overlays.push(overlay);
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Overlay> {
        self.overlays.iter().find(|o| o.name == name)
    }

    /// Overlays in legend order
    pub fn legend_order(&self) -> Vec<&Overlay> {
        let mut ordered: Vec<&Overlay> = self.overlays.iter().collect();
        ordered.sort_by_key(|o| o.style.legend_rank);
        ordered
    }
}

/// One histogram bin, `[lower, upper)` except the last which is closed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Value distribution of one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub field: String,
    pub bins: Vec<Bin>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_z_priority() {
        let mut catalog = SeriesCatalog::new(CatalogKind::Seasonal, "flow", "flow");
        let style = |color: &str, rank| OverlayStyle::new(color, 1.0).with_legend_rank(rank);
        catalog.push(Overlay::new("a", vec![], style("red", 2)));
        catalog.push(Overlay::new("b", vec![], style("black", 1)));

        assert_eq!(catalog.overlays[0].style.z_priority, 0);
        assert_eq!(catalog.overlays[1].style.z_priority, 1);

        let legend: Vec<&str> = catalog.legend_order().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(legend, vec!["b", "a"]);
    }

    #[test]
    fn test_axis_value_serializes_untagged() {
        let p = SeriesPoint::indexed(3, 1.5);
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"x":3,"y":1.5}"#);
    }
}
