//! Seasonal grouping
//!
//! One overlay per recent year, keyed by month or day of year, plus an
//! all-years mean. Year overlays are added most recent first; the mean is
//! added last so it draws on top, but always ranks first in the legend.

use super::palette::{cycle, SET1};
use super::types::{Axis, CatalogKind, Overlay, OverlayStyle, SeriesCatalog, Tick};
use super::{mean_by_key, MONTH_NAMES};
use crate::frame::{Calendar, TimeFrame};
use crate::telemetry::{EventSink, PipelineEvent};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// First day of year of each month in a non-leap year
const MONTH_START_DAYS: [u32; 12] = [1, 32, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335];

pub const MEAN_OVERLAY_NAME: &str = "all-years mean";

/// Grouping key for the seasonal view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalMode {
    /// Group by calendar month (1-12)
    #[default]
    Monthly,
    /// Group by day of year (1-366)
    Daily,
}

impl SeasonalMode {
    fn key(&self, calendar: &Calendar) -> u32 {
        match self {
            SeasonalMode::Monthly => calendar.month,
            SeasonalMode::Daily => calendar.day_of_year,
        }
    }

    /// Markers are drawn in monthly mode only
    fn marker(&self, size: f64) -> Option<f64> {
        match self {
            SeasonalMode::Monthly => Some(size),
            SeasonalMode::Daily => None,
        }
    }

    fn axis(&self) -> Axis {
        let positions: Vec<u32> = match self {
            SeasonalMode::Monthly => (1..=12).collect(),
            SeasonalMode::Daily => MONTH_START_DAYS.to_vec(),
        };
        let title = match self {
            SeasonalMode::Monthly => "month",
            SeasonalMode::Daily => "day of year",
        };

        Axis {
            title: title.to_string(),
            ticks: positions
                .into_iter()
                .zip(MONTH_NAMES)
                .map(|(position, label)| Tick {
                    position,
                    label: label.to_string(),
                })
                .collect(),
        }
    }
}

impl FromStr for SeasonalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" | "month" => Ok(SeasonalMode::Monthly),
            "daily" | "day" | "dayofyear" | "day-of-year" => Ok(SeasonalMode::Daily),
            other => Err(format!("unknown seasonal mode: {}", other)),
        }
    }
}

impl std::fmt::Display for SeasonalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeasonalMode::Monthly => write!(f, "monthly"),
            SeasonalMode::Daily => write!(f, "daily"),
        }
    }
}

/// Builds the seasonal comparison catalog
#[derive(Debug, Clone, Copy)]
pub struct SeasonalGrouper {
    max_years: usize,
}

impl Default for SeasonalGrouper {
    fn default() -> Self {
        Self::new(8)
    }
}

impl SeasonalGrouper {
    pub fn new(max_years: usize) -> Self {
        Self { max_years }
    }

    fn year_style(index: usize, mode: SeasonalMode) -> OverlayStyle {
        let style = match index {
            0 => OverlayStyle::new("red", 4.0).with_marker(mode.marker(6.0)),
            1 => OverlayStyle::new(SET1[1], 3.0).with_marker(mode.marker(6.0)),
            i => OverlayStyle::new(cycle(&SET1, i), 1.5).with_marker(mode.marker(4.0)),
        };
        style.with_legend_rank(index as u32 + 2)
    }

    /// Group `field` by year.
    ///
    /// A year without valid values is skipped and reported through `sink`;
    /// a frame without rows gives an empty catalog.
    pub fn group(
        &self,
        frame: &TimeFrame,
        field: &str,
        mode: SeasonalMode,
        sink: &dyn EventSink,
    ) -> SeriesCatalog {
        let mut catalog = SeriesCatalog::new(
            CatalogKind::Seasonal,
            field,
            format!("{} - seasonal ({})", field, mode),
        )
        .with_axis(mode.axis());

        let mut years = frame.years();
        years.reverse();
        years.truncate(self.max_years);
        if years.is_empty() {
            return catalog;
        }

        let valid: Vec<(i32, u32, f64)> = match frame.column_index(field) {
            Some(idx) => frame
                .rows
                .iter()
                .filter_map(|r| {
                    let v = r.cell(idx).as_f64()?;
                    Some((r.calendar.year, mode.key(&r.calendar), v))
                })
                .collect(),
            None => Vec::new(),
        };

        for (index, year) in years.iter().enumerate() {
            let points = mean_by_key(
                valid
                    .iter()
                    .filter(|(y, _, _)| y == year)
                    .map(|(_, key, v)| (*key, *v)),
            );

            let reason = if points.is_empty() {
                Some("no valid values")
            } else if points.iter().any(|p| !p.y.is_finite()) {
                Some("non-finite mean")
            } else {
                None
            };
            if let Some(reason) = reason {
                sink.record(PipelineEvent::YearSkipped {
                    year: *year,
                    reason: reason.to_string(),
                });
                continue;
            }

            catalog.push(Overlay::new(
                year.to_string(),
                points,
                Self::year_style(index, mode),
            ));
        }

        let mean = mean_by_key(valid.iter().map(|(_, key, v)| (*key, *v)));
        if !mean.is_empty() {
            let style = OverlayStyle::new("black", 4.0)
                .with_marker(mode.marker(10.0))
                .with_legend_rank(1);
            catalog.push(Overlay::new(MEAN_OVERLAY_NAME, mean, style));
        }

        tracing::debug!(
            field,
            %mode,
            years = years.len(),
            overlays = catalog.len(),
            "Built seasonal catalog"
        );

        catalog
    }
}
