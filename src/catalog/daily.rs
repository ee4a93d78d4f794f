//! Daily pattern grouping
//!
//! Intraday shape of the most recent dates against the all-days hourly mean.

use super::mean_by_key;
use super::palette::{cycle, SET3};
use super::types::{
    Axis, CatalogKind, Overlay, OverlayStyle, SeriesCatalog, SeriesPoint, Tick, Visibility,
};
use crate::frame::TimeFrame;
use crate::telemetry::{EventSink, PipelineEvent};

pub const MEAN_OVERLAY_NAME: &str = "all-days mean";

/// Builds the daily pattern catalog
#[derive(Debug, Clone, Copy)]
pub struct DailyPatternGrouper {
    max_days: usize,
    visible_days: usize,
}

impl Default for DailyPatternGrouper {
    fn default() -> Self {
        Self::new(30, 5)
    }
}

impl DailyPatternGrouper {
    pub fn new(max_days: usize, visible_days: usize) -> Self {
        Self {
            max_days,
            visible_days,
        }
    }

    fn axis() -> Axis {
        Axis {
            title: "hour".to_string(),
            ticks: (0..24)
                .step_by(2)
                .map(|h| Tick {
                    position: h,
                    label: format!("{}:00", h),
                })
                .collect(),
        }
    }

    /// Group `field` by hour for each selected date.
    ///
    /// Dates are selected most recent first; selection index `i` sets colour,
    /// legend rank and visibility. Overlays are inserted oldest first so the
    /// newest dates draw on top.
    pub fn group(&self, frame: &TimeFrame, field: &str, sink: &dyn EventSink) -> SeriesCatalog {
        let mut catalog = SeriesCatalog::new(
            CatalogKind::DailyPattern,
            field,
            format!("{} - daily pattern", field),
        )
        .with_axis(Self::axis());

        let Some(idx) = frame.column_index(field) else {
            return catalog;
        };

        let mean = mean_by_key(
            frame
                .rows
                .iter()
                .filter_map(|r| r.cell(idx).as_f64().map(|v| (r.calendar.hour, v))),
        );
        if !mean.is_empty() {
            let style = OverlayStyle::new("red", 3.0)
                .with_marker(Some(6.0))
                .with_legend_rank(1);
            catalog.push(Overlay::new(MEAN_OVERLAY_NAME, mean, style));
        }

        let selected: Vec<_> = frame.dates().into_iter().rev().take(self.max_days).collect();

        for (i, date) in selected.iter().enumerate().rev() {
            let mut points: Vec<(u32, f64)> = frame
                .rows
                .iter()
                .filter(|r| r.date() == *date)
                .filter_map(|r| r.cell(idx).as_f64().map(|v| (r.calendar.hour, v)))
                .collect();

            if points.is_empty() {
                sink.record(PipelineEvent::DateSkipped {
                    date: *date,
                    reason: "no valid values".to_string(),
                });
                continue;
            }
            points.sort_by_key(|(hour, _)| *hour);

            let visibility = if i < self.visible_days {
                Visibility::Visible
            } else {
                Visibility::LegendOnly
            };
            let style = OverlayStyle::new(cycle(&SET3, i), 1.5)
                .with_marker(Some(4.0))
                .with_visibility(visibility)
                .with_legend_rank(i as u32 + 2);

            catalog.push(Overlay::new(
                date.format("%Y-%m-%d").to_string(),
                points
                    .into_iter()
                    .map(|(hour, v)| SeriesPoint::indexed(hour, v))
                    .collect(),
                style,
            ));
        }

        tracing::debug!(
            field,
            dates = selected.len(),
            overlays = catalog.len(),
            "Built daily pattern catalog"
        );

        catalog
    }
}
