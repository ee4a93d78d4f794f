//! Series catalogs
//!
//! Turns a processed time frame into ordered, styled overlays for the
//! comparison views:
//!
//! - `series`: the plain time series and histogram
//! - `seasonal`: one overlay per year plus the all-years mean
//! - `daily`: one overlay per recent date plus the all-days hourly mean
//!
//! Grouping never fails. Years or dates that yield nothing are skipped and
//! reported through the event sink.

pub mod daily;
pub mod palette;
pub mod seasonal;
pub mod series;
pub mod types;

pub use daily::DailyPatternGrouper;
pub use seasonal::{SeasonalGrouper, SeasonalMode};
pub use series::{histogram, time_series};
pub use types::{
    Axis, AxisValue, Bin, CatalogKind, Histogram, Overlay, OverlayStyle, SeriesCatalog,
    SeriesPoint, Tick, Visibility,
};

use std::collections::BTreeMap;

pub(crate) const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Mean per key, ascending by key
pub(crate) fn mean_by_key(values: impl Iterator<Item = (u32, f64)>) -> Vec<SeriesPoint> {
    let mut groups: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for (key, v) in values {
        let entry = groups.entry(key).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|(key, (sum, count))| SeriesPoint::indexed(key, sum / count as f64))
        .collect()
}
