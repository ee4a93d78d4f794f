//! Plain time series and value distribution

use super::types::{
    Axis, Bin, CatalogKind, Histogram, Overlay, OverlayStyle, SeriesCatalog, SeriesPoint,
};
use crate::frame::TimeFrame;

/// Single-overlay catalog of `field` against time; missing values are skipped
pub fn time_series(frame: &TimeFrame, field: &str) -> SeriesCatalog {
    let mut catalog = SeriesCatalog::new(
        CatalogKind::TimeSeries,
        field,
        format!("{} - time series", field),
    )
    .with_axis(Axis {
        title: "time".to_string(),
        ticks: Vec::new(),
    });

    let points = frame
        .numeric_series(field)
        .into_iter()
        .map(|(ts, v)| SeriesPoint::timed(ts, v))
        .collect();
    catalog.push(Overlay::new(field, points, OverlayStyle::new("rgb(55,126,184)", 1.0)));
    catalog
}

/// Equal-width histogram of `field`.
///
/// A constant series yields a single bin; no values yields no bins.
pub fn histogram(frame: &TimeFrame, field: &str, bins: usize) -> Histogram {
    let values: Vec<f64> = frame.numeric_series(field).into_iter().map(|(_, v)| v).collect();
    let mut histogram = Histogram {
        field: field.to_string(),
        bins: Vec::new(),
    };
    if values.is_empty() || bins == 0 {
        return histogram;
    }

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        histogram.bins.push(Bin {
            lower: min,
            upper: max,
            count: values.len(),
        });
        return histogram;
    }

    let width = (max - min) / bins as f64;
    histogram.bins = (0..bins)
        .map(|i| Bin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        histogram.bins[idx].count += 1;
    }

    histogram
}
