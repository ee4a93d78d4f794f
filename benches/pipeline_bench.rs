//! Benchmarks for the processing pipeline
//!
//! Run with: cargo bench

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use seasonlens::pipeline::{Aggregator, Granularity, Reducer};
use seasonlens::telemetry::TracingSink;
use seasonlens::{Pipeline, ProcessOptions, RawFrame, SeasonalGrouper, SeasonalMode, Value};

/// Hourly readings split into date and time columns
fn create_test_frame(hours: usize) -> RawFrame {
    let start = NaiveDate::from_ymd_opt(2016, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut frame = RawFrame::new(["date", "time", "flow"]);
    for i in 0..hours {
        let ts = start + Duration::hours(i as i64);
        frame
            .push_row(vec![
                Value::text(ts.format("%Y-%m-%d").to_string()),
                Value::text(ts.format("%H:%M").to_string()),
                Value::Number((i % 97) as f64),
            ])
            .unwrap();
    }
    frame
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process");
    let pipeline = Pipeline::default();

    for size in [1_000, 10_000, 80_000] {
        let raw = create_test_frame(size);
        group.throughput(Throughput::Elements(size as u64));

        let options = ProcessOptions::new("date", "flow").with_time_column("time", true);
        group.bench_function(format!("raw_{}", size), |b| {
            b.iter(|| pipeline.process(black_box(&raw), &options).unwrap())
        });

        let daily = options.clone().with_granularity("daily");
        group.bench_function(format!("daily_mean_{}", size), |b| {
            b.iter(|| pipeline.process(black_box(&raw), &daily).unwrap())
        });
    }

    group.finish();
}

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping");
    let sink = TracingSink;

    let raw = create_test_frame(80_000);
    let frame = Pipeline::default()
        .process(&raw, &ProcessOptions::new("date", "flow").with_time_column("time", false))
        .unwrap()
        .frame;

    group.bench_function("aggregate_hourly_to_daily", |b| {
        let aggregator = Aggregator::new(Granularity::Daily, Reducer::Mean);
        let fields = vec!["flow".to_string()];
        b.iter(|| aggregator.aggregate(black_box(frame.clone()), &fields, &sink))
    });

    group.bench_function("seasonal_daily_mode", |b| {
        let grouper = SeasonalGrouper::default();
        b.iter(|| grouper.group(black_box(&frame), "flow", SeasonalMode::Daily, &sink))
    });

    group.finish();
}

criterion_group!(benches, bench_process, bench_grouping);
criterion_main!(benches);
