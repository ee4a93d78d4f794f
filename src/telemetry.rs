//! Telemetry
//!
//! Recoverable outcomes (a rejected date/time merge, a skipped year, an
//! option that fell back to its default, ...) are reported as
//! `PipelineEvent`s through an injectable `EventSink`. Results never depend
//! on the sink; it only makes silent fallbacks observable.

use crate::config::LoggingConfig;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A recoverable event raised while processing one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Merged date+time column passed validation
    MergeAccepted { valid: usize, total: usize },
    /// Merged date+time column failed validation; date-only timestamps used
    MergeRejected {
        valid: usize,
        total: usize,
        threshold: f64,
    },
    /// Rows without a resolvable timestamp were dropped
    RowsDropped { dropped: usize, remaining: usize },
    /// Requested fields that were not aggregated (non-numeric or absent)
    FieldsExcluded { fields: Vec<String> },
    /// An unsupported option value was replaced by its default
    OptionFallback { option: String, fallback: String },
    /// A year produced no usable overlay
    YearSkipped { year: i32, reason: String },
    /// A date produced no usable overlay
    DateSkipped { date: NaiveDate, reason: String },
}

/// Receiver for pipeline events
pub trait EventSink: Send + Sync {
    fn record(&self, event: PipelineEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: PipelineEvent) {
        match &event {
            PipelineEvent::MergeAccepted { valid, total } => {
                tracing::info!(valid, total, "Merged date and time columns");
            }
            PipelineEvent::MergeRejected {
                valid,
                total,
                threshold,
            } => {
                tracing::warn!(
                    valid,
                    total,
                    threshold,
                    "Too few merged timestamps parsed, using date column only"
                );
            }
            PipelineEvent::RowsDropped { dropped, remaining } => {
                tracing::info!(dropped, remaining, "Dropped rows with invalid timestamps");
            }
            PipelineEvent::FieldsExcluded { fields } => {
                tracing::info!(?fields, "Fields excluded from aggregation");
            }
            PipelineEvent::OptionFallback { option, fallback } => {
                tracing::warn!(%option, %fallback, "Unsupported option, using default");
            }
            PipelineEvent::YearSkipped { year, reason } => {
                tracing::debug!(year, %reason, "Skipped year overlay");
            }
            PipelineEvent::DateSkipped { date, reason } => {
                tracing::debug!(%date, %reason, "Skipped daily overlay");
            }
        }
    }
}

/// Collects events in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Calling this twice
/// is harmless; the second installation is ignored.
pub fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(format!("seasonlens={}", config.level))
        });

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!("Logging already initialised: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    /// Shared buffer a test subscriber writes into
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_memory_sink_collects_in_order() {
        let sink = MemorySink::new();
        sink.record(PipelineEvent::MergeAccepted { valid: 9, total: 10 });
        sink.record(PipelineEvent::YearSkipped {
            year: 2020,
            reason: "no valid values".into(),
        });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], PipelineEvent::MergeAccepted { valid: 9, .. }));
    }

    #[test]
    fn test_event_serialization() {
        let event = PipelineEvent::RowsDropped {
            dropped: 2,
            remaining: 8,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"rows_dropped","dropped":2,"remaining":8}"#);
    }

    #[test]
    fn test_tracing_sink_forwards_events() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let sink = TracingSink;
            sink.record(PipelineEvent::OptionFallback {
                option: "reducer=median".into(),
                fallback: "mean".into(),
            });
            sink.record(PipelineEvent::YearSkipped {
                year: 2020,
                reason: "no valid values".into(),
            });
        });

        let output = captured.text();
        assert!(output.contains("WARN"));
        assert!(output.contains("Unsupported option, using default"));
        assert!(output.contains("option=reducer=median"));
        assert!(output.contains("fallback=mean"));
        assert!(output.contains("Skipped year overlay"));
        assert!(output.contains("year=2020"));
    }
}
