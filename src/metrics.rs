//! Injected observability sink.
//!
//! Instrumented call sites (oracle RPC, poll cycles) report one observation
//! per operation: a logical name, an outcome and a duration. The sink is
//! constructed once at startup and shared by reference, so there is no
//! process-wide mutable metrics state. Serving the backing registry over
//! HTTP is left to the operational surface around this service.

use std::time::Duration;

use prometheus::{HistogramVec, Registry, register_histogram_vec_with_registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Error => "error",
        }
    }

    pub fn of<T, E>(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            Outcome::Success
        } else {
            Outcome::Error
        }
    }
}

pub trait ObservabilitySink: Send + Sync {
    fn observe(&self, operation: &str, outcome: Outcome, duration: Duration);
}

const DURATION_BUCKETS_SECONDS: &[f64] = &[0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Sink backed by a Prometheus histogram labeled by operation and status.
pub struct PrometheusSink {
    operation_duration: HistogramVec,
}

impl PrometheusSink {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let operation_duration = register_histogram_vec_with_registry!(
            "operation_duration_seconds",
            "Histogram of instrumented operation durations in seconds.",
            &["operation", "status"],
            DURATION_BUCKETS_SECONDS.to_vec(),
            registry
        )?;
        Ok(Self { operation_duration })
    }
}

impl ObservabilitySink for PrometheusSink {
    fn observe(&self, operation: &str, outcome: Outcome, duration: Duration) {
        self.operation_duration
            .with_label_values(&[operation, outcome.as_str()])
            .observe(duration.as_secs_f64());
    }
}

/// Discards every observation. Used in tests.
pub struct NoopSink;

impl ObservabilitySink for NoopSink {
    fn observe(&self, _operation: &str, _outcome: Outcome, _duration: Duration) {}
}
