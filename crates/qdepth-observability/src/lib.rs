//! qdepth Observability
//!
//! Logging setup for the exporter process and rendering of the queue-length
//! gauge in the Prometheus text exposition format.

pub mod metrics;
pub mod trace;

pub use metrics::{
    CONTENT_TYPE, DEFAULT_METRIC_NAME, MAX_EXACT_DEPTH, MetricsError, QueueLengthMetrics,
};
pub use trace::{LogFormat, UnknownLogFormat, init_tracing};

/// Observability errors
#[derive(thiserror::Error, Debug)]
pub enum ObservabilityError {
    #[error("Tracing initialization failed: {0}")]
    TracingInit(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),
}
