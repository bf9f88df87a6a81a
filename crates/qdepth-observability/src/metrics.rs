//! Queue-length gauge rendering
//!
//! Every scrape renders into a fresh registry, so a queue that disappears
//! from one poll to the next also disappears from the output.

use prometheus::{IntGaugeVec, Opts, Registry, TextEncoder};
use qdepth_broker::QueueStat;
use thiserror::Error;

/// Metric name used when none is configured
pub const DEFAULT_METRIC_NAME: &str = "celery_queue_length";

/// Content type of the rendered exposition
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Label carrying the queue name
pub const QUEUE_LABEL: &str = "queue";

const DEFAULT_HELP: &str = "Number of messages waiting in the queue";

/// Largest depth the exposition can carry exactly
///
/// Gauge samples are written as `f64`; every integer up to 2^53 survives that
/// conversion, so deeper queues are clamped here.
pub const MAX_EXACT_DEPTH: u64 = 1 << 53;

/// Renders queue depths as one gauge with a `queue` label
#[derive(Debug, Clone)]
pub struct QueueLengthMetrics {
    name: String,
    help: String,
}

impl Default for QueueLengthMetrics {
    fn default() -> Self {
        Self {
            name: DEFAULT_METRIC_NAME.to_string(),
            help: DEFAULT_HELP.to_string(),
        }
    }
}

impl QueueLengthMetrics {
    /// Create a renderer for the gauge called `name`
    ///
    /// Fails if `name` is not a valid Prometheus metric name.
    pub fn new(name: impl Into<String>) -> Result<Self, MetricsError> {
        let metrics = Self {
            name: name.into(),
            help: DEFAULT_HELP.to_string(),
        };
        metrics.gauge()?;
        Ok(metrics)
    }

    /// Replace the `# HELP` text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn gauge(&self) -> Result<IntGaugeVec, MetricsError> {
        Ok(IntGaugeVec::new(
            Opts::new(self.name.as_str(), self.help.as_str()),
            &[QUEUE_LABEL],
        )?)
    }

    /// Render one sample per stat in the text exposition format
    ///
    /// A name repeated in `stats` keeps its last depth. Depths above
    /// [`MAX_EXACT_DEPTH`] are reported as [`MAX_EXACT_DEPTH`].
    pub fn render(&self, stats: &[QueueStat]) -> Result<String, MetricsError> {
        let registry = Registry::new();
        let gauge = self.gauge()?;
        registry.register(Box::new(gauge.clone()))?;

        for stat in stats {
            gauge
                .with_label_values(&[stat.name.as_str()])
                .set(exact_depth(stat.depth));
        }

        let encoder = TextEncoder::new();
        Ok(encoder.encode_to_string(&registry.gather())?)
    }
}

fn exact_depth(depth: u64) -> i64 {
    i64::try_from(depth.min(MAX_EXACT_DEPTH)).unwrap_or(i64::MAX)
}

/// Metric rendering errors
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}
