//! HTTP request handlers
//!
//! Handlers share one [`ExporterState`]: the broker, the polled queue names,
//! the gauge renderer and the scrape timeout.

pub mod health;
pub mod metrics;

pub use health::*;
pub use metrics::*;

use std::sync::Arc;
use std::time::Duration;

use qdepth_broker::QueueDepthSource;
use qdepth_observability::{MetricsError, QueueLengthMetrics};

use crate::runtime::config::ExporterConfig;

/// State shared by all handlers
#[derive(Clone)]
pub struct ExporterState {
    broker: Arc<dyn QueueDepthSource>,
    queues: Arc<[String]>,
    metrics: QueueLengthMetrics,
    scrape_timeout: Duration,
}

impl ExporterState {
    /// Build the handler state for `broker` from the exporter settings
    ///
    /// # Errors
    ///
    /// Returns `MetricsError` if the configured metric name is invalid.
    pub fn new(
        broker: Arc<dyn QueueDepthSource>,
        config: &ExporterConfig,
    ) -> Result<Self, MetricsError> {
        Ok(Self {
            broker,
            queues: config.queues.clone().into(),
            metrics: QueueLengthMetrics::new(config.metric_name.as_str())?,
            scrape_timeout: config.scrape_timeout,
        })
    }

    pub fn queues(&self) -> &[String] {
        &self.queues
    }

    pub fn scrape_timeout(&self) -> Duration {
        self.scrape_timeout
    }
}

impl std::fmt::Debug for ExporterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterState")
            .field("backend", &self.broker.kind())
            .field("queues", &self.queues)
            .field("metrics", &self.metrics)
            .field("scrape_timeout", &self.scrape_timeout)
            .finish()
    }
}
