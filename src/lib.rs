//! # qdepth
//!
//! Exports the backlog depth of Celery queues as a Prometheus gauge.
//!
//! - [`broker`]: broker URL parsing and the RabbitMQ / Redis depth backends
//! - [`observability`]: logging setup and gauge rendering
//! - [`http`]: the scrape server

pub use qdepth_broker as broker;
pub use qdepth_http as http;
pub use qdepth_observability as observability;

pub use qdepth_broker::{Broker, BrokerError, BrokerOptions, QueueDepthSource, QueueStat};
pub use qdepth_http::{ExporterConfig, ExporterConfigBuilder, ExporterState};
pub use qdepth_observability::QueueLengthMetrics;
