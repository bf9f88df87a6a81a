//! Startup and serve errors of the `qdepth` binary

use std::time::Duration;

use qdepth_broker::BrokerError;
use qdepth_http::{ConfigError, ServeError};
use qdepth_observability::{MetricsError, ObservabilityError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Logging setup failed: {0}")]
    Observability(#[from] ObservabilityError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Broker did not answer the startup poll within {0:?}")]
    StartupTimeout(Duration),

    #[error("Invalid metric: {0}")]
    Metrics(#[from] MetricsError),

    #[error(transparent)]
    Serve(#[from] ServeError),
}
