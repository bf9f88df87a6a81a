//! Scrape endpoint

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use qdepth_broker::BrokerError;
use qdepth_observability::{CONTENT_TYPE, MetricsError};
use std::time::Duration;
use tracing::{debug, error};

use super::ExporterState;

/// Reasons a scrape cannot produce metrics
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("broker poll failed: {0}")]
    Broker(#[from] BrokerError),

    #[error("broker poll timed out after {0:?}")]
    Timeout(Duration),

    #[error("metric rendering failed: {0}")]
    Render(#[from] MetricsError),
}

impl ScrapeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ScrapeError::Broker(_) => StatusCode::SERVICE_UNAVAILABLE,
            ScrapeError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ScrapeError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ScrapeError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        error!(
            status_code = %status_code,
            error_message = %self,
            "Scrape failed"
        );

        (status_code, self.to_string()).into_response()
    }
}

impl ExporterState {
    /// Poll the broker once and render the exposition body
    pub async fn scrape(&self) -> Result<String, ScrapeError> {
        let stats = tokio::time::timeout(self.scrape_timeout, self.broker.queues(&self.queues))
            .await
            .map_err(|_| ScrapeError::Timeout(self.scrape_timeout))??;

        debug!(queues = stats.len(), "Scraped queue depths");
        Ok(self.metrics.render(&stats)?)
    }
}

/// GET /metrics - queue depths in the Prometheus text format
pub async fn metrics_endpoint(State(state): State<ExporterState>) -> Result<Response, ScrapeError> {
    let body = state.scrape().await?;
    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response())
}
