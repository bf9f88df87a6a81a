//! # Environment-Based Configuration
//!
//! Settings of the scrape server. The listen address and queue names normally
//! come from the command line; the rest can be tuned through the environment.
//!
//! ## Environment Variables
//!
//! - `QDEPTH_METRIC_NAME` - Name of the exported gauge (default: `celery_queue_length`)
//! - `QDEPTH_SCRAPE_TIMEOUT_SECS` - Upper bound on one broker poll in seconds (default: 10)

use qdepth_observability::DEFAULT_METRIC_NAME;
use std::{env, time::Duration};

/// Listen address used when none is given
pub const DEFAULT_ADDR: &str = "0.0.0.0:8888";

/// Queue polled when none is given
pub const DEFAULT_QUEUE: &str = "celery";

const DEFAULT_SCRAPE_TIMEOUT_SECS: u64 = 10;
const MAX_SCRAPE_TIMEOUT_SECS: u64 = 300;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable '{key}': {message}")]
    InvalidEnvVar { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Validated exporter settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    /// `host:port` to listen on
    pub addr: String,
    /// Queue names polled on every scrape
    pub queues: Vec<String>,
    /// Name of the exported gauge
    pub metric_name: String,
    /// Upper bound on one broker poll
    pub scrape_timeout: Duration,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            queues: vec![DEFAULT_QUEUE.to_string()],
            metric_name: DEFAULT_METRIC_NAME.to_string(),
            scrape_timeout: Duration::from_secs(DEFAULT_SCRAPE_TIMEOUT_SECS),
        }
    }
}

/// Builder for `ExporterConfig` with environment variable support
#[derive(Debug, Clone)]
pub struct ExporterConfigBuilder {
    addr: String,
    queues: Vec<String>,
    metric_name: String,
    scrape_timeout_secs: u64,
}

impl Default for ExporterConfigBuilder {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            queues: vec![DEFAULT_QUEUE.to_string()],
            metric_name: DEFAULT_METRIC_NAME.to_string(),
            scrape_timeout_secs: DEFAULT_SCRAPE_TIMEOUT_SECS,
        }
    }
}

impl ExporterConfigBuilder {
    /// Create a new builder with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any environment variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::default();

        if let Some(name) = get_env_string("QDEPTH_METRIC_NAME") {
            builder = builder.metric_name(name);
        }
        if let Some(timeout) = get_env_u64("QDEPTH_SCRAPE_TIMEOUT_SECS")? {
            builder = builder.scrape_timeout_secs(timeout);
        }

        Ok(builder)
    }

    /// Set the listen address
    #[must_use]
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    /// Set the polled queue names
    #[must_use]
    pub fn queues(mut self, queues: Vec<String>) -> Self {
        self.queues = queues;
        self
    }

    /// Set the gauge name
    #[must_use]
    pub fn metric_name(mut self, name: impl Into<String>) -> Self {
        self.metric_name = name.into();
        self
    }

    /// Set the scrape timeout in seconds
    #[must_use]
    pub fn scrape_timeout_secs(mut self, timeout: u64) -> Self {
        self.scrape_timeout_secs = timeout;
        self
    }

    /// Validate and build `ExporterConfig`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the configuration is invalid.
    pub fn build(self) -> Result<ExporterConfig, ConfigError> {
        self.validate()?;

        Ok(ExporterConfig {
            addr: self.addr,
            queues: self.queues,
            metric_name: self.metric_name,
            scrape_timeout: Duration::from_secs(self.scrape_timeout_secs),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.addr.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "addr cannot be empty".to_string(),
            ));
        }

        if self.metric_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "metric_name cannot be empty".to_string(),
            ));
        }

        if self.scrape_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "scrape_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.scrape_timeout_secs > MAX_SCRAPE_TIMEOUT_SECS {
            return Err(ConfigError::ValidationError(format!(
                "scrape_timeout_secs must be <= {}",
                MAX_SCRAPE_TIMEOUT_SECS
            )));
        }

        Ok(())
    }
}

// Environment variable helper functions

fn get_env_string(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn get_env_u64(key: &str) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid u64 value '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}
