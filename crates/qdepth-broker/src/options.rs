//! Backend options accepted alongside the connection URL

use serde::{Deserialize, Serialize};

use crate::error::{BrokerError, BrokerResult};

/// Options that refine how a broker client is built
///
/// Each field only applies to one backend and is ignored by the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerOptions {
    /// Management API base URL (RabbitMQ), used instead of the synthesized one
    pub management_api: Option<String>,
    /// Priority levels queues are sharded across (Redis)
    pub priority_steps: Option<Vec<u32>>,
    /// Parse the management API body even when the status is not 2xx (RabbitMQ)
    pub tolerate_error_status: bool,
}

impl BrokerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON object, e.g. `{"priority_steps": [0, 5]}`
    pub fn from_json(json: &str) -> BrokerResult<Self> {
        serde_json::from_str(json).map_err(|e| BrokerError::InvalidOptions(e.to_string()))
    }

    pub fn with_management_api(mut self, url: impl Into<String>) -> Self {
        self.management_api = Some(url.into());
        self
    }

    pub fn with_priority_steps(mut self, steps: Vec<u32>) -> Self {
        self.priority_steps = Some(steps);
        self
    }

    pub fn with_tolerate_error_status(mut self, tolerate: bool) -> Self {
        self.tolerate_error_status = tolerate;
        self
    }
}
