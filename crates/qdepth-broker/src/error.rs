//! Error types for broker construction and polling

use thiserror::Error;

use crate::broker::BrokerKind;

/// Result type for broker operations
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Errors that can occur while building a broker client or polling it
#[derive(Error, Debug)]
pub enum BrokerError {
    /// The connection URL names a broker type we have no backend for
    #[error("Unsupported broker type: '{scheme}'")]
    UnsupportedScheme { scheme: String },

    /// The connection URL could not be parsed
    #[error("Invalid broker URL: {0}")]
    InvalidUrl(String),

    /// Keyspace namespace did not resolve to a database index
    #[error("Namespace must be an integer database index, not '{namespace}'")]
    InvalidNamespace { namespace: String },

    /// A priority level outside the configured priority steps was requested
    #[error("Priority {level} not in priority steps")]
    InvalidPriorityLevel { level: u32 },

    /// Backend options were rejected
    #[error("Invalid broker options: {0}")]
    InvalidOptions(String),

    /// Connectivity failure talking to the broker
    #[error("{backend} transport error: {details}")]
    Transport { backend: BrokerKind, details: String },

    /// Management API body was not a queue listing
    #[error("Malformed management API response: {0}")]
    MalformedResponse(String),
}

impl BrokerError {
    /// Create a transport error for the given backend
    pub fn transport(backend: BrokerKind, details: impl Into<String>) -> Self {
        BrokerError::Transport {
            backend,
            details: details.into(),
        }
    }

    /// Whether the error happened while talking to the broker, as opposed to
    /// while building the client
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BrokerError::Transport { .. } | BrokerError::MalformedResponse(_)
        )
    }
}

impl From<redis::RedisError> for BrokerError {
    fn from(err: redis::RedisError) -> Self {
        BrokerError::transport(BrokerKind::Keyspace, err.to_string())
    }
}

impl From<reqwest::Error> for BrokerError {
    fn from(err: reqwest::Error) -> Self {
        BrokerError::transport(BrokerKind::ManagementApi, err.to_string())
    }
}

impl From<serde_json::Error> for BrokerError {
    fn from(err: serde_json::Error) -> Self {
        BrokerError::MalformedResponse(err.to_string())
    }
}

impl From<url::ParseError> for BrokerError {
    fn from(err: url::ParseError) -> Self {
        BrokerError::InvalidUrl(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BrokerError::UnsupportedScheme {
            scheme: "kafka".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported broker type: 'kafka'");

        let err = BrokerError::InvalidNamespace {
            namespace: "abc".to_string(),
        };
        assert!(err.to_string().contains("'abc'"));

        let err = BrokerError::transport(BrokerKind::Keyspace, "connection refused");
        assert_eq!(err.to_string(), "redis transport error: connection refused");
    }

    #[test]
    fn test_transport_classification() {
        assert!(BrokerError::transport(BrokerKind::ManagementApi, "503").is_transport());
        assert!(BrokerError::MalformedResponse("eof".to_string()).is_transport());
        assert!(!BrokerError::InvalidPriorityLevel { level: 4 }.is_transport());
        assert!(!BrokerError::InvalidUrl("empty host".to_string()).is_transport());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let err: BrokerError = json_err.into();
        assert!(matches!(err, BrokerError::MalformedResponse(_)));
    }
}
