//! Core QueueDepthSource trait and the broker factory

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    descriptor::ConnectionDescriptor,
    error::{BrokerError, BrokerResult},
    keyspace::KeyspaceBroker,
    management::ManagementApiBroker,
    options::BrokerOptions,
};

/// Backlog depth of one queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStat {
    pub name: String,
    pub depth: u64,
}

impl QueueStat {
    pub fn new(name: impl Into<String>, depth: u64) -> Self {
        Self {
            name: name.into(),
            depth,
        }
    }
}

/// Supported broker backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrokerKind {
    /// RabbitMQ, measured through its HTTP management API
    ManagementApi,
    /// Redis, measured by list lengths over priority-sharded keys
    Keyspace,
}

impl BrokerKind {
    /// Select the backend for a URL scheme
    pub fn from_scheme(scheme: &str) -> BrokerResult<Self> {
        match scheme {
            "amqp" => Ok(BrokerKind::ManagementApi),
            "redis" => Ok(BrokerKind::Keyspace),
            other => Err(BrokerError::UnsupportedScheme {
                scheme: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BrokerKind::ManagementApi => "amqp",
            BrokerKind::Keyspace => "redis",
        }
    }
}

impl fmt::Display for BrokerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can report the current depth of named queues
///
/// Every call re-queries the backend; implementations keep no results
/// between calls.
#[async_trait]
pub trait QueueDepthSource: Send + Sync {
    /// Resolve queue names into their current backlog depth
    ///
    /// Whether unknown names are reported is backend specific: the management
    /// API omits queues it does not list, the keyspace backend reports them
    /// with depth 0.
    ///
    /// # Errors
    ///
    /// Returns `BrokerError::Transport` or `BrokerError::MalformedResponse`
    /// when the backend cannot be queried.
    async fn queues(&self, names: &[String]) -> BrokerResult<Vec<QueueStat>>;

    /// Backend this source talks to
    fn kind(&self) -> BrokerKind;
}

/// Broker client selected from a connection URL
#[derive(Debug)]
pub enum Broker {
    ManagementApi(ManagementApiBroker),
    Keyspace(KeyspaceBroker),
}

impl Broker {
    /// Build the broker client for `url`
    ///
    /// The scheme picks the backend. Keyspace brokers open their connection
    /// here, so an unreachable store fails construction.
    ///
    /// # Errors
    ///
    /// - `UnsupportedScheme` for schemes other than `amqp` and `redis`
    /// - `InvalidUrl`, `InvalidNamespace`, `InvalidOptions` for bad input
    /// - `Transport` if the keyspace store cannot be reached
    pub async fn connect(url: &str, options: BrokerOptions) -> BrokerResult<Self> {
        let descriptor = ConnectionDescriptor::parse(url)?;

        match BrokerKind::from_scheme(descriptor.scheme())? {
            BrokerKind::ManagementApi => Ok(Broker::ManagementApi(ManagementApiBroker::new(
                &descriptor,
                &options,
            )?)),
            BrokerKind::Keyspace => Ok(Broker::Keyspace(
                KeyspaceBroker::connect(&descriptor, &options).await?,
            )),
        }
    }
}

#[async_trait]
impl QueueDepthSource for Broker {
    async fn queues(&self, names: &[String]) -> BrokerResult<Vec<QueueStat>> {
        match self {
            Broker::ManagementApi(broker) => broker.queues(names).await,
            Broker::Keyspace(broker) => broker.queues(names).await,
        }
    }

    fn kind(&self) -> BrokerKind {
        match self {
            Broker::ManagementApi(_) => BrokerKind::ManagementApi,
            Broker::Keyspace(_) => BrokerKind::Keyspace,
        }
    }
}
