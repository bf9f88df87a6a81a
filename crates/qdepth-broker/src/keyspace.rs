//! Redis keyspace backend
//!
//! Celery stores a queue as a Redis list, but a queue with priorities is
//! sharded over several lists: the lowest level keeps the bare queue name and
//! every other level appends [`PRIORITY_SEP`] and the level number. The depth
//! of a logical queue is the sum of its shard lengths.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use crate::{
    broker::{BrokerKind, QueueDepthSource, QueueStat},
    descriptor::ConnectionDescriptor,
    error::{BrokerError, BrokerResult},
    options::BrokerOptions,
    store::{ListLengthStore, RedisListStore},
};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 6379;
/// Separator between a queue name and its priority level
pub const PRIORITY_SEP: &str = "\x06\x16";
pub const DEFAULT_PRIORITY_STEPS: [u32; 4] = [0, 3, 6, 9];

/// Physical key holding priority `level` of `queue`
///
/// Level 0 shares the bare queue name.
pub fn priority_queue_key(queue: &str, level: u32) -> String {
    if level == 0 {
        queue.to_string()
    } else {
        format!("{}{}{}", queue, PRIORITY_SEP, level)
    }
}

/// Resolve a keyspace namespace into a database index
///
/// Empty and `/` select database 0; one leading slash is ignored.
pub fn database_index(namespace: &str) -> BrokerResult<u32> {
    if namespace.is_empty() || namespace == "/" {
        return Ok(0);
    }
    let index = namespace.strip_prefix('/').unwrap_or(namespace);
    index
        .parse::<u32>()
        .map_err(|_| BrokerError::InvalidNamespace {
            namespace: namespace.to_string(),
        })
}

/// Priority levels queues are sharded across
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrioritySteps(Vec<u32>);

impl PrioritySteps {
    /// Build from configured levels; duplicates are dropped, order is kept
    pub fn new(levels: Vec<u32>) -> BrokerResult<Self> {
        if levels.is_empty() {
            return Err(BrokerError::InvalidOptions(
                "priority_steps cannot be empty".to_string(),
            ));
        }

        let mut unique = Vec::with_capacity(levels.len());
        for level in levels {
            if !unique.contains(&level) {
                unique.push(level);
            }
        }
        Ok(Self(unique))
    }

    pub fn levels(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Key for one configured level of `queue`
    pub fn key_for(&self, queue: &str, level: u32) -> BrokerResult<String> {
        if !self.0.contains(&level) {
            return Err(BrokerError::InvalidPriorityLevel { level });
        }
        Ok(priority_queue_key(queue, level))
    }

    /// Keys for every configured level of `queue`, in level order
    pub fn keys_for(&self, queue: &str) -> BrokerResult<Vec<String>> {
        self.0
            .iter()
            .map(|&level| self.key_for(queue, level))
            .collect()
    }
}

impl Default for PrioritySteps {
    fn default() -> Self {
        Self(DEFAULT_PRIORITY_STEPS.to_vec())
    }
}

/// Resolved keyspace settings with defaults applied
#[derive(Clone, PartialEq, Eq)]
pub struct KeyspaceConfig {
    pub host: String,
    pub port: u16,
    pub database: u32,
    pub password: Option<String>,
    pub priority_steps: PrioritySteps,
}

impl KeyspaceConfig {
    /// Apply keyspace defaults to a parsed connection URL
    pub fn resolve(descriptor: &ConnectionDescriptor, options: &BrokerOptions) -> BrokerResult<Self> {
        let priority_steps = match &options.priority_steps {
            Some(levels) => PrioritySteps::new(levels.clone())?,
            None => PrioritySteps::default(),
        };

        Ok(Self {
            host: descriptor.host().unwrap_or(DEFAULT_HOST).to_string(),
            port: descriptor.port().unwrap_or(DEFAULT_PORT),
            database: database_index(descriptor.namespace())?,
            password: descriptor
                .password()
                .filter(|password| !password.is_empty())
                .map(str::to_string),
            priority_steps,
        })
    }

    /// Redis URL the connection pool is opened with
    pub fn connection_url(&self) -> BrokerResult<Url> {
        let mut url = Url::parse(&format!(
            "redis://{}:{}/{}",
            self.host, self.port, self.database
        ))?;
        if let Some(password) = &self.password {
            url.set_password(Some(password)).map_err(|_| {
                BrokerError::InvalidUrl(format!("cannot set password on {}", self.host))
            })?;
        }
        Ok(url)
    }
}

impl fmt::Debug for KeyspaceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyspaceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("priority_steps", &self.priority_steps)
            .finish()
    }
}

/// Redis broker client
pub struct KeyspaceBroker {
    config: KeyspaceConfig,
    store: Arc<dyn ListLengthStore>,
}

impl KeyspaceBroker {
    /// Resolve the config and open the Redis connection pool
    pub async fn connect(
        descriptor: &ConnectionDescriptor,
        options: &BrokerOptions,
    ) -> BrokerResult<Self> {
        let config = KeyspaceConfig::resolve(descriptor, options)?;
        let store = RedisListStore::connect(&config.connection_url()?).await?;

        info!(
            host = %config.host,
            port = config.port,
            database = config.database,
            "Connected to Redis broker"
        );

        Ok(Self::with_store(config, store))
    }

    /// Use an already constructed store
    pub fn with_store(config: KeyspaceConfig, store: impl ListLengthStore + 'static) -> Self {
        Self {
            config,
            store: Arc::new(store),
        }
    }

    pub fn config(&self) -> &KeyspaceConfig {
        &self.config
    }
}

impl fmt::Debug for KeyspaceBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyspaceBroker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl QueueDepthSource for KeyspaceBroker {
    async fn queues(&self, names: &[String]) -> BrokerResult<Vec<QueueStat>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let steps = &self.config.priority_steps;
        let mut keys = Vec::with_capacity(names.len() * steps.len());
        for name in names {
            keys.extend(steps.keys_for(name)?);
        }

        let lengths = self.store.list_lengths(&keys).await?;
        if lengths.len() != keys.len() {
            return Err(BrokerError::transport(
                BrokerKind::Keyspace,
                format!(
                    "expected {} list lengths, store returned {}",
                    keys.len(),
                    lengths.len()
                ),
            ));
        }

        let stats: Vec<QueueStat> = names
            .iter()
            .zip(lengths.chunks(steps.len()))
            .map(|(name, shards)| QueueStat::new(name.clone(), shards.iter().sum()))
            .collect();

        debug!(
            queues = names.len(),
            keys = keys.len(),
            database = self.config.database,
            "Polled Redis broker"
        );
        Ok(stats)
    }

    fn kind(&self) -> BrokerKind {
        BrokerKind::Keyspace
    }
}
