//! List-length lookups against the key-value store
//!
//! [`ListLengthStore`] is the seam between the keyspace backend and Redis. The
//! backend only ever asks "how long are these lists", so the trait has one
//! method and the in-memory implementation can stand in for Redis in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;
use url::Url;

use crate::{
    broker::BrokerKind,
    error::{BrokerError, BrokerResult},
};

/// Store that can report the length of lists by key
#[async_trait]
pub trait ListLengthStore: Send + Sync {
    /// Length of each list in `keys`, in the same order
    ///
    /// Missing keys have length 0.
    async fn list_lengths(&self, keys: &[String]) -> BrokerResult<Vec<u64>>;
}

#[async_trait]
impl<T: ListLengthStore + ?Sized> ListLengthStore for Arc<T> {
    async fn list_lengths(&self, keys: &[String]) -> BrokerResult<Vec<u64>> {
        (**self).list_lengths(keys).await
    }
}

/// Redis-backed store using a connection pool
pub struct RedisListStore {
    pool: deadpool_redis::Pool,
}

impl RedisListStore {
    /// Create the pool and verify the server answers `PING`
    pub async fn connect(url: &Url) -> BrokerResult<Self> {
        let pool = deadpool_redis::Config::from_url(url.as_str())
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| {
                BrokerError::transport(
                    BrokerKind::Keyspace,
                    format!("Failed to create connection pool: {}", e),
                )
            })?;

        let store = Self { pool };
        let mut conn = store.get_connection().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut *conn)
            .await
            .map_err(|e| BrokerError::transport(BrokerKind::Keyspace, format!("PING failed: {}", e)))?;

        Ok(store)
    }

    async fn get_connection(&self) -> BrokerResult<deadpool_redis::Connection> {
        self.pool.get().await.map_err(|e| {
            BrokerError::transport(
                BrokerKind::Keyspace,
                format!("Failed to get connection from pool: {}", e),
            )
        })
    }
}

#[async_trait]
impl ListLengthStore for RedisListStore {
    async fn list_lengths(&self, keys: &[String]) -> BrokerResult<Vec<u64>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.get_connection().await?;

        // One round trip for every shard of every queue
        let mut pipe = redis::pipe();
        for key in keys {
            pipe.llen(key);
        }
        let lengths: Vec<u64> = pipe.query_async(&mut *conn).await?;

        debug!(keys = keys.len(), "Fetched list lengths");
        Ok(lengths)
    }
}

/// In-memory store holding list lengths by key
#[derive(Debug, Default)]
pub struct InMemoryListStore {
    lengths: RwLock<HashMap<String, u64>>,
    lookups: AtomicUsize,
}

impl InMemoryListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`set_length`](Self::set_length)
    pub fn with_list(self, key: impl Into<String>, length: u64) -> Self {
        self.set_length(key, length);
        self
    }

    /// Set the length of a list; 0 removes it
    pub fn set_length(&self, key: impl Into<String>, length: u64) {
        let mut lengths = match self.lengths.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let key = key.into();
        if length == 0 {
            lengths.remove(&key);
        } else {
            lengths.insert(key, length);
        }
    }

    /// Number of `list_lengths` calls that reached the store
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListLengthStore for InMemoryListStore {
    async fn list_lengths(&self, keys: &[String]) -> BrokerResult<Vec<u64>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let lengths = self.lengths.read().map_err(|e| {
            BrokerError::transport(BrokerKind::Keyspace, format!("Lock poisoned: {}", e))
        })?;

        Ok(keys
            .iter()
            .map(|key| lengths.get(key).copied().unwrap_or(0))
            .collect())
    }
}
