//! # qdepth Broker
//!
//! Broker abstraction layer for measuring the backlog depth of task queues.
//!
//! A broker connection URL selects one of two backends:
//!
//! - **`amqp://`**: a RabbitMQ broker, measured through its HTTP management API
//! - **`redis://`**: a Redis broker, measured by summing list lengths across the
//!   priority-sharded keys Celery uses for each logical queue
//!
//! Both backends implement [`QueueDepthSource`], so calling code never branches
//! on the backend type.
//!
//! ## Example
//!
//! ```rust,no_run
//! use qdepth_broker::{Broker, BrokerOptions, QueueDepthSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let broker = Broker::connect("redis://localhost:6379/0", BrokerOptions::default()).await?;
//!
//!     let names = vec!["celery".to_string()];
//!     for stat in broker.queues(&names).await? {
//!         println!("{} {}", stat.name, stat.depth);
//!     }
//!     Ok(())
//! }
//! ```

pub mod broker;
pub mod descriptor;
pub mod error;
pub mod keyspace;
pub mod management;
pub mod options;
pub mod store;

pub use broker::{Broker, BrokerKind, QueueDepthSource, QueueStat};
pub use descriptor::ConnectionDescriptor;
pub use error::{BrokerError, BrokerResult};
pub use keyspace::{
    DEFAULT_PRIORITY_STEPS, KeyspaceBroker, KeyspaceConfig, PRIORITY_SEP, PrioritySteps,
    database_index, priority_queue_key,
};
pub use management::{ManagementApiBroker, ManagementApiConfig};
pub use options::BrokerOptions;
pub use store::{InMemoryListStore, ListLengthStore, RedisListStore};
