//! Integration tests for the Redis keyspace backend
//!
//! The in-memory list store stands in for Redis, so these run without a server.

use std::sync::Arc;

use proptest::prelude::*;
use qdepth_broker::{
    BrokerError, BrokerOptions, ConnectionDescriptor, InMemoryListStore, KeyspaceBroker,
    KeyspaceConfig, QueueDepthSource, QueueStat, priority_queue_key,
};

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn config(url: &str, options: &BrokerOptions) -> KeyspaceConfig {
    let descriptor = ConnectionDescriptor::parse(url).unwrap();
    KeyspaceConfig::resolve(&descriptor, options).unwrap()
}

#[tokio::test]
async fn test_custom_priority_steps_end_to_end() {
    let options = BrokerOptions::from_json(r#"{"priority_steps": [0, 5]}"#).unwrap();
    let config = config("redis://h:6379/2", &options);
    assert_eq!(config.database, 2);

    let store = InMemoryListStore::new()
        .with_list("jobs", 4)
        .with_list("jobs\x06\x165", 1);
    let broker = KeyspaceBroker::with_store(config, store);

    let stats = broker.queues(&names(&["jobs"])).await.unwrap();
    assert_eq!(stats, vec![QueueStat::new("jobs", 5)]);
}

#[tokio::test]
async fn test_default_steps_sum_all_shards() {
    let store = InMemoryListStore::new()
        .with_list("celery", 2)
        .with_list(priority_queue_key("celery", 6), 1);
    let broker = KeyspaceBroker::with_store(
        config("redis://localhost:6379/0", &BrokerOptions::default()),
        store,
    );

    let stats = broker.queues(&names(&["celery"])).await.unwrap();
    assert_eq!(stats, vec![QueueStat::new("celery", 3)]);
}

#[tokio::test]
async fn test_queue_without_lists_reports_zero() {
    let broker = KeyspaceBroker::with_store(
        config("redis://localhost/", &BrokerOptions::default()),
        InMemoryListStore::new(),
    );

    let stats = broker.queues(&names(&["never-used"])).await.unwrap();
    assert_eq!(stats, vec![QueueStat::new("never-used", 0)]);
}

#[tokio::test]
async fn test_results_follow_request_order() {
    let store = InMemoryListStore::new()
        .with_list("alpha", 1)
        .with_list("beta", 10)
        .with_list(priority_queue_key("beta", 9), 5);
    let broker = KeyspaceBroker::with_store(
        config("redis://localhost/0", &BrokerOptions::default()),
        store,
    );

    let stats = broker
        .queues(&names(&["beta", "gamma", "alpha"]))
        .await
        .unwrap();
    assert_eq!(
        stats,
        vec![
            QueueStat::new("beta", 15),
            QueueStat::new("gamma", 0),
            QueueStat::new("alpha", 1),
        ]
    );
}

#[tokio::test]
async fn test_unconfigured_level_is_not_counted() {
    let options = BrokerOptions::new().with_priority_steps(vec![0, 5]);
    let store = InMemoryListStore::new()
        .with_list("jobs", 2)
        .with_list(priority_queue_key("jobs", 3), 100);
    let broker = KeyspaceBroker::with_store(config("redis://localhost/0", &options), store);

    let stats = broker.queues(&names(&["jobs"])).await.unwrap();
    assert_eq!(stats, vec![QueueStat::new("jobs", 2)]);
}

#[tokio::test]
async fn test_empty_request_skips_store() {
    let store = Arc::new(InMemoryListStore::new().with_list("celery", 3));
    let broker = KeyspaceBroker::with_store(
        config("redis://localhost/0", &BrokerOptions::default()),
        Arc::clone(&store),
    );

    let stats = broker.queues(&[]).await.unwrap();
    assert!(stats.is_empty());
    assert_eq!(store.lookups(), 0);
}

#[tokio::test]
async fn test_every_poll_reads_current_lengths() {
    let store = Arc::new(InMemoryListStore::new().with_list("celery", 3));
    let broker = KeyspaceBroker::with_store(
        config("redis://localhost/0", &BrokerOptions::default()),
        Arc::clone(&store),
    );
    let queues = names(&["celery"]);

    assert_eq!(
        broker.queues(&queues).await.unwrap(),
        vec![QueueStat::new("celery", 3)]
    );

    store.set_length("celery", 0);
    store.set_length(priority_queue_key("celery", 9), 4);

    assert_eq!(
        broker.queues(&queues).await.unwrap(),
        vec![QueueStat::new("celery", 4)]
    );
    assert_eq!(store.lookups(), 2);
}

#[tokio::test]
async fn test_one_store_call_per_poll() {
    let store = Arc::new(InMemoryListStore::new());
    let broker = KeyspaceBroker::with_store(
        config("redis://localhost/0", &BrokerOptions::default()),
        Arc::clone(&store),
    );

    broker
        .queues(&names(&["a", "b", "c", "d"]))
        .await
        .unwrap();
    assert_eq!(store.lookups(), 1);
}

#[test]
fn test_invalid_namespace_rejected() {
    let descriptor = ConnectionDescriptor::parse("redis://localhost/queues").unwrap();
    let result = KeyspaceConfig::resolve(&descriptor, &BrokerOptions::default());

    assert!(matches!(
        result,
        Err(BrokerError::InvalidNamespace { ref namespace }) if namespace == "queues"
    ));
}

#[test]
fn test_escaped_slash_is_not_a_database_index() {
    let descriptor = ConnectionDescriptor::parse("redis://localhost/%2F3").unwrap();
    let result = KeyspaceConfig::resolve(&descriptor, &BrokerOptions::default());

    assert!(matches!(
        result,
        Err(BrokerError::InvalidNamespace { ref namespace }) if namespace == "%2F3"
    ));
}

proptest! {
    #[test]
    fn prop_depth_is_sum_of_shards(
        base in 0u64..10_000,
        p3 in 0u64..10_000,
        p6 in 0u64..10_000,
        p9 in 0u64..10_000,
    ) {
        let store = InMemoryListStore::new()
            .with_list("celery", base)
            .with_list(priority_queue_key("celery", 3), p3)
            .with_list(priority_queue_key("celery", 6), p6)
            .with_list(priority_queue_key("celery", 9), p9);
        let broker = KeyspaceBroker::with_store(
            config("redis://localhost/0", &BrokerOptions::default()),
            store,
        );

        let stats = tokio_test::block_on(broker.queues(&names(&["celery"]))).unwrap();

        prop_assert_eq!(stats.len(), 1);
        prop_assert_eq!(stats[0].depth, base + p3 + p6 + p9);
    }

    #[test]
    fn prop_one_stat_per_requested_name(count in 0usize..20) {
        let requested: Vec<String> = (0..count).map(|i| format!("queue-{}", i)).collect();
        let broker = KeyspaceBroker::with_store(
            config("redis://localhost/0", &BrokerOptions::default()),
            InMemoryListStore::new(),
        );

        let stats = tokio_test::block_on(broker.queues(&requested)).unwrap();

        prop_assert_eq!(stats.len(), count);
        for (stat, name) in stats.iter().zip(&requested) {
            prop_assert_eq!(&stat.name, name);
            prop_assert_eq!(stat.depth, 0);
        }
    }
}
