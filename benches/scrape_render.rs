//! Scrape Path Benchmarks
//!
//! Measures the keyspace poll over an in-memory store and gauge rendering,
//! without network I/O.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use qdepth::QueueLengthMetrics;
use qdepth::broker::{
    BrokerOptions, ConnectionDescriptor, InMemoryListStore, KeyspaceBroker, KeyspaceConfig,
    QueueDepthSource, QueueStat, priority_queue_key,
};
use std::hint::black_box;
use std::time::Duration;

fn queue_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("queue_{}", i)).collect()
}

/// Benchmark rendering of the queue-length gauge
fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.measurement_time(Duration::from_secs(5));
    let metrics = QueueLengthMetrics::default();

    for count in [1usize, 10, 100] {
        let stats: Vec<QueueStat> = queue_names(count)
            .into_iter()
            .enumerate()
            .map(|(i, name)| QueueStat::new(name, i as u64))
            .collect();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("queues", count), &stats, |b, stats| {
            b.iter(|| black_box(metrics.render(black_box(stats))))
        });
    }

    group.finish();
}

/// Benchmark a keyspace poll across all default priority shards
fn bench_keyspace_poll(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyspace_poll");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    for count in [1usize, 10, 100] {
        let names = queue_names(count);
        let store = InMemoryListStore::new();
        for name in &names {
            store.set_length(name.clone(), 5);
            store.set_length(priority_queue_key(name, 9), 1);
        }

        let descriptor = ConnectionDescriptor::parse("redis://localhost:6379/0").unwrap();
        let config = KeyspaceConfig::resolve(&descriptor, &BrokerOptions::default()).unwrap();
        let broker = KeyspaceBroker::with_store(config, store);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("queues", count), &names, |b, names| {
            b.to_async(&runtime)
                .iter(|| async { black_box(broker.queues(names).await) })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render, bench_keyspace_poll);
criterion_main!(benches);
