//! Benchmarks for the in-memory ticket store and the worker pool.
//!
//! Benchmarks cover:
//! - Scheduling throughput
//! - Claiming from one and many topics
//! - Full claim/complete write-back cycle
//! - End-to-end pool throughput

use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use tokio::runtime::Runtime;

use prometheus_jobq::builders::WorkerPoolBuilder;
use prometheus_jobq::config::PoolConfig;
use prometheus_jobq::core::{
    wait, Body, Context, Request, Scheduler, TicketManager, Worker, WorkerFn,
};
use prometheus_jobq::infra::InMemoryTicketStore;
use prometheus_jobq::util::clock::now_ms;

// ============================================================================
// Test Payload
// ============================================================================

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct BenchPayload {
    id: u64,
    data: String,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn payload(id: u64) -> BenchPayload {
    BenchPayload {
        id,
        data: format!("payload-data-{id}"),
    }
}

fn topic_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("topic-{i}")).collect()
}

async fn fill(store: &InMemoryTicketStore, topics: &[String], size: u64) {
    let ctx = Context::background();
    for i in 0..size {
        let topic = topics[rand::rng().random_range(0..topics.len())].clone();
        store
            .schedule(&ctx, Request::new(topic, payload(i)))
            .await
            .unwrap();
    }
}

// ============================================================================
// Store Benchmarks
// ============================================================================

fn bench_store_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_schedule");

    for size in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.to_async(Runtime::new().unwrap()).iter(|| async move {
                let store = InMemoryTicketStore::new();
                fill(&store, &topic_names(1), size).await;
                black_box(store.len());
            });
        });
    }
    group.finish();
}

fn bench_store_pull(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_pull");

    for topic_count in [1usize, 8, 64] {
        let size = 1_000u64;
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(
            BenchmarkId::new("topics", topic_count),
            &topic_count,
            |b, &topic_count| {
                b.to_async(Runtime::new().unwrap()).iter(|| async move {
                    let topics = topic_names(topic_count);
                    let store = InMemoryTicketStore::new();
                    fill(&store, &topics, size).await;

                    let ctx = Context::background();
                    while let Ok(ticket) = store.pull(&ctx, &topics).await {
                        black_box(ticket);
                    }
                });
            },
        );
    }
    group.finish();
}

fn bench_store_claim_complete_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_claim_complete_cycle");
    let size = 1_000u64;
    group.throughput(Throughput::Elements(size));

    group.bench_function("claim_start_complete", |b| {
        b.to_async(Runtime::new().unwrap()).iter(|| async move {
            let topics = topic_names(1);
            let store = InMemoryTicketStore::new();
            fill(&store, &topics, size).await;

            let ctx = Context::background();
            while let Ok(mut ticket) = store.pull(&ctx, &topics).await {
                ticket.mark_started(now_ms());
                let mut ticket = store.update(&ctx, ticket).await.unwrap();
                ticket.mark_complete(None, now_ms());
                black_box(store.update(&ctx, ticket).await.unwrap());
            }
        });
    });
    group.finish();
}

// ============================================================================
// End-to-End Scenario
// ============================================================================

fn bench_pool_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_end_to_end");
    group.sample_size(10);

    for workers in [1usize, 4] {
        let size = 200u64;
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, &workers| {
            b.to_async(Runtime::new().unwrap()).iter(|| async move {
                let store = InMemoryTicketStore::new();
                let worker: Arc<dyn Worker> =
                    Arc::new(WorkerFn::new(|_ctx: Context, body: Body| async move {
                        let payload: BenchPayload = body.decode()?;
                        black_box(payload.id);
                        Ok::<(), anyhow::Error>(())
                    }));
                let pool = Arc::new(
                    WorkerPoolBuilder::new(store.clone())
                        .config(PoolConfig::new().with_idle_backoff_ms(1))
                        .handle_n("bench", worker, workers)
                        .build()
                        .unwrap(),
                );

                let ctx = Context::background();
                let runner = {
                    let (pool, ctx) = (Arc::clone(&pool), ctx.clone());
                    tokio::spawn(async move { pool.run(&ctx).await })
                };

                let mut jobs = Vec::with_capacity(size as usize);
                for i in 0..size {
                    let request = Request::new("bench", payload(i));
                    jobs.push(store.schedule(&ctx, request).await.unwrap());
                }
                for job in &jobs {
                    wait(&ctx, Duration::from_millis(1), job).await.unwrap();
                }

                ctx.cancel();
                runner.await.unwrap().unwrap();
            });
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark Groups
// ============================================================================

criterion_group!(
    store_benches,
    bench_store_schedule,
    bench_store_pull,
    bench_store_claim_complete_cycle
);

criterion_group!(scenario_benches, bench_pool_end_to_end);

criterion_main!(store_benches, scenario_benches);
