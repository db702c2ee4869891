//! Completion registry benchmark suite.
//!
//! Benchmarks the hot paths of the registry:
//! - Slot allocation and completion
//! - Snapshot queries on completed slots
//! - Resolved-future construction on the shared registry
//! - Cached invalid-state lookups
//!
//! Run:
//!   cargo bench --bench registry_benchmark

#![allow(missing_docs)]
#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use settle::{Code, CompletionRegistry, RegistryConfig, invalid_future, successful_future};

// =============================================================================
// ALLOCATION + COMPLETION
// =============================================================================

fn bench_allocate_complete(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry/allocate_complete");

    for &batch in &[1_usize, 64, 1_024] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::new("success", batch), &batch, |b, &batch| {
            b.iter_batched(
                || CompletionRegistry::new(RegistryConfig::default().initial_capacity(batch)),
                |registry| {
                    for i in 0..batch {
                        let handle = registry.allocate::<usize>();
                        registry.complete_success(handle, i);
                    }
                    black_box(registry)
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_with_input(BenchmarkId::new("failure", batch), &batch, |b, &batch| {
            b.iter_batched(
                || CompletionRegistry::new(RegistryConfig::default().initial_capacity(batch)),
                |registry| {
                    for _ in 0..batch {
                        let handle = registry.allocate::<usize>();
                        registry.complete_failure(handle, Code::Unavailable, "offline");
                    }
                    black_box(registry)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

// =============================================================================
// QUERIES
// =============================================================================

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry/query");
    let registry = CompletionRegistry::default();
    let done = registry.allocate::<String>();
    registry.complete_success(done, "value".to_string());
    let pending = registry.allocate::<String>();

    group.bench_function("completed", |b| b.iter(|| black_box(registry.query(black_box(done)))));
    group.bench_function("pending", |b| {
        b.iter(|| black_box(registry.query(black_box(pending))))
    });

    let future = registry.future(done);
    group.bench_function("future_result", |b| b.iter(|| black_box(future.result())));

    group.finish();
}

// =============================================================================
// RESOLVED FUTURES
// =============================================================================

fn bench_resolved(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolved");

    group.bench_function("successful_future", |b| {
        b.iter(|| black_box(successful_future(black_box(42_u64))))
    });
    group.bench_function("invalid_future", |b| b.iter(|| black_box(invalid_future::<u64>())));

    group.finish();
}

criterion_group!(benches, bench_allocate_complete, bench_query, bench_resolved);
criterion_main!(benches);
