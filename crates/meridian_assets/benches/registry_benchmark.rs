//! # Request Registry Benchmark
//!
//! REQUIREMENTS:
//! - Timeout sweep over 1,000 pending requests well under a frame
//! - Lookup cost stays linear and small for realistic list sizes
//!
//! Run with: `cargo bench --package meridian_assets`

// Benchmarks don't need docs
#![allow(missing_docs)]
#![allow(dead_code)]

use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use meridian_assets::{AssetRequest, RequestKind, RequestRegistry};
use meridian_shared::{AssetId, AssetType};

fn filled_registry(count: usize, now: Instant) -> RequestRegistry {
    let mut registry = RequestRegistry::new();
    for i in 0..count {
        let request = AssetRequest::download(
            AssetId::from_u128(i as u128 + 1),
            AssetType::Texture,
            now,
            Duration::from_secs(300),
            Box::new(|_| {}),
        );
        registry.enqueue(RequestKind::Download, request, true);
    }
    registry
}

/// Benchmark: find_request at the tail of the list (worst case).
fn bench_find_request(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_request");
    let now = Instant::now();

    for count in [16, 128, 1_000] {
        let registry = filled_registry(count, now);
        let last = AssetId::from_u128(count as u128);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(registry.find_request(RequestKind::Download, AssetType::Texture, last).is_some()));
        });
    }

    group.finish();
}

/// Benchmark: timeout sweep where nothing has expired.
fn bench_timeout_sweep(c: &mut Criterion) {
    let now = Instant::now();
    let mut registry = filled_registry(1_000, now);

    c.bench_function("take_timed_out_1000_none_expired", |b| {
        b.iter(|| black_box(registry.take_timed_out(now + Duration::from_secs(1)).len()));
    });
}

criterion_group!(benches, bench_find_request, bench_timeout_sweep);
criterion_main!(benches);
