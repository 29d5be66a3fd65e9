//! # Cull Benchmark
//!
//! REQUIREMENTS:
//! - Culling 10,000 objects with warm geometry well under a frame
//! - Insert throughput high enough to load a region in one tick
//!
//! Run with: `cargo bench --package meridian_spatial`

// Benchmarks don't need docs
#![allow(missing_docs)]
#![allow(dead_code)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use meridian_shared::{Aabb, Vec3};
use meridian_spatial::{
    Camera, CameraSlot, Face, ObjectId, PartitionType, SceneObject, ScriptedOcclusion,
    SpatialConfig, SpatialPartition, TextureId,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn scene(count: u32) -> Vec<SceneObject> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    (0..count)
        .map(|id| {
            let center = Vec3::new(
                rng.gen_range(0.0..512.0),
                rng.gen_range(0.0..64.0),
                rng.gen_range(0.0..512.0),
            );
            SceneObject::new(ObjectId(id), Aabb::from_center_half_extents(center, Vec3::splat(1.0)))
                .with_face(Face::new(Some(TextureId(id % 16)), 24, 36))
        })
        .collect()
}

fn filled_partition(count: u32) -> SpatialPartition {
    let mut partition = SpatialPartition::new(PartitionType::Volume, &SpatialConfig::default());
    for object in scene(count) {
        partition.put(object).expect("insert");
    }
    partition
}

/// Benchmark: bulk insert.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for count in [1_000_u32, 10_000] {
        let objects = scene(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let mut partition = SpatialPartition::new(PartitionType::Volume, &SpatialConfig::default());
                for object in objects.iter().cloned() {
                    partition.put(object).expect("insert");
                }
                black_box(partition.group_count())
            });
        });
    }

    group.finish();
}

/// Benchmark: steady-state cull, geometry already built.
fn bench_cull(c: &mut Criterion) {
    let mut group = c.benchmark_group("cull");
    let camera = Camera::from_box(
        CameraSlot::World,
        &Aabb::new(Vec3::ZERO, Vec3::new(256.0, 64.0, 256.0)),
    );

    for count in [1_000_u32, 10_000] {
        let mut partition = filled_partition(count);
        let mut backend = ScriptedOcclusion::new(usize::MAX);
        partition.cull(&camera, &mut backend);

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                backend.end_frame();
                black_box(partition.cull(&camera, &mut backend).stats.visible)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_cull);
criterion_main!(benches);
