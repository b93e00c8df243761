//! Benchmarks for mesh generation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glam::Vec3;
use sonosphere::geometry::Icosphere;
use sonosphere::scene::{SceneGeometry, SceneKey};

fn bench_icosphere(c: &mut Criterion) {
    let mut group = c.benchmark_group("Icosphere");

    for level in [2, 4, 6, 8] {
        let sphere = Icosphere::new(Vec3::ZERO, 1.0, level).unwrap();
        group.throughput(Throughput::Elements(sphere.triangle_count() as u64));
        group.bench_with_input(BenchmarkId::new("build", level), &sphere, |b, sphere| {
            b.iter(|| black_box(sphere.build()));
        });
    }

    group.finish();
}

fn bench_scene_rebuild(c: &mut Criterion) {
    let key = SceneKey {
        tesselations: 5,
        separation: 0.1,
    };
    c.bench_function("scene_rebuild", |b| {
        b.iter(|| black_box(SceneGeometry::build(black_box(key)).unwrap()));
    });
}

criterion_group!(benches, bench_icosphere, bench_scene_rebuild);
criterion_main!(benches);
