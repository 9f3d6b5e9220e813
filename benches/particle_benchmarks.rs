//! 粒子系统与矩阵合成性能基准测试
//!
//! 测试粒子积分、模型矩阵合成与帧计划校验的开销

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use particle_viewer::render::{FramePlan, ParticleSystem};
use particle_viewer::scene::{CameraParameters, CameraRig, TransformComposer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hint::black_box;

fn bench_particle_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("particle_step");

    for count in [1_000usize, 10_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let mut rng = StdRng::seed_from_u64(0);
            let mut system = ParticleSystem::initialize(count, 1.0, 10.0..=100.0, &mut rng);
            let gravity = Vec3::new(0.0, -9.81, 0.0);

            b.iter(|| {
                system.step(black_box(0.016), gravity);
                black_box(system.as_bytes().len());
            });
        });
    }

    group.finish();
}

fn bench_matrices(c: &mut Criterion) {
    let rig = CameraRig::new(CameraParameters {
        radius: 200.0,
        phi: 1.2,
        theta: 0.4,
    });

    c.bench_function("compose_model_matrix", |b| {
        b.iter(|| {
            TransformComposer::compose(
                black_box(Vec3::new(0.1, 0.2, 0.3)),
                black_box(Vec3::new(0.5, 1.0, 1.5)),
                black_box(Vec3::splat(0.1)),
            )
        });
    });

    c.bench_function("camera_view_projection", |b| {
        b.iter(|| {
            let view = rig.compute_view();
            let projection = rig.compute_projection(black_box((1920, 1080)));
            projection * view
        });
    });
}

fn bench_frame_plan(c: &mut Criterion) {
    c.bench_function("frame_plan_build", |b| {
        b.iter(|| {
            let reference = FramePlan::offscreen(1024, 1024);
            FramePlan::build(black_box(reference.passes().to_vec()))
        });
    });
}

criterion_group!(benches, bench_particle_step, bench_matrices, bench_frame_plan);
criterion_main!(benches);
