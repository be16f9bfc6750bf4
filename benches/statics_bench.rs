use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use capstan::*;
use std::hint::black_box;

/// Spreader on `legs` slings from one hook, yaw fixed.
fn prepare_lift(legs: usize) -> Scene {
    let mut scene = Scene::new();
    let hook = scene
        .new_point("hook", None, DVec3::new(0.0, 0.0, 8.0))
        .unwrap();
    let mut body = RigidBody::new(100.0);
    body.frame.fixed = FixedMask([false, false, false, false, false, true]);
    let body = scene.add_rigidbody("spreader", body).unwrap();
    for i in 0..legs {
        let angle = i as f64 / legs as f64 * std::f64::consts::TAU;
        let corner = scene
            .new_point(
                &format!("corner{i}"),
                Some(body),
                DVec3::new(2.0 * angle.cos(), 2.0 * angle.sin(), 0.0),
            )
            .unwrap();
        scene
            .add_cable(&format!("sling{i}"), Cable::new(&[hook, corner], 8.2, 1.0e5))
            .unwrap();
    }
    scene
}

/// Body hung from a grommet over two sheaves with sheave friction.
fn prepare_grommet() -> Scene {
    let mut scene = Scene::new();
    let hook = scene
        .new_point("hook", None, DVec3::new(0.0, 0.0, 10.0))
        .unwrap();
    let top = scene.new_circle("top", hook, DVec3::Y, 0.5).unwrap();
    let mut body = RigidBody::new(32.0);
    body.frame.fixed = FixedMask::HEAVE_ONLY;
    let body = scene.add_rigidbody("body", body).unwrap();
    let trunnion = scene.new_point("trunnion", Some(body), DVec3::ZERO).unwrap();
    let bottom = scene.new_circle("bottom", trunnion, DVec3::Y, 0.5).unwrap();
    scene
        .add_cable(
            "grommet",
            Cable::new(&[top, bottom, top], 23.0, 1.0e6)
                .with_friction(&[Some(0.1), None, Some(0.1)])
                .with_friction_model(FrictionModel::Sheave),
        )
        .unwrap();
    scene
}

fn bench_residual(c: &mut Criterion) {
    let mut group = c.benchmark_group("residual");
    for &legs in &[4usize, 16, 64] {
        let scene = prepare_lift(legs);
        group.bench_with_input(BenchmarkId::new("lift", legs), &scene, |b, scene| {
            b.iter(|| black_box(scene.residual().unwrap()))
        });
    }
    group.finish();
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_statics");
    for &legs in &[4usize, 16] {
        group.bench_with_input(BenchmarkId::new("lift", legs), &legs, |b, &legs| {
            b.iter(|| {
                let mut scene = prepare_lift(legs);
                black_box(scene.solve_statics().unwrap())
            })
        });
    }
    group.bench_function("grommet", |b| {
        b.iter(|| {
            let mut scene = prepare_grommet();
            black_box(scene.solve_statics().unwrap())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_residual, bench_solve);
criterion_main!(benches);
