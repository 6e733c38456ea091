//! Benchmarks for contact detection and full simulation steps.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bounce_core::{Stepper, World};
use bounce_types::SimulationConfig;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::{Point3, Vector3};

/// An open-topped box with `count` spheres stacked in layers.
fn sphere_pile(count: usize) -> World {
    let config = SimulationConfig::with_timestep(1.0 / 120.0).restitution(0.9);
    let mut world = World::new(config);

    world.add_plane(Vector3::y(), 0.0).unwrap();
    world.add_plane(Vector3::x(), -1.0).unwrap();
    world.add_plane(-Vector3::x(), -1.0).unwrap();
    world.add_plane(Vector3::z(), -1.0).unwrap();
    world.add_plane(-Vector3::z(), -1.0).unwrap();

    for k in 0..count {
        let lane = (k % 4) as f64;
        let row = ((k / 4) % 4) as f64;
        let layer = (k / 16) as f64;
        world
            .add_sphere(
                Point3::new(-0.6 + 0.4 * lane, 0.3 + 0.25 * layer, -0.6 + 0.4 * row),
                0.1,
                1000.0,
            )
            .unwrap();
    }

    world
}

fn bench_detect_contacts(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_contacts");

    for &count in &[16, 64] {
        let mut world = sphere_pile(count);
        // Settle into a contact-rich configuration
        let mut stepper = Stepper::new();
        stepper.run_for(&mut world, 1.0).unwrap();

        group.bench_function(format!("{count}_spheres"), |b| {
            b.iter(|| black_box(world.detect_contacts()));
        });
    }

    group.finish();
}

fn bench_full_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");

    for &count in &[16, 64] {
        group.bench_function(format!("{count}_spheres"), |b| {
            let mut world = sphere_pile(count);
            let mut stepper = Stepper::new();
            b.iter(|| {
                stepper.step(&mut world).unwrap();
                black_box(world.time())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_detect_contacts, bench_full_step);
criterion_main!(benches);
