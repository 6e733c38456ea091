//! Sixteen spheres bouncing inside an open-topped box.
//!
//! The canonical demonstration: a 2x2x2 box made of five planes (floor
//! plus four walls), sixteen small spheres dropped in under gravity with
//! e = 0.9. Headless; the render callback stands in for a frame
//! presentation and the driver prints a state summary per frame.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bounce_core::{Stepper, World};
use bounce_types::SimulationConfig;
use nalgebra::{Point3, Vector3};
use std::cell::Cell;
use std::rc::Rc;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = SimulationConfig::with_timestep(1.0 / 120.0).restitution(0.9);
    let mut world = World::new(config);

    // Open-topped box: floor plus four walls, normals pointing inward
    world.add_plane(Vector3::y(), 0.0).unwrap();
    world.add_plane(Vector3::x(), -1.0).unwrap();
    world.add_plane(-Vector3::x(), -1.0).unwrap();
    world.add_plane(Vector3::z(), -1.0).unwrap();
    world.add_plane(-Vector3::z(), -1.0).unwrap();

    // Sixteen spheres on a staggered grid at two heights
    let lanes = [-0.6, -0.2, 0.2, 0.6];
    let mut spheres = Vec::new();
    for (i, &x) in lanes.iter().enumerate() {
        for (j, &z) in lanes.iter().enumerate() {
            let jitter = 0.01 * ((i * 4 + j) % 3) as f64;
            let y = if (i + j) % 2 == 0 { 0.8 } else { 1.4 };
            let id = world
                .add_sphere(Point3::new(x + jitter, y, z - jitter), 0.1, 1000.0)
                .unwrap();
            spheres.push(id);
        }
    }

    // Stand-in for a frame presentation
    let frames = Rc::new(Cell::new(0u32));
    let frames_in_callback = Rc::clone(&frames);
    let mut stepper = Stepper::new();
    stepper.set_render_callback(Box::new(move || {
        frames_in_callback.set(frames_in_callback.get() + 1);
    }));

    // Ten simulated seconds, one "frame" per second
    for frame in 1..=10u32 {
        let ticks = stepper
            .step_to(&mut world, f64::from(frame))
            .expect("simulation diverged");

        let max_height = spheres
            .iter()
            .map(|&id| world.body(id).unwrap().position().y)
            .fold(f64::NEG_INFINITY, f64::max);
        tracing::info!(
            time = world.time(),
            ticks,
            kinetic_energy = world.total_kinetic_energy(),
            max_height,
            "frame rendered"
        );
    }

    println!(
        "\n{} frames rendered, final sphere centers after {:.1} s:",
        frames.get(),
        world.time()
    );
    for &id in &spheres {
        let p = world.body(id).unwrap().position();
        println!("  {id}: ({:+.3}, {:+.3}, {:+.3})", p.x, p.y, p.z);
    }
}
