//! A single sphere dropped onto the floor.
//!
//! Minimal engine usage: one plane, one sphere, fixed-step loop.
//! Prints the apex height of each bounce so the restitution decay is
//! visible (with e = 0.9 every apex returns to 81% of the previous one).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bounce_core::{Stepper, World};
use bounce_types::SimulationConfig;
use nalgebra::{Point3, Vector3};

fn main() {
    tracing_subscriber::fmt().init();

    let config = SimulationConfig::with_timestep(1.0 / 120.0).restitution(0.9);
    let mut world = World::new(config);
    world.add_plane(Vector3::y(), 0.0).unwrap();
    let ball = world
        .add_sphere(Point3::new(0.0, 5.0, 0.0), 1.0, 1.0)
        .unwrap();

    let mut stepper = Stepper::new();

    let mut previous_height = world.body(ball).unwrap().position().y;
    let mut rising = false;

    for _ in 0..(15.0 * world.config().frequency()) as u64 {
        stepper.step(&mut world).expect("simulation diverged");

        let height = world.body(ball).unwrap().position().y;
        if rising && height < previous_height {
            println!("apex at t = {:6.3} s: y = {:.4}", world.time(), previous_height);
        }
        rising = height > previous_height;
        previous_height = height;
    }
}
