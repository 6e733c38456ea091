//! End-to-end simulation scenarios.
//!
//! Each test builds a small world, runs it for simulated seconds, and
//! checks the physical properties the engine guarantees: restitution
//! behavior, momentum conservation, confinement, immovability, and
//! bitwise determinism.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use approx::assert_relative_eq;
use bounce_core::{Stepper, World};
use bounce_types::{BodyId, SimulationConfig};
use nalgebra::{Point3, Vector3};

/// Density giving a radius-1 sphere a mass of exactly 1 kg.
const UNIT_MASS_DENSITY: f64 = 3.0 / (4.0 * std::f64::consts::PI);

/// Sample the center height of one body every tick for `duration`
/// seconds and return the local maxima (bounce apexes) in order.
fn track_peaks(world: &mut World, stepper: &mut Stepper, body: BodyId, duration: f64) -> Vec<f64> {
    let dt = world.timestep();
    let steps = (duration / dt).round() as usize;

    let mut heights = Vec::with_capacity(steps);
    for _ in 0..steps {
        stepper.step(world).unwrap();
        heights.push(world.body(body).unwrap().position().y);
    }

    let mut peaks = Vec::new();
    for k in 1..heights.len().saturating_sub(1) {
        if heights[k] >= heights[k - 1] && heights[k] > heights[k + 1] {
            peaks.push(heights[k]);
        }
    }
    peaks
}

// ---------------------------------------------------------------------------
// S1: vertical drop, fully elastic
// ---------------------------------------------------------------------------

#[test]
fn s1_vertical_drop_elastic_returns_to_height() {
    let config = SimulationConfig::with_timestep(1.0 / 120.0).restitution(1.0);
    let mut world = World::new(config);
    world.add_plane(Vector3::y(), 0.0).unwrap();
    let ball = world
        .add_sphere(Point3::new(0.0, 5.0, 0.0), 1.0, UNIT_MASS_DENSITY)
        .unwrap();

    let mut stepper = Stepper::new();
    let peaks = track_peaks(&mut world, &mut stepper, ball, 22.0);

    // Ten or more full bounce cycles, each returning to the release height
    assert!(peaks.len() >= 10, "expected >= 10 bounce apexes, got {}", peaks.len());
    for peak in peaks.iter().take(10) {
        assert!(
            (peak - 5.0).abs() < 0.05,
            "elastic bounce apex {peak} strayed from 5.0"
        );
    }
}

// ---------------------------------------------------------------------------
// S2: vertical drop, e = 0.5
// ---------------------------------------------------------------------------

#[test]
fn s2_vertical_drop_half_restitution_geometric_decay() {
    let config = SimulationConfig::with_timestep(1.0 / 120.0).restitution(0.5);
    let mut world = World::new(config);
    world.add_plane(Vector3::y(), 0.0).unwrap();
    let ball = world
        .add_sphere(Point3::new(0.0, 5.0, 0.0), 1.0, UNIT_MASS_DENSITY)
        .unwrap();

    // 2.6 s covers the first few clean bounces; beyond that the apex
    // heights reach the sampling noise floor
    let mut stepper = Stepper::new();
    let peaks = track_peaks(&mut world, &mut stepper, ball, 2.6);
    assert!(peaks.len() >= 3);

    // Bounce heights above the resting center (y = radius) follow h' = e²·h.
    // The drop height of the release is the zeroth term of the sequence.
    let release_height = 5.0 - 1.0;
    let first_bounce_height = peaks[0] - 1.0;
    let ratio = first_bounce_height / release_height;
    // The impulse is applied at the first sampled state inside the contact
    // zone, up to |v|·Δt past the touch point, which widens the ideal
    // e² = 0.25 by roughly 0.75·|v|·Δt / h at this timestep.
    assert!(
        (ratio - 0.25).abs() < 0.015,
        "first bounce ratio {ratio} strayed from e² = 0.25"
    );

    // And the early sequence keeps decaying
    for pair in peaks[..3].windows(2) {
        assert!(pair[1] < pair[0]);
    }
}

// ---------------------------------------------------------------------------
// S3: head-on equal spheres, elastic
// ---------------------------------------------------------------------------

#[test]
fn s3_head_on_elastic_swaps_velocities() {
    let config = SimulationConfig::with_timestep(1.0 / 120.0)
        .zero_gravity()
        .restitution(1.0);
    let mut world = World::new(config);
    let a = world
        .add_sphere(Point3::new(-5.0, 0.0, 0.0), 1.0, UNIT_MASS_DENSITY)
        .unwrap();
    let b = world
        .add_sphere(Point3::new(5.0, 0.0, 0.0), 1.0, UNIT_MASS_DENSITY)
        .unwrap();
    world
        .body_mut(a)
        .unwrap()
        .set_velocity(Vector3::new(2.0, 0.0, 0.0));
    world
        .body_mut(b)
        .unwrap()
        .set_velocity(Vector3::new(-2.0, 0.0, 0.0));

    let momentum_before = world.total_linear_momentum();
    let angular_before = total_angular_momentum_about_origin(&world);

    let mut stepper = Stepper::new();
    stepper.run_for(&mut world, 3.0).unwrap();

    let velocity_a = world.body(a).unwrap().velocity();
    let velocity_b = world.body(b).unwrap().velocity();

    // Equal masses, elastic, head-on: exact velocity exchange
    assert_relative_eq!(velocity_a, Vector3::new(-2.0, 0.0, 0.0), epsilon = 1e-6);
    assert_relative_eq!(velocity_b, Vector3::new(2.0, 0.0, 0.0), epsilon = 1e-6);

    // Momentum conserved to tight tolerance (the totals are zero here,
    // so the bound is absolute)
    let momentum_after = world.total_linear_momentum();
    assert!((momentum_after - momentum_before).norm() < 1e-9);

    let angular_after = total_angular_momentum_about_origin(&world);
    assert!((angular_after - angular_before).norm() < 1e-9);
}

/// Total angular momentum about the world origin: Σ (x × P + L).
fn total_angular_momentum_about_origin(world: &World) -> Vector3<f64> {
    world
        .bodies()
        .filter(|b| !b.is_static())
        .map(|b| b.position().coords.cross(&b.linear_momentum()) + b.angular_momentum())
        .sum()
}

// ---------------------------------------------------------------------------
// S4: stacked spheres settle on the floor
// ---------------------------------------------------------------------------

#[test]
fn s4_stacked_spheres_rest() {
    // No positional correction exists, so resting contacts creep by
    // O(g·Δt) per second; the high-rate config keeps five seconds of
    // creep well inside the 0.01 envelope.
    let config = SimulationConfig::high_fidelity().restitution(0.5);
    let mut world = World::new(config);
    world.add_plane(Vector3::y(), 0.0).unwrap();
    let bottom = world
        .add_sphere(Point3::new(0.0, 1.0, 0.0), 1.0, UNIT_MASS_DENSITY)
        .unwrap();
    let top = world
        .add_sphere(Point3::new(0.0, 3.0, 0.0), 1.0, UNIT_MASS_DENSITY)
        .unwrap();

    let mut stepper = Stepper::new();
    stepper.run_for(&mut world, 5.0).unwrap();

    let bottom_pos = world.body(bottom).unwrap().position();
    let top_pos = world.body(top).unwrap().position();

    assert!(
        (bottom_pos - Point3::new(0.0, 1.0, 0.0)).norm() < 0.01,
        "bottom sphere drifted to {bottom_pos}"
    );
    assert!(
        (top_pos - Point3::new(0.0, 3.0, 0.0)).norm() < 0.01,
        "top sphere drifted to {top_pos}"
    );
    assert!(
        world.total_kinetic_energy() < 1e-3,
        "stack still jittering with KE = {}",
        world.total_kinetic_energy()
    );
}

// ---------------------------------------------------------------------------
// S5: sixteen spheres confined in an open-topped box
// ---------------------------------------------------------------------------

#[test]
fn s5_corner_confinement_invariants() {
    let config = SimulationConfig::with_timestep(1.0 / 120.0).restitution(0.9);
    let epsilon = config.contact_epsilon;
    let mut world = World::new(config);

    // Open-topped 2x2x2 box: floor plus four walls, normals inward
    world.add_plane(Vector3::y(), 0.0).unwrap();
    world.add_plane(Vector3::x(), -1.0).unwrap();
    world.add_plane(-Vector3::x(), -1.0).unwrap();
    world.add_plane(Vector3::z(), -1.0).unwrap();
    world.add_plane(-Vector3::z(), -1.0).unwrap();

    // 4x4 grid at two heights with deterministic jitter, no overlaps
    let lanes = [-0.6, -0.2, 0.2, 0.6];
    let mut spheres = Vec::new();
    for (i, &x) in lanes.iter().enumerate() {
        for (j, &z) in lanes.iter().enumerate() {
            let jitter = 0.01 * ((i * 4 + j) % 3) as f64;
            let y = if (i + j) % 2 == 0 { 0.5 } else { 1.1 };
            let id = world
                .add_sphere(Point3::new(x + jitter, y, z - jitter), 0.1, 1000.0)
                .unwrap();
            spheres.push(id);
        }
    }

    // The planes' world geometry, for the penetration invariant
    let planes: Vec<(Vector3<f64>, f64)> = world
        .bodies()
        .filter_map(|b| match *b.shape() {
            bounce_types::Shape::Plane { normal, distance } => Some((normal, distance)),
            bounce_types::Shape::Sphere { .. } => None,
        })
        .collect();
    assert_eq!(planes.len(), 5);

    let mut stepper = Stepper::new();
    let dt = world.timestep();
    let steps = (10.0 / dt).round() as usize;

    for step in 0..steps {
        stepper.step(&mut world).unwrap();

        for &id in &spheres {
            let body = world.body(id).unwrap();

            // Invariant 1: unit quaternions
            let drift = body.state.orientation_drift();
            assert!(
                drift < 1e-6,
                "quaternion drift {drift} at step {step} on {id}"
            );

            // Invariant 2: no deep penetration of any plane, allowing
            // one step of pre-detection drift
            let tolerance = epsilon + body.velocity().norm() * dt + 1e-9;
            let center = body.position();
            for &(normal, distance) in &planes {
                let height = normal.dot(&center.coords) - distance;
                assert!(
                    height >= -tolerance,
                    "sphere {id} center crossed a plane at step {step}: {height} < -{tolerance}"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// S6: planes are bit-identical after arbitrary stepping
// ---------------------------------------------------------------------------

#[test]
fn s6_plane_state_bit_identical_after_many_steps() {
    let mut world = World::new(SimulationConfig::default());
    let floor = world.add_plane(Vector3::y(), 0.0).unwrap();
    world
        .add_sphere(Point3::new(0.0, 3.0, 0.0), 1.0, UNIT_MASS_DENSITY)
        .unwrap();

    let state_before = world.body(floor).unwrap().state;
    let shape_before = *world.body(floor).unwrap().shape();

    let mut stepper = Stepper::new();
    for _ in 0..10_000 {
        stepper.step(&mut world).unwrap();
    }

    let floor_body = world.body(floor).unwrap();
    // Bit-identical: every field compares equal exactly
    assert_eq!(floor_body.state, state_before);
    assert_eq!(*floor_body.shape(), shape_before);
    assert_eq!(floor_body.linear_momentum(), Vector3::zeros());
    assert_eq!(floor_body.angular_momentum(), Vector3::zeros());
}

// ---------------------------------------------------------------------------
// Quantified properties
// ---------------------------------------------------------------------------

#[test]
fn energy_non_increasing_elastic_floor_no_gravity() {
    let config = SimulationConfig::with_timestep(1.0 / 120.0)
        .zero_gravity()
        .restitution(1.0);
    let mut world = World::new(config);
    world.add_plane(Vector3::y(), 0.0).unwrap();
    let ball = world
        .add_sphere(Point3::new(0.0, 2.0, 0.0), 1.0, UNIT_MASS_DENSITY)
        .unwrap();
    world
        .body_mut(ball)
        .unwrap()
        .set_velocity(Vector3::new(0.0, -3.0, 0.0));

    let mut stepper = Stepper::new();
    let mut energy_before = world.total_kinetic_energy();

    for _ in 0..600 {
        stepper.step(&mut world).unwrap();
        let energy_after = world.total_kinetic_energy();
        assert!(
            energy_after <= energy_before + 1e-9,
            "kinetic energy grew: {energy_before} -> {energy_after}"
        );
        energy_before = energy_after;
    }
}

#[test]
fn determinism_identical_worlds_stay_bitwise_identical() {
    let build = || {
        let config = SimulationConfig::with_timestep(1.0 / 120.0).restitution(0.9);
        let mut world = World::new(config);
        world.add_plane(Vector3::y(), 0.0).unwrap();
        world.add_plane(Vector3::x(), -1.0).unwrap();
        world.add_plane(-Vector3::x(), -1.0).unwrap();
        for k in 0..4 {
            let id = world
                .add_sphere(
                    Point3::new(-0.6 + 0.4 * k as f64, 0.5 + 0.2 * k as f64, 0.0),
                    0.1,
                    1000.0,
                )
                .unwrap();
            world
                .body_mut(id)
                .unwrap()
                .set_velocity(Vector3::new(0.5 - 0.3 * k as f64, 0.0, 0.1));
        }
        world
    };

    let mut world_a = build();
    let mut world_b = build();
    let mut stepper_a = Stepper::new();
    let mut stepper_b = Stepper::new();

    for _ in 0..600 {
        stepper_a.step(&mut world_a).unwrap();
        stepper_b.step(&mut world_b).unwrap();
    }

    for (body_a, body_b) in world_a.bodies().zip(world_b.bodies()) {
        // Bitwise equality, not approximate
        assert_eq!(body_a.state, body_b.state);
    }
}

#[test]
fn momentum_conserved_in_sphere_sphere_collision() {
    let config = SimulationConfig::with_timestep(1.0 / 120.0)
        .zero_gravity()
        .restitution(1.0);
    let mut world = World::new(config);
    let a = world
        .add_sphere(Point3::new(-2.0, 0.0, 0.0), 1.0, UNIT_MASS_DENSITY)
        .unwrap();
    let b = world
        .add_sphere(Point3::new(2.0, 0.3, 0.0), 1.0, UNIT_MASS_DENSITY)
        .unwrap();
    // Slightly off-axis so the collision is not perfectly head-on
    world
        .body_mut(a)
        .unwrap()
        .set_velocity(Vector3::new(1.5, 0.0, 0.0));
    world
        .body_mut(b)
        .unwrap()
        .set_velocity(Vector3::new(-1.0, 0.0, 0.0));

    let momentum_before = world.total_linear_momentum();

    let mut stepper = Stepper::new();
    stepper.run_for(&mut world, 3.0).unwrap();

    let momentum_after = world.total_linear_momentum();
    let scale = momentum_before.norm().max(1.0);
    assert!(
        (momentum_after - momentum_before).norm() / scale < 1e-9,
        "momentum changed: {momentum_before:?} -> {momentum_after:?}"
    );

    // The spheres actually collided and separated again
    let velocity_a = world.body(a).unwrap().velocity();
    assert!(velocity_a.x < 1.5);
}
