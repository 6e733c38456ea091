//! Impulse-based rigid-body engine for spheres bouncing among planes.
//!
//! This crate provides the simulation loop, world management, RK4
//! integration, contact detection, and impulse resolution. It builds on
//! [`bounce_types`] for the data structures and [`bounce_contact`] for
//! the contact math.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Stepper                              │
//! │  Orchestrates: forces → integrate → detect → solve → time   │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         World                               │
//! │  Contains: bodies (contiguous, index-stable), config, time  │
//! │  Provides: construction, forces, contact sweep, diagnostics │
//! └───────────┬─────────────────────────────────┬───────────────┘
//!             │                                 │
//!             ▼                                 ▼
//! ┌───────────────────────────┐   ┌───────────────────────────────┐
//! │        Integrator         │   │        bounce-contact         │
//! │  RK4 on (x, q, P, L)      │   │  narrow phase + impulse sweep │
//! └───────────────────────────┘   └───────────────────────────────┘
//! ```
//!
//! # Determinism
//!
//! The engine is single-threaded and synchronous. Bodies integrate in
//! index order, contacts are detected in index-pair order, and the
//! impulse solver sweeps that list sequentially. Two engines built with
//! identical state and configuration and stepped identically produce
//! bitwise-identical results on the same platform.
//!
//! # Quick Start
//!
//! ```
//! use bounce_core::{Stepper, World};
//! use bounce_types::SimulationConfig;
//! use nalgebra::{Point3, Vector3};
//!
//! // A unit sphere dropped onto a floor plane
//! let mut world = World::new(SimulationConfig::default());
//! world.add_plane(Vector3::y(), 0.0).unwrap();
//! let ball = world
//!     .add_sphere(Point3::new(0.0, 5.0, 0.0), 1.0, 1.0)
//!     .unwrap();
//!
//! let mut stepper = Stepper::new();
//! stepper.run_for(&mut world, 2.0).unwrap();
//!
//! // The ball bounced rather than falling through: its center stays
//! // above the floor (within one step's worth of penetration)
//! let y = world.body(ball).unwrap().position().y;
//! assert!(y > 0.9);
//! ```
//!
//! # Driving a Renderer
//!
//! A driver that renders once per frame while the physics catches up to
//! wall time installs a callback and calls [`Stepper::step_to`]:
//!
//! ```
//! use bounce_core::{Stepper, World};
//!
//! let mut world = World::default();
//! let mut stepper = Stepper::new();
//! stepper.set_render_callback(Box::new(|| {
//!     // upload body transforms, draw, present
//! }));
//!
//! // each frame:
//! stepper.step_to(&mut world, 0.016).unwrap();
//! ```

#![doc(html_root_url = "https://docs.rs/bounce-core/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
)]

pub mod integrator;
mod stepper;
mod world;

pub use integrator::rk4_step;
pub use stepper::{RenderCallback, StepResult, Stepper, StepperConfig};
pub use world::{Body, World};

// Re-export key types from the leaf crates for convenience
pub use bounce_contact::{Contact, ImpulseSolver, ImpulseSolverConfig, SolveReport};
pub use bounce_types::{
    BodyId, BodyState, Gravity, MassProperties, Shape, SimError, SimulationConfig,
};

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn test_basic_simulation() {
        let mut world = World::new(SimulationConfig::default());
        world.add_plane(Vector3::y(), 0.0).unwrap();
        let ball = world
            .add_sphere(Point3::new(0.0, 10.0, 0.0), 0.5, 2.0)
            .unwrap();

        let mut stepper = Stepper::new();
        stepper.run_for(&mut world, 0.5).unwrap();

        // Still falling, below the release height, above the floor
        let body = world.body(ball).unwrap();
        assert!(body.position().y < 10.0);
        assert!(body.position().y > 0.0);
        assert!(body.velocity().y < 0.0);
    }

    #[test]
    fn test_momentum_conservation_free_flight() {
        // No gravity, no contacts: total momentum is constant
        let mut world = World::new(SimulationConfig::default().zero_gravity());
        let a = world
            .add_sphere(Point3::new(-5.0, 0.0, 0.0), 0.5, 1.0)
            .unwrap();
        let b = world
            .add_sphere(Point3::new(5.0, 0.0, 0.0), 0.5, 1.0)
            .unwrap();
        world
            .body_mut(a)
            .unwrap()
            .set_velocity(Vector3::new(1.0, 0.0, 0.0));
        world
            .body_mut(b)
            .unwrap()
            .set_velocity(Vector3::new(-1.0, 0.5, 0.0));

        let before = world.total_linear_momentum();

        let mut stepper = Stepper::new();
        stepper.run_for(&mut world, 1.0).unwrap();

        let after = world.total_linear_momentum();
        assert_relative_eq!(before, after, epsilon = 1e-12);
    }

    #[test]
    fn test_plane_is_immovable() {
        let mut world = World::new(SimulationConfig::default());
        let floor = world.add_plane(Vector3::y(), 0.0).unwrap();
        world
            .add_sphere(Point3::new(0.0, 2.0, 0.0), 1.0, 1.0)
            .unwrap();

        let before = world.body(floor).unwrap().clone();

        let mut stepper = Stepper::new();
        stepper.run_for(&mut world, 2.0).unwrap();

        let after = world.body(floor).unwrap();
        assert_eq!(before.state, after.state);
        assert_eq!(before.shape(), after.shape());
    }
}
