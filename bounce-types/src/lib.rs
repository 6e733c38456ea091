//! Core types for the bounce rigid-body engine.
//!
//! This crate provides the foundational types for impulse-based rigid-body
//! simulation of spheres and planes:
//!
//! - [`BodyState`] - The 13-scalar state of a rigid body: position,
//!   orientation, linear momentum, angular momentum
//! - [`MassProperties`] - Mass and inertia tensor, including the immovable
//!   (infinite-mass) degenerate case
//! - [`Shape`] - Collision geometry: sphere or infinite plane
//! - [`SimulationConfig`] - Timestep, gravity, restitution, contact tolerance
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no integration, no contact
//! logic, no impulse math. They are the common language between the engine
//! crates and any driver code (demos, analysis tools, replay).
//!
//! # State Representation
//!
//! Bodies carry *momenta*, not velocities. Linear velocity and angular
//! velocity are derived quantities:
//!
//! ```text
//! v = P / m
//! ω = J⁻¹ · L,   J⁻¹ = R · J_body⁻¹ · Rᵀ
//! ```
//!
//! Collision impulses update `P` and `L` directly, which keeps the impulse
//! response exact for bodies of any inertia.
//!
//! # Coordinate System
//!
//! The engine is axis-agnostic; gravity and plane normals are arbitrary
//! vectors. The bundled defaults and demos use Y-up with gravity along −Y.
//!
//! # Example
//!
//! ```
//! use bounce_types::{BodyState, MassProperties};
//! use nalgebra::Point3;
//!
//! // A unit-radius sphere of water density, at rest 5 m up
//! let props = MassProperties::sphere_from_density(1.0, 1000.0);
//! let state = BodyState::at_rest(Point3::new(0.0, 5.0, 0.0));
//!
//! assert!(props.mass > 4000.0); // (4/3)·π·1000
//! assert_eq!(state.position.y, 5.0);
//! assert!(state.linear_momentum.norm() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/bounce-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
// Overly pedantic for numeric type definitions
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod body;
mod config;
mod error;
mod shape;

pub use body::{BodyId, BodyState, MassProperties};
pub use config::{Gravity, SimulationConfig};
pub use error::SimError;
pub use shape::Shape;

// Re-export math types for convenience
pub use nalgebra::{Matrix3, Point3, Quaternion, UnitQuaternion, Vector3};

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_state_and_props_compose() {
        let props = MassProperties::sphere_from_density(0.5, 2.0);
        let state = BodyState::at_rest(Point3::new(1.0, 2.0, 3.0));

        assert!(props.validate().is_ok());
        assert_eq!(state.position.x, 1.0);
        assert!(state.is_finite());
    }

    #[test]
    fn test_plane_shape_distance() {
        let floor = Shape::ground_plane(0.0);
        let d = floor.signed_distance(&Point3::new(0.0, 2.5, 0.0));
        assert_eq!(d, Some(2.5));
    }
}
