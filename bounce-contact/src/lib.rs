//! Contact geometry and impulse-based collision response.
//!
//! This crate provides the narrow-phase contact predicates for the two
//! shape pairs the engine supports (sphere/plane and sphere/sphere) and
//! the impulse solver that resolves a tick's contact set.
//!
//! # Impulse Model
//!
//! Each closing contact receives an instantaneous impulse `j·n̂` applied at
//! the contact point, equal and opposite on the two bodies, sized so the
//! post-impulse normal relative velocity satisfies Newton's restitution
//! law `v_n' = −e·v_n`. The scalar magnitude follows the formulation in
//! Eberly, *Computing Impulsive Forces*
//! (<https://www.geometrictools.com/Documentation/ComputingImpulsiveForces.pdf>):
//!
//! ```text
//! j = −(1 + e)·v_n / (1/m_A + 1/m_B
//!       + n̂·((J_A⁻¹·(r_A × n̂)) × r_A)
//!       + n̂·((J_B⁻¹·(r_B × n̂)) × r_B))
//! ```
//!
//! with `r = p − x` the arm from each body's center of mass to the contact
//! point. The impulse updates momenta directly:
//!
//! ```text
//! P_A += j·n̂    L_A += r_A × (j·n̂)
//! P_B −= j·n̂    L_B −= r_B × (j·n̂)
//! ```
//!
//! # Simultaneous Contacts
//!
//! The solver sweeps the contact list once in insertion order
//! (Gauss-Seidel): each applied impulse refreshes the body velocities, so
//! downstream contacts observe the updated momenta. The pass count is
//! configurable but defaults to one.
//!
//! # Sign Convention
//!
//! Contact normals point **from body B toward body A** everywhere in this
//! crate. Under that convention the normal relative velocity
//! `v_n = n̂ · (v_A + ω_A×r_A − v_B − ω_B×r_B)` is negative exactly when
//! the bodies are closing, and a positive impulse magnitude pushes A away
//! from B.
//!
//! # Example
//!
//! ```
//! use bounce_contact::{Contact, ContactBodyView, ImpulseSolver, ImpulseSolverConfig};
//! use bounce_types::{BodyId, MassProperties};
//! use nalgebra::{Point3, Vector3};
//!
//! // A unit sphere resting on the floor plane, moving downward
//! let contact = Contact::sphere_plane(
//!     &Point3::new(0.0, 1.0, 0.0),
//!     1.0,
//!     &Vector3::y(),
//!     0.0,
//!     1e-3,
//!     BodyId::new(1),
//!     BodyId::new(0),
//! )
//! .unwrap();
//!
//! let props = MassProperties::sphere(1.0, 1.0);
//! let mut bodies = vec![
//!     ContactBodyView::immovable(Point3::origin()),
//!     ContactBodyView::new(
//!         Point3::new(0.0, 1.0, 0.0),
//!         Vector3::new(0.0, -3.0, 0.0), // P = m·v, m = 1
//!         Vector3::zeros(),
//!         props.inverse_mass(),
//!         props.inverse_inertia().unwrap(),
//!     ),
//! ];
//!
//! let solver = ImpulseSolver::new(ImpulseSolverConfig::new(1.0, 1));
//! let report = solver.solve(&[contact], &mut bodies);
//!
//! assert_eq!(report.applied, 1);
//! // Elastic bounce: velocity reversed
//! assert!((bodies[1].velocity.y - 3.0).abs() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/bounce-contact/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
)]

mod contact;
mod solver;

pub use contact::Contact;
pub use solver::{ContactBodyView, ImpulseSolver, ImpulseSolverConfig, SolveReport};

// Re-export types needed for contact computation
pub use bounce_types::{BodyId, Vector3};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_separating_contact_untouched() {
        // Sphere on the floor but moving away: no impulse
        let contact = Contact::sphere_plane(
            &Point3::new(0.0, 0.9995, 0.0),
            1.0,
            &Vector3::y(),
            0.0,
            1e-3,
            BodyId::new(1),
            BodyId::new(0),
        )
        .unwrap();

        let props = bounce_types::MassProperties::sphere(1.0, 1.0);
        let mut bodies = vec![
            ContactBodyView::immovable(Point3::origin()),
            ContactBodyView::new(
                Point3::new(0.0, 0.9995, 0.0),
                Vector3::new(0.0, 2.0, 0.0),
                Vector3::zeros(),
                props.inverse_mass(),
                props.inverse_inertia().unwrap(),
            ),
        ];

        let solver = ImpulseSolver::new(ImpulseSolverConfig::new(0.9, 1));
        let report = solver.solve(&[contact], &mut bodies);

        assert_eq!(report.applied, 0);
        assert_eq!(report.separating, 1);
        assert_eq!(bodies[1].linear_momentum, Vector3::new(0.0, 2.0, 0.0));
    }
}
