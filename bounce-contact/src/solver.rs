//! Impulse solver for simultaneous contacts.
//!
//! The solver consumes the tick's contact list and applies restitution
//! impulses sequentially in insertion order. Each impulse mutates the
//! affected bodies' momenta and refreshes their velocities before the
//! next contact is examined, so the sweep is a Gauss-Seidel iteration:
//! contact `i+1` observes the momenta produced by contact `i`.
//!
//! Contacts are classified at application time:
//!
//! - *Separating* (`v_n ≥ 0`): no impulse, terminal.
//! - *Closing* (`v_n < 0`): apply the restitution impulse, terminal.
//!
//! No contact is revisited within a pass. One pass is the standard
//! configuration; the pass count is configurable for experimentation
//! with iterated sweeps.

use bounce_types::BodyId;
use nalgebra::{Matrix3, Point3, Vector3};

use crate::Contact;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-body kinematic view the solver operates on.
///
/// The engine gathers one view per body (in body-id order), lets the
/// solver mutate momenta and velocities, and writes the momenta back.
/// Immovable bodies carry zero inverse mass and inverse inertia and are
/// never mutated.
#[derive(Debug, Clone, Copy)]
pub struct ContactBodyView {
    /// Center-of-mass world position.
    pub position: Point3<f64>,
    /// Linear momentum `P`.
    pub linear_momentum: Vector3<f64>,
    /// Angular momentum `L` (world frame).
    pub angular_momentum: Vector3<f64>,
    /// Derived linear velocity `P/m`.
    pub velocity: Vector3<f64>,
    /// Derived angular velocity `J⁻¹·L`.
    pub angular_velocity: Vector3<f64>,
    /// Inverse mass (`0` for immovable bodies).
    pub inv_mass: f64,
    /// World-frame inverse inertia tensor (zero for immovable bodies).
    pub inv_inertia: Matrix3<f64>,
}

impl ContactBodyView {
    /// Create a view for a movable body from its momenta and inverse
    /// mass properties. Velocities are derived here.
    #[must_use]
    pub fn new(
        position: Point3<f64>,
        linear_momentum: Vector3<f64>,
        angular_momentum: Vector3<f64>,
        inv_mass: f64,
        inv_inertia: Matrix3<f64>,
    ) -> Self {
        Self {
            position,
            linear_momentum,
            angular_momentum,
            velocity: linear_momentum * inv_mass,
            angular_velocity: inv_inertia * angular_momentum,
            inv_mass,
            inv_inertia,
        }
    }

    /// Create a view for an immovable body.
    #[must_use]
    pub fn immovable(position: Point3<f64>) -> Self {
        Self {
            position,
            linear_momentum: Vector3::zeros(),
            angular_momentum: Vector3::zeros(),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            inv_mass: 0.0,
            inv_inertia: Matrix3::zeros(),
        }
    }

    /// Check if this body ignores impulses.
    #[must_use]
    pub fn is_immovable(&self) -> bool {
        self.inv_mass == 0.0
    }

    /// Apply an impulse at the given arm from the center of mass,
    /// updating momenta and refreshing the derived velocities.
    ///
    /// Immovable bodies are left untouched.
    pub fn apply_impulse(&mut self, impulse: &Vector3<f64>, arm: &Vector3<f64>) {
        if self.is_immovable() {
            return;
        }
        self.linear_momentum += impulse;
        self.angular_momentum += arm.cross(impulse);
        self.velocity = self.linear_momentum * self.inv_mass;
        self.angular_velocity = self.inv_inertia * self.angular_momentum;
    }
}

/// Configuration for the impulse solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImpulseSolverConfig {
    /// Coefficient of restitution `e ∈ [0, 1]`.
    pub restitution: f64,
    /// Number of Gauss-Seidel sweeps over the contact list.
    pub passes: usize,
}

impl Default for ImpulseSolverConfig {
    fn default() -> Self {
        Self {
            restitution: 0.9,
            passes: 1,
        }
    }
}

impl ImpulseSolverConfig {
    /// Create a configuration with the given restitution and pass count.
    #[must_use]
    pub const fn new(restitution: f64, passes: usize) -> Self {
        Self {
            restitution,
            passes,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> bounce_types::Result<()> {
        if !self.restitution.is_finite() || !(0.0..=1.0).contains(&self.restitution) {
            return Err(bounce_types::SimError::InvalidRestitution(self.restitution));
        }
        if self.passes == 0 {
            return Err(bounce_types::SimError::invalid_config(
                "solver passes must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Outcome counters for one solve call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveReport {
    /// Contacts that received an impulse.
    pub applied: usize,
    /// Contacts skipped because they were separating (`v_n ≥ 0`).
    pub separating: usize,
    /// Contacts skipped due to numerical degeneracy (non-positive
    /// effective-mass denominator or invalid body reference).
    pub skipped: usize,
}

/// The impulse solver.
///
/// Stateless apart from its configuration; a solve call is a pure
/// function of the contact list and the body views.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImpulseSolver {
    config: ImpulseSolverConfig,
}

impl ImpulseSolver {
    /// Create a solver with the given configuration.
    #[must_use]
    pub const fn new(config: ImpulseSolverConfig) -> Self {
        Self { config }
    }

    /// Get the solver configuration.
    #[must_use]
    pub fn config(&self) -> &ImpulseSolverConfig {
        &self.config
    }

    /// Resolve the contact set against the body views.
    ///
    /// Sweeps the contacts in order, `config.passes` times. Closing
    /// contacts receive the restitution impulse; separating contacts are
    /// skipped; degenerate contacts are skipped with a warning and never
    /// corrupt other bodies.
    pub fn solve(&self, contacts: &[Contact], bodies: &mut [ContactBodyView]) -> SolveReport {
        let mut report = SolveReport::default();

        for _ in 0..self.config.passes {
            for contact in contacts {
                self.resolve_contact(contact, bodies, &mut report);
            }
        }

        report
    }

    fn resolve_contact(
        &self,
        contact: &Contact,
        bodies: &mut [ContactBodyView],
        report: &mut SolveReport,
    ) {
        let index_a = contact.body_a.index();
        let index_b = contact.body_b.index();
        let body_count = bodies.len();

        if index_a == index_b || index_a >= body_count || index_b >= body_count {
            tracing::warn!(
                body_a = index_a,
                body_b = index_b,
                "contact references invalid bodies, skipping"
            );
            report.skipped += 1;
            return;
        }

        // Views are Copy: work on locals, write back after the impulse.
        let mut body_a = bodies[index_a];
        let mut body_b = bodies[index_b];

        let normal_velocity = contact.normal_velocity(
            &body_a.velocity,
            &body_a.angular_velocity,
            &body_a.position,
            &body_b.velocity,
            &body_b.angular_velocity,
            &body_b.position,
        );

        if normal_velocity >= 0.0 {
            report.separating += 1;
            return;
        }

        let arm_a = contact.point - body_a.position;
        let arm_b = contact.point - body_b.position;
        let normal = contact.normal;

        let angular_term_a = normal.dot(&(body_a.inv_inertia * arm_a.cross(&normal)).cross(&arm_a));
        let angular_term_b = normal.dot(&(body_b.inv_inertia * arm_b.cross(&normal)).cross(&arm_b));
        let denominator = body_a.inv_mass + body_b.inv_mass + angular_term_a + angular_term_b;

        if denominator <= 0.0 {
            tracing::warn!(
                body_a = index_a,
                body_b = index_b,
                denominator,
                "non-positive impulse denominator, skipping contact"
            );
            report.skipped += 1;
            return;
        }

        let magnitude = -(1.0 + self.config.restitution) * normal_velocity / denominator;
        let impulse = normal * magnitude;

        body_a.apply_impulse(&impulse, &arm_a);
        body_b.apply_impulse(&-impulse, &arm_b);

        bodies[index_a] = body_a;
        bodies[index_b] = body_b;
        report.applied += 1;
    }
}

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
    use bounce_types::MassProperties;

    fn unit_sphere_view(position: Point3<f64>, velocity: Vector3<f64>) -> ContactBodyView {
        let props = MassProperties::sphere(1.0, 1.0);
        ContactBodyView::new(
            position,
            velocity, // P = m·v with m = 1
            Vector3::zeros(),
            props.inverse_mass(),
            props.inverse_inertia().unwrap(),
        )
    }

    fn elastic_solver() -> ImpulseSolver {
        ImpulseSolver::new(ImpulseSolverConfig::new(1.0, 1))
    }

    #[test]
    fn test_config_validation() {
        assert!(ImpulseSolverConfig::default().validate().is_ok());
        assert!(ImpulseSolverConfig::new(1.5, 1).validate().is_err());
        assert!(ImpulseSolverConfig::new(-0.1, 1).validate().is_err());
        assert!(ImpulseSolverConfig::new(0.5, 0).validate().is_err());
    }

    #[test]
    fn test_head_on_elastic_swap() {
        // Equal unit spheres closing head-on at ±2 m/s: elastic collision
        // swaps the velocities exactly.
        let mut bodies = vec![
            unit_sphere_view(Point3::new(-1.0, 0.0, 0.0), Vector3::new(2.0, 0.0, 0.0)),
            unit_sphere_view(Point3::new(1.0, 0.0, 0.0), Vector3::new(-2.0, 0.0, 0.0)),
        ];

        let contact = Contact::sphere_sphere(
            &bodies[0].position,
            1.0,
            &bodies[1].position,
            1.0,
            1e-3,
            BodyId::new(0),
            BodyId::new(1),
        )
        .unwrap();

        let report = elastic_solver().solve(&[contact], &mut bodies);

        assert_eq!(report.applied, 1);
        assert_relative_eq!(bodies[0].velocity.x, -2.0, epsilon = 1e-12);
        assert_relative_eq!(bodies[1].velocity.x, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_momentum_conserved_between_spheres() {
        let mut bodies = vec![
            unit_sphere_view(Point3::new(-0.9, 0.0, 0.0), Vector3::new(3.0, 0.0, 0.0)),
            unit_sphere_view(Point3::new(0.9, 0.0, 0.0), Vector3::new(-1.0, 0.0, 0.0)),
        ];

        let total_before = bodies[0].linear_momentum + bodies[1].linear_momentum;

        let contact = Contact::sphere_sphere(
            &bodies[0].position,
            1.0,
            &bodies[1].position,
            1.0,
            1e-3,
            BodyId::new(0),
            BodyId::new(1),
        )
        .unwrap();

        ImpulseSolver::new(ImpulseSolverConfig::new(0.5, 1)).solve(&[contact], &mut bodies);

        let total_after = bodies[0].linear_momentum + bodies[1].linear_momentum;
        assert_relative_eq!(total_before, total_after, epsilon = 1e-12);
    }

    #[test]
    fn test_plane_bounce_restitution() {
        // Sphere hits an immovable floor at −4 m/s with e = 0.5:
        // rebound at exactly +2 m/s.
        let mut bodies = vec![
            ContactBodyView::immovable(Point3::origin()),
            unit_sphere_view(Point3::new(0.0, 0.999, 0.0), Vector3::new(0.0, -4.0, 0.0)),
        ];

        let contact = Contact::sphere_plane(
            &bodies[1].position,
            1.0,
            &Vector3::y(),
            0.0,
            1e-3,
            BodyId::new(1),
            BodyId::new(0),
        )
        .unwrap();

        let report =
            ImpulseSolver::new(ImpulseSolverConfig::new(0.5, 1)).solve(&[contact], &mut bodies);

        assert_eq!(report.applied, 1);
        assert_relative_eq!(bodies[1].velocity.y, 2.0, epsilon = 1e-12);
        // The plane never moves
        assert_eq!(bodies[0].linear_momentum, Vector3::zeros());
        assert_eq!(bodies[0].angular_momentum, Vector3::zeros());
    }

    #[test]
    fn test_inelastic_contact_kills_normal_velocity() {
        let mut bodies = vec![
            ContactBodyView::immovable(Point3::origin()),
            unit_sphere_view(Point3::new(0.0, 1.0, 0.0), Vector3::new(0.0, -3.0, 0.0)),
        ];

        let contact = Contact::sphere_plane(
            &bodies[1].position,
            1.0,
            &Vector3::y(),
            0.0,
            1e-3,
            BodyId::new(1),
            BodyId::new(0),
        )
        .unwrap();

        ImpulseSolver::new(ImpulseSolverConfig::new(0.0, 1)).solve(&[contact], &mut bodies);

        assert_relative_eq!(bodies[1].velocity.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_contact_is_central_no_spin() {
        // Sphere-sphere arms are parallel to the normal, so the impulse
        // passes through both centers and produces no angular momentum.
        let mut bodies = vec![
            unit_sphere_view(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0)),
            unit_sphere_view(Point3::new(1.4, 1.0, 0.0), Vector3::new(-2.0, -1.4, 0.0)),
        ];

        let contact = Contact::sphere_sphere(
            &bodies[0].position,
            1.0,
            &bodies[1].position,
            1.0,
            1e-3,
            BodyId::new(0),
            BodyId::new(1),
        )
        .unwrap();

        let report = elastic_solver().solve(&[contact], &mut bodies);

        assert_eq!(report.applied, 1);
        assert!(bodies[0].velocity.norm() > 0.0);
        assert_relative_eq!(bodies[0].angular_momentum.norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(bodies[1].angular_momentum.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_off_center_impulse_induces_spin() {
        // A contact point offset from the center line exercises the
        // angular effective-mass terms: the restitution law must hold for
        // the *contact point* velocity and the body picks up spin.
        let mut bodies = vec![
            ContactBodyView::immovable(Point3::origin()),
            unit_sphere_view(Point3::new(0.5, 1.0, 0.0), Vector3::new(0.0, -3.0, 0.0)),
        ];

        let contact = Contact {
            body_a: BodyId::new(1),
            body_b: BodyId::new(0),
            point: Point3::origin(),
            normal: Vector3::y(),
            penetration: 0.0,
        };

        let pre = contact.normal_velocity(
            &bodies[1].velocity,
            &bodies[1].angular_velocity,
            &bodies[1].position,
            &bodies[0].velocity,
            &bodies[0].angular_velocity,
            &bodies[0].position,
        );
        assert_relative_eq!(pre, -3.0, epsilon = 1e-12);

        let report = elastic_solver().solve(&[contact], &mut bodies);
        assert_eq!(report.applied, 1);

        let post = contact.normal_velocity(
            &bodies[1].velocity,
            &bodies[1].angular_velocity,
            &bodies[1].position,
            &bodies[0].velocity,
            &bodies[0].angular_velocity,
            &bodies[0].position,
        );
        // v_n' = −e·v_n with e = 1
        assert_relative_eq!(post, 3.0, epsilon = 1e-12);
        // The lever arm has an X component, so the body spins about Z
        assert!(bodies[1].angular_momentum.z.abs() > 0.0);
    }

    #[test]
    fn test_gauss_seidel_observes_upstream_impulse() {
        // Sphere 1 sits between the floor and sphere 2 pressing down.
        // The floor contact reverses sphere 1 upward; the sphere-sphere
        // contact is then resolved against the *updated* velocity.
        let mut bodies = vec![
            ContactBodyView::immovable(Point3::origin()),
            unit_sphere_view(Point3::new(0.0, 1.0, 0.0), Vector3::new(0.0, -1.0, 0.0)),
            unit_sphere_view(Point3::new(0.0, 3.0, 0.0), Vector3::new(0.0, -1.0, 0.0)),
        ];

        let floor_contact = Contact::sphere_plane(
            &bodies[1].position,
            1.0,
            &Vector3::y(),
            0.0,
            1e-3,
            BodyId::new(1),
            BodyId::new(0),
        )
        .unwrap();
        let pair_contact = Contact::sphere_sphere(
            &bodies[2].position,
            1.0,
            &bodies[1].position,
            1.0,
            1e-3,
            BodyId::new(2),
            BodyId::new(1),
        )
        .unwrap();

        let report = elastic_solver().solve(&[floor_contact, pair_contact], &mut bodies);

        // Both contacts were closing at their application time: the floor
        // reversed sphere 1 to +1, making the pair contact close at −2.
        assert_eq!(report.applied, 2);
        // Elastic exchange hands sphere 2 the +1 velocity
        assert_relative_eq!(bodies[2].velocity.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(bodies[1].velocity.y, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_denominator_skipped() {
        // Two immovable bodies in "contact": zero denominator, skip.
        let mut bodies = vec![
            ContactBodyView::immovable(Point3::origin()),
            ContactBodyView::immovable(Point3::new(0.0, 1.0, 0.0)),
        ];

        let contact = Contact {
            body_a: BodyId::new(1),
            body_b: BodyId::new(0),
            point: Point3::origin(),
            normal: Vector3::y(),
            penetration: 0.1,
        };

        // Force a closing classification by faking downward velocity on A
        bodies[1].velocity = Vector3::new(0.0, -1.0, 0.0);

        let report = elastic_solver().solve(&[contact], &mut bodies);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.applied, 0);
    }

    #[test]
    fn test_out_of_range_contact_skipped() {
        let mut bodies = vec![unit_sphere_view(Point3::origin(), Vector3::zeros())];

        let contact = Contact {
            body_a: BodyId::new(5),
            body_b: BodyId::new(0),
            point: Point3::origin(),
            normal: Vector3::y(),
            penetration: 0.0,
        };

        let report = elastic_solver().solve(&[contact], &mut bodies);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_zero_impulse_leaves_momenta_unchanged() {
        let mut view = unit_sphere_view(Point3::origin(), Vector3::new(1.0, 2.0, 3.0));
        let before = view;
        view.apply_impulse(&Vector3::zeros(), &Vector3::new(0.0, -1.0, 0.0));
        assert_eq!(view.linear_momentum, before.linear_momentum);
        assert_eq!(view.angular_momentum, before.angular_momentum);
        assert_eq!(view.velocity, before.velocity);
    }

    #[test]
    fn test_multiple_passes_are_stable() {
        // A contact resolved on pass one is separating on pass two; extra
        // passes must not re-apply impulses.
        let mut bodies = vec![
            ContactBodyView::immovable(Point3::origin()),
            unit_sphere_view(Point3::new(0.0, 0.999, 0.0), Vector3::new(0.0, -4.0, 0.0)),
        ];

        let contact = Contact::sphere_plane(
            &bodies[1].position,
            1.0,
            &Vector3::y(),
            0.0,
            1e-3,
            BodyId::new(1),
            BodyId::new(0),
        )
        .unwrap();

        let report =
            ImpulseSolver::new(ImpulseSolverConfig::new(1.0, 4)).solve(&[contact], &mut bodies);

        assert_eq!(report.applied, 1);
        assert_eq!(report.separating, 3);
        assert_relative_eq!(bodies[1].velocity.y, 4.0, epsilon = 1e-12);
    }
}
