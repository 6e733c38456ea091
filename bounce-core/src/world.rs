//! Simulation world container and entity management.
//!
//! The [`World`] is the central data structure for simulation state. It
//! owns every body for the simulation's lifetime in a contiguous vector;
//! [`BodyId`]s are stable indices into it. Iteration order is index
//! order, which makes contact insertion order (and therefore the
//! Gauss-Seidel sweep) deterministic by construction.

use bounce_contact::{Contact, ContactBodyView, ImpulseSolver, ImpulseSolverConfig, SolveReport};
use bounce_types::{
    BodyId, BodyState, Gravity, MassProperties, Shape, SimError, SimulationConfig,
};
use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};

use crate::integrator::rk4_step;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minimum squared length for a plane normal to be considered usable.
const MIN_NORMAL_LENGTH_SQUARED: f64 = 1e-12;

/// A rigid body owned by the [`World`].
///
/// Combines the 13-scalar dynamic state with constant mass properties,
/// collision shape, per-step force/torque accumulators, and the cached
/// world-frame quantities (velocity, angular velocity, inverse world
/// inertia) that [`Body::update_world_quantities`] keeps in sync.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Body {
    /// Unique identifier (index into the world's body vector).
    pub id: BodyId,
    /// Optional name for debugging.
    pub name: Option<String>,
    /// Current dynamic state `(x, q, P, L)`.
    pub state: BodyState,
    /// Mass and body-frame inertia. Constant over the body's lifetime.
    mass_props: MassProperties,
    /// Collision shape. Immutable after construction.
    shape: Shape,
    /// Whether this body is immovable.
    is_static: bool,
    /// Accumulated external force (cleared each step).
    accumulated_force: Vector3<f64>,
    /// Accumulated external torque (cleared each step).
    accumulated_torque: Vector3<f64>,
    // Cached world-frame derived quantities
    inv_mass: f64,
    inv_inertia_body: Matrix3<f64>,
    inv_inertia_world: Matrix3<f64>,
    velocity: Vector3<f64>,
    angular_velocity: Vector3<f64>,
}

impl Body {
    /// Create a body. Mass properties must already be validated.
    fn new(id: BodyId, state: BodyState, mass_props: MassProperties, shape: Shape) -> Self {
        let is_static = mass_props.is_immovable();
        let inv_inertia_body = mass_props.inverse_inertia().unwrap_or_else(Matrix3::zeros);
        let mut body = Self {
            id,
            name: None,
            state,
            mass_props,
            shape,
            is_static,
            accumulated_force: Vector3::zeros(),
            accumulated_torque: Vector3::zeros(),
            inv_mass: mass_props.inverse_mass(),
            inv_inertia_body,
            inv_inertia_world: Matrix3::zeros(),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
        };
        body.update_world_quantities();
        body
    }

    /// Recompute the cached world-frame quantities from the current
    /// state: `J⁻¹ = R·J_body⁻¹·Rᵀ`, `v = P/m`, `ω = J⁻¹·L`.
    ///
    /// For an immovable body this is a no-op apart from keeping the
    /// derived quantities at zero.
    pub fn update_world_quantities(&mut self) {
        if self.is_static {
            self.velocity = Vector3::zeros();
            self.angular_velocity = Vector3::zeros();
            self.inv_inertia_world = Matrix3::zeros();
            return;
        }

        let rotation = self.state.orientation.to_rotation_matrix();
        self.inv_inertia_world =
            rotation.matrix() * self.inv_inertia_body * rotation.matrix().transpose();
        self.velocity = self.state.linear_momentum * self.inv_mass;
        self.angular_velocity = self.inv_inertia_world * self.state.angular_momentum;
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// World position of the center of mass.
    #[must_use]
    pub fn position(&self) -> Point3<f64> {
        self.state.position
    }

    /// Orientation as a unit quaternion.
    #[must_use]
    pub fn orientation(&self) -> UnitQuaternion<f64> {
        self.state.orientation
    }

    /// Derived linear velocity `v = P/m`.
    #[must_use]
    pub fn velocity(&self) -> Vector3<f64> {
        self.velocity
    }

    /// Derived angular velocity `ω = J⁻¹·L`.
    #[must_use]
    pub fn angular_velocity(&self) -> Vector3<f64> {
        self.angular_velocity
    }

    /// Linear momentum `P`.
    #[must_use]
    pub fn linear_momentum(&self) -> Vector3<f64> {
        self.state.linear_momentum
    }

    /// Angular momentum `L`.
    #[must_use]
    pub fn angular_momentum(&self) -> Vector3<f64> {
        self.state.angular_momentum
    }

    /// Mass properties.
    #[must_use]
    pub fn mass_properties(&self) -> &MassProperties {
        &self.mass_props
    }

    /// Collision shape.
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Whether this body is immovable.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// World-space sphere data `(center, radius)`, `None` for planes.
    #[must_use]
    pub fn world_sphere(&self) -> Option<(Point3<f64>, f64)> {
        self.shape.world_sphere(&self.state.position)
    }

    /// Kinetic energy `½·(P·v + L·ω)`. Zero for immovable bodies.
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        if self.is_static {
            return 0.0;
        }
        0.5 * (self.state.linear_momentum.dot(&self.velocity)
            + self.state.angular_momentum.dot(&self.angular_velocity))
    }

    /// Cached inverse mass.
    #[must_use]
    pub fn inverse_mass(&self) -> f64 {
        self.inv_mass
    }

    /// Cached world-frame inverse inertia tensor.
    #[must_use]
    pub fn inverse_inertia_world(&self) -> Matrix3<f64> {
        self.inv_inertia_world
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Set the world position.
    pub fn set_position(&mut self, position: Point3<f64>) {
        self.state.position = position;
    }

    /// Set the orientation.
    pub fn set_orientation(&mut self, orientation: UnitQuaternion<f64>) {
        self.state.orientation = orientation;
        self.update_world_quantities();
    }

    /// Set the linear momentum. Ignored for immovable bodies.
    pub fn set_linear_momentum(&mut self, linear_momentum: Vector3<f64>) {
        if !self.is_static {
            self.state.linear_momentum = linear_momentum;
            self.update_world_quantities();
        }
    }

    /// Set the angular momentum. Ignored for immovable bodies.
    pub fn set_angular_momentum(&mut self, angular_momentum: Vector3<f64>) {
        if !self.is_static {
            self.state.angular_momentum = angular_momentum;
            self.update_world_quantities();
        }
    }

    /// Set the linear velocity by converting through the mass
    /// (`P = m·v`). Ignored for immovable bodies.
    pub fn set_velocity(&mut self, velocity: Vector3<f64>) {
        if !self.is_static {
            self.state.linear_momentum = velocity * self.mass_props.mass;
            self.update_world_quantities();
        }
    }

    /// Set the angular velocity by converting through the world inertia
    /// (`L = J·ω`, `J = R·J_body·Rᵀ`). Ignored for immovable bodies.
    pub fn set_angular_velocity(&mut self, angular_velocity: Vector3<f64>) {
        if !self.is_static {
            let rotation = self.state.orientation.to_rotation_matrix();
            let inertia_world =
                rotation.matrix() * self.mass_props.inertia * rotation.matrix().transpose();
            self.state.angular_momentum = inertia_world * angular_velocity;
            self.update_world_quantities();
        }
    }

    // =========================================================================
    // Accumulators
    // =========================================================================

    /// Apply a force at the center of mass. Forces accumulate until the
    /// next step. Ignored for immovable bodies.
    pub fn apply_force(&mut self, force: Vector3<f64>) {
        if !self.is_static {
            self.accumulated_force += force;
        }
    }

    /// Apply a torque. Torques accumulate until the next step. Ignored
    /// for immovable bodies.
    pub fn apply_torque(&mut self, torque: Vector3<f64>) {
        if !self.is_static {
            self.accumulated_torque += torque;
        }
    }

    /// Clear accumulated force and torque.
    pub fn clear_forces(&mut self) {
        self.accumulated_force = Vector3::zeros();
        self.accumulated_torque = Vector3::zeros();
    }

    /// Accumulated force for the current step.
    #[must_use]
    pub fn accumulated_force(&self) -> Vector3<f64> {
        self.accumulated_force
    }

    /// Accumulated torque for the current step.
    #[must_use]
    pub fn accumulated_torque(&self) -> Vector3<f64> {
        self.accumulated_torque
    }

    /// Integrate this body forward by `dt`, renormalize the orientation,
    /// and refresh the cached world quantities. No-op for immovable
    /// bodies.
    fn integrate(&mut self, dt: f64) {
        if self.is_static {
            return;
        }
        rk4_step(
            &mut self.state,
            self.inv_mass,
            &self.inv_inertia_body,
            &self.accumulated_force,
            &self.accumulated_torque,
            dt,
        );
        self.update_world_quantities();
    }
}

/// The simulation world containing all bodies.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct World {
    /// Simulation configuration.
    config: SimulationConfig,
    /// Current simulation time.
    time: f64,
    /// Step counter.
    step_count: u64,
    /// All rigid bodies, indexed by [`BodyId`].
    bodies: Vec<Body>,
    /// Impulse solver, kept in sync with the configuration.
    #[cfg_attr(feature = "serde", serde(skip, default = "default_solver"))]
    solver: ImpulseSolver,
}

#[cfg(feature = "serde")]
fn default_solver() -> ImpulseSolver {
    ImpulseSolver::new(ImpulseSolverConfig::default())
}

impl Default for World {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl World {
    /// Create a new empty world with the given configuration.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        let solver = ImpulseSolver::new(ImpulseSolverConfig::new(
            config.restitution,
            config.solver_passes,
        ));
        Self {
            config,
            time: 0.0,
            step_count: 0,
            bodies: Vec::new(),
            solver,
        }
    }

    /// Get the simulation configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Get the current simulation time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Get the step count.
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Get the timestep from configuration.
    #[must_use]
    pub fn timestep(&self) -> f64 {
        self.config.timestep
    }

    /// Get the number of bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Set the gravity vector.
    pub fn set_gravity(&mut self, acceleration: Vector3<f64>) -> bounce_types::Result<()> {
        if !acceleration.iter().all(|x| x.is_finite()) {
            return Err(SimError::invalid_config("gravity must be finite"));
        }
        self.config.gravity = Gravity::from_acceleration(acceleration);
        Ok(())
    }

    /// Set the coefficient of restitution.
    pub fn set_restitution(&mut self, restitution: f64) -> bounce_types::Result<()> {
        if !restitution.is_finite() || !(0.0..=1.0).contains(&restitution) {
            return Err(SimError::InvalidRestitution(restitution));
        }
        self.config.restitution = restitution;
        self.rebuild_solver();
        Ok(())
    }

    /// Set the contact tolerance.
    pub fn set_contact_epsilon(&mut self, epsilon: f64) -> bounce_types::Result<()> {
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(SimError::invalid_config(
                "contact_epsilon must be non-negative and finite",
            ));
        }
        self.config.contact_epsilon = epsilon;
        Ok(())
    }

    /// Set the fixed timestep.
    pub fn set_timestep(&mut self, timestep: f64) -> bounce_types::Result<()> {
        if !timestep.is_finite() || timestep <= 0.0 {
            return Err(SimError::InvalidTimestep(timestep));
        }
        self.config.timestep = timestep;
        Ok(())
    }

    /// Set the solver pass count.
    pub fn set_solver_passes(&mut self, passes: usize) -> bounce_types::Result<()> {
        if passes == 0 {
            return Err(SimError::invalid_config("solver_passes must be at least 1"));
        }
        self.config.solver_passes = passes;
        self.rebuild_solver();
        Ok(())
    }

    fn rebuild_solver(&mut self) {
        self.solver = ImpulseSolver::new(ImpulseSolverConfig::new(
            self.config.restitution,
            self.config.solver_passes,
        ));
    }

    // =========================================================================
    // Body Management
    // =========================================================================

    /// Add a movable sphere of the given radius and mass density, at rest
    /// at `center`.
    ///
    /// # Errors
    ///
    /// Rejects non-positive or non-finite radius and density.
    pub fn add_sphere(
        &mut self,
        center: Point3<f64>,
        radius: f64,
        density: f64,
    ) -> bounce_types::Result<BodyId> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(SimError::InvalidRadius(radius));
        }
        if !density.is_finite() || density <= 0.0 {
            return Err(SimError::InvalidDensity(density));
        }

        let mass_props = MassProperties::sphere_from_density(radius, density);
        mass_props.validate()?;

        let id = BodyId::new(self.bodies.len());
        self.bodies.push(Body::new(
            id,
            BodyState::at_rest(center),
            mass_props,
            Shape::sphere(radius),
        ));
        Ok(id)
    }

    /// Add an immovable plane `normal · p = distance`.
    ///
    /// The normal is normalized here; a zero-length normal is rejected.
    pub fn add_plane(
        &mut self,
        normal: Vector3<f64>,
        distance: f64,
    ) -> bounce_types::Result<BodyId> {
        let length_squared = normal.norm_squared();
        if !length_squared.is_finite() || length_squared < MIN_NORMAL_LENGTH_SQUARED {
            return Err(SimError::DegenerateNormal {
                length: length_squared.sqrt(),
            });
        }

        let unit_normal = normal / length_squared.sqrt();
        let id = BodyId::new(self.bodies.len());
        // Anchor the body at the plane point closest to the origin; the
        // plane's geometry lives in the shape and never moves.
        let anchor = Point3::from(unit_normal * distance);
        self.bodies.push(Body::new(
            id,
            BodyState::at_rest(anchor),
            MassProperties::immovable(),
            Shape::plane(unit_normal, distance),
        ));
        Ok(id)
    }

    /// Get a body by ID.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.index())
    }

    /// Get a mutable reference to a body by ID.
    #[must_use]
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.index())
    }

    /// Get a body by name.
    #[must_use]
    pub fn body_by_name(&self, name: &str) -> Option<&Body> {
        self.bodies
            .iter()
            .find(|b| b.name.as_deref() == Some(name))
    }

    /// Iterate over all bodies in ID order.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    /// Iterate over all bodies mutably, in ID order.
    pub fn bodies_mut(&mut self) -> impl Iterator<Item = &mut Body> {
        self.bodies.iter_mut()
    }

    // =========================================================================
    // Forces and Integration
    // =========================================================================

    /// Apply gravity (`F = m·g`) to every movable body's accumulator.
    pub fn apply_gravity(&mut self) {
        let acceleration = self.config.gravity.acceleration;
        for body in &mut self.bodies {
            if !body.is_static {
                let force = acceleration * body.mass_props.mass;
                body.apply_force(force);
            }
        }
    }

    /// Clear all accumulated forces and torques.
    pub fn clear_forces(&mut self) {
        for body in &mut self.bodies {
            body.clear_forces();
        }
    }

    /// RK4-integrate every movable body by `dt`, renormalizing
    /// orientations and refreshing world quantities.
    pub fn integrate(&mut self, dt: f64) {
        for body in &mut self.bodies {
            body.integrate(dt);
        }
    }

    // =========================================================================
    // Contact Detection and Resolution
    // =========================================================================

    /// Detect all sphere/plane and sphere/sphere contacts.
    ///
    /// The pair sweep is O(N²) over body indices `i < j`, producing a
    /// flat, insertion-ordered contact list. Plane/plane pairs are
    /// meaningless and skipped.
    #[must_use]
    pub fn detect_contacts(&self) -> Vec<Contact> {
        let epsilon = self.config.contact_epsilon;
        let mut contacts = Vec::new();

        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                let body_i = &self.bodies[i];
                let body_j = &self.bodies[j];

                let contact = match (body_i.shape, body_j.shape) {
                    (
                        Shape::Sphere { radius: radius_i },
                        Shape::Sphere { radius: radius_j },
                    ) => Contact::sphere_sphere(
                        &body_i.state.position,
                        radius_i,
                        &body_j.state.position,
                        radius_j,
                        epsilon,
                        body_i.id,
                        body_j.id,
                    ),
                    (Shape::Sphere { radius }, Shape::Plane { normal, distance }) => {
                        Contact::sphere_plane(
                            &body_i.state.position,
                            radius,
                            &normal,
                            distance,
                            epsilon,
                            body_i.id,
                            body_j.id,
                        )
                    }
                    (Shape::Plane { normal, distance }, Shape::Sphere { radius }) => {
                        Contact::sphere_plane(
                            &body_j.state.position,
                            radius,
                            &normal,
                            distance,
                            epsilon,
                            body_j.id,
                            body_i.id,
                        )
                    }
                    (Shape::Plane { .. }, Shape::Plane { .. }) => None,
                };

                if let Some(contact) = contact {
                    contacts.push(contact);
                }
            }
        }

        contacts
    }

    /// Run the impulse solver over a contact set and commit the updated
    /// momenta to the bodies.
    pub fn resolve_contacts(&mut self, contacts: &[Contact]) -> SolveReport {
        if contacts.is_empty() {
            return SolveReport::default();
        }

        let mut views: Vec<ContactBodyView> = self
            .bodies
            .iter()
            .map(|body| {
                if body.is_static {
                    ContactBodyView::immovable(body.state.position)
                } else {
                    ContactBodyView::new(
                        body.state.position,
                        body.state.linear_momentum,
                        body.state.angular_momentum,
                        body.inv_mass,
                        body.inv_inertia_world,
                    )
                }
            })
            .collect();

        let report = self.solver.solve(contacts, &mut views);

        for (body, view) in self.bodies.iter_mut().zip(views.iter()) {
            if !body.is_static {
                body.state.linear_momentum = view.linear_momentum;
                body.state.angular_momentum = view.angular_momentum;
                body.update_world_quantities();
            }
        }

        report
    }

    // =========================================================================
    // Diagnostics and Validation
    // =========================================================================

    /// Total kinetic energy of all movable bodies.
    #[must_use]
    pub fn total_kinetic_energy(&self) -> f64 {
        self.bodies.iter().map(Body::kinetic_energy).sum()
    }

    /// Total linear momentum of all movable bodies.
    #[must_use]
    pub fn total_linear_momentum(&self) -> Vector3<f64> {
        self.bodies
            .iter()
            .filter(|b| !b.is_static)
            .map(|b| b.state.linear_momentum)
            .sum()
    }

    /// Advance the simulation clock (called by the stepper).
    pub(crate) fn advance_time(&mut self, dt: f64) {
        self.time += dt;
        self.step_count += 1;
    }

    /// Reset simulation time to zero.
    pub fn reset_time(&mut self) {
        self.time = 0.0;
        self.step_count = 0;
    }

    /// Check if simulation has reached `max_time` (if configured).
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.config.max_time.is_some_and(|max| self.time >= max)
    }

    /// Validate the configuration and every body's state.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Diverged`] naming the first body whose state
    /// contains `NaN` or `Inf`, or a configuration error.
    pub fn validate(&self) -> bounce_types::Result<()> {
        self.config.validate()?;

        for body in &self.bodies {
            if !body.state.is_finite() {
                let name = body
                    .name
                    .as_deref()
                    .map(|n| format!(" ({n})"))
                    .unwrap_or_default();
                return Err(SimError::diverged(format!(
                    "non-finite state in {}{name}",
                    body.id
                )));
            }
            body.mass_props.validate()?;
        }

        Ok(())
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

    fn unit_density_for_mass_one() -> f64 {
        // density so that a radius-1 sphere has mass exactly 1
        3.0 / (4.0 * std::f64::consts::PI)
    }

    fn world_with_floor() -> (World, BodyId) {
        let mut world = World::new(SimulationConfig::default());
        let floor = world.add_plane(Vector3::y(), 0.0).unwrap();
        (world, floor)
    }

    #[test]
    fn test_add_sphere_validation() {
        let mut world = World::default();
        assert!(world.add_sphere(Point3::origin(), -1.0, 1.0).is_err());
        assert!(world.add_sphere(Point3::origin(), 0.0, 1.0).is_err());
        assert!(world.add_sphere(Point3::origin(), 1.0, 0.0).is_err());
        assert!(world.add_sphere(Point3::origin(), 1.0, f64::NAN).is_err());
        assert!(world.add_sphere(Point3::origin(), 1.0, 1.0).is_ok());
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn test_add_plane_validation() {
        let mut world = World::default();
        let err = world.add_plane(Vector3::zeros(), 0.0);
        assert!(matches!(err, Err(SimError::DegenerateNormal { .. })));

        // Non-unit normals are normalized
        let id = world.add_plane(Vector3::new(0.0, 5.0, 0.0), 2.0).unwrap();
        let body = world.body(id).unwrap();
        let Shape::Plane { normal, .. } = body.shape() else {
            panic!("expected plane");
        };
        assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-12);
        assert!(body.is_static());
    }

    #[test]
    fn test_sphere_mass_from_density() {
        let mut world = World::default();
        let id = world
            .add_sphere(Point3::origin(), 1.0, unit_density_for_mass_one())
            .unwrap();
        let body = world.body(id).unwrap();
        assert_relative_eq!(body.mass_properties().mass, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_set_position_round_trip() {
        let mut world = World::default();
        let id = world.add_sphere(Point3::origin(), 0.5, 1.0).unwrap();

        let target = Point3::new(0.1 + 0.2, -3.7, 1e-17);
        world.body_mut(id).unwrap().set_position(target);
        // Bit-exact round trip
        assert_eq!(world.body(id).unwrap().position(), target);
    }

    #[test]
    fn test_velocity_setter_converts_momentum() {
        let mut world = World::default();
        let id = world
            .add_sphere(Point3::origin(), 1.0, unit_density_for_mass_one())
            .unwrap();

        let body = world.body_mut(id).unwrap();
        body.set_velocity(Vector3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(body.linear_momentum().x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(body.velocity().x, 2.0, epsilon = 1e-12);

        body.set_angular_velocity(Vector3::new(0.0, 0.0, 1.0));
        // L = (2/5)·m·r²·ω = 0.4
        assert_relative_eq!(body.angular_momentum().z, 0.4, epsilon = 1e-12);
        assert_relative_eq!(body.angular_velocity().z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_static_body_ignores_forces_and_setters() {
        let (mut world, floor) = world_with_floor();

        let body = world.body_mut(floor).unwrap();
        body.apply_force(Vector3::new(0.0, 100.0, 0.0));
        body.apply_torque(Vector3::new(1.0, 0.0, 0.0));
        body.set_velocity(Vector3::new(1.0, 1.0, 1.0));
        body.set_linear_momentum(Vector3::new(1.0, 1.0, 1.0));

        assert_eq!(body.accumulated_force(), Vector3::zeros());
        assert_eq!(body.accumulated_torque(), Vector3::zeros());
        assert_eq!(body.linear_momentum(), Vector3::zeros());
        assert_eq!(body.velocity(), Vector3::zeros());
    }

    #[test]
    fn test_gravity_single_tick_is_exact() {
        let mut world = World::new(SimulationConfig::default());
        let id = world
            .add_sphere(Point3::new(0.0, 10.0, 0.0), 1.0, unit_density_for_mass_one())
            .unwrap();

        let dt = world.timestep();
        world.clear_forces();
        world.apply_gravity();
        world.integrate(dt);

        let body = world.body(id).unwrap();
        // Constant-force RK4 is exact: v = -g·dt, y = 10 - ½·g·dt²
        assert_relative_eq!(body.velocity().y, -9.81 * dt, epsilon = 1e-12);
        assert_relative_eq!(
            body.position().y,
            10.0 - 0.5 * 9.81 * dt * dt,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_detect_contacts_insertion_order() {
        let mut world = World::default();
        let floor = world.add_plane(Vector3::y(), 0.0).unwrap();
        let a = world.add_sphere(Point3::new(0.0, 0.9, 0.0), 1.0, 1.0).unwrap();
        let b = world.add_sphere(Point3::new(0.5, 0.9, 0.0), 1.0, 1.0).unwrap();

        let contacts = world.detect_contacts();
        // Pairs in index order: (floor,a), (floor,b), (a,b)
        assert_eq!(contacts.len(), 3);
        assert_eq!(contacts[0].body_a, a);
        assert_eq!(contacts[0].body_b, floor);
        assert_eq!(contacts[1].body_a, b);
        assert_eq!(contacts[1].body_b, floor);
        assert_eq!(contacts[2].body_a, a);
        assert_eq!(contacts[2].body_b, b);
    }

    #[test]
    fn test_no_contacts_when_separated() {
        let mut world = World::default();
        world.add_plane(Vector3::y(), 0.0).unwrap();
        world.add_sphere(Point3::new(0.0, 5.0, 0.0), 1.0, 1.0).unwrap();
        world.add_sphere(Point3::new(10.0, 5.0, 0.0), 1.0, 1.0).unwrap();

        assert!(world.detect_contacts().is_empty());
    }

    #[test]
    fn test_resolve_contacts_commits_momenta() {
        let (mut world, _) = world_with_floor();
        let id = world
            .add_sphere(Point3::new(0.0, 0.999, 0.0), 1.0, unit_density_for_mass_one())
            .unwrap();
        world
            .body_mut(id)
            .unwrap()
            .set_velocity(Vector3::new(0.0, -4.0, 0.0));

        world.set_restitution(0.5).unwrap();
        let contacts = world.detect_contacts();
        assert_eq!(contacts.len(), 1);

        let report = world.resolve_contacts(&contacts);
        assert_eq!(report.applied, 1);
        assert_relative_eq!(world.body(id).unwrap().velocity().y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_configuration_setters_validate() {
        let mut world = World::default();
        assert!(world.set_restitution(1.5).is_err());
        assert!(world.set_restitution(0.5).is_ok());
        assert!(world.set_timestep(-1.0).is_err());
        assert!(world.set_timestep(1.0 / 240.0).is_ok());
        assert!(world.set_contact_epsilon(-1e-3).is_err());
        assert!(world.set_contact_epsilon(1e-4).is_ok());
        assert!(world.set_gravity(Vector3::new(0.0, f64::NAN, 0.0)).is_err());
        assert!(world.set_gravity(Vector3::zeros()).is_ok());
        assert!(world.set_solver_passes(0).is_err());
        assert!(world.set_solver_passes(2).is_ok());
    }

    #[test]
    fn test_diagnostics() {
        let mut world = World::new(SimulationConfig::default().zero_gravity());
        world.add_plane(Vector3::y(), 0.0).unwrap();
        let id = world
            .add_sphere(Point3::origin(), 1.0, unit_density_for_mass_one())
            .unwrap();
        world
            .body_mut(id)
            .unwrap()
            .set_velocity(Vector3::new(3.0, 0.0, 0.0));

        assert_relative_eq!(world.total_kinetic_energy(), 4.5, epsilon = 1e-12);
        assert_relative_eq!(
            world.total_linear_momentum(),
            Vector3::new(3.0, 0.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_validate_names_diverged_body() {
        let mut world = World::default();
        let id = world.add_sphere(Point3::origin(), 1.0, 1.0).unwrap();
        world.body_mut(id).unwrap().name = Some("runaway".into());
        world.body_mut(id).unwrap().state.linear_momentum.x = f64::INFINITY;

        let err = world.validate().unwrap_err();
        assert!(err.is_diverged());
        assert!(err.to_string().contains("Body(0)"));
        assert!(err.to_string().contains("runaway"));
    }

    #[test]
    fn test_body_by_name() {
        let mut world = World::default();
        let id = world.add_sphere(Point3::origin(), 1.0, 1.0).unwrap();
        world.body_mut(id).unwrap().name = Some("ball".into());

        assert_eq!(world.body_by_name("ball").unwrap().id, id);
        assert!(world.body_by_name("missing").is_none());
    }

    #[test]
    fn test_kinetic_energy_includes_rotation() {
        let mut world = World::default();
        let id = world
            .add_sphere(Point3::origin(), 1.0, unit_density_for_mass_one())
            .unwrap();
        let body = world.body_mut(id).unwrap();
        body.set_angular_velocity(Vector3::new(0.0, 0.0, 2.0));

        // ½·J·ω² = ½·0.4·4 = 0.8
        assert_relative_eq!(body.kinetic_energy(), 0.8, epsilon = 1e-12);
    }
}
