//! Rigid body state and mass property types.
//!
//! A rigid body is described by 13 scalar state variables: 3 position,
//! 4 orientation (unit quaternion), 3 linear momentum, 3 angular momentum.
//! Mass and inertia are constant over a body's lifetime.

use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable identifier for a rigid body.
///
/// Body ids are indices into the engine's contiguous body storage; they
/// remain valid for the lifetime of the simulation. External code should
/// hold `BodyId`s rather than references into the body list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub usize);

impl BodyId {
    /// Create a new body ID.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the underlying index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for BodyId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// Complete dynamic state of a rigid body: `(x, q, P, L)`.
///
/// Velocities are *derived*, not stored: `v = P/m` and `ω = J⁻¹·L` with
/// the world inertia evaluated from the current orientation. The engine
/// recomputes them whenever the state changes.
///
/// # Example
///
/// ```
/// use bounce_types::BodyState;
/// use nalgebra::{Point3, Vector3};
///
/// let state = BodyState::at_rest(Point3::new(0.0, 5.0, 0.0));
/// assert_eq!(state.position.y, 5.0);
/// assert_eq!(state.linear_momentum, Vector3::zeros());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyState {
    /// World position of the center of mass.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion. `|q| = 1` is maintained by the
    /// integrator through renormalization.
    pub orientation: UnitQuaternion<f64>,
    /// Linear momentum `P` in world coordinates (kg·m/s).
    pub linear_momentum: Vector3<f64>,
    /// Angular momentum `L` in world coordinates (kg·m²/s).
    pub angular_momentum: Vector3<f64>,
}

impl Default for BodyState {
    fn default() -> Self {
        Self::at_rest(Point3::origin())
    }
}

impl BodyState {
    /// Create a state with explicit position, orientation, and momenta.
    #[must_use]
    pub const fn new(
        position: Point3<f64>,
        orientation: UnitQuaternion<f64>,
        linear_momentum: Vector3<f64>,
        angular_momentum: Vector3<f64>,
    ) -> Self {
        Self {
            position,
            orientation,
            linear_momentum,
            angular_momentum,
        }
    }

    /// Create a state at rest (zero momenta, identity orientation).
    #[must_use]
    pub fn at_rest(position: Point3<f64>) -> Self {
        Self {
            position,
            orientation: UnitQuaternion::identity(),
            linear_momentum: Vector3::zeros(),
            angular_momentum: Vector3::zeros(),
        }
    }

    /// Create a state at the origin, at rest.
    #[must_use]
    pub fn origin() -> Self {
        Self::default()
    }

    /// Check whether every state component is finite (no `NaN` or `Inf`).
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.orientation.coords.iter().all(|x| x.is_finite())
            && self.linear_momentum.iter().all(|x| x.is_finite())
            && self.angular_momentum.iter().all(|x| x.is_finite())
    }

    /// How far the orientation quaternion has drifted from unit length.
    #[must_use]
    pub fn orientation_drift(&self) -> f64 {
        (self.orientation.as_ref().norm() - 1.0).abs()
    }
}

/// Mass properties of a rigid body: mass and body-frame inertia tensor.
///
/// An immovable body is modeled as `m = +∞` with `1/m = 0` and `J⁻¹ = 0`;
/// see [`MassProperties::immovable`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassProperties {
    /// Total mass in kg. `+∞` for immovable bodies.
    pub mass: f64,
    /// Body-frame inertia tensor about the center of mass (kg·m²).
    /// Symmetric positive-definite for movable bodies.
    pub inertia: Matrix3<f64>,
}

impl MassProperties {
    /// Create mass properties with explicit mass and inertia tensor.
    #[must_use]
    pub const fn new(mass: f64, inertia: Matrix3<f64>) -> Self {
        Self { mass, inertia }
    }

    /// Mass properties for a solid sphere of the given radius and density.
    ///
    /// `m = ρ · (4/3)·π·r³` and `J = (2/5)·m·r² · I`.
    #[must_use]
    pub fn sphere_from_density(radius: f64, density: f64) -> Self {
        let volume = 4.0 * std::f64::consts::PI * radius.powi(3) / 3.0;
        let mass = density * volume;
        Self::sphere(mass, radius)
    }

    /// Mass properties for a solid sphere of the given mass and radius.
    ///
    /// Inertia of a solid sphere: `J = (2/5) · m · r² · I`.
    #[must_use]
    pub fn sphere(mass: f64, radius: f64) -> Self {
        let i = 0.4 * mass * radius * radius;
        Self {
            mass,
            inertia: Matrix3::from_diagonal(&Vector3::new(i, i, i)),
        }
    }

    /// Mass properties for an immovable body (infinite mass).
    ///
    /// `inverse_mass()` and `inverse_inertia()` both return zero, so
    /// forces and impulses have no effect.
    #[must_use]
    pub fn immovable() -> Self {
        Self {
            mass: f64::INFINITY,
            inertia: Matrix3::zeros(),
        }
    }

    /// Get the inverse mass (`0` for immovable bodies).
    #[must_use]
    pub fn inverse_mass(&self) -> f64 {
        if self.mass.is_infinite() {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Get the body-frame inverse inertia tensor.
    ///
    /// Returns the zero matrix for immovable bodies and `None` when a
    /// movable body's inertia is singular (invalid configuration).
    #[must_use]
    pub fn inverse_inertia(&self) -> Option<Matrix3<f64>> {
        if self.is_immovable() {
            return Some(Matrix3::zeros());
        }
        self.inertia.try_inverse()
    }

    /// Check if this represents an immovable body.
    #[must_use]
    pub fn is_immovable(&self) -> bool {
        self.mass.is_infinite()
    }

    /// Validate that the mass properties are physically meaningful.
    ///
    /// Movable bodies need a strictly positive finite mass and a
    /// positive-definite inertia tensor.
    pub fn validate(&self) -> crate::Result<()> {
        if self.is_immovable() {
            return Ok(());
        }

        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(crate::SimError::invalid_mass(format!(
                "mass must be positive and finite, got {}",
                self.mass
            )));
        }

        if self.inertia.iter().any(|x| !x.is_finite()) {
            return Err(crate::SimError::invalid_mass(
                "inertia tensor must be finite",
            ));
        }

        let eigenvalues = self.inertia.symmetric_eigenvalues();
        if eigenvalues.iter().any(|&e| e <= 0.0) {
            return Err(crate::SimError::invalid_mass(
                "inertia tensor must be positive-definite",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_body_id() {
        let id = BodyId::new(7);
        assert_eq!(id.index(), 7);
        assert_eq!(id.to_string(), "Body(7)");

        let id2: BodyId = 7.into();
        assert_eq!(id, id2);
    }

    #[test]
    fn test_state_at_rest() {
        let state = BodyState::at_rest(Point3::new(1.0, 2.0, 3.0));
        assert_eq!(state.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(state.linear_momentum, Vector3::zeros());
        assert_eq!(state.angular_momentum, Vector3::zeros());
        assert!(state.is_finite());
        assert!(state.orientation_drift() < 1e-15);
    }

    #[test]
    fn test_state_detects_nan() {
        let mut state = BodyState::origin();
        state.linear_momentum.x = f64::NAN;
        assert!(!state.is_finite());
    }

    #[test]
    fn test_sphere_inertia() {
        let props = MassProperties::sphere(1.0, 1.0);
        // (2/5) · 1 · 1²
        assert_relative_eq!(props.inertia[(0, 0)], 0.4, epsilon = 1e-12);
        assert_relative_eq!(props.inertia[(1, 1)], 0.4, epsilon = 1e-12);
        assert_relative_eq!(props.inertia[(2, 2)], 0.4, epsilon = 1e-12);
        assert!(props.validate().is_ok());
    }

    #[test]
    fn test_sphere_from_density() {
        let props = MassProperties::sphere_from_density(2.0, 3.0);
        let expected_mass = 3.0 * 4.0 * std::f64::consts::PI * 8.0 / 3.0;
        assert_relative_eq!(props.mass, expected_mass, epsilon = 1e-9);

        let expected_inertia = 0.4 * expected_mass * 4.0;
        assert_relative_eq!(props.inertia[(0, 0)], expected_inertia, epsilon = 1e-9);
    }

    #[test]
    fn test_immovable() {
        let props = MassProperties::immovable();
        assert!(props.is_immovable());
        assert_eq!(props.inverse_mass(), 0.0);
        assert_eq!(props.inverse_inertia(), Some(Matrix3::zeros()));
        assert!(props.validate().is_ok());
    }

    #[test]
    fn test_inverse_inertia_sphere() {
        let props = MassProperties::sphere(2.0, 0.5);
        let inv = props.inverse_inertia().unwrap();
        let i = 0.4 * 2.0 * 0.25;
        assert_relative_eq!(inv[(0, 0)], 1.0 / i, epsilon = 1e-12);
    }

    #[test]
    fn test_validation_rejects_bad_mass() {
        let zero = MassProperties::new(0.0, Matrix3::identity());
        assert!(zero.validate().is_err());

        let negative = MassProperties::new(-1.0, Matrix3::identity());
        assert!(negative.validate().is_err());

        let singular = MassProperties::new(1.0, Matrix3::zeros());
        assert!(singular.validate().is_err());
    }
}
