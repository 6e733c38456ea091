//! Fourth-order Runge-Kutta integration of rigid-body state.
//!
//! Each movable body advances by the fixed timestep under the ODE
//!
//! ```text
//! ẋ = v = P/m
//! q̇ = ½ · ω_quat · q        (ω_quat = (0, ω))
//! Ṗ = F
//! L̇ = τ
//! ```
//!
//! with `ω = J⁻¹·L` recomputed at every stage from that stage's
//! orientation (`J⁻¹ = R · J_body⁻¹ · Rᵀ`). Force and torque are held
//! piecewise-constant across the step: they are read once from the body's
//! accumulators at step start, which matches a driver that re-applies
//! gravity each tick.
//!
//! The classical scheme:
//!
//! ```text
//! k1 = f(s)
//! k2 = f(s + (Δt/2)·k1)
//! k3 = f(s + (Δt/2)·k2)
//! k4 = f(s + Δt·k3)
//! s' = s + (Δt/6)·(k1 + 2k2 + 2k3 + k4)
//! ```
//!
//! Stage orientations and the committed orientation are renormalized, so
//! quaternion drift never accumulates.

use bounce_types::BodyState;
use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

/// Time derivative of the 13-scalar body state.
#[derive(Debug, Clone, Copy)]
struct Derivative {
    /// ẋ = P/m
    velocity: Vector3<f64>,
    /// q̇ = ½·(0, ω)·q, as a raw (non-unit) quaternion
    spin: Quaternion<f64>,
    /// Ṗ = F
    force: Vector3<f64>,
    /// L̇ = τ
    torque: Vector3<f64>,
}

/// Evaluate the derivative at a (possibly intermediate) stage state.
/// Position does not enter: `ẋ` depends only on momentum.
fn evaluate(
    orientation: &UnitQuaternion<f64>,
    linear_momentum: &Vector3<f64>,
    angular_momentum: &Vector3<f64>,
    inv_mass: f64,
    inv_inertia_body: &Matrix3<f64>,
    force: &Vector3<f64>,
    torque: &Vector3<f64>,
) -> Derivative {
    let rotation = orientation.to_rotation_matrix();
    let inv_inertia_world = rotation.matrix() * inv_inertia_body * rotation.matrix().transpose();
    let omega = inv_inertia_world * angular_momentum;

    let omega_quat = Quaternion::from_parts(0.0, omega);
    let spin = (omega_quat * orientation.as_ref()) * 0.5;

    Derivative {
        velocity: linear_momentum * inv_mass,
        spin,
        force: *force,
        torque: *torque,
    }
}

/// Advance one intermediate stage: `s + h·k`, with the stage orientation
/// renormalized so the next derivative evaluation sees a unit quaternion.
/// Stage positions are never needed (no derivative depends on position),
/// so only the orientation and momenta are produced.
fn stage(
    base: &BodyState,
    derivative: &Derivative,
    h: f64,
) -> (UnitQuaternion<f64>, Vector3<f64>, Vector3<f64>) {
    let orientation =
        UnitQuaternion::from_quaternion(base.orientation.as_ref() + derivative.spin * h);
    let linear_momentum = base.linear_momentum + derivative.force * h;
    let angular_momentum = base.angular_momentum + derivative.torque * h;
    (orientation, linear_momentum, angular_momentum)
}

/// Integrate a movable body's state forward by `dt` using classical RK4.
///
/// `force` and `torque` are the accumulator values at step start, treated
/// as constant over the step. The committed orientation is renormalized.
/// Immovable bodies must be skipped by the caller.
pub fn rk4_step(
    state: &mut BodyState,
    inv_mass: f64,
    inv_inertia_body: &Matrix3<f64>,
    force: &Vector3<f64>,
    torque: &Vector3<f64>,
    dt: f64,
) {
    let half_dt = 0.5 * dt;

    let k1 = evaluate(
        &state.orientation,
        &state.linear_momentum,
        &state.angular_momentum,
        inv_mass,
        inv_inertia_body,
        force,
        torque,
    );

    let (q2, lm2, am2) = stage(state, &k1, half_dt);
    let k2 = evaluate(&q2, &lm2, &am2, inv_mass, inv_inertia_body, force, torque);

    let (q3, lm3, am3) = stage(state, &k2, half_dt);
    let k3 = evaluate(&q3, &lm3, &am3, inv_mass, inv_inertia_body, force, torque);

    let (q4, lm4, am4) = stage(state, &k3, dt);
    let k4 = evaluate(&q4, &lm4, &am4, inv_mass, inv_inertia_body, force, torque);

    let sixth_dt = dt / 6.0;

    state.position += (k1.velocity + 2.0 * (k2.velocity + k3.velocity) + k4.velocity) * sixth_dt;
    state.linear_momentum += (k1.force + 2.0 * (k2.force + k3.force) + k4.force) * sixth_dt;
    state.angular_momentum +=
        (k1.torque + 2.0 * (k2.torque + k3.torque) + k4.torque) * sixth_dt;

    let combined_spin = k1.spin + (k2.spin + k3.spin) * 2.0 + k4.spin;
    state.orientation =
        UnitQuaternion::from_quaternion(state.orientation.as_ref() + combined_spin * sixth_dt);
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
    use nalgebra::Point3;

    fn sphere_props() -> (f64, Matrix3<f64>) {
        let props = MassProperties::sphere(2.0, 0.5);
        (props.inverse_mass(), props.inverse_inertia().unwrap())
    }

    #[test]
    fn test_constant_velocity_translation() {
        let (inv_mass, inv_inertia) = sphere_props();
        let mut state = BodyState::at_rest(Point3::origin());
        state.linear_momentum = Vector3::new(2.0, 0.0, 0.0); // v = 1 m/s

        rk4_step(
            &mut state,
            inv_mass,
            &inv_inertia,
            &Vector3::zeros(),
            &Vector3::zeros(),
            1.0,
        );

        assert_relative_eq!(state.position.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(state.linear_momentum.x, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_force_is_exact() {
        // With constant force the trajectory is quadratic in t, which RK4
        // reproduces exactly: x = ½·(F/m)·t², P = F·t.
        let (inv_mass, inv_inertia) = sphere_props();
        let mut state = BodyState::at_rest(Point3::origin());
        let force = Vector3::new(0.0, -9.81 * 2.0, 0.0); // F = m·g

        rk4_step(
            &mut state,
            inv_mass,
            &inv_inertia,
            &force,
            &Vector3::zeros(),
            0.5,
        );

        assert_relative_eq!(state.position.y, -0.5 * 9.81 * 0.25, epsilon = 1e-12);
        assert_relative_eq!(state.linear_momentum.y, force.y * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_free_spin_preserves_unit_quaternion() {
        let (inv_mass, inv_inertia) = sphere_props();
        let mut state = BodyState::at_rest(Point3::origin());
        state.angular_momentum = Vector3::new(0.3, -0.2, 0.9);

        for _ in 0..2000 {
            rk4_step(
                &mut state,
                inv_mass,
                &inv_inertia,
                &Vector3::zeros(),
                &Vector3::zeros(),
                1.0 / 120.0,
            );
        }

        assert!(state.orientation_drift() < 1e-9);
        // Torque-free motion preserves L
        assert_relative_eq!(
            state.angular_momentum,
            Vector3::new(0.3, -0.2, 0.9),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_spin_rotation_angle() {
        // A sphere's inertia is isotropic, so ω is constant and the body
        // rotates by |ω|·t about the fixed axis.
        let props = MassProperties::sphere(1.0, 1.0);
        let inv_mass = props.inverse_mass();
        let inv_inertia = props.inverse_inertia().unwrap();
        let inertia_scalar = props.inertia[(0, 0)];

        let omega = 0.5; // rad/s about +Z
        let mut state = BodyState::at_rest(Point3::origin());
        state.angular_momentum = Vector3::new(0.0, 0.0, inertia_scalar * omega);

        let dt = 1.0 / 240.0;
        let steps = 480; // 2 seconds
        for _ in 0..steps {
            rk4_step(
                &mut state,
                inv_mass,
                &inv_inertia,
                &Vector3::zeros(),
                &Vector3::zeros(),
                dt,
            );
        }

        let expected_angle = omega * dt * steps as f64;
        assert_relative_eq!(state.orientation.angle(), expected_angle, epsilon = 1e-6);
        let axis = state.orientation.axis().unwrap();
        assert_relative_eq!(axis.z.abs(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_torque_grows_angular_momentum_linearly() {
        let (inv_mass, inv_inertia) = sphere_props();
        let mut state = BodyState::at_rest(Point3::origin());
        let torque = Vector3::new(0.0, 0.4, 0.0);

        rk4_step(
            &mut state,
            inv_mass,
            &inv_inertia,
            &Vector3::zeros(),
            &torque,
            0.25,
        );

        assert_relative_eq!(state.angular_momentum.y, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_determinism() {
        let (inv_mass, inv_inertia) = sphere_props();
        let force = Vector3::new(0.1, -9.81, 0.2);
        let torque = Vector3::new(0.0, 0.05, 0.0);

        let mut a = BodyState::at_rest(Point3::new(0.0, 5.0, 0.0));
        a.linear_momentum = Vector3::new(1.0, 0.0, -1.0);
        a.angular_momentum = Vector3::new(0.0, 0.2, 0.0);
        let mut b = a;

        for _ in 0..500 {
            rk4_step(&mut a, inv_mass, &inv_inertia, &force, &torque, 1.0 / 120.0);
            rk4_step(&mut b, inv_mass, &inv_inertia, &force, &torque, 1.0 / 120.0);
        }

        // Bitwise identical
        assert_eq!(a, b);
    }
}
