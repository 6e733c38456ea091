//! Contact records and narrow-phase predicates.
//!
//! A [`Contact`] is an ephemeral record describing one touching or
//! penetrating shape pair for a single tick. Contacts are produced in
//! insertion order by the world's pair sweep and consumed by the solver
//! in the same order; they are never persisted across ticks.

use bounce_types::BodyId;
use nalgebra::{Point3, Vector3};

/// Axis substituted when two sphere centers coincide and no contact
/// normal can be derived from geometry.
const DEGENERATE_AXIS: Vector3<f64> = Vector3::new(1.0, 0.0, 0.0);

/// A single contact between two bodies for the current tick.
///
/// The unit `normal` points from body B toward body A; `penetration` is
/// the overlap depth, clamped non-negative. Grazing separations within
/// the contact tolerance produce contacts with zero penetration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// The body the impulse pushes along `+normal` (a sphere).
    pub body_a: BodyId,
    /// The body the impulse pushes along `−normal` (a sphere or a plane).
    pub body_b: BodyId,
    /// Contact point in world coordinates.
    pub point: Point3<f64>,
    /// Unit contact normal, pointing from B toward A.
    pub normal: Vector3<f64>,
    /// Penetration depth, `≥ 0`.
    pub penetration: f64,
}

impl Contact {
    /// Sphere-versus-plane contact test.
    ///
    /// `center`/`radius` describe the sphere (body A); the plane (body B)
    /// is `normal · p = distance`. With `s = n̂·c − d − r` the signed
    /// surface separation, a contact is emitted when `s < epsilon`, with
    /// the contact point at the plane's closest point to the center and
    /// penetration `max(0, −s)`.
    #[must_use]
    pub fn sphere_plane(
        center: &Point3<f64>,
        radius: f64,
        normal: &Vector3<f64>,
        distance: f64,
        epsilon: f64,
        sphere: BodyId,
        plane: BodyId,
    ) -> Option<Self> {
        let center_height = normal.dot(&center.coords) - distance;
        let separation = center_height - radius;

        if separation >= epsilon {
            return None;
        }

        Some(Self {
            body_a: sphere,
            body_b: plane,
            point: center - normal * center_height,
            normal: *normal,
            penetration: (-separation).max(0.0),
        })
    }

    /// Sphere-versus-sphere contact test.
    ///
    /// A contact is emitted when the center distance `D` satisfies
    /// `D < r_a + r_b + epsilon`, with the normal along the center line
    /// from B toward A and the contact point on A's surface. Coincident
    /// centers (`D ≈ 0`) cannot define a normal; the world +X axis is
    /// substituted with full penetration `r_a + r_b`, and the next ticks
    /// resolve the overlap.
    #[must_use]
    pub fn sphere_sphere(
        center_a: &Point3<f64>,
        radius_a: f64,
        center_b: &Point3<f64>,
        radius_b: f64,
        epsilon: f64,
        id_a: BodyId,
        id_b: BodyId,
    ) -> Option<Self> {
        let delta = center_a - center_b;
        let dist = delta.norm();
        let radius_sum = radius_a + radius_b;

        if dist >= radius_sum + epsilon {
            return None;
        }

        if dist <= f64::EPSILON * radius_sum {
            tracing::warn!(
                body_a = id_a.index(),
                body_b = id_b.index(),
                "coincident sphere centers, substituting +X contact normal"
            );
            return Some(Self {
                body_a: id_a,
                body_b: id_b,
                point: *center_a,
                normal: DEGENERATE_AXIS,
                penetration: radius_sum,
            });
        }

        let normal = delta / dist;
        Some(Self {
            body_a: id_a,
            body_b: id_b,
            point: center_a - normal * radius_a,
            normal,
            penetration: (radius_sum - dist).max(0.0),
        })
    }

    /// Normal relative velocity of the contact given both bodies'
    /// kinematics: `v_n = n̂ · (v_A + ω_A×r_A − v_B − ω_B×r_B)`.
    ///
    /// Negative means the bodies are closing along the normal.
    #[must_use]
    pub fn normal_velocity(
        &self,
        velocity_a: &Vector3<f64>,
        angular_velocity_a: &Vector3<f64>,
        position_a: &Point3<f64>,
        velocity_b: &Vector3<f64>,
        angular_velocity_b: &Vector3<f64>,
        position_b: &Point3<f64>,
    ) -> f64 {
        let arm_a = self.point - position_a;
        let arm_b = self.point - position_b;
        let point_velocity_a = velocity_a + angular_velocity_a.cross(&arm_a);
        let point_velocity_b = velocity_b + angular_velocity_b.cross(&arm_b);
        self.normal.dot(&(point_velocity_a - point_velocity_b))
    }

    /// Check if the contact is closing for the given relative kinematics.
    #[must_use]
    pub fn is_closing(
        &self,
        velocity_a: &Vector3<f64>,
        angular_velocity_a: &Vector3<f64>,
        position_a: &Point3<f64>,
        velocity_b: &Vector3<f64>,
        angular_velocity_b: &Vector3<f64>,
        position_b: &Point3<f64>,
    ) -> bool {
        self.normal_velocity(
            velocity_a,
            angular_velocity_a,
            position_a,
            velocity_b,
            angular_velocity_b,
            position_b,
        ) < 0.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPS: f64 = 1e-3;

    fn a() -> BodyId {
        BodyId::new(1)
    }

    fn b() -> BodyId {
        BodyId::new(2)
    }

    #[test]
    fn test_sphere_plane_clear_separation() {
        let contact = Contact::sphere_plane(
            &Point3::new(0.0, 5.0, 0.0),
            1.0,
            &Vector3::y(),
            0.0,
            EPS,
            a(),
            b(),
        );
        assert!(contact.is_none());
    }

    #[test]
    fn test_sphere_plane_grazing_within_tolerance() {
        // Surface 0.5 mm above the plane: inside the tolerance, zero depth
        let contact = Contact::sphere_plane(
            &Point3::new(0.0, 1.0005, 0.0),
            1.0,
            &Vector3::y(),
            0.0,
            EPS,
            a(),
            b(),
        )
        .unwrap();

        assert_relative_eq!(contact.penetration, 0.0, epsilon = 1e-12);
        assert_eq!(contact.normal, Vector3::y());
    }

    #[test]
    fn test_sphere_plane_penetrating() {
        let contact = Contact::sphere_plane(
            &Point3::new(2.0, 0.9, -1.0),
            1.0,
            &Vector3::y(),
            0.0,
            EPS,
            a(),
            b(),
        )
        .unwrap();

        assert_relative_eq!(contact.penetration, 0.1, epsilon = 1e-12);
        // Closest plane point to the center
        assert_relative_eq!(contact.point.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(contact.point.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(contact.point.z, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_plane_offset_plane() {
        // Floor raised to y = 2
        let contact = Contact::sphere_plane(
            &Point3::new(0.0, 2.95, 0.0),
            1.0,
            &Vector3::y(),
            2.0,
            EPS,
            a(),
            b(),
        )
        .unwrap();

        assert_relative_eq!(contact.penetration, 0.05, epsilon = 1e-12);
        assert_relative_eq!(contact.point.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_sphere_separated() {
        let contact = Contact::sphere_sphere(
            &Point3::new(0.0, 0.0, 0.0),
            1.0,
            &Point3::new(3.0, 0.0, 0.0),
            1.0,
            EPS,
            a(),
            b(),
        );
        assert!(contact.is_none());
    }

    #[test]
    fn test_sphere_sphere_overlapping() {
        let contact = Contact::sphere_sphere(
            &Point3::new(0.0, 0.0, 0.0),
            1.0,
            &Point3::new(1.5, 0.0, 0.0),
            1.0,
            EPS,
            a(),
            b(),
        )
        .unwrap();

        assert_relative_eq!(contact.penetration, 0.5, epsilon = 1e-12);
        // Normal points from B toward A: −X
        assert_relative_eq!(contact.normal.x, -1.0, epsilon = 1e-12);
        // Contact point on A's surface toward B
        assert_relative_eq!(contact.point.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_sphere_coincident_centers() {
        let contact = Contact::sphere_sphere(
            &Point3::new(0.0, 0.0, 0.0),
            1.0,
            &Point3::new(0.0, 0.0, 0.0),
            1.0,
            EPS,
            a(),
            b(),
        )
        .unwrap();

        assert_relative_eq!(contact.penetration, 2.0, epsilon = 1e-12);
        assert_relative_eq!(contact.normal.norm(), 1.0, epsilon = 1e-12);
        assert_eq!(contact.normal, Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_normal_velocity_sign() {
        // Sphere A directly above the floor contact, falling
        let contact = Contact::sphere_plane(
            &Point3::new(0.0, 1.0, 0.0),
            1.0,
            &Vector3::y(),
            0.0,
            EPS,
            a(),
            b(),
        )
        .unwrap();

        let falling = Vector3::new(0.0, -2.0, 0.0);
        let zero = Vector3::zeros();
        let pos_a = Point3::new(0.0, 1.0, 0.0);
        let pos_b = Point3::origin();

        let v_n = contact.normal_velocity(&falling, &zero, &pos_a, &zero, &zero, &pos_b);
        assert_relative_eq!(v_n, -2.0, epsilon = 1e-12);
        assert!(contact.is_closing(&falling, &zero, &pos_a, &zero, &zero, &pos_b));

        let rising = Vector3::new(0.0, 2.0, 0.0);
        assert!(!contact.is_closing(&rising, &zero, &pos_a, &zero, &zero, &pos_b));
    }

    #[test]
    fn test_normal_velocity_includes_spin() {
        // A sphere spinning about Z touching the floor: the contact point
        // moves tangentially, which has no normal component
        let contact = Contact::sphere_plane(
            &Point3::new(0.0, 1.0, 0.0),
            1.0,
            &Vector3::y(),
            0.0,
            EPS,
            a(),
            b(),
        )
        .unwrap();

        let zero = Vector3::zeros();
        let spin = Vector3::new(0.0, 0.0, 3.0);
        let pos_a = Point3::new(0.0, 1.0, 0.0);
        let pos_b = Point3::origin();

        let v_n = contact.normal_velocity(&zero, &spin, &pos_a, &zero, &zero, &pos_b);
        assert_relative_eq!(v_n, 0.0, epsilon = 1e-12);
    }
}
