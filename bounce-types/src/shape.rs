//! Collision shapes.
//!
//! The engine supports exactly two shapes: spheres attached to movable
//! bodies, and infinite planes (half-space boundaries) attached to
//! immovable bodies. A shape exposes only what contact detection needs.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Collision geometry attached to a rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    /// A sphere centered on the body's position.
    Sphere {
        /// Sphere radius in meters. Immutable after construction.
        radius: f64,
    },
    /// An infinite plane with unit normal and distance from the origin.
    /// Points on the plane satisfy `normal · p = distance`; the signed
    /// distance of a point is positive on the side the normal faces.
    Plane {
        /// Unit normal vector of the plane.
        normal: Vector3<f64>,
        /// Distance from the origin along the normal.
        distance: f64,
    },
}

impl Shape {
    /// Create a sphere shape.
    #[must_use]
    pub fn sphere(radius: f64) -> Self {
        Self::Sphere { radius }
    }

    /// Create a plane with the given normal and distance.
    ///
    /// The normal is normalized here; rejecting zero-length normals is
    /// the responsibility of the world constructor.
    #[must_use]
    pub fn plane(normal: Vector3<f64>, distance: f64) -> Self {
        Self::Plane {
            normal: normal.normalize(),
            distance,
        }
    }

    /// Create a horizontal floor plane (+Y normal) at the given height.
    #[must_use]
    pub fn ground_plane(height: f64) -> Self {
        Self::Plane {
            normal: Vector3::y(),
            distance: height,
        }
    }

    /// World-space sphere data `(center, radius)` for a body at `position`.
    ///
    /// Returns `None` for planes.
    #[must_use]
    pub fn world_sphere(&self, position: &Point3<f64>) -> Option<(Point3<f64>, f64)> {
        match self {
            Self::Sphere { radius } => Some((*position, *radius)),
            Self::Plane { .. } => None,
        }
    }

    /// Signed distance from a point to the plane (`normal · p − distance`).
    ///
    /// Returns `None` for spheres.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3<f64>) -> Option<f64> {
        match self {
            Self::Sphere { .. } => None,
            Self::Plane { normal, distance } => Some(normal.dot(&point.coords) - distance),
        }
    }

    /// Check if this shape is a sphere.
    #[must_use]
    pub fn is_sphere(&self) -> bool {
        matches!(self, Self::Sphere { .. })
    }

    /// Check if this shape is a plane.
    #[must_use]
    pub fn is_plane(&self) -> bool {
        matches!(self, Self::Plane { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sphere_world_data() {
        let shape = Shape::sphere(0.5);
        let (center, radius) = shape.world_sphere(&Point3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(center, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(radius, 0.5);
        assert!(shape.signed_distance(&Point3::origin()).is_none());
    }

    #[test]
    fn test_plane_normalizes() {
        let shape = Shape::plane(Vector3::new(0.0, 2.0, 0.0), 1.0);
        let Shape::Plane { normal, distance } = shape else {
            panic!("expected plane");
        };
        assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-12);
        assert_eq!(distance, 1.0);
    }

    #[test]
    fn test_plane_signed_distance() {
        let floor = Shape::ground_plane(0.0);
        assert_eq!(
            floor.signed_distance(&Point3::new(3.0, 2.0, -1.0)),
            Some(2.0)
        );
        assert_eq!(
            floor.signed_distance(&Point3::new(0.0, -0.5, 0.0)),
            Some(-0.5)
        );
        assert!(floor.world_sphere(&Point3::origin()).is_none());
    }

    #[test]
    fn test_tilted_plane_distance() {
        // Plane x + y = sqrt(2) · d with d = 0 through the origin
        let shape = Shape::plane(Vector3::new(1.0, 1.0, 0.0), 0.0);
        let d = shape.signed_distance(&Point3::new(1.0, 1.0, 0.0)).unwrap();
        assert_relative_eq!(d, std::f64::consts::SQRT_2, epsilon = 1e-12);
    }
}
