//! A single facet resolved to its corner positions.

use nalgebra::{Point3, Vector3};

/// Three corners in counter-clockwise order seen from outside the part.
///
/// ```
/// use mesh_types::{Point3, Triangle};
///
/// let facet = Triangle::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(2.0, 0.0, 0.0),
///     Point3::new(0.0, 2.0, 0.0),
/// );
/// assert!((facet.area() - 2.0).abs() < 1e-12);
/// assert_eq!(facet.normal().map(|n| n.z), Some(1.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Corner the two edges start from.
    pub v0: Point3<f64>,
    /// Second corner.
    pub v1: Point3<f64>,
    /// Third corner.
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Facet from its three corners.
    #[inline]
    #[must_use]
    pub const fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    // Length is twice the area; direction follows the winding.
    fn edge_cross(&self) -> Vector3<f64> {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Outward unit normal. Slivers and collapsed facets have none.
    #[must_use]
    pub fn normal(&self) -> Option<Vector3<f64>> {
        self.edge_cross().try_normalize(f64::EPSILON)
    }

    /// Facet area.
    #[must_use]
    pub fn area(&self) -> f64 {
        0.5 * self.edge_cross().norm()
    }

    /// Mean of the corners.
    #[must_use]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    /// Corners in winding order.
    #[must_use]
    pub const fn vertices(&self) -> [Point3<f64>; 3] {
        [self.v0, self.v1, self.v2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn collinear_corners_have_no_normal() {
        let facet = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(3.0, 3.0, 3.0),
        );
        assert!(facet.normal().is_none());
        assert_relative_eq!(facet.area(), 0.0);
    }

    #[test]
    fn reversed_winding_points_inward() {
        let facet = Triangle::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(0.0, 4.0, 5.0),
            Point3::new(4.0, 0.0, 5.0),
        );
        let normal = facet.normal().unwrap_or_else(Vector3::zeros);
        assert_relative_eq!(normal.z, -1.0);
        assert_relative_eq!(facet.area(), 8.0);
    }

    #[test]
    fn centroid_is_the_corner_mean() {
        let facet = Triangle::new(
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
            Point3::new(0.0, 0.0, 3.0),
        );
        assert_relative_eq!(facet.centroid(), Point3::new(1.0, 1.0, 1.0));
    }
}
