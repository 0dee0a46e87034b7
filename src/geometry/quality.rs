//! Triangle and mesh quality measures.
//!
//! - **Minimum angle**: the quantity the refinement bound is stated in.
//! - **Radius-edge ratio**: circumradius over shortest edge. Ruppert's
//!   algorithm splits triangles whose ratio exceeds `1 / (2 sin θ)`, which is
//!   equivalent to a minimum angle below `θ`.
//! - **Radius ratio**: circumradius over twice the inradius; 1 for an
//!   equilateral triangle and unbounded for slivers.
//!
//! # References
//!
//! - Shewchuk, J.R. "What Is a Good Linear Element? Interpolation, Conditioning,
//!   Anisotropy, and Quality Measures" (2002)
//! - Ruppert, J. "A Delaunay Refinement Algorithm for Quality 2-Dimensional
//!   Mesh Generation" *Journal of Algorithms* 18.3 (1995): 548-585

use serde::{Deserialize, Serialize};

use crate::core::mesh::Mesh;
use crate::geometry::kernel::Kernel;
use crate::geometry::point::Point;
use crate::geometry::util::{
    GeometryError, circumradius, distance, shortest_edge_length, signed_area, triangle_angles,
};

/// Circumradius divided by the shortest edge length.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateTriangle`] for collinear corners.
///
/// # Examples
///
/// ```rust
/// use approx::assert_relative_eq;
/// use ruppert::geometry::point::Point;
/// use ruppert::geometry::quality::radius_edge_ratio;
///
/// let h = 3.0_f64.sqrt() / 2.0;
/// let ratio = radius_edge_ratio(
///     Point::new([0.0, 0.0]),
///     Point::new([1.0, 0.0]),
///     Point::new([0.5, h]),
/// )
/// .unwrap();
/// assert_relative_eq!(ratio, 1.0 / 3.0_f64.sqrt(), epsilon = 1e-12);
/// ```
pub fn radius_edge_ratio(a: Point, b: Point, c: Point) -> Result<f64, GeometryError> {
    Ok(circumradius(a, b, c)? / shortest_edge_length(a, b, c))
}

/// Circumradius divided by twice the inradius.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateTriangle`] for collinear corners.
pub fn radius_ratio(a: Point, b: Point, c: Point) -> Result<f64, GeometryError> {
    let r = circumradius(a, b, c)?;
    let perimeter = distance(a, b) + distance(b, c) + distance(c, a);
    let inradius = 2.0 * signed_area(a, b, c).abs() / perimeter;
    Ok(r / (2.0 * inradius))
}

/// Shape summary of a single triangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriangleQuality {
    /// Signed area; positive for counter-clockwise corners.
    pub area: f64,
    /// Smallest interior angle in degrees.
    pub min_angle_degrees: f64,
    /// Largest interior angle in degrees.
    pub max_angle_degrees: f64,
    /// Length of the shortest edge.
    pub shortest_edge: f64,
}

impl TriangleQuality {
    /// Measures the triangle `(a, b, c)`.
    #[must_use]
    pub fn of(a: Point, b: Point, c: Point) -> Self {
        let angles = triangle_angles(a, b, c);
        Self {
            area: signed_area(a, b, c),
            min_angle_degrees: angles.iter().copied().fold(f64::INFINITY, f64::min).to_degrees(),
            max_angle_degrees: angles
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max)
                .to_degrees(),
            shortest_edge: shortest_edge_length(a, b, c),
        }
    }
}

/// Aggregate quality of every face of a mesh.
///
/// # Examples
///
/// ```rust
/// use ruppert::geometry::polygon::Polygon;
/// use ruppert::geometry::quality::MeshQuality;
/// use ruppert::triangulation::triangulator::triangulate;
///
/// let mesh = triangulate(&Polygon::square(2.0)).unwrap();
/// let quality = MeshQuality::of(&mesh).unwrap();
/// assert_eq!(quality.faces, 2);
/// assert_eq!(quality.total_area, 4.0);
/// assert!((quality.min_angle_degrees - 45.0).abs() < 1e-9);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshQuality {
    /// Number of faces measured.
    pub faces: usize,
    /// Smallest angle over all faces, in degrees.
    pub min_angle_degrees: f64,
    /// Largest angle over all faces, in degrees.
    pub max_angle_degrees: f64,
    /// Smallest face area.
    pub min_area: f64,
    /// Largest face area.
    pub max_area: f64,
    /// Sum of all face areas.
    pub total_area: f64,
}

impl MeshQuality {
    /// Measures every face of `mesh`; `None` if it has no faces.
    #[must_use]
    pub fn of<K: Kernel>(mesh: &Mesh<K>) -> Option<Self> {
        let mut faces = mesh.face_keys().map(|f| {
            let [a, b, c] = mesh.face_vertices(f);
            TriangleQuality::of(a, b, c)
        });
        let first = faces.next()?;
        let init = Self {
            faces: 1,
            min_angle_degrees: first.min_angle_degrees,
            max_angle_degrees: first.max_angle_degrees,
            min_area: first.area,
            max_area: first.area,
            total_area: first.area,
        };
        Some(faces.fold(init, |acc, q| Self {
            faces: acc.faces + 1,
            min_angle_degrees: acc.min_angle_degrees.min(q.min_angle_degrees),
            max_angle_degrees: acc.max_angle_degrees.max(q.max_angle_degrees),
            min_area: acc.min_area.min(q.area),
            max_area: acc.max_area.max(q.area),
            total_area: acc.total_area + q.area,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_equilateral_radius_ratio_is_one() {
        let h = 3.0_f64.sqrt() / 2.0;
        let r = radius_ratio(
            Point::new([0.0, 0.0]),
            Point::new([1.0, 0.0]),
            Point::new([0.5, h]),
        )
        .unwrap();
        assert_relative_eq!(r, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sliver_has_large_ratios() {
        let a = Point::new([0.0, 0.0]);
        let b = Point::new([1.0, 0.0]);
        let c = Point::new([0.5, 1e-3]);
        assert!(radius_ratio(a, b, c).unwrap() > 100.0);
        assert!(radius_edge_ratio(a, b, c).unwrap() > 100.0);
        assert!(radius_ratio(a, b, Point::new([2.0, 0.0])).is_err());
    }

    #[test]
    fn test_triangle_quality_right_isoceles() {
        let q = TriangleQuality::of(
            Point::new([0.0, 0.0]),
            Point::new([1.0, 0.0]),
            Point::new([0.0, 1.0]),
        );
        assert_relative_eq!(q.area, 0.5);
        assert_relative_eq!(q.min_angle_degrees, 45.0, epsilon = 1e-9);
        assert_relative_eq!(q.max_angle_degrees, 90.0, epsilon = 1e-9);
        assert_relative_eq!(q.shortest_edge, 1.0);
    }

    #[test]
    fn test_mesh_quality_empty() {
        assert!(MeshQuality::of(&Mesh::new()).is_none());
    }

    #[test]
    fn test_mesh_quality_serde() {
        let q = MeshQuality {
            faces: 3,
            min_angle_degrees: 21.0,
            max_angle_degrees: 120.0,
            min_area: 0.1,
            max_area: 0.4,
            total_area: 0.75,
        };
        let json = serde_json::to_string(&q).unwrap();
        let back: MeshQuality = serde_json::from_str(&json).unwrap();
        assert_eq!(q, back);
    }
}
