//! Geometric constructions and measures on points and triangles.
//!
//! Unlike the predicates, constructions (circumcenter, off-center, angles) are
//! evaluated in plain floating point. Degenerate triangles are reported as
//! [`GeometryError::DegenerateTriangle`] instead of producing infinities.

#![forbid(unsafe_code)]

use thiserror::Error;

use crate::geometry::point::Point;
use crate::geometry::robust_predicates::robust_orientation;

/// Errors from geometric constructions.
///
/// # Examples
///
/// ```rust
/// use ruppert::geometry::point::Point;
/// use ruppert::geometry::util::{GeometryError, circumcenter};
///
/// let a = Point::new([0.0, 0.0]);
/// let b = Point::new([1.0, 1.0]);
/// let c = Point::new([2.0, 2.0]);
/// assert!(matches!(
///     circumcenter(a, b, c),
///     Err(GeometryError::DegenerateTriangle { .. })
/// ));
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum GeometryError {
    /// The three points are collinear (or coincident).
    #[error("Degenerate triangle ({a}, {b}, {c}) has zero area")]
    DegenerateTriangle {
        /// First vertex.
        a: Point,
        /// Second vertex.
        b: Point,
        /// Third vertex.
        c: Point,
    },
    /// A construction produced a non-finite coordinate.
    #[error("Construction produced a non-finite point {point}")]
    NonFiniteResult {
        /// The offending result.
        point: Point,
    },
}

// =============================================================================
// POINT MEASURES
// =============================================================================

/// Euclidean distance between two points.
///
/// # Examples
///
/// ```rust
/// use ruppert::geometry::point::Point;
/// use ruppert::geometry::util::distance;
///
/// let d = distance(Point::new([0.0, 0.0]), Point::new([3.0, 4.0]));
/// assert_eq!(d, 5.0);
/// ```
#[inline]
#[must_use]
pub fn distance(p: Point, q: Point) -> f64 {
    (q - p).norm()
}

/// Squared Euclidean distance between two points.
#[inline]
#[must_use]
pub fn distance_squared(p: Point, q: Point) -> f64 {
    (q - p).norm_squared()
}

/// Midpoint of the segment `pq`.
#[inline]
#[must_use]
pub fn midpoint(p: Point, q: Point) -> Point {
    Point::new([0.5 * (p.x() + q.x()), 0.5 * (p.y() + q.y())])
}

/// Centroid of the triangle `(a, b, c)`.
#[inline]
#[must_use]
pub fn barycenter(a: Point, b: Point, c: Point) -> Point {
    Point::new([(a.x() + b.x() + c.x()) / 3.0, (a.y() + b.y() + c.y()) / 3.0])
}

/// Signed area of the triangle `(a, b, c)`: positive when counter-clockwise.
///
/// # Examples
///
/// ```rust
/// use ruppert::geometry::point::Point;
/// use ruppert::geometry::util::signed_area;
///
/// let a = Point::new([0.0, 0.0]);
/// let b = Point::new([2.0, 0.0]);
/// let c = Point::new([0.0, 2.0]);
/// assert_eq!(signed_area(a, b, c), 2.0);
/// assert_eq!(signed_area(a, c, b), -2.0);
/// ```
#[inline]
#[must_use]
pub fn signed_area(a: Point, b: Point, c: Point) -> f64 {
    0.5 * (b - a).cross(c - a)
}

// =============================================================================
// TRIANGLE CONSTRUCTIONS
// =============================================================================

fn ensure_nondegenerate(a: Point, b: Point, c: Point) -> Result<f64, GeometryError> {
    let det = (b - a).cross(c - a);
    if det == 0.0 || robust_orientation(a, b, c).is_degenerate() {
        return Err(GeometryError::DegenerateTriangle { a, b, c });
    }
    Ok(det)
}

fn ensure_finite(point: Point) -> Result<Point, GeometryError> {
    if point.is_finite() {
        Ok(point)
    } else {
        Err(GeometryError::NonFiniteResult { point })
    }
}

/// Offset of the circumcenter of `(a, b, c)` from `a`, given the
/// orientation determinant `det`.
fn circumcenter_offset(a: Point, b: Point, c: Point, det: f64) -> Point {
    let ba = b - a;
    let ca = c - a;
    let ba_dist = ba.norm_squared();
    let ca_dist = ca.norm_squared();
    let denominator = 0.5 / det;
    Point::new([
        (ca.y() * ba_dist - ba.y() * ca_dist) * denominator,
        (ba.x() * ca_dist - ca.x() * ba_dist) * denominator,
    ])
}

/// Center of the circle through `a`, `b` and `c`.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateTriangle`] if the points are collinear,
/// or [`GeometryError::NonFiniteResult`] if the result overflows.
///
/// # Examples
///
/// ```rust
/// use ruppert::geometry::point::Point;
/// use ruppert::geometry::util::circumcenter;
///
/// let c = circumcenter(
///     Point::new([0.0, 0.0]),
///     Point::new([2.0, 0.0]),
///     Point::new([0.0, 2.0]),
/// )
/// .unwrap();
/// assert_eq!(c, Point::new([1.0, 1.0]));
/// ```
pub fn circumcenter(a: Point, b: Point, c: Point) -> Result<Point, GeometryError> {
    let det = ensure_nondegenerate(a, b, c)?;
    ensure_finite(a + circumcenter_offset(a, b, c, det))
}

/// Radius of the circle through `a`, `b` and `c`.
///
/// # Errors
///
/// Same conditions as [`circumcenter`].
pub fn circumradius(a: Point, b: Point, c: Point) -> Result<f64, GeometryError> {
    let det = ensure_nondegenerate(a, b, c)?;
    Ok(circumcenter_offset(a, b, c, det).norm())
}

/// Off-center Steiner point of the triangle `(a, b, c)` (Üngör).
///
/// The circumcenter is pulled towards the shortest edge: the candidate on the
/// shortest edge's perpendicular bisector at height `offconstant · |edge|`
/// replaces the circumcenter when it is closer to the edge's origin. For a
/// counter-clockwise triangle the candidate lies on the interior side of the
/// edge. With `offconstant` derived from the target angle θ as
/// `0.475 · √((1 + cos θ) / (1 − cos θ))` the new triangle on the shortest
/// edge just meets the angle bound.
///
/// # Errors
///
/// Same conditions as [`circumcenter`].
pub fn offcenter(a: Point, b: Point, c: Point, offconstant: f64) -> Result<Point, GeometryError> {
    let det = ensure_nondegenerate(a, b, c)?;
    let mut d = circumcenter_offset(a, b, c, det);

    let ba = b - a;
    let ca = c - a;
    let cb = c - b;
    let ba_dist = ba.norm_squared();
    let ca_dist = ca.norm_squared();
    let cb_dist = cb.norm_squared();

    if ba_dist < ca_dist && ba_dist < cb_dist {
        // Edge a -> b, interior on the left.
        let off = ba * 0.5 + ba.perp() * offconstant;
        if off.norm_squared() < d.norm_squared() {
            d = off;
        }
    } else if ca_dist < cb_dist {
        // Edge a -> c, interior on the right.
        let off = ca * 0.5 - ca.perp() * offconstant;
        if off.norm_squared() < d.norm_squared() {
            d = off;
        }
    } else {
        // Edge b -> c, measured from b.
        let off = cb * 0.5 + cb.perp() * offconstant;
        if off.norm_squared() < (d - ba).norm_squared() {
            d = ba + off;
        }
    }

    ensure_finite(a + d)
}

/// The off-center constant for a target minimum angle in degrees.
///
/// # Examples
///
/// ```rust
/// use ruppert::geometry::util::offconstant;
///
/// let c = offconstant(20.0);
/// assert!(c > 1.0 && c < 3.0);
/// ```
#[must_use]
pub fn offconstant(min_angle_degrees: f64) -> f64 {
    let cos = min_angle_degrees.to_radians().cos();
    0.475 * ((1.0 + cos) / (1.0 - cos)).sqrt()
}

/// Interior angle at `b` in the corner `a - b - c`, in radians.
#[must_use]
pub fn angle(a: Point, b: Point, c: Point) -> f64 {
    let u = a - b;
    let v = c - b;
    let denom = u.norm() * v.norm();
    if denom == 0.0 {
        return 0.0;
    }
    (u.dot(v) / denom).clamp(-1.0, 1.0).acos()
}

/// The three interior angles of `(a, b, c)` in radians, at `a`, `b` and `c`.
///
/// # Examples
///
/// ```rust
/// use approx::assert_relative_eq;
/// use ruppert::geometry::point::Point;
/// use ruppert::geometry::util::triangle_angles;
///
/// let angles = triangle_angles(
///     Point::new([0.0, 0.0]),
///     Point::new([1.0, 0.0]),
///     Point::new([0.0, 1.0]),
/// );
/// assert_relative_eq!(angles[0], std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
/// assert_relative_eq!(angles[1], std::f64::consts::FRAC_PI_4, epsilon = 1e-12);
/// ```
#[must_use]
pub fn triangle_angles(a: Point, b: Point, c: Point) -> [f64; 3] {
    [angle(c, a, b), angle(a, b, c), angle(b, c, a)]
}

/// Smallest interior angle of `(a, b, c)` in radians.
#[must_use]
pub fn min_angle(a: Point, b: Point, c: Point) -> f64 {
    let [x, y, z] = triangle_angles(a, b, c);
    x.min(y).min(z)
}

/// Length of the shortest side of `(a, b, c)`.
#[must_use]
pub fn shortest_edge_length(a: Point, b: Point, c: Point) -> f64 {
    distance(a, b).min(distance(b, c)).min(distance(c, a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_measures() {
        let p = Point::new([1.0, 1.0]);
        let q = Point::new([4.0, 5.0]);
        assert_relative_eq!(distance(p, q), 5.0);
        assert_relative_eq!(distance_squared(p, q), 25.0);
        assert_eq!(midpoint(p, q), Point::new([2.5, 3.0]));
        let g = barycenter(Point::origin(), Point::new([3.0, 0.0]), Point::new([0.0, 3.0]));
        assert_relative_eq!(g.x(), 1.0);
        assert_relative_eq!(g.y(), 1.0);
    }

    #[test]
    fn test_circumcenter_equidistant() {
        let a = Point::new([0.1, 0.3]);
        let b = Point::new([2.7, -0.4]);
        let c = Point::new([1.2, 3.3]);
        let center = circumcenter(a, b, c).unwrap();
        let r = circumradius(a, b, c).unwrap();
        assert_relative_eq!(distance(center, a), r, epsilon = 1e-12);
        assert_relative_eq!(distance(center, b), r, epsilon = 1e-12);
        assert_relative_eq!(distance(center, c), r, epsilon = 1e-12);
    }

    #[test]
    fn test_circumcenter_clockwise_input() {
        let a = Point::new([0.0, 0.0]);
        let b = Point::new([0.0, 2.0]);
        let c = Point::new([2.0, 0.0]);
        let center = circumcenter(a, b, c).unwrap();
        assert_relative_eq!(center.x(), 1.0);
        assert_relative_eq!(center.y(), 1.0);
    }

    #[test]
    fn test_degenerate_constructions_error() {
        let a = Point::new([0.0, 0.0]);
        let b = Point::new([1.0, 0.0]);
        let c = Point::new([3.0, 0.0]);
        assert!(circumcenter(a, b, c).is_err());
        assert!(circumradius(a, b, a).is_err());
        assert!(offcenter(a, b, c, 1.0).is_err());
    }

    #[test]
    fn test_offcenter_equals_circumcenter_for_well_shaped() {
        // Equilateral triangle: the circumcenter is already closer than any off-center.
        let a = Point::new([0.0, 0.0]);
        let b = Point::new([1.0, 0.0]);
        let c = Point::new([0.5, 3.0_f64.sqrt() / 2.0]);
        let k = offconstant(20.0);
        let off = offcenter(a, b, c, k).unwrap();
        let cc = circumcenter(a, b, c).unwrap();
        assert_relative_eq!(off.x(), cc.x(), epsilon = 1e-12);
        assert_relative_eq!(off.y(), cc.y(), epsilon = 1e-12);
    }

    #[test]
    fn test_offcenter_pulled_towards_short_edge() {
        // Skinny triangle with short edge b -> c.
        let a = Point::new([0.0, 0.0]);
        let b = Point::new([10.0, 0.0]);
        let c = Point::new([10.0, 0.5]);
        let k = offconstant(20.0);
        let off = offcenter(a, b, c, k).unwrap();
        let cc = circumcenter(a, b, c).unwrap();
        let mid = midpoint(b, c);
        assert!(distance(off, mid) < distance(cc, mid));
        // Interior side of b -> c is towards a.
        assert!(off.x() < 10.0);
        assert_relative_eq!(off.y(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(off.x(), 10.0 - 0.5 * k, epsilon = 1e-12);
    }

    #[test]
    fn test_offcenter_short_edge_ab() {
        let a = Point::new([0.0, 0.0]);
        let b = Point::new([0.5, 0.0]);
        let c = Point::new([0.25, 10.0]);
        let k = 1.0;
        let off = offcenter(a, b, c, k).unwrap();
        assert_relative_eq!(off.x(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(off.y(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_offcenter_short_edge_ac() {
        let a = Point::new([0.0, 0.0]);
        let b = Point::new([0.25, -10.0]);
        let c = Point::new([0.5, 0.0]);
        // Counter-clockwise? a -> b -> c turns left.
        assert!(signed_area(a, b, c) > 0.0);
        let off = offcenter(a, b, c, 1.0).unwrap();
        assert_relative_eq!(off.x(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(off.y(), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_angles_sum_to_pi() {
        let a = Point::new([0.3, 0.1]);
        let b = Point::new([4.0, 1.0]);
        let c = Point::new([-1.0, 2.5]);
        let [x, y, z] = triangle_angles(a, b, c);
        assert_relative_eq!(x + y + z, std::f64::consts::PI, epsilon = 1e-12);
        assert_relative_eq!(min_angle(a, b, c), x.min(y).min(z));
    }

    #[test]
    fn test_shortest_edge_length() {
        let a = Point::new([0.0, 0.0]);
        let b = Point::new([3.0, 0.0]);
        let c = Point::new([3.0, 1.0]);
        assert_relative_eq!(shortest_edge_length(a, b, c), 1.0);
    }
}
