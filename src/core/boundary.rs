//! Boundary curves attached to mesh edges.
//!
//! An edge lying on a curved part of the input boundary carries a
//! [`BoundaryCurve`]; whenever the edge is split at its midpoint, the curve
//! decides where that midpoint is. Edges without a curve are straight and use
//! the Euclidean midpoint.

use std::fmt::Debug;
use std::sync::Arc;

use crate::geometry::point::Point;
use crate::geometry::util::{GeometryError, circumcenter, circumradius, distance, midpoint};

/// A boundary segment that knows how to subdivide itself.
///
/// Implementations must be deterministic: the same two endpoints always give
/// the same midpoint.
///
/// # Examples
///
/// ```rust
/// use ruppert::core::boundary::{BoundaryCurve, StraightSegment};
/// use ruppert::geometry::point::Point;
///
/// let m = StraightSegment.midpoint(Point::new([0.0, 0.0]), Point::new([2.0, 2.0]));
/// assert_eq!(m, Point::new([1.0, 1.0]));
/// ```
pub trait BoundaryCurve: Debug + Send + Sync {
    /// The point on the curve between `p1` and `p2`.
    fn midpoint(&self, p1: Point, p2: Point) -> Point;
}

/// Shared handle to a boundary curve, as stored on edges.
pub type CurveRef = Arc<dyn BoundaryCurve>;

/// A straight boundary segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StraightSegment;

impl BoundaryCurve for StraightSegment {
    fn midpoint(&self, p1: Point, p2: Point) -> Point {
        midpoint(p1, p2)
    }
}

/// A circular arc, defined by three points on its circle.
///
/// The midpoint of two points on the arc is the linear midpoint projected
/// radially onto the circle.
///
/// # Examples
///
/// ```rust
/// use approx::assert_relative_eq;
/// use ruppert::core::boundary::{BoundaryCurve, CircularArc};
/// use ruppert::geometry::point::Point;
///
/// let arc = CircularArc::from_three_points(
///     Point::new([1.0, 0.0]),
///     Point::new([0.0, 1.0]),
///     Point::new([-1.0, 0.0]),
/// )
/// .unwrap();
/// let m = arc.midpoint(Point::new([1.0, 0.0]), Point::new([0.0, 1.0]));
/// assert_relative_eq!(m.norm(), 1.0, epsilon = 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircularArc {
    center: Point,
    radius: f64,
}

impl CircularArc {
    /// The circle through three non-collinear points.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DegenerateTriangle`] if the points are collinear.
    pub fn from_three_points(p1: Point, p2: Point, p3: Point) -> Result<Self, GeometryError> {
        Ok(Self {
            center: circumcenter(p1, p2, p3)?,
            radius: circumradius(p1, p2, p3)?,
        })
    }

    /// Center of the circle.
    #[must_use]
    pub const fn center(&self) -> Point {
        self.center
    }

    /// Radius of the circle.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }
}

impl BoundaryCurve for CircularArc {
    fn midpoint(&self, p1: Point, p2: Point) -> Point {
        let m = midpoint(p1, p2);
        let d = distance(m, self.center);
        if d == 0.0 {
            // Diametrically opposite endpoints: no preferred side.
            return m;
        }
        self.center + (m - self.center) * (self.radius / d)
    }
}
