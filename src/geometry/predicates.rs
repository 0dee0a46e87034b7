//! Plain floating-point geometric predicates.
//!
//! These evaluate the orientation and in-circle determinants once in `f64` and
//! classify the sign of the result. They are fast but can misclassify
//! near-degenerate configurations; the mesher uses the adaptive versions in
//! [`robust_predicates`](crate::geometry::robust_predicates) through
//! [`AdaptiveKernel`](crate::geometry::kernel::AdaptiveKernel).

use crate::geometry::point::Point;

/// Represents the position of a point relative to a circumcircle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InCircle {
    /// The point is outside the circumcircle
    OUTSIDE,
    /// The point is on the circumcircle
    BOUNDARY,
    /// The point is inside the circumcircle
    INSIDE,
}

impl std::fmt::Display for InCircle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OUTSIDE => write!(f, "OUTSIDE"),
            Self::BOUNDARY => write!(f, "BOUNDARY"),
            Self::INSIDE => write!(f, "INSIDE"),
        }
    }
}

/// Represents the orientation of an ordered point triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Clockwise turn (determinant < 0)
    NEGATIVE,
    /// Collinear points (determinant = 0)
    DEGENERATE,
    /// Counter-clockwise turn (determinant > 0)
    POSITIVE,
}

impl Orientation {
    /// Classifies the sign of a determinant.
    #[inline]
    #[must_use]
    pub fn from_determinant(det: f64) -> Self {
        if det > 0.0 {
            Self::POSITIVE
        } else if det < 0.0 {
            Self::NEGATIVE
        } else {
            Self::DEGENERATE
        }
    }

    /// Returns `true` for [`Orientation::POSITIVE`].
    #[inline]
    #[must_use]
    pub const fn is_positive(self) -> bool {
        matches!(self, Self::POSITIVE)
    }

    /// Returns `true` for [`Orientation::NEGATIVE`].
    #[inline]
    #[must_use]
    pub const fn is_negative(self) -> bool {
        matches!(self, Self::NEGATIVE)
    }

    /// Returns `true` for [`Orientation::DEGENERATE`].
    #[inline]
    #[must_use]
    pub const fn is_degenerate(self) -> bool {
        matches!(self, Self::DEGENERATE)
    }
}

impl InCircle {
    /// Classifies the sign of an in-circle determinant.
    #[inline]
    #[must_use]
    pub fn from_determinant(det: f64) -> Self {
        if det > 0.0 {
            Self::INSIDE
        } else if det < 0.0 {
            Self::OUTSIDE
        } else {
            Self::BOUNDARY
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

/// The orientation determinant of `(a, b, c)` evaluated in floating point.
///
/// Twice the signed area of the triangle; positive for a counter-clockwise turn.
#[inline]
#[must_use]
pub fn orient2d_fast(a: Point, b: Point, c: Point) -> f64 {
    let detleft = (a.x() - c.x()) * (b.y() - c.y());
    let detright = (a.y() - c.y()) * (b.x() - c.x());
    detleft - detright
}

/// The in-circle determinant of `d` against the circle through `a`, `b`, `c`,
/// evaluated in floating point.
///
/// Positive when `d` is inside the circle and `a`, `b`, `c` are counter-clockwise.
#[inline]
#[must_use]
pub fn incircle_fast(a: Point, b: Point, c: Point, d: Point) -> f64 {
    let adx = a.x() - d.x();
    let ady = a.y() - d.y();
    let bdx = b.x() - d.x();
    let bdy = b.y() - d.y();
    let cdx = c.x() - d.x();
    let cdy = c.y() - d.y();

    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    alift * (bdx * cdy - cdx * bdy) + blift * (cdx * ady - adx * cdy) + clift * (adx * bdy - bdx * ady)
}

/// Orientation of `(a, b, c)` using plain floating point.
///
/// # Examples
///
/// ```
/// use ruppert::geometry::point::Point;
/// use ruppert::geometry::predicates::{Orientation, orientation};
///
/// let a = Point::new([0.0, 0.0]);
/// let b = Point::new([1.0, 0.0]);
/// let c = Point::new([0.0, 1.0]);
/// assert_eq!(orientation(a, b, c), Orientation::POSITIVE);
/// assert_eq!(orientation(a, c, b), Orientation::NEGATIVE);
/// ```
#[inline]
#[must_use]
pub fn orientation(a: Point, b: Point, c: Point) -> Orientation {
    Orientation::from_determinant(orient2d_fast(a, b, c))
}

/// Position of `d` relative to the circumcircle of the counter-clockwise
/// triangle `(a, b, c)`, using plain floating point.
///
/// # Examples
///
/// ```
/// use ruppert::geometry::point::Point;
/// use ruppert::geometry::predicates::{InCircle, in_circle};
///
/// let a = Point::new([0.0, 0.0]);
/// let b = Point::new([1.0, 0.0]);
/// let c = Point::new([0.0, 1.0]);
/// assert_eq!(in_circle(a, b, c, Point::new([0.4, 0.4])), InCircle::INSIDE);
/// assert_eq!(in_circle(a, b, c, Point::new([3.0, 3.0])), InCircle::OUTSIDE);
/// ```
#[inline]
#[must_use]
pub fn in_circle(a: Point, b: Point, c: Point, d: Point) -> InCircle {
    InCircle::from_determinant(incircle_fast(a, b, c, d))
}
