//! Planar points and vectors.
//!
//! A [`Point`] doubles as a 2D vector: differences of points are points, and the
//! usual vector operations ([`Point::dot`], [`Point::cross`], [`Point::norm`]) are
//! provided directly on the type. Equality is plain IEEE 754 equality of the
//! coordinates; the mesher never compares positions for identity, it compares keys.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

// =============================================================================
// POINT STRUCT DEFINITION
// =============================================================================

/// A point (or displacement vector) in the plane.
///
/// Points are immutable once created; the coordinates are private and read
/// through [`Point::x`], [`Point::y`] and [`Point::coords`].
///
/// # Examples
///
/// ```rust
/// use ruppert::geometry::point::Point;
///
/// let p = Point::new([1.0, 2.0]);
/// assert_eq!(p.x(), 1.0);
/// assert_eq!(p.coords(), &[1.0, 2.0]);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    coords: [f64; 2],
}

// =============================================================================
// PUBLIC API
// =============================================================================

impl Point {
    /// Creates a point from its `[x, y]` coordinates.
    #[inline]
    #[must_use]
    pub const fn new(coords: [f64; 2]) -> Self {
        Self { coords }
    }

    /// The origin `(0, 0)`.
    #[inline]
    #[must_use]
    pub const fn origin() -> Self {
        Self { coords: [0.0, 0.0] }
    }

    /// Returns the x coordinate.
    #[inline]
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.coords[0]
    }

    /// Returns the y coordinate.
    #[inline]
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.coords[1]
    }

    /// Returns a reference to the coordinate array.
    #[inline]
    #[must_use]
    pub const fn coords(&self) -> &[f64; 2] {
        &self.coords
    }

    /// Returns `true` when both coordinates are finite (neither NaN nor infinite).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ruppert::geometry::point::Point;
    ///
    /// assert!(Point::new([0.0, 1.0]).is_finite());
    /// assert!(!Point::new([f64::NAN, 1.0]).is_finite());
    /// ```
    #[inline]
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.coords[0].is_finite() && self.coords[1].is_finite()
    }

    /// Dot product, treating both points as vectors.
    #[inline]
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x().mul_add(other.x(), self.y() * other.y())
    }

    /// Scalar (z component of the) cross product `self × other`.
    ///
    /// Positive when `other` is counter-clockwise from `self`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ruppert::geometry::point::Point;
    ///
    /// let ex = Point::new([1.0, 0.0]);
    /// let ey = Point::new([0.0, 1.0]);
    /// assert_eq!(ex.cross(ey), 1.0);
    /// assert_eq!(ey.cross(ex), -1.0);
    /// ```
    #[inline]
    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x() * other.y() - self.y() * other.x()
    }

    /// Squared Euclidean length.
    #[inline]
    #[must_use]
    pub fn norm_squared(self) -> f64 {
        self.dot(self)
    }

    /// Euclidean length.
    #[inline]
    #[must_use]
    pub fn norm(self) -> f64 {
        self.x().hypot(self.y())
    }

    /// The vector rotated a quarter turn counter-clockwise.
    #[inline]
    #[must_use]
    pub const fn perp(self) -> Self {
        Self::new([-self.coords[1], self.coords[0]])
    }
}

// =============================================================================
// TRAIT IMPLEMENTATIONS
// =============================================================================

impl From<[f64; 2]> for Point {
    #[inline]
    fn from(coords: [f64; 2]) -> Self {
        Self::new(coords)
    }
}

impl From<(f64, f64)> for Point {
    #[inline]
    fn from((x, y): (f64, f64)) -> Self {
        Self::new([x, y])
    }
}

impl From<Point> for [f64; 2] {
    #[inline]
    fn from(p: Point) -> Self {
        p.coords
    }
}

impl Add for Point {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new([self.x() + rhs.x(), self.y() + rhs.y()])
    }
}

impl Sub for Point {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new([self.x() - rhs.x(), self.y() - rhs.y()])
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new([self.x() * rhs, self.y() * rhs])
    }
}

impl Neg for Point {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new([-self.x(), -self.y()])
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x(), self.y())
    }
}
