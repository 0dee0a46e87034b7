//! Axis-aligned bounding boxes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::point::Point;

/// An axis-aligned rectangle given by its lower-left and upper-right corners.
///
/// An empty box (created with [`BoundingBox::empty`]) has inverted infinite
/// corners, so that including the first point makes it a degenerate box at
/// that point.
///
/// # Examples
///
/// ```rust
/// use ruppert::geometry::bounding_box::BoundingBox;
/// use ruppert::geometry::point::Point;
///
/// let mut bb = BoundingBox::empty();
/// bb.include(Point::new([1.0, 2.0]));
/// bb.include(Point::new([-1.0, 5.0]));
/// assert_eq!(bb.width(), 2.0);
/// assert_eq!(bb.height(), 3.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    ll: Point,
    ur: Point,
}

impl BoundingBox {
    /// Creates a box from its lower-left and upper-right corners.
    #[must_use]
    pub const fn new(ll: Point, ur: Point) -> Self {
        Self { ll, ur }
    }

    /// A box containing nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            ll: Point::new([f64::INFINITY, f64::INFINITY]),
            ur: Point::new([f64::NEG_INFINITY, f64::NEG_INFINITY]),
        }
    }

    /// The smallest box containing every point of the iterator.
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut bb = Self::empty();
        for p in points {
            bb.include(p);
        }
        (!bb.is_empty()).then_some(bb)
    }

    /// Lower-left corner.
    #[must_use]
    pub const fn ll(&self) -> Point {
        self.ll
    }

    /// Upper-right corner.
    #[must_use]
    pub const fn ur(&self) -> Point {
        self.ur
    }

    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.ur.x() - self.ll.x()
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.ur.y() - self.ll.y()
    }

    /// Returns `true` if no point has been included.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ll.x() > self.ur.x() || self.ll.y() > self.ur.y()
    }

    /// Grows the box to contain `p`.
    pub fn include(&mut self, p: Point) {
        self.ll = Point::new([self.ll.x().min(p.x()), self.ll.y().min(p.y())]);
        self.ur = Point::new([self.ur.x().max(p.x()), self.ur.y().max(p.y())]);
    }

    /// Returns `true` if `p` lies in the closed box.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x() >= self.ll.x() && p.x() <= self.ur.x() && p.y() >= self.ll.y() && p.y() <= self.ur.y()
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} - {}]", self.ll, self.ur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_box() {
        let bb = BoundingBox::empty();
        assert!(bb.is_empty());
        assert!(!bb.contains(Point::origin()));
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_include_and_contains() {
        let bb = BoundingBox::from_points([
            Point::new([0.0, 0.0]),
            Point::new([4.0, 1.0]),
            Point::new([2.0, 3.0]),
        ])
        .unwrap();
        assert_eq!(bb.ll(), Point::new([0.0, 0.0]));
        assert_eq!(bb.ur(), Point::new([4.0, 3.0]));
        assert!(bb.contains(Point::new([4.0, 3.0])));
        assert!(!bb.contains(Point::new([4.1, 3.0])));
        assert_eq!(bb.to_string(), "[(0, 0) - (4, 3)]");
    }

    #[test]
    fn test_single_point_box() {
        let bb = BoundingBox::from_points([Point::new([1.0, 1.0])]).unwrap();
        assert!(!bb.is_empty());
        assert_eq!(bb.width(), 0.0);
        assert_eq!(bb.height(), 0.0);
    }
}
