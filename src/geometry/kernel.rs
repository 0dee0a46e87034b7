//! Geometric kernel abstraction.
//!
//! The [`Kernel`] trait bundles the predicates the mesh algorithms rely on, so
//! the half-edge mesh stays purely combinatorial and the arithmetic strategy can
//! be swapped: [`AdaptiveKernel`] (the default) is exact, [`FastKernel`] is
//! plain floating point.

use crate::geometry::point::Point;
use crate::geometry::predicates::{InCircle, Orientation, in_circle, orientation};
use crate::geometry::robust_predicates::{robust_in_circle, robust_orientation};
use crate::geometry::util::{self, GeometryError};

/// Geometric kernel trait defining the predicates and constructions used by
/// the triangulation algorithms.
///
/// Only the two predicates are required; constructions have provided
/// implementations in plain floating point.
///
/// # Examples
///
/// ```
/// use ruppert::geometry::kernel::{AdaptiveKernel, Kernel};
/// use ruppert::geometry::point::Point;
/// use ruppert::geometry::predicates::{InCircle, Orientation};
///
/// let kernel = AdaptiveKernel::new();
/// let a = Point::new([0.0, 0.0]);
/// let b = Point::new([1.0, 0.0]);
/// let c = Point::new([0.5, 1.0]);
/// assert_eq!(kernel.orientation(a, b, c), Orientation::POSITIVE);
/// assert_eq!(kernel.in_circle(a, b, c, Point::new([0.5, 0.3])), InCircle::INSIDE);
/// ```
pub trait Kernel: Clone + Default + std::fmt::Debug + Send + Sync + 'static {
    /// Orientation of the ordered triple `(a, b, c)`.
    fn orientation(&self, a: Point, b: Point, c: Point) -> Orientation;

    /// Position of `d` relative to the circumcircle of the counter-clockwise
    /// triangle `(a, b, c)`.
    fn in_circle(&self, a: Point, b: Point, c: Point, d: Point) -> InCircle;

    /// Circumcenter of `(a, b, c)`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] for degenerate triangles.
    fn circumcenter(&self, a: Point, b: Point, c: Point) -> Result<Point, GeometryError> {
        util::circumcenter(a, b, c)
    }

    /// Off-center of the counter-clockwise triangle `(a, b, c)`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] for degenerate triangles.
    fn offcenter(
        &self,
        a: Point,
        b: Point,
        c: Point,
        offconstant: f64,
    ) -> Result<Point, GeometryError> {
        util::offcenter(a, b, c, offconstant)
    }

    /// Signed area of `(a, b, c)`.
    fn signed_area(&self, a: Point, b: Point, c: Point) -> f64 {
        util::signed_area(a, b, c)
    }
}

/// Fast floating-point kernel.
///
/// Evaluates each determinant once in `f64`. May misclassify near-degenerate
/// configurations; use [`AdaptiveKernel`] when correctness matters.
///
/// # Examples
///
/// ```
/// use ruppert::geometry::kernel::{FastKernel, Kernel};
/// use ruppert::geometry::point::Point;
/// use ruppert::geometry::predicates::Orientation;
///
/// let kernel = FastKernel::new();
/// let o = kernel.orientation(
///     Point::new([0.0, 0.0]),
///     Point::new([1.0, 0.0]),
///     Point::new([0.0, 1.0]),
/// );
/// assert_eq!(o, Orientation::POSITIVE);
/// ```
#[derive(Clone, Copy, Default, Debug)]
pub struct FastKernel;

impl FastKernel {
    /// Create a new fast kernel.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Kernel for FastKernel {
    #[inline]
    fn orientation(&self, a: Point, b: Point, c: Point) -> Orientation {
        orientation(a, b, c)
    }

    #[inline]
    fn in_circle(&self, a: Point, b: Point, c: Point, d: Point) -> InCircle {
        in_circle(a, b, c, d)
    }
}

/// Adaptive exact kernel.
///
/// A floating-point filter with a static error bound decides the sign when
/// it can; otherwise the determinant is evaluated exactly. The classification
/// is always exact for finite input.
///
/// # Examples
///
/// ```
/// use ruppert::geometry::kernel::{AdaptiveKernel, Kernel};
/// use ruppert::geometry::point::Point;
/// use ruppert::geometry::predicates::InCircle;
///
/// let kernel = AdaptiveKernel::new();
/// // Cocircular: corners of a unit square.
/// let r = kernel.in_circle(
///     Point::new([0.0, 0.0]),
///     Point::new([1.0, 0.0]),
///     Point::new([1.0, 1.0]),
///     Point::new([0.0, 1.0]),
/// );
/// assert_eq!(r, InCircle::BOUNDARY);
/// ```
#[derive(Clone, Copy, Default, Debug)]
pub struct AdaptiveKernel;

impl AdaptiveKernel {
    /// Create a new adaptive kernel.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Kernel for AdaptiveKernel {
    #[inline]
    fn orientation(&self, a: Point, b: Point, c: Point) -> Orientation {
        robust_orientation(a, b, c)
    }

    #[inline]
    fn in_circle(&self, a: Point, b: Point, c: Point, d: Point) -> InCircle {
        robust_in_circle(a, b, c, d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_kernel<K: Kernel>(kernel: &K) {
        let a = Point::new([0.0, 0.0]);
        let b = Point::new([4.0, 0.0]);
        let c = Point::new([0.0, 4.0]);
        assert_eq!(kernel.orientation(a, b, c), Orientation::POSITIVE);
        assert_eq!(kernel.orientation(a, c, b), Orientation::NEGATIVE);
        assert_eq!(kernel.orientation(a, b, Point::new([8.0, 0.0])), Orientation::DEGENERATE);
        assert_eq!(kernel.in_circle(a, b, c, Point::new([1.0, 1.0])), InCircle::INSIDE);
        assert_eq!(kernel.in_circle(a, b, c, Point::new([4.0, 4.0])), InCircle::BOUNDARY);
        assert_eq!(kernel.in_circle(a, b, c, Point::new([9.0, 9.0])), InCircle::OUTSIDE);
        assert_eq!(kernel.circumcenter(a, b, c).unwrap(), Point::new([2.0, 2.0]));
        assert_eq!(kernel.signed_area(a, b, c), 8.0);
    }

    #[test]
    fn test_fast_kernel_2d() {
        check_kernel(&FastKernel::new());
    }

    #[test]
    fn test_adaptive_kernel_2d() {
        check_kernel(&AdaptiveKernel::new());
    }

    #[test]
    fn test_adaptive_kernel_near_degenerate() {
        let kernel = AdaptiveKernel::new();
        let a = Point::new([0.5, 0.5]);
        let b = Point::new([12.0, 12.0]);
        let above = Point::new([24.0, f64::from_bits(24.0_f64.to_bits() + 1)]);
        assert_eq!(kernel.orientation(a, b, above), Orientation::POSITIVE);
    }

    #[test]
    fn test_kernel_offcenter_default() {
        let kernel = AdaptiveKernel::new();
        let a = Point::new([0.0, 0.0]);
        let b = Point::new([1.0, 0.0]);
        let c = Point::new([0.5, 0.8]);
        let off = kernel.offcenter(a, b, c, util::offconstant(20.0)).unwrap();
        assert_eq!(off, util::offcenter(a, b, c, util::offconstant(20.0)).unwrap());
    }
}
