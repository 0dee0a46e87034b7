//! Property-based tests for the orientation and in-circle predicates.
//!
//! The adaptive predicates must agree with the exact rational evaluation on
//! every input, including points constructed to be nearly or exactly
//! degenerate, and must respect the algebraic symmetries of the underlying
//! determinants.

#![forbid(unsafe_code)]

use proptest::prelude::*;
use ruppert::geometry::kernel::{AdaptiveKernel, FastKernel, Kernel};
use ruppert::geometry::point::Point;
use ruppert::geometry::predicates::{InCircle, Orientation};
use ruppert::geometry::robust_predicates::{
    incircle_exact_sign, orient2d_exact_sign, robust_in_circle, robust_orientation,
};

// =============================================================================
// TEST CONFIGURATION
// =============================================================================

/// Strategy for generating finite f64 coordinates in a reasonable range
fn finite_coordinate() -> impl Strategy<Value = f64> {
    (-1000.0..1000.0).prop_filter("must be finite", |x: &f64| x.is_finite())
}

/// Strategy for generating 2D points
fn point_2d() -> impl Strategy<Value = Point> {
    prop::array::uniform2(finite_coordinate()).prop_map(Point::new)
}

/// Strategy for generating points on a small integer grid, where the plain
/// floating-point determinants are exact.
fn grid_point() -> impl Strategy<Value = Point> {
    prop::array::uniform2(-64_i32..64).prop_map(|[x, y]| Point::new([f64::from(x), f64::from(y)]))
}

/// Strategy for generating a point that lies on the segment `(a, b)` up to
/// the rounding error of its construction.
fn nearly_collinear() -> impl Strategy<Value = (Point, Point, Point)> {
    (point_2d(), point_2d(), 0.0..1.0_f64)
        .prop_filter("distinct endpoints", |(a, b, _)| a != b)
        .prop_map(|(a, b, t)| (a, b, a + (b - a) * t))
}

fn orientation_from_sign(sign: i8) -> Orientation {
    match sign {
        1 => Orientation::POSITIVE,
        -1 => Orientation::NEGATIVE,
        _ => Orientation::DEGENERATE,
    }
}

fn in_circle_from_sign(sign: i8) -> InCircle {
    match sign {
        1 => InCircle::INSIDE,
        -1 => InCircle::OUTSIDE,
        _ => InCircle::BOUNDARY,
    }
}

// =============================================================================
// ORIENTATION PROPERTY TESTS
// =============================================================================

proptest! {
    /// Property: the adaptive orientation equals the exact one.
    #[test]
    fn prop_orientation_matches_exact(a in point_2d(), b in point_2d(), c in point_2d()) {
        prop_assert_eq!(robust_orientation(a, b, c), orientation_from_sign(orient2d_exact_sign(a, b, c)));
    }

    /// Property: the adaptive orientation equals the exact one on points
    /// constructed to be collinear.
    #[test]
    fn prop_orientation_nearly_collinear((a, b, c) in nearly_collinear()) {
        let exact = orientation_from_sign(orient2d_exact_sign(a, b, c));
        prop_assert_eq!(robust_orientation(a, b, c), exact);
        prop_assert_eq!(AdaptiveKernel::new().orientation(a, b, c), exact);
    }

    /// Property: swapping two points flips the sign; rotating them keeps it.
    #[test]
    fn prop_orientation_symmetries(a in point_2d(), b in point_2d(), c in point_2d()) {
        let o = robust_orientation(a, b, c);
        prop_assert_eq!(robust_orientation(b, c, a), o);
        prop_assert_eq!(robust_orientation(c, a, b), o);

        let swapped = robust_orientation(a, c, b);
        match o {
            Orientation::POSITIVE => prop_assert_eq!(swapped, Orientation::NEGATIVE),
            Orientation::NEGATIVE => prop_assert_eq!(swapped, Orientation::POSITIVE),
            Orientation::DEGENERATE => prop_assert_eq!(swapped, Orientation::DEGENERATE),
        }
    }

    /// Property: a repeated point is always degenerate.
    #[test]
    fn prop_orientation_repeated_point(a in point_2d(), b in point_2d()) {
        prop_assert_eq!(robust_orientation(a, a, b), Orientation::DEGENERATE);
        prop_assert_eq!(robust_orientation(a, b, b), Orientation::DEGENERATE);
    }

    /// Property: on an integer grid the fast and adaptive kernels agree.
    #[test]
    fn prop_kernels_agree_on_grid(a in grid_point(), b in grid_point(), c in grid_point(), d in grid_point()) {
        let fast = FastKernel::new();
        let adaptive = AdaptiveKernel::new();
        prop_assert_eq!(fast.orientation(a, b, c), adaptive.orientation(a, b, c));
        prop_assert_eq!(fast.in_circle(a, b, c, d), adaptive.in_circle(a, b, c, d));
    }
}

// =============================================================================
// IN-CIRCLE PROPERTY TESTS
// =============================================================================

proptest! {
    /// Property: the adaptive in-circle test equals the exact one.
    #[test]
    fn prop_in_circle_matches_exact(a in point_2d(), b in point_2d(), c in point_2d(), d in point_2d()) {
        prop_assert_eq!(robust_in_circle(a, b, c, d), in_circle_from_sign(incircle_exact_sign(a, b, c, d)));
    }

    /// Property: the triangle's own corners lie on its circumcircle.
    #[test]
    fn prop_in_circle_corners_on_boundary(a in point_2d(), b in point_2d(), c in point_2d()) {
        prop_assert_eq!(robust_in_circle(a, b, c, a), InCircle::BOUNDARY);
        prop_assert_eq!(robust_in_circle(a, b, c, b), InCircle::BOUNDARY);
        prop_assert_eq!(robust_in_circle(a, b, c, c), InCircle::BOUNDARY);
    }

    /// Property: rotating the triangle does not change the answer.
    #[test]
    fn prop_in_circle_rotation_invariant(a in point_2d(), b in point_2d(), c in point_2d(), d in point_2d()) {
        let r = robust_in_circle(a, b, c, d);
        prop_assert_eq!(robust_in_circle(b, c, a, d), r);
        prop_assert_eq!(robust_in_circle(c, a, b, d), r);
    }

    /// Property: integer points on a common circle are exactly cocircular.
    ///
    /// Pythagorean triples scaled by `k` lie on the circle of radius `5k`
    /// centered at the (shifted) origin.
    #[test]
    fn prop_in_circle_cocircular_integers(
        k in 1_i32..2000,
        shift in prop::array::uniform2(-1000_i32..1000),
    ) {
        let (k, sx, sy) = (f64::from(k), f64::from(shift[0]), f64::from(shift[1]));
        let p = |x: f64, y: f64| Point::new([sx + k * x, sy + k * y]);
        let a = p(5.0, 0.0);
        let b = p(3.0, 4.0);
        let c = p(-4.0, 3.0);
        let d = p(0.0, -5.0);
        prop_assert_eq!(robust_orientation(a, b, c), Orientation::POSITIVE);
        prop_assert_eq!(robust_in_circle(a, b, c, d), InCircle::BOUNDARY);
        prop_assert_eq!(robust_in_circle(a, b, c, p(0.0, 0.0)), InCircle::INSIDE);
        prop_assert_eq!(robust_in_circle(a, b, c, p(6.0, 0.0)), InCircle::OUTSIDE);
    }

    /// Property: the adaptive kernel classifies a point on the circumcircle
    /// consistently with the exact evaluation even though the constructed
    /// point is inexact.
    #[test]
    fn prop_in_circle_near_cocircular(theta in 0.0..std::f64::consts::TAU, r in 1.0..100.0_f64) {
        let a = Point::new([r, 0.0]);
        let b = Point::new([0.0, r]);
        let c = Point::new([-r, 0.0]);
        let d = Point::new([r * theta.cos(), r * theta.sin()]);
        let exact = in_circle_from_sign(incircle_exact_sign(a, b, c, d));
        prop_assert_eq!(AdaptiveKernel::new().in_circle(a, b, c, d), exact);
    }
}
