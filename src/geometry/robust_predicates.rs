//! Adaptive exact geometric predicates.
//!
//! Each predicate first evaluates its determinant in `f64` together with a
//! static forward error bound (Shewchuk's stage-A bounds). When the magnitude
//! of the approximation exceeds the bound its sign is certain and is returned
//! directly. Otherwise the determinant is recomputed exactly over
//! [`BigRational`]: every finite `f64` is a dyadic rational, so the conversion
//! is lossless and the resulting sign is exact.
//!
//! The exact path is taken only for (near-)degenerate inputs, so the typical
//! cost stays that of the plain floating-point predicate.

use num_rational::BigRational;
use num_traits::{Signed, Zero};

use super::predicates::{InCircle, Orientation, incircle_fast, orient2d_fast};
use crate::geometry::point::Point;

/// Unit roundoff of `f64` arithmetic (`2^-53`).
const EPSILON: f64 = f64::EPSILON * 0.5;

/// Relative error bound of the floating-point orientation determinant.
const CCW_ERRBOUND_A: f64 = (3.0 + 16.0 * EPSILON) * EPSILON;

/// Relative error bound of the floating-point in-circle determinant.
const ICC_ERRBOUND_A: f64 = (10.0 + 96.0 * EPSILON) * EPSILON;

/// Outcome of the floating-point filter stage.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Filtered {
    /// The sign of the approximation is certain.
    Certain(f64),
    /// The approximation is within its error bound of zero.
    Uncertain,
}

fn orient2d_filter(a: Point, b: Point, c: Point) -> Filtered {
    let detleft = (a.x() - c.x()) * (b.y() - c.y());
    let detright = (a.y() - c.y()) * (b.x() - c.x());
    let det = detleft - detright;

    let detsum = if detleft > 0.0 {
        if detright <= 0.0 {
            return Filtered::Certain(det);
        }
        detleft + detright
    } else if detleft < 0.0 {
        if detright >= 0.0 {
            return Filtered::Certain(det);
        }
        -detleft - detright
    } else {
        return Filtered::Certain(det);
    };

    let errbound = CCW_ERRBOUND_A * detsum;
    if det.is_finite() && (det >= errbound || -det >= errbound) {
        Filtered::Certain(det)
    } else {
        Filtered::Uncertain
    }
}

fn incircle_filter(a: Point, b: Point, c: Point, d: Point) -> Filtered {
    let adx = a.x() - d.x();
    let ady = a.y() - d.y();
    let bdx = b.x() - d.x();
    let bdy = b.y() - d.y();
    let cdx = c.x() - d.x();
    let cdy = c.y() - d.y();

    let bdxcdy = bdx * cdy;
    let cdxbdy = cdx * bdy;
    let alift = adx * adx + ady * ady;

    let cdxady = cdx * ady;
    let adxcdy = adx * cdy;
    let blift = bdx * bdx + bdy * bdy;

    let adxbdy = adx * bdy;
    let bdxady = bdx * ady;
    let clift = cdx * cdx + cdy * cdy;

    let det = alift * (bdxcdy - cdxbdy) + blift * (cdxady - adxcdy) + clift * (adxbdy - bdxady);

    let permanent = (bdxcdy.abs() + cdxbdy.abs()) * alift
        + (cdxady.abs() + adxcdy.abs()) * blift
        + (adxbdy.abs() + bdxady.abs()) * clift;
    let errbound = ICC_ERRBOUND_A * permanent;

    if det.is_finite() && (det > errbound || -det > errbound) {
        Filtered::Certain(det)
    } else {
        Filtered::Uncertain
    }
}

/// Lossless conversion of a coordinate; non-finite values (rejected upstream)
/// map to zero.
fn rational(v: f64) -> BigRational {
    BigRational::from_float(v).unwrap_or_else(BigRational::zero)
}

fn sign(v: &BigRational) -> i8 {
    if v.is_positive() {
        1
    } else if v.is_negative() {
        -1
    } else {
        0
    }
}

/// Exact sign of the orientation determinant of `(a, b, c)`.
///
/// Returns `1` for a counter-clockwise turn, `-1` for clockwise, `0` for
/// collinear points.
#[must_use]
pub fn orient2d_exact_sign(a: Point, b: Point, c: Point) -> i8 {
    let (ax, ay) = (rational(a.x()), rational(a.y()));
    let (bx, by) = (rational(b.x()), rational(b.y()));
    let (cx, cy) = (rational(c.x()), rational(c.y()));

    let det = (&ax - &cx) * (&by - &cy) - (&ay - &cy) * (&bx - &cx);
    sign(&det)
}

/// Exact sign of the in-circle determinant of `d` against `(a, b, c)`.
///
/// Returns `1` when `d` is strictly inside the circle through a
/// counter-clockwise `(a, b, c)`, `-1` outside, `0` on the circle.
#[must_use]
pub fn incircle_exact_sign(a: Point, b: Point, c: Point, d: Point) -> i8 {
    let (dx, dy) = (rational(d.x()), rational(d.y()));
    let adx = rational(a.x()) - &dx;
    let ady = rational(a.y()) - &dy;
    let bdx = rational(b.x()) - &dx;
    let bdy = rational(b.y()) - &dy;
    let cdx = rational(c.x()) - &dx;
    let cdy = rational(c.y()) - &dy;

    let alift = &adx * &adx + &ady * &ady;
    let blift = &bdx * &bdx + &bdy * &bdy;
    let clift = &cdx * &cdx + &cdy * &cdy;

    let det = alift * (&bdx * &cdy - &cdx * &bdy)
        + blift * (&cdx * &ady - &adx * &cdy)
        + clift * (&adx * &bdy - &bdx * &ady);
    sign(&det)
}

/// Exact orientation of `(a, b, c)`.
///
/// # Examples
///
/// ```
/// use ruppert::geometry::point::Point;
/// use ruppert::geometry::predicates::Orientation;
/// use ruppert::geometry::robust_predicates::robust_orientation;
///
/// // Nearly collinear: the plain determinant is dominated by rounding error.
/// let a = Point::new([0.5, 0.5]);
/// let b = Point::new([12.0, 12.0]);
/// let c = Point::new([24.0, 24.0]);
/// assert_eq!(robust_orientation(a, b, c), Orientation::DEGENERATE);
/// ```
#[must_use]
pub fn robust_orientation(a: Point, b: Point, c: Point) -> Orientation {
    match orient2d_filter(a, b, c) {
        Filtered::Certain(det) => Orientation::from_determinant(det),
        Filtered::Uncertain => match orient2d_exact_sign(a, b, c) {
            1 => Orientation::POSITIVE,
            -1 => Orientation::NEGATIVE,
            _ => Orientation::DEGENERATE,
        },
    }
}

/// Exact position of `d` relative to the circumcircle of the counter-clockwise
/// triangle `(a, b, c)`.
///
/// # Examples
///
/// ```
/// use ruppert::geometry::point::Point;
/// use ruppert::geometry::predicates::InCircle;
/// use ruppert::geometry::robust_predicates::robust_in_circle;
///
/// // Four cocircular points: exactly on the boundary.
/// let a = Point::new([1.0, 0.0]);
/// let b = Point::new([0.0, 1.0]);
/// let c = Point::new([-1.0, 0.0]);
/// let d = Point::new([0.0, -1.0]);
/// assert_eq!(robust_in_circle(a, b, c, d), InCircle::BOUNDARY);
/// ```
#[must_use]
pub fn robust_in_circle(a: Point, b: Point, c: Point, d: Point) -> InCircle {
    match incircle_filter(a, b, c, d) {
        Filtered::Certain(det) => InCircle::from_determinant(det),
        Filtered::Uncertain => match incircle_exact_sign(a, b, c, d) {
            1 => InCircle::INSIDE,
            -1 => InCircle::OUTSIDE,
            _ => InCircle::BOUNDARY,
        },
    }
}

/// Returns `true` when the plain floating-point orientation of `(a, b, c)`
/// disagrees with the exact one.
///
/// Diagnostic helper used by tests and benchmarks to find inputs on which the
/// filter matters.
#[must_use]
pub fn fast_orientation_is_wrong(a: Point, b: Point, c: Point) -> bool {
    Orientation::from_determinant(orient2d_fast(a, b, c)) != robust_orientation(a, b, c)
}

/// In-circle counterpart of [`fast_orientation_is_wrong`].
#[must_use]
pub fn fast_in_circle_is_wrong(a: Point, b: Point, c: Point, d: Point) -> bool {
    InCircle::from_determinant(incircle_fast(a, b, c, d)) != robust_in_circle(a, b, c, d)
}
