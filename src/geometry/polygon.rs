//! Simple polygons: the input boundary of the mesher.
//!
//! A [`Polygon`] is an ordered list of vertices describing a closed loop,
//! without the closing vertex repeated. [`Polygon::normalized`] brings an
//! arbitrary vertex list into the canonical form the triangulator expects:
//! finite coordinates, no repeated consecutive vertices, counter-clockwise.
//!
//! A handful of reference shapes used throughout tests and benchmarks are
//! available as constructors ([`Polygon::square`], [`Polygon::letter_u`], ...).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::bounding_box::BoundingBox;
use crate::geometry::point::Point;

/// Errors raised when a vertex list cannot describe a polygon.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum PolygonError {
    /// Fewer than three distinct vertices remain after removing duplicates.
    #[error("Polygon needs at least 3 distinct vertices, got {count}")]
    TooFewVertices {
        /// Number of distinct vertices.
        count: usize,
    },
    /// A vertex has a NaN or infinite coordinate.
    #[error("Polygon vertex {index} is not finite: {point}")]
    NonFiniteVertex {
        /// Position of the vertex in the input.
        index: usize,
        /// The offending vertex.
        point: Point,
    },
    /// All vertices are collinear.
    #[error("Polygon has zero area")]
    ZeroArea,
}

/// A closed polygon given by its vertices in order.
///
/// # Examples
///
/// ```rust
/// use ruppert::geometry::polygon::Polygon;
///
/// let square = Polygon::square(2.0);
/// assert_eq!(square.len(), 4);
/// assert_eq!(square.signed_area(), 4.0);
/// assert!(square.is_counter_clockwise());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    /// Creates a polygon from its vertices, taken as given.
    #[must_use]
    pub const fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// Creates a polygon from raw coordinates.
    #[must_use]
    pub fn from_coords(coords: &[[f64; 2]]) -> Self {
        Self::new(coords.iter().copied().map(Point::new).collect())
    }

    /// Appends a vertex.
    pub fn push(&mut self, p: Point) {
        self.vertices.push(p);
    }

    /// The vertices in order.
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` if the polygon has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Shoelace signed area: positive for counter-clockwise vertex order.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let origin = self.vertices[0];
        let twice: f64 = (1..n - 1)
            .map(|i| (self.vertices[i] - origin).cross(self.vertices[i + 1] - origin))
            .sum();
        0.5 * twice
    }

    /// Returns `true` if the vertices run counter-clockwise.
    #[must_use]
    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// The smallest box containing the polygon, or `None` when empty.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices.iter().copied())
    }

    /// Canonical form of this polygon.
    ///
    /// Consecutive duplicate vertices (including a repeated closing vertex)
    /// are dropped and clockwise input is reversed.
    ///
    /// # Errors
    ///
    /// Returns [`PolygonError::NonFiniteVertex`] for NaN or infinite
    /// coordinates, [`PolygonError::TooFewVertices`] when fewer than three
    /// distinct vertices remain, and [`PolygonError::ZeroArea`] when all
    /// vertices are collinear.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ruppert::geometry::polygon::Polygon;
    ///
    /// // Clockwise, with the first vertex repeated at the end.
    /// let poly = Polygon::from_coords(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]);
    /// let normalized = poly.normalized().unwrap();
    /// assert_eq!(normalized.len(), 4);
    /// assert!(normalized.is_counter_clockwise());
    /// ```
    pub fn normalized(&self) -> Result<Self, PolygonError> {
        if let Some((index, &point)) = self.vertices.iter().enumerate().find(|(_, p)| !p.is_finite()) {
            return Err(PolygonError::NonFiniteVertex { index, point });
        }

        let mut vertices: Vec<Point> = Vec::with_capacity(self.vertices.len());
        for &p in &self.vertices {
            if vertices.last() != Some(&p) {
                vertices.push(p);
            }
        }
        while vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        if vertices.len() < 3 {
            return Err(PolygonError::TooFewVertices { count: vertices.len() });
        }

        let mut poly = Self::new(vertices);
        let area = poly.signed_area();
        if area == 0.0 {
            return Err(PolygonError::ZeroArea);
        }
        if area < 0.0 {
            poly.vertices.reverse();
        }
        Ok(poly)
    }

    // =========================================================================
    // REFERENCE SHAPES
    // =========================================================================

    /// An axis-aligned square with lower-left corner at the origin.
    #[must_use]
    pub fn square(size: f64) -> Self {
        Self::from_coords(&[[0.0, 0.0], [size, 0.0], [size, size], [0.0, size]])
    }

    /// A flat obtuse triangle.
    #[must_use]
    pub fn triangle() -> Self {
        Self::from_coords(&[[-5.0, 0.0], [5.0, 0.0], [-0.5, 2.0]])
    }

    /// A U-shaped (rotated) octagon with two reflex corners.
    #[must_use]
    pub fn letter_u() -> Self {
        Self::from_coords(&[
            [0.0, 0.0],
            [4.0, 0.0],
            [4.0, 1.0],
            [2.0, 1.0],
            [2.0, 2.0],
            [4.0, 2.0],
            [4.0, 3.0],
            [0.0, 3.0],
        ])
    }

    /// A square with a thin slit reaching its center, creating a very sharp
    /// reflex corner.
    #[must_use]
    pub fn crack() -> Self {
        Self::from_coords(&[
            [-1.0, -1.0],
            [1.0, -1.0],
            [1.0, 1.0],
            [1e-2, 1.0],
            [0.0, 0.0],
            [-1e-2, 1.0],
            [-1.0, 1.0],
        ])
    }

    /// Outline of a capital letter A (without the hole).
    #[must_use]
    pub fn letter_a() -> Self {
        Self::from_coords(&[
            [0.00000000, 0.00000000],
            [0.28533333, 0.00000000],
            [0.28533333, 0.02735978],
            [0.22400000, 0.03556772],
            [0.19733333, 0.05335157],
            [0.18666667, 0.09028728],
            [0.19866667, 0.14637483],
            [0.26800000, 0.32147743],
            [0.64533333, 0.32147743],
            [0.70133333, 0.18467852],
            [0.73200000, 0.08207934],
            [0.72266667, 0.05061560],
            [0.70266667, 0.03556772],
            [0.63200000, 0.02735978],
            [0.63200000, 0.00000000],
            [1.00000000, 0.00000000],
            [1.00000000, 0.02735978],
            [0.95733333, 0.03419973],
            [0.92666667, 0.05335157],
            [0.90133333, 0.09028728],
            [0.50800000, 1.00000000],
            [0.48133333, 1.00000000],
            [0.12933333, 0.15458276],
            [0.07600000, 0.06155951],
            [0.03333333, 0.03283174],
            [0.00000000, 0.02735978],
        ])
    }

    /// A smooth kidney-shaped outline with 50 vertices.
    #[must_use]
    pub fn kidney() -> Self {
        Self::from_coords(&[
            [0.6814, 1.2932],
            [0.7148, 1.2004],
            [0.7574, 1.1074],
            [0.8143, 1.0178],
            [0.8963, 0.9360],
            [0.9825, 0.8672],
            [1.0713, 0.8072],
            [1.1610, 0.7660],
            [1.2482, 0.7350],
            [1.3416, 0.7122],
            [1.4344, 0.6954],
            [1.5202, 0.6852],
            [1.6132, 0.6802],
            [1.7064, 0.6802],
            [1.7994, 0.6946],
            [1.8926, 0.7160],
            [1.9848, 0.7412],
            [2.0780, 0.7758],
            [2.1706, 0.8178],
            [2.2616, 0.8718],
            [2.3498, 0.9444],
            [2.4318, 1.0256],
            [2.5044, 1.1130],
            [2.5600, 1.1984],
            [2.5896, 1.2914],
            [2.6132, 1.3848],
            [2.6294, 1.4774],
            [2.5998, 1.5688],
            [2.5333, 1.6370],
            [2.4400, 1.6230],
            [2.3494, 1.5844],
            [2.2576, 1.5308],
            [2.1664, 1.4872],
            [2.0820, 1.4402],
            [1.9928, 1.4052],
            [1.8996, 1.3756],
            [1.8068, 1.3492],
            [1.7136, 1.3342],
            [1.6208, 1.3278],
            [1.5274, 1.3264],
            [1.4346, 1.3384],
            [1.3414, 1.3596],
            [1.2484, 1.3860],
            [1.1556, 1.4258],
            [1.0634, 1.4642],
            [0.9744, 1.5058],
            [0.8816, 1.5464],
            [0.7882, 1.5496],
            [0.7046, 1.4790],
            [0.6890, 1.3860],
        ])
    }

    /// An irregular island coastline with 95 vertices.
    #[must_use]
    pub fn island() -> Self {
        Self::from_coords(&[
            [0.35790337, 0.38864577],
            [0.31071450, 0.40218492],
            [0.26291196, 0.39019645],
            [0.21429804, 0.38283820],
            [0.16613300, 0.39383360],
            [0.11818326, 0.40414870],
            [0.08260139, 0.37538306],
            [0.05361811, 0.34207291],
            [0.02510484, 0.30843907],
            [0.00000000, 0.27304858],
            [0.01116075, 0.23446584],
            [0.05253742, 0.21147779],
            [0.08739790, 0.18215957],
            [0.13184782, 0.16365548],
            [0.17678370, 0.14569794],
            [0.20997123, 0.11555512],
            [0.23487661, 0.08013357],
            [0.27428417, 0.05577003],
            [0.30609623, 0.02448313],
            [0.34462248, 0.00000000],
            [0.38499725, 0.00703740],
            [0.41201013, 0.04110566],
            [0.44407198, 0.07251598],
            [0.47554188, 0.10433305],
            [0.48615282, 0.14127188],
            [0.48526458, 0.18209454],
            [0.48934181, 0.22286040],
            [0.51277842, 0.25712118],
            [0.55446391, 0.27665125],
            [0.59998065, 0.26611232],
            [0.63374109, 0.23635467],
            [0.68219858, 0.22657993],
            [0.72344682, 0.20595516],
            [0.76098068, 0.18314759],
            [0.81015186, 0.18044212],
            [0.85789280, 0.17704054],
            [0.90231042, 0.15823834],
            [0.94725198, 0.14091650],
            [0.99263450, 0.14300645],
            [1.00000000, 0.18113114],
            [0.97482369, 0.21584709],
            [0.93601160, 0.24166059],
            [0.89769796, 0.26773059],
            [0.88612883, 0.30756282],
            [0.88036141, 0.34822807],
            [0.86637401, 0.38744400],
            [0.87126547, 0.42698375],
            [0.87836588, 0.46738117],
            [0.86679577, 0.50495740],
            [0.83885184, 0.53889814],
            [0.80885902, 0.57161229],
            [0.77548249, 0.60209880],
            [0.73774132, 0.62777801],
            [0.69229886, 0.64485535],
            [0.64664787, 0.66155981],
            [0.59924870, 0.67318904],
            [0.54986089, 0.67381738],
            [0.50097893, 0.66757989],
            [0.46691922, 0.69313520],
            [0.44449627, 0.72973059],
            [0.40854079, 0.75668093],
            [0.36290331, 0.77039793],
            [0.36624793, 0.79505758],
            [0.37098973, 0.82539964],
            [0.32954240, 0.84365456],
            [0.32368068, 0.87731391],
            [0.36206162, 0.90145428],
            [0.41147458, 0.90716326],
            [0.45332716, 0.92956622],
            [0.50176592, 0.93780257],
            [0.54970945, 0.94883030],
            [0.57634292, 0.97479673],
            [0.53570147, 0.98649919],
            [0.48652917, 0.99385804],
            [0.43997944, 0.98533700],
            [0.40368105, 1.00000000],
            [0.36167108, 0.98189826],
            [0.32369722, 0.95572597],
            [0.28265677, 0.93271435],
            [0.24867592, 0.90286457],
            [0.22284050, 0.86781008],
            [0.22698494, 0.82708497],
            [0.23260900, 0.78640307],
            [0.25654498, 0.75174722],
            [0.29129654, 0.72243251],
            [0.31907943, 0.68878353],
            [0.34391654, 0.65324854],
            [0.37314261, 0.62077328],
            [0.41247022, 0.59552654],
            [0.45405330, 0.57278959],
            [0.46246974, 0.53265774],
            [0.47030304, 0.49222005],
            [0.47073181, 0.45153024],
            [0.44700288, 0.41863218],
            [0.40728793, 0.39400451],
        ])
    }
}

impl FromIterator<Point> for Polygon {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
