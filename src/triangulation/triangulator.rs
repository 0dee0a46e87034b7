//! Ear-clipping triangulation of a simple polygon.
//!
//! The polygon's boundary loop is built into an empty [`Mesh`] as one node
//! per vertex and one edge per side. Each vertex is then classified as
//! convex (strict left turn) or reflex; a convex vertex is an *ear* when no
//! reflex vertex other than its two neighbours lies in the closed triangle it
//! forms with them. Ears are clipped one at a time, each clip adding a face
//! and, unless it is the last triangle, a new edge closing the remaining
//! polygon. Only the two neighbours of a clipped ear can change class, so only
//! they are reclassified.
//!
//! The result is a valid triangulation with `n - 2` faces but generally not a
//! Delaunay one; see [`make_cdt`](crate::triangulation::delaunay).

use std::collections::VecDeque;

use thiserror::Error;

use crate::core::mesh::{HalfedgeKey, Mesh, MeshError, NodeKey};
use crate::geometry::kernel::{AdaptiveKernel, Kernel};
use crate::geometry::polygon::{Polygon, PolygonError};
use crate::geometry::predicates::Orientation;

/// Errors raised while triangulating a polygon.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum TriangulationError {
    /// The input does not describe a usable polygon.
    #[error("Invalid polygon: {0}")]
    InvalidPolygon(#[from] PolygonError),
    /// Ear clipping ran out of ears before the polygon was covered; the
    /// polygon is not simple.
    #[error("No ear found after creating {faces} of {expected} triangles; is the polygon simple?")]
    NoEarFound {
        /// Faces created before running out of ears.
        faces: usize,
        /// Faces a simple polygon of this size produces.
        expected: usize,
    },
    /// A mesh primitive failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Triangulates `polygon` into a new mesh using the exact adaptive kernel.
///
/// The polygon is normalized first (see [`Polygon::normalized`]).
///
/// # Errors
///
/// Returns [`TriangulationError::InvalidPolygon`] for unusable input and
/// [`TriangulationError::NoEarFound`] for self-intersecting polygons.
///
/// # Examples
///
/// ```rust
/// use ruppert::geometry::polygon::Polygon;
/// use ruppert::triangulation::triangulator::triangulate;
///
/// let mesh = triangulate(&Polygon::square(1.0)).unwrap();
/// assert_eq!(mesh.number_of_nodes(), 4);
/// assert_eq!(mesh.number_of_edges(), 5);
/// assert_eq!(mesh.number_of_faces(), 2);
/// ```
pub fn triangulate(polygon: &Polygon) -> Result<Mesh<AdaptiveKernel>, TriangulationError> {
    triangulate_with_kernel(polygon, AdaptiveKernel::new())
}

/// Triangulates `polygon` into a new mesh using `kernel`.
///
/// # Errors
///
/// Same as [`triangulate`].
pub fn triangulate_with_kernel<K: Kernel>(
    polygon: &Polygon,
    kernel: K,
) -> Result<Mesh<K>, TriangulationError> {
    let polygon = polygon.normalized()?;
    let mut mesh = Mesh::with_kernel(kernel);
    let start = add_boundary_loop(&mut mesh, &polygon)?;

    let mut clipper = EarClipper::default();
    clipper.classify(&mesh, start);
    clipper.clip(&mut mesh)?;

    let expected = polygon.len() - 2;
    if mesh.number_of_faces() != expected {
        return Err(TriangulationError::NoEarFound {
            faces: mesh.number_of_faces(),
            expected,
        });
    }
    tracing::debug!(
        vertices = polygon.len(),
        faces = mesh.number_of_faces(),
        "triangulated polygon"
    );
    Ok(mesh)
}

/// Adds one node per vertex and one edge per side, returning the interior
/// half-edge entering the first vertex.
fn add_boundary_loop<K: Kernel>(
    mesh: &mut Mesh<K>,
    polygon: &Polygon,
) -> Result<HalfedgeKey, MeshError> {
    let nodes: Vec<NodeKey> = polygon
        .vertices()
        .iter()
        .map(|&p| mesh.add_node(p))
        .collect();
    for pair in nodes.windows(2) {
        mesh.add_edge(pair[0], pair[1])?;
    }
    // `normalized` guarantees at least three vertices.
    let (first, last) = (nodes[0], nodes[nodes.len() - 1]);
    mesh.add_edge(last, first)
}

/// Ear-clipping state. Vertices are represented by the boundary half-edge
/// leaving them.
#[derive(Debug, Default)]
struct EarClipper {
    reflex: Vec<HalfedgeKey>,
    ears: VecDeque<HalfedgeKey>,
}

impl EarClipper {
    fn classify<K: Kernel>(&mut self, mesh: &Mesh<K>, start: HalfedgeKey) {
        let mut convex = Vec::new();
        let mut he = start;
        loop {
            if is_convex(mesh, he) {
                convex.push(he);
            } else {
                self.reflex.push(he);
            }
            he = mesh.next(he);
            if he == start {
                break;
            }
        }
        let ears: VecDeque<HalfedgeKey> = convex
            .into_iter()
            .filter(|&he| self.is_ear(mesh, he))
            .collect();
        self.ears = ears;
    }

    fn clip<K: Kernel>(&mut self, mesh: &mut Mesh<K>) -> Result<(), MeshError> {
        while let Some(&he2) = self.ears.front() {
            let he1 = mesh.prev(he2);
            let he5 = mesh.next(he2);
            let n1 = mesh.origin(he1);
            let n3 = mesh.origin(he5);

            self.ears.retain(|&h| h != he2 && h != he1 && h != he5);
            self.reflex.retain(|&h| h != he1 && h != he5);

            if he5 == mesh.prev(he1) {
                mesh.add_face(he1, he2, he5)?;
                continue;
            }

            let he3 = mesh.add_edge(n3, n1)?;
            let he4 = mesh.pair(he3);
            mesh.add_face(he1, he2, he3)?;

            let mut convex = Vec::with_capacity(2);
            for h in [he4, he5] {
                if is_convex(mesh, h) {
                    convex.push(h);
                } else {
                    self.reflex.push(h);
                }
            }
            for h in convex {
                if self.is_ear(mesh, h) {
                    self.ears.push_back(h);
                }
            }
        }
        Ok(())
    }

    /// A convex vertex is an ear if no reflex vertex other than its
    /// neighbours lies in the closed triangle it spans.
    fn is_ear<K: Kernel>(&self, mesh: &Mesh<K>, he: HalfedgeKey) -> bool {
        let n1 = mesh.origin(mesh.prev(he));
        let n3 = mesh.destination(he);
        let [p1, p2, p3] = [n1, mesh.origin(he), n3].map(|n| mesh.position(n));
        let kernel = mesh.kernel();

        !self.reflex.iter().any(|&r| {
            let node = mesh.origin(r);
            if node == n1 || node == n3 {
                return false;
            }
            let p = mesh.position(node);
            [(p1, p2), (p2, p3), (p3, p1)]
                .into_iter()
                .all(|(a, b)| kernel.orientation(a, b, p) != Orientation::NEGATIVE)
        })
    }
}

fn is_convex<K: Kernel>(mesh: &Mesh<K>, he: HalfedgeKey) -> bool {
    let p1 = mesh.position(mesh.origin(mesh.prev(he)));
    let p2 = mesh.position(mesh.origin(he));
    let p3 = mesh.position(mesh.destination(he));
    mesh.kernel().orientation(p1, p2, p3).is_positive()
}
