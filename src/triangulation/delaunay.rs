//! Constrained Delaunay maintenance by edge flipping.
//!
//! [`make_cdt`] turns any triangulation into a constrained Delaunay
//! triangulation: every edge that is neither constrained (marked, or on the
//! boundary) nor locally Delaunay is the diagonal of a convex quadrilateral
//! and gets flipped. Each flip strictly decreases a discrete potential, so the
//! pass terminates.
//!
//! The work set is a deduplicating FIFO queue, which makes the sequence of
//! flips (and therefore the output) deterministic for a given input.

use std::collections::VecDeque;

use thiserror::Error;

use crate::core::algorithms::flips::FlipError;
use crate::core::collections::{EdgeKeySet, fast_hash_set_with_capacity};
use crate::core::mesh::{EdgeKey, Mesh};
use crate::geometry::kernel::Kernel;
use crate::geometry::point::Point;

/// An edge violating the constrained Delaunay property.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DelaunayValidationError {
    /// The edge is unconstrained and its opposite apexes see each other's
    /// circumcircles.
    #[error("Edge {edge:?} is not locally Delaunay")]
    NotLocallyDelaunay {
        /// The offending edge.
        edge: EdgeKey,
    },
}

/// Flips edges until the triangulation is constrained Delaunay and returns
/// the number of flips performed.
///
/// Running it again on its own output performs no flip.
///
/// # Errors
///
/// Returns a [`FlipError`] only if the mesh is corrupted.
///
/// # Examples
///
/// ```rust
/// use ruppert::geometry::polygon::Polygon;
/// use ruppert::triangulation::delaunay::{make_cdt, validate_delaunay};
/// use ruppert::triangulation::triangulator::triangulate;
///
/// let mut mesh = triangulate(&Polygon::kidney()).unwrap();
/// make_cdt(&mut mesh).unwrap();
/// assert!(validate_delaunay(&mesh).is_ok());
/// assert_eq!(make_cdt(&mut mesh).unwrap(), 0);
/// ```
pub fn make_cdt<K: Kernel>(mesh: &mut Mesh<K>) -> Result<usize, FlipError> {
    let mut queue: VecDeque<EdgeKey> = mesh
        .edge_keys()
        .filter(|&e| !mesh.is_constrained_delaunay(e))
        .collect();
    let mut queued: EdgeKeySet = fast_hash_set_with_capacity(mesh.number_of_edges());
    queued.extend(queue.iter().copied());

    let mut flips = 0;
    while let Some(edge) = queue.pop_front() {
        queued.remove(&edge);
        if !mesh.is_diagonal_of_convex_quadrilateral(edge) || mesh.is_constrained_delaunay(edge) {
            continue;
        }

        let [h1, h2] = mesh.edge_halfedges(edge);
        for h in [mesh.next(h1), mesh.prev(h1), mesh.next(h2), mesh.prev(h2)] {
            let e = mesh.edge_of(h);
            if queued.insert(e) {
                queue.push_back(e);
            }
        }
        mesh.flip_edge(edge)?;
        flips += 1;
    }

    tracing::debug!(flips, edges = mesh.number_of_edges(), "constrained Delaunay pass finished");
    Ok(flips)
}

/// Returns `true` if `p` lies strictly inside the diametral circle of `edge`.
///
/// Points on the circle, including the endpoints, do not encroach.
///
/// # Panics
///
/// Panics if `edge` is not in the mesh.
///
/// # Examples
///
/// ```rust
/// use ruppert::geometry::point::Point;
/// use ruppert::geometry::polygon::Polygon;
/// use ruppert::triangulation::delaunay::is_encroached;
/// use ruppert::triangulation::triangulator::triangulate;
///
/// let mesh = triangulate(&Polygon::square(2.0)).unwrap();
/// let bottom = mesh
///     .edge_keys()
///     .find(|&e| mesh.edge_vertices(e).iter().all(|p| p.y() == 0.0))
///     .unwrap();
/// assert!(is_encroached(&mesh, bottom, Point::new([1.0, 0.5])));
/// assert!(!is_encroached(&mesh, bottom, Point::new([1.0, 1.0])));
/// ```
#[must_use]
pub fn is_encroached<K: Kernel>(mesh: &Mesh<K>, edge: EdgeKey, p: Point) -> bool {
    let [p1, p2] = mesh.edge_vertices(edge);
    (p1 - p).dot(p2 - p) < 0.0
}

/// Checks that every edge is constrained or locally Delaunay.
///
/// # Errors
///
/// Returns the first offending edge.
pub fn validate_delaunay<K: Kernel>(mesh: &Mesh<K>) -> Result<(), DelaunayValidationError> {
    match mesh.edge_keys().find(|&e| !mesh.is_constrained_delaunay(e)) {
        Some(edge) => Err(DelaunayValidationError::NotLocallyDelaunay { edge }),
        None => Ok(()),
    }
}
