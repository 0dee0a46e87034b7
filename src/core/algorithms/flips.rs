//! Edge flips.
//!
//! An interior edge shared by two triangles is the diagonal of the
//! quadrilateral they form. When that quadrilateral is strictly convex, the
//! edge can be *flipped*: replaced by the other diagonal. Flipping relinks
//! the existing half-edges in place, so no entity is created or destroyed and
//! every key stays valid.
//!
//! [`Mesh::flip_edge`] rotates the edge counter-clockwise inside its
//! quadrilateral; [`Mesh::unflip_edge`] rotates it back clockwise and restores
//! every `next`/`prev`/`face` link exactly, which is what the refinement
//! undo log relies on.

use thiserror::Error;

use crate::core::mesh::{EdgeKey, FaceKey, HalfedgeKey, Mesh};
use crate::geometry::kernel::Kernel;
use crate::geometry::point::Point;
use crate::geometry::predicates::InCircle;

/// Errors that can occur when flipping an edge.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum FlipError {
    /// The edge key is stale or foreign.
    #[error("Edge {edge:?} not found in mesh")]
    EdgeNotFound {
        /// The missing edge.
        edge: EdgeKey,
    },
    /// The edge lies on the mesh boundary.
    #[error("Edge {edge:?} is a boundary edge")]
    BoundaryEdge {
        /// The boundary edge.
        edge: EdgeKey,
    },
    /// The edge is marked constrained.
    #[error("Edge {edge:?} is constrained")]
    ConstrainedEdge {
        /// The constrained edge.
        edge: EdgeKey,
    },
    /// The quadrilateral around the edge is not strictly convex.
    #[error("Edge {edge:?} is not the diagonal of a convex quadrilateral")]
    NotConvex {
        /// The non-flippable edge.
        edge: EdgeKey,
    },
}

/// Half-edges of the quadrilateral around an interior edge.
///
/// `h1` runs p1 → p3 and `h2` runs p3 → p1; `a`, `b` complete the face of
/// `h1` and `c`, `d` the face of `h2`.
#[derive(Clone, Copy, Debug)]
struct Quad {
    h1: HalfedgeKey,
    h2: HalfedgeKey,
    a: HalfedgeKey,
    b: HalfedgeKey,
    c: HalfedgeKey,
    d: HalfedgeKey,
}

impl<K: Kernel> Mesh<K> {
    fn quad(&self, edge: EdgeKey) -> Quad {
        let [h1, h2] = self.edge_halfedges(edge);
        Quad {
            h1,
            h2,
            a: self.next(h1),
            b: self.prev(h1),
            c: self.next(h2),
            d: self.prev(h2),
        }
    }

    /// Returns `true` if `edge` separates two faces whose union is a strictly
    /// convex quadrilateral.
    ///
    /// Boundary edges and stale keys give `false`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ruppert::geometry::polygon::Polygon;
    /// use ruppert::triangulation::triangulator::triangulate;
    ///
    /// let mesh = triangulate(&Polygon::square(1.0)).unwrap();
    /// let interior: Vec<_> = mesh
    ///     .edge_keys()
    ///     .filter(|&e| !mesh.is_boundary_edge(e))
    ///     .collect();
    /// assert_eq!(interior.len(), 1);
    /// assert!(mesh.is_diagonal_of_convex_quadrilateral(interior[0]));
    /// ```
    #[must_use]
    pub fn is_diagonal_of_convex_quadrilateral(&self, edge: EdgeKey) -> bool {
        if !self.contains_edge(edge) || self.is_boundary_edge(edge) {
            return false;
        }
        let [p1, p2, p3, p4] = self.quad_vertices(edge);
        let kernel = self.kernel();
        kernel.orientation(p1, p2, p3).is_positive()
            && kernel.orientation(p2, p3, p4).is_positive()
            && kernel.orientation(p3, p4, p1).is_positive()
            && kernel.orientation(p4, p1, p2).is_positive()
    }

    /// Returns `false` only if the apex across `edge` lies strictly inside
    /// the circumcircle of the face on the other side.
    ///
    /// Boundary edges are locally Delaunay.
    #[must_use]
    pub fn is_locally_delaunay(&self, edge: EdgeKey) -> bool {
        if self.is_boundary_edge(edge) {
            return true;
        }
        let [p1, p2, p3, p4] = self.quad_vertices(edge);
        self.kernel().in_circle(p1, p2, p3, p4) != InCircle::INSIDE
    }

    /// Returns `true` if `edge` is constrained (marked or on the boundary) or
    /// locally Delaunay.
    #[must_use]
    pub fn is_constrained_delaunay(&self, edge: EdgeKey) -> bool {
        self.is_constrained(edge) || self.is_locally_delaunay(edge)
    }

    /// Corners of the quadrilateral around an interior edge in
    /// counter-clockwise order, starting at the origin of its first half-edge.
    fn quad_vertices(&self, edge: EdgeKey) -> [Point; 4] {
        let [h1, h2] = self.edge_halfedges(edge);
        [
            self.origin(h1),
            self.origin(self.prev(h2)),
            self.origin(h2),
            self.origin(self.prev(h1)),
        ]
        .map(|n| self.position(n))
    }

    fn check_flippable(&self, edge: EdgeKey) -> Result<(), FlipError> {
        let e = self.get_edge(edge).ok_or(FlipError::EdgeNotFound { edge })?;
        if e.is_marked_constrained() {
            return Err(FlipError::ConstrainedEdge { edge });
        }
        if self.is_boundary_edge(edge) {
            return Err(FlipError::BoundaryEdge { edge });
        }
        if !self.is_diagonal_of_convex_quadrilateral(edge) {
            return Err(FlipError::NotConvex { edge });
        }
        Ok(())
    }

    /// Replaces `edge` by the other diagonal of its quadrilateral.
    ///
    /// The edge keeps its key and half-edges. Flipping twice restores the
    /// original endpoints and face vertex sets.
    ///
    /// # Errors
    ///
    /// Returns a [`FlipError`] if the edge is missing, on the boundary,
    /// constrained, or not the diagonal of a strictly convex quadrilateral.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ruppert::geometry::polygon::Polygon;
    /// use ruppert::triangulation::triangulator::triangulate;
    ///
    /// let mut mesh = triangulate(&Polygon::square(1.0)).unwrap();
    /// let diagonal = mesh
    ///     .edge_keys()
    ///     .find(|&e| !mesh.is_boundary_edge(e))
    ///     .unwrap();
    /// let before = mesh.edge_vertices(diagonal);
    /// mesh.flip_edge(diagonal).unwrap();
    /// assert_ne!(mesh.edge_vertices(diagonal), before);
    /// assert!(mesh.is_valid());
    /// ```
    pub fn flip_edge(&mut self, edge: EdgeKey) -> Result<(), FlipError> {
        self.check_flippable(edge)?;
        let Quad { h1, h2, a, b, c, d } = self.quad(edge);
        let f1 = self.face_of(h1);
        let f2 = self.face_of(h2);
        let (old1, old2) = (self.origin(h1), self.origin(h2));

        self.set_origin(h1, self.origin(d));
        self.set_origin(h2, self.origin(b));
        self.relink_faces([h1, b, c], [h2, d, a], f1, f2);

        if self.node_halfedge(old1) == Some(h1) {
            self.set_node_halfedge(old1, Some(c));
        }
        if self.node_halfedge(old2) == Some(h2) {
            self.set_node_halfedge(old2, Some(a));
        }
        Ok(())
    }

    /// Inverse of [`Mesh::flip_edge`]: rotates `edge` clockwise inside its
    /// quadrilateral.
    ///
    /// `unflip_edge` after `flip_edge` on the same edge restores every
    /// half-edge's `next`, `prev`, `origin` and `face` exactly; node and face
    /// representatives may differ.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Mesh::flip_edge`].
    pub fn unflip_edge(&mut self, edge: EdgeKey) -> Result<(), FlipError> {
        self.check_flippable(edge)?;
        let Quad { h1, h2, a, b, c, d } = self.quad(edge);
        let f1 = self.face_of(h1);
        let f2 = self.face_of(h2);
        let (old1, old2) = (self.origin(h1), self.origin(h2));

        self.set_origin(h1, self.origin(b));
        self.set_origin(h2, self.origin(d));
        self.relink_faces([h1, d, a], [h2, b, c], f1, f2);

        if self.node_halfedge(old1) == Some(h1) {
            self.set_node_halfedge(old1, Some(c));
        }
        if self.node_halfedge(old2) == Some(h2) {
            self.set_node_halfedge(old2, Some(a));
        }
        Ok(())
    }

    fn relink_faces(
        &mut self,
        first: [HalfedgeKey; 3],
        second: [HalfedgeKey; 3],
        f1: Option<FaceKey>,
        f2: Option<FaceKey>,
    ) {
        for (cycle, face) in [(first, f1), (second, f2)] {
            for i in 0..3 {
                self.link(cycle[i], cycle[(i + 1) % 3]);
                self.set_face(cycle[i], face);
            }
            if let Some(face) = face {
                self.set_face_halfedge(face, cycle[0]);
            }
        }
    }
}
