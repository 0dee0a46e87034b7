//! Point location by walking across faces.
//!
//! [`Mesh::locate`] starts from a hint face and repeatedly crosses the first
//! edge that separates the current face from the query point, using the
//! kernel's exact orientation test. The walk ends when the point is on the
//! left of all three edges of a face, on an edge or node, or when it would
//! have to leave the mesh through a boundary edge.
//!
//! The walk is bounded by a step budget proportional to the mesh size; on a
//! well-formed triangulation the budget is never reached.
//!
//! # References
//!
//! - O. Devillers, S. Pion, and M. Teillaud, "Walking in a Triangulation",
//!   International Journal of Foundations of Computer Science, 2001.

use thiserror::Error;

use crate::core::mesh::{FaceKey, HalfedgeKey, Mesh, NodeKey};
use crate::geometry::kernel::Kernel;
use crate::geometry::point::Point;
use crate::geometry::predicates::Orientation;

/// Where a query point lies relative to the mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// Strictly inside the face.
    InFace(FaceKey),
    /// In the interior of the half-edge's edge; the half-edge belongs to the
    /// last face visited.
    OnEdge(HalfedgeKey),
    /// Exactly on the node.
    OnNode(NodeKey),
    /// Beyond the boundary edge of this half-edge. The half-edge is the
    /// interior side; its pair has no face.
    OutsideMesh(HalfedgeKey),
}

/// Errors raised by [`Mesh::locate`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum LocateError {
    /// The mesh has no faces.
    #[error("Cannot locate in a mesh without faces")]
    EmptyMesh,
    /// The starting face does not exist.
    #[error("Start face {face:?} not found in mesh")]
    FaceNotFound {
        /// The stale face key.
        face: FaceKey,
    },
    /// The walk exceeded its step budget.
    #[error("Point location did not terminate after {steps} steps")]
    WalkDidNotTerminate {
        /// Steps taken.
        steps: usize,
    },
}

/// Returns `true` if `x` lies strictly between `a` and `b`.
fn strictly_between(a: f64, b: f64, x: f64) -> bool {
    (a < x && x < b) || (b < x && x < a)
}

impl<K: Kernel> Mesh<K> {
    /// Locates `p`, walking from `start` (or an arbitrary face when `None`).
    ///
    /// # Errors
    ///
    /// Returns [`LocateError::EmptyMesh`] for a mesh without faces,
    /// [`LocateError::FaceNotFound`] for a stale start face, and
    /// [`LocateError::WalkDidNotTerminate`] if the step budget is exhausted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ruppert::core::algorithms::locate::Location;
    /// use ruppert::geometry::point::Point;
    /// use ruppert::geometry::polygon::Polygon;
    /// use ruppert::triangulation::triangulator::triangulate;
    ///
    /// let mesh = triangulate(&Polygon::square(1.0)).unwrap();
    /// assert!(matches!(
    ///     mesh.locate(Point::new([0.7, 0.2]), None),
    ///     Ok(Location::InFace(_))
    /// ));
    /// assert!(matches!(
    ///     mesh.locate(Point::new([2.0, 0.5]), None),
    ///     Ok(Location::OutsideMesh(_))
    /// ));
    /// ```
    pub fn locate(&self, p: Point, start: Option<FaceKey>) -> Result<Location, LocateError> {
        let mut face = match start {
            Some(face) if self.contains_face(face) => face,
            Some(face) => return Err(LocateError::FaceNotFound { face }),
            None => self.face_keys().next().ok_or(LocateError::EmptyMesh)?,
        };
        let mut he = self.face_halfedge(face);
        let mut he_start = he;
        let steps = 3 * self.number_of_halfedges() + 8;

        for _ in 0..steps {
            let (n1, n2) = (self.origin(he), self.destination(he));
            let (p1, p2) = (self.position(n1), self.position(n2));
            match self.kernel().orientation(p1, p2, p) {
                Orientation::POSITIVE => {
                    he = self.next(he);
                    if he == he_start {
                        return Ok(Location::InFace(face));
                    }
                    continue;
                }
                Orientation::DEGENERATE => {
                    if strictly_between(p1.x(), p2.x(), p.x())
                        || strictly_between(p1.y(), p2.y(), p.y())
                    {
                        return Ok(Location::OnEdge(he));
                    }
                    if p == p1 {
                        return Ok(Location::OnNode(n1));
                    }
                    if p == p2 {
                        return Ok(Location::OnNode(n2));
                    }
                    // On the line through `he` but beyond an endpoint: another
                    // edge of this face separates `p`, so do not cross here.
                    he = self.next(he);
                    if he == he_start {
                        return Ok(Location::InFace(face));
                    }
                    continue;
                }
                Orientation::NEGATIVE => {}
            }

            // Cross `he` into the neighbouring face.
            let pair = self.pair(he);
            let Some(across) = self.face_of(pair) else {
                return Ok(Location::OutsideMesh(he));
            };
            face = across;
            he_start = pair;
            he = self.next(pair);
        }

        tracing::warn!(?p, steps, "point location exceeded its step budget");
        Err(LocateError::WalkDidNotTerminate { steps })
    }
}
