//! Structural validation of a [`Mesh`].
//!
//! [`Mesh::validate`] checks the invariants every completed edit must
//! preserve:
//!
//! 1. `pair` is a fixed-point-free involution.
//! 2. `next`/`prev` are mutually inverse and chain destinations to origins.
//! 3. Every face is a 3-cycle whose half-edges all reference it, and boundary
//!    cycles contain only boundary half-edges.
//! 4. Each node's representative leaves that node, and the rotation
//!    `pair().next()` from it visits every outgoing half-edge exactly once.
//! 5. Every edge's half-edges are mutual pairs that reference the edge.
//!
//! Validation is `O(n)` and intended for tests and debugging.

use thiserror::Error;

use crate::core::collections::{FastHashMap, fast_hash_map_with_capacity};
use crate::core::mesh::{EdgeKey, FaceKey, HalfedgeKey, Mesh, NodeKey};
use crate::geometry::kernel::Kernel;

/// The first invariant violation found by [`Mesh::validate`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum MeshValidationError {
    /// A half-edge references an entity that does not exist.
    #[error("Half-edge {halfedge:?} has a dangling {field} reference")]
    DanglingReference {
        /// The offending half-edge.
        halfedge: HalfedgeKey,
        /// Name of the dangling field.
        field: &'static str,
    },
    /// `pair(h) == h` or `pair(pair(h)) != h`.
    #[error("Pair of half-edge {halfedge:?} is not an involution")]
    PairNotInvolution {
        /// The offending half-edge.
        halfedge: HalfedgeKey,
    },
    /// `prev(next(h)) != h`.
    #[error("next/prev links of half-edge {halfedge:?} are inconsistent")]
    LinkMismatch {
        /// The offending half-edge.
        halfedge: HalfedgeKey,
    },
    /// The destination of `h` is not the origin of `next(h)`.
    #[error("Half-edge {halfedge:?} does not chain into its successor")]
    BrokenChain {
        /// The offending half-edge.
        halfedge: HalfedgeKey,
    },
    /// `h` and `next(h)` disagree about their face.
    #[error("Half-edge {halfedge:?} and its successor have different faces")]
    FaceMismatch {
        /// The offending half-edge.
        halfedge: HalfedgeKey,
    },
    /// A face cycle does not close after three steps.
    #[error("Face {face:?} is not a triangle")]
    NotTriangle {
        /// The offending face.
        face: FaceKey,
    },
    /// A face's representative does not reference the face.
    #[error("Representative half-edge of face {face:?} does not belong to it")]
    FaceRepresentative {
        /// The offending face.
        face: FaceKey,
    },
    /// A node's representative does not leave the node.
    #[error("Representative half-edge of node {node:?} does not leave it")]
    NodeRepresentative {
        /// The offending node.
        node: NodeKey,
    },
    /// The rotation around a node misses or repeats outgoing half-edges.
    #[error("Rotation around node {node:?} visits {visited} of {expected} outgoing half-edges")]
    NodeRotation {
        /// The offending node.
        node: NodeKey,
        /// Half-edges reached by the rotation.
        visited: usize,
        /// Half-edges leaving the node.
        expected: usize,
    },
    /// An edge's half-edges are not its own mutual pair.
    #[error("Half-edges of edge {edge:?} are inconsistent")]
    EdgeMismatch {
        /// The offending edge.
        edge: EdgeKey,
    },
}

impl<K: Kernel> Mesh<K> {
    /// Checks the structural invariants of the mesh.
    ///
    /// # Errors
    ///
    /// Returns the first [`MeshValidationError`] found.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ruppert::geometry::polygon::Polygon;
    /// use ruppert::triangulation::triangulator::triangulate;
    ///
    /// let mesh = triangulate(&Polygon::letter_u()).unwrap();
    /// assert!(mesh.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), MeshValidationError> {
        self.validate_halfedges()?;
        self.validate_faces()?;
        self.validate_edges()?;
        self.validate_nodes()
    }

    /// Returns `true` if [`Mesh::validate`] finds no violation.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    fn validate_halfedges(&self) -> Result<(), MeshValidationError> {
        for (halfedge, he) in self.halfedges() {
            let dangling = |field| MeshValidationError::DanglingReference { halfedge, field };
            if !self.contains_node(he.origin()) {
                return Err(dangling("origin"));
            }
            if !self.contains_edge(he.edge()) {
                return Err(dangling("edge"));
            }
            for (field, key) in [("pair", he.pair()), ("next", he.next()), ("prev", he.prev())] {
                if !self.contains_halfedge(key) {
                    return Err(dangling(field));
                }
            }
            if he.face().is_some_and(|f| !self.contains_face(f)) {
                return Err(dangling("face"));
            }

            if he.pair() == halfedge || self.pair(he.pair()) != halfedge {
                return Err(MeshValidationError::PairNotInvolution { halfedge });
            }
            if self.prev(he.next()) != halfedge || self.next(he.prev()) != halfedge {
                return Err(MeshValidationError::LinkMismatch { halfedge });
            }
            if self.destination(halfedge) != self.origin(he.next()) {
                return Err(MeshValidationError::BrokenChain { halfedge });
            }
            if self.face_of(he.next()) != he.face() {
                return Err(MeshValidationError::FaceMismatch { halfedge });
            }
        }
        Ok(())
    }

    fn validate_faces(&self) -> Result<(), MeshValidationError> {
        for (face, f) in self.faces() {
            let h = f.halfedge();
            if self.face_of(h) != Some(face) {
                return Err(MeshValidationError::FaceRepresentative { face });
            }
            let (h2, h3) = (self.next(h), self.next(self.next(h)));
            if self.next(h3) != h || h2 == h || h3 == h {
                return Err(MeshValidationError::NotTriangle { face });
            }
        }
        Ok(())
    }

    fn validate_edges(&self) -> Result<(), MeshValidationError> {
        for (edge, e) in self.edges() {
            let [h1, h2] = e.halfedges();
            let consistent = self.contains_halfedge(h1)
                && self.contains_halfedge(h2)
                && self.pair(h1) == h2
                && self.edge_of(h1) == edge
                && self.edge_of(h2) == edge;
            if !consistent {
                return Err(MeshValidationError::EdgeMismatch { edge });
            }
        }
        Ok(())
    }

    fn validate_nodes(&self) -> Result<(), MeshValidationError> {
        let mut expected: FastHashMap<NodeKey, usize> =
            fast_hash_map_with_capacity(self.number_of_nodes());
        for (_, he) in self.halfedges() {
            *expected.entry(he.origin()).or_default() += 1;
        }

        for (node, n) in self.nodes() {
            let expected = expected.get(&node).copied().unwrap_or(0);
            let Some(rep) = n.halfedge() else {
                if expected == 0 {
                    continue;
                }
                return Err(MeshValidationError::NodeRotation {
                    node,
                    visited: 0,
                    expected,
                });
            };
            if !self.contains_halfedge(rep) || self.origin(rep) != node {
                return Err(MeshValidationError::NodeRepresentative { node });
            }

            let mut visited = 0;
            let mut h = rep;
            loop {
                if self.origin(h) != node || visited > expected {
                    return Err(MeshValidationError::NodeRotation {
                        node,
                        visited,
                        expected,
                    });
                }
                visited += 1;
                h = self.next(self.pair(h));
                if h == rep {
                    break;
                }
            }
            if visited != expected {
                return Err(MeshValidationError::NodeRotation {
                    node,
                    visited,
                    expected,
                });
            }
        }
        Ok(())
    }
}
