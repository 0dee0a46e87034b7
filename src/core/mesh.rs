//! Half-edge mesh kernel.
//!
//! [`Mesh`] owns every node, half-edge, edge and face in arena storage and
//! exposes the topology-editing primitives the triangulation algorithms are
//! built from: adding and removing nodes, edges and faces, plus navigation
//! along `pair`/`next`/`prev` links.
//!
//! # Representation
//!
//! - A [`Node`] stores its position and one *representative* outgoing
//!   half-edge (absent for isolated nodes).
//! - A [`Halfedge`] stores its origin, its `pair` (the opposite half-edge of
//!   the same edge), the `next`/`prev` links of the cycle it belongs to, its
//!   owning edge, and an optional face. A half-edge without a face is a
//!   *boundary* half-edge; boundary half-edges form closed cycles around the
//!   exterior of the mesh.
//! - An [`Edge`] owns two paired half-edges, an optional boundary curve and a
//!   `constrained` flag.
//! - A [`Face`] is a triangle referenced by one of its half-edges.
//!
//! Keys are generation-tagged: once an entity is removed its key never
//! aliases a later entity. Navigation methods such as [`Mesh::next`] index the
//! arenas directly and panic on stale keys; use the `get_*` and `contains_*`
//! methods where a key may have been invalidated.
//!
//! # Examples
//!
//! ```rust
//! use ruppert::core::mesh::Mesh;
//! use ruppert::geometry::point::Point;
//!
//! let mut mesh = Mesh::new();
//! let a = mesh.add_node(Point::new([0.0, 0.0]));
//! let b = mesh.add_node(Point::new([1.0, 0.0]));
//! let c = mesh.add_node(Point::new([0.0, 1.0]));
//!
//! let ab = mesh.add_edge(a, b).unwrap();
//! let bc = mesh.add_edge(b, c).unwrap();
//! let ca = mesh.add_edge(c, a).unwrap();
//! let face = mesh.add_face(ab, bc, ca).unwrap();
//!
//! assert_eq!(mesh.number_of_faces(), 1);
//! assert_eq!(mesh.face_nodes(face), [a, b, c]);
//! assert!(mesh.is_valid());
//! ```

use slotmap::{Key, new_key_type};
use thiserror::Error;

use crate::core::boundary::CurveRef;
use crate::core::collections::StorageMap;
use crate::geometry::bounding_box::BoundingBox;
use crate::geometry::kernel::{AdaptiveKernel, Kernel};
use crate::geometry::point::Point;
use crate::geometry::util::{midpoint, min_angle};

// =============================================================================
// KEYS
// =============================================================================

new_key_type! {
    /// Key identifying a [`Node`] in a [`Mesh`].
    pub struct NodeKey;
}

new_key_type! {
    /// Key identifying a [`Halfedge`] in a [`Mesh`].
    pub struct HalfedgeKey;
}

new_key_type! {
    /// Key identifying an [`Edge`] in a [`Mesh`].
    pub struct EdgeKey;
}

new_key_type! {
    /// Key identifying a [`Face`] in a [`Mesh`].
    pub struct FaceKey;
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised by the structural mesh primitives.
///
/// Apart from [`MeshError::Face`], these indicate a malformed call or a broken
/// internal invariant rather than an expected outcome.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum MeshError {
    /// An edge was requested between a node and itself.
    #[error("Degenerate edge: both endpoints are node {node:?}")]
    DegenerateEdge {
        /// The repeated endpoint.
        node: NodeKey,
    },
    /// The node key is stale or foreign.
    #[error("Node {node:?} not found in mesh")]
    NodeNotFound {
        /// The missing node.
        node: NodeKey,
    },
    /// The half-edge key is stale or foreign.
    #[error("Half-edge {halfedge:?} not found in mesh")]
    HalfedgeNotFound {
        /// The missing half-edge.
        halfedge: HalfedgeKey,
    },
    /// The edge key is stale or foreign.
    #[error("Edge {edge:?} not found in mesh")]
    EdgeNotFound {
        /// The missing edge.
        edge: EdgeKey,
    },
    /// The face key is stale or foreign.
    #[error("Face {face:?} not found in mesh")]
    FaceNotFound {
        /// The missing face.
        face: FaceKey,
    },
    /// A non-isolated node has no boundary half-edge to splice a new edge into.
    #[error("No free incident half-edge at node {node:?}")]
    NoFreeIncidentHalfedge {
        /// The saturated node.
        node: NodeKey,
    },
    /// A face could not be created.
    #[error(transparent)]
    Face(#[from] FaceError),
}

/// Reasons [`Mesh::add_face`] declines to create a face.
///
/// These are expected outcomes that callers branch on; the mesh counts are
/// unchanged when one is returned.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum FaceError {
    /// A half-edge key is stale or foreign.
    #[error("Half-edge {halfedge:?} not found in mesh")]
    HalfedgeNotFound {
        /// The missing half-edge.
        halfedge: HalfedgeKey,
    },
    /// A half-edge already bounds a face.
    #[error("Half-edge {halfedge:?} already has a face")]
    NotBoundary {
        /// The occupied half-edge.
        halfedge: HalfedgeKey,
    },
    /// The destination of one half-edge is not the origin of the next.
    #[error("Half-edges {from:?} and {to:?} do not chain")]
    NotChained {
        /// The half-edge whose destination does not match.
        from: HalfedgeKey,
        /// The half-edge expected to continue the chain.
        to: HalfedgeKey,
    },
    /// Making the two half-edges consecutive would create a non-manifold node.
    #[error("Cannot make {incoming:?} and {outgoing:?} adjacent without a non-manifold node")]
    NonManifold {
        /// Half-edge entering the shared node.
        incoming: HalfedgeKey,
        /// Half-edge leaving the shared node.
        outgoing: HalfedgeKey,
    },
}

// =============================================================================
// ENTITIES
// =============================================================================

/// A mesh vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub(crate) position: Point,
    pub(crate) halfedge: Option<HalfedgeKey>,
}

impl Node {
    /// Position of the node.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Representative outgoing half-edge, if any.
    #[must_use]
    pub const fn halfedge(&self) -> Option<HalfedgeKey> {
        self.halfedge
    }

    /// Returns `true` if no edge is incident to the node.
    #[must_use]
    pub const fn is_isolated(&self) -> bool {
        self.halfedge.is_none()
    }
}

/// One directed side of an [`Edge`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Halfedge {
    pub(crate) origin: NodeKey,
    pub(crate) pair: HalfedgeKey,
    pub(crate) next: HalfedgeKey,
    pub(crate) prev: HalfedgeKey,
    pub(crate) edge: EdgeKey,
    pub(crate) face: Option<FaceKey>,
}

impl Halfedge {
    fn unlinked(origin: NodeKey, edge: EdgeKey) -> Self {
        Self {
            origin,
            pair: HalfedgeKey::null(),
            next: HalfedgeKey::null(),
            prev: HalfedgeKey::null(),
            edge,
            face: None,
        }
    }

    /// Node the half-edge starts at.
    #[must_use]
    pub const fn origin(&self) -> NodeKey {
        self.origin
    }

    /// Opposite half-edge of the same edge.
    #[must_use]
    pub const fn pair(&self) -> HalfedgeKey {
        self.pair
    }

    /// Next half-edge in the face or boundary cycle.
    #[must_use]
    pub const fn next(&self) -> HalfedgeKey {
        self.next
    }

    /// Previous half-edge in the face or boundary cycle.
    #[must_use]
    pub const fn prev(&self) -> HalfedgeKey {
        self.prev
    }

    /// Owning edge.
    #[must_use]
    pub const fn edge(&self) -> EdgeKey {
        self.edge
    }

    /// Incident face, `None` on the boundary.
    #[must_use]
    pub const fn face(&self) -> Option<FaceKey> {
        self.face
    }

    /// Returns `true` if the half-edge has no face.
    #[must_use]
    pub const fn is_boundary(&self) -> bool {
        self.face.is_none()
    }
}

/// An undirected mesh edge.
#[derive(Clone, Debug)]
pub struct Edge {
    pub(crate) halfedges: [HalfedgeKey; 2],
    pub(crate) curve: Option<CurveRef>,
    pub(crate) constrained: bool,
}

impl Edge {
    /// The two half-edges; the first is the one returned by [`Mesh::add_edge`].
    #[must_use]
    pub const fn halfedges(&self) -> [HalfedgeKey; 2] {
        self.halfedges
    }

    /// Boundary curve the edge lies on, if any.
    #[must_use]
    pub const fn curve(&self) -> Option<&CurveRef> {
        self.curve.as_ref()
    }

    /// Whether the edge was explicitly marked as constrained.
    #[must_use]
    pub const fn is_marked_constrained(&self) -> bool {
        self.constrained
    }
}

/// A triangular face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Face {
    pub(crate) halfedge: HalfedgeKey,
}

impl Face {
    /// Representative half-edge of the face.
    #[must_use]
    pub const fn halfedge(&self) -> HalfedgeKey {
        self.halfedge
    }
}

// =============================================================================
// MESH
// =============================================================================

/// A planar half-edge mesh of triangles.
///
/// The kernel parameter supplies the geometric predicates used by the mesh's
/// geometric queries and by the algorithms operating on it.
#[derive(Clone, Debug, Default)]
pub struct Mesh<K: Kernel = AdaptiveKernel> {
    kernel: K,
    nodes: StorageMap<NodeKey, Node>,
    halfedges: StorageMap<HalfedgeKey, Halfedge>,
    edges: StorageMap<EdgeKey, Edge>,
    faces: StorageMap<FaceKey, Face>,
}

impl Mesh<AdaptiveKernel> {
    /// Creates an empty mesh with the exact adaptive kernel.
    #[must_use]
    pub fn new() -> Self {
        Self::with_kernel(AdaptiveKernel::new())
    }
}

impl<K: Kernel> Mesh<K> {
    /// Creates an empty mesh using `kernel` for its predicates.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ruppert::core::mesh::Mesh;
    /// use ruppert::geometry::kernel::FastKernel;
    ///
    /// let mesh = Mesh::with_kernel(FastKernel::new());
    /// assert!(mesh.is_empty());
    /// ```
    #[must_use]
    pub fn with_kernel(kernel: K) -> Self {
        Self {
            kernel,
            nodes: StorageMap::with_key(),
            halfedges: StorageMap::with_key(),
            edges: StorageMap::with_key(),
            faces: StorageMap::with_key(),
        }
    }

    /// The geometric kernel.
    #[must_use]
    pub const fn kernel(&self) -> &K {
        &self.kernel
    }

    // -------------------------------------------------------------------------
    // Counts
    // -------------------------------------------------------------------------

    /// Number of nodes.
    #[must_use]
    pub fn number_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of half-edges (twice the number of edges).
    #[must_use]
    pub fn number_of_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn number_of_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of faces.
    #[must_use]
    pub fn number_of_faces(&self) -> usize {
        self.faces.len()
    }

    /// Returns `true` if the mesh has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// The node for `key`, if it exists.
    #[must_use]
    pub fn get_node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// The half-edge for `key`, if it exists.
    #[must_use]
    pub fn get_halfedge(&self, key: HalfedgeKey) -> Option<&Halfedge> {
        self.halfedges.get(key)
    }

    /// The edge for `key`, if it exists.
    #[must_use]
    pub fn get_edge(&self, key: EdgeKey) -> Option<&Edge> {
        self.edges.get(key)
    }

    /// The face for `key`, if it exists.
    #[must_use]
    pub fn get_face(&self, key: FaceKey) -> Option<&Face> {
        self.faces.get(key)
    }

    /// Returns `true` if `key` refers to a live node.
    #[must_use]
    pub fn contains_node(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Returns `true` if `key` refers to a live half-edge.
    #[must_use]
    pub fn contains_halfedge(&self, key: HalfedgeKey) -> bool {
        self.halfedges.contains_key(key)
    }

    /// Returns `true` if `key` refers to a live edge.
    #[must_use]
    pub fn contains_edge(&self, key: EdgeKey) -> bool {
        self.edges.contains_key(key)
    }

    /// Returns `true` if `key` refers to a live face.
    #[must_use]
    pub fn contains_face(&self, key: FaceKey) -> bool {
        self.faces.contains_key(key)
    }

    // -------------------------------------------------------------------------
    // Iteration
    // -------------------------------------------------------------------------

    /// Iterates over all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.nodes.iter()
    }

    /// Iterates over all node keys.
    pub fn node_keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes.keys()
    }

    /// Iterates over all half-edges.
    pub fn halfedges(&self) -> impl Iterator<Item = (HalfedgeKey, &Halfedge)> {
        self.halfedges.iter()
    }

    /// Iterates over all half-edge keys.
    pub fn halfedge_keys(&self) -> impl Iterator<Item = HalfedgeKey> + '_ {
        self.halfedges.keys()
    }

    /// Iterates over all edges.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &Edge)> {
        self.edges.iter()
    }

    /// Iterates over all edge keys.
    pub fn edge_keys(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.edges.keys()
    }

    /// Iterates over all faces.
    pub fn faces(&self) -> impl Iterator<Item = (FaceKey, &Face)> {
        self.faces.iter()
    }

    /// Iterates over all face keys.
    pub fn face_keys(&self) -> impl Iterator<Item = FaceKey> + '_ {
        self.faces.keys()
    }

    /// Iterates over the half-edges without a face.
    pub fn boundary_halfedges(&self) -> impl Iterator<Item = HalfedgeKey> + '_ {
        self.halfedges
            .iter()
            .filter(|(_, h)| h.is_boundary())
            .map(|(key, _)| key)
    }

    /// Some half-edge without a face, if the mesh has one.
    #[must_use]
    pub fn boundary_halfedge(&self) -> Option<HalfedgeKey> {
        self.boundary_halfedges().next()
    }

    /// The half-edges leaving `node`, in rotational order starting at its
    /// representative.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not in the mesh.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ruppert::core::mesh::Mesh;
    /// use ruppert::geometry::point::Point;
    ///
    /// let mut mesh = Mesh::new();
    /// let center = mesh.add_node(Point::new([0.0, 0.0]));
    /// for p in [[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0]] {
    ///     let n = mesh.add_node(Point::new(p));
    ///     mesh.add_edge(center, n).unwrap();
    /// }
    /// assert_eq!(mesh.outgoing_halfedges(center).count(), 3);
    /// assert_eq!(mesh.degree(center), 3);
    /// ```
    #[must_use]
    pub fn outgoing_halfedges(&self, node: NodeKey) -> OutgoingHalfedges<'_, K> {
        let start = self.nodes[node].halfedge;
        OutgoingHalfedges {
            mesh: self,
            start,
            current: start,
            remaining: self.halfedges.len(),
        }
    }

    /// Number of edges incident to `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not in the mesh.
    #[must_use]
    pub fn degree(&self, node: NodeKey) -> usize {
        self.outgoing_halfedges(node).count()
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Position of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not in the mesh.
    #[must_use]
    pub fn position(&self, node: NodeKey) -> Point {
        self.nodes[node].position
    }

    /// Representative outgoing half-edge of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not in the mesh.
    #[must_use]
    pub fn node_halfedge(&self, node: NodeKey) -> Option<HalfedgeKey> {
        self.nodes[node].halfedge
    }

    /// Origin of `h`.
    ///
    /// # Panics
    ///
    /// Panics if `h` is not in the mesh.
    #[must_use]
    pub fn origin(&self, h: HalfedgeKey) -> NodeKey {
        self.halfedges[h].origin
    }

    /// Destination of `h`, the origin of its pair.
    ///
    /// # Panics
    ///
    /// Panics if `h` is not in the mesh.
    #[must_use]
    pub fn destination(&self, h: HalfedgeKey) -> NodeKey {
        self.origin(self.pair(h))
    }

    /// Pair of `h`.
    ///
    /// # Panics
    ///
    /// Panics if `h` is not in the mesh.
    #[must_use]
    pub fn pair(&self, h: HalfedgeKey) -> HalfedgeKey {
        self.halfedges[h].pair
    }

    /// Successor of `h` in its cycle.
    ///
    /// # Panics
    ///
    /// Panics if `h` is not in the mesh.
    #[must_use]
    pub fn next(&self, h: HalfedgeKey) -> HalfedgeKey {
        self.halfedges[h].next
    }

    /// Predecessor of `h` in its cycle.
    ///
    /// # Panics
    ///
    /// Panics if `h` is not in the mesh.
    #[must_use]
    pub fn prev(&self, h: HalfedgeKey) -> HalfedgeKey {
        self.halfedges[h].prev
    }

    /// Edge owning `h`.
    ///
    /// # Panics
    ///
    /// Panics if `h` is not in the mesh.
    #[must_use]
    pub fn edge_of(&self, h: HalfedgeKey) -> EdgeKey {
        self.halfedges[h].edge
    }

    /// Face of `h`, `None` on the boundary.
    ///
    /// # Panics
    ///
    /// Panics if `h` is not in the mesh.
    #[must_use]
    pub fn face_of(&self, h: HalfedgeKey) -> Option<FaceKey> {
        self.halfedges[h].face
    }

    /// Returns `true` if `h` has no face.
    ///
    /// # Panics
    ///
    /// Panics if `h` is not in the mesh.
    #[must_use]
    pub fn is_boundary_halfedge(&self, h: HalfedgeKey) -> bool {
        self.halfedges[h].face.is_none()
    }

    /// The two half-edges of `edge`.
    ///
    /// # Panics
    ///
    /// Panics if `edge` is not in the mesh.
    #[must_use]
    pub fn edge_halfedges(&self, edge: EdgeKey) -> [HalfedgeKey; 2] {
        self.edges[edge].halfedges
    }

    /// Endpoints of `edge`, origin of its first half-edge first.
    ///
    /// # Panics
    ///
    /// Panics if `edge` is not in the mesh.
    #[must_use]
    pub fn edge_nodes(&self, edge: EdgeKey) -> [NodeKey; 2] {
        let [h1, h2] = self.edges[edge].halfedges;
        [self.origin(h1), self.origin(h2)]
    }

    /// Endpoint positions of `edge`.
    ///
    /// # Panics
    ///
    /// Panics if `edge` is not in the mesh.
    #[must_use]
    pub fn edge_vertices(&self, edge: EdgeKey) -> [Point; 2] {
        self.edge_nodes(edge).map(|n| self.position(n))
    }

    /// Representative half-edge of `face`.
    ///
    /// # Panics
    ///
    /// Panics if `face` is not in the mesh.
    #[must_use]
    pub fn face_halfedge(&self, face: FaceKey) -> HalfedgeKey {
        self.faces[face].halfedge
    }

    /// The three half-edges of `face`, starting at its representative.
    ///
    /// # Panics
    ///
    /// Panics if `face` is not in the mesh.
    #[must_use]
    pub fn face_halfedges(&self, face: FaceKey) -> [HalfedgeKey; 3] {
        let h1 = self.face_halfedge(face);
        let h2 = self.next(h1);
        [h1, h2, self.next(h2)]
    }

    /// The three corners of `face` in counter-clockwise order.
    ///
    /// # Panics
    ///
    /// Panics if `face` is not in the mesh.
    #[must_use]
    pub fn face_nodes(&self, face: FaceKey) -> [NodeKey; 3] {
        self.face_halfedges(face).map(|h| self.origin(h))
    }

    /// Corner positions of `face`.
    ///
    /// # Panics
    ///
    /// Panics if `face` is not in the mesh.
    #[must_use]
    pub fn face_vertices(&self, face: FaceKey) -> [Point; 3] {
        self.face_nodes(face).map(|n| self.position(n))
    }

    /// Area of `face`.
    ///
    /// # Panics
    ///
    /// Panics if `face` is not in the mesh.
    #[must_use]
    pub fn face_area(&self, face: FaceKey) -> f64 {
        let [a, b, c] = self.face_vertices(face);
        self.kernel.signed_area(a, b, c)
    }

    /// Smallest interior angle of `face`, in radians.
    ///
    /// # Panics
    ///
    /// Panics if `face` is not in the mesh.
    #[must_use]
    pub fn face_min_angle(&self, face: FaceKey) -> f64 {
        let [a, b, c] = self.face_vertices(face);
        min_angle(a, b, c)
    }

    /// The half-edge from `from` to `to`, if the two nodes are adjacent.
    #[must_use]
    pub fn find_halfedge(&self, from: NodeKey, to: NodeKey) -> Option<HalfedgeKey> {
        if !self.contains_node(from) {
            return None;
        }
        self.outgoing_halfedges(from)
            .find(|&h| self.destination(h) == to)
    }

    /// The face with corners `n1`, `n2`, `n3` in counter-clockwise order (any
    /// rotation), if it exists.
    #[must_use]
    pub fn find_face(&self, n1: NodeKey, n2: NodeKey, n3: NodeKey) -> Option<FaceKey> {
        let h = self.find_halfedge(n1, n2)?;
        let face = self.face_of(h)?;
        (self.origin(self.prev(h)) == n3).then_some(face)
    }

    /// Bounding box of all node positions, `None` for an empty mesh.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.nodes.values().map(Node::position))
    }

    // -------------------------------------------------------------------------
    // Edge attributes
    // -------------------------------------------------------------------------

    /// Returns `true` if either side of `edge` has no face.
    ///
    /// # Panics
    ///
    /// Panics if `edge` is not in the mesh.
    #[must_use]
    pub fn is_boundary_edge(&self, edge: EdgeKey) -> bool {
        let [h1, h2] = self.edges[edge].halfedges;
        self.is_boundary_halfedge(h1) || self.is_boundary_halfedge(h2)
    }

    /// Returns `true` if `edge` must not be flipped: it is explicitly marked
    /// constrained or lies on the boundary.
    ///
    /// # Panics
    ///
    /// Panics if `edge` is not in the mesh.
    #[must_use]
    pub fn is_constrained(&self, edge: EdgeKey) -> bool {
        self.edges[edge].constrained || self.is_boundary_edge(edge)
    }

    /// Marks or unmarks `edge` as constrained.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::EdgeNotFound`] for a stale key.
    pub fn set_constrained(&mut self, edge: EdgeKey, constrained: bool) -> Result<(), MeshError> {
        self.edges
            .get_mut(edge)
            .ok_or(MeshError::EdgeNotFound { edge })?
            .constrained = constrained;
        Ok(())
    }

    /// Attaches a boundary curve to `edge`, or clears it with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::EdgeNotFound`] for a stale key.
    pub fn set_curve(&mut self, edge: EdgeKey, curve: Option<CurveRef>) -> Result<(), MeshError> {
        self.edges
            .get_mut(edge)
            .ok_or(MeshError::EdgeNotFound { edge })?
            .curve = curve;
        Ok(())
    }

    /// Point splitting `edge`: the curve midpoint for curved edges, the
    /// Euclidean midpoint otherwise.
    ///
    /// # Panics
    ///
    /// Panics if `edge` is not in the mesh.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ruppert::core::mesh::Mesh;
    /// use ruppert::geometry::point::Point;
    ///
    /// let mut mesh = Mesh::new();
    /// let a = mesh.add_node(Point::new([0.0, 0.0]));
    /// let b = mesh.add_node(Point::new([2.0, 4.0]));
    /// let h = mesh.add_edge(a, b).unwrap();
    /// assert_eq!(mesh.edge_midpoint(mesh.edge_of(h)), Point::new([1.0, 2.0]));
    /// ```
    #[must_use]
    pub fn edge_midpoint(&self, edge: EdgeKey) -> Point {
        let [p1, p2] = self.edge_vertices(edge);
        self.edges[edge]
            .curve
            .as_ref()
            .map_or_else(|| midpoint(p1, p2), |curve| curve.midpoint(p1, p2))
    }

    // -------------------------------------------------------------------------
    // Structural edits
    // -------------------------------------------------------------------------

    /// Adds an isolated node at `position`.
    pub fn add_node(&mut self, position: Point) -> NodeKey {
        self.nodes.insert(Node {
            position,
            halfedge: None,
        })
    }

    /// Adds an edge between `n1` and `n2` and returns its half-edge leaving
    /// `n1`.
    ///
    /// At a node that already has edges, the new edge is spliced in after the
    /// first boundary half-edge found entering the node in rotational order.
    /// The new edge is straight and unconstrained.
    ///
    /// # Errors
    ///
    /// - [`MeshError::DegenerateEdge`] if `n1 == n2`.
    /// - [`MeshError::NodeNotFound`] for a stale node key.
    /// - [`MeshError::NoFreeIncidentHalfedge`] if a non-isolated endpoint has
    ///   no boundary half-edge.
    ///
    /// The mesh is unchanged when an error is returned.
    pub fn add_edge(&mut self, n1: NodeKey, n2: NodeKey) -> Result<HalfedgeKey, MeshError> {
        if n1 == n2 {
            return Err(MeshError::DegenerateEdge { node: n1 });
        }
        for node in [n1, n2] {
            if !self.contains_node(node) {
                return Err(MeshError::NodeNotFound { node });
            }
        }
        let free1 = self.find_free_incident_halfedge(n1)?;
        let free2 = self.find_free_incident_halfedge(n2)?;

        let edge = self.edges.insert(Edge {
            halfedges: [HalfedgeKey::null(); 2],
            curve: None,
            constrained: false,
        });
        let h1 = self.halfedges.insert(Halfedge::unlinked(n1, edge));
        let h2 = self.halfedges.insert(Halfedge::unlinked(n2, edge));
        for (h, other) in [(h1, h2), (h2, h1)] {
            let he = &mut self.halfedges[h];
            he.pair = other;
            he.next = other;
            he.prev = other;
        }
        self.edges[edge].halfedges = [h1, h2];

        self.attach(h1, n1, free1);
        self.attach(h2, n2, free2);
        Ok(h1)
    }

    /// Adds a triangle bounded by the chain `h1 → h2 → h3`.
    ///
    /// The half-edges must all be on the boundary and the destination of each
    /// must be the origin of the next. Neighbouring boundary cycles are
    /// reordered so that the three half-edges become consecutive.
    ///
    /// # Errors
    ///
    /// Returns a [`FaceError`] when the face cannot be created. This is an
    /// expected outcome: node, edge and face counts are unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ruppert::core::mesh::{FaceError, Mesh};
    /// use ruppert::geometry::point::Point;
    ///
    /// let mut mesh = Mesh::new();
    /// let a = mesh.add_node(Point::new([0.0, 0.0]));
    /// let b = mesh.add_node(Point::new([1.0, 0.0]));
    /// let c = mesh.add_node(Point::new([0.0, 1.0]));
    /// let ab = mesh.add_edge(a, b).unwrap();
    /// let bc = mesh.add_edge(b, c).unwrap();
    /// let ac = mesh.add_edge(a, c).unwrap();
    ///
    /// // `ac` points the wrong way.
    /// let err = mesh.add_face(ab, bc, ac).unwrap_err();
    /// assert!(matches!(err, FaceError::NotChained { .. }));
    /// assert_eq!(mesh.number_of_faces(), 0);
    /// ```
    pub fn add_face(
        &mut self,
        h1: HalfedgeKey,
        h2: HalfedgeKey,
        h3: HalfedgeKey,
    ) -> Result<FaceKey, FaceError> {
        self.try_add_face([h1, h2, h3]).inspect_err(|err| {
            tracing::debug!(?h1, ?h2, ?h3, %err, "add_face declined");
        })
    }

    fn try_add_face(&mut self, chain: [HalfedgeKey; 3]) -> Result<FaceKey, FaceError> {
        for halfedge in chain {
            let he = self
                .halfedges
                .get(halfedge)
                .ok_or(FaceError::HalfedgeNotFound { halfedge })?;
            if !he.is_boundary() {
                return Err(FaceError::NotBoundary { halfedge });
            }
        }
        for i in 0..3 {
            let (from, to) = (chain[i], chain[(i + 1) % 3]);
            if self.destination(from) != self.origin(to) {
                return Err(FaceError::NotChained { from, to });
            }
        }
        for i in 0..3 {
            let (incoming, outgoing) = (chain[i], chain[(i + 1) % 3]);
            if !self.make_adjacent(incoming, outgoing) {
                return Err(FaceError::NonManifold { incoming, outgoing });
            }
        }

        let face = self.faces.insert(Face { halfedge: chain[0] });
        for h in chain {
            self.halfedges[h].face = Some(face);
        }
        Ok(face)
    }

    /// Removes `face`, returning its half-edges to the boundary.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::FaceNotFound`] for a stale key.
    pub fn remove_face(&mut self, face: FaceKey) -> Result<(), MeshError> {
        let removed = self
            .faces
            .remove(face)
            .ok_or(MeshError::FaceNotFound { face })?;
        let mut h = removed.halfedge;
        for _ in 0..3 {
            self.halfedges[h].face = None;
            h = self.halfedges[h].next;
        }
        Ok(())
    }

    /// Removes `edge` together with the faces on either side of it.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::EdgeNotFound`] for a stale key.
    pub fn remove_edge(&mut self, edge: EdgeKey) -> Result<(), MeshError> {
        let [h1, h2] = self
            .edges
            .get(edge)
            .ok_or(MeshError::EdgeNotFound { edge })?
            .halfedges;
        for h in [h1, h2] {
            if let Some(face) = self.halfedges[h].face {
                self.remove_face(face)?;
            }
        }
        self.detach(h1);
        self.detach(h2);
        self.halfedges.remove(h1);
        self.halfedges.remove(h2);
        self.edges.remove(edge);
        Ok(())
    }

    /// Removes `node` and everything incident to it.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NodeNotFound`] for a stale key.
    pub fn remove_node(&mut self, node: NodeKey) -> Result<(), MeshError> {
        if !self.contains_node(node) {
            return Err(MeshError::NodeNotFound { node });
        }
        while let Some(h) = self.nodes[node].halfedge {
            let edge = self.halfedges[h].edge;
            self.remove_edge(edge)?;
        }
        self.nodes.remove(node);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Low-level linking, shared with the flip and split algorithms
    // -------------------------------------------------------------------------

    /// Sets `a.next = b` and `b.prev = a`.
    pub(crate) fn link(&mut self, a: HalfedgeKey, b: HalfedgeKey) {
        self.halfedges[a].next = b;
        self.halfedges[b].prev = a;
    }

    pub(crate) fn set_origin(&mut self, h: HalfedgeKey, node: NodeKey) {
        self.halfedges[h].origin = node;
    }

    pub(crate) fn set_face(&mut self, h: HalfedgeKey, face: Option<FaceKey>) {
        self.halfedges[h].face = face;
    }

    pub(crate) fn set_face_halfedge(&mut self, face: FaceKey, h: HalfedgeKey) {
        self.faces[face].halfedge = h;
    }

    pub(crate) fn set_node_halfedge(&mut self, node: NodeKey, h: Option<HalfedgeKey>) {
        self.nodes[node].halfedge = h;
    }

    /// Copies the curve and constrained flag of `from` onto `to`.
    pub(crate) fn copy_edge_attributes(&mut self, from: &Edge, to: EdgeKey) {
        let target = &mut self.edges[to];
        target.curve.clone_from(&from.curve);
        target.constrained = from.constrained;
    }

    /// First boundary half-edge entering `node` in rotational order, `None`
    /// for an isolated node.
    fn find_free_incident_halfedge(&self, node: NodeKey) -> Result<Option<HalfedgeKey>, MeshError> {
        let Some(rep) = self.nodes[node].halfedge else {
            return Ok(None);
        };
        let start = self.halfedges[rep].pair;
        let mut h = start;
        for _ in 0..=self.halfedges.len() {
            if self.halfedges[h].is_boundary() {
                return Ok(Some(h));
            }
            h = self.halfedges[self.halfedges[h].next].pair;
            if h == start {
                break;
            }
        }
        Err(MeshError::NoFreeIncidentHalfedge { node })
    }

    /// Splices the fresh half-edge `h` (and its pair) into the rotation of
    /// `node` after `free_in`.
    fn attach(&mut self, h: HalfedgeKey, node: NodeKey, free_in: Option<HalfedgeKey>) {
        let h_pair = self.halfedges[h].pair;
        match free_in {
            None => {
                self.nodes[node].halfedge = Some(h);
                self.link(h_pair, h);
            }
            Some(free_in) => {
                let free_out = self.halfedges[free_in].next;
                self.link(free_in, h);
                self.link(h_pair, free_out);
            }
        }
    }

    /// Unsplices `h` from the rotation of its origin. Both sides of the edge
    /// must be on the boundary.
    fn detach(&mut self, h: HalfedgeKey) {
        let Halfedge {
            origin, pair, prev, ..
        } = self.halfedges[h];
        let pair_next = self.halfedges[pair].next;
        if self.nodes[origin].halfedge == Some(h) {
            self.nodes[origin].halfedge = (pair_next != h).then_some(pair_next);
        }
        self.link(prev, pair_next);
    }

    /// Reorders boundary cycles so that `next(incoming) == outgoing`.
    ///
    /// Returns `false` when no other boundary half-edge enters the shared node
    /// between `pair(outgoing)` and `incoming`, in which case nothing changes.
    fn make_adjacent(&mut self, incoming: HalfedgeKey, outgoing: HalfedgeKey) -> bool {
        if self.halfedges[incoming].next == outgoing {
            return true;
        }
        let b = self.halfedges[incoming].next;
        let d = self.halfedges[outgoing].prev;

        let mut g = None;
        let mut h = self.halfedges[outgoing].pair;
        for _ in 0..=self.halfedges.len() {
            if self.halfedges[h].is_boundary() {
                g = Some(h);
                break;
            }
            h = self.halfedges[self.halfedges[h].next].pair;
            if h == incoming {
                break;
            }
        }
        let Some(g) = g else {
            return false;
        };
        let after_g = self.halfedges[g].next;

        self.link(incoming, outgoing);
        self.link(g, b);
        self.link(d, after_g);
        true
    }
}

/// Iterator over the half-edges leaving a node.
///
/// Created by [`Mesh::outgoing_halfedges`].
#[derive(Clone, Debug)]
pub struct OutgoingHalfedges<'a, K: Kernel> {
    mesh: &'a Mesh<K>,
    start: Option<HalfedgeKey>,
    current: Option<HalfedgeKey>,
    remaining: usize,
}

impl<K: Kernel> Iterator for OutgoingHalfedges<'_, K> {
    type Item = HalfedgeKey;

    fn next(&mut self) -> Option<Self::Item> {
        let h = self.current?;
        if self.remaining == 0 {
            self.current = None;
            return None;
        }
        self.remaining -= 1;
        let following = self.mesh.next(self.mesh.pair(h));
        self.current = (Some(following) != self.start).then_some(following);
        Some(h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::boundary::{BoundaryCurve, CircularArc};
    use std::sync::Arc;

    /// Unit square split along the a-c diagonal.
    fn two_triangle_square() -> (Mesh, [NodeKey; 4], HalfedgeKey) {
        let mut mesh = Mesh::new();
        let a = mesh.add_node(Point::new([0.0, 0.0]));
        let b = mesh.add_node(Point::new([1.0, 0.0]));
        let c = mesh.add_node(Point::new([1.0, 1.0]));
        let d = mesh.add_node(Point::new([0.0, 1.0]));
        let ab = mesh.add_edge(a, b).unwrap();
        let bc = mesh.add_edge(b, c).unwrap();
        let cd = mesh.add_edge(c, d).unwrap();
        let da = mesh.add_edge(d, a).unwrap();
        let ac = mesh.add_edge(a, c).unwrap();
        let ca = mesh.pair(ac);
        mesh.add_face(ab, bc, ca).unwrap();
        mesh.add_face(ac, cd, da).unwrap();
        (mesh, [a, b, c, d], ac)
    }

    #[test]
    fn test_add_node_is_isolated() {
        let mut mesh = Mesh::new();
        let n = mesh.add_node(Point::new([3.0, 4.0]));
        let node = mesh.get_node(n).unwrap();
        assert!(node.is_isolated());
        assert_eq!(node.position(), Point::new([3.0, 4.0]));
        assert_eq!(mesh.degree(n), 0);
    }

    #[test]
    fn test_add_edge_links_single_edge() {
        let mut mesh = Mesh::new();
        let a = mesh.add_node(Point::new([0.0, 0.0]));
        let b = mesh.add_node(Point::new([1.0, 0.0]));
        let h = mesh.add_edge(a, b).unwrap();
        let p = mesh.pair(h);
        assert_eq!(mesh.pair(p), h);
        assert_eq!(mesh.next(h), p);
        assert_eq!(mesh.prev(h), p);
        assert_eq!(mesh.origin(h), a);
        assert_eq!(mesh.destination(h), b);
        assert_eq!(mesh.node_halfedge(a), Some(h));
        assert_eq!(mesh.node_halfedge(b), Some(p));
        assert!(mesh.is_boundary_edge(mesh.edge_of(h)));
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_add_edge_rejects_degenerate_and_stale() {
        let mut mesh = Mesh::new();
        let a = mesh.add_node(Point::new([0.0, 0.0]));
        let b = mesh.add_node(Point::new([1.0, 0.0]));
        assert_eq!(
            mesh.add_edge(a, a),
            Err(MeshError::DegenerateEdge { node: a })
        );
        mesh.remove_node(b).unwrap();
        assert_eq!(
            mesh.add_edge(a, b),
            Err(MeshError::NodeNotFound { node: b })
        );
        assert_eq!(mesh.number_of_edges(), 0);
    }

    #[test]
    fn test_add_edge_at_saturated_node_fails() {
        // Two faces glued along all three edges leave no boundary at all.
        let mut mesh = Mesh::new();
        let p = mesh.add_node(Point::new([0.0, 0.0]));
        let q = mesh.add_node(Point::new([1.0, 0.0]));
        let r = mesh.add_node(Point::new([0.0, 1.0]));
        let pq = mesh.add_edge(p, q).unwrap();
        let qr = mesh.add_edge(q, r).unwrap();
        let rp = mesh.add_edge(r, p).unwrap();
        mesh.add_face(pq, qr, rp).unwrap();
        let (qp, rq, pr) = (mesh.pair(pq), mesh.pair(qr), mesh.pair(rp));
        mesh.add_face(pr, rq, qp).unwrap();
        assert_eq!(mesh.boundary_halfedge(), None);

        let s = mesh.add_node(Point::new([5.0, 5.0]));
        assert_eq!(
            mesh.add_edge(p, s),
            Err(MeshError::NoFreeIncidentHalfedge { node: p })
        );
        assert_eq!(mesh.number_of_edges(), 3);
    }

    #[test]
    fn test_two_triangle_square() {
        let (mesh, [a, b, c, d], ac) = two_triangle_square();
        assert_eq!(mesh.number_of_nodes(), 4);
        assert_eq!(mesh.number_of_edges(), 5);
        assert_eq!(mesh.number_of_halfedges(), 10);
        assert_eq!(mesh.number_of_faces(), 2);
        assert_eq!(mesh.boundary_halfedges().count(), 4);
        assert!(!mesh.is_boundary_edge(mesh.edge_of(ac)));
        assert_eq!(mesh.degree(a), 3);
        assert_eq!(mesh.degree(b), 2);
        assert!(mesh.find_face(a, b, c).is_some());
        assert!(mesh.find_face(b, c, a).is_some());
        assert!(mesh.find_face(a, c, d).is_some());
        assert!(mesh.find_face(a, c, b).is_none());
        for f in mesh.face_keys() {
            assert!((mesh.face_area(f) - 0.5).abs() < 1e-15);
        }
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_add_face_not_chained_leaves_counts() {
        let (mut mesh, [a, b, _, d], _) = two_triangle_square();
        let ba = mesh.find_halfedge(b, a).unwrap();
        let ad = mesh.find_halfedge(a, d).unwrap();
        let before = (
            mesh.number_of_nodes(),
            mesh.number_of_edges(),
            mesh.number_of_faces(),
        );
        let err = mesh.add_face(ba, ad, ba).unwrap_err();
        assert!(matches!(err, FaceError::NotChained { .. }));
        let after = (
            mesh.number_of_nodes(),
            mesh.number_of_edges(),
            mesh.number_of_faces(),
        );
        assert_eq!(before, after);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_add_face_on_occupied_halfedge() {
        let (mut mesh, [a, b, c, _], _) = two_triangle_square();
        let ab = mesh.find_halfedge(a, b).unwrap();
        let bc = mesh.find_halfedge(b, c).unwrap();
        let ca = mesh.find_halfedge(c, a).unwrap();
        assert_eq!(
            mesh.add_face(ab, bc, ca),
            Err(FaceError::NotBoundary { halfedge: ab })
        );
    }

    #[test]
    fn test_remove_face_edge_node() {
        let (mut mesh, [a, _, c, _], ac) = two_triangle_square();
        let f = mesh.face_of(ac).unwrap();
        mesh.remove_face(f).unwrap();
        assert_eq!(mesh.number_of_faces(), 1);
        assert!(mesh.remove_face(f).is_err());
        assert!(mesh.is_valid());

        mesh.remove_edge(mesh.edge_of(ac)).unwrap();
        assert_eq!(mesh.number_of_edges(), 4);
        assert_eq!(mesh.number_of_faces(), 0);
        assert!(mesh.find_halfedge(a, c).is_none());
        assert!(mesh.is_valid());

        mesh.remove_node(a).unwrap();
        assert_eq!(mesh.number_of_nodes(), 3);
        assert_eq!(mesh.number_of_edges(), 2);
        assert!(!mesh.contains_halfedge(ac));
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_remove_node_with_faces() {
        let (mut mesh, [a, ..], _) = two_triangle_square();
        mesh.remove_node(a).unwrap();
        assert_eq!(mesh.number_of_nodes(), 3);
        assert_eq!(mesh.number_of_edges(), 2);
        assert_eq!(mesh.number_of_faces(), 0);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_rebuild_face_after_removal() {
        let (mut mesh, [a, b, c, _], ac) = two_triangle_square();
        let f = mesh.find_face(a, b, c).unwrap();
        let [h1, h2, h3] = mesh.face_halfedges(f);
        mesh.remove_face(f).unwrap();
        let g = mesh.add_face(h1, h2, h3).unwrap();
        assert_ne!(f, g);
        assert_eq!(mesh.face_of(mesh.pair(ac)), Some(g));
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_edge_attributes() {
        let (mut mesh, [a, b, ..], _) = two_triangle_square();
        let e = mesh.edge_of(mesh.find_halfedge(a, b).unwrap());
        assert!(mesh.is_constrained(e));
        assert!(!mesh.get_edge(e).unwrap().is_marked_constrained());
        mesh.set_constrained(e, true).unwrap();
        assert!(mesh.get_edge(e).unwrap().is_marked_constrained());

        let arc = CircularArc::from_three_points(
            Point::new([0.0, 0.0]),
            Point::new([1.0, 0.0]),
            Point::new([0.5, -0.5]),
        )
        .unwrap();
        let expected = arc.midpoint(Point::new([0.0, 0.0]), Point::new([1.0, 0.0]));
        mesh.set_curve(e, Some(Arc::new(arc))).unwrap();
        assert_eq!(mesh.edge_midpoint(e), expected);
        mesh.set_curve(e, None).unwrap();
        assert_eq!(mesh.edge_midpoint(e), Point::new([0.5, 0.0]));
    }

    #[test]
    fn test_bounding_box() {
        let (mesh, ..) = two_triangle_square();
        let bb = mesh.bounding_box().unwrap();
        assert_eq!(bb.ll(), Point::new([0.0, 0.0]));
        assert_eq!(bb.ur(), Point::new([1.0, 1.0]));
        assert!(Mesh::new().bounding_box().is_none());
    }

    #[test]
    fn test_stale_keys_are_not_aliased() {
        let mut mesh = Mesh::new();
        let a = mesh.add_node(Point::new([0.0, 0.0]));
        mesh.remove_node(a).unwrap();
        let b = mesh.add_node(Point::new([1.0, 0.0]));
        assert_ne!(a, b);
        assert!(mesh.get_node(a).is_none());
        assert_eq!(mesh.remove_node(a), Err(MeshError::NodeNotFound { node: a }));
    }
}
