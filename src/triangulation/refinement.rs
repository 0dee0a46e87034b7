//! Ruppert's Delaunay refinement with speculative insertion.
//!
//! [`refine`] takes a constrained Delaunay triangulation and inserts Steiner
//! points until every triangle satisfies the configured maximum area and, unless
//! it is *restricted* (two or more sides on the boundary), the minimum angle.
//!
//! The engine keeps two work sets for the duration of one call:
//!
//! - the **encroached** boundary edges, stored as the interior half-edge of
//!   each edge, whose diametral circle contains a mesh point;
//! - the **bad faces**, ordered by area (largest first), then minimum angle
//!   (smallest first), then face key.
//!
//! Each bad face's circumcenter (or off-center) is inserted on trial: the
//! face or edge containing it is split and Delaunay-restoring flips spread out
//! from the new node, each flip recorded in an undo log. If the new node
//! encroaches a boundary edge, the log is replayed backwards with
//! [`Mesh::unflip_edge`], the node is removed and the original triangles are
//! rebuilt from the surviving half-edges; the encroached edges are split
//! instead. Splitting a boundary edge near an acute input corner uses a
//! power-of-two split ratio so that concentric shells of nodes form around
//! the corner instead of an endless cascade.
//!
//! Termination is guaranteed for minimum angles up to about 20.7° when the
//! input has no acute corners; larger bounds usually work but are logged as
//! a warning.
//!
//! # References
//!
//! - Ruppert, J. "A Delaunay Refinement Algorithm for Quality 2-Dimensional
//!   Mesh Generation" *Journal of Algorithms* 18.3 (1995): 548-585
//! - Shewchuk, J.R. "Delaunay Refinement Algorithms for Triangular Mesh
//!   Generation" *Computational Geometry* 22 (2002): 21-74
//! - Üngör, A. "Off-centers: A new type of Steiner points for computing
//!   size-optimal quality-guaranteed Delaunay triangulations" LATIN 2004

use std::cmp::Reverse;
use std::collections::BTreeSet;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::algorithms::flips::FlipError;
use crate::core::algorithms::locate::{LocateError, Location};
use crate::core::collections::{FastHashMap, HalfedgeBuffer};
use crate::core::mesh::{Edge, EdgeKey, FaceKey, HalfedgeKey, Mesh, MeshError, NodeKey};
use crate::geometry::kernel::{AdaptiveKernel, Kernel};
use crate::geometry::point::Point;
use crate::geometry::polygon::Polygon;
use crate::geometry::util::{GeometryError, distance, offconstant, shortest_edge_length};
use crate::triangulation::delaunay::{is_encroached, make_cdt};
use crate::triangulation::triangulator::{TriangulationError, triangulate};

/// Largest minimum angle, in degrees, for which refinement provably terminates.
pub const GUARANTEED_MIN_ANGLE_DEGREES: f64 = 20.7;

/// Relative length difference below which two boundary edges at a corner
/// count as equal in [`Refiner::split_permitted`].
const EQUAL_LENGTH_TOLERANCE: f64 = 1e-5;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Where the Steiner point of a bad triangle is placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SteinerPlacement {
    /// The circumcenter (Ruppert's original choice).
    #[default]
    Circumcenter,
    /// The off-center, which is pulled towards the shortest edge and tends to
    /// produce fewer Steiner points.
    Offcenter,
}

/// Parameters of [`refine`].
///
/// Build one with [`RefinementConfig::builder`]; `build()` rejects
/// non-positive areas and angles outside `[0, 60)`.
///
/// # Examples
///
/// ```rust
/// use ruppert::triangulation::refinement::{RefinementConfig, SteinerPlacement};
///
/// let config = RefinementConfig::builder()
///     .max_area(0.25)
///     .min_angle_degrees(25.0)
///     .steiner_placement(SteinerPlacement::Offcenter)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_area, 0.25);
/// assert_eq!(config.max_steiner_points, None);
///
/// assert!(RefinementConfig::builder().max_area(0.0).build().is_err());
/// assert!(RefinementConfig::builder().min_angle_degrees(60.0).build().is_err());
/// ```
#[derive(Builder, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct RefinementConfig {
    /// Largest admissible triangle area.
    #[builder(default = "1.0")]
    pub max_area: f64,
    /// Smallest admissible angle of an unrestricted triangle, in degrees.
    #[builder(default = "20.0")]
    pub min_angle_degrees: f64,
    /// Steiner point placement rule.
    #[builder(default)]
    pub steiner_placement: SteinerPlacement,
    /// Upper bound on inserted nodes (Steiner points plus boundary splits).
    #[builder(setter(strip_option), default)]
    pub max_steiner_points: Option<usize>,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            max_area: 1.0,
            min_angle_degrees: 20.0,
            steiner_placement: SteinerPlacement::Circumcenter,
            max_steiner_points: None,
        }
    }
}

impl RefinementConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let defaults = RefinementConfig::default();
        check_parameters(
            self.max_area.unwrap_or(defaults.max_area),
            self.min_angle_degrees.unwrap_or(defaults.min_angle_degrees),
        )
    }
}

fn check_parameters(max_area: f64, min_angle_degrees: f64) -> Result<(), String> {
    if !(max_area > 0.0 && max_area.is_finite()) {
        return Err(format!("max_area must be positive and finite, got {max_area}"));
    }
    if !(0.0..60.0).contains(&min_angle_degrees) {
        return Err(format!(
            "min_angle_degrees must lie in [0, 60), got {min_angle_degrees}"
        ));
    }
    Ok(())
}

impl RefinementConfig {
    /// Returns a builder initialized with the defaults.
    #[must_use]
    pub fn builder() -> RefinementConfigBuilder {
        RefinementConfigBuilder::default()
    }

    /// Checks the same bounds as the builder, for configurations assembled
    /// field by field or deserialized.
    ///
    /// # Errors
    ///
    /// Returns [`RefinementError::InvalidConfig`] describing the first
    /// offending field.
    pub fn validate(&self) -> Result<(), RefinementError> {
        check_parameters(self.max_area, self.min_angle_degrees)
            .map_err(|reason| RefinementError::InvalidConfig { reason })
    }

    fn steiner_point<K: Kernel>(
        &self,
        kernel: &K,
        [a, b, c]: [Point; 3],
    ) -> Result<Point, GeometryError> {
        match self.steiner_placement {
            SteinerPlacement::Circumcenter => kernel.circumcenter(a, b, c),
            SteinerPlacement::Offcenter => {
                kernel.offcenter(a, b, c, offconstant(self.min_angle_degrees))
            }
        }
    }
}

// =============================================================================
// RESULTS AND ERRORS
// =============================================================================

/// Counters reported by [`refine`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementStatistics {
    /// Steiner points committed inside the mesh.
    pub steiner_points: usize,
    /// Boundary edges split, during conditioning or in place of a rejected
    /// Steiner point.
    pub boundary_splits: usize,
    /// Trial insertions undone because they encroached the boundary.
    pub rollbacks: usize,
    /// Edge flips performed, including those later undone.
    pub flips: usize,
    /// Bad faces given up on because no encroached edge was allowed to split.
    pub skipped_faces: usize,
}

impl RefinementStatistics {
    /// Nodes added to the mesh.
    #[must_use]
    pub const fn inserted_nodes(&self) -> usize {
        self.steiner_points + self.boundary_splits
    }
}

/// Errors raised by [`refine`] and [`mesh_polygon`].
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum RefinementError {
    /// The configuration is out of range.
    #[error("Invalid refinement configuration: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },
    /// A Steiner point coincides with an existing node.
    #[error("Steiner point {point} lands on existing node {node:?}")]
    SteinerPointOnNode {
        /// The node hit.
        node: NodeKey,
        /// The Steiner point.
        point: Point,
    },
    /// The node budget ran out; the mesh is valid but not fully refined.
    #[error("Inserted {inserted} nodes, reaching the budget of {budget}")]
    SteinerBudgetExhausted {
        /// Nodes inserted so far.
        inserted: usize,
        /// The configured budget.
        budget: usize,
    },
    /// A trial insertion could not be unwound.
    #[error("Rollback of node {node:?} failed: its star is not the one it was inserted into")]
    RollbackFailed {
        /// The trial node.
        node: NodeKey,
    },
    /// The bad face was not restored by a rollback.
    #[error("Bad face {nodes:?} missing after rollback")]
    BadFaceLost {
        /// Corners of the bad face.
        nodes: [NodeKey; 3],
    },
    /// The input polygon could not be triangulated.
    #[error(transparent)]
    Triangulation(#[from] TriangulationError),
    /// Point location failed.
    #[error(transparent)]
    Locate(#[from] LocateError),
    /// A mesh primitive failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
    /// An edge flip failed.
    #[error(transparent)]
    Flip(#[from] FlipError),
    /// A Steiner point could not be constructed.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

// =============================================================================
// PUBLIC ENTRY POINTS
// =============================================================================

/// Refines a constrained Delaunay triangulation in place.
///
/// On return every face has area at most `config.max_area`, and every face
/// with fewer than two boundary sides has minimum angle at least
/// `config.min_angle_degrees`, except for faces counted in
/// [`RefinementStatistics::skipped_faces`]. The mesh stays constrained
/// Delaunay. Boundary edges with a curve are split at the curve's midpoint,
/// so nodes inserted on them lie on the curve.
///
/// # Errors
///
/// Returns [`RefinementError::InvalidConfig`] for out-of-range parameters and
/// [`RefinementError::SteinerBudgetExhausted`] when `max_steiner_points` is
/// reached (the mesh is left valid). Other errors indicate a corrupted mesh.
///
/// # Examples
///
/// ```rust
/// use ruppert::geometry::polygon::Polygon;
/// use ruppert::triangulation::delaunay::make_cdt;
/// use ruppert::triangulation::refinement::{RefinementConfig, refine};
/// use ruppert::triangulation::triangulator::triangulate;
///
/// let mut mesh = triangulate(&Polygon::letter_u()).unwrap();
/// make_cdt(&mut mesh).unwrap();
/// let config = RefinementConfig::builder().max_area(0.1).build().unwrap();
/// let stats = refine(&mut mesh, &config).unwrap();
/// assert!(stats.steiner_points > 0);
/// assert!(mesh.face_keys().all(|f| mesh.face_area(f) <= 0.1));
/// ```
pub fn refine<K: Kernel>(
    mesh: &mut Mesh<K>,
    config: &RefinementConfig,
) -> Result<RefinementStatistics, RefinementError> {
    config.validate()?;
    if config.min_angle_degrees > GUARANTEED_MIN_ANGLE_DEGREES {
        tracing::warn!(
            min_angle_degrees = config.min_angle_degrees,
            "minimum angle above {GUARANTEED_MIN_ANGLE_DEGREES} degrees; refinement may not terminate"
        );
    }

    let stats = Refiner::new(mesh, config).run()?;
    tracing::debug!(
        steiner_points = stats.steiner_points,
        boundary_splits = stats.boundary_splits,
        rollbacks = stats.rollbacks,
        flips = stats.flips,
        skipped_faces = stats.skipped_faces,
        faces = mesh.number_of_faces(),
        "refinement finished"
    );
    Ok(stats)
}

/// Triangulates `polygon`, restores the Delaunay property and refines.
///
/// # Errors
///
/// Returns [`RefinementError::Triangulation`] for unusable polygons, and the
/// errors of [`refine`].
///
/// # Examples
///
/// ```rust
/// use ruppert::geometry::polygon::Polygon;
/// use ruppert::triangulation::refinement::{RefinementConfig, mesh_polygon};
///
/// let (mesh, stats) = mesh_polygon(&Polygon::square(1.0), &RefinementConfig::default()).unwrap();
/// assert_eq!(mesh.number_of_faces(), 2);
/// assert_eq!(stats.inserted_nodes(), 0);
/// ```
pub fn mesh_polygon(
    polygon: &Polygon,
    config: &RefinementConfig,
) -> Result<(Mesh<AdaptiveKernel>, RefinementStatistics), RefinementError> {
    config.validate()?;
    let mut mesh = triangulate(polygon)?;
    make_cdt(&mut mesh)?;
    let stats = refine(&mut mesh, config)?;
    Ok((mesh, stats))
}

// =============================================================================
// BAD FACE QUEUE
// =============================================================================

/// Area descending, then minimum angle ascending, then key.
type Priority = (Reverse<OrderedFloat<f64>>, OrderedFloat<f64>, FaceKey);

/// Ordered set of bad faces with removal by key.
#[derive(Debug, Default)]
struct BadFaces {
    order: BTreeSet<Priority>,
    priorities: FastHashMap<FaceKey, Priority>,
}

impl BadFaces {
    fn insert(&mut self, face: FaceKey, area: f64, min_angle: f64) {
        self.remove(face);
        let priority = (Reverse(OrderedFloat(area)), OrderedFloat(min_angle), face);
        self.order.insert(priority);
        self.priorities.insert(face, priority);
    }

    fn remove(&mut self, face: FaceKey) {
        if let Some(priority) = self.priorities.remove(&face) {
            self.order.remove(&priority);
        }
    }

    fn first(&self) -> Option<FaceKey> {
        self.order.first().map(|&(_, _, face)| face)
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Corners and attributes of an edge removed by a trial edge split.
#[derive(Debug)]
struct SplitEdge {
    n1: NodeKey,
    n2: NodeKey,
    /// Rebuild the face on the `n1 -> n2` side.
    left: bool,
    /// Rebuild the face on the `n2 -> n1` side.
    right: bool,
    attributes: Edge,
}

/// State of one [`refine`] call.
#[derive(Debug)]
struct Refiner<'a, K: Kernel> {
    mesh: &'a mut Mesh<K>,
    config: RefinementConfig,
    min_angle: f64,
    encroached: BTreeSet<HalfedgeKey>,
    bad_faces: BadFaces,
    undo_log: Vec<EdgeKey>,
    stats: RefinementStatistics,
}

impl<'a, K: Kernel> Refiner<'a, K> {
    fn new(mesh: &'a mut Mesh<K>, config: &RefinementConfig) -> Self {
        Self {
            mesh,
            config: *config,
            min_angle: config.min_angle_degrees.to_radians(),
            encroached: BTreeSet::new(),
            bad_faces: BadFaces::default(),
            undo_log: Vec::new(),
            stats: RefinementStatistics::default(),
        }
    }

    fn run(mut self) -> Result<RefinementStatistics, RefinementError> {
        self.collect_encroached_boundary();
        self.split_encroached(false)?;

        let faces: Vec<FaceKey> = self.mesh.face_keys().collect();
        for face in faces {
            self.enqueue(face);
        }

        while let Some(bad) = self.bad_faces.first() {
            if !self.mesh.contains_face(bad) {
                self.bad_faces.remove(bad);
                continue;
            }
            self.check_budget()?;
            self.kill_bad_face(bad)?;
        }
        Ok(self.stats)
    }

    fn check_budget(&self) -> Result<(), RefinementError> {
        match self.config.max_steiner_points {
            Some(budget) if self.stats.inserted_nodes() >= budget => {
                Err(RefinementError::SteinerBudgetExhausted {
                    inserted: self.stats.inserted_nodes(),
                    budget,
                })
            }
            _ => Ok(()),
        }
    }

    fn kill_bad_face(&mut self, bad: FaceKey) -> Result<(), RefinementError> {
        let nodes = self.mesh.face_nodes(bad);
        let p = self
            .config
            .steiner_point(self.mesh.kernel(), self.mesh.face_vertices(bad))?;

        match self.mesh.locate(p, Some(bad))? {
            Location::OnNode(node) => Err(RefinementError::SteinerPointOnNode { node, point: p }),
            Location::InFace(face) => {
                let node = self.try_kill_face(face, p)?;
                let encroached = self.encroached_by(node);
                if encroached.is_empty() {
                    self.commit(node);
                    Ok(())
                } else {
                    self.undo_kill_face(node)?;
                    self.finish_dealing(nodes, &encroached)
                }
            }
            Location::OnEdge(h) => {
                let edge = self.mesh.edge_of(h);
                let split = SplitEdge {
                    n1: self.mesh.origin(h),
                    n2: self.mesh.destination(h),
                    left: !self.mesh.is_boundary_halfedge(h),
                    right: !self.mesh.is_boundary_halfedge(self.mesh.pair(h)),
                    attributes: self
                        .mesh
                        .get_edge(edge)
                        .ok_or(MeshError::EdgeNotFound { edge })?
                        .clone(),
                };
                let node = self.try_kill_edge(edge, p)?;
                let encroached = self.encroached_by(node);
                if encroached.is_empty() {
                    self.commit(node);
                    Ok(())
                } else {
                    self.undo_kill_edge(node, &split)?;
                    self.finish_dealing(nodes, &encroached)
                }
            }
            Location::OutsideMesh(h) => {
                tracing::trace!(?p, "Steiner point outside the mesh; splitting the boundary");
                self.encroached.insert(h);
                self.split_encroached(true)
            }
        }
    }

    fn commit(&mut self, node: NodeKey) {
        tracing::trace!(?node, flips = self.undo_log.len(), "committed Steiner point");
        self.undo_log.clear();
        self.treat_new_node(node, true);
        self.stats.steiner_points += 1;
    }

    // -------------------------------------------------------------------------
    // Trial insertion and rollback
    // -------------------------------------------------------------------------

    fn try_kill_face(&mut self, face: FaceKey, p: Point) -> Result<NodeKey, RefinementError> {
        let node = self.split_face(face, p)?;
        for he in self.opposite_halfedges(node)? {
            self.flip_propagate(he, true, true)?;
        }
        Ok(node)
    }

    fn try_kill_edge(&mut self, edge: EdgeKey, p: Point) -> Result<NodeKey, RefinementError> {
        let node = self.split_edge(edge, p)?;
        let star: HalfedgeBuffer = self.mesh.outgoing_halfedges(node).collect();
        for h in star {
            if !self.mesh.is_boundary_halfedge(h) {
                let opposite = self.mesh.next(h);
                self.flip_propagate(opposite, true, true)?;
            }
        }
        Ok(node)
    }

    /// The three half-edges opposite `node` inside the triangles of its star,
    /// for a node created by a face split.
    fn opposite_halfedges(&self, node: NodeKey) -> Result<[HalfedgeKey; 3], MeshError> {
        let rep = self
            .mesh
            .node_halfedge(node)
            .ok_or(MeshError::NodeNotFound { node })?;
        let he1 = self.mesh.next(rep);
        let he2 = self.mesh.next(self.mesh.pair(self.mesh.next(he1)));
        let he3 = self.mesh.next(self.mesh.pair(self.mesh.next(he2)));
        Ok([he1, he2, he3])
    }

    fn undo_flips(&mut self) -> Result<(), RefinementError> {
        while let Some(edge) = self.undo_log.pop() {
            self.unflip(edge)?;
        }
        Ok(())
    }

    fn undo_kill_face(&mut self, node: NodeKey) -> Result<(), RefinementError> {
        self.undo_flips()?;
        let [he1, he2, he3] = self.opposite_halfedges(node)?;
        if self.mesh.degree(node) != 3 {
            return Err(RefinementError::RollbackFailed { node });
        }
        for h in [he1, he2, he3] {
            self.dequeue_of(h);
        }
        self.mesh.remove_node(node)?;
        let face = self.mesh.add_face(he1, he2, he3).map_err(MeshError::from)?;
        self.enqueue(face);
        self.stats.rollbacks += 1;
        tracing::trace!(?node, "rolled back face split");
        Ok(())
    }

    fn undo_kill_edge(&mut self, node: NodeKey, split: &SplitEdge) -> Result<(), RefinementError> {
        self.undo_flips()?;
        let (mut to_n1, mut to_n2) = (None, None);
        for h in self.mesh.outgoing_halfedges(node) {
            let dest = self.mesh.destination(h);
            if dest == split.n1 {
                to_n1 = Some(h);
            } else if dest == split.n2 {
                to_n2 = Some(h);
            }
        }
        let (Some(he1), Some(he2)) = (to_n1, to_n2) else {
            return Err(RefinementError::RollbackFailed { node });
        };

        let left = split
            .left
            .then(|| (self.mesh.next(he2), self.mesh.prev(self.mesh.pair(he1))));
        let right = split
            .right
            .then(|| (self.mesh.next(he1), self.mesh.prev(self.mesh.pair(he2))));
        for &(a, b) in left.iter().chain(right.iter()) {
            self.dequeue_of(a);
            self.dequeue_of(b);
        }

        self.mesh.remove_node(node)?;
        let restored = self.mesh.add_edge(split.n1, split.n2)?;
        let edge = self.mesh.edge_of(restored);
        self.mesh.copy_edge_attributes(&split.attributes, edge);

        if let Some((he23, he31)) = left {
            let face = self
                .mesh
                .add_face(restored, he23, he31)
                .map_err(MeshError::from)?;
            self.enqueue(face);
        }
        if let Some((he14, he42)) = right {
            let face = self
                .mesh
                .add_face(self.mesh.pair(restored), he14, he42)
                .map_err(MeshError::from)?;
            self.enqueue(face);
        }
        self.stats.rollbacks += 1;
        tracing::trace!(?node, "rolled back edge split");
        Ok(())
    }

    /// Interior half-edges of boundary edges opposite `node` that it
    /// encroaches.
    fn encroached_by(&self, node: NodeKey) -> HalfedgeBuffer {
        let p = self.mesh.position(node);
        self.mesh
            .outgoing_halfedges(node)
            .filter(|&h| self.mesh.face_of(h).is_some())
            .map(|h| self.mesh.next(h))
            .filter(|&h| {
                let edge = self.mesh.edge_of(h);
                self.mesh.is_boundary_edge(edge) && is_encroached(&*self.mesh, edge, p)
            })
            .collect()
    }

    fn finish_dealing(
        &mut self,
        nodes: [NodeKey; 3],
        encroached: &[HalfedgeKey],
    ) -> Result<(), RefinementError> {
        let [n1, n2, n3] = nodes;
        let bad = self
            .mesh
            .find_face(n1, n2, n3)
            .ok_or(RefinementError::BadFaceLost { nodes })?;
        let [a, b, c] = self.mesh.face_vertices(bad);
        let shortest = shortest_edge_length(a, b, c);
        let too_large = self.mesh.face_area(bad) > self.config.max_area;

        for &he in encroached {
            if too_large || self.split_permitted(he, shortest) {
                self.encroached.insert(he);
            }
        }
        if self.encroached.is_empty() {
            tracing::warn!(?nodes, "no encroached edge may be split; skipping bad face");
            self.bad_faces.remove(bad);
            self.stats.skipped_faces += 1;
            Ok(())
        } else {
            self.split_encroached(true)
        }
    }

    /// Whether the boundary edge of `he` may be split on behalf of a bad face
    /// whose shortest edge is `shortest`.
    ///
    /// Splitting is refused only for an edge meeting another boundary edge of
    /// the same length at a corner of the triangle, when the circle through
    /// the split points would be no larger than the bad face's shortest edge.
    fn split_permitted(&self, he: HalfedgeKey, shortest: f64) -> bool {
        let mesh = &*self.mesh;
        let prev_boundary = mesh.is_boundary_edge(mesh.edge_of(mesh.prev(he)));
        let next_boundary = mesh.is_boundary_edge(mesh.edge_of(mesh.next(he)));
        if prev_boundary == next_boundary {
            return true;
        }

        // The corner shared by the two boundary edges is `p2`.
        let corners = if prev_boundary {
            let other = mesh.prev(he);
            [mesh.origin(other), mesh.origin(he), mesh.destination(he)]
        } else {
            let other = mesh.next(he);
            [mesh.origin(he), mesh.origin(other), mesh.destination(other)]
        };
        let [p1, p2, p3] = corners.map(|n| mesh.position(n));
        let (l, other_l) = if prev_boundary {
            (distance(p2, p3), distance(p1, p2))
        } else {
            (distance(p1, p2), distance(p2, p3))
        };
        if (l - other_l).abs() > EQUAL_LENGTH_TOLERANCE {
            return true;
        }

        let ll = distance(p1, p3);
        let phi = ((l * l + other_l * other_l - ll * ll) / (2.0 * l * other_l))
            .clamp(-1.0, 1.0)
            .acos();
        l * (phi / 2.0).sin() > shortest
    }

    // -------------------------------------------------------------------------
    // Boundary splitting
    // -------------------------------------------------------------------------

    fn collect_encroached_boundary(&mut self) {
        let mesh = &*self.mesh;
        let found: Vec<HalfedgeKey> = mesh
            .boundary_halfedges()
            .map(|b| mesh.pair(b))
            .filter(|&he| {
                mesh.face_of(he).is_some()
                    && is_encroached(mesh, mesh.edge_of(he), mesh.position(mesh.origin(mesh.prev(he))))
            })
            .collect();
        self.encroached.extend(found);
    }

    fn is_interior_boundary_side(&self, he: HalfedgeKey) -> bool {
        self.mesh.contains_halfedge(he)
            && !self.mesh.is_boundary_halfedge(he)
            && self.mesh.is_boundary_halfedge(self.mesh.pair(he))
    }

    fn split_encroached(&mut self, check_quality: bool) -> Result<(), RefinementError> {
        while let Some(he) = self.encroached.pop_first() {
            if !self.is_interior_boundary_side(he) {
                continue;
            }
            self.check_budget()?;

            let hen = self.mesh.next(he);
            let hep = self.mesh.prev(he);
            let edge = self.mesh.edge_of(he);
            let p = self.boundary_split_point(he);
            let node = if check_quality {
                self.split_edge(edge, p)?
            } else {
                self.mesh.split_edge(edge, p)?
            };
            let he1 = self.mesh.prev(hen);
            let he2 = self.mesh.next(hep);

            self.flip_propagate(hen, check_quality, false)?;
            self.flip_propagate(hep, check_quality, false)?;
            self.treat_new_node(node, check_quality);

            for h in [he1, he2] {
                let apex = self.mesh.position(self.mesh.origin(self.mesh.prev(h)));
                if is_encroached(&*self.mesh, self.mesh.edge_of(h), apex) {
                    self.encroached.insert(h);
                }
            }
            self.stats.boundary_splits += 1;
            tracing::trace!(?node, ?p, "split encroached boundary edge");
        }
        Ok(())
    }

    /// Split point of the boundary edge of `he`.
    ///
    /// When exactly one end of the edge is a corner shared with another
    /// boundary edge of the same triangle, the split lands a power-of-two
    /// distance from that corner; otherwise the edge is halved.
    fn boundary_split_point(&self, he: HalfedgeKey) -> Point {
        let mesh = &*self.mesh;
        let edge = mesh.edge_of(he);
        if mesh.get_edge(edge).and_then(Edge::curve).is_some() {
            return mesh.edge_midpoint(edge);
        }

        let porig = mesh.position(mesh.origin(he));
        let pdest = mesh.position(mesh.destination(he));
        let acute_dest = mesh.is_boundary_halfedge(mesh.pair(mesh.next(he)));
        let acute_orig = mesh.is_boundary_halfedge(mesh.pair(mesh.prev(he)));
        if acute_dest == acute_orig {
            return mesh.edge_midpoint(edge);
        }

        let l = distance(porig, pdest);
        let mut power = 1.0;
        while l > 3.0 * power {
            power *= 2.0;
        }
        while l < 1.5 * power {
            power *= 0.5;
        }
        let split = if acute_dest { 1.0 - power / l } else { power / l };
        porig + (pdest - porig) * split
    }

    fn treat_new_node(&mut self, node: NodeKey, check_quality: bool) {
        let p = self.mesh.position(node);
        let star: HalfedgeBuffer = self.mesh.outgoing_halfedges(node).collect();
        for h in star {
            let Some(face) = self.mesh.face_of(h) else {
                continue;
            };
            let opposite = self.mesh.next(h);
            let edge = self.mesh.edge_of(opposite);
            if self.mesh.is_boundary_edge(edge) && is_encroached(&*self.mesh, edge, p) {
                self.encroached.insert(opposite);
            } else if check_quality {
                self.enqueue(face);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Queue-aware mesh edits
    // -------------------------------------------------------------------------

    /// Flips outwards from `start` until every visited edge is constrained
    /// Delaunay.
    fn flip_propagate(
        &mut self,
        start: HalfedgeKey,
        check_quality: bool,
        record: bool,
    ) -> Result<(), RefinementError> {
        let mut stack = vec![start];
        while let Some(he) = stack.pop() {
            let edge = self.mesh.edge_of(he);
            if !self.mesh.is_diagonal_of_convex_quadrilateral(edge)
                || self.mesh.is_constrained_delaunay(edge)
            {
                continue;
            }
            let pair = self.mesh.pair(he);
            let (he1, he2) = (self.mesh.next(pair), self.mesh.prev(pair));
            if check_quality {
                self.flip(edge)?;
            } else {
                self.mesh.flip_edge(edge)?;
            }
            if record {
                self.undo_log.push(edge);
            }
            self.stats.flips += 1;
            stack.push(he2);
            stack.push(he1);
        }
        Ok(())
    }

    fn flip(&mut self, edge: EdgeKey) -> Result<(), FlipError> {
        let halves = self.mesh.edge_halfedges(edge);
        for h in halves {
            self.dequeue_of(h);
        }
        self.mesh.flip_edge(edge)?;
        for h in halves {
            self.enqueue_of(h);
        }
        Ok(())
    }

    fn unflip(&mut self, edge: EdgeKey) -> Result<(), FlipError> {
        let halves = self.mesh.edge_halfedges(edge);
        for h in halves {
            self.dequeue_of(h);
        }
        self.mesh.unflip_edge(edge)?;
        for h in halves {
            self.enqueue_of(h);
        }
        Ok(())
    }

    fn split_face(&mut self, face: FaceKey, p: Point) -> Result<NodeKey, MeshError> {
        self.bad_faces.remove(face);
        let node = self.mesh.split_face(face, p)?;
        self.enqueue_star(node);
        Ok(node)
    }

    fn split_edge(&mut self, edge: EdgeKey, p: Point) -> Result<NodeKey, MeshError> {
        if self.mesh.contains_edge(edge) {
            for h in self.mesh.edge_halfedges(edge) {
                self.dequeue_of(h);
            }
        }
        let node = self.mesh.split_edge(edge, p)?;
        self.enqueue_star(node);
        Ok(node)
    }

    fn enqueue_star(&mut self, node: NodeKey) {
        let star: HalfedgeBuffer = self.mesh.outgoing_halfedges(node).collect();
        for h in star {
            self.enqueue_of(h);
        }
    }

    // -------------------------------------------------------------------------
    // Bad face bookkeeping
    // -------------------------------------------------------------------------

    fn enqueue_of(&mut self, h: HalfedgeKey) {
        if let Some(face) = self.mesh.face_of(h) {
            self.enqueue(face);
        }
    }

    fn dequeue_of(&mut self, h: HalfedgeKey) {
        if let Some(face) = self.mesh.face_of(h) {
            self.bad_faces.remove(face);
        }
    }

    /// Queues `face` if it violates the area bound, or the angle bound while
    /// having at most one boundary side.
    fn enqueue(&mut self, face: FaceKey) {
        let area = self.mesh.face_area(face);
        let min_angle = self.mesh.face_min_angle(face);
        let boundary_sides = self
            .mesh
            .face_halfedges(face)
            .into_iter()
            .filter(|&h| self.mesh.is_boundary_halfedge(self.mesh.pair(h)))
            .count();
        let restricted = boundary_sides > 1;
        if area > self.config.max_area || (min_angle < self.min_angle && !restricted) {
            self.bad_faces.insert(face, area, min_angle);
        }
    }
}
