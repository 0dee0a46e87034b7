//! Point insertion by splitting an edge or a face.
//!
//! Both operations remove the affected triangles, add a node at the given
//! point and rebuild the star of that node from the surviving half-edges.
//! Neither restores the Delaunay property; callers follow up with flips.

use crate::core::mesh::{EdgeKey, FaceKey, HalfedgeKey, Mesh, MeshError, NodeKey};
use crate::geometry::kernel::Kernel;
use crate::geometry::point::Point;

/// The two half-edges completing a face opposite an edge, and the apex.
type Side = (HalfedgeKey, HalfedgeKey, NodeKey);

impl<K: Kernel> Mesh<K> {
    /// Inserts a node at `p` inside `face`, replacing the face by three
    /// triangles.
    ///
    /// `p` is expected to lie strictly inside the face; the topology is
    /// rebuilt regardless of where it is.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::FaceNotFound`] for a stale key, or any error of the
    /// underlying primitives, which indicates a corrupted mesh.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ruppert::geometry::point::Point;
    /// use ruppert::geometry::polygon::Polygon;
    /// use ruppert::triangulation::triangulator::triangulate;
    ///
    /// let mut mesh = triangulate(&Polygon::triangle()).unwrap();
    /// let face = mesh.face_keys().next().unwrap();
    /// let node = mesh.split_face(face, Point::new([0.0, 0.5])).unwrap();
    /// assert_eq!(mesh.number_of_faces(), 3);
    /// assert_eq!(mesh.degree(node), 3);
    /// ```
    pub fn split_face(&mut self, face: FaceKey, p: Point) -> Result<NodeKey, MeshError> {
        if !self.contains_face(face) {
            return Err(MeshError::FaceNotFound { face });
        }
        let [h1, h2, h3] = self.face_halfedges(face);
        let [o1, o2, o3] = [h1, h2, h3].map(|h| self.origin(h));

        self.remove_face(face)?;
        let node = self.add_node(p);
        let h4 = self.add_edge(node, o1)?;
        let h5 = self.add_edge(node, o2)?;
        let h6 = self.add_edge(node, o3)?;

        self.add_face(h4, h1, self.pair(h5))?;
        self.add_face(h5, h2, self.pair(h6))?;
        self.add_face(h6, h3, self.pair(h4))?;
        Ok(node)
    }

    /// Inserts a node at `p` on `edge`, splitting the edge in two and each
    /// adjacent face in two.
    ///
    /// Both halves of the edge inherit its boundary curve and constrained
    /// flag; the new edges towards the opposite apexes are straight and
    /// unconstrained.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::EdgeNotFound`] for a stale key, or any error of the
    /// underlying primitives, which indicates a corrupted mesh.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ruppert::geometry::point::Point;
    /// use ruppert::geometry::polygon::Polygon;
    /// use ruppert::triangulation::triangulator::triangulate;
    ///
    /// let mut mesh = triangulate(&Polygon::square(1.0)).unwrap();
    /// let diagonal = mesh
    ///     .edge_keys()
    ///     .find(|&e| !mesh.is_boundary_edge(e))
    ///     .unwrap();
    /// mesh.split_edge(diagonal, Point::new([0.5, 0.5])).unwrap();
    /// assert_eq!(
    ///     (mesh.number_of_nodes(), mesh.number_of_edges(), mesh.number_of_faces()),
    ///     (5, 8, 4)
    /// );
    /// ```
    pub fn split_edge(&mut self, edge: EdgeKey, p: Point) -> Result<NodeKey, MeshError> {
        let attributes = self
            .get_edge(edge)
            .ok_or(MeshError::EdgeNotFound { edge })?
            .clone();
        let [h1, h2] = attributes.halfedges();
        let (n1, n2) = (self.origin(h1), self.origin(h2));
        let side1 = self.opposite_side(h1);
        let side2 = self.opposite_side(h2);

        self.remove_edge(edge)?;
        let node = self.add_node(p);
        let to_n1 = self.add_edge(node, n1)?;
        let to_n2 = self.add_edge(node, n2)?;
        for h in [to_n1, to_n2] {
            let e = self.edge_of(h);
            self.copy_edge_attributes(&attributes, e);
        }

        if let Some((h5, h6, n3)) = side1 {
            let h3 = self.add_edge(node, n3)?;
            self.add_face(to_n2, h5, self.pair(h3))?;
            self.add_face(h3, h6, self.pair(to_n1))?;
        }
        if let Some((h7, h8, n4)) = side2 {
            let h4 = self.add_edge(node, n4)?;
            self.add_face(to_n1, h7, self.pair(h4))?;
            self.add_face(h4, h8, self.pair(to_n2))?;
        }
        Ok(node)
    }

    fn opposite_side(&self, h: HalfedgeKey) -> Option<Side> {
        self.face_of(h)?;
        let prev = self.prev(h);
        Some((self.next(h), prev, self.origin(prev)))
    }
}
