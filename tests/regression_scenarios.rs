//! Deterministic regression tests for the meshing pipeline.
//!
//! Each test pins down a small, fixed configuration whose outcome is known
//! exactly: entity counts after elementary edits, the behaviour of flips and
//! their inverses, idempotence of the Delaunay pass, and the bounds
//! guaranteed by refinement on the reference shapes.

#![forbid(unsafe_code)]

use std::sync::Arc;

use approx::assert_relative_eq;
use ruppert::geometry::util::barycenter;
use ruppert::prelude::*;

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

fn counts<K: Kernel>(mesh: &Mesh<K>) -> (usize, usize, usize) {
    (
        mesh.number_of_nodes(),
        mesh.number_of_edges(),
        mesh.number_of_faces(),
    )
}

fn interior_edge<K: Kernel>(mesh: &Mesh<K>) -> EdgeKey {
    mesh.edge_keys()
        .find(|&e| !mesh.is_boundary_edge(e))
        .expect("mesh has an interior edge")
}

fn snapshot(mesh: &Mesh) -> Vec<(HalfedgeKey, Halfedge)> {
    mesh.halfedges().map(|(k, h)| (k, *h)).collect()
}

/// Faces with at least two sides on the boundary are exempt from the angle
/// bound.
fn is_restricted(mesh: &Mesh, face: FaceKey) -> bool {
    mesh.face_halfedges(face)
        .iter()
        .filter(|&&h| mesh.is_boundary_edge(mesh.edge_of(h)))
        .count()
        > 1
}

// =============================================================================
// ELEMENTARY SCENARIOS
// =============================================================================

#[test]
fn test_unit_square_triangulation_counts() {
    let mesh = triangulate(&Polygon::square(1.0)).unwrap();
    assert_eq!(counts(&mesh), (4, 5, 2));
    assert_eq!(mesh.number_of_halfedges(), 10);
    assert_eq!(mesh.boundary_halfedges().count(), 4);
    assert!(mesh.is_valid());
}

#[test]
fn test_split_square_diagonal_at_midpoint() {
    let mut mesh = triangulate(&Polygon::square(1.0)).unwrap();
    let diagonal = interior_edge(&mesh);
    let [p1, p2] = mesh.edge_vertices(diagonal);
    assert_eq!(p1 + p2, Point::new([1.0, 1.0]));

    let node = mesh.split_edge(diagonal, Point::new([0.5, 0.5])).unwrap();
    assert_eq!(counts(&mesh), (5, 8, 4));
    assert_eq!(mesh.degree(node), 4);
    assert!(!mesh.contains_edge(diagonal));
    for f in mesh.face_keys() {
        assert_relative_eq!(mesh.face_area(f), 0.25);
    }
    assert!(mesh.is_valid());
}

#[test]
fn test_refining_unit_square_inserts_nothing() {
    init_tracing();
    let mut mesh = triangulate(&Polygon::square(1.0)).unwrap();
    make_cdt(&mut mesh).unwrap();
    let config = RefinementConfig::builder()
        .max_area(1.0)
        .min_angle_degrees(20.0)
        .build()
        .unwrap();
    let stats = refine(&mut mesh, &config).unwrap();
    assert_eq!(stats.inserted_nodes(), 0);
    assert_eq!(stats, RefinementStatistics::default());
    assert_eq!(counts(&mesh), (4, 5, 2));
}

#[test]
fn test_add_face_with_broken_chain_is_rejected() {
    let mut mesh = Mesh::new();
    let a = mesh.add_node(Point::new([0.0, 0.0]));
    let b = mesh.add_node(Point::new([1.0, 0.0]));
    let c = mesh.add_node(Point::new([0.0, 1.0]));
    let ab = mesh.add_edge(a, b).unwrap();
    let bc = mesh.add_edge(b, c).unwrap();
    let ca = mesh.add_edge(c, a).unwrap();

    let before = counts(&mesh);
    let err = mesh.add_face(ab, ca, bc).unwrap_err();
    assert!(matches!(err, FaceError::NotChained { .. }));
    assert_eq!(counts(&mesh), before);
    assert!(mesh.is_valid());

    // The correctly ordered chain still closes.
    assert!(mesh.add_face(ab, bc, ca).is_ok());
    assert_eq!(mesh.number_of_faces(), 1);
}

#[test]
fn test_removed_handles_are_not_reused() {
    let mut mesh = triangulate(&Polygon::square(1.0)).unwrap();
    let face = mesh.face_keys().next().unwrap();
    mesh.remove_face(face).unwrap();

    // The freed slot is taken again with a new generation.
    let other = mesh.face_keys().next().unwrap();
    let [a, b, c] = mesh.face_vertices(other);
    mesh.split_face(other, barycenter(a, b, c)).unwrap();
    assert_eq!(mesh.number_of_faces(), 3);
    assert!(!mesh.contains_face(face));
    assert_eq!(
        mesh.split_face(face, Point::new([0.2, 0.2])),
        Err(MeshError::FaceNotFound { face })
    );
    assert!(mesh.is_valid());
}

// =============================================================================
// FLIPS
// =============================================================================

#[test]
fn test_flip_twice_restores_face_vertex_sets() {
    let mut mesh = triangulate(&Polygon::square(1.0)).unwrap();
    let diagonal = interior_edge(&mesh);
    let sorted_faces = |mesh: &Mesh| {
        let mut faces: Vec<[NodeKey; 3]> = mesh
            .face_keys()
            .map(|f| {
                let mut nodes = mesh.face_nodes(f);
                nodes.sort();
                nodes
            })
            .collect();
        faces.sort();
        faces
    };
    let mut endpoints = mesh.edge_nodes(diagonal);
    endpoints.sort();
    let faces = sorted_faces(&mesh);

    mesh.flip_edge(diagonal).unwrap();
    assert_ne!(sorted_faces(&mesh), faces);
    mesh.flip_edge(diagonal).unwrap();

    let mut restored = mesh.edge_nodes(diagonal);
    restored.sort();
    assert_eq!(restored, endpoints);
    assert_eq!(sorted_faces(&mesh), faces);
    assert!(mesh.is_valid());
}

#[test]
fn test_unflip_is_exact_inverse_on_reference_shapes() {
    for polygon in [Polygon::letter_u(), Polygon::kidney(), Polygon::island()] {
        let mut mesh = triangulate(&polygon).unwrap();
        let edges: Vec<EdgeKey> = mesh.edge_keys().collect();
        for edge in edges {
            if !mesh.is_diagonal_of_convex_quadrilateral(edge) {
                continue;
            }
            let before = snapshot(&mesh);
            mesh.flip_edge(edge).unwrap();
            mesh.unflip_edge(edge).unwrap();
            assert_eq!(snapshot(&mesh), before);
        }
        assert!(mesh.is_valid());
    }
}

#[test]
fn test_flip_errors() {
    let mut mesh = triangulate(&Polygon::square(1.0)).unwrap();
    let boundary = mesh
        .edge_keys()
        .find(|&e| mesh.is_boundary_edge(e))
        .unwrap();
    assert_eq!(
        mesh.flip_edge(boundary),
        Err(FlipError::BoundaryEdge { edge: boundary })
    );

    let diagonal = interior_edge(&mesh);
    mesh.set_constrained(diagonal, true).unwrap();
    assert_eq!(
        mesh.flip_edge(diagonal),
        Err(FlipError::ConstrainedEdge { edge: diagonal })
    );

    let mut concave = triangulate(&Polygon::from_coords(&[
        [0.0, 0.0],
        [2.0, 0.0],
        [1.0, 0.5],
        [1.0, 2.0],
    ]))
    .unwrap();
    let diagonal = interior_edge(&concave);
    assert_eq!(
        concave.flip_edge(diagonal),
        Err(FlipError::NotConvex { edge: diagonal })
    );
}

// =============================================================================
// CONSTRAINED DELAUNAY
// =============================================================================

#[test]
fn test_make_cdt_is_idempotent_on_reference_shapes() {
    init_tracing();
    for polygon in [
        Polygon::triangle(),
        Polygon::letter_u(),
        Polygon::crack(),
        Polygon::letter_a(),
        Polygon::kidney(),
        Polygon::island(),
    ] {
        let mut mesh = triangulate(&polygon).unwrap();
        let before = counts(&mesh);
        make_cdt(&mut mesh).unwrap();
        assert_eq!(counts(&mesh), before);
        assert_eq!(validate_delaunay(&mesh), Ok(()));
        assert_eq!(make_cdt(&mut mesh).unwrap(), 0);
    }
}

// =============================================================================
// REFINEMENT
// =============================================================================

#[test]
fn test_refinement_bounds_on_reference_shapes() {
    init_tracing();
    for polygon in [
        Polygon::letter_u(),
        Polygon::crack(),
        Polygon::letter_a(),
        Polygon::kidney(),
    ] {
        let area = polygon.normalized().unwrap().signed_area();
        let config = RefinementConfig::builder()
            .max_area(area / 40.0)
            .min_angle_degrees(20.0)
            .build()
            .unwrap();
        let (mesh, stats) = mesh_polygon(&polygon, &config).unwrap();

        assert_eq!(mesh.validate(), Ok(()));
        assert_eq!(validate_delaunay(&mesh), Ok(()));
        assert_eq!(
            mesh.number_of_nodes(),
            polygon.normalized().unwrap().len() + stats.inserted_nodes()
        );

        let quality = MeshQuality::of(&mesh).unwrap();
        assert!(quality.max_area <= config.max_area);
        assert!(quality.min_area > 0.0);
        assert_relative_eq!(quality.total_area, area, max_relative = 1e-9);

        // No input angle is below 20°, so no face may be given up on.
        assert_eq!(stats.skipped_faces, 0);
        let min_angle = config.min_angle_degrees.to_radians();
        let violations = mesh
            .face_keys()
            .filter(|&f| !is_restricted(&mesh, f) && mesh.face_min_angle(f) < min_angle)
            .count();
        assert_eq!(violations, 0);
    }
}

#[test]
fn test_refinement_is_deterministic() {
    let config = RefinementConfig::builder().max_area(0.05).build().unwrap();
    let (first, stats1) = mesh_polygon(&Polygon::letter_a(), &config).unwrap();
    let (second, stats2) = mesh_polygon(&Polygon::letter_a(), &config).unwrap();
    assert_eq!(stats1, stats2);
    let positions = |mesh: &Mesh| -> Vec<Point> { mesh.nodes().map(|(_, n)| n.position()).collect() };
    assert_eq!(positions(&first), positions(&second));
}

#[test]
fn test_refinement_on_curved_boundary() {
    init_tracing();
    // Half disk: the arc from (1, 0) through (0, 1) to (-1, 0) is sampled
    // coarsely and refinement must place new boundary nodes on the circle.
    let mut mesh = triangulate(&Polygon::from_coords(&[
        [-1.0, 0.0],
        [1.0, 0.0],
        [0.0, 1.0],
    ]))
    .unwrap();
    let arc: CurveRef = Arc::new(
        CircularArc::from_three_points(
            Point::new([1.0, 0.0]),
            Point::new([0.0, 1.0]),
            Point::new([-1.0, 0.0]),
        )
        .unwrap(),
    );
    let curved: Vec<EdgeKey> = mesh
        .edge_keys()
        .filter(|&e| mesh.is_boundary_edge(e))
        .filter(|&e| mesh.edge_vertices(e).iter().any(|p| p.y() > 0.5))
        .collect();
    assert_eq!(curved.len(), 2);
    for edge in curved {
        mesh.set_curve(edge, Some(Arc::clone(&arc))).unwrap();
    }
    make_cdt(&mut mesh).unwrap();

    let config = RefinementConfig::builder().max_area(0.02).build().unwrap();
    let stats = refine(&mut mesh, &config).unwrap();
    assert!(stats.boundary_splits > 0);
    assert!(mesh.is_valid());

    let mut on_arc = 0;
    for (_, node) in mesh.nodes() {
        let p = node.position();
        if p.y() > 1e-12 && mesh.boundary_halfedges().any(|h| mesh.position(mesh.origin(h)) == p) {
            assert_relative_eq!(p.norm(), 1.0, epsilon = 1e-9);
            on_arc += 1;
        }
    }
    assert!(on_arc > 1);
    assert!(mesh.face_keys().all(|f| mesh.face_area(f) <= 0.02));
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let mut mesh = triangulate(&Polygon::square(1.0)).unwrap();
    let config = RefinementConfig {
        max_area: 0.0,
        ..RefinementConfig::default()
    };
    assert!(matches!(
        refine(&mut mesh, &config),
        Err(RefinementError::InvalidConfig { .. })
    ));
    assert_eq!(counts(&mesh), (4, 5, 2));
}
