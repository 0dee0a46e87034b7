//! Property-based tests for Delaunay refinement.
//!
//! Random star-shaped polygons without sharp input angles are meshed end to
//! end; the result must be a valid constrained Delaunay triangulation that
//! covers the polygon and satisfies the area bound everywhere and the angle
//! bound on every unrestricted face.

#![forbid(unsafe_code)]

use approx::assert_relative_eq;
use proptest::prelude::*;
use ruppert::prelude::*;

/// Strategy for perturbed regular polygons: `n` vertices at evenly spaced
/// angles with radii in `[0.85, 1.15]`, scaled by `scale`.
fn star_polygon() -> impl Strategy<Value = Polygon> {
    (5_usize..10, 0.5..20.0_f64).prop_flat_map(|(n, scale)| {
        prop::collection::vec(0.85..1.15_f64, n).prop_map(move |radii| {
            let n = radii.len();
            radii
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    let t = std::f64::consts::TAU * i as f64 / n as f64;
                    Point::new([scale * r * t.cos(), scale * r * t.sin()])
                })
                .collect()
        })
    })
}

/// A face with two or more boundary sides is exempt from the angle bound.
fn is_restricted(mesh: &Mesh, face: FaceKey) -> bool {
    mesh.face_halfedges(face)
        .into_iter()
        .filter(|&h| mesh.is_boundary_halfedge(mesh.pair(h)))
        .count()
        > 1
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Property: refinement yields a valid, area-bounded, constrained
    /// Delaunay mesh of the same domain.
    #[test]
    fn prop_refinement_bounds(
        polygon in star_polygon(),
        divisions in 4.0..60.0_f64,
        placement in prop_oneof![Just(SteinerPlacement::Circumcenter), Just(SteinerPlacement::Offcenter)],
    ) {
        let area = polygon.signed_area();
        let config = RefinementConfig::builder()
            .max_area(area / divisions)
            .min_angle_degrees(20.0)
            .steiner_placement(placement)
            .build()
            .unwrap();
        let (mesh, stats) = mesh_polygon(&polygon, &config).unwrap();

        prop_assert_eq!(mesh.validate(), Ok(()));
        prop_assert_eq!(validate_delaunay(&mesh), Ok(()));
        prop_assert_eq!(mesh.number_of_nodes(), polygon.len() + stats.inserted_nodes());

        let quality = MeshQuality::of(&mesh).unwrap();
        prop_assert!(quality.max_area <= config.max_area);
        prop_assert!(quality.min_area > 0.0);
        assert_relative_eq!(quality.total_area, area, max_relative = 1e-9);

        prop_assert_eq!(stats.skipped_faces, 0);
        let min_angle = config.min_angle_degrees.to_radians();
        for f in mesh.face_keys() {
            if !is_restricted(&mesh, f) {
                prop_assert!(
                    mesh.face_min_angle(f) >= min_angle,
                    "minimum angle {:.3}° below the bound",
                    mesh.face_min_angle(f).to_degrees()
                );
            }
        }
    }

    /// Property: a Steiner budget is never exceeded.
    #[test]
    fn prop_steiner_budget_respected(polygon in star_polygon(), budget in 0_usize..8) {
        let area = polygon.signed_area();
        let config = RefinementConfig::builder()
            .max_area(area / 200.0)
            .max_steiner_points(budget)
            .build()
            .unwrap();
        let mut mesh = triangulate(&polygon).unwrap();
        make_cdt(&mut mesh).unwrap();
        let nodes = mesh.number_of_nodes();

        match refine(&mut mesh, &config) {
            Ok(stats) => prop_assert!(stats.inserted_nodes() <= budget),
            Err(RefinementError::SteinerBudgetExhausted { inserted, budget: b }) => {
                prop_assert_eq!(b, budget);
                prop_assert_eq!(inserted, budget);
                prop_assert_eq!(mesh.number_of_nodes(), nodes + budget);
            }
            Err(err) => prop_assert!(false, "unexpected error: {err}"),
        }
        prop_assert!(mesh.is_valid());
    }
}
