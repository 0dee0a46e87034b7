//! # ruppert
//!
//! Quality 2D triangular mesh generation on a half-edge mesh.
//!
//! A simple polygon is triangulated by ear clipping, repaired into a
//! constrained Delaunay triangulation by edge flips, and refined with
//! Ruppert's algorithm until every triangle satisfies a maximum-area and a
//! minimum-angle bound. Steiner points are inserted speculatively and rolled
//! back when they would encroach the boundary.
//!
//! # Features
//!
//! - Half-edge mesh on generational arenas ([`slotmap`]); stale handles are
//!   detected instead of aliasing new entities
//! - Exact orientation and in-circle predicates (floating-point filter with an
//!   arbitrary-precision rational fallback)
//! - Curved boundaries through the [`BoundaryCurve`](core::boundary::BoundaryCurve) trait
//! - Circumcenter or off-center Steiner point placement
//! - Serialization of inputs, configuration and statistics with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use ruppert::prelude::*;
//!
//! let config = RefinementConfig::builder()
//!     .max_area(0.05)
//!     .min_angle_degrees(20.0)
//!     .build()
//!     .unwrap();
//! let (mesh, stats) = mesh_polygon(&Polygon::letter_u(), &config).unwrap();
//!
//! assert!(mesh.is_valid());
//! assert!(stats.steiner_points > 0);
//! for face in mesh.face_keys() {
//!     assert!(mesh.face_area(face) <= 0.05);
//! }
//! ```
//!
//! # Step by Step
//!
//! Each stage is available on its own and works on the same [`Mesh`](core::mesh::Mesh):
//!
//! ```rust
//! use ruppert::prelude::*;
//!
//! let mut mesh = triangulate(&Polygon::kidney()).unwrap();
//! let flips = make_cdt(&mut mesh).unwrap();
//! assert!(validate_delaunay(&mesh).is_ok());
//! assert_eq!(make_cdt(&mut mesh).unwrap(), 0);
//!
//! let stats = refine(&mut mesh, &RefinementConfig::default()).unwrap();
//! let quality = MeshQuality::of(&mesh).unwrap();
//! assert!(quality.max_area <= 1.0);
//! # let _ = (flips, stats);
//! ```
//!
//! # Logging
//!
//! The crate emits [`tracing`] events (`debug` for stage summaries, `trace`
//! for individual insertions, `warn` for suspicious configurations) and
//! never installs a subscriber.

// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// The half-edge mesh and its topology-editing primitives.
pub mod core {
    /// Point insertion, edge flips and point location
    pub mod algorithms {
        pub mod flips;
        pub mod locate;
        pub mod split;
    }
    pub mod boundary;
    /// Storage and hashing aliases used throughout the crate
    pub mod collections;
    pub mod mesh;
    pub mod validation;

    pub use mesh::*;
}

/// Points, polygons, exact predicates and geometric constructions.
pub mod geometry {
    pub mod bounding_box;
    /// Geometric kernel abstraction over exact and fast predicates
    pub mod kernel;
    pub mod point;
    pub mod polygon;
    pub mod predicates;
    /// Triangle and mesh quality measures
    pub mod quality;
    pub mod robust_predicates;
    pub mod util;

    pub use point::*;
    pub use polygon::*;
}

/// The meshing pipeline: triangulation, Delaunay repair and refinement.
pub mod triangulation {
    pub mod delaunay;
    pub mod refinement;
    pub mod triangulator;
}

/// A prelude module that re-exports commonly used types and functions.
pub mod prelude {
    pub use crate::core::{
        algorithms::{
            flips::FlipError,
            locate::{LocateError, Location},
        },
        boundary::{BoundaryCurve, CircularArc, CurveRef, StraightSegment},
        collections::{FastHashMap, FastHashSet},
        mesh::*,
        validation::MeshValidationError,
    };

    pub use crate::geometry::{
        bounding_box::BoundingBox,
        kernel::{AdaptiveKernel, FastKernel, Kernel},
        point::Point,
        polygon::{Polygon, PolygonError},
        predicates::{InCircle, Orientation},
        quality::{MeshQuality, TriangleQuality},
        util::GeometryError,
    };

    pub use crate::triangulation::{
        delaunay::{DelaunayValidationError, is_encroached, make_cdt, validate_delaunay},
        refinement::{
            RefinementConfig, RefinementConfigBuilder, RefinementError, RefinementStatistics,
            SteinerPlacement, mesh_polygon, refine,
        },
        triangulator::{TriangulationError, triangulate, triangulate_with_kernel},
    };
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{
        core::mesh::{Mesh, MeshError},
        geometry::{kernel::FastKernel, point::Point, polygon::Polygon},
        is_normal,
        triangulation::refinement::{RefinementConfig, RefinementError, RefinementStatistics},
    };

    // =============================================================================
    // TYPE SAFETY TESTS
    // =============================================================================

    #[test]
    fn normal_types() {
        assert!(is_normal::<Point>());
        assert!(is_normal::<Polygon>());
        assert!(is_normal::<Mesh>());
        assert!(is_normal::<Mesh<FastKernel>>());
        assert!(is_normal::<MeshError>());
        assert!(is_normal::<RefinementConfig>());
        assert!(is_normal::<RefinementStatistics>());
        assert!(is_normal::<RefinementError>());
    }

    #[test]
    fn test_prelude_pipeline_exports() {
        use crate::prelude::*;

        let mut mesh = triangulate(&Polygon::square(2.0)).unwrap();
        assert_eq!(make_cdt(&mut mesh).unwrap(), 0);
        let stats = refine(&mut mesh, &RefinementConfig::default()).unwrap();
        assert!(stats.inserted_nodes() > 0);
        assert!(mesh.face_keys().all(|f| mesh.face_area(f) <= 1.0));

        let mut set: FastHashSet<FaceKey> = FastHashSet::default();
        set.extend(mesh.face_keys());
        assert_eq!(set.len(), mesh.number_of_faces());
    }
}
