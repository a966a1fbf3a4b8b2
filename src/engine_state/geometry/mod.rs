//! # Geometry
//!
//! The curvature math kernel and the two terrain geometry modes.
//!
//! * `kernel` - Embedding, inverse embedding, translation/view/projection matrices and
//!   reflection for the spherical, hyperbolic and Euclidean models
//! * `sphere_chart` - The two-chart cover used by spherical worlds
//!
//! Everything that differs between flat and spherical terrain goes through a single
//! `match` on [`TerrainGeometry`].

pub mod kernel;
pub mod sphere_chart;

pub use kernel::{
    curved_distance, curved_to_euc, euc_to_curved, euc_to_curved3, minkowski_dot,
    projection_matrix, reflect_vector, translation_matrix, view_matrix, CURVE_EPSILON, EPSILON,
};
pub use sphere_chart::{Chart, SphereCharts, SphereLayout, SPHERE_CURVE};

/// How terrain lattices map onto space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerrainGeometry {
    /// Flat lattice, sampled and rendered in world space.
    Standard,
    /// Lattice patches around two chart centers wrapped onto a sphere.
    Spherical(SphereCharts),
}

impl TerrainGeometry {
    /// Returns the sphere charts when the world is spherical.
    pub fn sphere_charts(&self) -> Option<&SphereCharts> {
        match self {
            TerrainGeometry::Standard => None,
            TerrainGeometry::Spherical(charts) => Some(charts),
        }
    }

    /// Curvature the terrain itself is embedded with.
    ///
    /// Spherical worlds are always meshed on the unit sphere; flat worlds are bent only
    /// by the camera's view matrix.
    pub fn embedding_curve(&self) -> f32 {
        match self {
            TerrainGeometry::Standard => 0.0,
            TerrainGeometry::Spherical(_) => SPHERE_CURVE,
        }
    }
}
