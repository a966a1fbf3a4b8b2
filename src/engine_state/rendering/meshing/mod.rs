//! Mesh generation for terrain chunks.
//!
//! Chunks are polygonised with marching cubes into flat, world-space triangle lists.
//! What happens next depends on the world's [`TerrainGeometry`]:
//!
//! - **Standard**: the flat mesh is used as-is; the camera's view matrix bends it.
//! - **Spherical**: triangles with any corner beyond the chart's cutoff radius are
//!   dropped, then every surviving vertex is embedded on the unit sphere in the shared
//!   frame of both charts.
//!
//! # Architecture
//! - `tables`: Edge and triangle lookup tables
//! - `marching_cubes`: The per-cube polygoniser

use cgmath::{EuclideanSpace, Point3, Vector4};
use log::trace;
use web_time::Instant;

use crate::engine_state::{
    geometry::{Chart, SphereCharts, TerrainGeometry},
    rendering::Vertex,
    voxels::chunk::Chunk,
};

mod marching_cubes;
mod tables;

#[cfg(test)]
mod tests;

pub use marching_cubes::march;

/// Turns chunk lattices into renderable triangle lists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshGenerator {
    geometry: TerrainGeometry,
}

impl MeshGenerator {
    pub fn new(geometry: TerrainGeometry) -> Self {
        Self { geometry }
    }

    /// Builds the mesh for `chunk`.
    ///
    /// # Arguments
    /// * `chunk` - The chunk to mesh; its lattice must not change while this runs
    /// * `chart` - Chart the chunk belongs to; ignored on flat worlds
    ///
    /// # Returns
    /// Three vertices per triangle. Empty if the chunk has no surface or, on a
    /// spherical world, lies entirely outside its chart.
    pub fn generate(&self, chunk: &Chunk, chart: Chart) -> Vec<Vertex> {
        let start = Instant::now();

        let flat = march(chunk.lattice(), chunk.origin(), chunk.scale());
        let mesh = match &self.geometry {
            TerrainGeometry::Standard => flat,
            TerrainGeometry::Spherical(charts) => wrap_onto_sphere(&flat, charts, chart),
        };

        trace!(
            "meshed chunk {:?}: {} triangles in {:?}",
            chunk.position,
            mesh.len() / 3,
            start.elapsed()
        );
        mesh
    }
}

/// Clips a flat mesh to the chart's cutoff and embeds what is left on the sphere.
fn wrap_onto_sphere(flat: &[Vertex], charts: &SphereCharts, chart: Chart) -> Vec<Vertex> {
    let cutoff = charts.cutoff_radius();
    let center = charts.center(chart);
    flat.chunks_exact(3)
        .filter(|triangle| {
            triangle
                .iter()
                .all(|vertex| charts.horizontal_distance(flat_position(vertex), chart) <= cutoff)
        })
        .flatten()
        .map(|vertex| {
            let offset = flat_position(vertex) - center;
            let embedded: Vector4<f32> = charts.to_shared_frame(offset, chart);
            Vertex {
                position: embedded.into(),
                ..*vertex
            }
        })
        .collect()
}

/// World-space point of a flat mesh vertex.
pub fn flat_position(vertex: &Vertex) -> Point3<f32> {
    let position = vertex.position();
    Point3::from_vec(position.truncate())
}
