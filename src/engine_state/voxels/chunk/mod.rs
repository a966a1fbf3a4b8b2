//! # Chunk Module
//!
//! A chunk is one cubic region of terrain: a dense [`VoxelLattice`] of signed density
//! samples together with the mesh last built from it.
//!
//! ## Coordinates
//! - `position` is in chunk coordinates (one step per chunk)
//! - Lattice sample `(i, j, k)` sits at `origin + (i, j, k) * scale` in world space,
//!   where `origin = position * chunk_size * scale`
//!
//! ## Sculpting
//! `mine` and `build` add or remove density inside a spherical brush with a linear
//! falloff. Both only touch `value`; materials stay as generated. Either one marks the
//! chunk as modified so it is persisted when evicted.

use std::sync::Arc;

use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};

use crate::engine_state::rendering::Vertex;

pub use lattice::VoxelLattice;

mod lattice;

/// A cubic region of terrain.
pub struct Chunk {
    /// Position of this chunk in chunk coordinates.
    pub position: Point3<i32>,
    origin: Point3<f32>,
    scale: f32,
    lattice: VoxelLattice,
    mesh: Arc<Vec<Vertex>>,
    /// Set when sculpting has changed the lattice since it was generated or loaded.
    pub modified: bool,
    /// Set once the current lattice has been handed to the chunk store.
    pub saved: bool,
}

impl Chunk {
    /// Wraps a lattice generated or loaded for `position`.
    ///
    /// # Arguments
    /// * `position` - Chunk coordinates
    /// * `lattice` - Samples for this chunk, including the overlap apron
    /// * `chunk_size` - Edge length of a chunk in lattice steps
    /// * `scale` - World units per lattice step
    pub fn new(position: Point3<i32>, lattice: VoxelLattice, chunk_size: u32, scale: f32) -> Self {
        Self {
            position,
            origin: Self::origin_of(position, chunk_size, scale),
            scale,
            lattice,
            mesh: Arc::new(Vec::new()),
            modified: false,
            saved: false,
        }
    }

    /// World-space position of lattice sample `(0, 0, 0)` for a chunk at `position`.
    pub fn origin_of(position: Point3<i32>, chunk_size: u32, scale: f32) -> Point3<f32> {
        let extent = chunk_size as f32 * scale;
        Point3::new(
            position.x as f32 * extent,
            position.y as f32 * extent,
            position.z as f32 * extent,
        )
    }

    pub fn origin(&self) -> Point3<f32> {
        self.origin
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn lattice(&self) -> &VoxelLattice {
        &self.lattice
    }

    /// The mesh last uploaded for this chunk.
    pub fn mesh(&self) -> Arc<Vec<Vertex>> {
        self.mesh.clone()
    }

    pub fn set_mesh(&mut self, mesh: Arc<Vec<Vertex>>) {
        self.mesh = mesh;
    }

    /// World-space position of a lattice sample.
    pub fn sample_position(&self, x: usize, y: usize, z: usize) -> Point3<f32> {
        self.origin + Vector3::new(x as f32, y as f32, z as f32) * self.scale
    }

    /// World-space axis-aligned bounds `[min, max]` covered by the lattice.
    pub fn bounds(&self) -> (Point3<f32>, Point3<f32>) {
        let [dx, dy, dz] = self.lattice.dims();
        let extent = Vector3::new(dx as f32, dy as f32, dz as f32) * self.scale;
        (self.origin, self.origin + extent)
    }

    /// Euclidean distance from `point` to the chunk's bounds; `0` inside.
    pub fn distance_from_chunk(&self, point: Point3<f32>) -> f32 {
        let (min, max) = self.bounds();
        distance_to_bounds(point, min, max)
    }

    /// Trilinearly interpolated density at a world point.
    ///
    /// # Returns
    /// `None` if `point` is outside the sampled lattice.
    pub fn sample_value(&self, point: Point3<f32>) -> Option<f32> {
        let local = (point - self.origin) / self.scale;
        let [dx, dy, dz] = self.lattice.dims();
        if dx < 2 || dy < 2 || dz < 2 {
            return None;
        }
        let inside = |coordinate: f32, dim: usize| (0.0..=(dim - 1) as f32).contains(&coordinate);
        if !(inside(local.x, dx) && inside(local.y, dy) && inside(local.z, dz)) {
            return None;
        }

        // Base corner of the enclosing cube, kept one short of the far face.
        let base = |coordinate: f32, dim: usize| (coordinate.floor() as usize).min(dim - 2);
        let (x0, y0, z0) = (base(local.x, dx), base(local.y, dy), base(local.z, dz));
        let (tx, ty, tz) = (local.x - x0 as f32, local.y - y0 as f32, local.z - z0 as f32);

        let value = |x: usize, y: usize, z: usize| self.lattice.value(x0 + x, y0 + y, z0 + z);
        let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;

        let x00 = lerp(value(0, 0, 0), value(1, 0, 0), tx);
        let x10 = lerp(value(0, 1, 0), value(1, 1, 0), tx);
        let x01 = lerp(value(0, 0, 1), value(1, 0, 1), tx);
        let x11 = lerp(value(0, 1, 1), value(1, 1, 1), tx);
        Some(lerp(lerp(x00, x10, ty), lerp(x01, x11, ty), tz))
    }

    /// Raises density around `location`, carving terrain away.
    ///
    /// Every sample strictly closer than `radius` gains
    /// `weight * dt * (1 - distance / radius)`.
    ///
    /// # Returns
    /// `true` if any sample changed
    pub fn mine(&mut self, location: Point3<f32>, dt: f32, weight: f32, radius: f32) -> bool {
        self.apply_brush(location, radius, weight * dt)
    }

    /// Lowers density around `location`, adding terrain. Mirror of [`Chunk::mine`].
    pub fn build(&mut self, location: Point3<f32>, dt: f32, weight: f32, radius: f32) -> bool {
        self.apply_brush(location, radius, -weight * dt)
    }

    fn apply_brush(&mut self, location: Point3<f32>, radius: f32, strength: f32) -> bool {
        if radius <= 0.0 || strength == 0.0 {
            return false;
        }

        let origin = self.origin.to_vec();
        let scale = self.scale;
        let mut changed = false;

        for ([x, y, z], voxel) in self.lattice.iter_mut() {
            let sample = Point3::from_vec(origin + Vector3::new(x as f32, y as f32, z as f32) * scale);
            let distance = (sample - location).magnitude();
            if distance < radius {
                voxel.value += strength * falloff(distance, radius);
                changed = true;
            }
        }

        if changed {
            self.modified = true;
            self.saved = false;
        }
        changed
    }
}

/// Euclidean distance from `point` to the box `[min, max]`; `0` inside.
pub fn distance_to_bounds(point: Point3<f32>, min: Point3<f32>, max: Point3<f32>) -> f32 {
    let nearest = Point3::new(
        point.x.clamp(min.x, max.x),
        point.y.clamp(min.y, max.y),
        point.z.clamp(min.z, max.z),
    );
    (point - nearest).magnitude()
}

/// Linear brush falloff: `1` at the center, `0` at the rim.
fn falloff(distance: f32, radius: f32) -> f32 {
    1.0 - distance / radius
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::engine_state::voxels::voxel::{Material, Voxel};

    fn unit_chunk(edge: usize, overlap: usize) -> Chunk {
        let lattice = VoxelLattice::for_chunk(edge - overlap - 1, overlap, Voxel::air());
        Chunk::new(Point3::new(0, 0, 0), lattice, (edge - overlap - 1) as u32, 1.0)
    }

    #[test]
    fn mine_only_touches_samples_inside_the_brush() {
        // 5x5x5 samples at unit spacing from the origin.
        let mut chunk = unit_chunk(5, 0);
        assert_eq!(chunk.lattice().dims(), [5, 5, 5]);

        let center = Point3::new(0.5, 0.5, 0.5);
        assert!(chunk.mine(center, 0.5, 2.0, 1.0));
        assert!(chunk.modified);

        let expected_gain = 0.5 * 2.0 * (1.0 - 0.75_f32.sqrt());
        for z in 0..5 {
            for y in 0..5 {
                for x in 0..5 {
                    let value = chunk.lattice().value(x, y, z);
                    if x <= 1 && y <= 1 && z <= 1 {
                        assert_abs_diff_eq!(value, 1.0 + expected_gain, epsilon = 1e-6);
                    } else {
                        assert_eq!(value, 1.0);
                    }
                }
            }
        }
    }

    #[test]
    fn mine_on_a_zeroed_chunk_leaves_far_samples_at_zero() {
        let lattice = VoxelLattice::new([5, 5, 5], 0, Voxel::new(0.0, Material::Rock));
        let mut chunk = Chunk::new(Point3::new(0, 0, 0), lattice, 4, 1.0);

        chunk.mine(Point3::new(0.5, 0.5, 0.5), 1.0, 1.0, 1.0);
        assert!(chunk.lattice().value(0, 0, 0) > 0.0);
        assert_eq!(chunk.lattice().value(3, 3, 3), 0.0);

        chunk.build(Point3::new(0.5, 0.5, 0.5), 2.0, 1.0, 1.0);
        assert!(chunk.lattice().value(0, 0, 0) < 0.0);
        assert_eq!(chunk.lattice().value(3, 3, 3), 0.0);
    }

    #[test]
    fn build_mirrors_mine() {
        let mut chunk = unit_chunk(5, 0);
        let center = Point3::new(0.5, 0.5, 0.5);
        chunk.build(center, 0.5, 2.0, 1.0);

        let expected_loss = 0.5 * 2.0 * (1.0 - 0.75_f32.sqrt());
        assert_abs_diff_eq!(chunk.lattice().value(1, 1, 1), 1.0 - expected_loss, epsilon = 1e-6);
        assert_eq!(chunk.lattice().value(2, 0, 0), 1.0);

        chunk.mine(center, 0.5, 2.0, 1.0);
        assert_abs_diff_eq!(chunk.lattice().value(1, 1, 1), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn brush_rim_is_exclusive() {
        let mut chunk = unit_chunk(5, 0);
        // Sample (1, 0, 0) is exactly one unit away.
        assert!(chunk.mine(Point3::new(0.0, 0.0, 0.0), 1.0, 1.0, 1.0));
        assert_eq!(chunk.lattice().value(1, 0, 0), 1.0);
        assert_abs_diff_eq!(chunk.lattice().value(0, 0, 0), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn untouched_chunk_stays_unmodified() {
        let mut chunk = unit_chunk(5, 0);
        assert!(!chunk.mine(Point3::new(50.0, 50.0, 50.0), 1.0, 1.0, 2.0));
        assert!(!chunk.modified);
    }

    #[test]
    fn distance_is_zero_inside_and_axis_gap_outside() {
        let size = 8;
        let lattice = VoxelLattice::for_chunk(size, 1, Voxel::air());
        let chunk = Chunk::new(Point3::new(0, 0, 0), lattice, size as u32, 1.0);

        assert_eq!(chunk.distance_from_chunk(Point3::new(3.0, 4.0, 5.0)), 0.0);
        assert_abs_diff_eq!(
            chunk.distance_from_chunk(Point3::new(size as f32 + 4.0, 1.0, 1.0)),
            2.0,
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            chunk.distance_from_chunk(Point3::new(-3.0, -4.0, 1.0)),
            5.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn sample_value_interpolates_between_samples() {
        let lattice = VoxelLattice::from_fn([3, 3, 3], 0, |x, y, _| {
            Voxel::new(y as f32 - 1.0 + x as f32 * 0.5, Material::Rock)
        });
        let chunk = Chunk::new(Point3::new(0, 0, 0), lattice, 2, 1.0);

        let below = chunk.sample_value(Point3::new(0.0, 0.5, 0.3)).unwrap();
        let far_face = chunk.sample_value(Point3::new(1.5, 2.0, 2.0)).unwrap();
        assert_abs_diff_eq!(below, -0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(far_face, 1.75, epsilon = 1e-6);
        assert!(chunk.sample_value(Point3::new(2.5, 0.0, 0.0)).is_none());
        assert!(chunk.sample_value(Point3::new(0.0, -0.1, 0.0)).is_none());
    }

    #[test]
    fn origin_scales_with_position() {
        let lattice = VoxelLattice::for_chunk(4, 1, Voxel::air());
        let chunk = Chunk::new(Point3::new(2, -1, 0), lattice, 4, 0.5);
        assert_eq!(chunk.origin(), Point3::new(4.0, -2.0, 0.0));
        assert_eq!(chunk.sample_position(2, 2, 2), Point3::new(5.0, -1.0, 1.0));
    }
}
