//! # World Module
//!
//! This module provides the `World` struct, the arena of loaded chunks keyed by chunk
//! coordinates.
//!
//! ## Architecture
//!
//! The world is sparse: only chunks near the camera are kept in memory. Each chunk sits
//! behind its own [`MtResource`], so a worker remeshing one chunk never blocks access to
//! any other. The world map itself is locked only long enough to insert, look up or
//! remove a handle.
//!
//! ## Identity
//!
//! A chunk handle stays valid after the chunk is evicted, but it is no longer the handle
//! the world stores. Background results compare handles with [`MtResource::ptr_eq`]
//! before touching render state, so work finished for an evicted chunk is dropped.

use std::collections::HashMap;

use cgmath::{Point3, Vector3};

use crate::core::MtResource;
use crate::engine_state::voxels::chunk::Chunk;

/// The loaded chunks of a voxel world.
#[derive(Default)]
pub struct World {
    chunks: HashMap<Point3<i32>, MtResource<Chunk>>,
}

impl World {
    pub fn new() -> Self {
        Self {
            chunks: HashMap::new(),
        }
    }

    /// Stores `chunk` under its own position.
    ///
    /// # Returns
    /// The shared handle now held by the world. A chunk already at that position is
    /// replaced.
    pub fn insert(&mut self, chunk: Chunk) -> MtResource<Chunk> {
        let position = chunk.position;
        let handle = MtResource::new(chunk);
        self.chunks.insert(position, handle.clone());
        handle
    }

    pub fn get(&self, position: Point3<i32>) -> Option<MtResource<Chunk>> {
        self.chunks.get(&position).cloned()
    }

    pub fn remove(&mut self, position: Point3<i32>) -> Option<MtResource<Chunk>> {
        self.chunks.remove(&position)
    }

    pub fn contains(&self, position: Point3<i32>) -> bool {
        self.chunks.contains_key(&position)
    }

    /// Positions of every loaded chunk, in no particular order.
    pub fn positions(&self) -> Vec<Point3<i32>> {
        self.chunks.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk coordinates of the chunk whose cell contains `point`.
    ///
    /// # Arguments
    /// * `point` - World-space point
    /// * `chunk_extent` - World-space edge length of one chunk
    pub fn chunk_position_containing(point: Point3<f32>, chunk_extent: f32) -> Point3<i32> {
        Point3::new(
            (point.x / chunk_extent).floor() as i32,
            (point.y / chunk_extent).floor() as i32,
            (point.z / chunk_extent).floor() as i32,
        )
    }

    /// Every chunk position within `distance` chunks of `center` along each axis,
    /// nearest first.
    pub fn positions_around(center: Point3<i32>, distance: i32) -> Vec<Point3<i32>> {
        let mut positions = Vec::new();
        for x in -distance..=distance {
            for y in -distance..=distance {
                for z in -distance..=distance {
                    positions.push(center + Vector3::new(x, y, z));
                }
            }
        }
        positions.sort_by_key(|position| {
            let offset = position - center;
            offset.x * offset.x + offset.y * offset.y + offset.z * offset.z
        });
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::{chunk::VoxelLattice, voxel::Voxel};

    fn chunk_at(position: Point3<i32>) -> Chunk {
        Chunk::new(position, VoxelLattice::for_chunk(2, 1, Voxel::air()), 2, 1.0)
    }

    #[test]
    fn insert_replaces_and_returns_the_stored_handle() {
        let mut world = World::new();
        let position = Point3::new(1, 2, 3);
        let first = world.insert(chunk_at(position));
        let second = world.insert(chunk_at(position));

        assert_eq!(world.len(), 1);
        let stored = world.get(position).unwrap();
        assert!(stored.ptr_eq(&second));
        assert!(!stored.ptr_eq(&first));
    }

    #[test]
    fn remove_leaves_old_handles_detached() {
        let mut world = World::new();
        let position = Point3::new(0, 0, 0);
        let handle = world.insert(chunk_at(position));
        let removed = world.remove(position).unwrap();

        assert!(removed.ptr_eq(&handle));
        assert!(!world.contains(position));
        assert!(world.is_empty());
    }

    #[test]
    fn containing_chunk_floors_negative_coordinates() {
        assert_eq!(
            World::chunk_position_containing(Point3::new(-0.5, 15.9, 16.0), 16.0),
            Point3::new(-1, 0, 1)
        );
    }

    #[test]
    fn positions_around_are_nearest_first() {
        let center = Point3::new(4, 0, -2);
        let positions = World::positions_around(center, 1);
        assert_eq!(positions.len(), 27);
        assert_eq!(positions[0], center);
        assert!(positions.contains(&Point3::new(5, 1, -3)));
    }
}
