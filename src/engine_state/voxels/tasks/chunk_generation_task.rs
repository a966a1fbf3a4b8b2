//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which loads or generates one chunk
//! on a worker thread. It is scheduled by `Terrain::request_chunk` as the camera moves
//! through the world.

use cgmath::Point3;
use log::debug;

use crate::engine_state::{
    rendering::{tasks::chunk_mesh_task::ChunkMeshTask, RenderCommand},
    task_management::task::{Task, TaskResult},
    voxels::{chunk::Chunk, terrain::Terrain},
};

/// A task that produces the chunk at one position.
///
/// This task is responsible for:
/// 1. Loading the chunk from the store, or generating it
/// 2. Adding the chunk to the world, unless it was evicted meanwhile
/// 3. Scheduling its first mesh
pub struct ChunkGenerationTask {
    terrain: Terrain,
    /// The position of the chunk to generate (in chunk coordinates)
    position: Point3<i32>,
}

impl ChunkGenerationTask {
    pub fn new(terrain: Terrain, position: Point3<i32>) -> Self {
        ChunkGenerationTask { terrain, position }
    }
}

impl Task for ChunkGenerationTask {
    /// Skips the work entirely if the request was cancelled before this worker got to it.
    fn process(&self) -> Box<dyn TaskResult> {
        let chunk = if self.terrain.pending_generation().contains(&self.position) {
            Some(self.terrain.load_or_generate(self.position))
        } else {
            debug!("generation of chunk {:?} cancelled before it started", self.position);
            None
        };

        Box::new(ChunkGenerationTaskResult {
            terrain: self.terrain.clone(),
            position: self.position,
            chunk,
        })
    }
}

/// The chunk produced by a `ChunkGenerationTask`, if it was still wanted.
pub struct ChunkGenerationTaskResult {
    terrain: Terrain,
    position: Point3<i32>,
    chunk: Option<Chunk>,
}

impl TaskResult for ChunkGenerationTaskResult {
    /// Inserts the chunk and schedules its mesh.
    ///
    /// The chunk is only inserted if its position is still pending; otherwise it was
    /// evicted while the worker ran and is dropped here.
    fn handle_result(self: Box<Self>) -> (Vec<Box<dyn Task>>, Vec<RenderCommand>) {
        let Some(chunk) = self.chunk else {
            return (Vec::new(), Vec::new());
        };

        if !self.terrain.pending_generation().remove(&self.position) {
            debug!("discarding chunk {:?}: evicted while generating", self.position);
            return (Vec::new(), Vec::new());
        }

        self.terrain.world().get_mut().insert(chunk);

        let mut tasks: Vec<Box<dyn Task>> = Vec::new();
        if self.terrain.remesh_queued().add(self.position) {
            tasks.push(Box::new(ChunkMeshTask::new(self.terrain.clone(), self.position)));
        }
        (tasks, Vec::new())
    }
}
