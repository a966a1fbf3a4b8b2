//! Task for applying queued edits to a chunk and rebuilding its mesh on a worker thread.

use std::sync::Arc;

use cgmath::Point3;
use log::debug;

use crate::{
    core::MtResource,
    engine_state::{
        rendering::RenderCommand,
        task_management::task::{Task, TaskResult},
        voxels::{chunk::Chunk, terrain::Terrain},
    },
};

/// Applies a chunk's pending edits and remeshes it.
///
/// This task is responsible for:
/// 1. Clearing the chunk's `remesh_queued` flag, so later strokes schedule a new task
/// 2. Draining and applying the chunk's edit queue under its write lock
/// 3. Meshing the chunk under that same lock
pub struct ChunkMeshTask {
    terrain: Terrain,
    position: Point3<i32>,
}

impl ChunkMeshTask {
    pub fn new(terrain: Terrain, position: Point3<i32>) -> Self {
        ChunkMeshTask { terrain, position }
    }
}

impl Task for ChunkMeshTask {
    fn process(&self) -> Box<dyn TaskResult> {
        let terrain = &self.terrain;
        terrain.remesh_queued().remove(&self.position);

        let Some(chunk) = terrain.world().get().get(self.position) else {
            debug!("chunk {:?} evicted before remesh", self.position);
            return Box::new(ChunkMeshTaskResult {
                terrain: terrain.clone(),
                position: self.position,
                chunk: None,
            });
        };

        {
            let mut guard = chunk.get_mut();
            for edit in terrain.edits().drain(self.position) {
                edit.apply(&mut guard);
            }
            let chart = terrain.generator().chart_for_chunk(self.position);
            let mesh = terrain.mesher().generate(&guard, chart);
            guard.set_mesh(Arc::new(mesh));
        }

        Box::new(ChunkMeshTaskResult {
            terrain: terrain.clone(),
            position: self.position,
            chunk: Some(chunk),
        })
    }
}

/// A remeshed chunk, ready to upload.
pub struct ChunkMeshTaskResult {
    terrain: Terrain,
    position: Point3<i32>,
    chunk: Option<MtResource<Chunk>>,
}

impl TaskResult for ChunkMeshTaskResult {
    /// Uploads the chunk's current mesh if the chunk is still the one the world holds.
    ///
    /// The mesh is read from the chunk rather than carried in the result, so results
    /// arriving out of order never replace a newer mesh with an older one. If another
    /// remesh holds the chunk right now, its own result does the upload.
    fn handle_result(self: Box<Self>) -> (Vec<Box<dyn Task>>, Vec<RenderCommand>) {
        let Some(chunk) = self.chunk else {
            return (Vec::new(), Vec::new());
        };

        let current = self
            .terrain
            .world()
            .get()
            .get(self.position)
            .is_some_and(|stored| stored.ptr_eq(&chunk));
        if !current {
            debug!("dropping mesh for evicted chunk {:?}", self.position);
            return (Vec::new(), Vec::new());
        }

        let Some(guard) = chunk.try_get() else {
            return (Vec::new(), Vec::new());
        };
        let upload = RenderCommand::UploadMesh {
            position: self.position,
            vertices: guard.mesh(),
        };
        (Vec::new(), vec![upload])
    }
}
