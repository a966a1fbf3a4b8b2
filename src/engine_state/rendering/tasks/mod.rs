//! Background tasks for the rendering system.
//!
//! # Available Tasks
//! - `ChunkMeshTask`: Applies queued sculpt edits to a chunk and remeshes it

pub mod chunk_mesh_task;
