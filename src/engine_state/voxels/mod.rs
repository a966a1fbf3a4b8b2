//! # Voxel Terrain
//!
//! This module contains the terrain side of the engine: the density field, the chunks
//! that sample it, and the machinery that streams and sculpts them.
//!
//! ## Architecture
//!
//! * **Voxel**: A density value plus a material; negative density is solid
//! * **Chunk**: A padded lattice of voxels, its current mesh and its dirty flags
//! * **Generator**: Samples the seeded Perlin field, flat or wrapped onto the sphere
//! * **Sculpt**: Brush edits and the per-chunk queues they wait in
//! * **World**: The arena that owns every loaded chunk, keyed by chunk position
//! * **Terrain**: Coordinates generation, eviction, persistence and sculpting
//! * **Tasks**: Background chunk generation
//!
//! ## Data Flow
//!
//! 1. The camera enters a new chunk and `Terrain::load_around` requests chunks
//! 2. Workers load each chunk from the store or generate it
//! 3. New chunks and sculpted chunks are remeshed on workers
//! 4. Meshes are uploaded to `RenderResources` on the main thread
//!
//! ## Thread Safety
//!
//! * Every chunk sits behind its own lock, so work on different chunks runs in parallel
//! * Mutation and meshing of one chunk happen under that chunk's write lock
//! * Concurrent sets coalesce requests so each chunk has at most one task of a kind queued

pub mod chunk;
pub mod generator;
pub mod perlin_noise;
pub mod persistence;
pub mod sculpt;
pub mod tasks;
pub mod terrain;
pub mod voxel;
pub mod world;
