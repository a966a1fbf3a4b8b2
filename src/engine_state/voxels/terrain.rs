//! # Terrain
//!
//! [`Terrain`] coordinates everything that happens to chunks: streaming them in around
//! the camera, evicting them, sculpting them and keeping their meshes current.
//!
//! ## Coalescing
//! Two [`ConcurrentSet`]s keep background work from piling up:
//! - `pending_generation` holds every position with a generation task in flight.
//!   Evicting a position removes it, which cancels the task: the worker skips the
//!   work if it has not started, and the result is dropped if it has.
//! - `remesh_queued` holds every position with a remesh task waiting to run. Any
//!   number of sculpt strokes against a chunk before its task starts produce a
//!   single remesh.
//!
//! ## Edit ordering
//! Strokes are appended to the chunk's FIFO in [`EditQueues`]. The remesh task
//! removes the chunk from `remesh_queued` before it locks the chunk and drains the
//! queue, so a stroke queued after the drain always finds the key absent and
//! schedules another remesh.
//!
//! Clones share all state; tasks carry a clone.

use std::sync::Arc;

use cgmath::{InnerSpace, Point3, Vector3};
use log::{debug, info, warn};

use crate::{
    core::{ConcurrentSet, MtResource},
    engine_state::{
        config::WorldConfig,
        geometry::Chart,
        physics::PhysicsWorld,
        rendering::{meshing::MeshGenerator, tasks::chunk_mesh_task::ChunkMeshTask, RenderCommand},
        task_management::TaskManager,
    },
};

use super::{
    chunk::{distance_to_bounds, Chunk},
    generator::TerrainGenerator,
    persistence::{decode_chunk, encode_chunk, ChunkStore},
    sculpt::{EditQueues, SculptEdit, SculptKind},
    tasks::chunk_generation_task::ChunkGenerationTask,
    world::World,
};

/// Chunks are evicted once they are this many chunks beyond the render distance.
const EVICTION_MARGIN: i32 = 1;

/// Shared handle to a world's terrain.
#[derive(Clone)]
pub struct Terrain {
    config: Arc<WorldConfig>,
    generator: Arc<TerrainGenerator>,
    mesher: MeshGenerator,
    world: MtResource<World>,
    pending_generation: ConcurrentSet<Point3<i32>>,
    remesh_queued: ConcurrentSet<Point3<i32>>,
    edits: EditQueues,
    store: MtResource<Box<dyn ChunkStore>>,
}

impl Terrain {
    pub fn new(config: WorldConfig, store: Box<dyn ChunkStore>) -> Self {
        let generator = TerrainGenerator::new(&config);
        let mesher = MeshGenerator::new(*generator.geometry());
        Self {
            config: Arc::new(config),
            generator: Arc::new(generator),
            mesher,
            world: MtResource::new(World::new()),
            pending_generation: ConcurrentSet::new(),
            remesh_queued: ConcurrentSet::new(),
            edits: EditQueues::new(),
            store: MtResource::new(store),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    pub fn mesher(&self) -> &MeshGenerator {
        &self.mesher
    }

    pub fn world(&self) -> &MtResource<World> {
        &self.world
    }

    pub fn pending_generation(&self) -> &ConcurrentSet<Point3<i32>> {
        &self.pending_generation
    }

    pub fn remesh_queued(&self) -> &ConcurrentSet<Point3<i32>> {
        &self.remesh_queued
    }

    pub fn edits(&self) -> &EditQueues {
        &self.edits
    }

    pub fn store(&self) -> &MtResource<Box<dyn ChunkStore>> {
        &self.store
    }

    /// Chunk coordinates of the chunk containing a world point.
    pub fn chunk_position_containing(&self, point: Point3<f32>) -> Point3<i32> {
        World::chunk_position_containing(point, self.config.chunk_extent())
    }

    /// World-space bounds of the lattice the chunk at `position` samples.
    pub fn chunk_bounds(&self, position: Point3<i32>) -> (Point3<f32>, Point3<f32>) {
        let origin = Chunk::origin_of(position, self.config.chunk_size, self.config.scale);
        let extent = self.config.lattice_dimension() as f32 * self.config.scale;
        (origin, origin + Vector3::new(extent, extent, extent))
    }

    /// Schedules generation of the chunk at `position` unless it is loaded or already
    /// being generated.
    ///
    /// # Returns
    /// `true` if a generation task was published.
    pub fn request_chunk(&self, position: Point3<i32>, tasks: &mut TaskManager) -> bool {
        if self.world.get().contains(position) || !self.pending_generation.add(position) {
            return false;
        }
        tasks.publish_task(Box::new(ChunkGenerationTask::new(self.clone(), position)));
        true
    }

    /// Requests every chunk within the render distance of `center`, nearest first.
    ///
    /// # Returns
    /// The number of generation tasks published.
    pub fn load_around(&self, center: Point3<i32>, tasks: &mut TaskManager) -> usize {
        World::positions_around(center, self.config.render_distance as i32)
            .into_iter()
            .filter(|position| self.request_chunk(*position, tasks))
            .count()
    }

    /// Chunks that streaming is centered on for a camera at `point` in `chart`.
    ///
    /// The first entry is the chunk holding `point`. On a spherical world, once the
    /// cutoff is within the render distance, the chunk holding the same spot seen from
    /// the opposite chart follows it, so the land past the seam is loaded as well.
    pub fn stream_centers(&self, point: Point3<f32>, chart: Chart) -> Vec<Point3<i32>> {
        let mut centers = vec![self.chunk_position_containing(point)];
        if let Some(charts) = self.generator.geometry().sphere_charts() {
            let reach = self.config.render_distance as f32 * self.config.chunk_extent() / charts.radius();
            if charts.cutoff_radius() - charts.horizontal_distance(point, chart) <= reach {
                let across = self.chunk_position_containing(charts.transport(point, chart));
                if !centers.contains(&across) {
                    centers.push(across);
                }
            }
        }
        centers
    }

    /// Evicts loaded chunks, and cancels pending ones, that have drifted out of range
    /// of every one of `centers`.
    ///
    /// # Returns
    /// Release commands for the meshes of evicted chunks.
    pub fn evict_outside(&self, centers: &[Point3<i32>]) -> Vec<RenderCommand> {
        let limit = self.config.render_distance as i32 + EVICTION_MARGIN;
        let out_of_range = |position: &Point3<i32>| {
            centers.iter().all(|center| {
                let offset = position - center;
                offset.x.abs().max(offset.y.abs()).max(offset.z.abs()) > limit
            })
        };

        let loaded: Vec<Point3<i32>> = self
            .world
            .get()
            .positions()
            .into_iter()
            .filter(|position| out_of_range(position))
            .collect();

        let cancelled = self.pending_generation.retain(|position| !out_of_range(position));
        if cancelled > 0 {
            debug!("cancelled generation of {} out-of-range chunks", cancelled);
        }

        let mut commands = Vec::with_capacity(loaded.len());
        for position in loaded {
            if self.evict(position) {
                commands.push(RenderCommand::ReleaseMesh { position });
            }
        }
        commands
    }

    /// Drops the chunk at `position`, saving it first if it has unsaved edits.
    ///
    /// Also cancels its pending generation and discards edits that were still queued.
    /// A remesh already running finishes against the detached chunk and its result is
    /// ignored.
    ///
    /// # Returns
    /// `true` if a loaded chunk was removed.
    pub fn evict(&self, position: Point3<i32>) -> bool {
        self.pending_generation.remove(&position);
        self.remesh_queued.remove(&position);
        let discarded = self.edits.discard(position);
        if discarded > 0 {
            debug!("dropped {} queued edits for evicted chunk {:?}", discarded, position);
        }

        let Some(chunk) = self.world.get_mut().remove(position) else {
            return false;
        };

        let mut chunk = chunk.get_mut();
        if chunk.modified && !chunk.saved {
            let bytes = encode_chunk(&chunk);
            self.store.get_mut().save(position, bytes);
            chunk.saved = true;
            debug!("saved modified chunk {:?}", position);
        }
        true
    }

    /// Loads the chunk at `position` from the store, or generates it.
    ///
    /// Stored data that fails to decode is logged and replaced by fresh terrain.
    pub fn load_or_generate(&self, position: Point3<i32>) -> Chunk {
        let stored = self.store.get().load(position);
        if let Some(bytes) = stored {
            match decode_chunk(&bytes, &self.config) {
                Ok(mut chunk) => {
                    chunk.modified = true;
                    chunk.saved = true;
                    return chunk;
                }
                Err(err) => warn!("regenerating chunk {:?}: {:#}", position, err),
            }
        }
        self.generator.generate(position)
    }

    /// Schedules a remesh of the chunk at `position` unless one is already waiting.
    ///
    /// # Returns
    /// `true` if a task was published.
    pub fn request_remesh(&self, position: Point3<i32>, tasks: &mut TaskManager) -> bool {
        if !self.remesh_queued.add(position) {
            return false;
        }
        tasks.publish_task(Box::new(ChunkMeshTask::new(self.clone(), position)));
        true
    }

    /// Queues `edit` for every loaded chunk the brush reaches.
    ///
    /// # Returns
    /// The number of chunks the edit was queued for.
    pub fn sculpt(&self, edit: SculptEdit, tasks: &mut TaskManager) -> usize {
        if edit.radius <= 0.0 {
            return 0;
        }

        let reach = Vector3::new(edit.radius, edit.radius, edit.radius);
        let low = self.chunk_position_containing(edit.location - reach);
        let high = self.chunk_position_containing(edit.location + reach);

        let mut touched = Vec::new();
        {
            let world = self.world.get();
            // The apron reaches into the previous chunk along each axis.
            for x in low.x - 1..=high.x {
                for y in low.y - 1..=high.y {
                    for z in low.z - 1..=high.z {
                        let position = Point3::new(x, y, z);
                        if !world.contains(position) {
                            continue;
                        }
                        let (min, max) = self.chunk_bounds(position);
                        if distance_to_bounds(edit.location, min, max) < edit.radius {
                            touched.push(position);
                        }
                    }
                }
            }
        }

        for position in &touched {
            self.edits.push(*position, edit);
            self.request_remesh(*position, tasks);
        }
        touched.len()
    }

    /// Sculpts where a ray from `origin` along `direction` first hits terrain.
    ///
    /// The brush weight, radius and reach come from the world's brush settings.
    ///
    /// # Returns
    /// The brush center, or `None` if nothing was hit within reach.
    pub fn sculpt_from_ray(
        &self,
        physics: &dyn PhysicsWorld,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        kind: SculptKind,
        dt: f32,
        tasks: &mut TaskManager,
    ) -> Option<Point3<f32>> {
        if direction.magnitude2() == 0.0 {
            return None;
        }
        let direction = direction.normalize();
        let brush = self.config.brush;

        let hit = physics.ray_cast(origin, direction, brush.reach)?;
        if !hit.collidable {
            return None;
        }

        let location = origin + direction * hit.distance;
        let edit = SculptEdit {
            kind,
            location,
            dt,
            weight: brush.weight,
            radius: brush.radius,
        };
        let touched = self.sculpt(edit, tasks);
        debug!("{:?} at {:?} touched {} chunks", kind, location, touched);
        Some(location)
    }

    /// Logs a one-line summary of loaded and in-flight chunks.
    pub fn log_status(&self) {
        info!(
            "terrain: {} chunks loaded, {} generating, {} awaiting remesh",
            self.world.get().len(),
            self.pending_generation.len(),
            self.remesh_queued.len()
        );
    }
}
