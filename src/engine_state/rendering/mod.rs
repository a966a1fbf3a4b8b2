//! Rendering side of the engine.
//!
//! The engine never talks to a GPU directly. Meshes produced on worker threads travel
//! to the main thread as [`RenderCommand`]s and are kept in [`RenderResources`]; each
//! frame the engine walks those resources and hands [`DrawCall`]s to a
//! [`RenderBackend`]. A windowed backend uploads them to the GPU; the
//! [`HeadlessBackend`] only counts them.

mod backend;
pub mod meshing;
mod resources;
pub mod tasks;
mod vertex;

pub use backend::{DrawCall, FrameStats, HeadlessBackend, RenderBackend};
pub use resources::{RenderCommand, RenderResources};
pub use vertex::{AttributeFormat, Vertex, VertexAttribute};
