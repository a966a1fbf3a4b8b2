//! # Voxel Task System
//!
//! Background tasks that produce chunks. Meshing tasks live with the renderer in
//! `rendering::tasks`.

pub mod chunk_generation_task;
