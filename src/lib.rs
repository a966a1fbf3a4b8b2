#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Curved Voxel Engine
//!
//! A voxel terrain engine for spaces of constant, adjustable curvature: flat,
//! spherical and hyperbolic.
//!
//! Terrain is a seeded Perlin density field sampled into chunk lattices, meshed with
//! marching cubes and sculpted incrementally. Flat worlds are bent by the camera's view
//! matrix; spherical worlds are wrapped onto the unit sphere through two charts.
//!
//! ## Key Modules
//!
//! * `application_state` - Input events, per-tick input snapshots and the frame loop
//! * `core` - Concurrency primitives shared throughout the engine
//! * `engine_state` - Geometry, camera, terrain, meshing, tasks and rendering
//!
//! ## Architecture
//!
//! The engine keeps a clear separation between:
//! * Input sources, which only send `InputEvent`s over a channel
//! * The main thread, which owns the camera, the render resources and the task queue
//! * Worker threads, which generate, sculpt and mesh chunks
//! * Render backends, which receive finished meshes as draw calls
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     curved_voxel_engine::run();
//! }
//! ```

use std::{
    io::{self, BufRead},
    sync::mpsc,
    thread,
};

use application_state::{input_state::InputEvent, ApplicationState};
use engine_state::{
    config::WorldConfig, rendering::HeadlessBackend, voxels::persistence::MemoryChunkStore,
    EngineState,
};
use log::{info, warn};
use web_time::Duration;

pub mod application_state;
pub mod core;
pub mod engine_state;

/// Viewport size the headless session starts with.
pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;

/// Target frame duration of the main loop.
pub const FRAME_TIME: Duration = Duration::from_millis(16);

/// Runs a headless session.
///
/// The world config is read from the path in `CURVED_VOXEL_CONFIG` (default
/// `world.json`). Input is read from stdin as one command per line, for example
/// `down w`, `move 640 360`, `press left` or `quit`; the session ends on `quit`,
/// Escape or end of input.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = WorldConfig::load(&WorldConfig::config_path());
    let engine_state = EngineState::new(
        config,
        Box::new(MemoryChunkStore::new()),
        DEFAULT_WIDTH,
        DEFAULT_HEIGHT,
    );

    let (sender, receiver) = mpsc::channel();
    let reader = thread::Builder::new()
        .name("input".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!("failed to read input: {}", err);
                        break;
                    }
                };
                match InputEvent::from_command(&line) {
                    Some(event) => {
                        if sender.send(event).is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => warn!("unrecognised input command: {:?}", line),
                }
            }
        });
    if let Err(err) = reader {
        warn!("failed to start input thread: {}", err);
    }

    let mut state = ApplicationState::new(engine_state, receiver);
    let mut backend = HeadlessBackend::new();
    state.run(&mut backend, FRAME_TIME);

    let stats = backend.stats();
    info!(
        "session ended after {} frames, {} draw calls, {} vertices",
        stats.frames, stats.draw_calls, stats.vertices
    );
}
