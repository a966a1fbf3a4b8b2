//! # Engine State Module
//!
//! The core engine module that manages the state and functionality of the curved
//! voxel engine.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container for the engine
//! * `camera_state` - Camera navigation, curvature and chart transport
//! * `config` - World settings loaded at startup
//! * `geometry` - The curvature kernel and the spherical chart cover
//! * `physics` - The physics collaborator interface and a terrain ray caster
//! * `rendering` - Meshing, render resources and the backend interface
//! * `task_management` - Manages asynchronous tasks and worker threads
//! * `voxels` - Density field, chunks, sculpting and terrain streaming
//!
//! ## Architecture
//!
//! `EngineState` owns every subsystem and is driven from the main thread once per
//! frame: input is translated into a `PlayerAction`, the camera is updated, terrain is
//! streamed around the camera's chunk, finished background tasks are folded into the
//! render resources, and the resources are drawn through a `RenderBackend`.

use cgmath::{Matrix4, Point3, SquareMatrix};
use log::{debug, info};
use web_time::Duration;

use camera_state::{camera::Projection, CameraState, CameraUpdates};
use config::WorldConfig;
use geometry::TerrainGeometry;
use physics::VoxelPhysics;
use rendering::{DrawCall, RenderBackend, RenderResources};
use task_management::TaskManager;
use voxels::{persistence::ChunkStore, sculpt::SculptKind, terrain::Terrain};

use crate::application_state::input_state::{Key, MouseButton, ProcessedInputState};

pub mod camera_state;
pub mod config;
pub mod geometry;
pub mod physics;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// Vertical field of view of the default projection.
pub const FIELD_OF_VIEW: cgmath::Deg<f32> = cgmath::Deg(60.0);

/// Near and far planes in curved units.
pub const Z_NEAR: f32 = 0.01;
pub const Z_FAR: f32 = 100.0;

/// The main state container for the voxel engine
///
/// This struct owns all major subsystems and coordinates their interactions. It
/// handles input processing, task management, terrain streaming and rendering.
///
/// # Examples
///
/// ```no_run
/// use curved_voxel_engine::engine_state::{
///     config::WorldConfig, rendering::HeadlessBackend, voxels::persistence::MemoryChunkStore,
///     EngineState,
/// };
///
/// let mut engine_state = EngineState::new(WorldConfig::default(), Box::new(MemoryChunkStore::new()), 1280, 720);
/// let mut backend = HeadlessBackend::new();
///
/// loop {
///     engine_state.process_input(web_time::Duration::from_millis(16));
///     engine_state.process_tasks();
///     engine_state.render(&mut backend);
/// }
/// ```
pub struct EngineState {
    /// Camera state managing position, orientation, curvature and movement
    pub camera_state: CameraState,
    /// Current player actions derived from input
    pub player_actions: PlayerAction,
    /// Meshes ready to draw, keyed by chunk position
    pub render_resources: RenderResources,
    /// Task manager for asynchronous operations
    pub task_manager: TaskManager,
    /// The loaded terrain and its streaming state
    pub terrain: Terrain,
    /// Ray casts used for sculpting
    pub physics: VoxelPhysics,
    /// Current chunk position of the player
    current_player_chunk_position: Point3<i32>,
    /// Chunks terrain is currently streamed around
    stream_centers: Vec<Point3<i32>>,
}

impl EngineState {
    /// Creates a new engine state with all subsystems initialized and the chunks
    /// around the camera requested.
    ///
    /// # Arguments
    ///
    /// * `config` - World settings
    /// * `store` - Where modified chunks are saved and loaded from
    /// * `width`, `height` - Initial viewport size in pixels
    pub fn new(config: WorldConfig, store: Box<dyn ChunkStore>, width: u32, height: u32) -> Self {
        let projection = Projection::new(width, height, FIELD_OF_VIEW, Z_NEAR, Z_FAR);
        let camera_state = CameraState::new(&config, projection);

        let mut task_manager = TaskManager::new(config.worker_count);
        let terrain = Terrain::new(config, store);
        let physics = VoxelPhysics::new(terrain.clone());

        let current_player_chunk_position = camera_state.chunk_position();
        let stream_centers =
            terrain.stream_centers(camera_state.camera.position, camera_state.chart());
        let requested: usize = stream_centers
            .iter()
            .map(|center| terrain.load_around(*center, &mut task_manager))
            .sum();
        info!("requested {} chunks around {:?}", requested, stream_centers);

        Self {
            camera_state,
            player_actions: PlayerAction::default(),
            render_resources: RenderResources::new(),
            task_manager,
            terrain,
            physics,
            current_player_chunk_position,
            stream_centers,
        }
    }

    /// Chunk the camera was in at the last update.
    pub fn current_chunk_position(&self) -> Point3<i32> {
        self.current_player_chunk_position
    }

    /// Resizes the viewport.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera_state.resize(width, height);
    }

    /// Draws every uploaded chunk mesh.
    ///
    /// Flat meshes are in world units and are scaled into curved units by the model
    /// transform; spherical meshes are already points on the unit sphere.
    pub fn render(&self, backend: &mut dyn RenderBackend) {
        backend.begin_frame(&self.camera_state.camera_uniform);

        let curve = self.camera_state.curve();
        let (transform, embedded) = match self.terrain.generator().geometry() {
            TerrainGeometry::Standard => (
                Matrix4::from_scale(1.0 / self.terrain.config().world_radius),
                false,
            ),
            TerrainGeometry::Spherical(_) => (Matrix4::identity(), true),
        };

        for (position, mesh) in self.render_resources.meshes() {
            backend.draw(&DrawCall {
                position,
                vertices: mesh.as_slice(),
                transform,
                curve,
                embedded,
            });
        }

        backend.end_frame();
    }

    /// Processes completed and queued tasks
    ///
    /// This method should be called each frame so finished chunks and meshes reach
    /// the render resources and queued work reaches free workers.
    pub fn process_tasks(&mut self) {
        self.task_manager
            .process_completed_tasks(&mut self.render_resources);
        self.task_manager.process_queued_tasks();
    }

    /// Processes input and updates the camera and world state
    ///
    /// # Arguments
    ///
    /// * `wait_duration` - The time elapsed since the last frame
    pub fn process_input(&mut self, wait_duration: Duration) {
        self.camera_state.intake_actions(&self.player_actions);

        if let Some(CameraUpdates {
            new_chunk_position,
            chart_changed,
        }) = self.camera_state.update(wait_duration)
        {
            let stream_centers = self
                .terrain
                .stream_centers(self.camera_state.camera.position, self.camera_state.chart());
            if chart_changed
                || self.current_player_chunk_position != new_chunk_position
                || self.stream_centers != stream_centers
            {
                self.stream_terrain(new_chunk_position, stream_centers);
            }
        }

        let sculpt = match (self.player_actions.mine, self.player_actions.build) {
            (true, false) => Some(SculptKind::Mine),
            (false, true) => Some(SculptKind::Build),
            _ => None,
        };
        if let Some(kind) = sculpt {
            let camera = &self.camera_state.camera;
            self.terrain.sculpt_from_ray(
                &self.physics,
                camera.position,
                camera.front(),
                kind,
                wait_duration.as_secs_f32(),
                &mut self.task_manager,
            );
        }

        if self.player_actions.log_status {
            self.terrain.log_status();
            info!(
                "camera at {:?} in {:?} chart, curve {:.2}, {} meshes resident",
                self.camera_state.camera.position,
                self.camera_state.chart(),
                self.camera_state.curve(),
                self.render_resources.len()
            );
        }

        // Discrete actions fire once.
        self.player_actions.clear_one_shots();
    }

    /// Requests chunks around every stream center and evicts the ones left behind.
    fn stream_terrain(&mut self, new_chunk_position: Point3<i32>, stream_centers: Vec<Point3<i32>>) {
        let requested: usize = stream_centers
            .iter()
            .map(|center| self.terrain.load_around(*center, &mut self.task_manager))
            .sum();
        for command in self.terrain.evict_outside(&stream_centers) {
            self.render_resources.apply(command);
        }
        debug!(
            "moved to chunk {:?}, requested {} chunks around {:?}",
            new_chunk_position, requested, stream_centers
        );
        self.current_player_chunk_position = new_chunk_position;
        self.stream_centers = stream_centers;
    }

    /// Sets the input commands for the engine state.
    pub fn set_input_commands(&mut self, input: ProcessedInputState) {
        self.player_actions = Self::translate_processed_input(&input);
    }

    /// Translates the processed input state into player actions.
    fn translate_processed_input(input: &ProcessedInputState) -> PlayerAction {
        let mut player_action = PlayerAction::default();

        // Movement actions - active if key is pressed or held
        player_action.move_forward = input.get_key_state(Key::W).is_active();
        player_action.move_backward = input.get_key_state(Key::S).is_active();
        player_action.move_left = input.get_key_state(Key::A).is_active();
        player_action.move_right = input.get_key_state(Key::D).is_active();
        player_action.move_up = input.get_key_state(Key::Space).is_active();
        player_action.move_down = input.get_key_state(Key::ShiftLeft).is_active();

        player_action.cursor_position = input.get_cursor_position();
        player_action.reset_mouse = input.focus_regained;

        player_action.increase_curve = input.get_key_state(Key::Equal).is_active();
        player_action.decrease_curve = input.get_key_state(Key::Minus).is_active();

        // Sculpting continues while the button is held
        player_action.mine = input.get_mouse_button_state(MouseButton::Left).is_active();
        player_action.build = input.get_mouse_button_state(MouseButton::Right).is_active();

        // Only trigger on press, not hold
        player_action.toggle_person_mode = input.get_key_state(Key::P).is_just_pressed();
        player_action.log_status = input.get_key_state(Key::F3).is_just_pressed();
        player_action.set_curve = [(Key::Digit1, -1.0), (Key::Digit2, 0.0), (Key::Digit3, 1.0)]
            .into_iter()
            .find(|(key, _)| input.get_key_state(*key).is_just_pressed())
            .map(|(_, curve)| curve);

        player_action
    }
}

/// Represents player actions derived from input
///
/// Continuous actions are true for as long as their key or button is down. One-shot
/// actions are true only on the tick their key was pressed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerAction {
    /// Movement actions - true if key is pressed or held
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,

    /// Latest cursor position, if the cursor moved
    pub cursor_position: Option<(f64, f64)>,

    /// Continuous curvature change
    pub increase_curve: bool,
    pub decrease_curve: bool,

    /// Sculpting where the camera looks
    pub mine: bool,
    pub build: bool,

    /// One-shot actions
    pub set_curve: Option<f32>,
    pub toggle_person_mode: bool,
    pub reset_mouse: bool,
    pub log_status: bool,
}

impl PlayerAction {
    fn clear_one_shots(&mut self) {
        self.cursor_position = None;
        self.set_curve = None;
        self.toggle_person_mode = false;
        self.reset_mouse = false;
        self.log_status = false;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        application_state::input_state::RawInputState,
        engine_state::{
            config::NoiseSettings, rendering::HeadlessBackend,
            voxels::persistence::MemoryChunkStore,
        },
    };

    fn small_world() -> WorldConfig {
        WorldConfig {
            chunk_size: 8,
            render_distance: 1,
            worker_count: 2,
            noise: NoiseSettings {
                amplitude: 1.0,
                cave_strength: 0.0,
                ..NoiseSettings::default()
            },
            ..WorldConfig::default()
        }
    }

    fn engine() -> EngineState {
        EngineState::new(small_world(), Box::new(MemoryChunkStore::new()), 800, 600)
    }

    fn settle(engine: &mut EngineState) {
        assert!(engine
            .task_manager
            .run_until_idle(&mut engine.render_resources, Duration::from_secs(30)));
    }

    fn input(keys: &[(Key, RawInputState)], buttons: &[(MouseButton, RawInputState)]) -> ProcessedInputState {
        ProcessedInputState {
            keyboard_states: keys.iter().copied().collect::<HashMap<_, _>>(),
            mouse_button_states: buttons.iter().copied().collect::<HashMap<_, _>>(),
            cursor_position: None,
            focus_regained: false,
        }
    }

    #[test]
    fn startup_streams_and_draws_the_surface() {
        let mut engine = engine();
        settle(&mut engine);

        assert_eq!(engine.terrain.world().get().len(), 27);
        assert!(!engine.render_resources.is_empty());

        let mut backend = HeadlessBackend::new();
        engine.render(&mut backend);
        let frame = backend.last_frame();
        assert_eq!(frame.frames, 1);
        assert_eq!(frame.draw_calls, engine.render_resources.len() as u64);
        assert_eq!(frame.vertices, engine.render_resources.vertex_count() as u64);
    }

    #[test]
    fn input_translates_into_actions() {
        let state = input(
            &[
                (Key::W, RawInputState::Held),
                (Key::P, RawInputState::Pressed),
                (Key::Digit3, RawInputState::Pressed),
                (Key::F3, RawInputState::Held),
            ],
            &[(MouseButton::Left, RawInputState::Pressed)],
        );
        let actions = EngineState::translate_processed_input(&state);

        assert!(actions.move_forward);
        assert!(!actions.move_backward);
        assert!(actions.toggle_person_mode);
        assert_eq!(actions.set_curve, Some(1.0));
        assert!(!actions.log_status);
        assert!(actions.mine);
        assert!(!actions.build);
    }

    #[test]
    fn one_shot_actions_fire_once() {
        let mut engine = engine();
        engine.set_input_commands(input(&[(Key::Digit1, RawInputState::Pressed)], &[]));

        engine.process_input(Duration::from_millis(16));
        assert_eq!(engine.camera_state.curve(), -1.0);
        assert_eq!(engine.player_actions.set_curve, None);
    }

    #[test]
    fn walking_into_a_new_chunk_streams_terrain() {
        let mut engine = engine();
        settle(&mut engine);
        let start = engine.current_chunk_position();

        engine.set_input_commands(input(&[(Key::W, RawInputState::Held)], &[]));
        // 8 units/s facing -z for 1.5 s moves from z = 0 to z = -12, inside chunk -2
        engine.process_input(Duration::from_millis(1500));

        let now = engine.current_chunk_position();
        assert_eq!(now.z, start.z - 2);
        assert!(!engine.terrain.pending_generation().is_empty());

        settle(&mut engine);
        let world = engine.terrain.world().get();
        assert!(world.contains(Point3::new(now.x, now.y, now.z - 1)));
        assert!(!world.contains(Point3::new(start.x, start.y, start.z + 1)));
    }

    #[test]
    fn walking_up_to_the_seam_streams_the_far_side() {
        let config = WorldConfig {
            geometry: config::GeometryKind::Spherical,
            ..small_world()
        };
        let mut engine = EngineState::new(config, Box::new(MemoryChunkStore::new()), 800, 600);
        assert_eq!(engine.stream_centers.len(), 1);

        // Face +x and step to 2 units inside the cutoff of pi/2 * 64.
        engine.camera_state.camera.set_orientation(cgmath::Deg(0.0), cgmath::Deg(0.0));
        engine.camera_state.camera.position.x = 98.0;
        engine.set_input_commands(input(&[(Key::W, RawInputState::Held)], &[]));
        engine.process_input(Duration::from_millis(16));

        assert_eq!(engine.camera_state.chart(), geometry::Chart::Primary);
        assert_eq!(engine.stream_centers.len(), 2);
        let across = engine.stream_centers[1];
        assert_eq!(
            engine.terrain.generator().chart_for_chunk(across),
            geometry::Chart::Secondary
        );
        assert!(engine.terrain.pending_generation().contains(&across));
    }

    #[test]
    fn spherical_worlds_draw_embedded_meshes() {
        let config = WorldConfig {
            geometry: config::GeometryKind::Spherical,
            ..small_world()
        };
        let mut engine = EngineState::new(config, Box::new(MemoryChunkStore::new()), 800, 600);
        settle(&mut engine);
        assert!(!engine.render_resources.is_empty());

        struct Recorder(Vec<bool>);
        impl RenderBackend for Recorder {
            fn begin_frame(&mut self, camera: &camera_state::camera::CameraUniform) {
                assert_eq!(camera.curve, 1.0);
            }
            fn draw(&mut self, call: &DrawCall) {
                self.0.push(call.embedded);
            }
            fn end_frame(&mut self) {}
        }

        let mut recorder = Recorder(Vec::new());
        engine.render(&mut recorder);
        assert!(!recorder.0.is_empty());
        assert!(recorder.0.iter().all(|&embedded| embedded));
    }
}
