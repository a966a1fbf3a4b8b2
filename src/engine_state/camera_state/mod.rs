//! # Camera State Management
//!
//! This module handles all camera-related functionality including:
//! - Camera position and orientation tracking
//! - View and projection matrix calculations for the current curvature
//! - Player input processing for camera control
//! - Chart transport on spherical worlds
//! - Chunk-based position tracking for terrain streaming
//!
//! ## Core Components
//! - `Camera`: Represents the camera's position and orientation in 3D space
//! - `CameraController`: Handles player input and updates camera state
//! - `Projection`: Manages the camera's projection matrix
//! - `CameraUniform`: Camera data for the render backend
//!
//! ## Units
//! The camera moves in world units. Before it is embedded into the curved model its
//! position is divided by the world radius; spherical worlds additionally measure it
//! from the center of the chart the camera is currently in.

use cgmath::{Deg, EuclideanSpace, Matrix4, Point3, SquareMatrix, Vector4};
use log::debug;

use crate::engine_state::{
    config::WorldConfig,
    geometry::{euc_to_curved3, view_matrix, Chart, TerrainGeometry, SPHERE_CURVE},
    voxels::world::World,
    PlayerAction,
};

pub mod camera;

use camera::{Camera, CameraController, CameraUniform, Projection};

/// Walking speed in world units per second.
pub const CAMERA_SPEED: f32 = 8.0;

/// Curvature change per second while a curvature key is held.
pub const CURVE_RATE: f32 = 0.5;

/// Height above the base terrain height the camera starts at.
const START_HEIGHT: f32 = 4.0;

/// Manages the complete camera system including state, controls and uniform data.
///
/// # Fields
/// - `camera`: The current camera state (position, orientation, curvature)
/// - `projection`: Perspective settings
/// - `camera_uniform`: Camera data for shaders, refreshed on every change
/// - `camera_controller`: Handles player input and camera movement
pub struct CameraState {
    pub camera: Camera,
    pub projection: Projection,
    pub camera_uniform: CameraUniform,
    pub camera_controller: CameraController,
    geometry: TerrainGeometry,
    chart: Chart,
    world_radius: f32,
    chunk_extent: f32,
    /// Set by discrete actions that change the view without moving the controller.
    dirty: bool,
}

impl CameraState {
    /// Creates the camera above the origin of the world, or above the primary chart
    /// center on a spherical world.
    ///
    /// Spherical worlds always render with curvature 1; flat worlds start with the
    /// configured curvature.
    pub fn new(config: &WorldConfig, projection: Projection) -> Self {
        let geometry = config.terrain_geometry();
        let height = (config.noise.base_height + config.noise.amplitude) as f32 + START_HEIGHT;

        let (position, curve) = match &geometry {
            TerrainGeometry::Standard => (Point3::new(0.0, height, 0.0), config.curve),
            TerrainGeometry::Spherical(charts) => {
                let center = charts.center(Chart::Primary);
                (Point3::new(center.x, height, center.z), SPHERE_CURVE)
            }
        };

        let camera = Camera::new(position, Deg(-90.0), Deg(0.0), curve);
        let mut camera_state = CameraState {
            camera,
            projection,
            camera_uniform: CameraUniform::new(),
            camera_controller: CameraController::new(CAMERA_SPEED, CURVE_RATE),
            geometry,
            chart: Chart::Primary,
            world_radius: config.world_radius,
            chunk_extent: config.chunk_extent(),
            dirty: false,
        };
        camera_state.refresh_uniform();
        camera_state
    }

    /// Chart the camera is expressed in. Always `Primary` on flat worlds.
    pub fn chart(&self) -> Chart {
        self.chart
    }

    pub fn curve(&self) -> f32 {
        self.camera.curve()
    }

    /// The chunk containing the camera.
    pub fn chunk_position(&self) -> Point3<i32> {
        World::chunk_position_containing(self.camera.position, self.chunk_extent)
    }

    /// Processes player input actions.
    ///
    /// Movement, mouse look and continuous curvature changes are accumulated in the
    /// controller. Person mode, mouse re-arming and direct curvature selection apply
    /// immediately.
    pub fn intake_actions(&mut self, actions: &PlayerAction) {
        self.camera_controller.intake_actions(actions);

        if actions.toggle_person_mode {
            self.camera.toggle_person_mode();
            self.dirty = true;
        }
        if actions.reset_mouse {
            self.camera.reset_mouse();
        }
        if let Some(curve) = actions.set_curve {
            self.camera.set_curve(curve);
            self.dirty = true;
        }
    }

    /// Updates the camera state based on elapsed time.
    ///
    /// This method should be called every frame to:
    /// 1. Process any pending camera movements
    /// 2. Carry the camera into the other chart once it crosses the cutoff
    /// 3. Update the uniform data
    ///
    /// # Returns
    /// - `Some(CameraUpdates)` if the camera moved, turned or changed curvature
    /// - `None` if no updates were needed
    pub fn update(&mut self, dt: web_time::Duration) -> Option<CameraUpdates> {
        if !self.camera_controller.has_updates() && !self.dirty {
            return None;
        }
        self.dirty = false;

        self.camera
            .get_controller_updates_and_reset_controller(&mut self.camera_controller, dt);

        let mut chart_changed = false;
        if let TerrainGeometry::Spherical(charts) = &self.geometry {
            self.camera.set_curve(SPHERE_CURVE);

            if charts.needs_transport(self.camera.position, self.chart) {
                let turn = charts.heading_turn(self.camera.position, self.chart);
                let position = charts.transport(self.camera.position, self.chart);
                self.camera.transport(position, turn);
                self.chart = self.chart.opposite();
                chart_changed = true;
                debug!("camera crossed into the {:?} chart at {:?}", self.chart, position);
            }
        }

        self.refresh_uniform();

        Some(CameraUpdates {
            new_chunk_position: self.chunk_position(),
            chart_changed,
        })
    }

    /// Builds the view matrix for the current curvature.
    ///
    /// On spherical worlds the matrix maps the shared frame the terrain is meshed in,
    /// so it undoes the secondary chart's half turn before looking from the eye.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let camera = &self.camera;
        match &self.geometry {
            TerrainGeometry::Standard => view_matrix(
                self.curved_units(camera.position),
                camera.front(),
                camera.up(),
                camera.curve(),
            ),
            TerrainGeometry::Spherical(charts) => {
                let offset = charts.local_offset(camera.position, self.chart) / self.world_radius;
                let view = view_matrix(
                    Point3::from_vec(offset),
                    camera.front(),
                    camera.up(),
                    SPHERE_CURVE,
                );
                view * chart_frame(self.chart)
            }
        }
    }

    /// The eye embedded in the curved model, in the frame terrain is rendered in.
    pub fn eye(&self) -> Vector4<f32> {
        match &self.geometry {
            TerrainGeometry::Standard => euc_to_curved3(
                self.curved_units(self.camera.position).to_vec(),
                self.camera.curve(),
            ),
            TerrainGeometry::Spherical(charts) => charts.to_shared_frame(
                charts.local_offset(self.camera.position, self.chart),
                self.chart,
            ),
        }
    }

    /// Updates the projection's aspect ratio for viewport resizing.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
        self.refresh_uniform();
    }

    /// Recomputes the uniform from the camera and projection.
    pub fn refresh_uniform(&mut self) {
        let curve = self.camera.curve();
        let view = self.view_matrix();
        let projection = self.projection.calc_matrix(curve);
        let eye = self.eye();
        self.camera_uniform.update(view, projection, eye, curve);
    }

    fn curved_units(&self, position: Point3<f32>) -> Point3<f32> {
        position / self.world_radius
    }
}

/// Maps the shared frame into `chart`'s own frame. The x–w half turn is its own inverse.
fn chart_frame(chart: Chart) -> Matrix4<f32> {
    match chart {
        Chart::Primary => Matrix4::identity(),
        Chart::Secondary => Matrix4::from_diagonal(Vector4::new(-1.0, 1.0, 1.0, -1.0)),
    }
}

/// Represents updates to the camera's state that affect game world interaction.
///
/// This is returned by `CameraState::update()` when the camera's position,
/// orientation or curvature has changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraUpdates {
    /// The chunk currently containing the camera
    pub new_chunk_position: Point3<i32>,
    /// Whether the camera switched sphere charts this update
    pub chart_changed: bool,
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use cgmath::{InnerSpace, Matrix4, Vector3};
    use web_time::Duration;

    use super::*;
    use crate::engine_state::config::GeometryKind;

    fn projection() -> Projection {
        Projection::new(800, 600, Deg(60.0), 0.01, 100.0)
    }

    fn spherical_config() -> WorldConfig {
        WorldConfig {
            geometry: GeometryKind::Spherical,
            ..WorldConfig::default()
        }
    }

    #[test]
    fn idle_camera_reports_nothing() {
        let mut state = CameraState::new(&WorldConfig::default(), projection());
        assert!(state.update(Duration::from_millis(16)).is_none());
    }

    #[test]
    fn flat_view_matches_look_to_rh() {
        let state = CameraState::new(&WorldConfig::default(), projection());
        let camera = &state.camera;
        let expected = Matrix4::look_to_rh(
            camera.position / 64.0,
            camera.front(),
            camera.up(),
        );
        let actual = state.view_matrix();
        for column in 0..4 {
            for row in 0..4 {
                assert_abs_diff_eq!(actual[column][row], expected[column][row], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn moving_reports_the_new_chunk() {
        let mut state = CameraState::new(&WorldConfig::default(), projection());
        let start = state.chunk_position();

        let actions = PlayerAction {
            move_forward: true,
            ..Default::default()
        };
        state.intake_actions(&actions);
        // 20 units along -z from z = 0 lands in chunk -2
        let updates = state.update(Duration::from_millis(2500)).unwrap();

        assert_eq!(updates.new_chunk_position.z, start.z - 2);
        assert!(!updates.chart_changed);
    }

    #[test]
    fn set_curve_updates_the_uniform() {
        let mut state = CameraState::new(&WorldConfig::default(), projection());
        let actions = PlayerAction {
            set_curve: Some(-1.0),
            ..Default::default()
        };
        state.intake_actions(&actions);
        assert!(state.update(Duration::from_millis(16)).is_some());
        assert_eq!(state.camera_uniform.curve, -1.0);

        let eye = state.eye();
        let on_hyperboloid = eye.truncate().magnitude2() - eye.w * eye.w;
        assert_abs_diff_eq!(on_hyperboloid, -1.0, epsilon = 1e-4);
    }

    #[test]
    fn spherical_world_pins_the_curvature() {
        let mut state = CameraState::new(&spherical_config(), projection());
        assert_eq!(state.curve(), 1.0);

        let actions = PlayerAction {
            set_curve: Some(0.0),
            ..Default::default()
        };
        state.intake_actions(&actions);
        state.update(Duration::from_millis(16));
        assert_eq!(state.curve(), 1.0);

        let eye = state.eye();
        assert_abs_diff_eq!(eye.magnitude(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn spherical_view_sends_the_eye_to_the_origin() {
        let state = CameraState::new(&spherical_config(), projection());
        let eye = state.view_matrix() * state.eye();
        assert_abs_diff_eq!(eye.x, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(eye.y, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(eye.z, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(eye.w, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn crossing_the_cutoff_switches_chart() {
        let mut state = CameraState::new(&spherical_config(), projection());
        // Cutoff is π/2 radians at 64 units per radian, about 100.5 units.
        state.camera.position = Point3::new(100.0, 0.0, 0.0);
        state.camera.set_orientation(Deg(0.0), Deg(0.0));

        let actions = PlayerAction {
            move_forward: true,
            ..Default::default()
        };
        state.intake_actions(&actions);
        let updates = state.update(Duration::from_secs(1)).unwrap();

        assert!(updates.chart_changed);
        assert_eq!(state.chart(), Chart::Secondary);

        // 108 units from the primary center is π·64 − 108 from the secondary one.
        let expected = 256.0 - (std::f32::consts::PI * 64.0 - 108.0);
        assert_abs_diff_eq!(state.camera.position.x, expected, epsilon = 1e-2);
        assert_abs_diff_eq!(state.camera.front().x, 1.0, epsilon = 1e-4);

        let eye = state.view_matrix() * state.eye();
        assert_abs_diff_eq!(eye.w, 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(Vector3::new(eye.x, eye.y, eye.z).magnitude(), 0.0, epsilon = 1e-4);
    }
}
