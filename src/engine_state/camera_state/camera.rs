//! # Camera Implementation
//!
//! This module contains the core camera implementation including:
//! - Camera position, orientation, curvature and person mode
//! - Projection matrix handling for every curvature
//! - Camera controller for input processing
//! - The uniform block handed to the render backend
//!
//! ## Key Components
//! - `Camera`: The eye in world space, its yaw/pitch basis and the curvature it sees with
//! - `Projection`: Manages perspective projection settings
//! - `CameraController`: Accumulates player input between updates
//! - `CameraUniform`: Packed data structure for shaders

use cgmath::*;
use web_time::Duration;

use crate::engine_state::PlayerAction;

/// Distance the eye moves back behind the reference point in third person.
pub const THIRD_PERSON_DISTANCE: f32 = 6.0;

/// Height the eye moves up in third person.
pub const THIRD_PERSON_HEIGHT: f32 = 2.0;

/// Mouse look sensitivity, in degrees per pixel of cursor movement.
pub const MOUSE_SENSITIVITY: f32 = 0.1;

/// Pitch is clamped to this many degrees above and below the horizon.
pub const PITCH_LIMIT: Deg<f32> = Deg(89.0);

/// Curvature range reachable by `set_curve` and `adjust_curve`.
pub const CURVE_LIMIT: f32 = 1.0;

/// Whether the eye sits on the reference point or behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersonMode {
    #[default]
    FirstPerson,
    ThirdPerson,
}

/// A yaw/pitch camera in a space of adjustable curvature.
///
/// The position is kept in flat world units; it is embedded into the curved model
/// only when view matrices are built. `front`, `up` and `right` are recomputed every
/// time yaw or pitch change, so they always form an orthonormal basis.
#[derive(Debug)]
pub struct Camera {
    /// The eye position in world space (the reference point in first person)
    pub position: Point3<f32>,
    yaw: Rad<f32>,
    pitch: Rad<f32>,
    front: Vector3<f32>,
    up: Vector3<f32>,
    right: Vector3<f32>,
    curve: f32,
    person_mode: PersonMode,
    /// Offset added to `position` when third person was entered.
    person_offset: Vector3<f32>,
    first_move: bool,
    last_cursor: (f64, f64),
}

impl Camera {
    /// Creates a new camera with the specified position, orientation and curvature.
    ///
    /// # Arguments
    /// * `position` - Initial position of the camera in world space
    /// * `yaw` - Initial yaw, measured from +x towards +z
    /// * `pitch` - Initial pitch, clamped to [`PITCH_LIMIT`]
    /// * `curve` - Initial curvature, clamped to `[-1, 1]`
    ///
    /// # Example
    /// ```
    /// use cgmath::{Deg, Point3};
    /// use curved_voxel_engine::engine_state::camera_state::camera::Camera;
    ///
    /// let camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(-90.0), Deg(0.0), 0.0);
    /// assert!((camera.front().z + 1.0).abs() < 1e-6);
    /// ```
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
        curve: f32,
    ) -> Self {
        let mut camera = Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
            front: -Vector3::unit_z(),
            up: Vector3::unit_y(),
            right: Vector3::unit_x(),
            curve: curve.clamp(-CURVE_LIMIT, CURVE_LIMIT),
            person_mode: PersonMode::FirstPerson,
            person_offset: Vector3::zero(),
            first_move: true,
            last_cursor: (0.0, 0.0),
        };
        camera.update_vectors();
        camera
    }

    pub fn yaw(&self) -> Rad<f32> {
        self.yaw
    }

    pub fn pitch(&self) -> Rad<f32> {
        self.pitch
    }

    /// Normalized direction the camera looks in.
    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    /// Curvature of the space, `0` flat, positive spherical, negative hyperbolic.
    pub fn curve(&self) -> f32 {
        self.curve
    }

    pub fn person_mode(&self) -> PersonMode {
        self.person_mode
    }

    /// Position of the reference point, which differs from the eye in third person.
    pub fn reference_point(&self) -> Point3<f32> {
        self.position - self.person_offset
    }

    /// Replaces yaw and pitch, clamping pitch, and rebuilds the basis.
    pub fn set_orientation<Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(&mut self, yaw: Y, pitch: P) {
        self.yaw = yaw.into();
        self.pitch = pitch.into();
        self.update_vectors();
    }

    /// Turns the camera by the given angles.
    pub fn rotate<Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(&mut self, yaw: Y, pitch: P) {
        self.set_orientation(self.yaw + yaw.into(), self.pitch + pitch.into());
    }

    /// Mouse look from an absolute cursor position.
    ///
    /// The first sample after creation or [`Camera::reset_mouse`] only records the
    /// cursor, so regaining focus does not snap the view. Moving the cursor up pitches
    /// the camera up.
    pub fn mouse_moved(&mut self, x: f64, y: f64) {
        if self.first_move {
            self.last_cursor = (x, y);
            self.first_move = false;
            return;
        }

        let delta_x = (x - self.last_cursor.0) as f32;
        let delta_y = (self.last_cursor.1 - y) as f32;
        self.last_cursor = (x, y);

        self.rotate(
            Deg(delta_x * MOUSE_SENSITIVITY),
            Deg(delta_y * MOUSE_SENSITIVITY),
        );
    }

    /// Arms first-move absorption again.
    pub fn reset_mouse(&mut self) {
        self.first_move = true;
    }

    /// Switches between first and third person.
    ///
    /// Entering third person moves the eye back along `front` and up along `up` once;
    /// leaving it removes exactly that offset, whatever the camera turned meanwhile.
    pub fn toggle_person_mode(&mut self) {
        match self.person_mode {
            PersonMode::FirstPerson => {
                self.person_offset =
                    -self.front * THIRD_PERSON_DISTANCE + self.up * THIRD_PERSON_HEIGHT;
                self.position += self.person_offset;
                self.person_mode = PersonMode::ThirdPerson;
            }
            PersonMode::ThirdPerson => {
                self.position -= self.person_offset;
                self.person_offset = Vector3::zero();
                self.person_mode = PersonMode::FirstPerson;
            }
        }
    }

    /// Sets the curvature, clamped to `[-1, 1]`.
    pub fn set_curve(&mut self, curve: f32) {
        self.curve = curve.clamp(-CURVE_LIMIT, CURVE_LIMIT);
    }

    /// Changes the curvature by `delta`, clamped to `[-1, 1]`.
    pub fn adjust_curve(&mut self, delta: f32) {
        self.set_curve(self.curve + delta);
    }

    /// Carries the camera across a chart seam.
    ///
    /// # Arguments
    /// * `position` - The position re-expressed in the new chart
    /// * `turn` - Rotation of horizontal headings across the seam
    pub fn transport(&mut self, position: Point3<f32>, turn: Rad<f32>) {
        self.position = position;
        self.person_offset = rotate_horizontal(self.person_offset, turn);
        self.yaw += turn;
        self.update_vectors();
    }

    /// Recomputes `front`, `right` and `up` from yaw and pitch.
    fn update_vectors(&mut self) {
        let limit: Rad<f32> = PITCH_LIMIT.into();
        if self.pitch > limit {
            self.pitch = limit;
        } else if self.pitch < -limit {
            self.pitch = -limit;
        }

        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.0.sin_cos();
        self.front = Vector3::new(yaw_cos * pitch_cos, pitch_sin, yaw_sin * pitch_cos).normalize();
        self.right = self.front.cross(Vector3::unit_y()).normalize();
        self.up = self.right.cross(self.front).normalize();
    }

    /// Applies the movement the controller accumulated and resets it.
    ///
    /// Horizontal movement follows the yaw only, so looking up does not slow walking.
    pub fn get_controller_updates_and_reset_controller(
        &mut self,
        controller: &mut CameraController,
        dt: Duration,
    ) {
        let dt = dt.as_secs_f32();

        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        let forward = Vector3::new(yaw_cos, 0.0, yaw_sin);
        let right = Vector3::new(-yaw_sin, 0.0, yaw_cos);
        self.position += forward
            * (controller.amount_forward - controller.amount_backward)
            * controller.speed
            * dt;
        self.position +=
            right * (controller.amount_right - controller.amount_left) * controller.speed * dt;
        self.position.y += (controller.amount_up - controller.amount_down) * controller.speed * dt;

        if let Some((x, y)) = controller.cursor.take() {
            self.mouse_moved(x, y);
        }

        if controller.curve_direction != 0.0 {
            self.adjust_curve(controller.curve_direction * controller.curve_rate * dt);
        }

        controller.reset();
    }
}

/// Rotates the horizontal part of `vector` by `angle`, from +x towards +z.
fn rotate_horizontal(vector: Vector3<f32>, angle: Rad<f32>) -> Vector3<f32> {
    let (sin, cos) = angle.0.sin_cos();
    Vector3::new(
        vector.x * cos - vector.z * sin,
        vector.y,
        vector.x * sin + vector.z * cos,
    )
}

/// Represents a camera's projection matrix and related parameters.
///
/// Near and far distances are in curved units, i.e. world units divided by the
/// world radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Aspect ratio (width / height)
    aspect: f32,
    /// Vertical field of view in radians
    fovy: Rad<f32>,
    /// Near clipping plane distance
    znear: f32,
    /// Far clipping plane distance
    zfar: f32,
}

impl Projection {
    /// Creates a new projection with the given parameters.
    ///
    /// # Arguments
    /// * `width` - Viewport width in pixels
    /// * `height` - Viewport height in pixels
    /// * `fovy` - Vertical field of view
    /// * `znear` - Near clipping plane distance
    /// * `zfar` - Far clipping plane distance
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: aspect_ratio(width, height),
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Updates the projection's aspect ratio for viewport resizing.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Calculates the projection matrix for the given curvature.
    pub fn calc_matrix(&self, curve: f32) -> Matrix4<f32> {
        crate::engine_state::geometry::projection_matrix(
            self.fovy, self.znear, self.zfar, self.aspect, curve,
        )
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width as f32 / height.max(1) as f32
}

/// Handles camera movement based on user input.
///
/// This struct tracks the movement keys, the latest cursor position and the
/// curvature keys between updates, and applies them to the camera when updated.
#[derive(Debug)]
pub struct CameraController {
    // Movement amounts (normalized)
    amount_left: f32,
    amount_right: f32,
    amount_forward: f32,
    amount_backward: f32,
    amount_up: f32,
    amount_down: f32,

    // Latest cursor position, if the mouse moved
    cursor: Option<(f64, f64)>,

    // -1, 0 or 1
    curve_direction: f32,

    // Configuration
    speed: f32,
    curve_rate: f32,
}

impl CameraController {
    /// Creates a new camera controller.
    ///
    /// # Arguments
    /// * `speed` - Movement speed in world units per second
    /// * `curve_rate` - Curvature change per second while a curvature key is held
    pub fn new(speed: f32, curve_rate: f32) -> Self {
        Self {
            amount_left: 0.0,
            amount_right: 0.0,
            amount_forward: 0.0,
            amount_backward: 0.0,
            amount_up: 0.0,
            amount_down: 0.0,
            cursor: None,
            curve_direction: 0.0,
            speed,
            curve_rate,
        }
    }

    /// Processes player actions and updates controller state accordingly.
    pub fn intake_actions(&mut self, actions: &PlayerAction) {
        if actions.move_forward {
            self.amount_forward = 1.0;
        }
        if actions.move_backward {
            self.amount_backward = 1.0;
        }
        if actions.move_left {
            self.amount_left = 1.0;
        }
        if actions.move_right {
            self.amount_right = 1.0;
        }
        if actions.move_up {
            self.amount_up = 1.0;
        }
        if actions.move_down {
            self.amount_down = 1.0;
        }
        if actions.cursor_position.is_some() {
            self.cursor = actions.cursor_position;
        }
        self.curve_direction = match (actions.increase_curve, actions.decrease_curve) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };
    }

    /// Checks if there are any pending updates that would affect the camera.
    pub fn has_updates(&self) -> bool {
        self.amount_forward > 0.0
            || self.amount_backward > 0.0
            || self.amount_left > 0.0
            || self.amount_right > 0.0
            || self.amount_up > 0.0
            || self.amount_down > 0.0
            || self.cursor.is_some()
            || self.curve_direction != 0.0
    }

    fn reset(&mut self) {
        self.amount_up = 0.0;
        self.amount_down = 0.0;
        self.amount_left = 0.0;
        self.amount_right = 0.0;
        self.amount_forward = 0.0;
        self.amount_backward = 0.0;
        self.cursor = None;
        self.curve_direction = 0.0;
    }
}

/// Camera data in the layout shaders expect.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    // cgmath types are not Pod, so matrices are stored as column arrays
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// The eye embedded in the curved model.
    pub eye: [f32; 4],
    pub curve: f32,
    _padding: [f32; 3],
}

impl CameraUniform {
    /// Creates a new camera uniform with identity matrices and the eye at the origin.
    pub fn new() -> Self {
        Self {
            view: Matrix4::identity().into(),
            projection: Matrix4::identity().into(),
            eye: [0.0, 0.0, 0.0, 1.0],
            curve: 0.0,
            _padding: [0.0; 3],
        }
    }

    pub fn update(
        &mut self,
        view: Matrix4<f32>,
        projection: Matrix4<f32>,
        eye: Vector4<f32>,
        curve: f32,
    ) {
        self.view = view.into();
        self.projection = projection.into();
        self.eye = eye.into();
        self.curve = curve;
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}
