use cgmath::{Matrix4, Point3};
use log::{trace, warn};

use crate::engine_state::camera_state::camera::CameraUniform;

use super::Vertex;

/// One chunk mesh to draw this frame.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub position: Point3<i32>,
    pub vertices: &'a [Vertex],
    /// Model transform applied before the view matrix.
    pub transform: Matrix4<f32>,
    /// Curvature the scene is viewed under.
    pub curve: f32,
    /// `true` when vertex positions are already points of the curved model; otherwise
    /// the backend embeds the transformed `xyz` with `curve` itself.
    pub embedded: bool,
}

/// Something that can put chunk meshes on screen.
pub trait RenderBackend {
    fn begin_frame(&mut self, camera: &CameraUniform);
    fn draw(&mut self, call: &DrawCall);
    fn end_frame(&mut self);
}

/// Totals recorded by [`HeadlessBackend`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub frames: u64,
    pub draw_calls: u64,
    pub vertices: u64,
}

/// A backend that draws nothing and counts what it was asked to draw.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    stats: FrameStats,
    last_frame: FrameStats,
    in_frame: bool,
    camera: Option<CameraUniform>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Totals over every finished frame.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Draw calls and vertices of the most recent finished frame.
    pub fn last_frame(&self) -> FrameStats {
        self.last_frame
    }

    /// Camera of the most recent frame.
    pub fn camera(&self) -> Option<&CameraUniform> {
        self.camera.as_ref()
    }
}

impl RenderBackend for HeadlessBackend {
    fn begin_frame(&mut self, camera: &CameraUniform) {
        if self.in_frame {
            warn!("begin_frame called twice without end_frame");
        }
        self.in_frame = true;
        self.last_frame = FrameStats::default();
        self.camera = Some(*camera);
    }

    fn draw(&mut self, call: &DrawCall) {
        self.last_frame.draw_calls += 1;
        self.last_frame.vertices += call.vertices.len() as u64;
    }

    fn end_frame(&mut self) {
        self.in_frame = false;
        self.last_frame.frames = 1;
        self.stats.frames += 1;
        self.stats.draw_calls += self.last_frame.draw_calls;
        self.stats.vertices += self.last_frame.vertices;
        trace!(
            "frame {}: {} draw calls, {} vertices",
            self.stats.frames,
            self.last_frame.draw_calls,
            self.last_frame.vertices
        );
    }
}
