//! # Physics Interface
//!
//! The engine does not simulate rigid bodies. It needs two things from whatever does:
//! ray casts, to place the sculpting brush, and body poses, to draw bodies in curved
//! space. [`PhysicsWorld`] is that boundary.
//!
//! [`VoxelPhysics`] answers ray casts by marching the loaded density field and keeps
//! poses in a plain map. It is enough for the headless loop and tests; a real solver
//! replaces it wholesale.

use std::collections::HashMap;

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Quaternion, Vector3};

use super::{
    geometry::{euc_to_curved3, translation_matrix},
    voxels::{terrain::Terrain, world::World},
};

/// Identifies a body in a [`PhysicsWorld`].
pub type BodyHandle = u32;

/// First surface a ray met.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin along the normalized direction.
    pub distance: f32,
    pub normal: Vector3<f32>,
    /// `false` for surfaces the brush should pass over, such as triggers.
    pub collidable: bool,
}

/// Position and orientation of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPose {
    pub position: Point3<f32>,
    pub orientation: Quaternion<f32>,
}

impl BodyPose {
    pub fn at(position: Point3<f32>) -> Self {
        Self {
            position,
            orientation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
        }
    }
}

/// The physics collaborator.
pub trait PhysicsWorld {
    /// Casts a ray from `origin` along the normalized `direction`.
    fn ray_cast(&self, origin: Point3<f32>, direction: Vector3<f32>, max_distance: f32) -> Option<RayHit>;
    fn body_pose(&self, body: BodyHandle) -> Option<BodyPose>;
    fn set_body_pose(&mut self, body: BodyHandle, pose: BodyPose);
}

/// Model matrix placing a body in the curved model.
///
/// `pose.position` must already be in the curved model's units.
pub fn render_transform(pose: &BodyPose, curve: f32) -> Matrix4<f32> {
    let target = euc_to_curved3(pose.position.to_vec(), curve);
    translation_matrix(target, curve) * Matrix4::from(pose.orientation)
}

/// Ray samples per lattice step.
const SAMPLES_PER_STEP: f32 = 4.0;

/// Ray casts against the loaded terrain.
pub struct VoxelPhysics {
    terrain: Terrain,
    bodies: HashMap<BodyHandle, BodyPose>,
}

impl VoxelPhysics {
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            bodies: HashMap::new(),
        }
    }

    /// Density at `point`; unloaded space counts as empty.
    ///
    /// A chunk a worker holds locked is skipped for this cast rather than waited on.
    fn density(&self, world: &World, point: Point3<f32>) -> Option<f32> {
        let chunk = world.get(self.terrain.chunk_position_containing(point))?;
        let value = chunk.try_get()?.sample_value(point);
        value
    }

    fn surface_normal(&self, world: &World, point: Point3<f32>, fallback: Vector3<f32>) -> Vector3<f32> {
        let h = self.terrain.config().scale * 0.5;
        let sample = |offset: Vector3<f32>| self.density(world, point + offset).unwrap_or(1.0);
        let gradient = Vector3::new(
            sample(Vector3::unit_x() * h) - sample(-Vector3::unit_x() * h),
            sample(Vector3::unit_y() * h) - sample(-Vector3::unit_y() * h),
            sample(Vector3::unit_z() * h) - sample(-Vector3::unit_z() * h),
        );
        if gradient.magnitude2() > 0.0 {
            gradient.normalize()
        } else {
            fallback
        }
    }
}

impl PhysicsWorld for VoxelPhysics {
    fn ray_cast(&self, origin: Point3<f32>, direction: Vector3<f32>, max_distance: f32) -> Option<RayHit> {
        if direction.magnitude2() == 0.0 || max_distance <= 0.0 {
            return None;
        }
        let direction = direction.normalize();
        let step = self.terrain.config().scale / SAMPLES_PER_STEP;
        let world = self.terrain.world().get();

        let mut previous: Option<(f32, f32)> = None;
        let mut distance = 0.0;
        while distance <= max_distance {
            let point = origin + direction * distance;
            if let Some(value) = self.density(&world, point) {
                if value < 0.0 {
                    // Refine between the last outside sample and this one.
                    let hit_distance = match previous {
                        Some((before, before_value)) => {
                            before + (distance - before) * before_value / (before_value - value)
                        }
                        None => distance,
                    };
                    let hit_point = origin + direction * hit_distance;
                    return Some(RayHit {
                        distance: hit_distance,
                        normal: self.surface_normal(&world, hit_point, -direction),
                        collidable: true,
                    });
                }
                previous = Some((distance, value));
            } else {
                previous = None;
            }
            distance += step;
        }
        None
    }

    fn body_pose(&self, body: BodyHandle) -> Option<BodyPose> {
        self.bodies.get(&body).copied()
    }

    fn set_body_pose(&mut self, body: BodyHandle, pose: BodyPose) {
        self.bodies.insert(body, pose);
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::mpsc,
        thread,
        time::{Duration, Instant},
    };

    use approx::assert_abs_diff_eq;
    use cgmath::{Rad, Rotation3, SquareMatrix, Vector4};

    use super::*;
    use crate::engine_state::{
        config::WorldConfig,
        voxels::{
            chunk::{Chunk, VoxelLattice},
            persistence::MemoryChunkStore,
            voxel::{Material, Voxel},
        },
    };

    /// Terrain with one chunk whose surface is the plane `y = 1.25`.
    fn flat_terrain() -> Terrain {
        let config = WorldConfig {
            chunk_size: 4,
            ..WorldConfig::default()
        };
        let terrain = Terrain::new(config, Box::new(MemoryChunkStore::new()));
        let lattice = VoxelLattice::from_fn([6, 6, 6], 1, |_, y, _| {
            Voxel::new(y as f32 - 1.25, Material::Rock)
        });
        terrain
            .world()
            .get_mut()
            .insert(Chunk::new(Point3::new(0, 0, 0), lattice, 4, 1.0));
        terrain
    }

    #[test]
    fn ray_stops_at_the_surface() {
        let physics = VoxelPhysics::new(flat_terrain());
        let hit = physics
            .ray_cast(Point3::new(2.0, 3.9, 2.0), Vector3::new(0.0, -3.0, 0.0), 10.0)
            .unwrap();
        assert_abs_diff_eq!(hit.distance, 2.65, epsilon = 1e-4);
        assert_abs_diff_eq!(hit.normal.y, 1.0, epsilon = 1e-4);
        assert!(hit.collidable);
    }

    #[test]
    fn ray_misses_beyond_reach_and_in_unloaded_space() {
        let physics = VoxelPhysics::new(flat_terrain());
        let down = Vector3::new(0.0, -1.0, 0.0);
        assert!(physics.ray_cast(Point3::new(2.0, 3.9, 2.0), down, 1.0).is_none());
        assert!(physics.ray_cast(Point3::new(50.0, 3.9, 2.0), down, 10.0).is_none());
    }

    #[test]
    fn locked_chunks_do_not_block_a_cast() {
        let terrain = flat_terrain();
        let chunk = terrain.world().get().get(Point3::new(0, 0, 0)).unwrap();
        let physics = VoxelPhysics::new(terrain);

        let (locked_tx, locked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let worker = thread::spawn(move || {
            let _guard = chunk.get_mut();
            locked_tx.send(()).unwrap();
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
        });
        locked_rx.recv().unwrap();

        let start = Instant::now();
        let hit = physics.ray_cast(Point3::new(2.0, 3.9, 2.0), Vector3::new(0.0, -1.0, 0.0), 10.0);
        let elapsed = start.elapsed();
        release_tx.send(()).unwrap();
        worker.join().unwrap();

        assert!(hit.is_none());
        assert!(elapsed < Duration::from_secs(1), "cast took {:?}", elapsed);

        let hit = physics.ray_cast(Point3::new(2.0, 3.9, 2.0), Vector3::new(0.0, -1.0, 0.0), 10.0);
        assert!(hit.is_some());
    }

    #[test]
    fn poses_are_stored_per_body() {
        let mut physics = VoxelPhysics::new(flat_terrain());
        assert!(physics.body_pose(7).is_none());
        let pose = BodyPose::at(Point3::new(1.0, 2.0, 3.0));
        physics.set_body_pose(7, pose);
        assert_eq!(physics.body_pose(7), Some(pose));
    }

    #[test]
    fn flat_render_transform_is_rigid_motion() {
        let pose = BodyPose {
            position: Point3::new(1.0, -2.0, 0.5),
            orientation: Quaternion::from_angle_y(Rad(0.7)),
        };
        let expected = Matrix4::from_translation(pose.position.to_vec()) * Matrix4::from(pose.orientation);
        let actual = render_transform(&pose, 0.0);
        for col in 0..4 {
            for row in 0..4 {
                assert_abs_diff_eq!(actual[col][row], expected[col][row], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn curved_render_transform_places_the_body_on_the_model() {
        let pose = BodyPose::at(Point3::new(0.3, 0.1, -0.2));
        for curve in [1.0f32, -1.0] {
            let transform = render_transform(&pose, curve);
            let placed = transform * Vector4::new(0.0, 0.0, 0.0, 1.0);
            let expected = euc_to_curved3(pose.position.to_vec(), curve);
            for i in 0..4 {
                assert_abs_diff_eq!(placed[i], expected[i], epsilon = 1e-5);
            }
        }
        assert_eq!(render_transform(&BodyPose::at(Point3::origin()), 1.0), Matrix4::identity());
    }
}
