//! # Terrain Generator
//!
//! Fills chunk lattices with a signed density field built from seeded Perlin noise.
//!
//! The density at a world point is `height_above_surface + cave_term`, so it is
//! negative inside the terrain and grows roughly linearly with distance above the
//! surface. Surface height is layered 2D noise over the horizontal plane; caves are a
//! thresholded 3D (or, on the sphere, 4D) noise term that only ever opens space below
//! the surface.
//!
//! On a spherical world the horizontal offset from the chunk's chart center is wrapped
//! onto a sphere of radius `world_radius` first, and the noise is sampled on that
//! sphere. Both charts share one frame, so a point seen from either chart gets the
//! same density.

use cgmath::{Point3, Vector3};

use crate::engine_state::{
    config::{NoiseSettings, WorldConfig},
    geometry::{Chart, TerrainGeometry},
};

use super::{
    chunk::{Chunk, VoxelLattice},
    perlin_noise::{Octaves, PerlinNoise},
    voxel::{Material, Voxel},
};

/// Cave noise below this value leaves the terrain solid.
const CAVE_THRESHOLD: f64 = 0.35;

/// Roughness noise runs this many times faster than the surface noise.
const ROUGHNESS_FREQUENCY: f64 = 6.0;

/// Samples within this many lattice steps of the surface get surface materials.
const SURFACE_BAND_STEPS: f64 = 2.0;

/// Generates chunk lattices for one world.
#[derive(Clone, Debug)]
pub struct TerrainGenerator {
    noise: PerlinNoise,
    settings: NoiseSettings,
    geometry: TerrainGeometry,
    chunk_size: u32,
    overlap: u32,
    scale: f32,
}

/// Noise-derived quantities at one world point.
struct FieldSample {
    /// Height of the point above the reference plane.
    vertical: f64,
    surface: f64,
    cave: f64,
    roughness: f64,
}

impl TerrainGenerator {
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            noise: PerlinNoise::new(config.seed),
            settings: config.noise,
            geometry: config.terrain_geometry(),
            chunk_size: config.chunk_size,
            overlap: config.overlap,
            scale: config.scale,
        }
    }

    pub fn geometry(&self) -> &TerrainGeometry {
        &self.geometry
    }

    /// Generates the chunk at `position` (chunk coordinates).
    pub fn generate(&self, position: Point3<i32>) -> Chunk {
        Chunk::new(
            position,
            self.generate_lattice(position),
            self.chunk_size,
            self.scale,
        )
    }

    /// Generates the lattice for `position`, including the overlap apron.
    pub fn generate_lattice(&self, position: Point3<i32>) -> VoxelLattice {
        let origin = Chunk::origin_of(position, self.chunk_size, self.scale);
        let chart = self.chart_for_chunk(position);
        let dim = (self.chunk_size + self.overlap + 1) as usize;

        VoxelLattice::from_fn([dim, dim, dim], self.overlap as usize, |x, y, z| {
            let offset = Vector3::new(x as f32, y as f32, z as f32) * self.scale;
            self.sample(origin + offset, chart)
        })
    }

    /// Chart a chunk is generated and meshed in. Flat worlds always use the primary chart.
    pub fn chart_for_chunk(&self, position: Point3<i32>) -> Chart {
        match &self.geometry {
            TerrainGeometry::Standard => Chart::Primary,
            TerrainGeometry::Spherical(charts) => {
                let half = self.chunk_size as f32 * self.scale * 0.5;
                let origin = Chunk::origin_of(position, self.chunk_size, self.scale);
                charts.chart_for(origin + Vector3::new(half, half, half))
            }
        }
    }

    /// Density and material at a world point seen from `chart`.
    pub fn sample(&self, point: Point3<f32>, chart: Chart) -> Voxel {
        let field = self.field_at(point, chart);

        let mut value = field.vertical - field.surface;
        if value < 0.0 && self.settings.cave_strength > 0.0 {
            let opening = ((field.cave - CAVE_THRESHOLD) / (1.0 - CAVE_THRESHOLD)).max(0.0);
            value += self.settings.cave_strength * opening;
        }

        Voxel::new(value as f32, self.material_for(&field))
    }

    fn field_at(&self, point: Point3<f32>, chart: Chart) -> FieldSample {
        let settings = &self.settings;
        let octaves = Octaves {
            count: settings.octaves,
            persistence: settings.persistence,
            lacunarity: settings.lacunarity,
        };
        let frequency = settings.frequency;
        let cave_frequency = settings.cave_frequency;
        let rough_frequency = frequency * ROUGHNESS_FREQUENCY;

        match &self.geometry {
            TerrainGeometry::Standard => {
                let (x, y, z) = (point.x as f64, point.y as f64, point.z as f64);
                FieldSample {
                    vertical: y,
                    surface: settings.base_height
                        + settings.amplitude * self.noise.fbm_2d(x * frequency, z * frequency, octaves),
                    cave: self.noise.get_noise_3d(
                        x * cave_frequency,
                        y * cave_frequency,
                        z * cave_frequency,
                    ),
                    roughness: self.noise.get_noise_2d(x * rough_frequency, z * rough_frequency),
                }
            }
            TerrainGeometry::Spherical(charts) => {
                let offset = charts.horizontal_offset(point, chart);
                let on_sphere = charts.to_shared_frame(offset, chart);
                let radius = charts.radius() as f64;
                // The horizontal sphere lives in the x, z, w coordinates of the embedding.
                let (sx, sy, sz) = (
                    on_sphere.x as f64 * radius,
                    on_sphere.z as f64 * radius,
                    on_sphere.w as f64 * radius,
                );
                let vertical = (point.y - charts.center(chart).y) as f64;

                FieldSample {
                    vertical,
                    surface: settings.base_height
                        + settings.amplitude
                            * self.noise.fbm_3d(sx * frequency, sy * frequency, sz * frequency, octaves),
                    cave: self.noise.get_noise_4d(
                        sx * cave_frequency,
                        sy * cave_frequency,
                        sz * cave_frequency,
                        vertical * cave_frequency,
                    ),
                    roughness: self.noise.get_noise_3d(
                        sx * rough_frequency,
                        sy * rough_frequency,
                        sz * rough_frequency,
                    ),
                }
            }
        }
    }

    fn material_for(&self, field: &FieldSample) -> Material {
        let band = SURFACE_BAND_STEPS * self.scale as f64;
        let depth = field.surface - field.vertical;

        if depth < -band {
            return Material::Air;
        }

        if depth < band {
            return match field.roughness {
                r if r < 0.15 => Material::Grass,
                r if r < 0.45 => Material::GrassRock,
                _ => Material::Rock,
            };
        }

        let base = self.settings.base_height;
        let amplitude = self.settings.amplitude;
        if field.vertical < base - amplitude * 0.5 {
            Material::Bottom
        } else if field.vertical < base + amplitude * 0.25 {
            Material::Middle
        } else {
            Material::Top
        }
    }
}
