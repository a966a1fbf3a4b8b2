//! # World Configuration
//!
//! Per-world settings read once at startup from a JSON file. A world never changes its
//! configuration after creation; subsystems share it behind an `Arc`.
//!
//! The file location comes from the `CURVED_VOXEL_CONFIG` environment variable and
//! defaults to `world.json` in the working directory. A missing file or a file that
//! fails to parse yields the defaults.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use log::{error, info};
use serde::{Deserialize, Serialize};

use super::geometry::{SphereCharts, SphereLayout, TerrainGeometry};

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "CURVED_VOXEL_CONFIG";

/// Config file used when [`CONFIG_PATH_VAR`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "world.json";

/// Which terrain geometry a world is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    #[default]
    Standard,
    Spherical,
}

/// Parameters of the layered Perlin terrain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoiseSettings {
    pub octaves: u32,
    /// Frequency of the first octave, in cycles per world unit.
    pub frequency: f64,
    /// Height of the first octave, in world units.
    pub amplitude: f64,
    pub persistence: f64,
    pub lacunarity: f64,
    /// Height the surface oscillates around, in world units.
    pub base_height: f64,
    /// Strength of the 3D cave term; `0` disables caves.
    pub cave_strength: f64,
    pub cave_frequency: f64,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            octaves: 4,
            frequency: 0.02,
            amplitude: 12.0,
            persistence: 0.5,
            lacunarity: 2.0,
            base_height: 0.0,
            cave_strength: 4.0,
            cave_frequency: 0.06,
        }
    }
}

/// Default sculpting brush.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrushSettings {
    /// Density change per second at the brush center.
    pub weight: f32,
    /// Brush radius in world units.
    pub radius: f32,
    /// Longest ray the brush will follow to find terrain.
    pub reach: f32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            weight: 4.0,
            radius: 2.5,
            reach: 12.0,
        }
    }
}

/// Settings fixed for the lifetime of a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Edge length of a chunk, in lattice steps.
    pub chunk_size: u32,
    /// Lattice samples shared with the neighbouring chunk.
    pub overlap: u32,
    /// Chunks loaded around the camera in every direction.
    pub render_distance: u32,
    /// World units per lattice step.
    pub scale: f32,
    /// World units per unit of curved distance. Positions are divided by this before
    /// they are embedded, so it sets the radius of curvature.
    pub world_radius: f32,
    pub seed: u32,
    /// Curvature the camera starts with.
    pub curve: f32,
    pub geometry: GeometryKind,
    pub sphere: SphereLayout,
    pub noise: NoiseSettings,
    pub brush: BrushSettings,
    /// Background threads used for generation and remeshing.
    pub worker_count: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            overlap: 1,
            render_distance: 2,
            scale: 1.0,
            world_radius: 64.0,
            seed: 0,
            curve: 0.0,
            geometry: GeometryKind::Standard,
            sphere: SphereLayout::default(),
            noise: NoiseSettings::default(),
            brush: BrushSettings::default(),
            worker_count: 4,
        }
    }
}

impl WorldConfig {
    /// Path of the config file, honouring [`CONFIG_PATH_VAR`].
    pub fn config_path() -> PathBuf {
        env::var_os(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Reads the config at `path`, falling back to defaults on any failure.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => {
                info!("found config at {}", path.display());
                match Self::parse(&text) {
                    Ok(config) => config,
                    Err(err) => {
                        error!("failed to parse config: {:#}", err);
                        Self::default()
                    }
                }
            }
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
                info!("{} not found, using defaults", path.display());
                Self::default()
            }
            Err(err) => {
                error!("failed to read config: {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    /// Parses and validates a JSON config.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(text).context("invalid world config json")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.chunk_size == 0 {
            bail!("chunk_size must be positive");
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            bail!("scale must be a positive number, got {}", self.scale);
        }
        if !(self.world_radius.is_finite() && self.world_radius > 0.0) {
            bail!("world_radius must be a positive number, got {}", self.world_radius);
        }
        if self.worker_count == 0 {
            bail!("worker_count must be at least 1");
        }
        if self.noise.octaves == 0 {
            bail!("noise.octaves must be at least 1");
        }
        if self.brush.radius <= 0.0 {
            bail!("brush.radius must be positive");
        }
        Ok(())
    }

    /// Lattice samples per axis, including the overlap apron.
    pub fn lattice_dimension(&self) -> usize {
        (self.chunk_size + self.overlap + 1) as usize
    }

    /// World-space edge length of one chunk.
    pub fn chunk_extent(&self) -> f32 {
        self.chunk_size as f32 * self.scale
    }

    /// Terrain geometry this world is created with.
    pub fn terrain_geometry(&self) -> TerrainGeometry {
        match self.geometry {
            GeometryKind::Standard => TerrainGeometry::Standard,
            GeometryKind::Spherical => {
                TerrainGeometry::Spherical(SphereCharts::new(
                    self.sphere,
                    self.scale,
                    self.world_radius,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(WorldConfig::parse("{}").unwrap(), WorldConfig::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = WorldConfig::parse(
            r#"{ "seed": 7, "geometry": "spherical", "noise": { "octaves": 2 } }"#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.noise.octaves, 2);
        assert_eq!(config.noise.lacunarity, NoiseSettings::default().lacunarity);
        assert!(matches!(config.terrain_geometry(), TerrainGeometry::Spherical(_)));
    }

    #[test]
    fn rejects_unknown_fields_and_bad_values() {
        assert!(WorldConfig::parse(r#"{ "chunk_sise": 8 }"#).is_err());
        assert!(WorldConfig::parse(r#"{ "chunk_size": 0 }"#).is_err());
        assert!(WorldConfig::parse(r#"{ "scale": -1.0 }"#).is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = WorldConfig::load(Path::new("/definitely/not/here/world.json"));
        assert_eq!(config, WorldConfig::default());
    }

    #[test]
    fn lattice_includes_overlap_apron() {
        let config = WorldConfig {
            chunk_size: 8,
            overlap: 1,
            ..WorldConfig::default()
        };
        assert_eq!(config.lattice_dimension(), 10);
    }
}
