//! # Chunk Persistence
//!
//! Sculpted chunks outlive eviction through a [`ChunkStore`]. The store only sees
//! opaque bytes keyed by chunk position; the byte layout is owned here.
//!
//! ## Layout
//! All integers little-endian:
//! - magic `b"CVX1"`
//! - position: 3x i32
//! - lattice dims: 3x u32, overlap: u32
//! - voxels: `dims.x * dims.y * dims.z` Pod [`Voxel`]s (f32 value, u32 material)

use std::collections::HashMap;
use std::mem::size_of;

use anyhow::{bail, ensure, Context};
use cgmath::Point3;

use crate::engine_state::config::WorldConfig;

use super::{
    chunk::{Chunk, VoxelLattice},
    voxel::{Material, Voxel},
};

const MAGIC: &[u8; 4] = b"CVX1";
const HEADER_LEN: usize = 4 + 3 * 4 + 4 * 4;

/// Where modified chunks go when they are evicted.
pub trait ChunkStore: Send + Sync {
    fn save(&mut self, position: Point3<i32>, bytes: Vec<u8>);
    fn load(&self, position: Point3<i32>) -> Option<Vec<u8>>;
}

/// A [`ChunkStore`] that keeps everything in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryChunkStore {
    chunks: HashMap<Point3<i32>, Vec<u8>>,
}

impl MemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl ChunkStore for MemoryChunkStore {
    fn save(&mut self, position: Point3<i32>, bytes: Vec<u8>) {
        self.chunks.insert(position, bytes);
    }

    fn load(&self, position: Point3<i32>) -> Option<Vec<u8>> {
        self.chunks.get(&position).cloned()
    }
}

/// Serializes a chunk's position and lattice.
pub fn encode_chunk(chunk: &Chunk) -> Vec<u8> {
    let lattice = chunk.lattice();
    let voxels = lattice.voxels();
    let mut bytes = Vec::with_capacity(HEADER_LEN + voxels.len() * size_of::<Voxel>());

    bytes.extend_from_slice(MAGIC);
    for coordinate in [chunk.position.x, chunk.position.y, chunk.position.z] {
        bytes.extend_from_slice(&coordinate.to_le_bytes());
    }
    for dim in lattice.dims() {
        bytes.extend_from_slice(&(dim as u32).to_le_bytes());
    }
    bytes.extend_from_slice(&(lattice.overlap() as u32).to_le_bytes());
    bytes.extend_from_slice(bytemuck::cast_slice(voxels));
    bytes
}

/// Rebuilds a chunk from [`encode_chunk`] output.
///
/// The lattice shape must match what `config` generates, so a chunk saved under a
/// different chunk size is rejected rather than misread.
pub fn decode_chunk(bytes: &[u8], config: &WorldConfig) -> anyhow::Result<Chunk> {
    ensure!(
        bytes.len() >= HEADER_LEN,
        "chunk data too short: {} bytes",
        bytes.len()
    );
    ensure!(&bytes[..4] == MAGIC, "chunk data has no CVX1 header");

    let mut words = bytes[4..HEADER_LEN]
        .chunks_exact(4)
        .map(|word| [word[0], word[1], word[2], word[3]]);
    let mut next_word = || words.next().context("truncated chunk header");

    let position = Point3::new(
        i32::from_le_bytes(next_word()?),
        i32::from_le_bytes(next_word()?),
        i32::from_le_bytes(next_word()?),
    );
    let dims = [
        u32::from_le_bytes(next_word()?) as usize,
        u32::from_le_bytes(next_word()?) as usize,
        u32::from_le_bytes(next_word()?) as usize,
    ];
    let overlap = u32::from_le_bytes(next_word()?) as usize;

    let expected_dim = config.lattice_dimension();
    if dims != [expected_dim; 3] || overlap != config.overlap as usize {
        bail!(
            "chunk {:?} has lattice {:?} with overlap {}, world uses {} with overlap {}",
            position,
            dims,
            overlap,
            expected_dim,
            config.overlap
        );
    }

    let body = &bytes[HEADER_LEN..];
    let voxel_size = size_of::<Voxel>();
    ensure!(
        body.len() == dims[0] * dims[1] * dims[2] * voxel_size,
        "chunk {:?} has {} voxel bytes, expected {}",
        position,
        body.len(),
        dims[0] * dims[1] * dims[2] * voxel_size
    );

    let voxels: Vec<Voxel> = body
        .chunks_exact(voxel_size)
        .map(bytemuck::pod_read_unaligned::<Voxel>)
        .collect();
    if let Some(bad) = voxels
        .iter()
        .find(|voxel| Material::from_index(voxel.material_index()).is_none())
    {
        bail!(
            "chunk {:?} has unknown material {}",
            position,
            bad.material_index()
        );
    }

    let lattice = VoxelLattice::from_voxels(dims, overlap, voxels)
        .with_context(|| format!("decoding chunk {:?}", position))?;
    Ok(Chunk::new(position, lattice, config.chunk_size, config.scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::generator::TerrainGenerator;

    fn small_config() -> WorldConfig {
        WorldConfig {
            chunk_size: 4,
            ..WorldConfig::default()
        }
    }

    #[test]
    fn sculpted_chunk_survives_encoding() {
        let config = small_config();
        let generator = TerrainGenerator::new(&config);
        let mut chunk = generator.generate(Point3::new(-1, 0, 2));
        chunk.mine(chunk.sample_position(2, 2, 2), 1.0, 3.0, 2.0);

        let decoded = decode_chunk(&encode_chunk(&chunk), &config).unwrap();
        assert_eq!(decoded.position, chunk.position);
        assert_eq!(decoded.origin(), chunk.origin());
        assert_eq!(decoded.lattice(), chunk.lattice());
    }

    #[test]
    fn mismatched_lattice_is_rejected() {
        let generator = TerrainGenerator::new(&small_config());
        let bytes = encode_chunk(&generator.generate(Point3::new(0, 0, 0)));
        let other = WorldConfig {
            chunk_size: 8,
            ..WorldConfig::default()
        };
        assert!(decode_chunk(&bytes, &other).is_err());
    }

    #[test]
    fn corrupt_data_is_rejected() {
        let config = small_config();
        let generator = TerrainGenerator::new(&config);
        let bytes = encode_chunk(&generator.generate(Point3::new(0, 0, 0)));

        assert!(decode_chunk(&bytes[..10], &config).is_err());
        assert!(decode_chunk(&bytes[..bytes.len() - 1], &config).is_err());

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(decode_chunk(&bad_magic, &config).is_err());

        // Material of the first voxel sits right after its value.
        let mut bad_material = bytes;
        bad_material[HEADER_LEN + 4..HEADER_LEN + 8].copy_from_slice(&99u32.to_le_bytes());
        assert!(decode_chunk(&bad_material, &config).is_err());
    }

    #[test]
    fn memory_store_round_trips_bytes() {
        let mut store = MemoryChunkStore::new();
        let position = Point3::new(3, -2, 1);
        assert!(store.load(position).is_none());
        store.save(position, vec![1, 2, 3]);
        assert_eq!(store.load(position), Some(vec![1, 2, 3]));
        assert_eq!(store.len(), 1);
    }
}
