//! # Voxel Module
//!
//! The per-sample data stored in a chunk lattice: a signed density value and the
//! material that the surface takes on near that sample.

use num_derive::{FromPrimitive, ToPrimitive};

/// Terrain materials, ordered from deep rock up to the surface cover.
///
/// The `FromPrimitive` derive converts the compact `u32` storage form back into the
/// enum when voxels are read from a lattice or decoded from bytes.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum Material {
    /// Lowest height band.
    Bottom,
    /// Middle height band.
    Middle,
    /// Upper height band.
    Top,
    /// Flat surface cover.
    Grass,
    /// Surface cover on moderate slopes.
    GrassRock,
    /// Exposed rock on steep or rough surface.
    Rock,
    /// Empty space above the terrain.
    Air,
}

impl Material {
    /// Converts a stored material index back into a `Material`.
    ///
    /// # Returns
    /// `None` if `index` names no material.
    pub fn from_index(index: u32) -> Option<Self> {
        num::FromPrimitive::from_u32(index)
    }

    /// Compact storage form of this material.
    pub fn index(self) -> u32 {
        self as u32
    }
}

/// A single lattice sample.
///
/// Negative `value` means inside the terrain, positive means outside; the surface is
/// the zero crossing between samples. Sculpting changes `value` only.
///
/// # Memory Layout
/// `#[repr(C)]` with two 4-byte fields, so whole lattices can be cast to bytes for
/// persistence.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Voxel {
    /// Signed density.
    pub value: f32,
    material: u32,
}

impl Voxel {
    pub fn new(value: f32, material: Material) -> Self {
        Self {
            value,
            material: material.index(),
        }
    }

    /// An empty sample well outside the terrain.
    pub fn air() -> Self {
        Self::new(1.0, Material::Air)
    }

    /// Material of this sample. Unknown indices read as [`Material::Air`].
    pub fn material(&self) -> Material {
        Material::from_index(self.material).unwrap_or(Material::Air)
    }

    /// Raw material index, as stored.
    pub fn material_index(&self) -> u32 {
        self.material
    }

    pub fn is_solid(&self) -> bool {
        self.value < 0.0
    }
}

impl Default for Voxel {
    fn default() -> Self {
        Self::air()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_indices_round_trip() {
        for material in [
            Material::Bottom,
            Material::Middle,
            Material::Top,
            Material::Grass,
            Material::GrassRock,
            Material::Rock,
            Material::Air,
        ] {
            assert_eq!(Material::from_index(material.index()), Some(material));
        }
        assert_eq!(Material::from_index(99), None);
    }

    #[test]
    fn voxel_is_eight_bytes() {
        assert_eq!(std::mem::size_of::<Voxel>(), 8);
        let voxel = Voxel::new(-0.5, Material::Rock);
        assert!(voxel.is_solid());
        assert_eq!(voxel.material(), Material::Rock);
    }
}
