use anyhow::bail;

use crate::engine_state::voxels::voxel::Voxel;

/// A dense 3D grid of voxels.
///
/// Samples are stored x-fastest: `index = x + dx * (y + dy * z)`. A chunk of edge
/// length `N` carries `N + overlap + 1` samples per axis, so the cubes along its far
/// faces can be meshed without looking at the neighbouring chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelLattice {
    dims: [usize; 3],
    overlap: usize,
    voxels: Vec<Voxel>,
}

impl VoxelLattice {
    /// Creates a lattice of `dims` samples filled with `fill`.
    pub fn new(dims: [usize; 3], overlap: usize, fill: Voxel) -> Self {
        Self {
            dims,
            overlap,
            voxels: vec![fill; dims[0] * dims[1] * dims[2]],
        }
    }

    /// Lattice for a cubic chunk with edge length `chunk_size`.
    pub fn for_chunk(chunk_size: usize, overlap: usize, fill: Voxel) -> Self {
        let dim = chunk_size + overlap + 1;
        Self::new([dim, dim, dim], overlap, fill)
    }

    /// Builds a lattice by evaluating `sample` at every `(x, y, z)` in storage order.
    pub fn from_fn(
        dims: [usize; 3],
        overlap: usize,
        mut sample: impl FnMut(usize, usize, usize) -> Voxel,
    ) -> Self {
        let mut voxels = Vec::with_capacity(dims[0] * dims[1] * dims[2]);
        for z in 0..dims[2] {
            for y in 0..dims[1] {
                for x in 0..dims[0] {
                    voxels.push(sample(x, y, z));
                }
            }
        }
        Self {
            dims,
            overlap,
            voxels,
        }
    }

    /// Wraps existing storage, checking it matches `dims`.
    pub fn from_voxels(dims: [usize; 3], overlap: usize, voxels: Vec<Voxel>) -> anyhow::Result<Self> {
        let expected = dims[0] * dims[1] * dims[2];
        if voxels.len() != expected {
            bail!(
                "lattice {:?} needs {} voxels, got {}",
                dims,
                expected,
                voxels.len()
            );
        }
        Ok(Self {
            dims,
            overlap,
            voxels,
        })
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Complete cubes along each axis that belong to this lattice's chunk.
    pub fn cubes_per_axis(&self) -> [usize; 3] {
        self.dims.map(|dim| dim.saturating_sub(1 + self.overlap))
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.dims[0] * (y + self.dims[1] * z)
    }

    #[inline]
    fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.dims[0] && y < self.dims[1] && z < self.dims[2]
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<&Voxel> {
        if !self.contains(x, y, z) {
            return None;
        }
        self.voxels.get(self.index(x, y, z))
    }

    pub fn get_mut(&mut self, x: usize, y: usize, z: usize) -> Option<&mut Voxel> {
        if !self.contains(x, y, z) {
            return None;
        }
        let index = self.index(x, y, z);
        self.voxels.get_mut(index)
    }

    /// Density at an in-bounds sample.
    ///
    /// # Panics
    /// Panics if the coordinates are outside the lattice.
    #[inline]
    pub fn value(&self, x: usize, y: usize, z: usize) -> f32 {
        self.voxels[self.index(x, y, z)].value
    }

    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Mutable samples together with their lattice coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = ([usize; 3], &mut Voxel)> {
        let [dx, dy, _] = self.dims;
        self.voxels.iter_mut().enumerate().map(move |(index, voxel)| {
            let x = index % dx;
            let y = (index / dx) % dy;
            let z = index / (dx * dy);
            ([x, y, z], voxel)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::voxel::Material;

    #[test]
    fn storage_is_x_fastest() {
        let lattice = VoxelLattice::from_fn([3, 4, 5], 0, |x, y, z| {
            Voxel::new((x + 10 * y + 100 * z) as f32, Material::Rock)
        });
        assert_eq!(lattice.index(1, 2, 3), 1 + 3 * (2 + 4 * 3));
        assert_eq!(lattice.value(2, 3, 4), 432.0);
        assert_eq!(lattice.voxels()[lattice.index(2, 1, 0)].value, 12.0);
    }

    #[test]
    fn iter_mut_reports_coordinates() {
        let mut lattice = VoxelLattice::new([2, 3, 4], 0, Voxel::air());
        for ([x, y, z], voxel) in lattice.iter_mut() {
            voxel.value = (x + 10 * y + 100 * z) as f32;
        }
        assert_eq!(lattice.value(1, 2, 3), 321.0);
    }

    #[test]
    fn out_of_bounds_is_none() {
        let lattice = VoxelLattice::for_chunk(4, 1, Voxel::air());
        assert_eq!(lattice.dims(), [6, 6, 6]);
        assert_eq!(lattice.cubes_per_axis(), [4, 4, 4]);
        assert!(lattice.get(6, 0, 0).is_none());
        assert!(lattice.get(5, 5, 5).is_some());
    }

    #[test]
    fn from_voxels_checks_length() {
        assert!(VoxelLattice::from_voxels([2, 2, 2], 0, vec![Voxel::air(); 7]).is_err());
        assert!(VoxelLattice::from_voxels([2, 2, 2], 0, vec![Voxel::air(); 8]).is_ok());
    }
}
