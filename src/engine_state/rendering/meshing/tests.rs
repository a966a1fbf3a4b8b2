use approx::assert_abs_diff_eq;
use cgmath::{InnerSpace, Point3, Vector3};

use super::*;
use crate::engine_state::{
    geometry::SphereLayout,
    voxels::{
        chunk::VoxelLattice,
        voxel::{Material, Voxel},
    },
};

use super::tables::{EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};

/// Chunk of edge 4 with a one-sample apron, cut by the plane `y = height`.
fn plane_chunk(position: Point3<i32>, height: f32) -> Chunk {
    let size = 4;
    let origin = Chunk::origin_of(position, size as u32, 1.0);
    let lattice = VoxelLattice::from_fn([6, 6, 6], 1, |_, y, _| {
        let world_y = origin.y + y as f32;
        let material = if world_y < height { Material::Rock } else { Material::Air };
        Voxel::new(world_y - height, material)
    });
    Chunk::new(position, lattice, size as u32, 1.0)
}

fn sphere_generator() -> MeshGenerator {
    let layout = SphereLayout {
        centers: [[0, 0, 0], [1000, 0, 0]],
        ..SphereLayout::default()
    };
    MeshGenerator::new(TerrainGeometry::Spherical(SphereCharts::new(layout, 1.0, 8.0)))
}

#[test]
fn tables_agree_on_crossed_edges() {
    for case in 0..256 {
        let mut used = 0u16;
        for &edge in TRI_TABLE[case].iter().take_while(|&&edge| edge >= 0) {
            used |= 1 << edge;
        }
        assert_eq!(used & !EDGE_TABLE[case], 0, "case {}", case);
        assert_eq!(used == 0, EDGE_TABLE[case] == 0, "case {}", case);
    }
    assert_eq!(EDGE_CORNERS.len(), 12);
}

#[test]
fn all_air_lattice_has_no_mesh() {
    let lattice = VoxelLattice::for_chunk(4, 1, Voxel::air());
    let chunk = Chunk::new(Point3::new(0, 0, 0), lattice, 4, 1.0);
    let mesh = MeshGenerator::new(TerrainGeometry::Standard).generate(&chunk, Chart::Primary);
    assert!(mesh.is_empty());
}

#[test]
fn single_sample_lattice_has_no_cubes() {
    let lattice = VoxelLattice::new([1, 1, 1], 0, Voxel::new(-1.0, Material::Rock));
    assert!(march(&lattice, Point3::new(0.0, 0.0, 0.0), 1.0).is_empty());
}

#[test]
fn single_solid_sample_is_enclosed_by_outward_triangles() {
    let lattice = VoxelLattice::from_fn([3, 3, 3], 0, |x, y, z| {
        if (x, y, z) == (1, 1, 1) {
            Voxel::new(-1.0, Material::Rock)
        } else {
            Voxel::air()
        }
    });
    let mesh = march(&lattice, Point3::new(0.0, 0.0, 0.0), 1.0);

    // One corner-cutting triangle in each of the eight cubes around the sample.
    assert_eq!(mesh.len(), 8 * 3);
    let center = Vector3::new(1.0, 1.0, 1.0);
    for vertex in &mesh {
        let away = vertex.position().truncate() - center;
        assert!(away.dot(vertex.normal()) > 0.0);
        assert_eq!(vertex.position[3], 1.0);
    }
}

#[test]
fn lone_solid_voxel_in_an_empty_chunk_is_meshed() {
    let lattice = VoxelLattice::from_fn([8, 8, 8], 0, |x, y, z| {
        if (x, y, z) == (4, 4, 4) {
            Voxel::new(-1.0, Material::Rock)
        } else {
            Voxel::air()
        }
    });
    let chunk = Chunk::new(Point3::new(0, 0, 0), lattice, 7, 1.0);
    let mesh = MeshGenerator::new(TerrainGeometry::Standard).generate(&chunk, Chart::Primary);

    assert!(!mesh.is_empty());
    assert_eq!(mesh.len() % 3, 0);
}

#[test]
fn plane_is_meshed_at_the_crossing() {
    let chunk = plane_chunk(Point3::new(0, 0, 0), 2.4);
    let mesh = MeshGenerator::new(TerrainGeometry::Standard).generate(&chunk, Chart::Primary);

    // Four by four cubes in the crossed layer, two triangles each. The apron is not marched.
    assert_eq!(mesh.len(), 16 * 2 * 3);
    for vertex in &mesh {
        assert_abs_diff_eq!(vertex.position[1], 2.4, epsilon = 1e-5);
        assert_abs_diff_eq!(vertex.normal[1], 1.0, epsilon = 1e-5);
        assert_eq!(vertex.material, Material::Rock.index());
        assert!(vertex.position[0] <= 4.0 && vertex.position[2] <= 4.0);
    }
}

#[test]
fn meshing_is_deterministic() {
    let chunk = plane_chunk(Point3::new(1, 0, -1), 1.7);
    let generator = MeshGenerator::new(TerrainGeometry::Standard);
    assert_eq!(
        generator.generate(&chunk, Chart::Primary),
        generator.generate(&chunk, Chart::Primary)
    );
}

#[test]
fn spherical_mesh_lies_on_the_unit_sphere() {
    let chunk = plane_chunk(Point3::new(0, 0, 0), 2.4);
    let mesh = sphere_generator().generate(&chunk, Chart::Primary);

    assert_eq!(mesh.len(), 16 * 2 * 3);
    for vertex in &mesh {
        assert_abs_diff_eq!(vertex.position().magnitude(), 1.0, epsilon = 1e-5);
        assert!(vertex.position[3] > 0.0);
    }
}

#[test]
fn spherical_mesh_beyond_cutoff_is_dropped() {
    let chunk = plane_chunk(Point3::new(5, 0, 0), 2.4);
    assert!(sphere_generator().generate(&chunk, Chart::Primary).is_empty());
}

#[test]
fn secondary_chart_meshes_on_the_far_hemisphere() {
    let chunk = plane_chunk(Point3::new(250, 0, 0), 2.4);
    let mesh = sphere_generator().generate(&chunk, Chart::Secondary);

    assert!(!mesh.is_empty());
    for vertex in &mesh {
        assert!(vertex.position[3] < 0.0);
    }
}
