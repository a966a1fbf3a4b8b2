//! Marching cubes over a chunk lattice.
//!
//! Each cube of eight neighbouring samples is classified by which corners are inside
//! the terrain (negative density). The case index selects the crossed edges and the
//! triangles joining them from the standard tables. Surface points are placed on each
//! crossed edge by linear interpolation of the two corner densities.

use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3, Zero};

use crate::engine_state::{
    rendering::Vertex,
    voxels::{chunk::VoxelLattice, voxel::Material},
};

use super::tables::{CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};

/// Triangles with a smaller cross product than this are dropped.
const DEGENERATE_AREA: f32 = 1e-12;

/// Builds the flat, world-space triangle list for a lattice.
///
/// # Arguments
/// * `lattice` - Density samples; only the cubes belonging to the chunk are marched
/// * `origin` - World position of sample `(0, 0, 0)`
/// * `scale` - World units per lattice step
///
/// # Returns
/// Three vertices per triangle with `w = 1`. Empty when the density never changes sign.
pub fn march(lattice: &VoxelLattice, origin: Point3<f32>, scale: f32) -> Vec<Vertex> {
    let [cubes_x, cubes_y, cubes_z] = lattice.cubes_per_axis();
    let mut vertices = Vec::new();

    for z in 0..cubes_z {
        for y in 0..cubes_y {
            for x in 0..cubes_x {
                march_cube(lattice, [x, y, z], origin.to_vec(), scale, &mut vertices);
            }
        }
    }

    vertices
}

fn march_cube(
    lattice: &VoxelLattice,
    [x, y, z]: [usize; 3],
    origin: Vector3<f32>,
    scale: f32,
    vertices: &mut Vec<Vertex>,
) {
    let mut values = [0.0f32; 8];
    let mut materials = [Material::Air; 8];
    let mut positions = [Vector3::zero(); 8];

    for (corner, offset) in CORNER_OFFSETS.iter().enumerate() {
        let (gx, gy, gz) = (x + offset[0], y + offset[1], z + offset[2]);
        let voxel = &lattice.voxels()[lattice.index(gx, gy, gz)];
        values[corner] = voxel.value;
        materials[corner] = voxel.material();
        positions[corner] = origin + Vector3::new(gx as f32, gy as f32, gz as f32) * scale;
    }

    let mut case = 0usize;
    for (corner, value) in values.iter().enumerate() {
        if *value < 0.0 {
            case |= 1 << corner;
        }
    }

    let crossed = EDGE_TABLE[case];
    if crossed == 0 {
        return;
    }

    let mut edge_points = [(Vector3::zero(), Material::Air); 12];
    for (edge, [a, b]) in EDGE_CORNERS.iter().copied().enumerate() {
        if crossed & (1 << edge) == 0 {
            continue;
        }
        let t = crossing(values[a], values[b]);
        let point = positions[a] + (positions[b] - positions[a]) * t;
        let material = if t <= 0.5 { materials[a] } else { materials[b] };
        edge_points[edge] = (point, material);
    }

    let outward = density_gradient(&values);

    for triangle in TRI_TABLE[case].chunks_exact(3) {
        if triangle[0] < 0 {
            break;
        }
        let mut corners = [
            edge_points[triangle[0] as usize],
            edge_points[triangle[1] as usize],
            edge_points[triangle[2] as usize],
        ];

        let mut normal = (corners[1].0 - corners[0].0).cross(corners[2].0 - corners[0].0);
        if normal.magnitude2() < DEGENERATE_AREA {
            continue;
        }
        // Wind every triangle so its normal faces increasing density.
        if normal.dot(outward) < 0.0 {
            corners.swap(1, 2);
            normal = -normal;
        }
        let normal = normal.normalize();

        for (point, material) in corners {
            vertices.push(Vertex::new(point.extend(1.0), normal, material));
        }
    }
}

/// Fraction along an edge where the density crosses zero.
fn crossing(v0: f32, v1: f32) -> f32 {
    let denominator = v0 - v1;
    if denominator == 0.0 {
        return 0.5;
    }
    (v0 / denominator).clamp(0.0, 1.0)
}

/// Direction of increasing density across one cube, from its corner differences.
fn density_gradient(values: &[f32; 8]) -> Vector3<f32> {
    let mut gradient = Vector3::zero();
    for (corner, offset) in CORNER_OFFSETS.iter().enumerate() {
        let sign = |step: usize| if step == 1 { 1.0 } else { -1.0 };
        gradient += Vector3::new(sign(offset[0]), sign(offset[1]), sign(offset[2])) * values[corner];
    }
    gradient
}
