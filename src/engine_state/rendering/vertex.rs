//! Vertex format shared by the mesher and the render backend.

use cgmath::{Vector3, Vector4};

use crate::engine_state::voxels::voxel::Material;

/// One corner of a terrain triangle.
///
/// # Memory Layout
/// - Position: 4x f32 (16 bytes). Flat meshes store `(x, y, z, 1)` in world space;
///   spherical meshes store the embedded point on the unit sphere
/// - Normal: 3x f32 (12 bytes), the flat normal of the triangle
/// - Material: u32 (4 bytes)
///
/// Total size: 32 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 4],
    pub normal: [f32; 3],
    pub material: u32,
}

/// Scalar type of one vertex attribute.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AttributeFormat {
    Float32x4,
    Float32x3,
    Uint32,
}

/// Byte offset, shader location and format of one vertex attribute.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub offset: usize,
    pub shader_location: u32,
    pub format: AttributeFormat,
}

impl Vertex {
    pub fn new(position: Vector4<f32>, normal: Vector3<f32>, material: Material) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            material: material.index(),
        }
    }

    pub fn position(&self) -> Vector4<f32> {
        self.position.into()
    }

    pub fn normal(&self) -> Vector3<f32> {
        self.normal.into()
    }

    /// Describes the layout for backends that build a vertex pipeline.
    ///
    /// # Shader Attributes
    /// - `location = 0`: position (vec4<f32>)
    /// - `location = 1`: normal (vec3<f32>)
    /// - `location = 2`: material (u32)
    pub fn attributes() -> [VertexAttribute; 3] {
        [
            VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: AttributeFormat::Float32x4,
            },
            VertexAttribute {
                offset: std::mem::size_of::<[f32; 4]>(),
                shader_location: 1,
                format: AttributeFormat::Float32x3,
            },
            VertexAttribute {
                offset: std::mem::size_of::<[f32; 7]>(),
                shader_location: 2,
                format: AttributeFormat::Uint32,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_attribute_offsets() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        let vertex = Vertex::new(
            Vector4::new(1.0, 2.0, 3.0, 1.0),
            Vector3::new(0.0, 1.0, 0.0),
            Material::Grass,
        );
        let bytes = bytemuck::bytes_of(&vertex);
        let [_, normal, material] = Vertex::attributes();
        let y_normal: f32 = bytemuck::pod_read_unaligned(&bytes[normal.offset + 4..normal.offset + 8]);
        let index: u32 = bytemuck::pod_read_unaligned(&bytes[material.offset..material.offset + 4]);
        assert_eq!(y_normal, 1.0);
        assert_eq!(index, Material::Grass.index());
    }
}
