use std::collections::HashMap;
use std::sync::Arc;

use cgmath::Point3;
use log::trace;

use super::Vertex;

/// A change to the main thread's render state, produced by a task result.
#[derive(Debug, Clone)]
pub enum RenderCommand {
    /// Replace the mesh drawn for the chunk at `position`.
    UploadMesh {
        position: Point3<i32>,
        vertices: Arc<Vec<Vertex>>,
    },
    /// Stop drawing the chunk at `position`.
    ReleaseMesh { position: Point3<i32> },
}

/// Meshes currently drawn, keyed by chunk position.
///
/// Owned by the main thread. An upload swaps the whole `Arc`, so the mesh a frame
/// draws is never partially updated.
#[derive(Default)]
pub struct RenderResources {
    meshes: HashMap<Point3<i32>, Arc<Vec<Vertex>>>,
}

impl RenderResources {
    pub fn new() -> Self {
        Self {
            meshes: HashMap::new(),
        }
    }

    pub fn apply(&mut self, command: RenderCommand) {
        match command {
            RenderCommand::UploadMesh { position, vertices } => {
                trace!("upload mesh {:?}: {} vertices", position, vertices.len());
                if vertices.is_empty() {
                    self.meshes.remove(&position);
                } else {
                    self.meshes.insert(position, vertices);
                }
            }
            RenderCommand::ReleaseMesh { position } => {
                if self.meshes.remove(&position).is_some() {
                    trace!("released mesh {:?}", position);
                }
            }
        }
    }

    pub fn mesh(&self, position: Point3<i32>) -> Option<&Arc<Vec<Vertex>>> {
        self.meshes.get(&position)
    }

    /// Every drawable mesh, in no particular order.
    pub fn meshes(&self) -> impl Iterator<Item = (Point3<i32>, &Arc<Vec<Vertex>>)> {
        self.meshes.iter().map(|(position, mesh)| (*position, mesh))
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.values().map(|mesh| mesh.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Vector3, Vector4};

    use super::*;
    use crate::engine_state::voxels::voxel::Material;

    fn triangle() -> Arc<Vec<Vertex>> {
        let vertex = Vertex::new(
            Vector4::new(0.0, 0.0, 0.0, 1.0),
            Vector3::new(0.0, 1.0, 0.0),
            Material::Grass,
        );
        Arc::new(vec![vertex; 3])
    }

    #[test]
    fn upload_replaces_and_release_removes() {
        let mut resources = RenderResources::new();
        let position = Point3::new(1, 0, 0);
        resources.apply(RenderCommand::UploadMesh {
            position,
            vertices: triangle(),
        });
        let newer = triangle();
        resources.apply(RenderCommand::UploadMesh {
            position,
            vertices: newer.clone(),
        });

        assert_eq!(resources.len(), 1);
        assert!(Arc::ptr_eq(resources.mesh(position).unwrap(), &newer));

        resources.apply(RenderCommand::ReleaseMesh { position });
        assert!(resources.is_empty());
    }

    #[test]
    fn empty_upload_is_not_drawn() {
        let mut resources = RenderResources::new();
        let position = Point3::new(0, 0, 0);
        resources.apply(RenderCommand::UploadMesh {
            position,
            vertices: triangle(),
        });
        resources.apply(RenderCommand::UploadMesh {
            position,
            vertices: Arc::new(Vec::new()),
        });
        assert!(resources.mesh(position).is_none());
        assert_eq!(resources.vertex_count(), 0);
    }
}
