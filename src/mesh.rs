//! Output vertex and index buffers.

use glam::Vec3;

pub type MeshVertexId = u32;
pub const NULL_MESH_VERTEX_ID: MeshVertexId = MeshVertexId::MAX;

/// Mesh output of one generation run.
///
/// `positions` and `normals` are parallel; insertion order is the output
/// vertex index. We don't use `Vec3A` here because it's 16-byte-aligned.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub triangles: Vec<[MeshVertexId; 3]>,
}

impl MeshBuffers {
    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.triangles.clear();
    }

    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub(crate) fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> MeshVertexId {
        let id = self.positions.len() as MeshVertexId;
        self.positions.push(position);
        self.normals.push(normal);
        id
    }

    pub(crate) fn push_triangle(&mut self, triangle: [MeshVertexId; 3]) {
        self.triangles.push(triangle);
    }
}
