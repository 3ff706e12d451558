//! Growable geometry container used to assemble combined meshes.

use objex_shared::{Mesh, SubMeshDescriptor};

/// Append-only vertex/index storage.
///
/// Positions, normals and UVs are kept strictly parallel: every appended
/// vertex gets an entry in all three lists.
#[derive(Debug, Default)]
pub struct GeometryBuffer {
    vertices: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
    submeshes: Vec<(usize, usize)>,
}

impl GeometryBuffer {
    /// Preallocate for roughly `capacity` vertices (and three times as many
    /// indices). The buffer still grows past the hint.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            normals: Vec::with_capacity(capacity),
            uvs: Vec::with_capacity(capacity),
            indices: Vec::with_capacity(capacity * 3),
            submeshes: Vec::with_capacity(capacity),
        }
    }

    /// Append one vertex and return its index.
    pub fn append_vertex(&mut self, position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        self.normals.push(normal);
        self.uvs.push(uv);
        index
    }

    pub fn append_indices(&mut self, indices: &[u32]) {
        self.indices.extend_from_slice(indices);
    }

    pub fn append_index(&mut self, index: u32) {
        self.indices.push(index);
    }

    /// Record a submesh over `indices[start..start + count]`.
    pub fn add_submesh(&mut self, start: usize, count: usize) {
        self.submeshes.push((start, count));
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    /// Materialise into a [`Mesh`] named `name`.
    pub fn into_mesh(self, name: &str) -> Mesh {
        let submeshes = self
            .submeshes
            .iter()
            .map(|&(start, count)| SubMeshDescriptor::from_indices(&self.indices, start, count))
            .collect();

        let mut mesh = Mesh::new(name);
        mesh.vertices = self.vertices;
        mesh.normals = self.normals;
        mesh.uvs = self.uvs;
        mesh.indices = self.indices;
        mesh.submeshes = submeshes;
        mesh
    }
}
