//! Triangle mesh with material submeshes.

use crate::ids::MeshId;

/// A contiguous range of a mesh's index list drawn with one material.
///
/// The vertex span is the range of vertices the indices refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubMeshDescriptor {
    pub index_start: usize,
    pub index_count: usize,
    pub first_vertex: usize,
    pub vertex_count: usize,
}

impl SubMeshDescriptor {
    /// Describe `indices[start..start + count]`, deriving the vertex span
    /// from the smallest and largest referenced index.
    ///
    /// Panics if the range is outside `indices`.
    pub fn from_indices(indices: &[u32], start: usize, count: usize) -> Self {
        let range = &indices[start..start + count];
        let (first_vertex, vertex_count) = match (range.iter().min(), range.iter().max()) {
            (Some(&lo), Some(&hi)) => (lo as usize, (hi - lo) as usize + 1),
            _ => (0, 0),
        };
        Self {
            index_start: start,
            index_count: count,
            first_vertex,
            vertex_count,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.index_count / 3
    }

    pub fn index_range(&self) -> std::ops::Range<usize> {
        self.index_start..self.index_start + self.index_count
    }

    pub fn vertex_range(&self) -> std::ops::Range<usize> {
        self.first_vertex..self.first_vertex + self.vertex_count
    }
}

/// Contract violations in mesh data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("submesh {submesh}: index range {start}..{end} exceeds index count {len}")]
    IndexRangeOutOfBounds {
        submesh: usize,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("submesh {submesh}: vertex span {start}..{end} exceeds vertex count {len}")]
    VertexSpanOutOfBounds {
        submesh: usize,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("submesh {submesh}: index {index} at position {position} is outside vertex span {start}..{end}")]
    IndexOutsideSpan {
        submesh: usize,
        position: usize,
        index: u32,
        start: usize,
        end: usize,
    },

    #[error("submesh {submesh}: index count {count} is not a multiple of 3")]
    NotTriangles { submesh: usize, count: usize },
}

/// Indexed triangle mesh.
///
/// `normals` and `uvs` run parallel to `vertices`; either may be shorter
/// (usually empty) when the mesh lacks that attribute. Cloning keeps the
/// handle; use [`Mesh::duplicate`] for a distinct instance.
#[derive(Debug, Clone)]
pub struct Mesh {
    id: MeshId,
    pub name: String,
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubMeshDescriptor>,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: MeshId::next(),
            name: name.into(),
            vertices: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
            submeshes: Vec::new(),
        }
    }

    /// Mesh with a single submesh covering every index.
    pub fn from_triangles(
        name: impl Into<String>,
        vertices: Vec<[f32; 3]>,
        indices: Vec<u32>,
    ) -> Self {
        let mut mesh = Self::new(name);
        mesh.vertices = vertices;
        let count = indices.len();
        mesh.indices = indices;
        mesh.set_submesh_ranges(&[(0, count)]);
        mesh
    }

    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = normals;
        self
    }

    pub fn with_uvs(mut self, uvs: Vec<[f32; 2]>) -> Self {
        self.uvs = uvs;
        self
    }

    /// Replace the submeshes with `(index_start, index_count)` ranges,
    /// deriving each vertex span from the index data.
    ///
    /// Panics if a range is outside the index list.
    pub fn set_submesh_ranges(&mut self, ranges: &[(usize, usize)]) {
        self.submeshes = ranges
            .iter()
            .map(|&(start, count)| SubMeshDescriptor::from_indices(&self.indices, start, count))
            .collect();
    }

    /// Same data under a fresh handle.
    pub fn duplicate(&self) -> Self {
        Self {
            id: MeshId::next(),
            ..self.clone()
        }
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(SubMeshDescriptor::triangle_count).sum()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    /// Check every submesh against the index and vertex lists.
    pub fn validate(&self) -> Result<(), MeshError> {
        for (submesh, desc) in self.submeshes.iter().enumerate() {
            let range = desc.index_range();
            if range.end > self.indices.len() {
                return Err(MeshError::IndexRangeOutOfBounds {
                    submesh,
                    start: range.start,
                    end: range.end,
                    len: self.indices.len(),
                });
            }
            if desc.index_count % 3 != 0 {
                return Err(MeshError::NotTriangles {
                    submesh,
                    count: desc.index_count,
                });
            }

            let span = desc.vertex_range();
            if span.end > self.vertices.len() {
                return Err(MeshError::VertexSpanOutOfBounds {
                    submesh,
                    start: span.start,
                    end: span.end,
                    len: self.vertices.len(),
                });
            }

            if let Some((offset, &index)) = self.indices[range.clone()]
                .iter()
                .enumerate()
                .find(|&(_, &i)| !span.contains(&(i as usize)))
            {
                return Err(MeshError::IndexOutsideSpan {
                    submesh,
                    position: range.start + offset,
                    index,
                    start: span.start,
                    end: span.end,
                });
            }
        }
        Ok(())
    }
}
