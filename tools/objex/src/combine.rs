//! Merge meshes into one, grouping submeshes by material.
//!
//! Submeshes that share a material (by identity) end up in a single output
//! submesh. Submeshes without a material stay separate. Output order is
//! deterministic: materials in the order they were first seen, then the
//! unmaterialed submeshes in insertion order.

use hashbrown::HashMap;
use objex_shared::{Material, MaterialId, Mesh, MeshId};

use crate::buffer::GeometryBuffer;
use crate::error::{ExportError, Result};

/// Remap slot that has not been assigned yet.
const UNMAPPED: u32 = u32::MAX;

#[derive(Clone, Copy)]
struct SubMeshRef<'a> {
    mesh: &'a Mesh,
    submesh: usize,
}

struct Bucket<'a> {
    material: &'a Material,
    submeshes: Vec<SubMeshRef<'a>>,
}

/// Collects meshes and merges them into a single [`Mesh`].
#[derive(Default)]
pub struct MeshCombiner<'a> {
    /// Upper bound on the combined vertex count, used as a capacity hint.
    combined_vertex_count: usize,
    buckets: Vec<Bucket<'a>>,
    bucket_lookup: HashMap<MaterialId, usize>,
    unmaterialed: Vec<SubMeshRef<'a>>,
}

impl<'a> MeshCombiner<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `mesh` for combining.
    ///
    /// Submesh `i` is filed under `materials[i]`; submeshes past the end of
    /// `materials` are kept as standalone, unmaterialed submeshes. Extra
    /// materials are ignored.
    pub fn insert(&mut self, mesh: &'a Mesh, materials: &'a [Material]) -> Result<()> {
        mesh.validate().map_err(|e| ExportError::mesh(&mesh.name, e))?;

        let count = self.combined_vertex_count + mesh.vertex_count();
        if count > UNMAPPED as usize {
            return Err(ExportError::TooManyVertices { count });
        }

        for submesh in 0..mesh.submesh_count() {
            let entry = SubMeshRef { mesh, submesh };

            let Some(material) = materials.get(submesh) else {
                self.unmaterialed.push(entry);
                continue;
            };

            let slot = match self.bucket_lookup.get(&material.id()) {
                Some(&slot) => slot,
                None => {
                    let slot = self.buckets.len();
                    self.buckets.push(Bucket {
                        material,
                        submeshes: Vec::new(),
                    });
                    self.bucket_lookup.insert(material.id(), slot);
                    slot
                }
            };
            self.buckets[slot].submeshes.push(entry);
        }

        self.combined_vertex_count = count;
        Ok(())
    }

    /// Distinct materials in first-seen order.
    pub fn unique_materials(&self) -> Vec<Material> {
        self.buckets.iter().map(|b| b.material.clone()).collect()
    }

    pub fn combined_vertex_count(&self) -> usize {
        self.combined_vertex_count
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty() && self.unmaterialed.is_empty()
    }

    /// Merge everything inserted so far into a buffer.
    ///
    /// The buffer has one submesh per distinct material (matching the
    /// returned list index for index), followed by one per unmaterialed
    /// submesh.
    pub fn combine_into_buffer(&self) -> (GeometryBuffer, Vec<Material>) {
        let mut remap = RemapArena::with_capacity(self.combined_vertex_count);
        let mut buffer = GeometryBuffer::with_capacity(self.combined_vertex_count);

        for bucket in &self.buckets {
            let start = buffer.index_count();
            for submesh in &bucket.submeshes {
                write_submesh(*submesh, &mut remap, &mut buffer);
            }
            let count = buffer.index_count() - start;
            buffer.add_submesh(start, count);

            tracing::debug!(
                "Combined {} submesh(es) under material '{}' ({} indices)",
                bucket.submeshes.len(),
                bucket.material.name,
                count
            );
        }

        for submesh in &self.unmaterialed {
            let start = buffer.index_count();
            write_submesh(*submesh, &mut remap, &mut buffer);
            buffer.add_submesh(start, buffer.index_count() - start);
        }

        (buffer, self.unique_materials())
    }

    /// Merge everything inserted so far into a mesh named `name`.
    pub fn combine(&self, name: &str) -> (Mesh, Vec<Material>) {
        let (buffer, materials) = self.combine_into_buffer();
        let mesh = buffer.into_mesh(name);
        tracing::debug!(
            "Combined mesh '{}': {} vertices, {} submeshes, {} materials",
            name,
            mesh.vertex_count(),
            mesh.submesh_count(),
            materials.len()
        );
        (mesh, materials)
    }
}

/// Per-mesh vertex remap tables packed into one allocation.
///
/// Each source mesh gets a slice as long as its vertex list, holding the
/// index of that vertex in the output buffer or [`UNMAPPED`].
struct RemapArena {
    slots: Vec<u32>,
    bases: HashMap<MeshId, usize>,
}

impl RemapArena {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            bases: HashMap::new(),
        }
    }

    fn table(&mut self, mesh: &Mesh) -> &mut [u32] {
        let len = mesh.vertex_count();
        let base = match self.bases.get(&mesh.id()) {
            Some(&base) => base,
            None => {
                let base = self.slots.len();
                self.slots.resize(base + len, UNMAPPED);
                self.bases.insert(mesh.id(), base);
                base
            }
        };
        &mut self.slots[base..base + len]
    }
}

fn write_submesh(submesh: SubMeshRef<'_>, remap: &mut RemapArena, buffer: &mut GeometryBuffer) {
    let mesh = submesh.mesh;
    let desc = mesh.submeshes[submesh.submesh];
    let table = remap.table(mesh);

    // Vertices shared with an earlier submesh of the same mesh are reused.
    for v in desc.vertex_range() {
        if table[v] == UNMAPPED {
            let normal = mesh.normals.get(v).copied().unwrap_or([0.0; 3]);
            let uv = mesh.uvs.get(v).copied().unwrap_or([0.0; 2]);
            table[v] = buffer.append_vertex(mesh.vertices[v], normal, uv);
        }
    }

    // Validation guarantees every index lies inside the vertex span.
    for &index in &mesh.indices[desc.index_range()] {
        buffer.append_index(table[index as usize]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use objex_shared::Color;

    fn triangle(name: &str, offset: f32) -> Mesh {
        Mesh::from_triangles(
            name,
            vec![
                [offset, 0.0, 0.0],
                [offset + 1.0, 0.0, 0.0],
                [offset, 1.0, 0.0],
            ],
            vec![0, 1, 2],
        )
    }

    /// Quad split into two submeshes that share the diagonal vertices.
    fn split_quad() -> Mesh {
        let mut mesh = Mesh::new("Quad");
        mesh.vertices = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        mesh.normals = vec![[0.0, 0.0, 1.0]; 4];
        mesh.uvs = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        mesh.indices = vec![0, 1, 2, 2, 3, 0];
        mesh.set_submesh_ranges(&[(0, 3), (3, 3)]);
        mesh
    }

    #[test]
    fn test_shared_material_merges() {
        let a = triangle("A", 0.0);
        let b = triangle("B", 5.0);
        let shared = [Material::new("Stone")];

        let mut combiner = MeshCombiner::new();
        combiner.insert(&a, &shared).unwrap();
        combiner.insert(&b, &shared).unwrap();

        let (mesh, materials) = combiner.combine("Merged");
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].id(), shared[0].id());
        assert_eq!(mesh.submesh_count(), 1);
        assert_eq!(mesh.submeshes[0].index_count, 6);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.vertices[3], [5.0, 0.0, 0.0]);
    }

    #[test]
    fn test_same_name_different_identity_does_not_merge() {
        let a = triangle("A", 0.0);
        let b = triangle("B", 0.0);
        let first = [Material::new("Stone")];
        let second = [Material::new("Stone")];

        let mut combiner = MeshCombiner::new();
        combiner.insert(&a, &first).unwrap();
        combiner.insert(&b, &second).unwrap();

        let (mesh, materials) = combiner.combine("Merged");
        assert_eq!(materials.len(), 2);
        assert_eq!(mesh.submesh_count(), 2);
    }

    #[test]
    fn test_first_seen_material_order() {
        let red = Material::new("Red").with_color(Color::rgb(1.0, 0.0, 0.0));
        let blue = Material::new("Blue").with_color(Color::rgb(0.0, 0.0, 1.0));

        let mut quad = split_quad();
        quad.name = "Two".into();
        let quad_materials = [blue.clone(), red.clone()];
        let tri = triangle("One", 3.0);
        let tri_materials = [red.clone()];

        let mut combiner = MeshCombiner::new();
        combiner.insert(&quad, &quad_materials).unwrap();
        combiner.insert(&tri, &tri_materials).unwrap();

        let (mesh, materials) = combiner.combine("Merged");
        let names: Vec<&str> = materials.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Blue", "Red"]);
        assert_eq!(mesh.submesh_count(), 2);
        assert_eq!(mesh.submeshes[0].index_count, 3);
        assert_eq!(mesh.submeshes[1].index_count, 6);
    }

    #[test]
    fn test_unmaterialed_submeshes_stay_separate() {
        let a = triangle("A", 0.0);
        let b = triangle("B", 2.0);
        let c = triangle("C", 4.0);
        let stone = [Material::new("Stone")];
        let none: Vec<Material> = Vec::new();

        let mut combiner = MeshCombiner::new();
        combiner.insert(&a, &none).unwrap();
        combiner.insert(&b, &stone).unwrap();
        combiner.insert(&c, &none).unwrap();

        let (mesh, materials) = combiner.combine("Merged");
        assert_eq!(materials.len(), 1);
        assert_eq!(mesh.submesh_count(), 3);

        // material buckets first, then unmaterialed in insertion order
        let first_x = |s: usize| {
            let i = mesh.indices[mesh.submeshes[s].index_start] as usize;
            mesh.vertices[i][0]
        };
        assert_eq!(first_x(0), 2.0);
        assert_eq!(first_x(1), 0.0);
        assert_eq!(first_x(2), 4.0);
    }

    #[test]
    fn test_extra_materials_ignored() {
        let a = triangle("A", 0.0);
        let materials = [Material::new("Used"), Material::new("Unused")];

        let mut combiner = MeshCombiner::new();
        combiner.insert(&a, &materials).unwrap();
        let (mesh, unique) = combiner.combine("Merged");
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].name, "Used");
        assert_eq!(mesh.submesh_count(), 1);
    }

    #[test]
    fn test_shared_vertices_not_duplicated() {
        let quad = split_quad();
        let materials = [Material::new("Top"), Material::new("Bottom")];

        let mut combiner = MeshCombiner::new();
        combiner.insert(&quad, &materials).unwrap();
        let (mesh, _) = combiner.combine("Merged");

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 2, 3, 0]);
        assert_eq!(mesh.uvs[3], [0.0, 1.0]);
    }

    #[test]
    fn test_missing_attributes_default_to_zero() {
        let a = triangle("NoAttributes", 0.0);
        let none: Vec<Material> = Vec::new();
        let mut combiner = MeshCombiner::new();
        combiner.insert(&a, &none).unwrap();
        let (mesh, _) = combiner.combine("Merged");

        assert_eq!(mesh.normals, vec![[0.0; 3]; 3]);
        assert_eq!(mesh.uvs, vec![[0.0; 2]; 3]);
    }

    #[test]
    fn test_single_mesh_preserves_counts() {
        let quad = split_quad();
        let material = [Material::new("Only")];
        let mut combiner = MeshCombiner::new();
        combiner.insert(&quad, &material).unwrap();
        let (mesh, _) = combiner.combine("Merged");

        assert_eq!(mesh.vertex_count(), quad.vertex_count());
        assert_eq!(mesh.triangle_count(), quad.triangle_count());
        assert_eq!(mesh.vertices, quad.vertices);
        assert_eq!(mesh.normals, quad.normals);
    }

    #[test]
    fn test_vertex_count_hint() {
        let a = triangle("A", 0.0);
        let quad = split_quad();
        let none: Vec<Material> = Vec::new();
        let mut combiner = MeshCombiner::new();
        assert!(combiner.is_empty());
        combiner.insert(&a, &none).unwrap();
        combiner.insert(&quad, &none).unwrap();
        assert_eq!(combiner.combined_vertex_count(), 7);
        assert!(!combiner.is_empty());
    }

    #[test]
    fn test_rejects_malformed_mesh() {
        let mut bad = triangle("Bad", 0.0);
        bad.submeshes[0].index_count = 6;
        let none: Vec<Material> = Vec::new();

        let mut combiner = MeshCombiner::new();
        let err = combiner.insert(&bad, &none).unwrap_err();
        assert!(matches!(err, ExportError::Mesh { .. }));
        assert!(combiner.is_empty());
    }

    #[test]
    fn test_combine_is_repeatable() {
        let a = triangle("A", 0.0);
        let material = [Material::new("M")];
        let mut combiner = MeshCombiner::new();
        combiner.insert(&a, &material).unwrap();

        let (first, _) = combiner.combine("One");
        let (second, _) = combiner.combine("Two");
        assert_eq!(first.indices, second.indices);
        assert_ne!(first.id(), second.id());
    }
}
