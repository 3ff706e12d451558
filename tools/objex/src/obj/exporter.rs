//! Streaming OBJ/MTL writer.

use std::io::Write;

use hashbrown::HashSet;
use objex_shared::{render_queue, Material, MaterialId, Mesh};

use super::format::{self, flip_handedness, Fixed, ALPHA_DECIMALS};
use super::names::NameRegistry;
use crate::error::{ExportError, Result};

/// Serializer policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjOptions {
    /// Render queue treated as opaque. Materials on any other queue get a
    /// dissolve (`d`) line and `illum 4`.
    pub opaque_render_queue: i32,
}

impl Default for ObjOptions {
    fn default() -> Self {
        Self {
            opaque_render_queue: render_queue::OPAQUE,
        }
    }
}

/// Running totals for one export session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub meshes: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub materials: usize,
}

/// One-based offsets of the first record each mesh may reference.
#[derive(Debug, Clone, Copy)]
struct RecordBase {
    vertex: usize,
    uv: usize,
    normal: usize,
}

/// Writes meshes to an OBJ stream and their materials to an MTL stream.
///
/// Names, written materials and index offsets are tracked per exporter, so
/// one exporter corresponds to one pair of output files.
pub struct ObjExporter<M: Write, L: Write> {
    mesh_stream: M,
    material_stream: L,
    options: ObjOptions,
    names: NameRegistry,
    written_materials: HashSet<MaterialId>,
    vertex_total: usize,
    uv_total: usize,
    normal_total: usize,
    stats: ExportStats,
}

impl<M: Write, L: Write> ObjExporter<M, L> {
    /// Start a session. When `library_name` is given, the OBJ stream opens
    /// with `mtllib <library_name>.mtl`.
    pub fn new(mesh_stream: M, material_stream: L, library_name: Option<&str>) -> Result<Self> {
        Self::with_options(
            mesh_stream,
            material_stream,
            library_name,
            ObjOptions::default(),
        )
    }

    pub fn with_options(
        mut mesh_stream: M,
        material_stream: L,
        library_name: Option<&str>,
        options: ObjOptions,
    ) -> Result<Self> {
        if let Some(library) = library_name {
            writeln!(mesh_stream, "mtllib {library}.mtl")?;
        }

        Ok(Self {
            mesh_stream,
            material_stream,
            options,
            names: NameRegistry::new(),
            written_materials: HashSet::new(),
            vertex_total: 0,
            uv_total: 0,
            normal_total: 0,
            stats: ExportStats::default(),
        })
    }

    /// Append `mesh` as a group, binding submesh `i` to `materials[i]`.
    ///
    /// Submeshes without a matching material are bound to `Material_<i>`.
    /// The mesh is validated before anything is written.
    pub fn export_mesh(&mut self, mesh: &Mesh, materials: &[Material]) -> Result<()> {
        mesh.validate().map_err(|e| ExportError::mesh(&mesh.name, e))?;

        for material in materials {
            if self.written_materials.insert(material.id()) {
                self.write_material(material)?;
            }
        }

        let group = self.names.unique_name(mesh.id(), &mesh.name);
        writeln!(self.mesh_stream, "g {group}")?;

        for &v in &mesh.vertices {
            writeln!(self.mesh_stream, "v {}", format::vector(&flip_handedness(v)))?;
        }
        for &n in &mesh.normals {
            writeln!(self.mesh_stream, "vn {}", format::vector(&flip_handedness(n)))?;
        }
        for uv in &mesh.uvs {
            writeln!(self.mesh_stream, "vt {}", format::vector(uv))?;
        }

        let base = RecordBase {
            vertex: self.vertex_total + 1,
            uv: self.uv_total + 1,
            normal: self.normal_total + 1,
        };

        for (i, submesh) in mesh.submeshes.iter().enumerate() {
            let material_name = match materials.get(i) {
                Some(material) => self.names.unique_name(material.id(), &material.name),
                None => format!("Material_{i}"),
            };
            writeln!(self.mesh_stream, "usemtl {material_name}")?;

            for triangle in mesh.indices[submesh.index_range()].chunks_exact(3) {
                write_face(&mut self.mesh_stream, mesh, triangle, base)?;
            }
        }

        self.vertex_total += mesh.vertex_count();
        self.uv_total += mesh.uvs.len();
        self.normal_total += mesh.normals.len();

        self.stats.meshes += 1;
        self.stats.vertices += mesh.vertex_count();
        self.stats.triangles += mesh.triangle_count();

        tracing::debug!(
            "Wrote group '{}': {} vertices, {} triangles, {} submeshes",
            group,
            mesh.vertex_count(),
            mesh.triangle_count(),
            mesh.submesh_count()
        );
        Ok(())
    }

    pub fn stats(&self) -> ExportStats {
        self.stats
    }

    /// Names assigned so far in this session.
    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    /// Flush both streams and hand them back.
    pub fn finish(mut self) -> Result<(M, L)> {
        self.mesh_stream.flush()?;
        self.material_stream.flush()?;
        Ok((self.mesh_stream, self.material_stream))
    }

    fn write_material(&mut self, material: &Material) -> Result<()> {
        let name = self.names.unique_name(material.id(), &material.name);
        let color = material.surface_color().clamped();
        let w = &mut self.material_stream;

        writeln!(w, "newmtl {name}")?;
        writeln!(w, "ka {}", format::color(color))?;
        writeln!(w, "kd {}", format::color(color))?;

        if !material.is_opaque(self.options.opaque_render_queue) {
            writeln!(w, "d {}", Fixed::new(color.a, ALPHA_DECIMALS))?;
            writeln!(w, "illum 4")?;
        }
        writeln!(w)?;

        self.stats.materials += 1;
        Ok(())
    }
}

/// Write one `f` record, reversing the winding to match the X flip.
///
/// UV and normal fields are left blank when the mesh has no such attribute
/// for the referenced vertex.
fn write_face<W: Write>(w: &mut W, mesh: &Mesh, triangle: &[u32], base: RecordBase) -> Result<()> {
    w.write_all(b"f")?;
    for &index in triangle.iter().rev() {
        let i = index as usize;
        write!(w, " {}/", base.vertex + i)?;
        if i < mesh.uvs.len() {
            write!(w, "{}", base.uv + i)?;
        }
        w.write_all(b"/")?;
        if i < mesh.normals.len() {
            write!(w, "{}", base.normal + i)?;
        }
    }
    w.write_all(b"\n")?;
    Ok(())
}
