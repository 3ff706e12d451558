//! glTF scene source.
//!
//! Walks a glTF/GLB scene and produces one [`ModelInfo`] per node that
//! carries a mesh, in world space. glTF is right-handed, so geometry is
//! mirrored into the left-handed convention the exporter expects (its X
//! flip undoes this on the way out). Texture coordinates are moved from
//! glTF's top-left origin to the bottom-left origin OBJ uses.

use std::path::Path;

use anyhow::{bail, Context, Result};
use glam::Mat4;
use hashbrown::HashMap;
use objex_shared::{render_queue, Color, Material, Mesh};
use serde::Deserialize;

use crate::transform::transform_mesh;

/// A mesh together with the materials of its submeshes.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub mesh: Mesh,
    pub materials: Vec<Material>,
}

impl ModelInfo {
    pub fn new(mesh: Mesh, materials: Vec<Material>) -> Self {
        Self { mesh, materials }
    }
}

/// Which part of the hierarchy under the root node is exported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TargetSelection {
    /// The root and all of its descendants.
    #[default]
    All,
    /// Only the root node itself.
    RootOnly,
    /// Only the descendants of the root.
    ChildrenOnly,
}

impl TargetSelection {
    fn includes_root(self) -> bool {
        matches!(self, Self::All | Self::RootOnly)
    }

    fn includes_children(self) -> bool {
        matches!(self, Self::All | Self::ChildrenOnly)
    }
}

/// Mirror along X: right-handed <-> left-handed.
const MIRROR_X: Mat4 = Mat4::from_cols_array(&[
    -1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
]);

/// Loaded glTF document plus per-document material and mesh caches.
pub struct SceneSource {
    document: gltf::Document,
    buffers: Vec<gltf::buffer::Data>,
    /// Keyed by glTF material index; `None` is the glTF default material.
    materials: HashMap<Option<usize>, Material>,
    meshes: HashMap<usize, ModelInfo>,
}

impl SceneSource {
    pub fn load(path: &Path) -> Result<Self> {
        let (document, buffers, _images) =
            gltf::import(path).with_context(|| format!("Failed to load glTF: {:?}", path))?;

        Ok(Self {
            document,
            buffers,
            materials: HashMap::new(),
            meshes: HashMap::new(),
        })
    }

    fn scene(&self) -> Result<gltf::Scene<'_>> {
        self.document
            .default_scene()
            .or_else(|| self.document.scenes().next())
            .context("No scenes found in glTF")
    }

    /// World matrix of the node named `root` (glTF space).
    fn root_world(&self, root: &str) -> Result<(usize, Mat4)> {
        let scene = self.scene()?;
        find_node(scene.nodes(), Mat4::IDENTITY, root)
            .with_context(|| format!("Root node '{}' not found in scene", root))
    }

    /// Transform from world space into the root's local space, in the
    /// exporter's (left-handed) convention. Identity without a root.
    pub fn root_world_to_local(&self, root: Option<&str>) -> Result<Mat4> {
        match root {
            Some(name) => {
                let (_, world) = self.root_world(name)?;
                Ok(MIRROR_X * world.inverse() * MIRROR_X)
            }
            None => Ok(Mat4::IDENTITY),
        }
    }

    /// One world-space model per selected node with a mesh, in depth-first
    /// scene order.
    pub fn collect_models(
        &mut self,
        root: Option<&str>,
        targets: TargetSelection,
    ) -> Result<Vec<ModelInfo>> {
        let mut selected: Vec<(usize, Mat4)> = Vec::new();
        {
            let scene = self.scene()?;
            match root {
                Some(name) => {
                    let (index, world) = self.root_world(name)?;
                    let node = self
                        .document
                        .nodes()
                        .nth(index)
                        .context("Root node index out of range")?;
                    if targets.includes_root() {
                        push_mesh_node(&node, world, &mut selected);
                    }
                    if targets.includes_children() {
                        for child in node.children() {
                            walk(child, world, &mut selected);
                        }
                    }
                }
                None => {
                    if targets.includes_children() {
                        for node in scene.nodes() {
                            walk(node, Mat4::IDENTITY, &mut selected);
                        }
                    }
                }
            }
        }

        let mut models = Vec::with_capacity(selected.len());
        for (mesh_index, world) in selected {
            let source = self.read_mesh(mesh_index)?;
            let mut mesh = transform_mesh(&source.mesh, world);
            mirror_handedness(&mut mesh);
            models.push(ModelInfo::new(mesh, source.materials));
        }

        tracing::debug!("Collected {} model(s) from scene", models.len());
        Ok(models)
    }

    /// Convert glTF mesh `index` into a host mesh, one submesh per triangle
    /// primitive. Results are cached so instanced meshes are read once.
    fn read_mesh(&mut self, index: usize) -> Result<ModelInfo> {
        if let Some(cached) = self.meshes.get(&index) {
            return Ok(cached.clone());
        }

        let gltf_mesh = self
            .document
            .meshes()
            .nth(index)
            .with_context(|| format!("Mesh {} not found in glTF", index))?;
        let name = gltf_mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Mesh_{}", index));

        let buffers = &self.buffers;
        let mut mesh = Mesh::new(name);
        let mut ranges = Vec::new();
        let mut materials = Vec::new();
        let mut normals: Vec<(usize, Option<Vec<[f32; 3]>>)> = Vec::new();
        let mut uvs: Vec<(usize, Option<Vec<[f32; 2]>>)> = Vec::new();

        for primitive in gltf_mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                tracing::warn!(
                    "Skipping primitive {} of mesh '{}': mode {:?} is not a triangle list",
                    primitive.index(),
                    mesh.name,
                    primitive.mode()
                );
                continue;
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            // Positions (required)
            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .with_context(|| format!("No positions in mesh '{}'", mesh.name))?
                .collect();

            // Indices (optional) - non-indexed primitives draw vertices in order
            let indices: Vec<u32> = match reader.read_indices() {
                Some(iter) => iter.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
                bail!(
                    "Index {} in mesh '{}' exceeds vertex count {}",
                    bad,
                    mesh.name,
                    positions.len()
                );
            }

            let count = positions.len();
            normals.push((
                count,
                reader
                    .read_normals()
                    .map(|iter| iter.collect::<Vec<_>>())
                    .filter(|n| n.len() == count),
            ));
            uvs.push((
                count,
                reader
                    .read_tex_coords(0)
                    .map(|iter| iter.into_f32().map(flip_v).collect::<Vec<_>>())
                    .filter(|t| t.len() == count),
            ));

            let base = mesh.vertices.len() as u32;
            let start = mesh.indices.len();
            mesh.indices.extend(indices.iter().map(|&i| i + base));
            ranges.push((start, indices.len()));
            mesh.vertices.extend(positions);

            materials.push(material_for(&mut self.materials, primitive.material()));
        }

        mesh.normals = merge_attribute(&normals, [0.0; 3]);
        mesh.uvs = merge_attribute(&uvs, [0.0; 2]);
        mesh.set_submesh_ranges(&ranges);

        let model = ModelInfo::new(mesh, materials);
        self.meshes.insert(index, model.clone());
        Ok(model)
    }
}

/// Concatenate a per-primitive attribute, given each primitive's vertex
/// count. Empty when no primitive has it; primitives lacking it are
/// zero-filled when others do.
fn merge_attribute<T: Copy>(parts: &[(usize, Option<Vec<T>>)], fill: T) -> Vec<T> {
    if parts.iter().all(|(_, values)| values.is_none()) {
        return Vec::new();
    }

    let total = parts.iter().map(|(count, _)| count).sum();
    let mut merged = Vec::with_capacity(total);
    for (count, values) in parts {
        match values {
            Some(values) => merged.extend_from_slice(values),
            None => merged.extend(std::iter::repeat_n(fill, *count)),
        }
    }
    merged
}

fn material_for(cache: &mut HashMap<Option<usize>, Material>, material: gltf::Material<'_>) -> Material {
    cache
        .entry(material.index())
        .or_insert_with(|| convert_material(&material))
        .clone()
}

fn convert_material(material: &gltf::Material<'_>) -> Material {
    let name = match (material.name(), material.index()) {
        (Some(name), _) => name.to_string(),
        (None, Some(index)) => format!("Material_{}", index),
        (None, None) => "Default".to_string(),
    };
    let queue = match material.alpha_mode() {
        gltf::material::AlphaMode::Opaque => render_queue::OPAQUE,
        gltf::material::AlphaMode::Mask => render_queue::ALPHA_TEST,
        gltf::material::AlphaMode::Blend => render_queue::TRANSPARENT,
    };
    let color = Color::from_array(material.pbr_metallic_roughness().base_color_factor());

    Material::new(name).with_color(color).with_render_queue(queue)
}

fn local_matrix(node: &gltf::Node<'_>) -> Mat4 {
    Mat4::from_cols_array_2d(&node.transform().matrix())
}

fn push_mesh_node(node: &gltf::Node<'_>, world: Mat4, out: &mut Vec<(usize, Mat4)>) {
    if let Some(mesh) = node.mesh() {
        out.push((mesh.index(), world));
    }
}

fn walk(node: gltf::Node<'_>, parent: Mat4, out: &mut Vec<(usize, Mat4)>) {
    let world = parent * local_matrix(&node);
    push_mesh_node(&node, world, out);
    for child in node.children() {
        walk(child, world, out);
    }
}

/// Depth-first search for a node by name, returning its index and world matrix.
fn find_node<'a>(
    nodes: impl Iterator<Item = gltf::Node<'a>>,
    parent: Mat4,
    name: &str,
) -> Option<(usize, Mat4)> {
    for node in nodes {
        let world = parent * local_matrix(&node);
        if node.name() == Some(name) {
            return Some((node.index(), world));
        }
        if let Some(found) = find_node(node.children(), world, name) {
            return Some(found);
        }
    }
    None
}

/// glTF V runs down from the top of the image; OBJ V runs up.
fn flip_v(uv: [f32; 2]) -> [f32; 2] {
    [uv[0], 1.0 - uv[1]]
}

/// Mirror a mesh along X and reverse triangle winding so faces keep
/// pointing the same way.
fn mirror_handedness(mesh: &mut Mesh) {
    for v in &mut mesh.vertices {
        v[0] = -v[0];
    }
    for n in &mut mesh.normals {
        n[0] = -n[0];
    }
    for triangle in mesh.indices.chunks_exact_mut(3) {
        triangle.swap(1, 2);
    }
}
