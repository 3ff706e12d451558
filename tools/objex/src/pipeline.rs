//! Model post-processing and file export.
//!
//! Ties the scene source, combiner and OBJ writer together: collected
//! models are moved into root-local space, optionally merged into one mesh,
//! given fresh normals and finally streamed to `<file_name>.obj/.mtl`.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glam::Mat4;
use objex_shared::fs::{sanitize_file_name, sanitize_folder_path};
use serde::Deserialize;

use crate::combine::MeshCombiner;
use crate::obj::{ExportStats, ObjExporter, ObjOptions};
use crate::scene::{ModelInfo, SceneSource, TargetSelection};
use crate::transform::{recalculate_normals, transform_mesh};

/// What happens to collected models before they are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Merge every model into a single mesh, one submesh per material.
    pub combine_meshes: bool,
    pub recalculate_normals: bool,
    /// Keep world-space placement instead of re-basing on the root node.
    pub apply_root_transform: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            combine_meshes: true,
            recalculate_normals: true,
            apply_root_transform: false,
        }
    }
}

impl ModelSettings {
    pub fn update_models(
        &self,
        models: Vec<ModelInfo>,
        root_world_to_local: Mat4,
        model_name: &str,
    ) -> Result<Vec<ModelInfo>> {
        let mut models = if self.apply_root_transform {
            models
        } else {
            models
                .into_iter()
                .map(|model| {
                    ModelInfo::new(
                        transform_mesh(&model.mesh, root_world_to_local),
                        model.materials,
                    )
                })
                .collect()
        };

        if self.combine_meshes && !models.is_empty() {
            let combined = {
                let mut combiner = MeshCombiner::new();
                for model in &models {
                    combiner
                        .insert(&model.mesh, &model.materials)
                        .with_context(|| format!("Failed to combine mesh '{}'", model.mesh.name))?;
                }
                let (mesh, materials) = combiner.combine(model_name);
                ModelInfo::new(mesh, materials)
            };
            models = vec![combined];
        }

        if self.recalculate_normals {
            for model in &mut models {
                recalculate_normals(&mut model.mesh);
            }
        }

        Ok(models)
    }
}

/// Output location. `folder` is relative to wherever the caller resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub file_name: String,
    pub folder: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            file_name: "ModelName".to_string(),
            folder: String::new(),
        }
    }
}

impl ExportSettings {
    pub fn new(file_name: &str, folder: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            folder: folder.to_string(),
        }
        .sanitized()
    }

    /// Strip characters that are invalid in file names and paths.
    pub fn sanitized(self) -> Self {
        Self {
            file_name: sanitize_file_name(&self.file_name),
            folder: sanitize_folder_path(&self.folder),
        }
    }

    pub fn folder_path(&self) -> PathBuf {
        PathBuf::from(&self.folder)
    }

    /// `<folder>/<file_name>.<ext>`; `ext` may be given with or without the dot.
    pub fn file_path(&self, ext: &str) -> PathBuf {
        let ext = ext.trim_start_matches('.');
        self.folder_path().join(format!("{}.{}", self.file_name, ext))
    }

    pub fn is_valid(&self) -> bool {
        !self.file_name.is_empty()
    }
}

/// Write `models` as `<file_name>.obj` plus `<file_name>.mtl`.
pub fn export_models(
    models: &[ModelInfo],
    settings: &ExportSettings,
    options: ObjOptions,
) -> Result<ExportStats> {
    if models.is_empty() {
        tracing::warn!("No models to export");
        return Ok(ExportStats::default());
    }
    if !settings.is_valid() {
        anyhow::bail!("Export file name is empty");
    }

    let folder = settings.folder_path();
    if !folder.as_os_str().is_empty() {
        std::fs::create_dir_all(&folder)
            .with_context(|| format!("Failed to create output folder: {:?}", folder))?;
    }

    let obj_path = settings.file_path("obj");
    let mtl_path = settings.file_path("mtl");
    let obj = File::create(&obj_path)
        .with_context(|| format!("Failed to create {:?}", obj_path))?;
    let mtl = File::create(&mtl_path)
        .with_context(|| format!("Failed to create {:?}", mtl_path))?;

    let mut exporter = ObjExporter::with_options(
        BufWriter::new(obj),
        BufWriter::new(mtl),
        Some(&settings.file_name),
        options,
    )?;
    for model in models {
        exporter
            .export_mesh(&model.mesh, &model.materials)
            .with_context(|| format!("Failed to export mesh '{}'", model.mesh.name))?;
    }

    let stats = exporter.stats();
    exporter.finish()?;

    tracing::info!(
        "Exported {} mesh(es), {} vertices, {} triangles, {} material(s) -> {:?}",
        stats.meshes,
        stats.vertices,
        stats.triangles,
        stats.materials,
        obj_path
    );

    Ok(stats)
}

/// A fully resolved export: source scene, selection, processing and output.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub source: PathBuf,
    pub root: Option<String>,
    pub targets: TargetSelection,
    pub model: ModelSettings,
    pub export: ExportSettings,
    pub options: ObjOptions,
}

impl ExportJob {
    /// A job with default settings writing next to `output`'s stem.
    pub fn for_output(source: &Path, output: &Path) -> Self {
        let file_name = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("ModelName");
        let folder = output
            .parent()
            .and_then(|p| p.to_str())
            .unwrap_or_default();

        Self {
            source: source.to_path_buf(),
            root: None,
            targets: TargetSelection::default(),
            model: ModelSettings::default(),
            export: ExportSettings::new(file_name, folder),
            options: ObjOptions::default(),
        }
    }

    pub fn run(&self) -> Result<ExportStats> {
        tracing::info!("Loading scene {:?}", self.source);
        let mut scene = SceneSource::load(&self.source)?;

        let root = self.root.as_deref();
        let models = scene.collect_models(root, self.targets)?;
        let root_world_to_local = scene.root_world_to_local(root)?;
        let models =
            self.model
                .update_models(models, root_world_to_local, &self.export.file_name)?;

        export_models(&models, &self.export, self.options)
    }
}
