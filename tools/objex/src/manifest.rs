//! objex.toml parsing and build orchestration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use objex_shared::render_queue;

use crate::obj::{ExportStats, ObjOptions};
use crate::pipeline::{ExportJob, ExportSettings, ModelSettings};
use crate::scene::TargetSelection;

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub source: SourceSection,
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub material: MaterialSection,
}

/// Scene to read and which nodes of it to export
#[derive(Debug, Deserialize)]
pub struct SourceSection {
    /// glTF/GLB file, relative to the manifest
    pub path: PathBuf,
    /// Node whose space the export is expressed in
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub targets: TargetSelection,
}

#[derive(Debug, Deserialize)]
pub struct MaterialSection {
    #[serde(default = "default_opaque_render_queue")]
    pub opaque_render_queue: i32,
}

impl Default for MaterialSection {
    fn default() -> Self {
        Self {
            opaque_render_queue: default_opaque_render_queue(),
        }
    }
}

fn default_opaque_render_queue() -> i32 {
    render_queue::OPAQUE
}

impl Manifest {
    /// Parse manifest from string
    pub fn parse(content: &str) -> Result<Self> {
        let mut manifest: Manifest = toml::from_str(content).context("Failed to parse objex.toml")?;
        manifest.export = manifest.export.sanitized();
        Ok(manifest)
    }

    /// Resolve relative paths against `base_dir` into a runnable job.
    /// `output_override` replaces the `[export] folder`.
    pub fn to_job(&self, base_dir: &Path, output_override: Option<&Path>) -> ExportJob {
        let folder = match output_override {
            Some(dir) => dir.to_path_buf(),
            None => base_dir.join(&self.export.folder),
        };

        ExportJob {
            source: base_dir.join(&self.source.path),
            root: self.source.root.clone(),
            targets: self.source.targets,
            model: self.model,
            export: ExportSettings {
                file_name: self.export.file_name.clone(),
                folder: folder.to_string_lossy().into_owned(),
            },
            options: ObjOptions {
                opaque_render_queue: self.material.opaque_render_queue,
            },
        }
    }
}

/// Directory relative paths in a manifest are resolved against
pub fn base_dir(manifest_path: &Path) -> &Path {
    manifest_path.parent().unwrap_or(Path::new("."))
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    Manifest::parse(&content).with_context(|| format!("Failed to parse manifest: {:?}", path))
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest, base_dir: &Path) -> Result<()> {
    let source = base_dir.join(&manifest.source.path);
    if !source.exists() {
        anyhow::bail!("Source scene not found: {:?}", source);
    }

    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    if !matches!(ext.as_str(), "gltf" | "glb") {
        anyhow::bail!("Unsupported scene format: {:?} (use .gltf or .glb)", source);
    }

    if !manifest.export.is_valid() {
        anyhow::bail!("Invalid [export] file_name: nothing left after removing illegal characters");
    }

    if manifest.model.apply_root_transform && manifest.source.root.is_none() {
        tracing::warn!("apply_root_transform has no effect without [source] root");
    }

    Ok(())
}

/// Validate and run a manifest
pub fn build(
    manifest: &Manifest,
    base_dir: &Path,
    output_override: Option<&Path>,
) -> Result<ExportStats> {
    validate(manifest, base_dir)?;
    let job = manifest.to_job(base_dir, output_override);
    tracing::info!(
        "Exporting {:?} -> {:?}",
        job.source,
        job.export.file_path("obj")
    );
    job.run()
}
