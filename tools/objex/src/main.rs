//! objex - mesh combiner and Wavefront OBJ/MTL exporter
//!
//! Reads a glTF/GLB scene, optionally merges its meshes by material and
//! writes `<name>.obj` + `<name>.mtl`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use objex::{manifest, ExportJob, TargetSelection};

#[derive(Parser)]
#[command(name = "objex")]
#[command(about = "Mesh combiner and OBJ/MTL exporter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a model from a manifest file
    Build {
        /// Path to objex.toml manifest
        #[arg(default_value = "objex.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate manifest without exporting
    Check {
        /// Path to objex.toml manifest
        #[arg(default_value = "objex.toml")]
        manifest: PathBuf,
    },

    /// Convert a single glTF/GLB scene
    Convert {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Output .obj file (the .mtl is written next to it)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Name of the root node
        #[arg(long)]
        root: Option<String>,

        /// Which nodes under the root to export
        #[arg(long, value_enum, default_value_t = TargetSelection::All)]
        targets: TargetSelection,

        /// Keep one group per mesh instead of merging by material
        #[arg(long)]
        no_combine: bool,

        /// Keep source normals instead of recalculating them
        #[arg(long)]
        keep_normals: bool,

        /// Keep world-space placement instead of re-basing on the root
        #[arg(long)]
        apply_root_transform: bool,

        /// Render queue treated as opaque
        #[arg(long)]
        opaque_queue: Option<i32>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            manifest,
            output,
            verbose,
        } => {
            if verbose {
                tracing::info!("Building model from {:?}", manifest);
            }
            let config = manifest::load_manifest(&manifest)?;
            manifest::build(&config, manifest::base_dir(&manifest), output.as_deref())?;
            tracing::info!("Build complete!");
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config, manifest::base_dir(&manifest))?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Convert {
            input,
            output,
            root,
            targets,
            no_combine,
            keep_normals,
            apply_root_transform,
            opaque_queue,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("obj"));
            tracing::info!("Converting {:?} -> {:?}", input, output);

            let ext = input
                .extension()
                .and_then(|e| e.to_str())
                .map(|s| s.to_lowercase())
                .unwrap_or_default();
            if !matches!(ext.as_str(), "gltf" | "glb") {
                anyhow::bail!("Unsupported scene format: {:?} (use .gltf or .glb)", input);
            }

            let mut job = ExportJob::for_output(&input, &output);
            job.root = root;
            job.targets = targets;
            job.model.combine_meshes = !no_combine;
            job.model.recalculate_normals = !keep_normals;
            job.model.apply_root_transform = apply_root_transform;
            if let Some(queue) = opaque_queue {
                job.options.opaque_render_queue = queue;
            }

            if !job.export.is_valid() {
                anyhow::bail!("Invalid output file name: {:?}", output);
            }
            job.run()?;
            tracing::info!("Done!");
        }
    }

    Ok(())
}
