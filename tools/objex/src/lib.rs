//! objex library
//!
//! Combines meshes by material and writes them as Wavefront OBJ/MTL.
//! The core ([`combine`], [`obj`]) works on the host model from
//! `objex-shared`; [`scene`], [`pipeline`] and [`manifest`] drive it from a
//! glTF scene on disk.

pub mod buffer;
pub mod combine;
pub mod error;
pub mod manifest;
pub mod obj;
pub mod pipeline;
pub mod scene;
pub mod transform;

// Re-export the host model so callers need only this crate
pub use objex_shared::{
    render_queue, Color, Material, MaterialId, Mesh, MeshError, MeshId, SubMeshDescriptor,
};

pub use buffer::GeometryBuffer;
pub use combine::MeshCombiner;
pub use error::ExportError;
pub use obj::{ExportStats, ObjExporter, ObjOptions};
pub use pipeline::{export_models, ExportJob, ExportSettings, ModelSettings};
pub use scene::{ModelInfo, SceneSource, TargetSelection};
