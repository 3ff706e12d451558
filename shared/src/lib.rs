//! Shared data model for objex.
//!
//! Meshes and materials are the "host" representation the exporter reads
//! from and the combiner writes back into. Both carry an opaque handle so
//! that identity (not value equality) decides deduplication and naming.

pub mod fs;
pub mod ids;
pub mod material;
pub mod mesh;

pub use ids::{MaterialId, MeshId};
pub use material::{render_queue, Color, Material};
pub use mesh::{Mesh, MeshError, SubMeshDescriptor};
