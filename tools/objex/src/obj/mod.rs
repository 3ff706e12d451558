//! Wavefront OBJ/MTL serializer.
//!
//! Writes geometry to one stream (`.obj`) and material definitions to a
//! second stream (`.mtl`). Geometry is converted from the left-handed host
//! convention to OBJ's right-handed one by negating X, which also flips
//! triangle winding.

mod exporter;
mod format;
mod names;

pub use exporter::{ExportStats, ObjExporter, ObjOptions};
pub use format::{flip_handedness, Fixed, ALPHA_DECIMALS, COLOR_DECIMALS, VECTOR_DECIMALS};
pub use names::{NameKey, NameRegistry};
