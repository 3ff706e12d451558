//! Errors raised by the combiner and the OBJ serializer.

use objex_shared::MeshError;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("malformed mesh '{name}': {source}")]
    Mesh {
        name: String,
        #[source]
        source: MeshError,
    },

    #[error("combined mesh would have {count} vertices, more than u32 indices can address")]
    TooManyVertices { count: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub(crate) fn mesh(name: &str, source: MeshError) -> Self {
        Self::Mesh {
            name: name.to_string(),
            source,
        }
    }
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;
