//! Error types for writing boba output files.

use mesh::MeshError;

/// Errors raised while serializing a scene.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fixup {id} at offset {ref_pos} was created but never inserted")]
    UnresolvedFixup { id: usize, ref_pos: u32 },

    #[error("Unknown fixup {0}")]
    UnknownFixup(usize),

    #[error("Fixup {0} was inserted twice")]
    FixupAlreadyInserted(usize),

    #[error("Block marker ended without a matching start")]
    UnbalancedBlockMarker,

    #[error("{0} block marker(s) still open when the file was closed")]
    OpenBlockMarkers(usize),

    #[error("Offset {0} does not fit a 32-bit pointer")]
    OffsetOverflow(u64),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

pub type Result<T> = std::result::Result<T, FormatError>;
