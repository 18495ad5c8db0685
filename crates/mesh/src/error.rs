//! Error types for mesh processing.

use crate::streams::StreamKind;

/// Errors raised while building or reading mesh streams.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("Mesh {mesh} has no {kind} stream")]
    MissingStream { mesh: String, kind: &'static str },

    #[error("Index {index} does not fit a 16-bit index stream")]
    IndexOverflow { index: u32 },

    #[error("Stream {kind:?} has {len} bytes, not a multiple of its element size {elem_size}")]
    MisalignedStream {
        kind: StreamKind,
        len: usize,
        elem_size: u32,
    },
}
