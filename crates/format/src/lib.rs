//! Output formats for the boba exporter
//!
//! This crate provides:
//! - [`bits`] - Bit-granular writer/reader with varints and zigzag helpers
//! - [`deferred`] - Single-pass binary writer with fixups and deferred payloads
//! - [`protocol`] / [`save`] - The binary scene blob
//! - [`compress`] - Octahedral normals, snorm16 uvs and packed indices
//! - [`anim`] - Bit-packed animation tracks
//! - [`sidecar`] - JSON description plus flat data buffer

use std::path::{Path, PathBuf};

pub mod anim;
pub mod bits;
pub mod compress;
pub mod deferred;
pub mod error;
pub mod export;
pub mod protocol;
pub mod save;
pub mod sidecar;

pub use deferred::{DeferredWriter, FixupId};
pub use error::{FormatError, Result};
pub use export::{ExportMesh, ExportScene};
pub use save::{SceneStats, save_scene};
pub use sidecar::{ExportContext, SidecarFiles, save_sidecar};

/// Extension of the binary scene blob.
pub const BINARY_EXTENSION: &str = "boba";

/// `prefix` with `.extension` appended, keeping any dots already in it.
pub fn output_path(prefix: &Path, extension: &str) -> PathBuf {
    let mut path = prefix.as_os_str().to_owned();
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}
