//! Error types for scene loading.

use std::path::PathBuf;

/// Errors that can occur while loading or validating a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("Failed to read scene {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scene: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Object id {0} is used more than once")]
    DuplicateObjectId(u32),

    #[error("Object {object} references unknown parent {parent}")]
    UnknownParent { object: String, parent: u32 },

    #[error("Object {object}: track {track} has {actual} samples, expected {expected}")]
    TrackLength {
        object: String,
        track: String,
        expected: usize,
        actual: usize,
    },

    #[error("Camera {camera} references unknown target {target}")]
    UnknownTarget { camera: String, target: u32 },

    #[error("Mesh {mesh}: polygon {polygon} references point {index} out of range")]
    PolygonIndexOutOfRange {
        mesh: String,
        polygon: usize,
        index: u32,
    },

    #[error("Mesh {mesh}: {attribute} has {actual} entries, expected {expected}")]
    AttributeCountMismatch {
        mesh: String,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
}
