//! Abstract scene model for the boba exporter
//!
//! The document reader hands the exporter a [`Scene`]: flat lists of null
//! objects, meshes, lights, cameras, materials and splines with their
//! attributes already extracted. Everything downstream (welding, SDF
//! generation, serialization) works from this model only.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

mod error;
mod types;

pub use error::SceneError;
pub use types::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub animation: AnimationRange,
    pub null_objects: Vec<NullObject>,
    pub meshes: Vec<PolygonMesh>,
    pub lights: Vec<Light>,
    pub cameras: Vec<Camera>,
    pub materials: Vec<Material>,
    pub splines: Vec<Spline>,
}

impl Scene {
    /// Parse and validate a scene, adding the default material if missing.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let mut scene: Self = serde_json::from_str(json)?;
        scene.ensure_default_material();
        scene.validate()?;
        Ok(scene)
    }

    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let json = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = json.len(), "Loading scene");
        Self::from_json(&json)
    }

    /// Put the fallback material first unless the document already has one.
    pub fn ensure_default_material(&mut self) {
        if self.materials.iter().all(|m| m.id != DEFAULT_MATERIAL_ID) {
            self.materials.insert(0, Material::default_material());
        }
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectInfo> {
        self.null_objects
            .iter()
            .map(|o| &o.info)
            .chain(self.meshes.iter().map(|o| &o.info))
            .chain(self.lights.iter().map(|o| &o.info))
            .chain(self.cameras.iter().map(|o| &o.info))
            .chain(self.splines.iter().map(|o| &o.info))
    }

    pub fn find_material(&self, id: u32) -> Option<&Material> {
        self.materials.iter().find(|m| m.id == id)
    }

    /// Check object id uniqueness, parent/target references, track lengths
    /// against the animation range and mesh data.
    pub fn validate(&self) -> Result<(), SceneError> {
        let mut ids = HashSet::new();
        for info in self.objects() {
            if !ids.insert(info.id) {
                return Err(SceneError::DuplicateObjectId(info.id));
            }
        }

        for info in self.objects() {
            if let Some(parent) = info.parent.filter(|p| !ids.contains(p)) {
                return Err(SceneError::UnknownParent {
                    object: info.name.clone(),
                    parent,
                });
            }
        }

        let frames = self.animation.frame_count();
        for info in self.objects() {
            if let Some(track) = info.tracks.iter().find(|t| t.samples.len() != frames) {
                return Err(SceneError::TrackLength {
                    object: info.name.clone(),
                    track: track.name.clone(),
                    expected: frames,
                    actual: track.samples.len(),
                });
            }
        }

        for camera in &self.cameras {
            if let Some(target) = camera.target.filter(|t| !ids.contains(t)) {
                return Err(SceneError::UnknownTarget {
                    camera: camera.info.name.clone(),
                    target,
                });
            }
        }

        for mesh in &self.meshes {
            mesh.validate()?;
            for group in mesh.group_polygons_by_material() {
                if self.find_material(group.material_id).is_none() {
                    tracing::warn!(
                        mesh = %mesh.info.name,
                        material_id = group.material_id,
                        "Mesh references a material that isn't exported"
                    );
                }
            }
        }

        Ok(())
    }
}
