//! Object identity, transforms and animation tracks.

use glam::{Affine3A, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Object id written when a reference (parent, camera target) is absent.
pub const INVALID_OBJECT_ID: u32 = !0;

/// Local or global transform of an object.
///
/// `rot` holds heading/pitch/bank euler angles in radians as authored in the
/// source document. `quat` is the same rotation, which is what the affine
/// conversion uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub pos: Vec3,
    pub rot: Vec3,
    pub quat: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        pos: Vec3::ZERO,
        rot: Vec3::ZERO,
        quat: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(pos: Vec3) -> Self {
        Self {
            pos,
            ..Self::IDENTITY
        }
    }

    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.quat, self.pos)
    }

    /// Columns `[x_axis, y_axis, z_axis, translation]` flattened to 12 floats.
    pub fn to_matrix_3x4(&self) -> [f32; 12] {
        self.to_affine().to_cols_array()
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.to_affine().transform_point3(point)
    }
}

/// One animated channel, sampled once per frame across the document range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub samples: Vec<f32>,
}

/// Document frame range that every track is sampled over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationRange {
    pub fps: u32,
    pub start_frame: i32,
    pub end_frame: i32,
}

impl Default for AnimationRange {
    fn default() -> Self {
        Self {
            fps: 30,
            start_frame: 0,
            end_frame: 0,
        }
    }
}

impl AnimationRange {
    /// Number of samples a full track carries (inclusive range).
    pub fn frame_count(&self) -> usize {
        (i64::from(self.end_frame) - i64::from(self.start_frame) + 1).max(0) as usize
    }
}

/// Fields shared by every exported object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub name: String,
    pub id: u32,
    #[serde(default)]
    pub parent: Option<u32>,
    #[serde(default)]
    pub local: Transform,
    #[serde(default)]
    pub global: Transform,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl ObjectInfo {
    pub fn new(name: impl Into<String>, id: u32) -> Self {
        Self {
            name: name.into(),
            id,
            parent: None,
            local: Transform::IDENTITY,
            global: Transform::IDENTITY,
            tracks: Vec::new(),
        }
    }

    /// Parent id as written to disk.
    pub fn parent_id(&self) -> u32 {
        self.parent.unwrap_or(INVALID_OBJECT_ID)
    }
}

/// Grouping node with no payload of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullObject {
    #[serde(flatten)]
    pub info: ObjectInfo,
}

/// Interpolation of a spline's control points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplineType {
    #[default]
    Linear = 0,
    Cubic = 1,
    Akima = 2,
    BSpline = 3,
    Bezier = 4,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spline {
    #[serde(flatten)]
    pub info: ObjectInfo,
    #[serde(default)]
    pub spline_type: SplineType,
    pub points: Vec<Vec3>,
    #[serde(default)]
    pub is_closed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_matrix_layout() {
        let m = Transform::IDENTITY.to_matrix_3x4();
        assert_eq!(
            m,
            [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_translation_in_last_column() {
        let xform = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let m = xform.to_matrix_3x4();
        assert_eq!(&m[9..], &[1.0, 2.0, 3.0]);
        assert_eq!(
            xform.transform_point(Vec3::ONE),
            Vec3::new(2.0, 3.0, 4.0)
        );
    }

    #[test]
    fn test_frame_count() {
        let range = AnimationRange {
            fps: 25,
            start_frame: 10,
            end_frame: 19,
        };
        assert_eq!(range.frame_count(), 10);
        assert_eq!(AnimationRange::default().frame_count(), 1);
    }

    #[test]
    fn test_missing_parent_is_invalid_id() {
        let info = ObjectInfo::new("root", 3);
        assert_eq!(info.parent_id(), INVALID_OBJECT_ID);
    }
}
