//! Lights and cameras.

use serde::{Deserialize, Serialize};

use super::ObjectInfo;

/// Default near clipping plane for cameras that don't author one.
pub const DEFAULT_NEAR_PLANE: f32 = 1.0;

/// Default far clipping plane for cameras that don't author one.
pub const DEFAULT_FAR_PLANE: f32 = 1000.0;

/// Shape of an area light's emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaShape {
    Disc,
    #[default]
    Rectangle,
    Sphere,
    Cylinder,
    Cube,
    Hemisphere,
    Line,
}

/// Type of light source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    Omni,
    Spot,
    Distant,
    Area { shape: AreaShape },
}

impl LightKind {
    /// Numeric type written to the binary light record.
    pub fn type_id(self) -> u32 {
        match self {
            Self::Omni => 0,
            Self::Spot => 1,
            Self::Distant => 2,
            Self::Area { .. } => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Falloff {
    #[default]
    None = 0,
    Linear = 1,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    #[serde(flatten)]
    pub info: ObjectInfo,
    pub kind: LightKind,
    /// Linear RGB (0.0-1.0)
    pub color: [f32; 3],
    pub intensity: f32,
    #[serde(default)]
    pub falloff: Falloff,
    #[serde(default)]
    pub falloff_radius: f32,
    /// Outer cone angle in radians (spot lights)
    #[serde(default)]
    pub outer_angle: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    #[serde(flatten)]
    pub info: ObjectInfo,
    /// Vertical field of view in radians
    pub vertical_fov: f32,
    #[serde(default = "default_near_plane")]
    pub near_plane: f32,
    #[serde(default = "default_far_plane")]
    pub far_plane: f32,
    /// Object the camera looks at, if it carries a target tag
    #[serde(default)]
    pub target: Option<u32>,
}

fn default_near_plane() -> f32 {
    DEFAULT_NEAR_PLANE
}

fn default_far_plane() -> f32 {
    DEFAULT_FAR_PLANE
}
