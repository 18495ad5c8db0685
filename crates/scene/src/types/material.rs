//! Material types.

use serde::{Deserialize, Serialize};

/// Id of the fallback material used by polygons without an assignment.
pub const DEFAULT_MATERIAL_ID: u32 = !0;

/// Name of the fallback material.
pub const DEFAULT_MATERIAL_NAME: &str = "<default>";

/// One channel of a material (color, reflection, luminance...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialComponent {
    pub name: String,
    /// RGBA (0.0-1.0)
    pub color: [f32; 4],
    /// Texture path, empty when the channel is untextured
    #[serde(default)]
    pub texture: String,
    #[serde(default = "default_brightness")]
    pub brightness: f32,
}

fn default_brightness() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub id: u32,
    #[serde(default)]
    pub components: Vec<MaterialComponent>,
}

impl Material {
    /// Mid-grey material bound to [`DEFAULT_MATERIAL_ID`].
    pub fn default_material() -> Self {
        Self {
            name: DEFAULT_MATERIAL_NAME.to_string(),
            id: DEFAULT_MATERIAL_ID,
            components: vec![MaterialComponent {
                name: "color".to_string(),
                color: [0.5, 0.5, 0.5, 1.0],
                texture: String::new(),
                brightness: 1.0,
            }],
        }
    }
}
