//! Polygon mesh input as handed over by the document reader.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::{DEFAULT_MATERIAL_ID, ObjectInfo};
use crate::SceneError;

/// A triangle or quad. Triangles repeat their third corner: `c == d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polygon {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
}

impl Polygon {
    pub fn triangle(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c, d: c }
    }

    pub fn quad(a: u32, b: u32, c: u32, d: u32) -> Self {
        Self { a, b, c, d }
    }

    pub fn is_quad(&self) -> bool {
        self.c != self.d
    }

    pub fn corners(&self) -> [u32; 4] {
        [self.a, self.b, self.c, self.d]
    }

    /// The one or two triangles covering this polygon, as corner slots.
    ///
    /// Quads are always split along the (0, 2) diagonal.
    pub fn triangle_corners(&self) -> &'static [[usize; 3]] {
        if self.is_quad() {
            &[[0, 1, 2], [0, 2, 3]]
        } else {
            &[[0, 1, 2]]
        }
    }
}

/// Binds a material to either an explicit polygon selection or, when
/// `polygons` is `None`, to every polygon not claimed by a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialAssignment {
    pub material_id: u32,
    #[serde(default)]
    pub polygons: Option<Vec<u32>>,
}

/// Polygon indices sharing one material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolygonGroup {
    pub material_id: u32,
    pub polygons: Vec<u32>,
}

/// Mesh object with per-corner attributes.
///
/// Attribute arrays are indexed by polygon and hold one value per corner
/// slot; the fourth slot is ignored for triangles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonMesh {
    #[serde(flatten)]
    pub info: ObjectInfo,
    pub points: Vec<Vec3>,
    pub polygons: Vec<Polygon>,
    /// Explicit per-corner normals (normal tag)
    #[serde(default)]
    pub normals: Option<Vec<[Vec3; 4]>>,
    /// Phong-smoothed per-corner normals, used when no explicit normals exist
    #[serde(default)]
    pub phong_normals: Option<Vec<[Vec3; 4]>>,
    #[serde(default)]
    pub uvs: Option<Vec<[Vec2; 4]>>,
    #[serde(default)]
    pub materials: Vec<MaterialAssignment>,
}

impl PolygonMesh {
    pub fn new(info: ObjectInfo, points: Vec<Vec3>, polygons: Vec<Polygon>) -> Self {
        Self {
            info,
            points,
            polygons,
            normals: None,
            phong_normals: None,
            uvs: None,
            materials: Vec::new(),
        }
    }

    /// Corner normals to weld with, in priority order.
    pub fn corner_normals(&self) -> Option<&[[Vec3; 4]]> {
        self.normals
            .as_deref()
            .or(self.phong_normals.as_deref())
    }

    /// Bucket polygons by material.
    ///
    /// Selected polygons go to their selection's material, everything else to
    /// the first assigned material, or to [`DEFAULT_MATERIAL_ID`] when the
    /// mesh has no assignment at all. Groups keep first-appearance order.
    pub fn group_polygons_by_material(&self) -> Vec<PolygonGroup> {
        let Some(first) = self.materials.first() else {
            return vec![PolygonGroup {
                material_id: DEFAULT_MATERIAL_ID,
                polygons: (0..self.polygons.len() as u32).collect(),
            }];
        };

        let mut groups: Vec<PolygonGroup> = Vec::new();
        let mut claimed = vec![false; self.polygons.len()];

        fn group_for(groups: &mut Vec<PolygonGroup>, material_id: u32) -> &mut PolygonGroup {
            let pos = match groups.iter().position(|g| g.material_id == material_id) {
                Some(pos) => pos,
                None => {
                    groups.push(PolygonGroup {
                        material_id,
                        polygons: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            &mut groups[pos]
        }

        for assignment in &self.materials {
            let Some(selection) = &assignment.polygons else {
                continue;
            };
            let group = group_for(&mut groups, assignment.material_id);
            for &poly in selection {
                if let Some(flag) = claimed.get_mut(poly as usize) {
                    *flag = true;
                    group.polygons.push(poly);
                }
            }
        }

        let unclaimed: Vec<u32> = claimed
            .iter()
            .enumerate()
            .filter(|(_, claimed)| !**claimed)
            .map(|(i, _)| i as u32)
            .collect();
        if !unclaimed.is_empty() {
            group_for(&mut groups, first.material_id)
                .polygons
                .extend(unclaimed);
        }

        groups
    }

    /// Check corner indices and attribute array lengths.
    pub fn validate(&self) -> Result<(), SceneError> {
        let num_points = self.points.len() as u32;
        for (i, poly) in self.polygons.iter().enumerate() {
            if let Some(&index) = poly.corners().iter().find(|&&c| c >= num_points) {
                return Err(SceneError::PolygonIndexOutOfRange {
                    mesh: self.info.name.clone(),
                    polygon: i,
                    index,
                });
            }
        }

        let expected = self.polygons.len();
        let lengths = [
            ("normals", self.normals.as_ref().map(Vec::len)),
            ("phong_normals", self.phong_normals.as_ref().map(Vec::len)),
            ("uvs", self.uvs.as_ref().map(Vec::len)),
        ];
        for (attribute, len) in lengths {
            if let Some(actual) = len.filter(|&len| len != expected) {
                return Err(SceneError::AttributeCountMismatch {
                    mesh: self.info.name.clone(),
                    attribute,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}
