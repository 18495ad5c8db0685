//! Fixed-size records of the binary scene blob.
//!
//! All records are little-endian and `repr(C)` without padding so they can
//! be written with [`DeferredWriter::write`](crate::deferred::DeferredWriter::write).

use boba_scene::Transform;
use bytemuck::{Pod, Zeroable};
use mesh::{BoundingSphere, MaterialGroup};

pub use boba_config::{BOBA_PROTOCOL_VERSION, TRANSFORM_RECORD_VERSION};
pub use boba_scene::INVALID_OBJECT_ID;

/// Magic at offset 0 of every blob.
pub const BOBA_MAGIC: [u8; 4] = *b"boba";

/// File header, written as a placeholder first and rewritten at the end.
///
/// Each category has a `(count, data_start)` pair; `data_start` is 0 when the
/// category is empty.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct SceneBlobHeader {
    pub id: [u8; 4],
    pub version: u32,
    pub flags: u32,
    pub num_null_objects: u32,
    pub null_object_data_start: u32,
    pub num_meshes: u32,
    pub mesh_data_start: u32,
    pub num_lights: u32,
    pub light_data_start: u32,
    pub num_cameras: u32,
    pub camera_data_start: u32,
    pub num_materials: u32,
    pub material_data_start: u32,
    pub num_splines: u32,
    pub spline_data_start: u32,
    /// Start of the deferred data region
    pub fixup_offset: u32,
}

impl SceneBlobHeader {
    pub fn new(version: u32) -> Self {
        Self {
            id: BOBA_MAGIC,
            version,
            ..Self::zeroed()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.id == BOBA_MAGIC
    }
}

/// Transform layout used from protocol version 4 on.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TransformRecord {
    pub pos: [f32; 3],
    pub rot: [f32; 3],
    pub quat: [f32; 4],
    pub scale: [f32; 3],
}

impl From<&Transform> for TransformRecord {
    fn from(t: &Transform) -> Self {
        Self {
            pos: t.pos.to_array(),
            rot: t.rot.to_array(),
            quat: t.quat.to_array(),
            scale: t.scale.to_array(),
        }
    }
}

/// 3x4 matrix layout used before protocol version 4.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MatrixRecord {
    pub cols: [f32; 12],
}

impl From<&Transform> for MatrixRecord {
    fn from(t: &Transform) -> Self {
        Self {
            cols: t.to_matrix_3x4(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BoundingSphereRecord {
    pub center: [f32; 3],
    pub radius: f32,
}

impl From<&BoundingSphere> for BoundingSphereRecord {
    fn from(s: &BoundingSphere) -> Self {
        Self {
            center: s.center.to_array(),
            radius: s.radius,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct MaterialGroupRecord {
    pub material_id: u32,
    pub start_index: u32,
    pub index_count: u32,
}

impl From<&MaterialGroup> for MaterialGroupRecord {
    fn from(g: &MaterialGroup) -> Self {
        Self {
            material_id: g.material_id,
            start_index: g.start_index,
            index_count: g.index_count,
        }
    }
}
