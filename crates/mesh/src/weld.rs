//! Fat-vertex welding.
//!
//! Turns per-corner polygon attributes into an indexed triangle list. Every
//! corner becomes a [`FatVertex`] (position, normal, uv); corners whose
//! attributes are bit-identical share one output vertex. There is no epsilon:
//! values one ULP apart stay separate vertices.

use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hash, Hasher};

use boba_scene::PolygonMesh;
use glam::{Vec2, Vec3};

use crate::bounds::{Aabb, BoundingSphere, bounding_volumes};
use crate::error::MeshError;
use crate::streams::{DataStream, StreamKind, index_stream};
use crate::triangle::face_normal;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a.
#[derive(Debug, Clone, Copy)]
pub struct FnvHasher(u64);

impl Default for FnvHasher {
    fn default() -> Self {
        Self(FNV_OFFSET_BASIS)
    }
}

impl Hasher for FnvHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

pub type FnvBuildHasher = BuildHasherDefault<FnvHasher>;

/// Full attribute tuple of one polygon corner.
#[derive(Debug, Clone, Copy)]
pub struct FatVertex {
    pub pos: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl FatVertex {
    fn bits(&self) -> [u32; 8] {
        [
            self.pos.x.to_bits(),
            self.pos.y.to_bits(),
            self.pos.z.to_bits(),
            self.normal.x.to_bits(),
            self.normal.y.to_bits(),
            self.normal.z.to_bits(),
            self.uv.x.to_bits(),
            self.uv.y.to_bits(),
        ]
    }
}

impl PartialEq for FatVertex {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for FatVertex {}

impl Hash for FatVertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for word in self.bits() {
            state.write(&word.to_le_bytes());
        }
    }
}

/// Contiguous run of indices drawn with one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialGroup {
    pub material_id: u32,
    pub start_index: u32,
    pub index_count: u32,
}

/// Indexed, attribute-deduplicated mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct WeldedMesh {
    pub material_groups: Vec<MaterialGroup>,
    /// Triangle list shared by all material groups
    pub indices: Vec<u32>,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Present when the source mesh has uvs
    pub uvs: Option<Vec<Vec2>>,
    /// Bounds of the source points, before welding
    pub aabb: Aabb,
    pub bounding_sphere: BoundingSphere,
}

impl WeldedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Index, position, normal and (optional) uv streams.
    pub fn data_streams(&self) -> Result<Vec<DataStream>, MeshError> {
        let mut streams = vec![
            index_stream(&self.indices)?,
            DataStream::from_slice(StreamKind::Pos, &self.positions),
            DataStream::from_slice(StreamKind::Normal, &self.normals),
        ];
        if let Some(uvs) = &self.uvs {
            streams.push(DataStream::from_slice(StreamKind::Uv, uvs));
        }
        Ok(streams)
    }
}

/// Hash set of fat vertices handing out sequential ids.
#[derive(Debug, Default)]
struct VertexSet {
    lookup: HashMap<FatVertex, u32, FnvBuildHasher>,
    vertices: Vec<FatVertex>,
}

impl VertexSet {
    fn add(&mut self, vertex: FatVertex) -> u32 {
        *self.lookup.entry(vertex).or_insert_with(|| {
            self.vertices.push(vertex);
            (self.vertices.len() - 1) as u32
        })
    }
}

/// Weld a polygon mesh into an indexed triangle list grouped by material.
///
/// Normals come from explicit corner normals, then phong normals, then a flat
/// face normal of the polygon's first three corners. Quads are split into
/// `(0, 1, 2)` and `(0, 2, 3)`.
pub fn weld_mesh(mesh: &PolygonMesh) -> WeldedMesh {
    let corner_normals = mesh.corner_normals();
    let corner_uvs = mesh.uvs.as_deref();

    let mut set = VertexSet::default();
    let mut indices = Vec::with_capacity(mesh.polygons.len() * 6);
    let mut material_groups = Vec::new();

    for group in mesh.group_polygons_by_material() {
        let start_index = indices.len() as u32;

        for &poly_index in &group.polygons {
            let poly_index = poly_index as usize;
            let poly = mesh.polygons[poly_index];
            let corners = poly.corners();
            let positions = corners.map(|c| mesh.points[c as usize]);

            let normals = match corner_normals {
                Some(normals) => normals[poly_index],
                None => [face_normal(positions[0], positions[1], positions[2]); 4],
            };
            let uvs = corner_uvs.map_or([Vec2::ZERO; 4], |uvs| uvs[poly_index]);

            for triangle in poly.triangle_corners() {
                for &slot in triangle {
                    indices.push(set.add(FatVertex {
                        pos: positions[slot],
                        normal: normals[slot],
                        uv: uvs[slot],
                    }));
                }
            }
        }

        material_groups.push(MaterialGroup {
            material_id: group.material_id,
            start_index,
            index_count: indices.len() as u32 - start_index,
        });
    }

    let (aabb, bounding_sphere) = bounding_volumes(&mesh.points);
    let vertices = set.vertices;

    tracing::debug!(
        mesh = %mesh.info.name,
        corners = indices.len(),
        vertices = vertices.len(),
        groups = material_groups.len(),
        "Welded mesh"
    );

    WeldedMesh {
        material_groups,
        indices,
        positions: vertices.iter().map(|v| v.pos).collect(),
        normals: vertices.iter().map(|v| v.normal).collect(),
        uvs: corner_uvs.map(|_| vertices.iter().map(|v| v.uv).collect()),
        aabb,
        bounding_sphere,
    }
}
