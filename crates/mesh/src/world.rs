//! World-space triangle geometry with adjacency-derived normals.
//!
//! The SDF sign test needs a normal for every feature a closest point can land
//! on: faces, vertices and edges. Vertex and edge normals are unweighted
//! averages of the adjacent face normals.

use std::collections::HashMap;

use boba_scene::{PolygonMesh, Transform};
use glam::Vec3;

use crate::bounds::Aabb;
use crate::error::MeshError;
use crate::streams::{DataStream, StreamKind, find_stream};
use crate::triangle::{TriangleFeature, face_normal};

/// Undirected edge, stored as (min, max) vertex index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(pub u32, pub u32);

impl EdgeKey {
    pub fn new(a: u32, b: u32) -> Self {
        Self(a.min(b), a.max(b))
    }
}

/// Triangulated mesh in world space.
#[derive(Debug, Clone, Default)]
pub struct WorldGeometry {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
    pub face_normals: Vec<Vec3>,
    /// Normalized sum of adjacent face normals; zero for isolated vertices
    pub vertex_normals: Vec<Vec3>,
    pub edge_normals: HashMap<EdgeKey, Vec3>,
    pub aabb: Aabb,
}

impl WorldGeometry {
    /// Build from a polygon mesh, transformed by its global transform.
    ///
    /// Uses the unwelded points so edges stay shared across attribute seams.
    pub fn from_polygon_mesh(mesh: &PolygonMesh) -> Self {
        let affine = mesh.info.global.to_affine();
        let vertices = mesh
            .points
            .iter()
            .map(|&p| affine.transform_point3(p))
            .collect();

        let mut faces = Vec::with_capacity(mesh.polygons.len() * 2);
        for poly in &mesh.polygons {
            faces.push([poly.a, poly.b, poly.c]);
            if poly.is_quad() {
                faces.push([poly.a, poly.c, poly.d]);
            }
        }

        Self::from_triangles(vertices, faces)
    }

    /// Build from a mesh's index and position streams.
    pub fn from_streams(
        name: &str,
        streams: &[DataStream],
        transform: &Transform,
    ) -> Result<Self, MeshError> {
        let index_stream = find_stream(streams, StreamKind::Index16)
            .or_else(|| find_stream(streams, StreamKind::Index32))
            .ok_or_else(|| MeshError::MissingStream {
                mesh: name.to_string(),
                kind: "index",
            })?;
        let pos_stream =
            find_stream(streams, StreamKind::Pos).ok_or_else(|| MeshError::MissingStream {
                mesh: name.to_string(),
                kind: "position",
            })?;

        let affine = transform.to_affine();
        let vertices = pos_stream
            .read_vec3()?
            .into_iter()
            .map(|p| affine.transform_point3(p))
            .collect();
        let faces = index_stream
            .read_indices()?
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect();

        Ok(Self::from_triangles(vertices, faces))
    }

    /// Compute face, vertex and edge normals for a triangle list.
    pub fn from_triangles(vertices: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Self {
        let face_normals: Vec<Vec3> = faces
            .iter()
            .map(|f| {
                face_normal(
                    vertices[f[0] as usize],
                    vertices[f[1] as usize],
                    vertices[f[2] as usize],
                )
            })
            .collect();

        let mut vertex_normals = vec![Vec3::ZERO; vertices.len()];
        let mut edge_normals: HashMap<EdgeKey, Vec3> = HashMap::new();
        for (face, &normal) in faces.iter().zip(&face_normals) {
            for slot in 0..3 {
                vertex_normals[face[slot] as usize] += normal;
                let edge = EdgeKey::new(face[slot], face[(slot + 1) % 3]);
                *edge_normals.entry(edge).or_insert(Vec3::ZERO) += normal;
            }
        }
        for n in vertex_normals.iter_mut().chain(edge_normals.values_mut()) {
            *n = n.normalize_or_zero();
        }

        let aabb = Aabb::from_points(vertices.iter().copied());

        Self {
            vertices,
            faces,
            face_normals,
            vertex_normals,
            edge_normals,
            aabb,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Corner positions of `face`.
    pub fn triangle(&self, face: usize) -> [Vec3; 3] {
        self.faces[face].map(|v| self.vertices[v as usize])
    }

    /// Normal associated with a closest-point feature of `face`.
    ///
    /// Returns `None` only when an edge is missing from the edge map.
    pub fn feature_normal(&self, face: usize, feature: TriangleFeature) -> Option<Vec3> {
        let corners = self.faces[face];
        if let Some(slot) = feature.vertex_slot() {
            return Some(self.vertex_normals[corners[slot] as usize]);
        }
        if let Some((s0, s1)) = feature.edge_slots() {
            return self
                .edge_normals
                .get(&EdgeKey::new(corners[s0], corners[s1]))
                .copied();
        }
        Some(self.face_normals[face])
    }
}

/// Union of the bounding boxes of every non-empty geometry.
pub fn scene_bounds<'a>(geometries: impl IntoIterator<Item = &'a WorldGeometry>) -> Aabb {
    geometries
        .into_iter()
        .filter(|g| !g.is_empty())
        .fold(Aabb::empty(), |acc, g| acc.union(&g.aabb))
}
