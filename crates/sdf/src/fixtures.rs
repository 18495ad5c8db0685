//! Shared test geometry.

use boba_scene::{ObjectInfo, Polygon, PolygonMesh};
use glam::Vec3;
use mesh::WorldGeometry;

use crate::grid::GridLayout;

/// Closed cube of side 2 centered at the origin, quads wound outward.
pub fn cube_mesh() -> PolygonMesh {
    let points = (0..8)
        .map(|i| {
            Vec3::new(
                if i & 1 != 0 { 1.0 } else { -1.0 },
                if i & 2 != 0 { 1.0 } else { -1.0 },
                if i & 4 != 0 { 1.0 } else { -1.0 },
            )
        })
        .collect();
    let polygons = vec![
        Polygon::quad(0, 4, 6, 2), // -x
        Polygon::quad(1, 3, 7, 5), // +x
        Polygon::quad(0, 1, 5, 4), // -y
        Polygon::quad(2, 6, 7, 3), // +y
        Polygon::quad(0, 2, 3, 1), // -z
        Polygon::quad(4, 5, 7, 6), // +z
    ];
    PolygonMesh::new(ObjectInfo::new("cube", 0), points, polygons)
}

pub fn cube_geometry() -> WorldGeometry {
    WorldGeometry::from_polygon_mesh(&cube_mesh())
}

pub fn cube_layout(resolution: u32) -> GridLayout {
    GridLayout::padded(cube_geometry().aabb, resolution).unwrap()
}
