//! Signed distance by closest-feature normal.
//!
//! Every grid node scans every face of every mesh for the globally closest
//! point. The sign comes from the normal of the feature that point lies on:
//! a vertex normal, an edge normal or the face normal. Nodes behind that
//! normal are inside.
//!
//! Nodes are independent, so z-slices are distributed over the rayon pool.
//! The result is identical to a sequential scan.

use glam::Vec3;
use mesh::{WorldGeometry, closest_point_on_triangle};
use rayon::prelude::*;

use crate::grid::{GridLayout, SdfGrid};

/// Closest surface point found so far.
#[derive(Debug, Clone, Copy)]
struct Closest {
    distance_sq: f32,
    point: Vec3,
    normal: Vec3,
}

/// Signed distance from `point` to the union of `geometries`.
///
/// Returns `None` when there are no faces at all.
pub fn signed_distance(point: Vec3, geometries: &[WorldGeometry]) -> Option<f32> {
    let mut best: Option<Closest> = None;

    for geometry in geometries {
        for face in 0..geometry.faces.len() {
            let [a, b, c] = geometry.triangle(face);
            let hit = closest_point_on_triangle(point, a, b, c);
            let distance_sq = hit.point.distance_squared(point);
            if best.is_some_and(|b| distance_sq >= b.distance_sq) {
                continue;
            }

            let normal = geometry
                .feature_normal(face, hit.feature)
                .unwrap_or_else(|| {
                    tracing::warn!(
                        face,
                        feature = ?hit.feature,
                        "Missing edge normal, using the face normal"
                    );
                    geometry.face_normals[face]
                });
            best = Some(Closest {
                distance_sq,
                point: hit.point,
                normal,
            });
        }
    }

    best.map(|closest| {
        let distance = closest.distance_sq.sqrt();
        let behind = (point - closest.point).normalize_or_zero().dot(closest.normal) < 0.0;
        if behind { -distance } else { distance }
    })
}

/// Sample [`signed_distance`] at every node of `layout`.
pub fn voxelize_feature_normal(layout: &GridLayout, geometries: &[WorldGeometry]) -> SdfGrid {
    let n = layout.res();
    let mut data = vec![f32::MAX; layout.cell_count()];

    data.par_chunks_mut(n * n)
        .enumerate()
        .for_each(|(z, slice)| {
            for y in 0..n {
                for x in 0..n {
                    let node = layout.node_position(x, y, z);
                    if let Some(d) = signed_distance(node, geometries) {
                        slice[y * n + x] = d;
                    }
                }
            }
        });

    SdfGrid::new(layout, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{cube_geometry, cube_layout};

    #[test]
    fn test_center_of_cube_is_inside() {
        let cube = [cube_geometry()];
        let d = signed_distance(Vec3::ZERO, &cube).unwrap();
        assert!(d < 0.0);
        assert!((d + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_far_point_is_euclidean_distance() {
        let cube = [cube_geometry()];
        let d = signed_distance(Vec3::new(5.0, 0.0, 0.0), &cube).unwrap();
        assert!((d - 4.0).abs() < 1e-5);

        let corner = signed_distance(Vec3::splat(3.0), &cube).unwrap();
        assert!((corner - 12.0f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_edge_region_sign() {
        let cube = [cube_geometry()];
        let outside = signed_distance(Vec3::new(1.5, 1.5, 0.0), &cube).unwrap();
        assert!((outside - 0.5f32.sqrt()).abs() < 1e-5);
        let inside = signed_distance(Vec3::new(0.9, 0.8, 0.1), &cube).unwrap();
        assert!((inside + 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_empty_scene_has_no_distance() {
        assert_eq!(signed_distance(Vec3::ZERO, &[]), None);
    }

    #[test]
    fn test_grid_center_and_corner() {
        let layout = cube_layout(9);
        let grid = voxelize_feature_normal(&layout, &[cube_geometry()]);
        assert_eq!(grid.data.len(), 729);

        let center = grid.get(4, 4, 4);
        assert!((center + 1.0).abs() < 1e-5);

        // Grid corner (-1.1, -1.1, -1.1) is outside, nearest the cube corner
        let corner = grid.get(0, 0, 0);
        assert!((corner - (3.0f32 * 0.01).sqrt()).abs() < 1e-4);
    }
}
