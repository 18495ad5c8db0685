//! Closest point on a triangle with feature classification.
//!
//! The signed distance voxelizer needs to know *which* part of a triangle is
//! closest to a query point (a vertex, an edge or the interior), because the
//! sign is taken from that feature's normal.

use glam::Vec3;

/// The sub-region of a triangle that a closest point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriangleFeature {
    VertexA,
    VertexB,
    VertexC,
    EdgeAB,
    EdgeAC,
    EdgeBC,
    Face,
}

impl TriangleFeature {
    /// Corner slot (0..3) for vertex features.
    pub fn vertex_slot(self) -> Option<usize> {
        match self {
            Self::VertexA => Some(0),
            Self::VertexB => Some(1),
            Self::VertexC => Some(2),
            _ => None,
        }
    }

    /// Corner slot pair for edge features.
    pub fn edge_slots(self) -> Option<(usize, usize)> {
        match self {
            Self::EdgeAB => Some((0, 1)),
            Self::EdgeAC => Some((0, 2)),
            Self::EdgeBC => Some((1, 2)),
            _ => None,
        }
    }
}

/// Result of [`closest_point_on_triangle`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoint {
    pub point: Vec3,
    pub feature: TriangleFeature,
}

/// Closest point to `p` on triangle `(a, b, c)` using Voronoi region tests.
///
/// Regions are tested in the order vertex A, vertex B, edge AB, vertex C,
/// edge AC, edge BC; anything left projects onto the face interior and is
/// reconstructed from barycentric weights.
///
/// # Arguments
/// * `p` - Query point
/// * `a`, `b`, `c` - Triangle vertices
///
/// # Returns
/// The closest point together with the feature it lies on
pub fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> ClosestPoint {
    let hit = |point, feature| ClosestPoint { point, feature };

    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return hit(a, TriangleFeature::VertexA);
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return hit(b, TriangleFeature::VertexB);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return hit(a + ab * v, TriangleFeature::EdgeAB);
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return hit(c, TriangleFeature::VertexC);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return hit(a + ac * w, TriangleFeature::EdgeAC);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return hit(b + (c - b) * w, TriangleFeature::EdgeBC);
    }

    // u = va * denom = 1 - v - w
    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    hit(a + ab * v + ac * w, TriangleFeature::Face)
}

/// Unit normal of triangle `(a, b, c)` with counter-clockwise winding.
///
/// Degenerate triangles yield a zero vector.
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}
