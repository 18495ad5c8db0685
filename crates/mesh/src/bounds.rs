//! Bounding volumes for meshes and the scene.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::empty();
        for point in points {
            aabb.include_point(point);
        }
        aabb
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn include_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Grow every side by `fraction` of the box's extent on that axis.
    pub fn expanded_by_fraction(&self, fraction: f32) -> Aabb {
        let margin = self.size() * fraction;
        Aabb::new(self.min - margin, self.max + margin)
    }
}

/// Sphere enclosing a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

/// Box and sphere around `points` in two passes.
///
/// The sphere is centered on the box center rather than being the minimal
/// enclosing sphere.
pub fn bounding_volumes(points: &[Vec3]) -> (Aabb, BoundingSphere) {
    let aabb = Aabb::from_points(points.iter().copied());
    if points.is_empty() {
        return (aabb, BoundingSphere::default());
    }

    let center = aabb.center();
    let radius = points
        .iter()
        .map(|p| p.distance_squared(center))
        .fold(0.0f32, f32::max)
        .sqrt();
    (aabb, BoundingSphere { center, radius })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_aabb() {
        assert!(Aabb::empty().is_empty());
        assert!(!Aabb::from_points([Vec3::ONE]).is_empty());
    }

    #[test]
    fn test_union_and_expand() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(-1.0), Vec3::splat(0.5));
        let u = a.union(&b);
        assert_eq!(u.min, Vec3::splat(-1.0));
        assert_eq!(u.max, Vec3::ONE);

        let grown = Aabb::new(Vec3::splat(-1.0), Vec3::ONE).expanded_by_fraction(0.05);
        assert!((grown.min.x + 1.1).abs() < 1e-6);
        assert!((grown.max.z - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_uses_box_center() {
        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ];
        let (aabb, sphere) = bounding_volumes(&points);
        assert_eq!(aabb.max, Vec3::new(4.0, 2.0, 0.0));
        assert_eq!(sphere.center, Vec3::new(2.0, 1.0, 0.0));
        assert!((sphere.radius - 5.0f32.sqrt()).abs() < 1e-6);
        for p in points {
            assert!(p.distance(sphere.center) <= sphere.radius + 1e-6);
        }
    }
}
