//! Regular grid geometry and the signed distance buffer.

use boba_config::MAX_GRID_SIZE;
use glam::Vec3;
use mesh::Aabb;
use serde::{Deserialize, Serialize};

use crate::SdfError;

/// Fraction of the scene extent added on every side of the grid.
pub const GRID_PADDING: f32 = 0.05;

/// Smallest padded extent of any grid axis, for flat or point-like scenes.
pub const MIN_GRID_EXTENT: f32 = 1.0e-3;

/// Node placement of a cubic-resolution grid over a box.
///
/// Nodes sit on the box corners: node `n` along an axis is at
/// `min + n * spacing` with `spacing = (max - min) / (resolution - 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub resolution: u32,
    pub min: Vec3,
    pub max: Vec3,
    pub spacing: Vec3,
}

impl GridLayout {
    pub fn new(bounds: Aabb, resolution: u32) -> Result<Self, SdfError> {
        let cells = (resolution as usize).checked_pow(3);
        if !(2..=MAX_GRID_SIZE).contains(&resolution) || cells.is_none() {
            return Err(SdfError::InvalidResolution(resolution));
        }
        if bounds.is_empty() {
            return Err(SdfError::EmptyGeometry);
        }
        if bounds.size().min_element() <= 0.0 {
            return Err(SdfError::DegenerateBounds);
        }
        Ok(Self {
            resolution,
            min: bounds.min,
            max: bounds.max,
            spacing: bounds.size() / (resolution - 1) as f32,
        })
    }

    /// Layout over the scene bounds grown by [`GRID_PADDING`].
    ///
    /// Axes thinner than the padding of the largest axis (a flat quad, a
    /// single point) are widened around their center to that padding.
    pub fn padded(scene_bounds: Aabb, resolution: u32) -> Result<Self, SdfError> {
        if scene_bounds.is_empty() {
            return Err(SdfError::EmptyGeometry);
        }
        let padded = scene_bounds.expanded_by_fraction(GRID_PADDING);
        let min_extent =
            (scene_bounds.size().max_element() * 2.0 * GRID_PADDING).max(MIN_GRID_EXTENT);
        let grow = (Vec3::splat(min_extent) - padded.size()).max(Vec3::ZERO) * 0.5;
        Self::new(Aabb::new(padded.min - grow, padded.max + grow), resolution)
    }

    pub fn res(&self) -> usize {
        self.resolution as usize
    }

    pub fn cell_count(&self) -> usize {
        self.res().pow(3)
    }

    pub fn span(&self) -> Vec3 {
        self.max - self.min
    }

    /// Flat index of node `(x, y, z)`: z-major, x fastest.
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        let n = self.res();
        (z * n + y) * n + x
    }

    pub fn node_position(&self, x: usize, y: usize, z: usize) -> Vec3 {
        self.min + Vec3::new(x as f32, y as f32, z as f32) * self.spacing
    }
}

/// Signed distances sampled at every grid node, negative inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdfGrid {
    pub resolution: u32,
    pub min: Vec3,
    pub max: Vec3,
    /// `resolution³` values, index `z * res² + y * res + x`
    pub data: Vec<f32>,
}

impl SdfGrid {
    pub fn new(layout: &GridLayout, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), layout.cell_count());
        Self {
            resolution: layout.resolution,
            min: layout.min,
            max: layout.max,
            data,
        }
    }

    pub fn layout(&self) -> GridLayout {
        let n = self.resolution.max(2);
        GridLayout {
            resolution: self.resolution,
            min: self.min,
            max: self.max,
            spacing: (self.max - self.min) / (n - 1) as f32,
        }
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> f32 {
        self.data[self.layout().index(x, y, z)]
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn byte_len(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}
