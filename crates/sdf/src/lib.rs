//! Signed distance field voxelization for the boba exporter
//!
//! Samples signed distances to the scene's triangles on a regular grid over
//! the padded scene bounds. Negative values are inside.
//!
//! ## Methods
//!
//! - [`SdfMethod::FeatureNormal`] (default): brute-force closest point, sign
//!   from the closest feature's normal. See [`feature`].
//! - [`SdfMethod::FastSweep`]: exact band plus fast sweeping, sign from ray
//!   intersection parity. See [`level_set`].

pub mod feature;
pub mod grid;
pub mod level_set;
pub mod orientation;

#[cfg(test)]
mod fixtures;

pub use boba_config::SdfMethod;
pub use feature::{signed_distance, voxelize_feature_normal};
pub use grid::{GRID_PADDING, GridLayout, SdfGrid};
pub use level_set::voxelize_fast_sweep;

use boba_config::{ExportOptions, MAX_GRID_SIZE};
use mesh::{WorldGeometry, scene_bounds};

/// Errors raised while setting up a voxelization.
#[derive(Debug, thiserror::Error)]
pub enum SdfError {
    #[error("Grid resolution must be between 2 and {max}, got {0}", max = MAX_GRID_SIZE)]
    InvalidResolution(u32),

    #[error("Scene has no triangles to voxelize")]
    EmptyGeometry,

    #[error("Grid bounds have no extent on at least one axis")]
    DegenerateBounds,
}

/// Voxelizer settings taken from the export options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdfSettings {
    pub resolution: u32,
    pub method: SdfMethod,
    pub exact_band: u32,
}

impl From<&ExportOptions> for SdfSettings {
    fn from(options: &ExportOptions) -> Self {
        Self {
            resolution: options.grid_size,
            method: options.sdf_method,
            exact_band: options.exact_band,
        }
    }
}

/// Voxelize `geometries` over their padded combined bounds.
pub fn generate_sdf(
    geometries: &[WorldGeometry],
    settings: &SdfSettings,
) -> Result<SdfGrid, SdfError> {
    let bounds = scene_bounds(geometries);
    tracing::debug!(min = ?bounds.min, max = ?bounds.max, "Scene bounds");
    let layout = GridLayout::padded(bounds, settings.resolution)?;

    tracing::info!(
        resolution = settings.resolution,
        method = ?settings.method,
        meshes = geometries.len(),
        "Generating SDF"
    );

    let grid = match settings.method {
        SdfMethod::FeatureNormal => voxelize_feature_normal(&layout, geometries),
        SdfMethod::FastSweep => voxelize_fast_sweep(&layout, geometries, settings.exact_band),
    };
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use fixtures::cube_geometry;

    #[test]
    fn test_settings_from_options() {
        let options = ExportOptions {
            grid_size: 16,
            sdf_method: SdfMethod::FastSweep,
            ..Default::default()
        };
        let settings = SdfSettings::from(&options);
        assert_eq!(settings.resolution, 16);
        assert_eq!(settings.method, SdfMethod::FastSweep);
        assert_eq!(settings.exact_band, options.exact_band);
    }

    #[test]
    fn test_generate_both_methods() {
        let cube = [cube_geometry()];
        for method in [SdfMethod::FeatureNormal, SdfMethod::FastSweep] {
            let settings = SdfSettings {
                resolution: 5,
                method,
                exact_band: 1,
            };
            let grid = generate_sdf(&cube, &settings).unwrap();
            assert_eq!(grid.data.len(), 125);
            assert!(grid.get(2, 2, 2) < 0.0);
            assert!(grid.get(0, 0, 0) > 0.0);
        }
    }

    #[test]
    fn test_flat_quad_gives_finite_distances() {
        let quad = WorldGeometry::from_triangles(
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        for method in [SdfMethod::FeatureNormal, SdfMethod::FastSweep] {
            let settings = SdfSettings {
                resolution: 5,
                method,
                exact_band: 1,
            };
            let grid = generate_sdf(std::slice::from_ref(&quad), &settings).unwrap();
            assert!(grid.data.iter().all(|d| d.is_finite()), "{method:?}");
            // Node (2, 2, 0) sits right below the quad center
            let d = grid.get(2, 2, 0).abs();
            assert!((d - 0.1).abs() < 1e-4, "{method:?} {d}");
        }
    }

    #[test]
    fn test_empty_scene_is_an_error() {
        let settings = SdfSettings {
            resolution: 8,
            method: SdfMethod::FeatureNormal,
            exact_band: 1,
        };
        assert!(matches!(
            generate_sdf(&[], &settings),
            Err(SdfError::EmptyGeometry)
        ));
    }
}
