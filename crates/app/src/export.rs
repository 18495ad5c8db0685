//! Per-input export pipeline.
//!
//! load scene -> weld meshes -> world geometry -> optional SDF -> binary blob
//! and/or sidecar -> stats

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use boba_config::{ExportOptions, SdfMethod};
use boba_format::{
    BINARY_EXTENSION, ExportScene, FormatError, SceneStats, SidecarFiles, output_path,
    save_scene, save_sidecar,
};
use boba_scene::{Scene, SceneError};
use mesh::WorldGeometry;
use sdf::{SdfError, SdfSettings, generate_sdf};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to load {path}: {source}")]
    Scene {
        path: PathBuf,
        #[source]
        source: SceneError,
    },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Sdf(#[from] SdfError),

    #[error("Failed to create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of exporting one input.
#[derive(Debug)]
pub enum ExportOutcome {
    /// Every output was already up to date
    Skipped,
    Exported {
        stats: Option<SceneStats>,
        sidecar: Option<SidecarFiles>,
    },
}

/// Files an export of `prefix` writes under `options`.
pub fn output_files(prefix: &Path, options: &ExportOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if options.output_format.writes_binary() {
        files.push(output_path(prefix, BINARY_EXTENSION));
    }
    if options.output_format.writes_sidecar() {
        let sidecar = SidecarFiles::for_prefix(prefix);
        files.push(sidecar.json);
        files.push(sidecar.data);
    }
    files
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// True when every output exists and is not older than `input`.
pub fn is_up_to_date(input: &Path, outputs: &[PathBuf]) -> bool {
    let Some(input_time) = modified(input) else {
        return false;
    };
    outputs
        .iter()
        .all(|output| modified(output).is_some_and(|t| t >= input_time))
}

/// Geometry the voxelizer samples, one entry per usable mesh.
///
/// The feature-normal path works on the unwelded polygons so edges stay
/// shared across attribute seams. The fast-sweep path reads the welded index
/// and position streams; meshes missing either are skipped.
fn world_geometries(export: &ExportScene<'_>, method: SdfMethod) -> Vec<WorldGeometry> {
    match method {
        SdfMethod::FeatureNormal => export
            .scene
            .meshes
            .iter()
            .map(WorldGeometry::from_polygon_mesh)
            .collect(),
        SdfMethod::FastSweep => export
            .meshes
            .iter()
            .filter_map(|mesh| {
                let geometry = mesh.welded.data_streams().and_then(|streams| {
                    WorldGeometry::from_streams(&mesh.info.name, &streams, &mesh.info.global)
                });
                match geometry {
                    Ok(geometry) => Some(geometry),
                    Err(err) => {
                        tracing::warn!(mesh = %mesh.info.name, %err, "Skipping mesh for SDF");
                        None
                    }
                }
            })
            .collect(),
    }
}

/// Export one scene file.
pub fn export_file(input: &Path, options: &ExportOptions) -> Result<ExportOutcome, ExportError> {
    let prefix = options.output_prefix(input);
    let outputs = output_files(&prefix, options);
    if !options.force && is_up_to_date(input, &outputs) {
        tracing::info!(input = %input.display(), "Outputs up to date, skipping");
        return Ok(ExportOutcome::Skipped);
    }

    if let Some(dir) = prefix.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ExportError::OutputDirectory {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let scene = Scene::load(input).map_err(|source| ExportError::Scene {
        path: input.to_path_buf(),
        source,
    })?;
    tracing::info!(
        input = %input.display(),
        meshes = scene.meshes.len(),
        lights = scene.lights.len(),
        cameras = scene.cameras.len(),
        materials = scene.materials.len(),
        "Scene loaded"
    );

    let mut export = ExportScene::new(&scene, options)?;

    if options.sdf {
        let geometries = world_geometries(&export, options.sdf_method);
        let grid = generate_sdf(&geometries, &SdfSettings::from(options))?;
        export = export.with_sdf(grid);
    }

    let stats = if options.output_format.writes_binary() {
        let path = output_path(&prefix, BINARY_EXTENSION);
        Some(save_scene(&export, options, &path)?)
    } else {
        None
    };

    let sidecar = if options.output_format.writes_sidecar() {
        Some(save_sidecar(&export, &prefix)?)
    } else {
        None
    };

    Ok(ExportOutcome::Exported { stats, sidecar })
}

#[cfg(test)]
mod tests {
    use boba_config::OutputFormat;
    use boba_scene::{ObjectInfo, Polygon, PolygonMesh};
    use glam::Vec3;

    use super::*;

    /// Closed cube of side 2, quads wound outward.
    fn cube_scene() -> Scene {
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
            Polygon::quad(0, 4, 6, 2),
            Polygon::quad(1, 3, 7, 5),
            Polygon::quad(0, 1, 5, 4),
            Polygon::quad(2, 6, 7, 3),
            Polygon::quad(0, 2, 3, 1),
            Polygon::quad(4, 5, 7, 6),
        ];
        Scene {
            meshes: vec![PolygonMesh::new(ObjectInfo::new("cube", 1), points, polygons)],
            ..Default::default()
        }
    }

    fn write_scene(dir: &Path) -> PathBuf {
        let input = dir.join("cube.json");
        std::fs::write(&input, serde_json::to_string(&cube_scene()).unwrap()).unwrap();
        input
    }

    fn sdf_options(dir: &Path, method: SdfMethod) -> ExportOptions {
        ExportOptions {
            sdf: true,
            sdf_method: method,
            grid_size: 5,
            output_directory: Some(dir.join("out")),
            ..Default::default()
        }
    }

    #[test]
    fn test_export_writes_every_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_scene(dir.path());
        let options = sdf_options(dir.path(), SdfMethod::FeatureNormal);

        let outcome = export_file(&input, &options).unwrap();
        let ExportOutcome::Exported { stats, sidecar } = outcome else {
            panic!("expected an export");
        };
        assert!(stats.unwrap().mesh_size > 0);
        let sidecar = sidecar.unwrap();
        for file in output_files(&options.output_prefix(&input), &options) {
            assert!(file.exists(), "{} missing", file.display());
        }

        let doc: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&sidecar.json).unwrap()).unwrap();
        assert_eq!(doc["sdf"]["gridRes"], 5);
        assert_eq!(doc["sdf"]["dataSize"], 125 * 4);
    }

    #[test]
    fn test_fast_sweep_export_agrees_on_center() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_scene(dir.path());

        for method in [SdfMethod::FeatureNormal, SdfMethod::FastSweep] {
            let options = ExportOptions {
                output_format: OutputFormat::Json,
                force: true,
                ..sdf_options(dir.path(), method)
            };
            let ExportOutcome::Exported { sidecar, .. } = export_file(&input, &options).unwrap()
            else {
                panic!("expected an export");
            };
            let sidecar = sidecar.unwrap();
            let doc: serde_json::Value =
                serde_json::from_slice(&std::fs::read(&sidecar.json).unwrap()).unwrap();
            let offset = doc["sdf"]["dataOffset"].as_u64().unwrap() as usize;

            let data = std::fs::read(&sidecar.data).unwrap();
            // Node (2, 2, 2) of a 5^3 grid is the cube center
            let center = offset + (2 * 25 + 2 * 5 + 2) * 4;
            let d = f32::from_le_bytes(data[center..center + 4].try_into().unwrap());
            assert!((d + 1.0).abs() < 1e-4, "{method:?} center {d}");
        }
    }

    #[test]
    fn test_up_to_date_outputs_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_scene(dir.path());
        let options = ExportOptions {
            output_directory: Some(dir.path().join("out")),
            ..Default::default()
        };

        assert!(matches!(
            export_file(&input, &options).unwrap(),
            ExportOutcome::Exported { .. }
        ));
        assert!(matches!(
            export_file(&input, &options).unwrap(),
            ExportOutcome::Skipped
        ));

        let forced = ExportOptions {
            force: true,
            ..options
        };
        assert!(matches!(
            export_file(&input, &forced).unwrap(),
            ExportOutcome::Exported { .. }
        ));
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_file(&dir.path().join("nope.json"), &ExportOptions::default());
        assert!(matches!(err, Err(ExportError::Scene { .. })));
    }

    #[test]
    fn test_output_files_follow_format() {
        let prefix = Path::new("out/scene");
        let mut options = ExportOptions::default();
        assert_eq!(output_files(prefix, &options).len(), 3);
        options.output_format = OutputFormat::Binary;
        assert_eq!(
            output_files(prefix, &options),
            vec![PathBuf::from("out/scene.boba")]
        );
    }
}
