//! Everything the writers need about one scene, computed once.

use boba_config::ExportOptions;
use boba_scene::{ObjectInfo, PolygonMesh, Scene};
use mesh::{BoundingSphere, DataStream, MaterialGroup, WeldedMesh, weld_mesh};
use sdf::SdfGrid;

use crate::anim::{DEFAULT_QUANTIZATION_STEP, PackedTrack};
use crate::compress::compress_streams;
use crate::error::Result;

/// A welded mesh with its final (possibly compressed) streams.
#[derive(Debug, Clone)]
pub struct ExportMesh {
    pub info: ObjectInfo,
    pub welded: WeldedMesh,
    pub streams: Vec<DataStream>,
}

impl ExportMesh {
    pub fn new(mesh: &PolygonMesh, options: &ExportOptions) -> Result<Self> {
        let welded = weld_mesh(mesh);
        let streams = compress_streams(welded.data_streams()?, options)?;
        tracing::debug!(
            mesh = %mesh.info.name,
            vertices = welded.vertex_count(),
            triangles = welded.triangle_count(),
            groups = welded.material_groups.len(),
            "Mesh welded"
        );
        Ok(Self {
            info: mesh.info.clone(),
            welded,
            streams,
        })
    }

    pub fn material_groups(&self) -> &[MaterialGroup] {
        &self.welded.material_groups
    }

    pub fn bounding_sphere(&self) -> &BoundingSphere {
        &self.welded.bounding_sphere
    }
}

/// Scene plus derived mesh data and the optional distance field.
#[derive(Debug, Clone)]
pub struct ExportScene<'a> {
    pub scene: &'a Scene,
    pub meshes: Vec<ExportMesh>,
    pub sdf: Option<SdfGrid>,
}

impl<'a> ExportScene<'a> {
    /// Weld every mesh of `scene`.
    pub fn new(scene: &'a Scene, options: &ExportOptions) -> Result<Self> {
        let meshes = scene
            .meshes
            .iter()
            .map(|mesh| ExportMesh::new(mesh, options))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            scene,
            meshes,
            sdf: None,
        })
    }

    pub fn with_sdf(mut self, sdf: SdfGrid) -> Self {
        self.sdf = Some(sdf);
        self
    }

    /// Packed tracks of every object, keyed by object id.
    pub fn packed_tracks(&self) -> Vec<(u32, PackedTrack)> {
        self.scene
            .objects()
            .flat_map(|info| {
                info.tracks
                    .iter()
                    .map(|track| (info.id, PackedTrack::new(track, DEFAULT_QUANTIZATION_STEP)))
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use boba_scene::{
        AnimationRange, Camera, Light, LightKind, Material, MaterialAssignment,
        MaterialComponent, NullObject, Polygon, Spline, SplineType, Track, Transform,
    };
    use glam::{Vec2, Vec3};

    use super::*;

    /// Small scene touching every object category.
    pub fn sample_scene() -> Scene {
        let mut root = ObjectInfo::new("root", 1);
        root.local = Transform::from_translation(Vec3::new(0.0, 2.0, 0.0));
        root.global = root.local;
        root.tracks.push(Track {
            name: "pos.y".into(),
            samples: vec![2.0, 2.5, 3.0],
        });

        let mut quad = PolygonMesh::new(
            ObjectInfo::new("quad", 2),
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![Polygon::quad(0, 1, 2, 3)],
        );
        quad.info.parent = Some(1);
        quad.uvs = Some(vec![[
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ]]);
        quad.materials.push(MaterialAssignment {
            material_id: 7,
            polygons: None,
        });

        let mut scene = Scene {
            animation: AnimationRange {
                fps: 30,
                start_frame: 0,
                end_frame: 2,
            },
            null_objects: vec![NullObject { info: root }],
            meshes: vec![quad],
            lights: vec![Light {
                info: ObjectInfo::new("sun", 3),
                kind: LightKind::Distant,
                color: [1.0, 0.9, 0.8],
                intensity: 2.0,
                falloff: Default::default(),
                falloff_radius: 0.0,
                outer_angle: 0.0,
            }],
            cameras: vec![Camera {
                info: ObjectInfo::new("cam", 4),
                vertical_fov: 0.8,
                near_plane: 0.1,
                far_plane: 100.0,
                target: Some(1),
            }],
            splines: vec![Spline {
                info: ObjectInfo::new("path", 5),
                spline_type: SplineType::Linear,
                points: vec![Vec3::ZERO, Vec3::X],
                is_closed: true,
            }],
            ..Default::default()
        };
        scene.materials.push(Material {
            name: "red".into(),
            id: 7,
            components: vec![MaterialComponent {
                name: "color".into(),
                color: [1.0, 0.0, 0.0, 1.0],
                texture: String::new(),
                brightness: 1.0,
            }],
        });
        scene.ensure_default_material();
        scene
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::sample_scene;
    use super::*;
    use mesh::StreamKind;

    #[test]
    fn test_meshes_are_welded() {
        let scene = sample_scene();
        let export = ExportScene::new(&scene, &ExportOptions::default()).unwrap();
        assert_eq!(export.meshes.len(), 1);

        let quad = &export.meshes[0];
        assert_eq!(quad.welded.vertex_count(), 4);
        assert_eq!(quad.material_groups().len(), 1);
        assert_eq!(quad.material_groups()[0].material_id, 7);
        assert_eq!(quad.streams[0].kind, StreamKind::Index16);
        assert!(quad.bounding_sphere().radius > 0.0);
    }

    #[test]
    fn test_tracks_are_packed_per_object() {
        let scene = sample_scene();
        scene.validate().unwrap();
        let export = ExportScene::new(&scene, &ExportOptions::default()).unwrap();
        let tracks = export.packed_tracks();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].0, 1);
        assert_eq!(tracks[0].1.samples(), vec![2.0, 2.5, 3.0]);
    }
}
