//! JSON description plus one flat data buffer.
//!
//! Every mesh stream, packed animation track and the SDF grid is appended to
//! the buffer as an `(offset, size)` region. The JSON document indexes those
//! regions through buffer views and accessors and describes the node
//! hierarchy, meshes, materials and animations.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use boba_scene::{MaterialComponent, ObjectInfo};
use glam::{Quat, Vec3};
use mesh::{DataStream, StreamKind};
use serde::Serialize;

use crate::error::Result;
use crate::export::{ExportMesh, ExportScene};

/// Regions start on this byte boundary.
const REGION_ALIGNMENT: usize = 4;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: u32,
    pub byte_offset: usize,
    pub byte_length: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    pub name: String,
    pub buffer_view: usize,
    /// Stream kind name, or `anim` / `sdf`
    pub kind: String,
    pub count: usize,
    pub elem_size: u32,
    pub compressed: bool,
}

/// Owns the data buffer and the tables that index into it.
#[derive(Debug, Default)]
pub struct ExportContext {
    buffer: Vec<u8>,
    buffer_views: Vec<BufferView>,
    accessors: Vec<Accessor>,
}

impl ExportContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn buffer_views(&self) -> &[BufferView] {
        &self.buffer_views
    }

    pub fn accessors(&self) -> &[Accessor] {
        &self.accessors
    }

    /// Append `data` as a new region and return its buffer view index.
    pub fn add_region(&mut self, data: &[u8]) -> usize {
        let padded = self.buffer.len().next_multiple_of(REGION_ALIGNMENT);
        self.buffer.resize(padded, 0);
        self.buffer_views.push(BufferView {
            buffer: 0,
            byte_offset: padded,
            byte_length: data.len(),
        });
        self.buffer.extend_from_slice(data);
        self.buffer_views.len() - 1
    }

    /// Append `data` and describe it with a new accessor; returns its index.
    pub fn add_accessor(
        &mut self,
        data: &[u8],
        kind: &str,
        count: usize,
        elem_size: u32,
        compressed: bool,
    ) -> usize {
        let buffer_view = self.add_region(data);
        let index = self.accessors.len();
        self.accessors.push(Accessor {
            name: format!("Accessor{index:05}"),
            buffer_view,
            kind: kind.to_string(),
            count,
            elem_size,
            compressed,
        });
        index
    }

    pub fn add_stream(&mut self, stream: &DataStream) -> usize {
        self.add_accessor(
            &stream.data,
            stream.kind.name(),
            stream.len(),
            stream.elem_size,
            stream.is_compressed(),
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BufferDesc {
    uri: String,
    byte_length: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LightDesc {
    r#type: u32,
    color: [f32; 3],
    intensity: f32,
    falloff: u32,
    falloff_radius: f32,
    outer_angle: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CameraDesc {
    vertical_fov: f32,
    near_plane: f32,
    far_plane: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SplineDesc {
    r#type: u32,
    points: usize,
    closed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeDesc {
    name: String,
    id: u32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<u32>,
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    mesh: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    light: Option<LightDesc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    camera: Option<CameraDesc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spline: Option<SplineDesc>,
}

impl NodeDesc {
    fn new(info: &ObjectInfo, kind: &'static str) -> Self {
        Self {
            name: info.name.clone(),
            id: info.id,
            kind,
            parent: info.parent,
            translation: info.local.pos,
            rotation: info.local.quat,
            scale: info.local.scale,
            mesh: None,
            light: None,
            camera: None,
            spline: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MaterialGroupDesc {
    material_id: u32,
    start_index: u32,
    index_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeshDesc {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    indices: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    positions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    normals: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uvs: Option<usize>,
    material_groups: Vec<MaterialGroupDesc>,
    bounding_sphere_center: Vec3,
    bounding_sphere_radius: f32,
}

#[derive(Debug, Serialize)]
struct MaterialDesc<'a> {
    name: &'a str,
    id: u32,
    components: &'a [MaterialComponent],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnimationDesc {
    node: u32,
    track: String,
    accessor: usize,
    step: f32,
    sample_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnimationRangeDesc {
    fps: u32,
    start_frame: i32,
    end_frame: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SdfDesc {
    grid_res: u32,
    grid_min: Vec3,
    grid_max: Vec3,
    data_offset: usize,
    data_size: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SidecarDocument<'a> {
    buffers: Vec<BufferDesc>,
    buffer_views: &'a [BufferView],
    accessors: &'a [Accessor],
    nodes: Vec<NodeDesc>,
    meshes: Vec<MeshDesc>,
    materials: Vec<MaterialDesc<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    animation_range: Option<AnimationRangeDesc>,
    animations: Vec<AnimationDesc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sdf: Option<SdfDesc>,
}

/// Paths written by [`save_sidecar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarFiles {
    pub json: PathBuf,
    pub data: PathBuf,
}

impl SidecarFiles {
    pub fn for_prefix(prefix: &Path) -> Self {
        Self {
            json: crate::output_path(prefix, "json"),
            data: crate::output_path(prefix, "dat"),
        }
    }
}

fn stream_binding(
    ctx: &mut ExportContext,
    mesh: &ExportMesh,
    kinds: &[StreamKind],
) -> Option<usize> {
    mesh.streams
        .iter()
        .find(|s| kinds.contains(&s.kind))
        .map(|s| ctx.add_stream(s))
}

fn mesh_desc(ctx: &mut ExportContext, mesh: &ExportMesh) -> MeshDesc {
    let indices = stream_binding(
        ctx,
        mesh,
        &[StreamKind::Index16, StreamKind::Index32, StreamKind::IndexPacked],
    );
    let positions = stream_binding(ctx, mesh, &[StreamKind::Pos]);
    let normals = stream_binding(ctx, mesh, &[StreamKind::Normal, StreamKind::NormalOct16]);
    let uvs = stream_binding(ctx, mesh, &[StreamKind::Uv, StreamKind::UvSnorm16]);
    let sphere = mesh.bounding_sphere();
    MeshDesc {
        name: mesh.info.name.clone(),
        indices,
        positions,
        normals,
        uvs,
        material_groups: mesh
            .material_groups()
            .iter()
            .map(|g| MaterialGroupDesc {
                material_id: g.material_id,
                start_index: g.start_index,
                index_count: g.index_count,
            })
            .collect(),
        bounding_sphere_center: sphere.center,
        bounding_sphere_radius: sphere.radius,
    }
}

/// Build the JSON document, filling `ctx` with every data region.
pub fn build_document(
    ctx: &mut ExportContext,
    export: &ExportScene<'_>,
    data_uri: &str,
) -> Result<String> {
    let scene = export.scene;
    let mut nodes = Vec::new();
    let mut meshes = Vec::new();

    for null_object in &scene.null_objects {
        nodes.push(NodeDesc::new(&null_object.info, "null"));
    }
    for mesh in &export.meshes {
        let mut node = NodeDesc::new(&mesh.info, "mesh");
        node.mesh = Some(meshes.len());
        meshes.push(mesh_desc(ctx, mesh));
        nodes.push(node);
    }
    for light in &scene.lights {
        let mut node = NodeDesc::new(&light.info, "light");
        node.light = Some(LightDesc {
            r#type: light.kind.type_id(),
            color: light.color,
            intensity: light.intensity,
            falloff: light.falloff as u32,
            falloff_radius: light.falloff_radius,
            outer_angle: light.outer_angle,
        });
        nodes.push(node);
    }
    for camera in &scene.cameras {
        let mut node = NodeDesc::new(&camera.info, "camera");
        node.camera = Some(CameraDesc {
            vertical_fov: camera.vertical_fov,
            near_plane: camera.near_plane,
            far_plane: camera.far_plane,
            target: camera.target,
        });
        nodes.push(node);
    }
    for spline in &scene.splines {
        let mut node = NodeDesc::new(&spline.info, "spline");
        let points = ctx.add_accessor(
            bytemuck::cast_slice(&spline.points),
            "spline_points",
            spline.points.len(),
            12,
            false,
        );
        node.spline = Some(SplineDesc {
            r#type: spline.spline_type as u32,
            points,
            closed: spline.is_closed,
        });
        nodes.push(node);
    }

    let animations = export
        .packed_tracks()
        .into_iter()
        .map(|(node, track)| AnimationDesc {
            node,
            accessor: ctx.add_accessor(&track.data, "anim", track.sample_count, 1, true),
            track: track.name,
            step: track.step,
            sample_count: track.sample_count,
        })
        .collect::<Vec<_>>();
    let animation_range = (!animations.is_empty()).then_some(AnimationRangeDesc {
        fps: scene.animation.fps,
        start_frame: scene.animation.start_frame,
        end_frame: scene.animation.end_frame,
    });

    let sdf = export.sdf.as_ref().map(|grid| {
        let view = ctx.add_region(grid.as_bytes());
        SdfDesc {
            grid_res: grid.resolution,
            grid_min: grid.min,
            grid_max: grid.max,
            data_offset: ctx.buffer_views[view].byte_offset,
            data_size: grid.byte_len(),
        }
    });

    let materials = scene
        .materials
        .iter()
        .map(|m| MaterialDesc {
            name: &m.name,
            id: m.id,
            components: &m.components,
        })
        .collect();

    let document = SidecarDocument {
        buffers: vec![BufferDesc {
            uri: data_uri.to_string(),
            byte_length: ctx.buffer.len(),
        }],
        buffer_views: &ctx.buffer_views,
        accessors: &ctx.accessors,
        nodes,
        meshes,
        materials,
        animation_range,
        animations,
        sdf,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Write `<prefix>.json` and `<prefix>.dat`.
pub fn save_sidecar(export: &ExportScene<'_>, prefix: &Path) -> Result<SidecarFiles> {
    let files = SidecarFiles::for_prefix(prefix);
    let data_uri = files
        .data
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut ctx = ExportContext::new();
    let json = build_document(&mut ctx, export, &data_uri)?;

    let mut out = BufWriter::new(File::create(&files.json)?);
    out.write_all(json.as_bytes())?;
    out.flush()?;
    std::fs::write(&files.data, ctx.buffer())?;

    tracing::info!(
        json = %files.json.display(),
        data_bytes = ctx.buffer().len(),
        accessors = ctx.accessors().len(),
        "Sidecar written"
    );
    Ok(files)
}
