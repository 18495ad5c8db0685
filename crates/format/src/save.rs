//! Binary scene blob writer.
//!
//! Layout, front to back: header placeholder, null objects, meshes, lights,
//! cameras, materials, splines, deferred data. The header is rewritten at
//! offset 0 once every section's start offset is known.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use boba_config::ExportOptions;
use boba_scene::{Camera, Light, Material, NullObject, ObjectInfo, Spline};

use crate::deferred::DeferredWriter;
use crate::error::{FormatError, Result};
use crate::export::{ExportMesh, ExportScene};
use crate::protocol::{
    BoundingSphereRecord, MaterialGroupRecord, MatrixRecord, SceneBlobHeader, TransformRecord,
};

/// Bytes written per section of the blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub null_object_size: u64,
    pub mesh_size: u64,
    pub light_size: u64,
    pub camera_size: u64,
    pub material_size: u64,
    pub spline_size: u64,
    pub data_size: u64,
}

impl SceneStats {
    pub fn total(&self) -> u64 {
        self.null_object_size
            + self.mesh_size
            + self.light_size
            + self.camera_size
            + self.material_size
            + self.spline_size
            + self.data_size
    }

    pub fn log(&self) {
        let kb = |bytes: u64| bytes as f64 / 1024.0;
        tracing::info!(
            null_objects_kb = kb(self.null_object_size),
            meshes_kb = kb(self.mesh_size),
            lights_kb = kb(self.light_size),
            cameras_kb = kb(self.camera_size),
            materials_kb = kb(self.material_size),
            splines_kb = kb(self.spline_size),
            data_kb = kb(self.data_size),
            total_kb = kb(self.total()),
            "Scene blob written"
        );
    }
}

/// Write `export` to `path` as a binary blob.
pub fn save_scene(
    export: &ExportScene<'_>,
    options: &ExportOptions,
    path: &Path,
) -> Result<SceneStats> {
    let writer = DeferredWriter::<BufWriter<File>>::create(path)?;
    let (stats, _) = write_scene(writer, export, options)?;
    Ok(stats)
}

/// Write `export` through `writer` and close it.
pub fn write_scene<W: Write + Seek>(
    writer: DeferredWriter<W>,
    export: &ExportScene<'_>,
    options: &ExportOptions,
) -> Result<(SceneStats, W)> {
    let mut w = writer.with_strict(options.strict_fixups);
    let mut stats = SceneStats::default();
    let scene = export.scene;

    let mut header = SceneBlobHeader::new(options.protocol_version);
    w.write(&header)?;

    w.start_block_marker();
    header.num_null_objects = scene.null_objects.len() as u32;
    header.null_object_data_start = section_start(&w, header.num_null_objects)?;
    for null_object in &scene.null_objects {
        save_null_object(&mut w, null_object, options)?;
    }
    stats.null_object_size = w.end_block_marker()?;

    w.start_block_marker();
    header.num_meshes = export.meshes.len() as u32;
    header.mesh_data_start = section_start(&w, header.num_meshes)?;
    let mesh_fixups = w.create_fixup_range(export.meshes.len())?;
    for (mesh, fixup) in export.meshes.iter().zip(mesh_fixups) {
        w.insert_fixup(fixup)?;
        save_mesh(&mut w, mesh, options)?;
    }
    stats.mesh_size = w.end_block_marker()?;

    w.start_block_marker();
    header.num_lights = scene.lights.len() as u32;
    header.light_data_start = section_start(&w, header.num_lights)?;
    for light in &scene.lights {
        save_light(&mut w, light, options)?;
    }
    stats.light_size = w.end_block_marker()?;

    w.start_block_marker();
    header.num_cameras = scene.cameras.len() as u32;
    header.camera_data_start = section_start(&w, header.num_cameras)?;
    for camera in &scene.cameras {
        save_camera(&mut w, camera, options)?;
    }
    stats.camera_size = w.end_block_marker()?;

    w.start_block_marker();
    header.num_materials = scene.materials.len() as u32;
    header.material_data_start = section_start(&w, header.num_materials)?;
    for material in &scene.materials {
        save_material(&mut w, material)?;
    }
    stats.material_size = w.end_block_marker()?;

    w.start_block_marker();
    header.num_splines = scene.splines.len() as u32;
    header.spline_data_start = section_start(&w, header.num_splines)?;
    for spline in &scene.splines {
        save_spline(&mut w, spline, options)?;
    }
    stats.spline_size = w.end_block_marker()?;

    w.start_block_marker();
    let fixup_offset = w.write_deferred_data()?;
    header.fixup_offset =
        u32::try_from(fixup_offset).map_err(|_| FormatError::OffsetOverflow(fixup_offset))?;
    stats.data_size = w.end_block_marker()?;

    w.push_file_pos();
    w.set_file_pos(0)?;
    w.write(&header)?;
    w.pop_file_pos()?;

    stats.log();
    Ok((stats, w.close()?))
}

/// Offset of a section's first record, 0 for an empty section.
fn section_start<W: Write + Seek>(w: &DeferredWriter<W>, count: u32) -> Result<u32> {
    if count == 0 {
        return Ok(0);
    }
    let pos = w.file_pos();
    u32::try_from(pos).map_err(|_| FormatError::OffsetOverflow(pos))
}

fn save_base<W: Write + Seek>(
    w: &mut DeferredWriter<W>,
    info: &ObjectInfo,
    options: &ExportOptions,
) -> Result<()> {
    w.add_deferred_string(&info.name)?;
    w.write_u32(info.id)?;
    w.write_u32(info.parent_id())?;
    if options.uses_transform_records() {
        w.write(&TransformRecord::from(&info.local))?;
        w.write(&TransformRecord::from(&info.global))?;
    } else {
        w.write(&MatrixRecord::from(&info.local))?;
        w.write(&MatrixRecord::from(&info.global))?;
    }
    Ok(())
}

fn save_null_object<W: Write + Seek>(
    w: &mut DeferredWriter<W>,
    null_object: &NullObject,
    options: &ExportOptions,
) -> Result<()> {
    save_base(w, &null_object.info, options)
}

fn save_mesh<W: Write + Seek>(
    w: &mut DeferredWriter<W>,
    mesh: &ExportMesh,
    options: &ExportOptions,
) -> Result<()> {
    save_base(w, &mesh.info, options)?;
    w.write(&BoundingSphereRecord::from(mesh.bounding_sphere()))?;

    // Pointers to the material group table and to the stream table
    let group_table = w.create_fixup()?;
    let stream_table = w.create_fixup()?;

    w.insert_fixup(group_table)?;
    let groups = mesh.material_groups();
    w.write_u32(groups.len() as u32)?;
    let group_fixups = w.create_fixup_range(groups.len())?;
    for (group, fixup) in groups.iter().zip(group_fixups) {
        w.insert_fixup(fixup)?;
        w.write(&MaterialGroupRecord::from(group))?;
    }

    w.insert_fixup(stream_table)?;
    w.write_u32(mesh.streams.len() as u32)?;
    let stream_fixups = w.create_fixup_range(mesh.streams.len())?;
    for (stream, fixup) in mesh.streams.iter().zip(stream_fixups) {
        w.insert_fixup(fixup)?;
        w.add_deferred_string(stream.kind.name())?;
        w.write_u32(stream.kind.type_id())?;
        w.write_u32(stream.flags)?;
        w.write_u32(stream.elem_size)?;
        w.write_u32(stream.data.len() as u32)?;
        w.add_deferred_data(&stream.data, false)?;
    }
    Ok(())
}

fn save_light<W: Write + Seek>(
    w: &mut DeferredWriter<W>,
    light: &Light,
    options: &ExportOptions,
) -> Result<()> {
    save_base(w, &light.info, options)?;
    w.write_u32(light.kind.type_id())?;
    let [r, g, b] = light.color;
    w.write(&[r, g, b, 1.0f32])?;
    w.write_f32(light.intensity)?;
    w.write_u32(light.falloff as u32)?;
    w.write_f32(light.falloff_radius)?;
    w.write_f32(light.outer_angle)?;
    Ok(())
}

fn save_camera<W: Write + Seek>(
    w: &mut DeferredWriter<W>,
    camera: &Camera,
    options: &ExportOptions,
) -> Result<()> {
    save_base(w, &camera.info, options)?;
    w.write_f32(camera.vertical_fov)?;
    w.write_f32(camera.near_plane)?;
    w.write_f32(camera.far_plane)?;
    w.write_u32(camera.target.unwrap_or(boba_scene::INVALID_OBJECT_ID))?;
    Ok(())
}

fn save_material<W: Write + Seek>(w: &mut DeferredWriter<W>, material: &Material) -> Result<()> {
    w.start_block_marker();
    w.add_deferred_string(&material.name)?;
    w.write_u32(material.id)?;

    let components = w.create_fixup()?;
    w.insert_fixup(components)?;
    w.write_u32(material.components.len() as u32)?;
    let component_fixups = w.create_fixup_range(material.components.len())?;
    for (component, fixup) in material.components.iter().zip(component_fixups) {
        w.insert_fixup(fixup)?;
        w.add_deferred_string(&component.name)?;
        w.write(&component.color)?;
        w.add_deferred_string(&component.texture)?;
        w.write_f32(component.brightness)?;
    }

    let size = w.end_block_marker()?;
    tracing::debug!(material = %material.name, bytes = size, "Material written");
    Ok(())
}

fn save_spline<W: Write + Seek>(
    w: &mut DeferredWriter<W>,
    spline: &Spline,
    options: &ExportOptions,
) -> Result<()> {
    save_base(w, &spline.info, options)?;
    w.write_u32(spline.spline_type as u32)?;
    w.write_u32(spline.points.len() as u32)?;
    w.add_deferred_vector(&spline.points)?;
    w.write_u8(u8::from(spline.is_closed))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use byteorder::{ByteOrder, LittleEndian};
    use glam::Vec3;

    use super::*;
    use crate::export::fixtures::sample_scene;

    const BASE_SIZE: usize = 4 + 4 + 4 + 2 * 52;

    fn write(options: &ExportOptions) -> (SceneStats, Vec<u8>) {
        let scene = sample_scene();
        let export = ExportScene::new(&scene, options).unwrap();
        let (stats, cursor) =
            write_scene(DeferredWriter::new(Cursor::new(Vec::new())), &export, options).unwrap();
        (stats, cursor.into_inner())
    }

    fn header(bytes: &[u8]) -> SceneBlobHeader {
        bytemuck::pod_read_unaligned(&bytes[..std::mem::size_of::<SceneBlobHeader>()])
    }

    fn target(bytes: &[u8], at: usize) -> usize {
        let relative = LittleEndian::read_i32(&bytes[at..]);
        (at as i64 + i64::from(relative)) as usize
    }

    fn c_string(bytes: &[u8], at: usize) -> &str {
        let end = bytes[at..].iter().position(|b| *b == 0).unwrap();
        std::str::from_utf8(&bytes[at..at + end]).unwrap()
    }

    #[test]
    fn test_header_counts_and_offsets() {
        let (stats, bytes) = write(&ExportOptions::default());
        let h = header(&bytes);
        assert!(h.is_valid());
        assert_eq!(h.version, 4);
        assert_eq!(h.num_null_objects, 1);
        assert_eq!(h.null_object_data_start, 68);
        assert_eq!(h.num_meshes, 1);
        assert_eq!(h.mesh_data_start as usize, 68 + BASE_SIZE);
        assert_eq!(h.num_lights, 1);
        assert_eq!(h.num_cameras, 1);
        assert_eq!(h.num_materials, 2);
        assert_eq!(h.num_splines, 1);
        assert!(h.fixup_offset > h.spline_data_start);
        assert_eq!(stats.total() as usize + 68, bytes.len());
        assert_eq!(stats.null_object_size as usize, BASE_SIZE);
    }

    #[test]
    fn test_base_record() {
        let (_, bytes) = write(&ExportOptions::default());
        let at = header(&bytes).null_object_data_start as usize;
        assert_eq!(c_string(&bytes, target(&bytes, at)), "root");
        assert_eq!(LittleEndian::read_u32(&bytes[at + 4..]), 1);
        assert_eq!(
            LittleEndian::read_u32(&bytes[at + 8..]),
            boba_scene::INVALID_OBJECT_ID
        );
        // Local transform record starts with the position
        assert_eq!(LittleEndian::read_f32(&bytes[at + 12 + 4..]), 2.0);
    }

    #[test]
    fn test_mesh_record_tables() {
        let (_, bytes) = write(&ExportOptions::default());
        let at = header(&bytes).mesh_data_start as usize;

        // Top-level mesh pointer, then the base record
        let mesh = target(&bytes, at);
        assert_eq!(mesh, at + 4);
        assert_eq!(LittleEndian::read_u32(&bytes[mesh + 8..]), 1);

        let tables = mesh + BASE_SIZE + 16;
        let groups = target(&bytes, tables);
        assert_eq!(LittleEndian::read_u32(&bytes[groups..]), 1);
        let group = target(&bytes, groups + 4);
        assert_eq!(LittleEndian::read_u32(&bytes[group..]), 7);
        assert_eq!(LittleEndian::read_u32(&bytes[group + 8..]), 6);

        let streams = target(&bytes, tables + 4);
        assert_eq!(LittleEndian::read_u32(&bytes[streams..]), 4);
        let positions = target(&bytes, streams + 4 + 4);
        assert_eq!(c_string(&bytes, target(&bytes, positions)), "pos");
        assert_eq!(LittleEndian::read_u32(&bytes[positions + 12..]), 12);
        assert_eq!(LittleEndian::read_u32(&bytes[positions + 16..]), 48);
        let data = target(&bytes, positions + 20);
        assert!(data >= header(&bytes).fixup_offset as usize);
        assert_eq!(LittleEndian::read_f32(&bytes[data + 12..]), 1.0);
    }

    #[test]
    fn test_light_alpha_and_camera_target() {
        let (_, bytes) = write(&ExportOptions::default());
        let h = header(&bytes);

        let light = h.light_data_start as usize + BASE_SIZE;
        assert_eq!(LittleEndian::read_u32(&bytes[light..]), 2);
        assert_eq!(LittleEndian::read_f32(&bytes[light + 4 + 12..]), 1.0);
        assert_eq!(LittleEndian::read_f32(&bytes[light + 20..]), 2.0);

        let camera = h.camera_data_start as usize + BASE_SIZE;
        assert_eq!(LittleEndian::read_f32(&bytes[camera + 8..]), 100.0);
        assert_eq!(LittleEndian::read_u32(&bytes[camera + 12..]), 1);
    }

    #[test]
    fn test_materials_and_splines() {
        let (_, bytes) = write(&ExportOptions::default());
        let h = header(&bytes);

        let material = h.material_data_start as usize;
        assert_eq!(c_string(&bytes, target(&bytes, material)), "<default>");
        assert_eq!(LittleEndian::read_u32(&bytes[material + 4..]), !0);
        let components = target(&bytes, material + 8);
        assert_eq!(LittleEndian::read_u32(&bytes[components..]), 1);

        let spline = h.spline_data_start as usize + BASE_SIZE;
        assert_eq!(LittleEndian::read_u32(&bytes[spline + 4..]), 2);
        let points = target(&bytes, spline + 8);
        let second: [f32; 3] = bytemuck::pod_read_unaligned(&bytes[points + 12..points + 24]);
        assert_eq!(Vec3::from_array(second), Vec3::X);
        assert_eq!(bytes[spline + 12], 1);
    }

    #[test]
    fn test_legacy_versions_write_matrices() {
        let options = ExportOptions {
            protocol_version: 3,
            ..Default::default()
        };
        let (_, bytes) = write(&options);
        let h = header(&bytes);
        assert_eq!(h.version, 3);
        assert_eq!(h.mesh_data_start - h.null_object_data_start, 4 + 4 + 4 + 2 * 48);
    }

    #[test]
    fn test_save_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.boba");
        let scene = sample_scene();
        let options = ExportOptions::default();
        let export = ExportScene::new(&scene, &options).unwrap();
        let stats = save_scene(&export, &options, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len() as u64, stats.total() + 68);
        assert!(header(&bytes).is_valid());
    }
}
