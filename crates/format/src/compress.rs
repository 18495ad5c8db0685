//! Optional stream compression applied before a mesh is written.
//!
//! - Normals: octahedral projection stored as two snorm16.
//! - UVs: two snorm16, wrapped into [-1, 1] first.
//! - Indices: varint count followed by zigzag delta varints.

use boba_config::ExportOptions;
use glam::{Vec2, Vec3};
use mesh::{DataStream, StreamKind};

use crate::bits::{BitReader, BitWriter, zigzag_decode, zigzag_encode};
use crate::error::Result;

const SNORM16_MAX: f32 = i16::MAX as f32;

fn to_snorm16(v: f32) -> i16 {
    (v.clamp(-1.0, 1.0) * SNORM16_MAX).round() as i16
}

fn from_snorm16(v: i16) -> f32 {
    (f32::from(v) / SNORM16_MAX).max(-1.0)
}

/// Component-wise sign, treating zero as positive.
fn sign_not_zero(v: Vec2) -> Vec2 {
    Vec2::new(
        if v.x >= 0.0 { 1.0 } else { -1.0 },
        if v.y >= 0.0 { 1.0 } else { -1.0 },
    )
}

fn oct_project(n: Vec3) -> Vec2 {
    let n = n / (n.x.abs() + n.y.abs() + n.z.abs());
    let p = Vec2::new(n.x, n.y);
    if n.z >= 0.0 {
        p
    } else {
        (Vec2::ONE - Vec2::new(p.y, p.x).abs()) * sign_not_zero(p)
    }
}

/// Unit normal from an octahedral pair.
pub fn decode_oct(e: [i16; 2]) -> Vec3 {
    let p = Vec2::new(from_snorm16(e[0]), from_snorm16(e[1]));
    let mut n = Vec3::new(p.x, p.y, 1.0 - p.x.abs() - p.y.abs());
    if n.z < 0.0 {
        let xy = Vec2::new(n.x, n.y);
        let folded = (Vec2::ONE - Vec2::new(n.y, n.x).abs()) * sign_not_zero(xy);
        n.x = folded.x;
        n.y = folded.y;
    }
    n.normalize_or_zero()
}

/// Octahedral encoding of a normal, picking whichever of the four
/// neighbouring snorm16 pairs decodes closest to `n`.
pub fn encode_oct(n: Vec3) -> [i16; 2] {
    let n = n.normalize_or_zero();
    if n == Vec3::ZERO {
        return [0, i16::MAX];
    }
    let p = oct_project(n) * SNORM16_MAX;

    let mut best = [to_snorm16(p.x / SNORM16_MAX), to_snorm16(p.y / SNORM16_MAX)];
    let mut best_dot = decode_oct(best).dot(n);
    for x in [p.x.floor(), p.x.ceil()] {
        for y in [p.y.floor(), p.y.ceil()] {
            let candidate = [to_snorm16(x / SNORM16_MAX), to_snorm16(y / SNORM16_MAX)];
            let dot = decode_oct(candidate).dot(n);
            if dot > best_dot {
                best = candidate;
                best_dot = dot;
            }
        }
    }
    best
}

/// Wrap a texture coordinate outside [-1, 1] back into it.
fn wrap_uv(v: f32) -> f32 {
    if (-1.0..=1.0).contains(&v) {
        v
    } else {
        (v + 1.0).rem_euclid(2.0) - 1.0
    }
}

pub fn encode_uv(uv: Vec2) -> [i16; 2] {
    [to_snorm16(wrap_uv(uv.x)), to_snorm16(wrap_uv(uv.y))]
}

pub fn decode_uv(e: [i16; 2]) -> Vec2 {
    Vec2::new(from_snorm16(e[0]), from_snorm16(e[1]))
}

/// Bit-pack an index list as zigzag deltas from the previous index.
pub fn pack_indices(indices: &[u32]) -> Vec<u8> {
    let mut writer = BitWriter::new();
    writer.write_varint(indices.len() as u32);
    let mut prev = 0u32;
    for &index in indices {
        writer.write_varint(zigzag_encode(index.wrapping_sub(prev) as i32));
        prev = index;
    }
    writer.into_bytes()
}

/// Decode [`pack_indices`] output. Stops early if `data` runs out before the
/// stored count.
pub fn unpack_indices(data: &[u8]) -> Vec<u32> {
    let mut reader = BitReader::from_bytes(data);
    let count = reader.read_varint() as usize;
    // Every delta takes at least one byte
    let mut indices = Vec::with_capacity(count.min(data.len()));
    let mut prev = 0u32;
    for _ in 0..count {
        if reader.eof() {
            break;
        }
        prev = prev.wrapping_add(zigzag_decode(reader.read_varint()) as u32);
        indices.push(prev);
    }
    indices
}

/// Apply the compressions enabled in `options` to a mesh's streams.
pub fn compress_streams(
    streams: Vec<DataStream>,
    options: &ExportOptions,
) -> Result<Vec<DataStream>> {
    streams
        .into_iter()
        .map(|stream| -> Result<DataStream> {
            Ok(match stream.kind {
                StreamKind::Normal if options.compress_vertices => {
                    let encoded: Vec<[i16; 2]> =
                        stream.read_vec3()?.into_iter().map(encode_oct).collect();
                    DataStream::from_slice(StreamKind::NormalOct16, &encoded)
                }
                StreamKind::Uv if options.compress_vertices => {
                    let encoded: Vec<[i16; 2]> = stream
                        .read::<[f32; 2]>()?
                        .into_iter()
                        .map(|uv| encode_uv(Vec2::from_array(uv)))
                        .collect();
                    DataStream::from_slice(StreamKind::UvSnorm16, &encoded)
                }
                StreamKind::Index16 | StreamKind::Index32 if options.compress_indices => {
                    DataStream::encoded(
                        StreamKind::IndexPacked,
                        pack_indices(&stream.read_indices()?),
                    )
                }
                _ => stream,
            })
        })
        .collect()
}
