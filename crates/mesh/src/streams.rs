//! Flat per-attribute data streams attached to an exported mesh.

use bytemuck::Pod;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::MeshError;

/// Stream holds an encoded (not directly indexable) payload.
pub const STREAM_FLAG_COMPRESSED: u32 = 1 << 0;

/// Largest index a 16-bit stream can hold.
pub const MAX_INDEX16: u32 = u16::MAX as u32;

/// Layout of a stream's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    Index16 = 0,
    Index32 = 1,
    Pos = 2,
    Normal = 3,
    Uv = 4,
    /// Zigzag delta varints, see `boba_format::compress`
    IndexPacked = 5,
    /// Octahedral normals as two snorm16
    NormalOct16 = 6,
    /// Texture coordinates as two snorm16
    UvSnorm16 = 7,
}

impl StreamKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Index16 => "index16",
            Self::Index32 => "index32",
            Self::Pos => "pos",
            Self::Normal => "normal",
            Self::Uv => "uv",
            Self::IndexPacked => "index_packed",
            Self::NormalOct16 => "normal_oct16",
            Self::UvSnorm16 => "uv_snorm16",
        }
    }

    pub fn type_id(self) -> u32 {
        self as u32
    }

    pub fn is_index(self) -> bool {
        matches!(self, Self::Index16 | Self::Index32 | Self::IndexPacked)
    }
}

/// One attribute (or index) buffer of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct DataStream {
    pub kind: StreamKind,
    pub flags: u32,
    /// Bytes per element; 1 for encoded streams
    pub elem_size: u32,
    pub data: Vec<u8>,
}

impl DataStream {
    pub fn from_slice<T: Pod>(kind: StreamKind, items: &[T]) -> Self {
        Self {
            kind,
            flags: 0,
            elem_size: std::mem::size_of::<T>() as u32,
            data: bytemuck::cast_slice(items).to_vec(),
        }
    }

    /// Wrap an already encoded byte payload.
    pub fn encoded(kind: StreamKind, data: Vec<u8>) -> Self {
        Self {
            kind,
            flags: STREAM_FLAG_COMPRESSED,
            elem_size: 1,
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.elem_size.max(1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & STREAM_FLAG_COMPRESSED != 0
    }

    /// Decode elements of type `T`, which must match `elem_size`.
    pub fn read<T: Pod>(&self) -> Result<Vec<T>, MeshError> {
        let size = std::mem::size_of::<T>();
        if size != self.elem_size as usize || self.data.len() % size != 0 {
            return Err(MeshError::MisalignedStream {
                kind: self.kind,
                len: self.data.len(),
                elem_size: self.elem_size,
            });
        }
        Ok(self
            .data
            .chunks_exact(size)
            .map(bytemuck::pod_read_unaligned)
            .collect())
    }

    /// Widen a plain index stream to 32 bits.
    pub fn read_indices(&self) -> Result<Vec<u32>, MeshError> {
        match self.kind {
            StreamKind::Index16 => Ok(self.read::<u16>()?.into_iter().map(u32::from).collect()),
            _ => self.read::<u32>(),
        }
    }

    pub fn read_vec3(&self) -> Result<Vec<Vec3>, MeshError> {
        Ok(self
            .read::<[f32; 3]>()?
            .into_iter()
            .map(Vec3::from_array)
            .collect())
    }
}

/// Find the first stream of `kind`.
pub fn find_stream(streams: &[DataStream], kind: StreamKind) -> Option<&DataStream> {
    streams.iter().find(|s| s.kind == kind)
}

/// Checked narrowing to 16-bit indices.
pub fn narrow_indices(indices: &[u32]) -> Result<Vec<u16>, MeshError> {
    indices
        .iter()
        .map(|&index| u16::try_from(index).map_err(|_| MeshError::IndexOverflow { index }))
        .collect()
}

/// Build the smallest index stream that holds every index.
pub fn index_stream(indices: &[u32]) -> Result<DataStream, MeshError> {
    let max_index = indices.iter().copied().max().unwrap_or(0);
    if max_index <= MAX_INDEX16 {
        let narrow = narrow_indices(indices)?;
        Ok(DataStream::from_slice(StreamKind::Index16, &narrow))
    } else {
        Ok(DataStream::from_slice(StreamKind::Index32, indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_meshes_use_16_bit_indices() {
        let stream = index_stream(&[0, 1, 2, 65535]).unwrap();
        assert_eq!(stream.kind, StreamKind::Index16);
        assert_eq!(stream.elem_size, 2);
        assert_eq!(stream.read_indices().unwrap(), vec![0, 1, 2, 65535]);
    }

    #[test]
    fn test_large_meshes_use_32_bit_indices() {
        let stream = index_stream(&[0, 70_000, 3]).unwrap();
        assert_eq!(stream.kind, StreamKind::Index32);
        assert_eq!(stream.read_indices().unwrap(), vec![0, 70_000, 3]);
    }

    #[test]
    fn test_narrowing_refuses_to_wrap() {
        let err = narrow_indices(&[1, 65_536]).unwrap_err();
        assert!(matches!(err, MeshError::IndexOverflow { index: 65_536 }));
    }

    #[test]
    fn test_read_vec3_round_trip() {
        let points = [Vec3::new(1.0, 2.0, 3.0), Vec3::new(-4.0, 5.5, 0.25)];
        let stream = DataStream::from_slice(StreamKind::Pos, &points);
        assert_eq!(stream.len(), 2);
        assert_eq!(stream.read_vec3().unwrap(), points.to_vec());
    }

    #[test]
    fn test_read_rejects_wrong_element_size() {
        let stream = DataStream::encoded(StreamKind::IndexPacked, vec![1, 2, 3]);
        assert!(stream.is_compressed());
        assert!(matches!(
            stream.read::<u32>(),
            Err(MeshError::MisalignedStream { .. })
        ));
    }
}
