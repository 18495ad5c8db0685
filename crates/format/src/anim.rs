//! Bit-packed animation tracks.
//!
//! Samples are quantized to a fixed step, delta coded against the previous
//! sample, zigzag mapped and written with one bit width for the whole track:
//!
//! ```text
//! varint  sample count
//! 6 bits  width
//! width   zigzag delta, once per sample
//! ```

use boba_scene::Track;

use crate::bits::{BitReader, BitWriter, bits_required, zigzag_decode, zigzag_encode};

/// Quantization step used when none is configured.
pub const DEFAULT_QUANTIZATION_STEP: f32 = 1.0 / 1024.0;

const WIDTH_BITS: u32 = 6;

/// A track ready for the sidecar buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedTrack {
    pub name: String,
    pub step: f32,
    pub sample_count: usize,
    pub data: Vec<u8>,
}

impl PackedTrack {
    pub fn new(track: &Track, step: f32) -> Self {
        Self {
            name: track.name.clone(),
            step,
            sample_count: track.samples.len(),
            data: pack_samples(&track.samples, step),
        }
    }

    pub fn samples(&self) -> Vec<f32> {
        unpack_samples(&self.data, self.step)
    }
}

fn quantize(sample: f32, step: f32) -> i32 {
    (sample / step)
        .round()
        .clamp(i32::MIN as f32, i32::MAX as f32) as i32
}

pub fn pack_samples(samples: &[f32], step: f32) -> Vec<u8> {
    let mut prev = 0i32;
    let deltas: Vec<u32> = samples
        .iter()
        .map(|&s| {
            let q = quantize(s, step);
            let delta = zigzag_encode(q.wrapping_sub(prev));
            prev = q;
            delta
        })
        .collect();
    let width = deltas.iter().copied().map(bits_required).max().unwrap_or(1);

    let mut writer = BitWriter::new();
    writer.write_varint(samples.len() as u32);
    writer.write(width, WIDTH_BITS);
    for delta in deltas {
        writer.write(delta, width);
    }
    writer.into_bytes()
}

pub fn unpack_samples(data: &[u8], step: f32) -> Vec<f32> {
    let mut reader = BitReader::from_bytes(data);
    let count = reader.read_varint() as usize;
    let width = reader.read(WIDTH_BITS).clamp(1, 32);
    let mut samples = Vec::with_capacity(count.min(data.len() * 8));
    let mut q = 0i32;
    for _ in 0..count {
        if reader.eof() {
            break;
        }
        q = q.wrapping_add(zigzag_decode(reader.read(width)));
        samples.push(q as f32 * step);
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_within_half_a_step() {
        let step = DEFAULT_QUANTIZATION_STEP;
        let samples: Vec<f32> = (0..120).map(|f| (f as f32 * 0.1).sin() * 3.0).collect();
        let decoded = unpack_samples(&pack_samples(&samples, step), step);
        assert_eq!(decoded.len(), samples.len());
        for (a, b) in samples.iter().zip(&decoded) {
            assert!((a - b).abs() <= step * 0.5 + 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn test_constant_track_uses_one_bit() {
        let step = 0.5;
        let packed = pack_samples(&[0.0; 16], step);
        // 8 bit count + 6 bit width + 16 one-bit deltas
        assert_eq!(packed.len(), 4);
        assert_eq!(unpack_samples(&packed, step), vec![0.0; 16]);
    }

    #[test]
    fn test_empty_track() {
        let packed = pack_samples(&[], 0.1);
        assert!(unpack_samples(&packed, 0.1).is_empty());
    }

    #[test]
    fn test_packed_track() {
        let track = Track {
            name: "pos.x".into(),
            samples: vec![1.0, 1.5, -2.0],
        };
        let packed = PackedTrack::new(&track, 0.25);
        assert_eq!(packed.sample_count, 3);
        assert_eq!(packed.samples(), track.samples);
    }
}
