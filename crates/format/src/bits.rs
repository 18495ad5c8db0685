//! Bit-granular writer and reader.
//!
//! Values are packed least significant bit first. The writer patches a 64-bit
//! little-endian window at the current byte, so any write of up to 32 bits
//! lands without splitting across byte boundaries by hand. The reader mirrors
//! it with two 32-bit words.

use byteorder::{ByteOrder, LittleEndian};

/// Initial writer buffer size in bytes.
const INITIAL_CAPACITY: usize = 1024;

/// Low `count` bits set, `count <= 32`.
fn low_mask(count: u32) -> u64 {
    (1u64 << count) - 1
}

/// Appends arbitrary-width values to a growable byte buffer.
#[derive(Debug, Clone)]
pub struct BitWriter {
    buf: Vec<u8>,
    byte_offset: usize,
    bit_offset: u32,
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            buf: vec![0; INITIAL_CAPACITY],
            byte_offset: 0,
            bit_offset: 0,
        }
    }

    /// Append the low `count` bits of `value`. `count` must be at most 32.
    pub fn write(&mut self, value: u32, count: u32) {
        debug_assert!(count <= 32, "bit count {count} out of range");
        if count == 0 {
            return;
        }
        while self.byte_offset + 8 >= self.buf.len() {
            let len = self.buf.len() * 2;
            self.buf.resize(len, 0);
        }

        let window = &mut self.buf[self.byte_offset..self.byte_offset + 8];
        let kept = LittleEndian::read_u64(window) & low_mask(self.bit_offset);
        let prefix = (u64::from(value) & low_mask(count)) << self.bit_offset;
        LittleEndian::write_u64(window, kept | prefix);

        let end = self.bit_offset + count;
        self.byte_offset += (end / 8) as usize;
        self.bit_offset = end % 8;
    }

    /// Append `value` as a varint: 7 bits per byte, least significant group
    /// first, 0x80 set on every byte but the last.
    pub fn write_varint(&mut self, mut value: u32) {
        loop {
            let group = value & 0x7f;
            value >>= 7;
            if value == 0 {
                self.write(group, 8);
                return;
            }
            self.write(group | 0x80, 8);
        }
    }

    pub fn bit_len(&self) -> usize {
        self.byte_offset * 8 + self.bit_offset as usize
    }

    /// Bytes touched so far, rounding a partial byte up.
    pub fn byte_len(&self) -> usize {
        self.byte_offset + (self.bit_offset as usize).div_ceil(8)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.byte_len()]
    }

    /// Append the written bytes to `out` and return the length in bits.
    pub fn copy_out(&self, out: &mut Vec<u8>) -> usize {
        out.extend_from_slice(self.as_bytes());
        self.bit_len()
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.buf.truncate(self.byte_len());
        self.buf
    }
}

/// Reads values written by [`BitWriter`].
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    len_bits: usize,
    byte_offset: usize,
    bit_offset: u32,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8], len_bits: usize) -> Self {
        Self {
            data,
            len_bits,
            byte_offset: 0,
            bit_offset: 0,
        }
    }

    /// Reader over every bit of `data`.
    pub fn from_bytes(data: &'a [u8]) -> Self {
        Self::new(data, data.len() * 8)
    }

    /// Little-endian word at `at`, zero past the end of the data.
    fn word(&self, at: usize) -> u32 {
        let mut bytes = [0u8; 4];
        if at < self.data.len() {
            let end = (at + 4).min(self.data.len());
            bytes[..end - at].copy_from_slice(&self.data[at..end]);
        }
        LittleEndian::read_u32(&bytes)
    }

    /// Read the next `count` bits. `count` must be at most 32.
    pub fn read(&mut self, count: u32) -> u32 {
        debug_assert!(count <= 32, "bit count {count} out of range");
        if count == 0 {
            return 0;
        }
        let lower = u64::from(self.word(self.byte_offset));
        let upper = u64::from(self.word(self.byte_offset + 4));
        let value = ((lower | (upper << 32)) >> self.bit_offset) & low_mask(count);

        let end = self.bit_offset + count;
        self.byte_offset += (end / 8) as usize;
        self.bit_offset = end % 8;
        value as u32
    }

    pub fn read_varint(&mut self) -> u32 {
        let mut value = 0u32;
        let mut shift = 0u32;
        loop {
            let byte = self.read(8);
            value |= (byte & 0x7f).checked_shl(shift).unwrap_or(0);
            if byte & 0x80 == 0 || shift >= 28 {
                return value;
            }
            shift += 7;
        }
    }

    pub fn position(&self) -> usize {
        self.byte_offset * 8 + self.bit_offset as usize
    }

    pub fn eof(&self) -> bool {
        self.position() >= self.len_bits
    }
}

/// Bits needed to store `value`, at least one.
pub fn bits_required(value: u32) -> u32 {
    let mut bits = 1;
    while bits < 32 && u64::from(value) > low_mask(bits) {
        bits += 1;
    }
    bits
}

pub fn zigzag_encode(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

pub fn zigzag_decode(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic value source for the round-trip loops.
    fn lcg(state: &mut u64) -> u32 {
        *state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (*state >> 32) as u32
    }

    #[test]
    fn test_mixed_width_round_trip() {
        let mut state = 7;
        let mut writer = BitWriter::new();
        let mut expected = Vec::new();
        for i in 0..4000u32 {
            let count = i % 32 + 1;
            let value = lcg(&mut state) & low_mask(count) as u32;
            writer.write(value, count);
            expected.push((value, count));
        }
        // 4000 writes of 1..=32 bits outgrow the initial buffer several times
        assert!(writer.byte_len() > INITIAL_CAPACITY);

        let bytes = writer.as_bytes().to_vec();
        let mut reader = BitReader::new(&bytes, writer.bit_len());
        for (value, count) in expected {
            assert_eq!(reader.read(count), value, "width {count}");
        }
        assert!(reader.eof());
    }

    #[test]
    fn test_write_masks_high_bits() {
        let mut writer = BitWriter::new();
        writer.write(0xffff_ffff, 3);
        writer.write(0, 5);
        assert_eq!(writer.as_bytes(), &[0b0000_0111]);
    }

    #[test]
    fn test_full_width_values() {
        let mut writer = BitWriter::new();
        writer.write(1, 1);
        writer.write(u32::MAX, 32);
        writer.write(0x8000_0001, 32);
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 9);

        let mut reader = BitReader::from_bytes(&bytes);
        assert_eq!(reader.read(1), 1);
        assert_eq!(reader.read(32), u32::MAX);
        assert_eq!(reader.read(32), 0x8000_0001);
    }

    #[test]
    fn test_varint_round_trip_and_length() {
        let mut values = vec![0, 1, 127, 128, 16_383, 16_384, (1 << 21) - 1, 1 << 21];
        values.extend([(1 << 28) - 1, 1 << 28, u32::MAX - 1, u32::MAX]);
        let mut state = 3;
        values.extend((0..200).map(|_| lcg(&mut state)));

        for value in values {
            let mut writer = BitWriter::new();
            writer.write_varint(value);
            assert_eq!(
                writer.byte_len() as u32,
                bits_required(value).div_ceil(7),
                "length of {value}"
            );
            let mut reader = BitReader::from_bytes(writer.as_bytes());
            assert_eq!(reader.read_varint(), value);
            assert!(reader.eof());
        }
    }

    #[test]
    fn test_varint_after_unaligned_write() {
        let mut writer = BitWriter::new();
        writer.write(0b101, 3);
        writer.write_varint(300);
        writer.write(1, 1);

        let mut out = vec![0xaa];
        let bits = writer.copy_out(&mut out);
        assert_eq!(bits, 3 + 16 + 1);
        assert_eq!(out.len(), 1 + 3);

        let mut reader = BitReader::new(&out[1..], bits);
        assert_eq!(reader.read(3), 0b101);
        assert_eq!(reader.read_varint(), 300);
        assert_eq!(reader.read(1), 1);
        assert!(reader.eof());
    }

    #[test]
    fn test_bits_required() {
        assert_eq!(bits_required(0), 1);
        assert_eq!(bits_required(1), 1);
        assert_eq!(bits_required(2), 2);
        assert_eq!(bits_required(255), 8);
        assert_eq!(bits_required(256), 9);
        assert_eq!(bits_required(u32::MAX), 32);
    }

    #[test]
    fn test_zigzag() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        assert_eq!(zigzag_encode(i32::MAX), u32::MAX - 1);
        assert_eq!(zigzag_encode(i32::MIN), u32::MAX);
        for n in [0, 1, -1, 63, -64, 1 << 20, i32::MIN, i32::MAX] {
            assert_eq!(zigzag_decode(zigzag_encode(n)), n);
        }
    }
}
