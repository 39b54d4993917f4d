//! Vertex attribute packing utilities
//!
//! Provides the conversions used by the `.ncscene` writer and reader:
//! - packed `0xRRGGBB` integers → normalized RGB floats
//! - f32 → fixed bit-depth unsigned integers inside a known range
//! - unit normals → octahedral coordinates at a chosen bit depth
//! - f32 UVs → f16 bit patterns
//! - LSB-first bit packing for compressed vertex and index blobs

use half::f16;

// ============================================================================
// Vertex Format Constants
// ============================================================================

/// Vertex format flag: has normals (3 floats)
pub const FORMAT_NORMAL: u8 = 1;
/// Vertex format flag: has UV coordinates (2 floats)
pub const FORMAT_UV: u8 = 2;

/// Highest accepted compression level
pub const MAX_COMPRESSION_LEVEL: u8 = 8;

/// Position bits per component for a compression level
///
/// Level 0 keeps 16 bits, each level drops one bit down to 8 at level 8.
#[inline]
pub const fn position_bits(level: u8) -> u8 {
    16 - level
}

/// Octahedral normal bits per component for a compression level
#[inline]
pub const fn normal_bits(level: u8) -> u8 {
    12 - level / 2
}

/// Bits needed to address `vertex_count` vertices (at least 1)
#[inline]
pub const fn index_bits(vertex_count: u32) -> u8 {
    if vertex_count <= 1 {
        1
    } else {
        (32 - (vertex_count - 1).leading_zeros()) as u8
    }
}

/// Calculate vertex stride in bits
///
/// Uncompressed vertices store f32 components; compressed vertices store
/// quantized positions, octahedral normals and f16 UVs.
pub const fn vertex_stride_bits(format: u8, compressed: bool, pos_bits: u8, nrm_bits: u8) -> u32 {
    let mut stride = if compressed { 3 * pos_bits as u32 } else { 96 };

    if format & FORMAT_NORMAL != 0 {
        stride += if compressed { 2 * nrm_bits as u32 } else { 96 };
    }
    if format & FORMAT_UV != 0 {
        stride += if compressed { 32 } else { 64 };
    }

    stride
}

// ============================================================================
// Color Expansion
// ============================================================================

/// Expand a packed `0xRRGGBB` value to normalized RGB
///
/// Bits above the low 24 are ignored.
#[inline]
pub fn rgb_from_packed(value: u32) -> [f32; 3] {
    [
        ((value >> 16) & 0xFF) as f32 / 255.0,
        ((value >> 8) & 0xFF) as f32 / 255.0,
        (value & 0xFF) as f32 / 255.0,
    ]
}

// ============================================================================
// Scalar Quantization
// ============================================================================

#[inline]
fn max_code(bits: u8) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

/// Quantize `value` inside `[min, min + extent]` to `bits` bits
///
/// A zero extent maps every value to code 0.
#[inline]
pub fn quantize_range(value: f32, min: f32, extent: f32, bits: u8) -> u32 {
    if extent <= 0.0 {
        return 0;
    }
    let max = max_code(bits) as f32;
    let t = ((value - min) / extent).clamp(0.0, 1.0);
    (t * max).round() as u32
}

/// Inverse of [`quantize_range`]
#[inline]
pub fn dequantize_range(code: u32, min: f32, extent: f32, bits: u8) -> f32 {
    let max = max_code(bits) as f32;
    min + extent * (code as f32 / max)
}

/// Quantize a value in [-1.0, 1.0] to an unsigned `bits`-bit code
#[inline]
pub fn quantize_snorm(value: f32, bits: u8) -> u32 {
    quantize_range(value, -1.0, 2.0, bits)
}

/// Inverse of [`quantize_snorm`]
#[inline]
pub fn dequantize_snorm(code: u32, bits: u8) -> f32 {
    dequantize_range(code, -1.0, 2.0, bits)
}

// ============================================================================
// Normal Packing
// ============================================================================

/// Encode normalized direction to octahedral coordinates in [-1, 1]²
#[inline]
pub fn encode_octahedral(dir: glam::Vec3) -> (f32, f32) {
    let dir = dir.normalize_or_zero();

    let l1_norm = dir.x.abs() + dir.y.abs() + dir.z.abs();
    if l1_norm == 0.0 {
        return (0.0, 0.0);
    }

    let mut u = dir.x / l1_norm;
    let mut v = dir.y / l1_norm;

    if dir.z < 0.0 {
        let u_abs = u.abs();
        let v_abs = v.abs();
        u = (1.0 - v_abs) * if u >= 0.0 { 1.0 } else { -1.0 };
        v = (1.0 - u_abs) * if v >= 0.0 { 1.0 } else { -1.0 };
    }

    (u, v)
}

/// Decode octahedral coordinates in [-1, 1]² back to normalized direction
#[inline]
pub fn decode_octahedral(u: f32, v: f32) -> glam::Vec3 {
    let mut dir = glam::Vec3::new(u, v, 1.0 - u.abs() - v.abs());

    if dir.z < 0.0 {
        let old_x = dir.x;
        dir.x = (1.0 - dir.y.abs()) * if old_x >= 0.0 { 1.0 } else { -1.0 };
        dir.y = (1.0 - old_x.abs()) * if dir.y >= 0.0 { 1.0 } else { -1.0 };
    }

    dir.normalize_or_zero()
}

/// Pack a normal to two octahedral codes of `bits` bits each
#[inline]
pub fn pack_normal_octahedral(normal: [f32; 3], bits: u8) -> (u32, u32) {
    let (u, v) = encode_octahedral(glam::Vec3::from(normal));
    (quantize_snorm(u, bits), quantize_snorm(v, bits))
}

/// Unpack two octahedral codes back to a unit normal
#[inline]
pub fn unpack_normal_octahedral(u: u32, v: u32, bits: u8) -> [f32; 3] {
    decode_octahedral(dequantize_snorm(u, bits), dequantize_snorm(v, bits)).to_array()
}

// ============================================================================
// UV Packing
// ============================================================================

/// Pack a UV coordinate to f16 bit patterns
#[inline]
pub fn pack_uv_f16(uv: [f32; 2]) -> [u16; 2] {
    [f16::from_f32(uv[0]).to_bits(), f16::from_f32(uv[1]).to_bits()]
}

/// Unpack f16 bit patterns back to a UV coordinate
#[inline]
pub fn unpack_uv_f16(bits: [u16; 2]) -> [f32; 2] {
    [f16::from_bits(bits[0]).to_f32(), f16::from_bits(bits[1]).to_f32()]
}

// ============================================================================
// Bit Packing
// ============================================================================

/// LSB-first bit writer for compressed blobs
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `bits` bits of `value`
    pub fn write(&mut self, value: u32, bits: u8) {
        for i in 0..bits {
            if self.bit_len % 8 == 0 {
                self.bytes.push(0);
            }
            if (value >> i) & 1 != 0 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 1 << (self.bit_len % 8);
            }
            self.bit_len += 1;
        }
    }

    /// Number of bits written so far
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Finish writing; the final byte is zero-padded
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// LSB-first bit reader, the counterpart of [`BitWriter`]
#[derive(Debug)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, bit_pos: 0 }
    }

    /// Read `bits` bits, or `None` past the end of the data or for more than 32 bits
    pub fn read(&mut self, bits: u8) -> Option<u32> {
        if bits > 32 || self.bit_pos + bits as usize > self.bytes.len() * 8 {
            return None;
        }
        let mut value = 0u32;
        for i in 0..bits {
            let byte = self.bytes[self.bit_pos / 8];
            if (byte >> (self.bit_pos % 8)) & 1 != 0 {
                value |= 1 << i;
            }
            self.bit_pos += 1;
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_from_packed_react_blue() {
        let [r, g, b] = rgb_from_packed(0x61DAFB);
        assert!((r - 97.0 / 255.0).abs() < 1e-6);
        assert!((g - 218.0 / 255.0).abs() < 1e-6);
        assert!((b - 251.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_rgb_from_packed_ignores_high_byte() {
        assert_eq!(rgb_from_packed(0xFF00_0000), [0.0, 0.0, 0.0]);
        assert_eq!(rgb_from_packed(0xFFFFFF), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_quantize_range_endpoints() {
        assert_eq!(quantize_range(-2.0, -2.0, 4.0, 10), 0);
        assert_eq!(quantize_range(2.0, -2.0, 4.0, 10), 1023);
        // Out-of-range values clamp
        assert_eq!(quantize_range(5.0, -2.0, 4.0, 10), 1023);
        assert_eq!(quantize_range(1.0, 1.0, 0.0, 10), 0);
    }

    #[test]
    fn test_quantize_range_error_bound() {
        let bits = 12;
        let (min, extent) = (-0.5, 1.0);
        let tolerance = extent / max_code(bits) as f32 * 0.5 + 1e-6;
        for i in 0..=100 {
            let value = min + extent * i as f32 / 100.0;
            let code = quantize_range(value, min, extent, bits);
            let back = dequantize_range(code, min, extent, bits);
            assert!((back - value).abs() <= tolerance, "{value} -> {back}");
        }
    }

    #[test]
    fn test_octahedral_roundtrip() {
        let test_dirs = [
            glam::Vec3::new(1.0, 0.0, 0.0),
            glam::Vec3::new(-1.0, 0.0, 0.0),
            glam::Vec3::new(0.0, 1.0, 0.0),
            glam::Vec3::new(0.0, 0.0, 1.0),
            glam::Vec3::new(0.0, 0.0, -1.0),
            glam::Vec3::new(0.577, 0.577, 0.577),
            glam::Vec3::new(-0.3, 0.2, -0.9),
        ];

        for dir in test_dirs {
            let normalized = dir.normalize();
            let (u, v) = pack_normal_octahedral(normalized.to_array(), 12);
            let decoded = glam::Vec3::from(unpack_normal_octahedral(u, v, 12));
            let error = (decoded - normalized).length();
            assert!(error < 0.01, "Roundtrip failed for {:?}", normalized);
        }
    }

    #[test]
    fn test_bit_writer_reader_roundtrip() {
        let mut writer = BitWriter::new();
        writer.write(0b101, 3);
        writer.write(0x3FF, 10);
        writer.write(0, 1);
        writer.write(0xDEAD_BEEF, 32);
        assert_eq!(writer.bit_len(), 46);

        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 6);

        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read(3), Some(0b101));
        assert_eq!(reader.read(10), Some(0x3FF));
        assert_eq!(reader.read(1), Some(0));
        assert_eq!(reader.read(32), Some(0xDEAD_BEEF));
        // Only padding bits remain
        assert_eq!(reader.read(8), None);
    }

    #[test]
    fn test_bit_reader_rejects_wide_reads() {
        let bytes = [0xFF; 8];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read(33), None);
        assert_eq!(reader.read(40), None);
        // A rejected read consumes nothing
        assert_eq!(reader.read(32), Some(u32::MAX));
        assert_eq!(reader.read(32), Some(u32::MAX));
        assert_eq!(reader.read(1), None);
    }

    #[test]
    fn test_index_bits() {
        assert_eq!(index_bits(0), 1);
        assert_eq!(index_bits(1), 1);
        assert_eq!(index_bits(2), 1);
        assert_eq!(index_bits(3), 2);
        assert_eq!(index_bits(256), 8);
        assert_eq!(index_bits(257), 9);
    }

    #[test]
    fn test_bits_shrink_with_level() {
        assert_eq!(position_bits(0), 16);
        assert_eq!(position_bits(MAX_COMPRESSION_LEVEL), 8);
        assert!(normal_bits(MAX_COMPRESSION_LEVEL) < normal_bits(0));
    }

    #[test]
    fn test_vertex_stride_bits() {
        assert_eq!(vertex_stride_bits(0, false, 0, 0), 96);
        assert_eq!(vertex_stride_bits(FORMAT_NORMAL, false, 0, 0), 192);
        assert_eq!(vertex_stride_bits(FORMAT_NORMAL | FORMAT_UV, false, 0, 0), 256);
        assert_eq!(vertex_stride_bits(FORMAT_NORMAL, true, 10, 8), 46);
    }

    #[test]
    fn test_uv_f16_roundtrip() {
        let uv = [0.25, 0.75];
        assert_eq!(unpack_uv_f16(pack_uv_f16(uv)), uv);
    }
}
