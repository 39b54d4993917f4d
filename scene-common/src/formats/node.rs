//! Per-node metadata block
//!
//! # Layout
//! ```text
//! 0x00: base_color [f32; 3]
//! 0x0C: metallic f32
//! 0x10: roughness f32
//! 0x14: emission_color [f32; 3]
//! 0x20: emission_strength f32
//! 0x24: transform [f32; 16] (column-major)
//! 0x64: vertex_count u32
//! 0x68: index_count u32
//! 0x6C: vertex_offset u32
//! 0x70: vertex_bytes u32
//! 0x74: index_offset u32
//! 0x78: index_bytes u32
//! 0x7C: vertex_format u8
//! 0x7D: position_bits u8
//! 0x7E: normal_bits u8
//! 0x7F: index_bits u8
//! 0x80: bounds_min [f32; 3]
//! 0x8C: bounds_extent [f32; 3]
//! ```
//!
//! Offsets are relative to the start of the buffer section. For vertex
//! format flags and bit depths, see [`crate::packing`].

/// PBR material parameters as stored in a node block (36 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeMaterial {
    pub base_color: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub emission_color: [f32; 3],
    pub emission_strength: f32,
}

/// Per-node header (152 bytes)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetherNodeHeader {
    pub material: NodeMaterial,
    pub transform: [f32; 16],
    pub vertex_count: u32,
    pub index_count: u32,
    pub vertex_offset: u32,
    pub vertex_bytes: u32,
    pub index_offset: u32,
    pub index_bytes: u32,
    pub vertex_format: u8,
    pub position_bits: u8,
    pub normal_bits: u8,
    pub index_bits: u8,
    pub bounds_min: [f32; 3],
    pub bounds_extent: [f32; 3],
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn f32(&mut self) -> f32 {
        let b = &self.bytes[self.pos..self.pos + 4];
        self.pos += 4;
        f32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }

    fn u32(&mut self) -> u32 {
        let b = &self.bytes[self.pos..self.pos + 4];
        self.pos += 4;
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }

    fn u8(&mut self) -> u8 {
        let b = self.bytes[self.pos];
        self.pos += 1;
        b
    }

    fn vec3(&mut self) -> [f32; 3] {
        [self.f32(), self.f32(), self.f32()]
    }
}

impl NetherNodeHeader {
    pub const SIZE: usize = 152;

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        let mut pos = 0;
        let mut put = |chunk: &[u8]| {
            bytes[pos..pos + chunk.len()].copy_from_slice(chunk);
            pos += chunk.len();
        };

        let m = &self.material;
        for v in m.base_color {
            put(&v.to_le_bytes());
        }
        put(&m.metallic.to_le_bytes());
        put(&m.roughness.to_le_bytes());
        for v in m.emission_color {
            put(&v.to_le_bytes());
        }
        put(&m.emission_strength.to_le_bytes());
        for v in self.transform {
            put(&v.to_le_bytes());
        }
        for v in [
            self.vertex_count,
            self.index_count,
            self.vertex_offset,
            self.vertex_bytes,
            self.index_offset,
            self.index_bytes,
        ] {
            put(&v.to_le_bytes());
        }
        put(&[
            self.vertex_format,
            self.position_bits,
            self.normal_bits,
            self.index_bits,
        ]);
        for v in self.bounds_min.into_iter().chain(self.bounds_extent) {
            put(&v.to_le_bytes());
        }

        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let mut c = Cursor { bytes, pos: 0 };

        let material = NodeMaterial {
            base_color: c.vec3(),
            metallic: c.f32(),
            roughness: c.f32(),
            emission_color: c.vec3(),
            emission_strength: c.f32(),
        };
        let mut transform = [0.0; 16];
        for v in &mut transform {
            *v = c.f32();
        }

        Some(Self {
            material,
            transform,
            vertex_count: c.u32(),
            index_count: c.u32(),
            vertex_offset: c.u32(),
            vertex_bytes: c.u32(),
            index_offset: c.u32(),
            index_bytes: c.u32(),
            vertex_format: c.u8(),
            position_bits: c.u8(),
            normal_bits: c.u8(),
            index_bits: c.u8(),
            bounds_min: c.vec3(),
            bounds_extent: c.vec3(),
        })
    }

    /// Number of triangles described by the index blob
    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NetherNodeHeader {
        NetherNodeHeader {
            material: NodeMaterial {
                base_color: [0.2, 0.4, 0.6],
                metallic: 0.5,
                roughness: 0.25,
                emission_color: [1.0, 0.0, 0.0],
                emission_strength: 2.0,
            },
            transform: [
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 3.0, 4.0, 5.0, 1.0,
            ],
            vertex_count: 24,
            index_count: 36,
            vertex_offset: 0,
            vertex_bytes: 576,
            index_offset: 576,
            index_bytes: 144,
            vertex_format: 1,
            position_bits: 32,
            normal_bits: 32,
            index_bits: 32,
            bounds_min: [-1.0, -1.0, -1.0],
            bounds_extent: [2.0, 2.0, 2.0],
        }
    }

    #[test]
    fn test_node_header_roundtrip() {
        let header = sample();
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), NetherNodeHeader::SIZE);

        let parsed = NetherNodeHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.triangle_count(), 12);
    }

    #[test]
    fn test_node_header_field_offsets() {
        let bytes = sample().to_bytes();
        // metallic
        assert_eq!(f32::from_le_bytes(bytes[12..16].try_into().unwrap()), 0.5);
        // translation x in column-major transform
        assert_eq!(f32::from_le_bytes(bytes[84..88].try_into().unwrap()), 3.0);
        // vertex_count
        assert_eq!(u32::from_le_bytes(bytes[100..104].try_into().unwrap()), 24);
        // vertex_format
        assert_eq!(bytes[124], 1);
    }

    #[test]
    fn test_node_header_too_short() {
        let bytes = sample().to_bytes();
        assert!(NetherNodeHeader::from_bytes(&bytes[..100]).is_none());
    }
}
