//! NetherScene file header
//!
//! # Layout
//! ```text
//! 0x00: magic b"NCSC"
//! 0x04: version u16
//! 0x06: flags u16 (bit 0 = compressed)
//! 0x08: node_count u32
//! 0x0C: compression_level u8
//! 0x0D: padding (3 bytes)
//! ```

/// Magic bytes at the start of every scene file
pub const SCENE_MAGIC: [u8; 4] = *b"NCSC";

/// Current format version
pub const SCENE_VERSION: u16 = 1;

/// Header flag: vertex and index blobs are quantized and bit-packed
pub const FLAG_COMPRESSED: u16 = 1;

/// NetherScene header (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct NetherSceneHeader {
    pub version: u16,
    pub flags: u16,
    pub node_count: u32,
    pub compression_level: u8,
    pub _padding: [u8; 3],
}

impl NetherSceneHeader {
    pub const SIZE: usize = 16;

    pub fn new(node_count: u32, compression: Option<u8>) -> Self {
        Self {
            version: SCENE_VERSION,
            flags: if compression.is_some() { FLAG_COMPRESSED } else { 0 },
            node_count,
            compression_level: compression.unwrap_or(0),
            _padding: [0; 3],
        }
    }

    /// Whether node blobs are quantized
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&SCENE_MAGIC);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.flags.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.node_count.to_le_bytes());
        bytes[12] = self.compression_level;
        // padding bytes stay 0
        bytes
    }

    /// Read header from bytes
    ///
    /// Returns `None` on short input, wrong magic or an unknown version.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE || bytes[0..4] != SCENE_MAGIC {
            return None;
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != SCENE_VERSION {
            return None;
        }
        Some(Self {
            version,
            flags: u16::from_le_bytes([bytes[6], bytes[7]]),
            node_count: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            compression_level: bytes[12],
            _padding: [0; 3],
        })
    }
}
