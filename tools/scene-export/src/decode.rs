//! Scene decoder (.ncscene -> attribute arrays)
//!
//! Used by `scene-export inspect` and by tests that check what the encoder
//! produced. Quantized attributes come back dequantized.

use scene_common::{
    BitReader, FORMAT_NORMAL, FORMAT_UV, NetherNodeHeader, NetherSceneHeader, dequantize_range,
    unpack_normal_octahedral, unpack_uv_f16, vertex_stride_bits,
};

use crate::error::ExportError;

type Result<T> = std::result::Result<T, ExportError>;

/// One decoded node
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedNode {
    pub header: NetherNodeHeader,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

/// A decoded scene file
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedScene {
    pub header: NetherSceneHeader,
    pub nodes: Vec<DecodedNode>,
}

impl DecodedScene {
    pub fn vertex_count(&self) -> usize {
        self.nodes.iter().map(|n| n.positions.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.nodes.iter().map(|n| n.indices.len() / 3).sum()
    }
}

fn malformed(reason: impl Into<String>) -> ExportError {
    ExportError::Decode(reason.into())
}

/// Parse a complete scene file
pub fn decode_scene(bytes: &[u8]) -> Result<DecodedScene> {
    let header = NetherSceneHeader::from_bytes(bytes)
        .ok_or_else(|| malformed("missing NCSC header or unsupported version"))?;

    let count = header.node_count as usize;
    let table_end = count
        .checked_mul(NetherNodeHeader::SIZE)
        .and_then(|n| n.checked_add(NetherSceneHeader::SIZE))
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| malformed(format!("{count} node headers do not fit in {} bytes", bytes.len())))?;
    let buffers = &bytes[table_end..];

    let nodes = (0..count)
        .map(|i| {
            let start = NetherSceneHeader::SIZE + i * NetherNodeHeader::SIZE;
            let node = NetherNodeHeader::from_bytes(&bytes[start..])
                .ok_or_else(|| malformed(format!("node {i}: truncated header")))?;
            decode_node(i, node, buffers, header.is_compressed())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DecodedScene { header, nodes })
}

fn blob<'a>(buffers: &'a [u8], node: usize, offset: u32, len: u32) -> Result<&'a [u8]> {
    let start = offset as usize;
    start
        .checked_add(len as usize)
        .and_then(|end| buffers.get(start..end))
        .ok_or_else(|| malformed(format!("node {node}: blob {start}+{len} out of bounds")))
}

fn decode_node(i: usize, header: NetherNodeHeader, buffers: &[u8], compressed: bool) -> Result<DecodedNode> {
    if header.vertex_format & FORMAT_NORMAL == 0 {
        return Err(malformed(format!("node {i}: normals are required")));
    }
    let has_uvs = header.vertex_format & FORMAT_UV != 0;
    let vertices = blob(buffers, i, header.vertex_offset, header.vertex_bytes)?;
    let indices = blob(buffers, i, header.index_offset, header.index_bytes)?;
    let vertex_count = header.vertex_count as usize;
    let truncated = || malformed(format!("node {i}: truncated blob"));

    if compressed {
        for (name, bits) in [
            ("position", header.position_bits),
            ("normal", header.normal_bits),
            ("index", header.index_bits),
        ] {
            if !(1..=32).contains(&bits) {
                return Err(malformed(format!("node {i}: {name} bit depth {bits} outside 1..=32")));
            }
        }
    }

    let stride = vertex_stride_bits(header.vertex_format, compressed, header.position_bits, header.normal_bits);
    if (vertex_count as u64 * stride as u64).div_ceil(8) > vertices.len() as u64 {
        return Err(truncated());
    }

    let mut node = DecodedNode {
        header,
        positions: Vec::with_capacity(vertex_count),
        normals: Vec::with_capacity(vertex_count),
        uvs: Vec::new(),
        indices: Vec::with_capacity(header.index_count as usize),
    };

    if compressed {
        let (pb, nb) = (header.position_bits, header.normal_bits);
        let mut reader = BitReader::new(vertices);
        for _ in 0..vertex_count {
            let mut p = [0.0; 3];
            for (axis, value) in p.iter_mut().enumerate() {
                let code = reader.read(pb).ok_or_else(truncated)?;
                *value = dequantize_range(code, header.bounds_min[axis], header.bounds_extent[axis], pb);
            }
            node.positions.push(p);
            let u = reader.read(nb).ok_or_else(truncated)?;
            let v = reader.read(nb).ok_or_else(truncated)?;
            node.normals.push(unpack_normal_octahedral(u, v, nb));
            if has_uvs {
                let s = reader.read(16).ok_or_else(truncated)? as u16;
                let t = reader.read(16).ok_or_else(truncated)? as u16;
                node.uvs.push(unpack_uv_f16([s, t]));
            }
        }

        let mut reader = BitReader::new(indices);
        for _ in 0..header.index_count {
            node.indices.push(reader.read(header.index_bits).ok_or_else(truncated)?);
        }
    } else {
        let floats_per_vertex = if has_uvs { 8 } else { 6 };
        let floats: Vec<f32> = vertices
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        if floats.len() < vertex_count * floats_per_vertex {
            return Err(truncated());
        }
        for v in floats.chunks_exact(floats_per_vertex).take(vertex_count) {
            node.positions.push([v[0], v[1], v[2]]);
            node.normals.push([v[3], v[4], v[5]]);
            if has_uvs {
                node.uvs.push([v[6], v[7]]);
            }
        }

        node.indices = indices
            .chunks_exact(4)
            .take(header.index_count as usize)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        if node.indices.len() != header.index_count as usize {
            return Err(truncated());
        }
    }

    if let Some(bad) = node.indices.iter().find(|&&index| index >= header.vertex_count) {
        return Err(malformed(format!("node {i}: index {bad} out of range")));
    }
    Ok(node)
}
