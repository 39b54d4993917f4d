//! Scene encoder (Scene -> .ncscene)
//!
//! Each node is triangulated, deduplicated and packed into a vertex blob and
//! an index blob. With compression enabled, positions are quantized inside
//! the node bounds, normals are octahedral-encoded, UVs are stored as f16 and
//! indices are bit-packed to the narrowest width that addresses every vertex.

use std::path::{Path, PathBuf};

use glam::Vec3;
use hashbrown::HashMap;
use proc_gen::mesh::MeshBuffer;
use proc_gen::{GenError, Material, Scene};
use scene_common::{
    BitWriter, FORMAT_NORMAL, FORMAT_UV, MAX_COMPRESSION_LEVEL, NetherNodeHeader,
    NetherSceneHeader, NodeMaterial, index_bits, normal_bits, pack_normal_octahedral, pack_uv_f16,
    position_bits, quantize_range,
};
use tracing::{debug, info};

use crate::error::ExportError;
use crate::writer::write_atomic;

type Result<T> = std::result::Result<T, ExportError>;

/// Encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportOptions {
    /// Quantization level in `0..=MAX_COMPRESSION_LEVEL`; `None` stores f32/u32
    pub compression: Option<u8>,
}

impl ExportOptions {
    pub fn uncompressed() -> Self {
        Self { compression: None }
    }

    pub fn compressed(level: u8) -> Self {
        Self {
            compression: Some(level),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.compression {
            Some(level) if level > MAX_COMPRESSION_LEVEL => Err(ExportError::Options(format!(
                "compression level {level} is outside [0, {MAX_COMPRESSION_LEVEL}]"
            ))),
            _ => Ok(()),
        }
    }
}

/// Totals of an encoded scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneStats {
    pub nodes: usize,
    pub vertices: usize,
    pub triangles: usize,
}

/// Encoded file contents plus totals
#[derive(Debug, Clone)]
pub struct EncodedScene {
    pub bytes: Vec<u8>,
    pub stats: SceneStats,
}

/// What was written by [`export_scene`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub bytes: usize,
    pub nodes: usize,
    pub vertices: usize,
    pub triangles: usize,
}

/// Triangulated, deduplicated geometry of one node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

/// Bit pattern of one vertex; equal keys are exactly equal vertices
type VertexKey = ([u32; 3], [u32; 3], [u32; 2]);

/// Triangulate and merge bit-identical vertices
///
/// Vertices are emitted in order of first reference, so vertices no
/// triangle uses are dropped.
pub fn flatten_mesh(mesh: &MeshBuffer) -> NodeGeometry {
    let mut geometry = NodeGeometry::default();
    let mut remap: HashMap<VertexKey, u32> = HashMap::new();
    let has_uvs = mesh.has_uvs();

    for triangle in mesh.triangulate() {
        for source in triangle {
            let i = source as usize;
            let position = mesh.positions[i];
            let normal = mesh.normals[i];
            let uv = if has_uvs { mesh.uvs[i] } else { [0.0; 2] };
            let key: VertexKey = (
                bytemuck::cast(position),
                bytemuck::cast(normal),
                bytemuck::cast(uv),
            );

            let index = *remap.entry(key).or_insert_with(|| {
                geometry.positions.push(position);
                geometry.normals.push(normal);
                if has_uvs {
                    geometry.uvs.push(uv);
                }
                geometry.positions.len() as u32 - 1
            });
            geometry.indices.push(index);
        }
    }
    geometry
}

fn node_material(node: usize, material: &Material) -> Result<NodeMaterial> {
    let malformed = material
        .base_color
        .iter()
        .chain(&material.emission_color)
        .chain([&material.metallic, &material.roughness, &material.emission_strength])
        .any(|v| !v.is_finite() || *v < 0.0);
    if malformed || material.metallic > 1.0 || material.roughness > 1.0 {
        return Err(ExportError::encoding(node, format!("malformed material {material:?}")));
    }
    Ok(NodeMaterial {
        base_color: material.base_color,
        metallic: material.metallic,
        roughness: material.roughness,
        emission_color: material.emission_color,
        emission_strength: material.emission_strength,
    })
}

/// Encoded blobs and layout of one node
struct EncodedNode {
    header: NetherNodeHeader,
    vertex_blob: Vec<u8>,
    index_blob: Vec<u8>,
}

fn encode_node(index: usize, scene: &Scene, options: &ExportOptions) -> Result<EncodedNode> {
    let node = &scene.nodes[index];
    if node.mesh.is_empty() {
        return Err(ExportError::encoding(index, "mesh is empty"));
    }
    node.mesh
        .validate()
        .map_err(|reason| ExportError::encoding(index, reason))?;
    if !node.transform.is_finite() {
        return Err(ExportError::encoding(index, "transform contains non-finite values"));
    }

    let material = scene.material(node).ok_or_else(|| GenError::NotFound {
        kind: "material",
        name: node.name.clone().unwrap_or_else(|| format!("#{}", node.material.index())),
    })?;
    let material = node_material(index, material)?;

    let geometry = flatten_mesh(&node.mesh);
    let vertex_count = u32::try_from(geometry.positions.len())
        .map_err(|_| ExportError::encoding(index, "more than u32::MAX vertices"))?;
    let index_count = u32::try_from(geometry.indices.len())
        .map_err(|_| ExportError::encoding(index, "more than u32::MAX indices"))?;

    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for p in &geometry.positions {
        min = min.min(Vec3::from(*p));
        max = max.max(Vec3::from(*p));
    }
    let extent = max - min;

    let mut vertex_format = FORMAT_NORMAL;
    if !geometry.uvs.is_empty() {
        vertex_format |= FORMAT_UV;
    }

    let (vertex_blob, index_blob, pos_bits, nrm_bits, idx_bits) = match options.compression {
        None => {
            let (vertices, indices) = pack_raw(&geometry);
            (vertices, indices, 32, 32, 32)
        }
        Some(level) => {
            let pos_bits = position_bits(level);
            let nrm_bits = normal_bits(level);
            let idx_bits = index_bits(vertex_count);
            let (vertices, indices) = pack_quantized(&geometry, min, extent, pos_bits, nrm_bits, idx_bits);
            (vertices, indices, pos_bits, nrm_bits, idx_bits)
        }
    };

    let vertex_bytes = u32::try_from(vertex_blob.len())
        .map_err(|_| ExportError::encoding(index, "vertex blob exceeds u32::MAX bytes"))?;
    let index_bytes = u32::try_from(index_blob.len())
        .map_err(|_| ExportError::encoding(index, "index blob exceeds u32::MAX bytes"))?;

    debug!(
        node = index,
        vertices = vertex_count,
        merged = node.mesh.vertex_count() as i64 - vertex_count as i64,
        triangles = index_count / 3,
        vertex_bytes,
        index_bytes,
        "encoded node"
    );

    Ok(EncodedNode {
        header: NetherNodeHeader {
            material,
            transform: node.transform.to_cols_array(),
            vertex_count,
            index_count,
            vertex_offset: 0,
            vertex_bytes,
            index_offset: 0,
            index_bytes,
            vertex_format,
            position_bits: pos_bits,
            normal_bits: nrm_bits,
            index_bits: idx_bits,
            bounds_min: min.to_array(),
            bounds_extent: extent.to_array(),
        },
        vertex_blob,
        index_blob,
    })
}

/// f32 attributes and u32 indices, little-endian
fn pack_raw(geometry: &NodeGeometry) -> (Vec<u8>, Vec<u8>) {
    let has_uvs = !geometry.uvs.is_empty();
    let stride = if has_uvs { 32 } else { 24 };
    let mut vertices = Vec::with_capacity(geometry.positions.len() * stride);
    for i in 0..geometry.positions.len() {
        let uv = if has_uvs { &geometry.uvs[i][..] } else { &[] };
        for v in geometry.positions[i].iter().chain(&geometry.normals[i]).chain(uv) {
            vertices.extend_from_slice(&v.to_le_bytes());
        }
    }

    let mut indices = Vec::with_capacity(geometry.indices.len() * 4);
    for i in &geometry.indices {
        indices.extend_from_slice(&i.to_le_bytes());
    }
    (vertices, indices)
}

/// Quantized attributes and bit-packed indices
fn pack_quantized(
    geometry: &NodeGeometry,
    min: Vec3,
    extent: Vec3,
    pos_bits: u8,
    nrm_bits: u8,
    idx_bits: u8,
) -> (Vec<u8>, Vec<u8>) {
    let has_uvs = !geometry.uvs.is_empty();
    let mut vertices = BitWriter::new();
    for i in 0..geometry.positions.len() {
        let p = geometry.positions[i];
        for axis in 0..3 {
            vertices.write(quantize_range(p[axis], min[axis], extent[axis], pos_bits), pos_bits);
        }
        let (u, v) = pack_normal_octahedral(geometry.normals[i], nrm_bits);
        vertices.write(u, nrm_bits);
        vertices.write(v, nrm_bits);
        if has_uvs {
            for half in pack_uv_f16(geometry.uvs[i]) {
                vertices.write(half as u32, 16);
            }
        }
    }

    let mut indices = BitWriter::new();
    for &i in &geometry.indices {
        indices.write(i, idx_bits);
    }
    (vertices.into_bytes(), indices.into_bytes())
}

/// Encode a scene to bytes
///
/// Fails with the index of the first node that cannot be encoded.
pub fn encode_scene(scene: &Scene, options: &ExportOptions) -> Result<EncodedScene> {
    options.validate()?;
    let node_count = u32::try_from(scene.nodes.len())
        .map_err(|_| ExportError::Options("more than u32::MAX nodes".into()))?;

    let mut nodes = (0..scene.nodes.len())
        .map(|i| encode_node(i, scene, options))
        .collect::<Result<Vec<_>>>()?;

    // Lay out blobs back to back in the buffer section
    let mut offset: u64 = 0;
    for (i, node) in nodes.iter_mut().enumerate() {
        let overflow = || ExportError::encoding(i, "buffer section exceeds u32::MAX bytes");
        node.header.vertex_offset = u32::try_from(offset).map_err(|_| overflow())?;
        offset += node.header.vertex_bytes as u64;
        node.header.index_offset = u32::try_from(offset).map_err(|_| overflow())?;
        offset += node.header.index_bytes as u64;
    }

    let header = NetherSceneHeader::new(node_count, options.compression);
    let total = NetherSceneHeader::SIZE + nodes.len() * NetherNodeHeader::SIZE + offset as usize;
    let mut bytes = Vec::with_capacity(total);
    bytes.extend_from_slice(&header.to_bytes());
    for node in &nodes {
        bytes.extend_from_slice(&node.header.to_bytes());
    }
    let mut stats = SceneStats {
        nodes: nodes.len(),
        ..SceneStats::default()
    };
    for node in &nodes {
        bytes.extend_from_slice(&node.vertex_blob);
        bytes.extend_from_slice(&node.index_blob);
        stats.vertices += node.header.vertex_count as usize;
        stats.triangles += node.header.triangle_count() as usize;
    }

    Ok(EncodedScene { bytes, stats })
}

/// Encode a scene and write it atomically to `path`
pub fn export_scene(scene: &Scene, path: &Path, options: &ExportOptions) -> Result<ExportReport> {
    let encoded = encode_scene(scene, options)?;
    write_atomic(path, &encoded.bytes)?;

    let report = ExportReport {
        path: path.to_path_buf(),
        bytes: encoded.bytes.len(),
        nodes: encoded.stats.nodes,
        vertices: encoded.stats.vertices,
        triangles: encoded.stats.triangles,
    };
    info!(
        path = %report.path.display(),
        bytes = report.bytes,
        nodes = report.nodes,
        vertices = report.vertices,
        triangles = report.triangles,
        compression = ?options.compression,
        "exported scene"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;
    use proc_gen::mesh::{cuboid, cylinder};
    use proc_gen::{AssetContext, MaterialParams};

    fn single_node(mesh: MeshBuffer) -> Scene {
        let mut ctx = AssetContext::new("test");
        ctx.define_material("M", &MaterialParams::new(0x336791, 0.5, 0.2))
            .unwrap();
        ctx.add_node(mesh, "M", Mat4::IDENTITY).unwrap();
        ctx.finish()
    }

    #[test]
    fn test_flatten_merges_only_identical_vertices() {
        let mut mesh = MeshBuffer::new();
        mesh.add_vertex(Vec3::ZERO);
        mesh.add_vertex(Vec3::X);
        mesh.add_vertex(Vec3::Y);
        // Exact duplicate of vertex 0, and a near duplicate that must survive
        mesh.add_vertex(Vec3::ZERO);
        mesh.add_vertex(Vec3::new(1e-7, 0.0, 0.0));
        mesh.add_face(&[0, 1, 2]);
        mesh.add_face(&[3, 2, 4]);

        let geometry = flatten_mesh(&mesh);
        assert_eq!(geometry.positions.len(), 4);
        assert_eq!(geometry.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_flatten_drops_unreferenced_vertices() {
        let mut mesh = cuboid(Vec3::ONE).unwrap();
        mesh.add_vertex(Vec3::splat(5.0));
        let geometry = flatten_mesh(&mesh);
        assert_eq!(geometry.positions.len(), 8);
        assert_eq!(geometry.indices.len(), 36);
    }

    #[test]
    fn test_layout_sizes() {
        let scene = single_node(cylinder(0.5, 0.2, 8).unwrap());
        let encoded = encode_scene(&scene, &ExportOptions::uncompressed()).unwrap();
        // 16 vertices, 28 triangles: 16 * 24 + 84 * 4
        let expected = NetherSceneHeader::SIZE + NetherNodeHeader::SIZE + 16 * 24 + 84 * 4;
        assert_eq!(encoded.bytes.len(), expected);
        assert_eq!(encoded.stats.triangles, 28);
    }

    #[test]
    fn test_compression_shrinks_output() {
        let scene = single_node(cylinder(0.5, 0.2, 32).unwrap());
        let raw = encode_scene(&scene, &ExportOptions::uncompressed()).unwrap();
        let packed = encode_scene(&scene, &ExportOptions::compressed(6)).unwrap();
        assert!(packed.bytes.len() < raw.bytes.len() / 2);
        assert_eq!(raw.stats, packed.stats);
    }

    #[test]
    fn test_empty_mesh_is_encoding_error() {
        let scene = single_node(MeshBuffer::new());
        let err = encode_scene(&scene, &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::Encoding { node: 0, .. }), "{err}");
    }

    #[test]
    fn test_bad_index_is_encoding_error() {
        let mut mesh = cuboid(Vec3::ONE).unwrap();
        mesh.add_face(&[0, 1, 99]);
        let err = encode_scene(&single_node(mesh), &ExportOptions::default()).unwrap_err();
        assert!(err.to_string().contains("vertex 99"), "{err}");
    }

    #[test]
    fn test_foreign_material_is_not_found() {
        let mut scene = single_node(cuboid(Vec3::ONE).unwrap());
        scene.materials.clear();
        let err = encode_scene(&scene, &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::NotFound(GenError::NotFound { .. })));
    }

    #[test]
    fn test_rejects_compression_level_out_of_range() {
        let scene = single_node(cuboid(Vec3::ONE).unwrap());
        let options = ExportOptions::compressed(MAX_COMPRESSION_LEVEL + 1);
        assert!(matches!(
            encode_scene(&scene, &options),
            Err(ExportError::Options(_))
        ));
    }
}
