//! Mesh combining utilities
//!
//! Functions for merging multiple meshes into a single mesh.

use glam::Mat4;

use super::modifiers::{MeshModifier, Transform};
use super::types::MeshBuffer;
use crate::error::Result;

/// Combine multiple meshes into one
///
/// Merges multiple meshes by concatenating their vertex and face data.
/// Index offsets are adjusted automatically. If any mesh has UVs, the output
/// will have UVs (meshes without UVs get zero UVs).
///
/// # Example
/// ```no_run
/// use proc_gen::mesh::*;
///
/// let a = cuboid(glam::Vec3::ONE)?;
/// let b = sphere(0.5, 8, 4)?;
///
/// let combined = combine(&[&a, &b]);
/// # Ok::<(), proc_gen::GenError>(())
/// ```
pub fn combine(meshes: &[&MeshBuffer]) -> MeshBuffer {
    let mut result = MeshBuffer::new();

    let total_vertices: usize = meshes.iter().map(|m| m.vertex_count()).sum();
    let total_faces: usize = meshes.iter().map(|m| m.face_count()).sum();
    let has_any_uvs = meshes.iter().any(|m| m.has_uvs());

    result.positions.reserve(total_vertices);
    result.normals.reserve(total_vertices);
    result.faces.reserve(total_faces);
    if has_any_uvs {
        result.uvs.reserve(total_vertices);
    }

    for mesh in meshes {
        if mesh.positions.is_empty() {
            continue;
        }

        let vertex_offset = result.positions.len() as u32;

        result.positions.extend_from_slice(&mesh.positions);
        result.normals.extend_from_slice(&mesh.normals);

        if has_any_uvs {
            if mesh.has_uvs() {
                result.uvs.extend_from_slice(&mesh.uvs);
            } else {
                result.uvs.resize(result.positions.len(), [0.0, 0.0]);
            }
        }

        result.faces.extend(
            mesh.faces
                .iter()
                .map(|face| face.iter().map(|&i| vertex_offset + i).collect()),
        );
    }

    result
}

/// Combine multiple meshes with per-mesh transforms
///
/// Applies a transformation matrix to each mesh before combining them.
/// Fails if any matrix is singular or non-finite.
///
/// # Example
/// ```no_run
/// use proc_gen::mesh::*;
/// use glam::{Mat4, Vec3};
///
/// let tooth = cuboid(Vec3::splat(0.08))?;
/// let teeth = combine_transformed(&[
///     (&tooth, Mat4::from_translation(Vec3::X)),
///     (&tooth, Mat4::from_translation(-Vec3::X)),
/// ])?;
/// # Ok::<(), proc_gen::GenError>(())
/// ```
pub fn combine_transformed(meshes: &[(&MeshBuffer, Mat4)]) -> Result<MeshBuffer> {
    let transformed = meshes
        .iter()
        .map(|(mesh, matrix)| Transform::from_matrix(*matrix).apply_to(mesh))
        .collect::<Result<Vec<_>>>()?;

    let mesh_refs: Vec<&MeshBuffer> = transformed.iter().collect();
    Ok(combine(&mesh_refs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives::{cuboid, sphere};
    use crate::mesh::text::{TextParams, text};
    use glam::Vec3;

    #[test]
    fn test_combine_empty() {
        let result = combine(&[]);
        assert_eq!(result.vertex_count(), 0);
        assert_eq!(result.face_count(), 0);
    }

    #[test]
    fn test_combine_index_offset() {
        let a = cuboid(Vec3::ONE).unwrap();
        let b = sphere(0.5, 8, 4).unwrap();

        let combined = combine(&[&a, &b]);

        assert_eq!(combined.vertex_count(), a.vertex_count() + b.vertex_count());
        assert_eq!(combined.face_count(), a.face_count() + b.face_count());
        assert!(combined.validate().is_ok());
        // Both parts stay closed, so the union does too
        assert!(combined.is_closed());
        assert_eq!(combined.euler_characteristic(), 4);
    }

    #[test]
    fn test_combine_pads_missing_uvs() {
        let glyph = text(&TextParams::new("I", 1.0, 0.1)).unwrap();
        let cube = cuboid(Vec3::ONE).unwrap();

        let combined = combine(&[&cube, &glyph]);
        assert_eq!(combined.uvs.len(), combined.vertex_count());
        assert!(combined.uvs[..cube.vertex_count()].iter().all(|uv| *uv == [0.0, 0.0]));
    }

    #[test]
    fn test_combine_transformed() {
        let mesh = cuboid(Vec3::ONE).unwrap();

        let combined = combine_transformed(&[
            (&mesh, Mat4::from_translation(Vec3::X)),
            (&mesh, Mat4::from_translation(-Vec3::X)),
        ])
        .unwrap();

        assert_eq!(combined.vertex_count(), mesh.vertex_count() * 2);
        let (min, max) = combined.bounds().unwrap();
        assert!((min.x + 1.5).abs() < 1e-6 && (max.x - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_combine_transformed_rejects_singular() {
        let mesh = cuboid(Vec3::ONE).unwrap();
        assert!(combine_transformed(&[(&mesh, Mat4::ZERO)]).is_err());
    }
}
