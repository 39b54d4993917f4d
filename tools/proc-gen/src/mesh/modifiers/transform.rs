//! Affine transform modifier

use glam::{Mat3, Mat4, Quat, Vec3};

use super::MeshModifier;
use crate::error::{GenError, Result, Stage};
use crate::mesh::types::MeshBuffer;

/// Transform mesh vertices and normals using a 4x4 matrix
///
/// Normals are transformed using the inverse-transpose to handle non-uniform
/// scaling correctly. Mirroring matrices (negative determinant) also reverse
/// face winding so faces keep pointing outward.
///
/// # Example
/// ```no_run
/// use proc_gen::mesh::*;
///
/// let plate = cuboid(glam::Vec3::ONE)?
///     .apply(Transform::scale(0.5, 0.5, 0.1))?
///     .apply(Transform::rotate_z(45.0))?;
/// # Ok::<(), proc_gen::GenError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Mat4,
}

impl Transform {
    pub fn identity() -> Self {
        Self::from_matrix(Mat4::IDENTITY)
    }

    pub fn translate(x: f32, y: f32, z: f32) -> Self {
        Self::from_matrix(Mat4::from_translation(Vec3::new(x, y, z)))
    }

    /// Create a non-uniform scale transform
    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        Self::from_matrix(Mat4::from_scale(Vec3::new(x, y, z)))
    }

    /// Create a rotation around the X axis (in degrees)
    pub fn rotate_x(degrees: f32) -> Self {
        Self::from_matrix(Mat4::from_rotation_x(degrees.to_radians()))
    }

    /// Create a rotation around the Y axis (in degrees)
    pub fn rotate_y(degrees: f32) -> Self {
        Self::from_matrix(Mat4::from_rotation_y(degrees.to_radians()))
    }

    /// Create a rotation around the Z axis (in degrees)
    pub fn rotate_z(degrees: f32) -> Self {
        Self::from_matrix(Mat4::from_rotation_z(degrees.to_radians()))
    }

    pub fn from_matrix(matrix: Mat4) -> Self {
        Self { matrix }
    }

    /// Scale, then rotate by XYZ Euler angles in degrees, then translate
    pub fn from_components(translate: Vec3, rotate_degrees: Vec3, scale: Vec3) -> Self {
        Self::from_matrix(Mat4::from_scale_rotation_translation(
            scale,
            euler_xyz(rotate_degrees),
            translate,
        ))
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }
}

/// XYZ Euler rotation (X applied first), angles in degrees
pub fn euler_xyz(degrees: Vec3) -> Quat {
    let r = degrees * std::f32::consts::PI / 180.0;
    Quat::from_rotation_z(r.z) * Quat::from_rotation_y(r.y) * Quat::from_rotation_x(r.x)
}

impl MeshModifier for Transform {
    fn validate(&self) -> Result<()> {
        if !self.matrix.is_finite() {
            return Err(GenError::domain(Stage::Transform, "matrix", "contains non-finite values"));
        }
        let det = self.matrix.determinant();
        if det.abs() < 1e-12 {
            return Err(GenError::domain(
                Stage::Transform,
                "matrix",
                format!("singular matrix (determinant {det})"),
            ));
        }
        Ok(())
    }

    fn bake(&self, mesh: &MeshBuffer) -> MeshBuffer {
        let normal_matrix = Mat3::from_mat4(self.matrix).inverse().transpose();
        let mut out = mesh.clone();

        for pos in &mut out.positions {
            *pos = self.matrix.transform_point3(Vec3::from(*pos)).to_array();
        }
        for normal in &mut out.normals {
            let n = normal_matrix * Vec3::from(*normal);
            *normal = n.try_normalize().unwrap_or(Vec3::Z).to_array();
        }

        if self.matrix.determinant() < 0.0 {
            for face in &mut out.faces {
                face.reverse();
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives::cuboid;

    #[test]
    fn test_scale_bounds() {
        let mesh = cuboid(Vec3::ONE).unwrap();
        let scaled = Transform::scale(0.5, 0.5, 0.1).apply_to(&mesh).unwrap();
        let (min, max) = scaled.bounds().unwrap();
        assert!((max - min - Vec3::new(0.5, 0.5, 0.1)).length() < 1e-6);
    }

    #[test]
    fn test_non_uniform_scale_keeps_normals_unit() {
        let mesh = cuboid(Vec3::ONE).unwrap();
        let scaled = Transform::scale(3.0, 1.0, 0.2).apply_to(&mesh).unwrap();
        for n in &scaled.normals {
            assert!((Vec3::from(*n).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_mirror_reverses_winding() {
        let mesh = cuboid(Vec3::ONE).unwrap();
        let mirrored = Transform::scale(-1.0, 1.0, 1.0).apply_to(&mesh).unwrap();
        // Outward normals survive: every face normal points away from the centre
        for face in &mirrored.faces {
            let n = mirrored.face_normal(face);
            assert!(n.dot(mirrored.face_centroid(face)) > 0.0);
        }
    }

    #[test]
    fn test_euler_order() {
        // X first, then Z: +Y -> +Z -> +Z
        let q = euler_xyz(Vec3::new(90.0, 0.0, 90.0));
        let v = q * Vec3::Y;
        assert!((v - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_rejects_singular_and_nan() {
        assert!(Transform::scale(1.0, 0.0, 1.0).validate().is_err());
        assert!(Transform::translate(f32::NAN, 0.0, 0.0).validate().is_err());
        assert!(Transform::identity().validate().is_ok());
    }
}
