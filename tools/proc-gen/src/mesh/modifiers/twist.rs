//! Axial twist deform

use glam::{Quat, Vec3};

use super::{Axis, MeshModifier};
use crate::error::{Result, Stage, finite};
use crate::mesh::types::MeshBuffer;

/// Rotate vertices about an axis through the origin, proportionally to their
/// position along it
///
/// The rotation ramps linearly from 0 at the minimum extent to `angle` at
/// the maximum. The angle is in radians and may exceed a full turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Twist {
    pub axis: Axis,
    pub angle: f32,
}

impl Twist {
    pub fn new(axis: Axis, angle: f32) -> Self {
        Self { axis, angle }
    }
}

impl MeshModifier for Twist {
    fn validate(&self) -> Result<()> {
        finite(Stage::Twist, "angle", self.angle)?;
        Ok(())
    }

    fn bake(&self, mesh: &MeshBuffer) -> MeshBuffer {
        let Some((min, max)) = mesh.bounds() else {
            return mesh.clone();
        };
        if self.angle == 0.0 {
            return mesh.clone();
        }

        let axis = self.axis.unit();
        let index = self.axis.index();
        let low = min[index];
        let extent = max[index] - low;

        let mut out = mesh.clone();
        for pos in &mut out.positions {
            let p = Vec3::from(*pos);
            let t = if extent > 0.0 { (p[index] - low) / extent } else { 0.0 };
            *pos = (Quat::from_axis_angle(axis, self.angle * t) * p).to_array();
        }
        out.recompute_normals();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives::{cuboid, cylinder, torus};
    use std::f32::consts::{FRAC_PI_2, TAU};

    #[test]
    fn test_zero_angle_is_identity() {
        let mesh = torus(1.0, 0.3, 16, 8).unwrap();
        let twisted = Twist::new(Axis::Z, 0.0).apply_to(&mesh).unwrap();
        assert_eq!(twisted, mesh);
    }

    #[test]
    fn test_full_turn_ends_where_it_started() {
        let mesh = cylinder(0.5, 2.0, 8).unwrap();
        let twisted = Twist::new(Axis::Z, TAU).apply_to(&mesh).unwrap();
        for (a, b) in mesh.positions.iter().zip(&twisted.positions) {
            let (a, b) = (Vec3::from(*a), Vec3::from(*b));
            // Both caps sit at t = 0 or t = 1, so they return to their start
            if (a.z.abs() - 1.0).abs() < 1e-6 {
                assert!((a - b).length() < 1e-4);
            }
        }
        assert_eq!(twisted.faces, mesh.faces);
    }

    #[test]
    fn test_quarter_turn_at_top() {
        let mesh = cuboid(Vec3::new(2.0, 2.0, 2.0)).unwrap();
        let twisted = Twist::new(Axis::Z, FRAC_PI_2).apply_to(&mesh).unwrap();
        for (a, b) in mesh.positions.iter().zip(&twisted.positions) {
            let (a, b) = (Vec3::from(*a), Vec3::from(*b));
            if a.z > 0.0 {
                let expected = Vec3::new(-a.y, a.x, a.z);
                assert!((b - expected).length() < 1e-5);
            } else {
                assert!((b - a).length() < 1e-6);
            }
        }
    }

    #[test]
    fn test_rejects_non_finite_angle() {
        assert!(Twist::new(Axis::X, f32::NAN).validate().is_err());
        assert!(Twist::new(Axis::X, 4.0 * TAU).validate().is_ok());
    }
}
