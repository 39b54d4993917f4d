//! Mesh modifiers for procedural geometry
//!
//! Every modifier is a bake: it validates its parameters, then maps an input
//! `MeshBuffer` to a new one without touching the input.
//!
//! # Fluent API
//!
//! Use the `MeshApply` extension trait for method chaining:
//! ```no_run
//! use proc_gen::mesh::*;
//!
//! let mesh = cylinder(0.5, 0.2, 8)?
//!     .apply(Bevel { width: 0.02, segments: 2 })?
//!     .apply(Subdivide { levels: 1 })?;
//! # Ok::<(), proc_gen::GenError>(())
//! ```

pub mod bevel;
mod subdivide;
mod transform;
mod twist;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::MeshBuffer;
use crate::error::Result;

pub use bevel::Bevel;
pub use subdivide::{MAX_SUBDIVISION_LEVELS, Subdivide};
pub use transform::{Transform, euler_xyz};
pub use twist::Twist;

/// Trait for mesh modifiers
///
/// `validate` rejects bad parameters before any geometry is produced;
/// `bake` is total once validation has passed.
pub trait MeshModifier {
    /// Check parameters, failing with a domain error naming the offending one
    fn validate(&self) -> Result<()>;

    /// Produce the modified mesh
    fn bake(&self, mesh: &MeshBuffer) -> MeshBuffer;

    /// Validate, then bake
    fn apply_to(&self, mesh: &MeshBuffer) -> Result<MeshBuffer> {
        self.validate()?;
        Ok(self.bake(mesh))
    }
}

/// Extension trait for fluent modifier application
pub trait MeshApply: Sized {
    /// Apply a modifier, consuming the input mesh
    fn apply<M: MeshModifier>(self, modifier: M) -> Result<Self>;
}

impl MeshApply for MeshBuffer {
    fn apply<M: MeshModifier>(self, modifier: M) -> Result<Self> {
        modifier.apply_to(&self)
    }
}

/// Coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[serde(alias = "X")]
    X,
    #[serde(alias = "Y")]
    Y,
    #[serde(alias = "Z")]
    Z,
}

impl Axis {
    /// Component index (0, 1, 2)
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

/// A modifier as written in a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModifierSpec {
    /// Scale, then rotate (XYZ Euler degrees), then translate
    Transform {
        #[serde(default)]
        translate: [f32; 3],
        #[serde(default)]
        rotate: [f32; 3],
        #[serde(default = "unit_scale")]
        scale: [f32; 3],
    },
    /// Arbitrary affine matrix, column-major
    Matrix { columns: [f32; 16] },
    /// Axial twist, angle in radians
    #[serde(alias = "deform")]
    Twist { axis: Axis, angle: f32 },
    Bevel {
        width: f32,
        #[serde(default = "default_bevel_segments")]
        segments: u32,
    },
    Subdivide { levels: u32 },
}

fn unit_scale() -> [f32; 3] {
    [1.0; 3]
}

fn default_bevel_segments() -> u32 {
    1
}

impl ModifierSpec {
    /// Spec for an arbitrary matrix
    pub fn matrix(matrix: Mat4) -> Self {
        Self::Matrix {
            columns: matrix.to_cols_array(),
        }
    }

    /// Spec for a scale-only transform
    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        Self::Transform {
            translate: [0.0; 3],
            rotate: [0.0; 3],
            scale: [x, y, z],
        }
    }

    fn transform(&self) -> Option<Transform> {
        match self {
            ModifierSpec::Transform {
                translate,
                rotate,
                scale,
            } => Some(Transform::from_components(
                Vec3::from(*translate),
                Vec3::from(*rotate),
                Vec3::from(*scale),
            )),
            ModifierSpec::Matrix { columns } => Some(Transform::from_matrix(Mat4::from_cols_array(columns))),
            _ => None,
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            ModifierSpec::Transform { .. } => "transform",
            ModifierSpec::Matrix { .. } => "matrix",
            ModifierSpec::Twist { .. } => "twist",
            ModifierSpec::Bevel { .. } => "bevel",
            ModifierSpec::Subdivide { .. } => "subdivide",
        }
    }
}

impl MeshModifier for ModifierSpec {
    fn validate(&self) -> Result<()> {
        match self {
            ModifierSpec::Transform { .. } | ModifierSpec::Matrix { .. } => {
                self.transform().map_or(Ok(()), |t| t.validate())
            }
            ModifierSpec::Twist { axis, angle } => Twist::new(*axis, *angle).validate(),
            ModifierSpec::Bevel { width, segments } => Bevel::new(*width, *segments).validate(),
            ModifierSpec::Subdivide { levels } => Subdivide { levels: *levels }.validate(),
        }
    }

    fn bake(&self, mesh: &MeshBuffer) -> MeshBuffer {
        match self {
            ModifierSpec::Transform { .. } | ModifierSpec::Matrix { .. } => match self.transform() {
                Some(t) => t.bake(mesh),
                None => mesh.clone(),
            },
            ModifierSpec::Twist { axis, angle } => Twist::new(*axis, *angle).bake(mesh),
            ModifierSpec::Bevel { width, segments } => Bevel::new(*width, *segments).bake(mesh),
            ModifierSpec::Subdivide { levels } => Subdivide { levels: *levels }.bake(mesh),
        }
    }
}

impl From<Twist> for ModifierSpec {
    fn from(t: Twist) -> Self {
        ModifierSpec::Twist {
            axis: t.axis,
            angle: t.angle,
        }
    }
}

impl From<Bevel> for ModifierSpec {
    fn from(b: Bevel) -> Self {
        ModifierSpec::Bevel {
            width: b.width,
            segments: b.segments,
        }
    }
}

impl From<Subdivide> for ModifierSpec {
    fn from(s: Subdivide) -> Self {
        ModifierSpec::Subdivide { levels: s.levels }
    }
}

impl From<Transform> for ModifierSpec {
    fn from(t: Transform) -> Self {
        ModifierSpec::matrix(t.matrix())
    }
}

/// Ordered list of validated modifiers
///
/// Specs are validated when pushed, so baking a stack cannot fail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifierStack {
    specs: Vec<ModifierSpec>,
}

impl ModifierStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stack from specs, failing on the first invalid one
    pub fn from_specs(specs: impl IntoIterator<Item = ModifierSpec>) -> Result<Self> {
        let mut stack = Self::new();
        for spec in specs {
            stack.push(spec)?;
        }
        Ok(stack)
    }

    /// Append a modifier; the stack is unchanged if validation fails
    pub fn push(&mut self, spec: impl Into<ModifierSpec>) -> Result<&mut Self> {
        let spec = spec.into();
        spec.validate()?;
        self.specs.push(spec);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn specs(&self) -> &[ModifierSpec] {
        &self.specs
    }

    /// Evaluate every modifier in order, each consuming the previous bake
    pub fn bake(&self, base: MeshBuffer) -> MeshBuffer {
        self.specs.iter().fold(base, |mesh, spec| {
            let baked = spec.bake(&mesh);
            debug!(
                modifier = spec.name(),
                vertices = baked.vertex_count(),
                faces = baked.face_count(),
                "baked modifier"
            );
            baked
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives::cylinder;
    use crate::GenError;

    #[test]
    fn test_stack_rejects_invalid_spec_without_mutation() {
        let mut stack = ModifierStack::new();
        stack.push(Subdivide { levels: 1 }).unwrap();
        let err = stack.push(ModifierSpec::Subdivide { levels: 7 }).unwrap_err();
        assert!(matches!(err, GenError::Domain { .. }));
        assert_eq!(stack.len(), 1);

        assert!(stack.push(ModifierSpec::Bevel { width: 0.1, segments: 0 }).is_err());
        assert!(stack.push(ModifierSpec::Bevel { width: -0.1, segments: 2 }).is_err());
        assert!(stack.push(ModifierSpec::scale(1.0, 0.0, 1.0)).is_err());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_stack_bakes_in_order() {
        let base = cylinder(0.5, 0.2, 8).unwrap();
        let stack = ModifierStack::from_specs([
            ModifierSpec::Bevel { width: 0.02, segments: 2 },
            ModifierSpec::Subdivide { levels: 1 },
        ])
        .unwrap();
        let baked = stack.bake(base.clone());

        let manual = base
            .apply(Bevel::new(0.02, 2))
            .unwrap()
            .apply(Subdivide { levels: 1 })
            .unwrap();
        assert_eq!(baked, manual);
        assert_eq!(baked.face_count(), 440);
    }

    #[test]
    fn test_spec_from_toml() {
        #[derive(Deserialize)]
        struct Recipe {
            modifiers: Vec<ModifierSpec>,
        }
        let recipe: Recipe = toml::from_str(
            r#"
            modifiers = [
                { kind = "twist", axis = "z", angle = 6.283185 },
                { kind = "deform", axis = "X", angle = 3.141593 },
                { kind = "bevel", width = 0.02, segments = 3 },
                { kind = "subdivide", levels = 2 },
                { kind = "transform", scale = [0.5, 0.5, 0.1] },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(recipe.modifiers.len(), 5);
        assert_eq!(
            recipe.modifiers[1],
            ModifierSpec::Twist { axis: Axis::X, angle: 3.141593 }
        );
        assert!(ModifierStack::from_specs(recipe.modifiers).is_ok());
    }
}
