//! Mesh generation and modification

pub mod combine;
pub mod modifiers;
pub mod primitives;
pub mod text;
pub mod types;

pub use combine::{combine, combine_transformed};
pub use modifiers::{
    Axis, Bevel, MeshApply, MeshModifier, ModifierSpec, ModifierStack, Subdivide, Transform, Twist,
};
pub use primitives::{PrimitiveSpec, cuboid, cylinder, sphere, torus};
pub use text::{TextParams, text};
pub use types::{EdgeKey, Face, MeshBuffer, make_edge_key};
