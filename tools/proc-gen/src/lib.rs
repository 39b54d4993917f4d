//! Procedural mesh generation library for Nethercore scene assets
//!
//! This library builds meshes from parametric primitives, bakes them through
//! an ordered modifier stack, and assembles them with PBR materials into
//! scenes ready for export.
//!
//! # Example
//! ```no_run
//! use glam::{Mat4, Vec3};
//! use proc_gen::mesh::*;
//! use proc_gen::{AssetContext, MaterialParams};
//!
//! // Generate a base mesh and bake modifiers into it
//! let badge = cylinder(0.5, 0.2, 8)?
//!     .apply(Bevel::new(0.02, 2))?
//!     .apply(Subdivide { levels: 1 })?;
//!
//! // Assemble the asset
//! let mut asset = AssetContext::new("badge");
//! asset.define_material("Blue", &MaterialParams::new(0x336791, 0.5, 0.2))?;
//! asset.add_node(badge, "Blue", Mat4::IDENTITY)?;
//! let scene = asset.finish();
//! # Ok::<(), proc_gen::GenError>(())
//! ```

pub mod error;
pub mod material;
pub mod mesh;
pub mod scene;

pub use error::{GenError, Result, Stage};
pub use material::{Color, Material, MaterialParams, MaterialRef, MaterialTable};
pub use scene::{AssetContext, Scene, SceneBuilder, SceneNode, placement};
