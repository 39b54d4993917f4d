//! Recipe definitions and shared building blocks
//!
//! Utilities to reduce boilerplate across the skill and hero recipes.

use glam::{Mat4, Vec3};
use proc_gen::mesh::{Bevel, MeshApply, MeshBuffer, TextParams, Transform, cuboid, text};
use proc_gen::{AssetContext, Result, Scene};
use scene_export::{AssetRecipe, ExportOptions};

/// Builds the nodes and materials of one asset into a fresh context
pub type Generate = fn(&mut AssetContext) -> Result<()>;

/// Built-in recipe: (file stem, display name, generator, compression)
pub struct Recipe {
    pub name: &'static str,
    pub title: &'static str,
    pub generate: Generate,
    /// Fixed compression level, regardless of the batch default
    pub compression: Option<u8>,
}

impl AssetRecipe for Recipe {
    fn name(&self) -> &str {
        self.name
    }

    fn build(&self) -> Result<Scene> {
        let mut ctx = AssetContext::new(self.name);
        (self.generate)(&mut ctx)?;
        Ok(ctx.finish())
    }

    fn export_options(&self, defaults: ExportOptions) -> ExportOptions {
        match self.compression {
            Some(level) => ExportOptions::compressed(level),
            None => defaults,
        }
    }
}

/// Cube of edge `size` with a non-uniform scale baked in
pub fn scaled_cube(size: f32, scale: Vec3) -> Result<MeshBuffer> {
    cuboid(Vec3::splat(size))?.apply(Transform::scale(scale.x, scale.y, scale.z))
}

/// Beveled cube, as used for pins and gear teeth
pub fn beveled_cube(size: f32, scale: Vec3, width: f32, segments: u32) -> Result<MeshBuffer> {
    scaled_cube(size, scale)?.apply(Bevel::new(width, segments))
}

/// Centred, extruded label with rounded cap edges
pub fn add_label(
    ctx: &mut AssetContext,
    material: &str,
    body: &str,
    size: f32,
    extrude: f32,
    bevel: f32,
    location: Vec3,
) -> Result<()> {
    let label = text(&TextParams::new(body, size, extrude).with_bevel(bevel, 3))?;
    ctx.add_node(label, material, Mat4::from_translation(location))?;
    Ok(())
}
