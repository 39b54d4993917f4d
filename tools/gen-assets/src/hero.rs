//! Hero sculpture: a doubly twisted, smoothed torus in polished metal

use glam::Mat4;
use proc_gen::mesh::*;
use proc_gen::{AssetContext, MaterialParams, Result};
use std::f32::consts::{PI, TAU};

use crate::recipe::Recipe;

pub const HERO: Recipe = Recipe {
    name: "hero-sculpture",
    title: "Hero Sculpture",
    generate: hero_sculpture,
    compression: Some(6),
};

pub fn hero_sculpture(ctx: &mut AssetContext) -> Result<()> {
    ctx.define_material("SculptureMetal", &MaterialParams::rgb([0.7, 0.75, 0.8], 0.9, 0.15))?;

    let mut stack = ModifierStack::new();
    stack
        .push(Twist::new(Axis::Z, TAU))?
        .push(Twist::new(Axis::X, PI))?
        .push(Subdivide { levels: 2 })?;
    let mut sculpture = stack.bake(torus(1.2, 0.35, 64, 16)?);
    sculpture.recenter();

    ctx.add_node(sculpture, "SculptureMetal", Mat4::IDENTITY)?;
    Ok(())
}
