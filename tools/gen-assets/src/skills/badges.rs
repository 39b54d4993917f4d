//! Lettered badges: a beveled plate with an embossed label

use glam::{Mat4, Vec3};
use proc_gen::mesh::*;
use proc_gen::{AssetContext, MaterialParams, Result, placement};
use std::f32::consts::TAU;

use crate::recipe::{add_label, beveled_cube, scaled_cube};

/// TYPESCRIPT - rounded square with "TS"
pub fn typescript(ctx: &mut AssetContext) -> Result<()> {
    ctx.define_material("TSBg", &MaterialParams::new(0x3178C6, 0.3, 0.25))?;
    ctx.define_material("TSText", &MaterialParams::new(0xFFFFFF, 0.15, 0.4))?;

    let base = scaled_cube(1.0, Vec3::new(0.5, 0.5, 0.1))?
        .apply(Bevel::new(0.08, 4))?
        .apply(Subdivide { levels: 2 })?;
    ctx.add_node(base, "TSBg", Mat4::IDENTITY)?;

    add_label(ctx, "TSText", "TS", 0.35, 0.04, 0.012, Vec3::new(0.0, -0.04, 0.11))
}

/// NODE.JS - hexagonal prism with a glowing rim and "N"
pub fn nodejs(ctx: &mut AssetContext) -> Result<()> {
    ctx.define_material("NodeBg", &MaterialParams::new(0x339933, 0.35, 0.25))?;
    ctx.define_material("NodeText", &MaterialParams::new(0xFFFFFF, 0.15, 0.4))?;
    ctx.define_material(
        "NodeEdge",
        &MaterialParams::new(0x66CC33, 0.5, 0.2).with_emission(0x66CC33, 0.15),
    )?;

    let hex = cylinder(0.55, 0.2, 6)?
        .apply(Bevel::new(0.04, 3))?
        .apply(Subdivide { levels: 1 })?;
    ctx.add_node(hex, "NodeBg", Mat4::IDENTITY)?;

    let edge = cylinder(0.57, 0.04, 6)?.apply(Bevel::new(0.01, 2))?;
    ctx.add_node(edge, "NodeEdge", Mat4::from_translation(Vec3::new(0.0, 0.0, 0.1)))?;

    add_label(ctx, "NodeText", "N", 0.4, 0.04, 0.01, Vec3::new(0.0, -0.04, 0.11))
}

/// C - round plate with a rim ring and "C"
pub fn c(ctx: &mut AssetContext) -> Result<()> {
    ctx.define_material("CBg", &MaterialParams::new(0x5C6BC0, 0.4, 0.2))?;
    ctx.define_material("CText", &MaterialParams::new(0xFFFFFF, 0.2, 0.4))?;
    ctx.define_material(
        "CRim",
        &MaterialParams::new(0x7986CB, 0.6, 0.15).with_emission(0x7986CB, 0.15),
    )?;

    let base = cylinder(0.5, 0.15, 48)?
        .apply(Bevel::new(0.025, 3))?
        .apply(Subdivide { levels: 1 })?;
    ctx.add_node(base, "CBg", Mat4::IDENTITY)?;

    let rim = torus(0.5, 0.018, 48, 12)?;
    ctx.add_node(rim, "CRim", Mat4::from_translation(Vec3::new(0.0, 0.0, 0.08)))?;

    add_label(ctx, "CText", "C", 0.45, 0.05, 0.015, Vec3::new(0.0, -0.05, 0.08))
}

/// RUST - gear with sixteen teeth, a hub ring and "R"
pub fn rust(ctx: &mut AssetContext) -> Result<()> {
    ctx.define_material("RustGear", &MaterialParams::new(0xDEA584, 0.7, 0.2))?;
    ctx.define_material("RustInner", &MaterialParams::new(0xB87333, 0.8, 0.15))?;
    ctx.define_material("RustText", &MaterialParams::new(0x1A1A1A, 0.3, 0.4))?;

    let gear = cylinder(0.45, 0.12, 48)?
        .apply(Bevel::new(0.015, 3))?
        .apply(Subdivide { levels: 1 })?;
    ctx.add_node(gear, "RustGear", Mat4::IDENTITY)?;

    // Teeth share one node
    let tooth = beveled_cube(0.08, Vec3::new(1.4, 0.5, 1.2), 0.008, 2)?;
    let placements: Vec<(&MeshBuffer, Mat4)> = (0..16)
        .map(|i| {
            let angle = i as f32 * TAU / 16.0;
            let location = Vec3::new(0.45 * angle.cos(), 0.45 * angle.sin(), 0.0);
            let matrix = placement(location, Vec3::new(0.0, 0.0, angle.to_degrees()), Vec3::ONE);
            (&tooth, matrix)
        })
        .collect();
    ctx.add_node(combine_transformed(&placements)?, "RustGear", Mat4::IDENTITY)?;

    let hole = torus(0.12, 0.035, 32, 16)?;
    ctx.add_node(hole, "RustInner", Mat4::IDENTITY)?;

    add_label(ctx, "RustText", "R", 0.2, 0.03, 0.008, Vec3::new(0.0, -0.03, 0.07))
}

/// PYTHON - two offset rounded blocks joined by a bridge, with eyes
pub fn python(ctx: &mut AssetContext) -> Result<()> {
    ctx.define_material("PyBlue", &MaterialParams::new(0x3776AB, 0.4, 0.25))?;
    ctx.define_material("PyYellow", &MaterialParams::new(0xFFD43B, 0.4, 0.25))?;
    ctx.define_material("PyEye", &MaterialParams::new(0xFFFFFF, 0.1, 0.5))?;

    let block = cuboid(Vec3::splat(0.38))?
        .apply(Bevel::new(0.06, 4))?
        .apply(Subdivide { levels: 2 })?;
    ctx.add_node(block.clone(), "PyBlue", Mat4::from_translation(Vec3::splat(0.1)))?;
    ctx.add_node(block, "PyYellow", Mat4::from_translation(Vec3::splat(-0.1)))?;

    let bridge = cylinder(0.055, 0.45, 32)?.apply(Subdivide { levels: 1 })?;
    ctx.add_node(bridge, "PyBlue", Mat4::IDENTITY)?;

    let eye = sphere(0.035, 16, 12)?;
    for location in [Vec3::new(0.02, 0.18, 0.22), Vec3::new(-0.02, -0.18, -0.22)] {
        ctx.add_node(eye.clone(), "PyEye", Mat4::from_translation(location))?;
    }
    Ok(())
}
