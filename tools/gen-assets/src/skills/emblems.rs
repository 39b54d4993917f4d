//! Pictorial emblems built from spheres, tori and rods

use glam::{Mat4, Quat, Vec3};
use proc_gen::mesh::*;
use proc_gen::{AssetContext, MaterialParams, Result, placement};

use crate::recipe::{beveled_cube, scaled_cube};

/// REACT - atom with three tilted orbits and an electron on each
pub fn react(ctx: &mut AssetContext) -> Result<()> {
    ctx.define_material(
        "ReactCore",
        &MaterialParams::new(0x61DAFB, 0.7, 0.15).with_emission(0x61DAFB, 0.5),
    )?;
    ctx.define_material(
        "ReactRing",
        &MaterialParams::new(0x61DAFB, 0.5, 0.2).with_emission(0x61DAFB, 0.3),
    )?;

    let nucleus = sphere(0.18, 32, 24)?.apply(Subdivide { levels: 2 })?;
    ctx.add_node(nucleus, "ReactCore", Mat4::IDENTITY)?;

    let ring = torus(0.6, 0.025, 80, 16)?;
    let electron = sphere(0.05, 16, 12)?;
    let radius = 0.6;
    for (i, tilt) in [0.0f32, 60.0, 120.0].into_iter().enumerate() {
        let orbit = placement(Vec3::ZERO, Vec3::new(tilt, 70.0, 0.0), Vec3::ONE);
        ctx.add_node(ring.clone(), "ReactRing", orbit)?;

        let t = i as f32 * 2.1;
        let a = tilt.to_radians();
        let location = Vec3::new(
            radius * t.cos() * a.cos(),
            radius * t.cos() * a.sin(),
            radius * t.sin(),
        );
        ctx.add_node(electron.clone(), "ReactCore", Mat4::from_translation(location))?;
    }
    Ok(())
}

/// DATABASE - three stacked disks with glowing separators
pub fn database(ctx: &mut AssetContext) -> Result<()> {
    ctx.define_material(
        "DBGlow",
        &MaterialParams::new(0x4A90D9, 0.3, 0.3).with_emission(0x4A90D9, 0.3),
    )?;

    let disk = cylinder(0.4, 0.16, 32)?
        .apply(Bevel::new(0.025, 3))?
        .apply(Subdivide { levels: 1 })?;
    for (i, (color, z)) in [(0x336791_u32, -0.22), (0x2B5E87, 0.0), (0x24507D, 0.22)]
        .into_iter()
        .enumerate()
    {
        let name = format!("DB{i}");
        ctx.define_material(&name, &MaterialParams::new(color, 0.5, 0.2))?;
        ctx.add_node(disk.clone(), &name, Mat4::from_translation(Vec3::new(0.0, 0.0, z)))?;
    }

    let separator = torus(0.4, 0.01, 48, 8)?;
    for z in [-0.11, 0.11] {
        ctx.add_node(separator.clone(), "DBGlow", Mat4::from_translation(Vec3::new(0.0, 0.0, z)))?;
    }
    Ok(())
}

/// DESIGN - flattened palette with a thumb hole and paint blobs
pub fn design(ctx: &mut AssetContext) -> Result<()> {
    ctx.define_material("Palette", &MaterialParams::new(0xF0EDE8, 0.05, 0.6))?;
    ctx.define_material("Hole", &MaterialParams::new(0x333333, 0.1, 0.8))?;

    let palette = sphere(0.5, 48, 32)?
        .apply(Transform::scale(1.0, 0.85, 0.15))?
        .apply(Subdivide { levels: 1 })?;
    ctx.add_node(palette, "Palette", Mat4::IDENTITY)?;

    let hole = cylinder(0.09, 0.2, 32)?;
    ctx.add_node(hole, "Hole", Mat4::from_translation(Vec3::new(-0.25, -0.15, 0.0)))?;

    let blob = sphere(0.055, 20, 12)?.apply(Transform::scale(1.0, 1.0, 0.6))?;
    let blobs = [
        (0xFF6B6B_u32, Vec3::new(-0.08, 0.2, 0.07)),
        (0x4ECDC4, Vec3::new(0.18, 0.18, 0.07)),
        (0xFFE66D, Vec3::new(0.05, -0.05, 0.07)),
        (0x6C5CE7, Vec3::new(-0.22, 0.08, 0.07)),
        (0xFF8A5C, Vec3::new(0.28, 0.0, 0.07)),
        (0x2ED573, Vec3::new(0.1, 0.12, 0.07)),
    ];
    for (color, location) in blobs {
        let name = format!("Blob{color:x}");
        ctx.define_material(&name, &MaterialParams::new(color, 0.15, 0.35))?;
        ctx.add_node(blob.clone(), &name, Mat4::from_translation(location))?;
    }
    Ok(())
}

/// AI - microchip with pins, a glowing core and circuit traces
pub fn ai(ctx: &mut AssetContext) -> Result<()> {
    ctx.define_material("Chip", &MaterialParams::new(0x2D2B55, 0.7, 0.15))?;
    ctx.define_material("Pin", &MaterialParams::new(0xC0C0C0, 0.8, 0.15))?;
    ctx.define_material(
        "AIGlow",
        &MaterialParams::new(0x00D2FF, 0.3, 0.2).with_emission(0x00D2FF, 1.5),
    )?;

    let chip = scaled_cube(0.65, Vec3::new(1.0, 1.0, 0.3))?
        .apply(Bevel::new(0.035, 4))?
        .apply(Subdivide { levels: 1 })?;
    ctx.add_node(chip, "Chip", Mat4::IDENTITY)?;

    // Four pins per side, merged into one node
    let pin_x = beveled_cube(0.05, Vec3::new(2.0, 0.6, 0.6), 0.005, 2)?;
    let pin_y = beveled_cube(0.05, Vec3::new(0.6, 2.0, 0.6), 0.005, 2)?;
    let mut pins: Vec<(&MeshBuffer, Mat4)> = Vec::with_capacity(16);
    for j in 0..4 {
        let offset = (j as f32 - 1.5) * 0.13;
        pins.push((&pin_x, Mat4::from_translation(Vec3::new(0.4, offset, 0.0))));
        pins.push((&pin_x, Mat4::from_translation(Vec3::new(-0.4, offset, 0.0))));
        pins.push((&pin_y, Mat4::from_translation(Vec3::new(offset, 0.4, 0.0))));
        pins.push((&pin_y, Mat4::from_translation(Vec3::new(offset, -0.4, 0.0))));
    }
    ctx.add_node(combine_transformed(&pins)?, "Pin", Mat4::IDENTITY)?;

    let core_height = Mat4::from_translation(Vec3::new(0.0, 0.0, 0.11));
    ctx.add_node(torus(0.1, 0.02, 32, 12)?, "AIGlow", core_height)?;
    ctx.add_node(sphere(0.05, 20, 12)?, "AIGlow", core_height)?;

    let trace_x = scaled_cube(0.01, Vec3::new(15.0, 1.0, 0.5))?;
    let trace_y = scaled_cube(0.01, Vec3::new(1.0, 15.0, 0.5))?;
    let traces = [
        (&trace_x, Vec3::new(0.075, 0.0, 0.1)),
        (&trace_x, Vec3::new(-0.075, 0.0, 0.1)),
        (&trace_y, Vec3::new(0.0, 0.075, 0.1)),
        (&trace_y, Vec3::new(0.0, -0.075, 0.1)),
    ]
    .map(|(mesh, location)| (mesh, Mat4::from_translation(location)));
    ctx.add_node(combine_transformed(&traces)?, "AIGlow", Mat4::IDENTITY)?;
    Ok(())
}

/// NETWORKING - hub and eight satellites joined by rods
pub fn networking(ctx: &mut AssetContext) -> Result<()> {
    ctx.define_material(
        "NetCenter",
        &MaterialParams::new(0x0077B6, 0.6, 0.2).with_emission(0x00B4D8, 0.4),
    )?;
    ctx.define_material(
        "NetNode",
        &MaterialParams::new(0x48CAE4, 0.5, 0.25).with_emission(0x48CAE4, 0.2),
    )?;
    ctx.define_material(
        "NetLink",
        &MaterialParams::new(0x90E0EF, 0.4, 0.3).with_emission(0x90E0EF, 0.3),
    )?;

    let hub = sphere(0.13, 24, 16)?.apply(Subdivide { levels: 1 })?;
    ctx.add_node(hub, "NetCenter", Mat4::IDENTITY)?;

    let satellite = sphere(0.065, 20, 12)?.apply(Subdivide { levels: 1 })?;
    let positions = [
        Vec3::new(0.42, 0.0, 0.05),
        Vec3::new(-0.42, 0.0, -0.05),
        Vec3::new(0.0, 0.42, 0.05),
        Vec3::new(0.0, -0.42, -0.05),
        Vec3::new(0.28, 0.28, 0.15),
        Vec3::new(-0.28, -0.28, -0.15),
        Vec3::new(0.28, -0.28, 0.1),
        Vec3::new(-0.28, 0.28, -0.1),
    ];
    for position in positions {
        ctx.add_node(satellite.clone(), "NetNode", Mat4::from_translation(position))?;

        // Rod along +Z, rotated onto the hub-to-satellite direction and baked
        let rotation = Quat::from_rotation_arc(Vec3::Z, position.normalize());
        let rod = cylinder(0.012, position.length(), 32)?
            .apply(Transform::from_matrix(Mat4::from_quat(rotation)))?;
        ctx.add_node(rod, "NetLink", Mat4::from_translation(position * 0.5))?;
    }
    Ok(())
}
