//! Parametric primitive generators
//!
//! All generators use a Z-up frame centred on the origin, emit
//! counter-clockwise faces seen from outside, and finish with area-weighted
//! normals. Vertices are shared between adjacent faces so the output is a
//! closed manifold that the bevel and subdivision modifiers can walk.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};
use tracing::debug;

use super::text::{TextParams, text};
use super::types::MeshBuffer;
use crate::error::{Result, Stage, positive, segments};

/// Minimum segment count accepted by every generator
pub const MIN_SEGMENTS: u32 = 3;

/// Upper bound on segment counts; beyond this meshes are impractically large
pub const MAX_SEGMENTS: u32 = 1024;

fn segment_count(stage: Stage, param: &'static str, value: u32) -> Result<u32> {
    let value = segments(stage, param, value, MIN_SEGMENTS)?;
    if value > MAX_SEGMENTS {
        return Err(crate::GenError::domain(
            stage,
            param,
            format!("{value} exceeds the maximum of {MAX_SEGMENTS}"),
        ));
    }
    Ok(value)
}

/// Generate a UV sphere
///
/// # Arguments
/// * `radius` - Sphere radius (> 0.0)
/// * `segments` - Longitude divisions (min 3)
/// * `rings` - Latitude divisions from pole to pole (min 3)
///
/// Poles are single vertices closed with triangle fans; every other face is a quad.
pub fn sphere(radius: f32, segments: u32, rings: u32) -> Result<MeshBuffer> {
    let radius = positive(Stage::Sphere, "radius", radius)?;
    let segments = segment_count(Stage::Sphere, "segments", segments)?;
    let rings = segment_count(Stage::Sphere, "rings", rings)?;

    let mut mesh = MeshBuffer::new();
    let north = mesh.add_vertex(Vec3::new(0.0, 0.0, radius));

    // Latitude loops between the poles
    let mut loops = Vec::with_capacity((rings - 1) as usize);
    for ring in 1..rings {
        let phi = PI * ring as f32 / rings as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        let ring_loop: Vec<u32> = (0..segments)
            .map(|seg| {
                let theta = TAU * seg as f32 / segments as f32;
                let (sin_theta, cos_theta) = theta.sin_cos();
                mesh.add_vertex(Vec3::new(
                    radius * sin_phi * cos_theta,
                    radius * sin_phi * sin_theta,
                    radius * cos_phi,
                ))
            })
            .collect();
        loops.push(ring_loop);
    }

    let south = mesh.add_vertex(Vec3::new(0.0, 0.0, -radius));
    let n = segments as usize;

    // North cap fan
    let first = &loops[0];
    for j in 0..n {
        mesh.add_face(&[north, first[j], first[(j + 1) % n]]);
    }

    // Quad bands
    for pair in loops.windows(2) {
        let (upper, lower) = (&pair[0], &pair[1]);
        for j in 0..n {
            let next = (j + 1) % n;
            mesh.add_face(&[lower[j], lower[next], upper[next], upper[j]]);
        }
    }

    // South cap fan
    let last = &loops[loops.len() - 1];
    for j in 0..n {
        mesh.add_face(&[south, last[(j + 1) % n], last[j]]);
    }

    mesh.recompute_normals();
    debug!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "generated sphere"
    );
    Ok(mesh)
}

/// Generate a torus lying in the XY plane
///
/// # Arguments
/// * `major_radius` - Distance from the centre to the tube centre (> 0.0)
/// * `minor_radius` - Tube radius (> 0.0, < `major_radius`)
/// * `major_segments` - Divisions around the ring (min 3)
/// * `minor_segments` - Divisions around the tube (min 3)
pub fn torus(
    major_radius: f32,
    minor_radius: f32,
    major_segments: u32,
    minor_segments: u32,
) -> Result<MeshBuffer> {
    let major_radius = positive(Stage::Torus, "major_radius", major_radius)?;
    let minor_radius = positive(Stage::Torus, "minor_radius", minor_radius)?;
    if minor_radius >= major_radius {
        return Err(crate::GenError::domain(
            Stage::Torus,
            "minor_radius",
            format!("{minor_radius} must be smaller than major_radius {major_radius}"),
        ));
    }
    let major_segments = segment_count(Stage::Torus, "major_segments", major_segments)?;
    let minor_segments = segment_count(Stage::Torus, "minor_segments", minor_segments)?;

    let mut mesh = MeshBuffer::new();
    for i in 0..major_segments {
        let u = TAU * i as f32 / major_segments as f32;
        let (sin_u, cos_u) = u.sin_cos();
        for j in 0..minor_segments {
            let v = TAU * j as f32 / minor_segments as f32;
            let (sin_v, cos_v) = v.sin_cos();
            let ring = major_radius + minor_radius * cos_v;
            mesh.add_vertex(Vec3::new(ring * cos_u, ring * sin_u, minor_radius * sin_v));
        }
    }

    let index = |i: u32, j: u32| (i % major_segments) * minor_segments + (j % minor_segments);
    for i in 0..major_segments {
        for j in 0..minor_segments {
            mesh.add_face(&[index(i, j), index(i + 1, j), index(i + 1, j + 1), index(i, j + 1)]);
        }
    }

    mesh.recompute_normals();
    debug!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "generated torus"
    );
    Ok(mesh)
}

/// Triangulate a convex cap loop as a strip of quads
///
/// `ring` must already be counter-clockwise seen from outside. Quads are cut
/// from both ends towards the middle; an odd vertex count leaves one triangle.
fn add_cap(mesh: &mut MeshBuffer, ring: &[u32]) {
    let (mut left, mut right) = (0usize, ring.len() - 1);
    while right - left + 1 >= 4 {
        mesh.add_face(&[ring[left], ring[left + 1], ring[right - 1], ring[right]]);
        left += 1;
        right -= 1;
    }
    if right - left + 1 == 3 {
        mesh.add_face(&[ring[left], ring[left + 1], ring[right]]);
    }
}

/// Generate a closed cylinder (or regular prism for low segment counts)
///
/// # Arguments
/// * `radius` - Radius of the circumscribed circle (> 0.0)
/// * `depth` - Height along Z (> 0.0), centred on the origin
/// * `segments` - Number of sides (min 3)
///
/// Caps are built from quads so a prism with an even side count is all quads.
pub fn cylinder(radius: f32, depth: f32, segments: u32) -> Result<MeshBuffer> {
    let radius = positive(Stage::Cylinder, "radius", radius)?;
    let depth = positive(Stage::Cylinder, "depth", depth)?;
    let segments = segment_count(Stage::Cylinder, "segments", segments)?;

    let mut mesh = MeshBuffer::new();
    let half = depth * 0.5;
    let n = segments as usize;

    let ring_at = |mesh: &mut MeshBuffer, z: f32| -> Vec<u32> {
        (0..segments)
            .map(|i| {
                let theta = TAU * i as f32 / segments as f32;
                let (sin_t, cos_t) = theta.sin_cos();
                mesh.add_vertex(Vec3::new(radius * cos_t, radius * sin_t, z))
            })
            .collect()
    };
    let bottom = ring_at(&mut mesh, -half);
    let top = ring_at(&mut mesh, half);

    for i in 0..n {
        let next = (i + 1) % n;
        mesh.add_face(&[bottom[i], bottom[next], top[next], top[i]]);
    }

    add_cap(&mut mesh, &top);
    let bottom_reversed: Vec<u32> = bottom.iter().rev().copied().collect();
    add_cap(&mut mesh, &bottom_reversed);

    mesh.recompute_normals();
    debug!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "generated cylinder"
    );
    Ok(mesh)
}

/// Generate an axis-aligned box centred on the origin
///
/// `size` holds the full extents along X, Y and Z (each > 0.0).
pub fn cuboid(size: Vec3) -> Result<MeshBuffer> {
    let hx = positive(Stage::Box, "size.x", size.x)? * 0.5;
    let hy = positive(Stage::Box, "size.y", size.y)? * 0.5;
    let hz = positive(Stage::Box, "size.z", size.z)? * 0.5;

    let mut mesh = MeshBuffer::new();
    // Bottom 0-3, top 4-7, counter-clockwise seen from above
    for z in [-hz, hz] {
        mesh.add_vertex(Vec3::new(-hx, -hy, z));
        mesh.add_vertex(Vec3::new(hx, -hy, z));
        mesh.add_vertex(Vec3::new(hx, hy, z));
        mesh.add_vertex(Vec3::new(-hx, hy, z));
    }

    mesh.add_face(&[0, 3, 2, 1]); // -Z
    mesh.add_face(&[4, 5, 6, 7]); // +Z
    mesh.add_face(&[0, 1, 5, 4]); // -Y
    mesh.add_face(&[1, 2, 6, 5]); // +X
    mesh.add_face(&[2, 3, 7, 6]); // +Y
    mesh.add_face(&[3, 0, 4, 7]); // -X

    mesh.recompute_normals();
    debug!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "generated box"
    );
    Ok(mesh)
}

/// Primitive selection as written in recipes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrimitiveSpec {
    Sphere {
        radius: f32,
        #[serde(default = "default_sphere_segments")]
        segments: u32,
        #[serde(default = "default_sphere_rings")]
        rings: u32,
    },
    Torus {
        major_radius: f32,
        minor_radius: f32,
        #[serde(default = "default_torus_major_segments")]
        major_segments: u32,
        #[serde(default = "default_torus_minor_segments")]
        minor_segments: u32,
    },
    Cylinder {
        radius: f32,
        depth: f32,
        #[serde(default = "default_cylinder_segments")]
        segments: u32,
    },
    #[serde(rename = "box")]
    Cuboid { size: [f32; 3] },
    Text(TextParams),
}

fn default_sphere_segments() -> u32 {
    32
}

fn default_sphere_rings() -> u32 {
    16
}

fn default_torus_major_segments() -> u32 {
    48
}

fn default_torus_minor_segments() -> u32 {
    12
}

fn default_cylinder_segments() -> u32 {
    32
}

impl PrimitiveSpec {
    /// Run the generator this spec describes
    pub fn build(&self) -> Result<MeshBuffer> {
        match self {
            PrimitiveSpec::Sphere {
                radius,
                segments,
                rings,
            } => sphere(*radius, *segments, *rings),
            PrimitiveSpec::Torus {
                major_radius,
                minor_radius,
                major_segments,
                minor_segments,
            } => torus(*major_radius, *minor_radius, *major_segments, *minor_segments),
            PrimitiveSpec::Cylinder {
                radius,
                depth,
                segments,
            } => cylinder(*radius, *depth, *segments),
            PrimitiveSpec::Cuboid { size } => cuboid(Vec3::from(*size)),
            PrimitiveSpec::Text(params) => text(params),
        }
    }
}
