//! Planar text extrusion
//!
//! Text is laid out with the built-in block font in the XY plane, centred on
//! the origin, and extruded symmetrically along Z. The optional bevel rounds
//! only the cap outlines, the way a curve bevel would, and the caps are then
//! re-triangulated over the inset outline so no cap triangle folds over.

pub mod glyphs;
mod triangulate;

use glam::{IVec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use self::glyphs::{GLYPH_ADVANCE, GLYPH_HEIGHT, glyph_bitmap, trace_outline};
use super::modifiers::bevel::{MAX_BEVEL_SEGMENTS, MAX_WIDTH_FRACTION, bevel_edges};
use super::types::MeshBuffer;
use crate::error::{GenError, Result, Stage, finite, positive, segments};

/// Cap height as a fraction of the text size
pub const CAP_HEIGHT: f32 = 0.72;

/// Fixed-point steps per font cell for inset outlines
const INSET_STEPS: i32 = 1 << 12;

/// Outline of one placed glyph, in font cells
struct GlyphOutline {
    /// Outline index of the glyph's first point
    base: u32,
    points: Vec<IVec2>,
    contours: Vec<Vec<u32>>,
}

/// Text generator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextParams {
    /// Characters to render (A-Z, 0-9, `+`, `#`, `-`, `.`, space)
    pub body: String,
    /// Font size; glyph cap height is `size * CAP_HEIGHT`
    #[serde(default = "default_size")]
    pub size: f32,
    /// Half thickness: the text spans `-extrude..=extrude` along Z
    pub extrude: f32,
    /// Cap outline bevel width (0 disables the bevel)
    #[serde(default)]
    pub bevel_width: f32,
    #[serde(default = "default_bevel_segments")]
    pub bevel_segments: u32,
}

fn default_size() -> f32 {
    1.0
}

fn default_bevel_segments() -> u32 {
    3
}

impl TextParams {
    pub fn new(body: impl Into<String>, size: f32, extrude: f32) -> Self {
        Self {
            body: body.into(),
            size,
            extrude,
            bevel_width: 0.0,
            bevel_segments: default_bevel_segments(),
        }
    }

    /// Round the cap outlines
    pub fn with_bevel(mut self, width: f32, segments: u32) -> Self {
        self.bevel_width = width;
        self.bevel_segments = segments;
        self
    }
}

/// Generate an extruded text mesh
///
/// Vertices alternate front (`+extrude`) and back (`-extrude`) copies of
/// each outline point. Planar UVs span the text bounds.
pub fn text(params: &TextParams) -> Result<MeshBuffer> {
    let size = positive(Stage::Text, "size", params.size)?;
    let extrude = positive(Stage::Text, "extrude", params.extrude)?;
    let bevel_width = finite(Stage::Text, "bevel_width", params.bevel_width)?;
    if bevel_width < 0.0 {
        return Err(GenError::domain(Stage::Text, "bevel_width", format!("{bevel_width} must be >= 0")));
    }
    if bevel_width > 0.0 {
        segments(Stage::Text, "bevel_segments", params.bevel_segments, 1)?;
        if params.bevel_segments > MAX_BEVEL_SEGMENTS {
            return Err(GenError::domain(
                Stage::Text,
                "bevel_segments",
                format!("{} exceeds the maximum of {MAX_BEVEL_SEGMENTS}", params.bevel_segments),
            ));
        }
    }

    let chars: Vec<char> = params.body.chars().collect();
    if chars.is_empty() {
        return Err(GenError::domain(Stage::Text, "body", "text is empty"));
    }

    // Layout in glyph cells, centred on the origin
    let unit = size * CAP_HEIGHT / GLYPH_HEIGHT as f32;
    let total_width = (chars.len() as i32 * GLYPH_ADVANCE - 1) as f32;
    let origin_x = -total_width * 0.5;
    let origin_y = -(GLYPH_HEIGHT as f32) * 0.5;

    let mut mesh = MeshBuffer::new();
    let mut triangles: Vec<[u32; 3]> = Vec::new();
    let mut outline: Vec<Vec<u32>> = Vec::new();
    let mut glyphs: Vec<GlyphOutline> = Vec::new();

    for (slot, &ch) in chars.iter().enumerate() {
        let bitmap = glyph_bitmap(ch).ok_or_else(|| {
            GenError::domain(Stage::Text, "body", format!("unsupported glyph {ch:?}"))
        })?;
        let contours = trace_outline(&bitmap);
        if contours.is_empty() {
            continue;
        }

        let mut points: Vec<IVec2> = Vec::new();
        let mut local: Vec<Vec<u32>> = Vec::new();
        for contour in contours {
            let start = points.len() as u32;
            local.push((start..start + contour.len() as u32).collect());
            points.extend(contour);
        }
        let glyph_triangles = triangulate::triangulate(&points, &local).map_err(|reason| {
            GenError::domain(Stage::Text, "body", format!("glyph {ch:?}: {reason}"))
        })?;

        // Outline point k of this glyph becomes vertices base + 2k (front) and base + 2k + 1 (back)
        let base = mesh.vertex_count() as u32 / 2;
        let offset_x = origin_x + (slot as i32 * GLYPH_ADVANCE) as f32;
        for p in &points {
            let x = (p.x as f32 + offset_x) * unit;
            let y = (p.y as f32 + origin_y) * unit;
            mesh.add_vertex_uv(Vec3::new(x, y, extrude), [0.0, 0.0]);
            mesh.add_vertex_uv(Vec3::new(x, y, -extrude), [0.0, 0.0]);
        }
        triangles.extend(glyph_triangles.iter().map(|t| t.map(|i| base + i)));
        outline.extend(local.iter().map(|c| c.iter().map(|i| base + i).collect()));
        glyphs.push(GlyphOutline {
            base,
            points,
            contours: local,
        });
    }

    if mesh.vertex_count() == 0 {
        return Err(GenError::domain(Stage::Text, "body", "text has no visible glyphs"));
    }

    for [a, b, c] in &triangles {
        mesh.add_face(&[2 * a, 2 * b, 2 * c]);
        mesh.add_face(&[2 * c + 1, 2 * b + 1, 2 * a + 1]);
    }
    for contour in &outline {
        for i in 0..contour.len() {
            let (a, b) = (contour[i], contour[(i + 1) % contour.len()]);
            mesh.add_face(&[2 * a + 1, 2 * b + 1, 2 * b, 2 * a]);
        }
    }

    planar_uvs(&mut mesh);
    mesh.recompute_normals();

    let mesh = if bevel_width > 0.0 {
        bevel_caps(mesh, &glyphs, &triangles, unit, extrude, bevel_width, params.bevel_segments)?
    } else {
        mesh
    };

    debug!(
        body = %params.body,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "generated text"
    );
    Ok(mesh)
}

/// Bevel the cap outlines, then re-triangulate both caps over the inset rings
///
/// The width snaps to whole inset steps so the beveled ring is an exact
/// scale of the integer outline it is triangulated from.
fn bevel_caps(
    mesh: MeshBuffer,
    glyphs: &[GlyphOutline],
    triangles: &[[u32; 3]],
    unit: f32,
    extrude: f32,
    width: f32,
    segments: u32,
) -> Result<MeshBuffer> {
    // Outline edges are at least one cell long, walls are 2 * extrude
    let shortest = unit.min(2.0 * extrude);
    let steps = (width.min(shortest * MAX_WIDTH_FRACTION) / unit * INSET_STEPS as f32).floor() as i32;
    if steps == 0 {
        return Ok(mesh);
    }
    let width = steps as f32 * unit / INSET_STEPS as f32;

    // Front and back copies have matching parity, so same-parity edges lie on a cap
    let mut mesh = bevel_edges(&mesh, width, segments, |a, b| a % 2 == b % 2);

    // Faces keep their order through the bevel: cap triangle j is face 2j
    // (front) and face 2j + 1 (back, reversed)
    let point_count: usize = glyphs.iter().map(|g| g.points.len()).sum();
    let mut front_of = vec![0u32; point_count];
    let mut back_of = vec![0u32; point_count];
    for (j, triangle) in triangles.iter().enumerate() {
        let (front, back) = (&mesh.faces[2 * j], &mesh.faces[2 * j + 1]);
        for (k, &p) in triangle.iter().enumerate() {
            front_of[p as usize] = front[k];
            back_of[p as usize] = back[2 - k];
        }
    }

    let walls = mesh.faces.split_off(2 * triangles.len());
    mesh.faces.clear();
    for glyph in glyphs {
        let inset = inset_outline(&glyph.points, &glyph.contours, steps);
        let cap = triangulate::triangulate(&inset, &glyph.contours).map_err(|reason| {
            GenError::domain(Stage::Text, "bevel_width", format!("inset cap: {reason}"))
        })?;
        for [a, b, c] in cap.iter().map(|t| t.map(|i| (glyph.base + i) as usize)) {
            mesh.add_face(&[front_of[a], front_of[b], front_of[c]]);
            mesh.add_face(&[back_of[c], back_of[b], back_of[a]]);
        }
    }
    mesh.faces.extend(walls);

    for &v in &front_of {
        mesh.normals[v as usize] = [0.0, 0.0, 1.0];
    }
    for &v in &back_of {
        mesh.normals[v as usize] = [0.0, 0.0, -1.0];
    }
    Ok(mesh)
}

/// Move every contour corner `steps` fixed-point steps into the glyph
///
/// Contours are axis-aligned with the filled cells on their left, so a
/// corner moves along the sum of the left normals of its two edges.
fn inset_outline(points: &[IVec2], contours: &[Vec<u32>], steps: i32) -> Vec<IVec2> {
    let left = |d: IVec2| IVec2::new(-d.y, d.x);
    let mut inset = vec![IVec2::ZERO; points.len()];
    for contour in contours {
        let n = contour.len();
        for i in 0..n {
            let prev = points[contour[(i + n - 1) % n] as usize];
            let cur = points[contour[i] as usize];
            let next = points[contour[(i + 1) % n] as usize];
            let shift = left((cur - prev).signum()) + left((next - cur).signum());
            inset[contour[i] as usize] = cur * INSET_STEPS + shift * steps;
        }
    }
    inset
}

/// Project UVs onto the XY bounds
fn planar_uvs(mesh: &mut MeshBuffer) {
    let Some((min, max)) = mesh.bounds() else {
        return;
    };
    let extent = (max - min).max(Vec3::splat(f32::EPSILON));
    mesh.uvs = mesh
        .positions
        .iter()
        .map(|p| [(p[0] - min.x) / extent.x, (p[1] - min.y) / extent.y])
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_closed_manifold() {
        for body in ["TS", "N", "C", "R", "B8#"] {
            let mesh = text(&TextParams::new(body, 0.35, 0.04)).unwrap();
            assert!(mesh.is_manifold(), "{body}");
            assert!(mesh.is_closed(), "{body}");
            assert_eq!(mesh.uvs.len(), mesh.vertex_count());
        }
    }

    #[test]
    fn test_text_euler_counts_holes() {
        // One hole per glyph loop: O has genus 1, B has genus 2
        let o = text(&TextParams::new("O", 1.0, 0.1)).unwrap();
        assert_eq!(o.euler_characteristic(), 0);
        let b = text(&TextParams::new("B", 1.0, 0.1)).unwrap();
        assert_eq!(b.euler_characteristic(), -2);
    }

    #[test]
    fn test_text_dimensions() {
        let mesh = text(&TextParams::new("T", 1.0, 0.05)).unwrap();
        let (min, max) = mesh.bounds().unwrap();
        assert!((max.y - min.y - CAP_HEIGHT).abs() < 1e-5);
        assert!((max.z - 0.05).abs() < 1e-6 && (min.z + 0.05).abs() < 1e-6);
        // Centred
        assert!((min.x + max.x).abs() < 1e-5);
        assert!((min.y + max.y).abs() < 1e-5);
    }

    #[test]
    fn test_cap_normals_face_outward() {
        let mesh = text(&TextParams::new("L", 1.0, 0.1)).unwrap();
        let front = mesh
            .faces
            .iter()
            .find(|f| f.iter().all(|&i| i % 2 == 0))
            .unwrap();
        assert!(mesh.face_normal(front).z > 0.99);
    }

    #[test]
    fn test_beveled_text_stays_closed() {
        let params = TextParams::new("TS", 0.35, 0.04).with_bevel(0.012, 3);
        let plain = text(&TextParams::new("TS", 0.35, 0.04)).unwrap();
        let mesh = text(&params).unwrap();
        assert!(mesh.is_manifold());
        assert!(mesh.is_closed());
        assert_eq!(mesh.euler_characteristic(), plain.euler_characteristic());
        assert!(mesh.face_count() > plain.face_count());

        for ch in "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+#-.".chars() {
            let extrude = 0.04;
            let mesh = text(&TextParams::new(ch, 0.35, extrude).with_bevel(0.012, 3)).unwrap();
            assert!(mesh.is_manifold() && mesh.is_closed(), "glyph {ch}");
            let on_cap = |face: &[u32], z: f32| face.iter().all(|&i| (mesh.position(i).z - z).abs() < 1e-6);
            let (mut front, mut back) = (0, 0);
            for face in &mesh.faces {
                if on_cap(&face[..], extrude) {
                    front += 1;
                    assert!(mesh.face_normal(face).z > 0.99, "glyph {ch}: front cap face {face:?} folds over");
                } else if on_cap(&face[..], -extrude) {
                    back += 1;
                    assert!(mesh.face_normal(face).z < -0.99, "glyph {ch}: back cap face {face:?} folds over");
                }
            }
            assert!(front > 0 && front == back, "glyph {ch}");
        }
    }

    #[test]
    fn test_bevel_insets_outline_corners() {
        // Unit square, counter-clockwise: every corner moves diagonally inward
        let points = vec![IVec2::new(0, 0), IVec2::new(1, 0), IVec2::new(1, 1), IVec2::new(0, 1)];
        let inset = inset_outline(&points, &[vec![0, 1, 2, 3]], 10);
        let s = INSET_STEPS;
        assert_eq!(
            inset,
            [IVec2::new(10, 10), IVec2::new(s - 10, 10), IVec2::new(s - 10, s - 10), IVec2::new(10, s - 10)]
        );
    }

    #[test]
    fn test_text_rejects_bad_input() {
        assert!(text(&TextParams::new("", 1.0, 0.1)).is_err());
        assert!(text(&TextParams::new("   ", 1.0, 0.1)).is_err());
        assert!(text(&TextParams::new("A@", 1.0, 0.1)).is_err());
        assert!(text(&TextParams::new("A", 0.0, 0.1)).is_err());
        assert!(text(&TextParams::new("A", 1.0, -0.1)).is_err());
        assert!(text(&TextParams::new("A", 1.0, 0.1).with_bevel(0.01, 0)).is_err());
    }

    #[test]
    fn test_lowercase_matches_uppercase() {
        let lower = text(&TextParams::new("rust", 0.2, 0.03)).unwrap();
        let upper = text(&TextParams::new("RUST", 0.2, 0.03)).unwrap();
        assert_eq!(lower, upper);
    }
}
