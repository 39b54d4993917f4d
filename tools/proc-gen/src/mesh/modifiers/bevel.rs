//! Edge bevel
//!
//! Sharp edges (two faces meeting at more than `BEVEL_ANGLE_LIMIT_DEGREES`)
//! are replaced by a strip of `segments` quads following a quadratic arc.
//! Each beveled vertex is split into one vertex per *sector*: a run of
//! corners around the vertex bounded by sharp edges. Where three or more
//! sectors meet, the gap is closed with a corner patch.
//!
//! Vertices whose fan is not a closed disc (boundary or non-manifold edges)
//! are never beveled, and a sharp edge must continue through both of its
//! endpoints, so open chains are trimmed back until only loops and networks
//! remain.

use glam::Vec3;
use hashbrown::{HashMap, HashSet};
use tracing::{debug, warn};

use super::MeshModifier;
use crate::error::{GenError, Result, Stage, finite, segments};
use crate::mesh::types::{EdgeKey, Face, MeshBuffer, make_edge_key};

/// Dihedral angle above which an edge counts as sharp
pub const BEVEL_ANGLE_LIMIT_DEGREES: f32 = 30.0;

pub const MAX_BEVEL_SEGMENTS: u32 = 64;

/// Largest width as a fraction of the shortest adjacent edge
///
/// Kept just under one half: at exactly half, the sector vertices at both
/// ends of that edge coincide and its strip collapses to zero area.
pub const MAX_WIDTH_FRACTION: f32 = 0.5 * (1.0 - 1e-3);

/// Lower bound on the sine used to push sector vertices off the corner
const MIN_SPREAD: f32 = 0.1;

const COPLANAR_EPSILON: f32 = 1e-4;

/// Bevel all sharp edges
///
/// `width` is clamped to just under half the shortest edge touching a
/// beveled vertex (`MAX_WIDTH_FRACTION`) so neighbouring strips cannot cross
/// or meet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bevel {
    pub width: f32,
    pub segments: u32,
}

impl Bevel {
    pub fn new(width: f32, segments: u32) -> Self {
        Self { width, segments }
    }
}

impl MeshModifier for Bevel {
    fn validate(&self) -> Result<()> {
        let width = finite(Stage::Bevel, "width", self.width)?;
        if width < 0.0 {
            return Err(GenError::domain(Stage::Bevel, "width", format!("{width} must be >= 0")));
        }
        segments(Stage::Bevel, "segments", self.segments, 1)?;
        if self.segments > MAX_BEVEL_SEGMENTS {
            return Err(GenError::domain(
                Stage::Bevel,
                "segments",
                format!("{} exceeds the maximum of {MAX_BEVEL_SEGMENTS}", self.segments),
            ));
        }
        Ok(())
    }

    fn bake(&self, mesh: &MeshBuffer) -> MeshBuffer {
        bevel_edges(mesh, self.width, self.segments, |_, _| true)
    }
}

/// Face corners and half-edge lookup
///
/// Corner `c` is slot `c - offsets[f]` of face `f = face_of[c]`.
struct Corners<'a> {
    faces: &'a [Face],
    offsets: Vec<usize>,
    face_of: Vec<usize>,
    /// Directed edge `(a, b)` to the corner of `a` in the face that holds it
    half_edges: HashMap<(u32, u32), usize>,
    /// Corners of each vertex, ascending
    at_vertex: Vec<Vec<usize>>,
}

impl<'a> Corners<'a> {
    fn new(mesh: &'a MeshBuffer) -> Self {
        let mut offsets = Vec::with_capacity(mesh.faces.len());
        let mut face_of = Vec::new();
        let mut half_edges = HashMap::new();
        let mut at_vertex = vec![Vec::new(); mesh.vertex_count()];

        for (f, face) in mesh.faces.iter().enumerate() {
            offsets.push(face_of.len());
            for i in 0..face.len() {
                let c = face_of.len();
                face_of.push(f);
                half_edges.insert((face[i], face[(i + 1) % face.len()]), c);
                at_vertex[face[i] as usize].push(c);
            }
        }

        Self {
            faces: &mesh.faces,
            offsets,
            face_of,
            half_edges,
            at_vertex,
        }
    }

    fn count(&self) -> usize {
        self.face_of.len()
    }

    fn slot(&self, c: usize) -> (&'a Face, usize) {
        let f = self.face_of[c];
        (&self.faces[f], c - self.offsets[f])
    }

    fn vertex(&self, c: usize) -> u32 {
        let (face, i) = self.slot(c);
        face[i]
    }

    fn next(&self, c: usize) -> usize {
        let (face, i) = self.slot(c);
        c - i + (i + 1) % face.len()
    }

    fn prev(&self, c: usize) -> usize {
        let (face, i) = self.slot(c);
        c - i + (i + face.len() - 1) % face.len()
    }

    /// Corner of the same vertex in the face across the corner's outgoing edge
    fn twin_next(&self, c: usize) -> Option<usize> {
        let v = self.vertex(c);
        let x = self.vertex(self.next(c));
        self.half_edges.get(&(x, v)).map(|&h| self.next(h))
    }

    /// Corners of `v` in rotational order, or `None` if they do not form one closed fan
    fn walk(&self, v: u32) -> Option<Vec<usize>> {
        let corners = &self.at_vertex[v as usize];
        let start = *corners.first()?;
        let mut walk = vec![start];
        loop {
            let next = self.twin_next(*walk.last()?)?;
            if next == start {
                break;
            }
            if walk.len() >= corners.len() {
                return None;
            }
            walk.push(next);
        }
        (walk.len() == corners.len()).then_some(walk)
    }
}

/// Output under construction
struct Builder<'a> {
    source: &'a MeshBuffer,
    out: MeshBuffer,
    segments: u32,
    /// Strip row vertices keyed by (vertex, low sector, high sector, step from low)
    rows: HashMap<(u32, u32, u32, u32), u32>,
}

impl Builder<'_> {
    fn push(&mut self, position: Vec3, normal: Vec3, uv_of: u32) -> u32 {
        let index = self.out.positions.len() as u32;
        self.out.positions.push(position.to_array());
        self.out.normals.push(normal.try_normalize().unwrap_or(Vec3::Z).to_array());
        if self.source.has_uvs() {
            self.out.uvs.push(self.source.uvs[uv_of as usize]);
        }
        index
    }

    /// Vertex `k` of `segments` on the arc from sector vertex `a` to sector vertex `b` around `v`
    fn row(&mut self, v: u32, a: u32, b: u32, k: u32) -> u32 {
        let n = self.segments;
        if k == 0 {
            return a;
        }
        if k == n {
            return b;
        }
        let key = if a < b { (v, a, b, k) } else { (v, b, a, n - k) };
        if let Some(&index) = self.rows.get(&key) {
            return index;
        }

        let t = k as f32 / n as f32;
        let qa = self.out.position(a);
        let qb = self.out.position(b);
        let corner = self.source.position(v);
        let position = (1.0 - t) * (1.0 - t) * qa + 2.0 * t * (1.0 - t) * corner + t * t * qb;
        let normal = Vec3::from(self.out.normals[a as usize]).lerp(Vec3::from(self.out.normals[b as usize]), t);

        let index = self.push(position, normal, v);
        self.rows.insert(key, index);
        index
    }
}

/// Bevel the sharp edges accepted by `select`
///
/// Returns a copy of `mesh` when nothing qualifies or `width` is zero.
pub(crate) fn bevel_edges(
    mesh: &MeshBuffer,
    width: f32,
    segments: u32,
    select: impl Fn(u32, u32) -> bool,
) -> MeshBuffer {
    if width <= 0.0 || segments == 0 || mesh.is_empty() {
        return mesh.clone();
    }

    let corners = Corners::new(mesh);
    let edge_faces = mesh.edge_faces();
    let face_normals: Vec<Vec3> = mesh.faces.iter().map(|f| mesh.face_normal(f)).collect();
    let cos_limit = BEVEL_ANGLE_LIMIT_DEGREES.to_radians().cos();

    let mut sharp: HashSet<EdgeKey> = edge_faces
        .iter()
        .filter(|&(&(a, b), faces)| {
            faces.len() == 2 && select(a, b) && face_normals[faces[0]].dot(face_normals[faces[1]]) < cos_limit
        })
        .map(|(&key, _)| key)
        .collect();

    let mut excluded: HashSet<u32> = edge_faces
        .iter()
        .filter(|(_, faces)| faces.len() != 2)
        .flat_map(|(&(a, b), _)| [a, b])
        .collect();
    let mut walks: HashMap<u32, Vec<usize>> = HashMap::new();
    for &v in sharp.iter().flat_map(|(a, b)| [a, b]) {
        if walks.contains_key(&v) || excluded.contains(&v) {
            continue;
        }
        match corners.walk(v) {
            Some(walk) => {
                walks.insert(v, walk);
            }
            None => {
                excluded.insert(v);
            }
        }
    }
    sharp.retain(|(a, b)| !excluded.contains(a) && !excluded.contains(b));

    // Trim dangling chains: a beveled vertex needs at least two sharp edges
    loop {
        let mut valence: HashMap<u32, u32> = HashMap::new();
        for &(a, b) in &sharp {
            *valence.entry(a).or_default() += 1;
            *valence.entry(b).or_default() += 1;
        }
        let before = sharp.len();
        sharp.retain(|(a, b)| valence[a] > 1 && valence[b] > 1);
        if sharp.len() == before {
            break;
        }
    }

    if sharp.is_empty() {
        return mesh.clone();
    }

    let beveled: HashSet<u32> = sharp.iter().flat_map(|&(a, b)| [a, b]).collect();
    let shortest = edge_faces
        .keys()
        .filter(|(a, b)| beveled.contains(a) || beveled.contains(b))
        .map(|&(a, b)| mesh.position(a).distance(mesh.position(b)))
        .fold(f32::INFINITY, f32::min);
    let limit = shortest * MAX_WIDTH_FRACTION;
    let width = if width > limit {
        warn!(
            requested = width,
            clamped = limit,
            "bevel width clamped below half the shortest adjacent edge"
        );
        limit
    } else {
        width
    };

    let is_sharp = |a: u32, b: u32| sharp.contains(&make_edge_key(a, b));

    let mut builder = Builder {
        source: mesh,
        out: MeshBuffer::new(),
        segments,
        rows: HashMap::new(),
    };
    let mut corner_vertex = vec![0u32; corners.count()];
    let mut fans: Vec<(u32, Vec<Vec<usize>>)> = Vec::new();

    for v in 0..mesh.vertex_count() as u32 {
        let walk = match walks.get(&v) {
            Some(walk) if beveled.contains(&v) => walk,
            _ => {
                let index = builder.push(mesh.position(v), Vec3::from(mesh.normals[v as usize]), v);
                for &c in &corners.at_vertex[v as usize] {
                    corner_vertex[c] = index;
                }
                continue;
            }
        };

        // Start the walk just after a sharp edge, then cut it at every sharp edge
        let start = walk
            .iter()
            .position(|&c| is_sharp(v, corners.vertex(corners.prev(c))))
            .unwrap_or(0);
        let mut runs: Vec<Vec<usize>> = Vec::new();
        let mut run = Vec::new();
        for &c in walk[start..].iter().chain(&walk[..start]) {
            run.push(c);
            if is_sharp(v, corners.vertex(corners.next(c))) {
                runs.push(std::mem::take(&mut run));
            }
        }
        if !run.is_empty() {
            runs.push(run);
        }

        for run in &runs {
            let (position, normal) = sector_vertex(mesh, &corners, &face_normals, v, run, width);
            let index = builder.push(position, normal, v);
            for &c in run {
                corner_vertex[c] = index;
            }
        }
        fans.push((v, runs));
    }

    for (f, face) in mesh.faces.iter().enumerate() {
        let base = corners.offsets[f];
        let remapped: Face = (0..face.len()).map(|i| corner_vertex[base + i]).collect();
        builder.out.faces.push(remapped);
    }

    // Strips along each sharp edge, from the face holding u -> v to the one holding v -> u
    for (u, v) in mesh.ordered_edges() {
        if !is_sharp(u, v) {
            continue;
        }
        let (Some(&a_u), Some(&b_v)) = (corners.half_edges.get(&(u, v)), corners.half_edges.get(&(v, u)))
        else {
            continue;
        };
        let (a_v, b_u) = (corners.next(a_u), corners.next(b_v));
        let (sa_u, sb_u) = (corner_vertex[a_u], corner_vertex[b_u]);
        let (sa_v, sb_v) = (corner_vertex[a_v], corner_vertex[b_v]);
        for k in 0..segments {
            let quad = [
                builder.row(v, sa_v, sb_v, k),
                builder.row(u, sa_u, sb_u, k),
                builder.row(u, sa_u, sb_u, k + 1),
                builder.row(v, sa_v, sb_v, k + 1),
            ];
            builder.out.add_face(&quad);
        }
    }

    // Corner patches where three or more sectors meet
    for (v, runs) in &fans {
        let m = runs.len();
        if m < 3 {
            continue;
        }
        let mut boundary = Vec::with_capacity(m * segments as usize);
        for (idx, run) in runs.iter().enumerate() {
            let here = corner_vertex[run[0]];
            let there = corner_vertex[runs[(idx + 1) % m][0]];
            boundary.push(here);
            for k in (1..segments).rev() {
                boundary.push(builder.row(*v, there, here, k));
            }
        }
        boundary.reverse();

        if segments == 1 {
            builder.out.add_face(&boundary);
            continue;
        }

        let ring: Vec<Vec3> = boundary.iter().map(|&i| builder.out.position(i)).collect();
        let average = ring.iter().copied().sum::<Vec3>() / ring.len() as f32;
        let normal: Vec3 = boundary.iter().map(|&i| Vec3::from(builder.out.normals[i as usize])).sum();
        let center = builder.push((average + mesh.position(*v)) * 0.5, normal, *v);

        let len = boundary.len();
        let mut i = 0;
        while i + 2 <= len {
            builder
                .out
                .add_face(&[center, boundary[i], boundary[i + 1], boundary[(i + 2) % len]]);
            i += 2;
        }
        if len % 2 == 1 {
            builder.out.add_face(&[center, boundary[len - 1], boundary[0]]);
        }
    }

    let out = builder.out;
    debug!(
        sharp_edges = sharp.len(),
        width,
        segments,
        vertices = out.vertex_count(),
        faces = out.face_count(),
        "beveled mesh"
    );
    out
}

/// Position and normal of the vertex replacing `v` for one sector
fn sector_vertex(
    mesh: &MeshBuffer,
    corners: &Corners,
    face_normals: &[Vec3],
    v: u32,
    run: &[usize],
    width: f32,
) -> (Vec3, Vec3) {
    let origin = mesh.position(v);
    let toward = |c: usize| (mesh.position(corners.vertex(c)) - origin).normalize_or_zero();
    let (first, last) = (run[0], run[run.len() - 1]);
    let d1 = toward(corners.prev(first));
    let d2 = toward(corners.next(last));

    let normals: Vec<Vec3> = run.iter().map(|&c| face_normals[corners.face_of[c]]).collect();
    let coplanar = normals.iter().all(|n| normals[0].dot(*n) > 1.0 - COPLANAR_EPSILON);

    let (direction, distance) = if coplanar {
        let angle: f32 = run
            .iter()
            .map(|&c| toward(corners.prev(c)).angle_between(toward(corners.next(c))))
            .sum();
        let bisector = d1 + d2;
        let direction = if bisector.length() < 1e-6 {
            normals[normals.len() - 1].cross(d2)
        } else if angle > std::f32::consts::PI {
            -bisector
        } else {
            bisector
        };
        (direction.normalize_or_zero(), width / (angle * 0.5).sin().max(MIN_SPREAD))
    } else {
        // Folded sector: slide along the interior edges of the run
        let direction = run[..run.len() - 1]
            .iter()
            .map(|&c| toward(corners.next(c)))
            .sum::<Vec3>()
            .normalize_or_zero();
        let spread = (direction.cross(d1).length() + direction.cross(d2).length()) * 0.5;
        (direction, width / spread.max(MIN_SPREAD))
    };

    let normal = normals.iter().copied().sum::<Vec3>();
    (origin + direction * distance, normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::modifiers::MeshApply;
    use crate::mesh::primitives::{cuboid, cylinder, sphere};

    fn volume(mesh: &MeshBuffer) -> f32 {
        mesh.triangulate()
            .iter()
            .map(|[a, b, c]| mesh.position(*a).dot(mesh.position(*b).cross(mesh.position(*c))) / 6.0)
            .sum()
    }

    #[test]
    fn test_prism_face_counts() {
        let prism = cylinder(0.5, 0.2, 8).unwrap();
        assert_eq!(prism.face_count(), 14);

        let two = prism.clone().apply(Bevel::new(0.02, 2)).unwrap();
        assert_eq!(two.face_count(), 110);
        let one = prism.apply(Bevel::new(0.02, 1)).unwrap();
        assert_eq!(one.face_count(), 54);
    }

    #[test]
    fn test_cube_face_count() {
        let cube = cuboid(Vec3::splat(2.0)).unwrap();
        let beveled = cube.apply(Bevel::new(0.1, 4)).unwrap();
        assert_eq!(beveled.face_count(), 102);
    }

    #[test]
    fn test_bevel_keeps_closed_orientable_surface() {
        for segments in 1..=3 {
            let prism = cylinder(0.5, 0.2, 8).unwrap();
            let beveled = prism.clone().apply(Bevel::new(0.02, segments)).unwrap();
            assert!(beveled.is_manifold());
            assert!(beveled.is_closed());
            assert_eq!(beveled.euler_characteristic(), 2);
            assert!(beveled.validate().is_ok());
            // Rounding removes a little volume, never flips it
            let (before, after) = (volume(&prism), volume(&beveled));
            assert!(after > 0.0 && after < before, "{after} vs {before}");
        }
    }

    #[test]
    fn test_smooth_mesh_is_untouched() {
        // 64 segments: neighbouring faces differ by well under 30 degrees
        let ball = sphere(1.0, 64, 32).unwrap();
        let beveled = ball.clone().apply(Bevel::new(0.05, 2)).unwrap();
        assert_eq!(beveled, ball);
    }

    #[test]
    fn test_zero_width_is_identity() {
        let cube = cuboid(Vec3::ONE).unwrap();
        assert_eq!(cube.clone().apply(Bevel::new(0.0, 3)).unwrap(), cube);
    }

    #[test]
    fn test_open_mesh_is_untouched() {
        let mut quad = MeshBuffer::new();
        for p in [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y] {
            quad.add_vertex(p);
        }
        quad.add_face(&[0, 1, 2, 3]);
        quad.recompute_normals();
        assert_eq!(quad.clone().apply(Bevel::new(0.1, 2)).unwrap(), quad);
    }

    #[test]
    fn test_width_is_clamped() {
        let cube = cuboid(Vec3::ONE).unwrap();
        let beveled = cube.apply(Bevel::new(5.0, 2)).unwrap();
        assert!(beveled.validate().is_ok());
        let (min, max) = beveled.bounds().unwrap();
        assert!(min.cmpge(Vec3::splat(-0.5 - 1e-5)).all());
        assert!(max.cmple(Vec3::splat(0.5 + 1e-5)).all());
    }

    #[test]
    fn test_clamped_width_leaves_no_degenerate_faces() {
        let slab = cuboid(Vec3::new(0.5, 0.5, 0.1)).unwrap();
        let beveled = slab.apply(Bevel::new(0.08, 4)).unwrap();
        assert!(beveled.is_manifold() && beveled.is_closed());
        for face in &beveled.faces {
            let area = beveled.face_normal_weighted(face).length();
            assert!(area > 1e-7, "face {face:?} has area {area}");
        }

        let cube = cuboid(Vec3::ONE).unwrap();
        let beveled = cube.apply(Bevel::new(5.0, 3)).unwrap();
        for face in &beveled.faces {
            let area = beveled.face_normal_weighted(face).length();
            assert!(area > 1e-8, "face {face:?} has area {area}");
        }
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(Bevel::new(-0.1, 2).validate().is_err());
        assert!(Bevel::new(f32::NAN, 2).validate().is_err());
        assert!(Bevel::new(0.1, 0).validate().is_err());
        assert!(Bevel::new(0.1, MAX_BEVEL_SEGMENTS + 1).validate().is_err());
    }
}
