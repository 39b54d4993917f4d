//! Catmull-Clark subdivision

use glam::{Vec2, Vec3};
use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::debug;

use super::MeshModifier;
use crate::error::{GenError, Result, Stage};
use crate::mesh::types::{EdgeKey, MeshBuffer, make_edge_key};

/// Highest accepted subdivision level; each level multiplies the face count by 4
pub const MAX_SUBDIVISION_LEVELS: u32 = 6;

/// Catmull-Clark subdivision surface
///
/// Every face becomes one quad per corner. Boundary edges and vertices use
/// the crease rules, so open meshes keep their outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subdivide {
    /// Number of subdivision passes (0 leaves the mesh unchanged)
    pub levels: u32,
}

impl Default for Subdivide {
    fn default() -> Self {
        Self { levels: 1 }
    }
}

impl MeshModifier for Subdivide {
    fn validate(&self) -> Result<()> {
        if self.levels > MAX_SUBDIVISION_LEVELS {
            return Err(GenError::domain(
                Stage::Subdivide,
                "levels",
                format!("{} is outside [0, {MAX_SUBDIVISION_LEVELS}]", self.levels),
            ));
        }
        Ok(())
    }

    fn bake(&self, mesh: &MeshBuffer) -> MeshBuffer {
        let mut out = mesh.clone();
        for level in 0..self.levels {
            out = subdivide_once(&out);
            debug!(level = level + 1, faces = out.face_count(), "subdivided");
        }
        out
    }
}

/// Perform a single subdivision pass
///
/// Output vertices are the smoothed originals, then one edge point per edge
/// (first-use order), then one face point per face.
fn subdivide_once(mesh: &MeshBuffer) -> MeshBuffer {
    let vertex_count = mesh.vertex_count();
    let edges = mesh.ordered_edges();
    let edge_index: HashMap<EdgeKey, u32> = edges
        .iter()
        .enumerate()
        .map(|(i, &key)| (key, i as u32))
        .collect();

    let mut edge_faces: Vec<SmallVec<[usize; 2]>> = vec![SmallVec::new(); edges.len()];
    let mut vertex_faces: Vec<SmallVec<[usize; 8]>> = vec![SmallVec::new(); vertex_count];
    for (f, face) in mesh.faces.iter().enumerate() {
        for i in 0..face.len() {
            let key = make_edge_key(face[i], face[(i + 1) % face.len()]);
            edge_faces[edge_index[&key] as usize].push(f);
            vertex_faces[face[i] as usize].push(f);
        }
    }

    let face_points: Vec<Vec3> = mesh.faces.iter().map(|f| mesh.face_centroid(f)).collect();

    let edge_points: Vec<Vec3> = edges
        .iter()
        .zip(&edge_faces)
        .map(|(&(a, b), faces)| {
            let (pa, pb) = (mesh.position(a), mesh.position(b));
            if faces.len() == 2 {
                (pa + pb + face_points[faces[0]] + face_points[faces[1]]) * 0.25
            } else {
                (pa + pb) * 0.5
            }
        })
        .collect();

    let mut vertex_edges: Vec<SmallVec<[u32; 8]>> = vec![SmallVec::new(); vertex_count];
    for (i, &(a, b)) in edges.iter().enumerate() {
        vertex_edges[a as usize].push(i as u32);
        vertex_edges[b as usize].push(i as u32);
    }

    let mut out = MeshBuffer::new();
    out.positions.reserve(vertex_count + edges.len() + mesh.face_count());

    for v in 0..vertex_count {
        let p = mesh.position(v as u32);
        let incident = &vertex_edges[v];
        let boundary: SmallVec<[u32; 2]> = incident
            .iter()
            .filter(|&&e| edge_faces[e as usize].len() != 2)
            .map(|&e| {
                let (a, b) = edges[e as usize];
                if a as usize == v { b } else { a }
            })
            .collect();

        let smoothed = if incident.is_empty() {
            p
        } else if !boundary.is_empty() {
            // Crease rule along the boundary; non-manifold spots stay put
            if boundary.len() == 2 {
                (mesh.position(boundary[0]) + 6.0 * p + mesh.position(boundary[1])) / 8.0
            } else {
                p
            }
        } else {
            let n = incident.len() as f32;
            let face_avg = vertex_faces[v].iter().map(|&f| face_points[f]).sum::<Vec3>()
                / vertex_faces[v].len().max(1) as f32;
            let edge_avg = incident
                .iter()
                .map(|&e| {
                    let (a, b) = edges[e as usize];
                    (mesh.position(a) + mesh.position(b)) * 0.5
                })
                .sum::<Vec3>()
                / n;
            (face_avg + 2.0 * edge_avg + (n - 3.0) * p) / n
        };
        out.add_vertex(smoothed);
    }
    for &point in edge_points.iter().chain(&face_points) {
        out.add_vertex(point);
    }

    if mesh.has_uvs() {
        let uv = |i: u32| Vec2::from(mesh.uvs[i as usize]);
        out.uvs.extend_from_slice(&mesh.uvs);
        out.uvs.extend(edges.iter().map(|&(a, b)| ((uv(a) + uv(b)) * 0.5).to_array()));
        out.uvs.extend(mesh.faces.iter().map(|face| {
            let sum: Vec2 = face.iter().map(|&i| uv(i)).sum();
            (sum / face.len() as f32).to_array()
        }));
    }

    let edge_base = vertex_count as u32;
    let face_base = edge_base + edges.len() as u32;
    out.faces.reserve(mesh.faces.iter().map(|f| f.len()).sum());
    for (f, face) in mesh.faces.iter().enumerate() {
        let len = face.len();
        for i in 0..len {
            let prev = edge_index[&make_edge_key(face[(i + len - 1) % len], face[i])];
            let next = edge_index[&make_edge_key(face[i], face[(i + 1) % len])];
            out.add_face(&[face[i], edge_base + next, face_base + f as u32, edge_base + prev]);
        }
    }

    out.recompute_normals();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::modifiers::MeshApply;
    use crate::mesh::primitives::{cuboid, cylinder, sphere};

    #[test]
    fn test_quad_mesh_face_count_quadruples() {
        let cube = cuboid(Vec3::ONE).unwrap();
        let once = cube.clone().apply(Subdivide { levels: 1 }).unwrap();
        assert_eq!(once.face_count(), 24);
        assert_eq!(once.vertex_count(), 8 + 12 + 6);
        let twice = cube.apply(Subdivide { levels: 2 }).unwrap();
        assert_eq!(twice.face_count(), 96);
    }

    #[test]
    fn test_levels_compose() {
        let base = cylinder(0.5, 0.2, 8).unwrap();
        let two = base.clone().apply(Subdivide { levels: 2 }).unwrap();
        let one_one = base
            .apply(Subdivide { levels: 1 })
            .unwrap()
            .apply(Subdivide { levels: 1 })
            .unwrap();
        assert_eq!(two, one_one);
    }

    #[test]
    fn test_zero_levels_is_identity() {
        let ball = sphere(1.0, 8, 4).unwrap();
        assert_eq!(ball.clone().apply(Subdivide { levels: 0 }).unwrap(), ball);
    }

    #[test]
    fn test_cube_shrinks_towards_sphere() {
        let cube = cuboid(Vec3::splat(2.0)).unwrap();
        let smooth = cube.apply(Subdivide { levels: 1 }).unwrap();
        // Corner (1,1,1) with valence 3: (F + 2R + 0P) / 3
        let corner = smooth.position(6);
        assert!((corner - Vec3::splat(5.0 / 9.0)).length() < 1e-5, "{corner}");
        assert!(smooth.is_closed());
        assert_eq!(smooth.euler_characteristic(), 2);
    }

    #[test]
    fn test_boundary_uses_crease_rule() {
        let mut strip = MeshBuffer::new();
        for x in 0..3 {
            strip.add_vertex(Vec3::new(x as f32, 0.0, 0.0));
        }
        for x in 0..3 {
            strip.add_vertex(Vec3::new(x as f32, 1.0, 0.0));
        }
        strip.add_face(&[0, 1, 4, 3]);
        strip.add_face(&[1, 2, 5, 4]);
        let smooth = strip.apply(Subdivide { levels: 1 }).unwrap();
        // Boundary vertices stay in the plane and on their boundary line
        assert!(smooth.positions.iter().all(|p| p[2] == 0.0));
        assert_eq!(smooth.position(1), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(smooth.position(0), Vec3::new(0.125, 0.125, 0.0));
        assert_eq!(smooth.face_count(), 8);
    }

    #[test]
    fn test_uvs_interpolate() {
        let mut quad = MeshBuffer::new();
        quad.add_vertex_uv(Vec3::ZERO, [0.0, 0.0]);
        quad.add_vertex_uv(Vec3::X, [1.0, 0.0]);
        quad.add_vertex_uv(Vec3::new(1.0, 1.0, 0.0), [1.0, 1.0]);
        quad.add_vertex_uv(Vec3::Y, [0.0, 1.0]);
        quad.add_face(&[0, 1, 2, 3]);
        let smooth = quad.apply(Subdivide { levels: 1 }).unwrap();
        assert_eq!(smooth.uvs.len(), smooth.vertex_count());
        assert_eq!(smooth.uvs[smooth.vertex_count() - 1], [0.5, 0.5]);
    }

    #[test]
    fn test_rejects_excessive_levels() {
        assert!(Subdivide { levels: 7 }.validate().is_err());
        assert!(Subdivide { levels: 6 }.validate().is_ok());
    }
}
