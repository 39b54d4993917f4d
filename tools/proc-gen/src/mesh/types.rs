//! Mesh buffer and topology queries
//!
//! `MeshBuffer` stores polygon faces rather than triangles so that modifiers
//! (bevel, subdivision) can work on the quads the generators produce. Faces
//! are triangulated only at export time.

use glam::Vec3;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// A polygon face: vertex indices in counter-clockwise order seen from outside
pub type Face = SmallVec<[u32; 4]>;

/// Undirected edge key: sorted pair of vertex indices
pub type EdgeKey = (u32, u32);

#[inline]
pub fn make_edge_key(a: u32, b: u32) -> EdgeKey {
    if a < b { (a, b) } else { (b, a) }
}

/// Owned polygon mesh with per-vertex normals and optional UVs
///
/// `uvs` is either empty or the same length as `positions`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffer {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub faces: Vec<Face>,
}

impl MeshBuffer {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex with a placeholder normal, returning its index
    pub fn add_vertex(&mut self, position: Vec3) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position.to_array());
        self.normals.push([0.0, 0.0, 1.0]);
        index
    }

    /// Add a vertex with UV coordinates, returning its index
    pub fn add_vertex_uv(&mut self, position: Vec3, uv: [f32; 2]) -> u32 {
        let index = self.add_vertex(position);
        self.uvs.push(uv);
        index
    }

    /// Add a polygon face
    pub fn add_face(&mut self, indices: &[u32]) {
        self.faces.push(Face::from_slice(indices));
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.faces.is_empty()
    }

    #[inline]
    pub fn position(&self, index: u32) -> Vec3 {
        Vec3::from(self.positions[index as usize])
    }

    /// Number of triangles after fan triangulation
    pub fn triangle_count(&self) -> usize {
        self.faces.iter().map(|f| f.len().saturating_sub(2)).sum()
    }

    /// Fan-triangulate every face, preserving winding
    pub fn triangulate(&self) -> Vec<[u32; 3]> {
        let mut triangles = Vec::with_capacity(self.triangle_count());
        for face in &self.faces {
            for i in 1..face.len().saturating_sub(1) {
                triangles.push([face[0], face[i], face[i + 1]]);
            }
        }
        triangles
    }

    /// Map each undirected edge to the faces that use it
    pub fn edge_faces(&self) -> HashMap<EdgeKey, SmallVec<[usize; 2]>> {
        let mut edges: HashMap<EdgeKey, SmallVec<[usize; 2]>> = HashMap::new();
        for (face_idx, face) in self.faces.iter().enumerate() {
            for i in 0..face.len() {
                let key = make_edge_key(face[i], face[(i + 1) % face.len()]);
                edges.entry(key).or_default().push(face_idx);
            }
        }
        edges
    }

    /// Undirected edges in first-use order (deterministic)
    pub fn ordered_edges(&self) -> Vec<EdgeKey> {
        let mut seen = hashbrown::HashSet::new();
        let mut edges = Vec::new();
        for face in &self.faces {
            for i in 0..face.len() {
                let key = make_edge_key(face[i], face[(i + 1) % face.len()]);
                if seen.insert(key) {
                    edges.push(key);
                }
            }
        }
        edges
    }

    /// Number of distinct undirected edges
    pub fn edge_count(&self) -> usize {
        self.edge_faces().len()
    }

    /// V - E + F
    pub fn euler_characteristic(&self) -> i64 {
        self.vertex_count() as i64 - self.edge_count() as i64 + self.face_count() as i64
    }

    /// Every edge borders one or two faces and no directed edge repeats
    ///
    /// The second condition rejects pairs of faces with opposing winding.
    pub fn is_manifold(&self) -> bool {
        let mut directed = hashbrown::HashSet::new();
        for face in &self.faces {
            for i in 0..face.len() {
                if !directed.insert((face[i], face[(i + 1) % face.len()])) {
                    return false;
                }
            }
        }
        self.edge_faces().values().all(|faces| faces.len() <= 2)
    }

    /// True when every edge borders exactly two faces
    pub fn is_closed(&self) -> bool {
        self.edge_faces().values().all(|faces| faces.len() == 2)
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for a mesh without vertices
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.positions.iter().map(|p| Vec3::from(*p));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }

    /// Area-weighted face normal (Newell's method), unnormalized
    pub fn face_normal_weighted(&self, face: &[u32]) -> Vec3 {
        let mut normal = Vec3::ZERO;
        for i in 0..face.len() {
            let a = self.position(face[i]);
            let b = self.position(face[(i + 1) % face.len()]);
            normal += a.cross(b);
        }
        normal * 0.5
    }

    /// Unit face normal
    pub fn face_normal(&self, face: &[u32]) -> Vec3 {
        self.face_normal_weighted(face).normalize_or_zero()
    }

    /// Face centroid (average of its vertices)
    pub fn face_centroid(&self, face: &[u32]) -> Vec3 {
        let sum: Vec3 = face.iter().map(|&i| self.position(i)).sum();
        sum / face.len().max(1) as f32
    }

    /// Recalculate vertex normals from area-weighted face normals
    ///
    /// Vertices not referenced by any face get +Z so every normal stays unit length.
    pub fn recompute_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.positions.len()];
        for face in &self.faces {
            let normal = self.face_normal_weighted(face);
            for &i in face {
                accum[i as usize] += normal;
            }
        }
        self.normals = accum
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Z).to_array())
            .collect();
    }

    /// Translate so the bounds centre sits at the origin
    pub fn recenter(&mut self) {
        if let Some((min, max)) = self.bounds() {
            let center = (min + max) * 0.5;
            for p in &mut self.positions {
                *p = (Vec3::from(*p) - center).to_array();
            }
        }
    }

    /// Check index ranges, attribute lengths and finite values
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.positions.is_empty() {
            return Err("mesh has no vertices".into());
        }
        if self.faces.is_empty() {
            return Err("mesh has no faces".into());
        }
        if self.normals.len() != self.positions.len() {
            return Err(format!(
                "{} normals for {} positions",
                self.normals.len(),
                self.positions.len()
            ));
        }
        if self.has_uvs() && self.uvs.len() != self.positions.len() {
            return Err(format!("{} uvs for {} positions", self.uvs.len(), self.positions.len()));
        }
        let count = self.positions.len() as u32;
        for (face_idx, face) in self.faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(format!("face {face_idx} has {} vertices", face.len()));
            }
            if let Some(&bad) = face.iter().find(|&&i| i >= count) {
                return Err(format!("face {face_idx} references vertex {bad} of {count}"));
            }
        }
        let finite = self
            .positions
            .iter()
            .chain(&self.normals)
            .flatten()
            .chain(self.uvs.iter().flatten())
            .all(|v| v.is_finite());
        if !finite {
            return Err("mesh contains non-finite attributes".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshBuffer {
        let mut mesh = MeshBuffer::new();
        let a = mesh.add_vertex(Vec3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Vec3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Vec3::new(1.0, 1.0, 0.0));
        let d = mesh.add_vertex(Vec3::new(0.0, 1.0, 0.0));
        mesh.add_face(&[a, b, c, d]);
        mesh.recompute_normals();
        mesh
    }

    #[test]
    fn test_triangulate_quad() {
        let mesh = quad();
        assert_eq!(mesh.triangulate(), vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_open_quad_topology() {
        let mesh = quad();
        assert_eq!(mesh.edge_count(), 4);
        assert!(mesh.is_manifold());
        assert!(!mesh.is_closed());
        assert_eq!(mesh.euler_characteristic(), 1);
    }

    #[test]
    fn test_recompute_normals_ccw_faces_up() {
        let mesh = quad();
        for n in &mesh.normals {
            assert!((Vec3::from(*n) - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_recenter() {
        let mut mesh = quad();
        mesh.recenter();
        let (min, max) = mesh.bounds().unwrap();
        assert!((min + max).length() < 1e-6);
    }

    #[test]
    fn test_validate_rejects_bad_index() {
        let mut mesh = quad();
        mesh.add_face(&[0, 1, 9]);
        assert!(mesh.validate().unwrap_err().contains("vertex 9"));
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(MeshBuffer::new().validate().is_err());
    }

    #[test]
    fn test_opposing_winding_is_not_manifold() {
        let mut mesh = quad();
        mesh.add_face(&[0, 1, 2, 3]);
        assert!(!mesh.is_manifold());
    }
}
