//! Scene assembly
//!
//! A `Scene` is the unit of export: an ordered list of nodes plus the
//! material table they index into. `AssetContext` bundles a fresh table and
//! builder for one asset build and is consumed when the asset is finished.

use glam::{Mat4, Vec3};
use tracing::debug;

use crate::error::Result;
use crate::material::{Material, MaterialParams, MaterialRef, MaterialTable};
use crate::mesh::MeshBuffer;
use crate::mesh::modifiers::euler_xyz;

/// One placed mesh
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: Option<String>,
    pub mesh: MeshBuffer,
    pub material: MaterialRef,
    /// Object-to-world transform
    pub transform: Mat4,
}

/// Nodes in insertion order plus the materials they reference
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
    pub materials: MaterialTable,
}

impl Scene {
    /// Material of a node, if its handle belongs to this scene's table
    pub fn material(&self, node: &SceneNode) -> Option<&Material> {
        self.materials.resolve(node.material)
    }

    pub fn vertex_count(&self) -> usize {
        self.nodes.iter().map(|n| n.mesh.vertex_count()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.nodes.iter().map(|n| n.mesh.triangle_count()).sum()
    }
}

/// Collects nodes in order
#[derive(Debug, Clone, Default)]
pub struct SceneBuilder {
    nodes: Vec<SceneNode>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, mesh: MeshBuffer, material: MaterialRef, transform: Mat4) -> &mut Self {
        self.nodes.push(SceneNode {
            name: None,
            mesh,
            material,
            transform,
        });
        self
    }

    /// Add a node carrying a display name
    pub fn add_named_node(
        &mut self,
        name: impl Into<String>,
        mesh: MeshBuffer,
        material: MaterialRef,
        transform: Mat4,
    ) -> &mut Self {
        self.nodes.push(SceneNode {
            name: Some(name.into()),
            mesh,
            material,
            transform,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn build(self, materials: MaterialTable) -> Scene {
        Scene {
            nodes: self.nodes,
            materials,
        }
    }
}

/// Build state for a single asset
///
/// Every asset starts from an empty material table; nothing survives
/// `finish`.
#[derive(Debug)]
pub struct AssetContext {
    name: String,
    materials: MaterialTable,
    builder: SceneBuilder,
}

impl AssetContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            materials: MaterialTable::new(),
            builder: SceneBuilder::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn define_material(&mut self, name: &str, params: &MaterialParams) -> Result<MaterialRef> {
        self.materials.define(name, params)
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    /// Place a mesh using a material defined earlier in this asset
    pub fn add_node(&mut self, mesh: MeshBuffer, material: &str, transform: Mat4) -> Result<&mut Self> {
        let handle = self.materials.lookup(material)?;
        debug!(
            asset = %self.name,
            material,
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "added node"
        );
        self.builder.add_named_node(material, mesh, handle, transform);
        Ok(self)
    }

    pub fn node_count(&self) -> usize {
        self.builder.len()
    }

    pub fn finish(self) -> Scene {
        self.builder.build(self.materials)
    }
}

/// Object transform from location, XYZ Euler rotation in degrees, and scale
pub fn placement(location: Vec3, rotation_degrees: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, euler_xyz(rotation_degrees), location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GenError;
    use crate::mesh::primitives::cuboid;

    #[test]
    fn test_asset_context_resolves_materials() {
        let mut ctx = AssetContext::new("demo");
        ctx.define_material("Blue", &MaterialParams::new(0x336791, 0.5, 0.2))
            .unwrap();
        ctx.add_node(cuboid(Vec3::ONE).unwrap(), "Blue", Mat4::IDENTITY)
            .unwrap();

        let scene = ctx.finish();
        assert_eq!(scene.nodes.len(), 1);
        let material = scene.material(&scene.nodes[0]).unwrap();
        assert!((material.base_color[0] - 0x33 as f32 / 255.0).abs() < 1e-6);
        assert_eq!(scene.nodes[0].name.as_deref(), Some("Blue"));
    }

    #[test]
    fn test_unknown_material_is_not_found() {
        let mut ctx = AssetContext::new("demo");
        let err = ctx
            .add_node(cuboid(Vec3::ONE).unwrap(), "Missing", Mat4::IDENTITY)
            .unwrap_err();
        assert!(matches!(err, GenError::NotFound { kind: "material", .. }));
        assert_eq!(ctx.node_count(), 0);
    }

    #[test]
    fn test_contexts_do_not_share_materials() {
        let mut first = AssetContext::new("a");
        first
            .define_material("Shared", &MaterialParams::new(0xFFFFFF, 0.0, 0.5))
            .unwrap();
        let second = AssetContext::new("b");
        assert!(second.materials().lookup("Shared").is_err());
    }

    #[test]
    fn test_placement_order() {
        let m = placement(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, 90.0), Vec3::splat(2.0));
        let p = m.transform_point3(Vec3::X);
        assert!((p - Vec3::new(0.0, 2.0, 1.0)).length() < 1e-5);
    }
}
