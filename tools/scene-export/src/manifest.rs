//! Recipe manifest parsing
//!
//! Parses a scene manifest (TOML) into asset recipes for the batch driver.
//!
//! ```toml
//! [output]
//! dir = "out"
//! compress = true
//!
//! [[asset]]
//! name = "badge"
//!
//! [[asset.material]]
//! name = "Blue"
//! color = 0x336791
//! metallic = 0.5
//! roughness = 0.2
//!
//! [[asset.node]]
//! material = "Blue"
//! primitive = { kind = "cylinder", radius = 0.5, depth = 0.2, segments = 8 }
//! modifiers = [{ kind = "bevel", width = 0.02, segments = 2 }]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use glam::Vec3;
use hashbrown::HashSet;
use proc_gen::mesh::{ModifierSpec, ModifierStack, PrimitiveSpec};
use proc_gen::{AssetContext, MaterialParams, Scene, placement};
use scene_common::MAX_COMPRESSION_LEVEL;
use serde::Deserialize;
use tracing::debug;

use crate::batch::{AssetRecipe, BatchPolicy};
use crate::export::ExportOptions;

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub asset: Vec<AssetEntry>,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub compress: bool,
    #[serde(default = "default_compression_level")]
    pub compression_level: u8,
    #[serde(default)]
    pub policy: BatchPolicy,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            compress: false,
            compression_level: default_compression_level(),
            policy: BatchPolicy::default(),
        }
    }
}

impl OutputConfig {
    pub fn export_options(&self) -> ExportOptions {
        if self.compress {
            ExportOptions::compressed(self.compression_level)
        } else {
            ExportOptions::uncompressed()
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated/")
}

pub fn default_compression_level() -> u8 {
    6
}

/// One exported scene
#[derive(Debug, Deserialize)]
pub struct AssetEntry {
    pub name: String,
    /// Overrides `output.compress` for this asset
    #[serde(default)]
    pub compress: Option<bool>,
    /// Overrides `output.compression_level`; implies compression
    #[serde(default)]
    pub compression_level: Option<u8>,
    #[serde(default)]
    pub material: Vec<MaterialEntry>,
    #[serde(default)]
    pub node: Vec<NodeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct MaterialEntry {
    pub name: String,
    #[serde(flatten)]
    pub params: MaterialParams,
}

#[derive(Debug, Deserialize)]
pub struct NodeEntry {
    pub material: String,
    pub primitive: PrimitiveSpec,
    /// Applied in order
    #[serde(default)]
    pub modifiers: Vec<ModifierSpec>,
    #[serde(default)]
    pub location: [f32; 3],
    /// XYZ Euler angles in degrees
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    /// Move the baked mesh's bounds centre to the origin
    #[serde(default)]
    pub recenter: bool,
}

fn default_scale() -> [f32; 3] {
    [1.0; 3]
}

impl AssetRecipe for AssetEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self) -> proc_gen::Result<Scene> {
        let mut ctx = AssetContext::new(&self.name);
        for material in &self.material {
            ctx.define_material(&material.name, &material.params)?;
        }

        for node in &self.node {
            let stack = ModifierStack::from_specs(node.modifiers.iter().cloned())?;
            let mut mesh = stack.bake(node.primitive.build()?);
            if node.recenter {
                mesh.recenter();
            }
            let transform = placement(
                Vec3::from(node.location),
                Vec3::from(node.rotation),
                Vec3::from(node.scale),
            );
            ctx.add_node(mesh, &node.material, transform)?;
        }

        debug!(asset = %self.name, nodes = ctx.node_count(), "built asset");
        Ok(ctx.finish())
    }

    fn export_options(&self, defaults: ExportOptions) -> ExportOptions {
        let level = self
            .compression_level
            .or(defaults.compression)
            .unwrap_or_else(default_compression_level);
        match (self.compress, self.compression_level) {
            (Some(false), _) => ExportOptions::uncompressed(),
            (Some(true), _) | (None, Some(_)) => ExportOptions::compressed(level),
            (None, None) => defaults,
        }
    }
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    parse_manifest(&content).with_context(|| format!("Failed to parse manifest: {:?}", path))
}

/// Parse and validate manifest text
pub fn parse_manifest(content: &str) -> Result<Manifest> {
    let manifest: Manifest = toml::from_str(content)?;
    validate(&manifest)?;
    Ok(manifest)
}

/// Check asset names and compression levels
///
/// Material references are resolved when each asset builds, so a bad
/// reference fails only that asset.
pub fn validate(manifest: &Manifest) -> Result<()> {
    check_level("output.compression_level", manifest.output.compression_level)?;

    let mut seen = HashSet::new();
    for asset in &manifest.asset {
        if asset.name.is_empty()
            || asset.name.contains(['/', '\\'])
            || asset.name.starts_with('.')
        {
            bail!("Invalid asset name {:?}", asset.name);
        }
        if !seen.insert(asset.name.as_str()) {
            bail!("Duplicate asset name '{}'", asset.name);
        }
        if let Some(level) = asset.compression_level {
            check_level(&format!("asset '{}' compression_level", asset.name), level)?;
        }
        if asset.node.is_empty() {
            bail!("Asset '{}' has no nodes", asset.name);
        }
    }
    Ok(())
}

fn check_level(what: &str, level: u8) -> Result<()> {
    if level > MAX_COMPRESSION_LEVEL {
        bail!("{what} {level} is outside [0, {MAX_COMPRESSION_LEVEL}]");
    }
    Ok(())
}
