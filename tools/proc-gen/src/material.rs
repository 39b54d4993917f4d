//! PBR materials and the per-asset material table
//!
//! Colors are written either as packed `0xRRGGBB` integers or as normalized
//! `[r, g, b]` floats. Each asset owns its own `MaterialTable`, so
//! definitions never leak from one asset build into the next.

use hashbrown::HashMap;
use scene_common::rgb_from_packed;
use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result, Stage, finite, unit};

/// RGB color as written in recipes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    /// Packed `0xRRGGBB`
    Packed(u32),
    /// Normalized floats
    Rgb([f32; 3]),
}

impl Color {
    pub const BLACK: Color = Color::Rgb([0.0; 3]);

    /// Expand to normalized floats (`r = (v >> 16 & 0xFF) / 255` and so on)
    pub fn to_rgb(self) -> [f32; 3] {
        match self {
            Color::Packed(value) => rgb_from_packed(value),
            Color::Rgb(rgb) => rgb,
        }
    }
}

impl From<u32> for Color {
    fn from(value: u32) -> Self {
        Color::Packed(value)
    }
}

/// Immutable, validated material value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub base_color: [f32; 3],
    /// 0.0 = dielectric, 1.0 = metal
    pub metallic: f32,
    /// 0.0 = mirror, 1.0 = rough
    pub roughness: f32,
    pub emission_color: [f32; 3],
    /// 0.0 = not emissive
    pub emission_strength: f32,
}

impl Material {
    pub fn is_emissive(&self) -> bool {
        self.emission_strength > 0.0
    }
}

/// Material parameters before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialParams {
    pub color: Color,
    #[serde(default = "default_metallic")]
    pub metallic: f32,
    #[serde(default = "default_roughness")]
    pub roughness: f32,
    /// Emission color; black when omitted
    #[serde(default)]
    pub emission: Option<Color>,
    #[serde(default)]
    pub emission_strength: f32,
}

fn default_metallic() -> f32 {
    0.4
}

fn default_roughness() -> f32 {
    0.3
}

impl MaterialParams {
    /// Material with a packed `0xRRGGBB` base color
    pub fn new(color: u32, metallic: f32, roughness: f32) -> Self {
        Self::with_color(Color::Packed(color), metallic, roughness)
    }

    /// Material with a normalized RGB base color
    pub fn rgb(color: [f32; 3], metallic: f32, roughness: f32) -> Self {
        Self::with_color(Color::Rgb(color), metallic, roughness)
    }

    pub fn with_color(color: Color, metallic: f32, roughness: f32) -> Self {
        Self {
            color,
            metallic,
            roughness,
            emission: None,
            emission_strength: 0.0,
        }
    }

    /// Glow with a packed `0xRRGGBB` color at `strength`
    pub fn with_emission(mut self, color: u32, strength: f32) -> Self {
        self.emission = Some(Color::Packed(color));
        self.emission_strength = strength;
        self
    }

    /// Validate ranges and expand colors
    pub fn resolve(&self) -> Result<Material> {
        let metallic = unit(Stage::Material, "metallic", self.metallic)?;
        let roughness = unit(Stage::Material, "roughness", self.roughness)?;
        let emission_strength = finite(Stage::Material, "emission_strength", self.emission_strength)?;
        if emission_strength < 0.0 {
            return Err(GenError::domain(
                Stage::Material,
                "emission_strength",
                format!("{emission_strength} must be >= 0"),
            ));
        }

        let base_color = checked_rgb("color", self.color)?;
        let emission_color = checked_rgb("emission", self.emission.unwrap_or(Color::BLACK))?;
        Ok(Material {
            base_color,
            metallic,
            roughness,
            emission_color,
            emission_strength,
        })
    }
}

fn checked_rgb(param: &'static str, color: Color) -> Result<[f32; 3]> {
    let rgb = color.to_rgb();
    if rgb.iter().all(|c| c.is_finite() && *c >= 0.0) {
        Ok(rgb)
    } else {
        Err(GenError::domain(
            Stage::Material,
            param,
            format!("{rgb:?} must be finite and non-negative"),
        ))
    }
}

/// Stable handle to a material in one `MaterialTable`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialRef(usize);

impl MaterialRef {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Named materials for one asset
///
/// Redefining a name replaces the material in place, so references handed
/// out earlier see the new definition.
#[derive(Debug, Clone, Default)]
pub struct MaterialTable {
    by_name: HashMap<String, usize>,
    entries: Vec<(String, Material)>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) a material, returning its handle
    pub fn define(&mut self, name: &str, params: &MaterialParams) -> Result<MaterialRef> {
        let material = params.resolve()?;
        if let Some(&index) = self.by_name.get(name) {
            self.entries[index].1 = material;
            return Ok(MaterialRef(index));
        }
        let index = self.entries.len();
        self.entries.push((name.to_string(), material));
        self.by_name.insert(name.to_string(), index);
        Ok(MaterialRef(index))
    }

    pub fn lookup(&self, name: &str) -> Result<MaterialRef> {
        self.by_name
            .get(name)
            .map(|&index| MaterialRef(index))
            .ok_or_else(|| GenError::NotFound {
                kind: "material",
                name: name.to_string(),
            })
    }

    pub fn get(&self, name: &str) -> Result<Material> {
        let handle = self.lookup(name)?;
        Ok(self.entries[handle.0].1)
    }

    /// Material behind a handle; `None` if it came from another table
    pub fn resolve(&self, handle: MaterialRef) -> Option<&Material> {
        self.entries.get(handle.0).map(|(_, material)| material)
    }

    pub fn name(&self, handle: MaterialRef) -> Option<&str> {
        self.entries.get(handle.0).map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every definition
    pub fn clear(&mut self) {
        self.by_name.clear();
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialRef, &str, &Material)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, (name, material))| (MaterialRef(index), name.as_str(), material))
    }
}
