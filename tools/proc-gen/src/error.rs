//! Error types for mesh generation, modifiers and material lookup

use std::fmt;

/// Pipeline stage an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Sphere,
    Torus,
    Cylinder,
    Box,
    Text,
    Transform,
    Twist,
    Bevel,
    Subdivide,
    Material,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Sphere => "sphere",
            Stage::Torus => "torus",
            Stage::Cylinder => "cylinder",
            Stage::Box => "box",
            Stage::Text => "text",
            Stage::Transform => "transform",
            Stage::Twist => "twist",
            Stage::Bevel => "bevel",
            Stage::Subdivide => "subdivide",
            Stage::Material => "material",
        };
        f.write_str(name)
    }
}

/// Errors raised while generating or modifying geometry
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenError {
    /// A numeric parameter is outside its valid domain
    #[error("{stage}: invalid {param}: {reason}")]
    Domain {
        stage: Stage,
        param: &'static str,
        reason: String,
    },

    /// A named reference could not be resolved
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
}

impl GenError {
    pub fn domain(stage: Stage, param: &'static str, reason: impl Into<String>) -> Self {
        Self::Domain {
            stage,
            param,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = GenError> = std::result::Result<T, E>;

/// Require a finite value strictly greater than zero
pub(crate) fn positive(stage: Stage, param: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GenError::domain(stage, param, format!("{value} must be a finite value > 0")))
    }
}

/// Require a finite value
pub(crate) fn finite(stage: Stage, param: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GenError::domain(stage, param, format!("{value} is not finite")))
    }
}

/// Require a segment count of at least `min`
pub(crate) fn segments(stage: Stage, param: &'static str, value: u32, min: u32) -> Result<u32> {
    if value >= min {
        Ok(value)
    } else {
        Err(GenError::domain(stage, param, format!("{value} is below the minimum of {min}")))
    }
}

/// Require a value in `[0, 1]`
pub(crate) fn unit(stage: Stage, param: &'static str, value: f32) -> Result<f32> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(GenError::domain(stage, param, format!("{value} must be within [0, 1]")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_names_stage_and_param() {
        let err = segments(Stage::Sphere, "segments", 2, 3).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("sphere: invalid segments"), "{message}");
    }

    #[test]
    fn test_validators() {
        assert!(positive(Stage::Box, "size", 0.0).is_err());
        assert!(positive(Stage::Box, "size", f32::NAN).is_err());
        assert!(finite(Stage::Twist, "angle", f32::INFINITY).is_err());
        assert_eq!(unit(Stage::Material, "metallic", 1.0), Ok(1.0));
        assert!(unit(Stage::Material, "metallic", 1.5).is_err());
    }
}
