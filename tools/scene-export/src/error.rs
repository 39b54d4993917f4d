//! Export and build errors

use std::path::PathBuf;

use proc_gen::GenError;

/// Errors raised while encoding, writing or decoding a scene
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// A node's mesh or material cannot be encoded
    #[error("node {node}: {reason}")]
    Encoding { node: usize, reason: String },

    /// A node references a material missing from the scene's table
    #[error(transparent)]
    NotFound(#[from] GenError),

    /// Export options are out of range
    #[error("invalid export options: {0}")]
    Options(String),

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input is not a well-formed scene file
    #[error("malformed scene data: {0}")]
    Decode(String),
}

impl ExportError {
    pub(crate) fn encoding(node: usize, reason: impl Into<String>) -> Self {
        Self::Encoding {
            node,
            reason: reason.into(),
        }
    }
}

/// Failure of one asset in a batch, attributed to the asset by name
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("asset '{asset}': {error}")]
    Generate { asset: String, error: GenError },

    #[error("asset '{asset}': {error}")]
    Export { asset: String, error: ExportError },

    /// Not attempted because an earlier asset failed under the fail-fast policy
    #[error("asset '{asset}': skipped after an earlier failure")]
    Skipped { asset: String },
}

impl BuildError {
    pub fn asset(&self) -> &str {
        match self {
            BuildError::Generate { asset, .. }
            | BuildError::Export { asset, .. }
            | BuildError::Skipped { asset } => asset,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, BuildError::Skipped { .. })
    }
}
