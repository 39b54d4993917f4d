//! scene-export library
//!
//! Encodes procedural scenes to the `.ncscene` interchange format, reads them
//! back for inspection, and drives parallel batch builds from recipe
//! manifests. Used by the `scene-export` CLI and by `gen-assets`.

pub mod batch;
pub mod decode;
pub mod error;
pub mod export;
pub mod manifest;
pub mod writer;

pub use batch::{AssetRecipe, BatchConfig, BatchPolicy, BatchReport, output_path, run_batch};
pub use decode::{DecodedNode, DecodedScene, decode_scene};
pub use error::{BuildError, ExportError};
pub use export::{
    EncodedScene, ExportOptions, ExportReport, NodeGeometry, SceneStats, encode_scene,
    export_scene, flatten_mesh,
};

// Re-export the format so callers don't need a direct scene-common dependency
pub use scene_common::{MAX_COMPRESSION_LEVEL, SCENE_EXTENSION};
