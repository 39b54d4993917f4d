//! Nether scene binary format (.ncscene)
//!
//! A scene file is a fixed header, one metadata block per node, then a single
//! buffer section holding every node's vertex and index blobs back to back.
//! All values are little-endian.

pub mod node;
pub mod scene;

pub use node::*;
pub use scene::*;

/// File extension used for exported scenes
pub const SCENE_EXTENSION: &str = "ncscene";
