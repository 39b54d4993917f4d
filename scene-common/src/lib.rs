//! Shared types and utilities for the procedural asset pipeline
//!
//! Holds the `.ncscene` binary format headers and the attribute packing
//! helpers used by both the exporter (writing) and its decoder (reading).

pub mod formats;
pub mod packing;

pub use formats::*;
pub use packing::{
    dequantize_range, dequantize_snorm, decode_octahedral, encode_octahedral, index_bits,
    normal_bits, pack_normal_octahedral, pack_uv_f16, position_bits, quantize_range,
    quantize_snorm, rgb_from_packed, unpack_normal_octahedral, unpack_uv_f16,
    vertex_stride_bits, BitReader, BitWriter, FORMAT_NORMAL, FORMAT_UV, MAX_COMPRESSION_LEVEL,
};
