//! Placeholder string decoding.
//!
//! A placeholder string is a base83-encoded grid of cosine basis colours: one DC (average) term
//! followed by quantized AC (detail) terms. [`decode::decode`] evaluates the grid directly into a
//! small RGBA8 raster; there is no encoder.

/// The 83-symbol alphabet codec.
pub mod base83;
/// Structure validation, component extraction and raster reconstruction.
pub mod decode;
