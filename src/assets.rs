//! Uploaded asset bytes: decoding and local preview storage.

/// Raster and SVG decoding.
pub mod decode;
/// Local preview bytes keyed by placeholder.
pub mod preview;
