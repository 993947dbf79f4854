//! Pixel output: premultiplied buffers, PNG encoding and canvas composition.

/// Canvas composition.
pub mod canvas;
/// Premultiplied RGBA8 helpers and PNG encoding.
pub mod pixels;
