//! Raster and SVG decoding.
//!
//! Uploads are sniffed by content, never by file name: anything that parses as SVG markup goes
//! through `usvg`/`resvg`, everything else through `image`.

use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::Size;
use crate::foundation::error::{StrataError, StrataResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Largest SVG raster edge we allocate.
const MAX_SVG_DIM: u32 = 16_384;

/// A decoded image in premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl DecodedImage {
    /// Pixel size as a [`Size`].
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Return `true` when `bytes` look like SVG markup.
pub fn is_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let Ok(text) = std::str::from_utf8(head) else {
        return false;
    };
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

/// Decode a raster image (PNG, JPEG, WebP, ...) into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> StrataResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Parse SVG markup.
pub fn parse_svg(bytes: &[u8]) -> StrataResult<usvg::Tree> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(tree)
}

/// Rasterize `tree` stretched to `width` x `height`.
pub fn rasterize_svg(tree: &usvg::Tree, width: u32, height: u32) -> StrataResult<DecodedImage> {
    if width == 0 || height == 0 || width > MAX_SVG_DIM || height > MAX_SVG_DIM {
        return Err(StrataError::validation(format!(
            "svg raster size {width}x{height} out of range (max {MAX_SVG_DIM})"
        )));
    }
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| StrataError::rasterization("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(pixmap.data().to_vec()),
    })
}

fn svg_pixel_size(tree: &usvg::Tree) -> StrataResult<(u32, u32)> {
    fn to_px(v: f32) -> StrataResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(StrataError::validation("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    }
    let size = tree.size();
    Ok((to_px(size.width())?, to_px(size.height())?))
}

/// Intrinsic pixel size of an uploaded image without decoding raster pixels.
pub fn intrinsic_size(bytes: &[u8]) -> StrataResult<Size> {
    if is_svg(bytes) {
        let (w, h) = svg_pixel_size(&parse_svg(bytes)?)?;
        return Ok(Size::new(f64::from(w), f64::from(h)));
    }
    let (w, h) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("sniff image format")?
        .into_dimensions()
        .context("read image dimensions")?;
    Ok(Size::new(f64::from(w), f64::from(h)))
}

/// Decode any supported upload at its intrinsic size.
pub fn decode_any(bytes: &[u8]) -> StrataResult<DecodedImage> {
    if is_svg(bytes) {
        let tree = parse_svg(bytes)?;
        let (w, h) = svg_pixel_size(&tree)?;
        rasterize_svg(&tree, w, h)
    } else {
        decode_image(bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
