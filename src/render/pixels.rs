//! Premultiplied RGBA8 pixel helpers shared by the text rasterizer and the canvas compositor.

use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{StrataError, StrataResult};
use crate::foundation::math::{mul_div255_u8, unpremultiply_rgba8_in_place};

/// A rendered frame as RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Encode as a straight-alpha PNG.
    pub fn to_png(&self) -> StrataResult<Vec<u8>> {
        if self.premultiplied {
            encode_png_premul(self.width, self.height, &self.data)
        } else {
            encode_png_straight(self.width, self.height, self.data.clone())
        }
    }
}

/// Unpremultiply a copy of `premul` and encode it as PNG.
pub(crate) fn encode_png_premul(width: u32, height: u32, premul: &[u8]) -> StrataResult<Vec<u8>> {
    let mut straight = premul.to_vec();
    unpremultiply_rgba8_in_place(&mut straight);
    encode_png_straight(width, height, straight)
}

fn encode_png_straight(width: u32, height: u32, rgba: Vec<u8>) -> StrataResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| StrataError::rasterization("bitmap size does not match pixel data"))?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

pub(crate) fn dims_u16(width: u32, height: u32) -> StrataResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| StrataError::rasterization("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| StrataError::rasterization("surface height exceeds u16"))?;
    Ok((w, h))
}

/// Flush `ctx` into a fresh pixmap and return its premultiplied bytes.
pub(crate) fn finish_ctx(ctx: &mut vello_cpu::RenderContext) -> Vec<u8> {
    let mut pixmap = vello_cpu::Pixmap::new(ctx.width(), ctx.height());
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    pixmap.data_as_u8_slice().to_vec()
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> StrataResult<vello_cpu::Pixmap> {
    let (w, h) = dims_u16(width, height)?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(StrataError::rasterization("pixmap byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

pub(crate) fn premul_image_paint(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> StrataResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

pub(crate) fn affine_to_cpu(a: kurbo::Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

/// Source-over of `src` onto `dst`, both premultiplied and the same size.
pub(crate) fn premul_over_in_place(dst: &mut [u8], src: &[u8]) -> StrataResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(StrataError::rasterization(
            "premul_over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = u16::from(s[3]);
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - sa;
        d[3] = s[3].saturating_add(mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let dc = mul_div255_u8(u16::from(d[c]), inv);
            d[c] = s[c].saturating_add(dc);
        }
    }
    Ok(())
}

/// Scale every premultiplied channel by `opacity` in `[0, 1]`.
pub(crate) fn apply_opacity_in_place(rgba: &mut [u8], opacity: f32) {
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as u16).min(255);
    if op == 255 {
        return;
    }
    for c in rgba.iter_mut() {
        *c = mul_div255_u8(u16::from(*c), op);
    }
}

/// Gaussian blur of a premultiplied buffer with a CSS-style blur radius.
///
/// `sigma = radius / 2`, matching how browsers interpret shadow blur lengths.
pub(crate) fn blur_premul_in_place(
    rgba: &mut [u8],
    width: u32,
    height: u32,
    radius_px: f32,
) -> StrataResult<()> {
    if !radius_px.is_finite() || radius_px <= 0.0 || width == 0 || height == 0 {
        return Ok(());
    }
    let radius = radius_px.ceil() as u32;
    let kernel = gaussian_kernel_q16(radius, radius_px / 2.0)?;
    let mut tmp = vec![0u8; rgba.len()];
    horizontal_blur_q16(rgba, &mut tmp, width, height, &kernel);
    vertical_blur_q16(&tmp, rgba, width, height, &kernel);
    Ok(())
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> StrataResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(StrataError::rasterization(
            "blur sigma must be finite and > 0",
        ));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(StrataError::rasterization("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

// Samples outside the buffer are transparent so shadows fade out at the edges instead of
// smearing edge pixels.
fn horizontal_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = x + ki as i32 - radius;
                if sx < 0 || sx >= w {
                    continue;
                }
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = y + ki as i32 - radius;
                if sy < 0 || sy >= h {
                    continue;
                }
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/pixels.rs"]
mod tests;
