//! Canvas composition.
//!
//! The background fills its fit box; visible layers follow bottom to top, each showing its active
//! image. Uploaded images are contained (aspect preserved, centered) inside the layer's placement.
//! Text captures are drawn 1:1 at their captured size from the placement's top-left corner.

use std::collections::HashMap;

use crate::assets::decode::{DecodedImage, decode_any};
use crate::assets::preview::LocalPreviewCache;
use crate::foundation::core::{ColorRgba8, ContainerSize, LocalRef};
use crate::foundation::error::{StrataError, StrataResult};
use crate::geometry::fit::{PixelRect, fit_box_for, percent_to_pixel};
use crate::layers::model::{Background, LayerImage, SourceKind};
use crate::layers::store::LayerStore;
use crate::render::pixels::{FrameRGBA, dims_u16, finish_ctx, premul_image_paint};

/// Pixel source for the compositor. `Ok(None)` skips the element.
pub trait CanvasAssets {
    /// Pixels of the background.
    fn background_pixels(&mut self, background: &Background) -> StrataResult<Option<DecodedImage>>;
    /// Pixels of a layer image.
    fn image_pixels(&mut self, image: &LayerImage) -> StrataResult<Option<DecodedImage>>;
}

/// [`CanvasAssets`] over the editor's local preview bytes, decoding each placeholder once.
#[derive(Debug)]
pub struct PreviewAssets<'a> {
    previews: &'a LocalPreviewCache,
    decoded: HashMap<LocalRef, DecodedImage>,
}

impl<'a> PreviewAssets<'a> {
    /// Wrap a preview cache.
    pub fn new(previews: &'a LocalPreviewCache) -> Self {
        Self {
            previews,
            decoded: HashMap::new(),
        }
    }

    fn decode(&mut self, local: &LocalRef) -> StrataResult<Option<DecodedImage>> {
        if let Some(img) = self.decoded.get(local) {
            return Ok(Some(img.clone()));
        }
        let Some(payload) = self.previews.get(local) else {
            return Ok(None);
        };
        let img = decode_any(&payload.bytes)?;
        self.decoded.insert(local.clone(), img.clone());
        Ok(Some(img))
    }
}

impl CanvasAssets for PreviewAssets<'_> {
    fn background_pixels(&mut self, background: &Background) -> StrataResult<Option<DecodedImage>> {
        self.decode(&background.local_preview)
    }

    fn image_pixels(&mut self, image: &LayerImage) -> StrataResult<Option<DecodedImage>> {
        self.decode(&image.local_preview)
    }
}

/// Compositor settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CanvasOptions {
    /// Color behind everything.
    pub clear: ColorRgba8,
}

impl Default for CanvasOptions {
    fn default() -> Self {
        Self {
            clear: ColorRgba8::TRANSPARENT,
        }
    }
}

impl CanvasOptions {
    /// Set the clear color.
    pub fn with_clear(mut self, clear: ColorRgba8) -> Self {
        self.clear = clear;
        self
    }
}

/// Largest rect with the aspect of `width x height` centered inside `target`.
pub fn contain_rect(target: PixelRect, width: u32, height: u32) -> PixelRect {
    if width == 0 || height == 0 || target.width <= 0.0 || target.height <= 0.0 {
        return PixelRect::new(target.x, target.y, 0.0, 0.0);
    }
    let (w, h) = (f64::from(width), f64::from(height));
    let scale = (target.width / w).min(target.height / h);
    let (cw, ch) = (w * scale, h * scale);
    PixelRect::new(
        target.x + (target.width - cw) / 2.0,
        target.y + (target.height - ch) / 2.0,
        cw,
        ch,
    )
}

/// Compose the canvas at `container` size into a premultiplied frame.
#[tracing::instrument(skip(store, assets, opts))]
pub fn compose_canvas(
    store: &LayerStore,
    container: ContainerSize,
    assets: &mut dyn CanvasAssets,
    opts: &CanvasOptions,
) -> StrataResult<FrameRGBA> {
    let bg_size = store.background().and_then(|b| b.intrinsic_size);
    let fit = fit_box_for(container, bg_size).ok_or_else(|| {
        StrataError::geometry(format!(
            "container {}x{} has no area",
            container.width, container.height
        ))
    })?;
    let width = container.width.ceil() as u32;
    let height = container.height.ceil() as u32;
    let (w16, h16) = dims_u16(width, height)?;

    let mut ctx = vello_cpu::RenderContext::new(w16, h16);
    if !opts.clear.is_transparent() {
        let c = opts.clear;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(width),
            f64::from(height),
        ));
    }

    if let Some(bg) = store.background() {
        match assets.background_pixels(bg)? {
            Some(img) => draw_image(
                &mut ctx,
                &img,
                PixelRect::new(fit.left, fit.top, fit.width, fit.height),
            )?,
            None => tracing::debug!(local = %bg.local_preview, "background has no pixels"),
        }
    }

    for layer in store.visible_layers() {
        let Some(image) = layer.active() else {
            continue;
        };
        let Some(img) = assets.image_pixels(image)? else {
            tracing::debug!(layer = layer.id.0, image = image.id.0, "image has no pixels");
            continue;
        };
        let target = percent_to_pixel(fit, image.geometry);
        let dst = match (image.source_kind, image.captured_size) {
            (SourceKind::Text, Some(c)) => {
                PixelRect::new(target.x, target.y, f64::from(c.width), f64::from(c.height))
            }
            _ => contain_rect(target, img.width, img.height),
        };
        draw_image(&mut ctx, &img, dst)?;
    }

    Ok(FrameRGBA {
        width,
        height,
        data: finish_ctx(&mut ctx),
        premultiplied: true,
    })
}

fn draw_image(
    ctx: &mut vello_cpu::RenderContext,
    img: &DecodedImage,
    dst: PixelRect,
) -> StrataResult<()> {
    if img.width == 0 || img.height == 0 || dst.width <= 0.0 || dst.height <= 0.0 {
        return Ok(());
    }
    let paint = premul_image_paint(&img.rgba8_premul, img.width, img.height)?;
    let (w, h) = (f64::from(img.width), f64::from(img.height));
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(
        vello_cpu::kurbo::Affine::translate((dst.x, dst.y))
            * vello_cpu::kurbo::Affine::scale_non_uniform(dst.width / w, dst.height / h),
    );
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
