//! Styled text to bitmap.
//!
//! The live preview and the exported bitmap share one measuring path: [`TextRasterizer::measure`]
//! builds the [`TextPreview`] for both, so the captured bitmap has exactly the pixel size and
//! pixels the designer saw. The captured size travels with the asset;
//! consumers display it at that size instead of re-deriving it from percent geometry.
//!
//! Box model, outside in: shadow margin, stroke inset (half the stroke width, so the outline
//! centered on the glyph edge is never clipped), background padding, content.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use parley::layout::PositionedLayoutItem;
use vello_cpu::kurbo::Shape as _;

use crate::foundation::core::{Affine, ColorRgba8, Point, Vec2};
use crate::foundation::error::{StrataError, StrataResult};
use crate::render::pixels::{
    affine_to_cpu, apply_opacity_in_place, blur_premul_in_place, dims_u16, encode_png_premul,
    finish_ctx, premul_over_in_place,
};
use crate::text::fonts::FontLibrary;
use crate::text::style::{FontSlant, TextAlign, TextDecoration, TextStyle};
use crate::upload::remote::UploadPayload;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrush {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl From<ColorRgba8> for TextBrush {
    fn from(c: ColorRgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

impl From<TextBrush> for ColorRgba8 {
    fn from(b: TextBrush) -> Self {
        Self {
            r: b.r,
            g: b.g,
            b: b.b,
            a: b.a,
        }
    }
}

/// Knobs for measuring and padding text.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextRasterOptions {
    /// Size bound of the off-screen measuring surface.
    pub max_offscreen_px: f32,
    /// Horizontal background padding, in multiples of the font size.
    pub background_padding_x_em: f32,
    /// Vertical background padding, in multiples of the font size.
    pub background_padding_y_em: f32,
}

impl Default for TextRasterOptions {
    fn default() -> Self {
        Self {
            max_offscreen_px: 4096.0,
            background_padding_x_em: 0.3,
            background_padding_y_em: 0.15,
        }
    }
}

/// Measured geometry of a text box, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBoxMetrics {
    /// Width of the laid-out text.
    pub content_width: f64,
    /// Height of the laid-out text.
    pub content_height: f64,
    /// Background padding left and right of the content.
    pub padding_x: f64,
    /// Background padding above and below the content.
    pub padding_y: f64,
    /// Half the stroke width, rounded up.
    pub stroke_inset: f64,
    /// Shadow margins as `[left, top, right, bottom]`.
    pub shadow_margin: [f64; 4],
    /// Final bitmap width (after rotation).
    pub pixel_width: u32,
    /// Final bitmap height (after rotation).
    pub pixel_height: u32,
}

impl TextBoxMetrics {
    /// Width of the element box (content, padding and stroke inset).
    pub fn element_width(&self) -> f64 {
        self.content_width + 2.0 * (self.padding_x + self.stroke_inset)
    }

    /// Height of the element box.
    pub fn element_height(&self) -> f64 {
        self.content_height + 2.0 * (self.padding_y + self.stroke_inset)
    }

    fn content_origin(&self) -> Vec2 {
        Vec2::new(
            self.shadow_margin[0] + self.stroke_inset + self.padding_x,
            self.shadow_margin[1] + self.stroke_inset + self.padding_y,
        )
    }
}

/// A measured, styled text element ready to be drawn.
///
/// This is the live preview: the editor mounts one while the designer edits a text draft, and
/// capturing it produces the uploaded bitmap.
pub struct TextPreview {
    fingerprint: u64,
    style: TextStyle,
    layout: parley::Layout<TextBrush>,
    metrics: TextBoxMetrics,
    transform: Affine,
}

impl std::fmt::Debug for TextPreview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextPreview")
            .field("fingerprint", &self.fingerprint)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl TextPreview {
    /// Fingerprint of the style this preview shows.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Measured box.
    pub fn metrics(&self) -> &TextBoxMetrics {
        &self.metrics
    }

    /// Bitmap size the capture will have.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.metrics.pixel_width, self.metrics.pixel_height)
    }
}

/// Flattened text bitmap in premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterizedText {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major premultiplied RGBA8 pixels.
    pub rgba8_premul: Arc<Vec<u8>>,
    /// Fingerprint of the style that produced the bitmap.
    pub fingerprint: u64,
}

impl RasterizedText {
    /// Encode as a straight-alpha PNG.
    pub fn to_png(&self) -> StrataResult<Vec<u8>> {
        encode_png_premul(self.width, self.height, &self.rgba8_premul)
    }

    /// Wrap the PNG encoding as an uploadable file.
    pub fn to_upload(&self, file_stem: &str) -> StrataResult<UploadPayload> {
        Ok(UploadPayload::png(format!("{file_stem}.png"), self.to_png()?))
    }
}

/// Seam between the editor and text rendering.
pub trait TextRenderer {
    /// Mount (or refresh) the live preview for `style` and return its pixel size.
    fn preview(&mut self, style: &TextStyle) -> StrataResult<(u32, u32)>;

    /// Drop the live preview.
    fn unmount_preview(&mut self);

    /// Capture `style` into a bitmap, from the live preview when it shows the same style.
    fn render(&mut self, style: &TextStyle) -> StrataResult<RasterizedText>;
}

/// Parley + vello_cpu text rasterizer.
pub struct TextRasterizer {
    fonts: FontLibrary,
    layout_ctx: parley::LayoutContext<TextBrush>,
    opts: TextRasterOptions,
    mounted: Option<TextPreview>,
}

impl TextRasterizer {
    /// Create a rasterizer over `fonts`.
    pub fn new(fonts: FontLibrary, opts: TextRasterOptions) -> Self {
        Self {
            fonts,
            layout_ctx: parley::LayoutContext::new(),
            opts,
            mounted: None,
        }
    }

    /// Borrow the font library.
    pub fn fonts(&self) -> &FontLibrary {
        &self.fonts
    }

    /// Mutably borrow the font library (to register more fonts).
    pub fn fonts_mut(&mut self) -> &mut FontLibrary {
        &mut self.fonts
    }

    /// The mounted live preview, if any.
    pub fn mounted_preview(&self) -> Option<&TextPreview> {
        self.mounted.as_ref()
    }

    /// Measure `style` exactly as the preview element shows it.
    pub fn measure(&mut self, style: &TextStyle) -> StrataResult<TextPreview> {
        style.validate()?;
        let style = style.normalized();
        let family = self.fonts.settle(&style)?;
        let styled = style.styled_text();

        let mut builder =
            self.layout_ctx
                .ranged_builder(self.fonts.ctx_mut(), &styled.text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.font_size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(style.font_weight)),
        ));
        if style.font_style == FontSlant::Italic {
            builder.push_default(parley::style::StyleProperty::FontStyle(
                parley::style::FontStyle::Italic,
            ));
        }
        builder.push_default(parley::style::StyleProperty::LetterSpacing(
            style.letter_spacing_px,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush::from(
            style.color,
        )));
        match style.decoration {
            TextDecoration::None => {}
            TextDecoration::Underline => {
                builder.push_default(parley::style::StyleProperty::Underline(true));
            }
            TextDecoration::LineThrough => {
                builder.push_default(parley::style::StyleProperty::Strikethrough(true));
            }
        }
        for span in &styled.spans {
            let range = span.range.clone();
            if span.style.bold {
                builder.push(
                    parley::style::StyleProperty::FontWeight(parley::style::FontWeight::BOLD),
                    range.clone(),
                );
            }
            if span.style.italic {
                builder.push(
                    parley::style::StyleProperty::FontStyle(parley::style::FontStyle::Italic),
                    range.clone(),
                );
            }
            if span.style.underline {
                builder.push(parley::style::StyleProperty::Underline(true), range.clone());
            }
            if span.style.strikethrough {
                builder.push(
                    parley::style::StyleProperty::Strikethrough(true),
                    range.clone(),
                );
            }
            if let Some(c) = span.style.color {
                builder.push(
                    parley::style::StyleProperty::Brush(TextBrush::from(c)),
                    range,
                );
            }
        }

        let mut layout: parley::Layout<TextBrush> = builder.build(&styled.text);
        layout.break_all_lines(None);
        let block_width = layout.width();
        let alignment = match style.align {
            TextAlign::Left => parley::Alignment::Start,
            TextAlign::Center => parley::Alignment::Center,
            TextAlign::Right => parley::Alignment::End,
        };
        layout.align(
            Some(block_width),
            alignment,
            parley::AlignmentOptions::default(),
        );

        let (metrics, transform) = self.box_metrics(&style, &layout)?;
        Ok(TextPreview {
            fingerprint: style.fingerprint(),
            style,
            layout,
            metrics,
            transform,
        })
    }

    fn box_metrics(
        &self,
        style: &TextStyle,
        layout: &parley::Layout<TextBrush>,
    ) -> StrataResult<(TextBoxMetrics, Affine)> {
        let content_width = f64::from(layout.width()).ceil();
        let content_height = f64::from(layout.height()).ceil();
        if content_width <= 0.0 || content_height <= 0.0 {
            return Err(StrataError::rasterization("text measured to an empty box"));
        }

        let size = f64::from(style.font_size_px);
        let (padding_x, padding_y) = if style.background_color.is_transparent() {
            (0.0, 0.0)
        } else {
            (
                (size * f64::from(self.opts.background_padding_x_em)).round(),
                (size * f64::from(self.opts.background_padding_y_em)).round(),
            )
        };
        let stroke_inset = if style.stroke_width_px > 0.0 && !style.stroke_color.is_transparent()
        {
            (f64::from(style.stroke_width_px) / 2.0).ceil()
        } else {
            0.0
        };
        let shadow_margin = if style.shadow.is_visible() {
            let blur = f64::from(style.shadow.blur_px);
            let ox = f64::from(style.shadow.offset_x_px);
            let oy = f64::from(style.shadow.offset_y_px);
            [
                (blur - ox).max(0.0).ceil(),
                (blur - oy).max(0.0).ceil(),
                (blur + ox).max(0.0).ceil(),
                (blur + oy).max(0.0).ceil(),
            ]
        } else {
            [0.0; 4]
        };

        let mut metrics = TextBoxMetrics {
            content_width,
            content_height,
            padding_x,
            padding_y,
            stroke_inset,
            shadow_margin,
            pixel_width: 0,
            pixel_height: 0,
        };
        let outer_w = shadow_margin[0] + metrics.element_width() + shadow_margin[2];
        let outer_h = shadow_margin[1] + metrics.element_height() + shadow_margin[3];

        let (width, height, transform) = if style.rotation_deg == 0.0 {
            (outer_w, outer_h, Affine::IDENTITY)
        } else {
            let center = Vec2::new(
                shadow_margin[0] + metrics.element_width() / 2.0,
                shadow_margin[1] + metrics.element_height() / 2.0,
            );
            let rot = Affine::rotate(f64::from(style.rotation_deg).to_radians())
                * Affine::translate(-center);
            let corners = [
                Point::new(0.0, 0.0),
                Point::new(outer_w, 0.0),
                Point::new(0.0, outer_h),
                Point::new(outer_w, outer_h),
            ]
            .map(|p| rot * p);
            let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
            let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
            let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
            let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
            // Float noise on axis-aligned rotations must not add a pixel.
            let w = (max_x - min_x - 1e-6).ceil();
            let h = (max_y - min_y - 1e-6).ceil();
            let shift = Vec2::new(
                -min_x + (w - (max_x - min_x)) / 2.0,
                -min_y + (h - (max_y - min_y)) / 2.0,
            );
            (w, h, Affine::translate(shift) * rot)
        };

        let limit = f64::from(self.opts.max_offscreen_px);
        if width > limit || height > limit {
            return Err(StrataError::rasterization(format!(
                "text box {width}x{height} exceeds the {limit}px measuring surface"
            )));
        }
        metrics.pixel_width = width as u32;
        metrics.pixel_height = height as u32;
        Ok((metrics, transform))
    }

    /// Capture a measured preview into a bitmap.
    pub fn capture(preview: &TextPreview) -> StrataResult<RasterizedText> {
        let m = &preview.metrics;
        let s = &preview.style;
        let (w16, h16) = dims_u16(m.pixel_width, m.pixel_height)?;
        let len = (m.pixel_width as usize) * (m.pixel_height as usize) * 4;
        let mut out = vec![0u8; len];

        if !s.background_color.is_transparent() {
            let mut ctx = vello_cpu::RenderContext::new(w16, h16);
            ctx.set_transform(affine_to_cpu(preview.transform));
            ctx.set_paint(cpu_color(s.background_color));
            let rr = vello_cpu::kurbo::RoundedRect::new(
                m.shadow_margin[0],
                m.shadow_margin[1],
                m.shadow_margin[0] + m.element_width(),
                m.shadow_margin[1] + m.element_height(),
                f64::from(s.background_radius_px),
            );
            ctx.fill_path(&rr.to_path(0.1));
            out = finish_ctx(&mut ctx);
        }

        let origin = Affine::translate(m.content_origin());
        let stroke = (m.stroke_inset > 0.0).then_some((s.stroke_width_px, s.stroke_color));

        if s.shadow.is_visible() {
            let offset = Affine::translate((
                f64::from(s.shadow.offset_x_px),
                f64::from(s.shadow.offset_y_px),
            ));
            let mut ctx = vello_cpu::RenderContext::new(w16, h16);
            ctx.set_transform(affine_to_cpu(preview.transform * offset * origin));
            draw_text(&mut ctx, &preview.layout, Some(s.shadow.color), stroke);
            let mut shadow = finish_ctx(&mut ctx);
            blur_premul_in_place(&mut shadow, m.pixel_width, m.pixel_height, s.shadow.blur_px)?;
            premul_over_in_place(&mut out, &shadow)?;
        }

        let mut ctx = vello_cpu::RenderContext::new(w16, h16);
        ctx.set_transform(affine_to_cpu(preview.transform * origin));
        draw_text(&mut ctx, &preview.layout, None, stroke);
        let glyphs = finish_ctx(&mut ctx);
        premul_over_in_place(&mut out, &glyphs)?;

        apply_opacity_in_place(&mut out, f32::from(s.opacity) / 100.0);

        Ok(RasterizedText {
            width: m.pixel_width,
            height: m.pixel_height,
            rgba8_premul: Arc::new(out),
            fingerprint: preview.fingerprint,
        })
    }
}

impl TextRenderer for TextRasterizer {
    fn preview(&mut self, style: &TextStyle) -> StrataResult<(u32, u32)> {
        let preview = self.measure(style)?;
        let size = preview.pixel_size();
        self.mounted = Some(preview);
        Ok(size)
    }

    fn unmount_preview(&mut self) {
        self.mounted = None;
    }

    #[tracing::instrument(skip(self, style), fields(fingerprint = style.fingerprint()))]
    fn render(&mut self, style: &TextStyle) -> StrataResult<RasterizedText> {
        if let Some(mounted) = &self.mounted
            && mounted.fingerprint == style.fingerprint()
        {
            return Self::capture(mounted);
        }
        tracing::debug!("no matching live preview; measuring off-screen");
        let offscreen = self.measure(style)?;
        Self::capture(&offscreen)
    }
}

fn cpu_color(c: ColorRgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

/// Draw every glyph run with its decorations, then the outline if any. `solid` overrides every
/// brush (used for the shadow silhouette).
fn draw_text(
    ctx: &mut vello_cpu::RenderContext,
    layout: &parley::Layout<TextBrush>,
    solid: Option<ColorRgba8>,
    stroke: Option<(f32, ColorRgba8)>,
) {
    let mut fonts: HashMap<(u64, u32), vello_cpu::peniko::FontData> = HashMap::new();
    for line in layout.lines() {
        for item in line.items() {
            let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                continue;
            };
            let run = glyph_run.run();
            let style = glyph_run.style();
            let layout_font = run.font();
            let font = fonts
                .entry((layout_font.data.id(), layout_font.index))
                .or_insert_with(|| {
                    vello_cpu::peniko::FontData::new(
                        vello_cpu::peniko::Blob::from(layout_font.data.data().to_vec()),
                        layout_font.index,
                    )
                })
                .clone();
            let fill = solid.unwrap_or_else(|| ColorRgba8::from(style.brush));
            let glyphs = || {
                glyph_run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                })
            };

            ctx.set_paint(cpu_color(fill));
            ctx.glyph_run(&font)
                .font_size(run.font_size())
                .fill_glyphs(glyphs());

            let metrics = run.metrics();
            let x0 = f64::from(glyph_run.offset());
            let x1 = x0 + f64::from(glyph_run.advance());
            let baseline = f64::from(glyph_run.baseline());
            if style.underline.is_some() {
                let top = baseline - f64::from(metrics.underline_offset);
                let h = f64::from(metrics.underline_size).max(1.0);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(x0, top, x1, top + h));
            }
            if style.strikethrough.is_some() {
                let top = baseline - f64::from(metrics.strikethrough_offset);
                let h = f64::from(metrics.strikethrough_size).max(1.0);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(x0, top, x1, top + h));
            }

            if let Some((width, color)) = stroke {
                ctx.set_paint(cpu_color(solid.unwrap_or(color)));
                ctx.set_stroke(vello_cpu::kurbo::Stroke::new(f64::from(width)));
                ctx.glyph_run(&font)
                    .font_size(run.font_size())
                    .stroke_glyphs(glyphs());
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/raster.rs"]
mod tests;
