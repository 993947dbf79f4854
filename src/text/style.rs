use crate::foundation::core::ColorRgba8;
use crate::foundation::error::{StrataError, StrataResult};
use crate::foundation::math::Fnv1a64;
use crate::text::markup::{StyledText, parse_markup};

/// Horizontal alignment of text lines inside the text block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    /// Align to the left edge.
    #[default]
    Left,
    /// Center lines.
    Center,
    /// Align to the right edge.
    Right,
}

/// Slant of the base font.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontSlant {
    /// Upright.
    #[default]
    Normal,
    /// Italic.
    Italic,
}

/// Line decoration applied to the whole text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextDecoration {
    /// No decoration.
    #[default]
    None,
    /// Line under the text.
    Underline,
    /// Line through the text.
    LineThrough,
}

/// Drop shadow drawn beneath the glyphs.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextShadow {
    /// Shadow color; transparent disables the shadow.
    pub color: ColorRgba8,
    /// Blur radius in pixels.
    #[serde(default)]
    pub blur_px: f32,
    /// Horizontal offset in pixels.
    #[serde(default)]
    pub offset_x_px: f32,
    /// Vertical offset in pixels.
    #[serde(default)]
    pub offset_y_px: f32,
}

impl Default for TextShadow {
    fn default() -> Self {
        Self {
            color: ColorRgba8::TRANSPARENT,
            blur_px: 0.0,
            offset_x_px: 0.0,
            offset_y_px: 0.0,
        }
    }
}

impl TextShadow {
    /// Return `true` when the shadow draws anything.
    pub fn is_visible(&self) -> bool {
        !self.color.is_transparent()
    }
}

/// Full style record of a text layer image.
///
/// The record is persisted with the layer so the text can be re-edited later; rendering always
/// goes back through the rasterizer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextStyle {
    /// Plain-text content, used when `markup` is absent.
    pub content: String,
    /// Inline rich-text markup; supersedes `content` when present.
    pub markup: Option<String>,
    /// Font family name.
    pub font_family: String,
    /// CSS font weight (100..=900).
    pub font_weight: u16,
    /// Font size in pixels.
    pub font_size_px: f32,
    /// Glyph fill color.
    pub color: ColorRgba8,
    /// Fill behind the text box; transparent disables it.
    pub background_color: ColorRgba8,
    /// Corner radius of the background fill.
    pub background_radius_px: f32,
    /// Outline color.
    pub stroke_color: ColorRgba8,
    /// Outline width; zero disables the outline.
    pub stroke_width_px: f32,
    /// Extra spacing between characters in pixels.
    pub letter_spacing_px: f32,
    /// Drop shadow.
    pub shadow: TextShadow,
    /// Base slant.
    pub font_style: FontSlant,
    /// Base decoration.
    pub decoration: TextDecoration,
    /// Line alignment.
    pub align: TextAlign,
    /// Opacity in percent (0..=100).
    pub opacity: u8,
    /// Rotation about the text box center in degrees (-180..=180).
    pub rotation_deg: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            content: String::new(),
            markup: None,
            font_family: "sans-serif".to_string(),
            font_weight: 400,
            font_size_px: 32.0,
            color: ColorRgba8::BLACK,
            background_color: ColorRgba8::TRANSPARENT,
            background_radius_px: 0.0,
            stroke_color: ColorRgba8::TRANSPARENT,
            stroke_width_px: 0.0,
            letter_spacing_px: 0.0,
            shadow: TextShadow::default(),
            font_style: FontSlant::Normal,
            decoration: TextDecoration::None,
            align: TextAlign::Left,
            opacity: 100,
            rotation_deg: 0.0,
        }
    }
}

impl TextStyle {
    /// Plain text with default styling.
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Resolve markup (or plain content) into text plus styled spans.
    pub fn styled_text(&self) -> StyledText {
        match self.markup.as_deref() {
            Some(m) if !m.trim().is_empty() => parse_markup(m),
            _ => StyledText::plain(&self.content),
        }
    }

    /// Return a copy with every numeric field pulled into its valid range.
    pub fn normalized(&self) -> Self {
        fn non_negative(v: f32) -> f32 {
            if v.is_finite() { v.max(0.0) } else { 0.0 }
        }

        let mut out = self.clone();
        out.font_weight = self.font_weight.clamp(100, 900);
        out.background_radius_px = non_negative(self.background_radius_px);
        out.stroke_width_px = non_negative(self.stroke_width_px);
        out.letter_spacing_px = if self.letter_spacing_px.is_finite() {
            self.letter_spacing_px
        } else {
            0.0
        };
        out.shadow.blur_px = non_negative(self.shadow.blur_px);
        out.shadow.offset_x_px = finite_or_zero(self.shadow.offset_x_px);
        out.shadow.offset_y_px = finite_or_zero(self.shadow.offset_y_px);
        out.opacity = self.opacity.min(100);
        out.rotation_deg = finite_or_zero(self.rotation_deg).clamp(-180.0, 180.0);
        out
    }

    /// Reject styles that cannot produce a bitmap.
    pub fn validate(&self) -> StrataResult<()> {
        if self.styled_text().text.trim().is_empty() {
            return Err(StrataError::validation("text content must not be empty"));
        }
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(StrataError::validation(
                "font size must be finite and > 0",
            ));
        }
        Ok(())
    }

    /// Deterministic fingerprint of everything that affects the rendered pixels.
    pub fn fingerprint(&self) -> u64 {
        let s = self.normalized();
        let mut h = Fnv1a64::new_default();
        h.write_str(&s.content);
        match &s.markup {
            Some(m) => {
                h.write_u8(1);
                h.write_str(m);
            }
            None => h.write_u8(0),
        }
        h.write_str(&s.font_family);
        h.write_u32(u32::from(s.font_weight));
        h.write_f32(s.font_size_px);
        for c in [
            s.color,
            s.background_color,
            s.stroke_color,
            s.shadow.color,
        ] {
            h.write_bytes(&[c.r, c.g, c.b, c.a]);
        }
        for v in [
            s.background_radius_px,
            s.stroke_width_px,
            s.letter_spacing_px,
            s.shadow.blur_px,
            s.shadow.offset_x_px,
            s.shadow.offset_y_px,
            s.rotation_deg,
        ] {
            h.write_f32(v);
        }
        h.write_u8(s.font_style as u8);
        h.write_u8(s.decoration as u8);
        h.write_u8(s.align as u8);
        h.write_u8(s.opacity);
        h.finish()
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
#[path = "../../tests/unit/text/style.rs"]
mod tests;
