use std::fmt;

use crate::foundation::error::{StrataError, StrataResult};

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Stable identifier of a layer within a study.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct LayerId(pub u64);

/// Stable identifier of an image variant within a layer.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ImageId(pub u64);

/// Identifier of a layer-creation draft.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct DraftId(pub u64);

/// Placeholder reference handed out before an asset is uploaded.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct LocalRef(pub String);

impl LocalRef {
    /// Build the placeholder for sequence number `n`.
    pub fn from_seq(n: u64) -> Self {
        Self(format!("local:{n}"))
    }

    /// Borrow the raw placeholder string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable reference returned by the remote asset store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct RemoteRef(pub String);

impl RemoteRef {
    /// Borrow the raw remote reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonic id source shared by the store and the editor.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    /// Return the next sequence number (starting at 1).
    pub fn next_raw(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    /// Allocate a fresh [`LayerId`].
    pub fn layer(&mut self) -> LayerId {
        LayerId(self.next_raw())
    }

    /// Allocate a fresh [`ImageId`].
    pub fn image(&mut self) -> ImageId {
        ImageId(self.next_raw())
    }

    /// Allocate a fresh [`DraftId`].
    pub fn draft(&mut self) -> DraftId {
        DraftId(self.next_raw())
    }
}

/// Container size in device-independent pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContainerSize {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl ContainerSize {
    /// Construct a size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Return `true` when either side is zero, negative or not finite.
    pub fn is_degenerate(self) -> bool {
        !(self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0)
    }
}

/// Straight-alpha RGBA8 color as written in style records (`#rrggbb`, `#rrggbbaa`, `rgb()`,
/// `rgba()` or `transparent`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColorRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl ColorRgba8 {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// Opaque color from channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Return `true` when the color contributes nothing.
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Return the color with alpha scaled by `opacity` in `[0, 1]`.
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (f32::from(self.a) * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// Parse a CSS color string.
    pub fn parse(s: &str) -> StrataResult<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("transparent") {
            return Ok(Self::TRANSPARENT);
        }
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| invalid_color(s));
        }
        let lower = s.to_ascii_lowercase();
        let inner = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| invalid_color(s))?;
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return Err(invalid_color(s));
        }
        let channel = |p: &str| -> StrataResult<u8> {
            let v: f64 = p.parse().map_err(|_| invalid_color(s))?;
            Ok(v.round().clamp(0.0, 255.0) as u8)
        };
        let a = match parts.get(3) {
            Some(p) => {
                let v: f64 = p.parse().map_err(|_| invalid_color(s))?;
                (v.clamp(0.0, 1.0) * 255.0).round() as u8
            }
            None => 255,
        };
        Ok(Self {
            r: channel(parts[0])?,
            g: channel(parts[1])?,
            b: channel(parts[2])?,
            a,
        })
    }

    /// Format as `#rrggbb` (opaque) or `#rrggbbaa`.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for ColorRgba8 {
    fn default() -> Self {
        Self::BLACK
    }
}

impl TryFrom<String> for ColorRgba8 {
    type Error = StrataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ColorRgba8> for String {
    fn from(c: ColorRgba8) -> Self {
        c.to_hex()
    }
}

fn invalid_color(s: &str) -> StrataError {
    StrataError::validation(format!("invalid color '{s}'"))
}

fn parse_hex(hex: &str) -> Option<ColorRgba8> {
    let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 | 4 => {
            let expand = |v: u8| v * 17;
            Some(ColorRgba8 {
                r: expand(nibble(0)?),
                g: expand(nibble(1)?),
                b: expand(nibble(2)?),
                a: if hex.len() == 4 { expand(nibble(3)?) } else { 255 },
            })
        }
        6 | 8 => Some(ColorRgba8 {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: if hex.len() == 8 { byte(6)? } else { 255 },
        }),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
