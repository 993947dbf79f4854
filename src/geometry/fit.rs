//! Fit-box computation and percent/pixel conversion.
//!
//! Layer placement is stored as percentages of the background's fit box so it survives any
//! container size. Interactive manipulation happens in container pixels; the functions here are
//! the only bridge between the two spaces.

use crate::foundation::core::{ContainerSize, Size};

/// Tolerance used when comparing converted geometry.
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// Largest aspect-preserving rectangle of the background inside its container, in container
/// pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FitBox {
    /// Offset from the container's left edge.
    pub left: f64,
    /// Offset from the container's top edge.
    pub top: f64,
    /// Fit box width.
    pub width: f64,
    /// Fit box height.
    pub height: f64,
}

impl FitBox {
    /// Fit box covering the whole container (used when there is no background).
    pub fn full(container: ContainerSize) -> Option<Self> {
        if container.is_degenerate() {
            return None;
        }
        Some(Self {
            left: 0.0,
            top: 0.0,
            width: container.width,
            height: container.height,
        })
    }

    /// Return `true` when both sides are positive and finite.
    pub fn is_positive(self) -> bool {
        !ContainerSize::new(self.width, self.height).is_degenerate()
    }
}

/// Placement in percent of the fit box.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PercentRect {
    /// Left edge, percent of fit box width.
    pub x: f64,
    /// Top edge, percent of fit box height.
    pub y: f64,
    /// Width, percent of fit box width.
    pub width: f64,
    /// Height, percent of fit box height.
    pub height: f64,
}

impl PercentRect {
    /// Construct a rect without clamping.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Return `true` when every component is within `eps` of `other`.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps
            && (self.y - other.y).abs() <= eps
            && (self.width - other.width).abs() <= eps
            && (self.height - other.height).abs() <= eps
    }
}

impl Default for PercentRect {
    fn default() -> Self {
        Self::new(0.0, 0.0, 100.0, 100.0)
    }
}

/// Placement in container pixels (fit-box offsets included).
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PixelRect {
    /// Left edge in container pixels.
    pub x: f64,
    /// Top edge in container pixels.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl PixelRect {
    /// Construct a pixel rect.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Return the rect moved by `(dx, dy)`.
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Convert into a `kurbo` rect.
    pub fn to_kurbo(self) -> kurbo::Rect {
        kurbo::Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// Compute the centered object-contain box for an image of `img_w x img_h` inside a container
/// of `container_w x container_h`.
///
/// Returns `None` while the container is unmeasured. A degenerate image size falls back to the
/// full container.
pub fn compute_fit_box(
    container_w: f64,
    container_h: f64,
    img_w: f64,
    img_h: f64,
) -> Option<FitBox> {
    fit_box_for(
        ContainerSize::new(container_w, container_h),
        Some(Size::new(img_w, img_h)),
    )
}

/// Like [`compute_fit_box`], with an optional background size.
pub fn fit_box_for(container: ContainerSize, background: Option<Size>) -> Option<FitBox> {
    if container.is_degenerate() {
        return None;
    }
    let Some(img) = background.filter(|s| !ContainerSize::new(s.width, s.height).is_degenerate())
    else {
        return FitBox::full(container);
    };

    let scale = (container.width / img.width).min(container.height / img.height);
    let width = img.width * scale;
    let height = img.height * scale;
    Some(FitBox {
        left: (container.width - width) / 2.0,
        top: (container.height - height) / 2.0,
        width,
        height,
    })
}

/// Map a percent placement onto container pixels.
pub fn percent_to_pixel(fit: FitBox, r: PercentRect) -> PixelRect {
    PixelRect {
        x: fit.left + r.x / 100.0 * fit.width,
        y: fit.top + r.y / 100.0 * fit.height,
        width: r.width / 100.0 * fit.width,
        height: r.height / 100.0 * fit.height,
    }
}

/// Map container pixels back onto a clamped percent placement.
///
/// A fit box without positive area maps everything to the clamped origin.
pub fn pixel_to_percent(fit: FitBox, r: PixelRect) -> PercentRect {
    if !fit.is_positive() {
        return clamp_percent(PercentRect::new(0.0, 0.0, 0.0, 0.0));
    }
    clamp_percent(PercentRect {
        x: (r.x - fit.left) / fit.width * 100.0,
        y: (r.y - fit.top) / fit.height * 100.0,
        width: r.width / fit.width * 100.0,
        height: r.height / fit.height * 100.0,
    })
}

/// Enforce `0 <= x,y`, `x + width <= 100` and `y + height <= 100`.
///
/// Sizes are clamped into `[0, 100]` first, then positions are pulled inside the remaining span,
/// so an oversized drag keeps its size and stops at the edge.
pub fn clamp_percent(r: PercentRect) -> PercentRect {
    fn finite_or_zero(v: f64) -> f64 {
        if v.is_finite() { v } else { 0.0 }
    }

    let width = finite_or_zero(r.width).clamp(0.0, 100.0);
    let height = finite_or_zero(r.height).clamp(0.0, 100.0);
    PercentRect {
        x: finite_or_zero(r.x).clamp(0.0, 100.0 - width),
        y: finite_or_zero(r.y).clamp(0.0, 100.0 - height),
        width,
        height,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/fit.rs"]
mod tests;
