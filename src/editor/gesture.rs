//! Drag and resize gestures.
//!
//! A gesture works in container pixels against the fit box that was current when it began.
//! Pointer moves are coalesced to one update per animation frame; the percent conversion and
//! clamp happen once, on commit.

use crate::foundation::core::{LayerId, Point};
use crate::geometry::fit::{FitBox, PercentRect, PixelRect, percent_to_pixel, pixel_to_percent};
use crate::geometry::observer::FrameThrottle;

/// Smallest edge a resize can shrink a layer to, in pixels.
pub const MIN_GESTURE_SIZE_PX: f64 = 4.0;

/// Edge or corner being dragged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeHandle {
    /// Top-left corner.
    TopLeft,
    /// Top edge.
    Top,
    /// Top-right corner.
    TopRight,
    /// Right edge.
    Right,
    /// Bottom-right corner.
    BottomRight,
    /// Bottom edge.
    Bottom,
    /// Bottom-left corner.
    BottomLeft,
    /// Left edge.
    Left,
}

impl ResizeHandle {
    // (moves left, moves top, moves right, moves bottom)
    fn edges(self) -> (bool, bool, bool, bool) {
        match self {
            Self::TopLeft => (true, true, false, false),
            Self::Top => (false, true, false, false),
            Self::TopRight => (false, true, true, false),
            Self::Right => (false, false, true, false),
            Self::BottomRight => (false, false, true, true),
            Self::Bottom => (false, false, false, true),
            Self::BottomLeft => (true, false, false, true),
            Self::Left => (true, false, false, false),
        }
    }
}

/// Move or resize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureKind {
    /// Translate the whole rect.
    Drag,
    /// Move one edge or corner.
    Resize(ResizeHandle),
}

/// An in-flight transform edit.
#[derive(Clone, Debug)]
pub struct TransformGesture {
    layer: LayerId,
    kind: GestureKind,
    fit: FitBox,
    start_rect: PixelRect,
    start_pointer: Point,
    current: PixelRect,
    moves: FrameThrottle<Point>,
}

impl TransformGesture {
    /// Begin a gesture on `layer`, whose committed placement is `start`.
    pub fn begin(
        layer: LayerId,
        kind: GestureKind,
        fit: FitBox,
        start: PercentRect,
        pointer: Point,
    ) -> Self {
        let start_rect = percent_to_pixel(fit, start);
        Self {
            layer,
            kind,
            fit,
            start_rect,
            start_pointer: pointer,
            current: start_rect,
            moves: FrameThrottle::default(),
        }
    }

    /// Layer being edited.
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Drag or resize.
    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    /// Pixel rect as of the last applied frame.
    pub fn current(&self) -> PixelRect {
        self.current
    }

    /// Record a pointer position; applied on the next frame.
    pub fn pointer_moved(&mut self, pointer: Point) {
        self.moves.push(pointer);
    }

    /// Apply the latest pointer position. Returns the new rect when anything changed.
    pub fn on_animation_frame(&mut self) -> Option<PixelRect> {
        let pointer = self.moves.take()?;
        let next = self.rect_for(pointer);
        if next == self.current {
            return None;
        }
        self.current = next;
        Some(next)
    }

    /// Finish the gesture and return the clamped percent placement.
    pub fn commit(mut self) -> PercentRect {
        self.on_animation_frame();
        pixel_to_percent(self.fit, self.current)
    }

    fn rect_for(&self, pointer: Point) -> PixelRect {
        let dx = pointer.x - self.start_pointer.x;
        let dy = pointer.y - self.start_pointer.y;
        let s = self.start_rect;
        match self.kind {
            GestureKind::Drag => s.translated(dx, dy),
            GestureKind::Resize(handle) => {
                let (l, t, r, b) = handle.edges();
                let mut left = s.x;
                let mut top = s.y;
                let mut right = s.x + s.width;
                let mut bottom = s.y + s.height;
                if l {
                    left = (left + dx).min(right - MIN_GESTURE_SIZE_PX);
                }
                if r {
                    right = (right + dx).max(left + MIN_GESTURE_SIZE_PX);
                }
                if t {
                    top = (top + dy).min(bottom - MIN_GESTURE_SIZE_PX);
                }
                if b {
                    bottom = (bottom + dy).max(top + MIN_GESTURE_SIZE_PX);
                }
                PixelRect::new(left, top, right - left, bottom - top)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/gesture.rs"]
mod tests;
