use crate::foundation::core::{ContainerSize, Size};
use crate::geometry::fit::{FitBox, fit_box_for};

/// Coalesces a stream of values so only the latest one is applied per animation frame.
#[derive(Clone, Debug)]
pub struct FrameThrottle<T> {
    pending: Option<T>,
}

impl<T> Default for FrameThrottle<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> FrameThrottle<T> {
    /// Record a value, replacing whatever arrived earlier in this frame.
    pub fn push(&mut self, value: T) {
        self.pending = Some(value);
    }

    /// Take the latest value at the frame boundary.
    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    /// Return `true` when a value is waiting for the next frame.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Names the container an observer watches (for example the desktop and mobile canvases).
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ContainerId(pub String);

impl ContainerId {
    /// Construct from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Tracks one container's size and the background's intrinsic size, and keeps the derived fit
/// box current.
///
/// Resize observations are throttled to animation frames; intrinsic-size discovery recomputes
/// immediately. While the container is unmeasured the last known fit box is kept and the
/// computation is retried on the next observed size.
#[derive(Clone, Debug)]
pub struct GeometryObserver {
    container: ContainerId,
    size: Option<ContainerSize>,
    background: Option<Size>,
    resize: FrameThrottle<ContainerSize>,
    fit: Option<FitBox>,
    deferred: bool,
}

impl GeometryObserver {
    /// Create an observer for `container` with nothing measured yet.
    pub fn new(container: ContainerId) -> Self {
        Self {
            container,
            size: None,
            background: None,
            resize: FrameThrottle::default(),
            fit: None,
            deferred: true,
        }
    }

    /// Container this observer watches.
    pub fn container(&self) -> &ContainerId {
        &self.container
    }

    /// Last fit box successfully computed.
    pub fn fit_box(&self) -> Option<FitBox> {
        self.fit
    }

    /// Last applied container size.
    pub fn container_size(&self) -> Option<ContainerSize> {
        self.size
    }

    /// Return `true` while the fit box waits for a usable container size.
    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// Queue a resize observation for the next animation frame.
    pub fn observe_resize(&mut self, size: ContainerSize) {
        self.resize.push(size);
    }

    /// Record the background's intrinsic size (or its removal) and recompute.
    pub fn set_background_size(&mut self, size: Option<Size>) -> bool {
        self.background = size;
        self.recompute()
    }

    /// Apply the latest queued resize, if any. Returns `true` when the fit box changed.
    pub fn on_animation_frame(&mut self) -> bool {
        match self.resize.take() {
            Some(size) => {
                self.size = Some(size);
                self.recompute()
            }
            None => false,
        }
    }

    fn recompute(&mut self) -> bool {
        let Some(size) = self.size else {
            self.deferred = true;
            return false;
        };
        match fit_box_for(size, self.background) {
            Some(fit) => {
                self.deferred = false;
                let changed = self.fit != Some(fit);
                self.fit = Some(fit);
                changed
            }
            None => {
                tracing::debug!(
                    container = %self.container.0,
                    width = size.width,
                    height = size.height,
                    "container not measured yet; deferring fit box"
                );
                self.deferred = true;
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/observer.rs"]
mod tests;
