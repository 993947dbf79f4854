//! Strata composes layered stimulus images for visual-preference studies.
//!
//! A designer places image and text layers over a background. Placement is stored in percent of
//! the background's fit box, so it survives any container size. Text is rasterized to a bitmap
//! that matches the live preview pixel for pixel. Uploads are batched per layer and resolved from
//! placeholders to durable references before the configuration is saved.
//!
//! The entry point is [`EditorController`]; the pieces it drives are usable on their own:
//!
//! - [`LayerStore`] owns the background and the layer stack
//! - [`UploadCoordinator`] batches uploads and reports [`BatchOutcome`]s
//! - [`TextRasterizer`] measures and captures styled text
//! - [`compose_canvas`] renders the current canvas into a [`FrameRGBA`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Image decoding and local preview bytes.
pub mod assets;
/// Layer editor: creation drafts, gestures, persistence and the controller.
pub mod editor;
/// Ids, colors, errors.
pub mod foundation;
/// Fit box, percent/pixel conversion and container observation.
pub mod geometry;
/// Background and layer model.
pub mod layers;
/// Pixel buffers and canvas composition.
pub mod render;
/// Text styles, markup, fonts and rasterization.
pub mod text;
/// Upload batching, the remote store boundary and reconciliation.
pub mod upload;

pub use crate::editor::config::EditorConfig;
pub use crate::editor::controller::{
    AdvanceOutcome, Collaborators, EditorController, GateBlock, Notice, NoticeKind, SaveOutcome,
};
pub use crate::editor::persistence::{LayerConfiguration, SessionSnapshot};
pub use crate::foundation::core::{
    ColorRgba8, ContainerSize, ImageId, LayerId, LocalRef, Point, RemoteRef, Size,
};
pub use crate::foundation::error::{StrataError, StrataResult};
pub use crate::geometry::fit::{FitBox, PercentRect, PixelRect};
pub use crate::layers::store::LayerStore;
pub use crate::render::canvas::{CanvasOptions, compose_canvas};
pub use crate::render::pixels::FrameRGBA;
pub use crate::text::raster::{TextRasterizer, TextRenderer};
pub use crate::text::style::TextStyle;
pub use crate::upload::coordinator::{BatchOutcome, UploadCoordinator};

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
pub(crate) mod test_support;
