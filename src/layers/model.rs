use crate::foundation::core::{ImageId, LayerId, LocalRef, RemoteRef, Size};
use crate::geometry::fit::PercentRect;
use crate::text::style::TextStyle;

/// Study background. Replaced wholesale, never edited in place.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Background {
    /// Placeholder of the uploaded file.
    pub local_preview: LocalRef,
    /// Durable reference once uploaded.
    pub remote: Option<RemoteRef>,
    /// File name shown to the designer.
    pub display_name: String,
    /// Intrinsic pixel size, once decoded.
    pub intrinsic_size: Option<Size>,
}

impl Background {
    /// Return `true` once the upload resolved.
    pub fn is_resolved(&self) -> bool {
        self.remote.is_some()
    }
}

/// Derived layer kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Only uploaded images.
    Image,
    /// At least one rasterized text image.
    Text,
}

/// Where an image variant came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A file the designer selected.
    Upload,
    /// A bitmap captured from styled text.
    Text,
}

/// Pixel size of a text capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CapturedSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// One image variant of a layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerImage {
    /// Stable id.
    pub id: ImageId,
    /// Display name.
    pub name: String,
    /// Upload or text capture.
    pub source_kind: SourceKind,
    /// Placeholder of the local bytes.
    pub local_preview: LocalRef,
    /// Durable reference once uploaded.
    pub remote: Option<RemoteRef>,
    /// Placement; identical for every image of a layer.
    pub geometry: PercentRect,
    /// Pixel size of the text capture.
    pub captured_size: Option<CapturedSize>,
    /// Style the text capture was made from.
    pub style: Option<TextStyle>,
}

impl LayerImage {
    /// Return `true` once the upload resolved.
    pub fn is_resolved(&self) -> bool {
        self.remote.is_some()
    }
}

/// An image variant before it joins a layer.
#[derive(Clone, Debug, PartialEq)]
pub struct NewImage {
    /// Display name.
    pub name: String,
    /// Upload or text capture.
    pub source_kind: SourceKind,
    /// Placeholder of the local bytes.
    pub local_preview: LocalRef,
    /// Already known durable reference, if the upload finished before commit.
    pub remote: Option<RemoteRef>,
    /// Pixel size of the text capture.
    pub captured_size: Option<CapturedSize>,
    /// Style the text capture was made from.
    pub style: Option<TextStyle>,
}

impl NewImage {
    /// A designer-selected file.
    pub fn upload(name: impl Into<String>, local: LocalRef) -> Self {
        Self {
            name: name.into(),
            source_kind: SourceKind::Upload,
            local_preview: local,
            remote: None,
            captured_size: None,
            style: None,
        }
    }

    /// A text capture.
    pub fn text(
        name: impl Into<String>,
        local: LocalRef,
        style: TextStyle,
        captured: CapturedSize,
    ) -> Self {
        Self {
            name: name.into(),
            source_kind: SourceKind::Text,
            local_preview: local,
            remote: None,
            captured_size: Some(captured),
            style: Some(style),
        }
    }
}

/// An ordered, toggleable element above the background.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Layer {
    /// Stable id.
    pub id: LayerId,
    /// Unique name within the study.
    pub name: String,
    /// Free text.
    pub description: String,
    /// Position in the stack; equals the array index.
    pub z_index: u32,
    /// Hidden layers stay in the store but are not composed or validated.
    pub visible: bool,
    /// Image variants.
    pub images: Vec<LayerImage>,
    /// Placement shared by every image.
    pub transform: PercentRect,
    /// Image shown on the canvas.
    pub active_image: Option<ImageId>,
}

impl Layer {
    /// Text when any image is a text capture, otherwise Image.
    pub fn kind(&self) -> LayerKind {
        if self
            .images
            .iter()
            .any(|i| i.source_kind == SourceKind::Text)
        {
            LayerKind::Text
        } else {
            LayerKind::Image
        }
    }

    /// The image shown on the canvas.
    pub fn active(&self) -> Option<&LayerImage> {
        let id = self.active_image?;
        self.images.iter().find(|i| i.id == id)
    }

    /// Look up an image by id.
    pub fn image(&self, id: ImageId) -> Option<&LayerImage> {
        self.images.iter().find(|i| i.id == id)
    }

    /// Return `true` when every image has a durable reference.
    pub fn is_resolved(&self) -> bool {
        self.images.iter().all(LayerImage::is_resolved)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/model.rs"]
mod tests;
