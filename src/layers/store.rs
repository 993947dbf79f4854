//! The layer stack and its mutations.
//!
//! Every mutation keeps three invariants: `z_index` equals array position, every image of a layer
//! carries the layer's transform, and a non-empty layer has exactly one active image.

use std::collections::BTreeSet;

use crate::foundation::core::{DraftId, IdGen, ImageId, LayerId, LocalRef, RemoteRef, Size};
use crate::foundation::error::{StrataError, StrataResult};
use crate::geometry::fit::{PercentRect, clamp_percent};
use crate::layers::model::{Background, CapturedSize, Layer, LayerImage, NewImage, SourceKind};
use crate::layers::naming::unique_name;
use crate::text::style::TextStyle;
use crate::upload::coordinator::{BatchOutcome, Resolution, UploadScope};

/// A layer about to be committed.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLayer {
    /// Requested name; made unique on insert.
    pub name: String,
    /// Free text.
    pub description: String,
    /// Initial placement (clamped on insert).
    pub transform: PercentRect,
    /// Image variants; at least one.
    pub images: Vec<NewImage>,
}

/// An image still waiting for its durable reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedImage {
    /// Owning layer.
    pub layer: LayerId,
    /// The image.
    pub image: ImageId,
    /// Its placeholder.
    pub local: LocalRef,
}

/// Background plus ordered layers. Serializes as the draft snapshot.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerStore {
    ids: IdGen,
    background: Option<Background>,
    layers: Vec<Layer>,
}

fn unknown_layer(id: LayerId) -> StrataError {
    StrataError::validation(format!("unknown layer {}", id.0))
}

fn unknown_image(layer: LayerId, image: ImageId) -> StrataError {
    StrataError::validation(format!("layer {} has no image {}", layer.0, image.0))
}

fn resolve_once(slot: &mut Option<RemoteRef>, remote: &RemoteRef) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(remote.clone());
    true
}

impl LayerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for a creation draft.
    pub fn next_draft_id(&mut self) -> DraftId {
        self.ids.draft()
    }

    /// The background, if set.
    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    /// Replace the background wholesale; returns the previous one.
    pub fn set_background(&mut self, background: Option<Background>) -> Option<Background> {
        std::mem::replace(&mut self.background, background)
    }

    /// Record the decoded intrinsic size of the current background.
    pub fn set_background_size(&mut self, size: Size) -> bool {
        match &mut self.background {
            Some(bg) => {
                bg.intrinsic_size = Some(size);
                true
            }
            None => false,
        }
    }

    /// Layers in z-order, bottom first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Visible layers in z-order.
    pub fn visible_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.visible)
    }

    /// Look up a layer.
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    fn index_of(&self, id: LayerId) -> StrataResult<usize> {
        self.layers
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| unknown_layer(id))
    }

    fn layer_mut(&mut self, id: LayerId) -> StrataResult<&mut Layer> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| unknown_layer(id))
    }

    fn renumber(&mut self) {
        for (i, l) in self.layers.iter_mut().enumerate() {
            l.z_index = i as u32;
        }
    }

    fn build_image(&mut self, new: NewImage, geometry: PercentRect) -> LayerImage {
        LayerImage {
            id: self.ids.image(),
            name: new.name,
            source_kind: new.source_kind,
            local_preview: new.local_preview,
            remote: new.remote,
            geometry,
            captured_size: new.captured_size,
            style: new.style,
        }
    }

    /// Append a layer on top of the stack.
    pub fn add_layer(&mut self, new: NewLayer) -> StrataResult<LayerId> {
        if new.name.trim().is_empty() {
            return Err(StrataError::validation("layer name must not be empty"));
        }
        if new.images.is_empty() {
            return Err(StrataError::validation("a layer needs at least one image"));
        }
        let name = unique_name(&new.name, self.layers.iter().map(|l| l.name.as_str()));
        let transform = clamp_percent(new.transform);
        let images: Vec<LayerImage> = new
            .images
            .into_iter()
            .map(|img| self.build_image(img, transform))
            .collect();
        let id = self.ids.layer();
        tracing::debug!(layer = id.0, %name, images = images.len(), "layer added");
        self.layers.push(Layer {
            id,
            name,
            description: new.description,
            z_index: self.layers.len() as u32,
            visible: true,
            active_image: images.first().map(|i| i.id),
            images,
            transform,
        });
        Ok(id)
    }

    /// Remove a layer and close the gap in z-order.
    pub fn remove_layer(&mut self, id: LayerId) -> StrataResult<Layer> {
        let idx = self.index_of(id)?;
        let removed = self.layers.remove(idx);
        self.renumber();
        Ok(removed)
    }

    /// Move a layer to position `to` (clamped to the stack).
    pub fn move_layer(&mut self, id: LayerId, to: usize) -> StrataResult<()> {
        let from = self.index_of(id)?;
        let layer = self.layers.remove(from);
        let to = to.min(self.layers.len());
        self.layers.insert(to, layer);
        self.renumber();
        Ok(())
    }

    /// Rename a layer; returns the name actually stored.
    pub fn rename_layer(&mut self, id: LayerId, name: &str) -> StrataResult<String> {
        if name.trim().is_empty() {
            return Err(StrataError::validation("layer name must not be empty"));
        }
        let unique = unique_name(
            name,
            self.layers
                .iter()
                .filter(|l| l.id != id)
                .map(|l| l.name.as_str()),
        );
        self.layer_mut(id)?.name = unique.clone();
        Ok(unique)
    }

    /// Replace a layer's description.
    pub fn set_description(
        &mut self,
        id: LayerId,
        description: impl Into<String>,
    ) -> StrataResult<()> {
        self.layer_mut(id)?.description = description.into();
        Ok(())
    }

    /// Show or hide a layer.
    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> StrataResult<()> {
        self.layer_mut(id)?.visible = visible;
        Ok(())
    }

    /// Flip visibility; returns the new state.
    pub fn toggle_visibility(&mut self, id: LayerId) -> StrataResult<bool> {
        let layer = self.layer_mut(id)?;
        layer.visible = !layer.visible;
        Ok(layer.visible)
    }

    /// Append image variants to a layer. They take the layer's transform.
    pub fn add_images(&mut self, id: LayerId, images: Vec<NewImage>) -> StrataResult<Vec<ImageId>> {
        let transform = self.layer(id).ok_or_else(|| unknown_layer(id))?.transform;
        let built: Vec<LayerImage> = images
            .into_iter()
            .map(|img| self.build_image(img, transform))
            .collect();
        let ids = built.iter().map(|i| i.id).collect();
        let layer = self.layer_mut(id)?;
        if layer.active_image.is_none() {
            layer.active_image = built.first().map(|i| i.id);
        }
        layer.images.extend(built);
        Ok(ids)
    }

    /// Remove one image variant. Removing the active image promotes the first remaining one.
    pub fn remove_image(&mut self, layer: LayerId, image: ImageId) -> StrataResult<LayerImage> {
        let l = self.layer_mut(layer)?;
        let idx = l
            .images
            .iter()
            .position(|i| i.id == image)
            .ok_or_else(|| unknown_image(layer, image))?;
        let removed = l.images.remove(idx);
        if l.active_image == Some(image) {
            l.active_image = l.images.first().map(|i| i.id);
        }
        Ok(removed)
    }

    /// Select the image shown on the canvas.
    pub fn set_active_image(&mut self, layer: LayerId, image: ImageId) -> StrataResult<()> {
        let l = self.layer_mut(layer)?;
        if l.image(image).is_none() {
            return Err(unknown_image(layer, image));
        }
        l.active_image = Some(image);
        Ok(())
    }

    /// Clamp `rect` and apply it to the layer and every one of its images.
    pub fn set_transform(
        &mut self,
        layer: LayerId,
        rect: PercentRect,
    ) -> StrataResult<PercentRect> {
        let clamped = clamp_percent(rect);
        let l = self.layer_mut(layer)?;
        l.transform = clamped;
        for img in &mut l.images {
            img.geometry = clamped;
        }
        Ok(clamped)
    }

    /// Swap a text image's capture after its style was edited. The new capture is unresolved.
    pub fn replace_text_image(
        &mut self,
        layer: LayerId,
        image: ImageId,
        local: LocalRef,
        style: TextStyle,
        captured: CapturedSize,
    ) -> StrataResult<()> {
        let l = self.layer_mut(layer)?;
        let img = l
            .images
            .iter_mut()
            .find(|i| i.id == image)
            .ok_or_else(|| unknown_image(layer, image))?;
        if img.source_kind != SourceKind::Text {
            return Err(StrataError::validation("only text images can be restyled"));
        }
        img.local_preview = local;
        img.remote = None;
        img.style = Some(style);
        img.captured_size = Some(captured);
        Ok(())
    }

    /// Merge one upload result. Returns `true` when a placeholder was resolved by this call.
    ///
    /// Placeholders resolve at most once; a result for a scope that no longer exists, or for a
    /// placeholder that is already resolved or gone, is ignored.
    pub fn apply_resolution(&mut self, scope: UploadScope, r: &Resolution) -> bool {
        match scope {
            UploadScope::Background => match &mut self.background {
                Some(bg) if bg.local_preview == r.local => resolve_once(&mut bg.remote, &r.remote),
                _ => false,
            },
            UploadScope::Layer(id) => self
                .layers
                .iter_mut()
                .find(|l| l.id == id)
                .and_then(|l| l.images.iter_mut().find(|i| i.local_preview == r.local))
                .is_some_and(|img| resolve_once(&mut img.remote, &r.remote)),
            // Drafts commit into layers, so a late draft batch resolves wherever the
            // placeholder ended up.
            UploadScope::Draft(_) => self
                .layers
                .iter_mut()
                .flat_map(|l| l.images.iter_mut())
                .find(|i| i.local_preview == r.local)
                .is_some_and(|img| resolve_once(&mut img.remote, &r.remote)),
        }
    }

    /// Merge a batch outcome; returns the number of placeholders resolved.
    pub fn apply_outcome(&mut self, outcome: &BatchOutcome) -> usize {
        match outcome {
            BatchOutcome::Resolved { scope, resolutions } => {
                let applied = resolutions
                    .iter()
                    .filter(|r| self.apply_resolution(*scope, r))
                    .count();
                if applied < resolutions.len() {
                    tracing::debug!(
                        ?scope,
                        applied,
                        total = resolutions.len(),
                        "some resolutions had no open placeholder"
                    );
                }
                applied
            }
            BatchOutcome::Failed { .. } => 0,
        }
    }

    /// Images without a durable reference, in z-order. Hidden layers are skipped unless
    /// `include_hidden`.
    pub fn unresolved(&self, include_hidden: bool) -> Vec<UnresolvedImage> {
        self.layers
            .iter()
            .filter(|l| include_hidden || l.visible)
            .flat_map(|l| {
                l.images
                    .iter()
                    .filter(|i| !i.is_resolved())
                    .map(|i| UnresolvedImage {
                        layer: l.id,
                        image: i.id,
                        local: i.local_preview.clone(),
                    })
            })
            .collect()
    }

    /// Every placeholder the store still references.
    pub fn local_refs(&self) -> BTreeSet<LocalRef> {
        self.background
            .iter()
            .map(|b| b.local_preview.clone())
            .chain(
                self.layers
                    .iter()
                    .flat_map(|l| l.images.iter().map(|i| i.local_preview.clone())),
            )
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/store.rs"]
mod tests;
