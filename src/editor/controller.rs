//! The layer editor controller.
//!
//! Gestures never return errors: every failure becomes draft state, a [`Notice`] or a
//! [`GateBlock`]. Time is passed in explicitly; [`EditorController::tick`] drives the upload
//! debounce and merges finished batches into the store.

use std::fmt;
use std::time::Instant;

use crate::assets::decode::intrinsic_size;
use crate::assets::preview::LocalPreviewCache;
use crate::editor::config::EditorConfig;
use crate::editor::draft::{DraftKind, DraftMachine, DraftPhase, LayerDraft};
use crate::editor::gesture::{GestureKind, TransformGesture};
use crate::editor::persistence::{
    DraftPersistence, LayerConfiguration, PersistenceBridge, SessionSnapshot,
};
use crate::foundation::core::{ContainerSize, ImageId, LayerId, LocalRef, Point};
use crate::foundation::error::{StrataError, StrataResult};
use crate::geometry::fit::{FitBox, PercentRect, PixelRect, clamp_percent};
use crate::geometry::observer::{ContainerId, GeometryObserver};
use crate::layers::model::{Background, CapturedSize, NewImage};
use crate::layers::store::{LayerStore, NewLayer};
use crate::render::canvas::{CanvasOptions, PreviewAssets, compose_canvas};
use crate::render::pixels::FrameRGBA;
use crate::text::raster::TextRenderer;
use crate::text::style::TextStyle;
use crate::upload::coordinator::{BatchOutcome, UploadCoordinator, UploadScope};
use crate::upload::reconcile::reconcile;
use crate::upload::remote::{RemoteAssetStore, UploadPayload};

/// Placement of a new image layer when nothing better is known.
const DEFAULT_PLACEMENT: PercentRect = PercentRect::new(25.0, 25.0, 50.0, 50.0);

/// External collaborators of the controller.
pub struct Collaborators {
    /// Remote asset store.
    pub remote: Box<dyn RemoteAssetStore>,
    /// Study backend.
    pub bridge: Box<dyn PersistenceBridge>,
    /// Interim draft storage.
    pub drafts: Box<dyn DraftPersistence>,
    /// Text rasterizer.
    pub text: Box<dyn TextRenderer>,
}

/// Category of a [`Notice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    /// Input the editor cannot accept.
    Validation,
    /// A batch upload was rejected.
    Upload,
    /// Text capture failed.
    Rasterization,
    /// A save failed.
    Persistence,
    /// Anything else.
    Other,
}

/// A failure surfaced inline to the designer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Category.
    pub kind: NoticeKind,
    /// Human-readable message.
    pub message: String,
}

impl From<&StrataError> for Notice {
    fn from(e: &StrataError) -> Self {
        let kind = match e {
            StrataError::Validation(_) | StrataError::GeometryDegenerate(_) => {
                NoticeKind::Validation
            }
            StrataError::Upload(_) => NoticeKind::Upload,
            StrataError::Rasterization(_) => NoticeKind::Rasterization,
            StrataError::Persistence(_) | StrataError::Serde(_) => NoticeKind::Persistence,
            StrataError::Other(_) => NoticeKind::Other,
        };
        Self {
            kind,
            message: e.to_string(),
        }
    }
}

/// Why "Save & Next" is disabled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateBlock {
    /// A layer is still being created.
    DraftOpen,
    /// The background has no durable reference yet.
    BackgroundUnresolved,
    /// A visible layer has no images.
    EmptyLayer {
        /// The layer.
        layer: LayerId,
        /// Its name.
        name: String,
    },
    /// A visible layer has images without durable references.
    UnresolvedImages {
        /// The layer.
        layer: LayerId,
        /// Its name.
        name: String,
        /// How many images are unresolved.
        count: usize,
    },
    /// A visible layer's local bytes are gone, so it can never resolve.
    MissingLocalBytes {
        /// The layer.
        layer: LayerId,
        /// Its name.
        name: String,
    },
    /// The study backend rejected the configuration.
    SaveFailed(String),
}

impl fmt::Display for GateBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DraftOpen => f.write_str("finish or cancel the layer being created"),
            Self::BackgroundUnresolved => f.write_str("the background is still uploading"),
            Self::EmptyLayer { name, .. } => write!(f, "layer \"{name}\" has no images"),
            Self::UnresolvedImages { name, count, .. } => {
                write!(f, "layer \"{name}\" has {count} image(s) still uploading")
            }
            Self::MissingLocalBytes { name, .. } => write!(
                f,
                "layer \"{name}\" has images that never uploaded; add them again"
            ),
            Self::SaveFailed(reason) => write!(f, "saving the layers failed: {reason}"),
        }
    }
}

/// Result of a layer action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The store changed.
    Applied,
    /// Nothing changed; the reason was also pushed as a notice.
    Rejected(String),
}

impl ActionOutcome {
    /// Return `true` for [`ActionOutcome::Applied`].
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Result of saving the creation draft.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The draft became this layer.
    Committed(LayerId),
    /// The draft failed validation and stays open.
    Invalid(String),
    /// Text capture failed; the draft stays open for a retry.
    RasterFailed(String),
    /// No draft was open.
    NotDrafting,
}

/// Result of a gesture call.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureOutcome {
    /// Gesture started.
    Started,
    /// Another gesture is in flight.
    Busy,
    /// The container has not been measured yet.
    NoFitBox,
    /// The layer does not exist (any more).
    UnknownLayer,
    /// Committed placement, applied to every image of the layer.
    Committed(PercentRect),
    /// No gesture was in flight.
    NoGesture,
}

/// Result of [`EditorController::advance`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Everything is resolved and saved.
    Proceed,
    /// Navigation stays blocked.
    Blocked(Vec<GateBlock>),
}

/// What changed on an animation frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameUpdate {
    /// The fit box was recomputed.
    pub fit_changed: bool,
    /// The in-flight gesture moved to this rect.
    pub gesture_rect: Option<PixelRect>,
}

/// Turns designer gestures into layer-store mutations and keeps uploads and persistence in step.
pub struct EditorController {
    config: EditorConfig,
    store: LayerStore,
    uploads: UploadCoordinator,
    previews: LocalPreviewCache,
    observer: GeometryObserver,
    creation: DraftMachine,
    gesture: Option<TransformGesture>,
    notices: Vec<Notice>,
    remote: Box<dyn RemoteAssetStore>,
    bridge: Box<dyn PersistenceBridge>,
    drafts: Box<dyn DraftPersistence>,
    text: Box<dyn TextRenderer>,
}

impl fmt::Debug for EditorController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorController")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("creation", &self.creation.phase())
            .finish_non_exhaustive()
    }
}

impl EditorController {
    /// Start an empty session.
    pub fn new(config: EditorConfig, collaborators: Collaborators) -> Self {
        Self {
            uploads: UploadCoordinator::new(config.debounce()),
            observer: GeometryObserver::new(ContainerId::new("canvas")),
            config,
            store: LayerStore::new(),
            previews: LocalPreviewCache::new(),
            creation: DraftMachine::new(),
            gesture: None,
            notices: Vec::new(),
            remote: collaborators.remote,
            bridge: collaborators.bridge,
            drafts: collaborators.drafts,
            text: collaborators.text,
        }
    }

    /// Start a session from the saved draft snapshot, if one exists for this study.
    ///
    /// Local bytes do not survive a reload, so images that were unresolved when the snapshot was
    /// taken show up as [`GateBlock::MissingLocalBytes`] until they are added again.
    pub fn resume(config: EditorConfig, collaborators: Collaborators) -> StrataResult<Self> {
        let mut this = Self::new(config, collaborators);
        let Some(snap) = this.drafts.load_draft(&this.config.draft_key)? else {
            return Ok(this);
        };
        if snap.study_id != this.config.study_id {
            tracing::debug!(saved = %snap.study_id, "draft snapshot belongs to another study");
            return Ok(this);
        }
        this.store = snap.store;
        this.uploads.reserve_local_refs(&this.store.local_refs());
        let bg_size = this.store.background().and_then(|b| b.intrinsic_size);
        this.observer.set_background_size(bg_size);
        Ok(this)
    }

    /// Active configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The layer store.
    pub fn store(&self) -> &LayerStore {
        &self.store
    }

    /// Local preview bytes.
    pub fn previews(&self) -> &LocalPreviewCache {
        &self.previews
    }

    /// The upload coordinator.
    pub fn uploads(&self) -> &UploadCoordinator {
        &self.uploads
    }

    /// Last computed fit box.
    pub fn fit_box(&self) -> Option<FitBox> {
        self.observer.fit_box()
    }

    /// Creation phase.
    pub fn creation_phase(&self) -> DraftPhase {
        self.creation.phase()
    }

    /// The open creation draft.
    pub fn creation_draft(&self) -> Option<&LayerDraft> {
        self.creation.draft()
    }

    /// Notices raised since the last [`Self::take_notices`].
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain the notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn note(&mut self, e: &StrataError) {
        tracing::warn!(error = %e, "editor notice");
        self.notices.push(Notice::from(e));
    }

    fn persist_draft(&mut self) {
        let snap = SessionSnapshot::new(self.config.study_id.clone(), self.store.clone());
        if let Err(e) = self.drafts.save_draft(&self.config.draft_key, &snap) {
            self.note(&e);
        }
    }

    fn save_configuration(&mut self) -> StrataResult<()> {
        let config = LayerConfiguration::from_store(&self.store);
        self.bridge
            .save_layer_configuration(&self.config.study_id, &config)
    }

    fn finish_action(&mut self, r: StrataResult<()>) -> ActionOutcome {
        match r {
            Ok(()) => {
                self.persist_draft();
                ActionOutcome::Applied
            }
            Err(e) => {
                self.note(&e);
                ActionOutcome::Rejected(e.to_string())
            }
        }
    }

    fn submit_files(
        &mut self,
        scope: UploadScope,
        files: Vec<UploadPayload>,
        now: Instant,
    ) -> Vec<(LocalRef, String)> {
        let names: Vec<String> = files.iter().map(|f| f.file_name.clone()).collect();
        let locals = self.uploads.submit(scope, files.clone(), now);
        for (local, file) in locals.iter().zip(files) {
            self.previews.insert(local.clone(), file);
        }
        locals.into_iter().zip(names).collect()
    }

    // Geometry ------------------------------------------------------------------------------

    /// Record a container resize; applied on the next animation frame.
    pub fn observe_container(&mut self, size: ContainerSize) {
        self.observer.observe_resize(size);
    }

    /// Apply coalesced resize and pointer updates.
    pub fn on_animation_frame(&mut self) -> FrameUpdate {
        FrameUpdate {
            fit_changed: self.observer.on_animation_frame(),
            gesture_rect: self
                .gesture
                .as_mut()
                .and_then(TransformGesture::on_animation_frame),
        }
    }

    // Background ----------------------------------------------------------------------------

    /// Replace the background with an uploaded file.
    pub fn set_background(&mut self, file: UploadPayload, now: Instant) -> ActionOutcome {
        let size = match intrinsic_size(&file.bytes) {
            Ok(size) => size,
            Err(e) => return self.finish_action(Err(e)),
        };
        self.uploads.abandon_scope(UploadScope::Background);
        let display_name = file.file_name.clone();
        let Some((local, _)) = self
            .submit_files(UploadScope::Background, vec![file], now)
            .into_iter()
            .next()
        else {
            return self.finish_action(Err(StrataError::upload("background was not queued")));
        };
        let old = self.store.set_background(Some(Background {
            local_preview: local,
            remote: None,
            display_name,
            intrinsic_size: Some(size),
        }));
        if let Some(old) = old {
            self.previews.remove(&old.local_preview);
        }
        self.observer.set_background_size(Some(size));
        if let Err(e) = self.save_configuration() {
            self.note(&e);
        }
        self.finish_action(Ok(()))
    }

    /// Remove the background; the fit box becomes the whole container.
    pub fn clear_background(&mut self) -> ActionOutcome {
        self.uploads.abandon_scope(UploadScope::Background);
        if let Some(old) = self.store.set_background(None) {
            self.previews.remove(&old.local_preview);
        }
        self.observer.set_background_size(None);
        if let Err(e) = self.save_configuration() {
            self.note(&e);
        }
        self.finish_action(Ok(()))
    }

    // Creation drafts -----------------------------------------------------------------------

    /// Open an image-layer draft. Returns `false` when a draft is already open.
    pub fn begin_image_layer(&mut self) -> bool {
        let id = self.store.next_draft_id();
        self.creation.begin(id, DraftKind::Image)
    }

    /// Open a text-layer draft and mount its live preview.
    pub fn begin_text_layer(&mut self, style: TextStyle) -> bool {
        let id = self.store.next_draft_id();
        if !self.creation.begin(id, DraftKind::Text) {
            return false;
        }
        self.update_draft_text(style);
        true
    }

    /// Name the draft.
    pub fn set_draft_name(&mut self, name: impl Into<String>) {
        if let Some(d) = self.creation.draft_mut() {
            d.name = name.into();
        }
    }

    /// Describe the draft.
    pub fn set_draft_description(&mut self, description: impl Into<String>) {
        if let Some(d) = self.creation.draft_mut() {
            d.description = description.into();
        }
    }

    /// Add chosen files to an image draft. Uploads start right away under the draft's scope.
    pub fn add_draft_files(&mut self, files: Vec<UploadPayload>, now: Instant) -> Vec<LocalRef> {
        let Some(scope) = self
            .creation
            .draft()
            .filter(|d| d.kind == DraftKind::Image && self.creation.phase() == DraftPhase::Drafting)
            .map(|d| UploadScope::Draft(d.id))
        else {
            return Vec::new();
        };
        let submitted = self.submit_files(scope, files, now);
        let mut locals = Vec::with_capacity(submitted.len());
        if let Some(d) = self.creation.draft_mut() {
            for (local, name) in submitted {
                d.images.push(NewImage::upload(name, local.clone()));
                locals.push(local);
            }
        }
        locals
    }

    /// Drop a chosen file from the image draft.
    pub fn remove_draft_file(&mut self, local: &LocalRef) -> bool {
        let Some(d) = self.creation.draft_mut() else {
            return false;
        };
        let before = d.images.len();
        d.images.retain(|i| &i.local_preview != local);
        let removed = d.images.len() != before;
        if removed {
            self.uploads.cancel(local);
            self.previews.remove(local);
        }
        removed
    }

    /// Restyle the text draft; returns the live preview's pixel size.
    pub fn update_draft_text(&mut self, style: TextStyle) -> Option<(u32, u32)> {
        let d = self.creation.draft_mut()?;
        d.text = Some(style.clone());
        match self.text.preview(&style) {
            Ok(size) => {
                if let Some(d) = self.creation.draft_mut() {
                    d.error = None;
                }
                Some(size)
            }
            Err(e) => {
                if let Some(d) = self.creation.draft_mut() {
                    d.error = Some(e.to_string());
                }
                self.note(&e);
                None
            }
        }
    }

    fn initial_placement(&self, captured: Option<CapturedSize>) -> PercentRect {
        match (captured, self.observer.fit_box()) {
            (Some(c), Some(fit)) if fit.is_positive() => {
                let w = f64::from(c.width) / fit.width * 100.0;
                let h = f64::from(c.height) / fit.height * 100.0;
                clamp_percent(PercentRect::new((100.0 - w) / 2.0, (100.0 - h) / 2.0, w, h))
            }
            _ => DEFAULT_PLACEMENT,
        }
    }

    /// Commit the open draft as a new layer.
    #[tracing::instrument(skip(self, now))]
    pub fn save_draft(&mut self, now: Instant) -> SaveOutcome {
        if self.creation.phase() != DraftPhase::Drafting {
            return SaveOutcome::NotDrafting;
        }
        let draft = match self.creation.start_saving() {
            Ok(d) => d,
            Err(e) => {
                self.note(&e);
                return SaveOutcome::Invalid(e.to_string());
            }
        };

        let (images, captured) = match draft.kind {
            DraftKind::Image => (draft.images.clone(), None),
            DraftKind::Text => match self.capture_text(&draft, now) {
                Ok((image, captured)) => (vec![image], Some(captured)),
                Err(e) => {
                    self.creation.fail_saving(e.to_string());
                    self.note(&e);
                    return SaveOutcome::RasterFailed(e.to_string());
                }
            },
        };

        let name = if draft.name.trim().is_empty() {
            default_layer_name(&draft)
        } else {
            draft.name.clone()
        };
        let added = self.store.add_layer(NewLayer {
            name,
            description: draft.description.clone(),
            transform: self.initial_placement(captured),
            images,
        });
        match added {
            Ok(layer) => {
                self.creation.commit(layer);
                self.text.unmount_preview();
                self.persist_draft();
                SaveOutcome::Committed(layer)
            }
            Err(e) => {
                self.creation.fail_saving(e.to_string());
                self.note(&e);
                SaveOutcome::Invalid(e.to_string())
            }
        }
    }

    fn capture_text(
        &mut self,
        draft: &LayerDraft,
        now: Instant,
    ) -> StrataResult<(NewImage, CapturedSize)> {
        let style = draft
            .text
            .clone()
            .ok_or_else(|| StrataError::validation("text content must not be empty"))?;
        let rendered = self.text.render(&style)?;
        let payload = rendered.to_upload(&format!("text-{}", draft.id.0))?;
        let (local, _) = self
            .submit_files(UploadScope::Draft(draft.id), vec![payload], now)
            .into_iter()
            .next()
            .ok_or_else(|| StrataError::upload("text capture was not queued"))?;
        let captured = CapturedSize {
            width: rendered.width,
            height: rendered.height,
        };
        let name = text_label(&style);
        Ok((NewImage::text(name, local, style, captured), captured))
    }

    /// Discard the open draft and its queued uploads.
    pub fn cancel_draft(&mut self) -> bool {
        let Some(draft) = self.creation.cancel() else {
            return false;
        };
        self.uploads.abandon_scope(UploadScope::Draft(draft.id));
        for local in draft.locals() {
            self.previews.remove(local);
        }
        self.text.unmount_preview();
        true
    }

    // Layer actions -------------------------------------------------------------------------

    /// Rename a layer (unique-name policy applies).
    pub fn rename_layer(&mut self, layer: LayerId, name: &str) -> ActionOutcome {
        let r = self.store.rename_layer(layer, name).map(|_| ());
        self.finish_action(r)
    }

    /// Replace a layer's description.
    pub fn set_layer_description(&mut self, layer: LayerId, description: &str) -> ActionOutcome {
        let r = self.store.set_description(layer, description);
        self.finish_action(r)
    }

    /// Show or hide a layer.
    pub fn toggle_visibility(&mut self, layer: LayerId) -> ActionOutcome {
        let r = self.store.toggle_visibility(layer).map(|_| ());
        self.finish_action(r)
    }

    /// Move a layer to stack position `to`.
    pub fn move_layer(&mut self, layer: LayerId, to: usize) -> ActionOutcome {
        let r = self.store.move_layer(layer, to);
        self.finish_action(r)
    }

    /// Delete a layer. Its queued uploads are dropped; late results are ignored.
    pub fn remove_layer(&mut self, layer: LayerId) -> ActionOutcome {
        match self.store.remove_layer(layer) {
            Ok(removed) => {
                self.uploads.abandon_scope(UploadScope::Layer(layer));
                for img in &removed.images {
                    self.previews.remove(&img.local_preview);
                }
                if self.gesture.as_ref().is_some_and(|g| g.layer() == layer) {
                    self.gesture = None;
                }
                self.finish_action(Ok(()))
            }
            Err(e) => self.finish_action(Err(e)),
        }
    }

    /// Add uploaded image variants to an existing layer.
    pub fn add_layer_images(
        &mut self,
        layer: LayerId,
        files: Vec<UploadPayload>,
        now: Instant,
    ) -> ActionOutcome {
        if self.store.layer(layer).is_none() {
            return self.finish_action(Err(StrataError::validation(format!(
                "unknown layer {}",
                layer.0
            ))));
        }
        let images = self
            .submit_files(UploadScope::Layer(layer), files, now)
            .into_iter()
            .map(|(local, name)| NewImage::upload(name, local))
            .collect();
        let r = self.store.add_images(layer, images).map(|_| ());
        self.finish_action(r)
    }

    /// Remove one image variant.
    pub fn remove_layer_image(&mut self, layer: LayerId, image: ImageId) -> ActionOutcome {
        match self.store.remove_image(layer, image) {
            Ok(removed) => {
                self.uploads.cancel(&removed.local_preview);
                self.previews.remove(&removed.local_preview);
                self.finish_action(Ok(()))
            }
            Err(e) => self.finish_action(Err(e)),
        }
    }

    /// Choose which variant the canvas shows.
    pub fn set_active_image(&mut self, layer: LayerId, image: ImageId) -> ActionOutcome {
        let r = self.store.set_active_image(layer, image);
        self.finish_action(r)
    }

    /// Re-capture a text image with a new style and upload the new bitmap.
    pub fn restyle_text_image(
        &mut self,
        layer: LayerId,
        image: ImageId,
        style: TextStyle,
        now: Instant,
    ) -> ActionOutcome {
        let old_local = match self.store.layer(layer).and_then(|l| l.image(image)) {
            Some(img) => img.local_preview.clone(),
            None => {
                return self.finish_action(Err(StrataError::validation(format!(
                    "layer {} has no image {}",
                    layer.0, image.0
                ))));
            }
        };
        let rendered = match self
            .text
            .render(&style)
            .and_then(|r| r.to_upload(&format!("text-{}", image.0)).map(|p| (r, p)))
        {
            Ok(v) => v,
            Err(e) => return self.finish_action(Err(e)),
        };
        let (raster, payload) = rendered;
        let Some((local, _)) = self
            .submit_files(UploadScope::Layer(layer), vec![payload], now)
            .into_iter()
            .next()
        else {
            return self.finish_action(Err(StrataError::upload("text capture was not queued")));
        };
        let captured = CapturedSize {
            width: raster.width,
            height: raster.height,
        };
        let r = self
            .store
            .replace_text_image(layer, image, local, style, captured);
        if r.is_ok() {
            self.uploads.cancel(&old_local);
            self.previews.remove(&old_local);
        }
        self.finish_action(r)
    }

    // Transform gestures --------------------------------------------------------------------

    /// Start dragging or resizing `layer` at `pointer` (container pixels).
    pub fn begin_gesture(
        &mut self,
        layer: LayerId,
        kind: GestureKind,
        pointer: Point,
    ) -> GestureOutcome {
        if self.gesture.is_some() {
            return GestureOutcome::Busy;
        }
        let Some(fit) = self.observer.fit_box() else {
            return GestureOutcome::NoFitBox;
        };
        let Some(start) = self.store.layer(layer).map(|l| l.transform) else {
            return GestureOutcome::UnknownLayer;
        };
        self.gesture = Some(TransformGesture::begin(layer, kind, fit, start, pointer));
        GestureOutcome::Started
    }

    /// Record a pointer move for the in-flight gesture.
    pub fn pointer_moved(&mut self, pointer: Point) {
        if let Some(g) = &mut self.gesture {
            g.pointer_moved(pointer);
        }
    }

    /// Commit the in-flight gesture to every image of its layer.
    pub fn end_gesture(&mut self) -> GestureOutcome {
        let Some(gesture) = self.gesture.take() else {
            return GestureOutcome::NoGesture;
        };
        let layer = gesture.layer();
        match self.store.set_transform(layer, gesture.commit()) {
            Ok(applied) => {
                self.persist_draft();
                GestureOutcome::Committed(applied)
            }
            Err(_) => GestureOutcome::UnknownLayer,
        }
    }

    /// Abandon the in-flight gesture without changing the store.
    pub fn cancel_gesture(&mut self) -> bool {
        self.gesture.take().is_some()
    }

    // Uploads and navigation ----------------------------------------------------------------

    /// Results for the open draft land on its chosen files, so commit carries them into the layer.
    fn resolve_in_draft(&mut self, outcome: &BatchOutcome) -> usize {
        let BatchOutcome::Resolved {
            scope: UploadScope::Draft(id),
            resolutions,
        } = outcome
        else {
            return 0;
        };
        match self.creation.draft_mut().filter(|d| d.id == *id) {
            Some(d) => resolutions.iter().filter(|r| d.apply_resolution(r)).count(),
            None => 0,
        }
    }

    fn merge_outcomes(&mut self, outcomes: Vec<BatchOutcome>) -> usize {
        let mut resolved = 0;
        let mut background_changed = false;
        for outcome in &outcomes {
            let n = self.resolve_in_draft(outcome) + self.store.apply_outcome(outcome);
            resolved += n;
            background_changed |= n > 0 && outcome.scope() == UploadScope::Background;
        }
        if background_changed && let Err(e) = self.save_configuration() {
            self.note(&e);
        }
        if resolved > 0 {
            self.persist_draft();
        }
        resolved
    }

    /// Dispatch due uploads and merge their results. Returns the number of placeholders resolved.
    pub fn tick(&mut self, now: Instant) -> usize {
        let outcomes = self.uploads.pump(now, self.remote.as_mut());
        self.merge_outcomes(outcomes)
    }

    /// Conditions that currently block forward navigation. Hidden layers are ignored.
    pub fn navigation_gate(&self) -> Vec<GateBlock> {
        let mut blocks = Vec::new();
        if self.creation.phase() != DraftPhase::Idle {
            blocks.push(GateBlock::DraftOpen);
        }
        if self.store.background().is_some_and(|b| !b.is_resolved()) {
            blocks.push(GateBlock::BackgroundUnresolved);
        }
        for layer in self.store.visible_layers() {
            if layer.images.is_empty() {
                blocks.push(GateBlock::EmptyLayer {
                    layer: layer.id,
                    name: layer.name.clone(),
                });
                continue;
            }
            let unresolved: Vec<&LocalRef> = layer
                .images
                .iter()
                .filter(|i| !i.is_resolved())
                .map(|i| &i.local_preview)
                .collect();
            if unresolved.is_empty() {
                continue;
            }
            let lost = unresolved
                .iter()
                .any(|l| self.previews.get(l).is_none() && !self.uploads.is_pending(l));
            if lost {
                blocks.push(GateBlock::MissingLocalBytes {
                    layer: layer.id,
                    name: layer.name.clone(),
                });
            } else {
                blocks.push(GateBlock::UnresolvedImages {
                    layer: layer.id,
                    name: layer.name.clone(),
                    count: unresolved.len(),
                });
            }
        }
        blocks
    }

    /// Return `true` when "Save & Next" is enabled.
    pub fn can_advance(&self) -> bool {
        self.navigation_gate().is_empty()
    }

    /// "Save & Next": reconcile, flush every queue, merge results, then save the configuration
    /// once. Safe to call repeatedly.
    #[tracing::instrument(skip(self, now))]
    pub fn advance(&mut self, now: Instant) -> AdvanceOutcome {
        if self.creation.phase() != DraftPhase::Idle {
            return AdvanceOutcome::Blocked(vec![GateBlock::DraftOpen]);
        }
        reconcile(&self.store, &mut self.uploads, &self.previews, now);
        let outcomes = self.uploads.flush_all(self.remote.as_mut());
        self.merge_outcomes(outcomes);

        let blocks = self.navigation_gate();
        if !blocks.is_empty() {
            return AdvanceOutcome::Blocked(blocks);
        }
        if let Err(e) = self.save_configuration() {
            self.note(&e);
            return AdvanceOutcome::Blocked(vec![GateBlock::SaveFailed(e.to_string())]);
        }
        if let Err(e) = self.drafts.clear_draft(&self.config.draft_key) {
            self.note(&e);
        }
        AdvanceOutcome::Proceed
    }

    /// Message for a leave-page prompt while anything is unsaved or unresolved.
    pub fn leave_page_warning(&self) -> Option<String> {
        let pending = self.uploads.has_pending();
        let failed = self.uploads.failed().len();
        let unresolved = self.store.unresolved(true).len()
            + usize::from(self.store.background().is_some_and(|b| !b.is_resolved()));
        if !pending && failed == 0 && unresolved == 0 {
            return None;
        }
        let mut parts = Vec::new();
        if pending {
            parts.push("uploads are still queued".to_string());
        }
        if failed > 0 {
            parts.push(format!("{failed} upload(s) failed"));
        }
        if unresolved > 0 {
            parts.push(format!("{unresolved} image(s) are not uploaded yet"));
        }
        Some(format!("Leave the page? {}.", parts.join("; ")))
    }

    /// Compose the canvas at the last observed container size from local previews.
    pub fn render_canvas(&self, opts: &CanvasOptions) -> StrataResult<FrameRGBA> {
        let container = self
            .observer
            .container_size()
            .ok_or_else(|| StrataError::geometry("container has not been measured"))?;
        let mut assets = PreviewAssets::new(&self.previews);
        compose_canvas(&self.store, container, &mut assets, opts)
    }
}

fn text_label(style: &TextStyle) -> String {
    let text = style.styled_text().text;
    let first_line = text.lines().next().unwrap_or_default().trim();
    let label: String = first_line.chars().take(24).collect();
    if label.is_empty() {
        "Text".to_string()
    } else {
        label
    }
}

fn default_layer_name(draft: &LayerDraft) -> String {
    match (&draft.kind, &draft.text) {
        (DraftKind::Text, Some(style)) => text_label(style),
        _ => "Layer".to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/controller.rs"]
mod tests;
