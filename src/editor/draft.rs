//! Layer-creation state machine: `Idle -> Drafting -> Saving -> Committed | Cancelled`.
//!
//! Committed and Cancelled are reported through [`DraftMachine::last_end`]; the machine itself
//! returns to idle so the next draft can begin.

use crate::foundation::core::{DraftId, LayerId, LocalRef};
use crate::foundation::error::{StrataError, StrataResult};
use crate::layers::model::NewImage;
use crate::text::style::TextStyle;
use crate::upload::coordinator::Resolution;

/// What the draft will become.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftKind {
    /// A layer of uploaded images.
    Image,
    /// A layer holding one rasterized text image.
    Text,
}

/// A layer being created.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerDraft {
    /// Upload scope of the draft's files.
    pub id: DraftId,
    /// Image or text.
    pub kind: DraftKind,
    /// Requested layer name.
    pub name: String,
    /// Free text.
    pub description: String,
    /// Chosen files (image drafts).
    pub images: Vec<NewImage>,
    /// Text being styled (text drafts).
    pub text: Option<TextStyle>,
    /// Last failure, shown inline.
    pub error: Option<String>,
}

impl LayerDraft {
    fn new(id: DraftId, kind: DraftKind) -> Self {
        Self {
            id,
            kind,
            name: String::new(),
            description: String::new(),
            images: Vec::new(),
            text: None,
            error: None,
        }
    }

    /// Check that the draft can be committed.
    pub fn validate(&self) -> StrataResult<()> {
        match self.kind {
            DraftKind::Image if self.images.is_empty() => {
                Err(StrataError::validation("choose at least one image"))
            }
            DraftKind::Text => match &self.text {
                Some(style) => style.validate(),
                None => Err(StrataError::validation("text content must not be empty")),
            },
            DraftKind::Image => Ok(()),
        }
    }

    /// Placeholders owned by the draft.
    pub fn locals(&self) -> impl Iterator<Item = &LocalRef> {
        self.images.iter().map(|i| &i.local_preview)
    }

    /// Record an upload that finished before commit. Returns `true` when a chosen file took the
    /// reference; files resolve at most once.
    pub fn apply_resolution(&mut self, r: &Resolution) -> bool {
        match self
            .images
            .iter_mut()
            .find(|i| i.local_preview == r.local && i.remote.is_none())
        {
            Some(img) => {
                img.remote = Some(r.remote.clone());
                true
            }
            None => false,
        }
    }
}

/// Current phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftPhase {
    /// No draft.
    Idle,
    /// Editing a draft.
    Drafting,
    /// Commit in progress.
    Saving,
}

/// How the last draft ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftEnd {
    /// Committed as this layer.
    Committed(LayerId),
    /// Discarded.
    Cancelled,
}

#[derive(Clone, Debug, Default, PartialEq)]
enum State {
    #[default]
    Idle,
    Drafting(Box<LayerDraft>),
    Saving(Box<LayerDraft>),
}

/// The creation state machine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DraftMachine {
    state: State,
    last_end: Option<DraftEnd>,
}

impl DraftMachine {
    /// Create an idle machine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> DraftPhase {
        match self.state {
            State::Idle => DraftPhase::Idle,
            State::Drafting(_) => DraftPhase::Drafting,
            State::Saving(_) => DraftPhase::Saving,
        }
    }

    /// How the previous draft ended.
    pub fn last_end(&self) -> Option<DraftEnd> {
        self.last_end
    }

    /// The open draft, in either Drafting or Saving.
    pub fn draft(&self) -> Option<&LayerDraft> {
        match &self.state {
            State::Idle => None,
            State::Drafting(d) | State::Saving(d) => Some(&**d),
        }
    }

    /// The draft, only while it is editable.
    pub fn draft_mut(&mut self) -> Option<&mut LayerDraft> {
        match &mut self.state {
            State::Drafting(d) => Some(&mut **d),
            _ => None,
        }
    }

    /// `Idle -> Drafting`. Returns `false` when a draft is already open.
    pub fn begin(&mut self, id: DraftId, kind: DraftKind) -> bool {
        if !matches!(self.state, State::Idle) {
            return false;
        }
        self.state = State::Drafting(Box::new(LayerDraft::new(id, kind)));
        true
    }

    /// `Drafting -> Saving` after validation. A validation failure stays in Drafting with the
    /// message recorded on the draft.
    pub fn start_saving(&mut self) -> StrataResult<LayerDraft> {
        let mut draft = match std::mem::take(&mut self.state) {
            State::Drafting(draft) => draft,
            other => {
                self.state = other;
                return Err(StrataError::validation("no draft to save"));
            }
        };
        if let Err(e) = draft.validate() {
            draft.error = Some(e.to_string());
            self.state = State::Drafting(draft);
            return Err(e);
        }
        draft.error = None;
        let snapshot = (*draft).clone();
        self.state = State::Saving(draft);
        Ok(snapshot)
    }

    /// `Saving -> Drafting` with the failure recorded, so the designer can retry.
    pub fn fail_saving(&mut self, message: impl Into<String>) {
        self.state = match std::mem::take(&mut self.state) {
            State::Saving(mut draft) => {
                draft.error = Some(message.into());
                State::Drafting(draft)
            }
            other => other,
        };
    }

    /// `Saving -> Committed`, back to idle. Returns the committed draft.
    pub fn commit(&mut self, layer: LayerId) -> Option<LayerDraft> {
        match std::mem::take(&mut self.state) {
            State::Saving(draft) => {
                self.last_end = Some(DraftEnd::Committed(layer));
                Some(*draft)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// `Drafting | Saving -> Cancelled`, back to idle. Returns the discarded draft.
    pub fn cancel(&mut self) -> Option<LayerDraft> {
        match std::mem::take(&mut self.state) {
            State::Idle => None,
            State::Drafting(draft) | State::Saving(draft) => {
                self.last_end = Some(DraftEnd::Cancelled);
                Some(*draft)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/draft.rs"]
mod tests;
