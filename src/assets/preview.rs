//! Local preview bytes, keyed by placeholder.
//!
//! Every upload keeps its bytes here until the layer that shows it is gone; reconciliation
//! reads them back to resubmit uploads that never resolved.

use std::collections::{BTreeSet, HashMap};

use crate::foundation::core::LocalRef;
use crate::upload::remote::UploadPayload;

/// Where reconciliation finds the bytes behind a placeholder.
pub trait PreviewSource {
    /// Bytes previously submitted under `local`, if still held.
    fn preview_payload(&self, local: &LocalRef) -> Option<UploadPayload>;
}

/// In-memory [`PreviewSource`].
#[derive(Debug, Default, Clone)]
pub struct LocalPreviewCache {
    entries: HashMap<LocalRef, UploadPayload>,
}

impl LocalPreviewCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `payload` under `local`, replacing any previous entry.
    pub fn insert(&mut self, local: LocalRef, payload: UploadPayload) {
        self.entries.insert(local, payload);
    }

    /// Borrow the payload stored under `local`.
    pub fn get(&self, local: &LocalRef) -> Option<&UploadPayload> {
        self.entries.get(local)
    }

    /// Forget `local`.
    pub fn remove(&mut self, local: &LocalRef) -> Option<UploadPayload> {
        self.entries.remove(local)
    }

    /// Drop every entry not in `live`; returns how many were released.
    pub fn retain_only(&mut self, live: &BTreeSet<LocalRef>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| live.contains(k));
        before - self.entries.len()
    }

    /// Number of held previews.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when nothing is held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PreviewSource for LocalPreviewCache {
    fn preview_payload(&self, local: &LocalRef) -> Option<UploadPayload> {
        self.entries.get(local).cloned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/preview.rs"]
mod tests;
