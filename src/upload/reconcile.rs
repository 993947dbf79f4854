//! Reconciliation: requeue every placeholder the store still holds without a durable reference.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::assets::preview::PreviewSource;
use crate::foundation::core::LocalRef;
use crate::layers::store::LayerStore;
use crate::upload::coordinator::{UploadCoordinator, UploadScope, UploadTask};

/// What a reconciliation pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Placeholders queued again, in store order.
    pub resubmitted: Vec<LocalRef>,
    /// Placeholders skipped because they already wait in a queue.
    pub already_pending: Vec<LocalRef>,
    /// Placeholders whose bytes are gone; they cannot resolve.
    pub missing_preview: Vec<LocalRef>,
}

impl ReconcileReport {
    /// Return `true` when the pass queued nothing and found nothing broken.
    pub fn is_noop(&self) -> bool {
        self.resubmitted.is_empty() && self.missing_preview.is_empty()
    }
}

/// Queue an upload for every unresolved image (hidden layers included) and an unresolved
/// background. Images of one layer go out as one batch.
///
/// Running it against a fully resolved store queues nothing, and running it twice in a row
/// queues nothing the second time.
#[tracing::instrument(skip_all)]
pub fn reconcile(
    store: &LayerStore,
    coordinator: &mut UploadCoordinator,
    previews: &dyn PreviewSource,
    now: Instant,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    let mut per_scope: BTreeMap<UploadScope, Vec<UploadTask>> = BTreeMap::new();

    let background = store
        .background()
        .filter(|bg| !bg.is_resolved())
        .map(|bg| (UploadScope::Background, bg.local_preview.clone()));
    let images = store
        .unresolved(true)
        .into_iter()
        .map(|u| (UploadScope::Layer(u.layer), u.local));

    for (scope, local) in background.into_iter().chain(images) {
        if coordinator.is_pending(&local) {
            report.already_pending.push(local);
            continue;
        }
        match previews.preview_payload(&local) {
            Some(payload) => {
                report.resubmitted.push(local.clone());
                per_scope
                    .entry(scope)
                    .or_default()
                    .push(UploadTask { local, payload });
            }
            None => {
                tracing::warn!(%local, "no local bytes for unresolved placeholder");
                report.missing_preview.push(local);
            }
        }
    }

    for (scope, tasks) in per_scope {
        coordinator.resubmit(scope, tasks, now);
    }
    if !report.is_noop() {
        tracing::debug!(
            resubmitted = report.resubmitted.len(),
            missing = report.missing_preview.len(),
            "reconciliation queued uploads"
        );
    }
    report
}

#[cfg(test)]
#[path = "../../tests/unit/upload/reconcile.rs"]
mod tests;
