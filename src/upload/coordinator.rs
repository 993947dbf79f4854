//! Upload batching.
//!
//! Multi-file submissions are dispatched as one batch at the next pump. Single-file submissions
//! wait in a per-scope queue until the scope's debounce deadline, so a burst of quick edits to one
//! layer costs one network call. Every scope owns its own deadline; scopes never share or block
//! each other's windows.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::foundation::core::{DraftId, LayerId, LocalRef, RemoteRef};
use crate::upload::remote::{RemoteAssetStore, UploadPayload};

/// Default debounce window for single-file submissions.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Batching key for debounced uploads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UploadScope {
    /// Images added to an existing layer.
    Layer(LayerId),
    /// Images added while a layer is still being drafted.
    Draft(DraftId),
    /// The study background.
    Background,
}

/// A queued upload: a placeholder and the bytes that will resolve it.
#[derive(Clone, Debug)]
pub struct UploadTask {
    /// Placeholder handed out at submission.
    pub local: LocalRef,
    /// Bytes to upload.
    pub payload: UploadPayload,
}

/// One resolved placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Placeholder that was submitted.
    pub local: LocalRef,
    /// Durable reference returned for it.
    pub remote: RemoteRef,
}

/// Result of dispatching one batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every file in the batch was stored.
    Resolved {
        /// Scope the batch was queued under.
        scope: UploadScope,
        /// Placeholder to remote mapping, in submission order.
        resolutions: Vec<Resolution>,
    },
    /// The batch was rejected; its placeholders stay unresolved.
    Failed {
        /// Scope the batch was queued under.
        scope: UploadScope,
        /// Placeholders that stay unresolved.
        locals: Vec<LocalRef>,
        /// Reason reported by the asset store.
        reason: String,
    },
}

impl BatchOutcome {
    /// Scope the batch was queued under.
    pub fn scope(&self) -> UploadScope {
        match self {
            Self::Resolved { scope, .. } | Self::Failed { scope, .. } => *scope,
        }
    }
}

#[derive(Debug)]
struct PendingScope {
    items: Vec<UploadTask>,
    deadline: Instant,
}

#[derive(Debug)]
struct ReadyBatch {
    scope: UploadScope,
    items: Vec<UploadTask>,
}

/// Queues local assets and batches them against a [`RemoteAssetStore`].
///
/// Failed batches are not retried; their placeholders are remembered in [`Self::failed`] until
/// they are submitted again.
#[derive(Debug)]
pub struct UploadCoordinator {
    debounce: Duration,
    next_local: u64,
    scopes: HashMap<UploadScope, PendingScope>,
    ready: VecDeque<ReadyBatch>,
    failed: BTreeSet<LocalRef>,
}

impl Default for UploadCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl UploadCoordinator {
    /// Create a coordinator with the given single-file debounce window.
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            next_local: 0,
            scopes: HashMap::new(),
            ready: VecDeque::new(),
            failed: BTreeSet::new(),
        }
    }

    /// Configured debounce window.
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Make sure newly issued placeholders never collide with `used` (for example after resuming
    /// a saved session).
    pub fn reserve_local_refs<'a>(&mut self, used: impl IntoIterator<Item = &'a LocalRef>) {
        for r in used {
            if let Some(seq) = r.as_str().strip_prefix("local:").and_then(|s| s.parse().ok()) {
                self.next_local = self.next_local.max(seq);
            }
        }
    }

    /// Issue a fresh placeholder without queueing anything.
    pub fn allocate_local(&mut self) -> LocalRef {
        self.next_local += 1;
        LocalRef::from_seq(self.next_local)
    }

    /// Submit files for upload and return their placeholders immediately.
    ///
    /// Two or more files form one batch that goes out at the next [`Self::pump`]. A single file
    /// joins the scope's pending queue; the first file of a window sets the deadline and later
    /// ones do not extend it.
    pub fn submit(
        &mut self,
        scope: UploadScope,
        files: Vec<UploadPayload>,
        now: Instant,
    ) -> Vec<LocalRef> {
        let tasks: Vec<UploadTask> = files
            .into_iter()
            .map(|payload| UploadTask {
                local: self.allocate_local(),
                payload,
            })
            .collect();
        let locals = tasks.iter().map(|t| t.local.clone()).collect();
        self.enqueue(scope, tasks, now);
        locals
    }

    /// Queue tasks that already own placeholders (reconciliation and retries).
    pub fn resubmit(&mut self, scope: UploadScope, tasks: Vec<UploadTask>, now: Instant) {
        self.enqueue(scope, tasks, now);
    }

    fn enqueue(&mut self, scope: UploadScope, tasks: Vec<UploadTask>, now: Instant) {
        for t in &tasks {
            self.failed.remove(&t.local);
        }
        match tasks.len() {
            0 => {}
            1 => {
                let debounce = self.debounce;
                let entry = self.scopes.entry(scope).or_insert_with(|| PendingScope {
                    items: Vec::new(),
                    deadline: now + debounce,
                });
                entry.items.extend(tasks);
                tracing::debug!(?scope, queued = entry.items.len(), "single file queued");
            }
            n => {
                tracing::debug!(?scope, files = n, "multi-file batch ready");
                self.ready.push_back(ReadyBatch {
                    scope,
                    items: tasks,
                });
            }
        }
    }

    /// Drop a scope's debounce window and queued files. Batches already sent are unaffected.
    pub fn abandon_scope(&mut self, scope: UploadScope) -> usize {
        let mut dropped = self.scopes.remove(&scope).map_or(0, |p| p.items.len());
        self.ready.retain(|b| {
            if b.scope == scope {
                dropped += b.items.len();
                false
            } else {
                true
            }
        });
        dropped
    }

    /// Withdraw a queued placeholder before it is sent. Returns `false` when it is not queued,
    /// either because it already went out or because it was never submitted.
    pub fn cancel(&mut self, local: &LocalRef) -> bool {
        self.failed.remove(local);
        let mut found = false;
        for p in self.scopes.values_mut() {
            let before = p.items.len();
            p.items.retain(|t| &t.local != local);
            found |= p.items.len() != before;
        }
        self.scopes.retain(|_, p| !p.items.is_empty());
        for b in &mut self.ready {
            let before = b.items.len();
            b.items.retain(|t| &t.local != local);
            found |= b.items.len() != before;
        }
        self.ready.retain(|b| !b.items.is_empty());
        if found {
            tracing::debug!(%local, "queued upload cancelled");
        }
        found
    }

    /// Return `true` when `local` waits in a queue.
    pub fn is_pending(&self, local: &LocalRef) -> bool {
        self.scopes
            .values()
            .flat_map(|p| p.items.iter())
            .chain(self.ready.iter().flat_map(|b| b.items.iter()))
            .any(|t| &t.local == local)
    }

    /// Return `true` when anything waits to be dispatched.
    pub fn has_pending(&self) -> bool {
        !self.ready.is_empty() || self.scopes.values().any(|p| !p.items.is_empty())
    }

    /// Number of queued single files for `scope`.
    pub fn pending_in_scope(&self, scope: UploadScope) -> usize {
        self.scopes.get(&scope).map_or(0, |p| p.items.len())
    }

    /// Earliest debounce deadline, if any scope is waiting.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scopes.values().map(|p| p.deadline).min()
    }

    /// Placeholders whose last batch was rejected.
    pub fn failed(&self) -> &BTreeSet<LocalRef> {
        &self.failed
    }

    /// Dispatch every ready batch and every scope whose deadline has passed.
    pub fn pump(&mut self, now: Instant, remote: &mut dyn RemoteAssetStore) -> Vec<BatchOutcome> {
        let batches = self.take_due(Some(now));
        self.dispatch_all(batches, remote)
    }

    /// Dispatch everything that is queued, ignoring debounce deadlines.
    pub fn flush_all(&mut self, remote: &mut dyn RemoteAssetStore) -> Vec<BatchOutcome> {
        let batches = self.take_due(None);
        self.dispatch_all(batches, remote)
    }

    fn take_due(&mut self, now: Option<Instant>) -> Vec<ReadyBatch> {
        let mut out: Vec<ReadyBatch> = self.ready.drain(..).collect();

        let mut due: Vec<(Instant, UploadScope)> = self
            .scopes
            .iter()
            .filter(|(_, p)| now.is_none_or(|now| p.deadline <= now))
            .map(|(scope, p)| (p.deadline, *scope))
            .collect();
        due.sort();
        for (_, scope) in due {
            if let Some(p) = self.scopes.remove(&scope)
                && !p.items.is_empty()
            {
                out.push(ReadyBatch {
                    scope,
                    items: p.items,
                });
            }
        }
        out
    }

    fn dispatch_all(
        &mut self,
        batches: Vec<ReadyBatch>,
        remote: &mut dyn RemoteAssetStore,
    ) -> Vec<BatchOutcome> {
        batches
            .into_iter()
            .map(|b| self.dispatch(b, remote))
            .collect()
    }

    #[tracing::instrument(
        skip(self, batch, remote),
        fields(scope = ?batch.scope, files = batch.items.len())
    )]
    fn dispatch(&mut self, batch: ReadyBatch, remote: &mut dyn RemoteAssetStore) -> BatchOutcome {
        let payloads: Vec<UploadPayload> = batch.items.iter().map(|t| t.payload.clone()).collect();
        let locals: Vec<LocalRef> = batch.items.into_iter().map(|t| t.local).collect();

        let result = remote.submit_batch(&payloads).and_then(|refs| {
            if refs.len() == locals.len() {
                Ok(refs)
            } else {
                Err(crate::StrataError::upload(format!(
                    "asset store returned {} references for {} files",
                    refs.len(),
                    locals.len()
                )))
            }
        });

        match result {
            Ok(refs) => BatchOutcome::Resolved {
                scope: batch.scope,
                resolutions: locals
                    .into_iter()
                    .zip(refs)
                    .map(|(local, remote)| Resolution { local, remote })
                    .collect(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "upload batch failed; placeholders stay unresolved");
                self.failed.extend(locals.iter().cloned());
                BatchOutcome::Failed {
                    scope: batch.scope,
                    locals,
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/upload/coordinator.rs"]
mod tests;
