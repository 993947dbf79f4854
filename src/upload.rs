//! Local-to-remote asset uploads.

/// Debounced, scope-keyed batching.
pub mod coordinator;
/// Requeueing unresolved placeholders before navigation.
pub mod reconcile;
/// Remote asset-store boundary.
pub mod remote;
