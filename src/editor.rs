//! User-facing editing: creation drafts, transform gestures, persistence and the controller
//! that ties them to the layer store and the upload coordinator.

/// Editor settings.
pub mod config;
/// The editor controller.
pub mod controller;
/// Layer-creation state machine.
pub mod draft;
/// Drag and resize gestures.
pub mod gesture;
/// Study backend and draft snapshot boundaries.
pub mod persistence;
