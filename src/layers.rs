//! Ordered layer/image model.

/// Background, layer and image records.
pub mod model;
/// Unique layer names.
pub mod naming;
/// The layer stack.
pub mod store;
