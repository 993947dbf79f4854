//! Shared primitives.

/// Ids, references, sizes and colors.
pub mod core;
/// Error and result types.
pub mod error;
pub(crate) mod math;
