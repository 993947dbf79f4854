//! Fit-box geometry and container observation.

/// Fit box and percent/pixel conversion.
pub mod fit;
/// Container resize observation.
pub mod observer;
