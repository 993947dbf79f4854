/// Convenience result type used across Strata.
pub type StrataResult<T> = Result<T, StrataError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum StrataError {
    /// Invalid user-provided draft or model data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A batch upload was rejected by the remote asset store.
    #[error("upload failure: {0}")]
    Upload(String),

    /// Text could not be measured or captured into a bitmap.
    #[error("rasterization failure: {0}")]
    Rasterization(String),

    /// Geometry requested before the container was measured.
    #[error("degenerate geometry: {0}")]
    GeometryDegenerate(String),

    /// A persistence collaborator failed to store or load state.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StrataError {
    /// Build a [`StrataError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StrataError::Upload`] value.
    pub fn upload(msg: impl Into<String>) -> Self {
        Self::Upload(msg.into())
    }

    /// Build a [`StrataError::Rasterization`] value.
    pub fn rasterization(msg: impl Into<String>) -> Self {
        Self::Rasterization(msg.into())
    }

    /// Build a [`StrataError::GeometryDegenerate`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::GeometryDegenerate(msg.into())
    }

    /// Build a [`StrataError::Persistence`] value.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Build a [`StrataError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for StrataError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
