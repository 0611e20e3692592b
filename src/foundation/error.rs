/// Convenience result type used across narrascene.
pub type NarrasceneResult<T> = Result<T, NarrasceneError>;

/// Top-level error taxonomy used by library APIs.
///
/// Soft failures (a missing audio asset, a failed render unit) are reported through return
/// values and logs, never through this type.
#[derive(thiserror::Error, Debug)]
pub enum NarrasceneError {
    /// Invalid user-provided options or data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Render units could not be discovered (missing or unreadable source file).
    #[error("discovery error: {0}")]
    Discovery(String),

    /// Errors while driving the external render engine.
    #[error("render error: {0}")]
    Render(String),

    /// Errors from the speech synthesis backend.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NarrasceneError {
    /// Build a [`NarrasceneError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`NarrasceneError::Discovery`] value.
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery(msg.into())
    }

    /// Build a [`NarrasceneError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`NarrasceneError::Synthesis`] value.
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    /// Build a [`NarrasceneError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
