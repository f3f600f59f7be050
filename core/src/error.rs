//! Error kinds surfaced by the cookbook core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CookbookError>;

#[derive(Debug, Error)]
pub enum CookbookError {
    /// An id that no longer resolves (deleted elsewhere, or never existed).
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// The operation would break a cross-entity rule; nothing was written.
    #[error("{0}")]
    InvariantViolation(String),

    /// Input rejected before any write.
    #[error("{0}")]
    Validation(String),

    #[error("store failure: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("encoding failure: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl CookbookError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
