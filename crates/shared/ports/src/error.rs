use thiserror::Error;

/// Errors from the shared state store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store could not be reached; callers may retry
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A record exists but cannot be decoded
    #[error("Corrupted record at {key}: {reason}")]
    Corrupted { key: String, reason: String },

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Transient failures are worth retrying, corruption never is
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
