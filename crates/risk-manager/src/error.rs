//! Error types for the risk manager

use aegis_ports::StoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid risk config: {0}")]
    Config(String),

    /// Persisted state failed validation; trading must not continue on it
    #[error("Corrupted {component} state: {reason}")]
    CorruptedState { component: String, reason: String },

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl Error {
    pub fn corrupted(component: &str, reason: impl Into<String>) -> Self {
        Error::CorruptedState {
            component: component.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the orchestrator must stop scheduling cycles
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::CorruptedState { .. } => true,
            Error::Store(e) => !e.is_transient(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
