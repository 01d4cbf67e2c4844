//! Error types for strategy evaluation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    #[error("Invalid tick for {symbol}: {reason}")]
    InvalidTick { symbol: String, reason: String },

    #[error("Invalid strategy config '{name}': {reason}")]
    InvalidConfig { name: String, reason: String },

    #[error("Evaluation failed: {0}")]
    Evaluation(String),
}

pub type Result<T> = std::result::Result<T, StrategyError>;
