//! Runner errors
//!
//! Generator and admission failures never reach this type; they are
//! recovered inside the cycle. What is left is either infrastructure
//! trouble (reported, cycle continues next tick) or fatal.

use aegis_gateway::GatewayError;
use aegis_ports::StoreError;
use aegis_strategy::StrategyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Risk error: {0}")]
    Risk(#[from] aegis_risk_manager::Error),

    #[error("Order error: {0}")]
    Orders(#[from] aegis_order_manager::Error),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Unknown risk state or similar; new cycles stop until an operator intervenes
    #[error("Fatal: {0}")]
    Fatal(String),

    #[error("Orchestrator halted: {0}")]
    Halted(String),

    #[error("Orchestrator not started")]
    NotStarted,

    #[error("Orchestrator is shutting down")]
    ShuttingDown,
}

impl Error {
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Fatal(_) | Error::Halted(_) => true,
            Error::Risk(e) => e.is_fatal(),
            Error::Orders(e) => e.is_fatal(),
            Error::Store(e) => !e.is_transient(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
