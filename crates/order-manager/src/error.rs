//! Order Manager errors

use aegis_core::OrderId;
use aegis_gateway::GatewayError;
use aegis_ports::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Unknown order: {0}")]
    UnknownOrder(OrderId),

    #[error("Persisted order {order_id} is inconsistent: {reason}")]
    CorruptedOrder { order_id: String, reason: String },
}

impl Error {
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Store(e) => !e.is_transient(),
            Error::CorruptedOrder { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
