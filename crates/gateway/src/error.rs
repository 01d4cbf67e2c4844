//! Error types for the gateway crate

use thiserror::Error;

/// Gateway-level errors (adapter operations)
///
/// Classification drives the order manager: transient errors are retried,
/// symbol-specific ones feed the blacklist, everything else is final.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Broker timeout: {0}")]
    Timeout(String),

    /// 5xx-equivalent: broker reachable but failing
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limited")]
    RateLimited,

    /// Refused for an account-wide reason (buying power, permissions)
    #[error("Order rejected: {0}")]
    Rejected(String),

    /// Refused because of the instrument (halted, not shortable, unknown)
    #[error("Order rejected for {symbol}: {reason}")]
    SymbolRejected { symbol: String, reason: String },

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Unknown order: {0}")]
    UnknownOrder(String),

    #[error("Market data unavailable: {0}")]
    MarketData(String),
}

impl GatewayError {
    /// Worth another attempt after backoff
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::Timeout(_)
                | GatewayError::Unavailable(_)
                | GatewayError::RateLimited
        )
    }

    /// The failure points at the instrument, not at the broker or account
    pub fn is_symbol_specific(&self) -> bool {
        matches!(self, GatewayError::SymbolRejected { .. })
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(GatewayError::Timeout("submit".into()).is_transient());
        assert!(GatewayError::RateLimited.is_transient());
        assert!(!GatewayError::Rejected("buying power".into()).is_transient());

        let halted = GatewayError::SymbolRejected {
            symbol: "XYZ".into(),
            reason: "halted".into(),
        };
        assert!(halted.is_symbol_specific());
        assert!(!halted.is_transient());
        assert!(!GatewayError::Unavailable("502".into()).is_symbol_specific());
    }
}
