use serde::{Deserialize, Serialize};

/// Machine-readable reason a signal never became a live order
///
/// Every admission rejection, aggregator drop and broker-side failure maps
/// onto exactly one of these codes so the audit trail can be reconstructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// Drawdown hard stop is active
    DrawdownBreach,
    /// Symbol is serving a ban
    BlacklistedSymbol,
    /// Owning strategy has no capital left in its partition
    InsufficientStrategyCapital,
    /// Trade would push single-symbol or book exposure over the limit
    ConcentrationLimit,
    /// Sized position is below the minimum tradable unit
    BelowMinSize,
    /// Operator kill switch is off
    TradingDisabled,
    /// Signal time stop already passed
    SignalExpired,
    /// Same (symbol, side, strategy) already executed today
    DuplicateSignal,
    /// Broker could not be reached within the retry budget
    BrokerUnreachable,
    /// Broker refused the order
    BrokerRejected,
    /// No valid broker session
    Unauthenticated,
    /// Broker cancelled the order
    CancelledByBroker,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DrawdownBreach => "DRAWDOWN_BREACH",
            Self::BlacklistedSymbol => "BLACKLISTED_SYMBOL",
            Self::InsufficientStrategyCapital => "INSUFFICIENT_STRATEGY_CAPITAL",
            Self::ConcentrationLimit => "CONCENTRATION_LIMIT",
            Self::BelowMinSize => "BELOW_MIN_SIZE",
            Self::TradingDisabled => "TRADING_DISABLED",
            Self::SignalExpired => "SIGNAL_EXPIRED",
            Self::DuplicateSignal => "DUPLICATE_SIGNAL",
            Self::BrokerUnreachable => "BROKER_UNREACHABLE",
            Self::BrokerRejected => "BROKER_REJECTED",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::CancelledByBroker => "CANCELLED_BY_BROKER",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique() {
        let all = [
            RejectReason::DrawdownBreach,
            RejectReason::BlacklistedSymbol,
            RejectReason::InsufficientStrategyCapital,
            RejectReason::ConcentrationLimit,
            RejectReason::BelowMinSize,
            RejectReason::TradingDisabled,
            RejectReason::SignalExpired,
            RejectReason::DuplicateSignal,
            RejectReason::BrokerUnreachable,
            RejectReason::BrokerRejected,
            RejectReason::Unauthenticated,
            RejectReason::CancelledByBroker,
        ];
        let codes: HashSet<_> = all.iter().map(|r| r.as_str()).collect();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn test_display_uses_code() {
        assert_eq!(RejectReason::DrawdownBreach.to_string(), "DRAWDOWN_BREACH");
        assert_eq!(
            RejectReason::BelowMinSize.to_string(),
            RejectReason::BelowMinSize.as_str()
        );
    }
}
