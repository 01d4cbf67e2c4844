//! Signal - What strategies output
//!
//! Strategies never talk to the broker. They emit candidate trade
//! instructions with a quality score; the aggregator ranks them and the
//! risk manager decides how much (if any) capital they get.

use super::{Side, TriggerType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Upper bound for `Signal::quality_score`
pub const MAX_QUALITY_SCORE: Decimal = dec!(10);

/// Link between the legs of a multi-leg signal
///
/// All legs share a `group_id`; the order manager treats positions with the
/// same group as one logical position for stop/target purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegLink {
    pub group_id: String,
    /// Zero-based position of this leg in the group
    pub leg_index: usize,
    pub leg_count: usize,
    /// Symbols of the other legs
    pub partner_symbols: Vec<String>,
}

/// Evidence and sizing intent attached to a signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMetadata {
    /// Volatility condition that produced the signal, if any
    pub trigger_type: Option<TriggerType>,
    /// Trigger strength (>= 1)
    pub intensity: Decimal,
    /// Confidence in [0, 1]
    pub confidence: Decimal,
    /// Ordered evidence list
    pub supporting_factors: Vec<String>,
    /// Realized volatility estimate used by the sizer (range ratio)
    pub volatility: Option<Decimal>,
    /// Strategy-expressed size scaling applied before risk admission
    pub position_multiplier: Decimal,
    /// Present on multi-leg signals
    pub leg: Option<LegLink>,
}

impl Default for SignalMetadata {
    fn default() -> Self {
        Self {
            trigger_type: None,
            intensity: Decimal::ONE,
            confidence: dec!(0.5),
            supporting_factors: Vec::new(),
            volatility: None,
            position_multiplier: Decimal::ONE,
            leg: None,
        }
    }
}

/// Candidate trade instruction produced by a strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub strategy_name: String,
    pub symbol: String,
    pub side: Side,
    /// In [0, MAX_QUALITY_SCORE]
    pub quality_score: Decimal,
    /// Pre-risk quantity (units)
    pub quantity: Decimal,
    pub entry_price_estimate: Decimal,
    /// Stop distance as a fraction of entry (0.02 = 2%)
    pub stop_loss_percent: Decimal,
    /// Target distance as a fraction of entry
    pub target_percent: Decimal,
    pub created_at: DateTime<Utc>,
    /// Signal is void after this instant
    pub time_stop: DateTime<Utc>,
    pub metadata: SignalMetadata,
}

impl Signal {
    /// Create a new signal with neutral quality and default metadata
    pub fn new(
        strategy_name: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        entry_price_estimate: Decimal,
        created_at: DateTime<Utc>,
        time_stop: DateTime<Utc>,
    ) -> Self {
        Self {
            strategy_name: strategy_name.into(),
            symbol: symbol.into(),
            side,
            quality_score: dec!(5),
            quantity,
            entry_price_estimate,
            stop_loss_percent: dec!(0.02),
            target_percent: dec!(0.04),
            created_at,
            time_stop,
            metadata: SignalMetadata::default(),
        }
    }

    /// Builder: Set quality score (clamped to [0, 10])
    pub fn with_quality(mut self, score: Decimal) -> Self {
        self.quality_score = score.clamp(Decimal::ZERO, MAX_QUALITY_SCORE);
        self
    }

    /// Builder: Set stop-loss and target fractions
    pub fn with_exits(mut self, stop_loss_percent: Decimal, target_percent: Decimal) -> Self {
        self.stop_loss_percent = stop_loss_percent;
        self.target_percent = target_percent;
        self
    }

    /// Builder: Set metadata
    pub fn with_metadata(mut self, metadata: SignalMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Quality in range and time stop strictly after creation
    pub fn is_valid(&self) -> bool {
        self.quality_score >= Decimal::ZERO
            && self.quality_score <= MAX_QUALITY_SCORE
            && self.time_stop > self.created_at
            && self.quantity > Decimal::ZERO
            && self.entry_price_estimate > Decimal::ZERO
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.time_stop
    }

    /// Estimated notional value at the entry estimate
    pub fn notional(&self) -> Decimal {
        self.quantity * self.entry_price_estimate
    }

    /// Leg group id for multi-leg signals
    pub fn leg_group(&self) -> Option<&str> {
        self.metadata.leg.as_ref().map(|l| l.group_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_signal() -> Signal {
        let now = Utc::now();
        Signal::new(
            "vol-breakout",
            "AAPL",
            Side::Buy,
            dec!(100),
            dec!(190),
            now,
            now + Duration::minutes(30),
        )
    }

    #[test]
    fn test_signal_creation() {
        let signal = make_signal().with_quality(dec!(7.5));

        assert_eq!(signal.strategy_name, "vol-breakout");
        assert_eq!(signal.quality_score, dec!(7.5));
        assert_eq!(signal.notional(), dec!(19000));
        assert!(signal.is_valid());
    }

    #[test]
    fn test_quality_clamping() {
        let signal = make_signal().with_quality(dec!(14));
        assert_eq!(signal.quality_score, MAX_QUALITY_SCORE);

        let signal = make_signal().with_quality(dec!(-1));
        assert_eq!(signal.quality_score, Decimal::ZERO);
    }

    #[test]
    fn test_time_stop_must_follow_creation() {
        let mut signal = make_signal();
        signal.time_stop = signal.created_at;
        assert!(!signal.is_valid());
        assert!(signal.is_expired_at(signal.created_at));
    }
}
