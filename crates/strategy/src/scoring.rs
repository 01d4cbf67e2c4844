//! Quality score, position multiplier and time stop
//!
//! All three are computed before risk admission so the risk manager sizes
//! against what the strategy intends rather than a fixed constant.

use aegis_core::{MAX_QUALITY_SCORE, TriggerType};
use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::volatility::VolatilityRegime;

/// Weights for the quality score
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub base_score: Decimal,
    /// Cap on the intensity contribution
    pub max_intensity_bonus: Decimal,
    pub confidence_weight: Decimal,
    pub factor_bonus: Decimal,
    pub max_factors: usize,
    /// Bonus inside the first `early_session_minutes`
    pub early_session_bonus: Decimal,
    pub early_session_minutes: i64,
    /// Penalty inside the last `late_session_minutes`
    pub late_session_penalty: Decimal,
    pub late_session_minutes: i64,
    pub extreme_volatility_penalty: Decimal,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_score: dec!(5),
            max_intensity_bonus: dec!(2),
            confidence_weight: dec!(2),
            factor_bonus: dec!(0.5),
            max_factors: 4,
            early_session_bonus: dec!(1),
            early_session_minutes: 90,
            late_session_penalty: dec!(2),
            late_session_minutes: 30,
            extreme_volatility_penalty: dec!(1.5),
        }
    }
}

/// Evidence behind one signal
#[derive(Debug, Clone, Copy)]
pub struct Evidence {
    pub intensity: Decimal,
    pub confidence: Decimal,
    pub factor_count: usize,
    pub minutes_since_open: i64,
    pub minutes_to_close: i64,
    pub regime: VolatilityRegime,
}

impl ScoringConfig {
    /// Score in [0, 10]
    ///
    /// Non-decreasing in intensity, confidence and factor count; early
    /// session raises it, late session and extreme volatility lower it.
    pub fn quality_score(&self, e: &Evidence) -> Decimal {
        let mut score = self.base_score;

        score += (e.intensity - Decimal::ONE)
            .max(Decimal::ZERO)
            .min(self.max_intensity_bonus);
        score += e.confidence.clamp(Decimal::ZERO, Decimal::ONE) * self.confidence_weight;
        score += self.factor_bonus * Decimal::from(e.factor_count.min(self.max_factors) as u32);

        if (0..self.early_session_minutes).contains(&e.minutes_since_open) {
            score += self.early_session_bonus;
        }
        if e.minutes_to_close < self.late_session_minutes {
            score -= self.late_session_penalty;
        }
        if e.regime == VolatilityRegime::Extreme {
            score -= self.extreme_volatility_penalty;
        }

        score.clamp(Decimal::ZERO, MAX_QUALITY_SCORE)
    }
}

/// Size scaling from regime, confidence and portfolio stress, in [0.1, 2]
pub fn position_multiplier(
    regime: VolatilityRegime,
    confidence: Decimal,
    portfolio_stress: Decimal,
) -> Decimal {
    let regime_factor = match regime {
        VolatilityRegime::Low => dec!(1.2),
        VolatilityRegime::Normal => Decimal::ONE,
        VolatilityRegime::High => dec!(0.7),
        VolatilityRegime::Extreme => dec!(0.5),
    };
    let confidence_factor = dec!(0.5) + dec!(0.5) * confidence.clamp(Decimal::ZERO, Decimal::ONE);
    let stress_factor =
        Decimal::ONE - dec!(0.5) * portfolio_stress.clamp(Decimal::ZERO, Decimal::ONE);

    (regime_factor * confidence_factor * stress_factor).clamp(dec!(0.1), dec!(2))
}

/// Holding period from a base, shortened in fast markets, never under a minute
pub fn time_stop(
    base_hold_minutes: i64,
    regime: VolatilityRegime,
    trigger: Option<TriggerType>,
) -> Duration {
    let regime_adj = match regime {
        VolatilityRegime::Low => dec!(1.3),
        VolatilityRegime::Normal => Decimal::ONE,
        VolatilityRegime::High => dec!(0.7),
        VolatilityRegime::Extreme => dec!(0.5),
    };
    let trigger_adj = match trigger {
        Some(TriggerType::IntradaySpike) => dec!(0.5),
        Some(TriggerType::MorningExplosion) => dec!(0.8),
        Some(TriggerType::VixSurge) | None => Decimal::ONE,
        Some(TriggerType::Cluster) => dec!(1.2),
    };

    let seconds = Decimal::from(base_hold_minutes * 60) * regime_adj * trigger_adj;
    let seconds = i64::try_from(seconds.trunc()).unwrap_or(60);
    Duration::seconds(seconds.max(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence() -> Evidence {
        Evidence {
            intensity: dec!(1.5),
            confidence: dec!(0.6),
            factor_count: 2,
            minutes_since_open: 120,
            minutes_to_close: 200,
            regime: VolatilityRegime::Normal,
        }
    }

    #[test]
    fn test_quality_score_components() {
        let scoring = ScoringConfig::default();
        // 5 + 0.5 + 1.2 + 1.0
        assert_eq!(scoring.quality_score(&evidence()), dec!(7.7));
    }

    #[test]
    fn test_quality_monotonic_in_evidence() {
        let scoring = ScoringConfig::default();
        let base = scoring.quality_score(&evidence());

        let stronger = Evidence {
            intensity: dec!(2.5),
            ..evidence()
        };
        let more_factors = Evidence {
            factor_count: 3,
            ..evidence()
        };
        let early = Evidence {
            minutes_since_open: 15,
            ..evidence()
        };
        let late = Evidence {
            minutes_to_close: 10,
            ..evidence()
        };
        let extreme = Evidence {
            regime: VolatilityRegime::Extreme,
            ..evidence()
        };

        assert!(scoring.quality_score(&stronger) > base);
        assert!(scoring.quality_score(&more_factors) > base);
        assert!(scoring.quality_score(&early) > base);
        assert!(scoring.quality_score(&late) < base);
        assert!(scoring.quality_score(&extreme) < base);
    }

    #[test]
    fn test_quality_capped() {
        let scoring = ScoringConfig::default();
        let maxed = Evidence {
            intensity: dec!(50),
            confidence: Decimal::ONE,
            factor_count: 10,
            minutes_since_open: 5,
            ..evidence()
        };
        assert_eq!(scoring.quality_score(&maxed), MAX_QUALITY_SCORE);
    }

    #[test]
    fn test_position_multiplier() {
        assert_eq!(
            position_multiplier(VolatilityRegime::Normal, Decimal::ONE, Decimal::ZERO),
            Decimal::ONE
        );
        assert!(
            position_multiplier(VolatilityRegime::High, dec!(0.5), Decimal::ZERO)
                < position_multiplier(VolatilityRegime::Normal, dec!(0.5), Decimal::ZERO)
        );
        assert!(
            position_multiplier(VolatilityRegime::Normal, dec!(0.5), dec!(0.8))
                < position_multiplier(VolatilityRegime::Normal, dec!(0.5), Decimal::ZERO)
        );
        assert_eq!(
            position_multiplier(VolatilityRegime::Extreme, Decimal::ZERO, Decimal::ONE),
            dec!(0.125)
        );
    }

    #[test]
    fn test_time_stop() {
        assert_eq!(
            time_stop(60, VolatilityRegime::Normal, Some(TriggerType::Cluster)),
            Duration::minutes(72)
        );
        assert_eq!(
            time_stop(60, VolatilityRegime::Extreme, Some(TriggerType::IntradaySpike)),
            Duration::minutes(15)
        );
        assert_eq!(time_stop(1, VolatilityRegime::Extreme, None), Duration::minutes(1));
    }
}
