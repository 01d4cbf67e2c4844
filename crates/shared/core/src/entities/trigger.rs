use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Market condition that caused a volatility signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    /// Several consecutive high-range bars
    Cluster,
    /// Range/volume burst shortly after the open
    MorningExplosion,
    /// Jump in the volatility index
    VixSurge,
    /// Single outsized bar relative to recent history
    IntradaySpike,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cluster => "CLUSTER",
            Self::MorningExplosion => "MORNING_EXPLOSION",
            Self::VixSurge => "VIX_SURGE",
            Self::IntradaySpike => "INTRADAY_SPIKE",
        }
    }
}

/// Detected market condition driving a signal
///
/// Immutable once created; consumed by exactly one signal-creation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityTrigger {
    pub trigger_type: TriggerType,
    /// Always >= 1
    pub intensity: Decimal,
    /// Always within [0, 1]
    pub confidence: Decimal,
    /// Ordered, most important first
    pub supporting_factors: Vec<String>,
    pub trigger_time: DateTime<Utc>,
}

impl VolatilityTrigger {
    /// Create a trigger, clamping intensity and confidence into range
    pub fn new(
        trigger_type: TriggerType,
        intensity: Decimal,
        confidence: Decimal,
        supporting_factors: Vec<String>,
        trigger_time: DateTime<Utc>,
    ) -> Self {
        Self {
            trigger_type,
            intensity: intensity.max(Decimal::ONE),
            confidence: confidence.clamp(Decimal::ZERO, Decimal::ONE),
            supporting_factors,
            trigger_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trigger_clamps_inputs() {
        let trigger = VolatilityTrigger::new(
            TriggerType::IntradaySpike,
            dec!(0.4),
            dec!(1.7),
            vec!["volume_surge".to_string()],
            Utc::now(),
        );

        assert_eq!(trigger.intensity, Decimal::ONE);
        assert_eq!(trigger.confidence, Decimal::ONE);
        assert_eq!(trigger.trigger_type.as_str(), "INTRADAY_SPIKE");
    }
}
