//! Volatility regime and trigger detection
//!
//! Two layers:
//! 1. Regime: classify realized volatility (average bar range) into four bands
//! 2. Triggers: compare the latest bar against the prior window and the
//!    volatility index against its previous reading

use aegis_core::{MarketTick, TriggerType, VolatilityTrigger};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::history::BarHistory;
use crate::strategy::StrategyContext;

/// Realized volatility band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VolatilityRegime {
    Low,
    Normal,
    High,
    Extreme,
}

impl VolatilityRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Normal => "NORMAL",
            Self::High => "HIGH",
            Self::Extreme => "EXTREME",
        }
    }
}

/// Upper bounds (average range ratio) of the Low/Normal/High bands
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegimeThresholds {
    pub low: Decimal,
    pub normal: Decimal,
    pub high: Decimal,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            low: dec!(0.005),
            normal: dec!(0.015),
            high: dec!(0.03),
        }
    }
}

impl RegimeThresholds {
    pub fn classify(&self, realized_volatility: Decimal) -> VolatilityRegime {
        if realized_volatility < self.low {
            VolatilityRegime::Low
        } else if realized_volatility < self.normal {
            VolatilityRegime::Normal
        } else if realized_volatility < self.high {
            VolatilityRegime::High
        } else {
            VolatilityRegime::Extreme
        }
    }
}

/// Trigger detection parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Bars required before anything is detected
    pub min_history: usize,
    /// Latest range vs prior average for INTRADAY_SPIKE
    pub spike_multiple: Decimal,
    /// Consecutive expanded bars (latest included) for CLUSTER
    pub cluster_bars: usize,
    pub cluster_multiple: Decimal,
    /// Minutes after the open in which MORNING_EXPLOSION can fire
    pub morning_window_minutes: i64,
    pub morning_multiple: Decimal,
    /// Relative rise in the volatility index for VIX_SURGE (0.10 = +10%)
    pub vix_surge_percent: Decimal,
    /// Latest volume vs prior average counted as a volume surge
    pub volume_surge_multiple: Decimal,
    /// Volatility index level counted as elevated
    pub vix_elevated_level: Decimal,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            min_history: 5,
            spike_multiple: dec!(2.5),
            cluster_bars: 3,
            cluster_multiple: dec!(1.5),
            morning_window_minutes: 30,
            morning_multiple: dec!(1.8),
            vix_surge_percent: dec!(0.10),
            volume_surge_multiple: dec!(1.5),
            vix_elevated_level: dec!(20),
        }
    }
}

/// Stateless detector; the caller owns the history
#[derive(Debug, Clone, Default)]
pub struct TriggerDetector {
    config: TriggerConfig,
}

impl TriggerDetector {
    pub fn new(config: TriggerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// Detect triggers for `tick` against `prior` (history before this tick)
    ///
    /// Returns the strongest trigger by confidence, then intensity.
    pub fn detect(
        &self,
        tick: &MarketTick,
        prior: &BarHistory,
        ctx: &StrategyContext<'_>,
    ) -> Option<VolatilityTrigger> {
        let mut found = self.detect_all(tick, prior, ctx);
        found.sort_by(|a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then(b.intensity.cmp(&a.intensity))
        });
        found.into_iter().next()
    }

    pub fn detect_all(
        &self,
        tick: &MarketTick,
        prior: &BarHistory,
        ctx: &StrategyContext<'_>,
    ) -> Vec<VolatilityTrigger> {
        let mut triggers = Vec::new();
        let cfg = &self.config;

        let factors = self.supporting_factors(tick, prior, ctx);

        if let Some(trigger) = self.vix_surge(ctx, &factors) {
            triggers.push(trigger);
        }

        if prior.len() < cfg.min_history {
            return triggers;
        }
        let Some(baseline) = prior.average_range_ratio().filter(|b| !b.is_zero()) else {
            return triggers;
        };
        let expansion = tick.range_ratio() / baseline;

        if expansion >= cfg.spike_multiple {
            triggers.push(self.build(
                TriggerType::IntradaySpike,
                expansion / cfg.spike_multiple * dec!(1.5),
                &factors,
                ctx,
            ));
        }

        let minutes = ctx.minutes_since_open();
        let volume_surge = factors.iter().any(|f| f == "volume_surge");
        if (0..=cfg.morning_window_minutes).contains(&minutes)
            && expansion >= cfg.morning_multiple
            && volume_surge
        {
            triggers.push(self.build(
                TriggerType::MorningExplosion,
                expansion / cfg.morning_multiple * dec!(1.5),
                &factors,
                ctx,
            ));
        }

        if cfg.cluster_bars >= 2 && expansion >= cfg.cluster_multiple {
            let threshold = baseline * cfg.cluster_multiple;
            let needed = cfg.cluster_bars - 1;
            let expanded = prior
                .recent(needed)
                .filter(|b| b.range_ratio() >= threshold)
                .count();
            if expanded == needed {
                triggers.push(self.build(
                    TriggerType::Cluster,
                    expansion / cfg.cluster_multiple + Decimal::from(needed) * dec!(0.25),
                    &factors,
                    ctx,
                ));
            }
        }

        triggers
    }

    fn vix_surge(
        &self,
        ctx: &StrategyContext<'_>,
        factors: &[String],
    ) -> Option<VolatilityTrigger> {
        let current = ctx.snapshot.volatility_index?;
        let previous = ctx.previous_volatility_index.filter(|p| !p.is_zero())?;
        let change = (current - previous) / previous;

        (change >= self.config.vix_surge_percent).then(|| {
            self.build(
                TriggerType::VixSurge,
                change / self.config.vix_surge_percent,
                factors,
                ctx,
            )
        })
    }

    fn supporting_factors(
        &self,
        tick: &MarketTick,
        prior: &BarHistory,
        ctx: &StrategyContext<'_>,
    ) -> Vec<String> {
        let mut factors = Vec::new();

        if let Some(avg) = prior.average_volume().filter(|v| !v.is_zero())
            && tick.volume >= avg * self.config.volume_surge_multiple
        {
            factors.push("volume_surge".to_string());
        }

        if let (Some(last), Some(mean)) = (prior.last(), prior.mean_close()) {
            let bar_up = tick.last_price > last.close;
            let trend_up = last.close > mean;
            if bar_up == trend_up && tick.last_price != last.close {
                factors.push("trend_alignment".to_string());
            }
        }

        if ctx
            .snapshot
            .volatility_index
            .is_some_and(|v| v >= self.config.vix_elevated_level)
        {
            factors.push("vix_elevated".to_string());
        }

        // Close near the extreme of the bar
        let range = tick.high - tick.low;
        if !range.is_zero() {
            let position = (tick.last_price - tick.low) / range;
            if position >= dec!(0.8) || position <= dec!(0.2) {
                factors.push("close_at_extreme".to_string());
            }
        }

        factors
    }

    fn build(
        &self,
        trigger_type: TriggerType,
        intensity: Decimal,
        factors: &[String],
        ctx: &StrategyContext<'_>,
    ) -> VolatilityTrigger {
        let confidence = dec!(0.5) + dec!(0.1) * Decimal::from(factors.len() as u32);
        VolatilityTrigger::new(
            trigger_type,
            intensity.round_dp(4),
            confidence.min(dec!(0.95)),
            factors.to_vec(),
            ctx.now,
        )
    }
}
