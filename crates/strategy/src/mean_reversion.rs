//! Mean Reversion Strategy
//!
//! Fades stretched moves away from the rolling mean:
//! - Buys when price is below the rolling mean by more than the entry threshold
//! - Sells when price is above it (expects price to fall back)
//! - Stands aside in extreme volatility, where stretches tend to keep going

use std::collections::HashMap;

use aegis_core::{MarketTick, Side, Signal, SignalMetadata};
use log::{debug, info};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::error::Result;
use crate::history::{Bar, BarHistory};
use crate::scoring::{self, Evidence, ScoringConfig};
use crate::strategy::{SignalGenerator, StrategyContext, validate_tick};
use crate::volatility::{RegimeThresholds, VolatilityRegime};

/// Configuration for mean reversion
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MeanReversionConfig {
    pub name: String,
    pub symbols: Vec<String>,
    /// Bars in the rolling mean (also the minimum history)
    pub lookback: usize,
    /// Threshold deviation to enter (in basis points)
    /// e.g., 50 = enter when price is 0.5% away from the mean
    pub entry_threshold_bps: Decimal,
    pub base_notional: Decimal,
    pub base_hold_minutes: i64,
    pub min_quality: Decimal,
    pub stop_loss_percent: Decimal,
    pub target_percent: Decimal,
    pub regimes: RegimeThresholds,
    pub scoring: ScoringConfig,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            name: "mean-reversion".to_string(),
            symbols: Vec::new(),
            lookback: BarHistory::DEFAULT_CAPACITY,
            entry_threshold_bps: dec!(50), // 0.5% deviation to enter
            base_notional: dec!(8000),
            base_hold_minutes: 30,
            min_quality: dec!(5),
            stop_loss_percent: dec!(0.015),
            target_percent: dec!(0.01),
            regimes: RegimeThresholds::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

pub struct MeanReversion {
    config: MeanReversionConfig,
    histories: HashMap<String, BarHistory>,
}

impl MeanReversion {
    pub fn new(config: MeanReversionConfig) -> Self {
        Self {
            config,
            histories: HashMap::new(),
        }
    }

    /// Deviation of price from the rolling mean in basis points
    fn calculate_deviation(price: Decimal, history: &BarHistory) -> Option<Decimal> {
        let mean = history.mean_close()?;
        if mean.is_zero() {
            return None;
        }
        // Deviation = (price - mean) / mean * 10000
        Some((price - mean) / mean * dec!(10000))
    }

    fn generate_signal(
        &self,
        tick: &MarketTick,
        prior: &BarHistory,
        ctx: &StrategyContext<'_>,
    ) -> Option<Signal> {
        if prior.len() < self.config.lookback {
            return None;
        }
        let deviation_bps = Self::calculate_deviation(tick.last_price, prior)?;
        let threshold = self.config.entry_threshold_bps;
        if deviation_bps.abs() <= threshold {
            return None;
        }

        let realized = prior
            .average_range_ratio()
            .unwrap_or_else(|| tick.range_ratio());
        let regime = self.config.regimes.classify(realized);
        if regime == VolatilityRegime::Extreme {
            debug!(
                "[{}] {} stretched {:.1}bps but regime is extreme",
                self.config.name, tick.symbol, deviation_bps
            );
            return None;
        }

        // Market ABOVE the mean -> SELL, BELOW -> BUY
        let side = if deviation_bps > Decimal::ZERO {
            Side::Sell
        } else {
            Side::Buy
        };

        let stretch = deviation_bps.abs() / threshold;
        let confidence = (dec!(0.4) + dec!(0.1) * stretch).min(dec!(0.9));
        let factors = vec![format!("deviation_bps={}", deviation_bps.round_dp(1))];

        let quality = self.config.scoring.quality_score(&Evidence {
            intensity: stretch,
            confidence,
            factor_count: factors.len(),
            minutes_since_open: ctx.minutes_since_open(),
            minutes_to_close: ctx.minutes_to_close(),
            regime,
        });
        if quality < self.config.min_quality {
            return None;
        }

        let multiplier = scoring::position_multiplier(regime, confidence, ctx.portfolio_stress);
        let quantity = (self.config.base_notional * multiplier / tick.last_price).floor();
        if quantity <= Decimal::ZERO {
            return None;
        }
        let hold = scoring::time_stop(self.config.base_hold_minutes, regime, None);

        info!(
            "[{}] {} signal: deviation={:.2}bps, price={}, quality={}",
            self.config.name, side, deviation_bps, tick.last_price, quality
        );

        Some(
            Signal::new(
                &self.config.name,
                &tick.symbol,
                side,
                quantity,
                tick.last_price,
                ctx.now,
                ctx.now + hold,
            )
            .with_quality(quality)
            .with_exits(self.config.stop_loss_percent, self.config.target_percent)
            .with_metadata(SignalMetadata {
                trigger_type: None,
                intensity: stretch.max(Decimal::ONE),
                confidence,
                supporting_factors: factors,
                volatility: Some(realized),
                position_multiplier: multiplier,
                leg: None,
            }),
        )
    }
}

impl SignalGenerator for MeanReversion {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn symbols(&self) -> &[String] {
        &self.config.symbols
    }

    fn evaluate(&mut self, tick: &MarketTick, ctx: &StrategyContext<'_>) -> Result<Vec<Signal>> {
        validate_tick(tick)?;

        let capacity = self.config.lookback.max(1);
        let mut history = self
            .histories
            .remove(&tick.symbol)
            .unwrap_or_else(|| BarHistory::new(capacity));

        let fresh = history
            .last()
            .is_none_or(|last| last.timestamp < tick.timestamp);
        let signal = if fresh {
            self.generate_signal(tick, &history, ctx)
        } else {
            None
        };

        history.push(Bar::from(tick));
        self.histories.insert(tick.symbol.clone(), history);

        Ok(signal.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::{MarketSnapshot, TradingSession};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 8, h + 5, m, 0).unwrap()
    }

    fn run(strategy: &mut MeanReversion, prices: &[Decimal], end: DateTime<Utc>) -> Vec<Signal> {
        let session = TradingSession::default();
        let snapshot = MarketSnapshot::empty(end);
        let mut out = Vec::new();
        let n = prices.len() as i64;

        for (i, price) in prices.iter().enumerate() {
            let t = end - Duration::minutes(n - 1 - i as i64);
            let ctx = StrategyContext {
                now: t,
                snapshot: &snapshot,
                previous_volatility_index: None,
                portfolio_stress: Decimal::ZERO,
                session: &session,
            };
            let tick = MarketTick::new(
                "MSFT",
                *price,
                *price + dec!(0.2),
                *price - dec!(0.2),
                dec!(500),
                t,
            );
            out.extend(strategy.evaluate(&tick, &ctx).unwrap());
        }
        out
    }

    fn strategy() -> MeanReversion {
        MeanReversion::new(MeanReversionConfig {
            symbols: vec!["MSFT".to_string()],
            lookback: 5,
            ..Default::default()
        })
    }

    #[test]
    fn test_config_defaults() {
        let config = MeanReversionConfig::default();
        assert_eq!(config.entry_threshold_bps, dec!(50));
        assert_eq!(config.lookback, 20);
    }

    #[test]
    fn test_no_signal_without_history() {
        let mut strategy = strategy();
        let signals = run(&mut strategy, &[dec!(100), dec!(90)], at(12, 0));
        assert!(signals.is_empty(), "Should not signal before the window fills");
    }

    #[test]
    fn test_buy_signal_when_below_mean() {
        let mut strategy = strategy();
        // Mean 100, last print 1% below
        let prices = [dec!(100), dec!(100), dec!(100), dec!(100), dec!(100), dec!(99)];
        let signals = run(&mut strategy, &prices, at(12, 0));

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].side, Side::Buy);
        assert!(signals[0].quantity > Decimal::ZERO);
        assert!(signals[0].metadata.trigger_type.is_none());
    }

    #[test]
    fn test_sell_signal_when_above_mean() {
        let mut strategy = strategy();
        let prices = [dec!(100), dec!(100), dec!(100), dec!(100), dec!(100), dec!(101)];
        let signals = run(&mut strategy, &prices, at(12, 0));

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].side, Side::Sell);
    }

    #[test]
    fn test_within_threshold_no_signal() {
        let mut strategy = strategy();
        let prices = [dec!(100), dec!(100), dec!(100), dec!(100), dec!(100), dec!(100.3)];
        assert!(run(&mut strategy, &prices, at(12, 0)).is_empty());
    }
}
