//! Volatility Breakout Strategy
//!
//! Trades in the direction of the latest bar when a volatility trigger
//! fires (spike, cluster, morning explosion or volatility-index surge):
//! - Buys when the triggering bar closed up
//! - Sells when it closed down (if shorting is allowed)
//! - Sizes and holds according to regime, confidence and portfolio stress

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
use crate::volatility::{RegimeThresholds, TriggerConfig, TriggerDetector};

/// Configuration for the volatility breakout generator
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VolatilityBreakoutConfig {
    pub name: String,
    pub symbols: Vec<String>,
    /// Notional of a signal before the position multiplier
    pub base_notional: Decimal,
    pub base_hold_minutes: i64,
    /// Signals scoring below this are not emitted
    pub min_quality: Decimal,
    pub stop_loss_percent: Decimal,
    pub target_percent: Decimal,
    pub allow_short: bool,
    pub history_len: usize,
    pub triggers: TriggerConfig,
    pub regimes: RegimeThresholds,
    pub scoring: ScoringConfig,
}

impl Default for VolatilityBreakoutConfig {
    fn default() -> Self {
        Self {
            name: "vol-breakout".to_string(),
            symbols: Vec::new(),
            base_notional: dec!(10000),
            base_hold_minutes: 60,
            min_quality: dec!(5),
            stop_loss_percent: dec!(0.02),
            target_percent: dec!(0.04),
            allow_short: true,
            history_len: BarHistory::DEFAULT_CAPACITY,
            triggers: TriggerConfig::default(),
            regimes: RegimeThresholds::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

pub struct VolatilityBreakout {
    config: VolatilityBreakoutConfig,
    detector: TriggerDetector,
    histories: HashMap<String, BarHistory>,
}

impl VolatilityBreakout {
    pub fn new(config: VolatilityBreakoutConfig) -> Self {
        let detector = TriggerDetector::new(config.triggers.clone());
        Self {
            config,
            detector,
            histories: HashMap::new(),
        }
    }

    pub fn history(&self, symbol: &str) -> Option<&BarHistory> {
        self.histories.get(symbol)
    }

    fn generate_signal(
        &self,
        tick: &MarketTick,
        prior: &BarHistory,
        ctx: &StrategyContext<'_>,
    ) -> Option<Signal> {
        let trigger = self.detector.detect(tick, prior, ctx)?;

        let side = match prior.last() {
            Some(last) if tick.last_price < last.close => Side::Sell,
            _ => Side::Buy,
        };
        if side == Side::Sell && !self.config.allow_short {
            debug!(
                "[{}] {} trigger on {} ignored, shorting disabled",
                self.config.name,
                trigger.trigger_type.as_str(),
                tick.symbol
            );
            return None;
        }

        // Realized volatility including the triggering bar
        let realized = {
            let mut window = prior.clone();
            window.push(Bar::from(tick));
            window.average_range_ratio().unwrap_or_else(|| tick.range_ratio())
        };
        let regime = self.config.regimes.classify(realized);

        let quality = self.config.scoring.quality_score(&Evidence {
            intensity: trigger.intensity,
            confidence: trigger.confidence,
            factor_count: trigger.supporting_factors.len(),
            minutes_since_open: ctx.minutes_since_open(),
            minutes_to_close: ctx.minutes_to_close(),
            regime,
        });
        if quality < self.config.min_quality {
            debug!(
                "[{}] {} quality {} below {}",
                self.config.name, tick.symbol, quality, self.config.min_quality
            );
            return None;
        }

        let multiplier =
            scoring::position_multiplier(regime, trigger.confidence, ctx.portfolio_stress);
        let quantity = (self.config.base_notional * multiplier / tick.last_price).floor();
        if quantity <= Decimal::ZERO {
            return None;
        }
        let hold = scoring::time_stop(
            self.config.base_hold_minutes,
            regime,
            Some(trigger.trigger_type),
        );

        info!(
            "[{}] {} {} signal: trigger={} intensity={} regime={} quality={}",
            self.config.name,
            side,
            tick.symbol,
            trigger.trigger_type.as_str(),
            trigger.intensity,
            regime.as_str(),
            quality
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
                trigger_type: Some(trigger.trigger_type),
                intensity: trigger.intensity,
                confidence: trigger.confidence,
                supporting_factors: trigger.supporting_factors,
                volatility: Some(realized),
                position_multiplier: multiplier,
                leg: None,
            }),
        )
    }
}

impl SignalGenerator for VolatilityBreakout {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn symbols(&self) -> &[String] {
        &self.config.symbols
    }

    fn evaluate(&mut self, tick: &MarketTick, ctx: &StrategyContext<'_>) -> Result<Vec<Signal>> {
        validate_tick(tick)?;

        let capacity = self.config.history_len;
        let prior = self
            .histories
            .remove(&tick.symbol)
            .unwrap_or_else(|| BarHistory::new(capacity));

        // A re-delivered tick is not a new bar
        let signal = match prior.last() {
            Some(last) if last.timestamp >= tick.timestamp => None,
            _ => self.generate_signal(tick, &prior, ctx),
        };

        let mut history = prior;
        history.push(Bar::from(tick));
        self.histories.insert(tick.symbol.clone(), history);

        Ok(signal.into_iter().collect())
    }
}
