//! Straddle Strategy
//!
//! Buys a call and a put together when a volatility trigger fires on the
//! underlying. The two legs are emitted as linked signals sharing a group
//! id, so downstream they are admitted, stopped and closed as one position.

use std::collections::HashMap;

use aegis_core::{LegLink, MarketTick, Side, Signal, SignalMetadata};
use chrono::Duration;
use log::{debug, info};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Result, StrategyError};
use crate::history::{Bar, BarHistory};
use crate::scoring::{self, Evidence, ScoringConfig};
use crate::strategy::{SignalGenerator, StrategyContext, validate_tick};
use crate::volatility::{RegimeThresholds, TriggerConfig, TriggerDetector};

/// Option contracts traded against one underlying
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StraddleLegs {
    pub underlying: String,
    pub call: String,
    pub put: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StraddleConfig {
    pub name: String,
    pub legs: Vec<StraddleLegs>,
    /// Combined premium budget for both legs before the multiplier
    pub base_notional: Decimal,
    pub base_hold_minutes: i64,
    pub min_quality: Decimal,
    /// Stop and target apply to the combined P&L of the pair
    pub stop_loss_percent: Decimal,
    pub target_percent: Decimal,
    /// Leg quotes older than this are not traded
    pub max_quote_age_secs: i64,
    pub history_len: usize,
    pub triggers: TriggerConfig,
    pub regimes: RegimeThresholds,
    pub scoring: ScoringConfig,
}

impl Default for StraddleConfig {
    fn default() -> Self {
        Self {
            name: "straddle".to_string(),
            legs: Vec::new(),
            base_notional: dec!(6000),
            base_hold_minutes: 90,
            min_quality: dec!(6),
            stop_loss_percent: dec!(0.25),
            target_percent: dec!(0.40),
            max_quote_age_secs: 30,
            history_len: BarHistory::DEFAULT_CAPACITY,
            triggers: TriggerConfig::default(),
            regimes: RegimeThresholds::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

pub struct Straddle {
    config: StraddleConfig,
    underlyings: Vec<String>,
    detector: TriggerDetector,
    histories: HashMap<String, BarHistory>,
}

impl Straddle {
    pub fn new(config: StraddleConfig) -> Result<Self> {
        for legs in &config.legs {
            if legs.call == legs.put || legs.call.is_empty() || legs.put.is_empty() {
                return Err(StrategyError::InvalidConfig {
                    name: config.name.clone(),
                    reason: format!("bad legs for {}", legs.underlying),
                });
            }
        }

        let underlyings = config.legs.iter().map(|l| l.underlying.clone()).collect();
        let detector = TriggerDetector::new(config.triggers.clone());
        Ok(Self {
            config,
            underlyings,
            detector,
            histories: HashMap::new(),
        })
    }

    fn legs_for(&self, underlying: &str) -> Option<&StraddleLegs> {
        self.config.legs.iter().find(|l| l.underlying == underlying)
    }

    fn generate_signals(
        &self,
        tick: &MarketTick,
        prior: &BarHistory,
        ctx: &StrategyContext<'_>,
    ) -> Vec<Signal> {
        let Some(legs) = self.legs_for(&tick.symbol) else {
            return Vec::new();
        };
        let Some(trigger) = self.detector.detect(tick, prior, ctx) else {
            return Vec::new();
        };

        let max_age = Duration::seconds(self.config.max_quote_age_secs);
        let quote = |symbol: &str| {
            ctx.tick(symbol)
                .filter(|t| !t.is_stale(ctx.now, max_age) && t.last_price > Decimal::ZERO)
        };
        let (Some(call), Some(put)) = (quote(&legs.call), quote(&legs.put)) else {
            debug!(
                "[{}] {} triggered but leg quotes unavailable",
                self.config.name, tick.symbol
            );
            return Vec::new();
        };

        let mut window = prior.clone();
        window.push(Bar::from(tick));
        let realized = window
            .average_range_ratio()
            .unwrap_or_else(|| tick.range_ratio());
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
            return Vec::new();
        }

        let multiplier =
            scoring::position_multiplier(regime, trigger.confidence, ctx.portfolio_stress);
        // Same contract count on both legs keeps the pair delta-neutral-ish
        let pair_premium = call.last_price + put.last_price;
        let contracts = (self.config.base_notional * multiplier / pair_premium).floor();
        if contracts <= Decimal::ZERO {
            return Vec::new();
        }
        let hold = scoring::time_stop(
            self.config.base_hold_minutes,
            regime,
            Some(trigger.trigger_type),
        );

        let group_id = Uuid::new_v4().to_string();
        info!(
            "[{}] straddle on {}: {} + {} x{} group={} quality={}",
            self.config.name, tick.symbol, call.symbol, put.symbol, contracts, group_id, quality
        );

        [call, put]
            .iter()
            .enumerate()
            .map(|(i, leg)| {
                let partner = if i == 0 { &put.symbol } else { &call.symbol };
                Signal::new(
                    &self.config.name,
                    &leg.symbol,
                    Side::Buy,
                    contracts,
                    leg.last_price,
                    ctx.now,
                    ctx.now + hold,
                )
                .with_quality(quality)
                .with_exits(self.config.stop_loss_percent, self.config.target_percent)
                .with_metadata(SignalMetadata {
                    trigger_type: Some(trigger.trigger_type),
                    intensity: trigger.intensity,
                    confidence: trigger.confidence,
                    supporting_factors: trigger.supporting_factors.clone(),
                    volatility: Some(realized),
                    position_multiplier: multiplier,
                    leg: Some(LegLink {
                        group_id: group_id.clone(),
                        leg_index: i,
                        leg_count: 2,
                        partner_symbols: vec![partner.clone()],
                    }),
                })
            })
            .collect()
    }
}

impl SignalGenerator for Straddle {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn symbols(&self) -> &[String] {
        &self.underlyings
    }

    fn evaluate(&mut self, tick: &MarketTick, ctx: &StrategyContext<'_>) -> Result<Vec<Signal>> {
        validate_tick(tick)?;

        let capacity = self.config.history_len;
        let mut history = self
            .histories
            .remove(&tick.symbol)
            .unwrap_or_else(|| BarHistory::new(capacity));

        let fresh = history
            .last()
            .is_none_or(|last| last.timestamp < tick.timestamp);
        let signals = if fresh {
            self.generate_signals(tick, &history, ctx)
        } else {
            Vec::new()
        };

        history.push(Bar::from(tick));
        self.histories.insert(tick.symbol.clone(), history);
        Ok(signals)
    }
}
