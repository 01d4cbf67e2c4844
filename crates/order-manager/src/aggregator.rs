//! Signal Aggregation
//!
//! Merges one cycle's candidates from every generator into a bounded,
//! ranked, de-duplicated batch. This is the anti-flood layer: whatever the
//! generators emit during a burst, at most `max_signals_per_cycle` signals
//! reach admission.
//!
//! ## Ranking
//!
//! ```text
//! rank = quality
//!      + intensity_weight  × min(intensity − 1, intensity_cap)
//!      + factor_weight     × supporting factors
//!      + confidence_weight × confidence
//!      − extreme_penalty   (if volatility ≥ extreme_volatility)
//! ```
//!
//! Ties go to the earliest `time_stop`. Linked legs rank, pass and drop
//! as one unit.
//!
//! ## Windows
//!
//! - **Global cooldown**: minimum gap between any two emissions system-wide;
//!   a linked-leg unit counts as one emission
//! - **Symbol cooldown**: minimum gap between emissions on one symbol
//! - **Dedup window**: one emission per (symbol, side, strategy)
//! - **Daily cap**: emissions per strategy per trading day

use std::collections::HashMap;

use aegis_core::{Side, Signal, Timestamp, TradingSession};
use chrono::Duration;
use log::{debug, info};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Configuration for signal aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub global_cooldown_ms: i64,
    pub symbol_cooldown_secs: i64,
    pub dedup_window_secs: i64,
    pub max_signals_per_cycle: usize,
    pub max_daily_signals_per_strategy: u32,
    pub intensity_weight: Decimal,
    pub intensity_cap: Decimal,
    pub factor_weight: Decimal,
    pub confidence_weight: Decimal,
    pub extreme_volatility: Decimal,
    pub extreme_penalty: Decimal,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            global_cooldown_ms: 1_000,
            symbol_cooldown_secs: 300,
            dedup_window_secs: 900,
            max_signals_per_cycle: 5,
            max_daily_signals_per_strategy: 20,
            intensity_weight: dec!(0.5),
            intensity_cap: dec!(3),
            factor_weight: dec!(0.25),
            confidence_weight: dec!(1),
            extreme_volatility: dec!(0.03),
            extreme_penalty: dec!(2),
        }
    }
}

/// Why a candidate never left the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DropReason {
    Invalid,
    Expired,
    LegIncomplete,
    GlobalCooldown,
    SymbolCooldown,
    Duplicate,
    DailyLimit,
    CycleCap,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::Invalid => "INVALID",
            DropReason::Expired => "EXPIRED",
            DropReason::LegIncomplete => "LEG_INCOMPLETE",
            DropReason::GlobalCooldown => "GLOBAL_COOLDOWN",
            DropReason::SymbolCooldown => "SYMBOL_COOLDOWN",
            DropReason::Duplicate => "DUPLICATE",
            DropReason::DailyLimit => "DAILY_LIMIT",
            DropReason::CycleCap => "CYCLE_CAP",
        }
    }
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DroppedSignal {
    pub signal: Signal,
    pub reason: DropReason,
}

/// Result of one aggregation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationOutcome {
    /// Rank order; legs of one group are adjacent
    pub emitted: Vec<Signal>,
    pub dropped: Vec<DroppedSignal>,
}

/// One or more signals that rank and pass together
struct Unit {
    signals: Vec<Signal>,
    rank: Decimal,
    earliest_stop: Timestamp,
}

type DedupKey = (String, Side, String);

/// Cross-cycle cooldown, dedup and daily-count state
pub struct SignalAggregator {
    config: AggregatorConfig,
    session: TradingSession,
    last_emission: Option<Timestamp>,
    symbol_emissions: HashMap<String, Timestamp>,
    key_emissions: HashMap<DedupKey, Timestamp>,
    daily_counts: HashMap<String, u32>,
    trading_day: Option<String>,
}

impl SignalAggregator {
    pub fn new(config: AggregatorConfig, session: TradingSession) -> Self {
        Self {
            config,
            session,
            last_emission: None,
            symbol_emissions: HashMap::new(),
            key_emissions: HashMap::new(),
            daily_counts: HashMap::new(),
            trading_day: None,
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Ranking score for one signal
    pub fn rank_score(&self, signal: &Signal) -> Decimal {
        let meta = &signal.metadata;
        let intensity_bonus = (meta.intensity - Decimal::ONE)
            .clamp(Decimal::ZERO, self.config.intensity_cap)
            * self.config.intensity_weight;
        let factor_bonus =
            Decimal::from(meta.supporting_factors.len() as u64) * self.config.factor_weight;
        let confidence_bonus = meta.confidence * self.config.confidence_weight;
        let penalty = match meta.volatility {
            Some(v) if v >= self.config.extreme_volatility => self.config.extreme_penalty,
            _ => Decimal::ZERO,
        };
        signal.quality_score + intensity_bonus + factor_bonus + confidence_bonus - penalty
    }

    /// Emissions so far today for one strategy
    pub fn daily_count(&self, strategy: &str) -> u32 {
        self.daily_counts.get(strategy).copied().unwrap_or(0)
    }

    pub fn aggregate(&mut self, signals: Vec<Signal>, now: Timestamp) -> AggregationOutcome {
        self.roll_day(now);
        self.prune(now);

        let mut outcome = AggregationOutcome::default();
        let units = self.build_units(signals, now, &mut outcome);

        let symbol_cooldown = Duration::seconds(self.config.symbol_cooldown_secs);
        let dedup_window = Duration::seconds(self.config.dedup_window_secs);

        for unit in units {
            let verdict = self.check_unit(&unit, &outcome, now, symbol_cooldown, dedup_window);
            match verdict {
                Some(reason) => drop_unit(&mut outcome, unit, reason),
                None => {
                    for signal in &unit.signals {
                        self.symbol_emissions.insert(signal.symbol.clone(), now);
                        self.key_emissions.insert(dedup_key(signal), now);
                        *self
                            .daily_counts
                            .entry(signal.strategy_name.clone())
                            .or_insert(0) += 1;
                        debug!(
                            "[AGGREGATOR] EMIT {} {} {} rank {}",
                            signal.strategy_name,
                            signal.side,
                            signal.symbol,
                            unit.rank.round_dp(2)
                        );
                    }
                    self.last_emission = Some(now);
                    outcome.emitted.extend(unit.signals);
                }
            }
        }

        if !outcome.emitted.is_empty() || !outcome.dropped.is_empty() {
            info!(
                "[AGGREGATOR] Cycle: {} emitted, {} dropped",
                outcome.emitted.len(),
                outcome.dropped.len()
            );
        }
        outcome
    }

    /// Group legs, discard invalid/expired, and sort by rank
    fn build_units(
        &self,
        signals: Vec<Signal>,
        now: Timestamp,
        outcome: &mut AggregationOutcome,
    ) -> Vec<Unit> {
        let mut singles = Vec::new();
        let mut groups: HashMap<String, Vec<Signal>> = HashMap::new();

        for signal in signals {
            if !signal.is_valid() {
                drop_one(outcome, signal, DropReason::Invalid);
            } else if signal.is_expired_at(now) {
                drop_one(outcome, signal, DropReason::Expired);
            } else if let Some(group) = signal.leg_group() {
                groups.entry(group.to_string()).or_default().push(signal);
            } else {
                singles.push(vec![signal]);
            }
        }

        let mut units: Vec<Unit> = Vec::new();
        for (_, mut legs) in groups {
            let expected = legs[0].metadata.leg.as_ref().map_or(1, |l| l.leg_count);
            if legs.len() != expected {
                for leg in legs {
                    drop_one(outcome, leg, DropReason::LegIncomplete);
                }
                continue;
            }
            legs.sort_by_key(|s| s.metadata.leg.as_ref().map_or(0, |l| l.leg_index));
            units.push(self.unit(legs));
        }
        units.extend(singles.into_iter().map(|s| self.unit(s)));

        units.sort_by(|a, b| {
            b.rank
                .cmp(&a.rank)
                .then_with(|| a.earliest_stop.cmp(&b.earliest_stop))
                .then_with(|| unit_label(a).cmp(&unit_label(b)))
        });
        units
    }

    fn unit(&self, signals: Vec<Signal>) -> Unit {
        let total: Decimal = signals.iter().map(|s| self.rank_score(s)).sum();
        let rank = total / Decimal::from(signals.len().max(1) as u64);
        let earliest_stop = signals
            .iter()
            .map(|s| s.time_stop)
            .min()
            .unwrap_or(Timestamp::MAX_UTC);
        Unit {
            signals,
            rank,
            earliest_stop,
        }
    }

    fn check_unit(
        &self,
        unit: &Unit,
        outcome: &AggregationOutcome,
        now: Timestamp,
        symbol_cooldown: Duration,
        dedup_window: Duration,
    ) -> Option<DropReason> {
        if outcome.emitted.len() + unit.signals.len() > self.config.max_signals_per_cycle {
            return Some(DropReason::CycleCap);
        }

        let mut per_strategy: HashMap<&str, u32> = HashMap::new();
        for signal in &unit.signals {
            *per_strategy.entry(signal.strategy_name.as_str()).or_insert(0) += 1;
        }
        for (strategy, n) in per_strategy {
            if self.daily_count(strategy) + n > self.config.max_daily_signals_per_strategy {
                return Some(DropReason::DailyLimit);
            }
        }

        for signal in &unit.signals {
            if let Some(at) = self.key_emissions.get(&dedup_key(signal))
                && now - *at < dedup_window
            {
                return Some(DropReason::Duplicate);
            }
            if let Some(at) = self.symbol_emissions.get(&signal.symbol)
                && now - *at < symbol_cooldown
            {
                return Some(DropReason::SymbolCooldown);
            }
        }

        let global_cooldown = Duration::milliseconds(self.config.global_cooldown_ms);
        if let Some(last) = self.last_emission
            && self.config.global_cooldown_ms > 0
            && now - last < global_cooldown
        {
            return Some(DropReason::GlobalCooldown);
        }
        None
    }

    fn roll_day(&mut self, now: Timestamp) {
        let day = self.session.trading_day(now);
        if self.trading_day.as_deref() != Some(day.as_str()) {
            if self.trading_day.is_some() {
                info!("[AGGREGATOR] New trading day {}, daily counts reset", day);
            }
            self.daily_counts.clear();
            self.trading_day = Some(day);
        }
    }

    fn prune(&mut self, now: Timestamp) {
        let symbol_cooldown = Duration::seconds(self.config.symbol_cooldown_secs);
        let dedup_window = Duration::seconds(self.config.dedup_window_secs);
        self.symbol_emissions
            .retain(|_, at| now - *at < symbol_cooldown);
        self.key_emissions.retain(|_, at| now - *at < dedup_window);
    }
}

fn dedup_key(signal: &Signal) -> DedupKey {
    (
        signal.symbol.clone(),
        signal.side,
        signal.strategy_name.clone(),
    )
}

fn unit_label(unit: &Unit) -> (&str, &str) {
    unit.signals
        .first()
        .map(|s| (s.strategy_name.as_str(), s.symbol.as_str()))
        .unwrap_or(("", ""))
}

fn drop_one(outcome: &mut AggregationOutcome, signal: Signal, reason: DropReason) {
    info!(
        "[AGGREGATOR] DROP {} {} {} {}",
        signal.strategy_name, signal.side, signal.symbol, reason
    );
    outcome.dropped.push(DroppedSignal { signal, reason });
}

fn drop_unit(outcome: &mut AggregationOutcome, unit: Unit, reason: DropReason) {
    for signal in unit.signals {
        drop_one(outcome, signal, reason);
    }
}
