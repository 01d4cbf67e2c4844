//! Paper market data feeds

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use aegis_core::{MarketSnapshot, MarketTick, Timestamp};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal_macros::dec;
use serde::Deserialize;

use super::lock;
use crate::error::{GatewayError, Result};
use crate::feed::MarketDataFeed;

/// Feed whose ticks are set by hand
///
/// Test fixture: ticks keep whatever timestamp they were given, so
/// staleness can be staged.
#[derive(Debug)]
pub struct StaticFeed {
    ticks: RwLock<HashMap<String, MarketTick>>,
    volatility_index: RwLock<Option<Decimal>>,
    connected: AtomicBool,
}

impl StaticFeed {
    pub fn new() -> Self {
        Self {
            ticks: RwLock::new(HashMap::new()),
            volatility_index: RwLock::new(None),
            connected: AtomicBool::new(true),
        }
    }

    pub fn set_tick(&self, tick: MarketTick) {
        let mut ticks = self
            .ticks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        ticks.insert(tick.symbol.clone(), tick);
    }

    pub fn set_volatility_index(&self, value: Option<Decimal>) {
        let mut vix = self
            .volatility_index
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *vix = value;
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl Default for StaticFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataFeed for StaticFeed {
    async fn snapshot(&self, symbols: &[String], now: Timestamp) -> Result<MarketSnapshot> {
        if !self.is_connected() {
            return Err(GatewayError::MarketData("static feed disconnected".into()));
        }

        let ticks = self
            .ticks
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let volatility_index = *self
            .volatility_index
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        Ok(MarketSnapshot {
            ticks: symbols
                .iter()
                .filter_map(|s| ticks.get(s).map(|t| (s.clone(), t.clone())))
                .collect(),
            volatility_index,
            connected: true,
            taken_at: now,
        })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "StaticFeed"
    }
}

/// Configuration for the random-walk feed
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RandomWalkConfig {
    /// Starting prices per symbol
    pub initial_prices: HashMap<String, Decimal>,
    /// Max relative move per step (0.002 = 0.2%)
    pub step_volatility: Decimal,
    /// Chance per step of a burst several times larger
    pub burst_probability: f64,
    pub initial_volatility_index: Decimal,
    pub seed: Option<u64>,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        let mut initial_prices = HashMap::new();
        initial_prices.insert("AAPL".to_string(), dec!(190));
        initial_prices.insert("MSFT".to_string(), dec!(410));
        initial_prices.insert("SPY".to_string(), dec!(510));

        Self {
            initial_prices,
            step_volatility: dec!(0.002),
            burst_probability: 0.03,
            initial_volatility_index: dec!(16),
            seed: None,
        }
    }
}

struct WalkState {
    rng: StdRng,
    prices: HashMap<String, Decimal>,
    volatility_index: Decimal,
}

/// Seeded random walk, one step per snapshot
pub struct RandomWalkFeed {
    config: RandomWalkConfig,
    state: Mutex<WalkState>,
}

impl RandomWalkFeed {
    pub fn new(config: RandomWalkConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let state = WalkState {
            rng,
            prices: config.initial_prices.clone(),
            volatility_index: config.initial_volatility_index,
        };

        Self {
            config,
            state: Mutex::new(state),
        }
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<_> = self.config.initial_prices.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    fn step(&self, symbols: &[String], now: Timestamp) -> MarketSnapshot {
        let mut state = lock(&self.state);
        let vol = self.config.step_volatility.to_f64().unwrap_or(0.002);
        let mut ticks = HashMap::new();

        for symbol in symbols {
            let Some(current) = state.prices.get(symbol).copied() else {
                continue;
            };

            let burst = if state.rng.r#gen::<f64>() < self.config.burst_probability {
                state.rng.gen_range(3.0..6.0)
            } else {
                1.0
            };
            let change: f64 = state.rng.gen_range(-1.0..1.0) * vol * burst;
            let wick: f64 = state.rng.gen_range(0.0..1.0) * vol * burst;

            let next = current * Decimal::from_f64(1.0 + change).unwrap_or(Decimal::ONE);
            let wick = Decimal::from_f64(wick).unwrap_or(Decimal::ZERO);
            let high = current.max(next) * (Decimal::ONE + wick);
            let low = current.min(next) * (Decimal::ONE - wick);
            let volume = Decimal::from(state.rng.gen_range(1_000u32..50_000u32))
                * Decimal::from_f64(burst).unwrap_or(Decimal::ONE);

            state.prices.insert(symbol.clone(), next);
            ticks.insert(
                symbol.clone(),
                MarketTick::new(
                    symbol.clone(),
                    next.round_dp(4),
                    high.round_dp(4),
                    low.round_dp(4),
                    volume.round_dp(0),
                    now,
                ),
            );
        }

        let vix_move: f64 = state.rng.gen_range(-0.03..0.03);
        let vix = state.volatility_index * Decimal::from_f64(1.0 + vix_move).unwrap_or(Decimal::ONE);
        state.volatility_index = vix.max(dec!(9)).round_dp(2);

        MarketSnapshot {
            ticks,
            volatility_index: Some(state.volatility_index),
            connected: true,
            taken_at: now,
        }
    }
}

#[async_trait]
impl MarketDataFeed for RandomWalkFeed {
    async fn snapshot(&self, symbols: &[String], now: Timestamp) -> Result<MarketSnapshot> {
        Ok(self.step(symbols, now))
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "RandomWalkFeed"
    }
}
