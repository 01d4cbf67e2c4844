//! Pipeline configuration
//!
//! One JSON document configures every component. All sections are optional
//! and fall back to their defaults; `validate` runs before anything is built.
//!
//! ```json
//! {
//!   "initial_capital": "1000000",
//!   "cycle": { "interval_ms": 1000, "max_tick_age_secs": 120 },
//!   "risk": { "allocator": { "strategies": [{ "name": "vb", "fraction": "0.2" }] } },
//!   "strategies": [{ "kind": "volatility_breakout", "name": "vb", "symbols": ["AAPL"] }],
//!   "store": { "kind": "memory" }
//! }
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use aegis_core::TradingSession;
use aegis_gateway::{PaperBrokerConfig, RandomWalkConfig};
use aegis_order_manager::{AggregatorConfig, OrderManagerConfig};
use aegis_risk_manager::{RiskConfig, StrategyAllocationConfig};
use aegis_strategy::{MeanReversionConfig, StrategyConfig, VolatilityBreakoutConfig};
use log::warn;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Cycle scheduling
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    pub interval_ms: u64,
    /// Deadline for the generator stage; late evaluations are discarded
    pub evaluation_timeout_ms: u64,
    /// Ticks older than this are skipped
    pub max_tick_age_secs: i64,
    /// Concurrent (strategy, symbol) evaluations
    pub max_concurrent_evaluations: usize,
    /// How long shutdown waits for in-flight work
    pub shutdown_grace_ms: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            evaluation_timeout_ms: 5_000,
            max_tick_age_secs: 120,
            max_concurrent_evaluations: 8,
            shutdown_grace_ms: 10_000,
        }
    }
}

/// Shared Low-Latency Store backend
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-process; state is lost on exit
    #[default]
    Memory,
    Redis { url: String },
}

/// In-process broker, feed and session used by the binary
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    pub broker: PaperBrokerConfig,
    pub feed: RandomWalkConfig,
    pub session_token: String,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            broker: PaperBrokerConfig::default(),
            feed: RandomWalkConfig::default(),
            session_token: "paper".to_string(),
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub initial_capital: Decimal,
    pub session: TradingSession,
    pub cycle: CycleConfig,
    pub risk: RiskConfig,
    pub aggregator: AggregatorConfig,
    pub orders: OrderManagerConfig,
    pub strategies: Vec<StrategyConfig>,
    pub store: StoreConfig,
    pub paper: PaperConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(1_000_000),
            session: TradingSession::default(),
            cycle: CycleConfig::default(),
            risk: RiskConfig::default(),
            aggregator: AggregatorConfig::default(),
            orders: OrderManagerConfig::default(),
            strategies: Vec::new(),
            store: StoreConfig::default(),
            paper: PaperConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Runnable paper setup: breakout on AAPL and MSFT, mean reversion on MSFT
    pub fn paper() -> Self {
        let allocation = |name: &str, base: Decimal| StrategyAllocationConfig {
            name: name.to_string(),
            fraction: dec!(0.3),
            base_size_fraction: base,
            max_position_fraction: dec!(0.5),
        };

        let mut config = Self::default();
        config.risk.allocator.strategies = vec![
            allocation("vol-breakout", dec!(0.3)),
            allocation("mean-reversion", dec!(0.25)),
        ];
        config.strategies = vec![
            StrategyConfig::VolatilityBreakout(VolatilityBreakoutConfig {
                name: "vol-breakout".into(),
                symbols: vec!["AAPL".into(), "MSFT".into()],
                ..Default::default()
            }),
            StrategyConfig::MeanReversion(MeanReversionConfig {
                name: "mean-reversion".into(),
                symbols: vec!["MSFT".into()],
                ..Default::default()
            }),
        ];
        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(Error::Config(format!(
                "initial_capital {} must be positive",
                self.initial_capital
            )));
        }
        if self.session.open >= self.session.close {
            return Err(Error::Config("session open must precede close".into()));
        }

        let cycle = &self.cycle;
        if cycle.interval_ms == 0
            || cycle.evaluation_timeout_ms == 0
            || cycle.max_tick_age_secs <= 0
            || cycle.max_concurrent_evaluations == 0
        {
            return Err(Error::Config("cycle settings must be positive".into()));
        }

        self.risk.validate()?;

        if self.strategies.is_empty() {
            return Err(Error::Config("no strategies configured".into()));
        }

        let mut names = BTreeSet::new();
        for strategy in &self.strategies {
            let name = strategy.name();
            if !names.insert(name) {
                return Err(Error::Config(format!("duplicate strategy '{}'", name)));
            }
            if strategy.required_symbols().is_empty() {
                return Err(Error::Config(format!("strategy '{}' has no symbols", name)));
            }
            if !self
                .risk
                .allocator
                .strategies
                .iter()
                .any(|a| a.name == name)
            {
                return Err(Error::Config(format!(
                    "strategy '{}' has no capital allocation",
                    name
                )));
            }
        }

        for allocation in &self.risk.allocator.strategies {
            if !names.contains(allocation.name.as_str()) {
                warn!(
                    "[CONFIG] Allocation for '{}' has no configured strategy",
                    allocation.name
                );
            }
        }

        if let StoreConfig::Redis { url } = &self.store
            && url.is_empty()
        {
            return Err(Error::Config("redis store needs a url".into()));
        }
        Ok(())
    }

    /// Every symbol any strategy needs, sorted
    pub fn symbols(&self) -> Vec<String> {
        self.strategies
            .iter()
            .flat_map(|s| s.required_symbols())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
