//! Signal generator trait and evaluation context

use aegis_core::{MarketSnapshot, MarketTick, Signal, Timestamp, TradingSession};
use rust_decimal::Decimal;

use crate::error::{Result, StrategyError};

/// Read-only view handed to generators on each evaluation
pub struct StrategyContext<'a> {
    pub now: Timestamp,
    /// All symbols, for strategies that price other instruments
    pub snapshot: &'a MarketSnapshot,
    /// Volatility index reading from the previous cycle
    pub previous_volatility_index: Option<Decimal>,
    /// Normalised drawdown in [0, 1]; 0 = no stress
    pub portfolio_stress: Decimal,
    pub session: &'a TradingSession,
}

impl StrategyContext<'_> {
    pub fn minutes_since_open(&self) -> i64 {
        self.session.minutes_since_open(self.now)
    }

    pub fn minutes_to_close(&self) -> i64 {
        self.session.minutes_to_close(self.now)
    }

    pub fn tick(&self, symbol: &str) -> Option<&MarketTick> {
        self.snapshot.tick(symbol)
    }
}

/// Strategy capability - implement this for each signal source
///
/// `evaluate` sees one symbol's latest tick at a time and may keep its own
/// bounded rolling state. A failing evaluation only costs this generator its
/// signals for the cycle.
pub trait SignalGenerator: Send {
    /// Strategy name; becomes `Signal::strategy_name`
    fn name(&self) -> &str;

    /// Symbols this generator wants ticks for
    fn symbols(&self) -> &[String];

    fn evaluate(&mut self, tick: &MarketTick, ctx: &StrategyContext<'_>) -> Result<Vec<Signal>>;
}

/// Reject ticks no generator should reason about
pub(crate) fn validate_tick(tick: &MarketTick) -> Result<()> {
    let reason = if tick.last_price <= Decimal::ZERO {
        "non-positive price"
    } else if tick.high < tick.low {
        "high below low"
    } else {
        return Ok(());
    };

    Err(StrategyError::InvalidTick {
        symbol: tick.symbol.clone(),
        reason: reason.to_string(),
    })
}
