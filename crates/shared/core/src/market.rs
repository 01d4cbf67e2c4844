//! Market data as seen by the pipeline

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Latest tick/candle for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTick {
    pub symbol: String,
    pub last_price: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl MarketTick {
    pub fn new(
        symbol: impl Into<String>,
        last_price: Decimal,
        high: Decimal,
        low: Decimal,
        volume: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            last_price,
            high,
            low,
            volume,
            timestamp,
        }
    }

    /// Data older than `max_age` must not be acted on
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now - self.timestamp > max_age
    }

    /// Bar range as a fraction of the last price
    pub fn range_ratio(&self) -> Decimal {
        if self.last_price.is_zero() {
            return Decimal::ZERO;
        }
        (self.high - self.low).abs() / self.last_price
    }
}

/// Point-in-time view of all subscribed symbols
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticks: HashMap<String, MarketTick>,
    /// Market-wide volatility index reading (VIX-like), if the feed has one
    pub volatility_index: Option<Decimal>,
    pub connected: bool,
    pub taken_at: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn empty(taken_at: DateTime<Utc>) -> Self {
        Self {
            ticks: HashMap::new(),
            volatility_index: None,
            connected: false,
            taken_at,
        }
    }

    pub fn tick(&self, symbol: &str) -> Option<&MarketTick> {
        self.ticks.get(symbol)
    }

    pub fn price(&self, symbol: &str) -> Option<Decimal> {
        self.ticks.get(symbol).map(|t| t.last_price)
    }

    /// Ticks that are fresh relative to `taken_at`
    pub fn fresh_ticks(&self, max_age: Duration) -> impl Iterator<Item = &MarketTick> {
        self.ticks
            .values()
            .filter(move |t| !t.is_stale(self.taken_at, max_age))
    }
}
