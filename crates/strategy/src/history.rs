//! Rolling bar history

use std::collections::VecDeque;

use aegis_core::{MarketTick, Timestamp};
use rust_decimal::Decimal;

/// One observed bar
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: Decimal,
    pub timestamp: Timestamp,
}

impl Bar {
    pub fn range_ratio(&self) -> Decimal {
        if self.close.is_zero() {
            Decimal::ZERO
        } else {
            (self.high - self.low).abs() / self.close
        }
    }
}

impl From<&MarketTick> for Bar {
    fn from(tick: &MarketTick) -> Self {
        Self {
            close: tick.last_price,
            high: tick.high,
            low: tick.low,
            volume: tick.volume,
            timestamp: tick.timestamp,
        }
    }
}

/// Bounded window of recent bars, oldest first
#[derive(Debug, Clone)]
pub struct BarHistory {
    bars: VecDeque<Bar>,
    capacity: usize,
}

impl BarHistory {
    pub const DEFAULT_CAPACITY: usize = 20;

    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            bars: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a bar; a tick with the same timestamp as the last bar replaces it
    pub fn push(&mut self, bar: Bar) {
        if self.bars.back().is_some_and(|b| b.timestamp == bar.timestamp) {
            self.bars.pop_back();
        }
        if self.bars.len() == self.capacity {
            self.bars.pop_front();
        }
        self.bars.push_back(bar);
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.back()
    }

    /// The `n` most recent bars, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Bar> {
        self.bars.iter().skip(self.bars.len().saturating_sub(n))
    }

    fn mean(values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
        let (sum, count) = values.fold((Decimal::ZERO, 0u32), |(s, c), v| (s + v, c + 1));
        (count > 0).then(|| sum / Decimal::from(count))
    }

    pub fn mean_close(&self) -> Option<Decimal> {
        Self::mean(self.bars.iter().map(|b| b.close))
    }

    /// Average bar range relative to close: the realized volatility proxy
    pub fn average_range_ratio(&self) -> Option<Decimal> {
        Self::mean(self.bars.iter().map(Bar::range_ratio))
    }

    pub fn average_volume(&self) -> Option<Decimal> {
        Self::mean(self.bars.iter().map(|b| b.volume))
    }
}

impl Default for BarHistory {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
