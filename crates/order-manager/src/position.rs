//! Position Book
//!
//! Positions are tracked per (strategy, symbol) so P&L and released
//! capital are attributed to the strategy that opened them. Flat positions
//! stay in the book to keep their realized P&L.

use std::collections::HashMap;

use aegis_core::{ExitPlan, FillEffect, Position, Side, Timestamp};
use dashmap::DashMap;
use rust_decimal::Decimal;

pub type PositionKey = (String, String);

#[derive(Default)]
pub struct PositionBook {
    positions: DashMap<PositionKey, Position>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(strategy: &str, symbol: &str) -> PositionKey {
        (strategy.to_string(), symbol.to_string())
    }

    /// Apply a fill, opening the position (with its exit plan) if flat
    pub fn apply_fill(
        &self,
        strategy: &str,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        exit_plan: Option<&ExitPlan>,
        now: Timestamp,
    ) -> (FillEffect, Position) {
        let mut entry = self
            .positions
            .entry(Self::key(strategy, symbol))
            .or_insert_with(|| Position::flat(strategy, symbol, now));

        let was_flat = entry.is_flat();
        let effect = entry.apply_fill(side, quantity, price);

        if entry.is_flat() {
            entry.closing = false;
            entry.time_stop = None;
            entry.leg_group = None;
        } else if let Some(plan) = exit_plan
            && effect.added_cost > Decimal::ZERO
        {
            if was_flat || effect.reduced_quantity > Decimal::ZERO {
                entry.opened_at = now;
            }
            entry.stop_loss_percent = plan.stop_loss_percent;
            entry.target_percent = plan.target_percent;
            entry.time_stop = Some(plan.time_stop);
            entry.leg_group = plan.leg_group.clone();
        }

        (effect, entry.clone())
    }

    /// Price-only update for every strategy holding `symbol`
    pub fn mark(&self, symbol: &str, price: Decimal) -> Vec<Position> {
        let mut marked = Vec::new();
        for mut entry in self.positions.iter_mut() {
            if entry.key().1 == symbol && !entry.is_flat() {
                entry.mark(price);
                marked.push(entry.clone());
            }
        }
        marked
    }

    pub fn set_closing(&self, strategy: &str, symbol: &str, closing: bool) -> Option<Position> {
        self.positions
            .get_mut(&Self::key(strategy, symbol))
            .map(|mut p| {
                p.closing = closing;
                p.clone()
            })
    }

    pub fn get(&self, strategy: &str, symbol: &str) -> Option<Position> {
        self.positions
            .get(&Self::key(strategy, symbol))
            .map(|p| p.clone())
    }

    pub fn insert(&self, position: Position) {
        let key = Self::key(&position.strategy_owner, &position.symbol);
        self.positions.insert(key, position);
    }

    pub fn all(&self) -> Vec<Position> {
        let mut all: Vec<_> = self.positions.iter().map(|p| p.value().clone()).collect();
        all.sort_by(|a, b| {
            (&a.strategy_owner, &a.symbol).cmp(&(&b.strategy_owner, &b.symbol))
        });
        all
    }

    pub fn open(&self) -> Vec<Position> {
        self.all().into_iter().filter(|p| !p.is_flat()).collect()
    }

    /// Absolute market value per symbol across strategies
    pub fn exposures(&self) -> HashMap<String, Decimal> {
        let mut out: HashMap<String, Decimal> = HashMap::new();
        for p in self.positions.iter().filter(|p| !p.is_flat()) {
            *out.entry(p.symbol.clone()).or_insert(Decimal::ZERO) += p.exposure();
        }
        out
    }

    /// Realized plus unrealized P&L over the whole book
    pub fn total_pnl(&self) -> Decimal {
        self.positions
            .iter()
            .map(|p| p.realized_pnl + p.unrealized_pnl)
            .sum()
    }

    /// Realized plus unrealized P&L on one symbol across strategies
    pub fn symbol_pnl(&self, symbol: &str) -> Decimal {
        self.positions
            .iter()
            .filter(|p| p.key().1 == symbol)
            .map(|p| p.realized_pnl + p.unrealized_pnl)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
