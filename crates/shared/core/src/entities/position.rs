//! Position - net holding per (strategy, symbol)
//!
//! Fills move quantity and average price; market-data refreshes only move
//! `current_price` and `unrealized_pnl`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Side;

/// What a single fill did to a position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillEffect {
    /// P&L locked in by the reducing part of the fill
    pub realized_pnl: Decimal,
    /// Quantity that closed existing exposure
    pub reduced_quantity: Decimal,
    /// Entry cost of the closed quantity (capital to hand back)
    pub released_cost_basis: Decimal,
    /// Cost of the quantity that opened or added exposure
    pub added_cost: Decimal,
}

/// Net holding in one symbol, attributed to one strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Positive = long, negative = short
    pub quantity: Decimal,
    pub average_price: Decimal,
    pub current_price: Decimal,
    pub unrealized_pnl: Decimal,
    pub realized_pnl: Decimal,
    pub strategy_owner: String,
    pub stop_loss_percent: Decimal,
    pub target_percent: Decimal,
    pub time_stop: Option<DateTime<Utc>>,
    /// Linked multi-leg positions share this id
    pub leg_group: Option<String>,
    pub opened_at: DateTime<Utc>,
    /// Set while an exit order is in flight
    #[serde(default)]
    pub closing: bool,
}

impl Position {
    /// Create a flat position
    pub fn flat(
        strategy_owner: impl Into<String>,
        symbol: impl Into<String>,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: Decimal::ZERO,
            average_price: Decimal::ZERO,
            current_price: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            strategy_owner: strategy_owner.into(),
            stop_loss_percent: Decimal::ZERO,
            target_percent: Decimal::ZERO,
            time_stop: None,
            leg_group: None,
            opened_at,
            closing: false,
        }
    }

    /// Apply a fill: weighted average on adds, realized P&L on reductions
    pub fn apply_fill(&mut self, side: Side, quantity: Decimal, price: Decimal) -> FillEffect {
        let signed_qty = side.sign() * quantity;
        let mut effect = FillEffect::default();

        let reducing = (self.quantity > Decimal::ZERO && signed_qty < Decimal::ZERO)
            || (self.quantity < Decimal::ZERO && signed_qty > Decimal::ZERO);

        if reducing {
            let close_qty = quantity.min(self.quantity.abs());
            effect.reduced_quantity = close_qty;
            effect.released_cost_basis = close_qty * self.average_price;
            effect.realized_pnl = if self.quantity > Decimal::ZERO {
                close_qty * (price - self.average_price)
            } else {
                close_qty * (self.average_price - price)
            };
            // Anything past flat opens the other way
            effect.added_cost = (quantity - close_qty) * price;
        } else {
            effect.added_cost = quantity * price;
        }

        let new_quantity = self.quantity + signed_qty;

        if new_quantity.is_zero() {
            self.average_price = Decimal::ZERO;
        } else if !reducing {
            let total_cost = self.quantity.abs() * self.average_price + quantity * price;
            self.average_price = total_cost / new_quantity.abs();
        } else if new_quantity.is_sign_positive() != self.quantity.is_sign_positive() {
            // Flipped sides
            self.average_price = price;
        }

        self.quantity = new_quantity;
        self.realized_pnl += effect.realized_pnl;
        if self.current_price.is_zero() {
            self.current_price = price;
        }
        self.recompute_unrealized();

        effect
    }

    /// Price-only update from market data
    pub fn mark(&mut self, price: Decimal) {
        self.current_price = price;
        self.recompute_unrealized();
    }

    fn recompute_unrealized(&mut self) {
        self.unrealized_pnl = if self.quantity.is_zero() {
            Decimal::ZERO
        } else {
            self.quantity * (self.current_price - self.average_price)
        };
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Absolute market value at the current price
    pub fn exposure(&self) -> Decimal {
        self.quantity.abs() * self.current_price
    }

    /// Entry cost of the open quantity
    pub fn cost_basis(&self) -> Decimal {
        self.quantity.abs() * self.average_price
    }

    /// Unrealized return as a fraction of cost basis
    pub fn return_percent(&self) -> Decimal {
        let basis = self.cost_basis();
        if basis.is_zero() {
            Decimal::ZERO
        } else {
            self.unrealized_pnl / basis
        }
    }

    /// Side that would flatten this position
    pub fn closing_side(&self) -> Option<Side> {
        if self.quantity > Decimal::ZERO {
            Some(Side::Sell)
        } else if self.quantity < Decimal::ZERO {
            Some(Side::Buy)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flat() -> Position {
        Position::flat("vol-breakout", "AAPL", Utc::now())
    }

    #[test]
    fn test_weighted_average_on_adds() {
        let mut pos = flat();
        pos.apply_fill(Side::Buy, dec!(100), dec!(10));
        let effect = pos.apply_fill(Side::Buy, dec!(100), dec!(12));

        assert_eq!(pos.quantity, dec!(200));
        assert_eq!(pos.average_price, dec!(11));
        assert_eq!(effect.added_cost, dec!(1200));
        assert_eq!(effect.realized_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_realized_pnl_on_reduction() {
        let mut pos = flat();
        pos.apply_fill(Side::Buy, dec!(100), dec!(10));
        let effect = pos.apply_fill(Side::Sell, dec!(40), dec!(13));

        assert_eq!(effect.realized_pnl, dec!(120));
        assert_eq!(effect.reduced_quantity, dec!(40));
        assert_eq!(effect.released_cost_basis, dec!(400));
        assert_eq!(pos.quantity, dec!(60));
        // Reducing keeps the entry price
        assert_eq!(pos.average_price, dec!(10));
    }

    #[test]
    fn test_short_position_pnl() {
        let mut pos = flat();
        pos.apply_fill(Side::Sell, dec!(50), dec!(20));
        pos.mark(dec!(18));

        assert_eq!(pos.unrealized_pnl, dec!(100));
        assert_eq!(pos.return_percent(), dec!(0.1));
        assert_eq!(pos.closing_side(), Some(Side::Buy));

        let effect = pos.apply_fill(Side::Buy, dec!(50), dec!(18));
        assert_eq!(effect.realized_pnl, dec!(100));
        assert!(pos.is_flat());
        assert_eq!(pos.average_price, Decimal::ZERO);
    }

    #[test]
    fn test_flip_resets_entry_price() {
        let mut pos = flat();
        pos.apply_fill(Side::Buy, dec!(10), dec!(100));
        let effect = pos.apply_fill(Side::Sell, dec!(15), dec!(110));

        assert_eq!(effect.reduced_quantity, dec!(10));
        assert_eq!(effect.added_cost, dec!(550));
        assert_eq!(pos.quantity, dec!(-5));
        assert_eq!(pos.average_price, dec!(110));
    }
}
