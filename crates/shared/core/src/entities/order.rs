use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderStatus, RejectReason, Side};

/// Unique identifier for an order
pub type OrderId = Uuid;

/// Why the order exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderIntent {
    /// Opens or adds to a position from an admitted signal
    Entry,
    /// Closes a position on stop, target or time stop
    Exit,
}

/// Stop/target plan carried from the signal to the resulting position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitPlan {
    pub stop_loss_percent: Decimal,
    pub target_percent: Decimal,
    pub time_stop: DateTime<Utc>,
    /// Shared by all legs of a multi-leg signal
    pub leg_group: Option<String>,
}

/// Broker-facing trade request and its lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    /// Assigned by the broker on acknowledgement
    pub broker_order_id: Option<String>,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    /// None for market orders
    pub requested_price: Option<Decimal>,
    pub filled_quantity: Decimal,
    pub avg_fill_price: Decimal,
    pub status: OrderStatus,
    /// Submission attempts beyond the first
    pub retries: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub strategy_owner: String,
    pub intent: OrderIntent,
    /// Capital claimed from the owner's allocation at admission
    pub reserved_capital: Decimal,
    /// `executed:*` key claimed for this order
    pub idempotency_key: Option<String>,
    pub exit_plan: Option<ExitPlan>,
    pub reject_reason: Option<RejectReason>,
    pub reject_detail: Option<String>,
}

impl Order {
    /// Create a new pending order
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        requested_price: Option<Decimal>,
        strategy_owner: impl Into<String>,
        intent: OrderIntent,
        reserved_capital: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id: Uuid::new_v4(),
            broker_order_id: None,
            symbol: symbol.into(),
            side,
            quantity,
            requested_price,
            filled_quantity: Decimal::ZERO,
            avg_fill_price: Decimal::ZERO,
            status: OrderStatus::Pending,
            retries: 0,
            created_at,
            updated_at: created_at,
            strategy_owner: strategy_owner.into(),
            intent,
            reserved_capital,
            idempotency_key: None,
            exit_plan: None,
            reject_reason: None,
            reject_detail: None,
        }
    }

    /// Move to `next` if the state machine allows it
    pub fn transition(&mut self, next: OrderStatus, at: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at = at;
        true
    }

    /// Mark rejected with a reason (no-op from a terminal state)
    pub fn reject(
        &mut self,
        reason: RejectReason,
        detail: impl Into<String>,
        at: DateTime<Utc>,
    ) -> bool {
        if !self.transition(OrderStatus::Rejected, at) {
            return false;
        }
        self.reject_reason = Some(reason);
        self.reject_detail = Some(detail.into());
        true
    }

    /// Apply a cumulative fill report, returning the newly filled quantity
    ///
    /// Brokers report cumulative quantity and average price; the delta and
    /// its price are derived so repeated reports are harmless.
    pub fn apply_fill_report(
        &mut self,
        cumulative_qty: Decimal,
        avg_price: Decimal,
        at: DateTime<Utc>,
    ) -> Option<(Decimal, Decimal)> {
        let cumulative_qty = cumulative_qty.min(self.quantity);
        if cumulative_qty <= self.filled_quantity {
            return None;
        }

        let delta = cumulative_qty - self.filled_quantity;
        // Price of just the new slice
        let prior_cost = self.filled_quantity * self.avg_fill_price;
        let delta_price = (cumulative_qty * avg_price - prior_cost) / delta;

        let next = if cumulative_qty >= self.quantity {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        if !self.transition(next, at) {
            return None;
        }

        self.filled_quantity = cumulative_qty;
        self.avg_fill_price = avg_price;
        Some((delta, delta_price))
    }

    /// Returns remaining quantity to be filled
    pub fn remaining_quantity(&self) -> Decimal {
        self.quantity - self.filled_quantity
    }

    /// Notional of what actually filled
    pub fn filled_notional(&self) -> Decimal {
        self.filled_quantity * self.avg_fill_price
    }

    /// Returns true if the order is completely filled
    pub fn is_filled(&self) -> bool {
        self.filled_quantity >= self.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_order() -> Order {
        Order::new(
            "AAPL",
            Side::Buy,
            dec!(100),
            Some(dec!(190)),
            "vol-breakout",
            OrderIntent::Entry,
            dec!(19000),
            Utc::now(),
        )
    }

    #[test]
    fn test_partial_then_full_fill() {
        let mut order = make_order();
        assert!(order.transition(OrderStatus::Submitted, Utc::now()));

        let (qty, price) = order
            .apply_fill_report(dec!(40), dec!(190), Utc::now())
            .unwrap();
        assert_eq!(qty, dec!(40));
        assert_eq!(price, dec!(190));
        assert_eq!(order.status, OrderStatus::PartiallyFilled);

        // Cumulative 100 @ avg 191 -> remaining 60 filled @ 191.666..
        let (qty, price) = order
            .apply_fill_report(dec!(100), dec!(191), Utc::now())
            .unwrap();
        assert_eq!(qty, dec!(60));
        assert!(price > dec!(191.6) && price < dec!(191.7));
        assert_eq!(order.status, OrderStatus::Filled);
        assert!(order.is_filled());
    }

    #[test]
    fn test_duplicate_fill_report_ignored() {
        let mut order = make_order();
        order.transition(OrderStatus::Submitted, Utc::now());
        order.apply_fill_report(dec!(50), dec!(190), Utc::now());
        let before = order.clone();

        assert!(
            order
                .apply_fill_report(dec!(50), dec!(190), Utc::now())
                .is_none()
        );
        assert_eq!(order, before);
        assert_eq!(order.filled_quantity, dec!(50));
    }

    #[test]
    fn test_reject_from_terminal_is_noop() {
        let mut order = make_order();
        order.transition(OrderStatus::Submitted, Utc::now());
        order.apply_fill_report(dec!(100), dec!(190), Utc::now());

        assert!(!order.reject(RejectReason::BrokerRejected, "late", Utc::now()));
        assert_eq!(order.status, OrderStatus::Filled);
        assert!(order.reject_reason.is_none());
    }
}
