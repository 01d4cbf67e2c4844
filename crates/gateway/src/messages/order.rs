//! Order message types

use aegis_core::{OrderId, OrderStatus, Side};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order submission request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Our order id, echoed back on every update
    pub client_order_id: OrderId,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    /// None = market order
    pub price: Option<Decimal>,
}

impl OrderRequest {
    pub fn limit(
        client_order_id: OrderId,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            client_order_id,
            symbol: symbol.into(),
            side,
            quantity,
            price: Some(price),
        }
    }

    pub fn market(
        client_order_id: OrderId,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
    ) -> Self {
        Self {
            client_order_id,
            symbol: symbol.into(),
            side,
            quantity,
            price: None,
        }
    }
}

/// Synchronous answer to a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    pub client_order_id: OrderId,
    pub broker_order_id: String,
    pub status: OrderStatus,
}

/// Asynchronous lifecycle update keyed by order id
///
/// Quantities are cumulative so duplicated or reordered deliveries are
/// harmless to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub client_order_id: OrderId,
    pub broker_order_id: String,
    pub status: OrderStatus,
    pub cumulative_quantity: Decimal,
    pub avg_fill_price: Decimal,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl OrderUpdate {
    pub fn fill(
        client_order_id: OrderId,
        broker_order_id: impl Into<String>,
        status: OrderStatus,
        cumulative_quantity: Decimal,
        avg_fill_price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            client_order_id,
            broker_order_id: broker_order_id.into(),
            status,
            cumulative_quantity,
            avg_fill_price,
            reason: None,
            timestamp,
        }
    }

    pub fn cancelled(
        client_order_id: OrderId,
        broker_order_id: impl Into<String>,
        reason: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            client_order_id,
            broker_order_id: broker_order_id.into(),
            status: OrderStatus::Cancelled,
            cumulative_quantity: Decimal::ZERO,
            avg_fill_price: Decimal::ZERO,
            reason: Some(reason.into()),
            timestamp,
        }
    }

    pub fn is_fill(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Filled | OrderStatus::PartiallyFilled
        )
    }
}
