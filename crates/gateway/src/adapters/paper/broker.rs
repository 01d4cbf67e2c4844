//! Paper broker - fills orders in-process
//!
//! Failures can be scripted per call (`fail_next`), per symbol
//! (`block_symbol`) or globally (`set_outage`) to exercise retry and
//! blacklist paths.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use aegis_core::{OrderId, OrderStatus};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use log::{debug, info};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::lock;
use crate::broker::BrokerGateway;
use crate::error::{GatewayError, Result};
use crate::messages::order::{OrderAck, OrderRequest, OrderUpdate};
use crate::session::SessionToken;

/// When accepted orders fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// Fill completely right after acknowledgement
    #[default]
    Immediate,
    /// Stay open until `fill_order` / `fill_all` is called
    Deferred,
}

/// Paper broker configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaperBrokerConfig {
    pub fill_mode: FillMode,
}

impl Default for PaperBrokerConfig {
    fn default() -> Self {
        Self {
            fill_mode: FillMode::Immediate,
        }
    }
}

/// One scripted failure, consumed by the next `submit_order` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedFailure {
    Timeout,
    Unavailable,
    Rejected(String),
    SymbolRejected(String),
}

#[derive(Clone)]
struct PaperOrder {
    request: OrderRequest,
    broker_order_id: String,
    status: OrderStatus,
    filled: Decimal,
    avg_price: Decimal,
}

pub struct PaperBroker {
    config: PaperBrokerConfig,
    /// broker order id -> order
    orders: DashMap<String, PaperOrder>,
    /// client order id -> broker order id
    by_client: DashMap<OrderId, String>,
    /// Last known prices for market orders
    marks: DashMap<String, Decimal>,
    script: Mutex<VecDeque<ScriptedFailure>>,
    blocked_symbols: DashMap<String, String>,
    outage: AtomicBool,
    pending_updates: Mutex<Vec<OrderUpdate>>,
    submit_calls: AtomicUsize,
    next_id: AtomicU64,
}

impl PaperBroker {
    pub fn new(config: PaperBrokerConfig) -> Self {
        Self {
            config,
            orders: DashMap::new(),
            by_client: DashMap::new(),
            marks: DashMap::new(),
            script: Mutex::new(VecDeque::new()),
            blocked_symbols: DashMap::new(),
            outage: AtomicBool::new(false),
            pending_updates: Mutex::new(Vec::new()),
            submit_calls: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
        }
    }

    /// Builder: deferred fills
    pub fn deferred() -> Self {
        Self::new(PaperBrokerConfig {
            fill_mode: FillMode::Deferred,
            ..Default::default()
        })
    }

    /// Set the price used for market orders
    pub fn set_price(&self, symbol: &str, price: Decimal) {
        self.marks.insert(symbol.to_string(), price);
    }

    /// Fail the next `count` submissions with `failure`
    pub fn fail_next(&self, count: usize, failure: ScriptedFailure) {
        let mut script = lock(&self.script);
        for _ in 0..count {
            script.push_back(failure.clone());
        }
    }

    /// Reject every order for `symbol` until unblocked
    pub fn block_symbol(&self, symbol: &str, reason: &str) {
        self.blocked_symbols
            .insert(symbol.to_string(), reason.to_string());
    }

    pub fn unblock_symbol(&self, symbol: &str) {
        self.blocked_symbols.remove(symbol);
    }

    /// While set, every call fails as unavailable
    pub fn set_outage(&self, down: bool) {
        self.outage.store(down, Ordering::SeqCst);
    }

    /// Total `submit_order` calls, including failed ones
    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    /// Orders the broker accepted
    pub fn accepted_count(&self) -> usize {
        self.orders.len()
    }

    /// Broker-side view of an order's status
    pub fn order_status(&self, client_order_id: &OrderId) -> Option<OrderStatus> {
        let broker_id = self.by_client.get(client_order_id)?.clone();
        self.orders.get(&broker_id).map(|o| o.status)
    }

    /// Fill an open order up to `cumulative` quantity
    ///
    /// `price` overrides the order's limit/mark price for this slice.
    pub async fn fill_order(
        &self,
        client_order_id: &OrderId,
        cumulative: Decimal,
        price: Option<Decimal>,
    ) -> Result<()> {
        let broker_id = self
            .by_client
            .get(client_order_id)
            .map(|id| id.clone())
            .ok_or_else(|| GatewayError::UnknownOrder(client_order_id.to_string()))?;

        let update = {
            let mut order = self
                .orders
                .get_mut(&broker_id)
                .ok_or_else(|| GatewayError::UnknownOrder(broker_id.clone()))?;
            if order.status.is_terminal() {
                return Ok(());
            }

            let cumulative = cumulative.min(order.request.quantity);
            if cumulative <= order.filled {
                return Ok(());
            }
            let slice = cumulative - order.filled;
            let slice_price = match price.or(order.request.price) {
                Some(p) => p,
                None => self
                    .marks
                    .get(&order.request.symbol)
                    .map(|p| *p)
                    .ok_or_else(|| {
                        GatewayError::MarketData(format!("no price for {}", order.request.symbol))
                    })?,
            };

            order.avg_price = (order.filled * order.avg_price + slice * slice_price) / cumulative;
            order.filled = cumulative;
            order.status = if cumulative >= order.request.quantity {
                OrderStatus::Filled
            } else {
                OrderStatus::PartiallyFilled
            };

            OrderUpdate::fill(
                *client_order_id,
                broker_id.clone(),
                order.status,
                order.filled,
                order.avg_price,
                Utc::now(),
            )
        };

        debug!(
            "[PAPER] {} {} filled {} @ {}",
            broker_id, update.status.as_str(), update.cumulative_quantity, update.avg_fill_price
        );
        self.emit(update);
        Ok(())
    }

    /// Fill every open order completely
    pub async fn fill_all(&self) -> Result<usize> {
        let open: Vec<(OrderId, Decimal)> = self
            .orders
            .iter()
            .filter(|o| !o.status.is_terminal())
            .map(|o| (o.request.client_order_id, o.request.quantity))
            .collect();

        for (client_id, qty) in &open {
            self.fill_order(client_id, *qty, None).await?;
        }
        Ok(open.len())
    }

    /// Broker-initiated cancel (e.g. end of day)
    pub async fn cancel_from_broker(&self, client_order_id: &OrderId, reason: &str) -> Result<()> {
        let broker_id = self
            .by_client
            .get(client_order_id)
            .map(|id| id.clone())
            .ok_or_else(|| GatewayError::UnknownOrder(client_order_id.to_string()))?;
        self.cancel_internal(&broker_id, reason).await
    }

    async fn cancel_internal(&self, broker_order_id: &str, reason: &str) -> Result<()> {
        let update = {
            let mut order = self
                .orders
                .get_mut(broker_order_id)
                .ok_or_else(|| GatewayError::UnknownOrder(broker_order_id.to_string()))?;
            if order.status.is_terminal() {
                return Ok(());
            }
            order.status = OrderStatus::Cancelled;

            let mut update = OrderUpdate::cancelled(
                order.request.client_order_id,
                broker_order_id,
                reason,
                Utc::now(),
            );
            update.cumulative_quantity = order.filled;
            update.avg_fill_price = order.avg_price;
            update
        };

        info!("[PAPER] {} cancelled: {}", broker_order_id, reason);
        self.emit(update);
        Ok(())
    }

    fn emit(&self, update: OrderUpdate) {
        lock(&self.pending_updates).push(update);
    }

    fn check_available(&self) -> Result<()> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("paper broker outage".into()));
        }
        Ok(())
    }
}

impl Default for PaperBroker {
    fn default() -> Self {
        Self::new(PaperBrokerConfig::default())
    }
}

#[async_trait]
impl BrokerGateway for PaperBroker {
    async fn submit_order(&self, token: &SessionToken, request: &OrderRequest) -> Result<OrderAck> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        if token.token.is_empty() {
            return Err(GatewayError::Unauthenticated("empty session token".into()));
        }

        let scripted = lock(&self.script).pop_front();
        if let Some(failure) = scripted {
            debug!("[PAPER] Scripted failure for {}: {:?}", request.symbol, failure);
            return Err(match failure {
                ScriptedFailure::Timeout => GatewayError::Timeout("paper submit".into()),
                ScriptedFailure::Unavailable => GatewayError::Unavailable("paper 503".into()),
                ScriptedFailure::Rejected(reason) => GatewayError::Rejected(reason),
                ScriptedFailure::SymbolRejected(reason) => GatewayError::SymbolRejected {
                    symbol: request.symbol.clone(),
                    reason,
                },
            });
        }

        if let Some(reason) = self.blocked_symbols.get(&request.symbol) {
            return Err(GatewayError::SymbolRejected {
                symbol: request.symbol.clone(),
                reason: reason.clone(),
            });
        }

        if request.quantity <= Decimal::ZERO {
            return Err(GatewayError::Rejected("quantity must be positive".into()));
        }

        // Same client id twice is the same order
        if let Some(existing) = self.by_client.get(&request.client_order_id) {
            let broker_order_id = existing.clone();
            let status = self
                .orders
                .get(&broker_order_id)
                .map(|o| o.status)
                .unwrap_or(OrderStatus::Submitted);
            return Ok(OrderAck {
                client_order_id: request.client_order_id,
                broker_order_id,
                status,
            });
        }

        let broker_order_id = format!("PAPER-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.orders.insert(
            broker_order_id.clone(),
            PaperOrder {
                request: request.clone(),
                broker_order_id: broker_order_id.clone(),
                status: OrderStatus::Submitted,
                filled: Decimal::ZERO,
                avg_price: Decimal::ZERO,
            },
        );
        self.by_client
            .insert(request.client_order_id, broker_order_id.clone());

        info!(
            "[PAPER] Accepted {} {} {} {} -> {}",
            request.client_order_id,
            request.side,
            request.quantity,
            request.symbol,
            broker_order_id
        );

        if self.config.fill_mode == FillMode::Immediate {
            self.fill_order(&request.client_order_id, request.quantity, None)
                .await?;
        }

        Ok(OrderAck {
            client_order_id: request.client_order_id,
            broker_order_id,
            status: OrderStatus::Submitted,
        })
    }

    async fn cancel_order(&self, token: &SessionToken, broker_order_id: &str) -> Result<()> {
        self.check_available()?;
        if token.token.is_empty() {
            return Err(GatewayError::Unauthenticated("empty session token".into()));
        }
        self.cancel_internal(broker_order_id, "cancelled by client")
            .await
    }

    async fn poll_updates(&self) -> Result<Vec<OrderUpdate>> {
        self.check_available()?;
        Ok(std::mem::take(&mut *lock(&self.pending_updates)))
    }

    fn name(&self) -> &str {
        "PaperBroker"
    }
}

impl std::fmt::Debug for PaperOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}", self.broker_order_id, self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::Side;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn token() -> SessionToken {
        SessionToken::new("paper")
    }

    fn request(symbol: &str) -> OrderRequest {
        OrderRequest::limit(Uuid::new_v4(), symbol, Side::Buy, dec!(10), dec!(100))
    }

    #[tokio::test]
    async fn test_immediate_fill() {
        let broker = PaperBroker::default();

        let req = request("AAPL");
        let ack = broker.submit_order(&token(), &req).await.unwrap();
        assert_eq!(ack.status, OrderStatus::Submitted);

        let polled = broker.poll_updates().await.unwrap();
        assert_eq!(polled.len(), 1);
        assert_eq!(polled[0].status, OrderStatus::Filled);
        assert_eq!(polled[0].cumulative_quantity, dec!(10));
        assert_eq!(polled[0].client_order_id, req.client_order_id);
        assert!(broker.poll_updates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scripted_failures_consumed_in_order() {
        let broker = PaperBroker::default();
        broker.fail_next(1, ScriptedFailure::Timeout);
        broker.fail_next(1, ScriptedFailure::SymbolRejected("halted".into()));

        let req = request("XYZ");
        let first = broker.submit_order(&token(), &req).await.unwrap_err();
        assert!(first.is_transient());

        let second = broker.submit_order(&token(), &req).await.unwrap_err();
        assert!(second.is_symbol_specific());

        assert!(broker.submit_order(&token(), &req).await.is_ok());
        assert_eq!(broker.submit_calls(), 3);
    }

    #[tokio::test]
    async fn test_deferred_partial_fill_then_cancel() {
        let broker = PaperBroker::deferred();
        let req = request("MSFT");
        let ack = broker.submit_order(&token(), &req).await.unwrap();

        broker
            .fill_order(&req.client_order_id, dec!(4), None)
            .await
            .unwrap();
        broker
            .cancel_order(&token(), &ack.broker_order_id)
            .await
            .unwrap();

        let updates = broker.poll_updates().await.unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].status, OrderStatus::PartiallyFilled);
        assert_eq!(updates[1].status, OrderStatus::Cancelled);
        assert_eq!(updates[1].cumulative_quantity, dec!(4));
    }

    #[tokio::test]
    async fn test_duplicate_client_id_not_filled_twice() {
        let broker = PaperBroker::default();
        let req = request("AAPL");

        broker.submit_order(&token(), &req).await.unwrap();
        broker.submit_order(&token(), &req).await.unwrap();

        assert_eq!(broker.accepted_count(), 1);
        assert_eq!(broker.poll_updates().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_token_rejected() {
        let broker = PaperBroker::default();
        let err = broker
            .submit_order(&SessionToken::new(""), &request("AAPL"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthenticated(_)));
    }
}
