//! Order lifecycle
//!
//! ```text
//! PENDING ─► SUBMITTED ─┬─► FILLED
//!    │                  ├─► PARTIALLY_FILLED ─► FILLED | CANCELLED
//!    │                  ├─► REJECTED
//!    └─► REJECTED       └─► CANCELLED
//! ```
//!
//! Submissions and fill processing for one symbol are serialized by a
//! per-symbol lock; different symbols proceed concurrently. Every order is
//! persisted before the broker sees it, so a restart between submission
//! and fill never loses track of it.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use aegis_core::{
    ExitPlan, MarketSnapshot, Order, OrderId, OrderIntent, OrderStatus, Position, RejectReason,
    Side, Timestamp, TradingSession,
};
use aegis_gateway::{BrokerGateway, GatewayError, OrderRequest, OrderUpdate, SessionProvider};
use aegis_ports::{Clock, StateStore};
use aegis_risk_manager::{ApprovedSignal, PortfolioState, RiskManager};
use aegis_store::{KeyIndex, Keys, load_json, save_json};
use dashmap::{DashMap, DashSet};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::position::PositionBook;
use crate::retry::RetryPolicy;

const PENDING_MARKER: &str = "pending";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderManagerConfig {
    pub retry: RetryPolicy,
    /// Send limit orders at the signal's entry estimate instead of market orders
    pub use_limit_orders: bool,
    /// How long terminal order records are kept in the store
    pub terminal_order_ttl_secs: u64,
}

impl Default for OrderManagerConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            use_limit_orders: true,
            terminal_order_ttl_secs: 7 * 24 * 3600,
        }
    }
}

/// What happened to one admitted signal
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(Order),
    /// Idempotency key already claimed for today
    Duplicate { key: String },
    Rejected(Order),
}

impl SubmitOutcome {
    pub fn order(&self) -> Option<&Order> {
        match self {
            SubmitOutcome::Submitted(o) | SubmitOutcome::Rejected(o) => Some(o),
            SubmitOutcome::Duplicate { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    Target,
    TimeStop,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::Target => "target",
            ExitReason::TimeStop => "time_stop",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub orders: usize,
    pub positions: usize,
}

pub struct OrderManager {
    config: OrderManagerConfig,
    broker: Arc<dyn BrokerGateway>,
    sessions: Arc<dyn SessionProvider>,
    store: Arc<dyn StateStore>,
    risk: Arc<RiskManager>,
    clock: Arc<dyn Clock>,
    session: TradingSession,
    initial_capital: Decimal,
    orders: DashMap<OrderId, Order>,
    positions: PositionBook,
    symbol_locks: DashMap<String, Arc<Mutex<()>>>,
    /// Symbols currently past the loss limit; cleared on recovery
    loss_breached: DashSet<String>,
    index_lock: Mutex<()>,
    placed_today: StdMutex<(String, u64)>,
}

impl OrderManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: OrderManagerConfig,
        broker: Arc<dyn BrokerGateway>,
        sessions: Arc<dyn SessionProvider>,
        store: Arc<dyn StateStore>,
        risk: Arc<RiskManager>,
        clock: Arc<dyn Clock>,
        session: TradingSession,
        initial_capital: Decimal,
    ) -> Self {
        Self {
            config,
            broker,
            sessions,
            store,
            risk,
            clock,
            session,
            initial_capital,
            orders: DashMap::new(),
            positions: PositionBook::new(),
            symbol_locks: DashMap::new(),
            loss_breached: DashSet::new(),
            index_lock: Mutex::new(()),
            placed_today: StdMutex::new((String::new(), 0)),
        }
    }

    fn symbol_lock(&self, symbol: &str) -> Arc<Mutex<()>> {
        self.symbol_locks
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn idempotency_key(&self, strategy: &str, symbol: &str, side: Side) -> String {
        let day = self.session.trading_day(self.clock.now());
        Keys::executed(&day, strategy, symbol, side)
    }

    fn idempotency_ttl(&self) -> Duration {
        self.session
            .until_end_of_day(self.clock.now())
            .to_std()
            .unwrap_or(Duration::from_secs(1))
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Whether (strategy, symbol, side) already traded this trading day
    pub async fn already_executed(&self, strategy: &str, symbol: &str, side: Side) -> Result<bool> {
        let key = self.idempotency_key(strategy, symbol, side);
        Ok(self.store.get(&key).await?.is_some())
    }

    /// Turn an admitted signal into a broker order
    ///
    /// Reserved capital is returned to the strategy on every path that does
    /// not end in a live order.
    pub async fn submit(&self, approved: ApprovedSignal) -> Result<SubmitOutcome> {
        let signal = &approved.signal;
        let lock = self.symbol_lock(&signal.symbol);
        let _guard = lock.lock().await;

        let key = self.idempotency_key(&signal.strategy_name, &signal.symbol, signal.side);
        let ttl = self.idempotency_ttl();

        let claimed = match self.store.set_if_absent(&key, PENDING_MARKER, Some(ttl)).await {
            Ok(claimed) => claimed,
            Err(e) => {
                self.risk.release(&signal.strategy_name, approved.reserved_capital);
                return Err(e.into());
            }
        };
        if !claimed {
            self.risk.release(&signal.strategy_name, approved.reserved_capital);
            info!(
                "[ORDERS] {} {} {} {}: {} already claimed",
                RejectReason::DuplicateSignal,
                signal.strategy_name,
                signal.side,
                signal.symbol,
                key
            );
            return Ok(SubmitOutcome::Duplicate { key });
        }

        let now = self.clock.now();
        let price = self.config.use_limit_orders.then_some(signal.entry_price_estimate);
        let mut order = Order::new(
            signal.symbol.clone(),
            signal.side,
            signal.quantity,
            price,
            signal.strategy_name.clone(),
            OrderIntent::Entry,
            approved.reserved_capital,
            now,
        );
        order.idempotency_key = Some(key.clone());
        order.exit_plan = Some(ExitPlan {
            stop_loss_percent: signal.stop_loss_percent,
            target_percent: signal.target_percent,
            time_stop: signal.time_stop,
            leg_group: signal.leg_group().map(str::to_string),
        });

        if let Err(e) = self.persist_order(&order).await {
            self.risk.release(&signal.strategy_name, approved.reserved_capital);
            self.forget_key(&key).await;
            return Err(e);
        }

        let order = self.send(order).await?;
        if order.status == OrderStatus::Rejected {
            self.forget_key(&key).await;
            return Ok(SubmitOutcome::Rejected(order));
        }

        self.store
            .set(&key, &order.order_id.to_string(), Some(ttl))
            .await?;
        self.count_placed();
        Ok(SubmitOutcome::Submitted(order))
    }

    /// Obtain a session, call the broker with retry, and settle the order
    ///
    /// Caller holds the symbol lock.
    async fn send(&self, mut order: Order) -> Result<Order> {
        let token = match self.sessions.get_valid_token().await {
            Ok(token) => token,
            Err(e) => {
                error!("[ORDERS] No valid broker session: {}", e);
                self.fail_order(&mut order, RejectReason::Unauthenticated, e.to_string())
                    .await?;
                return Ok(order);
            }
        };

        let request = match order.requested_price {
            Some(price) => OrderRequest::limit(
                order.order_id,
                order.symbol.clone(),
                order.side,
                order.quantity,
                price,
            ),
            None => OrderRequest::market(order.order_id, order.symbol.clone(), order.side, order.quantity),
        };

        let label = format!("submit {} {}", order.side, order.symbol);
        let broker = self.broker.clone();
        let outcome = self
            .config
            .retry
            .run(&label, || {
                let broker = broker.clone();
                let token = token.clone();
                let request = request.clone();
                async move { broker.submit_order(&token, &request).await }
            })
            .await;
        order.retries = outcome.attempts.saturating_sub(1);
        let exhausted = outcome.exhausted();

        match outcome.result {
            Ok(ack) => {
                order.broker_order_id = Some(ack.broker_order_id.clone());
                order.transition(OrderStatus::Submitted, self.clock.now());
                info!(
                    "[ORDERS] Submitted {} {} {} {} ({}) as {}",
                    order.strategy_owner,
                    order.side,
                    order.quantity,
                    order.symbol,
                    order.order_id,
                    ack.broker_order_id
                );
                self.orders.insert(order.order_id, order.clone());
                self.persist_order(&order).await?;
            }
            Err(e) => {
                let reason = classify(&e, exhausted);
                if e.is_symbol_specific() || matches!(e, GatewayError::Rejected(_)) {
                    self.risk.record_violation(&order.symbol, &e.to_string());
                }
                self.fail_order(&mut order, reason, e.to_string()).await?;
            }
        }
        Ok(order)
    }

    async fn fail_order(&self, order: &mut Order, reason: RejectReason, detail: String) -> Result<()> {
        order.reject(reason, detail.clone(), self.clock.now());
        warn!(
            "[ORDERS] {} {} {} {} rejected {}: {}",
            order.strategy_owner, order.side, order.quantity, order.symbol, reason, detail
        );
        self.settle_reservation(order);
        match order.intent {
            OrderIntent::Exit => {
                self.positions
                    .set_closing(&order.strategy_owner, &order.symbol, false);
            }
            OrderIntent::Entry => {}
        }
        self.orders.remove(&order.order_id);
        self.persist_order(order).await
    }

    async fn forget_key(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            warn!("[ORDERS] Could not release idempotency key {}: {}", key, e);
        }
    }

    fn count_placed(&self) {
        let day = self.session.trading_day(self.clock.now());
        let mut placed = self
            .placed_today
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if placed.0 != day {
            *placed = (day, 0);
        }
        placed.1 += 1;
    }

    pub fn orders_placed_today(&self) -> u64 {
        let day = self.session.trading_day(self.clock.now());
        let placed = self
            .placed_today
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if placed.0 == day { placed.1 } else { 0 }
    }

    // ========================================================================
    // Fills and broker updates
    // ========================================================================

    /// Pull queued updates from the broker and apply them
    pub async fn poll_broker(&self) -> Result<usize> {
        let updates = self.broker.poll_updates().await?;
        self.process_updates(updates).await
    }

    /// Apply broker updates; returns how many changed an order
    pub async fn process_updates(&self, updates: Vec<OrderUpdate>) -> Result<usize> {
        let mut applied = 0;
        for update in updates {
            let Some(symbol) = self
                .orders
                .get(&update.client_order_id)
                .map(|o| o.symbol.clone())
            else {
                debug!(
                    "[ORDERS] Update for unknown or closed order {}",
                    update.client_order_id
                );
                continue;
            };

            let lock = self.symbol_lock(&symbol);
            let _guard = lock.lock().await;
            if self.apply_update(&update).await? {
                applied += 1;
            }
        }
        if applied > 0 {
            self.risk.update_portfolio_value(self.portfolio_value());
        }
        Ok(applied)
    }

    async fn apply_update(&self, update: &OrderUpdate) -> Result<bool> {
        let Some(mut order) = self
            .orders
            .get(&update.client_order_id)
            .map(|o| o.clone())
        else {
            return Ok(false);
        };
        let now = self.clock.now();
        let mut changed = false;

        if update.cumulative_quantity > order.filled_quantity
            && let Some((qty, price)) =
                order.apply_fill_report(update.cumulative_quantity, update.avg_fill_price, now)
        {
            self.apply_fill(&mut order, qty, price, now).await?;
            changed = true;
        }

        match update.status {
            OrderStatus::Cancelled if !order.status.is_terminal() => {
                let detail = update
                    .reason
                    .clone()
                    .unwrap_or_else(|| "cancelled by broker".into());
                if order.transition(OrderStatus::Cancelled, now) {
                    order.reject_reason = Some(RejectReason::CancelledByBroker);
                    order.reject_detail = Some(detail.clone());
                    info!(
                        "[ORDERS] {} {} cancelled after {} filled: {}",
                        order.order_id, order.symbol, order.filled_quantity, detail
                    );
                    changed = true;
                }
            }
            OrderStatus::Rejected if !order.status.is_terminal() => {
                let detail = update
                    .reason
                    .clone()
                    .unwrap_or_else(|| "rejected by broker".into());
                if order.reject(RejectReason::BrokerRejected, detail.clone(), now) {
                    self.risk.record_violation(&order.symbol, &detail);
                    changed = true;
                }
            }
            _ => {}
        }

        if !changed {
            return Ok(false);
        }

        if order.status.is_terminal() {
            self.settle_reservation(&mut order);
            if order.intent == OrderIntent::Exit && !order.is_filled() {
                self.positions
                    .set_closing(&order.strategy_owner, &order.symbol, false);
            }
            if order.status != OrderStatus::Filled
                && order.filled_quantity.is_zero()
                && let Some(key) = &order.idempotency_key
            {
                self.forget_key(key).await;
            }
            self.orders.remove(&order.order_id);
        } else {
            self.orders.insert(order.order_id, order.clone());
        }
        self.persist_order(&order).await?;
        if let Some(position) = self.positions.get(&order.strategy_owner, &order.symbol) {
            self.persist_position(&position).await?;
        }
        Ok(true)
    }

    /// Book one fill slice into the position and capital partitions
    async fn apply_fill(
        &self,
        order: &mut Order,
        qty: Decimal,
        price: Decimal,
        now: Timestamp,
    ) -> Result<()> {
        let (effect, position) = self.positions.apply_fill(
            &order.strategy_owner,
            &order.symbol,
            order.side,
            qty,
            price,
            order.exit_plan.as_ref(),
            now,
        );

        // New exposure draws down the reservation first
        if effect.added_cost > Decimal::ZERO {
            let from_reservation = effect.added_cost.min(order.reserved_capital);
            order.reserved_capital -= from_reservation;
            self.risk
                .charge(&order.strategy_owner, effect.added_cost - from_reservation);
        }
        if effect.released_cost_basis > Decimal::ZERO {
            self.risk
                .release(&order.strategy_owner, effect.released_cost_basis);
        }

        info!(
            "[ORDERS] Fill {} {} {} @ {} -> position {} @ {} (realized {})",
            order.strategy_owner,
            order.side,
            qty,
            price.round_dp(4),
            position.quantity,
            position.average_price.round_dp(4),
            effect.realized_pnl.round_dp(2)
        );
        self.check_symbol_loss(&order.symbol);
        Ok(())
    }

    /// Count a violation each time a symbol's loss crosses the limit
    fn check_symbol_loss(&self, symbol: &str) {
        let Some(limit) = self.risk.symbol_loss_limit() else {
            return;
        };
        let pnl = self.positions.symbol_pnl(symbol);
        if pnl > -limit {
            self.loss_breached.remove(symbol);
            return;
        }
        if self.loss_breached.insert(symbol.to_string()) {
            warn!(
                "[ORDERS] {} loss {} beyond limit {}",
                symbol,
                pnl.round_dp(2),
                limit.round_dp(2)
            );
            self.risk.record_violation(
                symbol,
                &format!("loss {} beyond limit {}", pnl.round_dp(2), limit.round_dp(2)),
            );
        }
    }

    /// Return whatever reservation a finished order did not consume
    fn settle_reservation(&self, order: &mut Order) {
        if order.reserved_capital > Decimal::ZERO {
            self.risk
                .release(&order.strategy_owner, order.reserved_capital);
            order.reserved_capital = Decimal::ZERO;
        }
    }

    // ========================================================================
    // Marks and exits
    // ========================================================================

    /// Reprice positions from a snapshot and feed the drawdown tracker
    pub async fn mark_to_market(&self, snapshot: &MarketSnapshot) -> Result<Decimal> {
        for (symbol, tick) in &snapshot.ticks {
            let marked = self.positions.mark(symbol, tick.last_price);
            for position in &marked {
                self.persist_position(position).await?;
            }
            if !marked.is_empty() {
                self.check_symbol_loss(symbol);
            }
        }
        let value = self.portfolio_value();
        self.risk.update_portfolio_value(value);
        Ok(value)
    }

    /// Close positions past stop, target or time stop
    ///
    /// Linked legs are judged on combined P&L and closed together. Exit
    /// orders skip admission so positions can be closed during a drawdown
    /// halt.
    pub async fn check_exits(&self) -> Result<Vec<Order>> {
        let now = self.clock.now();
        let mut singles = Vec::new();
        let mut groups: HashMap<String, Vec<Position>> = HashMap::new();

        for position in self.positions.open() {
            if position.closing {
                continue;
            }
            match &position.leg_group {
                Some(group) => groups.entry(group.clone()).or_default().push(position),
                None => singles.push(position),
            }
        }

        let mut to_close: Vec<(Position, ExitReason)> = Vec::new();
        for position in singles {
            if let Some(reason) = exit_reason(
                position.return_percent(),
                position.stop_loss_percent,
                position.target_percent,
                position.time_stop,
                now,
            ) {
                to_close.push((position, reason));
            }
        }
        for (group, legs) in groups {
            let basis: Decimal = legs.iter().map(|p| p.cost_basis()).sum();
            let pnl: Decimal = legs.iter().map(|p| p.unrealized_pnl).sum();
            let combined = if basis.is_zero() { Decimal::ZERO } else { pnl / basis };
            let time_stop = legs.iter().filter_map(|p| p.time_stop).min();
            if let Some(reason) = exit_reason(
                combined,
                legs[0].stop_loss_percent,
                legs[0].target_percent,
                time_stop,
                now,
            ) {
                info!(
                    "[ORDERS] Leg group {} combined return {} hit {}",
                    group,
                    combined.round_dp(4),
                    reason.as_str()
                );
                to_close.extend(legs.into_iter().map(|p| (p, reason)));
            }
        }

        let mut exits = Vec::new();
        for (position, reason) in to_close {
            if let Some(order) = self.submit_exit(&position, reason).await? {
                exits.push(order);
            }
        }
        Ok(exits)
    }

    async fn submit_exit(&self, position: &Position, reason: ExitReason) -> Result<Option<Order>> {
        let lock = self.symbol_lock(&position.symbol);
        let _guard = lock.lock().await;

        // Re-read under the lock; a fill may have flattened it meanwhile
        let Some(current) = self.positions.get(&position.strategy_owner, &position.symbol) else {
            return Ok(None);
        };
        let Some(side) = current.closing_side() else {
            return Ok(None);
        };
        if current.closing {
            return Ok(None);
        }

        info!(
            "[ORDERS] Exit {} {} {} ({}): return {}",
            current.strategy_owner,
            side,
            current.symbol,
            reason.as_str(),
            current.return_percent().round_dp(4)
        );

        self.positions
            .set_closing(&current.strategy_owner, &current.symbol, true);
        let order = Order::new(
            current.symbol.clone(),
            side,
            current.quantity.abs(),
            self.config
                .use_limit_orders
                .then_some(current.current_price)
                .filter(|p| *p > Decimal::ZERO),
            current.strategy_owner.clone(),
            OrderIntent::Exit,
            Decimal::ZERO,
            self.clock.now(),
        );
        if let Err(e) = self.persist_order(&order).await {
            self.positions
                .set_closing(&current.strategy_owner, &current.symbol, false);
            return Err(e);
        }

        let order = self.send(order).await?;
        if order.status != OrderStatus::Rejected {
            self.count_placed();
        }
        if let Some(updated) = self.positions.get(&current.strategy_owner, &current.symbol) {
            self.persist_position(&updated).await?;
        }
        Ok(Some(order))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn order(&self, order_id: &OrderId) -> Option<Order> {
        self.orders.get(order_id).map(|o| o.clone())
    }

    /// Non-terminal orders, oldest first
    pub fn open_orders(&self) -> Vec<Order> {
        let mut open: Vec<_> = self
            .orders
            .iter()
            .filter(|o| !o.status.is_terminal())
            .map(|o| o.value().clone())
            .collect();
        open.sort_by_key(|o| o.created_at);
        open
    }

    pub fn positions(&self) -> Vec<Position> {
        self.positions.all()
    }

    pub fn position(&self, strategy: &str, symbol: &str) -> Option<Position> {
        self.positions.get(strategy, symbol)
    }

    /// Initial capital plus realized and unrealized P&L
    pub fn portfolio_value(&self) -> Decimal {
        self.initial_capital + self.positions.total_pnl()
    }

    pub fn portfolio_state(&self) -> PortfolioState {
        PortfolioState {
            total_value: self.portfolio_value(),
            exposures: self.positions.exposures(),
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    async fn persist_order(&self, order: &Order) -> Result<()> {
        let key = Keys::order(&order.order_id);
        let store = self.store.as_ref();
        let _index = self.index_lock.lock().await;

        if order.status.is_terminal() {
            let ttl = Duration::from_secs(self.config.terminal_order_ttl_secs);
            save_json(store, &key, order, Some(ttl)).await?;
            KeyIndex::remove(store, Keys::OPEN_ORDERS, &order.order_id.to_string()).await?;
        } else {
            save_json(store, &key, order, None).await?;
            KeyIndex::add(store, Keys::OPEN_ORDERS, &order.order_id.to_string()).await?;
        }
        Ok(())
    }

    async fn persist_position(&self, position: &Position) -> Result<()> {
        let key = Keys::position(&position.strategy_owner, &position.symbol);
        let store = self.store.as_ref();
        let _index = self.index_lock.lock().await;
        save_json(store, &key, position, None).await?;
        KeyIndex::add(store, Keys::POSITIONS, &key).await?;
        Ok(())
    }

    /// Rebuild orders and positions from the store
    pub async fn restore(&self) -> Result<RestoreReport> {
        let store = self.store.as_ref();
        let mut report = RestoreReport::default();

        let positions = KeyIndex::load(store, Keys::POSITIONS).await?;
        for key in &positions.members {
            match load_json::<Position>(store, key).await? {
                Some(position) => {
                    self.positions.insert(position);
                    report.positions += 1;
                }
                None => warn!("[ORDERS] Position index names missing record {}", key),
            }
        }

        let open = KeyIndex::load(store, Keys::OPEN_ORDERS).await?;
        for id in &open.members {
            let order_id: OrderId = id.parse().map_err(|_| Error::CorruptedOrder {
                order_id: id.clone(),
                reason: "not a uuid".into(),
            })?;
            let Some(order) = load_json::<Order>(store, &Keys::order(&order_id)).await? else {
                warn!("[ORDERS] Open order index names missing record {}", id);
                continue;
            };
            if order.filled_quantity > order.quantity || order.quantity <= Decimal::ZERO {
                return Err(Error::CorruptedOrder {
                    order_id: id.clone(),
                    reason: format!(
                        "filled {} of {}",
                        order.filled_quantity, order.quantity
                    ),
                });
            }
            if order.status.is_terminal() {
                continue;
            }
            if order.status == OrderStatus::Pending {
                // Crashed before the broker answered; the broker may still know it
                warn!(
                    "[ORDERS] Order {} restored as PENDING, awaiting broker updates",
                    order.order_id
                );
            }
            self.orders.insert(order.order_id, order);
            report.orders += 1;
        }

        info!(
            "[ORDERS] Restored {} open orders and {} positions",
            report.orders, report.positions
        );
        self.risk.update_portfolio_value(self.portfolio_value());
        Ok(report)
    }
}

fn classify(error: &GatewayError, exhausted: bool) -> RejectReason {
    if exhausted {
        return RejectReason::BrokerUnreachable;
    }
    match error {
        GatewayError::Unauthenticated(_) => RejectReason::Unauthenticated,
        GatewayError::Rejected(_) | GatewayError::SymbolRejected { .. } => {
            RejectReason::BrokerRejected
        }
        _ => RejectReason::BrokerUnreachable,
    }
}

fn exit_reason(
    return_percent: Decimal,
    stop_loss_percent: Decimal,
    target_percent: Decimal,
    time_stop: Option<Timestamp>,
    now: Timestamp,
) -> Option<ExitReason> {
    if stop_loss_percent > Decimal::ZERO && return_percent <= -stop_loss_percent {
        Some(ExitReason::StopLoss)
    } else if target_percent > Decimal::ZERO && return_percent >= target_percent {
        Some(ExitReason::Target)
    } else if time_stop.is_some_and(|t| now >= t) {
        Some(ExitReason::TimeStop)
    } else {
        None
    }
}
