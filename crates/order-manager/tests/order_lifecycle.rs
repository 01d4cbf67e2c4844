//! Order Manager Integration Test
//!
//! Drives admitted signals through the order manager against the paper
//! broker and an in-memory store:
//! 1. Idempotent submission across a restart
//! 2. Fills flowing into positions and strategy capital
//! 3. Retry exhaustion, broker rejections and missing sessions
//! 4. Stop-loss and linked-leg exits
//! 5. Restoring open orders after a restart
//! 6. Per-symbol serialization of submissions

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use aegis_clock::ManualClock;
use aegis_core::{
    LegLink, MarketSnapshot, MarketTick, OrderStatus, RejectReason, Side, Signal, Timestamp,
    TradingSession,
};
use aegis_gateway::{
    BrokerGateway, OrderAck, OrderRequest, OrderUpdate, PaperBroker, ScriptedFailure,
    SessionToken, StaticSessionProvider,
};
use aegis_order_manager::{OrderManager, OrderManagerConfig, RetryPolicy, SubmitOutcome};
use aegis_ports::{Clock, StateStore};
use aegis_risk_manager::{
    Admission, ApprovedSignal, RiskConfig, RiskManager, StrategyAllocationConfig,
};
use aegis_store::MemoryStore;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::{Notify, Semaphore};

fn t0() -> Timestamp {
    // 10:00 New York
    Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap()
}

fn risk_config() -> RiskConfig {
    let mut config = RiskConfig::default();
    config.max_symbol_concentration = dec!(0.5);
    config.allocator.strategies = ["vb", "mr", "straddle"]
        .iter()
        .map(|name| StrategyAllocationConfig {
            name: name.to_string(),
            fraction: dec!(0.2),
            base_size_fraction: dec!(0.3),
            max_position_fraction: dec!(0.5),
        })
        .collect();
    config
}

fn fast_retry() -> OrderManagerConfig {
    OrderManagerConfig {
        retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 4,
            multiplier: 2,
        },
        ..Default::default()
    }
}

struct Harness {
    clock: Arc<ManualClock>,
    store: Arc<MemoryStore>,
    broker: Arc<PaperBroker>,
    sessions: Arc<StaticSessionProvider>,
    risk: Arc<RiskManager>,
    om: OrderManager,
}

impl Harness {
    fn new(broker: PaperBroker) -> Self {
        Self::with_parts(
            ManualClock::new(t0()),
            Arc::new(MemoryStore::new()),
            Arc::new(broker),
        )
    }

    /// Fresh process over the same store and broker
    fn restart(&self) -> Self {
        Self::with_parts(self.clock.clone(), self.store.clone(), self.broker.clone())
    }

    fn with_parts(clock: Arc<ManualClock>, store: Arc<MemoryStore>, broker: Arc<PaperBroker>) -> Self {
        let sessions = Arc::new(StaticSessionProvider::new("paper-token"));
        let risk = Arc::new(
            RiskManager::new(risk_config(), dec!(1_000_000), clock.clone())
                .unwrap()
                .with_store(store.clone()),
        );
        let om = OrderManager::new(
            fast_retry(),
            broker.clone(),
            sessions.clone(),
            store.clone(),
            risk.clone(),
            clock.clone(),
            TradingSession::default(),
            dec!(1_000_000),
        );
        Self {
            clock,
            store,
            broker,
            sessions,
            risk,
            om,
        }
    }

    fn admit(&self, signal: &Signal) -> ApprovedSignal {
        match self.risk.evaluate(signal, &self.om.portfolio_state()) {
            Admission::Approved(a) => a,
            Admission::Rejected(r) => panic!("unexpected rejection {:?}", r),
        }
    }

    async fn mark(&self, prices: &[(&str, Decimal)]) -> Decimal {
        let now = self.clock.now();
        let mut snapshot = MarketSnapshot::empty(now);
        for (symbol, price) in prices {
            snapshot.ticks.insert(
                symbol.to_string(),
                MarketTick::new(*symbol, *price, *price, *price, dec!(1000), now),
            );
        }
        self.om.mark_to_market(&snapshot).await.unwrap()
    }
}

fn signal(strategy: &str, symbol: &str, side: Side, price: Decimal) -> Signal {
    let mut s = Signal::new(
        strategy,
        symbol,
        side,
        dec!(1),
        price,
        t0(),
        t0() + Duration::minutes(60),
    )
    .with_exits(dec!(0.02), dec!(0.04));
    s.metadata.volatility = Some(Decimal::ZERO);
    s
}

#[tokio::test]
async fn test_fill_updates_position_and_capital() {
    let _ = env_logger::try_init();
    let h = Harness::new(PaperBroker::default());

    let approved = h.admit(&signal("vb", "AAPL", Side::Buy, dec!(100)));
    assert_eq!(approved.signal.quantity, dec!(600));
    let outcome = h.om.submit(approved).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Submitted(_)));
    assert_eq!(h.om.orders_placed_today(), 1);

    assert_eq!(h.om.poll_broker().await.unwrap(), 1);
    let pos = h.om.position("vb", "AAPL").unwrap();
    assert_eq!(pos.quantity, dec!(600));
    assert_eq!(pos.average_price, dec!(100));
    assert_eq!(pos.time_stop, Some(t0() + Duration::minutes(60)));
    assert!(h.om.open_orders().is_empty());

    // Reservation became position capital
    assert_eq!(h.risk.strategy_capital("vb"), dec!(140_000));
    assert_eq!(h.risk.strategy_capital("mr"), dec!(200_000));
}

#[tokio::test]
async fn test_same_signal_after_restart_is_not_resubmitted() {
    let h = Harness::new(PaperBroker::default());
    let sig = signal("vb", "AAPL", Side::Buy, dec!(100));

    let first = h.om.submit(h.admit(&sig)).await.unwrap();
    assert!(matches!(first, SubmitOutcome::Submitted(_)));
    assert!(h.om.already_executed("vb", "AAPL", Side::Buy).await.unwrap());

    let restarted = h.restart();
    let second = restarted.om.submit(restarted.admit(&sig)).await.unwrap();
    assert!(matches!(second, SubmitOutcome::Duplicate { .. }));

    assert_eq!(h.broker.accepted_count(), 1);
    // Duplicate handed its reservation back
    assert_eq!(restarted.risk.strategy_capital("vb"), dec!(200_000));
}

#[tokio::test]
async fn test_idempotency_key_records_order_id() {
    let h = Harness::new(PaperBroker::default());
    let sig = signal("vb", "AAPL", Side::Buy, dec!(100));
    h.om.submit(h.admit(&sig)).await.unwrap();

    let key = {
        let day = TradingSession::default().trading_day(t0());
        aegis_store::Keys::executed(&day, "vb", "AAPL", Side::Buy)
    };
    let stored = h.store.get(&key).await.unwrap().unwrap();
    assert!(stored.parse::<aegis_core::OrderId>().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_retry_exhaustion_rejects_without_blacklisting() {
    let h = Harness::new(PaperBroker::default());
    h.broker.set_outage(true);

    let outcome = h
        .om
        .submit(h.admit(&signal("vb", "AAPL", Side::Buy, dec!(100))))
        .await
        .unwrap();
    let SubmitOutcome::Rejected(order) = outcome else {
        panic!("expected rejection");
    };
    assert_eq!(order.status, OrderStatus::Rejected);
    assert_eq!(order.reject_reason, Some(RejectReason::BrokerUnreachable));
    assert_eq!(order.retries, 2);
    assert_eq!(h.broker.submit_calls(), 3);

    // General outage is not the symbol's fault
    assert!(!h.risk.is_blacklisted("AAPL").0);
    assert_eq!(h.risk.strategy_capital("vb"), dec!(200_000));
    // Key released so the signal can be retried later today
    assert!(!h.om.already_executed("vb", "AAPL", Side::Buy).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_then_success() {
    let h = Harness::new(PaperBroker::default());
    h.broker.fail_next(1, ScriptedFailure::Timeout);

    let outcome = h
        .om
        .submit(h.admit(&signal("vb", "AAPL", Side::Buy, dec!(100))))
        .await
        .unwrap();
    let SubmitOutcome::Submitted(order) = outcome else {
        panic!("expected submission");
    };
    assert_eq!(order.retries, 1);
}

#[tokio::test]
async fn test_symbol_rejections_feed_blacklist() {
    let h = Harness::new(PaperBroker::default());
    h.broker.block_symbol("XYZ", "symbol halted");

    for _ in 0..3 {
        let outcome = h
            .om
            .submit(h.admit(&signal("vb", "XYZ", Side::Buy, dec!(50))))
            .await
            .unwrap();
        let SubmitOutcome::Rejected(order) = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(order.reject_reason, Some(RejectReason::BrokerRejected));
    }

    let (banned, reason) = h.risk.is_blacklisted("XYZ");
    assert!(banned);
    assert!(reason.unwrap().contains("halted"));

    let admission = h.risk.evaluate(
        &signal("vb", "XYZ", Side::Buy, dec!(50)),
        &h.om.portfolio_state(),
    );
    assert_eq!(admission.reason(), Some(RejectReason::BlacklistedSymbol));
}

#[tokio::test]
async fn test_missing_session_rejects_unauthenticated() {
    let h = Harness::new(PaperBroker::default());
    h.sessions.revoke();

    let outcome = h
        .om
        .submit(h.admit(&signal("vb", "AAPL", Side::Buy, dec!(100))))
        .await
        .unwrap();
    let SubmitOutcome::Rejected(order) = outcome else {
        panic!("expected rejection");
    };
    assert_eq!(order.reject_reason, Some(RejectReason::Unauthenticated));
    assert_eq!(h.broker.submit_calls(), 0);
}

#[tokio::test]
async fn test_stop_loss_closes_and_releases_capital() {
    let h = Harness::new(PaperBroker::default());
    h.om
        .submit(h.admit(&signal("vb", "AAPL", Side::Buy, dec!(100))))
        .await
        .unwrap();
    h.om.poll_broker().await.unwrap();

    // Within the stop, nothing happens
    h.mark(&[("AAPL", dec!(99))]).await;
    assert!(h.om.check_exits().await.unwrap().is_empty());

    let value = h.mark(&[("AAPL", dec!(97))]).await;
    assert_eq!(value, dec!(998_200));

    let exits = h.om.check_exits().await.unwrap();
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0].side, Side::Sell);
    assert_eq!(exits[0].quantity, dec!(600));
    // Already closing, not sent twice
    assert!(h.om.check_exits().await.unwrap().is_empty());

    h.om.poll_broker().await.unwrap();
    let pos = h.om.position("vb", "AAPL").unwrap();
    assert!(pos.is_flat());
    assert_eq!(pos.realized_pnl, dec!(-1800));
    assert_eq!(h.risk.strategy_capital("vb"), dec!(200_000));
}

#[tokio::test]
async fn test_exit_allowed_during_drawdown_halt() {
    let h = Harness::new(PaperBroker::default());
    h.om
        .submit(h.admit(&signal("vb", "AAPL", Side::Buy, dec!(100))))
        .await
        .unwrap();
    h.om.poll_broker().await.unwrap();

    h.risk.update_portfolio_value(dec!(850_000));
    let blocked = h.risk.evaluate(
        &signal("mr", "MSFT", Side::Buy, dec!(100)),
        &h.om.portfolio_state(),
    );
    assert_eq!(blocked.reason(), Some(RejectReason::DrawdownBreach));

    // Time stop passes while the halt is still in force
    h.clock.advance(Duration::minutes(61));
    let exits = h.om.check_exits().await.unwrap();
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0].status, OrderStatus::Submitted);
}

#[tokio::test]
async fn test_symbol_loss_crossings_feed_blacklist() {
    let _ = env_logger::try_init();
    let h = Harness::new(PaperBroker::default());
    h.om
        .submit(h.admit(&signal("vb", "AAPL", Side::Buy, dec!(100))))
        .await
        .unwrap();
    h.om.poll_broker().await.unwrap();
    // 1% of 1M
    assert_eq!(h.risk.symbol_loss_limit(), Some(dec!(10_000)));

    // 600 × -20 = -12k, one violation per crossing not per mark
    h.mark(&[("AAPL", dec!(80))]).await;
    h.mark(&[("AAPL", dec!(79))]).await;
    assert_eq!(h.risk.blacklist_entry("AAPL").unwrap().violation_count, 1);
    assert!(!h.risk.is_blacklisted("AAPL").0);

    h.mark(&[("AAPL", dec!(100))]).await;
    h.mark(&[("AAPL", dec!(80))]).await;
    h.mark(&[("AAPL", dec!(100))]).await;
    h.mark(&[("AAPL", dec!(80))]).await;
    assert_eq!(h.risk.blacklist_entry("AAPL").unwrap().violation_count, 3);
    assert!(h.risk.is_blacklisted("AAPL").0);

    let admission = h.risk.evaluate(
        &signal("mr", "AAPL", Side::Buy, dec!(80)),
        &h.om.portfolio_state(),
    );
    assert_eq!(admission.reason(), Some(RejectReason::BlacklistedSymbol));
    // Other symbols are unaffected
    assert!(!h.risk.is_blacklisted("MSFT").0);
}

fn straddle_legs(group: &str) -> Vec<Signal> {
    let legs = [("AAPL_C190", dec!(4)), ("AAPL_P190", dec!(4))];
    legs.iter()
        .enumerate()
        .map(|(i, (symbol, price))| {
            let mut s = signal("straddle", symbol, Side::Buy, *price).with_exits(dec!(0.25), dec!(0.4));
            s.metadata.leg = Some(LegLink {
                group_id: group.to_string(),
                leg_index: i,
                leg_count: 2,
                partner_symbols: vec![legs[1 - i].0.to_string()],
            });
            s
        })
        .collect()
}

#[tokio::test]
async fn test_linked_legs_exit_on_combined_pnl() {
    let h = Harness::new(PaperBroker::default());
    for leg in straddle_legs("g1") {
        h.om.submit(h.admit(&leg)).await.unwrap();
    }
    h.om.poll_broker().await.unwrap();

    // Call +50%, put -50%: the put alone would stop out, combined is +9%
    h.mark(&[("AAPL_C190", dec!(6)), ("AAPL_P190", dec!(2))]).await;
    assert!(h.om.check_exits().await.unwrap().is_empty());

    // Call +100%, put -25%: combined above the 40% target
    h.mark(&[("AAPL_C190", dec!(8)), ("AAPL_P190", dec!(3))]).await;
    let exits = h.om.check_exits().await.unwrap();
    let mut symbols: Vec<_> = exits.iter().map(|o| o.symbol.as_str()).collect();
    symbols.sort();
    assert_eq!(symbols, vec!["AAPL_C190", "AAPL_P190"]);
}

#[tokio::test]
async fn test_open_orders_survive_restart() {
    let h = Harness::new(PaperBroker::deferred());
    let outcome = h
        .om
        .submit(h.admit(&signal("vb", "AAPL", Side::Buy, dec!(100))))
        .await
        .unwrap();
    let order_id = outcome.order().unwrap().order_id;
    assert_eq!(h.om.open_orders().len(), 1);
    h.risk.persist().await.unwrap();

    let restarted = h.restart();
    assert!(restarted.risk.load().await.unwrap());
    let report = restarted.om.restore().await.unwrap();
    assert_eq!(report.orders, 1);
    assert_eq!(restarted.om.open_orders()[0].order_id, order_id);

    // Fill observed only by the new process
    h.broker.fill_order(&order_id, dec!(300), None).await.unwrap();
    restarted.om.poll_broker().await.unwrap();
    let order = restarted.om.order(&order_id).unwrap();
    assert_eq!(order.status, OrderStatus::PartiallyFilled);
    assert_eq!(restarted.om.position("vb", "AAPL").unwrap().quantity, dec!(300));

    // Broker cancels the rest; the unused reservation comes back
    h.broker.cancel_from_broker(&order_id, "end of day").await.unwrap();
    restarted.om.poll_broker().await.unwrap();
    assert!(restarted.om.open_orders().is_empty());
    let used = restarted.risk.allocation("vb").unwrap().used_capital;
    assert_eq!(used, dec!(30_000));
}

/// Paper broker that parks submissions for one symbol until released and
/// records how many calls per symbol were inside the broker at once
struct GatedBroker {
    inner: PaperBroker,
    gated_symbol: String,
    gate: Semaphore,
    entered: Notify,
    /// symbol -> (in flight now, most ever in flight)
    in_flight: Mutex<HashMap<String, (usize, usize)>>,
}

impl GatedBroker {
    fn new(gated_symbol: &str) -> Self {
        Self {
            inner: PaperBroker::default(),
            gated_symbol: gated_symbol.to_string(),
            gate: Semaphore::new(0),
            entered: Notify::new(),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    fn track(&self, symbol: &str, delta: isize) {
        let mut map = self.in_flight.lock().unwrap();
        let (now, max) = map.entry(symbol.to_string()).or_insert((0, 0));
        *now = now.checked_add_signed(delta).unwrap();
        *max = (*max).max(*now);
    }

    fn max_in_flight(&self, symbol: &str) -> usize {
        self.in_flight.lock().unwrap().get(symbol).map_or(0, |(_, max)| *max)
    }
}

#[async_trait]
impl BrokerGateway for GatedBroker {
    async fn submit_order(
        &self,
        token: &SessionToken,
        request: &OrderRequest,
    ) -> aegis_gateway::Result<OrderAck> {
        self.track(&request.symbol, 1);
        if request.symbol == self.gated_symbol {
            self.entered.notify_one();
            self.gate.acquire().await.unwrap().forget();
        }
        let ack = self.inner.submit_order(token, request).await;
        self.track(&request.symbol, -1);
        ack
    }

    async fn cancel_order(&self, token: &SessionToken, broker_order_id: &str) -> aegis_gateway::Result<()> {
        self.inner.cancel_order(token, broker_order_id).await
    }

    async fn poll_updates(&self) -> aegis_gateway::Result<Vec<OrderUpdate>> {
        self.inner.poll_updates().await
    }
}

#[tokio::test]
async fn test_same_symbol_submissions_serialize_other_symbols_proceed() {
    let _ = env_logger::try_init();
    let clock = ManualClock::new(t0());
    let store = Arc::new(MemoryStore::new());
    let broker = Arc::new(GatedBroker::new("AAPL"));
    let risk = Arc::new(RiskManager::new(risk_config(), dec!(1_000_000), clock.clone()).unwrap());
    let om = Arc::new(OrderManager::new(
        fast_retry(),
        broker.clone(),
        Arc::new(StaticSessionProvider::new("paper-token")),
        store,
        risk.clone(),
        clock,
        TradingSession::default(),
        dec!(1_000_000),
    ));

    let admit = |strategy: &str, symbol: &str| match risk
        .evaluate(&signal(strategy, symbol, Side::Buy, dec!(100)), &om.portfolio_state())
    {
        Admission::Approved(a) => a,
        Admission::Rejected(r) => panic!("unexpected rejection {:?}", r),
    };
    let first = admit("vb", "AAPL");
    let second = admit("mr", "AAPL");
    let other = admit("vb", "MSFT");

    let first = tokio::spawn({
        let om = om.clone();
        async move { om.submit(first).await }
    });
    broker.entered.notified().await;

    let second = tokio::spawn({
        let om = om.clone();
        async move { om.submit(second).await }
    });
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }

    // AAPL is parked inside the broker; MSFT goes straight through
    let outcome = om.submit(other).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Submitted(_)));
    assert_eq!(broker.inner.accepted_count(), 1);
    assert_eq!(broker.max_in_flight("AAPL"), 1);

    broker.gate.add_permits(2);
    for handle in [first, second] {
        let outcome = handle.await.unwrap().unwrap();
        assert!(matches!(outcome, SubmitOutcome::Submitted(_)));
    }
    assert_eq!(broker.inner.accepted_count(), 3);
    // The second AAPL order waited on the symbol, never on the broker
    assert_eq!(broker.max_in_flight("AAPL"), 1);
    assert_eq!(broker.max_in_flight("MSFT"), 1);
}
