//! Orchestrator - drives the evaluation cycle
//!
//! ```text
//!   broker fills ─► feed snapshot ─► mark to market ─► exits
//!                                        │
//!                                        ▼
//!            JoinSet[strategy × symbol]  (Semaphore, deadline)
//!                                        │ Vec<Signal>
//!                                        ▼
//!                                SignalAggregator
//!                                        │ ranked
//!                                        ▼
//!                  RiskManager::evaluate (sequential, rank order)
//!                                        │ approved
//!                                        ▼
//!               OrderManager::submit (concurrent across symbols)
//! ```
//!
//! The orchestrator owns the only handle allowed to flip trading on or off
//! and the only place fatal errors turn into a halt.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::{Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use aegis_core::{MarketSnapshot, RejectReason, Signal, Timestamp, TradingSession};
use aegis_gateway::{MarketDataFeed, SessionProvider};
use aegis_order_manager::{OrderManager, SignalAggregator, SubmitOutcome};
use aegis_ports::Clock;
use aegis_risk_manager::{Admission, ApprovedSignal, PortfolioState, RiskManager};
use aegis_strategy::{SignalGenerator, StrategyContext};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, Semaphore, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{MissedTickBehavior, interval, timeout};

use crate::config::{CycleConfig, PipelineConfig};
use crate::error::{Error, Result};
use crate::status::{CycleReport, StatusReport};

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Downgrade non-fatal errors to a warning so the cycle carries on
fn tolerate<T, E: Into<Error>>(stage: &str, result: std::result::Result<T, E>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            let e: Error = e.into();
            if e.is_fatal() {
                return Err(e);
            }
            warn!("[ORCHESTRATOR] {} failed: {}", stage, e);
            Ok(None)
        }
    }
}

/// Everything the orchestrator drives, already built
pub struct Components {
    pub clock: Arc<dyn Clock>,
    pub feed: Arc<dyn MarketDataFeed>,
    pub sessions: Arc<dyn SessionProvider>,
    pub risk: Arc<RiskManager>,
    pub orders: Arc<OrderManager>,
    pub generators: Vec<Box<dyn SignalGenerator>>,
}

struct GeneratorSlot {
    name: String,
    symbols: Vec<String>,
    generator: Arc<StdMutex<Box<dyn SignalGenerator>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Created,
    Running,
    Halted(String),
    Stopping,
    Stopped,
}

/// What startup found in the store
#[derive(Debug, Clone, PartialEq)]
pub struct StartupReport {
    pub risk_state_found: bool,
    pub orders: usize,
    pub positions: usize,
    pub portfolio_value: Decimal,
}

enum UnitAdmission {
    Approved(Vec<ApprovedSignal>, PortfolioState),
    Rejected(Vec<(String, RejectReason)>),
    Skipped,
}

pub struct Orchestrator {
    cycle: CycleConfig,
    session: TradingSession,
    symbols: Vec<String>,
    clock: Arc<dyn Clock>,
    feed: Arc<dyn MarketDataFeed>,
    sessions: Arc<dyn SessionProvider>,
    risk: Arc<RiskManager>,
    orders: Arc<OrderManager>,
    generators: Vec<GeneratorSlot>,
    aggregator: StdMutex<SignalAggregator>,
    previous_volatility_index: StdMutex<Option<Decimal>>,
    generated_today: StdMutex<(String, u64)>,
    phase: StdMutex<Phase>,
    cycle_lock: Mutex<()>,
    shutdown_tx: watch::Sender<bool>,
    tasks: StdMutex<Vec<JoinHandle<()>>>,
}

impl Orchestrator {
    pub fn new(config: &PipelineConfig, components: Components) -> Self {
        let mut symbols: BTreeSet<String> = config.symbols().into_iter().collect();
        for generator in &components.generators {
            symbols.extend(generator.symbols().iter().cloned());
        }

        let generators = components
            .generators
            .into_iter()
            .map(|generator| GeneratorSlot {
                name: generator.name().to_string(),
                symbols: generator.symbols().to_vec(),
                generator: Arc::new(StdMutex::new(generator)),
            })
            .collect();
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            cycle: config.cycle.clone(),
            session: config.session.clone(),
            symbols: symbols.into_iter().collect(),
            clock: components.clock,
            feed: components.feed,
            sessions: components.sessions,
            risk: components.risk,
            orders: components.orders,
            generators,
            aggregator: StdMutex::new(SignalAggregator::new(
                config.aggregator.clone(),
                config.session.clone(),
            )),
            previous_volatility_index: StdMutex::new(None),
            generated_today: StdMutex::new((String::new(), 0)),
            phase: StdMutex::new(Phase::Created),
            cycle_lock: Mutex::new(()),
            shutdown_tx,
            tasks: StdMutex::new(Vec::new()),
        }
    }

    pub fn risk(&self) -> &Arc<RiskManager> {
        &self.risk
    }

    pub fn orders(&self) -> &Arc<OrderManager> {
        &self.orders
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Reload risk state, orders and positions before any signal is accepted
    ///
    /// Any failure here is fatal: trading on unknown risk state is worse
    /// than not trading.
    pub async fn restore(&self) -> Result<StartupReport> {
        let risk_state_found = match self.risk.load().await {
            Ok(found) => found,
            Err(e) => return Err(self.halt(format!("risk state unreadable: {}", e))),
        };
        let restored = match self.orders.restore().await {
            Ok(report) => report,
            Err(e) => return Err(self.halt(format!("orders unreadable: {}", e))),
        };

        let portfolio_value = self.orders.portfolio_value();
        self.risk.update_portfolio_value(portfolio_value);
        if let Err(e) = self.risk.persist().await {
            return Err(self.halt(format!("risk state not writable: {}", e)));
        }

        {
            let mut phase = lock(&self.phase);
            if *phase == Phase::Created {
                *phase = Phase::Running;
            }
        }

        info!(
            "[ORCHESTRATOR] Restored {} open orders, {} positions (risk state {}), portfolio {}",
            restored.orders,
            restored.positions,
            if risk_state_found { "found" } else { "fresh" },
            portfolio_value
        );
        Ok(StartupReport {
            risk_state_found,
            orders: restored.orders,
            positions: restored.positions,
            portfolio_value,
        })
    }

    /// Restore, then run cycles and blacklist cleanup in the background
    pub async fn start(self: &Arc<Self>) -> Result<StartupReport> {
        let report = self.restore().await?;

        let cycles = tokio::spawn(self.clone().cycle_loop(self.shutdown_tx.subscribe()));
        let cleanup = tokio::spawn(self.clone().cleanup_loop(self.shutdown_tx.subscribe()));
        lock(&self.tasks).extend([cycles, cleanup]);

        info!(
            "[ORCHESTRATOR] Started: {} generators over {} symbols every {}ms",
            self.generators.len(),
            self.symbols.len(),
            self.cycle.interval_ms
        );
        Ok(report)
    }

    /// Stop scheduling cycles and wait for in-flight work
    ///
    /// A cycle already running finishes its submissions; orders already at
    /// the broker stay tracked in the store for the next start.
    pub async fn shutdown(&self) -> Result<()> {
        {
            let mut phase = lock(&self.phase);
            if matches!(*phase, Phase::Created | Phase::Running) {
                *phase = Phase::Stopping;
            }
        }
        self.shutdown_tx.send_replace(true);
        info!("[ORCHESTRATOR] Shutdown requested, waiting for in-flight work");

        let grace = Duration::from_millis(self.cycle.shutdown_grace_ms);
        let handles = std::mem::take(&mut *lock(&self.tasks));
        for handle in handles {
            if timeout(grace, handle).await.is_err() {
                warn!("[ORCHESTRATOR] Task still running after {:?}", grace);
            }
        }

        // A directly invoked cycle may still hold the lock
        let _cycle = timeout(grace, self.cycle_lock.lock()).await;
        self.risk.persist().await?;

        {
            let mut phase = lock(&self.phase);
            if *phase == Phase::Stopping {
                *phase = Phase::Stopped;
            }
        }
        info!("[ORCHESTRATOR] Stopped");
        Ok(())
    }

    /// Operator switch; the orchestrator is the only caller of the risk flag
    pub async fn set_trading_enabled(&self, enabled: bool, reason: Option<String>) -> Result<()> {
        if enabled && let Phase::Halted(halt) = &*lock(&self.phase) {
            warn!(
                "[ORCHESTRATOR] Trading stays halted after a fatal error: {}",
                halt
            );
            return Ok(());
        }
        self.risk.set_trading_enabled(enabled, reason);
        Ok(())
    }

    pub fn is_halted(&self) -> bool {
        matches!(*lock(&self.phase), Phase::Halted(_))
    }

    fn halt(&self, reason: String) -> Error {
        error!("[ORCHESTRATOR] HALT: {}", reason);
        *lock(&self.phase) = Phase::Halted(reason.clone());
        self.risk.set_trading_enabled(false, Some(reason.clone()));
        Error::Fatal(reason)
    }

    fn ensure_running(&self) -> Result<()> {
        match &*lock(&self.phase) {
            Phase::Running => Ok(()),
            Phase::Created => Err(Error::NotStarted),
            Phase::Halted(reason) => Err(Error::Halted(reason.clone())),
            Phase::Stopping | Phase::Stopped => Err(Error::ShuttingDown),
        }
    }

    async fn cycle_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(Duration::from_millis(self.cycle.interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
            if *shutdown.borrow() {
                break;
            }

            // Not raced against shutdown: submissions run to completion
            match self.run_cycle().await {
                Ok(report) => {
                    if let Some(reason) = &report.aborted {
                        debug!("[ORCHESTRATOR] Cycle aborted: {}", reason);
                    }
                }
                Err(e) if e.is_fatal() => {
                    error!("[ORCHESTRATOR] No further cycles: {}", e);
                    break;
                }
                Err(Error::ShuttingDown) => break,
                Err(e) => warn!("[ORCHESTRATOR] Cycle failed: {}", e),
            }
        }
        debug!("[ORCHESTRATOR] Cycle loop exited");
    }

    async fn cleanup_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let every = self.risk.config().blacklist.cleanup_interval_secs.max(1);
        let mut ticker = interval(Duration::from_secs(every));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.risk.cleanup_blacklist() > 0
                        && let Err(e) = self.risk.persist().await
                    {
                        warn!("[ORCHESTRATOR] Persist after blacklist cleanup failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }

    // ========================================================================
    // Cycle
    // ========================================================================

    /// One evaluation cycle; fatal errors halt the orchestrator
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        self.ensure_running()?;
        let _cycle = self.cycle_lock.lock().await;

        match self.cycle_inner().await {
            Err(e) if e.is_fatal() => Err(self.halt(e.to_string())),
            other => other,
        }
    }

    async fn cycle_inner(&self) -> Result<CycleReport> {
        let now = self.clock.now();

        // Orders already at the broker are tracked whatever the feed does
        tolerate("broker poll", self.orders.poll_broker().await)?;

        let raw = match self.feed.snapshot(&self.symbols, now).await {
            Ok(snapshot) if snapshot.connected => snapshot,
            Ok(_) => {
                warn!("[ORCHESTRATOR] {} disconnected, skipping cycle", self.feed.name());
                return Ok(CycleReport::aborted("feed disconnected"));
            }
            Err(e) => {
                warn!("[ORCHESTRATOR] {} failed, skipping cycle: {}", self.feed.name(), e);
                return Ok(CycleReport::aborted(format!("feed: {}", e)));
            }
        };
        let volatility_index = raw.volatility_index;
        let snapshot = Arc::new(self.fresh_only(raw, now));

        let mut report = CycleReport::default();
        tolerate("mark to market", self.orders.mark_to_market(&snapshot).await)?;
        if let Some(exits) = tolerate("exit check", self.orders.check_exits().await)? {
            report.exits = exits.len();
        }

        let deadline = Duration::from_millis(self.cycle.evaluation_timeout_ms);
        match timeout(deadline, self.generate(snapshot.clone(), now)).await {
            Ok((signals, failed)) => {
                report.generated = signals.len();
                report.failed_evaluations = failed;
                self.count_generated(now, signals.len() as u64);
                self.admit_and_submit(signals, now, &mut report).await?;
            }
            Err(_) => {
                warn!(
                    "[ORCHESTRATOR] Evaluations exceeded {:?}, discarding this cycle's signals",
                    deadline
                );
                report.aborted = Some("evaluation deadline exceeded".into());
            }
        }

        *lock(&self.previous_volatility_index) = volatility_index;
        tolerate("risk persist", self.risk.persist().await)?;

        if report.emitted > 0 || report.exits > 0 {
            info!(
                "[ORCHESTRATOR] Cycle: {} generated, {} emitted, {} submitted, {} rejected, {} exits",
                report.generated,
                report.emitted,
                report.submitted,
                report.rejected.len(),
                report.exits
            );
        }
        Ok(report)
    }

    /// Drop ticks too old to act on
    fn fresh_only(&self, mut snapshot: MarketSnapshot, now: Timestamp) -> MarketSnapshot {
        let max_age = chrono::Duration::seconds(self.cycle.max_tick_age_secs);
        snapshot.ticks.retain(|symbol, tick| {
            let stale = tick.is_stale(now, max_age);
            if stale {
                debug!(
                    "[ORCHESTRATOR] Skipping {}: last tick {} is stale",
                    symbol, tick.timestamp
                );
            }
            !stale
        });
        snapshot
    }

    /// Fan out one task per (strategy, symbol) with a fresh tick
    ///
    /// A failing or panicking generator only loses its own signals.
    async fn generate(&self, snapshot: Arc<MarketSnapshot>, now: Timestamp) -> (Vec<Signal>, usize) {
        let permits = Arc::new(Semaphore::new(self.cycle.max_concurrent_evaluations));
        let previous_volatility_index = *lock(&self.previous_volatility_index);
        let portfolio_stress = self.risk.portfolio_stress();
        let mut tasks = JoinSet::new();

        for slot in &self.generators {
            for symbol in &slot.symbols {
                let Some(tick) = snapshot.tick(symbol).cloned() else {
                    continue;
                };
                let Ok(permit) = permits.clone().acquire_owned().await else {
                    break;
                };

                let generator = slot.generator.clone();
                let snapshot = snapshot.clone();
                let session = self.session.clone();
                let name = slot.name.clone();
                tasks.spawn_blocking(move || {
                    let _permit = permit;
                    let ctx = StrategyContext {
                        now,
                        snapshot: &snapshot,
                        previous_volatility_index,
                        portfolio_stress,
                        session: &session,
                    };
                    let result = lock(&generator).evaluate(&tick, &ctx);
                    (name, tick.symbol, result)
                });
            }
        }

        let mut signals = Vec::new();
        let mut failed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, _, Ok(mut produced))) => signals.append(&mut produced),
                Ok((name, symbol, Err(e))) => {
                    failed += 1;
                    warn!("[ORCHESTRATOR] {} on {} produced no signal: {}", name, symbol, e);
                }
                Err(e) => {
                    failed += 1;
                    error!("[ORCHESTRATOR] Generator task died: {}", e);
                }
            }
        }
        (signals, failed)
    }

    async fn admit_and_submit(
        &self,
        signals: Vec<Signal>,
        now: Timestamp,
        report: &mut CycleReport,
    ) -> Result<()> {
        let outcome = lock(&self.aggregator).aggregate(signals, now);
        report.emitted = outcome.emitted.len();
        report.dropped = outcome
            .dropped
            .iter()
            .map(|d| (d.signal.symbol.clone(), d.reason))
            .collect();
        if outcome.emitted.is_empty() {
            return Ok(());
        }

        if let Err(e) = self.sessions.get_valid_token().await {
            error!(
                "[ORCHESTRATOR] {} signals held back, no broker session: {}",
                outcome.emitted.len(),
                e
            );
            report.rejected.extend(
                outcome
                    .emitted
                    .iter()
                    .map(|s| (s.symbol.clone(), RejectReason::Unauthenticated)),
            );
            return Ok(());
        }

        let approved = self.admit(outcome.emitted, report).await?;
        self.submit_all(approved, report).await
    }

    /// Sequential admission in rank order; earlier signals claim capital first
    async fn admit(
        &self,
        emitted: Vec<Signal>,
        report: &mut CycleReport,
    ) -> Result<Vec<ApprovedSignal>> {
        let mut portfolio = self.orders.portfolio_state();
        let mut approved = Vec::new();

        for unit in leg_units(emitted) {
            match self.admit_unit(unit, &portfolio).await? {
                UnitAdmission::Approved(legs, after) => {
                    portfolio = after;
                    approved.extend(legs);
                }
                UnitAdmission::Rejected(rejections) => report.rejected.extend(rejections),
                UnitAdmission::Skipped => {}
            }
        }
        Ok(approved)
    }

    /// Linked legs are admitted together or not at all
    async fn admit_unit(&self, unit: Vec<Signal>, portfolio: &PortfolioState) -> Result<UnitAdmission> {
        let mut tentative = portfolio.clone();
        let mut legs: Vec<ApprovedSignal> = Vec::new();
        let mut failure = None;

        for signal in &unit {
            let executed = tolerate(
                "idempotency check",
                self.orders
                    .already_executed(&signal.strategy_name, &signal.symbol, signal.side)
                    .await,
            )?;
            match executed {
                None => {
                    self.release_legs(&legs);
                    return Ok(UnitAdmission::Skipped);
                }
                Some(true) => {
                    info!(
                        "[ORCHESTRATOR] {} {} {} {} already executed today",
                        RejectReason::DuplicateSignal,
                        signal.strategy_name,
                        signal.side,
                        signal.symbol
                    );
                    failure = Some(RejectReason::DuplicateSignal);
                    break;
                }
                Some(false) => {}
            }

            match self.risk.evaluate(signal, &tentative) {
                Admission::Approved(leg) => {
                    let notional = leg.signal.quantity * leg.signal.entry_price_estimate;
                    tentative = tentative.with_exposure(leg.signal.symbol.clone(), notional);
                    legs.push(leg);
                }
                Admission::Rejected(rejection) => {
                    failure = Some(rejection.reason);
                    break;
                }
            }
        }

        match failure {
            None => Ok(UnitAdmission::Approved(legs, tentative)),
            Some(reason) => {
                if !legs.is_empty() {
                    info!(
                        "[ORCHESTRATOR] Linked legs {:?} withdrawn: {}",
                        unit.iter().map(|s| s.symbol.as_str()).collect::<Vec<_>>(),
                        reason
                    );
                }
                self.release_legs(&legs);
                Ok(UnitAdmission::Rejected(
                    unit.iter().map(|s| (s.symbol.clone(), reason)).collect(),
                ))
            }
        }
    }

    fn release_legs(&self, legs: &[ApprovedSignal]) {
        for leg in legs {
            self.risk
                .release(&leg.signal.strategy_name, leg.reserved_capital);
        }
    }

    /// Submit concurrently; the order manager serializes per symbol
    async fn submit_all(&self, approved: Vec<ApprovedSignal>, report: &mut CycleReport) -> Result<()> {
        let mut tasks = JoinSet::new();
        for signal in approved {
            let orders = self.orders.clone();
            tasks.spawn(async move { orders.submit(signal).await });
        }

        let mut fatal = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(SubmitOutcome::Submitted(_))) => report.submitted += 1,
                Ok(Ok(SubmitOutcome::Duplicate { .. })) => report.duplicates += 1,
                Ok(Ok(SubmitOutcome::Rejected(order))) => report.rejected.push((
                    order.symbol,
                    order.reject_reason.unwrap_or(RejectReason::BrokerRejected),
                )),
                Ok(Err(e)) if e.is_fatal() => fatal = Some(e),
                Ok(Err(e)) => warn!("[ORCHESTRATOR] Submission failed: {}", e),
                Err(e) => error!("[ORCHESTRATOR] Submission task died: {}", e),
            }
        }
        match fatal {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    // ========================================================================
    // Status
    // ========================================================================

    fn count_generated(&self, now: Timestamp, count: u64) {
        let day = self.session.trading_day(now);
        let mut generated = lock(&self.generated_today);
        if generated.0 != day {
            *generated = (day, 0);
        }
        generated.1 += count;
    }

    fn generated_today(&self, now: Timestamp) -> u64 {
        let day = self.session.trading_day(now);
        let generated = lock(&self.generated_today);
        if generated.0 == day { generated.1 } else { 0 }
    }

    pub fn status(&self) -> StatusReport {
        let now = self.clock.now();
        let risk = self.risk.status();
        let halt_reason = match &*lock(&self.phase) {
            Phase::Halted(reason) => Some(reason.clone()),
            _ => risk.halt_reason.clone(),
        };

        StatusReport {
            signals_generated_today: self.generated_today(now),
            orders_placed_today: self.orders.orders_placed_today(),
            current_drawdown: risk.drawdown.state.current_drawdown,
            per_strategy_capital_used: risk
                .allocations
                .iter()
                .map(|a| (a.strategy_name.clone(), a.used_capital))
                .collect(),
            trading_enabled: risk.trading_enabled,
            open_orders: self.orders.open_orders().len(),
            halt_reason,
            portfolio_value: self.orders.portfolio_value(),
            as_of: now,
        }
    }
}

/// Group adjacent legs of one linked position; singles stand alone
fn leg_units(signals: Vec<Signal>) -> Vec<Vec<Signal>> {
    let mut units: Vec<Vec<Signal>> = Vec::new();
    for signal in signals {
        let joins_previous = match (signal.leg_group(), units.last().and_then(|u| u.last())) {
            (Some(group), Some(previous)) => previous.leg_group() == Some(group),
            _ => false,
        };
        match units.last_mut() {
            Some(unit) if joins_previous => unit.push(signal),
            _ => units.push(vec![signal]),
        }
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::{LegLink, Side};
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn signal(symbol: &str, group: Option<&str>) -> Signal {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap();
        let mut s = Signal::new(
            "st",
            symbol,
            Side::Buy,
            dec!(10),
            dec!(5),
            t0,
            t0 + ChronoDuration::minutes(30),
        );
        if let Some(group) = group {
            s.metadata.leg = Some(LegLink {
                group_id: group.to_string(),
                leg_index: 0,
                leg_count: 2,
                partner_symbols: Vec::new(),
            });
        }
        s
    }

    #[test]
    fn test_leg_units_group_adjacent_legs() {
        let units = leg_units(vec![
            signal("SPY-C", Some("g1")),
            signal("SPY-P", Some("g1")),
            signal("AAPL", None),
            signal("MSFT", None),
            signal("QQQ-C", Some("g2")),
            signal("QQQ-P", Some("g2")),
        ]);

        let sizes: Vec<_> = units.iter().map(|u| u.len()).collect();
        assert_eq!(sizes, vec![2, 1, 1, 2]);
        assert_eq!(units[3][1].symbol, "QQQ-P");
    }
}
