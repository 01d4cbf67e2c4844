//! Admission control
//!
//! Every signal passes the checks in a fixed order and either comes back
//! resized with capital reserved, or rejected with exactly one code:
//!
//! 1. trading enabled
//! 2. signal not expired
//! 3. drawdown below the hard stop
//! 4. volatility sizing
//! 5. symbol not blacklisted
//! 6. strategy capital available and position above the minimum
//! 7. single-symbol and gross concentration
//! 8. capital reservation

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use aegis_core::{RejectReason, Signal, Timestamp};
use aegis_ports::{Clock, StateStore};
use aegis_store::{Keys, load_json, save_json};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::allocator::{CapitalAllocation, CapitalAllocator};
use crate::blacklist::{Blacklist, BlacklistEntry};
use crate::drawdown::{DrawdownState, DrawdownStatus, DrawdownTracker};
use crate::error::Result;
use crate::parameters::RiskConfig;
use crate::sizing::VolatilitySizer;

/// Live exposure as seen by the order manager
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    /// Cash plus marked position value
    pub total_value: Decimal,
    /// Absolute market value per symbol
    pub exposures: HashMap<String, Decimal>,
}

impl PortfolioState {
    pub fn new(total_value: Decimal) -> Self {
        Self {
            total_value,
            exposures: HashMap::new(),
        }
    }

    pub fn with_exposure(mut self, symbol: impl Into<String>, value: Decimal) -> Self {
        *self.exposures.entry(symbol.into()).or_insert(Decimal::ZERO) += value.abs();
        self
    }

    pub fn exposure(&self, symbol: &str) -> Decimal {
        self.exposures.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn gross_exposure(&self) -> Decimal {
        self.exposures.values().copied().sum()
    }
}

/// A signal that cleared every check, resized, with capital held
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovedSignal {
    pub signal: Signal,
    /// Quantity the strategy asked for before resizing
    pub requested_quantity: Decimal,
    pub reserved_capital: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: RejectReason,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Approved(ApprovedSignal),
    Rejected(Rejection),
}

impl Admission {
    pub fn is_approved(&self) -> bool {
        matches!(self, Admission::Approved(_))
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Admission::Approved(_) => None,
            Admission::Rejected(r) => Some(r.reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskStatus {
    pub trading_enabled: bool,
    pub halt_reason: Option<String>,
    pub drawdown: DrawdownStatus,
    pub allocations: Vec<CapitalAllocation>,
    pub blacklisted: Vec<BlacklistEntry>,
}

#[derive(Default)]
struct Dirty {
    drawdown: AtomicBool,
    blacklist: AtomicBool,
    allocator: AtomicBool,
}

pub struct RiskManager {
    config: RiskConfig,
    clock: Arc<dyn Clock>,
    drawdown: DrawdownTracker,
    sizer: VolatilitySizer,
    blacklist: Blacklist,
    allocator: CapitalAllocator,
    trading_enabled: AtomicBool,
    halt_reason: Mutex<Option<String>>,
    store: Option<Arc<dyn StateStore>>,
    dirty: Dirty,
}

fn reject(reason: RejectReason, detail: impl Into<String>) -> Admission {
    Admission::Rejected(Rejection {
        reason,
        detail: detail.into(),
    })
}

impl RiskManager {
    pub fn new(config: RiskConfig, total_capital: Decimal, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let allocator = CapitalAllocator::init(total_capital, &config.allocator)?;

        Ok(Self {
            drawdown: DrawdownTracker::init(total_capital, config.drawdown.clone()),
            sizer: VolatilitySizer::new(config.sizing.clone()),
            blacklist: Blacklist::new(config.blacklist.clone()),
            allocator,
            clock,
            config,
            trading_enabled: AtomicBool::new(true),
            halt_reason: Mutex::new(None),
            store: None,
            dirty: Dirty::default(),
        })
    }

    /// Builder: persist risk state to a shared store
    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ========================================================================
    // Admission
    // ========================================================================

    pub fn evaluate(&self, signal: &Signal, portfolio: &PortfolioState) -> Admission {
        let admission = self.run_checks(signal, portfolio);
        match &admission {
            Admission::Approved(a) => info!(
                "[RISK] APPROVE {} {} {} qty {} (asked {}) reserved {}",
                signal.strategy_name,
                signal.side,
                signal.symbol,
                a.signal.quantity,
                a.requested_quantity,
                a.reserved_capital.round_dp(2)
            ),
            Admission::Rejected(r) => info!(
                "[RISK] REJECT {} {} {} {}: {}",
                signal.strategy_name, signal.side, signal.symbol, r.reason, r.detail
            ),
        }
        admission
    }

    fn run_checks(&self, signal: &Signal, portfolio: &PortfolioState) -> Admission {
        let now = self.now();

        if !self.is_trading_enabled() {
            let reason = self.halt_reason().unwrap_or_else(|| "trading disabled".into());
            return reject(RejectReason::TradingDisabled, reason);
        }

        if signal.is_expired_at(now) {
            return reject(
                RejectReason::SignalExpired,
                format!("time stop {} passed", signal.time_stop),
            );
        }

        if self.drawdown.is_halted() {
            return reject(
                RejectReason::DrawdownBreach,
                format!(
                    "drawdown {} at or past hard stop {}",
                    self.drawdown.current_drawdown().round_dp(4),
                    self.config.drawdown.hard_stop_threshold
                ),
            );
        }

        // Sizing
        let vol_factor = self.sizer.volatility_factor(signal.metadata.volatility);
        let risk_multiplier =
            signal.metadata.position_multiplier * vol_factor * self.drawdown.size_multiplier();
        if risk_multiplier <= Decimal::ZERO {
            return reject(RejectReason::BelowMinSize, "risk multiplier is zero");
        }

        let (banned, reason) = self.blacklist.is_blacklisted(&signal.symbol, now);
        if banned {
            return reject(
                RejectReason::BlacklistedSymbol,
                reason.unwrap_or_else(|| "banned".into()),
            );
        }

        let value = match self
            .allocator
            .position_value(&signal.strategy_name, risk_multiplier)
        {
            Ok(v) => v,
            Err(reason) => {
                return reject(
                    reason,
                    format!(
                        "{} has {} available",
                        signal.strategy_name,
                        self.allocator.strategy_capital(&signal.strategy_name)
                    ),
                );
            }
        };

        let capital_base = if portfolio.total_value > Decimal::ZERO {
            portfolio.total_value
        } else {
            self.allocator.total_capital()
        };
        let value = value.min(self.sizer.ceiling(capital_base));
        let quantity = self.sizer.quantity_for(value, signal.entry_price_estimate);
        if quantity <= Decimal::ZERO {
            return reject(
                RejectReason::BelowMinSize,
                format!("{} buys no whole units at {}", value.round_dp(2), signal.entry_price_estimate),
            );
        }
        let trade_value = quantity * signal.entry_price_estimate;

        if portfolio.total_value <= Decimal::ZERO {
            return reject(RejectReason::ConcentrationLimit, "portfolio value is zero");
        }
        let symbol_after = (portfolio.exposure(&signal.symbol) + trade_value) / portfolio.total_value;
        if symbol_after > self.config.max_symbol_concentration {
            return reject(
                RejectReason::ConcentrationLimit,
                format!(
                    "{} would be {} of portfolio (limit {})",
                    signal.symbol,
                    symbol_after.round_dp(4),
                    self.config.max_symbol_concentration
                ),
            );
        }
        let gross_after = (portfolio.gross_exposure() + trade_value) / portfolio.total_value;
        if gross_after > self.config.max_gross_exposure {
            return reject(
                RejectReason::ConcentrationLimit,
                format!(
                    "gross exposure would be {} (limit {})",
                    gross_after.round_dp(4),
                    self.config.max_gross_exposure
                ),
            );
        }

        if let Err(reason) = self.allocator.reserve(&signal.strategy_name, trade_value) {
            return reject(reason, "reservation lost to a concurrent admission");
        }
        self.dirty.allocator.store(true, Ordering::Release);

        let mut approved = signal.clone();
        approved.quantity = quantity;
        Admission::Approved(ApprovedSignal {
            signal: approved,
            requested_quantity: signal.quantity,
            reserved_capital: trade_value,
        })
    }

    // ========================================================================
    // State mutations
    // ========================================================================

    pub fn update_portfolio_value(&self, value: Decimal) -> DrawdownStatus {
        let status = self.drawdown.update_portfolio_value(value);
        self.dirty.drawdown.store(true, Ordering::Release);
        status
    }

    /// Return reserved or position capital to a strategy's partition
    pub fn release(&self, strategy: &str, amount: Decimal) {
        if amount > Decimal::ZERO {
            self.allocator.release(strategy, amount);
            self.dirty.allocator.store(true, Ordering::Release);
        }
    }

    /// Consume capital beyond what was reserved
    pub fn charge(&self, strategy: &str, amount: Decimal) {
        if amount > Decimal::ZERO {
            self.allocator.charge(strategy, amount);
            self.dirty.allocator.store(true, Ordering::Release);
        }
    }

    pub fn record_violation(&self, symbol: &str, reason: &str) -> Option<Timestamp> {
        let banned_until = self.blacklist.record_violation(symbol, reason, self.now());
        self.dirty.blacklist.store(true, Ordering::Release);
        banned_until
    }

    /// Loss on one symbol that counts as a violation, `None` when disabled
    pub fn symbol_loss_limit(&self) -> Option<Decimal> {
        let fraction = self.config.blacklist.symbol_loss_limit;
        (fraction > Decimal::ZERO).then(|| self.allocator.total_capital() * fraction)
    }

    pub fn is_blacklisted(&self, symbol: &str) -> (bool, Option<String>) {
        self.blacklist.is_blacklisted(symbol, self.now())
    }

    /// Violation history for one symbol, banned or not
    pub fn blacklist_entry(&self, symbol: &str) -> Option<BlacklistEntry> {
        self.blacklist.entry(symbol)
    }

    pub fn cleanup_blacklist(&self) -> usize {
        let removed = self.blacklist.cleanup(self.now());
        if removed > 0 {
            self.dirty.blacklist.store(true, Ordering::Release);
        }
        removed
    }

    pub fn set_trading_enabled(&self, enabled: bool, reason: Option<String>) {
        let was = self.trading_enabled.swap(enabled, Ordering::AcqRel);
        let mut halt = self
            .halt_reason
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if enabled {
            if !was {
                info!("[RISK] Trading resumed");
            }
            *halt = None;
        } else {
            let reason = reason.unwrap_or_else(|| "operator request".into());
            if was {
                error!("[RISK] Trading halted: {}", reason);
            }
            *halt = Some(reason);
        }
    }

    pub fn is_trading_enabled(&self) -> bool {
        self.trading_enabled.load(Ordering::Acquire)
    }

    pub fn halt_reason(&self) -> Option<String> {
        self.halt_reason
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn portfolio_stress(&self) -> Decimal {
        self.drawdown.portfolio_stress()
    }

    pub fn strategy_capital(&self, strategy: &str) -> Decimal {
        self.allocator.strategy_capital(strategy)
    }

    pub fn allocation(&self, strategy: &str) -> Option<CapitalAllocation> {
        self.allocator.allocation(strategy)
    }

    pub fn drawdown(&self) -> DrawdownStatus {
        self.drawdown.status()
    }

    pub fn status(&self) -> RiskStatus {
        RiskStatus {
            trading_enabled: self.is_trading_enabled(),
            halt_reason: self.halt_reason(),
            drawdown: self.drawdown.status(),
            allocations: self.allocator.snapshot(),
            blacklisted: self.blacklist.banned_symbols(self.now()),
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write every component mutated since the last successful persist
    pub async fn persist(&self) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let store = store.as_ref();

        if self.dirty.drawdown.swap(false, Ordering::AcqRel) {
            let key = Keys::risk_state(Keys::DRAWDOWN);
            if let Err(e) = save_json(store, &key, &self.drawdown.snapshot(), None).await {
                self.dirty.drawdown.store(true, Ordering::Release);
                return Err(e.into());
            }
        }
        if self.dirty.blacklist.swap(false, Ordering::AcqRel) {
            let key = Keys::risk_state(Keys::BLACKLIST);
            if let Err(e) = save_json(store, &key, &self.blacklist.snapshot(), None).await {
                self.dirty.blacklist.store(true, Ordering::Release);
                return Err(e.into());
            }
        }
        if self.dirty.allocator.swap(false, Ordering::AcqRel) {
            let key = Keys::risk_state(Keys::ALLOCATOR);
            if let Err(e) = save_json(store, &key, &self.allocator.snapshot(), None).await {
                self.dirty.allocator.store(true, Ordering::Release);
                return Err(e.into());
            }
        }
        debug!("[RISK] State persisted to {}", store.name());
        Ok(())
    }

    /// Restore all components from the store; returns whether anything was found
    pub async fn load(&self) -> Result<bool> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        let store = store.as_ref();
        let mut found = false;

        if let Some(state) =
            load_json::<DrawdownState>(store, &Keys::risk_state(Keys::DRAWDOWN)).await?
        {
            self.drawdown.restore(state)?;
            found = true;
        }
        if let Some(entries) =
            load_json::<Vec<BlacklistEntry>>(store, &Keys::risk_state(Keys::BLACKLIST)).await?
        {
            self.blacklist.restore(entries)?;
            found = true;
        }
        if let Some(allocations) =
            load_json::<Vec<CapitalAllocation>>(store, &Keys::risk_state(Keys::ALLOCATOR)).await?
        {
            self.allocator.restore(allocations)?;
            found = true;
        }

        if found {
            info!("[RISK] Restored risk state from {}", store.name());
        } else {
            warn!("[RISK] No persisted risk state in {}, starting fresh", store.name());
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::StrategyAllocationConfig;
    use aegis_clock::ManualClock;
    use aegis_core::Side;
    use aegis_store::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap()
    }

    fn config() -> RiskConfig {
        let mut config = RiskConfig::default();
        config.allocator.strategies = ["vb", "mr", "st", "s4", "s5"]
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

    fn manager() -> (RiskManager, Arc<ManualClock>) {
        let clock = ManualClock::new(t0());
        let rm = RiskManager::new(config(), dec!(1_000_000), clock.clone()).unwrap();
        (rm, clock)
    }

    fn signal(strategy: &str, symbol: &str) -> Signal {
        let mut s = Signal::new(
            strategy,
            symbol,
            Side::Buy,
            dec!(10),
            dec!(100),
            t0(),
            t0() + Duration::minutes(60),
        );
        s.metadata.volatility = Some(Decimal::ZERO);
        s
    }

    fn book() -> PortfolioState {
        PortfolioState::new(dec!(1_000_000))
    }

    #[test]
    fn test_approve_resizes_and_reserves() {
        let _ = env_logger::try_init();
        let (rm, _) = manager();

        let Admission::Approved(a) = rm.evaluate(&signal("vb", "AAPL"), &book()) else {
            panic!("expected approval");
        };
        // 200k available × 0.3 base × 1.0 multiplier
        assert_eq!(a.signal.quantity, dec!(600));
        assert_eq!(a.requested_quantity, dec!(10));
        assert_eq!(a.reserved_capital, dec!(60_000));
        assert_eq!(rm.strategy_capital("vb"), dec!(140_000));
    }

    #[test]
    fn test_higher_volatility_never_increases_approved_size() {
        let _ = env_logger::try_init();
        let mut approved = Vec::new();
        for vol in [dec!(0), dec!(0.005), dec!(0.02), dec!(0.05), dec!(0.2)] {
            // Fresh manager so earlier reservations don't shrink the partition
            let (rm, _) = manager();
            let mut s = signal("vb", "AAPL");
            s.metadata.volatility = Some(vol);
            let Admission::Approved(a) = rm.evaluate(&s, &book()) else {
                panic!("vol {} should still admit", vol);
            };
            approved.push(a.signal.quantity);
        }

        assert!(approved.windows(2).all(|w| w[1] <= w[0]), "{:?}", approved);
        // 60k at zero vol, halved at the reference volatility
        assert_eq!(approved[0], dec!(600));
        assert_eq!(approved[2], dec!(300));
        assert!(approved[4] < approved[0]);
    }

    #[test]
    fn test_trading_disabled_rejects_first() {
        let (rm, _) = manager();
        rm.set_trading_enabled(false, Some("maintenance".into()));
        let admission = rm.evaluate(&signal("vb", "AAPL"), &book());
        assert_eq!(admission.reason(), Some(RejectReason::TradingDisabled));
        assert_eq!(rm.strategy_capital("vb"), dec!(200_000));

        rm.set_trading_enabled(true, None);
        assert!(rm.evaluate(&signal("vb", "AAPL"), &book()).is_approved());
    }

    #[test]
    fn test_expired_signal() {
        let (rm, clock) = manager();
        clock.advance(Duration::minutes(61));
        let admission = rm.evaluate(&signal("vb", "AAPL"), &book());
        assert_eq!(admission.reason(), Some(RejectReason::SignalExpired));
    }

    #[test]
    fn test_drawdown_hard_stop_rejects() {
        let (rm, _) = manager();
        for v in [dec!(1_050_000), dec!(980_000), dec!(950_000)] {
            rm.update_portfolio_value(v);
            let admission = rm.evaluate(&signal("mr", "MSFT"), &PortfolioState::new(v));
            assert!(admission.is_approved(), "{} should still admit", v);
        }

        rm.update_portfolio_value(dec!(900_000));
        let admission = rm.evaluate(&signal("mr", "MSFT"), &PortfolioState::new(dec!(900_000)));
        assert_eq!(admission.reason(), Some(RejectReason::DrawdownBreach));
    }

    #[test]
    fn test_blacklisted_symbol_only() {
        let (rm, _) = manager();
        for _ in 0..3 {
            rm.record_violation("XYZ", "broker rejected symbol");
        }
        let admission = rm.evaluate(&signal("vb", "XYZ"), &book());
        assert_eq!(admission.reason(), Some(RejectReason::BlacklistedSymbol));
        assert!(rm.evaluate(&signal("vb", "AAPL"), &book()).is_approved());
    }

    #[test]
    fn test_exhausted_strategy_does_not_block_others() {
        let (rm, _) = manager();
        // 60k, 42k, 29.4k, 20.58k... until the partition can no longer size
        let mut approvals = 0;
        loop {
            let symbol = format!("SYM{}", approvals);
            match rm.evaluate(&signal("vb", &symbol), &book()) {
                Admission::Approved(_) => approvals += 1,
                Admission::Rejected(r) => {
                    assert_eq!(r.reason, RejectReason::BelowMinSize);
                    break;
                }
            }
            assert!(approvals < 100);
        }
        assert!(rm.evaluate(&signal("mr", "AAPL"), &book()).is_approved());
    }

    #[test]
    fn test_unknown_strategy_has_no_capital() {
        let (rm, _) = manager();
        let admission = rm.evaluate(&signal("ghost", "AAPL"), &book());
        assert_eq!(
            admission.reason(),
            Some(RejectReason::InsufficientStrategyCapital)
        );
    }

    #[test]
    fn test_concentration_limits() {
        let (rm, _) = manager();
        let crowded = book().with_exposure("AAPL", dec!(220_000));
        let admission = rm.evaluate(&signal("vb", "AAPL"), &crowded);
        assert_eq!(admission.reason(), Some(RejectReason::ConcentrationLimit));

        let gross = book()
            .with_exposure("MSFT", dec!(240_000))
            .with_exposure("SPY", dec!(240_000))
            .with_exposure("QQQ", dec!(240_000))
            .with_exposure("IWM", dec!(240_000));
        let admission = rm.evaluate(&signal("vb", "AAPL"), &gross);
        assert_eq!(admission.reason(), Some(RejectReason::ConcentrationLimit));
        // Rejections hold no capital
        assert_eq!(rm.strategy_capital("vb"), dec!(200_000));
    }

    #[test]
    fn test_release_returns_capital() {
        let (rm, _) = manager();
        let Admission::Approved(a) = rm.evaluate(&signal("vb", "AAPL"), &book()) else {
            panic!("expected approval");
        };
        rm.release("vb", a.reserved_capital);
        assert_eq!(rm.strategy_capital("vb"), dec!(200_000));
    }

    #[tokio::test]
    async fn test_persist_and_load_round_trip() {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        let (rm, clock) = manager();
        let rm = rm.with_store(store.clone());

        rm.update_portfolio_value(dec!(1_100_000));
        rm.update_portfolio_value(dec!(1_000_000));
        for _ in 0..3 {
            rm.record_violation("XYZ", "halted");
        }
        assert!(rm.evaluate(&signal("vb", "AAPL"), &book()).is_approved());
        rm.persist().await.unwrap();

        let restarted = RiskManager::new(config(), dec!(1_000_000), clock.clone())
            .unwrap()
            .with_store(store);
        assert!(restarted.load().await.unwrap());
        assert_eq!(restarted.drawdown().state.peak_value, dec!(1_100_000));
        assert!(restarted.is_blacklisted("XYZ").0);
        assert_eq!(restarted.strategy_capital("vb"), dec!(140_000));
    }

    #[tokio::test]
    async fn test_corrupted_state_is_fatal() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(&Keys::risk_state(Keys::DRAWDOWN), "{not json", None)
            .await
            .unwrap();

        let (rm, _) = manager();
        let rm = rm.with_store(store);
        let err = rm.load().await.unwrap_err();
        assert!(err.is_fatal());
    }
}
