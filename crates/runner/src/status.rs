//! Operational status and per-cycle reports

use std::collections::BTreeMap;

use aegis_core::{RejectReason, Timestamp};
use aegis_order_manager::DropReason;
use rust_decimal::Decimal;
use serde::Serialize;

/// Read-only introspection snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub signals_generated_today: u64,
    pub orders_placed_today: u64,
    pub current_drawdown: Decimal,
    /// Used capital per strategy
    pub per_strategy_capital_used: BTreeMap<String, Decimal>,
    pub trading_enabled: bool,
    pub open_orders: usize,
    pub halt_reason: Option<String>,
    pub portfolio_value: Decimal,
    pub as_of: Timestamp,
}

impl StatusReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// What one cycle did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    pub generated: usize,
    pub emitted: usize,
    pub dropped: Vec<(String, DropReason)>,
    pub rejected: Vec<(String, RejectReason)>,
    pub submitted: usize,
    pub duplicates: usize,
    pub exits: usize,
    /// Generators that failed, panicked or missed the deadline
    pub failed_evaluations: usize,
    /// Set when the cycle stopped early; positions and orders were still tracked
    pub aborted: Option<String>,
}

impl CycleReport {
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self {
            aborted: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }
}
