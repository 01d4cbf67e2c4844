//! Aegis Risk Manager
//!
//! The admission-control gate between the aggregator and the order manager.
//! Four engines, each owning its state and each method an atomic
//! read-modify-write:
//!
//! - **Drawdown Tracker**: peak-to-current decline, warning and hard stop
//! - **Volatility Sizer**: higher volatility, smaller size, hard ceiling
//! - **Blacklist**: time-boxed bans after repeated symbol violations
//! - **Capital Allocator**: independent per-strategy capital partitions
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        RiskManager                           │
//! │                                                              │
//! │  Signal ─► enabled? ─► drawdown ─► sizing ─► blacklist ─►    │
//! │            allocator ─► concentration ─► reserve ─► Admission│
//! │                                                              │
//! │  Fills/marks ─► update_portfolio_value ─► DrawdownTracker    │
//! │  Closes      ─► release ─────────────────► CapitalAllocator  │
//! │  Broker errs ─► record_violation ────────► Blacklist         │
//! └──────────────────────────────────────────────────────────────┘
//!                              │ snapshot / restore
//!                              ▼
//!                   risk_state:{component} (StateStore)
//! ```

pub mod allocator;
pub mod blacklist;
pub mod drawdown;
pub mod error;
pub mod manager;
pub mod parameters;
pub mod sizing;

// Re-export main types
pub use allocator::{CapitalAllocation, CapitalAllocator};
pub use blacklist::{Blacklist, BlacklistEntry};
pub use drawdown::{DrawdownLevel, DrawdownState, DrawdownStatus, DrawdownTracker};
pub use error::{Error, Result};
pub use manager::{Admission, ApprovedSignal, PortfolioState, Rejection, RiskManager, RiskStatus};
pub use parameters::{
    AllocatorConfig, BlacklistConfig, DrawdownConfig, RiskConfig, SizingConfig,
    StrategyAllocationConfig,
};
pub use sizing::VolatilitySizer;
