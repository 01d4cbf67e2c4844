//! Aegis Order Manager
//!
//! Sits between admission control and the broker:
//! - **Signal Aggregation**: cooldowns, dedup, ranking and caps per cycle
//! - **Order Lifecycle**: idempotent submission, retry, fill reconciliation
//! - **Position Book**: per-strategy positions, P&L and capital feedback
//! - **Exit Management**: stop, target and time-stop closes, legs as a unit
//!
//! ## Architecture
//!
//! ```text
//! Generators ──► Signals ──► ┌──────────────────────────────────────┐
//!                            │          SignalAggregator            │
//!                            │  cooldowns · dedup · rank · caps     │
//!                            └──────────────────┬───────────────────┘
//!                                               │ ranked batch
//!                                               ▼
//!                                    RiskManager::evaluate
//!                                               │ ApprovedSignal
//!                            ┌──────────────────▼───────────────────┐
//!                            │            OrderManager              │
//!                            │  executed:{day}:… claim (store)      │
//!                            │  persist order ─► broker (retry)     │
//!                            └──────────────────┬───────────────────┘
//!                                               │ OrderRequest
//! Broker ◄──────────────────────────────────────┘
//!
//! Broker updates ──► process_updates ──► PositionBook ──► RiskManager
//!                                        (fills, P&L)     (capital, drawdown)
//! ```

pub mod aggregator;
pub mod error;
pub mod manager;
pub mod position;
pub mod retry;

// Re-export main types
pub use aggregator::{
    AggregationOutcome, AggregatorConfig, DropReason, DroppedSignal, SignalAggregator,
};
pub use error::{Error, Result};
pub use manager::{ExitReason, OrderManager, OrderManagerConfig, RestoreReport, SubmitOutcome};
pub use position::PositionBook;
pub use retry::{RetryOutcome, RetryPolicy};
