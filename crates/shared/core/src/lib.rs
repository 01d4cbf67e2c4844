//! Aegis Core Domain
//!
//! Pure domain types for the Aegis signal-to-order pipeline.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod market;
pub mod session;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Signal types
    LegLink,
    MAX_QUALITY_SCORE,
    Signal,
    SignalMetadata,
    TriggerType,
    VolatilityTrigger,
    // Order lifecycle
    ExitPlan,
    Order,
    OrderId,
    OrderIntent,
    OrderStatus,
    // Holdings
    FillEffect,
    Position,
    // Shared vocabulary
    RejectReason,
    Side,
};
pub use market::{MarketSnapshot, MarketTick};
pub use session::TradingSession;
pub use values::Timestamp;
