//! Aegis Gateway
//!
//! Everything the pipeline knows about the outside world:
//! - `BrokerGateway`: order submission, cancellation, fill updates
//! - `MarketDataFeed`: latest tick per symbol plus a connectivity flag
//! - `SessionProvider`: "valid token or Unauthenticated"
//! - Paper adapters implementing all three in-process
//!
//! ## Architecture
//!
//! ```text
//!   OrderManager ──submit/cancel──▶ BrokerGateway ──▶ broker
//!        ▲                              │
//!        └──── OrderUpdate (poll) ◀─────┘
//!
//!   Orchestrator ──snapshot──▶ MarketDataFeed
//! ```
//!
//! Fills are pulled: the order manager drains `poll_updates` at the start
//! of every cycle, and updates carry cumulative quantities so a repeated
//! report is harmless.

pub mod adapters;
pub mod broker;
pub mod error;
pub mod feed;
pub mod messages;
pub mod session;

// Re-export commonly used types
pub use adapters::{
    FillMode, PaperBroker, PaperBrokerConfig, RandomWalkConfig, RandomWalkFeed, ScriptedFailure,
    StaticFeed, StaticSessionProvider,
};
pub use broker::BrokerGateway;
pub use error::{GatewayError, Result};
pub use feed::MarketDataFeed;
pub use messages::order::{OrderAck, OrderRequest, OrderUpdate};
pub use session::{SessionProvider, SessionToken};
