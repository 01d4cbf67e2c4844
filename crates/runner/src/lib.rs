//! Aegis Runner - pipeline orchestration
//!
//! Ties the components into one evaluation cycle:
//!
//! - **Config**: one JSON document for every component, validated up front
//! - **Bootstrap**: builds risk, orders and generators over injected adapters
//! - **Orchestrator**: restore on start, fixed-interval cycles, graceful shutdown
//! - **Status**: read-only operational snapshot
//!
//! ## Architecture
//!
//! ```text
//!                       ┌─────────────────┐
//!                       │ Market Data Feed│
//!                       └────────┬────────┘
//!                                │ snapshot
//!                                ▼
//! ┌────────────────────────────────────────────────────────────────┐
//! │                         ORCHESTRATOR                           │
//! │                                                                │
//! │  ┌────────────┐  ┌────────────┐  ┌────────────┐                │
//! │  │ Breakout   │  │ Mean Rev.  │  │ Straddle   │  (JoinSet)     │
//! │  └─────┬──────┘  └─────┬──────┘  └─────┬──────┘                │
//! │        └───────────────┼───────────────┘                       │
//! │                        ▼ signals                               │
//! │              ┌───────────────────┐                             │
//! │              │    Aggregator     │                             │
//! │              └─────────┬─────────┘                             │
//! │                        ▼ ranked                                │
//! │              ┌───────────────────┐                             │
//! │              │   Risk Manager    │                             │
//! │              └─────────┬─────────┘                             │
//! │                        ▼ approved                              │
//! │              ┌───────────────────┐      ┌─────────────────┐    │
//! │              │   Order Manager   │◄────►│  State Store    │    │
//! │              └─────────┬─────────┘      └─────────────────┘    │
//! └────────────────────────┼───────────────────────────────────────┘
//!                          ▼ orders
//!                 ┌─────────────────┐
//!                 │ Broker Gateway  │
//!                 └─────────────────┘
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod status;

// Re-export main types
pub use bootstrap::{Adapters, PipelineBootstrap};
pub use config::{CycleConfig, PaperConfig, PipelineConfig, StoreConfig};
pub use error::{Error, Result};
pub use orchestrator::{Components, Orchestrator, StartupReport};
pub use status::{CycleReport, StatusReport};
