//! Aegis Store
//!
//! Adapters for the shared low-latency key/value store, the key schema, and
//! typed JSON record helpers.
//!
//! ```text
//!   OrderManager ──┐                 ┌── MemoryStore (tests, paper mode)
//!   RiskManager  ──┼── StateStore ───┤
//!   Orchestrator ──┘                 └── RedisStore  (production)
//! ```
//!
//! Every logical entity lives under exactly one documented key (see [`Keys`]).
//! Discovery goes through explicit index records instead of key scans.

pub mod keys;
pub mod memory;
pub mod records;
pub mod redis_store;

pub use aegis_ports::{StateStore, StoreError, StoreResult};
pub use keys::Keys;
pub use memory::MemoryStore;
pub use records::{KeyIndex, load_json, save_json};
pub use redis_store::RedisStore;
