//! Aegis Ports
//!
//! Port definitions (traits) for the Aegis pipeline.
//! These define the boundaries between domain logic and infrastructure:
//!
//! ```text
//!   risk-manager / order-manager / runner
//!            │                │
//!          Clock          StateStore
//!            │                │
//!   SystemClock/ManualClock  MemoryStore/RedisStore
//! ```

mod clock;
mod error;
mod store;

pub use clock::Clock;
pub use error::{StoreError, StoreResult};
pub use store::StateStore;
