use std::time::Duration;

use async_trait::async_trait;

use crate::StoreResult;

/// Port for the shared low-latency key/value store
///
/// One key per logical entity; values are opaque strings (JSON records).
/// The store is the source of truth for idempotency keys and risk-state
/// snapshots and must survive process restarts.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write `value`, replacing any previous value; `ttl` of None never expires
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    /// Atomically write `value` only if `key` is absent
    ///
    /// Returns true when this call created the key.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Option<Duration>)
    -> StoreResult<bool>;

    /// Returns true if a key was removed
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Backend name for logs
    fn name(&self) -> &str {
        "StateStore"
    }
}
