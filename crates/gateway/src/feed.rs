//! Market data port

use aegis_core::{MarketSnapshot, Timestamp};
use async_trait::async_trait;

use crate::error::Result;

/// Market Data Feed → Core
///
/// Staleness is judged by the caller against the snapshot's `taken_at`;
/// the feed only reports what it last saw.
#[async_trait]
pub trait MarketDataFeed: Send + Sync {
    /// Latest tick per requested symbol (missing symbols are simply absent)
    async fn snapshot(&self, symbols: &[String], now: Timestamp) -> Result<MarketSnapshot>;

    fn is_connected(&self) -> bool;

    fn name(&self) -> &str {
        "MarketDataFeed"
    }
}
