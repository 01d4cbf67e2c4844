//! Broker port

use async_trait::async_trait;

use crate::error::Result;
use crate::messages::order::{OrderAck, OrderRequest, OrderUpdate};
use crate::session::SessionToken;

/// Core → Broker
///
/// `submit_order` returns an acknowledgement or a classified error; fills
/// arrive later through `poll_updates`.
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    async fn submit_order(&self, token: &SessionToken, request: &OrderRequest) -> Result<OrderAck>;

    async fn cancel_order(&self, token: &SessionToken, broker_order_id: &str) -> Result<()>;

    /// Drain updates produced since the last poll
    async fn poll_updates(&self) -> Result<Vec<OrderUpdate>>;

    fn name(&self) -> &str {
        "BrokerGateway"
    }
}
