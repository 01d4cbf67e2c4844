//! Credential/session port

use aegis_core::Timestamp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Broker session token
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: Option<Timestamp>,
}

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

// Keep secrets out of logs
impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Credential/Session Provider → Core
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// A currently valid token, or `GatewayError::Unauthenticated`
    async fn get_valid_token(&self) -> Result<SessionToken>;
}
