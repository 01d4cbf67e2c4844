use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{GatewayError, Result};
use crate::session::{SessionProvider, SessionToken};

/// Session provider holding one token that can be revoked and restored
#[derive(Debug)]
pub struct StaticSessionProvider {
    token: RwLock<Option<SessionToken>>,
}

impl StaticSessionProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(SessionToken::new(token))),
        }
    }

    pub fn revoke(&self) {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    pub fn set_token(&self, token: SessionToken) {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token);
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn get_valid_token(&self) -> Result<SessionToken> {
        let token = self
            .token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        match token {
            Some(token) if !token.is_expired_at(Utc::now()) => Ok(token),
            Some(_) => Err(GatewayError::Unauthenticated("session token expired".into())),
            None => Err(GatewayError::Unauthenticated("no session token".into())),
        }
    }
}
