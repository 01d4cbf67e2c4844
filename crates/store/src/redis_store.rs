//! Redis-backed store

use std::time::Duration;

use aegis_ports::{StateStore, StoreError, StoreResult};
use async_trait::async_trait;
use log::{debug, info};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client as RedisClient};

/// Store backed by a Redis server
///
/// Uses one multiplexed connection; clones of it share the socket.
pub struct RedisStore {
    conn: MultiplexedConnection,
    url: String,
}

fn unavailable(e: redis::RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn ttl_millis(ttl: Duration) -> u64 {
    // Redis rejects a zero expiry
    (ttl.as_millis() as u64).max(1)
}

impl RedisStore {
    /// Connect to `redis://host:port/db`
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        let client = RedisClient::open(redis_url).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)?;

        info!("[STORE] Connected to Redis at {}", redis_url);
        Ok(Self {
            conn,
            url: redis_url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl StateStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key).await.map_err(unavailable)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(ttl_millis(ttl));
        }
        cmd.query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX");
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(ttl_millis(ttl));
        }

        // Nil reply means the key already existed
        let reply: Option<String> = cmd.query_async(&mut conn).await.map_err(unavailable)?;
        debug!("[STORE] SET NX {} -> {:?}", key, reply);
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await.map_err(unavailable)?;
        Ok(removed > 0)
    }

    fn name(&self) -> &str {
        "RedisStore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_floor() {
        assert_eq!(ttl_millis(Duration::ZERO), 1);
        assert_eq!(ttl_millis(Duration::from_secs(2)), 2000);
    }

    #[tokio::test]
    async fn test_bad_url_is_unavailable() {
        let err = RedisStore::connect("not-a-url").await.err().unwrap();
        assert!(err.is_transient());
    }
}
