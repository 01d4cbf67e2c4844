//! Typed JSON records on top of the raw string store

use std::collections::BTreeSet;
use std::time::Duration;

use aegis_ports::{StateStore, StoreError, StoreResult};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Load and decode a JSON record
///
/// A value that exists but does not decode is reported as `Corrupted`, never
/// silently treated as missing.
pub async fn load_json<T: DeserializeOwned>(
    store: &dyn StateStore,
    key: &str,
) -> StoreResult<Option<T>> {
    match store.get(key).await? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::Corrupted {
                key: key.to_string(),
                reason: e.to_string(),
            }),
    }
}

/// Encode and write a JSON record
pub async fn save_json<T: Serialize + ?Sized>(
    store: &dyn StateStore,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> StoreResult<()> {
    let raw = serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    store.set(key, &raw, ttl).await
}

/// Explicit set of member keys/ids stored under one index key
///
/// Read-modify-write; callers serialize updates to the same index.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct KeyIndex {
    pub members: BTreeSet<String>,
}

impl KeyIndex {
    pub async fn load(store: &dyn StateStore, index_key: &str) -> StoreResult<Self> {
        Ok(load_json(store, index_key).await?.unwrap_or_default())
    }

    pub async fn add(store: &dyn StateStore, index_key: &str, member: &str) -> StoreResult<()> {
        let mut index = Self::load(store, index_key).await?;
        if index.members.insert(member.to_string()) {
            save_json(store, index_key, &index, None).await?;
        }
        Ok(())
    }

    pub async fn remove(store: &dyn StateStore, index_key: &str, member: &str) -> StoreResult<()> {
        let mut index = Self::load(store, index_key).await?;
        if index.members.remove(member) {
            save_json(store, index_key, &index, None).await?;
        }
        Ok(())
    }
}
