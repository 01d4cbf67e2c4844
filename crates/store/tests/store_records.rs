//! Store round trips through the public API

use aegis_core::{Position, Side};
use aegis_store::{Keys, MemoryStore, StateStore, load_json, save_json};
use chrono::Utc;
use rust_decimal_macros::dec;
use std::time::Duration;

#[tokio::test]
async fn test_position_record_survives_restart() {
    let _ = env_logger::try_init();
    let store = MemoryStore::new();

    let mut position = Position::flat("vol-breakout", "AAPL", Utc::now());
    position.apply_fill(Side::Buy, dec!(100), dec!(190));

    let key = Keys::position("vol-breakout", "AAPL");
    save_json(&store, &key, &position, None).await.unwrap();

    let restored: Position = load_json(&store, &key).await.unwrap().unwrap();
    assert_eq!(restored.quantity, dec!(100));
    assert_eq!(restored.average_price, dec!(190));
}

#[tokio::test(start_paused = true)]
async fn test_idempotency_key_claimed_once_per_day() {
    let store = MemoryStore::new();
    let key = Keys::executed("20240304", "vol-breakout", "AAPL", Side::Buy);
    let ttl = Some(Duration::from_secs(3600));

    assert!(store.set_if_absent(&key, "pending", ttl).await.unwrap());
    assert!(!store.set_if_absent(&key, "pending", ttl).await.unwrap());

    // Next day the key has expired
    tokio::time::advance(Duration::from_secs(3601)).await;
    assert!(store.set_if_absent(&key, "pending", ttl).await.unwrap());
}
