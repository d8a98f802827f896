// crates/notify-store-nats/tests/live_broker.rs
// ============================================================================
// Module: Live JetStream Tests
// Description: JetStreamBroker behavior against a running NATS server.
// Purpose: Validate bucket provisioning and connection shutdown end to end.
// Dependencies: notify-store-nats, tokio
// ============================================================================

//! ## Overview
//! Ignored by default. Run with a JetStream-enabled server at
//! `NOTIFY_TEST_NATS_URL` (default `nats://127.0.0.1:4222`):
//! `cargo test -p notify-store-nats --test live_broker -- --ignored`.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use std::time::Duration;

use bytes::Bytes;
use notify_core::AddSemantics;
use notify_core::CounterStore;
use notify_core::StorageError;
use notify_store_nats::BucketSpec;
use notify_store_nats::JetStreamBroker;
use notify_store_nats::KvBroker;
use notify_store_nats::NatsCounterStore;
use notify_store_nats::NatsStoreConfig;

fn nats_url() -> String {
    std::env::var("NOTIFY_TEST_NATS_URL").unwrap_or_else(|_| "nats://127.0.0.1:4222".to_string())
}

#[tokio::test]
#[ignore = "requires a JetStream-enabled NATS server"]
async fn store_round_trips_against_live_server() {
    let store = NatsCounterStore::new(NatsStoreConfig {
        addr: nats_url(),
        bucket: "notify-live-test".to_string(),
        connect_timeout_ms: 2_000,
        add_semantics: AddSemantics::Increment,
    });
    store.init().await.unwrap();
    store.try_set("live-total", 5).await.unwrap();
    assert_eq!(store.try_increment("live-total", 2).await.unwrap(), 7);
    store.close().await.unwrap();
    assert_eq!(store.try_get("live-total").await, Err(StorageError::Closed));
}

#[tokio::test]
#[ignore = "requires a JetStream-enabled NATS server"]
async fn close_drains_the_connection() {
    let broker = JetStreamBroker::connect(&nats_url(), Duration::from_secs(2)).await.unwrap();
    let spec = BucketSpec {
        bucket: "notify-live-close".to_string(),
        description: "notify live close test".to_string(),
        replicas: 1,
        history: 3,
    };
    if !broker.stream_exists("KV_notify-live-close").await.unwrap() {
        broker.create_bucket(&spec).await.unwrap();
    }

    broker.close().await.unwrap();

    let result = broker.put("notify-live-close", "k", Bytes::from_static(b"1")).await;
    assert!(result.is_err());
}
