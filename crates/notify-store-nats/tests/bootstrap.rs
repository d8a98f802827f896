// crates/notify-store-nats/tests/bootstrap.rs
// ============================================================================
// Module: NATS Store Bootstrap Tests
// Description: Connection and bucket provisioning behavior of init/close.
// Purpose: Validate that repeated and concurrent starts create one bucket.
// Dependencies: notify-store-nats, tokio
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::BUCKET;
use common::MemoryBroker;
use common::MemoryConnector;
use common::store_with;
use notify_core::CounterStore;
use notify_core::StorageError;

#[tokio::test]
async fn init_creates_bucket_with_fixed_parameters() {
    let broker = MemoryBroker::new();
    let store = store_with(&MemoryConnector::new(Arc::clone(&broker)));

    store.init().await.unwrap();

    assert_eq!(broker.bucket_creations.load(Ordering::SeqCst), 1);
    let spec = broker.last_spec.lock().unwrap().clone().expect("bucket spec");
    assert_eq!(spec.bucket, BUCKET);
    assert_eq!(spec.replicas, 1);
    assert_eq!(spec.history, 3);
}

#[tokio::test]
async fn repeated_init_on_one_instance_is_idempotent() {
    let broker = MemoryBroker::new();
    let connector = MemoryConnector::new(Arc::clone(&broker));
    let store = store_with(&connector);

    store.init().await.unwrap();
    store.init().await.unwrap();

    assert_eq!(broker.bucket_creations.load(Ordering::SeqCst), 1);
    assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn restart_reuses_existing_bucket() {
    let broker = MemoryBroker::new();
    let first = store_with(&MemoryConnector::new(Arc::clone(&broker)));
    first.init().await.unwrap();
    first.try_set("kept", 9).await.unwrap();
    first.close().await.unwrap();

    let second = store_with(&MemoryConnector::new(Arc::clone(&broker)));
    second.init().await.unwrap();

    assert_eq!(broker.bucket_creations.load(Ordering::SeqCst), 1);
    assert_eq!(second.try_get("kept").await.unwrap(), 9);
}

#[tokio::test]
async fn preexisting_stream_skips_creation() {
    let broker = MemoryBroker::preexisting(BUCKET);
    let store = store_with(&MemoryConnector::new(Arc::clone(&broker)));

    store.init().await.unwrap();

    assert_eq!(broker.bucket_creations.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starters_create_one_bucket() {
    let broker = MemoryBroker::new();
    let mut handles = Vec::new();
    for _ in 0 .. 8 {
        let store = store_with(&MemoryConnector::new(Arc::clone(&broker)));
        handles.push(tokio::spawn(async move { store.init().await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(broker.bucket_creations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stream_lookup_failure_is_provisioning_error() {
    let broker = MemoryBroker::new();
    broker.fail_stream_info.store(true, Ordering::SeqCst);
    let store = store_with(&MemoryConnector::new(Arc::clone(&broker)));

    let err = store.init().await.unwrap_err();

    assert!(matches!(err, StorageError::Provisioning(_)));
    assert_eq!(broker.bucket_creations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bucket_creation_failure_is_provisioning_error() {
    let broker = MemoryBroker::new();
    broker.fail_create_bucket.store(true, Ordering::SeqCst);
    let store = store_with(&MemoryConnector::new(Arc::clone(&broker)));

    let err = store.init().await.unwrap_err();

    assert!(matches!(err, StorageError::Provisioning(_)));
    assert!(matches!(store.try_get("any").await, Err(StorageError::Connection(_))));
}

#[tokio::test]
async fn unreachable_broker_is_connection_error() {
    let store = store_with(&MemoryConnector::unreachable());

    let err = store.init().await.unwrap_err();

    assert!(matches!(err, StorageError::Connection(_)));
}

#[tokio::test]
async fn operations_before_init_fail_with_connection_error() {
    let store = store_with(&MemoryConnector::new(MemoryBroker::new()));

    assert!(matches!(store.try_set("k", 1).await, Err(StorageError::Connection(_))));
    assert_eq!(store.get("k").await, 0);
}

#[tokio::test]
async fn close_releases_broker_and_rejects_operations() {
    let broker = MemoryBroker::new();
    let store = store_with(&MemoryConnector::new(Arc::clone(&broker)));
    store.init().await.unwrap();

    store.close().await.unwrap();

    assert!(broker.closed.load(Ordering::SeqCst));
    assert_eq!(store.try_increment("k", 1).await, Err(StorageError::Closed));
    store.close().await.unwrap();
    assert_eq!(broker.closes.load(Ordering::SeqCst), 1);
}
