// crates/notify-store-nats/src/store.rs
// ============================================================================
// Module: NATS Counter Store
// Description: CounterStore over a JetStream key-value bucket.
// Purpose: Persist counters durably with an idempotent bucket bootstrap.
// Dependencies: notify-core, bytes, tracing
// ============================================================================

//! ## Overview
//! `init` connects, derives the bucket's stream name (`KV_<bucket>`), and
//! creates the bucket only when that stream is absent. A creation failure is
//! tolerated when a concurrent starter created the bucket first, so the
//! sequence is safe on every process start.
//!
//! Values are base-10 ASCII integers. Increments use revision-checked
//! compare-and-swap so concurrent dispatch workers never lose an update.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use notify_core::AddSemantics;
use notify_core::CounterStore;
use notify_core::StorageError;
use tracing::debug;
use tracing::info;

use crate::broker::BrokerConnector;
use crate::broker::BucketSpec;
use crate::broker::JetStreamConnector;
use crate::broker::KvBroker;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix JetStream uses for key-value bucket streams.
pub const STREAM_PREFIX: &str = "KV_";
/// Replica count for the bucket.
pub const BUCKET_REPLICAS: usize = 1;
/// Revisions retained per key.
pub const BUCKET_HISTORY: i64 = 3;
/// Description attached to the bucket.
pub const BUCKET_DESCRIPTION: &str = "notify counter bucket";
/// Compare-and-swap attempts before an increment gives up.
const MAX_CAS_ATTEMPTS: usize = 16;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the NATS counter store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatsStoreConfig {
    /// Server URL.
    pub addr: String,
    /// Bucket name.
    pub bucket: String,
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Behavior of `add`.
    pub add_semantics: AddSemantics,
}

impl NatsStoreConfig {
    /// Returns the bucket creation parameters.
    #[must_use]
    pub fn bucket_spec(&self) -> BucketSpec {
        BucketSpec {
            bucket: self.bucket.clone(),
            description: BUCKET_DESCRIPTION.to_string(),
            replicas: BUCKET_REPLICAS,
            history: BUCKET_HISTORY,
        }
    }
}

/// Derives the stream name backing `bucket`.
#[must_use]
pub fn stream_name(bucket: &str) -> String {
    format!("{STREAM_PREFIX}{bucket}")
}

// ============================================================================
// SECTION: Codec
// ============================================================================

/// Encodes a counter as base-10 ASCII.
#[must_use]
pub fn encode_counter(value: i64) -> Bytes {
    Bytes::from(value.to_string())
}

/// Decodes a base-10 ASCII counter.
///
/// # Errors
///
/// Returns [`StorageError::Decode`] for non-UTF-8 or non-integer values.
pub fn decode_counter(key: &str, raw: &[u8]) -> Result<i64, StorageError> {
    let text = std::str::from_utf8(raw).map_err(|_| StorageError::Decode {
        key: key.to_string(),
        message: "value is not utf-8".to_string(),
    })?;
    text.trim().parse::<i64>().map_err(|err| StorageError::Decode {
        key: key.to_string(),
        message: format!("{err}: {text:?}"),
    })
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Connection lifecycle.
enum BrokerState {
    /// `init` has not succeeded yet.
    Disconnected,
    /// Connected and bucket ensured.
    Ready(Arc<dyn KvBroker>),
    /// `close` was called.
    Closed,
}

/// Counter store backed by a JetStream key-value bucket.
pub struct NatsCounterStore {
    /// Store configuration.
    config: NatsStoreConfig,
    /// Opens broker connections.
    connector: Arc<dyn BrokerConnector>,
    /// Current connection.
    state: RwLock<BrokerState>,
}

impl NatsCounterStore {
    /// Creates a store that connects to NATS on `init`.
    #[must_use]
    pub fn new(config: NatsStoreConfig) -> Self {
        let connector = JetStreamConnector {
            addr: config.addr.clone(),
            timeout: Duration::from_millis(config.connect_timeout_ms),
        };
        Self::with_connector(config, Arc::new(connector))
    }

    /// Creates a store with an explicit connector.
    #[must_use]
    pub fn with_connector(config: NatsStoreConfig, connector: Arc<dyn BrokerConnector>) -> Self {
        Self {
            config,
            connector,
            state: RwLock::new(BrokerState::Disconnected),
        }
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &NatsStoreConfig {
        &self.config
    }

    /// Returns the connected broker.
    fn broker(&self) -> Result<Arc<dyn KvBroker>, StorageError> {
        let guard = self
            .state
            .read()
            .map_err(|_| StorageError::Operation("state lock poisoned".to_string()))?;
        match &*guard {
            BrokerState::Ready(broker) => Ok(Arc::clone(broker)),
            BrokerState::Disconnected => {
                Err(StorageError::Connection("store not initialized".to_string()))
            }
            BrokerState::Closed => Err(StorageError::Closed),
        }
    }

    /// Replaces the connection state, returning the previous one.
    fn replace_state(&self, next: BrokerState) -> Result<BrokerState, StorageError> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| StorageError::Operation("state lock poisoned".to_string()))?;
        Ok(std::mem::replace(&mut *guard, next))
    }

    /// Ensures the bucket exists, creating it at most once.
    async fn ensure_bucket(&self, broker: &dyn KvBroker) -> Result<(), StorageError> {
        let stream = stream_name(&self.config.bucket);
        if broker.stream_exists(&stream).await? {
            debug!(bucket = %self.config.bucket, stream = %stream, "counter bucket exists");
            return Ok(());
        }
        let spec = self.config.bucket_spec();
        match broker.create_bucket(&spec).await {
            Ok(()) => {
                info!(
                    bucket = %spec.bucket,
                    replicas = spec.replicas,
                    history = spec.history,
                    "created counter bucket"
                );
                Ok(())
            }
            Err(err) => {
                if matches!(broker.stream_exists(&stream).await, Ok(true)) {
                    debug!(bucket = %spec.bucket, "counter bucket created by another starter");
                    Ok(())
                } else {
                    Err(err)
                }
            }
        }
    }
}

#[async_trait]
impl CounterStore for NatsCounterStore {
    async fn init(&self) -> Result<(), StorageError> {
        let broker = match self.broker() {
            Ok(broker) => broker,
            Err(_) => self.connector.connect().await?,
        };
        self.ensure_bucket(broker.as_ref()).await?;
        self.replace_state(BrokerState::Ready(broker))?;
        info!(addr = %self.config.addr, bucket = %self.config.bucket, "counter store ready");
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        match self.replace_state(BrokerState::Closed)? {
            BrokerState::Ready(broker) => {
                broker.close().await?;
                info!(bucket = %self.config.bucket, "counter store closed");
                Ok(())
            }
            BrokerState::Disconnected | BrokerState::Closed => Ok(()),
        }
    }

    async fn try_set(&self, key: &str, value: i64) -> Result<(), StorageError> {
        let broker = self.broker()?;
        broker.put(&self.config.bucket, key, encode_counter(value)).await?;
        Ok(())
    }

    async fn try_get(&self, key: &str) -> Result<i64, StorageError> {
        let broker = self.broker()?;
        let entry = broker
            .entry(&self.config.bucket, key)
            .await?
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        decode_counter(key, &entry.value)
    }

    async fn try_increment(&self, key: &str, delta: i64) -> Result<i64, StorageError> {
        let broker = self.broker()?;
        let bucket = &self.config.bucket;
        for attempt in 0..MAX_CAS_ATTEMPTS {
            let written = match broker.entry(bucket, key).await? {
                None => broker.create(bucket, key, encode_counter(delta)).await?.map(|_| delta),
                Some(entry) => {
                    let next = decode_counter(key, &entry.value)?.saturating_add(delta);
                    broker
                        .update(bucket, key, encode_counter(next), entry.revision)
                        .await?
                        .map(|_| next)
                }
            };
            if let Some(value) = written {
                return Ok(value);
            }
            debug!(key, attempt, "counter increment lost a revision race; retrying");
        }
        Err(StorageError::Operation(format!(
            "increment of {key} exceeded {MAX_CAS_ATTEMPTS} attempts"
        )))
    }

    fn add_semantics(&self) -> AddSemantics {
        self.config.add_semantics
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn stream_name_uses_kv_prefix() {
        assert_eq!(stream_name("notify"), "KV_notify");
    }

    #[test]
    fn codec_round_trips_extremes() {
        for value in [i64::MIN, -1, 0, 42, i64::MAX] {
            assert_eq!(decode_counter("k", &encode_counter(value)).unwrap(), value);
        }
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_counter("k", b"twelve").unwrap_err();
        assert!(matches!(err, StorageError::Decode { .. }));
        let err = decode_counter("k", &[0xff, 0xfe]).unwrap_err();
        assert!(err.to_string().contains("utf-8"));
    }

    #[test]
    fn bucket_spec_uses_fixed_parameters() {
        let config = NatsStoreConfig {
            addr: "nats://127.0.0.1:4222".to_string(),
            bucket: "notify".to_string(),
            connect_timeout_ms: 1_000,
            add_semantics: AddSemantics::Increment,
        };
        let spec = config.bucket_spec();
        assert_eq!(spec.replicas, 1);
        assert_eq!(spec.history, 3);
        assert_eq!(spec.description, BUCKET_DESCRIPTION);
    }
}
