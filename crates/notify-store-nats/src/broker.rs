// crates/notify-store-nats/src/broker.rs
// ============================================================================
// Module: Key-Value Broker Seam
// Description: Minimal broker operations needed by the counter store.
// Purpose: Isolate async-nats behind a trait the store can be tested against.
// Dependencies: async-nats, async-trait, bytes, notify-core
// ============================================================================

//! ## Overview
//! [`KvBroker`] covers stream lookup, bucket creation, and the per-key
//! primitives (put, read with revision, create-if-absent, compare-and-swap).
//! [`JetStreamBroker`] implements it over `async_nats::jetstream`, resolving
//! the bucket handle on every call so a server-side handle invalidation never
//! leaves the store holding a stale handle.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_nats::jetstream;
use async_nats::jetstream::ErrorCode;
use async_nats::jetstream::context::GetStreamErrorKind;
use async_nats::jetstream::kv;
use async_trait::async_trait;
use bytes::Bytes;
use notify_core::StorageError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Parameters used when creating the backing bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSpec {
    /// Bucket name.
    pub bucket: String,
    /// Human-readable description.
    pub description: String,
    /// Replica count.
    pub replicas: usize,
    /// Revisions retained per key.
    pub history: i64,
}

/// Current value and revision of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    /// Raw stored value.
    pub value: Bytes,
    /// Revision that wrote `value`.
    pub revision: u64,
}

// ============================================================================
// SECTION: Traits
// ============================================================================

/// Broker operations used by the counter store.
#[async_trait]
pub trait KvBroker: Send + Sync {
    /// Returns whether `stream` exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Provisioning`] for any failure other than "not found".
    async fn stream_exists(&self, stream: &str) -> Result<bool, StorageError>;

    /// Creates a key-value bucket.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Provisioning`] when creation fails.
    async fn create_bucket(&self, spec: &BucketSpec) -> Result<(), StorageError>;

    /// Writes `value` at `key`, returning the new revision.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Operation`] when the bucket or write fails.
    async fn put(&self, bucket: &str, key: &str, value: Bytes) -> Result<u64, StorageError>;

    /// Reads the live value at `key`; deleted or purged keys read as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Operation`] when the bucket or read fails.
    async fn entry(&self, bucket: &str, key: &str) -> Result<Option<KvEntry>, StorageError>;

    /// Creates `key` if absent; `None` means another writer created it first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Operation`] for failures other than "already exists".
    async fn create(
        &self,
        bucket: &str,
        key: &str,
        value: Bytes,
    ) -> Result<Option<u64>, StorageError>;

    /// Writes `key` only if its revision is still `revision`; `None` on conflict.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Operation`] for failures other than a revision conflict.
    async fn update(
        &self,
        bucket: &str,
        key: &str,
        value: Bytes,
        revision: u64,
    ) -> Result<Option<u64>, StorageError>;

    /// Drains pending writes and closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] when the connection cannot be drained.
    async fn close(&self) -> Result<(), StorageError>;
}

/// Opens broker connections on `init`.
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    /// Connects to the broker.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] when the broker is unreachable.
    async fn connect(&self) -> Result<Arc<dyn KvBroker>, StorageError>;
}

// ============================================================================
// SECTION: JetStream
// ============================================================================

/// [`KvBroker`] over a NATS JetStream context.
pub struct JetStreamBroker {
    /// Core client, drained on close.
    client: async_nats::Client,
    /// JetStream context for stream and bucket management.
    context: jetstream::Context,
}

impl JetStreamBroker {
    /// Connects to `addr` and opens a JetStream context.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] when the server is unreachable.
    pub async fn connect(addr: &str, timeout: Duration) -> Result<Self, StorageError> {
        let client = async_nats::ConnectOptions::new()
            .connection_timeout(timeout)
            .connect(addr)
            .await
            .map_err(|err| StorageError::Connection(format!("{addr}: {err}")))?;
        let context = jetstream::new(client.clone());
        Ok(Self {
            client,
            context,
        })
    }

    /// Resolves the bucket handle.
    async fn bucket(&self, bucket: &str) -> Result<kv::Store, StorageError> {
        self.context
            .get_key_value(bucket)
            .await
            .map_err(|err| StorageError::Operation(format!("resolve bucket {bucket}: {err}")))
    }
}

#[async_trait]
impl KvBroker for JetStreamBroker {
    async fn stream_exists(&self, stream: &str) -> Result<bool, StorageError> {
        match self.context.get_stream(stream).await {
            Ok(_) => Ok(true),
            Err(err) => match err.kind() {
                GetStreamErrorKind::JetStream(source)
                    if source.error_code() == ErrorCode::STREAM_NOT_FOUND =>
                {
                    Ok(false)
                }
                _ => Err(StorageError::Provisioning(format!("stream info {stream}: {err}"))),
            },
        }
    }

    async fn create_bucket(&self, spec: &BucketSpec) -> Result<(), StorageError> {
        self.context
            .create_key_value(kv::Config {
                bucket: spec.bucket.clone(),
                description: spec.description.clone(),
                history: spec.history,
                num_replicas: spec.replicas,
                ..Default::default()
            })
            .await
            .map(|_| ())
            .map_err(|err| StorageError::Provisioning(format!("create bucket {}: {err}", spec.bucket)))
    }

    async fn put(&self, bucket: &str, key: &str, value: Bytes) -> Result<u64, StorageError> {
        self.bucket(bucket)
            .await?
            .put(key, value)
            .await
            .map_err(|err| StorageError::Operation(format!("put {key}: {err}")))
    }

    async fn entry(&self, bucket: &str, key: &str) -> Result<Option<KvEntry>, StorageError> {
        let entry = self
            .bucket(bucket)
            .await?
            .entry(key)
            .await
            .map_err(|err| StorageError::Operation(format!("get {key}: {err}")))?;
        Ok(entry.filter(|entry| matches!(entry.operation, kv::Operation::Put)).map(|entry| {
            KvEntry {
                value: entry.value,
                revision: entry.revision,
            }
        }))
    }

    async fn create(
        &self,
        bucket: &str,
        key: &str,
        value: Bytes,
    ) -> Result<Option<u64>, StorageError> {
        match self.bucket(bucket).await?.create(key, value).await {
            Ok(revision) => Ok(Some(revision)),
            Err(err) if matches!(err.kind(), kv::CreateErrorKind::AlreadyExists) => Ok(None),
            Err(err) => Err(StorageError::Operation(format!("create {key}: {err}"))),
        }
    }

    async fn update(
        &self,
        bucket: &str,
        key: &str,
        value: Bytes,
        revision: u64,
    ) -> Result<Option<u64>, StorageError> {
        match self.bucket(bucket).await?.update(key, value, revision).await {
            Ok(revision) => Ok(Some(revision)),
            Err(err) if matches!(err.kind(), kv::UpdateErrorKind::WrongLastRevision) => Ok(None),
            Err(err) => Err(StorageError::Operation(format!("update {key}: {err}"))),
        }
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.client
            .drain()
            .await
            .map_err(|err| StorageError::Connection(format!("drain on close: {err}")))
    }
}

/// Connector producing [`JetStreamBroker`] instances.
#[derive(Debug, Clone)]
pub struct JetStreamConnector {
    /// Server URL.
    pub addr: String,
    /// Connection timeout.
    pub timeout: Duration,
}

#[async_trait]
impl BrokerConnector for JetStreamConnector {
    async fn connect(&self) -> Result<Arc<dyn KvBroker>, StorageError> {
        let broker = JetStreamBroker::connect(&self.addr, self.timeout).await?;
        Ok(Arc::new(broker))
    }
}
