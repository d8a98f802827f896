// crates/notify-store-nats/tests/common/mod.rs
// =============================================================================
// Module: NATS Store Test Helpers
// Description: In-process KvBroker fake with failure injection.
// Purpose: Exercise bootstrap and counter semantics without a NATS server.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use bytes::Bytes;
use notify_core::AddSemantics;
use notify_core::StorageError;
use notify_store_nats::BrokerConnector;
use notify_store_nats::BucketSpec;
use notify_store_nats::KvBroker;
use notify_store_nats::KvEntry;
use notify_store_nats::NatsCounterStore;
use notify_store_nats::NatsStoreConfig;

/// Bucket name used by every suite.
pub const BUCKET: &str = "notify-test";

#[derive(Default)]
struct BrokerData {
    streams: BTreeSet<String>,
    buckets: BTreeMap<String, BTreeMap<String, KvEntry>>,
    revision: u64,
}

/// In-memory stand-in for a JetStream server.
#[derive(Default)]
pub struct MemoryBroker {
    data: Mutex<BrokerData>,
    /// Number of successful bucket creations.
    pub bucket_creations: AtomicUsize,
    /// Spec passed to the last successful creation.
    pub last_spec: Mutex<Option<BucketSpec>>,
    /// Makes stream lookups fail with a non-"not found" error.
    pub fail_stream_info: AtomicBool,
    /// Makes bucket creation fail.
    pub fail_create_bucket: AtomicBool,
    /// Number of upcoming updates that report a revision conflict.
    pub forced_conflicts: AtomicUsize,
    /// Set by `close`.
    pub closed: AtomicBool,
    /// Number of `close` calls.
    pub closes: AtomicUsize,
}

impl MemoryBroker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `bucket` as if an earlier process had created it.
    pub fn preexisting(bucket: &str) -> Arc<Self> {
        let broker = Self::default();
        {
            let mut data = broker.data.lock().unwrap();
            data.streams.insert(format!("KV_{bucket}"));
            data.buckets.insert(bucket.to_string(), BTreeMap::new());
        }
        Arc::new(broker)
    }

    /// Writes raw bytes, bypassing the store's codec.
    pub fn put_raw(&self, bucket: &str, key: &str, value: &[u8]) {
        let mut data = self.data.lock().unwrap();
        data.revision += 1;
        let revision = data.revision;
        data.buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            KvEntry {
                value: Bytes::copy_from_slice(value),
                revision,
            },
        );
    }

    /// Reads raw bytes.
    pub fn raw(&self, bucket: &str, key: &str) -> Option<Bytes> {
        let data = self.data.lock().unwrap();
        data.buckets.get(bucket)?.get(key).map(|entry| entry.value.clone())
    }

    fn with_bucket<T>(
        &self,
        bucket: &str,
        f: impl FnOnce(&mut BTreeMap<String, KvEntry>, u64) -> (T, bool),
    ) -> Result<T, StorageError> {
        let mut data = self.data.lock().unwrap();
        let next = data.revision + 1;
        let entries = data
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::Operation(format!("bucket {bucket} not found")))?;
        let (out, wrote) = f(entries, next);
        if wrote {
            data.revision = next;
        }
        Ok(out)
    }
}

#[async_trait]
impl KvBroker for MemoryBroker {
    async fn stream_exists(&self, stream: &str) -> Result<bool, StorageError> {
        if self.fail_stream_info.load(Ordering::SeqCst) {
            return Err(StorageError::Provisioning("stream info unavailable".to_string()));
        }
        Ok(self.data.lock().unwrap().streams.contains(stream))
    }

    async fn create_bucket(&self, spec: &BucketSpec) -> Result<(), StorageError> {
        if self.fail_create_bucket.load(Ordering::SeqCst) {
            return Err(StorageError::Provisioning("insufficient resources".to_string()));
        }
        let mut data = self.data.lock().unwrap();
        let stream = format!("KV_{}", spec.bucket);
        if !data.streams.insert(stream) {
            return Err(StorageError::Provisioning("stream name already in use".to_string()));
        }
        data.buckets.insert(spec.bucket.clone(), BTreeMap::new());
        self.bucket_creations.fetch_add(1, Ordering::SeqCst);
        *self.last_spec.lock().unwrap() = Some(spec.clone());
        Ok(())
    }

    async fn put(&self, bucket: &str, key: &str, value: Bytes) -> Result<u64, StorageError> {
        self.with_bucket(bucket, |entries, revision| {
            entries.insert(
                key.to_string(),
                KvEntry {
                    value,
                    revision,
                },
            );
            (revision, true)
        })
    }

    async fn entry(&self, bucket: &str, key: &str) -> Result<Option<KvEntry>, StorageError> {
        self.with_bucket(bucket, |entries, _| (entries.get(key).cloned(), false))
    }

    async fn create(
        &self,
        bucket: &str,
        key: &str,
        value: Bytes,
    ) -> Result<Option<u64>, StorageError> {
        self.with_bucket(bucket, |entries, revision| {
            if entries.contains_key(key) {
                return (None, false);
            }
            entries.insert(
                key.to_string(),
                KvEntry {
                    value,
                    revision,
                },
            );
            (Some(revision), true)
        })
    }

    async fn update(
        &self,
        bucket: &str,
        key: &str,
        value: Bytes,
        expected: u64,
    ) -> Result<Option<u64>, StorageError> {
        let forced = self
            .forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced {
            return Ok(None);
        }
        self.with_bucket(bucket, |entries, revision| match entries.get_mut(key) {
            Some(entry) if entry.revision == expected => {
                *entry = KvEntry {
                    value,
                    revision,
                };
                (Some(revision), true)
            }
            _ => (None, false),
        })
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.closed.store(true, Ordering::SeqCst);
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector handing out a shared [`MemoryBroker`].
pub struct MemoryConnector {
    pub broker: Arc<MemoryBroker>,
    pub connects: AtomicUsize,
    pub unreachable: bool,
}

impl MemoryConnector {
    pub fn new(broker: Arc<MemoryBroker>) -> Arc<Self> {
        Arc::new(Self {
            broker,
            connects: AtomicUsize::new(0),
            unreachable: false,
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            broker: MemoryBroker::new(),
            connects: AtomicUsize::new(0),
            unreachable: true,
        })
    }
}

#[async_trait]
impl BrokerConnector for MemoryConnector {
    async fn connect(&self) -> Result<Arc<dyn KvBroker>, StorageError> {
        if self.unreachable {
            return Err(StorageError::Connection("nats://127.0.0.1:1: connection refused".to_string()));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.broker) as Arc<dyn KvBroker>)
    }
}

/// Store configuration pointing at [`BUCKET`].
pub fn store_config(add_semantics: AddSemantics) -> NatsStoreConfig {
    NatsStoreConfig {
        addr: "nats://127.0.0.1:4222".to_string(),
        bucket: BUCKET.to_string(),
        connect_timeout_ms: 500,
        add_semantics,
    }
}

/// Builds a store over `connector` with increment semantics.
pub fn store_with(connector: &Arc<MemoryConnector>) -> NatsCounterStore {
    NatsCounterStore::with_connector(
        store_config(AddSemantics::Increment),
        Arc::clone(connector) as Arc<dyn BrokerConnector>,
    )
}
