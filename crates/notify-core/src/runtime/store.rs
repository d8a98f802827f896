// crates/notify-core/src/runtime/store.rs
// ============================================================================
// Module: Notify In-Memory Store
// Description: Mutex-guarded counter store and a shared trait-object wrapper.
// Purpose: Provide a dependency-free CounterStore for tests and local runs.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryCounterStore`] keeps counters in a `BTreeMap`. Keys that were
//! never written read as zero. [`SharedCounterStore`] wraps any backend in a
//! clonable handle so the dispatch workers and HTTP handlers can share it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;

use crate::interfaces::AddSemantics;
use crate::interfaces::CounterStore;
use crate::interfaces::StorageError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory counter store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCounterStore {
    /// Counter map protected by a mutex.
    counters: Arc<Mutex<BTreeMap<String, i64>>>,
    /// Set once `close` has been called.
    closed: Arc<AtomicBool>,
    /// Behavior of `try_add`.
    semantics: AddSemantics,
}

impl InMemoryCounterStore {
    /// Creates an empty store with increment semantics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with explicit `add` semantics.
    #[must_use]
    pub fn with_semantics(semantics: AddSemantics) -> Self {
        Self {
            semantics,
            ..Self::default()
        }
    }

    /// Runs `f` against the counter map, failing if the store is closed.
    fn with_counters<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, i64>) -> T,
    ) -> Result<T, StorageError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        let mut guard = self
            .counters
            .lock()
            .map_err(|_| StorageError::Operation("mutex poisoned".to_string()))?;
        Ok(f(&mut guard))
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn init(&self) -> Result<(), StorageError> {
        self.closed.store(false, Ordering::Release);
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    async fn try_set(&self, key: &str, value: i64) -> Result<(), StorageError> {
        self.with_counters(|counters| {
            counters.insert(key.to_string(), value);
        })
    }

    async fn try_get(&self, key: &str) -> Result<i64, StorageError> {
        self.with_counters(|counters| counters.get(key).copied().unwrap_or(0))
    }

    async fn try_increment(&self, key: &str, delta: i64) -> Result<i64, StorageError> {
        self.with_counters(|counters| {
            let slot = counters.entry(key.to_string()).or_insert(0);
            *slot = slot.saturating_add(delta);
            *slot
        })
    }

    fn add_semantics(&self) -> AddSemantics {
        self.semantics
    }
}

// ============================================================================
// SECTION: Shared Store
// ============================================================================

/// Shared counter store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedCounterStore {
    /// Inner store implementation.
    inner: Arc<dyn CounterStore>,
}

impl SharedCounterStore {
    /// Wraps a counter store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl CounterStore + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn CounterStore>) -> Self {
        Self {
            inner: store,
        }
    }
}

#[async_trait]
impl CounterStore for SharedCounterStore {
    async fn init(&self) -> Result<(), StorageError> {
        self.inner.init().await
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.inner.close().await
    }

    async fn try_set(&self, key: &str, value: i64) -> Result<(), StorageError> {
        self.inner.try_set(key, value).await
    }

    async fn try_get(&self, key: &str) -> Result<i64, StorageError> {
        self.inner.try_get(key).await
    }

    async fn try_increment(&self, key: &str, delta: i64) -> Result<i64, StorageError> {
        self.inner.try_increment(key, delta).await
    }

    fn add_semantics(&self) -> AddSemantics {
        self.inner.add_semantics()
    }
}
