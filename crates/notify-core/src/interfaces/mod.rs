// crates/notify-core/src/interfaces/mod.rs
// ============================================================================
// Module: Notify Interfaces
// Description: Backend-agnostic counter storage contract.
// Purpose: Define how outcome tallies are persisted without naming a backend.
// Dependencies: async-trait, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`CounterStore`] is the storage seam for named integer counters. Every
//! backend implements the error-returning `try_*` operations; the plain
//! `set`, `add`, and `get` methods are provided on top of them and apply the
//! log-and-continue policy used on the dispatch path.
//!
//! Implementations must be safe to call concurrently from many tasks without
//! external locking.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Counter storage errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Backend unreachable or not yet initialized.
    #[error("storage connection error: {0}")]
    Connection(String),
    /// Backing namespace could not be checked or created.
    #[error("storage provisioning error: {0}")]
    Provisioning(String),
    /// Key has never been written.
    #[error("counter not found: {0}")]
    NotFound(String),
    /// Stored value is not a base-10 integer.
    #[error("counter decode error for {key}: {message}")]
    Decode {
        /// Counter key.
        key: String,
        /// Decoder message.
        message: String,
    },
    /// Individual read or write failed after initialization.
    #[error("storage operation error: {0}")]
    Operation(String),
    /// Store was closed.
    #[error("storage closed")]
    Closed,
}

// ============================================================================
// SECTION: Add Semantics
// ============================================================================

/// How [`CounterStore::try_add`] treats its `delta` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddSemantics {
    /// Atomically add `delta` to the current value.
    #[default]
    Increment,
    /// Overwrite the counter with `delta`, exactly like `set`.
    Overwrite,
}

// ============================================================================
// SECTION: Counter Store
// ============================================================================

/// Named integer counter storage.
///
/// `init` must succeed before any other operation; `close` is called once at
/// shutdown. Each key is mutated independently; no guarantee spans keys.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Connects to the backend and ensures the backing namespace exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] or [`StorageError::Provisioning`].
    async fn init(&self) -> Result<(), StorageError>;

    /// Releases the backend connection.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the connection cannot be drained.
    async fn close(&self) -> Result<(), StorageError>;

    /// Unconditionally overwrites the counter at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the write fails.
    async fn try_set(&self, key: &str, value: i64) -> Result<(), StorageError>;

    /// Reads the counter at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the read or decode fails. Whether a
    /// never-written key is an error is backend-defined.
    async fn try_get(&self, key: &str) -> Result<i64, StorageError>;

    /// Atomically adds `delta` to the counter at `key`, returning the new value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the read-modify-write cannot complete.
    async fn try_increment(&self, key: &str, delta: i64) -> Result<i64, StorageError>;

    /// Returns the configured behavior of [`CounterStore::try_add`].
    fn add_semantics(&self) -> AddSemantics {
        AddSemantics::Increment
    }

    /// Applies `delta` according to [`CounterStore::add_semantics`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] from the underlying increment or set.
    async fn try_add(&self, key: &str, delta: i64) -> Result<i64, StorageError> {
        match self.add_semantics() {
            AddSemantics::Increment => self.try_increment(key, delta).await,
            AddSemantics::Overwrite => {
                self.try_set(key, delta).await?;
                Ok(delta)
            }
        }
    }

    /// Overwrites the counter, logging failures instead of returning them.
    async fn set(&self, key: &str, value: i64) {
        if let Err(err) = self.try_set(key, value).await {
            error!(key, value, error = %err, "counter set failed");
        }
    }

    /// Applies `delta`, logging failures instead of returning them.
    async fn add(&self, key: &str, delta: i64) {
        if let Err(err) = self.try_add(key, delta).await {
            error!(key, delta, error = %err, "counter add failed");
        }
    }

    /// Reads the counter, logging failures and returning zero on error.
    async fn get(&self, key: &str) -> i64 {
        match self.try_get(key).await {
            Ok(value) => value,
            Err(err) => {
                error!(key, error = %err, "counter get failed");
                0
            }
        }
    }
}
