// crates/notify-core/src/runtime/status.rs
// ============================================================================
// Module: Outcome Tallies
// Description: Counter keys and snapshot helpers for delivery outcomes.
// Purpose: Keep tally key naming in one place for dispatch, status, and metrics.
// Dependencies: crate::core, crate::interfaces, serde
// ============================================================================

//! ## Overview
//! Delivery outcomes are persisted as plain counters: one running total and
//! a success/error pair per [`Platform`]. Reads go through the lenient
//! [`CounterStore::get`] so a failing backend degrades to zeros.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::Platform;
use crate::interfaces::CounterStore;
use crate::interfaces::StorageError;

// ============================================================================
// SECTION: Keys
// ============================================================================

/// Counter key for the total number of processed notifications.
pub const TOTAL_COUNT_KEY: &str = "notify-total-count";

/// Returns the success counter key for `platform`.
#[must_use]
pub const fn success_key(platform: Platform) -> &'static str {
    match platform {
        Platform::Ios => "notify-ios-success-count",
        Platform::Android => "notify-android-success-count",
        Platform::Huawei => "notify-huawei-success-count",
    }
}

/// Returns the error counter key for `platform`.
#[must_use]
pub const fn error_key(platform: Platform) -> &'static str {
    match platform {
        Platform::Ios => "notify-ios-error-count",
        Platform::Android => "notify-android-error-count",
        Platform::Huawei => "notify-huawei-error-count",
    }
}

/// Every tally key, total first.
#[must_use]
pub fn all_keys() -> Vec<&'static str> {
    let mut keys = vec![TOTAL_COUNT_KEY];
    for platform in Platform::ALL {
        keys.push(success_key(platform));
        keys.push(error_key(platform));
    }
    keys
}

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Success and error counts for one platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlatformTally {
    /// Successful deliveries.
    pub push_success: i64,
    /// Failed deliveries.
    pub push_error: i64,
}

/// Point-in-time view of all outcome tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Total processed notifications.
    pub total_count: i64,
    /// iOS tallies.
    pub ios: PlatformTally,
    /// Android tallies.
    pub android: PlatformTally,
    /// Huawei tallies.
    pub huawei: PlatformTally,
}

impl StatusSnapshot {
    /// Returns the tally for `platform`.
    #[must_use]
    pub const fn platform(&self, platform: Platform) -> PlatformTally {
        match platform {
            Platform::Ios => self.ios,
            Platform::Android => self.android,
            Platform::Huawei => self.huawei,
        }
    }
}

/// Reads every tally from `store`.
pub async fn read_status(store: &dyn CounterStore) -> StatusSnapshot {
    let mut snapshot = StatusSnapshot {
        total_count: store.get(TOTAL_COUNT_KEY).await,
        ..StatusSnapshot::default()
    };
    for platform in Platform::ALL {
        let tally = PlatformTally {
            push_success: store.get(success_key(platform)).await,
            push_error: store.get(error_key(platform)).await,
        };
        match platform {
            Platform::Ios => snapshot.ios = tally,
            Platform::Android => snapshot.android = tally,
            Platform::Huawei => snapshot.huawei = tally,
        }
    }
    snapshot
}

/// Creates every tally key that has never been written, starting at zero.
///
/// Backends that report absent keys as [`StorageError::NotFound`] otherwise
/// log an error on every status read until the first delivery. Seeding adds
/// zero through [`CounterStore::try_increment`], so counts written by another
/// instance in the meantime are kept.
///
/// # Errors
///
/// Returns the first [`StorageError`] reported by the store.
pub async fn seed_status_keys(store: &dyn CounterStore) -> Result<(), StorageError> {
    for key in all_keys() {
        store.try_increment(key, 0).await?;
    }
    Ok(())
}

/// Records one delivery outcome of `weight` notifications.
pub async fn record_outcome(
    store: &dyn CounterStore,
    platform: Option<Platform>,
    success: bool,
    weight: i64,
) {
    store.add(TOTAL_COUNT_KEY, weight).await;
    let Some(platform) = platform else {
        return;
    };
    let key = if success { success_key(platform) } else { error_key(platform) };
    store.add(key, weight).await;
}
