// crates/notify-core/src/core/notification.rs
// ============================================================================
// Module: Notification Model
// Description: Push request payloads and validated notification batches.
// Purpose: Enforce batch size invariants before anything is enqueued.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`PushRequest`] is the raw decoded request body. It becomes a
//! [`NotificationBatch`] only after [`NotificationBatch::new`] checks that it
//! is non-empty and within the configured maximum. Item payloads are carried
//! through untouched for the delivery collaborator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Platform
// ============================================================================

/// Push provider family targeted by a notification.
///
/// # Invariants
/// - Variants are stable; their labels are used in counter keys and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Apple Push Notification service.
    Ios,
    /// Firebase Cloud Messaging.
    Android,
    /// Huawei Push Kit.
    Huawei,
}

impl Platform {
    /// All platforms in stable reporting order.
    pub const ALL: [Self; 3] = [Self::Ios, Self::Android, Self::Huawei];

    /// Returns a stable label for the platform.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Huawei => "huawei",
        }
    }
}

// ============================================================================
// SECTION: Items
// ============================================================================

/// A single notification as submitted by a client.
///
/// Only `platform` and `tokens` are interpreted here; every other field is
/// preserved in `payload` for the delivery collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationItem {
    /// Target platform, when the client specified one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// Device tokens addressed by this notification.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
    /// Remaining provider-specific fields.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl NotificationItem {
    /// Returns the tally weight of this item: one per token, at least one.
    #[must_use]
    pub fn weight(&self) -> i64 {
        i64::try_from(self.tokens.len()).unwrap_or(i64::MAX).max(1)
    }
}

/// Raw push submission body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    /// Submitted notifications, in request order.
    pub notifications: Vec<NotificationItem>,
}

// ============================================================================
// SECTION: Batches
// ============================================================================

/// Batch validation failures.
///
/// # Invariants
/// - Messages are client-facing and stable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// The request carried zero notifications.
    #[error("Notifications field is empty.")]
    Empty,
    /// The request carried more notifications than allowed.
    #[error("Number of notifications({submitted}) over limit({limit})")]
    TooLarge {
        /// Number of notifications submitted.
        submitted: usize,
        /// Configured maximum.
        limit: usize,
    },
}

/// A validated, non-empty batch of notifications.
///
/// # Invariants
/// - `0 < items.len() <= limit` for the limit it was constructed with.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationBatch {
    /// Notifications in submission order.
    items: Vec<NotificationItem>,
}

impl NotificationBatch {
    /// Validates `items` against `limit` and builds a batch.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Empty`] for zero items and
    /// [`BatchError::TooLarge`] when `items.len() > limit`.
    pub fn new(items: Vec<NotificationItem>, limit: usize) -> Result<Self, BatchError> {
        if items.is_empty() {
            return Err(BatchError::Empty);
        }
        if items.len() > limit {
            return Err(BatchError::TooLarge {
                submitted: items.len(),
                limit,
            });
        }
        Ok(Self {
            items,
        })
    }

    /// Returns the number of notifications in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the notifications in submission order.
    #[must_use]
    pub fn items(&self) -> &[NotificationItem] {
        &self.items
    }

    /// Consumes the batch, returning its notifications.
    #[must_use]
    pub fn into_items(self) -> Vec<NotificationItem> {
        self.items
    }

    /// Sum of item weights.
    #[must_use]
    pub fn total_weight(&self) -> i64 {
        self.items.iter().map(NotificationItem::weight).fold(0_i64, i64::saturating_add)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
