// crates/notify-server/src/delivery.rs
// ============================================================================
// Module: Push Delivery Seam
// Description: Collaborator interface for provider-specific delivery.
// Purpose: Let dispatch workers hand items to APNs/FCM/HMS clients.
// Dependencies: async-trait, notify-core, thiserror, tracing
// ============================================================================

//! ## Overview
//! Dispatch workers call [`PushDelivery::deliver`] once per notification and
//! record the outcome. Provider clients live outside this crate;
//! [`LogDelivery`] is the bundled dry-run implementation.

use async_trait::async_trait;
use notify_core::NotificationItem;
use thiserror::Error;
use tracing::info;

/// Delivery failures reported by a provider client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Provider refused the notification.
    #[error("provider rejected notification: {0}")]
    Rejected(String),
    /// Provider could not be reached.
    #[error("provider transport error: {0}")]
    Transport(String),
}

/// Delivers a single notification to its provider.
#[async_trait]
pub trait PushDelivery: Send + Sync {
    /// Delivers `item`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the provider does not accept the item.
    async fn deliver(&self, item: &NotificationItem) -> Result<(), DeliveryError>;
}

/// Dry-run delivery that logs each notification and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDelivery;

#[async_trait]
impl PushDelivery for LogDelivery {
    async fn deliver(&self, item: &NotificationItem) -> Result<(), DeliveryError> {
        info!(
            platform = item.platform.map_or("unknown", notify_core::Platform::as_str),
            tokens = item.tokens.len(),
            "delivered notification (dry run)"
        );
        Ok(())
    }
}
