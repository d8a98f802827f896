// crates/notify-core/src/core/mod.rs
// ============================================================================
// Module: Notify Core Types
// Description: Notification batch model shared by ingress and dispatch.
// Purpose: Group the data model under a single namespace.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Core types describing what a client submits. Items are opaque to this
//! crate beyond the fields needed to weight and classify outcome tallies.

pub mod notification;

pub use notification::BatchError;
pub use notification::NotificationBatch;
pub use notification::NotificationItem;
pub use notification::Platform;
pub use notification::PushRequest;
