// crates/notify-core/src/lib.rs
// ============================================================================
// Module: Notify Core Library
// Description: Public API surface for the Notify core.
// Purpose: Expose the notification model, counter store contract, and runtime helpers.
// Dependencies: async-trait, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! `notify-core` holds the transport-independent pieces of the push
//! notification service: the batch model validated at ingress, the
//! [`CounterStore`] contract used to persist outcome tallies, and an
//! in-memory store for tests and single-process deployments.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::BatchError;
pub use crate::core::NotificationBatch;
pub use crate::core::NotificationItem;
pub use crate::core::Platform;
pub use crate::core::PushRequest;
pub use interfaces::AddSemantics;
pub use interfaces::CounterStore;
pub use interfaces::StorageError;
pub use runtime::InMemoryCounterStore;
pub use runtime::PlatformTally;
pub use runtime::SharedCounterStore;
pub use runtime::StatusSnapshot;
