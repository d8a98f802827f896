// crates/notify-store-nats/src/lib.rs
// ============================================================================
// Module: NATS Counter Store
// Description: Durable CounterStore backend over a JetStream key-value bucket.
// Purpose: Persist outcome tallies in a replicated broker-hosted bucket.
// Dependencies: notify-core, async-nats, bytes
// ============================================================================

//! ## Overview
//! This crate provides [`NatsCounterStore`], a [`notify_core::CounterStore`]
//! that keeps each counter as a base-10 string in a JetStream key-value
//! bucket. The bucket is bootstrapped idempotently on every `init`. Broker
//! access goes through the [`KvBroker`] seam so the bootstrap protocol can be
//! exercised without a running server.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod broker;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use broker::BrokerConnector;
pub use broker::BucketSpec;
pub use broker::JetStreamBroker;
pub use broker::JetStreamConnector;
pub use broker::KvBroker;
pub use broker::KvEntry;
pub use store::NatsCounterStore;
pub use store::NatsStoreConfig;
