// crates/notify-server/src/lib.rs
// ============================================================================
// Module: Notify Server
// Description: HTTP ingress, dispatch worker pool, and TLS front door.
// Purpose: Accept push submissions and process them asynchronously.
// Dependencies: axum, axum-server, notify-config, notify-core, tokio
// ============================================================================

//! ## Overview
//! The server crate wires the explicit [`notify_config::NotifyConfig`] into
//! three components:
//! - [`ingress`]: axum routes that validate batches and enqueue them.
//! - [`dispatch`]: a bounded worker pool delivering batches through
//!   [`delivery::PushDelivery`] and recording outcome tallies.
//! - [`front_door`]: plain HTTP, static TLS, or ACME TLS listeners.
//!
//! Status, request statistics, and Prometheus metrics are served from the
//! same router.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod delivery;
pub mod dispatch;
pub mod error;
pub mod front_door;
pub mod ingress;
pub mod metrics;
pub mod sys_stats;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use delivery::DeliveryError;
pub use delivery::LogDelivery;
pub use delivery::PushDelivery;
pub use dispatch::BatchSink;
pub use dispatch::DispatchConfig;
pub use dispatch::DispatchError;
pub use dispatch::DispatchQueue;
pub use error::ServerError;
pub use front_door::NotifyServer;
pub use front_door::shutdown_signal;
pub use ingress::AppState;
pub use ingress::IngressError;
pub use ingress::accept_push;
pub use ingress::build_router;
