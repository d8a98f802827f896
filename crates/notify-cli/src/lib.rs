// crates/notify-cli/src/lib.rs
// ============================================================================
// Module: Notify CLI Library
// Description: Logging setup and serve orchestration for the `notify` binary.
// Purpose: Keep the binary thin and the startup sequence testable.
// Dependencies: notify-config, notify-server, notify-store-nats, tracing-subscriber
// ============================================================================

//! ## Overview
//! [`serve::run`] performs the whole process lifecycle: build the configured
//! counter store, initialize it (fatal on failure), start the dispatch queue,
//! serve until shutdown, then drain the queue and close the store.

pub mod logging;
pub mod serve;
