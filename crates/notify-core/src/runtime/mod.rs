// crates/notify-core/src/runtime/mod.rs
// ============================================================================
// Module: Notify Runtime
// Description: In-memory counter storage and outcome tally helpers.
// Purpose: Provide runtime building blocks shared by server and stores.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Runtime helpers built on the [`crate::CounterStore`] contract.

pub mod status;
pub mod store;

pub use status::PlatformTally;
pub use status::StatusSnapshot;
pub use store::InMemoryCounterStore;
pub use store::SharedCounterStore;
