// crates/notify-config/src/lib.rs
// ============================================================================
// Module: Notify Config Library
// Description: Canonical config model, validation, and snapshot rendering.
// Purpose: Single source of truth for notify.toml semantics.
// Dependencies: notify-core, serde, toml, serde_yaml
// ============================================================================

//! ## Overview
//! `notify-config` defines the explicit configuration object passed to the
//! HTTP ingress, the dispatch queue, and the counter store. Nothing reads
//! configuration from ambient global state.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
