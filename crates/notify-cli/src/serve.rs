// crates/notify-cli/src/serve.rs
// ============================================================================
// Module: Serve Orchestration
// Description: Store construction and server lifecycle for `notify serve`.
// Purpose: Pass one explicit configuration object to every component.
// Dependencies: notify-config, notify-core, notify-server, notify-store-nats
// ============================================================================

//! ## Overview
//! Startup order is store, dispatch queue, front door. Shutdown runs in
//! reverse: stop accepting requests, drain the queue within
//! `core.shutdown_timeout_ms`, then close the store. Drain timeouts and
//! close failures are logged; they do not change the exit status.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use notify_config::NotifyConfig;
use notify_config::StatConfig;
use notify_config::StoreEngine;
use notify_core::CounterStore;
use notify_core::InMemoryCounterStore;
use notify_core::SharedCounterStore;
use notify_core::runtime::status::seed_status_keys;
use notify_server::AppState;
use notify_server::BatchSink;
use notify_server::DispatchConfig;
use notify_server::DispatchQueue;
use notify_server::LogDelivery;
use notify_server::NotifyServer;
use notify_server::PushDelivery;
use notify_server::ServerError;
use notify_store_nats::NatsCounterStore;
use notify_store_nats::NatsStoreConfig;
use tracing::error;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Store
// ============================================================================

/// Builds the counter store selected by `stat.engine`.
#[must_use]
pub fn build_store(stat: &StatConfig) -> SharedCounterStore {
    match stat.engine {
        StoreEngine::Memory => {
            SharedCounterStore::from_store(InMemoryCounterStore::with_semantics(stat.add_semantics))
        }
        StoreEngine::Nats => SharedCounterStore::from_store(NatsCounterStore::new(NatsStoreConfig {
            addr: stat.nats.addr.clone(),
            bucket: stat.nats.bucket.clone(),
            connect_timeout_ms: stat.nats.connect_timeout_ms,
            add_semantics: stat.add_semantics,
        })),
    }
}

/// Initializes `store` and seeds tally keys that were never written.
///
/// # Errors
///
/// Returns [`ServerError::Storage`] when the store cannot connect or provision.
pub async fn prepare_store(store: &SharedCounterStore) -> Result<(), ServerError> {
    store.init().await?;
    seed_status_keys(store).await?;
    Ok(())
}

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

/// Runs the server with the configured store and dry-run delivery.
///
/// # Errors
///
/// Returns [`ServerError`] when startup fails or the listener stops with an error.
pub async fn run<F>(config: NotifyConfig, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = build_store(&config.stat);
    run_with(config, store, Arc::new(LogDelivery), shutdown).await
}

/// Runs the server with explicit collaborators.
///
/// # Errors
///
/// Returns [`ServerError`] when startup fails or the listener stops with an error.
pub async fn run_with<F>(
    config: NotifyConfig,
    store: SharedCounterStore,
    delivery: Arc<dyn PushDelivery>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    prepare_store(&store).await?;
    info!(engine = ?config.stat.engine, "counter store initialized");

    let config = Arc::new(config);
    let queue = Arc::new(DispatchQueue::start(
        DispatchConfig {
            workers: config.core.effective_workers(),
            capacity: config.core.queue_num,
        },
        delivery,
        store.clone(),
    ));
    let state = AppState::new(
        Arc::clone(&config),
        Arc::clone(&queue) as Arc<dyn BatchSink>,
        store.clone(),
    )?;
    let served = NotifyServer::new(state).serve(shutdown).await;

    let grace = Duration::from_millis(config.core.shutdown_timeout_ms);
    if let Err(err) = queue.shutdown(grace).await {
        warn!(error = %err, "dispatch queue did not drain");
    }
    if let Err(err) = store.close().await {
        error!(error = %err, "counter store close failed");
    }
    info!("notification server stopped");
    served
}
