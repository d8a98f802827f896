// crates/notify-server/src/dispatch.rs
// ============================================================================
// Module: Dispatch Queue
// Description: Bounded worker pool draining accepted notification batches.
// Purpose: Decouple request acceptance from delivery with explicit backpressure.
// Dependencies: notify-core, tokio, tracing
// ============================================================================

//! ## Overview
//! [`DispatchQueue`] owns a bounded `mpsc` channel and a fixed set of worker
//! tasks sharing its receiver. [`BatchSink::enqueue`] never waits: when the
//! channel is full the batch is rejected with [`DispatchError::QueueFull`] and
//! the caller answers the client immediately.
//!
//! Workers deliver each item through [`PushDelivery`] and record the outcome
//! with [`record_outcome`]. Failures never reach the submitting client. Each
//! batch runs on its own task, so a panicking delivery drops that batch and
//! the worker moves on to the next one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use notify_core::NotificationBatch;
use notify_core::SharedCounterStore;
use notify_core::runtime::status::record_outcome;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::delivery::PushDelivery;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Dispatch queue errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Every queue slot is occupied.
    #[error("Notification queue is full.")]
    QueueFull,
    /// The queue has been shut down.
    #[error("Notification queue is closed.")]
    Closed,
    /// Workers did not drain within the shutdown timeout.
    #[error("dispatch workers did not stop within {0:?}")]
    ShutdownTimeout(Duration),
}

// ============================================================================
// SECTION: Sink Trait
// ============================================================================

/// Destination for validated batches.
pub trait BatchSink: Send + Sync {
    /// Hands `batch` off for asynchronous processing without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::QueueFull`] or [`DispatchError::Closed`].
    fn enqueue(&self, batch: NotificationBatch) -> Result<(), DispatchError>;

    /// Batches waiting for a worker.
    fn queue_usage(&self) -> usize;

    /// Batches currently being processed.
    fn in_flight(&self) -> usize;

    /// Maximum number of waiting batches.
    fn queue_capacity(&self) -> usize;
}

// ============================================================================
// SECTION: Queue
// ============================================================================

/// Worker pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Number of worker tasks.
    pub workers: usize,
    /// Channel capacity in batches.
    pub capacity: usize,
}

/// Bounded dispatch queue backed by a tokio worker pool.
pub struct DispatchQueue {
    /// Sending half; `None` once shut down.
    sender: Mutex<Option<mpsc::Sender<NotificationBatch>>>,
    /// Channel capacity.
    capacity: usize,
    /// Spawned worker count.
    workers: usize,
    /// Batches held by workers.
    in_flight: Arc<AtomicUsize>,
    /// Worker task handles, taken on shutdown.
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl DispatchQueue {
    /// Spawns the worker pool. Must be called inside a tokio runtime.
    #[must_use]
    pub fn start(
        config: DispatchConfig,
        delivery: Arc<dyn PushDelivery>,
        store: SharedCounterStore,
    ) -> Self {
        let capacity = config.capacity.max(1);
        let workers = config.workers.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let in_flight = Arc::new(AtomicUsize::new(0));

        let handles = (0 .. workers)
            .map(|worker_id| {
                let worker = Worker {
                    id: worker_id,
                    receiver: Arc::clone(&receiver),
                    delivery: Arc::clone(&delivery),
                    store: store.clone(),
                    in_flight: Arc::clone(&in_flight),
                };
                tokio::spawn(worker.run())
            })
            .collect();
        info!(workers, capacity, "dispatch queue started");

        Self {
            sender: Mutex::new(Some(sender)),
            capacity,
            workers,
            in_flight,
            handles: Mutex::new(handles),
        }
    }

    /// Number of worker tasks.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.workers
    }

    /// Stops accepting batches and waits up to `timeout` for workers to drain.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ShutdownTimeout`] when workers are still busy.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), DispatchError> {
        let handles = self.close_channel();
        info!(workers = handles.len(), "draining dispatch queue");
        let drain = async {
            for handle in handles {
                if let Err(err) = handle.await {
                    error!(error = %err, "dispatch worker panicked");
                }
            }
        };
        match tokio::time::timeout(timeout, drain).await {
            Ok(()) => {
                info!("dispatch queue drained");
                Ok(())
            }
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis(), "dispatch queue drain timed out");
                Err(DispatchError::ShutdownTimeout(timeout))
            }
        }
    }

    /// Drops the sender and takes the worker handles.
    fn close_channel(&self) -> Vec<JoinHandle<()>> {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        match self.handles.lock() {
            Ok(mut handles) => std::mem::take(&mut *handles),
            Err(_) => Vec::new(),
        }
    }
}

impl BatchSink for DispatchQueue {
    fn enqueue(&self, batch: NotificationBatch) -> Result<(), DispatchError> {
        let guard = self.sender.lock().map_err(|_| DispatchError::Closed)?;
        let sender = guard.as_ref().ok_or(DispatchError::Closed)?;
        sender.try_send(batch).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => DispatchError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DispatchError::Closed,
        })
    }

    fn queue_usage(&self) -> usize {
        self.sender
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|sender| self.capacity - sender.capacity()))
            .unwrap_or(0)
    }

    fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    fn queue_capacity(&self) -> usize {
        self.capacity
    }
}

// ============================================================================
// SECTION: Worker
// ============================================================================

/// One dispatch worker.
struct Worker {
    id: usize,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<NotificationBatch>>>,
    delivery: Arc<dyn PushDelivery>,
    store: SharedCounterStore,
    in_flight: Arc<AtomicUsize>,
}

impl Worker {
    async fn run(self) {
        loop {
            let next = {
                let mut receiver = self.receiver.lock().await;
                receiver.recv().await.map(|batch| (batch, InFlight::enter(&self.in_flight)))
            };
            let Some((batch, _in_flight)) = next else {
                break;
            };
            let task = tokio::spawn(process_batch(
                self.id,
                Arc::clone(&self.delivery),
                self.store.clone(),
                batch,
            ));
            if let Err(err) = task.await {
                error!(worker_id = self.id, error = %err, "batch processing aborted");
            }
        }
        debug!(worker_id = self.id, "dispatch worker stopped");
    }
}

/// Counts one batch as in flight until dropped.
struct InFlight {
    counter: Arc<AtomicUsize>,
}

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self {
            counter: Arc::clone(counter),
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Delivers every item of `batch` and records each outcome.
///
/// Runs on its own task so a panicking delivery only loses this batch.
async fn process_batch(
    worker_id: usize,
    delivery: Arc<dyn PushDelivery>,
    store: SharedCounterStore,
    batch: NotificationBatch,
) {
    debug!(worker_id, items = batch.len(), "processing batch");
    for item in batch.items() {
        let success = match delivery.deliver(item).await {
            Ok(()) => true,
            Err(err) => {
                warn!(worker_id, error = %err, "notification delivery failed");
                false
            }
        };
        record_outcome(&store, item.platform, success, item.weight()).await;
    }
}
