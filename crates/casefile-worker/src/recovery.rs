//! Re-enqueue documents left `Pending` by a previous process.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use casefile_core::AppResult;
use casefile_database::{CustomerStore, DocumentRecordStore};
use casefile_entity::document::DocumentStatus;

use crate::queue::PipelineQueue;

/// Sweeps the record store for `Pending` documents and enqueues them.
///
/// The queue is in-memory, so anything enqueued before a restart is lost.
/// Because the worker skips documents that are no longer `Pending`,
/// enqueueing an ID twice is harmless.
#[derive(Clone)]
pub struct PendingRecovery {
    customers: Arc<dyn CustomerStore>,
    documents: Arc<dyn DocumentRecordStore>,
    queue: PipelineQueue,
}

impl PendingRecovery {
    /// Recovery over the given stores, feeding `queue`.
    pub fn new(
        customers: Arc<dyn CustomerStore>,
        documents: Arc<dyn DocumentRecordStore>,
        queue: PipelineQueue,
    ) -> Self {
        Self {
            customers,
            documents,
            queue,
        }
    }

    /// Enqueue every `Pending` document. Returns how many were enqueued.
    pub async fn sweep(&self) -> AppResult<usize> {
        let mut enqueued = 0;
        for customer in self.customers.list().await? {
            let pending = self
                .documents
                .list_by_customer(customer.id)
                .await?
                .into_iter()
                .filter(|doc| doc.status == DocumentStatus::Pending);
            // Oldest first so the queue roughly follows upload order.
            let mut pending: Vec<_> = pending.collect();
            pending.reverse();
            for doc in pending {
                self.queue.enqueue(doc.id);
                enqueued += 1;
            }
        }

        if enqueued > 0 {
            tracing::info!(enqueued, "Recovered pending documents");
        }
        Ok(enqueued)
    }

    /// Sweep every `interval` until `cancel` is raised or its sender is
    /// dropped.
    pub async fn run_periodic(&self, interval: Duration, mut cancel: watch::Receiver<bool>) {
        tracing::info!(interval_secs = interval.as_secs(), "Pending recovery scheduled");

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                _ = time::sleep(interval) => {
                    if let Err(e) = self.sweep().await {
                        tracing::error!(error = %e, "Pending recovery sweep failed");
                    }
                }
            }
        }

        tracing::info!("Pending recovery stopped");
    }
}
