//! Pipeline queue of document IDs.

use tokio::sync::{mpsc, watch};
use uuid::Uuid;

/// Create a connected queue/receiver pair.
///
/// The queue half is cloned into every producer; the receiver half is
/// owned by the single worker.
pub fn pipeline_channel() -> (PipelineQueue, PipelineReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (PipelineQueue { sender }, PipelineReceiver { receiver })
}

/// Producer side. Enqueueing never blocks.
#[derive(Debug, Clone)]
pub struct PipelineQueue {
    sender: mpsc::UnboundedSender<Uuid>,
}

impl PipelineQueue {
    /// Push a document ID. Duplicates are allowed.
    ///
    /// If the worker has already shut down the ID is dropped; the document
    /// stays `Pending` until the next recovery sweep.
    pub fn enqueue(&self, document_id: Uuid) {
        if self.sender.send(document_id).is_err() {
            tracing::warn!(%document_id, "Pipeline receiver closed; document left pending");
        } else {
            tracing::debug!(%document_id, "Enqueued document");
        }
    }

    /// Whether the consumer side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Consumer side, owned by the worker.
#[derive(Debug)]
pub struct PipelineReceiver {
    receiver: mpsc::UnboundedReceiver<Uuid>,
}

impl PipelineReceiver {
    /// Wait for the next document ID.
    ///
    /// Returns `None` once `cancel` is raised (or its sender dropped), or
    /// when every producer is gone and the queue is empty. Items still in
    /// the queue at cancellation are not returned.
    pub async fn dequeue(&mut self, cancel: &mut watch::Receiver<bool>) -> Option<Uuid> {
        loop {
            if *cancel.borrow() {
                return None;
            }
            tokio::select! {
                biased;
                changed = cancel.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                }
                item = self.receiver.recv() => return item,
            }
        }
    }

    /// Take the next ID without waiting.
    pub fn try_dequeue(&mut self) -> Option<Uuid> {
        self.receiver.try_recv().ok()
    }

    /// Number of queued IDs.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
