//! Pipeline worker: consumes the queue and advances document status.

use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use casefile_core::AppResult;
use casefile_database::DocumentRecordStore;
use casefile_entity::document::DocumentStatus;

use crate::queue::PipelineReceiver;
use crate::stage::{PipelineStage, StageError};

/// Result of processing one queued ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The stage advanced the document to a new status.
    Advanced(DocumentStatus),
    /// The stage rejected the document; it is now `Failed`.
    Failed(String),
    /// The record no longer exists.
    Missing,
    /// The document is not in the stage's input status.
    Skipped(DocumentStatus),
}

/// Single consumer of the pipeline queue.
#[derive(Clone)]
pub struct PipelineWorker {
    documents: Arc<dyn DocumentRecordStore>,
    stage: Arc<dyn PipelineStage>,
}

impl std::fmt::Debug for PipelineWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineWorker")
            .field("stage", &self.stage.name())
            .finish_non_exhaustive()
    }
}

impl PipelineWorker {
    /// Create a worker running `stage` against `documents`.
    pub fn new(documents: Arc<dyn DocumentRecordStore>, stage: Arc<dyn PipelineStage>) -> Self {
        Self { documents, stage }
    }

    /// Consume the queue until `cancel` is raised or all producers are gone.
    ///
    /// Errors while processing one item are logged and never stop the loop.
    pub async fn run(&self, mut receiver: PipelineReceiver, mut cancel: watch::Receiver<bool>) {
        tracing::info!(stage = self.stage.name(), "Pipeline worker started");

        while let Some(document_id) = receiver.dequeue(&mut cancel).await {
            self.handle(document_id).await;
        }

        tracing::info!(
            stage = self.stage.name(),
            abandoned = receiver.len(),
            "Pipeline worker stopped"
        );
    }

    /// Process every ID currently queued, without waiting for more.
    /// Returns the number of IDs taken from the queue.
    pub async fn drain(&self, receiver: &mut PipelineReceiver) -> usize {
        let mut handled = 0;
        while let Some(document_id) = receiver.try_dequeue() {
            self.handle(document_id).await;
            handled += 1;
        }
        handled
    }

    async fn handle(&self, document_id: Uuid) {
        match self.process(document_id).await {
            Ok(ProcessOutcome::Advanced(status)) => {
                tracing::info!(%document_id, %status, "Document advanced");
            }
            Ok(ProcessOutcome::Failed(message)) => {
                tracing::warn!(%document_id, error = %message, "Document processing failed");
            }
            Ok(ProcessOutcome::Missing) => {
                tracing::debug!(%document_id, "Document record gone; skipping");
            }
            Ok(ProcessOutcome::Skipped(status)) => {
                tracing::debug!(%document_id, %status, "Document not pending; skipping");
            }
            Err(e) => {
                tracing::error!(%document_id, error = %e, "Pipeline error; status unchanged");
            }
        }
    }

    /// Process one document ID.
    ///
    /// Only documents in the stage's input status are touched. Stage
    /// failures mark the document `Failed`; infrastructure errors are
    /// returned and leave the record as it was.
    pub async fn process(&self, document_id: Uuid) -> AppResult<ProcessOutcome> {
        let Some(mut document) = self.documents.find_by_id(document_id).await? else {
            return Ok(ProcessOutcome::Missing);
        };
        if document.status != self.stage.accepts() {
            return Ok(ProcessOutcome::Skipped(document.status));
        }

        match self.stage.process(&document).await {
            Ok(next) => {
                document.status = next;
                document.error_message = None;
                self.documents.update(&document).await?;
                Ok(ProcessOutcome::Advanced(next))
            }
            Err(StageError::Failed(message)) => {
                document.fail(&message);
                self.documents.update(&document).await?;
                Ok(ProcessOutcome::Failed(message))
            }
            Err(StageError::Internal(e)) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::pipeline_channel;
    use async_trait::async_trait;
    use casefile_core::AppError;
    use casefile_database::memory::MemoryDocumentStore;
    use casefile_entity::document::DocumentItem;
    use chrono::Utc;
    use std::time::Duration;

    #[derive(Debug)]
    struct FixedStage(Result<DocumentStatus, &'static str>);

    #[async_trait]
    impl PipelineStage for FixedStage {
        fn name(&self) -> &str {
            "fixed"
        }

        fn accepts(&self) -> DocumentStatus {
            DocumentStatus::Pending
        }

        async fn process(&self, _document: &DocumentItem) -> Result<DocumentStatus, StageError> {
            match self.0 {
                Ok(status) => Ok(status),
                Err("internal") => Err(StageError::Internal(AppError::internal("boom"))),
                Err(message) => Err(StageError::Failed(message.to_string())),
            }
        }
    }

    async fn pending(store: &MemoryDocumentStore) -> Uuid {
        let mut item = DocumentItem::new_pending(
            Uuid::new_v4(),
            1,
            "Dokumente",
            "a.pdf",
            "Data/Clients/1_A/Dokumente/a.pdf",
            Utc::now(),
        );
        item.error_message = Some("stale".into());
        store.create(&item).await.unwrap();
        item.id
    }

    fn worker(store: &MemoryDocumentStore, stage: FixedStage) -> PipelineWorker {
        PipelineWorker::new(Arc::new(store.clone()), Arc::new(stage))
    }

    #[tokio::test]
    async fn test_pending_becomes_stored_and_error_cleared() {
        let store = MemoryDocumentStore::new();
        let id = pending(&store).await;
        let worker = worker(&store, FixedStage(Ok(DocumentStatus::Stored)));

        let outcome = worker.process(id).await.unwrap();
        assert_eq!(outcome, ProcessOutcome::Advanced(DocumentStatus::Stored));

        let doc = store.get_by_id(id).await.unwrap();
        assert_eq!(doc.status, DocumentStatus::Stored);
        assert!(doc.error_message.is_none());

        let again = worker.process(id).await.unwrap();
        assert_eq!(again, ProcessOutcome::Skipped(DocumentStatus::Stored));
    }

    #[tokio::test]
    async fn test_stage_failure_marks_failed() {
        let store = MemoryDocumentStore::new();
        let id = pending(&store).await;
        let worker = worker(&store, FixedStage(Err("unreadable")));

        worker.process(id).await.unwrap();
        let doc = store.get_by_id(id).await.unwrap();
        assert_eq!(doc.status, DocumentStatus::Failed);
        assert_eq!(doc.error_message.as_deref(), Some("unreadable"));
    }

    #[tokio::test]
    async fn test_internal_error_leaves_status() {
        let store = MemoryDocumentStore::new();
        let id = pending(&store).await;
        let worker = worker(&store, FixedStage(Err("internal")));

        assert!(worker.process(id).await.is_err());
        let doc = store.get_by_id(id).await.unwrap();
        assert_eq!(doc.status, DocumentStatus::Pending);
    }

    #[tokio::test]
    async fn test_missing_record_is_noop() {
        let store = MemoryDocumentStore::new();
        let worker = worker(&store, FixedStage(Ok(DocumentStatus::Stored)));
        assert_eq!(
            worker.process(Uuid::new_v4()).await.unwrap(),
            ProcessOutcome::Missing
        );
    }

    #[tokio::test]
    async fn test_run_survives_errors_and_stops_on_cancel() {
        let store = MemoryDocumentStore::new();
        let id = pending(&store).await;
        let worker = worker(&store, FixedStage(Ok(DocumentStatus::Stored)));
        let (queue, receiver) = pipeline_channel();
        let (cancel_tx, cancel) = watch::channel(false);

        let handle = tokio::spawn({
            let worker = worker.clone();
            async move { worker.run(receiver, cancel).await }
        });

        queue.enqueue(Uuid::new_v4());
        queue.enqueue(id);

        let mut stored = false;
        for _ in 0..100 {
            if store.get_by_id(id).await.unwrap().status == DocumentStatus::Stored {
                stored = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(stored);

        cancel_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_drain_processes_queued_items() {
        let store = MemoryDocumentStore::new();
        let first = pending(&store).await;
        let second = pending(&store).await;
        let worker = worker(&store, FixedStage(Ok(DocumentStatus::Stored)));
        let (queue, mut receiver) = pipeline_channel();
        queue.enqueue(first);
        queue.enqueue(second);

        assert_eq!(worker.drain(&mut receiver).await, 2);
        assert!(receiver.is_empty());
        for id in [first, second] {
            assert_eq!(
                store.get_by_id(id).await.unwrap().status,
                DocumentStatus::Stored
            );
        }
    }
}
