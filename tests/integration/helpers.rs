//! Shared test harness for integration tests.
//!
//! Wires the real services over a temporary project root and the
//! in-memory record stores.

#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;

use casefile_core::config::storage::StorageConfig;
use casefile_core::config::upload::{UploadConfig, UploadLayout};
use casefile_database::memory::{MemoryCustomerStore, MemoryDocumentStore};
use casefile_entity::customer::Customer;
use casefile_entity::document::DocumentItem;
use casefile_service::{CustomerService, DocumentService, FolderService, NoteStore, TreeBuilder};
use casefile_storage::{AppPaths, BytesUpload, CustomerDirectoryRegistry, DocumentStorage};
use casefile_worker::{PipelineReceiver, PipelineWorker, StoreStage, pipeline_channel};

/// Test application context
pub struct TestApp {
    /// Temporary project root, removed on drop
    pub dir: TempDir,
    pub paths: AppPaths,
    pub registry: CustomerDirectoryRegistry,
    pub customer_store: MemoryCustomerStore,
    pub document_store: MemoryDocumentStore,
    pub customers: CustomerService,
    pub notes: NoteStore,
    pub folders: FolderService,
    pub documents: DocumentService,
    pub tree: TreeBuilder,
    pub worker: PipelineWorker,
    pub receiver: PipelineReceiver,
}

impl TestApp {
    /// Create a new test application with the named upload layout
    pub async fn new() -> Self {
        Self::with_layout(UploadLayout::Named).await
    }

    /// Create a new test application with the given upload layout
    pub async fn with_layout(layout: UploadLayout) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let storage_config = StorageConfig {
            project_root: dir.path().to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };
        let paths = AppPaths::prepare(&storage_config)
            .await
            .expect("Failed to prepare project root");
        let registry = CustomerDirectoryRegistry::new(paths.clone());

        let customer_store = MemoryCustomerStore::new();
        let document_store = MemoryDocumentStore::new();
        let upload_config = UploadConfig {
            layout,
            ..UploadConfig::default()
        };
        let storage = DocumentStorage::new(paths.clone(), registry.clone(), upload_config);
        let (queue, receiver) = pipeline_channel();

        let notes = NoteStore::new(registry.clone());
        let customers = CustomerService::new(
            Arc::new(customer_store.clone()),
            Arc::new(document_store.clone()),
            registry.clone(),
        );
        let folders = FolderService::new(
            notes.clone(),
            registry.clone(),
            Arc::new(document_store.clone()),
        );
        let documents = DocumentService::new(
            storage.clone(),
            registry.clone(),
            Arc::new(document_store.clone()),
            queue,
        );
        let tree = TreeBuilder::new(
            registry.clone(),
            Arc::new(customer_store.clone()),
            Arc::new(document_store.clone()),
        );
        let worker = PipelineWorker::new(
            Arc::new(document_store.clone()),
            Arc::new(StoreStage::new(storage)),
        );

        Self {
            dir,
            paths,
            registry,
            customer_store,
            document_store,
            customers,
            notes,
            folders,
            documents,
            tree,
            worker,
            receiver,
        }
    }

    /// Create a customer with its directory
    pub async fn create_customer(&self, name: &str) -> Customer {
        let (customer, _) = self
            .customers
            .create(name)
            .await
            .expect("Failed to create customer");
        customer
    }

    /// Upload PDFs with the given names into a folder
    pub async fn upload_pdfs(
        &self,
        customer: &Customer,
        folder: Option<&str>,
        names: &[&str],
    ) -> Vec<DocumentItem> {
        let uploads: Vec<BytesUpload> = names
            .iter()
            .map(|name| BytesUpload::new(*name, "application/pdf", format!("%PDF {name}")))
            .collect();
        let refs: Vec<&dyn casefile_storage::UploadSource> = uploads
            .iter()
            .map(|u| u as &dyn casefile_storage::UploadSource)
            .collect();
        self.documents
            .upload(customer, folder, &refs)
            .await
            .expect("Upload batch failed")
            .into_iter()
            .map(|r| r.result.expect("Upload rejected"))
            .collect()
    }

    /// Process everything queued so far
    pub async fn drain(&mut self) -> usize {
        self.worker.drain(&mut self.receiver).await
    }

    /// Absolute path of a stored document
    pub fn absolute(&self, stored_path: &str) -> std::path::PathBuf {
        self.paths.project_root().join(stored_path)
    }
}
