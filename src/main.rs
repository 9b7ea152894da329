//! Casefile server
//!
//! Runs the document pipeline: connects the record stores, re-enqueues
//! pending documents and processes the queue until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use casefile_core::AppResult;
use casefile_core::config::AppConfig;
use casefile_database::repositories::{CustomerRepository, DocumentRepository};
use casefile_database::{CustomerStore, DatabasePool, DocumentRecordStore};
use casefile_storage::{AppPaths, CustomerDirectoryRegistry, DocumentStorage};
use casefile_worker::{PendingRecovery, PipelineWorker, StoreStage, pipeline_channel};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Load configuration for the environment named by `CASEFILE_ENV`.
fn load_configuration() -> AppResult<AppConfig> {
    let env = std::env::var("CASEFILE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting Casefile v{}", env!("CARGO_PKG_VERSION"));

    let db = DatabasePool::connect(&config.database, "casefile-server").await?;
    let applied = casefile_database::migration::run_migrations(db.pool()).await?;
    tracing::info!(applied = applied.len(), "Database migrations complete");

    let paths = AppPaths::prepare(&config.storage).await?;
    tracing::info!(root = %paths.project_root().display(), "Project directories ready");

    let customers: Arc<dyn CustomerStore> = Arc::new(CustomerRepository::new(db.pool().clone()));
    let documents: Arc<dyn DocumentRecordStore> =
        Arc::new(DocumentRepository::new(db.pool().clone()));
    let registry = CustomerDirectoryRegistry::new(paths.clone());
    let storage = DocumentStorage::new(paths, registry, config.upload.clone());

    let (queue, receiver) = pipeline_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker_handle = if config.worker.enabled {
        let worker = PipelineWorker::new(documents.clone(), Arc::new(StoreStage::new(storage)));
        let cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move { worker.run(receiver, cancel).await });
        tracing::info!("Pipeline worker started");
        Some(handle)
    } else {
        tracing::info!("Pipeline worker disabled");
        None
    };

    let recovery = PendingRecovery::new(customers, documents, queue);
    if config.worker.enabled && config.worker.recovery_on_startup {
        let enqueued = recovery.sweep().await?;
        tracing::info!(enqueued, "Startup recovery complete");
    }

    let recovery_handle = match config.worker.recovery_interval_seconds {
        0 => None,
        _ if !config.worker.enabled => None,
        secs => {
            let cancel = shutdown_rx.clone();
            Some(tokio::spawn(async move {
                recovery.run_periodic(Duration::from_secs(secs), cancel).await
            }))
        }
    };

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping pipeline...");
    let _ = shutdown_tx.send(true);

    if let Some(handle) = worker_handle {
        let _ = tokio::time::timeout(Duration::from_secs(30), handle).await;
    }
    if let Some(handle) = recovery_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    db.close().await;
    tracing::info!("Casefile server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
