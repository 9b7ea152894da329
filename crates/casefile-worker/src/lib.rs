//! Document pipeline for Casefile.
//!
//! This crate provides:
//! - An unbounded multi-producer, single-consumer queue of document IDs
//! - Pipeline stages that advance a document's status
//! - The worker loop that consumes the queue until shutdown
//! - A recovery sweep that re-enqueues documents left `Pending`

pub mod queue;
pub mod recovery;
pub mod runner;
pub mod stage;

pub use queue::{PipelineQueue, PipelineReceiver, pipeline_channel};
pub use recovery::PendingRecovery;
pub use runner::{PipelineWorker, ProcessOutcome};
pub use stage::{PipelineStage, StageError, StoreStage};
